//! Layout script command model
//!
//! Parsing the authoring format is someone else's job; commands arrive
//! here already materialized. Execution semantics live in the
//! interpreter, this module only defines the shapes and the label
//! bookkeeping.

use serde::{Deserialize, Serialize};

use crate::core::types::GridRect;
use crate::generator::levels::VerticalLevel;
use crate::terrain::objects::SeamSpec;

/// The closed set of layout command kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    PlaceBlock,
    PlaceLine,
    PlaceCraft,
    PlaceUfo,
    DigTunnel,
    FillArea,
    CheckBlock,
    RemoveBlocks,
    Resize,
}

impl CommandKind {
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::PlaceBlock => "place_block",
            CommandKind::PlaceLine => "place_line",
            CommandKind::PlaceCraft => "place_craft",
            CommandKind::PlaceUfo => "place_ufo",
            CommandKind::DigTunnel => "dig_tunnel",
            CommandKind::FillArea => "fill_area",
            CommandKind::CheckBlock => "check_block",
            CommandKind::RemoveBlocks => "remove_blocks",
            CommandKind::Resize => "resize",
        }
    }
}

/// Axis choice for line placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineDirection {
    Horizontal,
    Vertical,
    /// Lay one of each, crossing at a shared cell
    Both,
}

fn default_chance() -> u8 {
    100
}

fn default_executions() -> u32 {
    1
}

/// One command of a map script
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptCommand {
    pub kind: CommandKind,
    /// Allowed placement rectangles; empty means the whole map
    #[serde(default)]
    pub rects: Vec<GridRect>,
    /// Block group filter
    #[serde(default)]
    pub groups: Vec<i32>,
    /// Explicit block name filter; wins over the group filter
    #[serde(default)]
    pub blocks: Vec<String>,
    /// Percentage chance this command executes at all
    #[serde(default = "default_chance")]
    pub chance: u8,
    /// Inner iteration count
    #[serde(default = "default_executions")]
    pub executions: u32,
    /// Label other commands may branch on
    #[serde(default)]
    pub label: Option<u32>,
    /// Signed label references: positive requires that label's success,
    /// negative requires its failure
    #[serde(default)]
    pub conditionals: Vec<i32>,
    /// Vertical level stack consumed per placed cell
    #[serde(default)]
    pub levels: Vec<VerticalLevel>,
    /// Alternate terrain the command draws blocks from
    #[serde(default)]
    pub terrain: Option<String>,
    /// Line axis, for place_line
    #[serde(default)]
    pub direction: Option<LineDirection>,
    /// Seam geometry override, for dig_tunnel
    #[serde(default)]
    pub seam: Option<SeamSpec>,
    /// New coarse-grid dimensions, for resize
    #[serde(default)]
    pub new_size: Option<[usize; 2]>,
}

impl ScriptCommand {
    pub fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            rects: Vec::new(),
            groups: Vec::new(),
            blocks: Vec::new(),
            chance: default_chance(),
            executions: default_executions(),
            label: None,
            conditionals: Vec::new(),
            levels: Vec::new(),
            terrain: None,
            direction: None,
            seam: None,
            new_size: None,
        }
    }
}

/// A named, ordered command list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapScript {
    pub name: String,
    #[serde(default)]
    pub commands: Vec<ScriptCommand>,
}

/// Success bookkeeping for conditional branching
///
/// Labels are small, script-author-controlled integers, so a
/// vector-backed lookup replaces a sparse map. Commands without a label
/// still get a slot, keyed by their command index.
#[derive(Debug)]
pub struct Ledger {
    by_label: Vec<bool>,
    by_command: Vec<bool>,
}

impl Ledger {
    pub fn for_script(script: &MapScript) -> Self {
        let max_label = script
            .commands
            .iter()
            .filter_map(|c| c.label)
            .max()
            .unwrap_or(0) as usize;
        Self {
            by_label: vec![false; max_label + 1],
            by_command: vec![false; script.commands.len()],
        }
    }

    /// Record a command's outcome against its label and its own slot
    pub fn record(&mut self, command_index: usize, label: Option<u32>, success: bool) {
        if let Some(slot) = self.by_command.get_mut(command_index) {
            *slot = success;
        }
        if let Some(label) = label {
            if let Some(slot) = self.by_label.get_mut(label as usize) {
                *slot = success;
            }
        }
    }

    /// A never-recorded label reads as failed.
    pub fn label_succeeded(&self, label: u32) -> bool {
        self.by_label.get(label as usize).copied().unwrap_or(false)
    }

    /// True when every signed precondition holds
    pub fn preconditions_hold(&self, conditionals: &[i32]) -> bool {
        conditionals.iter().all(|&c| {
            let succeeded = self.label_succeeded(c.unsigned_abs());
            if c >= 0 {
                succeeded
            } else {
                !succeeded
            }
        })
    }

    pub fn command_succeeded(&self, index: usize) -> bool {
        self.by_command.get(index).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script_with_labels(labels: &[Option<u32>]) -> MapScript {
        MapScript {
            name: "test".into(),
            commands: labels
                .iter()
                .map(|l| {
                    let mut c = ScriptCommand::new(CommandKind::PlaceBlock);
                    c.label = *l;
                    c
                })
                .collect(),
        }
    }

    #[test]
    fn test_ledger_records_by_label() {
        let script = script_with_labels(&[Some(1), None, Some(3)]);
        let mut ledger = Ledger::for_script(&script);

        ledger.record(0, Some(1), true);
        ledger.record(1, None, true);
        ledger.record(2, Some(3), false);

        assert!(ledger.label_succeeded(1));
        assert!(!ledger.label_succeeded(3));
        assert!(ledger.command_succeeded(1));
    }

    #[test]
    fn test_preconditions_signed_semantics() {
        let script = script_with_labels(&[Some(1), Some(2)]);
        let mut ledger = Ledger::for_script(&script);
        ledger.record(0, Some(1), true);
        ledger.record(1, Some(2), false);

        assert!(ledger.preconditions_hold(&[1]));
        assert!(ledger.preconditions_hold(&[-2]));
        assert!(ledger.preconditions_hold(&[1, -2]));
        assert!(!ledger.preconditions_hold(&[2]));
        assert!(!ledger.preconditions_hold(&[-1]));
    }

    #[test]
    fn test_unexecuted_label_reads_as_failed() {
        let script = script_with_labels(&[Some(5)]);
        let ledger = Ledger::for_script(&script);
        assert!(!ledger.preconditions_hold(&[5]));
        assert!(ledger.preconditions_hold(&[-5]));
    }

    #[test]
    fn test_command_json_materialization() {
        let json = r#"{
            "kind": "place_craft",
            "rects": [{ "x": 0, "y": 0, "width": 4, "height": 4 }],
            "chance": 100,
            "label": 1
        }"#;
        let cmd: ScriptCommand = serde_json::from_str(json).unwrap();
        assert_eq!(cmd.kind, CommandKind::PlaceCraft);
        assert_eq!(cmd.executions, 1);
        assert_eq!(cmd.label, Some(1));
    }
}
