//! Vertical level composition
//!
//! A placement command may declare a stack of levels for each cell it
//! claims: a ground block, fillers, spacers, a craft slot, a ceiling.
//! The compositor consumes the map's z budget for one cell and decides
//! which block loads at which z offset. This is what lets a single x/y
//! footprint host a basement, a ground floor, and a rooftop.

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::GenerationConfig;
use crate::core::error::{GenError, Result};
use crate::terrain::block::MapBlock;
use crate::terrain::ruleset::{Ruleset, Terrain};

/// Role of one vertical level entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelKind {
    /// The block the command itself placed; consumed first
    Ground,
    /// Ground-equivalent for line commands
    Line,
    /// Reserved slot for the craft or UFO interior
    Craft,
    /// Generic filler consumed while cycling the rotation
    Middle,
    /// Advances the z offset without loading anything
    Empty,
    /// Filler drawn from decorative blocks
    Decoration,
    /// Topmost level, placed against the top of the budget
    Ceiling,
}

/// One declared vertical level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerticalLevel {
    pub kind: LevelKind,
    /// Height consumed; defaults to the chosen block's natural height
    #[serde(default)]
    pub height: Option<usize>,
    /// Alternate terrain this level draws blocks from
    #[serde(default)]
    pub terrain: Option<String>,
    #[serde(default)]
    pub groups: Vec<i32>,
    #[serde(default)]
    pub blocks: Vec<String>,
    /// How many times this entry may be consumed while cycling
    #[serde(default)]
    pub max_repeats: Option<u32>,
}

impl VerticalLevel {
    pub fn new(kind: LevelKind) -> Self {
        Self {
            kind,
            height: None,
            terrain: None,
            groups: Vec::new(),
            blocks: Vec::new(),
            max_repeats: None,
        }
    }
}

/// A block scheduled to load at a z offset within one cell
#[derive(Debug, Clone)]
pub struct LevelPlan {
    /// (terrain name, block name)
    pub block: (String, String),
    pub z: usize,
    pub kind: LevelKind,
}

/// Result of composing one cell's stack
#[derive(Debug, Clone, Default)]
pub struct Composition {
    /// Block-bearing levels above the ground block, in z order
    pub plans: Vec<LevelPlan>,
    /// Height the ground block consumes
    pub ground_height: usize,
    /// Where the craft interior loads, when a craft slot was declared
    pub craft_z: Option<usize>,
}

fn pick_filler<'a>(
    spec: &VerticalLevel,
    ground: &MapBlock,
    default_terrain: &'a Terrain,
    ruleset: &'a Ruleset,
    rng: &mut ChaCha8Rng,
) -> Result<Option<&'a MapBlock>> {
    let terrain = match &spec.terrain {
        Some(name) => ruleset.terrain(name)?,
        None => default_terrain,
    };
    let candidates: Vec<&MapBlock> = terrain
        .blocks_matching(&spec.groups, &spec.blocks)
        .into_iter()
        .filter(|b| b.width == ground.width && b.height == ground.height)
        .collect();
    Ok(candidates.choose(rng).copied())
}

fn terrain_name<'a>(spec: &'a VerticalLevel, default_terrain: &'a Terrain) -> &'a str {
    spec.terrain.as_deref().unwrap_or(&default_terrain.name)
}

/// Compose the vertical stack for one placed cell
///
/// `ground` is the block the command already chose; `craft_levels` is
/// the craft block's height when the command places a craft or UFO.
#[allow(clippy::too_many_arguments)]
pub fn compose(
    specs: &[VerticalLevel],
    ground: &MapBlock,
    default_terrain: &Terrain,
    ruleset: &Ruleset,
    depth: usize,
    craft_levels: Option<usize>,
    config: &GenerationConfig,
    rng: &mut ChaCha8Rng,
) -> Result<Composition> {
    // The single ground (or line) slot is consumed unconditionally and
    // leaves the rotation.
    let ground_spec = specs
        .iter()
        .find(|s| matches!(s.kind, LevelKind::Ground | LevelKind::Line));
    let ground_height = ground_spec
        .and_then(|s| s.height)
        .unwrap_or(ground.levels);

    let craft_spec = specs.iter().find(|s| s.kind == LevelKind::Craft);
    if craft_spec.is_some() && craft_levels.is_none() {
        return Err(GenError::Ruleset(
            "a craft vertical level is only legal for craft and UFO commands".into(),
        ));
    }
    let craft_height = match craft_spec {
        Some(spec) => spec.height.or(craft_levels).unwrap_or(1),
        None => 0,
    };

    let ceiling_spec = specs.iter().find(|s| s.kind == LevelKind::Ceiling);
    let mut ceiling_height = 0;
    let mut ceiling_block = None;
    if let Some(spec) = ceiling_spec {
        if let Some(block) = pick_filler(spec, ground, default_terrain, ruleset, rng)? {
            ceiling_height = spec.height.unwrap_or(block.levels);
            ceiling_block = Some((terrain_name(spec, default_terrain).to_string(), block.name.clone()));
        }
    }

    let reserved = ground_height + craft_height + ceiling_height;
    if reserved > depth {
        return Err(GenError::Ruleset(format!(
            "vertical levels of block '{}' reserve {} levels but the map is {} deep",
            ground.name, reserved, depth
        )));
    }

    let mut composition = Composition {
        ground_height,
        ..Default::default()
    };

    // Fill what's left by cycling the remaining specs in declared
    // order, wrapping around, until the budget is gone or the retry
    // bound trips.
    let mut rotation: Vec<(&VerticalLevel, u32)> = specs
        .iter()
        .filter(|s| matches!(s.kind, LevelKind::Middle | LevelKind::Empty | LevelKind::Decoration))
        .map(|s| (s, s.max_repeats.unwrap_or(u32::MAX)))
        .collect();

    let mut z = ground_height;
    let mut remaining = depth - reserved;
    let mut retries = 0;
    let mut index = 0;
    while remaining > 0 && !rotation.is_empty() && retries < config.level_fill_retries {
        let slot = index % rotation.len();
        index += 1;
        let (spec, repeats_left) = rotation[slot];
        if repeats_left == 0 {
            retries += 1;
            continue;
        }
        match spec.kind {
            LevelKind::Empty => {
                let height = spec.height.unwrap_or(1);
                if height > remaining {
                    retries += 1;
                    continue;
                }
                z += height;
                remaining -= height;
                rotation[slot].1 -= 1;
            }
            _ => {
                let Some(block) = pick_filler(spec, ground, default_terrain, ruleset, rng)? else {
                    retries += 1;
                    continue;
                };
                let height = spec.height.unwrap_or(block.levels);
                if height > remaining {
                    retries += 1;
                    continue;
                }
                composition.plans.push(LevelPlan {
                    block: (terrain_name(spec, default_terrain).to_string(), block.name.clone()),
                    z,
                    kind: spec.kind,
                });
                z += height;
                remaining -= height;
                rotation[slot].1 -= 1;
            }
        }
    }

    if craft_spec.is_some() {
        composition.craft_z = Some(z);
    }

    if let Some((terrain, block)) = ceiling_block {
        composition.plans.push(LevelPlan {
            block: (terrain, block),
            z: depth - ceiling_height,
            kind: LevelKind::Ceiling,
        });
    }

    Ok(composition)
}
