//! Script execution
//!
//! A state machine over the command list. Every command gets a success
//! flag recorded against its label; preconditions gate execution before
//! the chance roll; placement handlers delegate to the block placement
//! engine and the vertical compositor. The interpreter only decides
//! WHAT goes WHERE - no tile data is read here. Its product is a
//! `Layout`: the final coarse grid plus the ordered placement records
//! the loading stage consumes.

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::GenerationConfig;
use crate::core::error::{GenError, Result};
use crate::core::rng::roll_percent;
use crate::core::types::{GridRect, Position, CELL_SIZE};
use crate::generator::deploy::Deployment;
use crate::generator::levels;
use crate::generator::placement::BlockGrid;
use crate::generator::script::{CommandKind, Ledger, LineDirection, MapScript, ScriptCommand};
use crate::terrain::block::{MapBlock, GROUP_CROSSING, GROUP_DEFAULT, GROUP_EW_ROAD, GROUP_LANDING, GROUP_NS_ROAD};
use crate::terrain::objects::SeamSpec;
use crate::terrain::ruleset::{Ruleset, Terrain};

/// One block scheduled for loading
#[derive(Debug, Clone)]
pub struct PlacedBlock {
    pub terrain: String,
    pub block: String,
    /// Top-left coarse cell
    pub cell: (usize, usize),
    /// Z offset the block's tile data loads at
    pub z: usize,
    pub width: usize,
    pub height: usize,
    pub levels: usize,
    pub groups: Vec<i32>,
    /// Vertical-level placement rather than a flat per-cell block
    pub vertical: bool,
    pub removed: bool,
}

impl PlacedBlock {
    fn in_group(&self, group: i32) -> bool {
        if self.groups.is_empty() {
            group == GROUP_DEFAULT
        } else {
            self.groups.contains(&group)
        }
    }

    pub fn matches(&self, groups: &[i32], names: &[String]) -> bool {
        if !names.is_empty() {
            return names.iter().any(|n| n == &self.block);
        }
        if groups.is_empty() {
            return true;
        }
        groups.iter().any(|g| self.in_group(*g))
    }

    pub fn footprint_rect(&self) -> GridRect {
        GridRect::new(
            self.cell.0,
            self.cell.1,
            self.width.div_ceil(CELL_SIZE),
            self.height.div_ceil(CELL_SIZE),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CraftKind {
    Craft,
    Ufo,
}

/// Record of a placed craft or UFO footprint
#[derive(Debug, Clone)]
pub struct CraftPlacement {
    pub kind: CraftKind,
    pub rect: GridRect,
    /// Z offset the interior loads at
    pub z: usize,
    pub terrain: String,
    pub block: String,
}

/// A drilling pass requested by a dig-tunnel command
#[derive(Debug, Clone)]
pub struct DrillRequest {
    pub seam: SeamSpec,
    pub terrain: String,
}

/// Everything the script run decided, handed to the loading stage
#[derive(Debug)]
pub struct Layout {
    pub grid: BlockGrid,
    pub placements: Vec<PlacedBlock>,
    pub crafts: Vec<CraftPlacement>,
    pub drills: Vec<DrillRequest>,
    /// Storage checkerboard tiles of a base-defense mission
    pub storage_tiles: Vec<Position>,
    pub depth: usize,
}

pub struct Interpreter<'a> {
    ruleset: &'a Ruleset,
    terrain: &'a Terrain,
    deployment: &'a Deployment,
    config: &'a GenerationConfig,
    depth: usize,
    grid: BlockGrid,
    placements: Vec<PlacedBlock>,
    crafts: Vec<CraftPlacement>,
    drills: Vec<DrillRequest>,
    storage_tiles: Vec<Position>,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        ruleset: &'a Ruleset,
        terrain: &'a Terrain,
        deployment: &'a Deployment,
        config: &'a GenerationConfig,
    ) -> Self {
        let size = deployment.size;
        Self {
            ruleset,
            terrain,
            deployment,
            config,
            depth: size.depth,
            grid: BlockGrid::new(size.width / CELL_SIZE, size.height / CELL_SIZE),
            placements: Vec::new(),
            crafts: Vec::new(),
            drills: Vec::new(),
            storage_tiles: Vec::new(),
        }
    }

    pub fn grid(&self) -> &BlockGrid {
        &self.grid
    }

    pub fn into_layout(self) -> Layout {
        Layout {
            grid: self.grid,
            placements: self.placements,
            crafts: self.crafts,
            drills: self.drills,
            storage_tiles: self.storage_tiles,
            depth: self.depth,
        }
    }

    fn command_terrain(&self, cmd: &ScriptCommand) -> Result<&'a Terrain> {
        match &cmd.terrain {
            Some(name) => self.ruleset.terrain(name),
            None => Ok(self.terrain),
        }
    }

    /// Execute the whole script
    pub fn run(&mut self, script: &MapScript, rng: &mut ChaCha8Rng) -> Result<()> {
        let mut ledger = Ledger::for_script(script);

        for (index, cmd) in script.commands.iter().enumerate() {
            if !ledger.preconditions_hold(&cmd.conditionals) {
                tracing::debug!(
                    command = index,
                    kind = cmd.kind.name(),
                    "preconditions not met, skipping"
                );
                continue;
            }
            if !roll_percent(rng, cmd.chance) {
                tracing::debug!(command = index, kind = cmd.kind.name(), "chance roll failed");
                continue;
            }

            let success = match cmd.kind {
                CommandKind::PlaceBlock => self.run_place_block(cmd, rng)?,
                CommandKind::PlaceLine => self.run_place_line(cmd, rng)?,
                CommandKind::PlaceCraft => self.run_place_craft(cmd, CraftKind::Craft, rng)?,
                CommandKind::PlaceUfo => self.run_place_craft(cmd, CraftKind::Ufo, rng)?,
                CommandKind::DigTunnel => self.run_dig_tunnel(cmd)?,
                CommandKind::FillArea => self.run_fill_area(cmd, rng)?,
                CommandKind::CheckBlock => self.run_check_block(cmd),
                CommandKind::RemoveBlocks => self.run_remove_blocks(cmd),
                CommandKind::Resize => self.run_resize(cmd)?,
            };
            ledger.record(index, cmd.label, success);
            tracing::debug!(
                command = index,
                kind = cmd.kind.name(),
                success,
                pending = self.grid.pending(),
                "command finished"
            );

            // An unlabeled required placement that found nowhere to go
            // aborts the whole attempt; a labeled one is branchable.
            let required = match cmd.kind {
                CommandKind::PlaceBlock | CommandKind::PlaceLine => true,
                CommandKind::PlaceCraft => self.deployment.craft.is_some(),
                CommandKind::PlaceUfo => self.deployment.ufo.is_some(),
                _ => false,
            };
            if !success && required && cmd.label.is_none() {
                return Err(GenError::PlacementExhausted {
                    index,
                    kind: cmd.kind.name(),
                });
            }
        }

        if self.grid.pending() > 0 {
            return Err(GenError::UnfilledCells(self.grid.pending()));
        }
        Ok(())
    }

    /// Place one block at a chosen cell and compose its vertical stack
    ///
    /// Returns the craft z offset when the level specs reserved one.
    fn place_block_at(
        &mut self,
        block: &MapBlock,
        terrain: &Terrain,
        cell: (usize, usize),
        level_specs: &[levels::VerticalLevel],
        craft_levels: Option<usize>,
        rng: &mut ChaCha8Rng,
    ) -> Result<Option<usize>> {
        if block.levels > self.depth {
            return Err(GenError::HeightOverBudget {
                name: block.name.clone(),
                required: block.levels,
                offset: 0,
                depth: self.depth,
            });
        }

        let (fw, fh) = block.footprint();
        let rect = GridRect::new(cell.0, cell.1, fw, fh);
        let index = self.placements.len();
        self.grid
            .occupy(&rect, index, &format!("{}/{}", terrain.name, block.name));
        self.placements.push(PlacedBlock {
            terrain: terrain.name.clone(),
            block: block.name.clone(),
            cell,
            z: 0,
            width: block.width,
            height: block.height,
            levels: block.levels,
            groups: block.groups.clone(),
            vertical: false,
            removed: false,
        });

        if level_specs.is_empty() && craft_levels.is_none() {
            return Ok(None);
        }

        let composition = levels::compose(
            level_specs,
            block,
            terrain,
            self.ruleset,
            self.depth,
            craft_levels,
            self.config,
            rng,
        )?;
        for plan in &composition.plans {
            let plan_terrain = self.ruleset.terrain(&plan.block.0)?;
            let plan_block = plan_terrain.block(&plan.block.1).ok_or_else(|| {
                GenError::Ruleset(format!(
                    "terrain '{}' has no block '{}'",
                    plan.block.0, plan.block.1
                ))
            })?;
            self.placements.push(PlacedBlock {
                terrain: plan_terrain.name.clone(),
                block: plan_block.name.clone(),
                cell,
                z: plan.z,
                width: plan_block.width,
                height: plan_block.height,
                levels: plan_block.levels,
                groups: plan_block.groups.clone(),
                vertical: true,
                removed: false,
            });
        }
        Ok(composition.craft_z)
    }

    fn run_place_block(&mut self, cmd: &ScriptCommand, rng: &mut ChaCha8Rng) -> Result<bool> {
        let terrain = self.command_terrain(cmd)?;
        let mut any = false;
        for _ in 0..cmd.executions {
            let candidates = terrain.blocks_matching(&cmd.groups, &cmd.blocks);
            let Some(block) = candidates.choose(rng).copied() else {
                continue;
            };
            let (fw, fh) = block.footprint();
            let Some(cell) = self.grid.find_placement(rng, &cmd.rects, fw, fh) else {
                continue;
            };
            self.place_block_at(block, terrain, cell, &cmd.levels, None, rng)?;
            any = true;
        }
        Ok(any)
    }

    fn run_fill_area(&mut self, cmd: &ScriptCommand, rng: &mut ChaCha8Rng) -> Result<bool> {
        let terrain = self.command_terrain(cmd)?;
        let mut any = false;
        loop {
            let candidates = terrain.blocks_matching(&cmd.groups, &cmd.blocks);
            let Some(block) = candidates.choose(rng).copied() else {
                break;
            };
            let (fw, fh) = block.footprint();
            let Some(cell) = self.grid.find_placement(rng, &cmd.rects, fw, fh) else {
                break;
            };
            self.place_block_at(block, terrain, cell, &cmd.levels, None, rng)?;
            any = true;
        }
        Ok(any)
    }

    fn run_place_craft(
        &mut self,
        cmd: &ScriptCommand,
        kind: CraftKind,
        rng: &mut ChaCha8Rng,
    ) -> Result<bool> {
        let spec = match kind {
            CraftKind::Craft => self.deployment.craft.as_ref(),
            CraftKind::Ufo => self.deployment.ufo.as_ref(),
        };
        let Some(spec) = spec else {
            tracing::debug!("deployment has no craft for this command, skipping");
            return Ok(false);
        };
        let craft_terrain = self.ruleset.terrain(&spec.terrain)?;
        let craft_block = craft_terrain.block(&spec.block).ok_or_else(|| {
            GenError::Ruleset(format!(
                "craft terrain '{}' has no block '{}'",
                spec.terrain, spec.block
            ))
        })?;

        let (fw, fh) = craft_block.footprint();
        let Some((x, y)) = self.grid.find_placement(rng, &cmd.rects, fw, fh) else {
            return Ok(false);
        };
        let rect = GridRect::new(x, y, fw, fh);

        // The footprint cells get flat landing-zone blocks; the craft
        // interior itself loads above them during the loading stage.
        let terrain = self.command_terrain(cmd)?;
        let landing: Vec<&MapBlock> = terrain
            .blocks_matching(&[GROUP_LANDING], &[])
            .into_iter()
            .filter(|b| b.footprint() == (1, 1))
            .collect();
        let pool: Vec<&MapBlock> = if landing.is_empty() {
            terrain
                .blocks_matching(&[GROUP_DEFAULT], &[])
                .into_iter()
                .filter(|b| b.footprint() == (1, 1))
                .collect()
        } else {
            landing
        };
        if pool.is_empty() {
            return Ok(false);
        }

        let mut craft_z = None;
        let cells: Vec<(usize, usize)> = rect.cells().collect();
        for cell in cells {
            let block = *pool.choose(rng).expect("pool checked non-empty");
            let z = self.place_block_at(
                block,
                terrain,
                cell,
                &cmd.levels,
                Some(craft_block.levels),
                rng,
            )?;
            craft_z = craft_z.or(z);
        }
        self.grid.mark_landing(&rect);

        let z = craft_z.unwrap_or(self.config.default_craft_level);
        tracing::info!(
            block = %spec.block,
            x = rect.x,
            y = rect.y,
            z,
            "placed craft footprint"
        );
        self.crafts.push(CraftPlacement {
            kind,
            rect,
            z,
            terrain: spec.terrain.clone(),
            block: spec.block.clone(),
        });
        Ok(true)
    }

    /// Candidate runs for a line: every row (or column) of an allowed
    /// rect whose cells are all free
    fn line_runs(&self, rects: &[GridRect], horizontal: bool) -> Vec<GridRect> {
        let whole = [self.grid.whole_rect()];
        let allowed: &[GridRect] = if rects.is_empty() { &whole } else { rects };
        let mut runs = Vec::new();
        for rect in allowed {
            if horizontal {
                for y in rect.y..rect.bottom() {
                    let run = GridRect::new(rect.x, y, rect.width, 1);
                    if self.grid.rect_free(&run) {
                        runs.push(run);
                    }
                }
            } else {
                for x in rect.x..rect.right() {
                    let run = GridRect::new(x, rect.y, 1, rect.height);
                    if self.grid.rect_free(&run) {
                        runs.push(run);
                    }
                }
            }
        }
        runs.sort_unstable_by_key(|r| (r.x, r.y));
        runs.dedup();
        runs
    }

    fn fill_run(
        &mut self,
        run: &GridRect,
        group: i32,
        skip: Option<(usize, usize)>,
        terrain: &Terrain,
        level_specs: &[levels::VerticalLevel],
        rng: &mut ChaCha8Rng,
    ) -> Result<bool> {
        let pool: Vec<&MapBlock> = terrain
            .blocks_matching(&[group], &[])
            .into_iter()
            .filter(|b| b.footprint() == (1, 1))
            .collect();
        if pool.is_empty() {
            return Ok(false);
        }
        let cells: Vec<(usize, usize)> = run.cells().filter(|c| Some(*c) != skip).collect();
        for cell in cells {
            let block = *pool.choose(rng).expect("pool checked non-empty");
            self.place_block_at(block, terrain, cell, level_specs, None, rng)?;
        }
        Ok(true)
    }

    fn run_place_line(&mut self, cmd: &ScriptCommand, rng: &mut ChaCha8Rng) -> Result<bool> {
        let terrain = self.command_terrain(cmd)?;
        let direction = cmd.direction.unwrap_or_else(|| {
            if rng.gen_bool(0.5) {
                LineDirection::Horizontal
            } else {
                LineDirection::Vertical
            }
        });

        match direction {
            LineDirection::Horizontal | LineDirection::Vertical => {
                let horizontal = direction == LineDirection::Horizontal;
                let runs = self.line_runs(&cmd.rects, horizontal);
                let Some(run) = runs.choose(rng).copied() else {
                    return Ok(false);
                };
                let group = if horizontal { GROUP_EW_ROAD } else { GROUP_NS_ROAD };
                self.fill_run(&run, group, None, terrain, &cmd.levels, rng)
            }
            LineDirection::Both => {
                // Pick a crossing cell whose full row and column are
                // free, then lay both runs around it.
                let rows = self.line_runs(&cmd.rects, true);
                let cols = self.line_runs(&cmd.rects, false);
                let mut crossings = Vec::new();
                for row in &rows {
                    for col in &cols {
                        if row.contains_cell(col.x, row.y) && col.contains_cell(col.x, row.y) {
                            crossings.push((*row, *col));
                        }
                    }
                }
                let Some((row, col)) = crossings.choose(rng).copied() else {
                    return Ok(false);
                };
                let cross = (col.x, row.y);

                let pool: Vec<&MapBlock> = terrain
                    .blocks_matching(&[GROUP_CROSSING], &[])
                    .into_iter()
                    .filter(|b| b.footprint() == (1, 1))
                    .collect();
                let Some(cross_block) = pool.choose(rng).copied() else {
                    return Ok(false);
                };
                self.place_block_at(cross_block, terrain, cross, &cmd.levels, None, rng)?;
                self.fill_run(&row, GROUP_EW_ROAD, Some(cross), terrain, &cmd.levels, rng)?;
                self.fill_run(&col, GROUP_NS_ROAD, Some(cross), terrain, &cmd.levels, rng)?;
                Ok(true)
            }
        }
    }

    fn run_check_block(&self, cmd: &ScriptCommand) -> bool {
        self.grid.occupied_cells().any(|(x, y, index)| {
            let in_rects =
                cmd.rects.is_empty() || cmd.rects.iter().any(|r| r.contains_cell(x, y));
            in_rects && self.placements[index].matches(&cmd.groups, &cmd.blocks)
        })
    }

    fn run_remove_blocks(&mut self, cmd: &ScriptCommand) -> bool {
        let targets: Vec<usize> = self
            .grid
            .occupied_cells()
            .filter(|(x, y, index)| {
                let in_rects =
                    cmd.rects.is_empty() || cmd.rects.iter().any(|r| r.contains_cell(*x, *y));
                in_rects && self.placements[*index].matches(&cmd.groups, &cmd.blocks)
            })
            .map(|(_, _, index)| index)
            .collect();

        let mut removed_any = false;
        for index in targets {
            let rect = self.placements[index].footprint_rect();
            let cell = self.placements[index].cell;
            self.grid.release(&rect);
            self.placements[index].removed = true;
            // Vertical levels stacked on the removed cell go with it.
            for placement in &mut self.placements {
                if placement.vertical && placement.cell == cell {
                    placement.removed = true;
                }
            }
            removed_any = true;
        }
        removed_any
    }

    fn run_dig_tunnel(&mut self, cmd: &ScriptCommand) -> Result<bool> {
        let terrain = self.command_terrain(cmd)?;
        let seam = cmd.seam.clone().or_else(|| terrain.seam.clone());
        match seam {
            Some(seam) => {
                self.drills.push(DrillRequest {
                    seam,
                    terrain: terrain.name.clone(),
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn run_resize(&mut self, cmd: &ScriptCommand) -> Result<bool> {
        let Some([width, height]) = cmd.new_size else {
            return Ok(false);
        };
        self.grid.resize(width, height)?;
        tracing::debug!(width, height, "resized coarse grid");
        Ok(true)
    }

    /// Place base facility blocks at their fixed cells, before the
    /// script runs
    pub fn place_base_facilities(&mut self) -> Result<()> {
        let Some(base) = &self.deployment.base else {
            return Ok(());
        };
        for facility in &base.facilities {
            let terrain = match &facility.terrain {
                Some(name) => self.ruleset.terrain(name)?,
                None => self.terrain,
            };
            let block = terrain.block(&facility.block).ok_or_else(|| {
                GenError::Ruleset(format!(
                    "terrain '{}' has no facility block '{}'",
                    terrain.name, facility.block
                ))
            })?;
            let (fw, fh) = block.footprint();
            let rect = GridRect::new(facility.x, facility.y, fw, fh);
            if !self.grid.rect_free(&rect) {
                return Err(GenError::Ruleset(format!(
                    "facility '{}' does not fit at cell ({}, {})",
                    facility.block, facility.x, facility.y
                )));
            }

            let index = self.placements.len();
            self.grid
                .occupy(&rect, index, &format!("{}/{}", terrain.name, block.name));
            self.placements.push(PlacedBlock {
                terrain: terrain.name.clone(),
                block: block.name.clone(),
                cell: (facility.x, facility.y),
                z: 0,
                width: block.width,
                height: block.height,
                levels: block.levels,
                groups: block.groups.clone(),
                vertical: false,
                removed: false,
            });

            if facility.storage {
                // Checkerboard of ground-level tiles for scattered base
                // stores.
                let x0 = (facility.x * CELL_SIZE) as i32;
                let y0 = (facility.y * CELL_SIZE) as i32;
                for ty in 0..block.height as i32 {
                    for tx in 0..block.width as i32 {
                        if (tx + ty) % 2 == 0 {
                            self.storage_tiles.push(Position::new(x0 + tx, y0 + ty, 0));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::MapSize;
    use crate::generator::deploy::{CraftSpec, Deployment, MissionKind};
    use rand::SeedableRng;

    fn block(name: &str, width: usize, height: usize, groups: Vec<i32>) -> MapBlock {
        MapBlock {
            name: name.into(),
            width,
            height,
            levels: 2,
            groups,
        }
    }

    fn test_ruleset() -> Ruleset {
        let mut ruleset = Ruleset::new();
        ruleset.add_terrain(Terrain {
            name: "farm".into(),
            script: "default".into(),
            blocks: vec![
                block("plain", 10, 10, vec![]),
                block("barn", 20, 20, vec![]),
                block("pad", 10, 10, vec![GROUP_LANDING]),
                block("road_ew", 10, 10, vec![GROUP_EW_ROAD]),
                block("road_ns", 10, 10, vec![GROUP_NS_ROAD]),
                block("crossing", 10, 10, vec![GROUP_CROSSING]),
            ],
            object_sets: Vec::new(),
            seam: None,
        });
        ruleset
    }

    fn deployment(size: MapSize) -> Deployment {
        Deployment {
            mission: MissionKind::Skirmish,
            terrain: "farm".into(),
            size,
            script: None,
            craft: None,
            ufo: None,
            base: None,
            squad: Vec::new(),
            hostiles: Vec::new(),
            civilians: 0,
            stores: Vec::new(),
        }
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(5)
    }

    fn script(commands: Vec<ScriptCommand>) -> MapScript {
        MapScript {
            name: "test".into(),
            commands,
        }
    }

    #[test]
    fn test_fill_area_fills_every_cell() {
        let ruleset = test_ruleset();
        let deployment = deployment(MapSize::new(40, 40, 4));
        let config = GenerationConfig::default();
        let terrain = ruleset.terrain("farm").unwrap();
        let mut interp = Interpreter::new(&ruleset, terrain, &deployment, &config);

        let mut fill = ScriptCommand::new(CommandKind::FillArea);
        fill.blocks = vec!["plain".into()];
        interp.run(&script(vec![fill]), &mut rng()).unwrap();
        assert_eq!(interp.grid().pending(), 0);
    }

    #[test]
    fn test_unfilled_cells_are_fatal() {
        let ruleset = test_ruleset();
        let deployment = deployment(MapSize::new(40, 40, 4));
        let config = GenerationConfig::default();
        let terrain = ruleset.terrain("farm").unwrap();
        let mut interp = Interpreter::new(&ruleset, terrain, &deployment, &config);

        let mut place = ScriptCommand::new(CommandKind::PlaceBlock);
        place.blocks = vec!["plain".into()];
        let result = interp.run(&script(vec![place]), &mut rng());
        assert!(matches!(result, Err(GenError::UnfilledCells(15))));
    }

    #[test]
    fn test_footprint_larger_than_rect_is_fatal_when_unlabeled() {
        let ruleset = test_ruleset();
        let deployment = deployment(MapSize::new(40, 40, 4));
        let config = GenerationConfig::default();
        let terrain = ruleset.terrain("farm").unwrap();
        let mut interp = Interpreter::new(&ruleset, terrain, &deployment, &config);

        // 2x2 footprint into a 1x1 allowed rect: never placeable.
        let mut place = ScriptCommand::new(CommandKind::PlaceBlock);
        place.blocks = vec!["barn".into()];
        place.rects = vec![GridRect::new(0, 0, 1, 1)];
        let result = interp.run(&script(vec![place]), &mut rng());
        assert!(matches!(
            result,
            Err(GenError::PlacementExhausted { index: 0, .. })
        ));
    }

    #[test]
    fn test_labeled_failure_is_branchable() {
        let ruleset = test_ruleset();
        let deployment = deployment(MapSize::new(40, 40, 4));
        let config = GenerationConfig::default();
        let terrain = ruleset.terrain("farm").unwrap();
        let mut interp = Interpreter::new(&ruleset, terrain, &deployment, &config);

        let mut doomed = ScriptCommand::new(CommandKind::PlaceBlock);
        doomed.blocks = vec!["barn".into()];
        doomed.rects = vec![GridRect::new(0, 0, 1, 1)];
        doomed.label = Some(1);

        // Runs only because command 1 failed.
        let mut rescue = ScriptCommand::new(CommandKind::FillArea);
        rescue.blocks = vec!["plain".into()];
        rescue.conditionals = vec![-1];

        interp
            .run(&script(vec![doomed, rescue]), &mut rng())
            .unwrap();
        assert_eq!(interp.grid().pending(), 0);
    }

    #[test]
    fn test_precondition_skip_prevents_execution() {
        let ruleset = test_ruleset();
        let deployment = deployment(MapSize::new(20, 20, 4));
        let config = GenerationConfig::default();
        let terrain = ruleset.terrain("farm").unwrap();
        let mut interp = Interpreter::new(&ruleset, terrain, &deployment, &config);

        let mut first = ScriptCommand::new(CommandKind::FillArea);
        first.blocks = vec!["plain".into()];
        first.label = Some(1);

        // Requires label 1 to have FAILED; must be skipped.
        let mut gated = ScriptCommand::new(CommandKind::PlaceBlock);
        gated.blocks = vec!["barn".into()];
        gated.rects = vec![GridRect::new(0, 0, 1, 1)];
        gated.conditionals = vec![-1];

        // Unlabeled and impossible, but never reached.
        interp.run(&script(vec![first, gated]), &mut rng()).unwrap();
    }

    #[test]
    fn test_zero_chance_never_executes() {
        let ruleset = test_ruleset();
        let deployment = deployment(MapSize::new(20, 20, 4));
        let config = GenerationConfig::default();
        let terrain = ruleset.terrain("farm").unwrap();
        let mut interp = Interpreter::new(&ruleset, terrain, &deployment, &config);

        let mut never = ScriptCommand::new(CommandKind::PlaceBlock);
        never.blocks = vec!["plain".into()];
        never.chance = 0;

        let mut fill = ScriptCommand::new(CommandKind::FillArea);
        fill.blocks = vec!["plain".into()];

        interp.run(&script(vec![never, fill]), &mut rng()).unwrap();
        // All 4 cells came from the fill, none from the 0% command.
        assert_eq!(interp.placements.iter().filter(|p| !p.removed).count(), 4);
    }

    #[test]
    fn test_craft_placement_marks_landing_zones() {
        let ruleset = test_ruleset();
        let mut deployment = deployment(MapSize::new(20, 20, 4));
        deployment.craft = Some(CraftSpec {
            block: "barn".into(),
            terrain: "farm".into(),
            layout: Vec::new(),
        });
        let config = GenerationConfig::default();
        let terrain = ruleset.terrain("farm").unwrap();
        let mut interp = Interpreter::new(&ruleset, terrain, &deployment, &config);

        let craft = ScriptCommand::new(CommandKind::PlaceCraft);
        let mut fill = ScriptCommand::new(CommandKind::FillArea);
        fill.blocks = vec!["plain".into()];
        interp.run(&script(vec![craft, fill]), &mut rng()).unwrap();

        assert_eq!(interp.crafts.len(), 1);
        let rect = interp.crafts[0].rect;
        assert_eq!((rect.width, rect.height), (2, 2));
        let landing = (0..2)
            .flat_map(|y| (0..2).map(move |x| (x, y)))
            .filter(|(x, y)| interp.grid().landing_zone(*x, *y))
            .count();
        assert_eq!(landing, 4);
    }

    #[test]
    fn test_craft_command_without_craft_is_skipped() {
        let ruleset = test_ruleset();
        let deployment = deployment(MapSize::new(20, 20, 4));
        let config = GenerationConfig::default();
        let terrain = ruleset.terrain("farm").unwrap();
        let mut interp = Interpreter::new(&ruleset, terrain, &deployment, &config);

        let craft = ScriptCommand::new(CommandKind::PlaceCraft);
        let mut fill = ScriptCommand::new(CommandKind::FillArea);
        fill.blocks = vec!["plain".into()];
        interp.run(&script(vec![craft, fill]), &mut rng()).unwrap();
        assert!(interp.crafts.is_empty());
    }

    #[test]
    fn test_line_placement_spans_grid() {
        let ruleset = test_ruleset();
        let deployment = deployment(MapSize::new(40, 40, 4));
        let config = GenerationConfig::default();
        let terrain = ruleset.terrain("farm").unwrap();
        let mut interp = Interpreter::new(&ruleset, terrain, &deployment, &config);

        let mut line = ScriptCommand::new(CommandKind::PlaceLine);
        line.direction = Some(LineDirection::Horizontal);
        let mut fill = ScriptCommand::new(CommandKind::FillArea);
        fill.blocks = vec!["plain".into()];
        interp.run(&script(vec![line, fill]), &mut rng()).unwrap();

        let roads: Vec<_> = interp
            .placements
            .iter()
            .filter(|p| p.block == "road_ew")
            .collect();
        assert_eq!(roads.len(), 4);
        // A horizontal line shares one row.
        let row = roads[0].cell.1;
        assert!(roads.iter().all(|p| p.cell.1 == row));
    }

    #[test]
    fn test_crossing_line_places_crossing_block() {
        let ruleset = test_ruleset();
        let deployment = deployment(MapSize::new(40, 40, 4));
        let config = GenerationConfig::default();
        let terrain = ruleset.terrain("farm").unwrap();
        let mut interp = Interpreter::new(&ruleset, terrain, &deployment, &config);

        let mut line = ScriptCommand::new(CommandKind::PlaceLine);
        line.direction = Some(LineDirection::Both);
        let mut fill = ScriptCommand::new(CommandKind::FillArea);
        fill.blocks = vec!["plain".into()];
        interp.run(&script(vec![line, fill]), &mut rng()).unwrap();

        assert_eq!(
            interp
                .placements
                .iter()
                .filter(|p| p.block == "crossing")
                .count(),
            1
        );
        assert_eq!(
            interp
                .placements
                .iter()
                .filter(|p| p.block.starts_with("road"))
                .count(),
            6
        );
    }

    #[test]
    fn test_check_block_and_remove_blocks() {
        let ruleset = test_ruleset();
        let deployment = deployment(MapSize::new(20, 20, 4));
        let config = GenerationConfig::default();
        let terrain = ruleset.terrain("farm").unwrap();
        let mut interp = Interpreter::new(&ruleset, terrain, &deployment, &config);

        let mut barn = ScriptCommand::new(CommandKind::PlaceBlock);
        barn.blocks = vec!["barn".into()];
        barn.label = Some(1);

        // Remove it again if it landed, then check nothing is left.
        let mut remove = ScriptCommand::new(CommandKind::RemoveBlocks);
        remove.blocks = vec!["barn".into()];
        remove.conditionals = vec![1];

        let mut check = ScriptCommand::new(CommandKind::CheckBlock);
        check.blocks = vec!["barn".into()];
        check.label = Some(2);

        let mut fill = ScriptCommand::new(CommandKind::FillArea);
        fill.blocks = vec!["plain".into()];

        interp
            .run(&script(vec![barn, remove, check, fill]), &mut rng())
            .unwrap();
        assert_eq!(interp.grid().pending(), 0);
        assert!(interp
            .placements
            .iter()
            .all(|p| p.block != "barn" || p.removed));
    }

    #[test]
    fn test_resize_before_placement() {
        let ruleset = test_ruleset();
        let deployment = deployment(MapSize::new(20, 20, 4));
        let config = GenerationConfig::default();
        let terrain = ruleset.terrain("farm").unwrap();
        let mut interp = Interpreter::new(&ruleset, terrain, &deployment, &config);

        let mut resize = ScriptCommand::new(CommandKind::Resize);
        resize.new_size = Some([3, 3]);
        let mut fill = ScriptCommand::new(CommandKind::FillArea);
        fill.blocks = vec!["plain".into()];

        interp.run(&script(vec![resize, fill]), &mut rng()).unwrap();
        assert_eq!(interp.grid().width(), 3);
        assert_eq!(
            interp.placements.iter().filter(|p| !p.removed).count(),
            9
        );
    }

    #[test]
    fn test_resize_after_placement_is_fatal() {
        let ruleset = test_ruleset();
        let deployment = deployment(MapSize::new(20, 20, 4));
        let config = GenerationConfig::default();
        let terrain = ruleset.terrain("farm").unwrap();
        let mut interp = Interpreter::new(&ruleset, terrain, &deployment, &config);

        let mut place = ScriptCommand::new(CommandKind::PlaceBlock);
        place.blocks = vec!["plain".into()];
        let mut resize = ScriptCommand::new(CommandKind::Resize);
        resize.new_size = Some([3, 3]);

        let result = interp.run(&script(vec![place, resize]), &mut rng());
        assert!(matches!(result, Err(GenError::ResizeAfterPlacement)));
    }
}
