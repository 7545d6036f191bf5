//! The generation pipeline
//!
//! Control flows top-down: script interpretation decides placement on
//! the coarse grid, the vertical compositor stacks levels, the loader
//! realizes tiles and route nodes, seams are drilled, the navigation
//! graph is stitched, and deployment puts units and items on the
//! result. One full battlefield is produced synchronously on the
//! calling thread; a run either completes or returns an error.

pub mod deploy;
pub mod interpreter;
pub mod levels;
pub mod loading;
pub mod nav;
pub mod placement;
pub mod script;
pub mod tunnels;

pub use deploy::{
    BaseLayout, CraftSpec, Deployment, Facility, HostileWave, MissionKind, SquadMember,
};
pub use interpreter::{CraftKind, CraftPlacement, Interpreter, Layout, PlacedBlock};
pub use levels::{LevelKind, VerticalLevel};
pub use placement::{BlockGrid, CellState, DrillFlag};
pub use script::{CommandKind, Ledger, LineDirection, MapScript, ScriptCommand};

use rand_chacha::ChaCha8Rng;

use crate::battlefield::state::Battlefield;
use crate::core::config::GenerationConfig;
use crate::core::error::{GenError, Result};
use crate::core::rng::SeedScope;
use crate::core::types::{MapSize, CELL_SIZE};
use crate::terrain::ruleset::Ruleset;
use crate::terrain::source::DataSource;

/// Builds one battlefield from a mission deployment
pub struct BattlefieldGenerator<'a> {
    ruleset: &'a Ruleset,
    source: &'a dyn DataSource,
    deployment: &'a Deployment,
    config: GenerationConfig,
}

impl<'a> BattlefieldGenerator<'a> {
    pub fn new(
        ruleset: &'a Ruleset,
        source: &'a dyn DataSource,
        deployment: &'a Deployment,
    ) -> Self {
        Self {
            ruleset,
            source,
            deployment,
            config: GenerationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    /// Run the full pipeline
    ///
    /// Base-defense generation runs inside a seed scope: the caller's
    /// RNG stream is restored afterward, so the same base regenerates
    /// an identical layout on every attempt.
    pub fn generate(&self, rng: &mut ChaCha8Rng) -> Result<Battlefield> {
        match self.deployment.mission {
            MissionKind::BaseDefense => {
                let mut scope = SeedScope::new(rng);
                self.run(scope.rng())
            }
            MissionKind::Skirmish => self.run(rng),
        }
    }

    fn run(&self, rng: &mut ChaCha8Rng) -> Result<Battlefield> {
        let terrain = self.ruleset.terrain(&self.deployment.terrain)?;
        let script_name = self
            .deployment
            .script
            .as_deref()
            .unwrap_or(&terrain.script);
        let script = self.ruleset.script(script_name)?;
        let requested = self.deployment.size;
        if requested.width % CELL_SIZE != 0 || requested.height % CELL_SIZE != 0 {
            return Err(GenError::Ruleset(format!(
                "map dimensions {}x{} are not multiples of the {}-tile cell size",
                requested.width, requested.height, CELL_SIZE
            )));
        }
        tracing::info!(
            terrain = %terrain.name,
            script = %script.name,
            width = self.deployment.size.width,
            height = self.deployment.size.height,
            depth = self.deployment.size.depth,
            "generating battlefield"
        );

        let mut interpreter =
            Interpreter::new(self.ruleset, terrain, self.deployment, &self.config);
        if self.deployment.mission == MissionKind::BaseDefense {
            interpreter.place_base_facilities()?;
        }
        interpreter.run(script, rng)?;
        let mut layout = interpreter.into_layout();

        let size = MapSize::new(
            layout.grid.width() * CELL_SIZE,
            layout.grid.height() * CELL_SIZE,
            layout.depth,
        );
        let mut field = Battlefield::new(size);
        let mut loader = loading::BlockLoader::new(self.ruleset, self.source);

        // Flat blocks load first, one segment per coarse cell, in
        // row-major cell order.
        let mut segment: u16 = 0;
        let flat: Vec<usize> = layout.grid.occupied_cells().map(|(_, _, p)| p).collect();
        for index in flat {
            let placement = &layout.placements[index];
            segment += 1;
            for (cx, cy) in placement.footprint_rect().cells() {
                layout.grid.set_segment(cx, cy, segment);
            }
            loader.load_block(&mut field, placement, segment)?;
        }
        field.flat_segment_end = segment;

        // Then every vertical-level block, each on its own segment.
        for placement in layout.placements.iter().filter(|p| p.vertical && !p.removed) {
            segment += 1;
            loader.load_block(&mut field, placement, segment)?;
        }

        // Craft and UFO interiors go through the same block-loading
        // path so their route nodes join the graph.
        for craft in &layout.crafts {
            let craft_terrain = self.ruleset.terrain(&craft.terrain)?;
            let block = craft_terrain.block(&craft.block).ok_or_else(|| {
                GenError::Ruleset(format!(
                    "terrain '{}' has no block '{}'",
                    craft.terrain, craft.block
                ))
            })?;
            segment += 1;
            let placement = PlacedBlock {
                terrain: craft.terrain.clone(),
                block: craft.block.clone(),
                cell: (craft.rect.x, craft.rect.y),
                z: craft.z,
                width: block.width,
                height: block.height,
                levels: block.levels,
                groups: block.groups.clone(),
                vertical: true,
                removed: false,
            };
            loader.load_block(&mut field, &placement, segment)?;
        }

        for request in &layout.drills {
            let offset = loader.terrain_offset(&mut field, &request.terrain)?;
            tunnels::drill(&mut field, &layout.grid, &request.seam, offset);
        }

        nav::attach_links(&mut field, &layout.grid, &self.config);

        // Hand the coarse-grid products collaborators consume over to
        // the battlefield: origin names and landing zones.
        for cy in 0..layout.grid.height() {
            for cx in 0..layout.grid.width() {
                let index = cy * layout.grid.width() + cx;
                field.origins[index] = layout.grid.origin(cx, cy).map(str::to_string);
                field.landing_zones[index] = layout.grid.landing_zone(cx, cy);
            }
        }

        deploy::run(&mut field, &layout, self.deployment, &self.config, rng)?;

        tracing::info!(
            units = field.units.len(),
            items = field.items.len(),
            nodes = field.nodes.len(),
            segments = segment,
            "battlefield complete"
        );
        Ok(field)
    }
}
