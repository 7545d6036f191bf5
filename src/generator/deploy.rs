//! Deployment: units and items onto the finished grid
//!
//! Order matters: player units first (large before small, fixed craft
//! layout before flagged start tiles), then hostiles from the mission
//! rank tables on rank-matching navigation nodes, then civilians.
//! A unit that truly cannot be placed is dropped with a warning, but a
//! required category ending at zero placed units aborts the mission.

use ahash::AHashSet;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::battlefield::state::Battlefield;
use crate::battlefield::tile::TilePart;
use crate::battlefield::unit::{Faction, Item, Unit};
use crate::core::config::GenerationConfig;
use crate::core::error::{GenError, Result};
use crate::core::types::{MapSize, Position, UnitId, CELL_SIZE};
use crate::generator::interpreter::{CraftKind, Layout};
use crate::terrain::objects::SpecialTile;

/// How many items a unit carries before the rest spill to the ground
const HANDS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionKind {
    Skirmish,
    /// Fixed facility-map lookup; layout regenerates identically for
    /// the same base
    BaseDefense,
}

/// The craft or UFO participating in a mission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CraftSpec {
    pub block: String,
    pub terrain: String,
    /// Fixed deployment positions relative to the craft's origin;
    /// empty means "use flagged start-point tiles"
    #[serde(default)]
    pub layout: Vec<Position>,
}

fn default_size() -> u8 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SquadMember {
    pub kind: String,
    #[serde(default = "default_size")]
    pub size: u8,
    #[serde(default)]
    pub items: Vec<String>,
}

/// One row of a mission's hostile rank table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostileWave {
    pub kind: String,
    pub count: usize,
    #[serde(default)]
    pub rank: u8,
    #[serde(default = "default_size")]
    pub size: u8,
    #[serde(default)]
    pub items: Vec<String>,
}

/// One facility module of a defended base
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facility {
    pub block: String,
    /// Fixed coarse cell
    pub x: usize,
    pub y: usize,
    #[serde(default)]
    pub terrain: Option<String>,
    /// Storage facilities get the item checkerboard
    #[serde(default)]
    pub storage: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseLayout {
    pub facilities: Vec<Facility>,
}

/// The declarative mission description handed to the generator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    pub mission: MissionKind,
    pub terrain: String,
    pub size: MapSize,
    /// Script override; defaults to the terrain's own script
    #[serde(default)]
    pub script: Option<String>,
    #[serde(default)]
    pub craft: Option<CraftSpec>,
    #[serde(default)]
    pub ufo: Option<CraftSpec>,
    #[serde(default)]
    pub base: Option<BaseLayout>,
    #[serde(default)]
    pub squad: Vec<SquadMember>,
    #[serde(default)]
    pub hostiles: Vec<HostileWave>,
    #[serde(default)]
    pub civilians: usize,
    /// Recoverable base stores scattered over the storage checkerboard
    #[serde(default)]
    pub stores: Vec<String>,
}

impl Deployment {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

struct Deployer<'a> {
    field: &'a mut Battlefield,
    config: &'a GenerationConfig,
    occupied: AHashSet<Position>,
    used_nodes: AHashSet<usize>,
}

impl<'a> Deployer<'a> {
    fn walkable(&self, pos: Position) -> bool {
        if self.occupied.contains(&pos) {
            return false;
        }
        let Some(tile) = self.field.tile_at(pos) else {
            return false;
        };
        match tile.part(TilePart::Object) {
            Some(id) => !self
                .field
                .object(id)
                .map(|o| o.blocks_movement)
                .unwrap_or(false),
            None => true,
        }
    }

    fn can_stand(&self, pos: Position, size: u8) -> bool {
        (0..size as i32).all(|dy| {
            (0..size as i32)
                .all(|dx| self.walkable(Position::new(pos.x + dx, pos.y + dy, pos.z)))
        })
    }

    fn spawn(&mut self, kind: &str, faction: Faction, rank: u8, size: u8, pos: Position) -> UnitId {
        let unit = Unit::new(kind, faction, rank, size, pos);
        let id = unit.id;
        for tile in unit.occupied_tiles() {
            self.occupied.insert(tile);
        }
        self.field.units.push(unit);
        id
    }

    fn issue_items(&mut self, owner: UnitId, pos: Position, kinds: &[String]) {
        for (index, kind) in kinds.iter().enumerate() {
            self.field.items.push(Item {
                kind: kind.clone(),
                pos,
                // Hands full: the rest lands on the unit's tile.
                owner: (index < HANDS).then_some(owner),
            });
        }
    }

    /// Tiles flagged as deployment start points
    fn start_points(&self) -> Vec<Position> {
        let size = self.field.size();
        let mut points = Vec::new();
        for z in 0..size.depth {
            for y in 0..size.height {
                for x in 0..size.width {
                    let tile = self.field.tile(x, y, z).expect("in bounds");
                    let flagged = TilePart::ALL.iter().any(|part| {
                        tile.part(*part)
                            .and_then(|id| self.field.object(id))
                            .map(|o| o.special == SpecialTile::StartPoint)
                            .unwrap_or(false)
                    });
                    if flagged {
                        points.push(Position::new(x as i32, y as i32, z as i32));
                    }
                }
            }
        }
        points
    }

    fn place_player_units(
        &mut self,
        deployment: &Deployment,
        layout: &Layout,
        rng: &mut ChaCha8Rng,
    ) -> Result<()> {
        if deployment.squad.is_empty() {
            return Ok(());
        }

        // Large units deploy first while space is plentiful.
        let mut order: Vec<&SquadMember> = deployment.squad.iter().collect();
        order.sort_by_key(|m| std::cmp::Reverse(m.size));

        let craft = layout.crafts.iter().find(|c| c.kind == CraftKind::Craft);
        let mut fixed: Vec<Position> = Vec::new();
        if let (Some(craft), Some(spec)) = (craft, deployment.craft.as_ref()) {
            let origin = Position::new(
                (craft.rect.x * CELL_SIZE) as i32,
                (craft.rect.y * CELL_SIZE) as i32,
                craft.z as i32,
            );
            fixed = spec.layout.iter().map(|p| origin + *p).collect();
        }

        let mut starts = self.start_points();
        if let Some(craft) = craft {
            // With a craft on the ground, only its own flagged tiles
            // count as start points.
            let x0 = (craft.rect.x * CELL_SIZE) as i32;
            let y0 = (craft.rect.y * CELL_SIZE) as i32;
            let x1 = (craft.rect.right() * CELL_SIZE) as i32;
            let y1 = (craft.rect.bottom() * CELL_SIZE) as i32;
            starts.retain(|p| p.x >= x0 && p.x < x1 && p.y >= y0 && p.y < y1);
        }
        starts.shuffle(rng);

        let mut placed = 0;
        for member in order {
            let spot = fixed
                .iter()
                .chain(starts.iter())
                .copied()
                .find(|p| self.can_stand(*p, member.size));
            match spot {
                Some(pos) => {
                    let id = self.spawn(&member.kind, Faction::Player, 0, member.size, pos);
                    self.issue_items(id, pos, &member.items);
                    placed += 1;
                }
                None => {
                    tracing::warn!(kind = %member.kind, "no room for player unit, dropping");
                }
            }
        }
        if placed == 0 {
            return Err(GenError::NoUnitsPlaced("player"));
        }
        tracing::info!(placed, total = deployment.squad.len(), "deployed player units");
        Ok(())
    }

    /// A rank-matching node, weighted by spawn priority
    fn pick_node(&self, rank: u8, size: u8, rng: &mut ChaCha8Rng) -> Option<(usize, Position)> {
        let candidates: Vec<(usize, Position, u8)> = self
            .field
            .live_nodes()
            .filter(|n| n.rank == rank && !self.used_nodes.contains(&n.id))
            .map(|n| (n.id, n.pos, n.priority))
            .filter(|(_, pos, _)| self.can_stand(*pos, size))
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let total: u32 = candidates.iter().map(|(_, _, p)| *p as u32 + 1).sum();
        let mut roll = rng.gen_range(0..total);
        for (id, pos, priority) in &candidates {
            let weight = *priority as u32 + 1;
            if roll < weight {
                return Some((*id, *pos));
            }
            roll -= weight;
        }
        unreachable!("weights sum to total")
    }

    /// Fallback: a free tile near an already-placed unit of the faction
    fn near_faction(&self, faction: Faction, size: u8, rng: &mut ChaCha8Rng) -> Option<Position> {
        let mut anchors: Vec<Position> = self
            .field
            .units
            .iter()
            .filter(|u| u.faction == faction)
            .map(|u| u.pos)
            .collect();
        anchors.shuffle(rng);
        let radius = self.config.spawn_fallback_radius;
        for anchor in anchors {
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    let pos = Position::new(anchor.x + dx, anchor.y + dy, anchor.z);
                    if self.can_stand(pos, size) {
                        return Some(pos);
                    }
                }
            }
        }
        None
    }

    fn place_hostiles(&mut self, deployment: &Deployment, rng: &mut ChaCha8Rng) -> Result<()> {
        let required: usize = deployment.hostiles.iter().map(|w| w.count).sum();
        if required == 0 {
            return Ok(());
        }

        let mut placed = 0;
        for wave in &deployment.hostiles {
            for _ in 0..wave.count {
                let spot = match self.pick_node(wave.rank, wave.size, rng) {
                    Some((node, pos)) => {
                        self.used_nodes.insert(node);
                        Some(pos)
                    }
                    None => self.near_faction(Faction::Hostile, wave.size, rng),
                };
                match spot {
                    Some(pos) => {
                        let id =
                            self.spawn(&wave.kind, Faction::Hostile, wave.rank, wave.size, pos);
                        self.issue_items(id, pos, &wave.items);
                        placed += 1;
                    }
                    None => {
                        tracing::warn!(kind = %wave.kind, "no spawn node for hostile, dropping");
                    }
                }
            }
        }
        if placed == 0 {
            return Err(GenError::NoUnitsPlaced("hostile"));
        }
        tracing::info!(placed, required, "deployed hostile units");
        Ok(())
    }

    fn place_civilians(&mut self, deployment: &Deployment, rng: &mut ChaCha8Rng) -> Result<()> {
        if deployment.civilians == 0 {
            return Ok(());
        }
        let mut placed = 0;
        for _ in 0..deployment.civilians {
            // Civilians wander the scout (rank 0) nodes.
            match self.pick_node(0, 1, rng) {
                Some((node, pos)) => {
                    self.used_nodes.insert(node);
                    self.spawn("civilian", Faction::Civilian, 0, 1, pos);
                    placed += 1;
                }
                None => tracing::warn!("no spawn node for civilian, dropping"),
            }
        }
        if placed == 0 {
            return Err(GenError::NoUnitsPlaced("civilian"));
        }
        Ok(())
    }

    fn scatter_stores(&mut self, deployment: &Deployment, layout: &Layout) {
        if deployment.stores.is_empty() {
            return;
        }
        if layout.storage_tiles.is_empty() {
            tracing::warn!("base stores declared but no storage facility placed");
            return;
        }
        for (index, kind) in deployment.stores.iter().enumerate() {
            let pos = layout.storage_tiles[index % layout.storage_tiles.len()];
            self.field.items.push(Item {
                kind: kind.clone(),
                pos,
                owner: None,
            });
        }
    }
}

/// Run the full deployment stage
pub fn run(
    field: &mut Battlefield,
    layout: &Layout,
    deployment: &Deployment,
    config: &GenerationConfig,
    rng: &mut ChaCha8Rng,
) -> Result<()> {
    let mut deployer = Deployer {
        field,
        config,
        occupied: AHashSet::new(),
        used_nodes: AHashSet::new(),
    };
    deployer.place_player_units(deployment, layout, rng)?;
    deployer.place_hostiles(deployment, rng)?;
    deployer.place_civilians(deployment, rng)?;
    deployer.scatter_stores(deployment, layout);
    Ok(())
}
