//! Spawned combatants and loot

use serde::{Deserialize, Serialize};

use crate::core::types::{Position, UnitId};

/// Which side a unit fights for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    Player,
    Hostile,
    Civilian,
}

/// A unit placed on the battlefield during deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub id: UnitId,
    /// Ruleset type name, e.g. "sectoid_soldier"
    pub kind: String,
    pub faction: Faction,
    pub rank: u8,
    /// Edge length in tiles: 1 for small units, 2 for large
    pub size: u8,
    pub pos: Position,
}

impl Unit {
    pub fn new(kind: impl Into<String>, faction: Faction, rank: u8, size: u8, pos: Position) -> Self {
        Self {
            id: UnitId::new(),
            kind: kind.into(),
            faction,
            rank,
            size,
            pos,
        }
    }

    /// Tiles this unit stands on
    pub fn occupied_tiles(&self) -> Vec<Position> {
        let mut tiles = Vec::with_capacity((self.size as usize).pow(2));
        for dy in 0..self.size as i32 {
            for dx in 0..self.size as i32 {
                tiles.push(Position::new(self.pos.x + dx, self.pos.y + dy, self.pos.z));
            }
        }
        tiles
    }
}

/// An item lying on the battlefield or issued to a unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub kind: String,
    pub pos: Position,
    /// Set when the item was issued to a unit rather than dropped
    pub owner: Option<UnitId>,
}
