//! Battlefield tiles

use serde::{Deserialize, Serialize};

/// The four part slots of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TilePart {
    Floor = 0,
    WestWall = 1,
    NorthWall = 2,
    Object = 3,
}

impl TilePart {
    pub const ALL: [TilePart; 4] = [
        TilePart::Floor,
        TilePart::WestWall,
        TilePart::NorthWall,
        TilePart::Object,
    ];
}

/// One tile of the battlefield
///
/// Parts are indices into the run's loaded terrain-object table; `None`
/// means the slot is empty. The three discovery flags cover the two
/// wall orientations and the tile content, for the fog-of-war layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    parts: [Option<u16>; 4],
    pub discovered: [bool; 3],
}

impl Tile {
    pub fn part(&self, part: TilePart) -> Option<u16> {
        self.parts[part as usize]
    }

    pub fn set_part(&mut self, part: TilePart, object: u16) {
        self.parts[part as usize] = Some(object);
    }

    pub fn clear_part(&mut self, part: TilePart) {
        self.parts[part as usize] = None;
    }

    /// True when no slot holds an object
    pub fn is_void(&self) -> bool {
        self.parts.iter().all(Option::is_none)
    }
}
