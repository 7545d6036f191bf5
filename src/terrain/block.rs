//! Map block templates
//!
//! A map block is an immutable, terrain-owned chunk of pre-authored
//! geometry with a fixed tile footprint (multiples of the coarse cell
//! size) and a height in levels. Blocks carry group memberships that
//! placement commands match against.

use serde::{Deserialize, Serialize};

use crate::core::types::CELL_SIZE;

/// Ordinary blocks, eligible for generic placement
pub const GROUP_DEFAULT: i32 = 0;
/// Flat blocks a craft or UFO can land on
pub const GROUP_LANDING: i32 = 1;
/// East-west road segments for line placement
pub const GROUP_EW_ROAD: i32 = 2;
/// North-south road segments for line placement
pub const GROUP_NS_ROAD: i32 = 3;
/// Road crossings, used where two placed lines meet
pub const GROUP_CROSSING: i32 = 4;

/// An immutable template for a rectangular chunk of terrain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapBlock {
    pub name: String,
    /// Footprint width in tiles, a multiple of the coarse cell size
    pub width: usize,
    /// Footprint height in tiles, a multiple of the coarse cell size
    pub height: usize,
    /// Height in levels
    pub levels: usize,
    #[serde(default)]
    pub groups: Vec<i32>,
}

impl MapBlock {
    /// Footprint in coarse cells, rounded up to whole cells
    pub fn footprint(&self) -> (usize, usize) {
        (
            self.width.div_ceil(CELL_SIZE),
            self.height.div_ceil(CELL_SIZE),
        )
    }

    /// Blocks with no explicit groups belong to the default group
    pub fn in_group(&self, group: i32) -> bool {
        if self.groups.is_empty() {
            group == GROUP_DEFAULT
        } else {
            self.groups.contains(&group)
        }
    }

    /// True when the block matches a command's group and name filters
    ///
    /// Empty filters match everything; a non-empty name filter wins over
    /// the group filter.
    pub fn matches(&self, groups: &[i32], names: &[String]) -> bool {
        if !names.is_empty() {
            return names.iter().any(|n| n == &self.name);
        }
        if groups.is_empty() {
            return true;
        }
        groups.iter().any(|g| self.in_group(*g))
    }
}
