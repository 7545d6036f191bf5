//! Terrain object records
//!
//! Every tile part placed on the battlefield references one of these
//! records by index into the run's loaded object table.

use serde::{Deserialize, Serialize};

/// Which slot of a tile a terrain object occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartKind {
    Floor,
    WestWall,
    NorthWall,
    Object,
}

/// Special role of a tile carrying this object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialTile {
    #[default]
    None,
    /// Player units may deploy here when no fixed layout applies
    StartPoint,
    /// Map exit tile
    Exit,
}

/// One terrain object definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainObject {
    pub kind: PartKind,
    #[serde(default)]
    pub special: SpecialTile,
    /// Units cannot stand on a tile whose object slot blocks movement
    #[serde(default)]
    pub blocks_movement: bool,
}

impl TerrainObject {
    pub fn new(kind: PartKind) -> Self {
        Self {
            kind,
            special: SpecialTile::None,
            blocks_movement: false,
        }
    }
}

/// A named, ordered collection of terrain objects
///
/// Block tile data indexes into the concatenation of its terrain's
/// object sets, so set order matters and is part of the terrain's
/// definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectSet {
    pub name: String,
    pub objects: Vec<TerrainObject>,
}

/// Seam drilling declaration for one terrain
///
/// `offset`/`width` select the sub-rectangle of the 10-tile seam that
/// gets opened; the replacement indices are relative to the terrain's
/// own object table and are re-based when the terrain loads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeamSpec {
    /// Z level the drilling operates on
    #[serde(default)]
    pub level: usize,
    /// First tile of the opened span, along the seam
    pub offset: usize,
    /// Number of tiles opened
    pub width: usize,
    #[serde(default)]
    pub floor: Option<u16>,
    #[serde(default)]
    pub west_wall: Option<u16>,
    #[serde(default)]
    pub north_wall: Option<u16>,
    #[serde(default)]
    pub corner: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_defaults() {
        let obj = TerrainObject::new(PartKind::Floor);
        assert_eq!(obj.special, SpecialTile::None);
        assert!(!obj.blocks_movement);
    }

    #[test]
    fn test_seam_spec_toml() {
        let spec: SeamSpec = toml::from_str(
            r#"
            level = 0
            offset = 4
            width = 2
            floor = 3
            "#,
        )
        .unwrap();
        assert_eq!(spec.offset, 4);
        assert_eq!(spec.width, 2);
        assert_eq!(spec.floor, Some(3));
        assert_eq!(spec.west_wall, None);
    }
}
