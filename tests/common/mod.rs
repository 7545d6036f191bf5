//! Shared fixtures for integration tests: a small ruleset and
//! programmatically built binary block data.
#![allow(dead_code)]

use battleforge::core::types::MapSize;
use battleforge::generator::{
    CommandKind, Deployment, MapScript, MissionKind, ScriptCommand,
};
use battleforge::terrain::{
    MapBlock, MemorySource, ObjectSet, PartKind, Ruleset, SpecialTile, Terrain, TerrainObject,
    GROUP_LANDING,
};

/// Tile data where every tile carries the same part tuple
pub fn block_bytes(width: u8, height: u8, levels: u8, parts: [u8; 4]) -> Vec<u8> {
    let mut bytes = vec![height, width, levels];
    for _ in 0..(width as usize * height as usize * levels as usize) {
        bytes.extend_from_slice(&parts);
    }
    bytes
}

/// One 24-byte route record
pub fn route_record(x: u8, y: u8, z: u8, links: [u8; 5], rank: u8, priority: u8) -> [u8; 24] {
    let mut record = [0u8; 24];
    record[0] = y;
    record[1] = x;
    record[2] = z;
    for (k, link) in links.iter().enumerate() {
        record[4 + k * 3] = *link;
    }
    record[20] = rank;
    record[23] = priority;
    record
}

fn objects() -> ObjectSet {
    let mut start = TerrainObject::new(PartKind::Floor);
    start.special = SpecialTile::StartPoint;
    ObjectSet {
        name: "base_set".into(),
        objects: vec![
            TerrainObject::new(PartKind::Floor), // 1 in tile data
            TerrainObject::new(PartKind::WestWall), // 2
            start,                               // 3
        ],
    }
}

fn simple_block(name: &str, width: usize, height: usize, levels: usize, groups: Vec<i32>) -> MapBlock {
    MapBlock {
        name: name.into(),
        width,
        height,
        levels,
        groups,
    }
}

/// A farm terrain, a craft-interior terrain, and a trivial fill script
pub fn basic_ruleset() -> Ruleset {
    let mut ruleset = Ruleset::new();
    ruleset.add_terrain(Terrain {
        name: "farm".into(),
        script: "farm_default".into(),
        blocks: vec![
            simple_block("plain", 10, 10, 1, vec![]),
            simple_block("pad", 10, 10, 1, vec![GROUP_LANDING]),
            simple_block("quarters", 10, 10, 1, vec![]),
        ],
        object_sets: vec![objects()],
        seam: None,
    });
    let mut fill = ScriptCommand::new(CommandKind::FillArea);
    fill.blocks = vec!["plain".into()];
    ruleset.add_script(MapScript {
        name: "farm_default".into(),
        commands: vec![fill],
    });
    ruleset.add_terrain(Terrain {
        name: "craft_tiles".into(),
        script: "farm_default".into(),
        blocks: vec![simple_block("lander", 10, 20, 1, vec![])],
        object_sets: vec![objects()],
        seam: None,
    });
    ruleset
}

/// Tile and route bytes for every block `basic_ruleset` declares
pub fn basic_source() -> MemorySource {
    let mut source = MemorySource::new();
    source.insert_tiles("plain", block_bytes(10, 10, 1, [1, 0, 0, 0]));
    source.insert_tiles("pad", block_bytes(10, 10, 1, [1, 0, 0, 0]));
    // Living quarters floors double as deployment start points.
    source.insert_tiles("quarters", block_bytes(10, 10, 1, [3, 0, 0, 0]));
    // Craft interior floors are flagged start points.
    source.insert_tiles("lander", block_bytes(10, 20, 1, [3, 0, 0, 0]));
    // Each plain block carries a scout node and a leader node.
    let mut routes = Vec::new();
    routes.extend_from_slice(&route_record(2, 2, 0, [255; 5], 0, 1));
    routes.extend_from_slice(&route_record(5, 5, 0, [255; 5], 2, 3));
    source.insert_routes("plain", routes);
    source
}

pub fn skirmish(size: MapSize) -> Deployment {
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
