//! Raw block data sources
//!
//! Terrain definitions name their tile and route entries; a `DataSource`
//! turns those names into bytes. Files are opened, fully read, and
//! closed synchronously per block - there is no caching here, the
//! generator keeps its own per-run loaded set.

use std::path::PathBuf;

use ahash::AHashMap;

use crate::core::error::{GenError, Result};

/// Supplies raw tile and route bytes for named blocks
pub trait DataSource {
    fn tile_data(&self, block: &str) -> Result<Vec<u8>>;
    fn route_data(&self, block: &str) -> Result<Vec<u8>>;
}

/// Reads block data from `<root>/blocks/<name>.blk` and
/// `<root>/routes/<name>.rte`
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl DataSource for DirSource {
    fn tile_data(&self, block: &str) -> Result<Vec<u8>> {
        let path = self.root.join("blocks").join(format!("{}.blk", block));
        Ok(std::fs::read(path)?)
    }

    fn route_data(&self, block: &str) -> Result<Vec<u8>> {
        let path = self.root.join("routes").join(format!("{}.rte", block));
        Ok(std::fs::read(path)?)
    }
}

/// In-memory source, used by tests and embedded rulesets
#[derive(Default)]
pub struct MemorySource {
    tiles: AHashMap<String, Vec<u8>>,
    routes: AHashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_tiles(&mut self, block: impl Into<String>, bytes: Vec<u8>) {
        self.tiles.insert(block.into(), bytes);
    }

    pub fn insert_routes(&mut self, block: impl Into<String>, bytes: Vec<u8>) {
        self.routes.insert(block.into(), bytes);
    }
}

impl DataSource for MemorySource {
    fn tile_data(&self, block: &str) -> Result<Vec<u8>> {
        self.tiles
            .get(block)
            .cloned()
            .ok_or_else(|| GenError::Ruleset(format!("no tile data for block '{}'", block)))
    }

    fn route_data(&self, block: &str) -> Result<Vec<u8>> {
        // Blocks without authored routes are legal; they just contribute
        // no navigation nodes.
        Ok(self.routes.get(block).cloned().unwrap_or_default())
    }
}
