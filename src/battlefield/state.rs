//! The shared battlefield state accumulated during generation

use serde::{Deserialize, Serialize};

use crate::battlefield::node::RouteNode;
use crate::battlefield::tile::Tile;
use crate::battlefield::unit::{Item, Unit};
use crate::core::types::{MapSize, Position, CELL_SIZE};
use crate::terrain::objects::TerrainObject;

/// The finished product of a generation run
///
/// The tile grid is a flat array with row-major stride indexing; it is
/// created once per generation and mutated throughout, and no other
/// component writes to it during the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Battlefield {
    size: MapSize,
    tiles: Vec<Tile>,
    /// All loaded route nodes, dummies included
    pub nodes: Vec<RouteNode>,
    pub units: Vec<Unit>,
    pub items: Vec<Item>,
    /// Terrain objects loaded this run; tile parts index into this
    pub objects: Vec<TerrainObject>,
    /// Segments at or below this id belong to flat (per-cell) block
    /// loads; higher segments come from vertical-level placements.
    pub flat_segment_end: u16,
    /// Originating "terrain/block" name per coarse cell, row-major;
    /// consumed by reinforcement-wave targeting
    pub origins: Vec<Option<String>>,
    /// Coarse cells reserved under a craft or UFO footprint
    pub landing_zones: Vec<bool>,
}

impl Battlefield {
    pub fn new(size: MapSize) -> Self {
        let cells = (size.width / CELL_SIZE) * (size.height / CELL_SIZE);
        Self {
            size,
            tiles: vec![Tile::default(); size.width * size.height * size.depth],
            nodes: Vec::new(),
            units: Vec::new(),
            items: Vec::new(),
            objects: Vec::new(),
            flat_segment_end: 0,
            origins: vec![None; cells],
            landing_zones: vec![false; cells],
        }
    }

    pub fn size(&self) -> MapSize {
        self.size
    }

    fn cell_index(&self, cell_x: usize, cell_y: usize) -> Option<usize> {
        let width = self.size.width / CELL_SIZE;
        let height = self.size.height / CELL_SIZE;
        (cell_x < width && cell_y < height).then(|| cell_y * width + cell_x)
    }

    /// Originating block of a coarse cell, as "terrain/block"
    pub fn block_origin(&self, cell_x: usize, cell_y: usize) -> Option<&str> {
        self.cell_index(cell_x, cell_y)
            .and_then(|i| self.origins[i].as_deref())
    }

    pub fn landing_zone(&self, cell_x: usize, cell_y: usize) -> bool {
        self.cell_index(cell_x, cell_y)
            .map(|i| self.landing_zones[i])
            .unwrap_or(false)
    }

    #[inline]
    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (z * self.size.height + y) * self.size.width + x
    }

    #[inline]
    pub fn tile(&self, x: usize, y: usize, z: usize) -> Option<&Tile> {
        if x < self.size.width && y < self.size.height && z < self.size.depth {
            Some(&self.tiles[self.index(x, y, z)])
        } else {
            None
        }
    }

    #[inline]
    pub fn tile_mut(&mut self, x: usize, y: usize, z: usize) -> Option<&mut Tile> {
        if x < self.size.width && y < self.size.height && z < self.size.depth {
            let idx = self.index(x, y, z);
            Some(&mut self.tiles[idx])
        } else {
            None
        }
    }

    pub fn tile_at(&self, pos: Position) -> Option<&Tile> {
        if pos.x < 0 || pos.y < 0 || pos.z < 0 {
            return None;
        }
        self.tile(pos.x as usize, pos.y as usize, pos.z as usize)
    }

    pub fn tile_at_mut(&mut self, pos: Position) -> Option<&mut Tile> {
        if pos.x < 0 || pos.y < 0 || pos.z < 0 {
            return None;
        }
        self.tile_mut(pos.x as usize, pos.y as usize, pos.z as usize)
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        self.size.contains(pos)
    }

    pub fn object(&self, id: u16) -> Option<&TerrainObject> {
        self.objects.get(id as usize)
    }

    /// All nodes that survived bounds culling
    pub fn live_nodes(&self) -> impl Iterator<Item = &RouteNode> {
        self.nodes.iter().filter(|n| !n.dummy)
    }
}
