//! Navigation graph nodes
//!
//! Route files store link slots as connect ids with small sentinel
//! values meaning "connect to the block-neighbor in this compass
//! direction". `NodeLink` models the slot as a closed sum so a resolved
//! id and a pending sentinel cannot be confused.
//!
//! Nodes whose authored position falls outside their block's footprint
//! are kept as dummies rather than deleted: link slots in the binary
//! format are file-order indices, and deleting a record would shift
//! every later index.

use serde::{Deserialize, Serialize};

use crate::core::types::{Direction, Position};
use crate::terrain::formats::{self, RawRouteRecord};

/// One link slot of a route node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NodeLink {
    #[default]
    Unused,
    /// Pending connection to the neighbor block in this direction
    Neighbor(Direction),
    /// Resolved connection to another node
    Node(usize),
}

impl NodeLink {
    /// Decode a raw connect id, re-basing real ids by `offset`
    pub fn from_raw(raw: u8, offset: usize) -> Self {
        match raw {
            formats::LINK_UNUSED => NodeLink::Unused,
            formats::LINK_NORTH => NodeLink::Neighbor(Direction::North),
            formats::LINK_EAST => NodeLink::Neighbor(Direction::East),
            formats::LINK_SOUTH => NodeLink::Neighbor(Direction::South),
            formats::LINK_WEST => NodeLink::Neighbor(Direction::West),
            id => NodeLink::Node(id as usize + offset),
        }
    }
}

/// A navigation graph node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteNode {
    /// Index of this node in the battlefield node list
    pub id: usize,
    pub pos: Position,
    /// Which block load (or vertical-level placement) produced this node
    pub segment: u16,
    pub links: [NodeLink; formats::NODE_LINKS],
    pub kind: u8,
    pub rank: u8,
    pub flags: u8,
    pub priority: u8,
    /// Culled (out of bounds), retained only for link-index stability
    pub dummy: bool,
}

impl RouteNode {
    /// Build a node from a raw record
    ///
    /// `origin` is the world position of the owning block's corner,
    /// `id_offset` re-bases intra-block link indices to battlefield
    /// node ids.
    pub fn from_raw(
        record: &RawRouteRecord,
        id: usize,
        origin: Position,
        segment: u16,
        id_offset: usize,
    ) -> Self {
        let mut links = [NodeLink::Unused; formats::NODE_LINKS];
        for (slot, raw) in links.iter_mut().zip(record.links.iter()) {
            *slot = NodeLink::from_raw(*raw, id_offset);
        }
        Self {
            id,
            pos: Position::new(
                origin.x + record.x as i32,
                origin.y + record.y as i32,
                origin.z + record.z as i32,
            ),
            segment,
            links,
            kind: record.kind,
            rank: record.rank,
            flags: record.flags,
            priority: record.priority,
            dummy: false,
        }
    }

    pub fn has_link_to(&self, id: usize) -> bool {
        self.links.iter().any(|l| *l == NodeLink::Node(id))
    }

    /// First pending link in the given direction, if any
    pub fn pending_link(&self, dir: Direction) -> Option<usize> {
        self.links
            .iter()
            .position(|l| *l == NodeLink::Neighbor(dir))
    }

    /// First unused slot, if any
    pub fn free_slot(&self) -> Option<usize> {
        self.links.iter().position(|l| *l == NodeLink::Unused)
    }
}
