//! Binary terrain format decoding
//!
//! Two fixed-layout formats come out of the authoring pipeline:
//!
//! * the tile-layout format: a 3-byte header (Y, X, Z dimensions)
//!   followed by one 4-byte tuple per tile (floor, west wall, north
//!   wall, object part indices), x fastest, then y, with z running
//!   from the top of the block downward;
//! * the route-node format: fixed 24-byte records carrying a position,
//!   five link slots, and type/rank/flags/priority bytes.
//!
//! Decoding is strict about sizes: a truncated file or trailing bytes
//! past the declared tuple count is an error, never silently ignored.

use thiserror::Error;

/// Errors produced while decoding binary terrain data
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("tile data is missing its 3-byte dimension header")]
    MissingHeader,

    #[error("tile data declares a zero dimension")]
    ZeroDimension,

    #[error("data truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("{extra} bytes of data past the declared record count")]
    TrailingData { extra: usize },
}

/// Number of bytes per tile tuple: floor, west wall, north wall, object
pub const TILE_TUPLE: usize = 4;
/// Number of bytes per route-node record
pub const ROUTE_RECORD: usize = 24;
/// Link slots per route node
pub const NODE_LINKS: usize = 5;

/// Link-slot sentinel: slot is unused
pub const LINK_UNUSED: u8 = 255;
/// Link-slot sentinel: connect to the block-neighbor to the north
pub const LINK_NORTH: u8 = 254;
/// Link-slot sentinel: connect to the block-neighbor to the east
pub const LINK_EAST: u8 = 253;
/// Link-slot sentinel: connect to the block-neighbor to the south
pub const LINK_SOUTH: u8 = 252;
/// Link-slot sentinel: connect to the block-neighbor to the west
pub const LINK_WEST: u8 = 251;

/// Decoded tile data for one block, stored bottom-up
#[derive(Debug, Clone)]
pub struct BlockTiles {
    pub width: usize,
    pub height: usize,
    pub levels: usize,
    cells: Vec<[u8; TILE_TUPLE]>,
}

impl BlockTiles {
    /// Part tuple at block-local coordinates, z = 0 at the bottom
    pub fn parts(&self, x: usize, y: usize, z: usize) -> [u8; TILE_TUPLE] {
        self.cells[(z * self.height + y) * self.width + x]
    }

    /// Iterate every tile as (x, y, z, parts)
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, usize, [u8; TILE_TUPLE])> + '_ {
        let (w, h) = (self.width, self.height);
        self.cells.iter().enumerate().map(move |(i, parts)| {
            let x = i % w;
            let y = (i / w) % h;
            let z = i / (w * h);
            (x, y, z, *parts)
        })
    }

    pub fn tile_count(&self) -> usize {
        self.cells.len()
    }
}

/// Decode a tile-layout file
pub fn decode_block(bytes: &[u8]) -> Result<BlockTiles, FormatError> {
    if bytes.len() < 3 {
        return Err(FormatError::MissingHeader);
    }
    // Header stores Y before X.
    let height = bytes[0] as usize;
    let width = bytes[1] as usize;
    let levels = bytes[2] as usize;
    if width == 0 || height == 0 || levels == 0 {
        return Err(FormatError::ZeroDimension);
    }

    let expected = 3 + width * height * levels * TILE_TUPLE;
    if bytes.len() < expected {
        return Err(FormatError::Truncated {
            expected,
            actual: bytes.len(),
        });
    }
    if bytes.len() > expected {
        return Err(FormatError::TrailingData {
            extra: bytes.len() - expected,
        });
    }

    let mut cells = vec![[0u8; TILE_TUPLE]; width * height * levels];
    let mut offset = 3;
    // File order runs z from the top of the block downward.
    for z in (0..levels).rev() {
        for y in 0..height {
            for x in 0..width {
                let tuple = &bytes[offset..offset + TILE_TUPLE];
                cells[(z * height + y) * width + x] = [tuple[0], tuple[1], tuple[2], tuple[3]];
                offset += TILE_TUPLE;
            }
        }
    }

    Ok(BlockTiles {
        width,
        height,
        levels,
        cells,
    })
}

/// One undecorated route-node record as it appears on disk
#[derive(Debug, Clone, Copy)]
pub struct RawRouteRecord {
    pub x: u8,
    pub y: u8,
    pub z: u8,
    /// Connect ids; values 251..=255 are sentinels
    pub links: [u8; NODE_LINKS],
    pub kind: u8,
    pub rank: u8,
    pub flags: u8,
    pub priority: u8,
}

/// Decode a route-node file into raw records
pub fn decode_routes(bytes: &[u8]) -> Result<Vec<RawRouteRecord>, FormatError> {
    let extra = bytes.len() % ROUTE_RECORD;
    if extra != 0 {
        return Err(FormatError::TrailingData { extra });
    }

    let mut records = Vec::with_capacity(bytes.len() / ROUTE_RECORD);
    for rec in bytes.chunks_exact(ROUTE_RECORD) {
        // Layout: y, x, z, reserved, then 5 x (connect, 2 reserved),
        // then type, rank, flags, reserved, priority.
        let mut links = [LINK_UNUSED; NODE_LINKS];
        for (k, slot) in links.iter_mut().enumerate() {
            *slot = rec[4 + k * 3];
        }
        records.push(RawRouteRecord {
            y: rec[0],
            x: rec[1],
            z: rec[2],
            links,
            kind: rec[19],
            rank: rec[20],
            flags: rec[21],
            priority: rec[23],
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build tile data with every tuple set to the same parts
    fn uniform_block(width: u8, height: u8, levels: u8, parts: [u8; 4]) -> Vec<u8> {
        let mut bytes = vec![height, width, levels];
        for _ in 0..(width as usize * height as usize * levels as usize) {
            bytes.extend_from_slice(&parts);
        }
        bytes
    }

    #[test]
    fn test_decode_block_dimensions() {
        let bytes = uniform_block(10, 10, 2, [1, 0, 0, 0]);
        let tiles = decode_block(&bytes).unwrap();
        assert_eq!(tiles.width, 10);
        assert_eq!(tiles.height, 10);
        assert_eq!(tiles.levels, 2);
        assert_eq!(tiles.tile_count(), 200);
    }

    #[test]
    fn test_decode_block_z_descending_order() {
        // 1x1x2 block: the first tuple in the file is the TOP level.
        let mut bytes = vec![1, 1, 2];
        bytes.extend_from_slice(&[9, 0, 0, 0]); // top
        bytes.extend_from_slice(&[5, 0, 0, 0]); // bottom
        let tiles = decode_block(&bytes).unwrap();
        assert_eq!(tiles.parts(0, 0, 1)[0], 9);
        assert_eq!(tiles.parts(0, 0, 0)[0], 5);
    }

    #[test]
    fn test_decode_block_missing_header() {
        assert!(matches!(
            decode_block(&[10, 10]),
            Err(FormatError::MissingHeader)
        ));
    }

    #[test]
    fn test_decode_block_truncated() {
        let mut bytes = uniform_block(10, 10, 1, [1, 0, 0, 0]);
        bytes.truncate(bytes.len() - 5);
        assert!(matches!(
            decode_block(&bytes),
            Err(FormatError::Truncated { .. })
        ));
    }

    #[test]
    fn test_decode_block_trailing_data() {
        let mut bytes = uniform_block(10, 10, 1, [1, 0, 0, 0]);
        bytes.push(0);
        assert!(matches!(
            decode_block(&bytes),
            Err(FormatError::TrailingData { extra: 1 })
        ));
    }

    fn route_record(x: u8, y: u8, z: u8, links: [u8; 5]) -> [u8; 24] {
        let mut rec = [0u8; 24];
        rec[0] = y;
        rec[1] = x;
        rec[2] = z;
        for (k, link) in links.iter().enumerate() {
            rec[4 + k * 3] = *link;
        }
        rec[19] = 1; // type
        rec[20] = 2; // rank
        rec[23] = 3; // priority
        rec
    }

    #[test]
    fn test_decode_routes_record_layout() {
        let rec = route_record(4, 7, 1, [0, LINK_NORTH, LINK_UNUSED, LINK_UNUSED, LINK_UNUSED]);
        let records = decode_routes(&rec).unwrap();
        assert_eq!(records.len(), 1);
        let node = &records[0];
        assert_eq!((node.x, node.y, node.z), (4, 7, 1));
        assert_eq!(node.links[0], 0);
        assert_eq!(node.links[1], LINK_NORTH);
        assert_eq!(node.rank, 2);
        assert_eq!(node.priority, 3);
    }

    #[test]
    fn test_decode_routes_rejects_partial_record() {
        let bytes = [0u8; 30];
        assert!(matches!(
            decode_routes(&bytes),
            Err(FormatError::TrailingData { extra: 6 })
        ));
    }

    #[test]
    fn test_decode_routes_empty_is_ok() {
        assert!(decode_routes(&[]).unwrap().is_empty());
    }
}
