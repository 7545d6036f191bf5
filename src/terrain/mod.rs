//! Authoring-side terrain data: map block templates, terrain object
//! sets, binary data decoding, and ruleset registries.

pub mod block;
pub mod formats;
pub mod objects;
pub mod ruleset;
pub mod source;

pub use block::{MapBlock, GROUP_CROSSING, GROUP_DEFAULT, GROUP_EW_ROAD, GROUP_LANDING, GROUP_NS_ROAD};
pub use formats::{decode_block, decode_routes, BlockTiles, FormatError, RawRouteRecord};
pub use objects::{ObjectSet, PartKind, SeamSpec, SpecialTile, TerrainObject};
pub use ruleset::{Ruleset, Terrain};
pub use source::{DataSource, DirSource, MemorySource};
