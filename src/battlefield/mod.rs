//! The generated product: the 3-D tile grid, the navigation node list,
//! and the spawned units and items.

pub mod node;
pub mod state;
pub mod tile;
pub mod unit;

pub use node::{NodeLink, RouteNode};
pub use state::Battlefield;
pub use tile::{Tile, TilePart};
pub use unit::{Faction, Item, Unit};
