pub mod config;
pub mod error;
pub mod rng;
pub mod types;

pub use config::GenerationConfig;
pub use error::{GenError, Result};
pub use rng::SeedScope;
pub use types::{Direction, GridRect, MapSize, Position, UnitId, CELL_SIZE};
