use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenError {
    #[error("no map script named '{0}' is defined")]
    ScriptNotFound(String),

    #[error("no terrain named '{0}' is defined")]
    TerrainNotFound(String),

    #[error("map block '{name}' declares {declared_width}x{declared_height} tiles but its data header says {header_width}x{header_height}")]
    BlockSizeMismatch {
        name: String,
        declared_width: usize,
        declared_height: usize,
        header_width: usize,
        header_height: usize,
    },

    #[error("map block '{name}' needs {required} levels at offset {offset} but the map is {depth} levels deep")]
    HeightOverBudget {
        name: String,
        required: usize,
        offset: usize,
        depth: usize,
    },

    #[error("command {index} ({kind}) could not place a required block")]
    PlacementExhausted { index: usize, kind: &'static str },

    #[error("resize is only legal before any block has been placed")]
    ResizeAfterPlacement,

    #[error("{0} coarse cells were left unfilled after the script finished")]
    UnfilledCells(usize),

    #[error("no {0} units could be placed")]
    NoUnitsPlaced(&'static str),

    #[error("map data error in '{name}': {source}")]
    Format {
        name: String,
        source: crate::terrain::formats::FormatError,
    },

    #[error("ruleset error: {0}")]
    Ruleset(String),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GenError>;
