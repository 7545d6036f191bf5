//! Generation configuration with documented constants
//!
//! The tuning knobs of the generator are collected here with
//! explanations of their purpose and how they interact.

/// Configuration for a battlefield generation run
///
/// The defaults reproduce the behavior the stock scripts were authored
/// against. Changing them changes layout density and connectivity.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    // === VERTICAL COMPOSITOR ===
    /// Bound on filler attempts while stacking vertical levels in one cell
    ///
    /// The compositor cycles through the filler rotation consuming the
    /// height budget; a rotation whose declared heights can never sum
    /// to the remaining budget would otherwise loop forever. One
    /// attempt is one considered (entry, block) pair, so the bound
    /// scales with rotation length, not map size.
    pub level_fill_retries: u32,

    // === NAVIGATION GRAPH ===
    /// Horizontal snap distance for synthesized up/down links (tiles)
    ///
    /// During the second reconciliation sub-pass, two vertically stacked
    /// nodes closer than this in both x and y are linked even when the
    /// route data authored no link between them. Vertical-level blocks
    /// are authored standalone and cannot know their neighbors.
    pub vertical_snap_distance: i32,

    /// Vertical snap distance for synthesized up/down links (levels)
    pub vertical_snap_levels: i32,

    // === DEPLOYMENT ===
    /// Search radius when falling back to "place near a same-faction unit"
    ///
    /// Applied when no rank-appropriate navigation node is free for a
    /// hostile unit. Measured in tiles, Chebyshev.
    pub spawn_fallback_radius: i32,

    /// Default z offset for a craft interior when no craft vertical level
    /// is declared: directly above the landing-zone blocks.
    pub default_craft_level: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            level_fill_retries: 500,
            vertical_snap_distance: 3,
            vertical_snap_levels: 3,
            spawn_fallback_radius: 5,
            default_craft_level: 1,
        }
    }
}
