//! Coarse block grid and the placement engine
//!
//! Placement works on a grid of 10x10-tile cells. All per-cell data
//! lives in flat arrays with row-major stride indexing behind
//! bounds-checked accessors.

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::core::error::{GenError, Result};
use crate::core::types::GridRect;

/// Occupancy of one coarse cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellState {
    #[default]
    Free,
    /// Secondary cell of a multi-cell footprint
    Placeholder,
    /// Top-left cell of a placed block; the index points into the
    /// interpreter's placement list
    Occupied(usize),
}

/// Which seams of a cell still need drilling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrillFlag {
    #[default]
    None,
    South,
    East,
    Both,
}

impl DrillFlag {
    fn with_east(self) -> Self {
        match self {
            DrillFlag::None | DrillFlag::East => DrillFlag::East,
            DrillFlag::South | DrillFlag::Both => DrillFlag::Both,
        }
    }

    fn with_south(self) -> Self {
        match self {
            DrillFlag::None | DrillFlag::South => DrillFlag::South,
            DrillFlag::East | DrillFlag::Both => DrillFlag::Both,
        }
    }

    pub fn east(&self) -> bool {
        matches!(self, DrillFlag::East | DrillFlag::Both)
    }

    pub fn south(&self) -> bool {
        matches!(self, DrillFlag::South | DrillFlag::Both)
    }
}

/// The coarse grid: block occupancy, drill flags, landing zones,
/// navigation segments, and originating block names
#[derive(Debug, Clone)]
pub struct BlockGrid {
    width: usize,
    height: usize,
    cells: Vec<CellState>,
    drill: Vec<DrillFlag>,
    landing: Vec<bool>,
    segments: Vec<u16>,
    origins: Vec<Option<String>>,
    pending: usize,
    placed_any: bool,
}

impl BlockGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![CellState::Free; width * height],
            drill: vec![DrillFlag::None; width * height],
            landing: vec![false; width * height],
            segments: vec![0; width * height],
            origins: vec![None; width * height],
            pending: width * height,
            placed_any: false,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Cells still waiting for a block
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn whole_rect(&self) -> GridRect {
        GridRect::new(0, 0, self.width, self.height)
    }

    #[inline]
    fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<CellState> {
        self.in_bounds(x, y).then(|| self.cells[self.idx(x, y)])
    }

    pub fn is_occupied(&self, x: usize, y: usize) -> bool {
        !matches!(self.cell(x, y), Some(CellState::Free) | None)
    }

    pub fn drill_flag(&self, x: usize, y: usize) -> DrillFlag {
        self.cell(x, y)
            .map(|_| self.drill[self.idx(x, y)])
            .unwrap_or_default()
    }

    pub fn landing_zone(&self, x: usize, y: usize) -> bool {
        self.in_bounds(x, y) && self.landing[self.idx(x, y)]
    }

    pub fn segment(&self, x: usize, y: usize) -> u16 {
        if self.in_bounds(x, y) {
            self.segments[self.idx(x, y)]
        } else {
            0
        }
    }

    pub fn set_segment(&mut self, x: usize, y: usize, segment: u16) {
        if self.in_bounds(x, y) {
            let idx = self.idx(x, y);
            self.segments[idx] = segment;
        }
    }

    pub fn origin(&self, x: usize, y: usize) -> Option<&str> {
        if self.in_bounds(x, y) {
            self.origins[self.idx(x, y)].as_deref()
        } else {
            None
        }
    }

    /// Reallocate the grid at new dimensions
    ///
    /// Only legal while no block has been placed.
    pub fn resize(&mut self, width: usize, height: usize) -> Result<()> {
        if self.placed_any {
            return Err(GenError::ResizeAfterPlacement);
        }
        *self = Self::new(width, height);
        Ok(())
    }

    /// True when every cell of `rect` is inside the grid and free
    pub fn rect_free(&self, rect: &GridRect) -> bool {
        self.whole_rect().contains_rect(rect)
            && rect.cells().all(|(x, y)| !self.is_occupied(x, y))
    }

    /// Every valid top-left position for a footprint of `fw` x `fh`
    /// cells inside the allowed rectangles (empty = whole map)
    pub fn candidate_positions(&self, rects: &[GridRect], fw: usize, fh: usize) -> Vec<(usize, usize)> {
        let whole = [self.whole_rect()];
        let allowed: &[GridRect] = if rects.is_empty() { &whole } else { rects };

        let mut candidates = Vec::new();
        for rect in allowed {
            for y in rect.y..rect.bottom().min(self.height) {
                for x in rect.x..rect.right().min(self.width) {
                    let footprint = GridRect::new(x, y, fw, fh);
                    if rect.contains_rect(&footprint) && self.rect_free(&footprint) {
                        candidates.push((x, y));
                    }
                }
            }
        }
        // Overlapping allowed rects must not double-weight a position.
        candidates.sort_unstable();
        candidates.dedup();
        candidates
    }

    /// Pick a placement uniformly at random among all valid positions
    pub fn find_placement(
        &self,
        rng: &mut ChaCha8Rng,
        rects: &[GridRect],
        fw: usize,
        fh: usize,
    ) -> Option<(usize, usize)> {
        self.candidate_positions(rects, fw, fh)
            .choose(rng)
            .copied()
    }

    /// Claim a footprint for a placement
    ///
    /// The top-left cell records the placement index, the rest become
    /// placeholders. The footprint's trailing east and south edges are
    /// flagged for seam drilling.
    pub fn occupy(&mut self, rect: &GridRect, placement: usize, origin: &str) {
        debug_assert!(self.rect_free(rect));
        for (x, y) in rect.cells() {
            let idx = self.idx(x, y);
            self.cells[idx] = if (x, y) == (rect.x, rect.y) {
                CellState::Occupied(placement)
            } else {
                CellState::Placeholder
            };
            self.origins[idx] = Some(origin.to_string());
            if x + 1 == rect.right() {
                self.drill[idx] = self.drill[idx].with_east();
            }
            if y + 1 == rect.bottom() {
                self.drill[idx] = self.drill[idx].with_south();
            }
            self.pending -= 1;
        }
        self.placed_any = true;
    }

    /// Return a footprint's cells to the free pool
    pub fn release(&mut self, rect: &GridRect) {
        for (x, y) in rect.cells() {
            if !self.in_bounds(x, y) {
                continue;
            }
            let idx = self.idx(x, y);
            if self.cells[idx] == CellState::Free {
                continue;
            }
            self.cells[idx] = CellState::Free;
            self.drill[idx] = DrillFlag::None;
            self.landing[idx] = false;
            self.segments[idx] = 0;
            self.origins[idx] = None;
            self.pending += 1;
        }
    }

    /// Flag every cell of a rect as a reserved landing zone
    pub fn mark_landing(&mut self, rect: &GridRect) {
        for (x, y) in rect.cells() {
            if self.in_bounds(x, y) {
                let idx = self.idx(x, y);
                self.landing[idx] = true;
            }
        }
    }

    /// Iterate the top-left cells of placed blocks, row-major
    pub fn occupied_cells(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.width).filter_map(move |x| match self.cells[self.idx(x, y)] {
                CellState::Occupied(p) => Some((x, y, p)),
                _ => None,
            })
        })
    }
}
