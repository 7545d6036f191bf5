//! Seam drilling
//!
//! Adjacent placed blocks are walled off from each other by their own
//! edge geometry. A drilling pass opens a passage across each flagged
//! seam: intervening walls are removed over a declared sub-rectangle,
//! the floor is optionally replaced, and the perpendicular wall and
//! corner pieces on both sides are patched with terrain-declared
//! replacement objects. The pass only rewrites tile parts; blocks never
//! move. Running it twice changes nothing the first run didn't.

use crate::battlefield::state::Battlefield;
use crate::battlefield::tile::TilePart;
use crate::core::types::CELL_SIZE;
use crate::generator::placement::BlockGrid;
use crate::terrain::objects::SeamSpec;

/// Drill every flagged seam between occupied neighbor cells
///
/// `object_offset` re-bases the seam's terrain-relative replacement
/// indices into the run's object table.
pub fn drill(field: &mut Battlefield, grid: &BlockGrid, seam: &SeamSpec, object_offset: u16) {
    let mut opened = 0;
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let flag = grid.drill_flag(x, y);
            if flag.east() && grid.is_occupied(x + 1, y) {
                drill_east(field, x, y, seam, object_offset);
                opened += 1;
            }
            if flag.south() && grid.is_occupied(x, y + 1) {
                drill_south(field, x, y, seam, object_offset);
                opened += 1;
            }
        }
    }
    tracing::debug!(opened, "drilled seams");
}

fn set_part(field: &mut Battlefield, x: usize, y: usize, z: usize, part: TilePart, object: u16) {
    if let Some(tile) = field.tile_mut(x, y, z) {
        tile.set_part(part, object);
    }
}

fn clear_part(field: &mut Battlefield, x: usize, y: usize, z: usize, part: TilePart) {
    if let Some(tile) = field.tile_mut(x, y, z) {
        tile.clear_part(part);
    }
}

/// Open the seam between cell (x, y) and its eastern neighbor
fn drill_east(field: &mut Battlefield, x: usize, y: usize, seam: &SeamSpec, offset: u16) {
    let z = seam.level;
    // First tile column of the eastern block; its west walls are the
    // intervening ones.
    let bx = (x + 1) * CELL_SIZE;
    let y0 = y * CELL_SIZE + seam.offset;
    let y1 = y0 + seam.width;

    for ty in y0..y1 {
        clear_part(field, bx, ty, z, TilePart::WestWall);
        for tx in [bx - 1, bx] {
            clear_part(field, tx, ty, z, TilePart::Object);
            if let Some(floor) = seam.floor {
                set_part(field, tx, ty, z, TilePart::Floor, offset + floor);
            }
        }
    }

    // Passage side walls and the butt ends of the cut wall run.
    if let Some(north) = seam.north_wall {
        for tx in [bx - 1, bx] {
            set_part(field, tx, y0, z, TilePart::NorthWall, offset + north);
            set_part(field, tx, y1, z, TilePart::NorthWall, offset + north);
        }
    }
    if let Some(corner) = seam.corner {
        if y0 > 0 {
            set_part(field, bx, y0 - 1, z, TilePart::Object, offset + corner);
        }
        set_part(field, bx, y1, z, TilePart::Object, offset + corner);
    }
}

/// Open the seam between cell (x, y) and its southern neighbor
fn drill_south(field: &mut Battlefield, x: usize, y: usize, seam: &SeamSpec, offset: u16) {
    let z = seam.level;
    let by = (y + 1) * CELL_SIZE;
    let x0 = x * CELL_SIZE + seam.offset;
    let x1 = x0 + seam.width;

    for tx in x0..x1 {
        clear_part(field, tx, by, z, TilePart::NorthWall);
        for ty in [by - 1, by] {
            clear_part(field, tx, ty, z, TilePart::Object);
            if let Some(floor) = seam.floor {
                set_part(field, tx, ty, z, TilePart::Floor, offset + floor);
            }
        }
    }

    if let Some(west) = seam.west_wall {
        for ty in [by - 1, by] {
            set_part(field, x0, ty, z, TilePart::WestWall, offset + west);
            set_part(field, x1, ty, z, TilePart::WestWall, offset + west);
        }
    }
    if let Some(corner) = seam.corner {
        if x0 > 0 {
            set_part(field, x0 - 1, by, z, TilePart::Object, offset + corner);
        }
        set_part(field, x1, by, z, TilePart::Object, offset + corner);
    }
}
