//! Navigation graph stitching
//!
//! Route files can only name nodes inside their own block, so links
//! across block boundaries are authored as compass sentinels. After
//! every block is loaded, two reconciliation passes resolve them.
//!
//! The first pass works segment-to-segment and only touches nodes from
//! flat (per-cell) block loads. The second re-examines every live node,
//! flat and vertical alike: compass sentinels resolve against nodes at
//! the exact one-cell offset position, and for the up/down case new
//! bidirectional links are synthesized between close, unlinked pairs,
//! since vertical-level blocks are authored standalone and carry no
//! up/down sentinels. The overlap between the passes for flat nodes is
//! deliberate and must not be collapsed into one pass.

use crate::battlefield::node::NodeLink;
use crate::battlefield::state::Battlefield;
use crate::core::config::GenerationConfig;
use crate::core::types::{Position, CELL_SIZE};
use crate::generator::placement::BlockGrid;
use crate::terrain::formats::NODE_LINKS;

fn cell_of(pos: Position) -> (i32, i32) {
    (pos.x / CELL_SIZE as i32, pos.y / CELL_SIZE as i32)
}

/// Resolve and synthesize links across block and level boundaries
pub fn attach_links(field: &mut Battlefield, grid: &BlockGrid, config: &GenerationConfig) {
    let resolved_flat = resolve_flat_segments(field, grid);
    let (resolved_all, synthesized) = reconcile_all(field, config);
    let scrubbed = scrub_dummy_links(field);
    tracing::info!(
        resolved_flat,
        resolved_all,
        synthesized,
        scrubbed,
        nodes = field.nodes.len(),
        "attached navigation links"
    );
}

/// Sub-pass A: segment-based resolution for flat nodes
///
/// For every pending compass link of a node whose segment came from a
/// flat block load, look up the neighbor cell's segment and splice in
/// the reciprocal node's id on both sides.
fn resolve_flat_segments(field: &mut Battlefield, grid: &BlockGrid) -> usize {
    let flat_end = field.flat_segment_end;
    let count = field.nodes.len();
    let mut resolved = 0;

    for i in 0..count {
        if field.nodes[i].dummy
            || field.nodes[i].segment == 0
            || field.nodes[i].segment > flat_end
        {
            continue;
        }
        for slot in 0..NODE_LINKS {
            let NodeLink::Neighbor(dir) = field.nodes[i].links[slot] else {
                continue;
            };
            let (cx, cy) = cell_of(field.nodes[i].pos);
            let (dx, dy) = dir.offset();
            let (nx, ny) = (cx + dx, cy + dy);
            if nx < 0 || ny < 0 {
                continue;
            }
            let segment = grid.segment(nx as usize, ny as usize);
            if segment == 0 {
                continue;
            }
            let back = dir.opposite();
            let target = (0..count).find(|&j| {
                j != i
                    && !field.nodes[j].dummy
                    && field.nodes[j].segment == segment
                    && field.nodes[j].pending_link(back).is_some()
            });
            if let Some(j) = target {
                let back_slot = field.nodes[j].pending_link(back).expect("checked above");
                field.nodes[i].links[slot] = NodeLink::Node(j);
                field.nodes[j].links[back_slot] = NodeLink::Node(i);
                resolved += 1;
            }
        }
    }
    resolved
}

/// Sub-pass B: position-based reconciliation over all live nodes
///
/// Compass sentinels resolve against a node at exactly one cell's
/// offset with a complementary pending link. Up/down connectivity is
/// synthesized: any two unlinked nodes within the snap distance, at
/// least one of them from a vertical-level segment, get a fresh
/// bidirectional link.
fn reconcile_all(field: &mut Battlefield, config: &GenerationConfig) -> (usize, usize) {
    let count = field.nodes.len();
    let mut resolved = 0;

    for i in 0..count {
        if field.nodes[i].dummy {
            continue;
        }
        for slot in 0..NODE_LINKS {
            let NodeLink::Neighbor(dir) = field.nodes[i].links[slot] else {
                continue;
            };
            let (dx, dy) = dir.offset();
            let want = Position::new(
                field.nodes[i].pos.x + dx * CELL_SIZE as i32,
                field.nodes[i].pos.y + dy * CELL_SIZE as i32,
                field.nodes[i].pos.z,
            );
            let back = dir.opposite();
            let target = (0..count).find(|&j| {
                j != i
                    && !field.nodes[j].dummy
                    && field.nodes[j].pos == want
                    && field.nodes[j].pending_link(back).is_some()
            });
            if let Some(j) = target {
                let back_slot = field.nodes[j].pending_link(back).expect("checked above");
                field.nodes[i].links[slot] = NodeLink::Node(j);
                field.nodes[j].links[back_slot] = NodeLink::Node(i);
                resolved += 1;
            }
        }
    }

    let flat_end = field.flat_segment_end;
    let mut synthesized = 0;
    for i in 0..count {
        if field.nodes[i].dummy {
            continue;
        }
        for j in (i + 1)..count {
            if field.nodes[j].dummy {
                continue;
            }
            if field.nodes[i].segment <= flat_end && field.nodes[j].segment <= flat_end {
                continue;
            }
            let a = field.nodes[i].pos;
            let b = field.nodes[j].pos;
            let dz = (a.z - b.z).abs();
            if dz == 0
                || dz > config.vertical_snap_levels
                || (a.x - b.x).abs() > config.vertical_snap_distance
                || (a.y - b.y).abs() > config.vertical_snap_distance
            {
                continue;
            }
            if field.nodes[i].has_link_to(j) || field.nodes[j].has_link_to(i) {
                continue;
            }
            let (Some(slot_i), Some(slot_j)) =
                (field.nodes[i].free_slot(), field.nodes[j].free_slot())
            else {
                continue;
            };
            field.nodes[i].links[slot_i] = NodeLink::Node(j);
            field.nodes[j].links[slot_j] = NodeLink::Node(i);
            synthesized += 1;
        }
    }
    (resolved, synthesized)
}

/// Drop resolved links that point at dummy nodes
///
/// A block may author a link toward a record that was culled at load
/// time; those slots revert to unused so every live node's links end
/// the build pointing at live nodes or defined sentinels.
fn scrub_dummy_links(field: &mut Battlefield) -> usize {
    let dummy: Vec<bool> = field.nodes.iter().map(|n| n.dummy).collect();
    let mut scrubbed = 0;
    for node in field.nodes.iter_mut().filter(|n| !n.dummy) {
        for link in node.links.iter_mut() {
            if let NodeLink::Node(id) = link {
                if dummy.get(*id).copied().unwrap_or(true) {
                    *link = NodeLink::Unused;
                    scrubbed += 1;
                }
            }
        }
    }
    scrubbed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battlefield::node::RouteNode;
    use crate::core::types::{Direction, MapSize};
    use crate::terrain::formats::NODE_LINKS;

    fn node(id: usize, pos: Position, segment: u16) -> RouteNode {
        RouteNode {
            id,
            pos,
            segment,
            links: [NodeLink::Unused; NODE_LINKS],
            kind: 0,
            rank: 0,
            flags: 0,
            priority: 0,
            dummy: false,
        }
    }

    fn field_with_grid(cells: usize) -> (Battlefield, BlockGrid) {
        let field = Battlefield::new(MapSize::new(cells * 10, 10, 4));
        let mut grid = BlockGrid::new(cells, 1);
        for x in 0..cells {
            grid.occupy(
                &crate::core::types::GridRect::new(x, 0, 1, 1),
                x,
                "farm/plain",
            );
            grid.set_segment(x, 0, (x + 1) as u16);
        }
        (field, grid)
    }

    #[test]
    fn test_flat_compass_links_resolve_reciprocally() {
        let (mut field, grid) = field_with_grid(2);
        field.flat_segment_end = 2;

        let mut east = node(0, Position::new(9, 5, 0), 1);
        east.links[0] = NodeLink::Neighbor(Direction::East);
        let mut west = node(1, Position::new(10, 5, 0), 2);
        west.links[0] = NodeLink::Neighbor(Direction::West);
        field.nodes = vec![east, west];

        attach_links(&mut field, &grid, &GenerationConfig::default());

        assert_eq!(field.nodes[0].links[0], NodeLink::Node(1));
        assert_eq!(field.nodes[1].links[0], NodeLink::Node(0));
    }

    #[test]
    fn test_sentinel_without_neighbor_survives() {
        let (mut field, grid) = field_with_grid(1);
        field.flat_segment_end = 1;

        let mut lone = node(0, Position::new(5, 5, 0), 1);
        lone.links[0] = NodeLink::Neighbor(Direction::East);
        field.nodes = vec![lone];

        attach_links(&mut field, &grid, &GenerationConfig::default());

        // No eastern neighbor cell exists; the sentinel stays.
        assert_eq!(
            field.nodes[0].links[0],
            NodeLink::Neighbor(Direction::East)
        );
    }

    #[test]
    fn test_second_pass_resolves_exact_offset_positions() {
        let (mut field, grid) = field_with_grid(2);
        // Mark both segments vertical so sub-pass A skips them.
        field.flat_segment_end = 0;

        let mut east = node(0, Position::new(3, 5, 1), 1);
        east.links[0] = NodeLink::Neighbor(Direction::East);
        let mut west = node(1, Position::new(13, 5, 1), 2);
        west.links[0] = NodeLink::Neighbor(Direction::West);
        field.nodes = vec![east, west];

        attach_links(&mut field, &grid, &GenerationConfig::default());

        assert_eq!(field.nodes[0].links[0], NodeLink::Node(1));
        assert_eq!(field.nodes[1].links[0], NodeLink::Node(0));
    }

    #[test]
    fn test_vertical_links_synthesized_within_snap_distance() {
        let (mut field, grid) = field_with_grid(1);
        field.flat_segment_end = 1;

        let ground = node(0, Position::new(5, 5, 0), 1);
        let upper = node(1, Position::new(6, 4, 2), 2); // vertical segment
        let far = node(2, Position::new(9, 9, 2), 2); // outside snap range of 0
        field.nodes = vec![ground, upper, far];

        attach_links(&mut field, &grid, &GenerationConfig::default());

        assert!(field.nodes[0].has_link_to(1));
        assert!(field.nodes[1].has_link_to(0));
        assert!(!field.nodes[0].has_link_to(2));
    }

    #[test]
    fn test_no_synthesis_between_flat_nodes() {
        let (mut field, grid) = field_with_grid(1);
        field.flat_segment_end = 1;

        // Both nodes flat: a multi-story block authors its own links.
        let a = node(0, Position::new(5, 5, 0), 1);
        let b = node(1, Position::new(5, 5, 1), 1);
        field.nodes = vec![a, b];

        attach_links(&mut field, &grid, &GenerationConfig::default());

        assert!(!field.nodes[0].has_link_to(1));
    }

    #[test]
    fn test_existing_links_not_duplicated() {
        let (mut field, grid) = field_with_grid(1);
        field.flat_segment_end = 1;

        let mut ground = node(0, Position::new(5, 5, 0), 1);
        ground.links[0] = NodeLink::Node(1);
        let mut upper = node(1, Position::new(5, 5, 1), 2);
        upper.links[0] = NodeLink::Node(0);
        field.nodes = vec![ground, upper];

        attach_links(&mut field, &grid, &GenerationConfig::default());

        let links_to_1 = field.nodes[0]
            .links
            .iter()
            .filter(|l| **l == NodeLink::Node(1))
            .count();
        assert_eq!(links_to_1, 1);
    }

    #[test]
    fn test_links_to_dummies_are_scrubbed() {
        let (mut field, grid) = field_with_grid(1);
        field.flat_segment_end = 1;

        let mut live = node(0, Position::new(5, 5, 0), 1);
        live.links[0] = NodeLink::Node(1);
        let mut culled = node(1, Position::new(200, 5, 0), 1);
        culled.dummy = true;
        field.nodes = vec![live, culled];

        attach_links(&mut field, &grid, &GenerationConfig::default());

        assert_eq!(field.nodes[0].links[0], NodeLink::Unused);
    }
}
