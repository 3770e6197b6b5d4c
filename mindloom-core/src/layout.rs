//! Geometric placement of nodes. Placement is advisory, not a constraint
//! solver: new children land in a centered row under their parent with a
//! bounded overlap-avoidance scan, and the full-graph arrangement rebuilds
//! the canvas by tree level.

use crate::graph::{DEFAULT_NODE_HEIGHT, DEFAULT_NODE_WIDTH, GraphStore, Node, Position};
use tracing::debug;

/// Horizontal gap between siblings in a child row.
pub const SIBLING_SPACING_X: f64 = 450.0;
/// Vertical gap between a parent and its child row.
pub const CHILD_SPACING_Y: f64 = 350.0;
/// Clearance required around a node before a slot counts as free.
pub const PLACEMENT_PADDING: f64 = 20.0;
/// Canvas margin applied by [`auto_arrange`].
pub const ARRANGE_PADDING: f64 = 50.0;
/// Gap between level rows in [`auto_arrange`].
pub const ARRANGE_ROW_GAP: f64 = 100.0;
/// Gap between nodes within an arranged row.
pub const ARRANGE_COL_GAP: f64 = 50.0;

/// Viewport assumed when the caller has no real one, e.g. headless use.
pub const DEFAULT_VIEWPORT_WIDTH: f64 = 1200.0;
pub const DEFAULT_VIEWPORT_HEIGHT: f64 = 800.0;

const MAX_PLACEMENT_ATTEMPTS: usize = 10;

/// Centers the first root of an empty canvas in the viewport.
pub fn initial_root_position(viewport_width: f64, viewport_height: f64) -> Position {
    Position::new(
        viewport_width / 2.0 - DEFAULT_NODE_WIDTH / 2.0,
        viewport_height / 2.0 - DEFAULT_NODE_HEIGHT / 2.0,
    )
}

/// Axis-aligned overlap test between a candidate slot and an existing
/// node's bounding box, with [`PLACEMENT_PADDING`] of clearance on every
/// side.
fn overlaps(candidate: Position, width: f64, height: f64, other: &Node) -> bool {
    candidate.x < other.position.x + other.width + PLACEMENT_PADDING
        && candidate.x + width + PLACEMENT_PADDING > other.position.x
        && candidate.y < other.position.y + other.height + PLACEMENT_PADDING
        && candidate.y + height + PLACEMENT_PADDING > other.position.y
}

fn occupied(graph: &GraphStore, candidate: Position, width: f64, height: f64) -> bool {
    graph
        .nodes()
        .iter()
        .any(|n| overlaps(candidate, width, height, n))
}

/// Picks a position for a new child of `parent`. Children form a single
/// row below the parent, centered as a group on the parent's horizontal
/// midpoint: with no siblings the child sits directly underneath, with
/// `n` siblings the new child takes the last slot of an (n+1)-slot row.
/// If the slot collides with an existing node the candidate shifts right
/// by half a slot, up to a fixed number of attempts; after that the last
/// candidate is used even if it overlaps.
pub fn place_child(graph: &GraphStore, parent: &Node, width: f64, height: f64) -> Position {
    let sibling_count = graph.children_of(&parent.id).count();
    let parent_center = parent.position.x + parent.width / 2.0;
    let row_width = sibling_count as f64 * SIBLING_SPACING_X + width;
    let row_left = parent_center - row_width / 2.0;

    let mut candidate = Position::new(
        row_left + sibling_count as f64 * SIBLING_SPACING_X,
        parent.position.y + CHILD_SPACING_Y,
    );

    for attempt in 0..MAX_PLACEMENT_ATTEMPTS {
        if !occupied(graph, candidate, width, height) {
            return candidate;
        }
        debug!(
            "place_child: slot ({}, {}) occupied, shifting (attempt {})",
            candidate.x,
            candidate.y,
            attempt + 1
        );
        candidate.x += SIBLING_SPACING_X / 2.0;
    }
    candidate
}

fn row_width(row: &[&Node]) -> f64 {
    row.iter().map(|n| n.width).sum::<f64>() + (row.len() - 1) as f64 * ARRANGE_COL_GAP
}

/// Recomputes every node position from tree structure alone: one row per
/// level, rows stacked by the tallest node of each preceding level and
/// centered on a shared vertical axis, nodes within a row ordered by
/// (parent id, node id) so siblings stay adjacent. Current positions are
/// ignored entirely. Returns the new positions without mutating the
/// graph.
pub fn auto_arrange(graph: &GraphStore) -> Vec<(String, Position)> {
    let max_level = match graph.nodes().iter().map(|n| n.level).max() {
        Some(level) => level,
        None => return Vec::new(),
    };

    let mut rows: Vec<Vec<&Node>> = Vec::new();
    for level in 0..=max_level {
        let mut row: Vec<&Node> = graph.nodes().iter().filter(|n| n.level == level).collect();
        if row.is_empty() {
            continue;
        }
        row.sort_by(|a, b| {
            (a.parent_id.as_deref(), a.id.as_str()).cmp(&(b.parent_id.as_deref(), b.id.as_str()))
        });
        rows.push(row);
    }

    // The widest row starts at the padding, so centering the others on
    // its axis can never produce a negative coordinate.
    let max_width = rows.iter().map(|r| row_width(r)).fold(0.0, f64::max);

    let mut positions = Vec::with_capacity(graph.nodes().len());
    let mut row_y = ARRANGE_PADDING;

    for row in &rows {
        let mut x = ARRANGE_PADDING + (max_width - row_width(row)) / 2.0;
        let mut row_height: f64 = 0.0;
        for node in row {
            positions.push((node.id.clone(), Position::new(x, row_y)));
            x += node.width + ARRANGE_COL_GAP;
            row_height = row_height.max(node.height);
        }
        row_y += row_height + ARRANGE_ROW_GAP;
    }

    positions
}
