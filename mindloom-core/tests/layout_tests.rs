// Tests for node placement and full-graph arrangement

use mindloom_core::graph::{GraphStore, Node, Position};
use mindloom_core::layout::{
    ARRANGE_PADDING, CHILD_SPACING_Y, PLACEMENT_PADDING, SIBLING_SPACING_X, auto_arrange,
    initial_root_position, place_child,
};

fn node_at(id: &str, level: u32, parent: Option<&str>, x: f64, y: f64) -> Node {
    let mut node = Node::placeholder(
        id,
        id.to_string(),
        level,
        parent.map(str::to_string),
        Position::new(x, y),
    );
    node.is_loading = false;
    node
}

fn overlap(a: (Position, f64, f64), b: (Position, f64, f64)) -> bool {
    a.0.x < b.0.x + b.1 && a.0.x + a.1 > b.0.x && a.0.y < b.0.y + b.2 && a.0.y + a.2 > b.0.y
}

// ============================================================================
// Child Placement Tests
// ============================================================================

#[test]
fn test_first_child_sits_centered_below_parent() {
    let mut graph = GraphStore::new();
    let parent = node_at("p", 0, None, 100.0, 100.0);
    graph.add_node(parent.clone());

    // Equal widths: centered means aligned with the parent.
    let pos = place_child(&graph, &parent, 400.0, 300.0);
    assert_eq!(pos, Position::new(100.0, 100.0 + CHILD_SPACING_Y));

    // A narrower child centers on the parent's midpoint.
    let narrow = place_child(&graph, &parent, 200.0, 300.0);
    assert_eq!(narrow.x, 100.0 + 400.0 / 2.0 - 200.0 / 2.0);
}

#[test]
fn test_siblings_form_a_row() {
    let mut graph = GraphStore::new();
    let parent = node_at("p", 0, None, 100.0, 100.0);
    graph.add_node(parent.clone());

    let first = place_child(&graph, &parent, 400.0, 300.0);
    graph.add_node(node_at("c1", 1, Some("p"), first.x, first.y));

    let second = place_child(&graph, &parent, 400.0, 300.0);
    assert_eq!(second.x, first.x + SIBLING_SPACING_X);
    assert_eq!(second.y, first.y);
}

#[test]
fn test_sibling_row_is_centered_as_a_group() {
    let mut graph = GraphStore::new();
    let parent = node_at("p", 0, None, 100.0, 100.0);
    graph.add_node(parent.clone());

    // Existing child parked far away so no collision shifting occurs.
    graph.add_node(node_at("c1", 1, Some("p"), 5000.0, 100.0 + CHILD_SPACING_Y));

    // Two-slot row centered on the parent's midpoint; the new child
    // takes the second slot.
    let parent_center = 100.0 + 400.0 / 2.0;
    let row_width = SIBLING_SPACING_X + 400.0;
    let expected_x = parent_center - row_width / 2.0 + SIBLING_SPACING_X;

    let pos = place_child(&graph, &parent, 400.0, 300.0);
    assert_eq!(pos.x, expected_x);
}

#[test]
fn test_occupied_slot_shifts_right() {
    let mut graph = GraphStore::new();
    let parent = node_at("p", 0, None, 100.0, 100.0);
    graph.add_node(parent.clone());

    // Park an unrelated node exactly on the first child slot.
    graph.add_node(node_at(
        "squatter",
        0,
        None,
        100.0,
        100.0 + CHILD_SPACING_Y,
    ));

    let pos = place_child(&graph, &parent, 400.0, 300.0);
    assert!(pos.x > 100.0);
    assert_eq!(pos.y, 100.0 + CHILD_SPACING_Y);
    assert!(!overlap(
        (pos, 400.0, 300.0),
        (Position::new(100.0, 100.0 + CHILD_SPACING_Y), 400.0, 300.0)
    ));
}

#[test]
fn test_placement_keeps_padding_clearance() {
    let mut graph = GraphStore::new();
    let parent = node_at("p", 0, None, 100.0, 100.0);
    graph.add_node(parent.clone());

    // A node 10px to the right of the default slot's edge: not touching,
    // but inside the required clearance, so the slot must be rejected.
    let blocker_x = 100.0 + 400.0 + PLACEMENT_PADDING / 2.0;
    graph.add_node(node_at(
        "blocker",
        0,
        None,
        blocker_x,
        100.0 + CHILD_SPACING_Y,
    ));

    let pos = place_child(&graph, &parent, 400.0, 300.0);
    assert!(
        pos.x + 400.0 + PLACEMENT_PADDING <= blocker_x
            || pos.x >= blocker_x + 400.0 + PLACEMENT_PADDING
    );
}

#[test]
fn test_crowded_canvas_still_returns_a_position() {
    let mut graph = GraphStore::new();
    let parent = node_at("p", 0, None, 0.0, 0.0);
    graph.add_node(parent.clone());

    // Wall off every candidate slot the bounded scan can reach.
    for i in 0..20 {
        graph.add_node(node_at(
            &format!("wall{}", i),
            0,
            None,
            i as f64 * (SIBLING_SPACING_X / 2.0),
            CHILD_SPACING_Y,
        ));
    }

    // The scan gives up after its attempt budget rather than looping.
    let pos = place_child(&graph, &parent, 400.0, 300.0);
    assert_eq!(pos.y, CHILD_SPACING_Y);
}

#[test]
fn test_initial_root_position_centers_in_viewport() {
    // Viewport center minus half the default node dimensions.
    let pos = initial_root_position(1200.0, 800.0);
    assert_eq!(pos, Position::new(400.0, 250.0));

    let small = initial_root_position(800.0, 600.0);
    assert_eq!(small, Position::new(200.0, 150.0));
}

// ============================================================================
// Auto-Arrange Tests
// ============================================================================

#[test]
fn test_auto_arrange_empty_graph() {
    let graph = GraphStore::new();
    assert!(auto_arrange(&graph).is_empty());
}

#[test]
fn test_auto_arrange_rows_by_level() {
    let mut graph = GraphStore::new();
    graph.add_node(node_at("root", 0, None, 900.0, 900.0));
    graph.add_node(node_at("a", 1, Some("root"), 5.0, 5.0));
    graph.add_node(node_at("b", 1, Some("root"), -50.0, 700.0));

    let positions = auto_arrange(&graph);
    assert_eq!(positions.len(), 3);

    let pos = |id: &str| positions.iter().find(|(i, _)| i == id).unwrap().1;
    let root = pos("root");
    let a = pos("a");
    let b = pos("b");

    // One row per level, level 1 strictly below level 0.
    assert_eq!(root.y, ARRANGE_PADDING);
    assert_eq!(a.y, b.y);
    assert!(a.y > root.y);

    // Current positions are ignored; the widest row starts at the
    // padding and the single-node root row centers over it.
    assert_eq!(a.x, ARRANGE_PADDING);
    assert!(root.x > a.x);
}

#[test]
fn test_auto_arrange_centers_rows_on_common_axis() {
    let mut graph = GraphStore::new();
    graph.add_node(node_at("root", 0, None, 0.0, 0.0));
    graph.add_node(node_at("c1", 1, Some("root"), 0.0, 0.0));
    graph.add_node(node_at("c2", 1, Some("root"), 0.0, 0.0));
    graph.add_node(node_at("c3", 1, Some("root"), 0.0, 0.0));

    let positions = auto_arrange(&graph);
    let pos = |id: &str| positions.iter().find(|(i, _)| i == id).unwrap().1;

    // The root's midpoint lines up with the child row's midpoint.
    let child_row_width = 3.0 * 400.0 + 2.0 * 50.0;
    let child_row_center = ARRANGE_PADDING + child_row_width / 2.0;
    let root_center = pos("root").x + 400.0 / 2.0;
    assert_eq!(root_center, child_row_center);
}

#[test]
fn test_auto_arrange_produces_no_overlaps() {
    let mut graph = GraphStore::new();
    graph.add_node(node_at("r1", 0, None, 0.0, 0.0));
    graph.add_node(node_at("r2", 0, None, 0.0, 0.0));
    graph.add_node(node_at("c1", 1, Some("r1"), 0.0, 0.0));
    graph.add_node(node_at("c2", 1, Some("r1"), 0.0, 0.0));
    graph.add_node(node_at("c3", 1, Some("r2"), 0.0, 0.0));
    graph.add_node(node_at("g1", 2, Some("c1"), 0.0, 0.0));

    let positions = auto_arrange(&graph);
    for (i, (id_a, pos_a)) in positions.iter().enumerate() {
        let node_a = graph.get_node(id_a).unwrap();
        for (id_b, pos_b) in positions.iter().skip(i + 1) {
            let node_b = graph.get_node(id_b).unwrap();
            assert!(
                !overlap(
                    (*pos_a, node_a.width, node_a.height),
                    (*pos_b, node_b.width, node_b.height)
                ),
                "{} overlaps {}",
                id_a,
                id_b
            );
        }
    }
}

#[test]
fn test_auto_arrange_keeps_siblings_adjacent() {
    let mut graph = GraphStore::new();
    graph.add_node(node_at("r1", 0, None, 0.0, 0.0));
    graph.add_node(node_at("r2", 0, None, 500.0, 0.0));
    graph.add_node(node_at("x1", 1, Some("r2"), 0.0, 0.0));
    graph.add_node(node_at("y1", 1, Some("r1"), 0.0, 0.0));
    graph.add_node(node_at("y2", 1, Some("r1"), 0.0, 0.0));

    let positions = auto_arrange(&graph);
    let row: Vec<&str> = {
        let mut level1: Vec<(&str, Position)> = positions
            .iter()
            .filter(|(id, _)| id != "r1" && id != "r2")
            .map(|(id, p)| (id.as_str(), *p))
            .collect();
        level1.sort_by(|a, b| a.1.x.total_cmp(&b.1.x));
        level1.into_iter().map(|(id, _)| id).collect()
    };

    // Children of r1 sit next to each other, ordered by parent then id.
    assert_eq!(row, vec!["y1", "y2", "x1"]);
}

#[test]
fn test_auto_arrange_positions_are_non_negative() {
    let mut graph = GraphStore::new();
    graph.add_node(node_at("a", 0, None, -400.0, -900.0));
    graph.add_node(node_at("b", 1, Some("a"), -1000.0, -1.0));

    for (_, pos) in auto_arrange(&graph) {
        assert!(pos.x >= ARRANGE_PADDING);
        assert!(pos.y >= ARRANGE_PADDING);
    }
}
