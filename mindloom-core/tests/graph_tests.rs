// Tests for the in-memory graph store

use mindloom_core::graph::{
    Edge, GraphStore, Highlight, Node, NodeChange, Position, edge_id, node_id,
};

fn test_node(id: &str, level: u32, parent: Option<&str>) -> Node {
    let mut node = Node::placeholder(
        id,
        format!("label-{}", id),
        level,
        parent.map(str::to_string),
        Position::new(0.0, 0.0),
    );
    node.is_loading = false;
    node
}

// ============================================================================
// Id Generation Tests
// ============================================================================

#[test]
fn test_node_id_prefix_and_uniqueness() {
    let a = node_id();
    let b = node_id();
    assert!(a.starts_with("node-"));
    assert_ne!(a, b);
}

#[test]
fn test_edge_id_is_deterministic() {
    assert_eq!(edge_id("a", "b"), "edge-a-b");
    assert_eq!(edge_id("a", "b"), edge_id("a", "b"));
}

// ============================================================================
// Node Tests
// ============================================================================

#[test]
fn test_add_node_is_idempotent_by_id() {
    let mut graph = GraphStore::new();
    graph.add_node(test_node("n1", 0, None));
    graph.add_node(test_node("n1", 0, None));

    assert_eq!(graph.nodes().len(), 1);
}

#[test]
fn test_update_node_replaces_matching_id() {
    let mut graph = GraphStore::new();
    graph.add_node(test_node("n1", 0, None));

    let mut updated = test_node("n1", 0, None);
    updated.content = "fresh content".to_string();
    graph.update_node(updated);

    assert_eq!(graph.get_node("n1").unwrap().content, "fresh content");
    assert_eq!(graph.nodes().len(), 1);
}

#[test]
fn test_update_node_ignores_missing_id() {
    let mut graph = GraphStore::new();
    graph.update_node(test_node("ghost", 0, None));
    assert!(graph.nodes().is_empty());
}

#[test]
fn test_remove_node_drops_incident_edges() {
    let mut graph = GraphStore::new();
    graph.add_node(test_node("a", 0, None));
    graph.add_node(test_node("b", 1, Some("a")));
    graph.add_node(test_node("c", 0, None));
    graph.add_edge(Edge::new("a", "b"));
    graph.add_edge(Edge::new("c", "b"));

    graph.remove_node("b");

    assert!(graph.get_node("b").is_none());
    assert!(graph.edges().is_empty());
    assert!(graph.get_node("a").is_some());
}

#[test]
fn test_placeholder_starts_loading() {
    let node = Node::placeholder("n1", "topic", 0, None, Position::new(1.0, 2.0));
    assert!(node.is_loading);
    assert!(node.content.is_empty());
    assert!(!node.selected);
}

// ============================================================================
// Edge Tests
// ============================================================================

#[test]
fn test_add_edge_deduplicates_by_id() {
    let mut graph = GraphStore::new();
    graph.add_node(test_node("a", 0, None));
    graph.add_node(test_node("b", 1, Some("a")));
    graph.add_edge(Edge::new("a", "b"));
    graph.add_edge(Edge::new("a", "b"));

    assert_eq!(graph.edges().len(), 1);
}

// ============================================================================
// Subtree Tests
// ============================================================================

fn three_level_tree() -> GraphStore {
    let mut graph = GraphStore::new();
    graph.add_node(test_node("root", 0, None));
    graph.add_node(test_node("child1", 1, Some("root")));
    graph.add_node(test_node("child2", 1, Some("root")));
    graph.add_node(test_node("grandchild", 2, Some("child1")));
    graph.add_edge(Edge::new("root", "child1"));
    graph.add_edge(Edge::new("root", "child2"));
    graph.add_edge(Edge::new("child1", "grandchild"));
    graph
}

#[test]
fn test_descendants_excludes_self() {
    let graph = three_level_tree();
    let mut descendants = graph.descendants("root");
    descendants.sort();
    assert_eq!(descendants, vec!["child1", "child2", "grandchild"]);
    assert!(graph.descendants("grandchild").is_empty());
}

#[test]
fn test_remove_subtree_deletes_descendants_and_edges() {
    let mut graph = three_level_tree();
    let removed = graph.remove_subtree("child1");

    assert!(removed.contains(&"child1".to_string()));
    assert!(removed.contains(&"grandchild".to_string()));
    // Subtree root comes last
    assert_eq!(removed.last().unwrap(), "child1");

    assert!(graph.get_node("child1").is_none());
    assert!(graph.get_node("grandchild").is_none());
    assert!(graph.get_node("root").is_some());
    assert!(graph.get_node("child2").is_some());
    assert_eq!(graph.edges().len(), 1);
}

#[test]
fn test_remove_subtree_scrubs_highlights() {
    let mut graph = three_level_tree();
    graph.append_highlight(
        "root",
        Highlight {
            start_index: 0,
            end_index: 4,
            node_id: "child1".to_string(),
            level: 1,
        },
    );
    graph.append_highlight(
        "root",
        Highlight {
            start_index: 5,
            end_index: 9,
            node_id: "child2".to_string(),
            level: 1,
        },
    );
    graph.append_highlight(
        "child1",
        Highlight {
            start_index: 0,
            end_index: 3,
            node_id: "grandchild".to_string(),
            level: 2,
        },
    );

    graph.remove_subtree("child1");

    // Highlight keyed by the removed origin is gone, and the surviving
    // origin keeps only highlights targeting surviving nodes.
    assert!(!graph.highlights().contains_key("child1"));
    let root_highlights = graph.highlights().get("root").unwrap();
    assert_eq!(root_highlights.len(), 1);
    assert_eq!(root_highlights[0].node_id, "child2");
}

#[test]
fn test_remove_subtree_unknown_node_is_noop() {
    let mut graph = three_level_tree();
    let removed = graph.remove_subtree("ghost");
    assert!(removed.is_empty());
    assert_eq!(graph.nodes().len(), 4);
}

// ============================================================================
// Change Application Tests
// ============================================================================

#[test]
fn test_apply_changes_moves_and_resizes() {
    let mut graph = GraphStore::new();
    graph.add_node(test_node("n1", 0, None));

    graph.apply_changes(&[
        NodeChange::Position {
            id: "n1".to_string(),
            position: Position::new(10.0, 20.0),
        },
        NodeChange::Dimensions {
            id: "n1".to_string(),
            width: 500.0,
            height: 250.0,
        },
    ]);

    let node = graph.get_node("n1").unwrap();
    assert_eq!(node.position, Position::new(10.0, 20.0));
    assert_eq!(node.width, 500.0);
    assert_eq!(node.height, 250.0);
}

#[test]
fn test_apply_changes_unknown_id_is_noop() {
    let mut graph = GraphStore::new();
    graph.add_node(test_node("n1", 0, None));

    graph.apply_changes(&[NodeChange::Position {
        id: "ghost".to_string(),
        position: Position::new(99.0, 99.0),
    }]);

    assert_eq!(graph.get_node("n1").unwrap().position, Position::new(0.0, 0.0));
}

// ============================================================================
// Selection Tests
// ============================================================================

#[test]
fn test_select_node_is_exclusive() {
    let mut graph = GraphStore::new();
    graph.add_node(test_node("a", 0, None));
    graph.add_node(test_node("b", 0, None));

    graph.select_node("a");
    assert!(graph.get_node("a").unwrap().selected);
    assert!(!graph.get_node("b").unwrap().selected);

    graph.select_node("b");
    assert!(!graph.get_node("a").unwrap().selected);
    assert!(graph.get_node("b").unwrap().selected);
}

#[test]
fn test_select_node_toggles_on_reselect() {
    let mut graph = GraphStore::new();
    graph.add_node(test_node("a", 0, None));

    graph.select_node("a");
    graph.select_node("a");
    assert!(!graph.get_node("a").unwrap().selected);
}

// ============================================================================
// Completed Node Tests
// ============================================================================

#[test]
fn test_completed_nodes_excludes_loading() {
    let mut graph = GraphStore::new();
    graph.add_node(test_node("done", 0, None));
    graph.add_node(Node::placeholder(
        "pending",
        "topic",
        0,
        None,
        Position::new(0.0, 0.0),
    ));

    let completed = graph.completed_nodes();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].id, "done");
}
