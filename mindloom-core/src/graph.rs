//! In-memory graph of nodes, edges and highlighted-text annotations for
//! the currently open mind map. All other components read and write the
//! graph through [`GraphStore`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_NODE_WIDTH: f64 = 400.0;
pub const DEFAULT_NODE_HEIGHT: f64 = 300.0;

/// Default edge rendering style carried through persistence.
pub const DEFAULT_EDGE_TYPE: &str = "smoothstep";

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One unit of content in the mind map forest.
///
/// A node is created with `is_loading = true` and empty content, mutated
/// in place while generation streams, and finalized or removed when the
/// request settles. `level` is the depth from the nearest root; a child's
/// level is always its parent's level plus one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub content: String,
    pub level: u32,
    pub parent_id: Option<String>,
    pub position: Position,
    pub width: f64,
    pub height: f64,
    pub is_loading: bool,
    pub selected: bool,
}

impl Node {
    /// A freshly created placeholder node awaiting generated content.
    pub fn placeholder(
        id: impl Into<String>,
        label: impl Into<String>,
        level: u32,
        parent_id: Option<String>,
        position: Position,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            content: String::new(),
            level,
            parent_id,
            position,
            width: DEFAULT_NODE_WIDTH,
            height: DEFAULT_NODE_HEIGHT,
            is_loading: true,
            selected: false,
        }
    }
}

/// A directed visual connector, independent of parent/child semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub edge_type: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: edge_id(&source, &target),
            source,
            target,
            edge_type: DEFAULT_EDGE_TYPE.to_string(),
        }
    }
}

/// An annotation on an origin node's content marking the span that
/// produced a child node. Offsets are plain-text character indices into
/// the origin node's de-tagged content, computed at creation time and
/// never revalidated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub start_index: usize,
    pub end_index: usize,
    /// Target child node the highlight links to.
    pub node_id: String,
    /// Target child's level, used for highlight coloring.
    pub level: u32,
}

/// Highlights keyed by *origin* node id; per-key lists are append-only.
pub type HighlightMap = HashMap<String, Vec<Highlight>>;

pub fn node_id() -> String {
    format!("node-{}", Uuid::new_v4())
}

/// Edge ids are derived deterministically from their endpoints.
pub fn edge_id(source: &str, target: &str) -> String {
    format!("edge-{}-{}", source, target)
}

/// An incremental delta produced by drag/resize interactions.
#[derive(Debug, Clone)]
pub enum NodeChange {
    Position { id: String, position: Position },
    Dimensions { id: String, width: f64, height: f64 },
}

impl NodeChange {
    /// Whether this change represents a deliberate user action that
    /// should be captured in history.
    pub fn is_user_action(&self) -> bool {
        matches!(self, NodeChange::Position { .. } | NodeChange::Dimensions { .. })
    }
}

/// Single source of truth for the currently open mind map.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    highlights: HighlightMap,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn highlights(&self) -> &HighlightMap {
        &self.highlights
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty() && self.highlights.is_empty()
    }

    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn children_of<'a>(&'a self, parent_id: &'a str) -> impl Iterator<Item = &'a Node> {
        self.nodes
            .iter()
            .filter(move |n| n.parent_id.as_deref() == Some(parent_id))
    }

    /// Full replacement after a load. No validation beyond shape.
    pub fn replace_all(&mut self, nodes: Vec<Node>, edges: Vec<Edge>, highlights: HighlightMap) {
        self.nodes = nodes;
        self.edges = edges;
        self.highlights = highlights;
    }

    /// Idempotent by id; guards against double-dispatch from concurrent
    /// callbacks.
    pub fn add_node(&mut self, node: Node) {
        if self.nodes.iter().any(|n| n.id == node.id) {
            debug!("add_node: {} already present, ignoring", node.id);
            return;
        }
        self.nodes.push(node);
    }

    /// Replaces the node with a matching id; silent no-op if absent,
    /// since late stream callbacks can race a deletion.
    pub fn update_node(&mut self, node: Node) {
        if let Some(existing) = self.nodes.iter_mut().find(|n| n.id == node.id) {
            *existing = node;
        }
    }

    /// Removes the node and every edge touching it. Does *not* cascade to
    /// descendants; callers delete subtrees child-first via
    /// [`GraphStore::remove_subtree`].
    pub fn remove_node(&mut self, id: &str) {
        self.nodes.retain(|n| n.id != id);
        self.edges.retain(|e| e.source != id && e.target != id);
    }

    pub fn add_edge(&mut self, edge: Edge) {
        if self.edges.iter().any(|e| e.id == edge.id) {
            return;
        }
        self.edges.push(edge);
    }

    pub fn set_highlights(&mut self, highlights: HighlightMap) {
        self.highlights = highlights;
    }

    pub fn append_highlight(&mut self, origin_id: &str, highlight: Highlight) {
        self.highlights
            .entry(origin_id.to_string())
            .or_default()
            .push(highlight);
    }

    /// All ids reachable from `id` via parent_id chains, excluding `id`
    /// itself, in breadth-first order.
    pub fn descendants(&self, id: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut frontier = vec![id.to_string()];
        while let Some(current) = frontier.pop() {
            for child in self.children_of(&current) {
                result.push(child.id.clone());
                frontier.push(child.id.clone());
            }
        }
        result
    }

    /// Deletes `id` and its whole subtree, child-first, together with
    /// every edge and highlight referencing a deleted node. Returns the
    /// removed ids (subtree root last).
    pub fn remove_subtree(&mut self, id: &str) -> Vec<String> {
        if self.get_node(id).is_none() {
            return Vec::new();
        }

        let mut removed = self.descendants(id);
        removed.push(id.to_string());
        // Child-first so no dangling parent_id exists mid-operation.
        for node_id in &removed {
            self.remove_node(node_id);
        }

        self.highlights.retain(|origin, _| !removed.contains(origin));
        for highlights in self.highlights.values_mut() {
            highlights.retain(|h| !removed.contains(&h.node_id));
        }
        self.highlights.retain(|_, highlights| !highlights.is_empty());

        debug!("remove_subtree: removed {} node(s)", removed.len());
        removed
    }

    /// Merges drag/resize deltas into the node list.
    pub fn apply_changes(&mut self, changes: &[NodeChange]) {
        for change in changes {
            match change {
                NodeChange::Position { id, position } => {
                    if let Some(node) = self.nodes.iter_mut().find(|n| n.id == *id) {
                        node.position = *position;
                    }
                }
                NodeChange::Dimensions { id, width, height } => {
                    if let Some(node) = self.nodes.iter_mut().find(|n| n.id == *id) {
                        node.width = *width;
                        node.height = *height;
                    }
                }
            }
        }
    }

    /// Toggles selection on the clicked node and clears every other
    /// selection; at most one node is selected at a time.
    pub fn select_node(&mut self, id: &str) {
        for node in &mut self.nodes {
            node.selected = node.id == id && !node.selected;
        }
    }

    /// Nodes whose generation has finished, eligible for persistence.
    pub fn completed_nodes(&self) -> Vec<&Node> {
        self.nodes.iter().filter(|n| !n.is_loading).collect()
    }
}
