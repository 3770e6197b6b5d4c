//! Orchestration of user actions against an open mind map: node
//! creation with streamed generation, subtree deletion, manual edits,
//! and undo/redo. A [`MapSession`] owns the graph behind a sync mutex
//! shared with the auto-saver; locks are taken briefly and never held
//! across an await point.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{debug, info, warn};

use mindloom_gen::{ChunkCallback, GenError, Generate, related_prompt, topic_prompt};

use crate::data::GraphData;
use crate::graph::{
    Edge, GraphStore, Highlight, Node, NodeChange, Position, node_id,
};
use crate::history::History;
use crate::layout::{
    ARRANGE_COL_GAP, DEFAULT_VIEWPORT_HEIGHT, DEFAULT_VIEWPORT_WIDTH, SIBLING_SPACING_X,
    auto_arrange, initial_root_position, place_child,
};
use crate::text::find_selection;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("An identical request is already in flight")]
    DuplicateRequest,
    #[error("Unknown node: {0}")]
    UnknownNode(String),
    #[error("Selection not found in node content")]
    SelectionNotFound,
    #[error(transparent)]
    Generation(#[from] GenError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// An open mind map plus the machinery acting on it.
pub struct MapSession {
    graph: Arc<Mutex<GraphStore>>,
    history: Mutex<History>,
    in_flight: Mutex<HashSet<String>>,
    system_prompt: Mutex<Option<String>>,
    generator: Arc<dyn Generate>,
}

impl MapSession {
    pub fn new(generator: Arc<dyn Generate>) -> Self {
        Self {
            graph: Arc::new(Mutex::new(GraphStore::new())),
            history: Mutex::new(History::new()),
            in_flight: Mutex::new(HashSet::new()),
            system_prompt: Mutex::new(None),
            generator,
        }
    }

    /// Shared handle for components that observe the graph, such as the
    /// auto-saver.
    pub fn graph(&self) -> Arc<Mutex<GraphStore>> {
        Arc::clone(&self.graph)
    }

    /// Runs `f` against a locked graph. A poisoned lock yields its
    /// inner state; no invariant spans a lock release.
    pub fn with_graph<T>(&self, f: impl FnOnce(&GraphStore) -> T) -> T {
        let graph = self.graph.lock().unwrap_or_else(|e| e.into_inner());
        f(&graph)
    }

    /// Hydrates the session from loaded data, resetting history.
    pub fn load(&self, data: GraphData, system_prompt: Option<String>) {
        {
            let mut graph = self.graph.lock().unwrap_or_else(|e| e.into_inner());
            graph.replace_all(data.nodes, data.edges, data.highlights);
        }
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        *self
            .system_prompt
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = system_prompt;
        info!("session: loaded graph");
    }

    pub fn system_prompt(&self) -> Option<String> {
        self.system_prompt
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn set_system_prompt(&self, prompt: Option<String>) {
        *self
            .system_prompt
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = prompt;
    }

    fn snapshot(&self) {
        let graph = self.graph.lock().unwrap_or_else(|e| e.into_inner());
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .save(&graph);
    }

    fn claim(&self, key: &str) -> Result<()> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !in_flight.insert(key.to_string()) {
            warn!("session: duplicate request suppressed: {}", key);
            return Err(SessionError::DuplicateRequest);
        }
        Ok(())
    }

    fn release(&self, key: &str) {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Streams chunk updates into the placeholder node as they arrive.
    /// The loading flag drops on the first chunk so partial content is
    /// visible immediately.
    fn stream_callback(&self, target_id: String, user_cb: Option<ChunkCallback>) -> ChunkCallback {
        let graph = Arc::clone(&self.graph);
        Arc::new(move |accumulated: String| {
            {
                let mut graph = graph.lock().unwrap_or_else(|e| e.into_inner());
                if let Some(node) = graph.get_node(&target_id) {
                    let mut node = node.clone();
                    node.content = accumulated.clone();
                    node.is_loading = false;
                    graph.update_node(node);
                }
            }
            if let Some(cb) = &user_cb {
                cb(accumulated);
            }
        })
    }

    /// Creates a new root node for `topic` and fills it with generated
    /// content. The placeholder appears before the request is sent and
    /// is rolled back if generation fails. The history snapshot is taken
    /// at request time, so undo restores the placeholder rather than the
    /// eventual content.
    pub async fn create_topic_node(
        &self,
        topic: &str,
        on_chunk: Option<ChunkCallback>,
    ) -> Result<Node> {
        let key = format!("topic::{}", topic);
        self.claim(&key)?;

        let id = node_id();
        let prompt = topic_prompt(topic, self.system_prompt().as_deref());
        {
            let mut graph = self.graph.lock().unwrap_or_else(|e| e.into_inner());
            let position = next_root_position(&graph);
            graph.add_node(Node::placeholder(&id, topic, 0, None, position));
        }
        self.snapshot();
        debug!("session: topic node {} created for '{}'", id, topic);

        let callback = self.stream_callback(id.clone(), on_chunk);
        let outcome = self.generator.generate(&prompt, Some(callback)).await;

        let result = match outcome {
            Ok(content) => {
                let mut graph = self.graph.lock().unwrap_or_else(|e| e.into_inner());
                match graph.get_node(&id).cloned() {
                    Some(mut node) => {
                        node.content = content;
                        node.is_loading = false;
                        graph.update_node(node.clone());
                        Ok(node)
                    }
                    None => Err(SessionError::UnknownNode(id.clone())),
                }
            }
            Err(err) => {
                warn!("session: topic generation failed, rolling back {}: {}", id, err);
                {
                    let mut graph = self.graph.lock().unwrap_or_else(|e| e.into_inner());
                    graph.remove_node(&id);
                }
                self.snapshot();
                Err(err.into())
            }
        };
        self.release(&key);
        result
    }

    /// Expands a selected span of an existing node into a child node,
    /// generating content that explains the selection in the context of
    /// the origin's content. On success the span is recorded as a
    /// highlight on the origin.
    pub async fn expand_selection(
        &self,
        origin_id: &str,
        selected_text: &str,
        custom_prompt: Option<&str>,
        on_chunk: Option<ChunkCallback>,
    ) -> Result<Node> {
        let key = format!(
            "{}-{}-{}",
            origin_id,
            selected_text,
            custom_prompt.unwrap_or("")
        );
        self.claim(&key)?;

        let prepared = self.prepare_child(origin_id, selected_text, custom_prompt);
        let (child_id, prompt, span, child_level) = match prepared {
            Ok(p) => p,
            Err(err) => {
                self.release(&key);
                return Err(err);
            }
        };
        self.snapshot();

        let callback = self.stream_callback(child_id.clone(), on_chunk);
        let outcome = self.generator.generate(&prompt, Some(callback)).await;

        let result = match outcome {
            Ok(content) => {
                let mut graph = self.graph.lock().unwrap_or_else(|e| e.into_inner());
                match graph.get_node(&child_id).cloned() {
                    Some(mut node) => {
                        node.content = content;
                        node.is_loading = false;
                        graph.update_node(node.clone());
                        graph.append_highlight(
                            origin_id,
                            Highlight {
                                start_index: span.0,
                                end_index: span.1,
                                node_id: child_id.clone(),
                                level: child_level,
                            },
                        );
                        Ok(node)
                    }
                    None => Err(SessionError::UnknownNode(child_id.clone())),
                }
            }
            Err(err) => {
                warn!(
                    "session: expansion failed, rolling back {}: {}",
                    child_id, err
                );
                {
                    let mut graph = self.graph.lock().unwrap_or_else(|e| e.into_inner());
                    graph.remove_node(&child_id);
                }
                self.snapshot();
                Err(err.into())
            }
        };
        self.release(&key);
        result
    }

    /// Validates the origin, places the child placeholder and edge, and
    /// builds the prompt, all under one lock acquisition.
    fn prepare_child(
        &self,
        origin_id: &str,
        selected_text: &str,
        custom_prompt: Option<&str>,
    ) -> Result<(String, mindloom_gen::PromptSet, (usize, usize), u32)> {
        let system = self.system_prompt();
        let mut graph = self.graph.lock().unwrap_or_else(|e| e.into_inner());

        let origin = graph
            .get_node(origin_id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownNode(origin_id.to_string()))?;
        let span = find_selection(&origin.content, selected_text)
            .ok_or(SessionError::SelectionNotFound)?;

        let child_id = node_id();
        let child_level = origin.level + 1;
        let position = place_child(
            &graph,
            &origin,
            crate::graph::DEFAULT_NODE_WIDTH,
            crate::graph::DEFAULT_NODE_HEIGHT,
        );
        graph.add_node(Node::placeholder(
            &child_id,
            selected_text,
            child_level,
            Some(origin_id.to_string()),
            position,
        ));
        graph.add_edge(Edge::new(origin_id, &child_id));

        let prompt = related_prompt(
            selected_text,
            &origin.content,
            custom_prompt,
            system.as_deref(),
        );
        debug!(
            "session: child {} of {} placed at ({}, {})",
            child_id, origin_id, position.x, position.y
        );
        Ok((child_id, prompt, span, child_level))
    }

    /// Deletes a node and its whole subtree. Returns the removed ids.
    pub fn delete_node(&self, id: &str) -> Result<Vec<String>> {
        let removed = {
            let mut graph = self.graph.lock().unwrap_or_else(|e| e.into_inner());
            if graph.get_node(id).is_none() {
                return Err(SessionError::UnknownNode(id.to_string()));
            }
            graph.remove_subtree(id)
        };
        self.snapshot();
        Ok(removed)
    }

    /// Adds a manual visual connector between two existing nodes.
    pub fn connect(&self, source: &str, target: &str) -> Result<()> {
        {
            let mut graph = self.graph.lock().unwrap_or_else(|e| e.into_inner());
            if graph.get_node(source).is_none() {
                return Err(SessionError::UnknownNode(source.to_string()));
            }
            if graph.get_node(target).is_none() {
                return Err(SessionError::UnknownNode(target.to_string()));
            }
            graph.add_edge(Edge::new(source, target));
        }
        self.snapshot();
        Ok(())
    }

    /// Merges drag/resize deltas; user-initiated changes land in
    /// history.
    pub fn apply_changes(&self, changes: &[NodeChange]) {
        {
            let mut graph = self.graph.lock().unwrap_or_else(|e| e.into_inner());
            graph.apply_changes(changes);
        }
        if changes.iter().any(NodeChange::is_user_action) {
            self.snapshot();
        }
    }

    pub fn select_node(&self, id: &str) {
        let mut graph = self.graph.lock().unwrap_or_else(|e| e.into_inner());
        graph.select_node(id);
    }

    /// Rebuilds the whole layout from tree structure.
    pub fn auto_arrange(&self) {
        {
            let mut graph = self.graph.lock().unwrap_or_else(|e| e.into_inner());
            let changes: Vec<NodeChange> = auto_arrange(&graph)
                .into_iter()
                .map(|(id, position)| NodeChange::Position { id, position })
                .collect();
            graph.apply_changes(&changes);
        }
        self.snapshot();
    }

    /// Steps back one snapshot; false when already at the oldest state.
    pub fn undo(&self) -> bool {
        let restored = self
            .history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .undo();
        match restored {
            Some(snapshot) => {
                let mut graph = self.graph.lock().unwrap_or_else(|e| e.into_inner());
                *graph = snapshot;
                true
            }
            None => false,
        }
    }

    /// Steps forward one snapshot; false when already at the newest
    /// state.
    pub fn redo(&self) -> bool {
        let restored = self
            .history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .redo();
        match restored {
            Some(snapshot) => {
                let mut graph = self.graph.lock().unwrap_or_else(|e| e.into_inner());
                *graph = snapshot;
                true
            }
            None => false,
        }
    }
}

/// Roots line up along the top of the canvas.
fn next_root_position(graph: &GraphStore) -> Position {
    let origin = initial_root_position(DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT);
    let rightmost = graph
        .nodes()
        .iter()
        .filter(|n| n.parent_id.is_none())
        .map(|n| n.position.x + n.width)
        .fold(f64::NEG_INFINITY, f64::max);
    if rightmost.is_finite() {
        Position::new(rightmost + SIBLING_SPACING_X - ARRANGE_COL_GAP, origin.y)
    } else {
        origin
    }
}
