//! Bounded undo/redo over full graph snapshots.

use crate::graph::GraphStore;
use tracing::debug;

/// Oldest snapshots are evicted past this count.
pub const MAX_HISTORY_SIZE: usize = 50;

/// A linear snapshot stack with a cursor. Saving while the cursor sits
/// mid-stack discards the redo branch, so history never forks.
#[derive(Debug, Default)]
pub struct History {
    snapshots: Vec<GraphStore>,
    /// Index of the current snapshot; valid whenever `snapshots` is
    /// non-empty.
    index: usize,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.snapshots.is_empty() && self.index < self.snapshots.len() - 1
    }

    /// Pushes a snapshot of `graph` as the new current state.
    ///
    /// An empty graph on an empty history is skipped so the initial
    /// blank canvas never becomes an undo target.
    pub fn save(&mut self, graph: &GraphStore) {
        if self.snapshots.is_empty() && graph.is_empty() {
            return;
        }

        if self.can_redo() {
            let discarded = self.snapshots.len() - self.index - 1;
            debug!("history: discarding {} redo snapshot(s)", discarded);
            self.snapshots.truncate(self.index + 1);
        }

        self.snapshots.push(graph.clone());
        if self.snapshots.len() > MAX_HISTORY_SIZE {
            self.snapshots.remove(0);
        }
        self.index = self.snapshots.len() - 1;
    }

    /// Steps the cursor back and returns a clone of that snapshot, or
    /// `None` at the oldest state.
    pub fn undo(&mut self) -> Option<GraphStore> {
        if !self.can_undo() {
            return None;
        }
        self.index -= 1;
        Some(self.snapshots[self.index].clone())
    }

    /// Steps the cursor forward and returns a clone of that snapshot,
    /// or `None` at the newest state.
    pub fn redo(&mut self) -> Option<GraphStore> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        Some(self.snapshots[self.index].clone())
    }

    /// Drops all snapshots, e.g. when switching mind maps.
    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.index = 0;
    }
}
