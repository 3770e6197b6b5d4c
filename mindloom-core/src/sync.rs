//! Debounced persistence of the open mind map.
//!
//! Every mutation schedules a save; rapid bursts collapse into one
//! write after a quiet period. Scheduling is epoch-based: each call
//! bumps a counter and the delayed task only writes if its epoch is
//! still current when the timer fires.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::data::Database;
use crate::graph::GraphStore;

pub const DEFAULT_DEBOUNCE_MS: u64 = 1000;

pub struct AutoSaver {
    db: Arc<Mutex<Database>>,
    graph: Arc<Mutex<GraphStore>>,
    mind_map_id: String,
    debounce: Duration,
    epoch: Arc<AtomicU64>,
    just_loaded: Arc<AtomicBool>,
}

impl AutoSaver {
    pub fn new(db: Arc<Mutex<Database>>, graph: Arc<Mutex<GraphStore>>, mind_map_id: &str) -> Self {
        Self {
            db,
            graph,
            mind_map_id: mind_map_id.to_string(),
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            epoch: Arc::new(AtomicU64::new(0)),
            just_loaded: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Suppresses the next scheduled save. Loading a map replays it
    /// into the graph, and that replay must not immediately write the
    /// same data back.
    pub fn mark_loaded(&self) {
        self.just_loaded.store(true, Ordering::SeqCst);
    }

    /// Requests a save after the quiet period, cancelling any save
    /// already pending. An empty graph never schedules; a map is only
    /// written once it has at least one node.
    pub fn schedule(&self) {
        {
            let graph = self.graph.lock().unwrap_or_else(|e| e.into_inner());
            if graph.is_empty() {
                debug!("autosave: empty graph, nothing to schedule");
                return;
            }
        }

        let my_epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        if self.just_loaded.swap(false, Ordering::SeqCst) {
            debug!("autosave: skipping post-load mutation");
            return;
        }

        let db = Arc::clone(&self.db);
        let graph = Arc::clone(&self.graph);
        let epoch = Arc::clone(&self.epoch);
        let mind_map_id = self.mind_map_id.clone();
        let debounce = self.debounce;

        tokio::spawn(async move {
            sleep(debounce).await;
            if epoch.load(Ordering::SeqCst) != my_epoch {
                // Superseded by a newer mutation.
                return;
            }
            let snapshot = {
                let graph = graph.lock().unwrap_or_else(|e| e.into_inner());
                graph.clone()
            };
            let db = db.lock().unwrap_or_else(|e| e.into_inner());
            match db.save_mind_map(&mind_map_id, &snapshot) {
                Ok(true) => debug!("autosave: {} written", mind_map_id),
                Ok(false) => warn!("autosave: {} no longer exists, skipped", mind_map_id),
                Err(err) => warn!("autosave: {} failed: {}", mind_map_id, err),
            }
        });
    }

    /// Writes immediately, cancelling any pending debounced save.
    /// Called on map switch and shutdown.
    pub fn flush(&self) -> rusqlite::Result<bool> {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let snapshot = {
            let graph = self.graph.lock().unwrap_or_else(|e| e.into_inner());
            graph.clone()
        };
        let db = self.db.lock().unwrap_or_else(|e| e.into_inner());
        db.save_mind_map(&self.mind_map_id, &snapshot)
    }
}
