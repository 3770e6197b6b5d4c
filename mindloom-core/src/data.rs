use rusqlite::{Connection, OptionalExtension, Result, params};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::graph::{Edge, GraphStore, Highlight, HighlightMap, Node, Position};
use crate::text::{decode_breaks, encode_breaks};

/// Owner recorded for maps created from the local CLI.
pub const LOCAL_OWNER: &str = "local";

pub struct Database {
    conn: Connection,
}

/// Directory row for a stored mind map.
#[derive(Debug, Clone)]
pub struct MindMapMeta {
    pub id: String,
    pub title: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub system_prompt: Option<String>,
}

/// Everything needed to hydrate a [`GraphStore`] from disk.
#[derive(Debug, Clone, Default)]
pub struct GraphData {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub highlights: HighlightMap,
}

fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

impl Database {
    pub fn drop(path: &Path) -> std::io::Result<()> {
        fs::remove_file(path)
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Optimize for concurrent writes
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = -64000;  -- 64MB cache
            PRAGMA temp_store = MEMORY;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            -- Mind map directory
            CREATE TABLE IF NOT EXISTS mind_maps (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL DEFAULT 'local',
    title TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    system_prompt TEXT
);

-- Nodes of a stored mind map
CREATE TABLE IF NOT EXISTS nodes (
    id TEXT PRIMARY KEY,
    mind_map_id TEXT NOT NULL,
    label TEXT NOT NULL,
    content TEXT NOT NULL DEFAULT '',
    level INTEGER NOT NULL DEFAULT 0,
    parent_id TEXT,
    position_x REAL NOT NULL DEFAULT 0,
    position_y REAL NOT NULL DEFAULT 0,
    width REAL NOT NULL,
    height REAL NOT NULL,

    FOREIGN KEY(mind_map_id) REFERENCES mind_maps(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_nodes_map ON nodes(mind_map_id);
CREATE INDEX IF NOT EXISTS idx_nodes_parent ON nodes(parent_id);

-- Visual connectors
CREATE TABLE IF NOT EXISTS edges (
    id TEXT PRIMARY KEY,
    mind_map_id TEXT NOT NULL,
    source_id TEXT NOT NULL,
    target_id TEXT NOT NULL,
    edge_type TEXT NOT NULL DEFAULT 'smoothstep',

    FOREIGN KEY(mind_map_id) REFERENCES mind_maps(id) ON DELETE CASCADE,
    FOREIGN KEY(source_id) REFERENCES nodes(id) ON DELETE CASCADE,
    FOREIGN KEY(target_id) REFERENCES nodes(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_edges_map ON edges(mind_map_id);
CREATE INDEX IF NOT EXISTS idx_edges_source ON edges(source_id);

-- Highlighted spans linking origin content to child nodes
CREATE TABLE IF NOT EXISTS highlighted_texts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    mind_map_id TEXT NOT NULL,
    node_id TEXT NOT NULL,
    start_index INTEGER NOT NULL,
    end_index INTEGER NOT NULL,
    target_node_id TEXT NOT NULL,
    level INTEGER NOT NULL DEFAULT 0,

    FOREIGN KEY(mind_map_id) REFERENCES mind_maps(id) ON DELETE CASCADE,
    FOREIGN KEY(node_id) REFERENCES nodes(id) ON DELETE CASCADE,
    FOREIGN KEY(target_node_id) REFERENCES nodes(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_highlights_map ON highlighted_texts(mind_map_id);
CREATE INDEX IF NOT EXISTS idx_highlights_node ON highlighted_texts(node_id);
            ",
        )?;
        Ok(())
    }

    // Directory management
    pub fn create_mind_map(&self, title: &str, owner_id: &str) -> Result<String> {
        let map_id = uuid::Uuid::new_v4().to_string();
        let timestamp = current_timestamp();

        self.conn.execute(
            "INSERT INTO mind_maps (id, owner_id, title, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![&map_id, owner_id, title, timestamp, timestamp],
        )?;

        Ok(map_id)
    }

    /// The owner's maps, most recently updated first.
    pub fn list_mind_maps(&self, owner_id: &str) -> Result<Vec<MindMapMeta>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, created_at, updated_at, system_prompt
             FROM mind_maps WHERE owner_id = ?1 ORDER BY updated_at DESC, id",
        )?;

        let maps = stmt
            .query_map(params![owner_id], |row| {
                Ok(MindMapMeta {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    created_at: row.get(2)?,
                    updated_at: row.get(3)?,
                    system_prompt: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;

        Ok(maps)
    }

    pub fn get_mind_map(&self, map_id: &str) -> Result<Option<MindMapMeta>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, created_at, updated_at, system_prompt
             FROM mind_maps WHERE id = ?1",
        )?;

        let meta = stmt
            .query_row(params![map_id], |row| {
                Ok(MindMapMeta {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    created_at: row.get(2)?,
                    updated_at: row.get(3)?,
                    system_prompt: row.get(4)?,
                })
            })
            .optional()?;
        Ok(meta)
    }

    /// Returns false when no such map exists.
    pub fn rename_mind_map(&self, map_id: &str, title: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE mind_maps SET title = ?1, updated_at = ?2 WHERE id = ?3",
            params![title, current_timestamp(), map_id],
        )?;
        Ok(changed > 0)
    }

    /// Cascades to nodes, edges and highlights.
    pub fn delete_mind_map(&self, map_id: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM mind_maps WHERE id = ?1", params![map_id])?;
        Ok(changed > 0)
    }

    /// A `None` prompt reverts the map to the built-in default.
    pub fn update_system_prompt(&self, map_id: &str, prompt: Option<&str>) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE mind_maps SET system_prompt = ?1, updated_at = ?2 WHERE id = ?3",
            params![prompt, current_timestamp(), map_id],
        )?;
        Ok(changed > 0)
    }

    pub fn touch(&self, map_id: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE mind_maps SET updated_at = ?1 WHERE id = ?2",
            params![current_timestamp(), map_id],
        )?;
        Ok(())
    }

    // Graph persistence
    /// Loads the stored graph for a map, or `None` when the map does not
    /// exist. Stored `<br>` sequences are decoded back to newlines.
    pub fn load_mind_map(&self, map_id: &str) -> Result<Option<GraphData>> {
        if self.get_mind_map(map_id)?.is_none() {
            return Ok(None);
        }

        let mut stmt = self.conn.prepare(
            "SELECT id, label, content, level, parent_id, position_x, position_y, width, height
             FROM nodes WHERE mind_map_id = ?1 ORDER BY level, id",
        )?;
        let nodes = stmt
            .query_map(params![map_id], |row| {
                let content: String = row.get(2)?;
                Ok(Node {
                    id: row.get(0)?,
                    label: row.get(1)?,
                    content: decode_breaks(&content),
                    level: row.get(3)?,
                    parent_id: row.get(4)?,
                    position: Position::new(row.get(5)?, row.get(6)?),
                    width: row.get(7)?,
                    height: row.get(8)?,
                    is_loading: false,
                    selected: false,
                })
            })?
            .collect::<Result<Vec<_>>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT id, source_id, target_id, edge_type
             FROM edges WHERE mind_map_id = ?1 ORDER BY id",
        )?;
        let edges = stmt
            .query_map(params![map_id], |row| {
                Ok(Edge {
                    id: row.get(0)?,
                    source: row.get(1)?,
                    target: row.get(2)?,
                    edge_type: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT node_id, start_index, end_index, target_node_id, level
             FROM highlighted_texts WHERE mind_map_id = ?1 ORDER BY id",
        )?;
        let mut highlights = HighlightMap::new();
        let rows = stmt.query_map(params![map_id], |row| {
            let origin: String = row.get(0)?;
            let start: i64 = row.get(1)?;
            let end: i64 = row.get(2)?;
            Ok((
                origin,
                Highlight {
                    start_index: start as usize,
                    end_index: end as usize,
                    node_id: row.get(3)?,
                    level: row.get(4)?,
                },
            ))
        })?;
        for row in rows {
            let (origin, highlight) = row?;
            highlights.entry(origin).or_default().push(highlight);
        }

        Ok(Some(GraphData {
            nodes,
            edges,
            highlights,
        }))
    }

    /// Synchronizes the stored graph with the in-memory one.
    ///
    /// Only completed nodes are persisted; placeholders mid-generation
    /// never reach disk. Stored nodes and edges absent from the current
    /// graph are deleted, survivors are upserted, and highlights are
    /// rewritten wholesale. Returns false when the map no longer exists.
    pub fn save_mind_map(&self, map_id: &str, graph: &GraphStore) -> Result<bool> {
        if self.get_mind_map(map_id)?.is_none() {
            return Ok(false);
        }

        let completed = graph.completed_nodes();
        let completed_ids: Vec<&str> = completed.iter().map(|n| n.id.as_str()).collect();

        let tx = self.conn.unchecked_transaction()?;

        let stored_ids: Vec<String> = {
            let mut stmt = tx.prepare("SELECT id FROM nodes WHERE mind_map_id = ?1")?;
            let ids = stmt
                .query_map(params![map_id], |row| row.get(0))?
                .collect::<Result<Vec<String>>>()?;
            ids
        };
        for stale in stored_ids.iter().filter(|id| !completed_ids.contains(&id.as_str())) {
            debug!("save_mind_map: deleting stored node {}", stale);
            tx.execute(
                "DELETE FROM nodes WHERE mind_map_id = ?1 AND id = ?2",
                params![map_id, stale],
            )?;
        }

        for node in &completed {
            tx.execute(
                "INSERT INTO nodes (
                    id, mind_map_id, label, content, level, parent_id,
                    position_x, position_y, width, height
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT(id) DO UPDATE SET
                    label = excluded.label,
                    content = excluded.content,
                    level = excluded.level,
                    parent_id = excluded.parent_id,
                    position_x = excluded.position_x,
                    position_y = excluded.position_y,
                    width = excluded.width,
                    height = excluded.height",
                params![
                    &node.id,
                    map_id,
                    &node.label,
                    encode_breaks(&node.content),
                    node.level,
                    &node.parent_id,
                    node.position.x,
                    node.position.y,
                    node.width,
                    node.height,
                ],
            )?;
        }

        // Edges referencing an in-flight node are held back until both
        // endpoints are persisted.
        let valid_edges: Vec<&Edge> = graph
            .edges()
            .iter()
            .filter(|e| {
                completed_ids.contains(&e.source.as_str())
                    && completed_ids.contains(&e.target.as_str())
            })
            .collect();
        let valid_edge_ids: Vec<&str> = valid_edges.iter().map(|e| e.id.as_str()).collect();

        let stored_edge_ids: Vec<String> = {
            let mut stmt = tx.prepare("SELECT id FROM edges WHERE mind_map_id = ?1")?;
            let ids = stmt
                .query_map(params![map_id], |row| row.get(0))?
                .collect::<Result<Vec<String>>>()?;
            ids
        };
        for stale in stored_edge_ids
            .iter()
            .filter(|id| !valid_edge_ids.contains(&id.as_str()))
        {
            tx.execute(
                "DELETE FROM edges WHERE mind_map_id = ?1 AND id = ?2",
                params![map_id, stale],
            )?;
        }

        for edge in &valid_edges {
            tx.execute(
                "INSERT INTO edges (id, mind_map_id, source_id, target_id, edge_type)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                    source_id = excluded.source_id,
                    target_id = excluded.target_id,
                    edge_type = excluded.edge_type",
                params![&edge.id, map_id, &edge.source, &edge.target, &edge.edge_type],
            )?;
        }

        // Highlights carry no stable identity, so delete-and-reinsert.
        tx.execute(
            "DELETE FROM highlighted_texts WHERE mind_map_id = ?1",
            params![map_id],
        )?;
        for (origin, highlights) in graph.highlights() {
            if !completed_ids.contains(&origin.as_str()) {
                continue;
            }
            // A highlight pointing at an in-flight child waits for the
            // child to finalize, same as an edge would.
            for h in highlights
                .iter()
                .filter(|h| completed_ids.contains(&h.node_id.as_str()))
            {
                tx.execute(
                    "INSERT INTO highlighted_texts (
                        mind_map_id, node_id, start_index, end_index, target_node_id, level
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        map_id,
                        origin,
                        h.start_index as i64,
                        h.end_index as i64,
                        &h.node_id,
                        h.level,
                    ],
                )?;
            }
        }

        tx.execute(
            "UPDATE mind_maps SET updated_at = ?1 WHERE id = ?2",
            params![current_timestamp(), map_id],
        )?;

        tx.commit()?;
        debug!(
            "save_mind_map: {} synced ({} node(s), {} edge(s))",
            map_id,
            completed.len(),
            valid_edges.len()
        );
        Ok(true)
    }

    pub fn get_connection(&self) -> &Connection {
        &self.conn
    }
}
