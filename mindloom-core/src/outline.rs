// Outline rendering of a stored mind map

use colored::Colorize;
use rusqlite::Result;
use serde::{Deserialize, Serialize};

use crate::data::Database;
use crate::graph::{HighlightMap, Node};
use crate::text::{plain_text, render_highlights};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutlineFormat {
    Text,
    Json,
}

impl OutlineFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(OutlineFormat::Text),
            "json" => Some(OutlineFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineData {
    pub mind_map_id: String,
    pub title: String,
    pub updated_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    pub total_nodes: usize,
    pub roots: Vec<OutlineNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineNode {
    pub id: String,
    pub label: String,
    pub level: u32,
    pub summary: String,
    /// Full content with each expanded span wrapped in a `<mark>` tag,
    /// so exports keep the link between a span and the child it spawned.
    pub content: String,
    pub highlight_count: usize,
    pub children: Vec<OutlineNode>,
}

const SUMMARY_LEN: usize = 72;

fn summarize(content: &str) -> String {
    let text = plain_text(content);
    let first_line = text.lines().next().unwrap_or("");
    if first_line.chars().count() <= SUMMARY_LEN {
        first_line.to_string()
    } else {
        let truncated: String = first_line.chars().take(SUMMARY_LEN).collect();
        format!("{}...", truncated)
    }
}

fn build_subtree(nodes: &[Node], highlights: &HighlightMap, parent: &Node) -> OutlineNode {
    let mut children: Vec<&Node> = nodes
        .iter()
        .filter(|n| n.parent_id.as_deref() == Some(parent.id.as_str()))
        .collect();
    children.sort_by(|a, b| a.position.x.total_cmp(&b.position.x));

    let spans: Vec<(usize, usize, u32)> = highlights
        .get(&parent.id)
        .map(|h| {
            h.iter()
                .map(|h| (h.start_index, h.end_index, h.level))
                .collect()
        })
        .unwrap_or_default();

    OutlineNode {
        id: parent.id.clone(),
        label: parent.label.clone(),
        level: parent.level,
        summary: summarize(&parent.content),
        content: render_highlights(&parent.content, &spans),
        highlight_count: spans.len(),
        children: children
            .into_iter()
            .map(|c| build_subtree(nodes, highlights, c))
            .collect(),
    }
}

pub fn gather_outline_data(db: &Database, map_id: &str) -> Result<Option<OutlineData>> {
    let meta = match db.get_mind_map(map_id)? {
        Some(meta) => meta,
        None => return Ok(None),
    };
    let data = match db.load_mind_map(map_id)? {
        Some(data) => data,
        None => return Ok(None),
    };

    let mut roots: Vec<&Node> = data
        .nodes
        .iter()
        .filter(|n| n.parent_id.is_none())
        .collect();
    roots.sort_by(|a, b| a.position.x.total_cmp(&b.position.x));

    Ok(Some(OutlineData {
        mind_map_id: meta.id,
        title: meta.title,
        updated_at: meta.updated_at,
        system_prompt: meta.system_prompt,
        total_nodes: data.nodes.len(),
        roots: roots
            .into_iter()
            .map(|r| build_subtree(&data.nodes, &data.highlights, r))
            .collect(),
    }))
}

fn level_color(label: &str, level: u32) -> String {
    match level % 4 {
        0 => label.cyan().bold().to_string(),
        1 => label.green().to_string(),
        2 => label.yellow().to_string(),
        _ => label.magenta().to_string(),
    }
}

fn render_node(out: &mut String, node: &OutlineNode, prefix: &str, last: bool) {
    let connector = if last { "└── " } else { "├── " };
    out.push_str(prefix);
    out.push_str(connector);
    out.push_str(&level_color(&node.label, node.level));
    if node.highlight_count > 0 {
        out.push_str(&format!(" ({} highlight(s))", node.highlight_count).dimmed().to_string());
    }
    out.push('\n');

    if !node.summary.is_empty() {
        let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
        out.push_str(&child_prefix);
        out.push_str(&node.summary.dimmed().to_string());
        out.push('\n');
    }

    let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
    for (i, child) in node.children.iter().enumerate() {
        render_node(out, child, &child_prefix, i == node.children.len() - 1);
    }
}

pub fn generate_text_outline(data: &OutlineData) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", data.title.bold()));
    out.push_str(&format!("{} node(s)\n\n", data.total_nodes));

    for (i, root) in data.roots.iter().enumerate() {
        render_node(&mut out, root, "", i == data.roots.len() - 1);
    }
    out
}
