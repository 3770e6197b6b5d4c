//! Text utilities bridging stored node content, HTML-ish rendered
//! content, and the plain-text coordinate space highlight offsets live
//! in.

use scraper::Html;

/// Strips markup from rendered node content, yielding the de-tagged
/// text that highlight offsets index into. Plain text passes through
/// unchanged.
pub fn plain_text(content: &str) -> String {
    if !content.contains('<') {
        return content.to_string();
    }
    let fragment = Html::parse_fragment(content);
    fragment.root_element().text().collect::<String>()
}

/// Locates `selection` within the de-tagged form of `content` and
/// returns its `(start, end)` character offsets, or `None` when the
/// selection does not occur. The first occurrence wins.
pub fn find_selection(content: &str, selection: &str) -> Option<(usize, usize)> {
    if selection.is_empty() {
        return None;
    }
    let text = plain_text(content);
    let byte_start = text.find(selection)?;
    let start = text[..byte_start].chars().count();
    let end = start + selection.chars().count();
    Some((start, end))
}

/// Encodes newlines as `<br>` for storage, matching how loaded content
/// is decoded back.
pub fn encode_breaks(content: &str) -> String {
    content.replace('\n', "<br>")
}

/// Inverse of [`encode_breaks`].
pub fn decode_breaks(content: &str) -> String {
    content.replace("<br>", "\n")
}

/// Wraps each highlighted span of `content` in a `<mark>` tag carrying
/// the target child's level. Spans are character offsets into the
/// de-tagged content; overlapping or out-of-range spans are skipped
/// rather than producing broken markup.
pub fn render_highlights(content: &str, spans: &[(usize, usize, u32)]) -> String {
    let text = plain_text(content);
    let chars: Vec<char> = text.chars().collect();

    let mut sorted: Vec<&(usize, usize, u32)> = spans.iter().collect();
    sorted.sort_by_key(|(start, _, _)| *start);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for (start, end, level) in sorted {
        if *start < cursor || *end <= *start || *end > chars.len() {
            continue;
        }
        out.extend(&chars[cursor..*start]);
        out.push_str(&format!("<mark data-level=\"{}\">", level));
        out.extend(&chars[*start..*end]);
        out.push_str("</mark>");
        cursor = *end;
    }
    out.extend(&chars[cursor..]);
    out
}
