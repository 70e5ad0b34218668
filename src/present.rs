//! Turn a cached findings blob into numbered news items for display.

use crate::prompts::ITEM_SEPARATOR;
use serde::Serialize;

/// One displayable news item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsItem {
    /// 1-based position among the non-empty items.
    pub number: usize,
    pub text: String,
}

/// Split `blob` on the literal `---` separator.
///
/// Pieces are trimmed and empty pieces dropped, so `a---b` and
/// `---\na\n---\n\n---\nb\n---` both yield two items numbered 1 and 2.
pub fn split_sections(blob: &str) -> Vec<NewsItem> {
    blob.split(ITEM_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(i, text)| NewsItem {
            number: i + 1,
            text: text.to_string(),
        })
        .collect()
}

/// Render items as Markdown, one `#### News Item N` block each.
pub fn render_markdown(items: &[NewsItem]) -> String {
    let mut out = String::new();
    for item in items {
        out.push_str(&format!("#### News Item {}\n\n{}\n\n---\n\n", item.number, item.text));
    }
    out
}
