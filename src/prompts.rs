//! Prompts for reading a Gujarati newspaper page with a vision model.
//!
//! The model's answer for a page is stored verbatim in the result cache and
//! later split on [`ITEM_SEPARATOR`] for display, so the prompt pins down
//! both the per-item layout and the separator.
//!
//! Callers can override the system prompt via
//! [`crate::config::FinderConfig::system_prompt`]; the tag instruction is
//! always appended as the user turn.

/// Literal token between news items in model output and in cached results.
pub const ITEM_SEPARATOR: &str = "---";

/// Exact reply the model gives when a page has nothing about the tag.
pub const NO_MATCH_REPLY: &str = "NO_RELEVANT_NEWS";

/// Default system prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an expert reader of Gujarati newspapers. You receive one scanned page of a Gujarati newspaper as an image, together with a search topic.

Follow these rules precisely:

1. FIND
   - Read every article, brief, caption and advertisement on the page
   - Select only items that are clearly about the search topic
   - The topic may be given in English or Gujarati; match on meaning, not spelling

2. FOR EACH RELEVANT ITEM, OUTPUT
   **Original (Gujarati):** the headline and the relevant text, transcribed exactly
   **Translation (English):** a faithful English translation of that text
   **Summary:** two or three sentences on what the item reports

3. SEPARATION
   - Put a line containing only --- between items
   - Do not put --- before the first item or after the last item

4. NOTHING FOUND
   - If no item on the page is about the topic, reply with exactly NO_RELEVANT_NEWS and nothing else

5. OUTPUT FORMAT
   - Output only the items; no preamble, no closing remarks
   - Do not wrap the answer in code fences"#;

/// Build the user turn that accompanies the page image.
pub fn tag_prompt(tag: &str) -> String {
    format!(
        "Search topic: \"{}\"\n\nFind all news items on this page related to the search topic.",
        tag.trim()
    )
}

/// Normalise a model reply: trim it and map the no-match reply to "".
pub fn normalize_reply(reply: &str) -> &str {
    let trimmed = reply.trim();
    if trimmed.eq_ignore_ascii_case(NO_MATCH_REPLY) {
        ""
    } else {
        trimmed
    }
}
