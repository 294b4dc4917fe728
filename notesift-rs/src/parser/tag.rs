//! Tag parsing (#tag and #tag/subtag).

use crate::parser::code_block::{find_code_block_ranges, is_in_code_block};
use crate::types::Tag;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

// Start of string or a non-word, non-& char, then # and a name that does not
// start with a digit. Rust regex has no lookaround, so the character after the
// tag is checked in parse_tags.
static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^\w&])#([a-zA-Z_][\w/-]*)").unwrap());

/// Parse all tags from content.
pub fn parse_tags(content: &str) -> Vec<Tag> {
    let code_ranges = find_code_block_ranges(content);
    let mut tags = Vec::new();

    for cap in TAG.captures_iter(content) {
        let Some(name) = cap.get(1) else {
            continue;
        };

        // The # sits just before the captured name
        let start = name.start() - 1;
        let end = name.end();

        if let Some(next) = content[end..].chars().next() {
            if next.is_alphanumeric() || next == '_' || next == '/' {
                continue;
            }
        }

        if is_in_code_block(start, &code_ranges) || is_in_wikilink(content, start) {
            continue;
        }

        let line_start = content[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
        tags.push(Tag {
            name: format!("#{}", name.as_str()),
            line: content[..start].matches('\n').count() + 1,
            start_col: start - line_start,
            end_col: end - line_start,
        });
    }

    tags
}

/// Check if a position is inside a `[[wikilink]]` (e.g. `[[Note#heading]]`).
fn is_in_wikilink(content: &str, pos: usize) -> bool {
    let before = &content[..pos];
    match (before.rfind("[["), before.rfind("]]")) {
        (Some(open), Some(close)) if open < close => false,
        (Some(_), _) => content[pos..].contains("]]"),
        _ => false,
    }
}

/// Normalize a tag for comparison: strip one leading `#` and surrounding whitespace.
pub fn normalize_tag(tag: &str) -> &str {
    let tag = tag.trim();
    tag.strip_prefix('#').unwrap_or(tag)
}

/// Distinct tag names without `#`, sorted.
pub fn unique_tag_names(tags: &[Tag]) -> BTreeSet<String> {
    tags.iter().map(|t| t.without_hash().to_string()).collect()
}
