//! ATX heading parsing.

use crate::parser::code_block::{find_code_block_ranges, is_line_in_fenced_code_block};
use crate::types::Heading;
use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

// # Heading, ## Heading, ... with an optional trailing ^block-id
static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(#{1,6})\s+(.+?)(?:\s+\^[a-zA-Z0-9_-]+)?\s*$").unwrap()
});

/// Parse all headings from content, in document order.
pub fn parse_headings(content: &str) -> Vec<Heading> {
    let code_ranges = find_code_block_ranges(content);
    let mut headings = Vec::new();
    let mut offset = 0;

    for (line_idx, raw_line) in content.split_inclusive('\n').enumerate() {
        let line_num = line_idx + 1;
        let line = raw_line.trim_end_matches(['\n', '\r']);

        if !is_line_in_fenced_code_block(line_num, &code_ranges) {
            if let Some(cap) = HEADING.captures(line) {
                let level = cap.get(1).map(|m| m.as_str().len()).unwrap_or(1) as u8;
                let text: String = cap
                    .get(2)
                    .map(|m| m.as_str().trim())
                    .unwrap_or_default()
                    .nfc()
                    .collect();

                headings.push(Heading {
                    text,
                    level,
                    line: line_num,
                    offset,
                });
            }
        }

        offset += raw_line.len();
    }

    headings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_heading() {
        let content = "# Heading 1\n\nSome text\n\n## Heading 2";
        let headings = parse_headings(content);
        assert_eq!(headings.len(), 2);
        assert_eq!(headings[0].text, "Heading 1");
        assert_eq!(headings[0].level, 1);
        assert_eq!(headings[0].line, 1);
        assert_eq!(headings[0].offset, 0);
        assert_eq!(headings[1].text, "Heading 2");
        assert_eq!(headings[1].level, 2);
        assert_eq!(headings[1].line, 5);
        assert_eq!(headings[1].offset, 24);
    }

    #[test]
    fn test_heading_with_block_id() {
        let headings = parse_headings("# Heading ^block-id");
        assert_eq!(headings.len(), 1);
        assert_eq!(headings[0].text, "Heading");
    }

    #[test]
    fn test_heading_in_code_block_skipped() {
        let headings = parse_headings("# Real Heading\n\n```\n# Not a heading\n```");
        assert_eq!(headings.len(), 1);
        assert_eq!(headings[0].text, "Real Heading");
    }

    #[test]
    fn test_heading_not_at_line_start() {
        let headings = parse_headings("text # not a heading\n# Real heading");
        assert_eq!(headings.len(), 1);
        assert_eq!(headings[0].line, 2);
    }

    #[test]
    fn test_crlf_line_endings() {
        let headings = parse_headings("# One\r\nbody\r\n## Two\r\n");
        assert_eq!(headings.len(), 2);
        assert_eq!(headings[1].text, "Two");
        assert_eq!(headings[1].line, 3);
    }
}
