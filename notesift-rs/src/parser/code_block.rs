//! Code span detection, so tags and headings inside code are ignored.

use regex::Regex;
use std::sync::LazyLock;

/// A byte range of the note covered by code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlockRange {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
    /// First line of the range (1-indexed).
    pub start_line: usize,
    /// Last line of the range (1-indexed).
    pub end_line: usize,
    /// Whether this is a fenced block (vs inline code).
    pub is_fenced: bool,
}

// ``` or ~~~ (three or more) at the start of a line, possibly indented up to 3 spaces
static FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^ {0,3}(`{3,}|~{3,})").unwrap());

// `code` or ``code with ` inside``
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"``(?:[^`]|`[^`])*``|`[^`\n]+`").unwrap());

/// Find all fenced code blocks and inline code spans in content.
///
/// An unterminated fence runs to the end of the note, the way Obsidian
/// renders it.
pub fn find_code_block_ranges(content: &str) -> Vec<CodeBlockRange> {
    let mut ranges = Vec::new();

    // (fence char, fence length, start offset, start line)
    let mut open: Option<(char, usize, usize, usize)> = None;
    let mut offset = 0;

    for (idx, raw_line) in content.split_inclusive('\n').enumerate() {
        let line_num = idx + 1;
        let line = raw_line.trim_end_matches(['\n', '\r']);

        match open {
            None => {
                if let Some(cap) = FENCE.captures(line) {
                    let fence = cap.get(1).map(|m| m.as_str()).unwrap_or("```");
                    let fence_char = fence.chars().next().unwrap_or('`');
                    open = Some((fence_char, fence.len(), offset, line_num));
                }
            }
            Some((fence_char, fence_len, start, start_line)) => {
                let trimmed = line.trim();
                if trimmed.len() >= fence_len && trimmed.chars().all(|c| c == fence_char) {
                    ranges.push(CodeBlockRange {
                        start,
                        end: offset + line.len(),
                        start_line,
                        end_line: line_num,
                        is_fenced: true,
                    });
                    open = None;
                }
            }
        }

        offset += raw_line.len();
    }

    if let Some((_, _, start, start_line)) = open {
        ranges.push(CodeBlockRange {
            start,
            end: content.len(),
            start_line,
            end_line: content.lines().count().max(start_line),
            is_fenced: true,
        });
    }

    let mut inline = Vec::new();
    for m in INLINE_CODE.find_iter(content) {
        if ranges.iter().any(|r| m.start() < r.end && m.end() > r.start) {
            continue;
        }
        inline.push(CodeBlockRange {
            start: m.start(),
            end: m.end(),
            start_line: content[..m.start()].matches('\n').count() + 1,
            end_line: content[..m.end()].matches('\n').count() + 1,
            is_fenced: false,
        });
    }

    ranges.extend(inline);
    ranges.sort_by_key(|r| r.start);
    ranges
}

/// Check if a byte offset is inside any code range.
pub fn is_in_code_block(offset: usize, ranges: &[CodeBlockRange]) -> bool {
    ranges.iter().any(|r| offset >= r.start && offset < r.end)
}

/// Check if a line number (1-indexed) is inside any fenced code block.
pub fn is_line_in_fenced_code_block(line: usize, ranges: &[CodeBlockRange]) -> bool {
    ranges
        .iter()
        .any(|r| r.is_fenced && line >= r.start_line && line <= r.end_line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_code_block() {
        let content = "Some text\n\n```rust\nlet x = 1;\n```\n\nMore text";
        let ranges = find_code_block_ranges(content);
        assert_eq!(ranges.len(), 1);
        assert!(ranges[0].is_fenced);
        assert_eq!(ranges[0].start_line, 3);
        assert_eq!(ranges[0].end_line, 5);
    }

    #[test]
    fn test_tilde_fence_not_closed_by_backticks() {
        let content = "~~~\n```\nstill code\n~~~\nafter";
        let ranges = find_code_block_ranges(content);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].end_line, 4);
    }

    #[test]
    fn test_unterminated_fence_runs_to_end() {
        let content = "text\n```\n# not a heading\n#not-a-tag";
        let ranges = find_code_block_ranges(content);
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].end, content.len());
        assert!(is_line_in_fenced_code_block(4, &ranges));
    }

    #[test]
    fn test_inline_code() {
        let content = "Some `inline #code` here";
        let ranges = find_code_block_ranges(content);
        assert_eq!(ranges.len(), 1);
        assert!(!ranges[0].is_fenced);
    }

    #[test]
    fn test_double_backtick_inline() {
        let content = "Some ``inline `code` with backticks`` here";
        let ranges = find_code_block_ranges(content);
        assert_eq!(ranges.len(), 1);
    }

    #[test]
    fn test_is_in_code_block() {
        let content = "before `code` after";
        let ranges = find_code_block_ranges(content);

        assert!(!is_in_code_block(0, &ranges));
        assert!(is_in_code_block(8, &ranges));
        assert!(!is_in_code_block(14, &ranges));
    }
}
