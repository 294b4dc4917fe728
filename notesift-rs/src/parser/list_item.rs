//! List item and task checkbox parsing.

use crate::parser::code_block::{find_code_block_ranges, is_line_in_fenced_code_block};
use crate::types::ListItem;
use regex::Regex;
use std::sync::LazyLock;

/// Matches: indent, a bullet (`-`, `*`, `+`) or ordinal (`1.`, `1)`), an
/// optional `[x]` checkbox, then the item text.
static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)(?:[-*+]|\d+[.)])\s+(?:\[(.)\]\s*)?(.*)$").unwrap()
});

/// Parse all list items from content.
pub fn parse_list_items(content: &str) -> Vec<ListItem> {
    let code_ranges = find_code_block_ranges(content);
    let mut items = Vec::new();

    for (line_idx, line) in content.lines().enumerate() {
        let line_num = line_idx + 1;

        if is_line_in_fenced_code_block(line_num, &code_ranges) {
            continue;
        }

        let Some(caps) = LIST_ITEM.captures(line) else {
            continue;
        };

        let indent = count_indent(caps.get(1).map(|m| m.as_str()).unwrap_or(""));
        let symbol = caps.get(2).map(|m| m.as_str());
        let text = caps.get(3).map(|m| m.as_str().trim()).unwrap_or("");

        items.push(ListItem {
            line: line_num,
            indent,
            is_task: symbol.is_some(),
            checked: symbol.is_some_and(|s| s != " "),
            text: text.to_string(),
        });
    }

    items
}

/// Count indentation level (tabs or 4 spaces = 1 level).
fn count_indent(s: &str) -> usize {
    let tabs = s.chars().filter(|c| *c == '\t').count();
    let spaces = s.chars().filter(|c| *c == ' ').count();
    tabs + spaces / 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_and_task_items() {
        let items = parse_list_items("- plain\n- [ ] open task\n- [x] done task\ntext");
        assert_eq!(items.len(), 3);
        assert!(!items[0].is_task);
        assert_eq!(items[0].text, "plain");
        assert!(items[1].is_task);
        assert!(!items[1].checked);
        assert_eq!(items[1].text, "open task");
        assert!(items[2].checked);
        assert_eq!(items[2].line, 3);
    }

    #[test]
    fn test_ordered_and_nested_items() {
        let items = parse_list_items("1. first\n    * nested\n\t+ [/] in progress");
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].indent, 1);
        assert_eq!(items[2].indent, 1);
        assert!(items[2].checked);
    }

    #[test]
    fn test_items_in_code_block_skipped() {
        let items = parse_list_items("- real\n```\n- fake\n```");
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_count_indent() {
        assert_eq!(count_indent(""), 0);
        assert_eq!(count_indent("    "), 1);
        assert_eq!(count_indent("\t\t"), 2);
        assert_eq!(count_indent("  "), 0);
    }
}
