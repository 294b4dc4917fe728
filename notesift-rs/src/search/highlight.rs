//! Match highlighting for excerpt text.

use crate::search::evaluator::CompiledQuery;
use crate::search::pattern::Pattern;
use crate::search::query::ParsedQuery;
use crate::search::types::SearchOptions;
use std::ops::Range;

/// Byte ranges of `text` matched by any pattern or term, merged.
///
/// Plain terms follow `case_sensitive`; patterns carry their own case rule.
pub fn highlight<S: AsRef<str>>(
    text: &str,
    patterns: &[Pattern],
    terms: &[S],
    case_sensitive: bool,
) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = patterns
        .iter()
        .flat_map(|p| p.find_ranges(text))
        .collect();
    for term in terms {
        ranges.extend(term_ranges(text, term.as_ref(), case_sensitive));
    }
    merge_ranges(ranges)
}

/// Every occurrence of `term`, scanning forward at least one character per
/// step.
fn term_ranges(text: &str, term: &str, case_sensitive: bool) -> Vec<Range<usize>> {
    if term.is_empty() {
        return Vec::new();
    }
    if !case_sensitive {
        // Offsets into a lowercased copy can drift per character, so match
        // the original text.
        return Pattern::substring(term, false).find_ranges(text);
    }
    scan(text, term)
}

fn scan(haystack: &str, needle: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut from = 0;
    while let Some(found) = haystack[from..].find(needle) {
        let start = from + found;
        let end = start + needle.len();
        if end > start {
            ranges.push(start..end);
        }
        from = end.max(next_char_boundary(haystack, start));
        if from >= haystack.len() {
            break;
        }
    }
    ranges
}

fn next_char_boundary(s: &str, index: usize) -> usize {
    s[index..]
        .chars()
        .next()
        .map_or(s.len(), |c| index + c.len_utf8())
}

/// Sort by start then end, and fuse ranges that overlap or touch.
pub fn merge_ranges(mut ranges: Vec<Range<usize>>) -> Vec<Range<usize>> {
    ranges.retain(|r| r.start < r.end);
    ranges.sort_by_key(|r| (r.start, r.end));

    let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }
    merged
}

/// Escape `& < > " '` for HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Render `text` as HTML with each range wrapped in `<mark>`. All text is
/// escaped.
pub fn render_html(text: &str, ranges: &[Range<usize>]) -> String {
    render(text, ranges, "<mark>", "</mark>", escape_html)
}

/// Render `text` with each range wrapped in custom markers. Text is left
/// verbatim.
pub fn render_with(text: &str, ranges: &[Range<usize>], open: &str, close: &str) -> String {
    render(text, ranges, open, close, str::to_string)
}

fn render(
    text: &str,
    ranges: &[Range<usize>],
    open: &str,
    close: &str,
    escape: impl Fn(&str) -> String,
) -> String {
    let mut out = String::with_capacity(text.len() + ranges.len() * (open.len() + close.len()));
    let mut cursor = 0;

    for range in ranges {
        let (start, end) = (range.start.max(cursor), range.end.min(text.len()));
        if start >= end || !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            continue;
        }
        out.push_str(&escape(&text[cursor..start]));
        out.push_str(open);
        out.push_str(&escape(&text[start..end]));
        out.push_str(close);
        cursor = end;
    }
    out.push_str(&escape(&text[cursor..]));
    out
}

/// Highlights excerpt text for one search: the dedicated text filters plus
/// the free-text query.
#[derive(Debug)]
pub struct Highlighter {
    patterns: Vec<Pattern>,
    terms: Vec<String>,
}

impl Highlighter {
    pub fn new(query: &ParsedQuery, options: &SearchOptions) -> Self {
        let compiled = CompiledQuery::compile(query, options);
        let (terms, free_text_pattern) = match &compiled.free_text {
            Some(free_text) => (
                free_text.highlight_terms(),
                free_text.highlight_pattern().cloned(),
            ),
            None => (Vec::new(), None),
        };
        let patterns = compiled
            .content
            .into_iter()
            .chain(compiled.line)
            .chain(compiled.headings)
            .chain(free_text_pattern)
            .collect();

        Self { patterns, terms }
    }

    pub fn ranges(&self, text: &str) -> Vec<Range<usize>> {
        // Free-text terms are always case-insensitive.
        highlight(text, &self.patterns, &self.terms, false)
    }

    pub fn html(&self, text: &str) -> String {
        render_html(text, &self.ranges(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::query::QueryBuilder;
    use crate::search::types::SearchMode;

    #[test]
    fn test_merge_ranges() {
        assert_eq!(merge_ranges(vec![5..8, 0..2, 1..3, 3..4, 9..9]), vec![0..4, 5..8]);
        assert_eq!(merge_ranges(vec![0..10, 2..3]), vec![0..10]);
    }

    #[test]
    fn test_highlight_patterns_and_terms() {
        let patterns = vec![Pattern::new("/b.b/", false)];
        let ranges = highlight("bob and Alice and bib", &patterns, &["alice"], false);
        assert_eq!(ranges, vec![0..3, 8..13, 18..21]);
    }

    #[test]
    fn test_term_scan_overlapping() {
        assert_eq!(highlight::<&str>("aaaa", &[], &["aa"], true), vec![0..4]);
        assert_eq!(term_ranges("aaaa", "aa", true), vec![0..2, 2..4]);
    }

    #[test]
    fn test_term_scan_case_rule() {
        assert_eq!(term_ranges("Bob bob", "bob", true), vec![4..7]);
        assert_eq!(term_ranges("Bob bob", "bob", false), vec![0..3, 4..7]);
        // Lowercasing changes the byte length of `İ`.
        assert_eq!(term_ranges("İx x", "x", false), vec![2..3, 4..5]);
        assert_eq!(highlight("ẞa İb", &[], &["a"], false), vec![3..4]);
    }

    #[test]
    fn test_glob_pattern_highlight() {
        let patterns = vec![Pattern::new("a?c", false)];
        assert_eq!(highlight::<&str>("xxABCxx", &patterns, &[], false), vec![2..5]);
    }

    #[test]
    fn test_render_html_escapes_everything() {
        let text = "<b>bob</b> & 'x'";
        let ranges = highlight(text, &[], &["bob"], false);
        assert_eq!(
            render_html(text, &ranges),
            "&lt;b&gt;<mark>bob</mark>&lt;/b&gt; &amp; &#39;x&#39;"
        );
    }

    #[test]
    fn test_render_html_escapes_inside_marks() {
        assert_eq!(render_html("a<b", &[0..3]), "<mark>a&lt;b</mark>");
    }

    #[test]
    fn test_render_with_markers() {
        assert_eq!(render_with("hello world", &[6..11], "[", "]"), "hello [world]");
        assert_eq!(render_with("plain", &[], "[", "]"), "plain");
    }

    #[test]
    fn test_highlighter_uses_query() {
        let query = QueryBuilder::new()
            .with_content_pattern("alpha")
            .with_global_query("beta")
            .build()
            .unwrap();
        let highlighter = Highlighter::new(&query, &SearchOptions::default());
        assert_eq!(highlighter.html("Alpha & BETA"), "<mark>Alpha</mark> &amp; <mark>BETA</mark>");

        let regex = SearchOptions {
            mode: SearchMode::Regex,
            ..Default::default()
        };
        let query = QueryBuilder::new().with_global_query("g.+d").build().unwrap();
        let highlighter = Highlighter::new(&query, &regex);
        assert_eq!(highlighter.ranges("so GOOD"), vec![3..7]);
    }
}
