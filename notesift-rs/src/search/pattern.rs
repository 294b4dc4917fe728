//! Pattern literals: explicit `/regex/flags`, globs and plain substrings.
//!
//! A literal is interpreted in priority order. If it parses as `/body/flags`
//! and the body compiles, it is a regex whose own flags decide case. Else, if
//! it contains `*` or `?`, it is an unanchored glob. Otherwise it is a
//! substring. A malformed regex literal is never an error: it falls through
//! to the glob or substring reading of the same text.

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::ops::Range;

/// Flags accepted after the closing slash of a regex literal.
const REGEX_FLAGS: &str = "dgimsuy";

/// Which interpretation a literal received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Regex,
    Glob,
    Substring,
}

/// The parts of a `/body/flags` literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegexLiteral<'a> {
    pub body: &'a str,
    pub flags: &'a str,
}

impl RegexLiteral<'_> {
    pub fn case_insensitive(&self) -> bool {
        self.flags.contains('i')
    }

    pub fn multi_line(&self) -> bool {
        self.flags.contains('m')
    }

    pub fn dot_all(&self) -> bool {
        self.flags.contains('s')
    }
}

/// Split `/body/flags` into its parts. Returns `None` when the text is not
/// shaped like a regex literal.
pub fn parse_regex_literal(literal: &str) -> Option<RegexLiteral<'_>> {
    let rest = literal.strip_prefix('/')?;
    let close = rest.rfind('/')?;
    let body = &rest[..close];
    let flags = &rest[close + 1..];

    if body.is_empty() || !flags.chars().all(|c| REGEX_FLAGS.contains(c)) {
        return None;
    }
    Some(RegexLiteral { body, flags })
}

/// Compile a glob to an unanchored regex: `*` becomes `.*`, `?` becomes `.`,
/// everything else is literal.
pub fn glob_to_regex(glob: &str, case_sensitive: bool) -> Result<Regex, regex::Error> {
    let mut source = String::with_capacity(glob.len() * 2);
    for ch in glob.chars() {
        match ch {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            other => source.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
        }
    }
    RegexBuilder::new(&source)
        .case_insensitive(!case_sensitive)
        .build()
}

/// Test `value` against a pattern literal. Compiles on every call; hold a
/// [`Pattern`] to reuse the compiled form.
pub fn matches_pattern(value: &str, pattern: &str, case_sensitive: bool) -> bool {
    Pattern::new(pattern, case_sensitive).is_match(value)
}

/// Scope of a lookahead conjunction, from the literal's `m`/`s` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConjunctionScope {
    /// No flags: the haystack must be a single line holding every term.
    WholeSingleLine,
    /// `m`: some line of the haystack holds every term.
    AnyLine,
    /// `s`: every term occurs somewhere.
    Anywhere,
}

#[derive(Debug, Clone)]
enum Matcher {
    Regex(Regex),
    Conjunction {
        terms: Vec<Regex>,
        scope: ConjunctionScope,
    },
    Glob(Regex),
    Substring {
        needle: String,
        // Set when matching ignores case.
        folded: Option<Regex>,
    },
}

/// A compiled pattern literal.
#[derive(Debug, Clone)]
pub struct Pattern {
    literal: String,
    matcher: Matcher,
}

impl Pattern {
    /// Compile a literal with the dedicated-filter case rule: explicit regex
    /// flags are authoritative, globs and substrings follow `case_sensitive`.
    pub fn new(literal: &str, case_sensitive: bool) -> Self {
        if let Some(pattern) = Self::regex_literal(literal, false) {
            return pattern;
        }

        if literal.contains(['*', '?']) {
            if let Ok(re) = glob_to_regex(literal, case_sensitive) {
                return Self {
                    literal: literal.to_string(),
                    matcher: Matcher::Glob(re),
                };
            }
        }

        Self::substring(literal, case_sensitive)
    }

    /// Compile `literal` only if it is a well-formed `/body/flags` regex.
    ///
    /// When the literal carries no flags at all, `default_insensitive` decides
    /// case; free-text regex queries default to case-insensitive.
    pub fn regex_literal(literal: &str, default_insensitive: bool) -> Option<Self> {
        let parsed = parse_regex_literal(literal)?;
        let insensitive =
            parsed.case_insensitive() || (parsed.flags.is_empty() && default_insensitive);
        let build = |source: &str| {
            RegexBuilder::new(source)
                .case_insensitive(insensitive)
                .multi_line(parsed.multi_line())
                .dot_matches_new_line(parsed.dot_all())
                .build()
        };

        let matcher = match split_lookahead_conjunction(parsed.body) {
            Some(terms) => {
                let terms = terms
                    .into_iter()
                    .map(build)
                    .collect::<Result<Vec<_>, _>>()
                    .ok()?;
                let scope = if parsed.dot_all() {
                    ConjunctionScope::Anywhere
                } else if parsed.multi_line() {
                    ConjunctionScope::AnyLine
                } else {
                    ConjunctionScope::WholeSingleLine
                };
                Matcher::Conjunction { terms, scope }
            }
            None => Matcher::Regex(build(parsed.body).ok()?),
        };

        Some(Self {
            literal: literal.to_string(),
            matcher,
        })
    }

    /// A plain substring pattern, bypassing regex and glob interpretation.
    pub fn substring(needle: &str, case_sensitive: bool) -> Self {
        let folded = if case_sensitive {
            None
        } else {
            RegexBuilder::new(&regex::escape(needle))
                .case_insensitive(true)
                .build()
                .ok()
        };
        Self {
            literal: needle.to_string(),
            matcher: Matcher::Substring {
                needle: needle.to_string(),
                folded,
            },
        }
    }

    /// Compile an arbitrary regex source (no slashes), case-insensitive.
    /// Invalid sources fall back to a case-insensitive substring.
    pub fn insensitive_regex(source: &str) -> Self {
        match RegexBuilder::new(source).case_insensitive(true).build() {
            Ok(re) => Self {
                literal: source.to_string(),
                matcher: Matcher::Regex(re),
            },
            Err(_) => Self::substring(source, false),
        }
    }

    /// The literal this pattern was compiled from.
    pub fn literal(&self) -> &str {
        &self.literal
    }

    pub fn kind(&self) -> PatternKind {
        match self.matcher {
            Matcher::Regex(_) | Matcher::Conjunction { .. } => PatternKind::Regex,
            Matcher::Glob(_) => PatternKind::Glob,
            Matcher::Substring { .. } => PatternKind::Substring,
        }
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        match &self.matcher {
            Matcher::Regex(re) | Matcher::Glob(re) => re.is_match(haystack),
            Matcher::Conjunction { terms, scope } => conjunction_matches(terms, *scope, haystack),
            Matcher::Substring { needle, folded } => match folded {
                Some(re) => re.is_match(haystack),
                None => haystack.contains(needle.as_str()),
            },
        }
    }

    /// Byte ranges of every non-empty, non-overlapping match.
    ///
    /// For a lookahead conjunction these are the occurrences of each term,
    /// possibly overlapping across terms; callers merge them.
    pub fn find_ranges(&self, haystack: &str) -> Vec<Range<usize>> {
        match &self.matcher {
            Matcher::Regex(re) | Matcher::Glob(re) => regex_ranges(re, haystack),
            Matcher::Conjunction { terms, scope } => {
                if !conjunction_matches(terms, *scope, haystack) {
                    return Vec::new();
                }
                let mut ranges: Vec<Range<usize>> =
                    terms.iter().flat_map(|re| regex_ranges(re, haystack)).collect();
                ranges.sort_by_key(|r| (r.start, r.end));
                ranges
            }
            Matcher::Substring { needle, folded } => match folded {
                Some(re) => regex_ranges(re, haystack),
                None if needle.is_empty() => Vec::new(),
                None => haystack
                    .match_indices(needle.as_str())
                    .map(|(start, m)| start..start + m.len())
                    .collect(),
            },
        }
    }

    /// Number of non-empty, non-overlapping matches. Every call is a fresh scan.
    pub fn count_matches(&self, haystack: &str) -> usize {
        match &self.matcher {
            Matcher::Conjunction { terms, scope } => {
                usize::from(conjunction_matches(terms, *scope, haystack))
            }
            _ => self.find_ranges(haystack).len(),
        }
    }
}

fn regex_ranges(re: &Regex, haystack: &str) -> Vec<Range<usize>> {
    re.find_iter(haystack)
        .filter(|m| !m.is_empty())
        .map(|m| m.range())
        .collect()
}

fn conjunction_matches(terms: &[Regex], scope: ConjunctionScope, haystack: &str) -> bool {
    let all_in = |text: &str| terms.iter().all(|re| re.is_match(text));
    match scope {
        ConjunctionScope::WholeSingleLine => !haystack.contains('\n') && all_in(haystack),
        ConjunctionScope::AnyLine => haystack.split('\n').any(all_in),
        ConjunctionScope::Anywhere => all_in(haystack),
    }
}

/// Recognize `^(?=.*t1)(?=.*t2)….*$` and return the term sources.
///
/// The `regex` crate has no lookaround, so this shape is evaluated as a
/// conjunction of per-term regexes instead.
fn split_lookahead_conjunction(body: &str) -> Option<Vec<&str>> {
    let mut rest = body.strip_prefix('^')?.strip_suffix(".*$")?;
    let mut terms = Vec::new();

    while !rest.is_empty() {
        rest = rest.strip_prefix("(?=.*")?;
        let end = group_end(rest)?;
        terms.push(&rest[..end]);
        rest = &rest[end + 1..];
    }

    (!terms.is_empty()).then_some(terms)
}

/// Index of the `)` closing the group whose contents start `text`.
fn group_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut escaped = false;
    let mut in_class = false;

    for (i, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '(' if !in_class => depth += 1,
            ')' if !in_class => {
                if depth == 0 {
                    return Some(i);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_regex_literal() {
        let lit = parse_regex_literal("/a.*b/gi").unwrap();
        assert_eq!(lit.body, "a.*b");
        assert_eq!(lit.flags, "gi");
        assert!(lit.case_insensitive());

        assert!(parse_regex_literal("/path/to/file").is_none());
        assert!(parse_regex_literal("//i").is_none());
        assert!(parse_regex_literal("plain").is_none());
        assert!(parse_regex_literal("/unterminated").is_none());
    }

    #[test]
    fn test_regex_wins_over_glob() {
        let pattern = Pattern::new("/a*b/", false);
        assert_eq!(pattern.kind(), PatternKind::Regex);
        assert!(pattern.is_match("aab"));
        // As a glob `a*b` would also accept this, as a regex it has no `ab` run.
        assert!(!pattern.is_match("axb"));
    }

    #[test]
    fn test_regex_flags_are_authoritative() {
        assert!(!Pattern::new("/Project/", false).is_match("project"));
        assert!(Pattern::new("/Project/i", true).is_match("project"));
    }

    #[test]
    fn test_malformed_regex_degrades() {
        let pattern = Pattern::new("/(unclosed/", false);
        assert_eq!(pattern.kind(), PatternKind::Substring);
        assert!(pattern.is_match("see /(unclosed/ here"));

        let glob = Pattern::new("/[bad*/", false);
        assert_eq!(glob.kind(), PatternKind::Glob);
        assert!(glob.is_match("x/[bad stuff/"));
    }

    #[test]
    fn test_glob_is_unanchored() {
        let pattern = Pattern::new("*.md", false);
        assert_eq!(pattern.kind(), PatternKind::Glob);
        assert!(pattern.is_match("2024-09.md"));
        assert!(!pattern.is_match("2024-09.txt"));
        assert!(Pattern::new("b?b", false).is_match("hello BOB!"));
        assert!(!Pattern::new("b?b", true).is_match("hello BOB!"));
    }

    #[test]
    fn test_glob_escapes_metacharacters() {
        let pattern = Pattern::new("a.(b)*", true);
        assert!(pattern.is_match("xa.(b)yz"));
        assert!(!pattern.is_match("aX(b)"));
    }

    #[test]
    fn test_substring_case_rule() {
        assert!(matches_pattern("my project", "Project", false));
        assert!(!matches_pattern("my project", "Project", true));
        assert!(matches_pattern("2024-09.md", "2024", true));
    }

    #[test]
    fn test_find_ranges() {
        let pattern = Pattern::new("ab", false);
        assert_eq!(pattern.find_ranges("xABab"), vec![1..3, 3..5]);
        assert_eq!(Pattern::new("ab", true).find_ranges("xABab"), vec![3..5]);
        assert_eq!(Pattern::new("/a*/", false).find_ranges("baab"), vec![1..3]);
    }

    #[test]
    fn test_count_matches_is_repeatable() {
        let pattern = Pattern::new("/o/g", false);
        assert_eq!(pattern.count_matches("foo boo"), 4);
        assert_eq!(pattern.count_matches("foo boo"), 4);
    }

    #[test]
    fn test_conjunction_single_line() {
        let pattern = Pattern::new("/^(?=.*alice)(?=.*bob).*$/i", false);
        assert_eq!(pattern.kind(), PatternKind::Regex);
        assert!(pattern.is_match("Bob met Alice"));
        assert!(!pattern.is_match("alice only"));
        // Without `m` the whole haystack must be one line.
        assert!(!pattern.is_match("alice\nbob"));
    }

    #[test]
    fn test_conjunction_flags() {
        let multi = Pattern::new("/^(?=.*alice)(?=.*bob).*$/m", false);
        assert!(multi.is_match("x\nalice and bob\ny"));
        assert!(!multi.is_match("alice\nbob"));

        let dot_all = Pattern::new("/^(?=.*alice)(?=.*bob).*$/s", false);
        assert!(dot_all.is_match("alice\nbob"));
    }

    #[test]
    fn test_conjunction_with_escaped_parens() {
        let pattern = Pattern::new(r"/^(?=.*f\(x\))(?=.*y).*$/", false);
        assert!(pattern.is_match("y = f(x)"));
        assert!(!pattern.is_match("f(x) only"));
    }

    #[test]
    fn test_conjunction_ranges_cover_terms() {
        let pattern = Pattern::new("/^(?=.*b)(?=.*a).*$/", false);
        assert_eq!(pattern.find_ranges("a b"), vec![0..1, 2..3]);
        assert!(pattern.find_ranges("a only").is_empty());
        assert_eq!(pattern.count_matches("a b a"), 1);
    }

    #[test]
    fn test_insensitive_regex_fallback() {
        assert_eq!(Pattern::insensitive_regex("go+d").kind(), PatternKind::Regex);
        assert!(Pattern::insensitive_regex("go+d").is_match("GOOD"));
        let fallback = Pattern::insensitive_regex("(oops");
        assert_eq!(fallback.kind(), PatternKind::Substring);
        assert!(fallback.is_match("an (OOPS here"));
    }
}
