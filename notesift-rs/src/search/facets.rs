//! Facet extraction: the views of a document that filters and the free-text
//! query are tested against.

use crate::document::{DocumentMetadata, FrontmatterValue, HeadingPosition};
use crate::parser::normalize_tag;
use crate::search::excerpt::LineRef;
use crate::search::pattern::Pattern;
use std::collections::BTreeSet;

/// Body tags plus the frontmatter `tags` field, `#`-stripped and deduplicated.
///
/// A string-valued `tags` field may hold several tags separated by commas or
/// whitespace.
pub fn tags_of(meta: &DocumentMetadata) -> BTreeSet<String> {
    let mut tags: BTreeSet<String> = meta
        .tags
        .iter()
        .map(|t| normalize_tag(t))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();

    let frontmatter_tags: Vec<&str> = match meta.frontmatter.get("tags") {
        Some(FrontmatterValue::Text(text)) => text
            .split(|c: char| c == ',' || c.is_whitespace())
            .collect(),
        Some(FrontmatterValue::List(items)) => items.iter().map(String::as_str).collect(),
        _ => Vec::new(),
    };

    tags.extend(
        frontmatter_tags
            .into_iter()
            .map(normalize_tag)
            .filter(|t| !t.is_empty())
            .map(str::to_string),
    );
    tags
}

/// A compiled tag filter.
#[derive(Debug, Clone)]
pub enum TagMatcher {
    /// An explicit `/regex/flags` literal, tested against each tag.
    Regex(Pattern),
    /// Exact equality after `#`-stripping.
    Exact { tag: String, case_sensitive: bool },
}

impl TagMatcher {
    pub fn new(filter: &str, case_sensitive: bool) -> Self {
        match Pattern::regex_literal(filter, false) {
            Some(pattern) => Self::Regex(pattern),
            None => Self::Exact {
                tag: normalize_tag(filter).to_string(),
                case_sensitive,
            },
        }
    }

    pub fn matches(&self, tag: &str) -> bool {
        match self {
            Self::Regex(pattern) => pattern.is_match(tag),
            Self::Exact {
                tag: wanted,
                case_sensitive: true,
            } => normalize_tag(tag) == wanted.as_str(),
            Self::Exact { tag: wanted, .. } => {
                normalize_tag(tag).to_lowercase() == wanted.to_lowercase()
            }
        }
    }

    pub fn matches_any<'a>(&self, tags: impl IntoIterator<Item = &'a String>) -> bool {
        tags.into_iter().any(|t| self.matches(t))
    }
}

/// The value side of a compiled property filter.
#[derive(Debug, Clone)]
pub enum PropertyMatcher {
    /// The key must exist; the value is unconstrained.
    Exists,
    /// Equality, with the case rule applied.
    Equals { value: String, case_sensitive: bool },
    /// An explicit regex literal.
    Regex(Pattern),
}

/// Test one frontmatter property.
///
/// A list value satisfies `Equals` when any element is equal. A regex is
/// tested against each element first, then against the comma-joined list.
pub fn property_matches(meta: &DocumentMetadata, name: &str, matcher: &PropertyMatcher) -> bool {
    let Some(value) = meta.frontmatter.get(name) else {
        return false;
    };

    match matcher {
        PropertyMatcher::Exists => true,
        PropertyMatcher::Equals {
            value: wanted,
            case_sensitive,
        } => {
            let eq = |candidate: &str| {
                if *case_sensitive {
                    candidate == wanted.as_str()
                } else {
                    candidate.to_lowercase() == wanted.to_lowercase()
                }
            };
            match value {
                FrontmatterValue::List(items) => items.iter().any(|item| eq(item)),
                scalar => eq(&scalar.as_text()),
            }
        }
        PropertyMatcher::Regex(pattern) => match value {
            FrontmatterValue::List(items) => {
                items.iter().any(|item| pattern.is_match(item))
                    || pattern.is_match(&value.as_text())
            }
            scalar => pattern.is_match(&scalar.as_text()),
        },
    }
}

/// A heading with its resolved line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingLine<'a> {
    pub text: &'a str,
    pub level: u8,
    pub line: LineRef,
}

/// Headings in document order, with their line resolved.
///
/// A heading known only by byte offset resolves against `body`; without a
/// body it is [`LineRef::Synthetic`].
pub fn headings_of<'a>(meta: &'a DocumentMetadata, body: Option<&str>) -> Vec<HeadingLine<'a>> {
    meta.headings
        .iter()
        .map(|h| HeadingLine {
            text: &h.text,
            level: h.level,
            line: match (h.position, body) {
                (HeadingPosition::Line(line), _) => LineRef::Real(line),
                (HeadingPosition::Offset(offset), Some(body)) => {
                    LineRef::Real(line_index_at_offset(body, offset))
                }
                (HeadingPosition::Offset(_), None) => LineRef::Synthetic,
            },
        })
        .collect()
}

/// Split body text into lines on `\r?\n`. A trailing newline yields a final
/// empty line.
pub fn split_lines(body: &str) -> Vec<&str> {
    body.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

pub fn line_text_at(body: &str, index: usize) -> Option<&str> {
    split_lines(body).get(index).copied()
}

/// 0-based line containing byte `offset`, by counting newlines before it.
pub fn line_index_at_offset(body: &str, offset: usize) -> usize {
    let end = offset.min(body.len());
    body.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count()
}
