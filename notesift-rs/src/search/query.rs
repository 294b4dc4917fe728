//! The parsed query and its immutable builder.

use crate::error::{Result, VaultError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Value constraint of a property filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    /// The key must exist.
    Exists,
    /// Plain value, compared for equality.
    Equals(String),
    /// An explicit `/regex/flags` literal.
    Regex(String),
}

impl PropertyValue {
    /// Classify a user-entered value: a well-formed regex literal becomes
    /// [`PropertyValue::Regex`], anything else an equality.
    pub fn parse(value: &str) -> Self {
        if crate::search::pattern::parse_regex_literal(value).is_some() {
            Self::Regex(value.to_string())
        } else {
            Self::Equals(value.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyFilter {
    pub name: String,
    pub value: PropertyValue,
}

/// The dedicated filter kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    File,
    Path,
    Tag,
    Property,
    Heading,
    Content,
    Line,
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::File => "file",
            Self::Path => "path",
            Self::Tag => "tag",
            Self::Property => "property",
            Self::Heading => "heading",
            Self::Content => "content",
            Self::Line => "line",
        };
        f.write_str(name)
    }
}

/// A fully built query. Immutable once built; construct it with
/// [`QueryBuilder`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuery {
    /// Free-text query; empty means no free-text constraint.
    pub global_query: String,
    pub file_patterns: Vec<String>,
    pub path_patterns: Vec<String>,
    pub tag_filters: Vec<String>,
    pub content_patterns: Vec<String>,
    /// The combined lookahead-AND literal built from all line terms.
    pub line_pattern: Option<String>,
    pub heading_patterns: Vec<String>,
    pub property_filters: Vec<PropertyFilter>,
}

impl ParsedQuery {
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    /// True when there is neither a dedicated filter nor free text.
    pub fn is_empty(&self) -> bool {
        self.global_query.trim().is_empty() && self.active_filters().is_empty()
    }

    /// The dedicated filter kinds with at least one entry.
    pub fn active_filters(&self) -> BTreeSet<FilterKind> {
        [
            (FilterKind::File, !self.file_patterns.is_empty()),
            (FilterKind::Path, !self.path_patterns.is_empty()),
            (FilterKind::Tag, !self.tag_filters.is_empty()),
            (FilterKind::Property, !self.property_filters.is_empty()),
            (FilterKind::Heading, !self.heading_patterns.is_empty()),
            (FilterKind::Content, !self.content_patterns.is_empty()),
            (FilterKind::Line, self.line_pattern.is_some()),
        ]
        .into_iter()
        .filter_map(|(kind, active)| active.then_some(kind))
        .collect()
    }
}

/// Build the lookahead-AND literal requiring every term on one line, in any
/// order: `/^(?=.*t1)…(?=.*tn).*$/`, plus `i` unless case-sensitive.
///
/// Terms are regex-escaped. Blank terms are ignored; with no terms left there
/// is no line filter.
pub fn build_line_and_pattern<S: AsRef<str>>(terms: &[S], case_sensitive: bool) -> Option<String> {
    let lookaheads: String = terms
        .iter()
        .map(|t| t.as_ref().trim())
        .filter(|t| !t.is_empty())
        .map(|t| format!("(?=.*{})", regex::escape(t)))
        .collect();

    if lookaheads.is_empty() {
        return None;
    }
    let flags = if case_sensitive { "" } else { "i" };
    Some(format!("/^{}.*$/{}", lookaheads, flags))
}

/// Immutable query builder. Every `with_*` call consumes the builder and
/// returns the extended one.
///
/// ```
/// use notesift::search::QueryBuilder;
///
/// let query = QueryBuilder::new()
///     .with_tag("project")
///     .with_content_pattern("alpha")
///     .build()
///     .unwrap();
/// assert_eq!(query.tag_filters, vec!["project"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryBuilder {
    global_terms: Vec<String>,
    file_patterns: Vec<String>,
    path_patterns: Vec<String>,
    tag_filters: Vec<String>,
    content_patterns: Vec<String>,
    line_terms: Vec<String>,
    heading_patterns: Vec<String>,
    property_filters: Vec<PropertyFilter>,
    case_sensitive: bool,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the free-text query.
    pub fn with_global_query(mut self, query: &str) -> Self {
        self.global_terms = vec![query.trim().to_string()];
        self
    }

    /// Append a word to the free-text query.
    pub fn with_global_term(mut self, term: &str) -> Self {
        push_nonblank(&mut self.global_terms, term);
        self
    }

    pub fn with_file_pattern(mut self, pattern: &str) -> Self {
        push_nonblank(&mut self.file_patterns, pattern);
        self
    }

    pub fn with_path_pattern(mut self, pattern: &str) -> Self {
        push_nonblank(&mut self.path_patterns, pattern);
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        push_nonblank(&mut self.tag_filters, tag);
        self
    }

    pub fn with_content_pattern(mut self, pattern: &str) -> Self {
        push_nonblank(&mut self.content_patterns, pattern);
        self
    }

    /// Add a term that must co-occur on one line with every other line term.
    pub fn with_line_term(mut self, term: &str) -> Self {
        push_nonblank(&mut self.line_terms, term);
        self
    }

    pub fn with_heading_pattern(mut self, pattern: &str) -> Self {
        push_nonblank(&mut self.heading_patterns, pattern);
        self
    }

    pub fn with_property(mut self, name: &str, value: PropertyValue) -> Self {
        let name = name.trim();
        if !name.is_empty() {
            self.property_filters.push(PropertyFilter {
                name: name.to_string(),
                value,
            });
        }
        self
    }

    /// Case rule for the line-AND literal. Other filters take the case rule
    /// from the search options at evaluation time.
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Line terms collected so far, before they are combined.
    pub fn line_terms(&self) -> &[String] {
        &self.line_terms
    }

    /// Produce the query without validating it.
    pub fn finish(self) -> ParsedQuery {
        ParsedQuery {
            global_query: self
                .global_terms
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
            line_pattern: build_line_and_pattern(self.line_terms.as_slice(), self.case_sensitive),
            file_patterns: self.file_patterns,
            path_patterns: self.path_patterns,
            tag_filters: self.tag_filters,
            content_patterns: self.content_patterns,
            heading_patterns: self.heading_patterns,
            property_filters: self.property_filters,
        }
    }

    /// Produce the query, rejecting one with nothing to search for.
    pub fn build(self) -> Result<ParsedQuery> {
        let query = self.finish();
        if query.is_empty() {
            return Err(VaultError::EmptyQuery);
        }
        Ok(query)
    }
}

fn push_nonblank(list: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        list.push(value.to_string());
    }
}
