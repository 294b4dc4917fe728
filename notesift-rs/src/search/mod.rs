//! Compound note search: dedicated filters AND-combined, a free-text query
//! OR-combined across facets, and per-line evidence for every match.

pub mod driver;
pub mod evaluator;
pub mod excerpt;
pub mod facets;
pub mod highlight;
pub mod parser;
pub mod pattern;
pub mod query;
pub mod strategy;
pub mod types;

pub use driver::{CancelToken, evaluate, evaluate_with_cancel, sort_documents};
pub use evaluator::{CompiledQuery, Evaluation, Gate, evaluate_document};
pub use excerpt::{Excerpt, ExcerptMerger, LineRef, merge_excerpts};
pub use facets::{
    HeadingLine, PropertyMatcher, TagMatcher, headings_of, line_text_at, property_matches,
    split_lines, tags_of,
};
pub use highlight::{Highlighter, escape_html, highlight, merge_ranges, render_html, render_with};
pub use parser::parse_query;
pub use pattern::{Pattern, PatternKind, glob_to_regex, matches_pattern, parse_regex_literal};
pub use query::{
    FilterKind, ParsedQuery, PropertyFilter, PropertyValue, QueryBuilder, build_line_and_pattern,
};
pub use strategy::{FacetHit, FreeTextMatcher, matcher_for};
pub use types::*;
