//! Free-text matching strategies, one per [`SearchMode`].
//!
//! Free text never follows the dedicated-filter case rule: every mode is
//! case-insensitive, except that regex mode honours explicit flags.

use crate::search::facets::split_lines;
use crate::search::pattern::Pattern;
use crate::search::types::SearchMode;
use std::fmt;
use unicode_normalization::UnicodeNormalization;

/// Outcome of testing one facet string.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FacetHit {
    pub hit: bool,
    pub count: usize,
    /// Relevance score (fuzzy mode only).
    pub score: Option<f64>,
}

impl FacetHit {
    pub fn miss() -> Self {
        Self::default()
    }

    fn flag(hit: bool) -> Self {
        Self {
            hit,
            count: usize::from(hit),
            score: None,
        }
    }
}

/// A prepared free-text query.
pub trait FreeTextMatcher: fmt::Debug + Send + Sync {
    fn mode(&self) -> SearchMode;

    /// Test one facet string.
    fn test(&self, text: &str) -> FacetHit;

    /// Test the body. Acceptance uses the whole-body test; the count is the
    /// number of lines that hit on their own.
    fn test_body(&self, body: &str) -> FacetHit {
        let whole = self.test(body);
        if !whole.hit {
            return whole;
        }
        let count = split_lines(body)
            .into_iter()
            .filter(|line| self.test(line).hit)
            .count();
        FacetHit { count, ..whole }
    }

    /// Plain terms the highlighter should mark.
    fn highlight_terms(&self) -> Vec<String> {
        Vec::new()
    }

    /// Pattern the highlighter should mark.
    fn highlight_pattern(&self) -> Option<&Pattern> {
        None
    }
}

/// Prepare a matcher for `query`. Blank queries have none.
pub fn matcher_for(mode: SearchMode, query: &str) -> Option<Box<dyn FreeTextMatcher>> {
    let query: String = query.trim().nfc().collect();
    if query.is_empty() {
        return None;
    }

    let matcher: Box<dyn FreeTextMatcher> = match mode {
        SearchMode::Simple => Box::new(SimpleMatcher::new(&query)),
        SearchMode::Fuzzy => Box::new(FuzzyMatcher::new(&query)),
        SearchMode::Regex => Box::new(RegexMatcher::new(&query)),
        SearchMode::Exact => Box::new(ExactMatcher::new(&query)),
    };
    Some(matcher)
}

// ============================================================================
// Simple
// ============================================================================

/// Every whitespace-separated token must appear, in any order.
#[derive(Debug, Clone)]
pub struct SimpleMatcher {
    tokens: Vec<Pattern>,
}

impl SimpleMatcher {
    pub fn new(query: &str) -> Self {
        Self {
            tokens: query
                .split_whitespace()
                .map(|t| Pattern::substring(t, false))
                .collect(),
        }
    }
}

impl FreeTextMatcher for SimpleMatcher {
    fn mode(&self) -> SearchMode {
        SearchMode::Simple
    }

    fn test(&self, text: &str) -> FacetHit {
        FacetHit::flag(!self.tokens.is_empty() && self.tokens.iter().all(|t| t.is_match(text)))
    }

    fn highlight_terms(&self) -> Vec<String> {
        self.tokens.iter().map(|t| t.literal().to_string()).collect()
    }
}

// ============================================================================
// Fuzzy
// ============================================================================

/// Ordered, possibly non-contiguous character match with a score.
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    query: Vec<char>,
}

impl FuzzyMatcher {
    pub fn new(query: &str) -> Self {
        Self {
            query: query
                .to_lowercase()
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect(),
        }
    }
}

impl FreeTextMatcher for FuzzyMatcher {
    fn mode(&self) -> SearchMode {
        SearchMode::Fuzzy
    }

    fn test(&self, text: &str) -> FacetHit {
        match subsequence_score(&self.query, text) {
            Some(score) => FacetHit {
                hit: true,
                count: 1,
                score: Some(score),
            },
            None => FacetHit::miss(),
        }
    }
}

/// Score `text` for a lowercase query, or `None` when the query characters do
/// not all appear in order.
///
/// Consecutive runs and a match at the start score higher; longer texts are
/// penalised.
fn subsequence_score(query: &[char], text: &str) -> Option<f64> {
    let text_lower: Vec<char> = text.to_lowercase().chars().collect();

    if query.is_empty() || text_lower.is_empty() {
        return None;
    }

    let mut query_idx = 0;
    let mut match_positions: Vec<usize> = Vec::with_capacity(query.len());

    for (text_idx, text_char) in text_lower.iter().enumerate() {
        if query_idx < query.len() && *text_char == query[query_idx] {
            match_positions.push(text_idx);
            query_idx += 1;
        }
    }

    if query_idx < query.len() {
        return None;
    }

    let mut score = 1.0;

    let consecutive = match_positions.windows(2).filter(|w| w[1] == w[0] + 1).count();
    score += (consecutive as f64 * 0.1).min(0.5);

    if match_positions.first() == Some(&0) {
        score += 0.2;
    }

    let length_ratio = query.len() as f64 / text_lower.len() as f64;
    score *= length_ratio.sqrt();

    Some(score.min(1.0))
}

// ============================================================================
// Regex
// ============================================================================

/// An explicit `/body/flags` literal, else the query as a case-insensitive
/// regex, else a case-insensitive substring. Counts every match.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    pattern: Pattern,
}

impl RegexMatcher {
    pub fn new(query: &str) -> Self {
        let pattern = Pattern::regex_literal(query, true)
            .unwrap_or_else(|| Pattern::insensitive_regex(query));
        Self { pattern }
    }
}

impl FreeTextMatcher for RegexMatcher {
    fn mode(&self) -> SearchMode {
        SearchMode::Regex
    }

    fn test(&self, text: &str) -> FacetHit {
        let mut count = self.pattern.count_matches(text);
        // Only empty matches, e.g. `x*` on "abc": still a hit.
        if count == 0 && self.pattern.is_match(text) {
            count = 1;
        }
        FacetHit {
            hit: count > 0,
            count,
            score: None,
        }
    }

    fn test_body(&self, body: &str) -> FacetHit {
        self.test(body)
    }

    fn highlight_pattern(&self) -> Option<&Pattern> {
        Some(&self.pattern)
    }
}

// ============================================================================
// Exact
// ============================================================================

/// Case-insensitive contiguous substring. Counts 1 or 0.
#[derive(Debug, Clone)]
pub struct ExactMatcher {
    needle: Pattern,
}

impl ExactMatcher {
    pub fn new(query: &str) -> Self {
        Self {
            needle: Pattern::substring(query, false),
        }
    }
}

impl FreeTextMatcher for ExactMatcher {
    fn mode(&self) -> SearchMode {
        SearchMode::Exact
    }

    fn test(&self, text: &str) -> FacetHit {
        FacetHit::flag(self.needle.is_match(text))
    }

    fn test_body(&self, body: &str) -> FacetHit {
        self.test(body)
    }

    fn highlight_terms(&self) -> Vec<String> {
        vec![self.needle.literal().to_string()]
    }
}
