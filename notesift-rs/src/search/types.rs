//! Search options and result types.

use crate::document::DocumentStat;
use crate::search::excerpt::Excerpt;
use crate::search::query::FilterKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// How the free-text query is matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// All whitespace-separated tokens present, any order.
    #[default]
    Simple,
    /// Ordered character subsequence, scored.
    Fuzzy,
    /// Regular expression.
    Regex,
    /// Contiguous substring.
    Exact,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Simple => "simple",
            Self::Fuzzy => "fuzzy",
            Self::Regex => "regex",
            Self::Exact => "exact",
        };
        f.write_str(name)
    }
}

/// Result ordering. The corpus is sorted this way before evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// Most recently modified first.
    #[default]
    MtimeDesc,
    MtimeAsc,
    PathAsc,
}

/// A document facet the free-text query can target.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Facet {
    Body,
    Name,
    Path,
    Frontmatter,
    Tags,
    Headings,
}

impl Facet {
    pub const ALL: [Facet; 6] = [
        Facet::Body,
        Facet::Name,
        Facet::Path,
        Facet::Frontmatter,
        Facet::Tags,
        Facet::Headings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Name => "name",
            Self::Path => "path",
            Self::Frontmatter => "frontmatter",
            Self::Tags => "tags",
            Self::Headings => "headings",
        }
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which facets the free-text query is tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalQueryTargets {
    pub body: bool,
    pub name: bool,
    pub path: bool,
    pub frontmatter: bool,
    pub tags: bool,
    pub headings: bool,
}

impl Default for GlobalQueryTargets {
    fn default() -> Self {
        Self::all()
    }
}

impl GlobalQueryTargets {
    pub fn all() -> Self {
        Self::from_facets(&Facet::ALL)
    }

    pub fn none() -> Self {
        Self::from_facets(&[])
    }

    pub fn only(facet: Facet) -> Self {
        Self::from_facets(&[facet])
    }

    pub fn from_facets(facets: &[Facet]) -> Self {
        let has = |f: Facet| facets.contains(&f);
        Self {
            body: has(Facet::Body),
            name: has(Facet::Name),
            path: has(Facet::Path),
            frontmatter: has(Facet::Frontmatter),
            tags: has(Facet::Tags),
            headings: has(Facet::Headings),
        }
    }

    pub fn enabled(&self, facet: Facet) -> bool {
        match facet {
            Facet::Body => self.body,
            Facet::Name => self.name,
            Facet::Path => self.path,
            Facet::Frontmatter => self.frontmatter,
            Facet::Tags => self.tags,
            Facet::Headings => self.headings,
        }
    }

    pub fn any(&self) -> bool {
        Facet::ALL.iter().any(|f| self.enabled(*f))
    }
}

/// Per-search settings. Built once per search and never mutated during it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Free-text matching mode.
    pub mode: SearchMode,
    /// Case rule for dedicated filters. The free-text query ignores it.
    pub case_sensitive: bool,
    pub sort: SortOrder,
    /// Maximum number of accepted documents; `None` scans the whole corpus.
    pub limit: Option<usize>,
    pub targets: GlobalQueryTargets,
    /// Maximum excerpts kept per document.
    pub excerpt_limit: usize,
    /// Evaluate documents on the rayon thread pool.
    pub parallel: bool,
}

pub const DEFAULT_EXCERPT_LIMIT: usize = 10;

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            mode: SearchMode::default(),
            case_sensitive: false,
            sort: SortOrder::default(),
            limit: None,
            targets: GlobalQueryTargets::default(),
            excerpt_limit: DEFAULT_EXCERPT_LIMIT,
            parallel: false,
        }
    }
}

/// For each active dedicated filter kind, how many of its sub-patterns
/// matched. For the line filter, the number of distinct hit lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterHitStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headings: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

/// Free-text hit counts per facet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacetCounts {
    pub body: usize,
    pub name: usize,
    pub path: usize,
    pub frontmatter: usize,
    pub tags: usize,
    pub headings: usize,
}

impl FacetCounts {
    pub fn get(&self, facet: Facet) -> usize {
        match facet {
            Facet::Body => self.body,
            Facet::Name => self.name,
            Facet::Path => self.path,
            Facet::Frontmatter => self.frontmatter,
            Facet::Tags => self.tags,
            Facet::Headings => self.headings,
        }
    }

    pub(crate) fn set(&mut self, facet: Facet, count: usize) {
        let slot = match facet {
            Facet::Body => &mut self.body,
            Facet::Name => &mut self.name,
            Facet::Path => &mut self.path,
            Facet::Frontmatter => &mut self.frontmatter,
            Facet::Tags => &mut self.tags,
            Facet::Headings => &mut self.headings,
        };
        *slot = count;
    }

    pub fn total(&self) -> usize {
        Facet::ALL.iter().map(|f| self.get(*f)).sum()
    }
}

/// Free-text evidence for an accepted document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalQueryHits {
    pub mode: SearchMode,
    /// Facets that hit.
    pub facets: BTreeSet<Facet>,
    pub counts: FacetCounts,
    /// Best fuzzy score across facets (fuzzy mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuzzy_score: Option<f64>,
}

/// One accepted document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub document: DocumentStat,
    pub active_filters: BTreeSet<FilterKind>,
    pub stats: FilterHitStats,
    /// 0-based lines matched by the line filter.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub line_hits: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global: Option<GlobalQueryHits>,
    pub excerpts: Vec<Excerpt>,
}

/// Aggregate statistics for one search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchSummary {
    pub accepted_count: usize,
    /// Distinct line-filter hit lines across accepted documents.
    pub total_line_hits: usize,
    pub elapsed_ms: u64,
    /// Documents whose gate sequence ran to completion or rejection.
    pub scanned: usize,
    /// Documents skipped after an I/O failure.
    pub skipped: usize,
    pub cancelled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub results: Vec<MatchResult>,
    pub summary: SearchSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets() {
        let only_name = GlobalQueryTargets::only(Facet::Name);
        assert!(only_name.enabled(Facet::Name));
        assert!(!only_name.enabled(Facet::Body));
        assert!(!GlobalQueryTargets::none().any());
        assert!(GlobalQueryTargets::default().any());
    }

    #[test]
    fn test_options_from_toml() {
        let options: SearchOptions =
            toml::from_str("mode = \"fuzzy\"\nsort = \"path-asc\"\nlimit = 5\n[targets]\nbody = false")
                .unwrap();
        assert_eq!(options.mode, SearchMode::Fuzzy);
        assert_eq!(options.sort, SortOrder::PathAsc);
        assert_eq!(options.limit, Some(5));
        assert!(!options.targets.body);
        assert!(options.targets.name);
        assert_eq!(options.excerpt_limit, DEFAULT_EXCERPT_LIMIT);
    }

    #[test]
    fn test_facet_counts_total() {
        let mut counts = FacetCounts::default();
        counts.set(Facet::Body, 3);
        counts.set(Facet::Tags, 1);
        assert_eq!(counts.total(), 4);
        assert_eq!(counts.get(Facet::Body), 3);
    }

    #[test]
    fn test_mode_serialization() {
        assert_eq!(serde_json::to_string(&SearchMode::Exact).unwrap(), "\"exact\"");
        assert_eq!(serde_json::to_string(&SortOrder::MtimeDesc).unwrap(), "\"mtime-desc\"");
    }
}
