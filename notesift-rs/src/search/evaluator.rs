//! Per-document predicate evaluation.
//!
//! Each document runs through a fixed sequence of gates, cheapest first. The
//! first failing gate rejects it; rejected documents never get excerpts, and
//! documents rejected before the body gate are never read.

use crate::document::{DocumentMetadata, DocumentStat, DocumentStore};
use crate::error::Result;
use crate::search::excerpt::collect_excerpts;
use crate::search::facets::{
    PropertyMatcher, TagMatcher, headings_of, property_matches, split_lines, tags_of,
};
use crate::search::pattern::Pattern;
use crate::search::query::{FilterKind, ParsedQuery, PropertyValue};
use crate::search::strategy::{FreeTextMatcher, matcher_for};
use crate::search::types::{
    Facet, FacetCounts, FilterHitStats, GlobalQueryHits, GlobalQueryTargets, MatchResult,
    SearchOptions,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// A query with every pattern compiled, shared by all documents of a search.
#[derive(Debug)]
pub struct CompiledQuery {
    pub(crate) file: Vec<Pattern>,
    pub(crate) path: Vec<Pattern>,
    pub(crate) tags: Vec<TagMatcher>,
    pub(crate) properties: Vec<(String, PropertyMatcher)>,
    pub(crate) headings: Vec<Pattern>,
    pub(crate) content: Vec<Pattern>,
    pub(crate) line: Option<Pattern>,
    pub(crate) free_text: Option<Box<dyn FreeTextMatcher>>,
    pub(crate) targets: GlobalQueryTargets,
    pub(crate) excerpt_limit: usize,
    active: BTreeSet<FilterKind>,
}

impl CompiledQuery {
    pub fn compile(query: &ParsedQuery, options: &SearchOptions) -> Self {
        let cs = options.case_sensitive;
        let compile_all = |literals: &[String]| -> Vec<Pattern> {
            literals.iter().map(|l| Pattern::new(l, cs)).collect()
        };

        Self {
            file: compile_all(&query.file_patterns),
            path: compile_all(&query.path_patterns),
            tags: query
                .tag_filters
                .iter()
                .map(|t| TagMatcher::new(t, cs))
                .collect(),
            properties: query
                .property_filters
                .iter()
                .map(|filter| {
                    let matcher = match &filter.value {
                        PropertyValue::Exists => PropertyMatcher::Exists,
                        PropertyValue::Equals(value) => PropertyMatcher::Equals {
                            value: value.clone(),
                            case_sensitive: cs,
                        },
                        PropertyValue::Regex(literal) => {
                            PropertyMatcher::Regex(Pattern::new(literal, cs))
                        }
                    };
                    (filter.name.clone(), matcher)
                })
                .collect(),
            headings: compile_all(&query.heading_patterns),
            content: compile_all(&query.content_patterns),
            line: query.line_pattern.as_deref().map(|l| Pattern::new(l, cs)),
            free_text: matcher_for(options.mode, &query.global_query),
            targets: options.targets,
            excerpt_limit: options.excerpt_limit,
            active: query.active_filters(),
        }
    }

    fn needs_metadata(&self) -> bool {
        !self.tags.is_empty()
            || !self.properties.is_empty()
            || !self.headings.is_empty()
            || (self.free_text.is_some()
                && (self.targets.frontmatter || self.targets.tags || self.targets.headings))
    }

    fn needs_tags(&self) -> bool {
        !self.tags.is_empty() || (self.free_text.is_some() && self.targets.tags)
    }

    fn needs_body(&self) -> bool {
        !self.content.is_empty()
            || self.line.is_some()
            || (self.free_text.is_some() && self.targets.body)
    }
}

/// The gate that rejected a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    FileName,
    Path,
    Tags,
    Properties,
    Headings,
    Content,
    Line,
    GlobalQuery,
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FileName => "file name",
            Self::Path => "path",
            Self::Tags => "tags",
            Self::Properties => "properties",
            Self::Headings => "headings",
            Self::Content => "content",
            Self::Line => "line",
            Self::GlobalQuery => "global query",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Accepted(Box<MatchResult>),
    Rejected(Gate),
}

impl Evaluation {
    pub fn accepted(self) -> Option<MatchResult> {
        match self {
            Self::Accepted(result) => Some(*result),
            Self::Rejected(_) => None,
        }
    }
}

/// Run one document through the gates.
///
/// Errors are store failures (metadata or body reads) for this document only.
pub fn evaluate_document<S: DocumentStore + ?Sized>(
    store: &S,
    stat: &DocumentStat,
    query: &CompiledQuery,
) -> Result<Evaluation> {
    let reject = |gate: Gate| -> Result<Evaluation> {
        trace!(path = %stat.path.display(), %gate, "rejected");
        Ok(Evaluation::Rejected(gate))
    };
    let mut stats = FilterHitStats::default();

    // 1. File name
    if !query.file.is_empty() {
        if !query.file.iter().all(|p| p.is_match(&stat.name)) {
            return reject(Gate::FileName);
        }
        stats.file = Some(query.file.len());
    }

    // 2. Path
    let path = stat.path_str();
    if !query.path.is_empty() {
        if !query.path.iter().all(|p| p.is_match(&path)) {
            return reject(Gate::Path);
        }
        stats.path = Some(query.path.len());
    }

    let meta: Option<Arc<DocumentMetadata>> = if query.needs_metadata() {
        Some(store.metadata(stat)?)
    } else {
        None
    };
    let empty = DocumentMetadata::default();
    let meta: &DocumentMetadata = meta.as_deref().unwrap_or(&empty);
    let tags = if query.needs_tags() {
        tags_of(meta)
    } else {
        BTreeSet::new()
    };

    // 3. Tags
    if !query.tags.is_empty() {
        if !query.tags.iter().all(|t| t.matches_any(&tags)) {
            return reject(Gate::Tags);
        }
        stats.tags = Some(query.tags.len());
    }

    // 4. Properties
    if !query.properties.is_empty() {
        if !query
            .properties
            .iter()
            .all(|(name, matcher)| property_matches(meta, name, matcher))
        {
            return reject(Gate::Properties);
        }
        stats.properties = Some(query.properties.len());
    }

    // 5. Headings
    if !query.headings.is_empty() {
        if !query
            .headings
            .iter()
            .all(|p| meta.headings.iter().any(|h| p.is_match(&h.text)))
        {
            return reject(Gate::Headings);
        }
        stats.headings = Some(query.headings.len());
    }

    // 6. Body read
    let body: Option<Arc<str>> = if query.needs_body() {
        Some(store.read_body(stat)?)
    } else {
        None
    };
    let body_text = body.as_deref();

    // 7. Content
    if let Some(body) = body_text.filter(|_| !query.content.is_empty()) {
        if !query.content.iter().all(|p| p.is_match(body)) {
            return reject(Gate::Content);
        }
        stats.content = Some(query.content.len());
    }

    // 8. Line
    let mut line_hits = Vec::new();
    if let (Some(pattern), Some(body)) = (&query.line, body_text) {
        line_hits = split_lines(body)
            .into_iter()
            .enumerate()
            .filter(|(_, line)| pattern.is_match(line))
            .map(|(index, _)| index)
            .collect();
        if line_hits.is_empty() {
            return reject(Gate::Line);
        }
        stats.line = Some(line_hits.len());
    }

    // 9. Free text
    let global = match &query.free_text {
        Some(free_text) => {
            let hits = test_facets(&**free_text, query.targets, stat, &path, meta, &tags, body_text);
            match hits {
                Some(hits) => Some(hits),
                None => return reject(Gate::GlobalQuery),
            }
        }
        None => None,
    };

    let excerpts = collect_excerpts(query, stat, meta, &tags, body_text);

    Ok(Evaluation::Accepted(Box::new(MatchResult {
        document: stat.clone(),
        active_filters: query.active.clone(),
        stats,
        line_hits,
        global,
        excerpts,
    })))
}

/// Test the free-text query against every enabled facet. `None` when no
/// facet hits.
fn test_facets(
    free_text: &dyn FreeTextMatcher,
    targets: GlobalQueryTargets,
    stat: &DocumentStat,
    path: &str,
    meta: &DocumentMetadata,
    tags: &BTreeSet<String>,
    body: Option<&str>,
) -> Option<GlobalQueryHits> {
    let mut counts = FacetCounts::default();
    let mut facets = BTreeSet::new();
    let mut best_score: Option<f64> = None;

    for facet in Facet::ALL.into_iter().filter(|f| targets.enabled(*f)) {
        let hits: Vec<_> = match facet {
            Facet::Body => body.map(|b| free_text.test_body(b)).into_iter().collect(),
            Facet::Name => vec![free_text.test(&stat.name)],
            Facet::Path => vec![free_text.test(path)],
            Facet::Frontmatter => meta
                .frontmatter
                .iter()
                .map(|(key, value)| {
                    let on_key = free_text.test(key);
                    if on_key.hit {
                        on_key
                    } else {
                        free_text.test(&value.as_text())
                    }
                })
                .collect(),
            Facet::Tags => tags.iter().map(|t| free_text.test(t)).collect(),
            Facet::Headings => headings_of(meta, body)
                .iter()
                .map(|h| free_text.test(h.text))
                .collect(),
        };

        let mut facet_hit = false;
        let mut count = 0;
        for hit in hits.iter().filter(|h| h.hit) {
            facet_hit = true;
            count += if facet == Facet::Body { hit.count } else { 1 };
            if let Some(score) = hit.score {
                best_score = Some(best_score.map_or(score, |best| best.max(score)));
            }
        }

        if facet_hit {
            facets.insert(facet);
            counts.set(facet, count);
        }
    }

    if facets.is_empty() {
        return None;
    }
    Some(GlobalQueryHits {
        mode: free_text.mode(),
        facets,
        counts,
        fuzzy_score: best_score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Frontmatter, FrontmatterValue, HeadingPosition, MemoryDocument, MemoryStore};
    use crate::search::excerpt::LineRef;
    use crate::search::query::QueryBuilder;
    use crate::search::types::SearchMode;

    fn run(store: &MemoryStore, query: &ParsedQuery, options: &SearchOptions) -> Vec<Evaluation> {
        let compiled = CompiledQuery::compile(query, options);
        store
            .list_documents()
            .unwrap()
            .iter()
            .map(|stat| evaluate_document(store, stat, &compiled).unwrap())
            .collect()
    }

    fn single(store: &MemoryStore, query: ParsedQuery, options: SearchOptions) -> Evaluation {
        run(store, &query, &options).remove(0)
    }

    #[test]
    fn test_file_name_rejection_never_reads_body() {
        let store = MemoryStore::new().with_document(MemoryDocument::new("notes/2023-09.md", "alpha"));
        let query = QueryBuilder::new()
            .with_file_pattern("2024")
            .with_content_pattern("alpha")
            .build()
            .unwrap();

        let outcome = single(&store, query, SearchOptions::default());
        assert_eq!(outcome, Evaluation::Rejected(Gate::FileName));
        assert_eq!(store.body_reads(), 0);
    }

    #[test]
    fn test_file_patterns_and_together() {
        let store = MemoryStore::new()
            .with_document(MemoryDocument::new("2024-09.md", ""))
            .with_document(MemoryDocument::new("2024-09.txt", ""))
            .with_document(MemoryDocument::new("2023-09.md", ""));
        let query = QueryBuilder::new()
            .with_file_pattern("2024")
            .with_file_pattern("*.md")
            .build()
            .unwrap();

        let outcomes = run(&store, &query, &SearchOptions::default());
        assert!(matches!(outcomes[0], Evaluation::Accepted(_)));
        assert_eq!(outcomes[1], Evaluation::Rejected(Gate::FileName));
        assert_eq!(outcomes[2], Evaluation::Rejected(Gate::FileName));

        let result = outcomes.into_iter().next().unwrap().accepted().unwrap();
        assert_eq!(result.stats.file, Some(2));
        assert_eq!(store.body_reads(), 0);
    }

    #[test]
    fn test_line_and_hits() {
        let store = MemoryStore::new().with_document(MemoryDocument::new(
            "a.md",
            "line1: alice only\nline2: alice and bob\n",
        ));
        let query = QueryBuilder::new()
            .with_line_term("alice")
            .with_line_term("bob")
            .build()
            .unwrap();

        let result = single(&store, query, SearchOptions::default()).accepted().unwrap();
        assert_eq!(result.stats.line, Some(1));
        assert_eq!(result.line_hits, vec![1]);
        assert_eq!(result.excerpts.len(), 1);
        assert_eq!(result.excerpts[0].line, LineRef::Real(1));
        assert!(result.excerpts[0].sources.contains("line"));
    }

    #[test]
    fn test_case_sensitivity_isolation() {
        let store = MemoryStore::new().with_document(MemoryDocument::new("a.md", "my project plan"));

        let insensitive = QueryBuilder::new().with_content_pattern("Project").build().unwrap();
        assert!(matches!(
            single(&store, insensitive.clone(), SearchOptions::default()),
            Evaluation::Accepted(_)
        ));

        let sensitive = SearchOptions {
            case_sensitive: true,
            ..Default::default()
        };
        assert_eq!(
            single(&store, insensitive, sensitive.clone()),
            Evaluation::Rejected(Gate::Content)
        );

        // Free text ignores the dedicated-filter case rule.
        let exact = QueryBuilder::new().with_global_query("PROJECT PLAN").build().unwrap();
        let options = SearchOptions {
            mode: SearchMode::Exact,
            ..sensitive
        };
        assert!(matches!(single(&store, exact, options), Evaluation::Accepted(_)));
    }

    #[test]
    fn test_free_text_or_across_facets() {
        let store =
            MemoryStore::new().with_document(MemoryDocument::new("alpha-notes.md", "nothing here"));
        let query = QueryBuilder::new().with_global_query("alpha").build().unwrap();

        let name_only = SearchOptions {
            targets: GlobalQueryTargets::only(Facet::Name),
            ..Default::default()
        };
        let result = single(&store, query.clone(), name_only).accepted().unwrap();
        let global = result.global.unwrap();
        assert_eq!(global.facets, BTreeSet::from([Facet::Name]));
        assert_eq!(global.counts.name, 1);
        assert_eq!(result.excerpts[0].text, "[name] alpha-notes.md");
        assert_eq!(result.excerpts[0].line, LineRef::Synthetic);
        assert!(result.excerpts[0].sources.contains("globalQuery:simple:name"));
        // Body not targeted, so never read.
        assert_eq!(store.body_reads(), 0);

        let nothing = SearchOptions {
            targets: GlobalQueryTargets::none(),
            ..Default::default()
        };
        assert_eq!(single(&store, query, nothing), Evaluation::Rejected(Gate::GlobalQuery));
    }

    #[test]
    fn test_tag_and_property_gates() {
        let store = MemoryStore::new().with_document(
            MemoryDocument::new("a.md", "body")
                .tags(["project"])
                .frontmatter(Frontmatter::new().with("status", FrontmatterValue::Text("done".into()))),
        );

        let ok = QueryBuilder::new()
            .with_tag("#project")
            .with_property("status", PropertyValue::Equals("Done".into()))
            .build()
            .unwrap();
        let result = single(&store, ok, SearchOptions::default()).accepted().unwrap();
        assert_eq!(result.stats.tags, Some(1));
        assert_eq!(result.stats.properties, Some(1));
        assert_eq!(
            result.active_filters,
            BTreeSet::from([FilterKind::Tag, FilterKind::Property])
        );

        let missing = QueryBuilder::new()
            .with_property("owner", PropertyValue::Exists)
            .build()
            .unwrap();
        assert_eq!(
            single(&store, missing, SearchOptions::default()),
            Evaluation::Rejected(Gate::Properties)
        );
        assert_eq!(store.body_reads(), 0);
    }

    #[test]
    fn test_heading_filter_evidence() {
        let body = "intro\n## Design notes\ntext";
        let store = MemoryStore::new().with_document(
            MemoryDocument::new("a.md", body).heading("Design notes", 2, HeadingPosition::Offset(6)),
        );
        let query = QueryBuilder::new()
            .with_heading_pattern("design")
            .with_content_pattern("text")
            .build()
            .unwrap();

        let result = single(&store, query, SearchOptions::default()).accepted().unwrap();
        let lines: Vec<(LineRef, &str)> = result
            .excerpts
            .iter()
            .map(|e| (e.line, e.text.as_str()))
            .collect();
        assert_eq!(
            lines,
            vec![(LineRef::Real(1), "## Design notes"), (LineRef::Real(2), "text")]
        );
        assert!(result.excerpts[0].sources.contains("headings:design"));
    }

    #[test]
    fn test_fuzzy_score_is_kept() {
        let store = MemoryStore::new().with_document(MemoryDocument::new("meeting.md", ""));
        let query = QueryBuilder::new().with_global_query("mtg").build().unwrap();
        let options = SearchOptions {
            mode: SearchMode::Fuzzy,
            targets: GlobalQueryTargets::only(Facet::Name),
            ..Default::default()
        };

        let result = single(&store, query, options).accepted().unwrap();
        assert!(result.global.unwrap().fuzzy_score.unwrap() > 0.0);
    }

    #[test]
    fn test_body_count_in_regex_mode() {
        let store = MemoryStore::new().with_document(MemoryDocument::new("a.md", "bob\nbob bob"));
        let query = QueryBuilder::new().with_global_query("bob").build().unwrap();
        let options = SearchOptions {
            mode: SearchMode::Regex,
            targets: GlobalQueryTargets::only(Facet::Body),
            ..Default::default()
        };

        let global = single(&store, query, options).accepted().unwrap().global.unwrap();
        assert_eq!(global.counts.body, 3);
    }
}
