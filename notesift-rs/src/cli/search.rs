//! Search command implementation.

use crate::cli::args::{OutputFormat, SearchArgs};
use crate::cli::output::{Output, rfc3339};
use crate::document::DocumentStore;
use crate::error::Result;
use crate::search::{
    Excerpt, FilterHitStats, FilterKind, GlobalQueryHits, GlobalQueryTargets, Highlighter,
    LineRef, MatchResult, SearchMode, SearchOptions, SearchSummary, evaluate, parse_query,
    render_html, render_with,
};
use serde::Serialize;
use std::collections::BTreeSet;

const EMPHASIS_ON: &str = "\x1b[1;33m";
const EMPHASIS_OFF: &str = "\x1b[0m";

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub mode: SearchMode,
    pub results: Vec<SearchHit>,
    pub summary: SearchSummary,
}

#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub path: String,
    pub name: String,
    /// Modification time, RFC 3339.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    pub size: u64,
    pub active_filters: BTreeSet<FilterKind>,
    pub stats: FilterHitStats,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub line_hits: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global: Option<GlobalQueryHits>,
    pub excerpts: Vec<ExcerptRow>,
}

#[derive(Debug, Serialize)]
pub struct ExcerptRow {
    /// 0-based line, or -1 for evidence with no line.
    pub line: LineRef,
    pub text: String,
    pub sources: BTreeSet<String>,
    /// Highlighted byte ranges of `text`, as `[start, end)` pairs.
    pub highlights: Vec<[usize; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

/// Overlay command-line flags on the configured defaults.
pub fn search_options(defaults: &SearchOptions, args: &SearchArgs) -> SearchOptions {
    let mut options = defaults.clone();
    if let Some(mode) = args.mode {
        options.mode = mode;
    }
    if args.case_sensitive {
        options.case_sensitive = true;
    } else if args.case_insensitive {
        options.case_sensitive = false;
    }
    if let Some(sort) = args.sort {
        options.sort = sort;
    }
    if args.no_limit {
        options.limit = None;
    } else if let Some(limit) = args.limit {
        options.limit = Some(limit);
    }
    if let Some(excerpts) = args.excerpts {
        options.excerpt_limit = excerpts;
    }
    if !args.facets.is_empty() {
        options.targets = GlobalQueryTargets::from_facets(&args.facets);
    }
    options.parallel |= args.parallel;
    options
}

/// Parse, evaluate and shape a search for output.
pub fn search<S: DocumentStore + ?Sized>(
    store: &S,
    query_text: &str,
    options: &SearchOptions,
    html: bool,
) -> Result<SearchResponse> {
    let query = parse_query(query_text)?
        .case_sensitive(options.case_sensitive)
        .build()?;
    let outcome = evaluate(store, &query, options)?;
    let highlighter = Highlighter::new(&query, options);

    Ok(SearchResponse {
        query: query_text.to_string(),
        mode: options.mode,
        results: outcome
            .results
            .into_iter()
            .map(|result| hit_row(result, &highlighter, html))
            .collect(),
        summary: outcome.summary,
    })
}

pub fn run<S: DocumentStore + ?Sized>(
    store: &S,
    defaults: &SearchOptions,
    args: &SearchArgs,
    output: &Output,
) -> Result<()> {
    let options = search_options(defaults, args);
    let response = search(store, &args.query, &options, args.html)?;

    if response.summary.skipped > 0 {
        output.warn(&format!(
            "{} note(s) could not be read and were skipped",
            response.summary.skipped
        ));
    }

    match output.format() {
        OutputFormat::Text => {
            output.print_raw(&render_text(&response, output.color()));
            output.info(&format!(
                "{} note(s), {} line hit(s), {} scanned in {} ms",
                response.summary.accepted_count,
                response.summary.total_line_hits,
                response.summary.scanned,
                response.summary.elapsed_ms
            ));
            Ok(())
        }
        _ => output.print(&response),
    }
}

fn hit_row(result: MatchResult, highlighter: &Highlighter, html: bool) -> SearchHit {
    SearchHit {
        path: result.document.path_str(),
        name: result.document.name.clone(),
        modified: rfc3339(result.document.mtime),
        size: result.document.size,
        active_filters: result.active_filters,
        stats: result.stats,
        line_hits: result.line_hits,
        global: result.global,
        excerpts: result
            .excerpts
            .into_iter()
            .map(|excerpt| excerpt_row(excerpt, highlighter, html))
            .collect(),
    }
}

fn excerpt_row(excerpt: Excerpt, highlighter: &Highlighter, html: bool) -> ExcerptRow {
    let ranges = highlighter.ranges(&excerpt.text);
    ExcerptRow {
        line: excerpt.line,
        html: html.then(|| render_html(&excerpt.text, &ranges)),
        highlights: ranges.iter().map(|r| [r.start, r.end]).collect(),
        text: excerpt.text,
        sources: excerpt.sources,
    }
}

/// One block per note: the path, then each excerpt with its line number.
fn render_text(response: &SearchResponse, color: bool) -> String {
    let mut out = String::new();
    for hit in &response.results {
        out.push_str(&hit.path);
        if let Some(modified) = &hit.modified {
            out.push_str(&format!("  ({})", modified));
        }
        out.push('\n');

        for excerpt in &hit.excerpts {
            let line = match excerpt.line.index() {
                Some(i) => (i + 1).to_string(),
                None => "-".to_string(),
            };
            let text = if color {
                let ranges: Vec<_> = excerpt.highlights.iter().map(|[s, e]| *s..*e).collect();
                render_with(&excerpt.text, &ranges, EMPHASIS_ON, EMPHASIS_OFF)
            } else {
                excerpt.text.clone()
            };
            out.push_str(&format!("{:>6}: {}\n", line, text));
        }
    }
    out.trim_end().to_string()
}
