//! The search driver: enumerate, pre-sort, evaluate, aggregate and cap.

use crate::document::{DocumentStat, DocumentStore};
use crate::error::{Result, VaultError};
use crate::search::evaluator::{CompiledQuery, Evaluation, evaluate_document};
use crate::search::query::ParsedQuery;
use crate::search::types::{MatchResult, SearchOptions, SearchOutcome, SearchSummary, SortOrder};
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Documents evaluated per parallel batch.
const PARALLEL_CHUNK: usize = 64;

/// Cooperative cancellation flag, checked between documents.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Run a search over every document of `store`.
///
/// Per-document read failures are logged and counted in
/// [`SearchSummary::skipped`]; only a failure to enumerate the corpus, or an
/// empty query, fails the call.
pub fn evaluate<S: DocumentStore + ?Sized>(
    store: &S,
    query: &ParsedQuery,
    options: &SearchOptions,
) -> Result<SearchOutcome> {
    evaluate_with_cancel(store, query, options, &CancelToken::new())
}

/// [`evaluate`], stopping early once `cancel` is set. Results gathered so far
/// are returned with `summary.cancelled` set.
pub fn evaluate_with_cancel<S: DocumentStore + ?Sized>(
    store: &S,
    query: &ParsedQuery,
    options: &SearchOptions,
    cancel: &CancelToken,
) -> Result<SearchOutcome> {
    if query.is_empty() {
        return Err(VaultError::EmptyQuery);
    }

    let started = Instant::now();
    let compiled = CompiledQuery::compile(query, options);
    let mut documents = store.list_documents()?;
    sort_documents(&mut documents, options.sort);
    debug!(documents = documents.len(), sort = ?options.sort, parallel = options.parallel, "searching");

    let mut collector = Collector::new(options.limit);

    if options.parallel {
        for chunk in documents.chunks(PARALLEL_CHUNK) {
            if cancel.is_cancelled() {
                collector.summary.cancelled = true;
                break;
            }
            let outcomes: Vec<_> = chunk
                .par_iter()
                .map(|stat| evaluate_document(store, stat, &compiled))
                .collect();
            for (stat, outcome) in chunk.iter().zip(outcomes) {
                collector.push(stat, outcome);
                if collector.is_full() {
                    break;
                }
            }
            if collector.is_full() {
                break;
            }
        }
    } else {
        for stat in &documents {
            if cancel.is_cancelled() {
                collector.summary.cancelled = true;
                break;
            }
            collector.push(stat, evaluate_document(store, stat, &compiled));
            if collector.is_full() {
                break;
            }
        }
    }

    let mut summary = collector.summary;
    summary.elapsed_ms = started.elapsed().as_millis() as u64;
    info!(
        accepted = summary.accepted_count,
        line_hits = summary.total_line_hits,
        scanned = summary.scanned,
        skipped = summary.skipped,
        cancelled = summary.cancelled,
        elapsed_ms = summary.elapsed_ms,
        "search finished"
    );

    Ok(SearchOutcome {
        results: collector.results,
        summary,
    })
}

/// Order documents by `sort`, ties broken by path.
pub fn sort_documents(documents: &mut [DocumentStat], sort: SortOrder) {
    match sort {
        SortOrder::MtimeDesc => {
            documents.sort_by(|a, b| b.mtime.cmp(&a.mtime).then_with(|| a.path.cmp(&b.path)))
        }
        SortOrder::MtimeAsc => {
            documents.sort_by(|a, b| a.mtime.cmp(&b.mtime).then_with(|| a.path.cmp(&b.path)))
        }
        SortOrder::PathAsc => documents.sort_by(|a, b| a.path.cmp(&b.path)),
    }
}

/// Single-writer reduction of per-document outcomes, in corpus order.
struct Collector {
    limit: Option<usize>,
    results: Vec<MatchResult>,
    summary: SearchSummary,
}

impl Collector {
    fn new(limit: Option<usize>) -> Self {
        Self {
            limit,
            results: Vec::new(),
            summary: SearchSummary::default(),
        }
    }

    fn push(&mut self, stat: &DocumentStat, outcome: Result<Evaluation>) {
        match outcome {
            Ok(Evaluation::Accepted(result)) => {
                self.summary.scanned += 1;
                self.summary.accepted_count += 1;
                self.summary.total_line_hits += result.line_hits.len();
                self.results.push(*result);
            }
            Ok(Evaluation::Rejected(_)) => self.summary.scanned += 1,
            Err(e) => {
                warn!(path = %stat.path.display(), error = %e, "skipping document");
                self.summary.skipped += 1;
            }
        }
    }

    fn is_full(&self) -> bool {
        self.limit.is_some_and(|limit| self.results.len() >= limit)
    }
}
