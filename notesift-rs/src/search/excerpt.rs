//! Excerpts: per-line evidence explaining why a document matched.

use crate::document::{DocumentMetadata, DocumentStat};
use crate::search::evaluator::CompiledQuery;
use crate::search::facets::{HeadingLine, headings_of, line_text_at, split_lines};
use crate::search::types::Facet;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};

/// The line an excerpt belongs to.
///
/// Synthetic excerpts carry evidence with no natural line, such as a file
/// name hit. They sort before every real line and serialize as `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LineRef {
    Synthetic,
    /// 0-based line index in the body text.
    Real(usize),
}

impl LineRef {
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Real(i) => Some(*i),
            Self::Synthetic => None,
        }
    }

    /// Wire form: the line index, or `-1`.
    pub fn to_wire(&self) -> i64 {
        match self {
            Self::Real(i) => *i as i64,
            Self::Synthetic => -1,
        }
    }
}

impl Serialize for LineRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.to_wire())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Excerpt {
    pub line: LineRef,
    pub text: String,
    /// Evidence tags, e.g. `line`, `content:alpha`, `globalQuery:simple:name`.
    pub sources: BTreeSet<String>,
}

impl Excerpt {
    pub fn new(line: LineRef, text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            line,
            text: text.into(),
            sources: BTreeSet::from([source.into()]),
        }
    }

    fn absorb(&mut self, other: Excerpt) {
        if self.text.is_empty() && !other.text.is_empty() {
            self.text = other.text;
        }
        self.sources.extend(other.sources);
    }
}

/// Merges excerpts by line.
///
/// Excerpts on the same real line union their sources and keep the first
/// non-empty text. Synthetic excerpts merge only with synthetic excerpts of
/// identical text.
#[derive(Debug, Default)]
pub struct ExcerptMerger {
    real: BTreeMap<usize, Excerpt>,
    synthetic: Vec<Excerpt>,
}

impl ExcerptMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, excerpt: Excerpt) {
        match excerpt.line {
            LineRef::Real(index) => match self.real.get_mut(&index) {
                Some(existing) => existing.absorb(excerpt),
                None => {
                    self.real.insert(index, excerpt);
                }
            },
            LineRef::Synthetic => {
                match self.synthetic.iter_mut().find(|e| e.text == excerpt.text) {
                    Some(existing) => existing.absorb(excerpt),
                    None => self.synthetic.push(excerpt),
                }
            }
        }
    }

    /// Synthetic excerpts first, then real lines ascending, at most `limit`.
    pub fn finish(self, limit: usize) -> Vec<Excerpt> {
        self.synthetic
            .into_iter()
            .chain(self.real.into_values())
            .take(limit)
            .collect()
    }
}

/// Merge a list of excerpts and cap it at `limit`.
pub fn merge_excerpts(excerpts: impl IntoIterator<Item = Excerpt>, limit: usize) -> Vec<Excerpt> {
    let mut merger = ExcerptMerger::new();
    for excerpt in excerpts {
        merger.add(excerpt);
    }
    merger.finish(limit)
}

/// Build the excerpts of an accepted document.
///
/// `body` is `None` when no gate needed the body text; line-indexed evidence
/// is then limited to headings.
pub(crate) fn collect_excerpts(
    query: &CompiledQuery,
    stat: &DocumentStat,
    meta: &DocumentMetadata,
    tags: &BTreeSet<String>,
    body: Option<&str>,
) -> Vec<Excerpt> {
    let mut merger = ExcerptMerger::new();
    let headings = headings_of(meta, body);

    if let Some(body) = body {
        line_evidence(query, body, &mut merger);
    }

    for pattern in &query.headings {
        let source = format!("headings:{}", pattern.literal());
        for heading in headings.iter().filter(|h| pattern.is_match(h.text)) {
            merger.add(Excerpt::new(heading.line, heading_text(heading, body), &source));
        }
    }

    if let Some(free_text) = &query.free_text {
        let targets = &query.targets;
        let tag = |facet: Facet| format!("globalQuery:{}:{}", free_text.mode(), facet);

        if targets.name && free_text.test(&stat.name).hit {
            merger.add(Excerpt::new(
                LineRef::Synthetic,
                format!("[name] {}", stat.name),
                tag(Facet::Name),
            ));
        }

        let path = stat.path_str();
        if targets.path && free_text.test(&path).hit {
            merger.add(Excerpt::new(
                LineRef::Synthetic,
                format!("[path] {}", path),
                tag(Facet::Path),
            ));
        }

        if targets.frontmatter {
            for (key, value) in meta.frontmatter.iter() {
                let value = value.as_text();
                if free_text.test(key).hit || free_text.test(&value).hit {
                    merger.add(Excerpt::new(
                        LineRef::Synthetic,
                        format!("[frontmatter] {}: {}", key, value),
                        tag(Facet::Frontmatter),
                    ));
                }
            }
        }

        if targets.tags {
            for t in tags.iter().filter(|t| free_text.test(t).hit) {
                merger.add(Excerpt::new(
                    LineRef::Synthetic,
                    format!("[tags] #{}", t),
                    tag(Facet::Tags),
                ));
            }
        }

        if targets.headings {
            for heading in headings.iter().filter(|h| free_text.test(h.text).hit) {
                merger.add(Excerpt::new(
                    heading.line,
                    heading_text(heading, body),
                    tag(Facet::Headings),
                ));
            }
        }
    }

    merger.finish(query.excerpt_limit)
}

fn line_evidence(query: &CompiledQuery, body: &str, merger: &mut ExcerptMerger) {
    let body_free_text = query
        .free_text
        .as_ref()
        .filter(|_| query.targets.body);
    let global_source = body_free_text.map(|ft| format!("globalQuery:{}", ft.mode()));
    let content_sources: Vec<String> = query
        .content
        .iter()
        .map(|p| format!("content:{}", p.literal()))
        .collect();

    for (index, line) in split_lines(body).into_iter().enumerate() {
        let mut sources = BTreeSet::new();

        if query.line.as_ref().is_some_and(|p| p.is_match(line)) {
            sources.insert("line".to_string());
        }
        for (pattern, source) in query.content.iter().zip(&content_sources) {
            if pattern.is_match(line) {
                sources.insert(source.clone());
            }
        }
        if let (Some(ft), Some(source)) = (body_free_text, &global_source) {
            if ft.test(line).hit {
                sources.insert(source.clone());
            }
        }

        if !sources.is_empty() {
            merger.add(Excerpt {
                line: LineRef::Real(index),
                text: line.to_string(),
                sources,
            });
        }
    }
}

/// Display text for heading evidence: the body line when available, else a
/// label.
fn heading_text(heading: &HeadingLine<'_>, body: Option<&str>) -> String {
    match (heading.line, body) {
        (LineRef::Real(index), Some(body)) => line_text_at(body, index)
            .map(str::to_string)
            .unwrap_or_else(|| heading.text.to_string()),
        (LineRef::Real(_), None) => {
            format!("{} {}", "#".repeat(usize::from(heading.level)), heading.text)
        }
        (LineRef::Synthetic, _) => format!("[heading] {}", heading.text),
    }
}
