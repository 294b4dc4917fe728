//! Document model consumed by the search engine, and the store abstraction
//! that supplies it.
//!
//! The engine never parses markdown. A [`DocumentStore`] enumerates
//! documents, hands out their precomputed [`DocumentMetadata`], and reads body
//! text on demand. [`crate::Vault`] is the filesystem implementation;
//! [`MemoryStore`] keeps everything in memory.

use crate::error::{Result, VaultError};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// File-level facts about a document, available without reading it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentStat {
    /// Path relative to the vault root (e.g. "projects/2024-09.md").
    pub path: PathBuf,
    /// File name including extension (e.g. "2024-09.md").
    pub name: String,
    /// Modification time in milliseconds since the Unix epoch.
    pub mtime: u64,
    /// File size in bytes.
    pub size: u64,
}

impl DocumentStat {
    pub fn new(path: impl Into<PathBuf>, mtime: u64, size: u64) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            name,
            mtime,
            size,
        }
    }

    /// The path as a `/`-separated string, the form patterns are matched against.
    pub fn path_str(&self) -> String {
        self.path.to_string_lossy().replace('\\', "/")
    }
}

/// A frontmatter value, coerced from YAML into the three shapes the engine
/// distinguishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FrontmatterValue {
    /// A YAML string.
    Text(String),
    /// A YAML sequence; elements are rendered with [`scalar_text`].
    List(Vec<String>),
    /// Numbers, booleans, null and nested mappings, pre-rendered as text.
    Other(String),
}

impl FrontmatterValue {
    pub fn from_yaml(value: &serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::String(s) => Self::Text(s.clone()),
            serde_yaml::Value::Sequence(seq) => Self::List(seq.iter().map(scalar_text).collect()),
            other => Self::Other(scalar_text(other)),
        }
    }

    /// The string form used for regex tests and display.
    ///
    /// Lists join their elements with `,`.
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(s) | Self::Other(s) => s.clone(),
            Self::List(items) => items.join(","),
        }
    }
}

/// Render a YAML value as plain text.
pub fn scalar_text(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        serde_yaml::Value::Sequence(seq) => seq.iter().map(scalar_text).collect::<Vec<_>>().join(","),
        serde_yaml::Value::Tagged(tagged) => scalar_text(&tagged.value),
        serde_yaml::Value::Mapping(_) => serde_yaml::to_string(value)
            .unwrap_or_default()
            .trim()
            .to_string(),
    }
}

/// Frontmatter properties in document order. Serializes as a map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontmatter(Vec<(String, FrontmatterValue)>);

impl Serialize for Frontmatter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Frontmatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a parsed YAML document. Non-mapping documents yield no properties.
    pub fn from_yaml(value: &serde_yaml::Value) -> Self {
        let Some(map) = value.as_mapping() else {
            return Self::default();
        };
        Self(
            map.iter()
                .map(|(k, v)| (scalar_text(k), FrontmatterValue::from_yaml(v)))
                .collect(),
        )
    }

    pub fn with(mut self, key: impl Into<String>, value: FrontmatterValue) -> Self {
        self.0.push((key.into(), value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&FrontmatterValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FrontmatterValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Where a heading sits in the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingPosition {
    /// 0-based line index.
    Line(usize),
    /// Byte offset of the heading; the line is derived from the body text.
    Offset(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingRef {
    pub text: String,
    pub level: u8,
    pub position: HeadingPosition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListItemRef {
    /// 0-based line index.
    pub line_index: usize,
    pub is_task: bool,
    pub checked: bool,
}

/// Structured metadata the host indexes for each document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentMetadata {
    /// Tags found in the body, without `#`.
    pub tags: BTreeSet<String>,
    pub frontmatter: Frontmatter,
    pub headings: Vec<HeadingRef>,
    pub list_items: Vec<ListItemRef>,
}

/// The capabilities the search engine needs from a document host.
///
/// Implementations must be shareable across threads; parallel searches call
/// these methods concurrently.
pub trait DocumentStore: Sync {
    /// Enumerate every document in the corpus.
    fn list_documents(&self) -> Result<Vec<DocumentStat>>;

    /// Precomputed metadata for a document. Must not count as a body read.
    fn metadata(&self, doc: &DocumentStat) -> Result<Arc<DocumentMetadata>>;

    /// Full body text, possibly served from a cache.
    fn read_body(&self, doc: &DocumentStat) -> Result<Arc<str>>;
}

/// A document held by [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    pub stat: DocumentStat,
    pub metadata: Arc<DocumentMetadata>,
    pub body: Arc<str>,
}

impl MemoryDocument {
    pub fn new(path: impl Into<PathBuf>, body: &str) -> Self {
        Self {
            stat: DocumentStat::new(path, 0, body.len() as u64),
            metadata: Arc::new(DocumentMetadata::default()),
            body: Arc::from(body),
        }
    }

    pub fn mtime(mut self, mtime: u64) -> Self {
        self.stat.mtime = mtime;
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::make_mut(&mut self.metadata).tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn frontmatter(mut self, frontmatter: Frontmatter) -> Self {
        Arc::make_mut(&mut self.metadata).frontmatter = frontmatter;
        self
    }

    pub fn heading(mut self, text: &str, level: u8, position: HeadingPosition) -> Self {
        Arc::make_mut(&mut self.metadata).headings.push(HeadingRef {
            text: text.to_string(),
            level,
            position,
        });
        self
    }
}

/// An in-memory corpus. Counts body reads and can simulate read failures.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Vec<MemoryDocument>,
    failing: HashSet<PathBuf>,
    body_reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, doc: MemoryDocument) -> Self {
        self.documents.push(doc);
        self
    }

    /// Make `read_body` fail for this path.
    pub fn failing_read(mut self, path: impl AsRef<Path>) -> Self {
        self.failing.insert(path.as_ref().to_path_buf());
        self
    }

    /// Number of `read_body` calls served so far.
    pub fn body_reads(&self) -> usize {
        self.body_reads.load(Ordering::SeqCst)
    }

    fn find(&self, doc: &DocumentStat) -> Result<&MemoryDocument> {
        self.documents
            .iter()
            .find(|d| d.stat.path == doc.path)
            .ok_or_else(|| VaultError::NoteNotFound(doc.path.clone()))
    }
}

impl DocumentStore for MemoryStore {
    fn list_documents(&self) -> Result<Vec<DocumentStat>> {
        Ok(self.documents.iter().map(|d| d.stat.clone()).collect())
    }

    fn metadata(&self, doc: &DocumentStat) -> Result<Arc<DocumentMetadata>> {
        Ok(Arc::clone(&self.find(doc)?.metadata))
    }

    fn read_body(&self, doc: &DocumentStat) -> Result<Arc<str>> {
        self.body_reads.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&doc.path) {
            return Err(VaultError::Io(std::io::Error::other(format!(
                "simulated read failure for {}",
                doc.path.display()
            ))));
        }
        Ok(Arc::clone(&self.find(doc)?.body))
    }
}
