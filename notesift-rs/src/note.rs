//! Note representation and metadata extraction.

use crate::document::{DocumentMetadata, Frontmatter, HeadingPosition, HeadingRef, ListItemRef};
use crate::error::Result;
use crate::parser::{
    parse_frontmatter_with_path, parse_headings, parse_list_items, parse_tags, split_frontmatter,
    unique_tag_names,
};
use crate::types::{Heading, ListItem, Tag};
use serde_yaml::Value as YamlValue;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A markdown note: its vault-relative path and raw content.
#[derive(Debug, Clone)]
pub struct Note {
    /// Path relative to vault root (e.g., "proj/My Project.md").
    pub path: PathBuf,

    /// Raw content of the note, frontmatter included.
    pub content: String,
}

impl Note {
    /// Create a new note from path and content.
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Load a note from disk.
    pub fn load(vault_root: &Path, relative_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(vault_root.join(relative_path))?;
        Ok(Self::new(relative_path, content))
    }

    /// Parse frontmatter as YAML value.
    pub fn frontmatter(&self) -> Result<Option<YamlValue>> {
        parse_frontmatter_with_path(&self.content, &self.path)
    }

    /// Get content without frontmatter.
    pub fn body(&self) -> &str {
        split_frontmatter(&self.content).content
    }

    /// Tags in the body (frontmatter excluded), with note-relative line numbers.
    pub fn tags(&self) -> Vec<Tag> {
        let shift = self.body_line_shift();
        parse_tags(self.body())
            .into_iter()
            .map(|mut t| {
                t.line += shift;
                t
            })
            .collect()
    }

    /// Headings in the body, with note-relative line numbers and offsets.
    pub fn headings(&self) -> Vec<Heading> {
        let shift = self.body_line_shift();
        let offset_shift = self.content.len() - self.body().len();
        parse_headings(self.body())
            .into_iter()
            .map(|mut h| {
                h.line += shift;
                h.offset += offset_shift;
                h
            })
            .collect()
    }

    /// List items in the body, with note-relative line numbers.
    pub fn list_items(&self) -> Vec<ListItem> {
        let shift = self.body_line_shift();
        parse_list_items(self.body())
            .into_iter()
            .map(|mut item| {
                item.line += shift;
                item
            })
            .collect()
    }

    /// Build the metadata the search engine consumes.
    ///
    /// A note with unparseable frontmatter is indexed without properties
    /// rather than dropped from the corpus.
    pub fn metadata(&self) -> DocumentMetadata {
        let frontmatter = match self.frontmatter() {
            Ok(Some(value)) => Frontmatter::from_yaml(&value),
            Ok(None) => Frontmatter::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring frontmatter");
                Frontmatter::new()
            }
        };

        DocumentMetadata {
            tags: unique_tag_names(&self.tags()),
            frontmatter,
            headings: self
                .headings()
                .into_iter()
                .map(|h| HeadingRef {
                    text: h.text,
                    level: h.level,
                    position: HeadingPosition::Line(h.line - 1),
                })
                .collect(),
            list_items: self
                .list_items()
                .into_iter()
                .map(|item| ListItemRef {
                    line_index: item.line - 1,
                    is_task: item.is_task,
                    checked: item.checked,
                })
                .collect(),
        }
    }

    fn body_line_shift(&self) -> usize {
        split_frontmatter(&self.content).content_start_line - 1
    }
}
