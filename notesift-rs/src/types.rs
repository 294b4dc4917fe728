//! Markdown elements produced by the note parsers.

use serde::{Deserialize, Serialize};

/// A tag found in a note body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// The full tag including # (e.g., "#rust" or "#tray/autonomy").
    pub name: String,

    /// Line number where this tag appears (1-indexed).
    pub line: usize,

    /// Start column in the line (0-indexed).
    pub start_col: usize,

    /// End column in the line (0-indexed, exclusive).
    pub end_col: usize,
}

impl Tag {
    /// Returns the tag without the leading #.
    pub fn without_hash(&self) -> &str {
        self.name.strip_prefix('#').unwrap_or(&self.name)
    }
}

/// A heading found in a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// The heading text (without the # prefix).
    pub text: String,

    /// The heading level (1-6).
    pub level: u8,

    /// Line number where this heading appears (1-indexed).
    pub line: usize,

    /// Byte offset of the heading line within the note.
    pub offset: usize,
}

/// A bullet or numbered list item, optionally a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    /// Line number where the item appears (1-indexed).
    pub line: usize,

    /// Indentation level (tab or 4 spaces = 1).
    pub indent: usize,

    /// Whether the item carries a `[ ]` checkbox.
    pub is_task: bool,

    /// Whether the checkbox is ticked (any symbol other than a space).
    pub checked: bool,

    /// Item text after the marker and checkbox.
    pub text: String,
}
