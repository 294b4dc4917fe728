//! YAML frontmatter parsing.

use crate::error::{Result, VaultError};
use serde_yaml::Value;
use std::path::Path;

/// Frontmatter extraction result.
#[derive(Debug, Clone)]
pub struct FrontmatterSplit<'a> {
    /// The raw YAML string (without delimiters).
    pub yaml: Option<&'a str>,
    /// The content after the frontmatter.
    pub content: &'a str,
    /// Line number where content starts (1-indexed).
    pub content_start_line: usize,
}

impl<'a> FrontmatterSplit<'a> {
    fn none(content: &'a str) -> Self {
        Self {
            yaml: None,
            content,
            content_start_line: 1,
        }
    }
}

/// Split content into frontmatter and body.
///
/// Frontmatter must open with `---` on the very first line and close with a
/// `---` line; anything else is treated as plain content.
pub fn split_frontmatter(content: &str) -> FrontmatterSplit<'_> {
    let yaml_start = if content.starts_with("---\n") {
        4
    } else if content.starts_with("---\r\n") {
        5
    } else {
        return FrontmatterSplit::none(content);
    };

    let remaining = &content[yaml_start..];

    // Closing delimiter position relative to `remaining`, and its length
    // including the line break that follows it.
    let closing = if remaining.starts_with("---\n") {
        Some((0, 4))
    } else if remaining.starts_with("---\r\n") {
        Some((0, 5))
    } else if remaining == "---" {
        Some((0, 3))
    } else {
        remaining
            .find("\n---\n")
            .map(|pos| (pos + 1, 4))
            .or_else(|| remaining.find("\r\n---\r\n").map(|pos| (pos + 2, 5)))
            .or_else(|| remaining.find("\n---\r\n").map(|pos| (pos + 1, 5)))
            .or_else(|| {
                remaining
                    .ends_with("\n---")
                    .then(|| (remaining.len() - 3, 3))
            })
    };

    let Some((close_pos, close_len)) = closing else {
        return FrontmatterSplit::none(content);
    };

    let yaml = remaining[..close_pos].trim_end_matches(['\n', '\r']);
    let body_start = yaml_start + close_pos + close_len;
    let body = content.get(body_start..).unwrap_or("");
    let content_start_line = content[..body_start].matches('\n').count() + 1;

    FrontmatterSplit {
        yaml: Some(yaml),
        content: body,
        content_start_line,
    }
}

/// Extract frontmatter as a raw YAML string.
pub fn extract_frontmatter(content: &str) -> Option<&str> {
    split_frontmatter(content).yaml
}

/// Parse frontmatter with path context for error messages.
///
/// Empty frontmatter (`---\n---`) parses to `None`.
pub fn parse_frontmatter_with_path(content: &str, path: &Path) -> Result<Option<Value>> {
    match extract_frontmatter(content) {
        Some(yaml) if yaml.trim().is_empty() => Ok(None),
        Some(yaml) => {
            let value: Value =
                serde_yaml::from_str(yaml).map_err(|e| VaultError::InvalidFrontmatter {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}
