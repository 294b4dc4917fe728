//! Inspect command: the searchable facets of a single note.

use crate::cli::args::InspectArgs;
use crate::cli::output::{Output, rfc3339};
use crate::document::{DocumentStore, Frontmatter, ListItemRef};
use crate::error::Result;
use crate::search::{LineRef, headings_of, split_lines, tags_of};
use crate::vault::Vault;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Serialize)]
pub struct InspectOutput {
    pub path: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    pub size: u64,
    pub lines: usize,
    /// Body and frontmatter tags, normalized.
    pub tags: BTreeSet<String>,
    pub frontmatter: Frontmatter,
    pub headings: Vec<InspectHeading>,
    pub list_items: Vec<ListItemRef>,
}

#[derive(Debug, Serialize)]
pub struct InspectHeading {
    pub text: String,
    pub level: u8,
    pub line: LineRef,
}

pub fn inspect(vault: &Vault, note: &str) -> Result<InspectOutput> {
    let path = vault.resolve_note(note)?;
    let stat = vault.stat(&path)?;
    let meta = vault.metadata(&stat)?;
    let body = vault.read_body(&stat)?;

    let headings = headings_of(&meta, Some(&body))
        .into_iter()
        .map(|h| InspectHeading {
            text: h.text.to_string(),
            level: h.level,
            line: h.line,
        })
        .collect();

    Ok(InspectOutput {
        path: stat.path_str(),
        name: stat.name.clone(),
        modified: rfc3339(stat.mtime),
        size: stat.size,
        lines: split_lines(&body).len(),
        tags: tags_of(&meta),
        frontmatter: meta.frontmatter.clone(),
        headings,
        list_items: meta.list_items.clone(),
    })
}

pub fn run(vault: &Vault, args: &InspectArgs, output: &Output) -> Result<()> {
    output.print(&inspect(vault, &args.note)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VaultError;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_inspect_note() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("projects")).unwrap();
        std::fs::write(
            dir.path().join("projects/Plan.md"),
            "---\ntags: [work]\nstatus: active\n---\n# Plan\n- [ ] ship #release\n",
        )
        .unwrap();
        let vault = Vault::new(dir.path()).unwrap();

        let out = inspect(&vault, "plan").unwrap();
        assert_eq!(out.path, "projects/Plan.md");
        assert_eq!(out.name, "Plan.md");
        assert_eq!(
            out.tags,
            BTreeSet::from(["release".to_string(), "work".to_string()])
        );
        assert_eq!(out.headings.len(), 1);
        assert_eq!(out.headings[0].text, "Plan");
        assert_eq!(out.headings[0].line, LineRef::Real(4));
        assert_eq!(out.list_items.len(), 1);
        assert!(out.list_items[0].is_task);
        assert_eq!(out.lines, 7);
        assert!(out.modified.is_some());
    }

    #[test]
    fn test_inspect_missing_note() {
        let dir = TempDir::new().unwrap();
        let vault = Vault::new(dir.path()).unwrap();
        assert!(matches!(
            inspect(&vault, "nope"),
            Err(VaultError::NoteNotFound(_))
        ));
    }
}
