//! Vault representation: a directory of markdown notes served as a
//! [`DocumentStore`].

use crate::cache::NoteCache;
use crate::document::{DocumentMetadata, DocumentStat, DocumentStore};
use crate::error::{Result, VaultError};
use glob::glob;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, warn};

/// Represents an Obsidian vault.
#[derive(Debug)]
pub struct Vault {
    /// Root path of the vault.
    pub root: PathBuf,
    cache: NoteCache,
}

impl Vault {
    /// Open a vault rooted at an existing directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.is_dir() {
            return Err(VaultError::VaultNotFound(root));
        }

        Ok(Self {
            root,
            cache: NoteCache::new(),
        })
    }

    /// Normalize a note path (add .md extension if needed).
    pub fn normalize_note_path(&self, path: &str) -> PathBuf {
        let path = path.trim();
        if path.ends_with(".md") {
            PathBuf::from(path)
        } else {
            PathBuf::from(format!("{}.md", path))
        }
    }

    /// Check if a note exists.
    pub fn note_exists(&self, relative_path: &Path) -> bool {
        self.root.join(relative_path).is_file()
    }

    /// List all markdown files in the vault, sorted, skipping hidden paths.
    pub fn list_notes(&self) -> Result<Vec<PathBuf>> {
        let pattern = self.root.join("**/*.md");
        let mut notes = Vec::new();

        for entry in glob(&pattern.to_string_lossy())? {
            match entry {
                Ok(path) => {
                    let Ok(relative) = path.strip_prefix(&self.root) else {
                        continue;
                    };
                    let hidden = relative
                        .components()
                        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'));
                    if !hidden {
                        notes.push(relative.to_path_buf());
                    }
                }
                Err(e) => warn!(error = %e, "glob error while listing notes"),
            }
        }

        notes.sort();
        Ok(notes)
    }

    /// Stat a note on disk.
    pub fn stat(&self, relative_path: &Path) -> Result<DocumentStat> {
        let metadata = std::fs::metadata(self.root.join(relative_path))?;
        let mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Ok(DocumentStat::new(relative_path, mtime, metadata.len()))
    }

    /// Resolve a note by vault-relative path or by file name (case-insensitive,
    /// extension optional).
    pub fn resolve_note(&self, query: &str) -> Result<PathBuf> {
        let normalized = self.normalize_note_path(query);
        if self.note_exists(&normalized) {
            return Ok(normalized);
        }

        let wanted = normalized
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let mut matches: Vec<PathBuf> = self
            .list_notes()?
            .into_iter()
            .filter(|p| {
                p.file_name()
                    .is_some_and(|n| n.to_string_lossy().to_lowercase() == wanted)
            })
            .collect();

        match matches.len() {
            0 => Err(VaultError::NoteNotFound(PathBuf::from(query))),
            1 => Ok(matches.remove(0)),
            n => Err(VaultError::Other(format!(
                "'{}' matches {} notes; use a vault-relative path",
                query, n
            ))),
        }
    }
}

impl DocumentStore for Vault {
    fn list_documents(&self) -> Result<Vec<DocumentStat>> {
        let mut stats = Vec::new();
        for path in self.list_notes()? {
            match self.stat(&path) {
                Ok(stat) => stats.push(stat),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable note"),
            }
        }
        self.cache.retain(&stats);
        debug!(notes = stats.len(), root = %self.root.display(), "listed vault");
        Ok(stats)
    }

    fn metadata(&self, doc: &DocumentStat) -> Result<Arc<DocumentMetadata>> {
        Ok(self.cache.get_or_load(&self.root, doc)?.metadata)
    }

    fn read_body(&self, doc: &DocumentStat) -> Result<Arc<str>> {
        Ok(self.cache.get_or_load(&self.root, doc)?.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_vault(files: &[(&str, &str)]) -> (TempDir, Vault) {
        let dir = TempDir::new().unwrap();
        for (path, content) in files {
            let full = dir.path().join(path);
            std::fs::create_dir_all(full.parent().unwrap()).unwrap();
            std::fs::write(full, content).unwrap();
        }
        let vault = Vault::new(dir.path()).unwrap();
        (dir, vault)
    }

    #[test]
    fn test_missing_vault() {
        let result = Vault::new("/definitely/not/a/vault");
        assert!(matches!(result, Err(VaultError::VaultNotFound(_))));
    }

    #[test]
    fn test_list_notes_skips_hidden_and_non_markdown() {
        let (_dir, vault) = setup_test_vault(&[
            ("a.md", "A"),
            ("sub/c.md", "C"),
            (".obsidian/workspace.md", "hidden"),
            ("image.png", "binary"),
        ]);

        let notes = vault.list_notes().unwrap();
        assert_eq!(notes, vec![PathBuf::from("a.md"), PathBuf::from("sub/c.md")]);
    }

    #[test]
    fn test_list_documents_stats() {
        let (_dir, vault) = setup_test_vault(&[("sub/note.md", "hello")]);
        let docs = vault.list_documents().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].name, "note.md");
        assert_eq!(docs[0].size, 5);
        assert!(docs[0].mtime > 0);
    }

    #[test]
    fn test_metadata_and_body_share_one_read() {
        let (_dir, vault) =
            setup_test_vault(&[("a.md", "---\nstatus: done\n---\n# Title\n#tag")]);
        let docs = vault.list_documents().unwrap();

        let meta = vault.metadata(&docs[0]).unwrap();
        let body = vault.read_body(&docs[0]).unwrap();

        assert!(meta.tags.contains("tag"));
        assert!(body.starts_with("---"));
        assert_eq!(vault.cache.disk_reads(), 1);
    }

    #[test]
    fn test_normalize_note_path() {
        let (_dir, vault) = setup_test_vault(&[]);
        assert_eq!(vault.normalize_note_path("note"), PathBuf::from("note.md"));
        assert_eq!(vault.normalize_note_path("note.md"), PathBuf::from("note.md"));
    }

    #[test]
    fn test_resolve_note_by_name() {
        let (_dir, vault) = setup_test_vault(&[("deep/folder/Target.md", "x")]);
        assert_eq!(
            vault.resolve_note("target").unwrap(),
            PathBuf::from("deep/folder/Target.md")
        );
        assert!(matches!(
            vault.resolve_note("missing"),
            Err(VaultError::NoteNotFound(_))
        ));
    }
}
