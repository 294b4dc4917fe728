//! In-memory note cache.
//!
//! Reading a note once serves both its metadata and its body; later reads
//! of an unchanged file (same mtime and size) never touch the disk again.

mod types;

pub use types::CachedNote;

use crate::document::DocumentStat;
use crate::error::{Result, VaultError};
use crate::note::Note;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tracing::trace;

/// Thread-safe cache of parsed notes keyed by vault-relative path.
#[derive(Debug, Default)]
pub struct NoteCache {
    entries: RwLock<HashMap<PathBuf, CachedNote>>,
    disk_reads: AtomicUsize,
}

impl NoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached entry for `stat`, loading it from `vault_root` when
    /// absent or stale.
    pub fn get_or_load(&self, vault_root: &Path, stat: &DocumentStat) -> Result<CachedNote> {
        if let Some(entry) = self.lookup(&stat.path) {
            if !entry.is_stale(stat.mtime, stat.size) {
                return Ok(entry);
            }
        }

        trace!(path = %stat.path.display(), "reading note from disk");
        self.disk_reads.fetch_add(1, Ordering::Relaxed);
        let note = Note::load(vault_root, &stat.path)?;
        let entry = CachedNote {
            mtime: stat.mtime,
            size: stat.size,
            metadata: Arc::new(note.metadata()),
            content: Arc::from(note.content),
        };

        self.entries
            .write()
            .map_err(|_| VaultError::Other("note cache lock poisoned".to_string()))?
            .insert(stat.path.clone(), entry.clone());
        Ok(entry)
    }

    /// Drop entries whose paths are not in `live`.
    pub fn retain(&self, live: &[DocumentStat]) {
        if let Ok(mut entries) = self.entries.write() {
            entries.retain(|path, _| live.iter().any(|s| &s.path == path));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of times a note was read from disk.
    pub fn disk_reads(&self) -> usize {
        self.disk_reads.load(Ordering::Relaxed)
    }

    fn lookup(&self, path: &Path) -> Option<CachedNote> {
        self.entries.read().ok()?.get(path).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_read_is_cached() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.md"), "#tag body").unwrap();
        let stat = DocumentStat::new("a.md", 1, 9);

        let cache = NoteCache::new();
        let first = cache.get_or_load(dir.path(), &stat).unwrap();
        let second = cache.get_or_load(dir.path(), &stat).unwrap();

        assert_eq!(cache.disk_reads(), 1);
        assert!(Arc::ptr_eq(&first.content, &second.content));
        assert!(second.metadata.tags.contains("tag"));
    }

    #[test]
    fn test_stale_entry_is_reloaded() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.md"), "old").unwrap();
        let cache = NoteCache::new();
        cache.get_or_load(dir.path(), &DocumentStat::new("a.md", 1, 3)).unwrap();

        std::fs::write(dir.path().join("a.md"), "newer").unwrap();
        let entry = cache.get_or_load(dir.path(), &DocumentStat::new("a.md", 2, 5)).unwrap();

        assert_eq!(&*entry.content, "newer");
        assert_eq!(cache.disk_reads(), 2);
    }

    #[test]
    fn test_retain_drops_deleted_notes() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.md"), "a").unwrap();
        std::fs::write(dir.path().join("b.md"), "b").unwrap();
        let a = DocumentStat::new("a.md", 1, 1);
        let b = DocumentStat::new("b.md", 1, 1);

        let cache = NoteCache::new();
        cache.get_or_load(dir.path(), &a).unwrap();
        cache.get_or_load(dir.path(), &b).unwrap();
        cache.retain(&[a]);

        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let cache = NoteCache::new();
        let result = cache.get_or_load(dir.path(), &DocumentStat::new("gone.md", 1, 1));
        assert!(matches!(result, Err(VaultError::Io(_))));
        assert!(cache.is_empty());
    }
}
