//! Cache data structures.

use crate::document::DocumentMetadata;
use std::sync::Arc;

/// A note held in the in-memory cache.
#[derive(Debug, Clone)]
pub struct CachedNote {
    /// Modification time (ms since epoch) the entry was read at.
    pub mtime: u64,
    /// File size in bytes when read.
    pub size: u64,
    /// Raw file content.
    pub content: Arc<str>,
    /// Metadata derived from the content.
    pub metadata: Arc<DocumentMetadata>,
}

impl CachedNote {
    /// Check if the cached note is stale compared to the file's current stat.
    pub fn is_stale(&self, mtime: u64, size: u64) -> bool {
        self.mtime != mtime || self.size != size
    }
}
