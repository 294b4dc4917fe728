//! notesift - compound search over Obsidian-style note vaults.
//!
//! # Overview
//!
//! A query combines dedicated filters (file name, path, tag, property,
//! heading, content, same-line terms), which must all hold, with a free-text
//! query that may hit any enabled facet of a note. Every accepted note comes
//! back with per-filter hit counts and line excerpts explaining the match.
//!
//! The engine reads notes through the [`DocumentStore`] trait; [`Vault`] is
//! the filesystem implementation and [`MemoryStore`] an in-memory one.
//!
//! # Example
//!
//! ```no_run
//! use notesift::search::{SearchOptions, evaluate, parse_query};
//! use notesift::Vault;
//!
//! let vault = Vault::new("/path/to/vault").unwrap();
//! let query = parse_query("tag:project line:(todo urgent)")
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let outcome = evaluate(&vault, &query, &SearchOptions::default()).unwrap();
//! for result in &outcome.results {
//!     println!("{}", result.document.path.display());
//!     for excerpt in &result.excerpts {
//!         println!("  {:?}: {}", excerpt.line, excerpt.text);
//!     }
//! }
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod note;
pub mod parser;
pub mod search;
pub mod types;
pub mod vault;

// Re-export main types at crate root
pub use config::Config;
pub use document::{
    DocumentMetadata, DocumentStat, DocumentStore, Frontmatter, FrontmatterValue, MemoryDocument,
    MemoryStore,
};
pub use error::{Result, VaultError};
pub use note::Note;
pub use search::{
    CancelToken, MatchResult, ParsedQuery, QueryBuilder, SearchOptions, SearchOutcome, evaluate,
    evaluate_with_cancel, parse_query,
};
pub use vault::Vault;
