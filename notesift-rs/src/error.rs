//! Error types and exit codes for notesift.

use std::path::PathBuf;
use thiserror::Error;

/// Process exit codes used by the CLI.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOTE_NOT_FOUND: i32 = 2;
    pub const INVALID_QUERY: i32 = 3;
    pub const VAULT_NOT_FOUND: i32 = 4;
}

/// Main error type for notesift operations.
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Note not found: {0}")]
    NoteNotFound(PathBuf),

    #[error("Vault not found at: {0}")]
    VaultNotFound(PathBuf),

    #[error("Invalid frontmatter in {path}: {message}")]
    InvalidFrontmatter { path: PathBuf, message: String },

    #[error("Nothing to search for: add a filter or a search query")]
    EmptyQuery,

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("{0}")]
    Other(String),
}

impl VaultError {
    /// Returns the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            VaultError::NoteNotFound(_) => exit_code::NOTE_NOT_FOUND,
            VaultError::EmptyQuery | VaultError::InvalidQuery(_) => exit_code::INVALID_QUERY,
            VaultError::VaultNotFound(_) => exit_code::VAULT_NOT_FOUND,
            _ => exit_code::GENERAL_ERROR,
        }
    }
}

/// Result type alias for notesift operations.
pub type Result<T> = std::result::Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(VaultError::EmptyQuery.exit_code(), exit_code::INVALID_QUERY);
        assert_eq!(
            VaultError::InvalidQuery("unterminated quote".to_string()).exit_code(),
            exit_code::INVALID_QUERY
        );
        assert_eq!(
            VaultError::NoteNotFound(PathBuf::from("a.md")).exit_code(),
            exit_code::NOTE_NOT_FOUND
        );
        assert_eq!(
            VaultError::VaultNotFound(PathBuf::from("/nope")).exit_code(),
            exit_code::VAULT_NOT_FOUND
        );
        assert_eq!(VaultError::Other("x".to_string()).exit_code(), exit_code::GENERAL_ERROR);
    }

    #[test]
    fn test_empty_query_message_is_user_facing() {
        let msg = VaultError::EmptyQuery.to_string();
        assert!(msg.contains("add a filter"));
    }
}
