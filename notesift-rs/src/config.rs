//! User configuration, read from a TOML file.
//!
//! ```toml
//! vault = "~/notes"
//!
//! [search]
//! mode = "fuzzy"
//! sort = "path-asc"
//! limit = 50
//! excerpt_limit = 5
//!
//! [search.targets]
//! path = false
//! ```

use crate::error::{Result, VaultError};
use crate::search::SearchOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "NOTESIFT_CONFIG";

/// Environment variable naming the vault when neither flag nor config does.
pub const VAULT_ENV: &str = "NOTESIFT_VAULT";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default vault path. A leading `~/` expands to the home directory.
    pub vault: Option<PathBuf>,
    /// Default search options; command-line flags override them.
    pub search: SearchOptions,
}

impl Config {
    /// Default config location: `<config_dir>/notesift/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("notesift").join("config.toml"))
    }

    /// Load from `$NOTESIFT_CONFIG`, else the default location. A missing
    /// file yields the defaults.
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(Self::default_path);
        match path {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from an explicit path. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            VaultError::ConfigError(format!("{}: {}", path.display(), e.message()))
        })?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Pick the vault: the command-line flag, then the config file, then
    /// `$NOTESIFT_VAULT`, then the current directory.
    pub fn resolve_vault_path(&self, flag: Option<&Path>) -> Result<PathBuf> {
        let chosen = flag
            .map(Path::to_path_buf)
            .or_else(|| self.vault.as_deref().map(expand_home))
            .or_else(|| std::env::var_os(VAULT_ENV).map(PathBuf::from));

        match chosen {
            Some(path) => Ok(path),
            None => Ok(std::env::current_dir()?),
        }
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
