//! CLI argument definitions using clap.

use crate::search::{Facet, SearchMode, SortOrder};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "notesift")]
#[command(author, version, about = "Filter and search Obsidian-style note vaults", long_about = None)]
pub struct Cli {
    /// Path to the vault (overrides config default)
    #[arg(long, global = true)]
    pub vault: Option<PathBuf>,

    /// Output as JSON (default)
    #[arg(long, global = true, conflicts_with_all = ["yaml", "toml", "text"])]
    pub json: bool,

    /// Output as YAML
    #[arg(long, global = true, conflicts_with_all = ["json", "toml", "text"])]
    pub yaml: bool,

    /// Output as TOML
    #[arg(long, global = true, conflicts_with_all = ["json", "yaml", "text"])]
    pub toml: bool,

    /// Output as human-readable text
    #[arg(long, global = true, conflicts_with_all = ["json", "yaml", "toml"])]
    pub text: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (can be repeated)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_format(&self) -> OutputFormat {
        if self.yaml {
            OutputFormat::Yaml
        } else if self.toml {
            OutputFormat::Toml
        } else if self.text {
            OutputFormat::Text
        } else {
            OutputFormat::Json
        }
    }

    /// Default tracing filter directive for the requested verbosity.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Toml,
    Text,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search notes with a compound query
    Search(SearchArgs),

    /// Show how a query string is parsed
    Parse(ParseArgs),

    /// Show the searchable facets of one note
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Query, e.g. `tag:project file:/^2024/ line:(todo urgent) "exact words"`
    pub query: String,

    /// Free-text matching mode
    #[arg(long, value_enum)]
    pub mode: Option<SearchMode>,

    /// Match dedicated filters case-sensitively
    #[arg(long)]
    pub case_sensitive: bool,

    /// Match dedicated filters case-insensitively, overriding the config
    #[arg(long, conflicts_with = "case_sensitive")]
    pub case_insensitive: bool,

    /// Result ordering
    #[arg(long, value_enum)]
    pub sort: Option<SortOrder>,

    /// Maximum number of notes to return
    #[arg(long, conflicts_with = "no_limit")]
    pub limit: Option<usize>,

    /// Return every matching note, ignoring a configured limit
    #[arg(long)]
    pub no_limit: bool,

    /// Maximum excerpts per note
    #[arg(long)]
    pub excerpts: Option<usize>,

    /// Facets the free-text query searches (comma-separated)
    #[arg(long = "in", value_enum, value_delimiter = ',')]
    pub facets: Vec<Facet>,

    /// Evaluate notes in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Include HTML-highlighted excerpt text
    #[arg(long)]
    pub html: bool,
}

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Query string to parse
    pub query: String,

    /// Build the line pattern case-sensitively
    #[arg(long)]
    pub case_sensitive: bool,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Note path or file name
    pub note: String,
}
