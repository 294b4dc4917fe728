//! Output formatting for CLI commands.

use crate::cli::args::OutputFormat;
use crate::error::Result;
use chrono::{DateTime, SecondsFormat};
use serde::Serialize;

/// Helper for formatting and printing output.
pub struct Output {
    format: OutputFormat,
    quiet: bool,
    color: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool, color: bool) -> Self {
        Self {
            format,
            quiet,
            color,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Whether text output may use ANSI emphasis.
    pub fn color(&self) -> bool {
        self.color
    }

    /// Render a serializable value in the configured format. Text output
    /// falls back to pretty JSON.
    pub fn render<T: Serialize>(&self, value: &T) -> Result<String> {
        Ok(match self.format {
            OutputFormat::Json | OutputFormat::Text => serde_json::to_string_pretty(value)?,
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
            OutputFormat::Toml => toml::to_string_pretty(value)?,
        })
    }

    /// Print a serializable value in the configured format.
    pub fn print<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", self.render(value)?);
        Ok(())
    }

    /// Print raw text (not serialized).
    pub fn print_raw(&self, text: &str) {
        println!("{}", text);
    }

    /// Print a message if not in quiet mode.
    pub fn info(&self, message: &str) {
        if !self.quiet {
            eprintln!("{}", message);
        }
    }

    /// Print a warning message.
    pub fn warn(&self, message: &str) {
        eprintln!("Warning: {}", message);
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        eprintln!("Error: {}", message);
    }
}

/// Render a millisecond Unix timestamp as RFC 3339 (UTC, whole seconds).
pub fn rfc3339(mtime_ms: u64) -> Option<String> {
    let millis = i64::try_from(mtime_ms).ok()?;
    DateTime::from_timestamp_millis(millis).map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
}
