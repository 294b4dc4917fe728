//! CLI command implementations.

pub mod args;
pub mod output;

pub mod inspect;
pub mod parse;
pub mod search;

pub use args::{Cli, Commands};
pub use output::Output;
