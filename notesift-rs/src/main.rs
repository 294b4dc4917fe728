//! notesift CLI entry point.

use clap::Parser;
use notesift::cli::args::{Cli, Commands};
use notesift::cli::output::Output;
use notesift::cli::{inspect, parse, search};
use notesift::config::Config;
use notesift::error::{VaultError, exit_code};
use notesift::vault::Vault;
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v/-q.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let color = !cli.no_color && std::io::stdout().is_terminal();
    let output = Output::new(cli.output_format(), cli.quiet, color);

    match run(&cli, &output) {
        Ok(()) => ExitCode::from(exit_code::SUCCESS as u8),
        Err(e) => {
            if !cli.quiet {
                output.error(&e.to_string());
            }
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn run(cli: &Cli, output: &Output) -> Result<(), VaultError> {
    let config = Config::load()?;

    match &cli.command {
        Commands::Parse(args) => parse::run(args, output),
        Commands::Search(args) => {
            let vault = open_vault(cli, &config)?;
            search::run(&vault, &config.search, args, output)
        }
        Commands::Inspect(args) => {
            let vault = open_vault(cli, &config)?;
            inspect::run(&vault, args, output)
        }
    }
}

fn open_vault(cli: &Cli, config: &Config) -> Result<Vault, VaultError> {
    let vault_path = config.resolve_vault_path(cli.vault.as_deref())?;
    tracing::debug!(vault = %vault_path.display(), "opening vault");
    Vault::new(vault_path)
}
