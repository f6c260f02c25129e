//! # CLI Layer
//!
//! The binary is one client of the library. This module is the only place
//! that parses arguments, writes to the terminal or decides exit codes;
//! everything it runs lives in [`flatdoc::commands`].
//!
//! - `run()`: parses arguments, loads configuration, dispatches
//! - `init_logging()`: installs the tracing subscriber on stderr
//! - `print_*()` (in `print.rs`): output formatting

use super::print::{print_cells, print_documents, print_listing, print_messages};
use super::setup::{Cli, Commands, CsvCommands};
use clap::Parser;
use flatdoc::catalog;
use flatdoc::commands::{self, document_type, CmdResult};
use flatdoc::config::StoreConfig;
use flatdoc::error::Result;
use flatdoc::store::Store;
use tracing_subscriber::EnvFilter;

/// Runs the CLI. `Ok(false)` means the command ran but reported problems.
pub fn run() -> Result<bool> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let mut config = StoreConfig::load(cli.config.as_deref())?;
    if let Some(root) = &cli.root {
        config.root = root.clone();
    }
    if let Some(fallback) = &cli.fallback {
        config.fallback = Some(fallback.clone());
    }
    init_logging(&config.log_level, cli.verbose);
    tracing::debug!(?config, "configuration loaded");

    let store = Store::from_config(&config);
    let result = match cli.command {
        Commands::List { doc_type } => {
            let result = commands::list::run(&store, document_type(&doc_type)?)?;
            print_listing(&result.listed, &store.root());
            result
        }
        Commands::Show {
            doc_type,
            key,
            json,
        } => {
            let result = commands::show::run(&store, document_type(&doc_type)?, &key)?;
            print_documents(&result.documents, json)?;
            result
        }
        Commands::Check => commands::check::run(&store, catalog::ALL)?,
        Commands::Fmt { doc_type, key } => {
            commands::format::run(&store, document_type(&doc_type)?, key.as_deref())?
        }
        Commands::Rename { doc_type, old, new } => {
            commands::rename::run(&store, document_type(&doc_type)?, &old, &new)?
        }
        Commands::Delete { doc_type, key } => {
            commands::delete::run(&store, document_type(&doc_type)?, &key)?
        }
        Commands::Csv(CsvCommands::Get { path, row, column }) => {
            let result = commands::table::get(&path, &row, column.as_deref())?;
            print_cells(&result.cells);
            result
        }
        Commands::Csv(CsvCommands::Set {
            path,
            row,
            column,
            value,
        }) => commands::table::set(&path, &row, &column, &value)?,
    };

    finish(&result)
}

fn finish(result: &CmdResult) -> Result<bool> {
    print_messages(&result.messages);
    Ok(!result.has_errors())
}

/// `RUST_LOG` wins over the configured level; `-v` wins over both.
fn init_logging(level: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
