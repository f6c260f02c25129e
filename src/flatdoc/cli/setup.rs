use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Returns the version string, including git hash and commit date for non-release builds.
/// Format: "0.3.2" for releases, "0.3.2@abc1234 2024-01-15 14:30" for dev builds
fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_COMMIT_DATE: &str = env!("GIT_COMMIT_DATE");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            VERSION.to_string()
        } else {
            format!("{}@{} {}", VERSION, GIT_HASH, GIT_COMMIT_DATE)
        }
    })
}

#[derive(Parser, Debug)]
#[command(name = "flatdoc", bin_name = "flatdoc", version = get_version())]
#[command(about = "Inspect and edit a flat-file document store", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Record set directory (overrides the config file)
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Base record set that --root overlays
    #[arg(long, global = true, value_name = "DIR")]
    pub fallback: Option<PathBuf>,

    /// Config file to use instead of flatdoc.toml
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the documents of a type
    List {
        /// Type name (node) or directory (nodes)
        #[arg(value_name = "TYPE")]
        doc_type: String,
    },

    /// Print one document
    Show {
        #[arg(value_name = "TYPE")]
        doc_type: String,
        key: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load every document and report problems
    Check,

    /// Rewrite documents in canonical form
    Fmt {
        #[arg(value_name = "TYPE")]
        doc_type: String,

        /// Only this document
        key: Option<String>,
    },

    /// Change a document's key, renaming its file
    Rename {
        #[arg(value_name = "TYPE")]
        doc_type: String,
        old: String,
        new: String,
    },

    /// Delete a document
    Delete {
        #[arg(value_name = "TYPE")]
        doc_type: String,
        key: String,
    },

    /// Read or write CSV lookup tables
    #[command(subcommand)]
    Csv(CsvCommands),
}

#[derive(Subcommand, Debug)]
pub enum CsvCommands {
    /// Print a cell. Without COLUMN, reads a two-column table
    Get {
        path: PathBuf,
        row: String,
        column: Option<String>,
    },

    /// Set a cell and save the table
    Set {
        path: PathBuf,
        row: String,
        column: String,
        value: String,
    },
}
