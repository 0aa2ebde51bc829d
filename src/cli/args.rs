//! Command-line argument parsing for the geodata fetcher
//!
//! This module defines the CLI structure using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Geodata Fetcher - fetch and normalize open geographic datasets
#[derive(Parser, Debug)]
#[command(
    name = "geodata_fetcher",
    version,
    about = "Fetch open geographic datasets and normalize them per provider",
    long_about = "Reads a manifest of open-data providers, fetches every provider's datasets,
extracts the archive members it needs, and converts each provider's data into one
canonical file per locality."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Root directory of the local dataset tree
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch, extract and transform manifest entries
    Download(DownloadArgs),

    /// List manifest entries
    List(ListArgs),

    /// Print canonical output paths of manifest entries
    Paths(PathsArgs),

    /// Count the features of each canonical output
    Inspect(InspectArgs),

    /// Show or create the configuration file
    Config(ConfigArgs),
}

/// Arguments for the download command
#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    /// Manifest file
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Only process these entry ids (repeatable)
    #[arg(long = "id", value_name = "ID")]
    pub ids: Vec<String>,

    /// Re-fetch files that already exist
    #[arg(short, long)]
    pub overwrite: bool,

    /// Fetches allowed in flight at once
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Interpreter hosting converter programs
    #[arg(long, value_name = "PROGRAM")]
    pub interpreter: Option<String>,
}

/// Arguments for the list command
#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Manifest file
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Only list entries with a schema
    #[arg(long)]
    pub with_schema: bool,
}

/// Arguments for the paths command
#[derive(Args, Debug, Clone)]
pub struct PathsArgs {
    /// Manifest file
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Only print these entry ids (repeatable)
    #[arg(long = "id", value_name = "ID")]
    pub ids: Vec<String>,
}

/// Arguments for the inspect command
#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// Manifest file
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,

    /// Only inspect these entry ids (repeatable)
    #[arg(long = "id", value_name = "ID")]
    pub ids: Vec<String>,

    /// Also print every feature's name and position
    #[arg(long)]
    pub markers: bool,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a commented default configuration file
    Init {
        /// Where to write the file (defaults to the user config directory)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level; verbosity flags win over `configured`
    pub fn log_level(&self, configured: tracing::Level) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::DEBUG
        } else if self.global.verbose {
            tracing::Level::INFO
        } else {
            configured
        }
    }
}

impl DownloadArgs {
    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if self.concurrency == Some(0) {
            return Err("Concurrency must be greater than 0".to_string());
        }
        if self.ids.iter().any(|id| id.trim().is_empty()) {
            return Err("Entry ids cannot be empty".to_string());
        }
        Ok(())
    }
}
