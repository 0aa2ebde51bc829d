//! Command-line interface components
//!
//! This module contains CLI-specific code for the geodata fetcher,
//! including argument parsing, command handlers and progress display.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{
    Cli, Commands, ConfigAction, ConfigArgs, DownloadArgs, GlobalArgs, InspectArgs, ListArgs,
    PathsArgs,
};
pub use commands::{handle_config, handle_download, handle_inspect, handle_list, handle_paths};
pub use progress::ProgressSink;
