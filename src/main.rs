//! Geodata Fetcher CLI application
//!
//! Command-line interface for fetching open geographic datasets and
//! normalizing them per provider.

use std::process;

use tracing::{info, Level};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, EnvFilter};

use geodata_fetcher::cli::{
    handle_config, handle_download, handle_inspect, handle_list, handle_paths, Cli, Commands,
};
use geodata_fetcher::config::AppConfig;
use geodata_fetcher::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();
    init_logging(&cli, configured_log_level(&cli).await);

    info!("Geodata Fetcher v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Download(args) => {
            info!("Executing download command");
            handle_download(args, &cli.global).await
        }
        Commands::List(args) => {
            info!("Executing list command");
            handle_list(args).await
        }
        Commands::Paths(args) => {
            info!("Executing paths command");
            handle_paths(args, &cli.global).await
        }
        Commands::Inspect(args) => {
            info!("Executing inspect command");
            handle_inspect(args, &cli.global).await
        }
        Commands::Config(args) => {
            info!("Executing config command");
            handle_config(args, &cli.global).await
        }
    }
}

/// Level from `[logging]` in the config file. Config errors are left for
/// the command handlers to report.
async fn configured_log_level(cli: &Cli) -> Level {
    AppConfig::load(cli.global.config.clone())
        .await
        .ok()
        .and_then(|config| config.logging.level().ok())
        .unwrap_or(Level::WARN)
}

/// Initialize logging based on CLI verbosity settings
fn init_logging(cli: &Cli, configured: Level) {
    let log_level = cli.log_level(configured);

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("geodata_fetcher={}", log_level).parse::<Directive>() {
        filter = filter.add_directive(directive);
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
