//! Command handlers for the geodata fetcher CLI
//!
//! This module implements the command handlers that connect CLI arguments
//! to the library.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::app::{
    load_outputs, BatchSummary, HttpFetcher, ManifestStore, Orchestrator, ProcessEngine,
};
use crate::cli::{
    ConfigAction, ConfigArgs, DownloadArgs, GlobalArgs, InspectArgs, ListArgs, PathsArgs,
};
use crate::cli::progress::ProgressSink;
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Load configuration and apply the global CLI overrides
async fn load_config(global: &GlobalArgs) -> Result<AppConfig> {
    let mut config = AppConfig::load(global.config.clone()).await?;
    if let Some(root) = &global.root {
        config.layout.root = root.clone();
    }
    Ok(config)
}

/// Handle the download command
///
/// Fetches every selected entry, extracts archive members, and writes each
/// entry's canonical output.
pub async fn handle_download(args: DownloadArgs, global: &GlobalArgs) -> Result<()> {
    let start_time = Instant::now();
    args.validate().map_err(AppError::generic)?;

    let mut config = load_config(global).await?;
    if let Some(concurrency) = args.concurrency {
        config.orchestrator.max_concurrent_fetches = concurrency;
    }
    if let Some(interpreter) = &args.interpreter {
        config.transform.interpreter = interpreter.clone();
    }
    config.validate()?;

    let store = ManifestStore::open(&args.manifest).await?;
    let entries = store.select(&args.ids)?;
    if entries.is_empty() {
        warn!("Manifest {} has no entries", args.manifest.display());
        println!("Nothing to do: no manifest entries selected.");
        return Ok(());
    }

    let (client_config, orchestrator_config, transform_config, layout) =
        config.to_runtime_config();
    let overwrite = args.overwrite || orchestrator_config.overwrite;
    info!(
        "Processing {} of {} entries into {} (overwrite: {})",
        entries.len(),
        store.len(),
        layout.root().display(),
        overwrite
    );

    let sink = Arc::new(ProgressSink::new(global.quiet));
    let orchestrator = Orchestrator::new(
        orchestrator_config,
        layout,
        Arc::new(HttpFetcher::with_config(client_config)?),
        Arc::new(ProcessEngine::new(transform_config)),
        sink,
    )?;

    let summary = orchestrator.run_batch(&entries, overwrite).await;
    if !global.quiet {
        print_summary(&summary);
    }
    info!("Download command finished in {:?}", start_time.elapsed());
    Ok(())
}

fn print_summary(summary: &BatchSummary) {
    println!();
    println!("Batch summary");
    println!("  Entries:      {}", summary.entries);
    println!(
        "  Fetches:      {} dispatched, {} failed",
        summary.dispatched, summary.fetch_failures
    );
    if summary.extract_failures > 0 {
        println!("  Extractions:  {} failed", summary.extract_failures);
    }
    if summary.skipped_entries > 0 {
        println!("  Skipped:      {} entries", summary.skipped_entries);
    }
    println!(
        "  Transformed:  {} ok, {} failed",
        summary.transformed, summary.transform_failures
    );
    println!("  Duration:     {:.1}s", summary.duration.as_secs_f64());
    if summary.is_clean() {
        println!("All entries processed successfully.");
    } else {
        println!("Some entries had errors; see messages above.");
    }
}

/// Handle the list command
pub async fn handle_list(args: ListArgs) -> Result<()> {
    let store = ManifestStore::open(&args.manifest).await?;

    let mut shown = 0;
    for entry in store.entries() {
        if args.with_schema && !entry.has_schema() {
            continue;
        }
        println!(
            "{:<32} {:<20} {:<36} {:<24} {} fetch(es){}",
            entry.id,
            entry.dataset_name,
            entry.locality_label(),
            entry.provider,
            entry.fetch_count(),
            if entry.has_schema() { "" } else { " [no schema]" }
        );
        shown += 1;
    }
    println!("{} of {} entries", shown, store.len());
    Ok(())
}

/// Handle the paths command
pub async fn handle_paths(args: PathsArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global).await?;
    let (_, _, _, layout) = config.to_runtime_config();

    let store = ManifestStore::open(&args.manifest).await?;
    let entries = store.select(&args.ids)?;
    for (entry, path) in entries.iter().zip(layout.output_paths(&entries)) {
        println!("{}\t{}", entry.id, path.display());
    }
    Ok(())
}

/// Handle the inspect command
///
/// Loads each selected entry's canonical output under its schema and
/// prints its feature count. Entries whose output is missing or does not
/// parse are listed with the reason; they do not fail the command.
pub async fn handle_inspect(args: InspectArgs, global: &GlobalArgs) -> Result<()> {
    let config = load_config(global).await?;
    let (_, _, _, layout) = config.to_runtime_config();

    let store = ManifestStore::open(&args.manifest).await?;
    let entries = store.select(&args.ids)?;

    let mut total_features = 0;
    let mut readable = 0;
    for output in load_outputs(&layout, &entries).await {
        match &output.dataset {
            Ok(dataset) => {
                readable += 1;
                total_features += dataset.feature_count();
                println!(
                    "{:<32} {:<18} {:>6} features  {}",
                    output.id,
                    dataset.schema(),
                    dataset.feature_count(),
                    output.path.display()
                );
                if args.markers {
                    for marker in dataset.markers() {
                        println!(
                            "    {:>11.6} {:>10.6}  {}",
                            marker.position.longitude,
                            marker.position.latitude,
                            marker.name.as_deref().unwrap_or("(unnamed)")
                        );
                    }
                }
            }
            Err(e) => {
                warn!("[{}] {}", output.id, e);
                println!("{:<32} unavailable: {}", output.id, e);
            }
        }
    }

    println!(
        "{} of {} outputs readable, {} features",
        readable,
        entries.len(),
        total_features
    );
    Ok(())
}

/// Handle the config command
pub async fn handle_config(args: ConfigArgs, global: &GlobalArgs) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let config = load_config(global).await?;
            let content = toml::to_string_pretty(&config)
                .map_err(|e| AppError::generic(format!("Failed to render config: {}", e)))?;
            println!("{}", content);
        }
        ConfigAction::Init { path } => {
            let (path, created) = AppConfig::initialize(path).await?;
            if created {
                println!("Created default configuration file:");
                println!("   {}", path.display());
                println!("   You can customize settings by editing this file.");
            } else {
                println!("Configuration file already exists: {}", path.display());
            }
        }
    }
    Ok(())
}
