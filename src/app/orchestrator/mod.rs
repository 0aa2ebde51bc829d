//! Batch orchestration of fetch, extract and transform
//!
//! A batch run walks every entry, dispatching one fetch per converter and
//! per download that is not already on disk. Fetches run concurrently and
//! report to the [`ResultSink`] as they finish. Once the last fetch of the
//! whole batch is done, entries are transformed one after another and a
//! single batch-complete notification closes the run.
//!
//! # Architecture
//!
//! - [`barrier`] - Exactly-once fan-in over all fetches of a run
//! - [`sink`] - Result notifications
//! - [`config`] - Concurrency and overwrite settings
//! - [`stats`] - Summary of a finished run
//!
//! # Examples
//!
//! ```rust,no_run
//! use geodata_fetcher::app::{
//!     HttpFetcher, LocalLayout, Orchestrator, OrchestratorConfig, ProcessEngine, TracingSink,
//! };
//! use geodata_fetcher::app::manifest::load_entries;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let entries = load_entries(Path::new("manifest.json")).await?;
//! let orchestrator = Orchestrator::new(
//!     OrchestratorConfig::default(),
//!     LocalLayout::new("datasets"),
//!     Arc::new(HttpFetcher::new()?),
//!     Arc::new(ProcessEngine::default()),
//!     Arc::new(TracingSink),
//! )?;
//!
//! let summary = orchestrator.run_batch(&entries, false).await;
//! println!("{} fetched, {} transformed", summary.completed, summary.transformed);
//! # Ok(())
//! # }
//! ```

pub mod barrier;
pub mod config;
pub mod sink;
pub mod stats;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::app::archive::{resolve_destination, ArchiveExtractor, ExtractInstruction};
use crate::app::client::Fetcher;
use crate::app::layout::LocalLayout;
use crate::app::manifest::{Download, ManifestEntry};
use crate::app::transform::{TransformEngine, TransformInvoker};
use crate::errors::{AppError, ArchiveError, ConfigError, DownloadError, Result};

pub use barrier::{CompletionGuard, FanInBarrier, RunState};
pub use config::OrchestratorConfig;
pub use sink::{ResultSink, TracingSink};
pub use stats::BatchSummary;

/// Failure counts shared with fetch tasks
#[derive(Debug, Default)]
struct FailureCounts {
    fetch: AtomicUsize,
    extract: AtomicUsize,
}

/// One fetch to dispatch
#[derive(Debug)]
struct FetchJob {
    entry: Arc<ManifestEntry>,
    url: String,
    destination: PathBuf,
    /// Download directory and member selections when the payload is an archive
    extract: Option<(PathBuf, Download)>,
}

/// Drives batch runs over a set of shared collaborators
pub struct Orchestrator {
    config: OrchestratorConfig,
    layout: LocalLayout,
    fetcher: Arc<dyn Fetcher>,
    extractor: ArchiveExtractor,
    invoker: TransformInvoker,
    sink: Arc<dyn ResultSink>,
}

impl Orchestrator {
    /// Create an orchestrator
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the configuration is invalid
    pub fn new(
        config: OrchestratorConfig,
        layout: LocalLayout,
        fetcher: Arc<dyn Fetcher>,
        engine: Arc<dyn TransformEngine>,
        sink: Arc<dyn ResultSink>,
    ) -> Result<Self> {
        config.validate().map_err(|reason| ConfigError::InvalidValue {
            field: "max_concurrent_fetches".to_string(),
            value: config.max_concurrent_fetches.to_string(),
            reason,
        })?;

        let invoker = TransformInvoker::new(layout.clone(), engine);
        Ok(Self {
            config,
            layout,
            fetcher,
            extractor: ArchiveExtractor::new(),
            invoker,
            sink,
        })
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn layout(&self) -> &LocalLayout {
        &self.layout
    }

    /// Run a single entry with the configured overwrite policy
    pub async fn run_entry(&self, entry: &ManifestEntry) -> BatchSummary {
        self.run_batch(std::slice::from_ref(entry), self.config.overwrite)
            .await
    }

    /// Fetch, extract and transform every entry.
    ///
    /// Individual failures are reported to the sink and never abort the
    /// batch. `on_batch_complete` is called exactly once, after every
    /// dispatched fetch has finished and every entry has been transformed.
    pub async fn run_batch(&self, entries: &[ManifestEntry], overwrite: bool) -> BatchSummary {
        let start = Instant::now();
        let mut summary = BatchSummary::new(Utc::now(), entries.len());
        info!(
            "Starting batch of {} entries (overwrite: {})",
            entries.len(),
            overwrite
        );

        // Fresh state per run; nothing is shared with earlier runs
        let barrier = Arc::new(FanInBarrier::new());
        let failures = Arc::new(FailureCounts::default());
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_fetches));
        let mut handles = Vec::new();

        for entry in entries {
            // A layout failure only cancels this entry's downloads; it is
            // still transformed below so its outcome gets reported
            if let Err(e) = self.layout.prepare(entry, overwrite).await {
                summary.skipped_entries += 1;
                self.sink.on_fetch_error(entry, None, &AppError::from(e));
                continue;
            }

            for job in self.fetch_jobs(entry, overwrite).await {
                self.sink.on_fetch_dispatched(entry, &job.destination);
                let guard = CompletionGuard::register(barrier.clone());
                handles.push(self.spawn_fetch(job, guard, &semaphore, &failures));
            }
        }

        if barrier.seal() {
            debug!("No fetches in flight after dispatch");
        }
        barrier.wait().await;

        for result in join_all(handles).await {
            if let Err(e) = result {
                error!("Fetch task ended abnormally: {}", e);
            }
        }

        let state = barrier.snapshot();
        summary.dispatched = state.dispatched;
        summary.completed = state.completed;
        summary.fetch_failures = failures.fetch.load(Ordering::SeqCst);
        summary.extract_failures = failures.extract.load(Ordering::SeqCst);
        info!(
            "All {} fetches finished ({} failed); transforming {} entries",
            state.completed,
            summary.fetch_failures,
            entries.len()
        );

        for entry in entries {
            match self.invoker.transform(entry).await {
                Ok(output) => {
                    summary.transformed += 1;
                    self.sink.on_entry_transformed(entry, &output);
                }
                Err(e) => {
                    summary.transform_failures += 1;
                    self.sink
                        .on_entry_transform_error(entry, &self.layout.converter_path(entry), &e);
                }
            }
        }

        summary.duration = start.elapsed();
        self.sink.on_batch_complete(entries);
        info!(
            "Batch complete in {:.2}s: {} transformed, {} transform failures",
            summary.duration.as_secs_f64(),
            summary.transformed,
            summary.transform_failures
        );
        summary
    }

    /// Fetches needed for one entry, converter first, in manifest order
    async fn fetch_jobs(&self, entry: &ManifestEntry, overwrite: bool) -> Vec<FetchJob> {
        let shared = Arc::new(entry.clone());
        let mut jobs = Vec::new();

        if let Some(url) = &entry.converter {
            let destination = self.layout.converter_path(entry);
            if should_download(&destination, overwrite).await {
                jobs.push(FetchJob {
                    entry: shared.clone(),
                    url: url.clone(),
                    destination,
                    extract: None,
                });
            }
        }

        for (index, download) in entry.downloads.iter().enumerate() {
            let destination = self.layout.dataset_path(entry, index);
            if !should_download(&destination, overwrite).await {
                debug!("Skipping existing {}", destination.display());
                continue;
            }
            let extract = download
                .is_archive()
                .then(|| (self.layout.download_dir(entry, index), download.clone()));
            jobs.push(FetchJob {
                entry: shared.clone(),
                url: download.src.clone(),
                destination,
                extract,
            });
        }

        jobs
    }

    fn spawn_fetch(
        &self,
        job: FetchJob,
        guard: CompletionGuard,
        semaphore: &Arc<Semaphore>,
        failures: &Arc<FailureCounts>,
    ) -> JoinHandle<()> {
        let fetcher = self.fetcher.clone();
        let sink = self.sink.clone();
        let extractor = self.extractor;
        let semaphore = semaphore.clone();
        let failures = failures.clone();

        tokio::spawn(async move {
            let _guard = guard;
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    failures.fetch.fetch_add(1, Ordering::SeqCst);
                    let error = DownloadError::Aborted {
                        reason: "fetch limiter closed".to_string(),
                    };
                    sink.on_fetch_error(&job.entry, Some(&job.destination), &error.into());
                    return;
                }
            };

            debug!("Fetching {} -> {}", job.url, job.destination.display());
            if let Err(e) = fetcher.fetch(&job.url, &job.destination).await {
                failures.fetch.fetch_add(1, Ordering::SeqCst);
                sink.on_fetch_error(&job.entry, Some(&job.destination), &e.into());
                return;
            }
            sink.on_fetch_complete(&job.entry, &job.destination);

            if let Some((dir, download)) = job.extract {
                if let Err(e) = extract_members(extractor, &job.destination, &dir, &download).await
                {
                    failures.extract.fetch_add(1, Ordering::SeqCst);
                    sink.on_extract_error(&job.entry, &job.destination, &e);
                }
            }
        })
    }
}

/// Fetch when overwriting or when nothing is at `destination` yet
async fn should_download(destination: &Path, overwrite: bool) -> bool {
    overwrite || !tokio::fs::try_exists(destination).await.unwrap_or(false)
}

async fn extract_members(
    extractor: ArchiveExtractor,
    archive: &Path,
    dir: &Path,
    download: &Download,
) -> std::result::Result<(), ArchiveError> {
    let instructions = download
        .extract
        .iter()
        .flatten()
        .map(|extract| {
            Ok(ExtractInstruction {
                member: extract.src.clone(),
                destination: resolve_destination(dir, &extract.dst)?,
            })
        })
        .collect::<std::result::Result<Vec<_>, ArchiveError>>()?;

    let archive_path = archive.to_path_buf();
    let report = tokio::task::spawn_blocking(move || extractor.extract(&archive_path, &instructions))
        .await
        .map_err(|e| ArchiveError::Io {
            path: archive.to_path_buf(),
            source: std::io::Error::other(e.to_string()),
        })??;

    debug!(
        "Extracted {} members from {} ({} missing)",
        report.extracted.len(),
        archive.display(),
        report.missing.len()
    );
    Ok(())
}
