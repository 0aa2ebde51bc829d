//! Terminal progress for batch runs
//!
//! [`ProgressSink`] is a [`ResultSink`] that drives an indicatif bar over
//! the fetches of a batch and prints per-entry outcomes above it. The bar
//! grows as fetches are dispatched, so downloads already on disk never
//! count toward it. Every
//! callback is also forwarded to a [`TracingSink`] so log output is the
//! same with or without a terminal.

use std::path::Path;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::app::manifest::ManifestEntry;
use crate::app::orchestrator::{ResultSink, TracingSink};
use crate::errors::{AppError, ArchiveError, TransformError};

/// Progress bar over the fetches of one batch
pub struct ProgressSink {
    bar: ProgressBar,
    log: TracingSink,
}

impl ProgressSink {
    /// Create an empty bar; hidden when `quiet`
    pub fn new(quiet: bool) -> Self {
        let bar = ProgressBar::with_draw_target(
            Some(0),
            if quiet {
                ProgressDrawTarget::hidden()
            } else {
                ProgressDrawTarget::stderr()
            },
        );
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-");
        bar.set_style(style);
        bar.set_message("Fetching");
        bar.enable_steady_tick(Duration::from_millis(120));

        Self {
            bar,
            log: TracingSink,
        }
    }

    /// Fetches counted so far
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Fetches dispatched so far
    pub fn length(&self) -> u64 {
        self.bar.length().unwrap_or(0)
    }
}

impl ResultSink for ProgressSink {
    fn on_fetch_dispatched(&self, entry: &ManifestEntry, destination: &Path) {
        self.bar.inc_length(1);
        self.log.on_fetch_dispatched(entry, destination);
    }

    fn on_fetch_complete(&self, entry: &ManifestEntry, path: &Path) {
        self.bar.inc(1);
        self.log.on_fetch_complete(entry, path);
    }

    fn on_fetch_error(&self, entry: &ManifestEntry, path: Option<&Path>, error: &AppError) {
        // Preparation errors carry no path and count no fetch
        if path.is_some() {
            self.bar.inc(1);
        }
        self.bar.println(format!("✗ {}: {}", entry.id, error));
        self.log.on_fetch_error(entry, path, error);
    }

    fn on_extract_error(&self, entry: &ManifestEntry, archive: &Path, error: &ArchiveError) {
        self.bar.println(format!("✗ {}: {}", entry.id, error));
        self.log.on_extract_error(entry, archive, error);
    }

    fn on_entry_transformed(&self, entry: &ManifestEntry, output: &Path) {
        self.bar.set_message(format!("Transformed {}", entry.id));
        self.log.on_entry_transformed(entry, output);
    }

    fn on_entry_transform_error(
        &self,
        entry: &ManifestEntry,
        program: &Path,
        error: &TransformError,
    ) {
        self.bar.println(format!("✗ {}: {}", entry.id, error));
        self.log.on_entry_transform_error(entry, program, error);
    }

    fn on_batch_complete(&self, entries: &[ManifestEntry]) {
        self.bar
            .finish_with_message(format!("Processed {} entries", entries.len()));
        self.log.on_batch_complete(entries);
    }
}
