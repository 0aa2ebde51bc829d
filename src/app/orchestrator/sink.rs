//! Result notifications emitted during a batch run

use std::path::Path;

use tracing::{error, info, warn};

use crate::app::manifest::ManifestEntry;
use crate::errors::{AppError, ArchiveError, TransformError};

/// Receives per-file and per-entry progress of a batch run.
///
/// Fetch and extract callbacks may arrive from several tasks at once and in
/// any order. Transform callbacks arrive sequentially, and
/// `on_batch_complete` is called exactly once per run, last.
pub trait ResultSink: Send + Sync {
    /// A fetch to `destination` was dispatched. Called from the batch
    /// driver before the fetch task starts; skipped downloads are never
    /// announced.
    fn on_fetch_dispatched(&self, _entry: &ManifestEntry, _destination: &Path) {}

    /// A fetch finished successfully
    fn on_fetch_complete(&self, _entry: &ManifestEntry, _path: &Path) {}

    /// A fetch failed, or an entry's directories could not be prepared
    /// (`path` is `None` in that case)
    fn on_fetch_error(&self, entry: &ManifestEntry, path: Option<&Path>, error: &AppError);

    /// An archive could not be opened or extracted
    fn on_extract_error(&self, entry: &ManifestEntry, archive: &Path, error: &ArchiveError);

    /// The entry's canonical output was written
    fn on_entry_transformed(&self, entry: &ManifestEntry, output: &Path);

    /// The entry could not be normalized
    fn on_entry_transform_error(
        &self,
        entry: &ManifestEntry,
        program: &Path,
        error: &TransformError,
    );

    /// The batch is over
    fn on_batch_complete(&self, entries: &[ManifestEntry]);
}

/// Sink that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ResultSink for TracingSink {
    fn on_fetch_complete(&self, entry: &ManifestEntry, path: &Path) {
        tracing::debug!("[{}] fetched {}", entry.id, path.display());
    }

    fn on_fetch_error(&self, entry: &ManifestEntry, path: Option<&Path>, error: &AppError) {
        match path {
            Some(path) => warn!("[{}] fetch of {} failed: {}", entry.id, path.display(), error),
            None => warn!("[{}] could not prepare entry: {}", entry.id, error),
        }
    }

    fn on_extract_error(&self, entry: &ManifestEntry, archive: &Path, error: &ArchiveError) {
        warn!(
            "[{}] extraction from {} failed: {}",
            entry.id,
            archive.display(),
            error
        );
    }

    fn on_entry_transformed(&self, entry: &ManifestEntry, output: &Path) {
        info!("[{}] wrote {}", entry.id, output.display());
    }

    fn on_entry_transform_error(
        &self,
        entry: &ManifestEntry,
        program: &Path,
        error: &TransformError,
    ) {
        error!(
            "[{}] transform with {} failed: {}",
            entry.id,
            program.display(),
            error
        );
    }

    fn on_batch_complete(&self, entries: &[ManifestEntry]) {
        info!("Batch of {} entries complete", entries.len());
    }
}
