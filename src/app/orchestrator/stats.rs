//! Batch run summary

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Counts collected over one `run_batch` call
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub entries: usize,
    /// Entries whose directories could not be prepared
    pub skipped_entries: usize,
    pub dispatched: usize,
    pub completed: usize,
    pub fetch_failures: usize,
    pub extract_failures: usize,
    pub transformed: usize,
    pub transform_failures: usize,
}

impl BatchSummary {
    pub(crate) fn new(started_at: DateTime<Utc>, entries: usize) -> Self {
        Self {
            started_at,
            duration: Duration::ZERO,
            entries,
            skipped_entries: 0,
            dispatched: 0,
            completed: 0,
            fetch_failures: 0,
            extract_failures: 0,
            transformed: 0,
            transform_failures: 0,
        }
    }

    /// Whether every fetch, extraction and transform succeeded
    pub fn is_clean(&self) -> bool {
        self.skipped_entries == 0
            && self.fetch_failures == 0
            && self.extract_failures == 0
            && self.transform_failures == 0
    }

    /// Fetches per second over the whole run
    pub fn fetch_rate(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.completed as f64 / secs
        } else {
            0.0
        }
    }
}
