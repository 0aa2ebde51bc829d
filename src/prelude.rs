//! Prelude module for the geodata fetcher library
//!
//! Re-exports the items most integrations need, so a single
//! `use geodata_fetcher::prelude::*;` is enough for typical usage.
//!
//! # Usage
//!
//! ```rust,no_run
//! use geodata_fetcher::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let entries = load_entries(Path::new("manifest.json")).await?;
//!     let orchestrator = Orchestrator::new(
//!         OrchestratorConfig::default(),
//!         LocalLayout::new("datasets"),
//!         Arc::new(HttpFetcher::new()?),
//!         Arc::new(ProcessEngine::default()),
//!         Arc::new(TracingSink),
//!     )?;
//!     orchestrator.run_batch(&entries, false).await;
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

// Essential app components
pub use crate::app::{
    // Manifest
    find_entry,
    load_entries,
    ManifestEntry,
    ManifestStore,

    // Pipeline components
    ClientConfig,
    Fetcher,
    HttpFetcher,
    LocalLayout,
    ProcessEngine,
    TransformConfig,
    TransformEngine,

    // Canonical outputs
    load_outputs,
    Dataset,
    Schema,

    // Orchestration
    BatchSummary,
    Orchestrator,
    OrchestratorConfig,
    ResultSink,
    TracingSink,
};

pub use crate::config::AppConfig;

// Standard library re-exports that are commonly needed
pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;

pub use tokio;
