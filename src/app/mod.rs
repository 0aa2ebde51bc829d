//! Core application logic for the geodata fetcher
//!
//! This module contains the pipeline components: manifest loading, the
//! local layout, the fetch client, archive extraction, the transform
//! invoker, the batch orchestrator that ties them together, and typed
//! reading of the canonical outputs it produces.
//!
//! # Examples
//!
//! ```rust,no_run
//! use geodata_fetcher::app::{load_entries, LocalLayout};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let layout = LocalLayout::new("datasets");
//! for entry in load_entries(Path::new("manifest.json")).await? {
//!     println!("{} -> {}", entry.id, layout.output_path(&entry).display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod client;
pub mod dataset;
pub mod layout;
pub mod manifest;
pub mod orchestrator;
pub mod transform;

// Re-export main public API
pub use archive::{ArchiveExtractor, ExtractInstruction, ExtractReport};
pub use client::{ClientConfig, Fetcher, HttpFetcher};
pub use dataset::{load_dataset, load_outputs, Dataset, LoadedOutput, Marker, Schema};
pub use layout::LocalLayout;
pub use manifest::{
    find_entry, load_entries, parse_entries, Download, Extract, ManifestEntry, ManifestStore,
};
pub use orchestrator::{
    BatchSummary, FanInBarrier, Orchestrator, OrchestratorConfig, ResultSink, RunState,
    TracingSink,
};
pub use transform::{
    LoadedProgram, ProcessEngine, TransformConfig, TransformEngine, TransformInvoker,
};
