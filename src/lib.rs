//! Geodata Fetcher Library
//!
//! Fetches open geographic datasets described by a manifest, extracts the
//! archive members each provider needs, and normalizes every provider's
//! data into one canonical file per locality through a transform program.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
