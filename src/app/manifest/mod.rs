//! Manifest loading and lookup
//!
//! The manifest is a JSON array of [`ManifestEntry`] records. It is read once
//! per run and treated as read-only afterwards.
//!
//! # Examples
//!
//! ```rust,no_run
//! use geodata_fetcher::app::manifest::{find_entry, load_entries};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let entries = load_entries(Path::new("manifest.json")).await?;
//! println!("{} entries", entries.len());
//!
//! if let Some(entry) = find_entry("ca-bc-burnaby-art", Path::new("manifest.json")).await? {
//!     println!("{} / {}", entry.provider, entry.locality_label());
//! }
//! # Ok(())
//! # }
//! ```

pub mod types;

use std::path::Path;

use tracing::debug;

use crate::errors::{ManifestError, ManifestResult};

pub use types::{Download, Extract, ManifestEntry};

/// Load all entries from a manifest file, in manifest order
pub async fn load_entries(path: &Path) -> ManifestResult<Vec<ManifestEntry>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ManifestError::NotFound {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(ManifestError::Io(e)),
    };

    let entries = serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(entries)
}

/// Parse entries from manifest JSON already in memory
pub fn parse_entries(json: &str) -> ManifestResult<Vec<ManifestEntry>> {
    serde_json::from_str(json).map_err(|source| ManifestError::Parse {
        path: "<memory>".into(),
        source,
    })
}

/// Find the first entry with the given id
pub async fn find_entry(id: &str, path: &Path) -> ManifestResult<Option<ManifestEntry>> {
    let entries = load_entries(path).await?;
    Ok(entries.into_iter().find(|entry| entry.id == id))
}

/// Ordered, read-only collection of manifest entries
#[derive(Debug, Clone, Default)]
pub struct ManifestStore {
    entries: Vec<ManifestEntry>,
}

impl ManifestStore {
    /// Wrap already-parsed entries
    pub fn new(entries: Vec<ManifestEntry>) -> Self {
        Self { entries }
    }

    /// Load a store from a manifest file
    pub async fn open(path: &Path) -> ManifestResult<Self> {
        let entries = load_entries(path).await?;
        debug!("Loaded {} manifest entries from {}", entries.len(), path.display());
        Ok(Self::new(entries))
    }

    /// All entries in manifest order
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    /// First entry with the given id
    pub fn find(&self, id: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Entries whose ids are listed, in manifest order.
    ///
    /// An empty id list selects everything. Ids that match nothing are
    /// reported as [`ManifestError::UnknownEntries`].
    pub fn select(&self, ids: &[String]) -> ManifestResult<Vec<ManifestEntry>> {
        if ids.is_empty() {
            return Ok(self.entries.clone());
        }

        let unknown: Vec<String> = ids
            .iter()
            .filter(|id| self.find(id).is_none())
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(ManifestError::UnknownEntries { ids: unknown });
        }

        Ok(self
            .entries
            .iter()
            .filter(|entry| ids.contains(&entry.id))
            .cloned()
            .collect())
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the store, yielding its entries
    pub fn into_entries(self) -> Vec<ManifestEntry> {
        self.entries
    }
}
