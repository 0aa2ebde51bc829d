//! Reading canonical outputs back as typed records
//!
//! After a batch, each entry's canonical output sits at
//! [`LocalLayout::output_path`]. This module loads those files under the
//! entry's schema and exposes their point features as [`Marker`]s.
//!
//! # Examples
//!
//! ```rust,no_run
//! use geodata_fetcher::app::dataset::load_outputs;
//! use geodata_fetcher::app::{load_entries, LocalLayout};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let entries = load_entries(Path::new("manifest.json")).await?;
//! for output in load_outputs(&LocalLayout::new("datasets"), &entries).await {
//!     match output.dataset {
//!         Ok(dataset) => println!("{}: {} features", output.id, dataset.feature_count()),
//!         Err(e) => println!("{}: {}", output.id, e),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod types;

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::app::layout::LocalLayout;
use crate::app::manifest::ManifestEntry;
use crate::errors::{DatasetError, DatasetResult};

pub use types::{
    AlternativeFuel, AlternativeFuelProperties, Feature, FeatureCollection, Geometry, Named,
    Position, PublicArt, PublicArtProperties,
};

/// Canonical schemas with a typed model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Schema {
    PublicArt,
    AlternativeFuel,
}

impl Schema {
    /// Manifest schema identifier
    pub fn id(&self) -> &'static str {
        match self {
            Schema::PublicArt => "public-art",
            Schema::AlternativeFuel => "alternative-fuel",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "public-art" => Some(Schema::PublicArt),
            "alternative-fuel" => Some(Schema::AlternativeFuel),
            _ => None,
        }
    }

    /// Schema of a manifest entry
    pub fn for_entry(entry: &ManifestEntry) -> DatasetResult<Self> {
        let id = entry
            .schema
            .as_deref()
            .ok_or_else(|| DatasetError::MissingSchema {
                id: entry.id.clone(),
            })?;
        Self::from_id(id).ok_or_else(|| DatasetError::UnsupportedSchema {
            schema: id.to_string(),
        })
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.id())
    }
}

/// Named point of a feature
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub name: Option<String>,
    pub position: Position,
}

/// A canonical output parsed under its schema
#[derive(Debug, Clone, PartialEq)]
pub enum Dataset {
    PublicArt(PublicArt),
    AlternativeFuel(AlternativeFuel),
}

impl Dataset {
    pub fn schema(&self) -> Schema {
        match self {
            Dataset::PublicArt(_) => Schema::PublicArt,
            Dataset::AlternativeFuel(_) => Schema::AlternativeFuel,
        }
    }

    pub fn feature_count(&self) -> usize {
        match self {
            Dataset::PublicArt(collection) => collection.features.len(),
            Dataset::AlternativeFuel(collection) => collection.features.len(),
        }
    }

    /// Features with a point position, in file order. Features without
    /// usable coordinates are left out.
    pub fn markers(&self) -> Vec<Marker> {
        match self {
            Dataset::PublicArt(collection) => markers_of(collection),
            Dataset::AlternativeFuel(collection) => markers_of(collection),
        }
    }
}

fn markers_of<P: Named>(collection: &FeatureCollection<P>) -> Vec<Marker> {
    collection
        .features
        .iter()
        .filter_map(|feature| {
            feature.position().map(|position| Marker {
                name: feature
                    .properties
                    .as_ref()
                    .and_then(|p| p.name())
                    .map(str::to_string),
                position,
            })
        })
        .collect()
}

/// Parse canonical output JSON under `schema`; `path` only labels errors
pub fn parse_dataset(json: &str, schema: Schema, path: &Path) -> DatasetResult<Dataset> {
    let parse_error = |source| DatasetError::Parse {
        path: path.to_path_buf(),
        schema: schema.id().to_string(),
        source,
    };
    let dataset = match schema {
        Schema::PublicArt => Dataset::PublicArt(serde_json::from_str(json).map_err(parse_error)?),
        Schema::AlternativeFuel => {
            Dataset::AlternativeFuel(serde_json::from_str(json).map_err(parse_error)?)
        }
    };
    Ok(dataset)
}

/// Load one canonical output file
pub async fn load_dataset(path: &Path, schema: Schema) -> DatasetResult<Dataset> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DatasetError::NotFound {
                path: path.to_path_buf(),
            })
        }
        Err(source) => {
            return Err(DatasetError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    parse_dataset(&content, schema, path)
}

/// Canonical output of one entry, loaded or not
#[derive(Debug)]
pub struct LoadedOutput {
    pub id: String,
    pub path: PathBuf,
    pub dataset: DatasetResult<Dataset>,
}

/// Load the canonical outputs of `entries`, in order.
///
/// Per-entry failures are kept in [`LoadedOutput::dataset`] so one bad file
/// does not hide the others.
pub async fn load_outputs(layout: &LocalLayout, entries: &[ManifestEntry]) -> Vec<LoadedOutput> {
    let mut outputs = Vec::with_capacity(entries.len());
    for (entry, path) in entries.iter().zip(layout.output_paths(entries)) {
        let dataset = match Schema::for_entry(entry) {
            Ok(schema) => load_dataset(&path, schema).await,
            Err(e) => Err(e),
        };
        if let Ok(dataset) = &dataset {
            debug!(
                "[{}] loaded {} features from {}",
                entry.id,
                dataset.feature_count(),
                path.display()
            );
        }
        outputs.push(LoadedOutput {
            id: entry.id.clone(),
            path,
            dataset,
        });
    }
    outputs
}
