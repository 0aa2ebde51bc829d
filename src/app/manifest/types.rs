//! Core types for manifest processing
//!
//! A manifest is an ordered JSON array of entries, one per provider and
//! locality. Entries are immutable once loaded.

use serde::{Deserialize, Serialize};

use crate::errors::{LayoutError, LayoutResult};

/// One provider/locality dataset description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Stable identifier
    pub id: String,
    /// Dataset family (e.g., "Public Art")
    pub dataset_name: String,
    /// Country code (e.g., "CA")
    pub country: String,
    /// Province or state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    /// Region within the province
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// City
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Data provider name
    pub provider: String,
    /// Canonical schema identifier; entries without one cannot be normalized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// URL of the transform program
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converter: Option<String>,
    /// Remote resources to fetch, in order
    #[serde(default)]
    pub downloads: Vec<Download>,
}

/// One remote resource to fetch for an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Download {
    /// Source URL
    pub src: String,
    /// Text encoding of the payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    /// Archive members to extract; presence marks the payload as an archive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extract: Option<Vec<Extract>>,
}

/// One archive member selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extract {
    /// Member path inside the archive
    pub src: String,
    /// Destination path relative to the download directory
    pub dst: String,
    /// Text encoding of the member
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

impl ManifestEntry {
    /// Location components in layout order: country, then the optional
    /// province, region (only under a province) and city.
    pub fn location(&self) -> Vec<&str> {
        let mut parts = vec![self.country.as_str()];
        if let Some(province) = &self.province {
            parts.push(province);
            if let Some(region) = &self.region {
                parts.push(region);
            }
        }
        if let Some(city) = &self.city {
            parts.push(city);
        }
        parts
    }

    /// Human-readable locality, e.g. "CA/BC/Metro Vancouver/Burnaby"
    pub fn locality_label(&self) -> String {
        self.location().join("/")
    }

    /// Whether the entry carries a schema and can be normalized
    pub fn has_schema(&self) -> bool {
        self.schema.is_some()
    }

    /// Number of fetches a cold run dispatches for this entry
    pub fn fetch_count(&self) -> usize {
        self.downloads.len() + usize::from(self.converter.is_some())
    }

    /// Reject values that cannot be used as a single path component
    pub fn validate(&self) -> LayoutResult<()> {
        check_component("datasetName", &self.dataset_name)?;
        check_component("country", &self.country)?;
        check_component("provider", &self.provider)?;
        for (field, value) in [
            ("province", &self.province),
            ("region", &self.region),
            ("city", &self.city),
        ] {
            if let Some(value) = value {
                check_component(field, value)?;
            }
        }
        Ok(())
    }
}

impl Download {
    /// Whether the payload is an archive to extract from
    pub fn is_archive(&self) -> bool {
        self.extract.is_some()
    }
}

fn check_component(field: &'static str, value: &str) -> LayoutResult<()> {
    let invalid = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains('/')
        || value.contains('\\')
        || value.contains('\0');
    if invalid {
        return Err(LayoutError::InvalidComponent {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}
