//! Typed models of canonical outputs
//!
//! Every canonical schema is a GeoJSON FeatureCollection whose features
//! carry point geometries; only the feature properties differ per schema.
//! Fields are optional throughout since providers fill them unevenly.

use serde::{Deserialize, Serialize};

/// Longitude/latitude pair of a point feature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub longitude: f64,
    pub latitude: f64,
}

/// GeoJSON geometry; coordinates are `[longitude, latitude]` for points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

impl Geometry {
    /// Position of a point geometry, if it has at least two coordinates
    pub fn position(&self) -> Option<Position> {
        match self.coordinates.as_slice() {
            [longitude, latitude, ..] => Some(Position {
                longitude: *longitude,
                latitude: *latitude,
            }),
            _ => None,
        }
    }
}

/// One GeoJSON feature with schema-specific properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature<P> {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<P>,
}

impl<P> Feature<P> {
    pub fn position(&self) -> Option<Position> {
        self.geometry.as_ref().and_then(Geometry::position)
    }
}

/// GeoJSON FeatureCollection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection<P> {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub features: Vec<Feature<P>>,
}

/// Properties of a `public-art` feature
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PublicArtProperties {
    pub name: Option<String>,
    pub summary: Option<String>,
    pub short_description: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub access: Option<String>,
    /// Year of installation
    pub year: Option<i32>,
    pub medium: Option<String>,
    pub material: Option<String>,
    pub images: Vec<ArtImage>,
    pub artist: Option<Artist>,
}

/// Image credit of an art piece
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtImage {
    pub image: Option<String>,
    pub credit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Artist {
    pub name: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub biography: Option<String>,
    pub image: Option<String>,
    pub image_credit: Option<String>,
}

/// Properties of an `alternative-fuel` station
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlternativeFuelProperties {
    pub name: Option<String>,
    /// Fuel type (e.g., "ELEC", "CNG")
    #[serde(rename = "type")]
    pub fuel_type: Option<String>,
    pub address: Option<String>,
    pub access: Option<String>,
}

pub type PublicArt = FeatureCollection<PublicArtProperties>;
pub type AlternativeFuel = FeatureCollection<AlternativeFuelProperties>;

/// Properties that carry a display name
pub trait Named {
    fn name(&self) -> Option<&str>;
}

impl Named for PublicArtProperties {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl Named for AlternativeFuelProperties {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
