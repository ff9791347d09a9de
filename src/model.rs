use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A resolved poster location. `city` and `country` are the names drawn on
/// the poster, already resolved from any display overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub point: LatLon,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    Point { at: LatLon },
    LineString { points: Vec<LatLon> },
    Polygon {
        exterior: Vec<LatLon>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        holes: Vec<Vec<LatLon>>,
    },
}

impl Geometry {
    pub fn is_polygon(&self) -> bool {
        matches!(self, Geometry::Polygon { .. })
    }

    pub fn is_line(&self) -> bool {
        matches!(self, Geometry::LineString { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: i64,
    pub geometry: Geometry,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl Feature {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// Immutable, ordered set of tagged geometries as returned by the fetch layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn polygons(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter().filter(|f| f.geometry.is_polygon())
    }

    pub fn lines(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter().filter(|f| f.geometry.is_line())
    }
}

/// All map layers needed to draw one poster.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapData {
    pub streets: FeatureCollection,
    pub coastline: FeatureCollection,
    pub maritime: FeatureCollection,
    pub land_cover: FeatureCollection,
    pub buildings: FeatureCollection,
    pub railways: FeatureCollection,
    pub parks: FeatureCollection,
    pub water: FeatureCollection,
}

/// Everything that determines one rendered poster, given the map data.
#[derive(Debug, Clone, PartialEq)]
pub struct PosterSpec {
    pub location: Location,
    pub radius_m: u32,
    /// Physical size in inches.
    pub width: f32,
    pub height: f32,
    pub theme: String,
    pub format: crate::render::OutputFormat,
    /// Fraction of the poster height covered by each fade, 0.0..=0.5.
    pub gradient_height: f32,
}

impl PosterSpec {
    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }
}
