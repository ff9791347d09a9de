use crate::error::{PosterError, Result};
use crate::model::LatLon;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Composite cache key: what was fetched, where, and how far around it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    kind: String,
    location: String,
    radius_m: Option<u32>,
    suffix: Option<String>,
}

impl CacheKey {
    pub fn coordinates(city: &str, country: &str) -> Self {
        Self {
            kind: "coords".to_string(),
            location: format!("{}_{}", city.to_lowercase(), country.to_lowercase()),
            radius_m: None,
            suffix: None,
        }
    }

    pub fn layer(kind: &str, center: LatLon, radius_m: u32, tag_keys: &[&str]) -> Self {
        Self {
            kind: kind.to_string(),
            location: format!("{}_{}", center.lat, center.lon),
            radius_m: Some(radius_m),
            suffix: (!tag_keys.is_empty()).then(|| tag_keys.join("_")),
        }
    }

    fn file_name(&self) -> String {
        let safe: String = self
            .to_string()
            .chars()
            .map(|c| if std::path::is_separator(c) { '_' } else { c })
            .collect();
        format!("{safe}.json")
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.kind, self.location)?;
        if let Some(radius) = self.radius_m {
            write!(f, "_{radius}")?;
        }
        if let Some(suffix) = &self.suffix {
            write!(f, "_{suffix}")?;
        }
        Ok(())
    }
}

/// Flat key → JSON file store. No eviction, no locking: one writer at a time.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Result<Option<T>> {
        let path = self.path_for(key);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(PosterError::CacheCorrupt {
                    path,
                    reason: err.to_string(),
                });
            }
        };
        let value = serde_json::from_slice(&bytes).map_err(|err| PosterError::CacheCorrupt {
            path: path.clone(),
            reason: err.to_string(),
        })?;
        debug!(key = %key, "cache hit");
        Ok(Some(value))
    }

    pub fn set<T: Serialize>(&self, key: &CacheKey, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let bytes = serde_json::to_vec(value).map_err(std::io::Error::other)?;
        std::fs::write(self.path_for(key), bytes)?;
        debug!(key = %key, "cache write");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Feature, FeatureCollection, Geometry};
    use std::collections::BTreeMap;

    fn sample_collection() -> FeatureCollection {
        let mut tags = BTreeMap::new();
        tags.insert("leisure".to_string(), "park".to_string());
        tags.insert("name".to_string(), "Parc Güell".to_string());
        FeatureCollection::new(vec![
            Feature {
                id: 7,
                geometry: Geometry::Polygon {
                    exterior: vec![
                        LatLon::new(41.4145, 2.1527),
                        LatLon::new(41.4150, 2.1531),
                        LatLon::new(41.4147, 2.1540),
                        LatLon::new(41.4145, 2.1527),
                    ],
                    holes: vec![],
                },
                tags,
            },
            Feature {
                id: -3,
                geometry: Geometry::LineString {
                    points: vec![
                        LatLon::new(0.1 + 0.2, -0.3),
                        LatLon::new(1e-12, 179.999_999_9),
                    ],
                },
                tags: BTreeMap::new(),
            },
        ])
    }

    #[test]
    fn round_trips_feature_collections() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path().join("nested"));
        let center = LatLon::new(41.4, 2.15);
        let key = CacheKey::layer("parks", center, 3000, &["leisure", "landuse"]);
        let value = sample_collection();
        cache.set(&key, &value).unwrap();
        let restored: Option<FeatureCollection> = cache.get(&key).unwrap();
        assert_eq!(restored, Some(value));
    }

    #[test]
    fn missing_entry_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());
        let key = CacheKey::coordinates("Paris", "France");
        let got: Option<LatLon> = cache.get(&key).unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn set_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());
        let key = CacheKey::coordinates("Paris", "France");
        cache.set(&key, &LatLon::new(1.0, 2.0)).unwrap();
        cache.set(&key, &LatLon::new(48.8566, 2.3522)).unwrap();
        let got: Option<LatLon> = cache.get(&key).unwrap();
        assert_eq!(got, Some(LatLon::new(48.8566, 2.3522)));
    }

    #[test]
    fn truncated_entry_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());
        let key = CacheKey::coordinates("Rome", "Italy");
        std::fs::write(cache.path_for(&key), b"{\"lat\": 41.9").unwrap();
        let got = cache.get::<LatLon>(&key);
        assert!(matches!(got, Err(PosterError::CacheCorrupt { .. })));
    }

    #[test]
    fn key_formats() {
        let coords = CacheKey::coordinates("New York", "USA");
        assert_eq!(coords.to_string(), "coords_new york_usa");
        let water = CacheKey::layer(
            "water",
            LatLon::new(52.37, 4.89),
            6000,
            &["natural", "waterway"],
        );
        assert_eq!(water.to_string(), "water_52.37_4.89_6000_natural_waterway");
        let graph = CacheKey::layer("graph", LatLon::new(1.5, -2.0), 100, &[]);
        assert_eq!(graph.to_string(), "graph_1.5_-2_100");
        let key = CacheKey::coordinates("a/b", "c");
        assert_eq!(key.file_name(), "coords_a_b_c.json");
    }
}
