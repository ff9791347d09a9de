use super::{FeatureLayer, FeatureSource};
use crate::cache::{CacheKey, DiskCache};
use crate::error::Result;
use crate::model::{FeatureCollection, LatLon};
use tracing::{info, warn};

/// Serves layers from a [`DiskCache`] and only asks `inner` on a miss.
pub struct CachedSource<S> {
    inner: S,
    cache: DiskCache,
}

impl<S: FeatureSource> CachedSource<S> {
    pub fn new(inner: S, cache: DiskCache) -> Self {
        Self { inner, cache }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn get_or_fetch(
        &self,
        key: CacheKey,
        fetch: impl FnOnce(&S) -> Result<FeatureCollection>,
    ) -> Result<FeatureCollection> {
        if let Some(cached) = self.cache.get::<FeatureCollection>(&key)? {
            info!(key = %key, "using cached data");
            return Ok(cached);
        }
        let fresh = fetch(&self.inner)?;
        if let Err(err) = self.cache.set(&key, &fresh) {
            warn!(key = %key, "failed to write cache entry: {err}");
        }
        Ok(fresh)
    }
}

impl<S: FeatureSource> FeatureSource for CachedSource<S> {
    fn street_network(&self, center: LatLon, radius_m: u32) -> Result<FeatureCollection> {
        let key = CacheKey::layer("graph", center, radius_m, &[]);
        self.get_or_fetch(key, |inner| inner.street_network(center, radius_m))
    }

    fn features(
        &self,
        center: LatLon,
        radius_m: u32,
        layer: FeatureLayer,
    ) -> Result<FeatureCollection> {
        let key = CacheKey::layer(layer.name(), center, radius_m, &layer.tag_keys());
        self.get_or_fetch(key, |inner| inner.features(center, radius_m, layer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PosterError;
    use crate::model::{Feature, Geometry};
    use std::cell::Cell;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct Counting {
        calls: Cell<usize>,
    }

    impl FeatureSource for Counting {
        fn street_network(&self, center: LatLon, _: u32) -> Result<FeatureCollection> {
            self.calls.set(self.calls.get() + 1);
            Ok(FeatureCollection::new(vec![Feature {
                id: 1,
                geometry: Geometry::LineString {
                    points: vec![center, LatLon::new(center.lat + 0.001, center.lon)],
                },
                tags: BTreeMap::from([("highway".to_string(), "primary".to_string())]),
            }]))
        }

        fn features(&self, _: LatLon, _: u32, layer: FeatureLayer) -> Result<FeatureCollection> {
            self.calls.set(self.calls.get() + 1);
            if layer == FeatureLayer::Railways {
                return Err(PosterError::fetch("railways", "offline"));
            }
            Ok(FeatureCollection::default())
        }
    }

    #[test]
    fn second_request_is_served_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let source = CachedSource::new(Counting::default(), DiskCache::new(dir.path()));
        let center = LatLon::new(45.0, 7.5);

        let first = source.street_network(center, 2000).unwrap();
        let second = source.street_network(center, 2000).unwrap();
        assert_eq!(first, second);
        assert_eq!(source.inner().calls.get(), 1);

        source.street_network(center, 2500).unwrap();
        assert_eq!(source.inner().calls.get(), 2);
        assert!(dir.path().join("graph_45_7.5_2000.json").is_file());
    }

    #[test]
    fn failures_are_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let source = CachedSource::new(Counting::default(), DiskCache::new(dir.path()));
        let center = LatLon::new(45.0, 7.5);
        let layer = FeatureLayer::Railways;
        assert!(source.features(center, 1000, layer).is_err());
        assert!(source.features(center, 1000, layer).is_err());
        assert_eq!(source.inner().calls.get(), 2);
    }

    #[test]
    fn corrupt_entry_surfaces() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path());
        let center = LatLon::new(45.0, 7.5);
        let layer = FeatureLayer::Parks;
        let key = CacheKey::layer(layer.name(), center, 1000, &layer.tag_keys());
        std::fs::write(cache.path_for(&key), "not json").unwrap();
        let source = CachedSource::new(Counting::default(), cache);
        let err = source.features(center, 1000, layer).unwrap_err();
        assert!(matches!(err, PosterError::CacheCorrupt { .. }));
        assert_eq!(source.inner().calls.get(), 0);
    }
}
