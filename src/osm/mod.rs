//! OpenStreetMap data access.
//!
//! [`FeatureSource`] is the seam between the poster pipeline and wherever the
//! data comes from: [`OverpassClient`] queries a live Overpass endpoint and
//! [`CachedSource`] memoizes any source on disk.

mod cached;
mod overpass;

pub use cached::CachedSource;
pub use overpass::{OverpassClient, parse_response};

use crate::error::Result;
use crate::model::{FeatureCollection, LatLon, MapData};
use tracing::info;

/// How a tag value is matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagMatch {
    Any,
    Exact(&'static str),
    OneOf(&'static [&'static str]),
}

/// Feature layers fetched for a poster, each with its fixed tag filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureLayer {
    Coastline,
    Maritime,
    LandCover,
    Buildings,
    Railways,
    Parks,
    Water,
}

impl FeatureLayer {
    pub fn name(self) -> &'static str {
        match self {
            FeatureLayer::Coastline => "coastline",
            FeatureLayer::Maritime => "maritime_boundaries",
            FeatureLayer::LandCover => "landuse",
            FeatureLayer::Buildings => "buildings",
            FeatureLayer::Railways => "railways",
            FeatureLayer::Parks => "parks",
            FeatureLayer::Water => "water",
        }
    }

    /// Features matching any of these (key, value) pairs belong to the layer.
    pub fn tags(self) -> &'static [(&'static str, TagMatch)] {
        match self {
            FeatureLayer::Coastline => &[("natural", TagMatch::Exact("coastline"))],
            FeatureLayer::Maritime => &[("boundary", TagMatch::Exact("maritime"))],
            FeatureLayer::LandCover => &[
                ("landuse", TagMatch::Any),
                (
                    "natural",
                    TagMatch::OneOf(&[
                        "scrub",
                        "grassland",
                        "wood",
                        "heath",
                        "sand",
                        "beach",
                        "bare_rock",
                        "scree",
                        "shingle",
                        "fell",
                    ]),
                ),
                ("place", TagMatch::OneOf(&["island"])),
                ("leisure", TagMatch::Any),
            ],
            FeatureLayer::Buildings => &[("building", TagMatch::Any)],
            FeatureLayer::Railways => &[(
                "railway",
                TagMatch::OneOf(&["rail", "subway", "light_rail", "tram", "narrow_gauge"]),
            )],
            FeatureLayer::Parks => &[
                ("leisure", TagMatch::Exact("park")),
                ("landuse", TagMatch::Exact("grass")),
            ],
            // Inland water only: sea, ocean, bay and strait polygons flood
            // untagged land, so they are left to the marine layer.
            FeatureLayer::Water => &[
                ("natural", TagMatch::Exact("water")),
                ("waterway", TagMatch::Exact("riverbank")),
                (
                    "water",
                    TagMatch::OneOf(&["lake", "river", "pond", "reservoir", "lagoon", "canal"]),
                ),
            ],
        }
    }

    pub fn tag_keys(self) -> Vec<&'static str> {
        self.tags().iter().map(|(key, _)| *key).collect()
    }
}

/// Where street networks and feature layers come from.
pub trait FeatureSource {
    /// Drivable, walkable and cyclable ways within the square of half-size
    /// `radius_m` around `center`.
    fn street_network(&self, center: LatLon, radius_m: u32) -> Result<FeatureCollection>;

    fn features(
        &self,
        center: LatLon,
        radius_m: u32,
        layer: FeatureLayer,
    ) -> Result<FeatureCollection>;
}

impl<S: FeatureSource + ?Sized> FeatureSource for &S {
    fn street_network(&self, center: LatLon, radius_m: u32) -> Result<FeatureCollection> {
        (**self).street_network(center, radius_m)
    }

    fn features(
        &self,
        center: LatLon,
        radius_m: u32,
        layer: FeatureLayer,
    ) -> Result<FeatureCollection> {
        (**self).features(center, radius_m, layer)
    }
}

/// Fetches every layer a poster needs. Any failure aborts the whole fetch.
pub fn fetch_map_data<S: FeatureSource>(
    source: &S,
    center: LatLon,
    radius_m: u32,
) -> Result<MapData> {
    info!(
        lat = center.lat,
        lon = center.lon,
        radius_m,
        "downloading street network"
    );
    let streets = source.street_network(center, radius_m)?;

    let fetch = |layer: FeatureLayer| {
        info!("downloading {}", layer.name());
        source.features(center, radius_m, layer)
    };
    let land_cover = fetch(FeatureLayer::LandCover)?;
    let water = fetch(FeatureLayer::Water)?;
    let parks = fetch(FeatureLayer::Parks)?;
    let railways = fetch(FeatureLayer::Railways)?;
    let buildings = fetch(FeatureLayer::Buildings)?;
    let coastline = fetch(FeatureLayer::Coastline)?;
    // Maritime boundaries only matter near a coast.
    let maritime = if coastline.is_empty() {
        FeatureCollection::default()
    } else {
        fetch(FeatureLayer::Maritime)?
    };

    info!(
        streets = streets.len(),
        water = water.len(),
        parks = parks.len(),
        buildings = buildings.len(),
        "all data retrieved"
    );
    Ok(MapData {
        streets,
        coastline,
        maritime,
        land_cover,
        buildings,
        railways,
        parks,
        water,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Feature, Geometry};
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    struct Recording {
        calls: RefCell<Vec<&'static str>>,
        coastal: bool,
    }

    impl FeatureSource for Recording {
        fn street_network(&self, _: LatLon, _: u32) -> Result<FeatureCollection> {
            self.calls.borrow_mut().push("streets");
            Ok(FeatureCollection::default())
        }

        fn features(&self, _: LatLon, _: u32, layer: FeatureLayer) -> Result<FeatureCollection> {
            self.calls.borrow_mut().push(layer.name());
            if layer == FeatureLayer::Coastline && self.coastal {
                return Ok(FeatureCollection::new(vec![Feature {
                    id: 1,
                    geometry: Geometry::LineString {
                        points: vec![LatLon::new(0.0, 0.0), LatLon::new(0.0, 0.01)],
                    },
                    tags: BTreeMap::new(),
                }]));
            }
            Ok(FeatureCollection::default())
        }
    }

    #[test]
    fn maritime_only_fetched_near_coast() {
        let inland = Recording {
            calls: RefCell::new(Vec::new()),
            coastal: false,
        };
        fetch_map_data(&inland, LatLon::new(0.0, 0.0), 1000).unwrap();
        assert!(!inland.calls.borrow().contains(&"maritime_boundaries"));
        assert_eq!(inland.calls.borrow()[0], "streets");

        let coastal = Recording {
            calls: RefCell::new(Vec::new()),
            coastal: true,
        };
        let data = fetch_map_data(&coastal, LatLon::new(0.0, 0.0), 1000).unwrap();
        assert!(coastal.calls.borrow().contains(&"maritime_boundaries"));
        assert_eq!(data.coastline.len(), 1);
    }

    #[test]
    fn layer_tag_keys() {
        assert_eq!(FeatureLayer::Parks.tag_keys(), vec!["leisure", "landuse"]);
        assert_eq!(
            FeatureLayer::Water.tag_keys(),
            vec!["natural", "waterway", "water"]
        );
    }
}
