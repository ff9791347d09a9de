use super::{FeatureLayer, FeatureSource, TagMatch};
use crate::config::NetworkConfig;
use crate::error::{PosterError, Result};
use crate::model::{Feature, FeatureCollection, Geometry, LatLon};
use crate::projection::LocalProjection;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Highway values that are not part of any traversable network.
const EXCLUDED_HIGHWAYS: &str =
    "abandoned|bus_guideway|construction|corridor|elevator|escalator|no|planned|platform|proposed|raceway|razed";

/// Live Overpass API source.
pub struct OverpassClient {
    client: reqwest::blocking::Client,
    endpoints: Vec<String>,
    timeout_secs: u64,
    street_delay: Duration,
    feature_delay: Duration,
}

impl OverpassClient {
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PosterError::fetch("http client", e))?;
        Ok(Self {
            client,
            endpoints: config.overpass_urls.clone(),
            timeout_secs: config.timeout_secs,
            street_delay: Duration::from_millis(config.street_delay_ms),
            feature_delay: Duration::from_millis(config.feature_delay_ms),
        })
    }

    fn request(&self, what: &str, query: &str) -> Result<String> {
        let mut errors = Vec::new();
        for url in &self.endpoints {
            debug!(url = %url, what, "overpass request");
            let response = match self.client.post(url).form(&[("data", query)]).send() {
                Ok(response) => response,
                Err(e) => {
                    errors.push(format!("{url}: request failed: {e}"));
                    continue;
                }
            };

            let status = response.status();
            let body = match response.text() {
                Ok(body) => body,
                Err(e) => {
                    errors.push(format!("{url}: response read failed: {e}"));
                    continue;
                }
            };

            if status.is_success() {
                return Ok(body);
            }

            let snippet: String = body.chars().take(256).collect();
            warn!(url = %url, %status, "overpass endpoint failed");
            errors.push(format!("{url}: HTTP {status}: {snippet}"));
        }

        if errors.is_empty() {
            errors.push("no overpass endpoints configured".to_string());
        }
        Err(PosterError::fetch(
            what,
            format!("all overpass endpoints failed: {}", errors.join(" | ")),
        ))
    }

    fn bbox(center: LatLon, radius_m: u32) -> Result<(f64, f64, f64, f64)> {
        Ok(LocalProjection::new(center)?.bbox_around(radius_m as f64))
    }
}

impl FeatureSource for OverpassClient {
    fn street_network(&self, center: LatLon, radius_m: u32) -> Result<FeatureCollection> {
        let query = street_query(Self::bbox(center, radius_m)?, self.timeout_secs);
        let body = self.request("street network", &query)?;
        let streets = parse_response(&body)?;
        thread::sleep(self.street_delay);
        Ok(streets)
    }

    fn features(
        &self,
        center: LatLon,
        radius_m: u32,
        layer: FeatureLayer,
    ) -> Result<FeatureCollection> {
        let query = feature_query(Self::bbox(center, radius_m)?, layer, self.timeout_secs);
        let body = self.request(layer.name(), &query)?;
        let features = parse_response(&body)?;
        thread::sleep(self.feature_delay);
        Ok(features)
    }
}

fn bbox_clause((south, west, north, east): (f64, f64, f64, f64)) -> String {
    format!("({south:.7},{west:.7},{north:.7},{east:.7})")
}

pub(crate) fn street_query(bbox: (f64, f64, f64, f64), timeout_secs: u64) -> String {
    format!(
        "[out:json][timeout:{timeout_secs}];\
         way[\"highway\"][\"area\"!~\"yes\"][\"highway\"!~\"^({EXCLUDED_HIGHWAYS})$\"]{};\
         out geom;",
        bbox_clause(bbox)
    )
}

pub(crate) fn feature_query(
    bbox: (f64, f64, f64, f64),
    layer: FeatureLayer,
    timeout_secs: u64,
) -> String {
    let area = bbox_clause(bbox);
    let mut query = format!("[out:json][timeout:{timeout_secs}];(");
    for (key, matcher) in layer.tags() {
        let filter = match matcher {
            TagMatch::Any => format!("[\"{key}\"]"),
            TagMatch::Exact(value) => format!("[\"{key}\"=\"{value}\"]"),
            TagMatch::OneOf(values) => format!("[\"{key}\"~\"^({})$\"]", values.join("|")),
        };
        query.push_str(&format!("nwr{filter}{area};"));
    }
    query.push_str(");out geom;");
    query
}

#[derive(Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
    remark: Option<String>,
}

#[derive(Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    element_type: String,
    id: i64,
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    geometry: Vec<Option<Coord>>,
    #[serde(default)]
    members: Vec<OverpassMember>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct OverpassMember {
    #[serde(rename = "type")]
    member_type: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    geometry: Vec<Option<Coord>>,
}

#[derive(Deserialize, Clone, Copy)]
struct Coord {
    lat: f64,
    lon: f64,
}

fn coords(geometry: &[Option<Coord>]) -> Vec<LatLon> {
    geometry
        .iter()
        .flatten()
        .map(|c| LatLon::new(c.lat, c.lon))
        .collect()
}

/// Converts an Overpass `out geom` JSON response into features.
///
/// Closed ways with area semantics become polygons, other ways line strings,
/// and multipolygon/boundary relations are stitched into polygons with holes.
pub fn parse_response(body: &str) -> Result<FeatureCollection> {
    let parsed: OverpassResponse = serde_json::from_str(body)
        .map_err(|e| PosterError::fetch("overpass response", format!("invalid JSON: {e}")))?;
    if let Some(remark) = &parsed.remark
        && remark.contains("error")
    {
        return Err(PosterError::fetch("overpass response", remark));
    }

    let mut features = Vec::new();
    for element in parsed.elements {
        match element.element_type.as_str() {
            "node" => {
                if let (Some(lat), Some(lon)) = (element.lat, element.lon) {
                    features.push(Feature {
                        id: element.id,
                        geometry: Geometry::Point {
                            at: LatLon::new(lat, lon),
                        },
                        tags: element.tags,
                    });
                }
            }
            "way" => {
                let points = coords(&element.geometry);
                if let Some(geometry) = way_geometry(points, &element.tags) {
                    features.push(Feature {
                        id: element.id,
                        geometry,
                        tags: element.tags,
                    });
                }
            }
            "relation" => {
                let kind = element.tags.get("type").map(String::as_str);
                if !matches!(kind, Some("multipolygon" | "boundary")) {
                    continue;
                }
                for geometry in relation_polygons(&element.members) {
                    features.push(Feature {
                        id: element.id,
                        geometry,
                        tags: element.tags.clone(),
                    });
                }
            }
            _ => {}
        }
    }
    Ok(FeatureCollection::new(features))
}

fn way_geometry(points: Vec<LatLon>, tags: &BTreeMap<String, String>) -> Option<Geometry> {
    if points.len() < 2 {
        return None;
    }
    if is_closed(&points) && points.len() >= 4 && is_area(tags) {
        return Some(Geometry::Polygon {
            exterior: points,
            holes: Vec::new(),
        });
    }
    Some(Geometry::LineString { points })
}

fn is_area(tags: &BTreeMap<String, String>) -> bool {
    match tags.get("area").map(String::as_str) {
        Some("yes") => return true,
        Some("no") => return false,
        _ => {}
    }
    if tags.get("natural").map(String::as_str) == Some("coastline") {
        return false;
    }
    !["highway", "railway", "barrier"]
        .iter()
        .any(|key| tags.contains_key(*key))
}

fn is_closed(points: &[LatLon]) -> bool {
    points.len() > 2 && points.first() == points.last()
}

fn relation_polygons(members: &[OverpassMember]) -> Vec<Geometry> {
    let mut outer = Vec::new();
    let mut inner = Vec::new();
    for member in members.iter().filter(|m| m.member_type == "way") {
        let points = coords(&member.geometry);
        match member.role.as_str() {
            "inner" => inner.push(points),
            "outer" | "" => outer.push(points),
            _ => {}
        }
    }

    let outers = assemble_rings(outer);
    let mut holes_by_outer: Vec<Vec<Vec<LatLon>>> = vec![Vec::new(); outers.len()];
    for hole in assemble_rings(inner) {
        let Some(vertex) = hole.first().copied() else {
            continue;
        };
        if let Some(idx) = outers.iter().position(|ring| point_in_ring(vertex, ring)) {
            holes_by_outer[idx].push(hole);
        }
    }

    outers
        .into_iter()
        .zip(holes_by_outer)
        .map(|(exterior, holes)| Geometry::Polygon { exterior, holes })
        .collect()
}

/// Joins way segments end to end into closed rings. Segments that never
/// close are dropped.
pub(crate) fn assemble_rings(segments: Vec<Vec<LatLon>>) -> Vec<Vec<LatLon>> {
    let mut rings = Vec::new();
    let mut open = Vec::new();
    for segment in segments {
        if segment.len() < 2 {
            continue;
        }
        if is_closed(&segment) {
            if segment.len() >= 4 {
                rings.push(segment);
            }
        } else {
            open.push(segment);
        }
    }

    while let Some(mut current) = open.pop() {
        loop {
            if is_closed(&current) {
                if current.len() >= 4 {
                    rings.push(current);
                }
                break;
            }
            let Some(end) = current.last().copied() else {
                break;
            };
            let next = open
                .iter()
                .position(|s| s.first() == Some(&end) || s.last() == Some(&end));
            let Some(idx) = next else {
                break;
            };
            let mut next = open.swap_remove(idx);
            if next.first() != Some(&end) {
                next.reverse();
            }
            current.extend(next.into_iter().skip(1));
        }
    }
    rings
}

fn point_in_ring(point: LatLon, ring: &[LatLon]) -> bool {
    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.lat > point.lat) != (b.lat > point.lat)
            && point.lon < (b.lon - a.lon) * (point.lat - a.lat) / (b.lat - a.lat) + a.lon
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}
