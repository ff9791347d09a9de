use crate::cache::{CacheKey, DiskCache};
use crate::config::NetworkConfig;
use crate::error::{PosterError, Result};
use crate::model::LatLon;
use serde::Deserialize;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Forward geocoding of a free-form place query.
pub trait Geocoder {
    fn geocode(&self, query: &str) -> Result<LatLon>;
}

impl<G: Geocoder + ?Sized> Geocoder for &G {
    fn geocode(&self, query: &str) -> Result<LatLon> {
        (**self).geocode(query)
    }
}

/// Nominatim search API client.
pub struct NominatimGeocoder {
    client: reqwest::blocking::Client,
    url: String,
    delay: Duration,
}

#[derive(Deserialize)]
struct Place {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

impl NominatimGeocoder {
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.geocode_timeout_secs))
            .build()
            .map_err(|e| PosterError::fetch("http client", e))?;
        Ok(Self {
            client,
            url: config.nominatim_url.clone(),
            delay: Duration::from_millis(config.geocode_delay_ms),
        })
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, query: &str) -> Result<LatLon> {
        let failed = |reason: String| PosterError::GeocodeFailed {
            query: query.to_string(),
            reason,
        };

        thread::sleep(self.delay);
        let response = self
            .client
            .get(&self.url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .map_err(|e| failed(format!("request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("HTTP {status}")));
        }
        let places: Vec<Place> = response
            .json()
            .map_err(|e| failed(format!("invalid response: {e}")))?;
        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| failed("no matching place".to_string()))?;
        let point = parse_place(&place).map_err(failed)?;
        if let Some(name) = &place.display_name {
            info!("found: {name}");
        }
        Ok(point)
    }
}

fn parse_place(place: &Place) -> std::result::Result<LatLon, String> {
    let lat: f64 = place
        .lat
        .trim()
        .parse()
        .map_err(|_| format!("bad latitude '{}'", place.lat))?;
    let lon: f64 = place
        .lon
        .trim()
        .parse()
        .map_err(|_| format!("bad longitude '{}'", place.lon))?;
    Ok(LatLon::new(lat, lon))
}

/// Looks up `city, country`, consulting the coordinate cache first.
pub fn resolve_coordinates<G: Geocoder>(
    geocoder: &G,
    cache: &DiskCache,
    city: &str,
    country: &str,
) -> Result<LatLon> {
    let key = CacheKey::coordinates(city, country);
    if let Some(point) = cache.get::<LatLon>(&key)? {
        info!("using cached coordinates for {city}, {country}");
        return Ok(point);
    }

    info!("looking up coordinates for {city}, {country}");
    let point = geocoder.geocode(&format!("{city}, {country}"))?;
    debug!(lat = point.lat, lon = point.lon, "geocoded");
    if let Err(err) = cache.set(&key, &point) {
        warn!("failed to cache coordinates: {err}");
    }
    Ok(point)
}
