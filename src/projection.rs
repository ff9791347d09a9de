use crate::error::{PosterError, Result};
use crate::model::LatLon;

/// Local metric projection centered on the poster location.
///
/// Uses the ellipsoidal meters-per-degree series at the center latitude,
/// accurate to well under a meter across the radii a poster covers.
#[derive(Debug, Clone, Copy)]
pub struct LocalProjection {
    origin: LatLon,
    lat_scale: f64,
    lon_scale: f64,
}

impl LocalProjection {
    pub fn new(origin: LatLon) -> Result<Self> {
        if !origin.lat.is_finite() || !origin.lon.is_finite() {
            return Err(PosterError::ProjectionFailed(format!(
                "non-finite center ({}, {})",
                origin.lat, origin.lon
            )));
        }
        if origin.lat.abs() >= 89.0 {
            return Err(PosterError::ProjectionFailed(format!(
                "latitude {} is too close to a pole",
                origin.lat
            )));
        }
        if origin.lon.abs() > 180.0 {
            return Err(PosterError::ProjectionFailed(format!(
                "longitude {} is out of range",
                origin.lon
            )));
        }
        Ok(Self {
            origin,
            lat_scale: meters_per_degree_lat(origin.lat),
            lon_scale: meters_per_degree_lon(origin.lat),
        })
    }

    pub fn origin(&self) -> LatLon {
        self.origin
    }

    /// Meters east and north of the origin.
    pub fn project(&self, point: LatLon) -> (f64, f64) {
        let mut dlon = point.lon - self.origin.lon;
        // Features across the antimeridian stay on the near side.
        if dlon > 180.0 {
            dlon -= 360.0;
        } else if dlon < -180.0 {
            dlon += 360.0;
        }
        (
            dlon * self.lon_scale,
            (point.lat - self.origin.lat) * self.lat_scale,
        )
    }

    /// Inverse of [`project`](Self::project), longitude wrapped into
    /// [-180, 180].
    pub fn unproject(&self, x: f64, y: f64) -> LatLon {
        LatLon {
            lat: self.origin.lat + y / self.lat_scale,
            lon: wrap_longitude(self.origin.lon + x / self.lon_scale),
        }
    }

    /// (south, west, north, east) of the square with half-size `half_m`.
    /// West exceeds east when the square crosses the antimeridian, which
    /// Overpass reads as a wrapping box.
    pub fn bbox_around(&self, half_m: f64) -> (f64, f64, f64, f64) {
        let sw = self.unproject(-half_m, -half_m);
        let ne = self.unproject(half_m, half_m);
        (sw.lat, sw.lon, ne.lat, ne.lon)
    }
}

fn wrap_longitude(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else if lon < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}

fn meters_per_degree_lat(lat_deg: f64) -> f64 {
    let lat = lat_deg.to_radians();
    111_132.92 - 559.82 * (2.0 * lat).cos() + 1.175 * (4.0 * lat).cos()
}

fn meters_per_degree_lon(lat_deg: f64) -> f64 {
    let lat = lat_deg.to_radians();
    111_412.84 * lat.cos() - 93.5 * (3.0 * lat).cos()
}
