use crate::error::{PosterError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static ALLOWED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^[\s\d.,+\-°º'′’"″:NSEWnsew]+$"#).unwrap());
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[+-]?\d+(?:[.,]\d+)?").unwrap());
static HEMISPHERE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[NSEWnsew]").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Latitude,
    Longitude,
}

/// Parses a latitude written as decimal degrees or degrees/minutes/seconds,
/// e.g. `40.776676`, `-33.86`, `40°46'36.0"N`, `40 46 36 N`.
pub fn parse_latitude(input: &str) -> Result<f64> {
    parse_axis(input, Axis::Latitude)
}

/// Longitude counterpart of [`parse_latitude`].
pub fn parse_longitude(input: &str) -> Result<f64> {
    parse_axis(input, Axis::Longitude)
}

fn parse_axis(input: &str, axis: Axis) -> Result<f64> {
    let invalid = |reason: &str| PosterError::InvalidCoordinate {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = input.trim();
    if trimmed.is_empty() || !ALLOWED_RE.is_match(trimmed) {
        return Err(invalid("unrecognized characters"));
    }

    let hemispheres: Vec<char> = HEMISPHERE_RE
        .find_iter(trimmed)
        .filter_map(|m| m.as_str().chars().next())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if hemispheres.len() > 1 {
        return Err(invalid("more than one hemisphere letter"));
    }
    let hemisphere = hemispheres.first().copied();
    match (axis, hemisphere) {
        (Axis::Latitude, Some('E' | 'W')) => return Err(invalid("E/W given for a latitude")),
        (Axis::Longitude, Some('N' | 'S')) => return Err(invalid("N/S given for a longitude")),
        _ => {}
    }

    let parts: Vec<&str> = NUMBER_RE.find_iter(trimmed).map(|m| m.as_str()).collect();
    if parts.is_empty() || parts.len() > 3 {
        return Err(invalid("expected degrees, minutes and seconds at most"));
    }
    let mut values = Vec::with_capacity(parts.len());
    for part in &parts {
        let value: f64 = part
            .replace(',', ".")
            .parse()
            .map_err(|_| invalid("malformed number"))?;
        values.push(value);
    }
    if values[1..].iter().any(|v| *v < 0.0 || *v >= 60.0) {
        return Err(invalid("minutes and seconds must be within 0..60"));
    }

    let degrees = values[0];
    let minutes = values.get(1).copied().unwrap_or(0.0);
    let seconds = values.get(2).copied().unwrap_or(0.0);
    let mut value = degrees.abs() + minutes / 60.0 + seconds / 3600.0;
    if parts[0].starts_with('-') || matches!(hemisphere, Some('S' | 'W')) {
        value = -value;
    }

    let limit = match axis {
        Axis::Latitude => 90.0,
        Axis::Longitude => 180.0,
    };
    if value.abs() > limit {
        return Err(invalid("out of range"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn decimal_degrees() {
        assert!(close(parse_latitude("40.776676").unwrap(), 40.776676));
        assert!(close(parse_longitude(" -73.971321 ").unwrap(), -73.971321));
        assert!(close(parse_latitude("+12,5").unwrap(), 12.5));
    }

    #[test]
    fn degrees_minutes_seconds() {
        let lat = parse_latitude("40°46'36.0\"N").unwrap();
        assert!(close(lat, 40.0 + 46.0 / 60.0 + 36.0 / 3600.0));
        let lon = parse_longitude("73 58 16 W").unwrap();
        assert!(close(lon, -(73.0 + 58.0 / 60.0 + 16.0 / 3600.0)));
        let lat = parse_latitude("S 33° 52′").unwrap();
        assert!(close(lat, -(33.0 + 52.0 / 60.0)));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_latitude("").is_err());
        assert!(parse_latitude("north").is_err());
        assert!(parse_latitude("12 N S").is_err());
        assert!(parse_latitude("10 E").is_err());
        assert!(parse_longitude("10 N").is_err());
        assert!(parse_latitude("91").is_err());
        assert!(parse_longitude("12 75").is_err());
        assert!(parse_longitude("1 2 3 4").is_err());
    }
}
