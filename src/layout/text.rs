use crate::fonts::{FontBundle, FontWeight};
use crate::model::LatLon;

/// Code points below this are Basic Latin through Latin Extended-B.
const LATIN_LIMIT: u32 = 0x250;
const LATIN_SHARE: f32 = 0.8;

pub(crate) const CITY_BASE_PT: f32 = 60.0;
pub(crate) const CITY_MIN_PT: f32 = 10.0;
pub(crate) const COUNTRY_PT: f32 = 22.0;
pub(crate) const COORDS_PT: f32 = 14.0;
pub(crate) const ATTRIBUTION_PT: f32 = 8.0;
/// Longest city name drawn at full size.
const CITY_FULL_SIZE_CHARS: usize = 10;
/// Widest the city title may get, as a share of the canvas width.
const CITY_MAX_WIDTH: f32 = 0.9;

/// True when more than 80% of the alphabetic characters are Latin. Strings
/// without letters count as Latin.
pub fn is_latin_script(text: &str) -> bool {
    let mut letters = 0usize;
    let mut latin = 0usize;
    for ch in text.chars().filter(|c| c.is_alphabetic()) {
        letters += 1;
        if (ch as u32) < LATIN_LIMIT {
            latin += 1;
        }
    }
    if letters == 0 {
        return true;
    }
    latin as f32 / letters as f32 > LATIN_SHARE
}

/// Latin names are uppercased and letter-spaced; other scripts are kept
/// as written.
pub fn city_title(city: &str) -> String {
    if !is_latin_script(city) {
        return city.to_string();
    }
    let upper: Vec<String> = city.to_uppercase().chars().map(String::from).collect();
    upper.join("  ")
}

/// Title size in points before width fitting.
pub fn city_font_size(city: &str, scale: f32) -> f32 {
    let base = CITY_BASE_PT * scale;
    let chars = city.chars().count();
    if chars > CITY_FULL_SIZE_CHARS {
        (base * CITY_FULL_SIZE_CHARS as f32 / chars as f32).max(CITY_MIN_PT * scale)
    } else {
        base
    }
}

/// Shrinks `size` until `title` fits the canvas, never below the minimum.
pub(super) fn fit_title(
    title: &str,
    size: f32,
    canvas_width: f32,
    scale: f32,
    fonts: &FontBundle,
) -> f32 {
    let measured = fonts.advance_width(title, size, FontWeight::Bold);
    let limit = canvas_width * CITY_MAX_WIDTH;
    if measured <= limit || measured <= 0.0 {
        return size;
    }
    (size * limit / measured).max(CITY_MIN_PT * scale)
}

/// `DD.DDDD° N / DD.DDDD° E`, hemisphere letters carrying the sign.
pub fn format_coordinates(point: LatLon) -> String {
    let ns = if point.lat >= 0.0 { 'N' } else { 'S' };
    let ew = if point.lon >= 0.0 { 'E' } else { 'W' };
    format!(
        "{:.4}° {ns} / {:.4}° {ew}",
        point.lat.abs(),
        point.lon.abs()
    )
}
