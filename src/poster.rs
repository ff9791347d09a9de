//! One poster generation session: shared theme store, fonts and cache, plus
//! the sizing and naming rules around a render.

use crate::cache::DiskCache;
use crate::config::Config;
use crate::error::Result;
use crate::fonts::FontBundle;
use crate::layout::compute_layout;
use crate::model::{LatLon, Location, MapData, PosterSpec};
use crate::osm::{CachedSource, FeatureSource, fetch_map_data};
use crate::render::{OutputFormat, render_svg, write_output};
use crate::theme::{Theme, ThemeStore};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Paper sizes in inches, portrait unless noted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum PaperPreset {
    A3,
    A4,
    A5,
    /// 21:9 screen, landscape.
    Ultrawide,
    Square,
    Poster,
}

impl PaperPreset {
    /// Natural (width, height).
    pub fn size(self) -> (f32, f32) {
        match self {
            PaperPreset::A3 => (11.7, 16.5),
            PaperPreset::A4 => (8.3, 11.7),
            PaperPreset::A5 => (5.8, 8.3),
            PaperPreset::Ultrawide => (11.47, 4.8),
            PaperPreset::Square => (12.0, 12.0),
            PaperPreset::Poster => (18.0, 24.0),
        }
    }

    /// Size turned to `orientation`, or the natural size when none is given.
    pub fn oriented(self, orientation: Option<Orientation>) -> (f32, f32) {
        let (width, height) = self.size();
        let (short, long) = (width.min(height), width.max(height));
        match orientation {
            None => (width, height),
            Some(Orientation::Portrait) => (short, long),
            Some(Orientation::Landscape) => (long, short),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Caps each side at `max`, warning for every side that was reduced.
pub fn clamp_dimensions(width: f32, height: f32, max: f32) -> (f32, f32) {
    let clamp = |label: &str, value: f32| {
        if value > max {
            warn!("{label} {value} exceeds the maximum of {max} inches; using {max}");
            max
        } else {
            value
        }
    };
    (clamp("width", width), clamp("height", height))
}

/// Optional overrides for the names printed on the poster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayNames {
    pub city: Option<String>,
    pub country: Option<String>,
    pub country_label: Option<String>,
}

/// Display city is `display_city` or `city`; display country is
/// `display_country`, then `country_label`, then `country`.
pub fn resolve_location(
    point: LatLon,
    city: &str,
    country: &str,
    names: &DisplayNames,
) -> Location {
    let city = names.city.as_deref().unwrap_or(city);
    let country = names
        .country
        .as_deref()
        .or(names.country_label.as_deref())
        .unwrap_or(country);
    Location {
        point,
        city: city.to_string(),
        country: country.to_string(),
    }
}

/// `<city_slug>_<theme>_<radius>m_<YYYYmmdd_HHMMSS>.<ext>`
pub fn output_filename(
    city: &str,
    theme: &str,
    format: OutputFormat,
    radius_m: u32,
    timestamp: NaiveDateTime,
) -> String {
    let slug: String = city
        .to_lowercase()
        .chars()
        .filter(|c| *c != ',')
        .map(|c| {
            if c.is_whitespace() || std::path::is_separator(c) {
                '_'
            } else {
                c
            }
        })
        .collect();
    format!(
        "{slug}_{theme}_{radius_m}m_{}.{}",
        timestamp.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Lays out and serializes one poster to SVG text.
pub fn render_poster_svg(
    spec: &PosterSpec,
    theme: &Theme,
    data: &MapData,
    fonts: &FontBundle,
) -> Result<String> {
    let layout = compute_layout(spec, theme, data, fonts)?;
    Ok(render_svg(&layout))
}

/// Long-lived state shared by every poster of a run.
pub struct Session {
    config: Config,
    themes: ThemeStore,
    fonts: FontBundle,
    cache: DiskCache,
}

impl Session {
    pub fn new(config: Config, font_family: Option<&str>) -> Self {
        let fonts = FontBundle::load_or_fallback(&config.paths.fonts_dir, font_family);
        Self::with_fonts(config, fonts)
    }

    pub fn with_fonts(config: Config, fonts: FontBundle) -> Self {
        Self {
            themes: ThemeStore::new(config.paths.themes_dir.clone()),
            cache: DiskCache::new(config.paths.cache_dir.clone()),
            fonts,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn themes(&self) -> &ThemeStore {
        &self.themes
    }

    pub fn fonts(&self) -> &FontBundle {
        &self.fonts
    }

    pub fn cache(&self) -> &DiskCache {
        &self.cache
    }

    /// Fetches every map layer through the session cache.
    pub fn fetch<S: FeatureSource>(
        &self,
        source: &S,
        center: LatLon,
        radius_m: u32,
    ) -> Result<MapData> {
        let cached = CachedSource::new(source, self.cache.clone());
        fetch_map_data(&cached, center, radius_m)
    }

    /// Renders `spec` from already fetched `data` and writes it to `output`.
    pub fn render(&mut self, spec: &PosterSpec, data: &MapData, output: &Path) -> Result<()> {
        let theme = self.themes.load(&spec.theme)?;
        info!(theme = %spec.theme, city = %spec.location.city, "rendering poster");
        let svg = render_poster_svg(spec, &theme, data, &self.fonts)?;
        let dpi = self.config.render.dpi;
        write_output(&svg, spec.format, output, &self.fonts, dpi)
    }

    /// Where a poster for `spec` rendered at `timestamp` is written.
    pub fn output_path(&self, city: &str, spec: &PosterSpec, timestamp: NaiveDateTime) -> PathBuf {
        self.config.paths.posters_dir.join(output_filename(
            city,
            &spec.theme,
            spec.format,
            spec.radius_m,
            timestamp,
        ))
    }

    /// Fetch then render, for a single poster.
    pub fn generate<S: FeatureSource>(
        &mut self,
        source: &S,
        spec: &PosterSpec,
        output: &Path,
    ) -> Result<MapData> {
        let data = self.fetch(source, spec.location.point, spec.radius_m)?;
        self.render(spec, &data, output)?;
        Ok(data)
    }
}
