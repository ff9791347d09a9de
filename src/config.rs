use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

const OVERPASS_URLS: [&str; 2] = [
    "https://overpass.kumi.systems/api/interpreter",
    "https://overpass-api.de/api/interpreter",
];
const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Environment variable that overrides the cache directory.
pub const CACHE_DIR_ENV: &str = "CACHE_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    pub themes_dir: PathBuf,
    pub fonts_dir: PathBuf,
    pub posters_dir: PathBuf,
    pub cache_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            themes_dir: PathBuf::from("themes"),
            fonts_dir: PathBuf::from("fonts"),
            posters_dir: PathBuf::from("posters"),
            cache_dir: PathBuf::from("cache"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Raster resolution for PNG output.
    pub dpi: f32,
    /// Fraction of the poster height covered by each fade.
    pub gradient_height: f32,
    /// Largest accepted poster side, in inches.
    pub max_dimension: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: 300.0,
            gradient_height: 0.25,
            max_dimension: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub overpass_urls: Vec<String>,
    pub nominatim_url: String,
    pub user_agent: String,
    /// Overpass server-side and HTTP timeout.
    pub timeout_secs: u64,
    pub geocode_timeout_secs: u64,
    pub street_delay_ms: u64,
    pub feature_delay_ms: u64,
    pub geocode_delay_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            overpass_urls: OVERPASS_URLS
                .iter()
                .map(|url| url.to_string())
                .collect(),
            nominatim_url: NOMINATIM_URL.to_string(),
            user_agent: concat!("maptoposter/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 180,
            geocode_timeout_secs: 10,
            street_delay_ms: 500,
            feature_delay_ms: 300,
            geocode_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub paths: PathsConfig,
    pub render: RenderConfig,
    pub network: NetworkConfig,
}

impl Config {
    /// Replaces the cache directory when `value` is set and non-empty.
    pub fn apply_cache_dir_override(&mut self, value: Option<OsString>) {
        if let Some(dir) = value
            && !dir.is_empty()
        {
            self.paths.cache_dir = PathBuf::from(dir);
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PathsFile {
    themes_dir: Option<PathBuf>,
    fonts_dir: Option<PathBuf>,
    posters_dir: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NetworkFile {
    overpass_urls: Option<Vec<String>>,
    nominatim_url: Option<String>,
    user_agent: Option<String>,
    timeout_secs: Option<u64>,
    geocode_timeout_secs: Option<u64>,
    street_delay_ms: Option<u64>,
    feature_delay_ms: Option<u64>,
    geocode_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    #[serde(default)]
    paths: PathsFile,
    dpi: Option<f32>,
    gradient_height: Option<f32>,
    max_dimension: Option<f32>,
    #[serde(default)]
    network: NetworkFile,
}

/// Loads defaults, overlays the JSON file at `path` if given, then the
/// `CACHE_DIR` environment variable.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = match path {
        Some(path) => parse_config(&std::fs::read_to_string(path)?)?,
        None => Config::default(),
    };
    config.apply_cache_dir_override(std::env::var_os(CACHE_DIR_ENV));
    Ok(config)
}

pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = serde_json::from_str(contents)?;
    let mut config = Config::default();

    let paths = parsed.paths;
    if let Some(v) = paths.themes_dir {
        config.paths.themes_dir = v;
    }
    if let Some(v) = paths.fonts_dir {
        config.paths.fonts_dir = v;
    }
    if let Some(v) = paths.posters_dir {
        config.paths.posters_dir = v;
    }
    if let Some(v) = paths.cache_dir {
        config.paths.cache_dir = v;
    }

    if let Some(v) = parsed.dpi {
        anyhow::ensure!(v > 0.0, "dpi must be positive, got {v}");
        config.render.dpi = v;
    }
    if let Some(v) = parsed.gradient_height {
        config.render.gradient_height = v.clamp(0.0, 0.5);
    }
    if let Some(v) = parsed.max_dimension {
        anyhow::ensure!(v > 0.0, "maxDimension must be positive, got {v}");
        config.render.max_dimension = v;
    }

    let network = parsed.network;
    if let Some(v) = network.overpass_urls {
        anyhow::ensure!(!v.is_empty(), "overpassUrls must not be empty");
        config.network.overpass_urls = v;
    }
    if let Some(v) = network.nominatim_url {
        config.network.nominatim_url = v;
    }
    if let Some(v) = network.user_agent {
        config.network.user_agent = v;
    }
    if let Some(v) = network.timeout_secs {
        config.network.timeout_secs = v;
    }
    if let Some(v) = network.geocode_timeout_secs {
        config.network.geocode_timeout_secs = v;
    }
    if let Some(v) = network.street_delay_ms {
        config.network.street_delay_ms = v;
    }
    if let Some(v) = network.feature_delay_ms {
        config.network.feature_delay_ms = v;
    }
    if let Some(v) = network.geocode_delay_ms {
        config.network.geocode_delay_ms = v;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_keeps_defaults() {
        let config = parse_config("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.render.dpi, 300.0);
        assert_eq!(config.paths.cache_dir, PathBuf::from("cache"));
        assert_eq!(config.network.overpass_urls.len(), 2);
    }

    #[test]
    fn overrides_are_applied() {
        let config = parse_config(
            r#"{
                "paths": { "themesDir": "/srv/themes", "cacheDir": "/tmp/osm" },
                "dpi": 150,
                "gradientHeight": 0.9,
                "network": {
                    "overpassUrls": ["http://localhost:12345/api/interpreter"],
                    "featureDelayMs": 0
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.paths.themes_dir, PathBuf::from("/srv/themes"));
        assert_eq!(config.paths.fonts_dir, PathBuf::from("fonts"));
        assert_eq!(config.paths.cache_dir, PathBuf::from("/tmp/osm"));
        assert_eq!(config.render.dpi, 150.0);
        assert_eq!(config.render.gradient_height, 0.5);
        assert_eq!(
            config.network.overpass_urls,
            vec!["http://localhost:12345/api/interpreter"]
        );
        assert_eq!(config.network.feature_delay_ms, 0);
        assert_eq!(config.network.street_delay_ms, 500);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(parse_config(r#"{"dpi": 0}"#).is_err());
        assert!(parse_config(r#"{"network": {"overpassUrls": []}}"#).is_err());
        assert!(parse_config("not json").is_err());
    }

    #[test]
    fn cache_dir_override() {
        let mut config = Config::default();
        config.apply_cache_dir_override(Some(OsString::new()));
        assert_eq!(config.paths.cache_dir, PathBuf::from("cache"));
        config.apply_cache_dir_override(Some(OsString::from("/var/cache/posters")));
        assert_eq!(config.paths.cache_dir, PathBuf::from("/var/cache/posters"));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"paths": {"postersDir": "out"}}"#).unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.paths.posters_dir, PathBuf::from("out"));
        assert!(load_config(Some(&dir.path().join("missing.json"))).is_err());
    }
}
