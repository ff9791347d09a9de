use crate::error::{PosterError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_THEME: &str = "terracotta";

/// Flat color table applied to one poster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub bg: String,
    pub text: String,
    pub gradient_color: String,
    pub water: String,
    pub parks: String,
    pub road_motorway: String,
    pub road_primary: String,
    pub road_secondary: String,
    pub road_tertiary: String,
    pub road_residential: String,
    pub road_default: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buildings: Option<String>,
}

impl Theme {
    pub fn terracotta() -> Self {
        Self {
            name: "Terracotta".to_string(),
            description: "Mediterranean warmth - burnt orange and clay tones on cream".to_string(),
            bg: "#F5EDE4".to_string(),
            text: "#8B4513".to_string(),
            gradient_color: "#F5EDE4".to_string(),
            water: "#A8C4C4".to_string(),
            parks: "#E8E0D0".to_string(),
            road_motorway: "#A0522D".to_string(),
            road_primary: "#B8653A".to_string(),
            road_secondary: "#C9846A".to_string(),
            road_tertiary: "#D9A08A".to_string(),
            road_residential: "#E5C4B0".to_string(),
            road_default: "#D9A08A".to_string(),
            buildings: None,
        }
    }

    pub fn buildings_color(&self) -> &str {
        self.buildings.as_deref().unwrap_or(&self.bg)
    }

    pub fn parse(name: &str, contents: &str) -> Result<Self> {
        let mut theme: Theme = json5::from_str(contents).map_err(|err| PosterError::InvalidTheme {
            name: name.to_string(),
            reason: err.to_string(),
        })?;
        if theme.name.is_empty() {
            theme.name = name.to_string();
        }
        Ok(theme)
    }
}

/// Theme name plus the display metadata shown by `--list-themes`.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeSummary {
    pub id: String,
    pub display_name: String,
    pub description: String,
}

/// Themes loaded from `<dir>/<name>.json`, memoized for one session.
#[derive(Debug)]
pub struct ThemeStore {
    dir: PathBuf,
    loaded: HashMap<String, Theme>,
}

impl ThemeStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            loaded: HashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Theme names (file stems) sorted by file name.
    pub fn available(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.path_for(name).exists()
    }

    /// Loads a theme, falling back to the embedded terracotta theme when the
    /// file does not exist. Malformed files are errors.
    pub fn load(&mut self, name: &str) -> Result<Theme> {
        if let Some(theme) = self.loaded.get(name) {
            return Ok(theme.clone());
        }
        let path = self.path_for(name);
        let theme = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            let theme = Theme::parse(name, &contents)?;
            info!(theme = %theme.name, "loaded theme");
            if !theme.description.is_empty() {
                info!("  {}", theme.description);
            }
            theme
        } else {
            warn!(
                path = %path.display(),
                "theme file not found, using default {DEFAULT_THEME} theme"
            );
            Theme::terracotta()
        };
        self.loaded.insert(name.to_string(), theme.clone());
        Ok(theme)
    }

    pub fn summaries(&self) -> Result<Vec<ThemeSummary>> {
        let mut out = Vec::new();
        for id in self.available()? {
            let parsed = std::fs::read_to_string(self.path_for(&id))
                .ok()
                .and_then(|contents| Theme::parse(&id, &contents).ok());
            let (display_name, description) = match parsed {
                Some(theme) => (theme.name, theme.description),
                None => (id.clone(), String::new()),
            };
            out.push(ThemeSummary {
                id,
                display_name,
                description,
            });
        }
        Ok(out)
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }
}
