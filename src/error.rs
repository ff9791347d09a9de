use std::path::PathBuf;

use thiserror::Error;

/// Everything that can abort a poster generation run.
#[derive(Debug, Error)]
pub enum PosterError {
    #[error("failed to fetch {what}: {reason}")]
    FetchFailed { what: String, reason: String },

    #[error("projection failed: {0}")]
    ProjectionFailed(String),

    #[error("font family '{family}' is unavailable: {reason}")]
    FontUnavailable { family: String, reason: String },

    #[error("cache entry {} is corrupt: {reason}", path.display())]
    CacheCorrupt { path: PathBuf, reason: String },

    #[error("geocoding failed for '{query}': {reason}")]
    GeocodeFailed { query: String, reason: String },

    #[error("theme '{0}' not found")]
    ThemeNotFound(String),

    #[error("theme '{name}' is invalid: {reason}")]
    InvalidTheme { name: String, reason: String },

    #[error("invalid coordinate '{input}': {reason}")]
    InvalidCoordinate { input: String, reason: String },

    #[error("render failed: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PosterError {
    pub(crate) fn fetch(what: impl Into<String>, reason: impl ToString) -> Self {
        Self::FetchFailed {
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PosterError>;
