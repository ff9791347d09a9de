use crate::error::{PosterError, Result};
use crate::text_metrics;
use fontdb::{Database, Family, Source};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_FAMILY: &str = "Roboto";
const FALLBACK_FAMILY: &str = "monospace";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Light,
    Regular,
    Bold,
}

impl FontWeight {
    pub fn css_weight(self) -> u16 {
        match self {
            FontWeight::Light => 300,
            FontWeight::Regular => 400,
            FontWeight::Bold => 700,
        }
    }
}

/// Fonts used for the poster typography, loaded once per session.
pub struct FontBundle {
    family: Option<String>,
    files: Vec<PathBuf>,
    db: Database,
}

impl std::fmt::Debug for FontBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBundle")
            .field("family", &self.family)
            .field("files", &self.files)
            .finish()
    }
}

impl FontBundle {
    /// Loads `family` (default Roboto) from `fonts_dir`, then from the
    /// system font set.
    pub fn load(fonts_dir: &Path, family: Option<&str>) -> Result<Self> {
        let family = family.unwrap_or(DEFAULT_FAMILY).trim().to_string();
        let mut db = Database::new();
        if fonts_dir.is_dir() {
            db.load_fonts_dir(fonts_dir);
        }
        if find_files(&db, &family).is_empty() {
            db.load_system_fonts();
        }
        let files = find_files(&db, &family);
        if files.is_empty() {
            return Err(PosterError::FontUnavailable {
                family,
                reason: format!("no face found in {} or system fonts", fonts_dir.display()),
            });
        }
        info!(family = %family, faces = files.len(), "loaded fonts");
        Ok(Self {
            family: Some(family),
            files,
            db,
        })
    }

    /// Generic monospace stack, with no face files of its own.
    pub fn fallback() -> Self {
        Self {
            family: None,
            files: Vec::new(),
            db: Database::new(),
        }
    }

    /// Tries `family`, then Roboto, then the generic monospace stack.
    pub fn load_or_fallback(fonts_dir: &Path, family: Option<&str>) -> Self {
        if let Some(requested) = family
            && !requested.trim().eq_ignore_ascii_case(DEFAULT_FAMILY)
        {
            match Self::load(fonts_dir, Some(requested)) {
                Ok(bundle) => return bundle,
                Err(err) => warn!("{err}; falling back to {DEFAULT_FAMILY}"),
            }
        }
        match Self::load(fonts_dir, None) {
            Ok(bundle) => bundle,
            Err(err) => {
                warn!("{err}; falling back to {FALLBACK_FAMILY}");
                Self::fallback()
            }
        }
    }

    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    /// CSS `font-family` value for the SVG output.
    pub fn css_family(&self) -> String {
        match &self.family {
            Some(family) => format!("'{family}', {FALLBACK_FAMILY}"),
            None => FALLBACK_FAMILY.to_string(),
        }
    }

    /// Font files backing this bundle, for rasterizers with their own font
    /// database.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn advance_width(&self, text: &str, font_size: f32, weight: FontWeight) -> f32 {
        let families = match &self.family {
            Some(name) => vec![Family::Name(name.as_str()), Family::Monospace],
            None => vec![Family::Monospace],
        };
        text_metrics::advance_width(&self.db, &families, weight.css_weight(), text, font_size)
    }
}

fn find_files(db: &Database, family: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = db
        .faces()
        .filter(|face| {
            face.families
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case(family))
        })
        .filter_map(|face| match &face.source {
            Source::File(path) => Some(path.clone()),
            Source::SharedFile(path, _) => Some(path.clone()),
            Source::Binary(_) => None,
        })
        .collect();
    files.sort();
    files.dedup();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_uses_generic_stack() {
        let bundle = FontBundle::fallback();
        assert_eq!(bundle.css_family(), "monospace");
        assert!(bundle.files().is_empty());
        assert!(bundle.advance_width(" ", 10.0, FontWeight::Bold) > 0.0);
    }

    #[test]
    fn unknown_family_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = FontBundle::load(dir.path(), Some("No Such Family 1234")).unwrap_err();
        assert!(matches!(err, PosterError::FontUnavailable { .. }));
        let bundle = FontBundle::load_or_fallback(dir.path(), Some("No Such Family 1234"));
        assert_ne!(bundle.family(), Some("No Such Family 1234"));
    }
}
