use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use ttf_parser::Face;

/// Width of one space relative to the font size, for when no face resolves.
const FALLBACK_SPACE_EM: f32 = 0.306;
/// Average glyph advance relative to the font size, for unresolved glyphs.
const FALLBACK_CHAR_EM: f32 = 0.56;

/// Horizontal advance of `text` set in the first face of `families` that
/// resolves at `weight`. Falls back to em-based estimates when no face or
/// glyph is available so layout stays deterministic without fonts installed.
pub fn advance_width(
    db: &Database,
    families: &[Family<'_>],
    weight: u16,
    text: &str,
    font_size: f32,
) -> f32 {
    if text.is_empty() || font_size <= 0.0 {
        return 0.0;
    }
    measure_with_face(db, families, weight, text, font_size)
        .unwrap_or_else(|| estimate_width(text, font_size))
}

pub fn estimate_width(text: &str, font_size: f32) -> f32 {
    text.chars()
        .filter(|ch| *ch != '\n')
        .map(|ch| {
            if ch == ' ' {
                FALLBACK_SPACE_EM * font_size
            } else {
                FALLBACK_CHAR_EM * font_size
            }
        })
        .sum()
}

fn measure_with_face(
    db: &Database,
    families: &[Family<'_>],
    weight: u16,
    text: &str,
    font_size: f32,
) -> Option<f32> {
    let query = Query {
        families,
        weight: Weight(weight),
        stretch: Stretch::Normal,
        style: Style::Normal,
    };
    let id = db.query(&query)?;
    db.with_face_data(id, |data, index| {
        let face = Face::parse(data, index).ok()?;
        let scale = font_size / face.units_per_em().max(1) as f32;
        let fallback = font_size * FALLBACK_CHAR_EM;
        let mut width = 0.0f32;
        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            match face.glyph_index(ch).and_then(|g| face.glyph_hor_advance(g)) {
                Some(advance) => width += advance as f32 * scale,
                None => width += fallback,
            }
        }
        Some(width.max(0.0))
    })
    .flatten()
}
