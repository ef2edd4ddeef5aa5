use std::cell::RefCell;
use std::collections::HashMap;

use ab_glyph::{Font, FontArc, FontVec, PxScale, ScaleFont};

use crate::editor::{FontSpec, TextMeasure};

/// Advance per character, relative to font size, when no face can be resolved.
const FALLBACK_CHAR_WIDTH_RATIO: f64 = 0.62;
const LAST_RESORT_FAMILIES: &[&str] = &["DejaVu Sans", "Liberation Sans", "Noto Sans"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum FamilyName {
    Named(String),
    Serif,
    SansSerif,
    Monospace,
}

impl FamilyName {
    fn parse(name: &str) -> Option<Self> {
        let name = name.trim().trim_matches(|c| c == '"' || c == '\'').trim();
        if name.is_empty() {
            return None;
        }
        Some(match name.to_ascii_lowercase().as_str() {
            "serif" | "ui-serif" => Self::Serif,
            "sans-serif" | "system-ui" | "-apple-system" | "ui-sans-serif" => Self::SansSerif,
            "monospace" | "ui-monospace" => Self::Monospace,
            _ => Self::Named(name.to_string()),
        })
    }

    fn as_query_family(&self) -> fontdb::Family<'_> {
        match self {
            Self::Named(name) => fontdb::Family::Name(name.as_str()),
            Self::Serif => fontdb::Family::Serif,
            Self::SansSerif => fontdb::Family::SansSerif,
            Self::Monospace => fontdb::Family::Monospace,
        }
    }
}

fn parse_family_list(list: &str) -> Vec<FamilyName> {
    list.split(',').filter_map(FamilyName::parse).collect()
}

/// Resolves CSS-like family lists to loaded faces and measures text with them.
pub struct FontBook {
    database: fontdb::Database,
    faces: RefCell<HashMap<(String, u16), Option<FontArc>>>,
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook")
            .field("faces", &self.database.len())
            .field("resolved", &self.faces.borrow().len())
            .finish()
    }
}

impl Default for FontBook {
    fn default() -> Self {
        Self::empty()
    }
}

impl FontBook {
    /// A book with no faces; every measurement uses the approximate metric.
    pub fn empty() -> Self {
        Self::with_database(fontdb::Database::new())
    }

    pub fn with_system_fonts() -> Self {
        let mut database = fontdb::Database::new();
        database.load_system_fonts();
        tracing::debug!(faces = database.len(), "loaded system fonts");
        Self::with_database(database)
    }

    pub fn with_database(database: fontdb::Database) -> Self {
        Self {
            database,
            faces: RefCell::new(HashMap::new()),
        }
    }

    pub fn has_faces(&self) -> bool {
        !self.database.is_empty()
    }

    pub fn face(&self, font: &FontSpec) -> Option<FontArc> {
        let key = (font.family.clone(), font.weight);
        if let Some(cached) = self.faces.borrow().get(&key) {
            return cached.clone();
        }

        let resolved = self.lookup(&font.family, font.weight);
        if resolved.is_none() && self.has_faces() {
            tracing::warn!(family = %font.family, weight = font.weight, "no usable font face");
        }
        self.faces.borrow_mut().insert(key, resolved.clone());
        resolved
    }

    fn lookup(&self, family_list: &str, weight: u16) -> Option<FontArc> {
        let families = parse_family_list(family_list);
        let query_families = families
            .iter()
            .map(FamilyName::as_query_family)
            .collect::<Vec<_>>();
        let id = self
            .query(&query_families, weight)
            .or_else(|| {
                let fallback = LAST_RESORT_FAMILIES
                    .iter()
                    .map(|name| fontdb::Family::Name(*name))
                    .collect::<Vec<_>>();
                self.query(&fallback, weight)
            })
            .or_else(|| self.database.faces().next().map(|face| face.id))?;

        self.database
            .with_face_data(id, |data, index| {
                FontVec::try_from_vec_and_index(data.to_vec(), index)
                    .map(FontArc::new)
                    .map_err(|err| {
                        tracing::warn!(?err, "failed to parse font face");
                    })
                    .ok()
            })
            .flatten()
    }

    fn query(&self, families: &[fontdb::Family<'_>], weight: u16) -> Option<fontdb::ID> {
        if families.is_empty() {
            return None;
        }
        self.database.query(&fontdb::Query {
            families,
            weight: fontdb::Weight(weight),
            stretch: fontdb::Stretch::Normal,
            style: fontdb::Style::Normal,
        })
    }
}

impl TextMeasure for FontBook {
    fn measure(&self, font: &FontSpec, text: &str) -> f64 {
        if text.is_empty() {
            return 0.0;
        }
        match self.face(font) {
            Some(face) => line_advance(&face, font.size, text),
            None => text.chars().count() as f64 * font.size.max(1.0) * FALLBACK_CHAR_WIDTH_RATIO,
        }
    }
}

/// Scale at which one em equals `font_size` pixels.
pub(crate) fn em_scale(face: &FontArc, font_size: f64) -> PxScale {
    let units_per_em = face.units_per_em().unwrap_or(1000.0).max(1.0);
    PxScale::from(font_size.max(1.0) as f32 * face.height_unscaled() / units_per_em)
}

pub(crate) fn line_advance(face: &FontArc, font_size: f64, text: &str) -> f64 {
    let scaled = face.as_scaled(em_scale(face, font_size));
    let mut width = 0.0_f32;
    let mut previous = None;
    for ch in text.chars() {
        let glyph_id = face.glyph_id(ch);
        if let Some(previous) = previous {
            width += scaled.kern(previous, glyph_id);
        }
        width += scaled.h_advance(glyph_id);
        previous = Some(glyph_id);
    }
    f64::from(width)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_list_maps_generic_names() {
        let families = parse_family_list("Impact, 'Arial Black', system-ui, sans-serif, ,serif");
        assert_eq!(
            families,
            vec![
                FamilyName::Named("Impact".to_string()),
                FamilyName::Named("Arial Black".to_string()),
                FamilyName::SansSerif,
                FamilyName::SansSerif,
                FamilyName::Serif,
            ]
        );
    }

    #[test]
    fn empty_book_measures_with_fallback_metric() {
        let book = FontBook::empty();
        let font = FontSpec::new("Impact", 50.0, 900);
        assert!(book.face(&font).is_none());
        assert_eq!(book.measure(&font, ""), 0.0);
        assert!((book.measure(&font, "abcd") - 124.0).abs() < 1e-9);
    }
}
