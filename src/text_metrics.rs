use std::collections::HashMap;
use std::sync::Mutex;

use fontdb::{Database, Family, Query, Stretch, Style, Weight};
use once_cell::sync::Lazy;
use ttf_parser::Face;

/// Width per character, in ems, assumed when no glyph data is available.
const FALLBACK_CHAR_RATIO: f32 = 0.56;

static TEXT_MEASURER: Lazy<Mutex<TextMeasurer>> = Lazy::new(|| Mutex::new(TextMeasurer::new()));

/// Measures the advance width of `text`, or `None` when no matching
/// font face can be loaded.
pub fn measure_text_width(text: &str, font_size: f32, font_family: &str) -> Option<f32> {
    if text.is_empty() || font_size <= 0.0 {
        return Some(0.0);
    }
    let mut guard = TEXT_MEASURER.lock().ok()?;
    guard.measure(text, font_size, font_family)
}

/// Like [`measure_text_width`], but falls back to an average character
/// width on systems without usable fonts.
pub fn text_width(text: &str, font_size: f32, font_family: &str) -> f32 {
    measure_text_width(text, font_size, font_family).unwrap_or_else(|| {
        let count = text.chars().filter(|ch| *ch != '\n').count() as f32;
        count * font_size * FALLBACK_CHAR_RATIO
    })
}

struct TextMeasurer {
    db: Database,
    loaded_system_fonts: bool,
    cache: HashMap<String, Option<FontFace>>,
}

impl TextMeasurer {
    fn new() -> Self {
        TextMeasurer {
            db: Database::new(),
            loaded_system_fonts: false,
            cache: HashMap::new(),
        }
    }

    fn measure(&mut self, text: &str, font_size: f32, font_family: &str) -> Option<f32> {
        let key = family_key(font_family);
        if !self.cache.contains_key(&key) {
            let face = self.load_face(font_family);
            self.cache.insert(key.clone(), face);
        }
        let face = self.cache.get_mut(&key).and_then(|face| face.as_mut())?;
        let normalized = text.replace('\t', "    ");
        Some(face.measure(&normalized, font_size))
    }

    fn load_face(&mut self, font_family: &str) -> Option<FontFace> {
        let specs = parse_families(font_family);
        let families: Vec<Family<'_>> = specs
            .iter()
            .map(|spec| match spec {
                FamilySpec::Generic(generic) => *generic,
                FamilySpec::Named(name) => Family::Name(name.as_str()),
            })
            .collect();

        if !self.loaded_system_fonts {
            self.db.load_system_fonts();
            self.loaded_system_fonts = true;
        }

        let query = Query {
            families: &families,
            weight: Weight::NORMAL,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = self.db.query(&query)?;
        let mut loaded = None;
        self.db.with_face_data(id, |data, index| {
            loaded = FontFace::parse(data.to_vec(), index);
        });
        loaded
    }
}

enum FamilySpec {
    Generic(Family<'static>),
    Named(String),
}

/// Splits a CSS-style family list into fontdb lookups.
fn parse_families(font_family: &str) -> Vec<FamilySpec> {
    let mut families = Vec::new();
    for part in font_family.split(',') {
        let raw = part.trim().trim_matches('"').trim_matches('\'');
        if raw.is_empty() {
            continue;
        }
        match raw.to_ascii_lowercase().as_str() {
            "serif" => families.push(FamilySpec::Generic(Family::Serif)),
            "sans-serif" | "system-ui" | "-apple-system" => {
                families.push(FamilySpec::Generic(Family::SansSerif))
            }
            "monospace" | "ui-monospace" => families.push(FamilySpec::Generic(Family::Monospace)),
            "cursive" => families.push(FamilySpec::Generic(Family::Cursive)),
            "fantasy" => families.push(FamilySpec::Generic(Family::Fantasy)),
            _ => families.push(FamilySpec::Named(raw.to_string())),
        }
    }
    if families.is_empty() {
        families.push(FamilySpec::Generic(Family::Serif));
    }
    families
}

struct FontFace {
    data: Vec<u8>,
    index: u32,
    units_per_em: u16,
    ascii_advances: [u16; 128],
    wide_cache: HashMap<char, Option<u16>>,
}

impl FontFace {
    fn parse(data: Vec<u8>, index: u32) -> Option<Self> {
        let face = Face::parse(&data, index).ok()?;
        let units_per_em = face.units_per_em().max(1);
        let mut ascii_advances = [0u16; 128];
        for byte in 0u8..=127 {
            if let Some(glyph) = face.glyph_index(byte as char) {
                ascii_advances[byte as usize] = face.glyph_hor_advance(glyph).unwrap_or(0);
            }
        }
        Some(FontFace {
            data,
            index,
            units_per_em,
            ascii_advances,
            wide_cache: HashMap::new(),
        })
    }

    fn measure(&mut self, text: &str, font_size: f32) -> f32 {
        let scale = font_size / self.units_per_em as f32;
        let fallback = font_size * FALLBACK_CHAR_RATIO;
        let mut width = 0.0f32;
        for ch in text.chars() {
            if ch == '\n' {
                continue;
            }
            let advance = if (ch as u32) < 128 {
                Some(self.ascii_advances[ch as usize]).filter(|advance| *advance > 0)
            } else {
                self.wide_advance(ch)
            };
            match advance {
                Some(advance) => width += advance as f32 * scale,
                None => width += fallback,
            }
        }
        width.max(0.0)
    }

    // Non-ASCII advances re-parse the face, once per distinct char.
    fn wide_advance(&mut self, ch: char) -> Option<u16> {
        if let Some(cached) = self.wide_cache.get(&ch) {
            return *cached;
        }
        let advance = Face::parse(&self.data, self.index).ok().and_then(|face| {
            let glyph = face.glyph_index(ch)?;
            face.glyph_hor_advance(glyph)
        });
        self.wide_cache.insert(ch, advance);
        advance
    }
}

fn family_key(font_family: &str) -> String {
    let trimmed = font_family.trim();
    if trimmed.is_empty() {
        "serif".to_string()
    } else {
        trimmed.to_ascii_lowercase()
    }
}
