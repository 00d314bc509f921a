//! # Font Management
//!
//! Text measurement for legend labels. The standard PDF fonts (Helvetica,
//! Times, Courier) are measured from built-in AFM tables; custom TrueType/
//! OpenType fonts are measured from their own metrics via ttf-parser. When a
//! custom font has no usable metrics, widths fall back to a Helvetica
//! estimate.

pub mod metrics;

pub use metrics::StandardFontMetrics;
use serde::Serialize;
use std::collections::HashMap;

/// The font a label is set in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FontSpec {
    pub family: String,
    pub size: f64,
    pub weight: u32,
    pub italic: bool,
}

impl FontSpec {
    pub fn new(family: &str, size: f64) -> Self {
        Self {
            family: family.to_string(),
            size,
            weight: 400,
            italic: false,
        }
    }

    /// Build a spec from a PDF base-font style name such as
    /// `Helvetica-BoldOblique` or `Times-Roman`.
    pub fn from_name(name: &str, size: f64) -> Self {
        let (family, style) = match name.split_once('-') {
            Some((family, style)) => (family, style),
            None => (name, ""),
        };
        let style = style.to_ascii_lowercase();
        Self {
            family: family.to_string(),
            size,
            weight: if style.contains("bold") { 700 } else { 400 },
            italic: style.contains("italic") || style.contains("oblique"),
        }
    }
}

/// A font registry that maps font family + weight + style to font data.
pub struct FontRegistry {
    fonts: HashMap<FontKey, FontData>,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub weight: u32,
    pub italic: bool,
}

#[derive(Debug, Clone)]
pub enum FontData {
    /// One of the standard PDF fonts.
    Standard(StandardFont),
    /// A TrueType/OpenType font registered at runtime.
    Custom {
        data: Vec<u8>,
        /// Parsed metrics from ttf-parser, if available.
        metrics: Option<CustomFontMetrics>,
    },
}

/// Parsed metrics from a TrueType/OpenType font via ttf-parser.
#[derive(Debug, Clone)]
pub struct CustomFontMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
}

impl CustomFontMetrics {
    /// Get the advance width of a character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        (w as f64 / self.units_per_em as f64) * font_size
    }

    /// Parse metrics from font data using ttf-parser.
    pub fn from_font_data(data: &[u8]) -> Option<Self> {
        let face = ttf_parser::Face::parse(data, 0).ok()?;
        let units_per_em = face.units_per_em();

        let mut advance_widths = HashMap::new();
        let mut default_advance = 0u16;

        // Labels are short; the Basic Multilingual Plane is plenty.
        for code in 32u32..=0xFFFF {
            if let Some(ch) = char::from_u32(code) {
                if let Some(glyph_id) = face.glyph_index(ch) {
                    let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                    advance_widths.insert(ch, advance);
                    if ch == ' ' {
                        default_advance = advance;
                    }
                }
            }
        }

        if default_advance == 0 {
            default_advance = units_per_em / 2;
        }

        Some(CustomFontMetrics {
            units_per_em,
            advance_widths,
            default_advance,
        })
    }
}

/// The standard PDF fonts with text metrics.
#[derive(Debug, Clone, Copy)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::TimesItalic => "Times-Italic",
            Self::TimesBoldItalic => "Times-BoldItalic",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
            Self::CourierOblique => "Courier-Oblique",
            Self::CourierBoldOblique => "Courier-BoldOblique",
        }
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    pub fn new() -> Self {
        let mut fonts = HashMap::new();

        let standard_mappings = [
            (("Helvetica", 400, false), StandardFont::Helvetica),
            (("Helvetica", 700, false), StandardFont::HelveticaBold),
            (("Helvetica", 400, true), StandardFont::HelveticaOblique),
            (("Helvetica", 700, true), StandardFont::HelveticaBoldOblique),
            (("Times", 400, false), StandardFont::TimesRoman),
            (("Times", 700, false), StandardFont::TimesBold),
            (("Times", 400, true), StandardFont::TimesItalic),
            (("Times", 700, true), StandardFont::TimesBoldItalic),
            (("Courier", 400, false), StandardFont::Courier),
            (("Courier", 700, false), StandardFont::CourierBold),
            (("Courier", 400, true), StandardFont::CourierOblique),
            (("Courier", 700, true), StandardFont::CourierBoldOblique),
        ];

        for ((family, weight, italic), font) in standard_mappings {
            fonts.insert(
                FontKey {
                    family: family.to_string(),
                    weight,
                    italic,
                },
                FontData::Standard(font),
            );
        }

        Self { fonts }
    }

    /// Look up a font, falling back to Helvetica if not found.
    pub fn resolve(&self, family: &str, weight: u32, italic: bool) -> &FontData {
        let key = FontKey {
            family: family.to_string(),
            weight,
            italic,
        };
        if let Some(font) = self.fonts.get(&key) {
            return font;
        }

        // Try with normalized weight (snap to 400 or 700)
        let snapped_weight = if weight >= 600 { 700 } else { 400 };
        let key = FontKey {
            family: family.to_string(),
            weight: snapped_weight,
            italic,
        };
        if let Some(font) = self.fonts.get(&key) {
            return font;
        }

        const HELVETICA: FontData = FontData::Standard(StandardFont::Helvetica);
        const HELVETICA_BOLD: FontData = FontData::Standard(StandardFont::HelveticaBold);
        const HELVETICA_OBLIQUE: FontData = FontData::Standard(StandardFont::HelveticaOblique);
        const HELVETICA_BOLD_OBLIQUE: FontData =
            FontData::Standard(StandardFont::HelveticaBoldOblique);
        match (snapped_weight, italic) {
            (700, true) => &HELVETICA_BOLD_OBLIQUE,
            (700, false) => &HELVETICA_BOLD,
            (_, true) => &HELVETICA_OBLIQUE,
            _ => &HELVETICA,
        }
    }

    /// Register a custom font.
    pub fn register(&mut self, family: &str, weight: u32, italic: bool, data: Vec<u8>) {
        let metrics = CustomFontMetrics::from_font_data(&data);
        if metrics.is_none() {
            log::warn!(
                "Font '{}' has no readable metrics; widths will be estimated",
                family
            );
        }
        self.fonts.insert(
            FontKey {
                family: family.to_string(),
                weight,
                italic,
            },
            FontData::Custom { data, metrics },
        );
    }
}

/// Text measurement with real glyph metrics.
pub struct FontContext {
    registry: FontRegistry,
}

impl Default for FontContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FontContext {
    pub fn new() -> Self {
        Self {
            registry: FontRegistry::new(),
        }
    }

    /// Get the advance width of a single character in points.
    pub fn char_width(&self, ch: char, font: &FontSpec) -> f64 {
        match self.registry.resolve(&font.family, font.weight, font.italic) {
            FontData::Standard(std_font) => std_font.metrics().char_width(ch, font.size),
            FontData::Custom {
                metrics: Some(m), ..
            } => m.char_width(ch, font.size),
            FontData::Custom { metrics: None, .. } => {
                StandardFont::Helvetica.metrics().char_width(ch, font.size)
            }
        }
    }

    /// Measure the width of a string in points.
    pub fn measure_string(&self, text: &str, font: &FontSpec) -> f64 {
        match self.registry.resolve(&font.family, font.weight, font.italic) {
            FontData::Standard(std_font) => std_font.metrics().measure_string(text, font.size, 0.0),
            FontData::Custom {
                metrics: Some(m), ..
            } => text.chars().map(|ch| m.char_width(ch, font.size)).sum(),
            FontData::Custom { metrics: None, .. } => StandardFont::Helvetica
                .metrics()
                .measure_string(text, font.size, 0.0),
        }
    }

    /// Access the underlying font registry mutably.
    pub fn registry_mut(&mut self) -> &mut FontRegistry {
        &mut self.registry
    }
}
