//! # Font Metrics
//!
//! Character advance widths for the layout probe. The measurement has to
//! agree with what the print stylesheet renders, so the same families are
//! known here: the built-in Helvetica and Courier metrics, CSS aliases that
//! resolve to them, and any TrueType font the deployment registers.
//!
//! The built-in obliques share their upright widths, so only weight picks a
//! different table. Registered fonts are looked up by exact variant first,
//! then by dropping italic, then by dropping bold.

pub mod metrics;

pub use metrics::StandardFontMetrics;
use std::collections::HashMap;

use crate::error::PagewrightError;

/// Weights at or above this snap to bold.
const BOLD_THRESHOLD: u32 = 600;

/// The built-in width tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    Courier,
}

impl StandardFont {
    fn from_alias(name: &str, bold: bool) -> Option<Self> {
        match name {
            "helvetica" | "arial" | "helvetica neue" | "sans-serif" | "calibri" | "verdana"
            | "tahoma" => Some(if bold {
                StandardFont::HelveticaBold
            } else {
                StandardFont::Helvetica
            }),
            "courier" | "courier new" | "monospace" | "consolas" => Some(StandardFont::Courier),
            _ => None,
        }
    }
}

/// Advance widths read from a TrueType/OpenType font.
#[derive(Debug, Clone)]
pub struct CustomFontMetrics {
    units_per_em: u16,
    advances: HashMap<char, u16>,
    fallback_advance: u16,
}

impl CustomFontMetrics {
    pub fn parse(data: &[u8]) -> Result<Self, PagewrightError> {
        let face = ttf_parser::Face::parse(data, 0)
            .map_err(|e| PagewrightError::FontError(format!("unreadable font: {}", e)))?;
        let units_per_em = face.units_per_em();

        // Latin, Latin-1 and General Punctuation cover the portal's documents
        let advances: HashMap<char, u16> = (0x20u32..=0x24F)
            .chain(0x2000..=0x206F)
            .filter_map(char::from_u32)
            .filter_map(|ch| {
                let glyph = face.glyph_index(ch)?;
                Some((ch, face.glyph_hor_advance(glyph).unwrap_or(0)))
            })
            .collect();

        let fallback_advance = match advances.get(&' ') {
            Some(&w) if w > 0 => w,
            _ => units_per_em / 2,
        };

        Ok(Self {
            units_per_em,
            advances,
            fallback_advance,
        })
    }

    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let units = self.advances.get(&ch).copied().unwrap_or(self.fallback_advance);
        f64::from(units) / f64::from(self.units_per_em) * font_size
    }
}

/// The metrics a family/weight/style resolves to.
#[derive(Debug, Clone, Copy)]
pub enum ResolvedFace<'a> {
    Standard(StandardFont),
    Custom(&'a CustomFontMetrics),
}

impl ResolvedFace<'_> {
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        match self {
            ResolvedFace::Standard(font) => font.metrics().char_width(ch, font_size),
            ResolvedFace::Custom(metrics) => metrics.char_width(ch, font_size),
        }
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct FaceKey {
    family: String,
    bold: bool,
    italic: bool,
}

/// Registered TrueType faces, keyed by lowercased family name.
#[derive(Debug, Default)]
pub struct FontRegistry {
    faces: HashMap<FaceKey, CustomFontMetrics>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a TrueType font from raw bytes.
    pub fn register(
        &mut self,
        family: &str,
        weight: u32,
        italic: bool,
        data: &[u8],
    ) -> Result<(), PagewrightError> {
        let metrics = CustomFontMetrics::parse(data)?;
        self.faces.insert(
            FaceKey {
                family: family.trim().to_ascii_lowercase(),
                bold: weight >= BOLD_THRESHOLD,
                italic,
            },
            metrics,
        );
        Ok(())
    }

    fn custom(&self, family: &str, bold: bool, italic: bool) -> Option<&CustomFontMetrics> {
        [(bold, italic), (bold, false), (false, false)]
            .into_iter()
            .find_map(|(bold, italic)| {
                self.faces.get(&FaceKey {
                    family: family.to_string(),
                    bold,
                    italic,
                })
            })
    }

    /// Resolve a CSS font-family list. The first family that is either
    /// registered or a known alias wins; otherwise Helvetica.
    pub fn resolve(&self, family_list: &str, weight: u32, italic: bool) -> ResolvedFace<'_> {
        let bold = weight >= BOLD_THRESHOLD;
        for raw in family_list.split(',') {
            let name = raw
                .trim()
                .trim_matches(|c| c == '"' || c == '\'')
                .to_ascii_lowercase();
            if let Some(metrics) = self.custom(&name, bold, italic) {
                return ResolvedFace::Custom(metrics);
            }
            if let Some(font) = StandardFont::from_alias(&name, bold) {
                return ResolvedFace::Standard(font);
            }
        }
        ResolvedFace::Standard(if bold {
            StandardFont::HelveticaBold
        } else {
            StandardFont::Helvetica
        })
    }
}

/// Font context used by the layout probe.
#[derive(Debug, Default)]
pub struct FontContext {
    registry: FontRegistry,
}

impl FontContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context with the fonts listed in the config registered.
    pub fn with_fonts(fonts: &[crate::config::FontEntry]) -> Result<Self, PagewrightError> {
        let mut ctx = Self::new();
        for entry in fonts {
            let data = crate::image_loader::decode_base64_source(&entry.src)
                .map_err(|e| PagewrightError::FontError(format!("{}: {}", entry.family, e)))?;
            ctx.registry
                .register(&entry.family, entry.weight, entry.italic, &data)?;
        }
        Ok(ctx)
    }

    pub fn char_width(
        &self,
        ch: char,
        family: &str,
        weight: u32,
        italic: bool,
        font_size: f64,
    ) -> f64 {
        self.registry
            .resolve(family, weight, italic)
            .char_width(ch, font_size)
    }

    pub fn measure_string(
        &self,
        text: &str,
        family: &str,
        weight: u32,
        italic: bool,
        font_size: f64,
    ) -> f64 {
        let face = self.registry.resolve(family, weight, italic);
        text.chars().map(|ch| face.char_width(ch, font_size)).sum()
    }
}
