//! Advance widths for the built-in fonts, in 1/1000 em.
//!
//! Covers printable ASCII (0x20..=0x7E). Anything outside that range uses the
//! font's default advance, which is close enough for the Latin-1 text the
//! portal's documents are written in.

use super::StandardFont;

pub struct StandardFontMetrics {
    widths: &'static [u16; 95],
    default_width: u16,
}

#[rustfmt::skip]
static HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
static HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

static COURIER: [u16; 95] = [600; 95];

static HELVETICA_METRICS: StandardFontMetrics = StandardFontMetrics {
    widths: &HELVETICA,
    default_width: 556,
};

static HELVETICA_BOLD_METRICS: StandardFontMetrics = StandardFontMetrics {
    widths: &HELVETICA_BOLD,
    default_width: 611,
};

static COURIER_METRICS: StandardFontMetrics = StandardFontMetrics {
    widths: &COURIER,
    default_width: 600,
};

impl StandardFontMetrics {
    /// Advance width of `ch` at `font_size` (same unit as the size).
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let code = ch as u32;
        let units = if (0x20..=0x7E).contains(&code) {
            self.widths[(code - 0x20) as usize]
        } else if ch == '\u{00A0}' {
            self.widths[0]
        } else if ch == '\u{00AD}' || ch == '\u{200B}' {
            0
        } else {
            self.default_width
        };
        units as f64 / 1000.0 * font_size
    }
}

impl StandardFont {
    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            StandardFont::Helvetica => &HELVETICA_METRICS,
            StandardFont::HelveticaBold => &HELVETICA_BOLD_METRICS,
            StandardFont::Courier => &COURIER_METRICS,
        }
    }
}
