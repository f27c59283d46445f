//! # Editor Configuration
//!
//! Everything layout-affecting lives here: the sheet size, the page chrome
//! reservations, the content typography the probe measures with and the
//! interaction constants of the editor. All lengths are CSS pixels
//! (96 per inch) since that is what the page stylesheet is written in.
//!
//! Every field has a default, so a config file only names what it changes:
//!
//! ```json
//! { "overflowBuffer": 8, "content": { "fontSize": 14.667 } }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::PagewrightError;

/// Standard sheet sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in CSS pixels.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (793.7, 1122.52),
            PageSize::Letter => (816.0, 1056.0),
            PageSize::Legal => (816.0, 1344.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Edge values (top, right, bottom, left).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn symmetric(vertical: f64, horizontal: f64) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Heights and widths reserved by the page chrome around the content column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChromeMetrics {
    /// Full letterhead on the first page.
    pub letterhead_height: f64,
    /// Minimal spacer replacing the letterhead on later pages.
    pub spacer_height: f64,
    /// First-page footer (logo block, accreditation text).
    pub first_footer_height: f64,
    /// Footer on every later page (page number, logo).
    pub middle_footer_height: f64,
    /// Sidebar column. Reserved on every page, visible on the first only.
    pub sidebar_width: f64,
    pub sidebar_gap: f64,
}

impl Default for ChromeMetrics {
    fn default() -> Self {
        Self {
            letterhead_height: 130.0,
            spacer_height: 40.0,
            first_footer_height: 90.0,
            middle_footer_height: 60.0,
            sidebar_width: 170.0,
            sidebar_gap: 16.0,
        }
    }
}

/// Typography of editable content, as the print stylesheet sets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContentStyle {
    pub font_family: String,
    pub font_size: f64,
    /// Multiplier of the font size.
    pub line_height: f64,
    pub paragraph_spacing: f64,
    /// h1..h6 font sizes.
    pub heading_sizes: [f64; 6],
    pub heading_spacing: f64,
    pub list_indent: f64,
    pub list_spacing: f64,
    pub table_cell_padding: f64,
    pub table_border: f64,
    pub table_spacing: f64,
}

impl Default for ContentStyle {
    fn default() -> Self {
        Self {
            font_family: "Arial, sans-serif".to_string(),
            font_size: 16.0,
            line_height: 1.5,
            paragraph_spacing: 8.0,
            heading_sizes: [32.0, 24.0, 18.72, 16.0, 13.28, 10.72],
            heading_spacing: 10.0,
            list_indent: 40.0,
            list_spacing: 8.0,
            table_cell_padding: 6.0,
            table_border: 1.0,
            table_spacing: 8.0,
        }
    }
}

/// Geometry of the signatory block appended to the last page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignatoryStyle {
    pub top_margin: f64,
    pub label_height: f64,
    /// Blank space above each name for the handwritten or placed signature.
    pub signature_space: f64,
    pub line_height: f64,
    pub entries_per_row: usize,
    pub group_spacing: f64,
}

impl Default for SignatoryStyle {
    fn default() -> Self {
        Self {
            top_margin: 24.0,
            label_height: 24.0,
            signature_space: 40.0,
            line_height: 20.0,
            entries_per_row: 2,
            group_spacing: 16.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignatureConfig {
    /// How far past the "Prepared by:" region a signature may be dragged.
    pub clamp_margin: f64,
    /// Rendered width of a placed signature image.
    pub display_width: f64,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            clamp_margin: 10.0,
            display_width: 150.0,
        }
    }
}

/// Text printed in the first-page letterhead and footer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Letterhead {
    pub institution: String,
    pub office: String,
    pub address: String,
    pub logo_url: String,
    pub accreditation: String,
}

impl Default for Letterhead {
    fn default() -> Self {
        Self {
            institution: "University".to_string(),
            office: "Office of Student Affairs".to_string(),
            address: String::new(),
            logo_url: String::new(),
            accreditation: String::new(),
        }
    }
}

/// A custom font to register with the layout probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontEntry {
    pub family: String,
    /// Base64-encoded font data, or a data URI (e.g. "data:font/ttf;base64,...").
    pub src: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub italic: bool,
}

fn default_weight() -> u32 {
    400
}

/// Complete editor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    pub page_size: PageSize,
    pub margin: Edges,
    pub chrome: ChromeMetrics,
    pub content: ContentStyle,
    pub signatories: SignatoryStyle,
    /// Safety margin subtracted from every page budget against rounding.
    pub overflow_buffer: f64,
    /// Quiet period after the last edit before pagination runs.
    pub debounce_ms: u64,
    pub signature: SignatureConfig,
    pub table_picker_rows: usize,
    pub table_picker_cols: usize,
    /// Initial zoom in percent.
    pub default_zoom: u32,
    pub history_limit: usize,
    pub letterhead: Letterhead,
    pub fonts: Vec<FontEntry>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            margin: Edges::symmetric(38.0, 48.0),
            chrome: ChromeMetrics::default(),
            content: ContentStyle::default(),
            signatories: SignatoryStyle::default(),
            overflow_buffer: 5.0,
            debounce_ms: 250,
            signature: SignatureConfig::default(),
            table_picker_rows: 10,
            table_picker_cols: 10,
            default_zoom: 100,
            history_limit: 100,
            letterhead: Letterhead::default(),
            fonts: Vec::new(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, PagewrightError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Width of the editable content column, identical on every page since
    /// the sidebar's space stays reserved after the first.
    pub fn content_width(&self) -> f64 {
        let (page_w, _) = self.page_size.dimensions();
        (page_w - self.margin.horizontal() - self.chrome.sidebar_width - self.chrome.sidebar_gap)
            .max(0.0)
    }
}
