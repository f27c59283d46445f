//! # Layout Probe
//!
//! Pagination needs one question answered over and over: how tall is this
//! list of blocks once rendered in the content column? The answer has to
//! match what the print stylesheet produces, so the probe uses the same
//! font metrics and the real column width.
//!
//! Heights are stacked the way normal flow stacks them: each block has a
//! top and bottom margin, adjacent margins collapse to the larger of the
//! two. Adding a block never makes the stack shorter, and neither does
//! adding words to a text block. The binary search in [`page_break`] depends
//! on both.

pub mod page_break;
pub mod sandbox;

pub use sandbox::{ContentHeightBudget, MeasurementSandbox};

use crate::config::{ContentStyle, EditorConfig, SignatoryStyle};
use crate::error::PagewrightError;
use crate::font::FontContext;
use crate::html::{style_property, HtmlElement, HtmlNode};
use crate::model::{blocks_from_nodes, Block, List, Signatories, Table, TextBlock};
use crate::text::{parse_length, TextLayout, TextStyle};

/// The measurement contract pagination is written against.
pub trait LayoutProbe {
    /// Content heights of the two chrome variants.
    fn budget(&self) -> ContentHeightBudget;

    /// Rendered height of `blocks` stacked in the content column.
    fn measure(&self, blocks: &[Block]) -> f64;

    /// Height of the signatory block appended to the last page; zero when
    /// there is nobody to sign.
    fn measure_signatories(&self, signatories: &Signatories) -> f64;
}

/// A block's height with the margins that collapse against its neighbours.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BlockBox {
    margin_top: f64,
    height: f64,
    margin_bottom: f64,
}

/// Measures blocks with real font metrics.
pub struct TextMeasurer {
    fonts: FontContext,
    text: TextLayout,
    style: ContentStyle,
    signatory_style: SignatoryStyle,
    column_width: f64,
    budget: ContentHeightBudget,
}

impl TextMeasurer {
    pub fn new(config: &EditorConfig) -> Result<Self, PagewrightError> {
        Ok(Self {
            fonts: FontContext::with_fonts(&config.fonts)?,
            text: TextLayout::new(),
            style: config.content.clone(),
            signatory_style: config.signatories.clone(),
            column_width: config.content_width(),
            budget: MeasurementSandbox::new(config).measure(),
        })
    }

    /// A measurer with an explicit budget, as when the host measured the
    /// chrome itself.
    pub fn with_budget(config: &EditorConfig, budget: ContentHeightBudget) -> Result<Self, PagewrightError> {
        let mut measurer = Self::new(config)?;
        measurer.budget = budget;
        Ok(measurer)
    }

    pub fn set_budget(&mut self, budget: ContentHeightBudget) {
        self.budget = budget;
    }

    pub fn column_width(&self) -> f64 {
        self.column_width
    }

    fn base_style(&self) -> TextStyle {
        TextStyle::new(&self.style.font_family, self.style.font_size)
    }

    fn stack(&self, blocks: &[Block], width: f64, inherited: &TextStyle) -> f64 {
        let mut total = 0.0;
        let mut prev_bottom: Option<f64> = None;
        for block in blocks {
            let b = self.block_box(block, width, inherited);
            total += match prev_bottom {
                Some(bottom) => bottom.max(b.margin_top) - bottom,
                None => b.margin_top,
            };
            total += b.height + b.margin_bottom;
            prev_bottom = Some(b.margin_bottom);
        }
        total
    }

    fn block_box(&self, block: &Block, width: f64, inherited: &TextStyle) -> BlockBox {
        match block {
            Block::Paragraph(tb) => self.paragraph_box(tb, width, inherited),
            Block::Heading(tb) => {
                let level = block.heading_level().unwrap_or(2).clamp(1, 6) as usize;
                let mut style = inherited.clone().bold();
                style.font_size = self.style.heading_sizes[level - 1];
                let style = style.nested("", &tb.attrs);
                BlockBox {
                    margin_top: self.style.heading_spacing,
                    height: self.text_height(tb, width, &style),
                    margin_bottom: self.style.heading_spacing,
                }
            }
            Block::Table(table) => BlockBox {
                margin_top: self.style.table_spacing,
                height: self.table_height(table, width, inherited),
                margin_bottom: self.style.table_spacing,
            },
            Block::List(list) => BlockBox {
                margin_top: self.style.list_spacing,
                height: self.list_height(list, width, inherited),
                margin_bottom: self.style.list_spacing,
            },
            Block::LineBreak => BlockBox {
                margin_top: 0.0,
                height: inherited.font_size * self.style.line_height,
                margin_bottom: 0.0,
            },
            Block::Opaque(el) => self.opaque_box(el, width, inherited),
        }
    }

    fn paragraph_box(&self, tb: &TextBlock, width: f64, inherited: &TextStyle) -> BlockBox {
        let tag = tb.tag.as_deref().unwrap_or("");
        let style = inherited.nested(tag, &tb.attrs);
        let (margin, indent) = match tag {
            "p" => (self.style.paragraph_spacing, 0.0),
            "blockquote" => (self.style.paragraph_spacing, 2.0 * self.style.list_indent),
            "pre" => (self.style.paragraph_spacing, 0.0),
            _ => (0.0, 0.0),
        };
        let style = if tag == "pre" {
            TextStyle {
                font_family: "monospace".to_string(),
                ..style
            }
        } else {
            style
        };
        BlockBox {
            margin_top: margin,
            height: self.text_height(tb, (width - indent).max(1.0), &style),
            margin_bottom: margin,
        }
    }

    fn text_height(&self, tb: &TextBlock, width: f64, style: &TextStyle) -> f64 {
        self.text
            .measure_inlines(&self.fonts, &tb.inlines, style, width, self.style.line_height)
    }

    fn table_height(&self, table: &Table, width: f64, inherited: &TextStyle) -> f64 {
        let cols = table.column_count().max(1) as f64;
        let border = self.style.table_border;
        let padding = self.style.table_cell_padding;
        let cell_width = ((width - border * (cols + 1.0)) / cols - 2.0 * padding).max(1.0);

        let rows: f64 = table
            .rows
            .iter()
            .map(|row| {
                let content = row
                    .cells
                    .iter()
                    .map(|cell| {
                        let style = if cell.header {
                            inherited.clone().bold()
                        } else {
                            inherited.clone()
                        };
                        let h = self.stack(&cell.blocks, cell_width, &style);
                        // An empty cell still holds a line box
                        h.max(style.font_size * self.style.line_height)
                    })
                    .fold(0.0, f64::max);
                content + 2.0 * padding
            })
            .sum();
        rows + border * (table.rows.len() as f64 + 1.0)
    }

    fn list_height(&self, list: &List, width: f64, inherited: &TextStyle) -> f64 {
        let item_width = (width - self.style.list_indent).max(1.0);
        list.items
            .iter()
            .map(|item| {
                let h = self.stack(&item.blocks, item_width, inherited);
                h.max(inherited.font_size * self.style.line_height)
            })
            .sum()
    }

    fn opaque_box(&self, el: &HtmlElement, width: f64, inherited: &TextStyle) -> BlockBox {
        let explicit_height = el
            .attr("height")
            .and_then(|h| parse_length(h, inherited.font_size))
            .or_else(|| {
                el.attr("style")
                    .and_then(|s| style_property(s, "height"))
                    .and_then(|h| parse_length(h, inherited.font_size))
            });
        match el.tag.as_str() {
            "hr" => BlockBox {
                margin_top: self.style.paragraph_spacing,
                height: explicit_height.unwrap_or(2.0),
                margin_bottom: self.style.paragraph_spacing,
            },
            "img" => BlockBox {
                margin_top: 0.0,
                height: explicit_height.unwrap_or(0.0),
                margin_bottom: 0.0,
            },
            _ => {
                let style = inherited.nested(&el.tag, &el.attrs);
                let height = explicit_height.unwrap_or_else(|| {
                    let children: Vec<HtmlNode> = el.children.clone();
                    self.stack(&blocks_from_nodes(children), width, &style)
                });
                let margin = match el.tag.as_str() {
                    "figure" | "dl" | "form" | "fieldset" => self.style.paragraph_spacing,
                    _ => 0.0,
                };
                BlockBox {
                    margin_top: margin,
                    height,
                    margin_bottom: margin,
                }
            }
        }
    }
}

impl LayoutProbe for TextMeasurer {
    fn budget(&self) -> ContentHeightBudget {
        self.budget
    }

    fn measure(&self, blocks: &[Block]) -> f64 {
        self.stack(blocks, self.column_width, &self.base_style())
    }

    fn measure_signatories(&self, signatories: &Signatories) -> f64 {
        signatory_block_height(&self.signatory_style, signatories)
    }
}

/// Height of the signatory block: a label per category, then its entries
/// laid out `entries_per_row` across, each with room to sign above the name
/// and position lines.
pub fn signatory_block_height(style: &SignatoryStyle, signatories: &Signatories) -> f64 {
    let per_row = style.entries_per_row.max(1);
    let groups: Vec<f64> = signatories
        .groups()
        .map(|(_, entries)| {
            let rows = entries.len().div_ceil(per_row) as f64;
            style.label_height + rows * signatory_entry_height(style)
        })
        .collect();
    if groups.is_empty() {
        return 0.0;
    }
    let gaps = (groups.len() - 1) as f64 * style.group_spacing;
    style.top_margin + groups.iter().sum::<f64>() + gaps
}

/// Height of one signatory entry: signing space, name line, position line.
pub fn signatory_entry_height(style: &SignatoryStyle) -> f64 {
    style.signature_space + 2.0 * style.line_height
}
