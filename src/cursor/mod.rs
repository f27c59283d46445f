//! # Caret Preservation
//!
//! A reflow replaces every page's content, which destroys the browser's
//! selection. Before the reflow the caret is turned into a plain character
//! offset, and afterwards that offset is turned back into a caret.
//!
//! Splitting only ever cuts between words and never adds or drops text, so
//! the concatenated text of the whole document is the same before and after
//! a reflow. A document-wide offset therefore survives even when the caret's
//! word moved to the next page.

use serde::{Deserialize, Serialize};

use crate::model::Page;

/// A live caret: the `node`-th text node of a page (document order) and a
/// character offset inside it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextAnchor {
    pub node: usize,
    pub offset: usize,
}

/// A caret as a character offset into the flattened text of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextPosition {
    pub page_index: usize,
    pub offset: usize,
}

/// Convert a live anchor on `page` into a page-relative character offset.
/// Anchors past the last text node sit at the end of the page.
pub fn capture(page: &Page, page_index: usize, anchor: TextAnchor) -> TextPosition {
    let nodes = page.text_nodes();
    let before: usize = nodes.iter().take(anchor.node).map(|t| t.chars().count()).sum();
    let within = nodes
        .get(anchor.node)
        .map(|t| anchor.offset.min(t.chars().count()))
        .unwrap_or(0);
    TextPosition {
        page_index,
        offset: before + within,
    }
}

/// Find the text node holding `pos.offset` on `page`. Offsets past the end
/// collapse to the end of the last text node; a page without text yields
/// the start of its container.
pub fn restore(page: &Page, pos: &TextPosition) -> TextAnchor {
    let nodes = page.text_nodes();
    let mut remaining = pos.offset;
    for (i, text) in nodes.iter().enumerate() {
        let len = text.chars().count();
        if remaining <= len {
            return TextAnchor {
                node: i,
                offset: remaining,
            };
        }
        remaining -= len;
    }
    match nodes.last() {
        Some(last) => TextAnchor {
            node: nodes.len() - 1,
            offset: last.chars().count(),
        },
        None => TextAnchor::default(),
    }
}

fn page_text_len(page: &Page) -> usize {
    page.text_nodes().iter().map(|t| t.chars().count()).sum()
}

/// Offset of `pos` in the text of the whole document.
pub fn document_offset(pages: &[Page], pos: &TextPosition) -> usize {
    let before: usize = pages.iter().take(pos.page_index).map(page_text_len).sum();
    let here = pages.get(pos.page_index).map(page_text_len).unwrap_or(0);
    before + pos.offset.min(here)
}

/// The page-relative position of a document-wide offset. An offset on a
/// page boundary stays at the end of the earlier page; past the end of the
/// document it clamps to the last page.
pub fn locate(pages: &[Page], document_offset: usize) -> TextPosition {
    let mut remaining = document_offset;
    for (i, page) in pages.iter().enumerate() {
        let len = page_text_len(page);
        if remaining <= len {
            return TextPosition {
                page_index: i,
                offset: remaining,
            };
        }
        remaining -= len;
    }
    TextPosition {
        page_index: pages.len().saturating_sub(1),
        offset: pages.last().map(page_text_len).unwrap_or(0),
    }
}

/// Holds the caret captured from user input until the reflow it triggered
/// has run. Programmatic reflows find nothing pending and leave the caret
/// alone.
#[derive(Debug, Default)]
pub struct CursorTracker {
    pending: Option<TextPosition>,
}

impl CursorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, pos: TextPosition) {
        self.pending = Some(pos);
    }

    /// Consume the pending position, if any.
    pub fn take(&mut self) -> Option<TextPosition> {
        self.pending.take()
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }
}
