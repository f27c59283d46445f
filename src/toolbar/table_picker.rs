//! The table dimension picker: a grid of cells the user hovers to choose a
//! size. Opening the picker moves focus away from the page, so the page
//! selection is captured when it opens and the table goes there on commit.

use super::format::TextRange;

/// Where the selection was when the picker opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedSelection {
    pub page_index: usize,
    pub range: TextRange,
}

/// A committed choice, ready to be inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableInsertion {
    /// `None` when no selection was captured: append to the focused page.
    pub at: Option<SavedSelection>,
    pub rows: usize,
    pub cols: usize,
}

#[derive(Debug)]
pub struct TablePicker {
    max_rows: usize,
    max_cols: usize,
    open: bool,
    hover: Option<(usize, usize)>,
    saved: Option<SavedSelection>,
}

impl TablePicker {
    pub fn new(max_rows: usize, max_cols: usize) -> Self {
        Self {
            max_rows: max_rows.max(1),
            max_cols: max_cols.max(1),
            open: false,
            hover: None,
            saved: None,
        }
    }

    pub fn grid(&self) -> (usize, usize) {
        (self.max_rows, self.max_cols)
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self, selection: Option<SavedSelection>) {
        self.open = true;
        self.hover = None;
        self.saved = selection;
    }

    /// Hover the cell at 1-based `row`, `col`, clamped to the grid.
    pub fn hover(&mut self, row: usize, col: usize) {
        if !self.open {
            return;
        }
        self.hover = Some((row.clamp(1, self.max_rows), col.clamp(1, self.max_cols)));
    }

    /// Whether the cell at 1-based `row`, `col` is highlighted.
    pub fn is_highlighted(&self, row: usize, col: usize) -> bool {
        matches!(self.hover, Some((r, c)) if row <= r && col <= c)
    }

    /// The "rows × cols" caption under the grid.
    pub fn label(&self) -> String {
        match self.hover {
            Some((r, c)) => format!("{} × {}", r, c),
            None => "Insert table".to_string(),
        }
    }

    /// Commit the hovered size and close. Nothing to commit without a hover.
    pub fn commit(&mut self) -> Option<TableInsertion> {
        let (rows, cols) = self.hover?;
        let insertion = TableInsertion {
            at: self.saved,
            rows,
            cols,
        };
        self.close();
        Some(insertion)
    }

    pub fn close(&mut self) {
        self.open = false;
        self.hover = None;
        self.saved = None;
    }
}
