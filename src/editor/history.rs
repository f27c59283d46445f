//! Undo/redo over whole-document snapshots.

use std::collections::VecDeque;

use crate::model::Page;

#[derive(Debug)]
pub struct History {
    undo: VecDeque<Vec<Page>>,
    redo: Vec<Vec<Page>>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Remember `snapshot` as the state before an edit. A new edit makes
    /// the redo branch unreachable.
    pub fn record(&mut self, snapshot: Vec<Page>) {
        if self.undo.back() == Some(&snapshot) {
            return;
        }
        if self.undo.len() == self.limit {
            self.undo.pop_front();
        }
        self.undo.push_back(snapshot);
        self.redo.clear();
    }

    pub fn undo(&mut self, current: Vec<Page>) -> Option<Vec<Page>> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current);
        Some(previous)
    }

    pub fn redo(&mut self, current: Vec<Page>) -> Option<Vec<Page>> {
        let next = self.redo.pop()?;
        self.undo.push_back(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}
