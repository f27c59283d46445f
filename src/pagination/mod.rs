//! # Pagination Engine
//!
//! Re-partitions a document's blocks into pages under the measured budgets.
//!
//! The document is first flattened back into one block list, re-joining any
//! block a previous run split across a page boundary. Blocks are then added
//! to the current page one at a time and the page re-measured; the first
//! block that overflows is either deferred whole to the next page or, for
//! text blocks, cut at the largest word prefix that still fits.
//!
//! Every page is held to its own budget (the first page has the full
//! letterhead, so it is shorter) less a small buffer that absorbs rounding
//! differences between this probe and the browser. The one exception is an
//! atomic block taller than an empty page: it is placed whole and allowed to
//! overflow rather than looping forever.

use std::collections::VecDeque;

use crate::layout::page_break::{decide_break, BreakDecision};
use crate::layout::LayoutProbe;
use crate::model::{Block, Page, Signatories, TextBlock};

/// Result of a reflow.
#[derive(Debug, Clone, PartialEq)]
pub struct Pagination {
    pub pages: Vec<Page>,
    /// Page the signatory block renders on, when there is one. Always the
    /// last page; it is a blank page of its own when the last content page
    /// had no room left.
    pub signatory_page: Option<usize>,
}

impl Pagination {
    /// The pages left as they are, for when no budget is available. Any
    /// signatories still go on the last page.
    pub fn as_is(pages: &[Page], signatories: &Signatories) -> Self {
        let pages = if pages.is_empty() {
            vec![Page::default()]
        } else {
            pages.to_vec()
        };
        Self {
            signatory_page: last_page_if_signed(&pages, signatories),
            pages,
        }
    }
}

/// The last page's index when there are signatories to render.
pub fn last_page_if_signed(pages: &[Page], signatories: &Signatories) -> Option<usize> {
    if signatories.is_empty() {
        None
    } else {
        Some(pages.len().saturating_sub(1))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaginationOutcome {
    /// Budgets are not measured yet; nothing was done.
    NotReady,
    /// The reflow reproduced the current pages exactly. The signatory
    /// block may still have moved onto or off the last page.
    Unchanged { signatory_page: Option<usize> },
    Reflowed(Pagination),
}

pub struct Paginator<'a, P: LayoutProbe> {
    probe: &'a P,
    overflow_buffer: f64,
}

impl<'a, P: LayoutProbe> Paginator<'a, P> {
    pub fn new(probe: &'a P, overflow_buffer: f64) -> Self {
        Self {
            probe,
            overflow_buffer,
        }
    }

    /// Usable height of page `page_index`.
    pub fn limit(&self, page_index: usize) -> f64 {
        self.probe.budget().for_page(page_index) - self.overflow_buffer
    }

    /// Reflow `pages`, reporting whether anything changed.
    pub fn paginate(&self, pages: &[Page], signatories: &Signatories) -> PaginationOutcome {
        if !self.probe.budget().is_ready() {
            log::debug!("pagination skipped: content budget not measured yet");
            return PaginationOutcome::NotReady;
        }
        let result = self.reflow(pages, signatories);
        if result.pages.as_slice() == pages {
            PaginationOutcome::Unchanged {
                signatory_page: result.signatory_page,
            }
        } else {
            PaginationOutcome::Reflowed(result)
        }
    }

    /// Reflow unconditionally. Callers must have checked the budget.
    pub fn reflow(&self, pages: &[Page], signatories: &Signatories) -> Pagination {
        let blocks = merge_pages(pages);
        let block_count = blocks.len();
        let mut pages = self.flow(blocks);

        let signatories_h = self.probe.measure_signatories(signatories);
        let signatory_page = if signatories_h > 0.0 {
            let last = pages.len() - 1;
            let used = self.probe.measure(&pages[last].blocks);
            if used + signatories_h > self.limit(last) {
                log::debug!(
                    "signatories ({:.1}px) don't fit under {:.1}px of content, adding a page",
                    signatories_h,
                    used
                );
                pages.push(Page::default());
            }
            Some(pages.len() - 1)
        } else {
            None
        };

        log::debug!("reflowed {} blocks into {} pages", block_count, pages.len());
        Pagination {
            pages,
            signatory_page,
        }
    }

    fn flow(&self, blocks: Vec<Block>) -> Vec<Page> {
        let mut queue: VecDeque<Block> = blocks.into();
        let mut pages: Vec<Page> = Vec::new();
        let mut current: Vec<Block> = Vec::new();

        while let Some(block) = queue.pop_front() {
            let limit = self.limit(pages.len());
            current.push(block);
            if self.probe.measure(&current) <= limit {
                continue;
            }
            let Some(block) = current.pop() else { continue };

            let token_count = block.as_text_block().map(TextBlock::token_count).unwrap_or(0);
            let decision = decide_break(false, block.is_atomic(), token_count, current.is_empty(), |k| {
                match block.as_text_block() {
                    Some(tb) => {
                        let (head, _) = tb.split_at_token(k);
                        let mut probe_blocks = current.clone();
                        probe_blocks.push(rewrap(&block, head));
                        self.probe.measure(&probe_blocks) <= limit
                    }
                    None => false,
                }
            });

            match decision {
                BreakDecision::Place => current.push(block),
                BreakDecision::MoveToNextPage => {
                    pages.push(Page::new(std::mem::take(&mut current)));
                    queue.push_front(block);
                }
                BreakDecision::PlaceOversized => {
                    log::warn!(
                        "block on page {} is taller than the page ({:.1}px available); placing it whole",
                        pages.len(),
                        limit
                    );
                    // the next block overflows this page and moves on by itself
                    current.push(block);
                }
                BreakDecision::Split {
                    tokens_on_current_page,
                } => {
                    // decide_break only splits text blocks
                    let Some(tb) = block.as_text_block() else {
                        current.push(block);
                        continue;
                    };
                    let (head, tail) = tb.split_at_token(tokens_on_current_page);
                    current.push(rewrap(&block, head));
                    pages.push(Page::new(std::mem::take(&mut current)));
                    queue.push_front(rewrap(&block, tail));
                }
            }
        }

        // The leftover is the last page; an empty document is one empty page
        pages.push(Page::new(current));
        pages
    }
}

/// Put a split half back into the variant it came from.
fn rewrap(original: &Block, tb: TextBlock) -> Block {
    match original {
        Block::Heading(_) => Block::Heading(tb),
        _ => Block::Paragraph(tb),
    }
}

/// Concatenate every page's blocks, re-joining each block that was split at
/// a page boundary with its continuation. Continuation markers anywhere else
/// are stale (the text after them was edited away) and are dropped.
pub fn merge_pages(pages: &[Page]) -> Vec<Block> {
    let mut merged: Vec<Block> = Vec::new();
    for page in pages {
        let mut blocks = page.blocks.iter().cloned();
        let Some(first) = blocks.next() else { continue };

        let joined = match (merged.last_mut().and_then(Block::as_text_block_mut), &first) {
            (Some(prev), Block::Paragraph(next) | Block::Heading(next)) if prev.joins_with(next) => {
                prev.join(next.clone());
                true
            }
            (Some(prev), _) => {
                prev.continues = false;
                false
            }
            (None, _) => false,
        };
        if !joined {
            merged.push(first);
        }
        for block in blocks {
            clear_continues(merged.last_mut());
            merged.push(block);
        }
    }
    clear_continues(merged.last_mut());
    merged
}

fn clear_continues(block: Option<&mut Block>) {
    if let Some(tb) = block.and_then(Block::as_text_block_mut) {
        tb.continues = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ContentHeightBudget;
    use crate::model::{SignatoryCategory, Table};
    use pretty_assertions::assert_eq;

    /// Every text token is 10px tall, every atomic block 50px.
    struct TokenProbe {
        budget: ContentHeightBudget,
    }

    impl LayoutProbe for TokenProbe {
        fn budget(&self) -> ContentHeightBudget {
            self.budget
        }

        fn measure(&self, blocks: &[Block]) -> f64 {
            blocks
                .iter()
                .map(|b| match b.as_text_block() {
                    Some(tb) => tb.token_count() as f64 * 10.0,
                    None => 50.0,
                })
                .sum()
        }

        fn measure_signatories(&self, signatories: &Signatories) -> f64 {
            if signatories.is_empty() {
                0.0
            } else {
                30.0
            }
        }
    }

    fn probe(first: f64, rest: f64) -> TokenProbe {
        TokenProbe {
            budget: ContentHeightBudget::new(first, rest),
        }
    }

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    fn page(html: &str) -> Page {
        Page::from_html(html).unwrap()
    }

    #[test]
    fn not_ready_is_a_no_op() {
        let p = probe(0.0, 100.0);
        let outcome = Paginator::new(&p, 5.0).paginate(&[page("<p>a</p>")], &Signatories::new());
        assert_eq!(outcome, PaginationOutcome::NotReady);
    }

    #[test]
    fn empty_document_is_one_page() {
        let p = probe(100.0, 100.0);
        let result = Paginator::new(&p, 5.0).reflow(&[], &Signatories::new());
        assert_eq!(result.pages, vec![Page::default()]);
        assert_eq!(result.signatory_page, None);
    }

    #[test]
    fn paragraph_splits_at_word_boundary() {
        // 20 words × 10px on a 105 - 5 = 100px page: 10 words per page
        let p = probe(105.0, 105.0);
        let result = Paginator::new(&p, 5.0).reflow(&[page(&format!("<p>{}</p>", words(20)))], &Signatories::new());
        assert_eq!(result.pages.len(), 2);
        assert_eq!(
            result.pages[0].to_html(),
            format!("<p data-continues=\"true\">{} </p>", words(10))
        );
        assert_eq!(
            result.pages[1].to_html(),
            format!("<p>{}</p>", (10..20).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" "))
        );
    }

    #[test]
    fn first_page_uses_its_own_budget() {
        let p = probe(55.0, 105.0);
        let result = Paginator::new(&p, 5.0).reflow(&[page(&format!("<p>{}</p>", words(20)))], &Signatories::new());
        let counts: Vec<usize> = result
            .pages
            .iter()
            .map(|pg| pg.blocks[0].as_text_block().unwrap().token_count())
            .collect();
        assert_eq!(counts, vec![5, 10, 5]);
    }

    #[test]
    fn atomic_block_is_deferred() {
        let p = probe(105.0, 105.0);
        let input = page(&format!("<p>{}</p><ul><li>x</li></ul>", words(7)));
        let result = Paginator::new(&p, 5.0).reflow(&[input], &Signatories::new());
        assert_eq!(result.pages.len(), 2);
        assert_eq!(result.pages[0].blocks.len(), 1);
        assert!(matches!(result.pages[1].blocks[0], Block::List(_)));
    }

    #[test]
    fn oversized_atomic_block_is_placed_whole() {
        let p = probe(45.0, 45.0);
        let input = Page::new(vec![Block::Table(Table::skeleton(1, 1)), Block::LineBreak]);
        let result = Paginator::new(&p, 5.0).reflow(&[input], &Signatories::new());
        assert_eq!(result.pages.len(), 2);
        assert!(matches!(result.pages[0].blocks[0], Block::Table(_)));
        assert_eq!(result.pages[1].blocks, vec![Block::LineBreak]);
    }

    #[test]
    fn continuation_is_rejoined_before_reflow() {
        let p = probe(1000.0, 1000.0);
        let pages = vec![
            page("<p data-continues=\"true\">alpha beta </p>"),
            page("<p>gamma</p><p>delta</p>"),
        ];
        let result = Paginator::new(&p, 5.0).reflow(&pages, &Signatories::new());
        assert_eq!(result.pages.len(), 1);
        assert_eq!(result.pages[0].to_html(), "<p>alpha beta gamma</p><p>delta</p>");
    }

    #[test]
    fn stale_markers_are_dropped() {
        let merged = merge_pages(&[page("<p data-continues=\"true\">a</p><p>b</p>"), page("<h2>c</h2>")]);
        assert!(merged.iter().all(|b| !b.as_text_block().map(|t| t.continues).unwrap_or(false)));
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn reflow_is_idempotent() {
        let p = probe(85.0, 125.0);
        let input = page(&format!(
            "<h1>Plan</h1><p>{}</p><table><tr><td>x</td></tr></table><p>{}</p>",
            words(13),
            words(25)
        ));
        let paginator = Paginator::new(&p, 5.0);
        let once = paginator.reflow(&[input], &Signatories::new());
        assert_eq!(
            paginator.paginate(&once.pages, &Signatories::new()),
            PaginationOutcome::Unchanged { signatory_page: None }
        );
    }

    #[test]
    fn signatories_share_the_last_page_when_they_fit() {
        let p = probe(105.0, 105.0);
        let mut s = Signatories::new();
        s.add(SignatoryCategory::PreparedBy, "Ana", "Secretary").unwrap();
        let result = Paginator::new(&p, 5.0).reflow(&[page(&format!("<p>{}</p>", words(6)))], &s);
        assert_eq!(result.pages.len(), 1);
        assert_eq!(result.signatory_page, Some(0));
    }

    #[test]
    fn signatories_overflow_to_a_blank_page() {
        let p = probe(105.0, 105.0);
        let mut s = Signatories::new();
        s.add(SignatoryCategory::NotedBy, "Ben", "Adviser").unwrap();
        let result = Paginator::new(&p, 5.0).reflow(&[page(&format!("<p>{}</p>", words(8)))], &s);
        assert_eq!(result.pages.len(), 2);
        assert!(result.pages[1].is_empty());
        assert_eq!(result.signatory_page, Some(1));

        // and the blank page goes away once they're removed
        let again = Paginator::new(&p, 5.0).reflow(&result.pages, &Signatories::new());
        assert_eq!(again.pages.len(), 1);
    }
}
