//! # Page Break Decisions
//!
//! What to do with a block that overflows the page it is being added to.
//! Text blocks are cut at the largest word prefix that still fits; atomic
//! blocks move whole; nothing is ever dropped.

/// Decide what to do when a block doesn't fit on the current page.
#[derive(Debug, Clone, PartialEq)]
pub enum BreakDecision {
    /// Place the entire block on the current page (it fits).
    Place,
    /// Move the entire block to the next page.
    MoveToNextPage,
    /// Keep the first tokens here, continue the rest on the next page.
    Split { tokens_on_current_page: usize },
    /// The page is empty and the block still doesn't fit: place it whole and
    /// let it overflow, since moving it on would never terminate.
    PlaceOversized,
}

/// Largest `k` in `0..token_count` for which `prefix_fits(k)` holds.
///
/// `prefix_fits(0)` is taken as true and `token_count` itself is not probed,
/// since the caller only asks after the whole block failed to fit. Relies on
/// fitting being monotonic in `k`.
pub fn largest_fitting_prefix<F: FnMut(usize) -> bool>(token_count: usize, mut prefix_fits: F) -> usize {
    if token_count <= 1 {
        return 0;
    }
    let (mut lo, mut hi) = (0, token_count - 1);
    while lo < hi {
        let mid = (lo + hi + 1) / 2;
        if prefix_fits(mid) {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    lo
}

/// Decide how to break a block across the page boundary.
pub fn decide_break<F: FnMut(usize) -> bool>(
    fits_whole: bool,
    is_atomic: bool,
    token_count: usize,
    page_is_empty: bool,
    prefix_fits: F,
) -> BreakDecision {
    if fits_whole {
        return BreakDecision::Place;
    }

    let stuck = |page_is_empty: bool| {
        if page_is_empty {
            BreakDecision::PlaceOversized
        } else {
            BreakDecision::MoveToNextPage
        }
    };

    // Unbreakable, or no word boundary to break at
    if is_atomic || token_count <= 1 {
        return stuck(page_is_empty);
    }

    match largest_fitting_prefix(token_count, prefix_fits) {
        0 => stuck(page_is_empty),
        k => BreakDecision::Split {
            tokens_on_current_page: k,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn everything_fits() {
        let decision = decide_break(true, false, 10, false, |_| true);
        assert_eq!(decision, BreakDecision::Place);
    }

    #[test]
    fn atomic_moves() {
        let decision = decide_break(false, true, 10, false, |_| true);
        assert_eq!(decision, BreakDecision::MoveToNextPage);
    }

    #[test]
    fn atomic_on_empty_page_is_placed_oversized() {
        let decision = decide_break(false, true, 0, true, |_| false);
        assert_eq!(decision, BreakDecision::PlaceOversized);
    }

    #[test]
    fn single_word_moves() {
        let decision = decide_break(false, false, 1, false, |_| true);
        assert_eq!(decision, BreakDecision::MoveToNextPage);
    }

    #[test]
    fn split_at_largest_fitting_prefix() {
        // Each token is 10 tall, 55 of room
        let decision = decide_break(false, false, 10, false, |k| k as f64 * 10.0 <= 55.0);
        assert_eq!(
            decision,
            BreakDecision::Split {
                tokens_on_current_page: 5,
            }
        );
    }

    #[test]
    fn nothing_fits_defers() {
        let decision = decide_break(false, false, 10, false, |k| k == 0);
        assert_eq!(decision, BreakDecision::MoveToNextPage);
    }

    #[test]
    fn binary_search_probes_sparingly() {
        let mut probes = 0;
        let k = largest_fitting_prefix(1000, |k| {
            probes += 1;
            k <= 637
        });
        assert_eq!(k, 637);
        assert!(probes <= 11, "took {} probes", probes);
    }

    #[test]
    fn whole_block_is_never_probed() {
        let k = largest_fitting_prefix(4, |k| {
            assert!(k < 4);
            true
        });
        assert_eq!(k, 3);
    }
}
