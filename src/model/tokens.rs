//! Word tokens over an inline tree.
//!
//! A token is one word together with the whitespace that follows it (text
//! that starts with whitespace gets a leading whitespace-only token). A
//! `<br>` and an empty element such as `<img>` are one token each. Tokens
//! never cross an element boundary, so cutting a block after `k` tokens
//! only ever cuts a text node between words. Elements straddling the cut
//! are cloned onto both sides, which keeps both halves tag-balanced.

use super::{Inline, InlineElement, TextBlock};

fn is_break_space(c: char) -> bool {
    // U+00A0 deliberately excluded: a non-breaking space glues words together
    c == ' ' || c == '\t' || c == '\n' || c == '\r' || c == '\u{000C}'
}

/// Byte offsets where each token of `text` starts.
fn token_starts(text: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut prev_space: Option<bool> = None;
    for (i, c) in text.char_indices() {
        let space = is_break_space(c);
        match prev_space {
            None => starts.push(i),
            // a new word starts after whitespace
            Some(true) if !space => starts.push(i),
            _ => {}
        }
        prev_space = Some(space);
    }
    starts
}

pub fn text_token_count(text: &str) -> usize {
    token_starts(text).len()
}

pub fn inline_token_count(inline: &Inline) -> usize {
    match inline {
        Inline::Text(t) => text_token_count(t),
        Inline::Break => 1,
        Inline::Element(el) if el.children.is_empty() => 1,
        Inline::Element(el) => inlines_token_count(&el.children),
    }
}

pub fn inlines_token_count(inlines: &[Inline]) -> usize {
    inlines.iter().map(inline_token_count).sum()
}

/// Split an inline list after `k` tokens.
pub fn split_inlines(inlines: &[Inline], k: usize) -> (Vec<Inline>, Vec<Inline>) {
    let mut head = Vec::new();
    let mut tail = Vec::new();
    let mut remaining = k;

    for inline in inlines {
        let n = inline_token_count(inline);
        if remaining == 0 && n > 0 {
            tail.push(inline.clone());
        } else if n <= remaining {
            head.push(inline.clone());
            remaining -= n;
        } else {
            match inline {
                Inline::Text(t) => {
                    let at = token_starts(t)[remaining];
                    head.push(Inline::Text(t[..at].to_string()));
                    tail.push(Inline::Text(t[at..].to_string()));
                }
                Inline::Element(el) => {
                    let (a, b) = split_inlines(&el.children, remaining);
                    head.push(Inline::Element(InlineElement {
                        tag: el.tag.clone(),
                        attrs: el.attrs.clone(),
                        children: a,
                    }));
                    tail.push(Inline::Element(InlineElement {
                        tag: el.tag.clone(),
                        attrs: el.attrs.clone(),
                        children: b,
                    }));
                }
                // single-token inlines never straddle the cut
                Inline::Break => tail.push(Inline::Break),
            }
            remaining = 0;
        }
    }
    (head, tail)
}

/// Append `tail` to `head`, fusing the text nodes and identical wrappers that
/// a split cut apart.
pub fn join_inlines(head: &mut Vec<Inline>, tail: Vec<Inline>) {
    let mut tail = tail.into_iter();
    if let Some(first) = tail.next() {
        match (head.last_mut(), first) {
            (Some(Inline::Text(a)), Inline::Text(b)) => a.push_str(&b),
            (Some(Inline::Element(a)), Inline::Element(b))
                if a.tag == b.tag && a.attrs == b.attrs && !b.children.is_empty() =>
            {
                join_inlines(&mut a.children, b.children);
            }
            (_, first) => head.push(first),
        }
    }
    head.extend(tail);
}

impl TextBlock {
    pub fn token_count(&self) -> usize {
        inlines_token_count(&self.inlines)
    }

    /// Whether there is any word boundary to split on.
    pub fn is_splittable(&self) -> bool {
        self.token_count() > 1
    }

    /// Cut after `k` tokens into a front and a back half, both carrying
    /// this block's tag and attributes. The front half is marked as
    /// continuing; the back half inherits this block's own marker.
    ///
    /// Loose inline content is given a `<div>` so the continuation marker
    /// has an element to live on.
    pub fn split_at_token(&self, k: usize) -> (TextBlock, TextBlock) {
        let (a, b) = split_inlines(&self.inlines, k);
        let tag = Some(self.tag.clone().unwrap_or_else(|| "div".to_string()));
        let head = TextBlock {
            tag: tag.clone(),
            attrs: self.attrs.clone(),
            inlines: a,
            continues: true,
        };
        let tail = TextBlock {
            tag,
            attrs: self.attrs.clone(),
            inlines: b,
            continues: self.continues,
        };
        (head, tail)
    }

    /// Whether `next` is this block's continuation and can be re-joined.
    pub fn joins_with(&self, next: &TextBlock) -> bool {
        self.continues && self.tag == next.tag && self.attrs == next.attrs
    }

    /// Re-join a continuation produced by [`TextBlock::split_at_token`].
    pub fn join(&mut self, next: TextBlock) {
        join_inlines(&mut self.inlines, next.inlines);
        self.continues = next.continues;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Block, Page};
    use pretty_assertions::assert_eq;

    fn text_block(html: &str) -> TextBlock {
        match Page::from_html(html).unwrap().blocks.remove(0) {
            Block::Paragraph(tb) | Block::Heading(tb) => tb,
            other => panic!("expected text block, got {:?}", other),
        }
    }

    #[test]
    fn tokens_are_words_with_trailing_space() {
        assert_eq!(text_token_count("one two  three "), 3);
        assert_eq!(text_token_count("  lead"), 2);
        assert_eq!(text_token_count(""), 0);
        assert_eq!(text_token_count("glued\u{a0}together"), 1);
    }

    #[test]
    fn split_cuts_between_words() {
        let tb = text_block("<p>alpha beta gamma delta</p>");
        let (a, b) = tb.split_at_token(2);
        assert_eq!(Block::Paragraph(a).to_html(), "<p data-continues=\"true\">alpha beta </p>");
        assert_eq!(Block::Paragraph(b).to_html(), "<p>gamma delta</p>");
    }

    #[test]
    fn split_inside_inline_element_stays_balanced() {
        let tb = text_block("<p>one <b>two three four</b> five</p>");
        let (a, b) = tb.split_at_token(2);
        assert_eq!(
            Block::Paragraph(a).to_html(),
            "<p data-continues=\"true\">one <b>two </b></p>"
        );
        assert_eq!(Block::Paragraph(b).to_html(), "<p><b>three four</b> five</p>");
    }

    #[test]
    fn split_then_join_restores_the_block() {
        let tb = text_block("<p class=\"body\">one <i>two <b>three four</b></i> five six</p>");
        for k in 1..tb.token_count() {
            let (mut a, b) = tb.split_at_token(k);
            assert!(a.joins_with(&b));
            a.join(b);
            assert_eq!(a, tb, "split at {} did not re-join cleanly", k);
        }
    }

    #[test]
    fn breaks_count_as_tokens() {
        let tb = text_block("<p>line one<br>line two</p>");
        assert_eq!(tb.token_count(), 5);
        let (a, b) = tb.split_at_token(2);
        assert_eq!(a.inlines, vec![Inline::Text("line one".into())]);
        assert_eq!(b.inlines[0], Inline::Break);
    }

    #[test]
    fn anonymous_blocks_gain_a_div_when_split() {
        let tb = text_block("loose text here");
        let (a, b) = tb.split_at_token(1);
        assert_eq!(a.tag.as_deref(), Some("div"));
        assert_eq!(b.tag.as_deref(), Some("div"));
    }

    #[test]
    fn single_word_is_not_splittable() {
        assert!(!text_block("<p>Supercalifragilistic</p>").is_splittable());
        assert!(text_block("<p>two words</p>").is_splittable());
    }
}
