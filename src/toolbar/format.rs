//! Formatting commands applied to a page's block model.
//!
//! A selection is a pair of character offsets into the page's flattened
//! text, the same offsets the caret is tracked with. Inline commands wrap
//! the selected text in an element, splitting text nodes at the selection
//! edges; block commands act on every text block the selection touches.

use serde::{Deserialize, Serialize};

use crate::html::{set_style_property, style_property};
use crate::model::{Block, Inline, InlineElement, List, ListItem, Page, Table, TextBlock};

/// A selection as page text offsets, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn caret(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
    Justify,
}

impl Align {
    pub fn css(&self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
            Align::Justify => "justify",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "value", rename_all = "camelCase")]
pub enum FormattingCommand {
    Bold,
    Italic,
    Underline,
    Align(Align),
    FontFamily(String),
    /// Size in points.
    FontSize(f64),
    InsertLink(String),
    ToggleList { ordered: bool },
    InsertTable { rows: usize, cols: usize },
}

/// Give a bare address a scheme: `example.com` becomes
/// `https://example.com`. Addresses that already have one, and relative or
/// fragment links, are left alone.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    let has_scheme = url
        .split_once(':')
        .map(|(scheme, _)| {
            !scheme.is_empty()
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.')
        })
        .unwrap_or(false);
    if has_scheme || url.starts_with('/') || url.starts_with('#') || url.starts_with('?') {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn inline_text_len(inline: &Inline) -> usize {
    match inline {
        Inline::Text(t) => char_len(t),
        Inline::Break => 0,
        Inline::Element(el) => el.children.iter().map(inline_text_len).sum(),
    }
}

fn block_text_len(block: &Block) -> usize {
    let mut nodes = Vec::new();
    block.collect_text_nodes(&mut nodes);
    nodes.iter().map(|t| char_len(t)).sum()
}

fn slice_chars(s: &str, from: usize, to: usize) -> String {
    s.chars().skip(from).take(to.saturating_sub(from)).collect()
}

/// Wrap the part of `inlines` that falls inside `range` with `wrap`.
/// `offset` is the page offset of the first inline and is advanced past
/// them all.
fn wrap_range(
    inlines: Vec<Inline>,
    offset: &mut usize,
    range: &TextRange,
    wrap: &dyn Fn(Vec<Inline>) -> InlineElement,
) -> Vec<Inline> {
    let mut out = Vec::new();
    let mut run: Vec<Inline> = Vec::new();

    let flush = |run: &mut Vec<Inline>, out: &mut Vec<Inline>| {
        if !run.is_empty() {
            out.push(Inline::Element(wrap(std::mem::take(run))));
        }
    };

    for inline in inlines {
        let len = inline_text_len(&inline);
        let start = *offset;
        let end = start + len;
        *offset = end;

        if len > 0 && start >= range.start && end <= range.end {
            run.push(inline);
            continue;
        }
        if len == 0 || end <= range.start || start >= range.end {
            flush(&mut run, &mut out);
            out.push(inline);
            continue;
        }

        // Straddles an edge of the selection
        match inline {
            Inline::Text(t) => {
                let a = range.start.saturating_sub(start);
                let b = range.end.min(end) - start;
                let before = slice_chars(&t, 0, a);
                let inside = slice_chars(&t, a, b);
                let after = slice_chars(&t, b, len);
                if !before.is_empty() {
                    flush(&mut run, &mut out);
                    out.push(Inline::Text(before));
                }
                run.push(Inline::Text(inside));
                if !after.is_empty() {
                    flush(&mut run, &mut out);
                    out.push(Inline::Text(after));
                }
            }
            Inline::Element(el) => {
                flush(&mut run, &mut out);
                let mut inner = start;
                let children = wrap_range(el.children, &mut inner, range, wrap);
                out.push(Inline::Element(InlineElement {
                    tag: el.tag,
                    attrs: el.attrs,
                    children,
                }));
            }
            Inline::Break => out.push(Inline::Break),
        }
    }
    flush(&mut run, &mut out);
    out
}

/// Visit every text block overlapping `range`, depth first through lists
/// and tables. A collapsed range visits only the first block holding it.
fn for_each_text_block(
    blocks: &mut [Block],
    offset: &mut usize,
    range: &TextRange,
    hit: &mut bool,
    f: &mut dyn FnMut(&mut TextBlock, usize),
) {
    for block in blocks {
        let start = *offset;
        let len = block_text_len(block);
        let end = start + len;
        let overlaps = if range.is_collapsed() {
            !*hit && start <= range.start && range.start <= end
        } else {
            start < range.end && end > range.start
        };

        match block {
            Block::Paragraph(tb) | Block::Heading(tb) => {
                if overlaps {
                    *hit = true;
                    f(tb, start);
                }
            }
            Block::Table(table) => {
                let mut inner = start;
                for cell in table.rows.iter_mut().flat_map(|r| r.cells.iter_mut()) {
                    for_each_text_block(&mut cell.blocks, &mut inner, range, hit, f);
                }
            }
            Block::List(list) => {
                let mut inner = start;
                for item in list.items.iter_mut() {
                    for_each_text_block(&mut item.blocks, &mut inner, range, hit, f);
                }
            }
            Block::LineBreak | Block::Opaque(_) => {}
        }
        *offset = end;
    }
}

fn wrap_selection(page: &mut Page, range: &TextRange, wrap: &dyn Fn(Vec<Inline>) -> InlineElement) -> bool {
    if range.is_collapsed() {
        return false;
    }
    let mut changed = false;
    let mut offset = 0;
    let mut hit = false;
    for_each_text_block(&mut page.blocks, &mut offset, range, &mut hit, &mut |tb: &mut TextBlock, start: usize| {
        let mut inner = start;
        let inlines = std::mem::take(&mut tb.inlines);
        tb.inlines = wrap_range(inlines, &mut inner, range, wrap);
        changed = true;
    });
    changed
}

fn styled_span(property: &'static str, value: String) -> impl Fn(Vec<Inline>) -> InlineElement {
    move |children| {
        InlineElement::new(
            "span",
            vec![("style".to_string(), format!("{}: {}", property, value))],
            children,
        )
    }
}

/// Index of the top-level block holding `offset`, preferring the earlier
/// block on a boundary.
fn block_at(page: &Page, offset: usize) -> Option<usize> {
    let mut start = 0;
    for (i, block) in page.blocks.iter().enumerate() {
        let end = start + block_text_len(block);
        if offset <= end {
            return Some(i);
        }
        start = end;
    }
    None
}

fn top_level_span(page: &Page, range: &TextRange) -> Option<(usize, usize)> {
    if range.is_collapsed() {
        return block_at(page, range.start).map(|i| (i, i));
    }
    let mut start = 0;
    let mut first = None;
    let mut last = None;
    for (i, block) in page.blocks.iter().enumerate() {
        let end = start + block_text_len(block);
        if start < range.end && end > range.start {
            first.get_or_insert(i);
            last = Some(i);
        }
        start = end;
    }
    Some((first?, last?))
}

fn into_list_item(block: Block) -> Option<ListItem> {
    match block {
        Block::Paragraph(tb) | Block::Heading(tb) => Some(ListItem {
            attrs: Vec::new(),
            blocks: vec![Block::Paragraph(TextBlock {
                tag: None,
                attrs: Vec::new(),
                inlines: tb.inlines,
                continues: false,
            })],
        }),
        Block::LineBreak => None,
        other => Some(ListItem {
            attrs: Vec::new(),
            blocks: vec![other],
        }),
    }
}

/// Unwrapped list items become paragraphs again.
fn out_of_list_item(item: ListItem) -> Vec<Block> {
    item.blocks
        .into_iter()
        .map(|block| match block {
            Block::Paragraph(tb) if tb.tag.is_none() => Block::Paragraph(TextBlock {
                tag: Some("p".to_string()),
                ..tb
            }),
            other => other,
        })
        .collect()
}

fn toggle_list(page: &mut Page, range: &TextRange, ordered: bool) -> bool {
    let Some((first, last)) = top_level_span(page, range) else {
        page.blocks.push(Block::List(List {
            ordered,
            attrs: Vec::new(),
            items: vec![ListItem {
                attrs: Vec::new(),
                blocks: Vec::new(),
            }],
        }));
        return true;
    };

    let selected = &page.blocks[first..=last];
    let all_lists = selected.iter().all(|b| matches!(b, Block::List(_)));
    if all_lists {
        let same_kind = selected
            .iter()
            .all(|b| matches!(b, Block::List(l) if l.ordered == ordered));
        if same_kind {
            let unwrapped: Vec<Block> = page
                .blocks
                .drain(first..=last)
                .flat_map(|b| match b {
                    Block::List(l) => l.items.into_iter().flat_map(out_of_list_item).collect(),
                    other => vec![other],
                })
                .collect();
            for (i, block) in unwrapped.into_iter().enumerate() {
                page.blocks.insert(first + i, block);
            }
        } else {
            for block in &mut page.blocks[first..=last] {
                if let Block::List(l) = block {
                    l.ordered = ordered;
                }
            }
        }
        return true;
    }

    let mut items = Vec::new();
    for block in page.blocks.drain(first..=last) {
        match block {
            Block::List(l) => items.extend(l.items),
            other => items.extend(into_list_item(other)),
        }
    }
    page.blocks.insert(
        first,
        Block::List(List {
            ordered,
            attrs: Vec::new(),
            items,
        }),
    );
    true
}

/// Insert an empty `rows × cols` table after the block holding the
/// selection start, or at the end of the page without a selection.
pub fn insert_table(page: &mut Page, range: Option<&TextRange>, rows: usize, cols: usize) -> usize {
    let table = Block::Table(Table::skeleton(rows.max(1), cols.max(1)));
    let at = range
        .and_then(|r| block_at(page, r.start))
        .map(|i| i + 1)
        .unwrap_or(page.blocks.len());
    page.blocks.insert(at, table);
    at
}

fn set_alignment(page: &mut Page, range: &TextRange, align: Align) -> bool {
    let mut changed = false;
    let mut offset = 0;
    let mut hit = false;
    for_each_text_block(&mut page.blocks, &mut offset, range, &mut hit, &mut |tb: &mut TextBlock, _: usize| {
        if tb.tag.is_none() {
            tb.tag = Some("div".to_string());
        }
        let style = tb.attr("style").unwrap_or("").to_string();
        if style_property(&style, "text-align") != Some(align.css()) {
            tb.set_attr("style", set_style_property(&style, "text-align", align.css()));
            changed = true;
        }
    });
    changed
}

fn insert_link(page: &mut Page, range: &TextRange, url: &str) -> bool {
    let href = normalize_url(url);
    let link = |children| InlineElement::new("a", vec![("href".to_string(), href.clone())], children);
    if !range.is_collapsed() {
        return wrap_selection(page, range, &link);
    }

    // Nothing selected: insert the address itself as the link text
    let mut inserted = false;
    let mut offset = 0;
    let mut hit = false;
    for_each_text_block(&mut page.blocks, &mut offset, range, &mut hit, &mut |tb: &mut TextBlock, start: usize| {
        let (head, tail) = split_inlines_at_char(&tb.inlines, range.start - start);
        let mut inlines = head;
        inlines.push(Inline::Element(link(vec![Inline::Text(href.clone())])));
        inlines.extend(tail);
        tb.inlines = inlines;
        inserted = true;
    });
    if !inserted {
        page.blocks.push(Block::Paragraph(TextBlock::new(
            "p",
            vec![Inline::Element(link(vec![Inline::Text(href.clone())]))],
        )));
    }
    true
}

/// Split inlines at a character offset, cloning straddling wrappers.
fn split_inlines_at_char(inlines: &[Inline], at: usize) -> (Vec<Inline>, Vec<Inline>) {
    let mut head = Vec::new();
    let mut tail = Vec::new();
    let mut remaining = at;
    for inline in inlines {
        let len = inline_text_len(inline);
        if remaining == 0 {
            tail.push(inline.clone());
        } else if len <= remaining {
            head.push(inline.clone());
            remaining -= len;
        } else {
            match inline {
                Inline::Text(t) => {
                    head.push(Inline::Text(slice_chars(t, 0, remaining)));
                    tail.push(Inline::Text(slice_chars(t, remaining, len)));
                }
                Inline::Element(el) => {
                    let (a, b) = split_inlines_at_char(&el.children, remaining);
                    head.push(Inline::Element(InlineElement::new(&el.tag, el.attrs.clone(), a)));
                    tail.push(Inline::Element(InlineElement::new(&el.tag, el.attrs.clone(), b)));
                }
                Inline::Break => tail.push(Inline::Break),
            }
            remaining = 0;
        }
    }
    (head, tail)
}

/// Apply `command` to `page` over `range`. Returns whether the page changed.
pub fn apply(page: &mut Page, range: &TextRange, command: &FormattingCommand) -> bool {
    match command {
        FormattingCommand::Bold => wrap_selection(page, range, &|c| InlineElement::new("b", Vec::new(), c)),
        FormattingCommand::Italic => wrap_selection(page, range, &|c| InlineElement::new("i", Vec::new(), c)),
        FormattingCommand::Underline => wrap_selection(page, range, &|c| InlineElement::new("u", Vec::new(), c)),
        FormattingCommand::Align(align) => set_alignment(page, range, *align),
        FormattingCommand::FontFamily(family) => {
            wrap_selection(page, range, &styled_span("font-family", family.clone()))
        }
        FormattingCommand::FontSize(pt) => {
            wrap_selection(page, range, &styled_span("font-size", format!("{}pt", pt)))
        }
        FormattingCommand::InsertLink(url) => insert_link(page, range, url),
        FormattingCommand::ToggleList { ordered } => toggle_list(page, range, *ordered),
        FormattingCommand::InsertTable { rows, cols } => {
            insert_table(page, Some(range), *rows, *cols);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(html: &str, range: TextRange, command: FormattingCommand) -> String {
        let mut page = Page::from_html(html).unwrap();
        apply(&mut page, &range, &command);
        page.to_html()
    }

    #[test]
    fn bold_wraps_the_selection() {
        assert_eq!(
            run("<p>hello world</p>", TextRange::new(6, 11), FormattingCommand::Bold),
            "<p>hello <b>world</b></p>"
        );
    }

    #[test]
    fn selection_across_elements_stays_balanced() {
        assert_eq!(
            run("<p>ab<i>cd</i>ef</p>", TextRange::new(1, 5), FormattingCommand::Underline),
            "<p>a<u>b<i>cd</i>e</u>f</p>"
        );
    }

    #[test]
    fn selection_across_paragraphs() {
        assert_eq!(
            run("<p>one</p><p>two</p>", TextRange::new(2, 4), FormattingCommand::Italic),
            "<p>on<i>e</i></p><p><i>t</i>wo</p>"
        );
    }

    #[test]
    fn collapsed_selection_does_not_wrap() {
        let mut page = Page::from_html("<p>abc</p>").unwrap();
        assert!(!apply(&mut page, &TextRange::caret(1), &FormattingCommand::Bold));
    }

    #[test]
    fn font_size_in_points() {
        assert_eq!(
            run("<p>abc</p>", TextRange::new(0, 3), FormattingCommand::FontSize(14.0)),
            "<p><span style=\"font-size: 14pt\">abc</span></p>"
        );
    }

    #[test]
    fn align_sets_style_and_promotes_loose_text() {
        assert_eq!(
            run("loose", TextRange::caret(2), FormattingCommand::Align(Align::Center)),
            "<div style=\"text-align: center\">loose</div>"
        );
        assert_eq!(
            run(
                "<p style=\"color: red\">a</p><p>b</p>",
                TextRange::caret(0),
                FormattingCommand::Align(Align::Right)
            ),
            "<p style=\"color: red; text-align: right\">a</p><p>b</p>"
        );
    }

    #[test]
    fn links_get_a_scheme() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("http://x.org"), "http://x.org");
        assert_eq!(normalize_url("mailto:a@b.c"), "mailto:a@b.c");
        assert_eq!(normalize_url("/local"), "/local");
        assert_eq!(
            run("<p>see site</p>", TextRange::new(4, 8), FormattingCommand::InsertLink("site.org".into())),
            "<p>see <a href=\"https://site.org\">site</a></p>"
        );
    }

    #[test]
    fn link_at_caret_inserts_the_address() {
        assert_eq!(
            run("<p>ab</p>", TextRange::caret(1), FormattingCommand::InsertLink("x.io".into())),
            "<p>a<a href=\"https://x.io\">https://x.io</a>b</p>"
        );
    }

    #[test]
    fn toggle_list_wraps_and_unwraps() {
        let listed = run(
            "<p>one</p><p>two</p><p>three</p>",
            TextRange::new(0, 6),
            FormattingCommand::ToggleList { ordered: false },
        );
        assert_eq!(listed, "<ul><li>one</li><li>two</li></ul><p>three</p>");
        let back = run(&listed, TextRange::new(0, 6), FormattingCommand::ToggleList { ordered: false });
        assert_eq!(back, "<p>one</p><p>two</p><p>three</p>");
        let numbered = run(&listed, TextRange::caret(1), FormattingCommand::ToggleList { ordered: true });
        assert_eq!(numbered, "<ol><li>one</li><li>two</li></ol><p>three</p>");
    }

    #[test]
    fn table_goes_after_the_caret_block() {
        let html = run(
            "<p>a</p><p>b</p>",
            TextRange::caret(0),
            FormattingCommand::InsertTable { rows: 1, cols: 2 },
        );
        assert!(html.starts_with("<p>a</p><table"));
        assert!(html.ends_with("</table><p>b</p>"));
    }
}
