//! # Document Model
//!
//! An editable page is a browser-owned, freely mutated DOM. Pagination can't
//! work on that safely, so every page is read into an explicit list of
//! top-level blocks: paragraphs, headings, tables, lists and line breaks.
//! Anything else block-shaped is kept verbatim as an [`Block::Opaque`]
//! element and treated as atomic.
//!
//! Text-bearing blocks hold an inline tree rather than a markup string, which
//! is what lets the pagination engine split them at word boundaries without
//! ever producing an unbalanced tag.
//!
//! ```text
//! page HTML ──parse──▶ [HtmlNode] ──blocks_from_nodes──▶ [Block]
//!     ▲                                                  │
//!     └──────────────────── Block::write_html ◀──────────┘
//! ```

pub mod roster;
pub mod tokens;

pub use roster::{Member, Roster, Signatories, Signatory, SignatoryCategory};

use crate::error::PagewrightError;
use crate::html::{self, HtmlElement, HtmlNode};

/// Attribute marking a split prefix whose content continues on the next page.
pub const CONTINUES_ATTR: &str = "data-continues";

pub type Attrs = Vec<(String, String)>;

/// Inline content of a text-bearing block.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    Break,
    Element(InlineElement),
}

/// An inline wrapper such as `<b>`, `<span style=…>` or `<a href=…>`.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineElement {
    pub tag: String,
    pub attrs: Attrs,
    pub children: Vec<Inline>,
}

impl InlineElement {
    pub fn new(tag: &str, attrs: Attrs, children: Vec<Inline>) -> Self {
        Self {
            tag: tag.to_string(),
            attrs,
            children,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A paragraph-like block: `<p>`, `<div>`, `<h2>`… or loose inline content
/// sitting directly in the page (`tag == None`).
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub tag: Option<String>,
    pub attrs: Attrs,
    pub inlines: Vec<Inline>,
    /// This block is the front half of a split; its continuation opens the
    /// next page.
    pub continues: bool,
}

impl TextBlock {
    pub fn new(tag: &str, inlines: Vec<Inline>) -> Self {
        Self {
            tag: Some(tag.to_string()),
            attrs: Vec::new(),
            inlines,
            continues: false,
        }
    }

    pub fn paragraph(text: &str) -> Self {
        Self::new("p", vec![Inline::Text(text.to_string())])
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: String) {
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub attrs: Attrs,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    /// Row lives in `<thead>`.
    pub header: bool,
    pub attrs: Attrs,
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    /// `<th>` rather than `<td>`.
    pub header: bool,
    pub attrs: Attrs,
    pub blocks: Vec<Block>,
}

impl Table {
    /// An empty `rows × cols` grid, the shape the table picker inserts.
    pub fn skeleton(rows: usize, cols: usize) -> Self {
        let rows = (0..rows)
            .map(|_| TableRow {
                header: false,
                attrs: Vec::new(),
                cells: (0..cols)
                    .map(|_| TableCell {
                        header: false,
                        attrs: Vec::new(),
                        blocks: vec![Block::Paragraph(TextBlock {
                            tag: None,
                            attrs: Vec::new(),
                            inlines: vec![Inline::Text("\u{00A0}".to_string())],
                            continues: false,
                        })],
                    })
                    .collect(),
            })
            .collect();
        Table {
            attrs: vec![(
                "style".to_string(),
                "width: 100%; border-collapse: collapse".to_string(),
            )],
            rows,
        }
    }

    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct List {
    pub ordered: bool,
    pub attrs: Attrs,
    pub items: Vec<ListItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub attrs: Attrs,
    pub blocks: Vec<Block>,
}

/// One top-level child of an editable page.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(TextBlock),
    Heading(TextBlock),
    Table(Table),
    List(List),
    LineBreak,
    /// Any other block element, kept as-is and never split.
    Opaque(HtmlElement),
}

impl Block {
    /// Atomic blocks are moved whole to the next page, never split.
    pub fn is_atomic(&self) -> bool {
        !matches!(self, Block::Paragraph(_) | Block::Heading(_))
    }

    pub fn as_text_block(&self) -> Option<&TextBlock> {
        match self {
            Block::Paragraph(tb) | Block::Heading(tb) => Some(tb),
            _ => None,
        }
    }

    pub fn as_text_block_mut(&mut self) -> Option<&mut TextBlock> {
        match self {
            Block::Paragraph(tb) | Block::Heading(tb) => Some(tb),
            _ => None,
        }
    }

    /// Heading level 1-6, if this is a heading.
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            Block::Heading(tb) => tb
                .tag
                .as_deref()
                .and_then(|t| t.strip_prefix('h'))
                .and_then(|n| n.parse().ok()),
            _ => None,
        }
    }

    pub fn write_html(&self, out: &mut String) {
        match self {
            Block::Paragraph(tb) | Block::Heading(tb) => write_text_block(tb, out),
            Block::Table(table) => write_table(table, out),
            Block::List(list) => write_list(list, out),
            Block::LineBreak => out.push_str("<br>"),
            Block::Opaque(el) => html::write_element(el, out),
        }
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    /// Text nodes in document order, the way a DOM tree walker sees them.
    pub fn collect_text_nodes<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Block::Paragraph(tb) | Block::Heading(tb) => inline_text_nodes(&tb.inlines, out),
            Block::Table(table) => {
                for cell in table.rows.iter().flat_map(|r| r.cells.iter()) {
                    for block in &cell.blocks {
                        block.collect_text_nodes(out);
                    }
                }
            }
            Block::List(list) => {
                for item in &list.items {
                    for block in &item.blocks {
                        block.collect_text_nodes(out);
                    }
                }
            }
            Block::LineBreak => {}
            Block::Opaque(el) => html_text_nodes(&el.children, out),
        }
    }
}

fn inline_text_nodes<'a>(inlines: &'a [Inline], out: &mut Vec<&'a str>) {
    for inline in inlines {
        match inline {
            Inline::Text(t) => out.push(t),
            Inline::Break => {}
            Inline::Element(el) => inline_text_nodes(&el.children, out),
        }
    }
}

fn html_text_nodes<'a>(nodes: &'a [HtmlNode], out: &mut Vec<&'a str>) {
    for node in nodes {
        match node {
            HtmlNode::Text(t) => out.push(t),
            HtmlNode::Element(el) => html_text_nodes(&el.children, out),
        }
    }
}

// ── Markup → blocks ──────────────────────────────────────────────

fn is_heading_tag(tag: &str) -> bool {
    matches!(tag, "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

fn is_paragraph_tag(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "div"
            | "blockquote"
            | "pre"
            | "address"
            | "center"
            | "section"
            | "article"
            | "header"
            | "footer"
            | "figcaption"
    )
}

/// Tags that start a new block when they appear among a page's children.
pub fn is_block_tag(tag: &str) -> bool {
    is_paragraph_tag(tag)
        || is_heading_tag(tag)
        || matches!(
            tag,
            "table"
                | "ul"
                | "ol"
                | "li"
                | "hr"
                | "figure"
                | "nav"
                | "aside"
                | "main"
                | "dl"
                | "dt"
                | "dd"
                | "form"
                | "fieldset"
        )
}

fn has_block_children(el: &HtmlElement) -> bool {
    el.children
        .iter()
        .any(|c| matches!(c, HtmlNode::Element(e) if is_block_tag(&e.tag)))
}

fn is_blank(text: &str) -> bool {
    text.chars().all(|c| c.is_ascii_whitespace())
}

pub fn inlines_from_nodes(nodes: Vec<HtmlNode>) -> Vec<Inline> {
    nodes
        .into_iter()
        .map(|node| match node {
            HtmlNode::Text(t) => Inline::Text(t),
            HtmlNode::Element(el) if el.tag == "br" => Inline::Break,
            HtmlNode::Element(el) => Inline::Element(InlineElement {
                tag: el.tag,
                attrs: el.attrs,
                children: inlines_from_nodes(el.children),
            }),
        })
        .collect()
}

fn text_block_from_element(el: HtmlElement) -> TextBlock {
    let mut attrs = el.attrs;
    let before = attrs.len();
    attrs.retain(|(k, _)| k != CONTINUES_ATTR);
    let continues = attrs.len() != before;
    TextBlock {
        tag: Some(el.tag),
        attrs,
        inlines: inlines_from_nodes(el.children),
        continues,
    }
}

/// Convert parsed nodes into a block list.
///
/// Loose inline content between blocks becomes an anonymous paragraph, bare
/// `<li>` elements are gathered into a list and whitespace-only text between
/// blocks is dropped.
pub fn blocks_from_nodes(nodes: Vec<HtmlNode>) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut pending: Vec<HtmlNode> = Vec::new();
    let mut orphan_items: Vec<HtmlElement> = Vec::new();

    for node in nodes {
        let el = match node {
            HtmlNode::Text(t) => {
                if pending.is_empty() && is_blank(&t) {
                    continue;
                }
                flush_orphans(&mut orphan_items, &mut blocks);
                pending.push(HtmlNode::Text(t));
                continue;
            }
            HtmlNode::Element(el) => el,
        };

        if el.tag == "li" {
            flush_pending(&mut pending, &mut blocks);
            orphan_items.push(el);
            continue;
        }
        flush_orphans(&mut orphan_items, &mut blocks);

        if el.tag == "br" {
            if pending.is_empty() {
                blocks.push(Block::LineBreak);
            } else {
                pending.push(HtmlNode::Element(el));
            }
            continue;
        }
        if !is_block_tag(&el.tag) {
            pending.push(HtmlNode::Element(el));
            continue;
        }

        flush_pending(&mut pending, &mut blocks);
        blocks.push(block_from_element(el));
    }
    flush_pending(&mut pending, &mut blocks);
    flush_orphans(&mut orphan_items, &mut blocks);
    blocks
}

fn flush_pending(pending: &mut Vec<HtmlNode>, blocks: &mut Vec<Block>) {
    if pending.is_empty() {
        return;
    }
    let nodes = std::mem::take(pending);
    blocks.push(Block::Paragraph(TextBlock {
        tag: None,
        attrs: Vec::new(),
        inlines: inlines_from_nodes(nodes),
        continues: false,
    }));
}

fn flush_orphans(items: &mut Vec<HtmlElement>, blocks: &mut Vec<Block>) {
    if items.is_empty() {
        return;
    }
    log::debug!("wrapping {} stray list items in a list", items.len());
    let items = std::mem::take(items)
        .into_iter()
        .map(|li| ListItem {
            attrs: li.attrs,
            blocks: blocks_from_nodes(li.children),
        })
        .collect();
    blocks.push(Block::List(List {
        ordered: false,
        attrs: Vec::new(),
        items,
    }));
}

fn block_from_element(el: HtmlElement) -> Block {
    if is_heading_tag(&el.tag) {
        return Block::Heading(text_block_from_element(el));
    }
    if is_paragraph_tag(&el.tag) && !has_block_children(&el) {
        return Block::Paragraph(text_block_from_element(el));
    }
    match el.tag.as_str() {
        "table" => match table_from_element(&el) {
            Some(table) => Block::Table(table),
            None => Block::Opaque(el),
        },
        "ul" | "ol" => Block::List(list_from_element(el)),
        _ => Block::Opaque(el),
    }
}

/// Tables with anything besides row groups and rows (captions, colgroups)
/// stay opaque so nothing is lost on the way back out.
fn table_from_element(el: &HtmlElement) -> Option<Table> {
    let mut rows = Vec::new();
    for child in &el.children {
        match child {
            HtmlNode::Text(t) if is_blank(t) => {}
            HtmlNode::Element(group) if matches!(group.tag.as_str(), "thead" | "tbody" | "tfoot") => {
                let header = group.tag == "thead";
                for row in &group.children {
                    match row {
                        HtmlNode::Text(t) if is_blank(t) => {}
                        HtmlNode::Element(tr) if tr.tag == "tr" => rows.push(row_from_element(tr, header)),
                        _ => return None,
                    }
                }
            }
            HtmlNode::Element(tr) if tr.tag == "tr" => rows.push(row_from_element(tr, false)),
            _ => return None,
        }
    }
    Some(Table {
        attrs: el.attrs.clone(),
        rows,
    })
}

fn row_from_element(tr: &HtmlElement, header: bool) -> TableRow {
    let cells = tr
        .children
        .iter()
        .filter_map(|c| match c {
            HtmlNode::Element(cell) if cell.tag == "td" || cell.tag == "th" => Some(TableCell {
                header: cell.tag == "th",
                attrs: cell.attrs.clone(),
                blocks: blocks_from_nodes(cell.children.clone()),
            }),
            _ => None,
        })
        .collect();
    TableRow {
        header,
        attrs: tr.attrs.clone(),
        cells,
    }
}

/// Build a well-formed list. Rich-text list commands leave debris behind:
/// wrappers around `<li>`, loose text, nested lists directly under the list.
/// Wrappers are unwrapped, loose content becomes an item of its own and a
/// nested list attaches to the preceding item.
fn list_from_element(el: HtmlElement) -> List {
    let ordered = el.tag == "ol";
    let mut items: Vec<ListItem> = Vec::new();
    collect_list_items(el.children, &mut items);
    List {
        ordered,
        attrs: el.attrs,
        items,
    }
}

fn collect_list_items(children: Vec<HtmlNode>, items: &mut Vec<ListItem>) {
    for child in children {
        match child {
            HtmlNode::Text(t) if is_blank(&t) => {}
            HtmlNode::Text(t) => items.push(ListItem {
                attrs: Vec::new(),
                blocks: blocks_from_nodes(vec![HtmlNode::Text(t)]),
            }),
            HtmlNode::Element(li) if li.tag == "li" => items.push(ListItem {
                attrs: li.attrs,
                blocks: blocks_from_nodes(li.children),
            }),
            HtmlNode::Element(nested) if nested.tag == "ul" || nested.tag == "ol" => {
                let nested = Block::List(list_from_element(nested));
                match items.last_mut() {
                    Some(prev) => prev.blocks.push(nested),
                    None => items.push(ListItem {
                        attrs: Vec::new(),
                        blocks: vec![nested],
                    }),
                }
            }
            HtmlNode::Element(wrapper)
                if wrapper
                    .children
                    .iter()
                    .any(|c| matches!(c, HtmlNode::Element(e) if e.tag == "li")) =>
            {
                collect_list_items(wrapper.children, items);
            }
            HtmlNode::Element(other) => items.push(ListItem {
                attrs: Vec::new(),
                blocks: blocks_from_nodes(vec![HtmlNode::Element(other)]),
            }),
        }
    }
}

// ── Blocks → markup ──────────────────────────────────────────────

pub fn write_inlines(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        match inline {
            Inline::Text(t) => out.push_str(&html::escape_text(t)),
            Inline::Break => out.push_str("<br>"),
            Inline::Element(el) => {
                html::write_open_tag(&el.tag, &el.attrs, out);
                if !html::is_void(&el.tag) {
                    write_inlines(&el.children, out);
                    html::write_close_tag(&el.tag, out);
                }
            }
        }
    }
}

fn write_text_block(tb: &TextBlock, out: &mut String) {
    match &tb.tag {
        Some(tag) => {
            if tb.continues {
                let mut attrs = tb.attrs.clone();
                attrs.push((CONTINUES_ATTR.to_string(), "true".to_string()));
                html::write_open_tag(tag, &attrs, out);
            } else {
                html::write_open_tag(tag, &tb.attrs, out);
            }
            write_inlines(&tb.inlines, out);
            html::write_close_tag(tag, out);
        }
        None => write_inlines(&tb.inlines, out),
    }
}

fn write_blocks(blocks: &[Block], out: &mut String) {
    for block in blocks {
        block.write_html(out);
    }
}

fn write_table(table: &Table, out: &mut String) {
    html::write_open_tag("table", &table.attrs, out);
    let (head, body): (Vec<&TableRow>, Vec<&TableRow>) = table.rows.iter().partition(|r| r.header);
    for (group, rows) in [("thead", head), ("tbody", body)] {
        if rows.is_empty() {
            continue;
        }
        html::write_open_tag(group, &[], out);
        for row in rows {
            html::write_open_tag("tr", &row.attrs, out);
            for cell in &row.cells {
                let tag = if cell.header { "th" } else { "td" };
                html::write_open_tag(tag, &cell.attrs, out);
                write_blocks(&cell.blocks, out);
                html::write_close_tag(tag, out);
            }
            html::write_close_tag("tr", out);
        }
        html::write_close_tag(group, out);
    }
    html::write_close_tag("table", out);
}

fn write_list(list: &List, out: &mut String) {
    let tag = if list.ordered { "ol" } else { "ul" };
    html::write_open_tag(tag, &list.attrs, out);
    for item in &list.items {
        html::write_open_tag("li", &item.attrs, out);
        write_blocks(&item.blocks, out);
        html::write_close_tag("li", out);
    }
    html::write_close_tag(tag, out);
}

// ── Pages ────────────────────────────────────────────────────────

/// One fixed-size unit of output. The page index is its position in the
/// document; page 0 is the first page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub blocks: Vec<Block>,
}

impl Page {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn from_html(html: &str) -> Result<Self, PagewrightError> {
        let nodes = html::parse_fragment(html)?;
        Ok(Self {
            blocks: blocks_from_nodes(nodes),
        })
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_blocks(&self.blocks, &mut out);
        out
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Text nodes of the page in document order.
    pub fn text_nodes(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for block in &self.blocks {
            block.collect_text_nodes(&mut out);
        }
        out
    }

    /// Flattened text content, markup ignored.
    pub fn text(&self) -> String {
        self.text_nodes().concat()
    }
}

pub fn is_first_page(page_index: usize) -> bool {
    page_index == 0
}

/// Parse every page of a document.
pub fn pages_from_html<S: AsRef<str>>(pages: &[S]) -> Result<Vec<Page>, PagewrightError> {
    pages.iter().map(|p| Page::from_html(p.as_ref())).collect()
}

/// The full document HTML: every page's content in order.
pub fn document_html(pages: &[Page]) -> String {
    pages.iter().map(Page::to_html).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn round_trip(html: &str) -> String {
        Page::from_html(html).unwrap().to_html()
    }

    #[test]
    fn paragraphs_and_headings() {
        let page = Page::from_html("<h2>Title</h2><p>Body <b>text</b></p>").unwrap();
        assert_eq!(page.blocks.len(), 2);
        assert_eq!(page.blocks[0].heading_level(), Some(2));
        assert!(matches!(page.blocks[1], Block::Paragraph(_)));
        assert_eq!(page.text(), "TitleBody text");
    }

    #[test]
    fn whitespace_between_blocks_is_dropped() {
        let page = Page::from_html("<p>a</p>\n  <p>b</p>\n").unwrap();
        assert_eq!(page.blocks.len(), 2);
    }

    #[test]
    fn loose_text_becomes_anonymous_paragraph() {
        let page = Page::from_html("loose <i>words</i><p>para</p>").unwrap();
        assert_eq!(page.blocks.len(), 2);
        let tb = page.blocks[0].as_text_block().unwrap();
        assert_eq!(tb.tag, None);
        assert_eq!(round_trip("loose <i>words</i><p>para</p>"), "loose <i>words</i><p>para</p>");
    }

    #[test]
    fn top_level_br_is_a_line_break_block() {
        let page = Page::from_html("<p>a</p><br><p>b</p>").unwrap();
        assert_eq!(page.blocks[1], Block::LineBreak);
    }

    #[test]
    fn tables_round_trip() {
        let html = "<table style=\"width: 100%\"><thead><tr><th>A</th><th>B</th></tr></thead>\
                    <tbody><tr><td>1</td><td>&nbsp;</td></tr></tbody></table>";
        let page = Page::from_html(html).unwrap();
        match &page.blocks[0] {
            Block::Table(t) => {
                assert_eq!(t.rows.len(), 2);
                assert!(t.rows[0].header);
                assert!(t.rows[0].cells[0].header);
                assert_eq!(t.column_count(), 2);
            }
            other => panic!("expected table, got {:?}", other),
        }
        assert_eq!(page.to_html(), html);
    }

    #[test]
    fn table_with_caption_stays_opaque() {
        let html = "<table><caption>Budget</caption><tr><td>1</td></tr></table>";
        let page = Page::from_html(html).unwrap();
        assert!(matches!(page.blocks[0], Block::Opaque(_)));
        assert_eq!(page.to_html(), html);
    }

    #[test]
    fn list_cleanup_unwraps_stray_wrappers() {
        let page = Page::from_html("<ul><div><li>one</li><li>two</li></div></ul>").unwrap();
        assert_eq!(page.to_html(), "<ul><li>one</li><li>two</li></ul>");
    }

    #[test]
    fn nested_list_attaches_to_previous_item() {
        let page = Page::from_html("<ol><li>one</li><ul><li>sub</li></ul></ol>").unwrap();
        assert_eq!(page.to_html(), "<ol><li>one<ul><li>sub</li></ul></li></ol>");
    }

    #[test]
    fn orphan_items_are_wrapped() {
        let page = Page::from_html("<li>a</li><li>b</li><p>c</p>").unwrap();
        assert_eq!(page.to_html(), "<ul><li>a</li><li>b</li></ul><p>c</p>");
    }

    #[test]
    fn continuation_marker_is_lifted_into_the_model() {
        let page = Page::from_html("<p data-continues=\"true\" class=\"x\">front</p>").unwrap();
        let tb = page.blocks[0].as_text_block().unwrap();
        assert!(tb.continues);
        assert_eq!(tb.attrs, vec![("class".to_string(), "x".to_string())]);
        assert_eq!(page.to_html(), "<p class=\"x\" data-continues=\"true\">front</p>");
    }

    #[test]
    fn div_with_block_children_is_opaque() {
        let page = Page::from_html("<div><p>a</p><p>b</p></div>").unwrap();
        assert!(page.blocks[0].is_atomic());
        assert_eq!(page.text(), "ab");
    }

    #[test]
    fn skeleton_table_shape() {
        let t = Table::skeleton(2, 3);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.column_count(), 3);
        let html = Block::Table(t).to_html();
        assert_eq!(html.matches("<td>&nbsp;</td>").count(), 6);
    }
}
