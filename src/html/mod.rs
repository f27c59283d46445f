//! # HTML Fragments
//!
//! A small, forgiving reader for the HTML that an editable page produces,
//! and the matching writer. Editable surfaces emit HTML, not XML: void
//! elements are never closed, named entities like `&nbsp;` appear freely and
//! end tags sometimes don't match. The reader runs `quick-xml` with end-name
//! checks disabled and keeps its own open-element stack so all of that
//! degrades gracefully instead of failing.

use std::borrow::Cow;

use quick_xml::escape::{escape, partial_escape, resolve_predefined_entity, unescape_with};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::PagewrightError;

/// A node in a parsed HTML fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum HtmlNode {
    Element(HtmlElement),
    Text(String),
}

/// An element with its attributes in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlElement {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<HtmlNode>,
}

impl HtmlElement {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whitespace-separated `class` attribute contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Concatenated text of all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[HtmlNode], out: &mut String) {
    for node in nodes {
        match node {
            HtmlNode::Text(t) => out.push_str(t),
            HtmlNode::Element(el) => collect_text(&el.children, out),
        }
    }
}

/// Elements that never have content or an end tag.
pub fn is_void(tag: &str) -> bool {
    matches!(
        tag,
        "br" | "hr" | "img" | "input" | "meta" | "link" | "col" | "wbr" | "source" | "area"
    )
}

/// HTML named entities beyond the five XML ones that editors commonly emit.
fn html_entity(name: &str) -> Option<&'static str> {
    match name {
        "nbsp" => Some("\u{00A0}"),
        "ensp" => Some("\u{2002}"),
        "emsp" => Some("\u{2003}"),
        "thinsp" => Some("\u{2009}"),
        "ndash" => Some("\u{2013}"),
        "mdash" => Some("\u{2014}"),
        "lsquo" => Some("\u{2018}"),
        "rsquo" => Some("\u{2019}"),
        "ldquo" => Some("\u{201C}"),
        "rdquo" => Some("\u{201D}"),
        "hellip" => Some("\u{2026}"),
        "bull" => Some("\u{2022}"),
        "middot" => Some("\u{00B7}"),
        "copy" => Some("\u{00A9}"),
        "reg" => Some("\u{00AE}"),
        "trade" => Some("\u{2122}"),
        "deg" => Some("\u{00B0}"),
        "plusmn" => Some("\u{00B1}"),
        "times" => Some("\u{00D7}"),
        "divide" => Some("\u{00F7}"),
        "peso" => Some("\u{20B1}"),
        "euro" => Some("\u{20AC}"),
        "pound" => Some("\u{00A3}"),
        "yen" => Some("\u{00A5}"),
        "sect" => Some("\u{00A7}"),
        "para" => Some("\u{00B6}"),
        "laquo" => Some("\u{00AB}"),
        "raquo" => Some("\u{00BB}"),
        "shy" => Some("\u{00AD}"),
        _ => None,
    }
}

/// Decode entities, leaving the raw text alone if it contains an unknown one.
fn decode_text(raw: &str) -> String {
    match unescape_with(raw, |ent| {
        resolve_predefined_entity(ent).or_else(|| html_entity(ent))
    }) {
        Ok(text) => text.into_owned(),
        Err(_) => raw.to_string(),
    }
}

fn read_element(start: &BytesStart) -> HtmlElement {
    let tag = String::from_utf8_lossy(start.name().as_ref()).to_ascii_lowercase();
    let attrs = start
        .attributes()
        .with_checks(false)
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
            let raw = String::from_utf8_lossy(&attr.value);
            (key, decode_text(&raw))
        })
        .collect();
    HtmlElement {
        tag,
        attrs,
        children: Vec::new(),
    }
}

/// Parse an HTML fragment into a list of top-level nodes.
///
/// Comments, processing instructions and doctypes are dropped. Unclosed
/// elements are closed at the end of the input; end tags with no matching
/// open element are ignored.
pub fn parse_fragment(html: &str) -> Result<Vec<HtmlNode>, PagewrightError> {
    let mut reader = Reader::from_str(html);
    {
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.check_comments = false;
    }

    // stack[0] is the fragment root
    let mut stack: Vec<HtmlElement> = vec![HtmlElement::new("#fragment")];
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let el = read_element(&e);
                if is_void(&el.tag) {
                    push_child(&mut stack, HtmlNode::Element(el));
                } else {
                    stack.push(el);
                }
            }
            Ok(Event::Empty(e)) => {
                let el = read_element(&e);
                push_child(&mut stack, HtmlNode::Element(el));
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
                if let Some(pos) = stack.iter().rposition(|el| el.tag == name) {
                    if pos > 0 {
                        while stack.len() > pos {
                            close_top(&mut stack);
                        }
                    }
                }
            }
            Ok(Event::Text(e)) => {
                let raw = String::from_utf8_lossy(&e);
                let text = decode_text(&raw);
                if !text.is_empty() {
                    push_child(&mut stack, HtmlNode::Text(text));
                }
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                push_child(&mut stack, HtmlNode::Text(text));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(PagewrightError::MarkupError(format!(
                    "at byte {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
        }
        buf.clear();
    }

    while stack.len() > 1 {
        close_top(&mut stack);
    }
    Ok(stack.pop().map(|root| root.children).unwrap_or_default())
}

fn push_child(stack: &mut [HtmlElement], node: HtmlNode) {
    if let Some(top) = stack.last_mut() {
        // adjacent text nodes merge, the way a DOM normalizes them
        if let (HtmlNode::Text(t), Some(HtmlNode::Text(prev))) = (&node, top.children.last_mut()) {
            prev.push_str(t);
            return;
        }
        top.children.push(node);
    }
}

fn close_top(stack: &mut Vec<HtmlElement>) {
    if let Some(el) = stack.pop() {
        push_child(stack, HtmlNode::Element(el));
    }
}

/// Escape text content. Non-breaking spaces are written as `&nbsp;` so
/// they survive whitespace-collapsing consumers.
pub fn escape_text(text: &str) -> String {
    let escaped: Cow<str> = partial_escape(text);
    if escaped.contains('\u{00A0}') {
        escaped.replace('\u{00A0}', "&nbsp;")
    } else {
        escaped.into_owned()
    }
}

pub fn write_open_tag(tag: &str, attrs: &[(String, String)], out: &mut String) {
    out.push('<');
    out.push_str(tag);
    for (k, v) in attrs {
        out.push(' ');
        out.push_str(k);
        out.push_str("=\"");
        out.push_str(&escape(v.as_str()));
        out.push('"');
    }
    out.push('>');
}

pub fn write_close_tag(tag: &str, out: &mut String) {
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Serialize nodes back to HTML.
pub fn write_nodes(nodes: &[HtmlNode], out: &mut String) {
    for node in nodes {
        match node {
            HtmlNode::Text(t) => out.push_str(&escape_text(t)),
            HtmlNode::Element(el) => write_element(el, out),
        }
    }
}

pub fn write_element(el: &HtmlElement, out: &mut String) {
    write_open_tag(&el.tag, &el.attrs, out);
    if is_void(&el.tag) {
        return;
    }
    write_nodes(&el.children, out);
    write_close_tag(&el.tag, out);
}

pub fn to_html(nodes: &[HtmlNode]) -> String {
    let mut out = String::new();
    write_nodes(nodes, &mut out);
    out
}

/// Remove every element (with its subtree) for which `drop` returns true.
pub fn retain_elements(nodes: &mut Vec<HtmlNode>, drop: &dyn Fn(&HtmlElement) -> bool) {
    nodes.retain(|node| match node {
        HtmlNode::Element(el) => !drop(el),
        HtmlNode::Text(_) => true,
    });
    for node in nodes.iter_mut() {
        if let HtmlNode::Element(el) = node {
            retain_elements(&mut el.children, drop);
        }
    }
}

/// Read a single `name: value` declaration out of an inline `style` attribute.
pub fn style_property<'a>(style: &'a str, name: &str) -> Option<&'a str> {
    style.split(';').find_map(|decl| {
        let (k, v) = decl.split_once(':')?;
        if k.trim().eq_ignore_ascii_case(name) {
            Some(v.trim())
        } else {
            None
        }
    })
}

/// Set (or replace) one declaration in an inline style string.
pub fn set_style_property(style: &str, name: &str, value: &str) -> String {
    let mut decls: Vec<String> = style
        .split(';')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .filter(|d| {
            d.split_once(':')
                .map(|(k, _)| !k.trim().eq_ignore_ascii_case(name))
                .unwrap_or(true)
        })
        .map(str::to_string)
        .collect();
    decls.push(format!("{}: {}", name, value));
    decls.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_element(nodes: &[HtmlNode]) -> &HtmlElement {
        match &nodes[0] {
            HtmlNode::Element(el) => el,
            other => panic!("expected element, got {:?}", other),
        }
    }

    #[test]
    fn parses_nested_elements() {
        let nodes = parse_fragment("<p>Hello <b>bold</b> world</p>").unwrap();
        assert_eq!(nodes.len(), 1);
        let p = first_element(&nodes);
        assert_eq!(p.tag, "p");
        assert_eq!(p.children.len(), 3);
        assert_eq!(p.text_content(), "Hello bold world");
    }

    #[test]
    fn unclosed_void_elements_do_not_swallow_siblings() {
        let nodes = parse_fragment("<p>one<br>two</p><p>three</p>").unwrap();
        assert_eq!(nodes.len(), 2);
        let p = first_element(&nodes);
        assert_eq!(p.children.len(), 3);
        assert_eq!(to_html(&nodes), "<p>one<br>two</p><p>three</p>");
    }

    #[test]
    fn html_entities_decode() {
        let nodes = parse_fragment("<p>a&nbsp;b &amp; c&mdash;d</p>").unwrap();
        assert_eq!(first_element(&nodes).text_content(), "a\u{a0}b & c\u{2014}d");
    }

    #[test]
    fn nbsp_round_trips_as_entity() {
        let nodes = parse_fragment("<td>&nbsp;</td>").unwrap();
        assert_eq!(to_html(&nodes), "<td>&nbsp;</td>");
    }

    #[test]
    fn stray_end_tags_are_ignored() {
        let nodes = parse_fragment("<p>text</span></p>").unwrap();
        assert_eq!(to_html(&nodes), "<p>text</p>");
    }

    #[test]
    fn unclosed_elements_close_at_end() {
        let nodes = parse_fragment("<p>open <i>italic").unwrap();
        assert_eq!(to_html(&nodes), "<p>open <i>italic</i></p>");
    }

    #[test]
    fn attributes_keep_order_and_escape() {
        let nodes = parse_fragment(r#"<a href="https://x.test/?a=1&amp;b=2" class="link">x</a>"#)
            .unwrap();
        let a = first_element(&nodes);
        assert_eq!(a.attr("href"), Some("https://x.test/?a=1&b=2"));
        assert!(a.has_class("link"));
        assert_eq!(
            to_html(&nodes),
            r#"<a href="https://x.test/?a=1&amp;b=2" class="link">x</a>"#
        );
    }

    #[test]
    fn retain_drops_marked_subtrees() {
        let mut nodes =
            parse_fragment(r#"<div><button class="delete-btn">x</button><p>keep</p></div>"#)
                .unwrap();
        retain_elements(&mut nodes, &|el| el.has_class("delete-btn"));
        assert_eq!(to_html(&nodes), "<div><p>keep</p></div>");
    }

    #[test]
    fn style_helpers() {
        let style = "color: red; font-size: 14pt";
        assert_eq!(style_property(style, "font-size"), Some("14pt"));
        assert_eq!(style_property(style, "margin"), None);
        assert_eq!(
            set_style_property(style, "font-size", "10pt"),
            "color: red; font-size: 10pt"
        );
    }
}
