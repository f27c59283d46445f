//! # Page Chrome
//!
//! Which header, sidebar and footer a page gets depends only on where it
//! sits in the document:
//!
//! | page            | header          | sidebar                | footer           |
//! |-----------------|-----------------|------------------------|------------------|
//! | first           | full letterhead | visible                | first-page footer|
//! | any later page  | minimal spacer  | hidden, space reserved | middle footer    |
//!
//! The signatory block is appended to the page the pagination engine chose
//! for it, always the last one. A single-page document is both first and
//! last.
//!
//! Rendering is a pure function of the page, its position and the roster
//! and signatory data. The markup carries the interactive affordances
//! (add forms, delete buttons); document capture strips them for print.

use crate::config::{ChromeMetrics, ContentStyle, EditorConfig, Letterhead};
use crate::html::{escape_text, write_close_tag, write_open_tag};
use crate::layout::signatory_entry_height;
use crate::model::{Member, Page, Roster, Signatories, SignatoryCategory};
use crate::signature::{Rect, Signature};
use crate::toolbar::ZoomLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderVariant {
    FullLetterhead,
    MinimalSpacer,
}

impl HeaderVariant {
    pub fn height(&self, chrome: &ChromeMetrics) -> f64 {
        match self {
            HeaderVariant::FullLetterhead => chrome.letterhead_height,
            HeaderVariant::MinimalSpacer => chrome.spacer_height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarVisibility {
    Visible,
    /// Not drawn, but its width is still kept free so the content column is
    /// the same width on every page.
    HiddenReserved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FooterVariant {
    FirstPage,
    Middle,
}

impl FooterVariant {
    pub fn height(&self, chrome: &ChromeMetrics) -> f64 {
        match self {
            FooterVariant::FirstPage => chrome.first_footer_height,
            FooterVariant::Middle => chrome.middle_footer_height,
        }
    }
}

/// The chrome of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageChrome {
    pub header: HeaderVariant,
    pub sidebar: SidebarVisibility,
    pub footer: FooterVariant,
    pub signatories: bool,
}

impl PageChrome {
    pub fn for_page(page_index: usize, signatory_page: Option<usize>) -> Self {
        let first = crate::model::is_first_page(page_index);
        Self {
            header: if first {
                HeaderVariant::FullLetterhead
            } else {
                HeaderVariant::MinimalSpacer
            },
            sidebar: if first {
                SidebarVisibility::Visible
            } else {
                SidebarVisibility::HiddenReserved
            },
            footer: if first {
                FooterVariant::FirstPage
            } else {
                FooterVariant::Middle
            },
            signatories: signatory_page == Some(page_index),
        }
    }
}

/// Everything a page render needs besides the page itself.
pub struct RenderContext<'a> {
    pub config: &'a EditorConfig,
    pub members: &'a Roster,
    pub signatories: &'a Signatories,
    pub signatures: &'a [Signature],
    pub total_pages: usize,
    pub signatory_page: Option<usize>,
    pub zoom: ZoomLevel,
}

fn open(out: &mut String, tag: &str, attrs: &[(&str, &str)]) {
    let attrs: Vec<(String, String)> = attrs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    write_open_tag(tag, &attrs, out);
}

fn text_element(out: &mut String, tag: &str, class: &str, text: &str) {
    open(out, tag, &[("class", class)]);
    out.push_str(&escape_text(text));
    write_close_tag(tag, out);
}

fn write_letterhead(out: &mut String, letterhead: &Letterhead) {
    open(out, "header", &[("class", "page-header letterhead")]);
    if !letterhead.logo_url.is_empty() {
        open(out, "img", &[("class", "logo"), ("src", &letterhead.logo_url), ("alt", "")]);
    }
    open(out, "div", &[("class", "letterhead-text")]);
    text_element(out, "div", "institution", &letterhead.institution);
    text_element(out, "div", "office", &letterhead.office);
    if !letterhead.address.is_empty() {
        text_element(out, "div", "address", &letterhead.address);
    }
    write_close_tag("div", out);
    write_close_tag("header", out);
}

fn write_sidebar(out: &mut String, members: &Roster, visibility: SidebarVisibility) {
    match visibility {
        SidebarVisibility::HiddenReserved => {
            open(out, "aside", &[("class", "sidebar reserved"), ("aria-hidden", "true")]);
            write_close_tag("aside", out);
        }
        SidebarVisibility::Visible => {
            open(out, "aside", &[("class", "sidebar")]);
            text_element(out, "h3", "sidebar-title", "Executive Board");
            open(out, "ul", &[("class", "roster")]);
            for (i, Member { name, role }) in members.members().iter().enumerate() {
                open(out, "li", &[("class", "member")]);
                text_element(out, "div", "member-name", name);
                text_element(out, "div", "member-role", role);
                let index = i.to_string();
                open(
                    out,
                    "button",
                    &[("class", "delete-btn"), ("data-member", &index), ("type", "button")],
                );
                out.push('×');
                write_close_tag("button", out);
                write_close_tag("li", out);
            }
            write_close_tag("ul", out);
            write_add_form(out, "member", &[("name", "Name"), ("role", "Role")]);
            write_close_tag("aside", out);
        }
    }
}

fn write_add_form(out: &mut String, kind: &str, fields: &[(&str, &str)]) {
    open(out, "form", &[("class", "add-form"), ("data-add", kind)]);
    for (name, placeholder) in fields {
        open(out, "input", &[("name", name), ("placeholder", placeholder)]);
    }
    open(out, "button", &[("type", "submit")]);
    out.push_str("Add");
    write_close_tag("button", out);
    write_close_tag("form", out);
}

fn write_signatories(out: &mut String, signatories: &Signatories) {
    let class = if signatories.is_empty() {
        "signatories no-print"
    } else {
        "signatories"
    };
    open(out, "section", &[("class", class)]);
    for category in SignatoryCategory::ALL {
        let entries = signatories.get(category);
        let can_add = signatories.can_add(category);
        if entries.is_empty() && !can_add {
            continue;
        }
        // Empty categories only exist in the editor, as an add form
        let class = if entries.is_empty() {
            "signatory-group no-print"
        } else {
            "signatory-group"
        };
        open(out, "div", &[("class", class), ("data-category", category.label())]);
        text_element(out, "div", "signatory-label", category.label());
        open(out, "div", &[("class", "signatory-row")]);
        for (i, s) in entries.iter().enumerate() {
            open(out, "div", &[("class", "signatory")]);
            open(out, "div", &[("class", "signature-space")]);
            write_close_tag("div", out);
            text_element(out, "div", "signatory-name", &s.name);
            text_element(out, "div", "signatory-position", &s.position);
            let index = i.to_string();
            open(
                out,
                "button",
                &[("class", "delete-btn"), ("data-signatory", &index), ("type", "button")],
            );
            out.push('×');
            write_close_tag("button", out);
            write_close_tag("div", out);
        }
        write_close_tag("div", out);
        if can_add {
            write_add_form(out, category.label(), &[("name", "Name"), ("position", "Position")]);
        }
        write_close_tag("div", out);
    }
    write_close_tag("section", out);
}

fn write_signature(out: &mut String, sig: &Signature) {
    let style = format!(
        "position: absolute; left: {}px; top: {}px; width: {}px; height: {}px",
        sig.x, sig.y, sig.width, sig.height
    );
    let id = sig.id.to_string();
    open(out, "div", &[("class", "signature-overlay"), ("data-signature", &id), ("style", &style)]);
    open(out, "img", &[("src", &sig.image_data_uri), ("alt", "Signature"), ("draggable", "false")]);
    open(out, "button", &[("class", "delete-btn"), ("type", "button")]);
    out.push('×');
    write_close_tag("button", out);
    write_close_tag("div", out);
}

fn write_footer(out: &mut String, footer: FooterVariant, page_index: usize, ctx: &RenderContext) {
    match footer {
        FooterVariant::FirstPage => {
            open(out, "footer", &[("class", "page-footer first")]);
            if !ctx.config.letterhead.logo_url.is_empty() {
                open(out, "img", &[("class", "footer-logo"), ("src", &ctx.config.letterhead.logo_url), ("alt", "")]);
            }
            text_element(out, "div", "accreditation", &ctx.config.letterhead.accreditation);
        }
        FooterVariant::Middle => {
            open(out, "footer", &[("class", "page-footer middle")]);
            let label = format!("Page {} of {}", page_index + 1, ctx.total_pages);
            text_element(out, "span", "page-number", &label);
            if !ctx.config.letterhead.logo_url.is_empty() {
                open(out, "img", &[("class", "footer-logo"), ("src", &ctx.config.letterhead.logo_url), ("alt", "")]);
            }
        }
    }
    write_close_tag("footer", out);
}

/// Markup of one page with its chrome.
pub fn render_page(page: &Page, page_index: usize, ctx: &RenderContext) -> String {
    let chrome = PageChrome::for_page(page_index, ctx.signatory_page);
    let mut out = String::new();
    let index = page_index.to_string();
    open(&mut out, "div", &[("class", "page"), ("data-page-index", &index)]);

    match chrome.header {
        HeaderVariant::FullLetterhead => write_letterhead(&mut out, &ctx.config.letterhead),
        HeaderVariant::MinimalSpacer => {
            open(&mut out, "div", &[("class", "page-header spacer")]);
            write_close_tag("div", &mut out);
        }
    }

    open(&mut out, "div", &[("class", "page-body")]);
    write_sidebar(&mut out, ctx.members, chrome.sidebar);
    open(&mut out, "main", &[("class", "page-column")]);
    open(
        &mut out,
        "div",
        &[("class", "page-content"), ("contenteditable", "true"), ("data-page-index", &index)],
    );
    out.push_str(&page.to_html());
    write_close_tag("div", &mut out);
    // Nothing to sign yet: the last page still carries the add forms
    let forms_only = ctx.signatory_page.is_none()
        && ctx.signatories.is_empty()
        && page_index + 1 == ctx.total_pages;
    if chrome.signatories || forms_only {
        write_signatories(&mut out, ctx.signatories);
    }
    write_close_tag("main", &mut out);
    write_close_tag("div", &mut out);

    if chrome.signatories {
        for sig in ctx.signatures {
            write_signature(&mut out, sig);
        }
    }

    write_footer(&mut out, chrome.footer, page_index, ctx);
    write_close_tag("div", &mut out);
    out
}

/// Markup of every page, inside the zoomed page container.
pub fn render_document(pages: &[Page], ctx: &RenderContext) -> String {
    let mut out = String::new();
    let transform = ctx.zoom.css_transform();
    open(&mut out, "div", &[("class", "pages"), ("style", &transform)]);
    for (i, page) in pages.iter().enumerate() {
        out.push_str(&render_page(page, i, ctx));
    }
    write_close_tag("div", &mut out);
    out
}

/// Page coordinates of the "Prepared by:" signing area, given how much
/// content sits above the signatory block on `page_index`.
pub fn prepared_by_region(config: &EditorConfig, page_index: usize, content_height: f64) -> Rect {
    let chrome = PageChrome::for_page(page_index, Some(page_index));
    let style = &config.signatories;
    let top = config.margin.top
        + chrome.header.height(&config.chrome)
        + content_height
        + style.top_margin
        + style.label_height;
    let left = config.margin.left + config.chrome.sidebar_width + config.chrome.sidebar_gap;
    let width = config.content_width() / style.entries_per_row.max(1) as f64;
    Rect::new(top, left, width, signatory_entry_height(style))
}

/// The print stylesheet embedded in captured documents: single-column flow,
/// no zoom, sidebar only where it is visible, interactive bits hidden.
///
/// Every spacing the layout probe measures with is stated here, so a
/// renderer never falls back to its own user-agent margins.
pub fn print_stylesheet(config: &EditorConfig) -> String {
    let (w, h) = config.page_size.dimensions();
    let m = &config.margin;
    let c = &config.chrome;
    let mut css = format!(
        "@page {{ size: {w}px {h}px; margin: 0; }}\n\
         body {{ margin: 0; }}\n\
         .pages {{ transform: none !important; }}\n\
         .page {{ position: relative; width: {w}px; height: {h}px; box-sizing: border-box; \
         padding: {mt}px {mr}px {mb}px {ml}px; page-break-after: always; overflow: hidden; }}\n\
         .page:last-child {{ page-break-after: auto; }}\n\
         .letterhead {{ height: {lh}px; }}\n\
         .spacer {{ height: {sh}px; }}\n\
         .page-body {{ display: flex; gap: {gap}px; }}\n\
         .sidebar {{ flex: 0 0 {sw}px; }}\n\
         .sidebar.reserved {{ visibility: hidden; }}\n\
         .page-column {{ flex: 1; min-width: 0; }}\n\
         .page-footer.first {{ position: absolute; bottom: {mb}px; height: {ffh}px; }}\n\
         .page-footer.middle {{ position: absolute; bottom: {mb}px; height: {mfh}px; }}\n\
         .signature-overlay {{ position: absolute; }}\n\
         .no-print, .toolbar, .add-form, .delete-btn {{ display: none !important; }}\n",
        w = w,
        h = h,
        mt = m.top,
        mr = m.right,
        mb = m.bottom,
        ml = m.left,
        lh = c.letterhead_height,
        sh = c.spacer_height,
        gap = c.sidebar_gap,
        sw = c.sidebar_width,
        ffh = c.first_footer_height,
        mfh = c.middle_footer_height,
    );
    css.push_str(&content_rules(&config.content));
    css
}

/// Block typography of the editable column, mirroring `layout::TextMeasurer`.
fn content_rules(s: &ContentStyle) -> String {
    let ps = s.paragraph_spacing;
    let mut css = format!(
        ".page-content {{ display: flow-root; font-family: {ff}; font-size: {fs}px; line-height: {lh}; }}\n\
         .page-content p {{ margin: {ps}px 0; }}\n\
         .page-content blockquote {{ margin: {ps}px 0 {ps}px {bq}px; padding: 0; }}\n\
         .page-content pre {{ margin: {ps}px 0; font-family: monospace; font-size: inherit; white-space: pre-wrap; }}\n\
         .page-content hr {{ margin: {ps}px 0; height: 0; border: 0; border-top: 2px solid; }}\n\
         .page-content figure, .page-content dl, .page-content form, .page-content fieldset \
         {{ margin: {ps}px 0; padding: 0; border: 0; }}\n\
         .page-content ul, .page-content ol {{ margin: {ls}px 0; padding-left: {li}px; }}\n\
         .page-content li {{ margin: 0; }}\n\
         .page-content table {{ width: 100%; table-layout: fixed; border-collapse: collapse; \
         border-spacing: 0; margin: {ts}px 0; }}\n\
         .page-content td, .page-content th {{ padding: {tp}px; border: {tb}px solid; \
         vertical-align: top; text-align: left; }}\n\
         .page-content th {{ font-weight: bold; }}\n",
        ff = s.font_family,
        fs = s.font_size,
        lh = s.line_height,
        bq = 2.0 * s.list_indent,
        ls = s.list_spacing,
        li = s.list_indent,
        ts = s.table_spacing,
        tp = s.table_cell_padding,
        tb = s.table_border,
    );
    for (level, size) in s.heading_sizes.iter().enumerate() {
        css.push_str(&format!(
            ".page-content h{n} {{ font-size: {size}px; margin: {hs}px 0; font-weight: bold; }}\n",
            n = level + 1,
            size = size,
            hs = s.heading_spacing,
        ));
    }
    css
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_table() {
        let first = PageChrome::for_page(0, Some(2));
        assert_eq!(first.header, HeaderVariant::FullLetterhead);
        assert_eq!(first.sidebar, SidebarVisibility::Visible);
        assert_eq!(first.footer, FooterVariant::FirstPage);
        assert!(!first.signatories);

        let middle = PageChrome::for_page(1, Some(2));
        assert_eq!(middle.header, HeaderVariant::MinimalSpacer);
        assert_eq!(middle.sidebar, SidebarVisibility::HiddenReserved);
        assert_eq!(middle.footer, FooterVariant::Middle);

        assert!(PageChrome::for_page(2, Some(2)).signatories);
    }

    #[test]
    fn single_page_is_first_and_last() {
        let only = PageChrome::for_page(0, Some(0));
        assert_eq!(only.header, HeaderVariant::FullLetterhead);
        assert_eq!(only.footer, FooterVariant::FirstPage);
        assert!(only.signatories);
    }

    fn render(pages: &[Page], signatory_page: Option<usize>, members: &Roster, signatories: &Signatories) -> Vec<String> {
        let config = EditorConfig::default();
        let ctx = RenderContext {
            config: &config,
            members,
            signatories,
            signatures: &[],
            total_pages: pages.len(),
            signatory_page,
            zoom: ZoomLevel::default(),
        };
        pages.iter().enumerate().map(|(i, p)| render_page(p, i, &ctx)).collect()
    }

    #[test]
    fn roster_only_on_first_page() {
        let mut members = Roster::new();
        members.add("Ana Cruz", "President");
        let pages = vec![Page::default(), Page::default()];
        let html = render(&pages, None, &members, &Signatories::new());
        assert!(html[0].contains("Ana Cruz"));
        assert!(!html[1].contains("Ana Cruz"));
        assert!(html[1].contains("sidebar reserved"));
        assert!(html[1].contains("Page 2 of 2"));
    }

    #[test]
    fn prepared_by_form_hidden_once_filled() {
        let mut s = Signatories::new();
        let pages = vec![Page::default()];
        let before = render(&pages, Some(0), &Roster::new(), &s);
        assert!(before[0].contains("data-add=\"Prepared by:\""));
        s.add(SignatoryCategory::PreparedBy, "Ana", "Secretary").unwrap();
        let after = render(&pages, Some(0), &Roster::new(), &s);
        assert!(!after[0].contains("data-add=\"Prepared by:\""));
        assert!(after[0].contains("data-add=\"Noted by:\""));
    }

    #[test]
    fn empty_signatories_offer_add_forms_on_last_page() {
        let pages = vec![Page::default(), Page::default()];
        let html = render(&pages, None, &Roster::new(), &Signatories::new());
        assert!(!html[0].contains("data-add=\"Prepared by:\""));
        assert!(html[1].contains("class=\"signatories no-print\""));
        for category in SignatoryCategory::ALL {
            assert!(html[1].contains(&format!("data-add=\"{}\"", category.label())));
        }
    }

    #[test]
    fn print_stylesheet_states_measured_spacing() {
        let mut config = EditorConfig::default();
        config.content.heading_sizes = [31.0, 23.0, 19.0, 17.0, 14.0, 11.0];
        config.content.heading_spacing = 7.0;
        config.content.list_spacing = 5.0;
        config.content.list_indent = 33.0;
        config.content.table_spacing = 9.0;
        config.content.table_cell_padding = 4.0;
        config.content.table_border = 2.0;
        config.content.paragraph_spacing = 6.0;
        let css = print_stylesheet(&config);

        for (n, size) in config.content.heading_sizes.iter().enumerate() {
            let rule = format!(
                ".page-content h{} {{ font-size: {}px; margin: 7px 0; font-weight: bold; }}",
                n + 1,
                size
            );
            assert!(css.contains(&rule), "missing {}", rule);
        }
        for rule in [
            ".page-content p { margin: 6px 0; }",
            ".page-content ul, .page-content ol { margin: 5px 0; padding-left: 33px; }",
            ".page-content li { margin: 0; }",
            "border-collapse: collapse; border-spacing: 0; margin: 9px 0; }",
            ".page-content td, .page-content th { padding: 4px; border: 2px solid;",
            ".page-content blockquote { margin: 6px 0 6px 66px; padding: 0; }",
            ".page-content { display: flow-root;",
        ] {
            assert!(css.contains(rule), "missing {}", rule);
        }
    }

    #[test]
    fn content_is_escaped() {
        let mut members = Roster::new();
        members.add("<script>", "x & y");
        let html = render(&[Page::default()], None, &members, &Signatories::new());
        assert!(html[0].contains("&lt;script&gt;"));
        assert!(html[0].contains("x &amp; y"));
    }

    #[test]
    fn region_sits_below_the_content() {
        let config = EditorConfig::default();
        let a = prepared_by_region(&config, 1, 100.0);
        let b = prepared_by_region(&config, 1, 300.0);
        assert!((b.top - a.top - 200.0).abs() < 1e-9);
        assert!((a.height - 80.0).abs() < 1e-9);
    }
}
