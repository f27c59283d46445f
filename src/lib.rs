//! # Pagewright
//!
//! Print-accurate pagination for editable rich-text documents.
//!
//! An activity plan or budget request is edited directly on A4 pages that
//! look exactly like the printed result: letterhead and roster sidebar on
//! the first page, page numbers below, signatories at the end. Content is
//! not laid out on an endless canvas and cut afterwards. It flows *into*
//! pages: every time the author types, the blocks are re-partitioned so
//! that no page holds more than its chrome leaves room for, text blocks are
//! split between words, and tables and lists move whole.
//!
//! ## Architecture
//!
//! ```text
//! Page HTML
//!       ↓
//!   [model]       Block tree parsed from each page
//!       ↓
//!   [layout]      Content budgets and block heights from font metrics
//!       ↓
//!   [pagination]  Re-partition blocks across pages
//!       ↓
//!   [chrome]      Letterhead, sidebar, footer, signatories around each page
//!       ↓
//!   [export]      Captured print HTML and the document service contracts
//! ```
//!
//! [`editor::Editor`] ties these together with the caret, the signature
//! overlay, undo history and the toolbar.

pub mod chrome;
pub mod config;
pub mod cursor;
pub mod editor;
pub mod error;
pub mod export;
pub mod font;
pub mod html;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod pagination;
pub mod signature;
pub mod template;
pub mod text;
pub mod toolbar;

#[cfg(feature = "wasm")]
pub mod wasm;

use serde::{Deserialize, Serialize};

pub use config::EditorConfig;
pub use editor::Editor;
pub use error::PagewrightError;

use chrome::RenderContext;
use layout::{ContentHeightBudget, LayoutProbe, TextMeasurer};
use model::{Page, Roster, Signatories};
use pagination::{Pagination, Paginator};
use toolbar::ZoomLevel;

/// Reflow `pages` under `config`. Returns the new pages and where the
/// signatory block goes.
pub fn paginate_html<S: AsRef<str>>(
    pages: &[S],
    signatories: &Signatories,
    config: &EditorConfig,
) -> Result<Pagination, PagewrightError> {
    let probe = TextMeasurer::new(config)?;
    paginate_with(&probe, &model::pages_from_html(pages)?, signatories, config)
}

fn paginate_with(
    probe: &TextMeasurer,
    pages: &[Page],
    signatories: &Signatories,
    config: &EditorConfig,
) -> Result<Pagination, PagewrightError> {
    let paginator = Paginator::new(probe, config.overflow_buffer);
    if !probe.budget().is_ready() {
        log::warn!("page chrome leaves no room for content; pages left as they are");
        return Ok(Pagination::as_is(pages, signatories));
    }
    Ok(paginator.reflow(pages, signatories))
}

/// A document as the CLI and the wasm entry point read it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInput {
    pub pages: Vec<String>,
    #[serde(default)]
    pub config: EditorConfig,
    #[serde(default)]
    pub signatories: Signatories,
    #[serde(default)]
    pub members: Roster,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentOutput {
    pub pages: Vec<String>,
    pub signatory_page: Option<usize>,
    pub budget: ContentHeightBudget,
}

/// A reflowed document together with its captured print HTML.
pub struct Paginated {
    pub output: DocumentOutput,
    pub print_html: String,
}

/// Parse a JSON document, reflow it, and capture the print HTML.
pub fn paginate_document(input: &DocumentInput) -> Result<Paginated, PagewrightError> {
    let probe = TextMeasurer::new(&input.config)?;
    let pages = model::pages_from_html(&input.pages)?;
    let result = paginate_with(&probe, &pages, &input.signatories, &input.config)?;

    let ctx = RenderContext {
        config: &input.config,
        members: &input.members,
        signatories: &input.signatories,
        signatures: &[],
        total_pages: result.pages.len(),
        signatory_page: result.signatory_page,
        zoom: ZoomLevel::default(),
    };
    let print_html = export::capture_document(&chrome::render_document(&result.pages, &ctx), &input.config)?;

    Ok(Paginated {
        output: DocumentOutput {
            pages: result.pages.iter().map(Page::to_html).collect(),
            signatory_page: result.signatory_page,
            budget: probe.budget(),
        },
        print_html,
    })
}

/// JSON in, JSON out.
pub fn paginate_json(json: &str) -> Result<String, PagewrightError> {
    let input: DocumentInput = serde_json::from_str(json)?;
    let paginated = paginate_document(&input)?;
    Ok(serde_json::to_string_pretty(&paginated.output)?)
}
