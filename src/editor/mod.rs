//! # Editor Session
//!
//! Owns everything one open document needs: the pages, the roster and
//! signatories, the signature overlay, undo history and the pending caret.
//! Other components get read-only views; every change goes through a method
//! here so the session knows when to reflow.
//!
//! Typing does not reflow immediately. [`Editor::input`] records the new
//! page content and the caret, then [`Editor::tick`] reflows once the
//! content has been quiet for the debounce delay. Time is passed in by the
//! caller. Structural changes (signatories, undo, table insertion from the
//! picker) reflow at once.

pub mod debounce;
pub mod history;

use std::time::{Duration, Instant};

use crate::chrome::{self, RenderContext};
use crate::config::EditorConfig;
use crate::cursor::{self, CursorTracker, TextAnchor, TextPosition};
use crate::error::PagewrightError;
use crate::export::{
    self, DocumentClient, DocumentData, Endpoint, GeneratePdfResponse, PreviewResponse, RenderRequest,
    SaveDocumentRequest, SubmitResponse,
};
use crate::layout::{ContentHeightBudget, LayoutProbe, TextMeasurer};
use crate::model::{document_html, Page, Roster, Signatories, SignatoryCategory};
use crate::pagination::{self, PaginationOutcome, Paginator};
use crate::signature::{Placement, Point, Rect, SignatureLayer};
use crate::template::{self, DocumentKind};
use crate::toolbar::format::{self, FormattingCommand, TextRange};
use crate::toolbar::{SavedSelection, TablePicker, ToolbarAction, ZoomLevel};

pub use debounce::Debouncer;
pub use history::History;

/// Where the caret belongs after a reflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaretPlacement {
    pub page_index: usize,
    pub anchor: TextAnchor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing was due.
    Idle,
    /// Budgets are not measured yet; the reflow is retried on a later tick.
    NotReady,
    Settled {
        reflowed: bool,
        caret: Option<CaretPlacement>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Done { changed: bool },
    /// Print this captured document.
    Print(String),
    /// Call the matching service method with a [`DocumentClient`].
    NeedsService(Endpoint),
}

pub struct Editor {
    config: EditorConfig,
    probe: TextMeasurer,
    pages: Vec<Page>,
    signatory_page: Option<usize>,
    members: Roster,
    signatories: Signatories,
    signatures: SignatureLayer,
    cursor: CursorTracker,
    history: History,
    debouncer: Debouncer,
    table_picker: TablePicker,
    zoom: ZoomLevel,
    focused_page: usize,
    preview_file: Option<String>,
    last_saved: Option<String>,
}

impl Editor {
    /// A session over existing pages, reflowed once before it is returned.
    pub fn new(config: EditorConfig, pages: Vec<Page>) -> Result<Self, PagewrightError> {
        let probe = TextMeasurer::new(&config)?;
        let pages = if pages.is_empty() { vec![Page::default()] } else { pages };
        let mut editor = Self {
            signatures: SignatureLayer::new(&config.signature),
            history: History::new(config.history_limit),
            debouncer: Debouncer::new(Duration::from_millis(config.debounce_ms)),
            table_picker: TablePicker::new(config.table_picker_rows, config.table_picker_cols),
            zoom: ZoomLevel::nearest(config.default_zoom),
            probe,
            pages,
            signatory_page: None,
            members: Roster::new(),
            signatories: Signatories::new(),
            cursor: CursorTracker::new(),
            focused_page: 0,
            preview_file: None,
            last_saved: None,
            config,
        };
        editor.reflow();
        Ok(editor)
    }

    /// A new document of `kind`, its skeleton filled from `data`.
    pub fn from_template(
        config: EditorConfig,
        kind: DocumentKind,
        data: &serde_json::Value,
    ) -> Result<Self, PagewrightError> {
        let page = template::new_document(kind, data)?;
        Self::new(config, vec![page])
    }

    /// Reopen a saved draft.
    pub fn from_draft(config: EditorConfig, data: &DocumentData) -> Result<Self, PagewrightError> {
        let pages = crate::model::pages_from_html(&data.pages)?;
        let mut editor = Self::new(config, pages)?;
        editor.members = data.members.clone();
        editor.signatories = data.signatories.clone();
        editor.reflow();
        let region = editor.prepared_by_region();
        for signature in data.signatures.iter().cloned() {
            if editor.signatures.restore(signature, &region) == Placement::Rejected {
                log::warn!("draft carries more than one signature; keeping the first");
            }
        }
        Ok(editor)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn signatory_page(&self) -> Option<usize> {
        self.signatory_page
    }

    pub fn members(&self) -> &Roster {
        &self.members
    }

    pub fn signatories(&self) -> &Signatories {
        &self.signatories
    }

    pub fn signatures(&self) -> &SignatureLayer {
        &self.signatures
    }

    pub fn zoom(&self) -> ZoomLevel {
        self.zoom
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn table_picker(&self) -> &TablePicker {
        &self.table_picker
    }

    pub fn table_picker_mut(&mut self) -> &mut TablePicker {
        &mut self.table_picker
    }

    pub fn last_saved(&self) -> Option<&str> {
        self.last_saved.as_deref()
    }

    /// Replace the measured content budgets, as when the host measured its
    /// own chrome. An unready budget pauses pagination.
    pub fn set_budget(&mut self, budget: ContentHeightBudget) {
        self.probe.set_budget(budget);
    }

    fn check_page(&self, page_index: usize) -> Result<(), PagewrightError> {
        if page_index < self.pages.len() {
            Ok(())
        } else {
            Err(PagewrightError::PageOutOfRange {
                index: page_index,
                count: self.pages.len(),
            })
        }
    }

    /// The user edited page `page_index`; `anchor` is the caret in the new
    /// content.
    pub fn input(
        &mut self,
        page_index: usize,
        html: &str,
        anchor: TextAnchor,
        now: Instant,
    ) -> Result<(), PagewrightError> {
        self.check_page(page_index)?;
        let page = Page::from_html(html)?;
        if page == self.pages[page_index] {
            return Ok(());
        }
        self.history.record(self.pages.clone());
        self.cursor.record(cursor::capture(&page, page_index, anchor));
        self.pages[page_index] = page;
        self.focused_page = page_index;
        self.debouncer.schedule(now);
        Ok(())
    }

    /// Run the debounced reflow when it is due.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        if !self.debouncer.fire(now) {
            return TickOutcome::Idle;
        }
        let outcome = self.reflow();
        if outcome == TickOutcome::NotReady {
            self.debouncer.schedule(now);
        }
        outcome
    }

    /// Reflow right away. A caret recorded by [`Editor::input`] is carried
    /// across; otherwise the caret is left alone.
    pub fn reflow(&mut self) -> TickOutcome {
        let paginator = Paginator::new(&self.probe, self.config.overflow_buffer);
        let outcome = paginator.paginate(&self.pages, &self.signatories);
        let pending = self.cursor.take();
        match outcome {
            PaginationOutcome::NotReady => {
                if let Some(pos) = pending {
                    self.cursor.record(pos);
                }
                self.signatory_page = pagination::last_page_if_signed(&self.pages, &self.signatories);
                TickOutcome::NotReady
            }
            PaginationOutcome::Unchanged { signatory_page } => {
                self.signatory_page = signatory_page;
                TickOutcome::Settled {
                    reflowed: false,
                    caret: pending.map(|pos| self.place_caret(pos)),
                }
            }
            PaginationOutcome::Reflowed(result) => {
                let offset = pending.map(|pos| cursor::document_offset(&self.pages, &pos));
                self.pages = result.pages;
                self.signatory_page = result.signatory_page;
                self.focused_page = self.focused_page.min(self.pages.len() - 1);
                TickOutcome::Settled {
                    reflowed: true,
                    caret: offset.map(|o| self.place_caret(cursor::locate(&self.pages, o))),
                }
            }
        }
    }

    fn place_caret(&self, pos: TextPosition) -> CaretPlacement {
        let anchor = self
            .pages
            .get(pos.page_index)
            .map(|page| cursor::restore(page, &pos))
            .unwrap_or_default();
        CaretPlacement {
            page_index: pos.page_index,
            anchor,
        }
    }

    /// Apply a formatting command to the selection on `page_index`.
    pub fn format(
        &mut self,
        page_index: usize,
        range: &TextRange,
        command: &FormattingCommand,
        now: Instant,
    ) -> Result<bool, PagewrightError> {
        self.check_page(page_index)?;
        let before = self.pages.clone();
        let changed = format::apply(&mut self.pages[page_index], range, command);
        if changed {
            self.history.record(before);
            self.focused_page = page_index;
            self.debouncer.schedule(now);
        }
        Ok(changed)
    }

    /// Open the table picker, remembering the selection it will insert at.
    pub fn open_table_picker(&mut self, selection: Option<SavedSelection>) {
        self.table_picker.open(selection);
    }

    /// Insert the table chosen in the picker. Without a saved selection the
    /// table goes at the end of the focused page.
    pub fn commit_table(&mut self) -> Result<bool, PagewrightError> {
        let Some(insertion) = self.table_picker.commit() else {
            return Ok(false);
        };
        let (page_index, range) = match insertion.at {
            Some(saved) => (saved.page_index, Some(saved.range)),
            None => {
                log::debug!("no saved selection, appending table to page {}", self.focused_page);
                (self.focused_page, None)
            }
        };
        self.check_page(page_index)?;
        self.history.record(self.pages.clone());
        format::insert_table(&mut self.pages[page_index], range.as_ref(), insertion.rows, insertion.cols);
        self.reflow();
        Ok(true)
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo(self.pages.clone()) {
            Some(pages) => {
                self.restore_pages(pages);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(self.pages.clone()) {
            Some(pages) => {
                self.restore_pages(pages);
                true
            }
            None => false,
        }
    }

    fn restore_pages(&mut self, pages: Vec<Page>) {
        self.pages = pages;
        self.cursor.clear();
        self.debouncer.cancel();
        self.reflow();
    }

    /// Handle a toolbar action. `selection` is the live selection, if any.
    pub fn apply_action(
        &mut self,
        action: &ToolbarAction,
        selection: Option<SavedSelection>,
        now: Instant,
    ) -> Result<ActionOutcome, PagewrightError> {
        let done = |changed: bool| -> Result<ActionOutcome, PagewrightError> {
            Ok(ActionOutcome::Done { changed })
        };
        match action {
            ToolbarAction::Undo => done(self.undo()),
            ToolbarAction::Redo => done(self.redo()),
            ToolbarAction::ZoomIn => {
                self.zoom = self.zoom.zoom_in();
                done(false)
            }
            ToolbarAction::ZoomOut => {
                self.zoom = self.zoom.zoom_out();
                done(false)
            }
            ToolbarAction::Zoom { percent } => {
                self.zoom = ZoomLevel::nearest(*percent);
                done(false)
            }
            ToolbarAction::Format { command } => match (selection, command) {
                (Some(sel), _) => done(self.format(sel.page_index, &sel.range, command, now)?),
                (None, FormattingCommand::InsertTable { rows, cols }) => {
                    self.check_page(self.focused_page)?;
                    self.history.record(self.pages.clone());
                    format::insert_table(&mut self.pages[self.focused_page], None, *rows, *cols);
                    self.debouncer.schedule(now);
                    done(true)
                }
                (None, _) => {
                    log::debug!("formatting command without a selection ignored");
                    done(false)
                }
            },
            ToolbarAction::Print => Ok(ActionOutcome::Print(self.captured_html()?)),
            ToolbarAction::SaveDraft => Ok(ActionOutcome::NeedsService(Endpoint::SaveDocument)),
            ToolbarAction::Preview => Ok(ActionOutcome::NeedsService(Endpoint::Preview)),
            ToolbarAction::GenerateFinal => Ok(ActionOutcome::NeedsService(Endpoint::GeneratePdf)),
            ToolbarAction::SubmitForApproval => Ok(ActionOutcome::NeedsService(Endpoint::SubmitForApproval)),
        }
    }

    pub fn add_member(&mut self, name: &str, role: &str) {
        self.members.add(name, role);
    }

    pub fn remove_member(&mut self, index: usize) -> bool {
        self.members.remove(index).is_some()
    }

    /// Add a signatory. The signatory block grows, so pages reflow.
    pub fn add_signatory(
        &mut self,
        category: SignatoryCategory,
        name: &str,
        position: &str,
    ) -> Result<(), PagewrightError> {
        self.signatories.add(category, name, position)?;
        self.reflow();
        Ok(())
    }

    pub fn remove_signatory(&mut self, category: SignatoryCategory, index: usize) -> bool {
        let removed = self.signatories.remove(category, index).is_some();
        if removed {
            self.reflow();
        }
        removed
    }

    /// Page coordinates of the "Prepared by:" entry on the signatory page,
    /// the area signatures are clamped to.
    pub fn prepared_by_region(&self) -> Rect {
        let page_index = self.signatory_page.unwrap_or(self.pages.len() - 1);
        let content_h = self
            .pages
            .get(page_index)
            .map(|p| self.probe.measure(&p.blocks))
            .unwrap_or(0.0);
        chrome::prepared_by_region(&self.config, page_index, content_h)
    }

    /// Place an uploaded signature image near `at`.
    pub fn place_signature(&mut self, image_src: &str, at: Point) -> Result<Placement, PagewrightError> {
        let region = self.prepared_by_region();
        self.signatures.place_data_uri(image_src, at, &region)
    }

    pub fn remove_signature(&mut self) -> bool {
        self.signatures.remove().is_some()
    }

    pub fn begin_signature_drag(&mut self, pointer: Point) -> bool {
        self.signatures.begin_drag(pointer, self.zoom.scale())
    }

    pub fn drag_signature(&mut self, pointer: Point) -> Option<Point> {
        let region = self.prepared_by_region();
        self.signatures.drag_to(pointer, &region)
    }

    pub fn end_signature_drag(&mut self) {
        self.signatures.end_drag();
    }

    /// Editor markup of every page with its chrome.
    pub fn render(&self) -> String {
        let signatures = self.signatures.signatures();
        let ctx = RenderContext {
            config: &self.config,
            members: &self.members,
            signatories: &self.signatories,
            signatures: &signatures,
            total_pages: self.pages.len(),
            signatory_page: self.signatory_page,
            zoom: self.zoom,
        };
        chrome::render_document(&self.pages, &ctx)
    }

    /// The standalone print document.
    pub fn captured_html(&self) -> Result<String, PagewrightError> {
        export::capture_document(&self.render(), &self.config)
    }

    pub fn document_data(&self, timestamp: String) -> DocumentData {
        DocumentData {
            html: document_html(&self.pages),
            pages: self.pages.iter().map(Page::to_html).collect(),
            members: self.members.clone(),
            signatories: self.signatories.clone(),
            signatures: self.signatures.signatures(),
            timestamp,
        }
    }

    fn render_request(&self) -> Result<RenderRequest, PagewrightError> {
        Ok(RenderRequest {
            html: self.captured_html()?,
            members: self.members.clone(),
            signatories: self.signatories.clone(),
        })
    }

    /// Save a draft. Nothing in the session changes unless the save
    /// succeeded.
    pub fn save_draft(&mut self, client: &DocumentClient) -> Result<(), PagewrightError> {
        let timestamp = chrono::Utc::now().to_rfc3339();
        let request = SaveDocumentRequest::new(self.captured_html()?, &self.document_data(timestamp.clone()))?;
        client.save_document(&request)?;
        log::info!("draft saved at {}", timestamp);
        self.last_saved = Some(timestamp);
        Ok(())
    }

    pub fn preview(&mut self, client: &DocumentClient) -> Result<PreviewResponse, PagewrightError> {
        let response = client.preview(&self.render_request()?)?;
        if let Some(old) = std::mem::replace(&mut self.preview_file, response.filename.clone()) {
            self.discard_preview_file(client, &old);
        }
        Ok(response)
    }

    /// The preview was closed; ask the service to delete its file.
    pub fn close_preview(&mut self, client: &DocumentClient) {
        if let Some(filename) = self.preview_file.take() {
            self.discard_preview_file(client, &filename);
        }
    }

    fn discard_preview_file(&self, client: &DocumentClient, filename: &str) {
        if let Err(e) = client.cleanup_preview(filename) {
            log::warn!("could not clean up preview {}: {}", filename, e);
        }
    }

    pub fn generate_final(&self, client: &DocumentClient) -> Result<GeneratePdfResponse, PagewrightError> {
        Ok(client.generate_pdf(&self.render_request()?)?)
    }

    pub fn submit_for_approval(&self, client: &DocumentClient) -> Result<SubmitResponse, PagewrightError> {
        Ok(client.submit_for_approval(&self.render_request()?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{CsrfToken, DocumentService, ServiceError};
    use crate::image_loader::tests::png_base64;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{:02}", i)).collect::<Vec<_>>().join(" ")
    }

    fn editor(pages: &[&str]) -> Editor {
        let pages = pages.iter().map(|h| Page::from_html(h).unwrap()).collect();
        Editor::new(EditorConfig::default(), pages).unwrap()
    }

    #[test]
    fn input_waits_for_the_debounce() {
        let mut ed = editor(&["<p>a</p>"]);
        let t0 = Instant::now();
        ed.input(0, "<p>ab</p>", TextAnchor { node: 0, offset: 2 }, t0).unwrap();
        assert_eq!(ed.tick(t0 + Duration::from_millis(100)), TickOutcome::Idle);
        let outcome = ed.tick(t0 + Duration::from_millis(250));
        assert_eq!(
            outcome,
            TickOutcome::Settled {
                reflowed: false,
                caret: Some(CaretPlacement {
                    page_index: 0,
                    anchor: TextAnchor { node: 0, offset: 2 }
                })
            }
        );
    }

    #[test]
    fn caret_follows_text_onto_the_next_page() {
        let mut ed = editor(&["<p>x</p>"]);
        ed.set_budget(ContentHeightBudget::new(60.0, 60.0));
        let t0 = Instant::now();
        // One 40px line per page under a 55px limit.
        let text = words(60);
        let caret = text.len() - 3;
        ed.input(0, &format!("<p>{}</p>", text), TextAnchor { node: 0, offset: caret }, t0)
            .unwrap();
        let TickOutcome::Settled { reflowed, caret: Some(placed) } = ed.tick(t0 + Duration::from_secs(1)) else {
            panic!("expected a settled reflow");
        };
        assert!(reflowed);
        assert!(placed.page_index > 0);
        let pos = TextPosition {
            page_index: placed.page_index,
            offset: cursor::capture(&ed.pages()[placed.page_index], placed.page_index, placed.anchor).offset,
        };
        assert_eq!(cursor::document_offset(ed.pages(), &pos), caret);
    }

    #[test]
    fn unready_budget_retries() {
        let mut ed = editor(&["<p>a</p>"]);
        ed.set_budget(ContentHeightBudget::default());
        let t0 = Instant::now();
        ed.input(0, "<p>ab</p>", TextAnchor::default(), t0).unwrap();
        let later = t0 + Duration::from_secs(1);
        assert_eq!(ed.tick(later), TickOutcome::NotReady);
        assert_eq!(ed.tick(later), TickOutcome::Idle);
        ed.set_budget(crate::layout::MeasurementSandbox::new(&EditorConfig::default()).measure());
        assert!(matches!(ed.tick(later + Duration::from_secs(1)), TickOutcome::Settled { .. }));
    }

    #[test]
    fn input_on_a_missing_page_is_an_error() {
        let mut ed = editor(&["<p>a</p>"]);
        let err = ed.input(3, "<p>b</p>", TextAnchor::default(), Instant::now()).unwrap_err();
        assert!(matches!(err, PagewrightError::PageOutOfRange { index: 3, count: 1 }));
    }

    #[test]
    fn undo_restores_the_previous_content() {
        let mut ed = editor(&["<p>a</p>"]);
        let now = Instant::now();
        ed.input(0, "<p>changed</p>", TextAnchor::default(), now).unwrap();
        assert!(ed.apply_action(&ToolbarAction::Undo, None, now).unwrap() == ActionOutcome::Done { changed: true });
        assert_eq!(ed.pages()[0].to_html(), "<p>a</p>");
        assert!(ed.redo());
        assert_eq!(ed.pages()[0].to_html(), "<p>changed</p>");
    }

    #[test]
    fn signatories_land_on_the_last_page() {
        let mut ed = editor(&["<p>a</p>"]);
        assert_eq!(ed.signatory_page(), None);
        ed.add_signatory(SignatoryCategory::PreparedBy, "Ana", "Secretary").unwrap();
        assert_eq!(ed.signatory_page(), Some(0));
        assert!(ed.add_signatory(SignatoryCategory::PreparedBy, "Ben", "President").is_err());
        assert!(ed.render().contains("Ana"));
    }

    #[test]
    fn table_without_selection_goes_to_the_focused_page() {
        let mut ed = editor(&["<p>a</p>"]);
        ed.open_table_picker(None);
        ed.table_picker_mut().hover(2, 2);
        assert!(ed.commit_table().unwrap());
        assert!(ed.pages()[0].to_html().contains("<table style="));
    }

    #[test]
    fn signature_stays_near_prepared_by() {
        let mut ed = editor(&["<p>a</p>"]);
        ed.add_signatory(SignatoryCategory::PreparedBy, "Ana", "Secretary").unwrap();
        let placed = ed.place_signature(&png_base64(300, 100), Point::new(0.0, 0.0)).unwrap();
        assert_eq!(placed, Placement::Placed(1));
        let region = ed.prepared_by_region().expand(ed.config().signature.clamp_margin);
        assert!(region.encloses(&ed.signatures().signature().unwrap().bounds()));
        assert_eq!(
            ed.place_signature(&png_base64(10, 10), Point::default()).unwrap(),
            Placement::Rejected
        );
    }

    struct Failing;

    impl DocumentService for Failing {
        fn post(&self, endpoint: Endpoint, _: &[(&str, String)], _: &serde_json::Value) -> Result<serde_json::Value, ServiceError> {
            Err(ServiceError::Transport {
                endpoint: endpoint.path().to_string(),
                message: "offline".into(),
            })
        }
    }

    #[test]
    fn failed_save_leaves_state_alone() {
        let mut ed = editor(&["<p>a</p>"]);
        let client = DocumentClient::new(&Failing, CsrfToken::resolve(Some("t"), None));
        let pages = ed.pages().to_vec();
        assert!(matches!(ed.save_draft(&client), Err(PagewrightError::ServiceError(_))));
        assert_eq!(ed.pages(), pages.as_slice());
        assert!(ed.last_saved().is_none());
    }

    #[test]
    fn print_captures_without_interactive_markup() {
        let mut ed = editor(&["<p>a</p>"]);
        ed.add_member("Ana", "President");
        let ActionOutcome::Print(html) = ed.apply_action(&ToolbarAction::Print, None, Instant::now()).unwrap() else {
            panic!("expected print output");
        };
        assert!(html.contains("Ana"));
        assert!(!html.contains("delete-btn\""));
        assert!(!html.contains("contenteditable"));
    }

    #[test]
    fn drag_deltas_follow_the_zoom() {
        let mut ed = editor(&["<p>a</p>"]);
        ed.add_signatory(SignatoryCategory::PreparedBy, "Ana", "Secretary").unwrap();
        ed.apply_action(&ToolbarAction::Zoom { percent: 200 }, None, Instant::now()).unwrap();
        let region = ed.prepared_by_region();
        let start = Point::new(region.left + 20.0, region.top);
        ed.place_signature(&png_base64(30, 10), start).unwrap();
        assert!(ed.begin_signature_drag(Point::new(0.0, 0.0)));
        let moved = ed.drag_signature(Point::new(40.0, 0.0)).unwrap();
        assert!((moved.x - (start.x + 20.0)).abs() < 1e-9);
        ed.end_signature_drag();
        assert!(ed.drag_signature(Point::new(80.0, 0.0)).is_none());
    }

    #[test]
    fn removing_the_last_signatory_drops_the_block() {
        let mut ed = editor(&["<p>a</p>"]);
        ed.add_signatory(SignatoryCategory::NotedBy, "Adviser", "Faculty").unwrap();
        assert_eq!(ed.signatory_page(), Some(0));
        assert!(ed.remove_signatory(SignatoryCategory::NotedBy, 0));
        assert_eq!(ed.signatory_page(), None);
        assert!(!ed.remove_signatory(SignatoryCategory::NotedBy, 0));
        ed.add_member("Ana", "President");
        assert!(ed.remove_member(0));
        assert!(ed.members().is_empty());
    }

    #[test]
    fn drafts_reopen_as_saved() {
        let mut ed = Editor::from_template(
            EditorConfig::default(),
            DocumentKind::BudgetRequest,
            &serde_json::json!({ "organization": { "name": "Chess Club" } }),
        )
        .unwrap();
        ed.add_member("Ana", "President");
        ed.add_signatory(SignatoryCategory::PreparedBy, "Ana", "Secretary").unwrap();
        ed.place_signature(&png_base64(30, 10), Point::default()).unwrap();
        let data = ed.document_data("2026-01-01T00:00:00+00:00".to_string());
        assert!(data.html.contains("Chess Club"));

        let reopened = Editor::from_draft(EditorConfig::default(), &data).unwrap();
        assert_eq!(reopened.pages(), ed.pages());
        assert_eq!(reopened.members(), ed.members());
        assert_eq!(reopened.signatory_page(), ed.signatory_page());
        assert_eq!(reopened.signatures().signatures(), ed.signatures().signatures());
    }

    #[test]
    fn drafts_pull_stray_signatures_into_the_region() {
        let mut ed = editor(&["<p>a</p>"]);
        ed.add_signatory(SignatoryCategory::PreparedBy, "Ana", "Secretary").unwrap();
        ed.place_signature(&png_base64(30, 10), Point::default()).unwrap();
        let mut data = ed.document_data("2026-01-01T00:00:00+00:00".to_string());
        data.signatures[0].x = 5000.0;
        data.signatures[0].y = 5000.0;

        let reopened = Editor::from_draft(EditorConfig::default(), &data).unwrap();
        let margin = reopened.config().signature.clamp_margin;
        let region = reopened.prepared_by_region().expand(margin);
        let sig = reopened.signatures().signature().unwrap();
        assert!(region.encloses(&sig.bounds()));
    }

    #[test]
    fn unready_budget_keeps_signatories_on_the_last_page() {
        let mut ed = editor(&["<p>a</p>"]);
        ed.set_budget(ContentHeightBudget::default());
        ed.add_signatory(SignatoryCategory::NotedBy, "Adviser", "Faculty").unwrap();
        assert_eq!(ed.signatory_page(), Some(ed.pages().len() - 1));
        assert!(ed.captured_html().unwrap().contains("Adviser"));
    }

    struct Accepting;

    impl DocumentService for Accepting {
        fn post(&self, endpoint: Endpoint, _: &[(&str, String)], _: &serde_json::Value) -> Result<serde_json::Value, ServiceError> {
            Ok(match endpoint {
                Endpoint::Preview => serde_json::json!({ "success": true, "preview_url": "/p/1.pdf", "filename": "1.pdf" }),
                Endpoint::GeneratePdf => serde_json::json!({ "success": true, "pdf_url": "/final.pdf" }),
                _ => serde_json::json!({ "success": true }),
            })
        }
    }

    #[test]
    fn service_round_trips() {
        let mut ed = editor(&["<p>a</p>"]);
        let client = DocumentClient::new(&Accepting, CsrfToken::resolve(None, Some("XSRF-TOKEN=t")));
        ed.save_draft(&client).unwrap();
        assert!(ed.last_saved().is_some());
        assert_eq!(ed.preview(&client).unwrap().filename.as_deref(), Some("1.pdf"));
        ed.close_preview(&client);
        assert_eq!(ed.generate_final(&client).unwrap().pdf_url.as_deref(), Some("/final.pdf"));
        assert!(ed.submit_for_approval(&client).unwrap().success);
    }
}
