//! Interactive session over one source document
//!
//! The session wires the page store, viewport, selection and render pipeline
//! together. Each piece of state has a single writer: the store is replaced
//! only from a fetch or an edit commit, the viewport only through commands,
//! and the rendered view only from accepted render results.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde::Serialize;

use crate::content::{
    ElementKind, NormalizeError, PageContent, PageContentStore, SelectableElement, StoreError, TableGrid,
    normalize,
};
use crate::export::{ExportArtifact, ExportError, ExportService};
use crate::notification::{Notice, NotificationLevel, NotificationManager};
use crate::render::{
    DocumentDecoder, OverlayRegion, PageRenderer, RenderFault, RenderOutcome, RenderPipeline,
    Surface, hit_test, layout_overlay,
};
use crate::selection::{EditCommit, SelectionController, SelectionError, SelectionState};
use crate::service::{DocumentEntry, DocumentService, FetchError, RawPageContentResponse};
use crate::viewport::{Command, Effect, PageInput, PageInputOutcome, ViewportState};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Malformed(#[from] NormalizeError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("no page is being viewed")]
    NoCurrentPage,
}

/// Tunables for a session
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub render_cache_size: usize,
    pub notification_duration: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            render_cache_size: crate::render::DEFAULT_CACHE_SIZE,
            notification_duration: Duration::from_secs(5),
        }
    }
}

/// Fetch-level failure replacing the whole view
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ViewError {
    pub message: String,
    pub timed_out: bool,
}

/// Render failure confined to the page panel
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageError {
    pub page_num: u32,
    pub fault: RenderFault,
}

impl PageError {
    #[must_use]
    pub fn message(&self) -> String {
        format!("Page {}: {}", self.page_num, self.fault)
    }
}

/// Latest accepted render with the overlay laid out for it
#[derive(Clone, Debug)]
pub struct RenderedView {
    pub page_num: u32,
    pub scale: f32,
    pub surface: Arc<Surface>,
    pub overlay: Vec<OverlayRegion>,
}

impl RenderedView {
    fn shows(&self, page_num: Option<u32>, scale: f32) -> bool {
        page_num == Some(self.page_num) && (self.scale - scale).abs() <= f32::EPSILON
    }
}

/// Display data for the selected element
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SelectedElementView {
    pub element: SelectableElement,
    /// Parsed matrix, for table elements
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TableGrid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_error: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct NotificationView {
    pub level: NotificationLevel,
    pub message: String,
    /// Stays until dismissed
    pub alert: bool,
}

/// Everything the surrounding shell needs to draw the session
#[derive(Clone, Debug, Serialize)]
pub struct SessionSnapshot {
    pub source_key: Option<String>,
    pub current_page: Option<u32>,
    pub total_pages: usize,
    pub page_numbers: Vec<u32>,
    pub zoom_percent: u32,
    pub can_zoom_in: bool,
    pub can_zoom_out: bool,
    pub page_input: String,
    #[serde(skip)]
    pub surface: Option<Arc<Surface>>,
    pub surface_size: Option<(u32, u32)>,
    pub overlay: Vec<OverlayRegion>,
    pub selection: SelectionState,
    pub selected: Option<SelectedElementView>,
    pub editing: bool,
    pub view_error: Option<ViewError>,
    pub page_error: Option<String>,
    pub notifications: Vec<NotificationView>,
}

pub struct Session<S> {
    service: S,
    source_key: Option<String>,
    store: PageContentStore,
    viewport: ViewportState,
    page_input: PageInput,
    selection: SelectionController,
    pipeline: RenderPipeline,
    view: Option<RenderedView>,
    view_error: Option<ViewError>,
    page_error: Option<PageError>,
    notifications: NotificationManager,
    edit_events: Vec<EditCommit>,
}

impl<S: DocumentService> Session<S> {
    /// Create a session rendering through the given backend
    pub fn new<D, R>(service: S, decoder: D, renderer: R, config: &SessionConfig) -> Self
    where
        D: DocumentDecoder,
        R: PageRenderer<D::Document>,
    {
        let pipeline = RenderPipeline::spawn(decoder, renderer, config.render_cache_size);
        Self::with_pipeline(service, pipeline, config)
    }

    pub fn with_pipeline(service: S, pipeline: RenderPipeline, config: &SessionConfig) -> Self {
        Self {
            service,
            source_key: None,
            store: PageContentStore::new(),
            viewport: ViewportState::new(),
            page_input: PageInput::new(),
            selection: SelectionController::new(),
            pipeline,
            view: None,
            view_error: None,
            page_error: None,
            notifications: NotificationManager::new(config.notification_duration),
            edit_events: Vec::new(),
        }
    }

    pub fn list_documents(&self) -> Result<Vec<DocumentEntry>, FetchError> {
        self.service.list_available_documents()
    }

    /// Fetch and load a document's pages.
    ///
    /// Selecting a different document resets the viewport and selection
    /// first. A failed fetch replaces the view with an error.
    pub fn open_document(&mut self, key: &str) -> Result<usize, SessionError> {
        if self.source_key.as_deref() != Some(key) {
            info!("Opening document {key}");
            self.reset();
            self.source_key = Some(key.to_string());
        }

        match self.service.fetch_page_content(key) {
            Ok(raw) => self.load_response(&raw),
            Err(e) => {
                warn!("Fetching {key} failed: {e}");
                self.show_view_error(ViewError {
                    message: e.user_message(),
                    timed_out: e.is_timeout(),
                });
                Err(e.into())
            }
        }
    }

    /// Normalize a fetched payload into the store
    pub fn load_response(&mut self, raw: &RawPageContentResponse) -> Result<usize, SessionError> {
        match normalize(raw) {
            Ok(pages) => {
                let count = pages.len();
                self.view_error = None;
                self.set_pages(pages);
                Ok(count)
            }
            Err(e) => {
                warn!("Rejected page content: {e}");
                self.show_view_error(ViewError {
                    message: e.to_string(),
                    timed_out: false,
                });
                Err(e.into())
            }
        }
    }

    /// Replace the page list and jump to its first page
    pub fn set_pages(&mut self, pages: Vec<PageContent>) {
        self.pipeline.invalidate();
        self.view = None;
        self.store.set_pages(pages);

        if self.store.is_empty() {
            self.notifications.raise_once(Notice::EmptyContent);
            info!("Loaded an empty page list");
        } else {
            info!(
                "Loaded {} pages ({:?}..{:?})",
                self.store.total_pages(),
                self.store.page_numbers().first(),
                self.store.page_numbers().last()
            );
        }

        self.dispatch(Command::PagesReplaced);
    }

    fn show_view_error(&mut self, error: ViewError) {
        self.pipeline.invalidate();
        self.store.clear();
        self.view = None;
        self.page_error = None;
        let effects = self.viewport.apply(Command::Reset, &self.store);
        self.run_effects(effects);
        self.page_input.sync(None);
        self.view_error = Some(error);
    }

    /// Dismiss the view-level error, returning to an empty view
    pub fn dismiss_view_error(&mut self) {
        if self.view_error.take().is_some() {
            debug!("View error dismissed");
        }
    }

    pub fn dismiss_page_error(&mut self) {
        self.page_error = None;
    }

    fn reset(&mut self) {
        self.pipeline.invalidate();
        self.store.clear();
        self.view = None;
        self.view_error = None;
        self.page_error = None;
        self.edit_events.clear();
        self.notifications.start_document();
        self.page_input = PageInput::new();
        let effects = self.viewport.apply(Command::Reset, &self.store);
        self.run_effects(effects);
    }

    fn dispatch(&mut self, cmd: Command) -> bool {
        let effects = self.viewport.apply(cmd, &self.store);
        let changed = !effects.is_empty();
        self.run_effects(effects);
        self.page_input.sync(self.viewport.current_page);
        changed
    }

    fn run_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ClearSelection => self.selection.clear(),
                Effect::ClearPageError => self.page_error = None,
                Effect::RenderCurrentPage => self.request_render(),
            }
        }
    }

    fn request_render(&mut self) {
        let Some(page_num) = self.viewport.current_page else {
            return;
        };
        let Some(page) = self.store.get_page(page_num) else {
            return;
        };

        if self
            .view
            .as_ref()
            .is_some_and(|v| !v.shows(Some(page_num), self.viewport.scale))
        {
            self.view = None;
        }

        let ticket = self.pipeline.request(page, self.viewport.scale);
        debug!(
            "Requested render {:?} of page {page_num} at {}",
            ticket.id, ticket.scale
        );
    }

    // Navigation

    pub fn go_to_page(&mut self, page_num: u32) -> bool {
        self.dispatch(Command::GoToPage(page_num))
    }

    pub fn next_page(&mut self) -> bool {
        self.dispatch(Command::NextPage)
    }

    pub fn prev_page(&mut self) -> bool {
        self.dispatch(Command::PrevPage)
    }

    pub fn zoom_in(&mut self) -> bool {
        self.dispatch(Command::ZoomIn)
    }

    pub fn zoom_out(&mut self) -> bool {
        self.dispatch(Command::ZoomOut)
    }

    pub fn reset_zoom(&mut self) -> bool {
        self.dispatch(Command::ResetZoom)
    }

    pub fn set_scale(&mut self, scale: f32) -> bool {
        self.dispatch(Command::SetScale(scale))
    }

    // Page number field

    pub fn page_input_char(&mut self, c: char) -> bool {
        self.page_input.push_char(c)
    }

    pub fn page_input_backspace(&mut self) {
        self.page_input.backspace();
    }

    pub fn set_page_input(&mut self, text: &str) {
        self.page_input.set_text(text);
    }

    pub fn cancel_page_input(&mut self) {
        self.page_input.cancel(self.viewport.current_page);
    }

    pub fn commit_page_input(&mut self) -> PageInputOutcome {
        let (outcome, effects) = self.page_input.commit(&mut self.viewport, &self.store);
        self.run_effects(effects);
        outcome
    }

    #[must_use]
    pub fn page_input(&self) -> &str {
        self.page_input.display()
    }

    // Rendering

    /// Collect finished renders. Returns whether the view changed.
    pub fn pump(&mut self) -> bool {
        self.notifications.expire();
        match self.pipeline.poll(&self.viewport) {
            Some(outcome) => {
                self.apply_outcome(outcome);
                true
            }
            None => false,
        }
    }

    /// Block until the pending render lands or `timeout` passes
    pub fn wait_for_render(&mut self, timeout: Duration) -> bool {
        match self.pipeline.wait(&self.viewport, timeout) {
            Some(outcome) => {
                self.apply_outcome(outcome);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_rendering(&self) -> bool {
        self.pipeline.is_busy()
    }

    fn apply_outcome(&mut self, outcome: RenderOutcome) {
        match outcome {
            RenderOutcome::Rendered { ticket, surface } => {
                let Some(page) = self.store.get_page(ticket.page_num) else {
                    return;
                };
                self.view = Some(RenderedView {
                    page_num: ticket.page_num,
                    scale: ticket.scale,
                    overlay: layout_overlay(&page, ticket.scale),
                    surface,
                });
                self.page_error = None;
            }
            RenderOutcome::Failed { ticket, error } => {
                warn!("Page {} failed to render: {error}", ticket.page_num);
                self.view = None;
                self.page_error = Some(PageError {
                    page_num: ticket.page_num,
                    fault: error,
                });
            }
        }
    }

    // Selection and editing

    fn current_page_record(&self) -> Result<Arc<PageContent>, SessionError> {
        self.viewport
            .current_page
            .and_then(|n| self.store.get_page(n))
            .ok_or(SessionError::NoCurrentPage)
    }

    /// Select an element of the current page by id
    pub fn select(&mut self, element_id: &str) -> Result<(), SessionError> {
        let page = self.current_page_record()?;
        if page.element(element_id).is_none() {
            return Err(SelectionError::UnknownElement(element_id.to_string()).into());
        }
        self.selection.select(element_id);
        Ok(())
    }

    /// Select whatever lies under a surface point; empty space clears the selection
    pub fn select_at(&mut self, x: f64, y: f64) -> Option<&str> {
        let hit = self
            .view
            .as_ref()
            .and_then(|v| hit_test(&v.overlay, x, y))
            .map(|r| r.element_id.clone());

        match hit {
            Some(id) => self.selection.select(id),
            None => self.selection.clear(),
        }
        self.selection.selected_id()
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Open an edit on the selected text element, returning its current text
    pub fn begin_edit(&mut self) -> Result<String, SessionError> {
        let page = self.current_page_record()?;
        Ok(self.selection.begin_edit(&page)?.to_string())
    }

    pub fn update_edit(&mut self, text: &str) -> Result<(), SessionError> {
        Ok(self.selection.update_pending(text)?)
    }

    /// Write `new_text` into the selected element and close the edit
    pub fn commit_edit(&mut self, new_text: &str) -> Result<EditCommit, SessionError> {
        if !self.selection.is_editing() {
            return Err(SelectionError::NoEditOpen.into());
        }
        let page_num = self
            .viewport
            .current_page
            .ok_or(SessionError::NoCurrentPage)?;
        let element_id = self
            .selection
            .selected_id()
            .ok_or(SelectionError::NothingSelected)?
            .to_string();

        let page = self
            .store
            .replace_element_text(page_num, &element_id, new_text)?;
        let commit = self.selection.commit_edit(new_text)?;

        if let Some(view) = self.view.as_mut().filter(|v| v.page_num == page_num) {
            view.overlay = layout_overlay(&page, view.scale);
        }

        info!("Edited element {element_id} on page {page_num}");
        self.notifications.raise(Notice::EditSaved {
            element_id: element_id.clone(),
        });
        self.edit_events.push(commit.clone());
        Ok(commit)
    }

    /// Commit the text typed into the open edit
    pub fn commit_pending_edit(&mut self) -> Result<EditCommit, SessionError> {
        let text = self
            .selection
            .state()
            .pending_edit_text
            .clone()
            .ok_or(SelectionError::NoEditOpen)?;
        self.commit_edit(&text)
    }

    pub fn cancel_edit(&mut self) {
        self.selection.cancel_edit();
    }

    /// Edit commits not yet handed to the shell
    pub fn take_edit_events(&mut self) -> Vec<EditCommit> {
        std::mem::take(&mut self.edit_events)
    }

    // Export

    /// Package the current page's binary; a missing binary raises one alert
    pub fn export_current_page(&mut self) -> Result<ExportArtifact, SessionError> {
        let page = self.current_page_record()?;
        let source = self.source_key.as_deref().unwrap_or("document");

        match ExportService::export_current_page(&page, page.page_num, source) {
            Ok(artifact) => Ok(artifact),
            Err(e) => {
                warn!("Export of page {} failed: {e}", page.page_num);
                self.notifications.raise(match &e {
                    ExportError::Unavailable { page } => Notice::ExportUnavailable { page: *page },
                    other => Notice::ExportFailed {
                        detail: other.to_string(),
                    },
                });
                Err(e.into())
            }
        }
    }

    /// Export the current page and save it into `dir`
    pub fn export_current_page_to(&mut self, dir: &Path) -> Result<PathBuf, SessionError> {
        let artifact = self.export_current_page()?;
        match artifact.save(dir) {
            Ok(path) => {
                self.notifications.raise(Notice::ExportSaved {
                    file_name: artifact.file_name.clone(),
                });
                Ok(path)
            }
            Err(e) => {
                self.notifications.raise(Notice::ExportFailed {
                    detail: e.to_string(),
                });
                Err(e.into())
            }
        }
    }

    // Accessors

    #[must_use]
    pub fn source_key(&self) -> Option<&str> {
        self.source_key.as_deref()
    }

    #[must_use]
    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    #[must_use]
    pub fn store(&self) -> &PageContentStore {
        &self.store
    }

    #[must_use]
    pub fn selection(&self) -> &SelectionState {
        self.selection.state()
    }

    #[must_use]
    pub fn view(&self) -> Option<&RenderedView> {
        self.view.as_ref()
    }

    #[must_use]
    pub fn view_error(&self) -> Option<&ViewError> {
        self.view_error.as_ref()
    }

    #[must_use]
    pub fn page_error(&self) -> Option<&PageError> {
        self.page_error.as_ref()
    }

    #[must_use]
    pub fn notifications(&self) -> &NotificationManager {
        &self.notifications
    }

    /// Close the export alert, if one is showing
    pub fn dismiss_alert(&mut self) -> bool {
        self.notifications.dismiss_alert()
    }

    /// The selected element with its table matrix parsed
    #[must_use]
    pub fn selected_element(&self) -> Option<SelectedElementView> {
        let id = self.selection.selected_id()?;
        let page = self.current_page_record().ok()?;
        let element = page.element(id)?.clone();

        let (table, table_error) = match &element.kind {
            ElementKind::Table(table) => match table.grid() {
                Ok(grid) => (Some(grid), None),
                Err(e) => (None, Some(e.to_string())),
            },
            _ => (None, None),
        };

        Some(SelectedElementView {
            element,
            table,
            table_error,
        })
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            source_key: self.source_key.clone(),
            current_page: self.viewport.current_page,
            total_pages: self.store.total_pages(),
            page_numbers: self.store.page_numbers().to_vec(),
            zoom_percent: self.viewport.zoom_percent(),
            can_zoom_in: self.viewport.can_zoom_in(),
            can_zoom_out: self.viewport.can_zoom_out(),
            page_input: self.page_input.display().to_string(),
            surface: self.view.as_ref().map(|v| Arc::clone(&v.surface)),
            surface_size: self
                .view
                .as_ref()
                .map(|v| (v.surface.width_px, v.surface.height_px)),
            overlay: self
                .view
                .as_ref()
                .map(|v| v.overlay.clone())
                .unwrap_or_default(),
            selection: self.selection.state().clone(),
            selected: self.selected_element(),
            editing: self.selection.is_editing(),
            view_error: self.view_error.clone(),
            page_error: self.page_error.as_ref().map(PageError::message),
            notifications: self
                .notifications
                .all()
                .iter()
                .map(|n| NotificationView {
                    level: n.level,
                    message: n.message.clone(),
                    alert: n.notice.is_alert(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        FakeDecoder, FakeRenderer, InMemoryDocumentService, PayloadBuilder, sample_payload,
    };

    const WAIT: Duration = Duration::from_secs(5);

    fn session_with(service: InMemoryDocumentService) -> Session<InMemoryDocumentService> {
        Session::new(
            service,
            FakeDecoder::new(),
            FakeRenderer::new(),
            &SessionConfig::default(),
        )
    }

    fn opened_sample() -> Session<InMemoryDocumentService> {
        let service = InMemoryDocumentService::new().with_document("invoice.pdf", "kim", &sample_payload());
        let mut session = session_with(service);
        session.open_document("invoice.pdf").unwrap();
        assert!(session.wait_for_render(WAIT));
        session
    }

    #[test]
    fn open_lands_on_first_page_and_renders() {
        let session = opened_sample();
        let snapshot = session.snapshot();

        assert_eq!(snapshot.current_page, Some(1));
        assert_eq!(snapshot.total_pages, 3);
        assert_eq!(snapshot.zoom_percent, 150);
        assert_eq!(snapshot.surface_size, Some((300, 150)));
        assert_eq!(snapshot.overlay.len(), 4);
        assert_eq!(snapshot.page_input, "1");
    }

    #[test]
    fn overlay_follows_zoom() {
        let mut session = opened_sample();
        assert!(session.zoom_in());
        assert!(session.view().is_none());
        assert!(session.wait_for_render(WAIT));

        let view = session.view().unwrap();
        assert_eq!(view.scale, 1.75);
        let t1 = view.overlay.iter().find(|r| r.element_id == "t1").unwrap();
        assert_eq!(t1.surface_box.width, 80.0 * 1.75);
    }

    #[test]
    fn navigation_clears_selection() {
        let mut session = opened_sample();
        session.select("t1").unwrap();
        assert!(session.next_page());
        assert_eq!(session.selection().selected_element_id, None);
        assert_eq!(session.viewport().current_page, Some(2));
    }

    #[test]
    fn unknown_element_cannot_be_selected() {
        let mut session = opened_sample();
        assert!(matches!(
            session.select("t2"),
            Err(SessionError::Selection(SelectionError::UnknownElement(_)))
        ));
    }

    #[test]
    fn click_picks_cell_inside_table() {
        let mut session = opened_sample();
        // c1 spans left 10..100, top 40..50 in document space
        let picked = session.select_at(20.0 * 1.5, 45.0 * 1.5).map(str::to_string);
        assert_eq!(picked.as_deref(), Some("c1"));

        let picked = session.select_at(150.0 * 1.5, 70.0 * 1.5).map(str::to_string);
        assert_eq!(picked.as_deref(), Some("tb1"));
        let selected = session.selected_element().unwrap();
        assert_eq!(selected.table.unwrap().rows[1], vec!["Bolts", "40"]);

        assert!(session.select_at(1000.0, 1000.0).is_none());
    }

    #[test]
    fn edit_commit_updates_store_and_emits_event() {
        let mut session = opened_sample();
        let before = session.store().get_page(1).unwrap();

        session.select("t1").unwrap();
        assert_eq!(session.begin_edit().unwrap(), "Invoice 2024-117");
        let commit = session.commit_edit("Invoice 2024-118").unwrap();

        assert_eq!(commit.element_id, "t1");
        let after = session.store().get_page(1).unwrap();
        assert_eq!(after.element("t1").unwrap().text(), Some("Invoice 2024-118"));
        assert_eq!(before.element("t1").unwrap().text(), Some("Invoice 2024-117"));
        assert_eq!(session.take_edit_events(), vec![commit]);
        assert!(!session.snapshot().editing);
    }

    #[test]
    fn cancel_leaves_text_untouched() {
        let mut session = opened_sample();
        session.select("t1").unwrap();
        session.begin_edit().unwrap();
        session.update_edit("scratch").unwrap();
        session.cancel_edit();

        let page = session.store().get_page(1).unwrap();
        assert_eq!(page.element("t1").unwrap().text(), Some("Invoice 2024-117"));
        assert!(session.take_edit_events().is_empty());
    }

    #[test]
    fn tables_are_not_editable() {
        let mut session = opened_sample();
        session.select("tb1").unwrap();
        assert!(matches!(
            session.begin_edit(),
            Err(SessionError::Selection(SelectionError::NotEditable(_)))
        ));
    }

    #[test]
    fn empty_payload_warns_once() {
        let payload = PayloadBuilder::new();
        let service = InMemoryDocumentService::new().with_document("blank", "kim", &payload);
        let mut session = session_with(service);

        assert_eq!(session.open_document("blank").unwrap(), 0);
        assert_eq!(session.open_document("blank").unwrap(), 0);

        assert!(session.view_error().is_none());
        assert_eq!(session.notifications().len(), 1);
        assert_eq!(
            session.notifications().current().unwrap().level,
            NotificationLevel::Warning
        );
        assert_eq!(session.viewport().current_page, None);
    }

    #[test]
    fn failed_payload_is_a_view_error() {
        let service = InMemoryDocumentService::new().with_document(
            "broken",
            "kim",
            &PayloadBuilder::failed("extraction crashed"),
        );
        let mut session = session_with(service);

        assert!(matches!(
            session.open_document("broken"),
            Err(SessionError::Malformed(_))
        ));
        let error = session.view_error().unwrap();
        assert!(error.message.contains("extraction crashed"));
        assert!(!error.timed_out);

        session.dismiss_view_error();
        assert!(session.view_error().is_none());
        assert!(session.store().is_empty());
    }

    #[test]
    fn timeout_is_reported_distinctly() {
        let service = InMemoryDocumentService::new().with_timeout("huge.pdf");
        let mut session = session_with(service);

        assert!(session.open_document("huge.pdf").is_err());
        let error = session.view_error().unwrap();
        assert!(error.timed_out);
        assert!(error.message.contains("took too long"));
    }

    #[test]
    fn render_failure_is_page_scoped() {
        let payload = PayloadBuilder::new()
            .page("g", 1, Some(b"BAD binary"))
            .page("g", 2, Some(b"%PDF fine"));
        let service = InMemoryDocumentService::new().with_document("mixed", "kim", &payload);
        let mut session = session_with(service);

        session.open_document("mixed").unwrap();
        assert!(session.wait_for_render(WAIT));
        assert!(matches!(
            session.page_error().unwrap().fault,
            RenderFault::Decode { .. }
        ));

        assert!(session.next_page());
        assert!(session.page_error().is_none());
        assert!(session.wait_for_render(WAIT));
        assert!(session.view().is_some());
    }

    #[test]
    fn switching_documents_resets_viewport() {
        let service = InMemoryDocumentService::new()
            .with_document("a", "kim", &sample_payload())
            .with_document(
                "b",
                "kim",
                &PayloadBuilder::new().page("g", 7, Some(b"%PDF seven")),
            );
        let mut session = session_with(service);

        session.open_document("a").unwrap();
        session.zoom_in();
        session.go_to_page(3);

        session.open_document("b").unwrap();
        assert_eq!(session.viewport().current_page, Some(7));
        assert_eq!(session.viewport().scale, ViewportState::DEFAULT_SCALE);
        assert_eq!(session.source_key(), Some("b"));
    }

    #[test]
    fn export_without_binary_alerts() {
        let payload = PayloadBuilder::new().page("g", 1, None);
        let service = InMemoryDocumentService::new().with_document("meta-only.pdf", "kim", &payload);
        let mut session = session_with(service);
        session.open_document("meta-only.pdf").unwrap();

        assert!(matches!(
            session.export_current_page(),
            Err(SessionError::Export(ExportError::Unavailable { page: 1 }))
        ));
        assert_eq!(session.notifications().len(), 1);
        assert_eq!(
            session.notifications().current().unwrap().notice,
            Notice::ExportUnavailable { page: 1 }
        );

        // A second attempt replaces the alert rather than stacking another.
        assert!(session.export_current_page().is_err());
        assert_eq!(session.notifications().len(), 1);
        assert!(session.snapshot().notifications[0].alert);

        assert!(session.dismiss_alert());
        assert!(session.notifications().is_empty());
    }

    #[test]
    fn empty_warning_returns_for_the_next_document() {
        let service = InMemoryDocumentService::new()
            .with_document("blank-a", "kim", &PayloadBuilder::new())
            .with_document("blank-b", "kim", &PayloadBuilder::new());
        let mut session = session_with(service);

        session.open_document("blank-a").unwrap();
        session.open_document("blank-b").unwrap();

        assert_eq!(session.notifications().len(), 1);
        assert_eq!(
            session.notifications().current().unwrap().level,
            NotificationLevel::Warning
        );
    }

    #[test]
    fn export_names_after_source() {
        let mut session = opened_sample();
        session.go_to_page(2);
        let artifact = session.export_current_page().unwrap();
        assert_eq!(artifact.file_name, "invoice_page_2.pdf");
    }
}
