//! End-to-end scenarios from payload to rendered, selectable overlay

use std::time::Duration;

use pagelens::content::{ElementTag, normalize};
use pagelens::export::ExportError;
use pagelens::geometry::to_surface_box;
use pagelens::notification::NotificationLevel;
use pagelens::test_utils::{
    FakeDecoder, FakeRenderer, InMemoryDocumentService, PayloadBuilder, sample_payload,
};
use pagelens::viewport::{PageInputOutcome, ViewportState};
use pagelens::{Session, SessionConfig, SessionError};

const WAIT: Duration = Duration::from_secs(5);

fn session(service: InMemoryDocumentService) -> Session<InMemoryDocumentService> {
    Session::new(
        service,
        FakeDecoder::new(),
        FakeRenderer::new(),
        &SessionConfig::default(),
    )
}

#[test]
fn orphaned_element_is_dropped() {
    let raw = PayloadBuilder::new()
        .page("g", 3, Some(b"%PDF"))
        .text("g", "keep", 3, [1.0, 1.0, 2.0, 2.0], "on page three")
        .text("g", "orphan", 4, [1.0, 1.0, 2.0, 2.0], "on page four")
        .build();

    let pages = normalize(&raw).unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].page_num, 3);
    assert_eq!(pages[0].elements.len(), 1);
    assert_eq!(pages[0].elements[0].id, "keep");
}

#[test]
fn empty_success_is_a_warning_not_an_error() {
    let service =
        InMemoryDocumentService::new().with_document("blank.pdf", "kim", &PayloadBuilder::new());
    let mut session = session(service);

    assert_eq!(session.open_document("blank.pdf").unwrap(), 0);
    assert!(session.view_error().is_none());
    assert_eq!(session.store().total_pages(), 0);

    let warning = session.notifications().current().unwrap();
    assert_eq!(warning.level, NotificationLevel::Warning);
}

#[test]
fn zoom_in_at_upper_bound_is_ignored() {
    let service = InMemoryDocumentService::new().with_document(
        "doc",
        "kim",
        &PayloadBuilder::new().page("g", 5, Some(b"%PDF five")),
    );
    let mut session = session(service);
    session.open_document("doc").unwrap();
    session.set_scale(ViewportState::MAX_SCALE);

    let before = *session.viewport();
    assert!(!session.zoom_in());
    assert_eq!(*session.viewport(), before);
    assert_eq!(session.viewport().scale, 3.0);
    assert_eq!(session.viewport().current_page, Some(5));
}

#[test]
fn out_of_range_page_entry_reverts() {
    let service = InMemoryDocumentService::new().with_document("doc", "kim", &sample_payload());
    let mut session = session(service);
    session.open_document("doc").unwrap();
    session.go_to_page(2);

    for c in "999".chars() {
        assert!(session.page_input_char(c));
    }
    assert_eq!(session.page_input(), "999");

    assert_eq!(session.commit_page_input(), PageInputOutcome::Reverted);
    assert_eq!(session.viewport().current_page, Some(2));
    assert_eq!(session.page_input(), "2");
}

#[test]
fn page_entry_ignores_non_digits_and_navigates() {
    let service = InMemoryDocumentService::new().with_document("doc", "kim", &sample_payload());
    let mut session = session(service);
    session.open_document("doc").unwrap();

    assert!(!session.page_input_char('x'));
    assert!(session.page_input_char('3'));
    assert_eq!(session.commit_page_input(), PageInputOutcome::Navigated(3));
    assert_eq!(session.viewport().current_page, Some(3));
}

#[test]
fn export_without_binary_produces_nothing() {
    let payload = PayloadBuilder::new().page("g", 1, None);
    let service = InMemoryDocumentService::new().with_document("scan.pdf", "kim", &payload);
    let mut session = session(service);
    session.open_document("scan.pdf").unwrap();

    let dir = tempfile::tempdir().unwrap();
    let err = session.export_current_page_to(dir.path()).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Export(ExportError::Unavailable { page: 1 })
    ));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn export_writes_native_format() {
    let payload = PayloadBuilder::new().page("g", 4, Some(b"\x89PNG\r\n\x1a\nscan"));
    let service = InMemoryDocumentService::new().with_document("receipts/march.tiff", "kim", &payload);
    let mut session = session(service);
    session.open_document("receipts/march.tiff").unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = session.export_current_page_to(dir.path()).unwrap();
    assert_eq!(path.file_name().unwrap(), "march_page_4.png");
}

#[test]
fn sparse_pages_navigate_by_membership() {
    let payload = PayloadBuilder::new()
        .page("g", 2, Some(b"%PDF two"))
        .page("g", 5, Some(b"%PDF five"))
        .page("g", 9, Some(b"%PDF nine"));
    let service = InMemoryDocumentService::new().with_document("sparse", "kim", &payload);
    let mut session = session(service);
    session.open_document("sparse").unwrap();

    assert_eq!(session.viewport().current_page, Some(2));
    assert!(!session.go_to_page(3));
    assert!(session.next_page());
    assert_eq!(session.viewport().current_page, Some(5));
    assert!(session.go_to_page(9));
    assert!(!session.next_page());
    assert!(session.prev_page());
    assert_eq!(session.viewport().current_page, Some(5));
}

#[test]
fn overlay_matches_coordinate_mapping_at_every_zoom() {
    let service = InMemoryDocumentService::new().with_document("doc", "kim", &sample_payload());
    let mut session = session(service);
    session.open_document("doc").unwrap();
    assert!(session.wait_for_render(WAIT));

    let page = session.store().get_page(1).unwrap();
    let mut scale = ViewportState::MIN_SCALE;
    while scale <= ViewportState::MAX_SCALE {
        session.set_scale(scale);
        assert!(session.wait_for_render(WAIT));

        let view = session.view().unwrap();
        assert_eq!(view.scale, scale);
        for region in &view.overlay {
            let element = page.element(&region.element_id).unwrap();
            assert_eq!(region.surface_box, to_surface_box(&element.bbox, scale));
        }
        assert_eq!(view.surface.width_px, (200.0 * scale).round() as u32);
        scale += ViewportState::ZOOM_STEP;
    }
}

#[test]
fn snapshot_exposes_shell_contract() {
    let service = InMemoryDocumentService::new().with_document("doc", "kim", &sample_payload());
    let mut session = session(service);
    session.open_document("doc").unwrap();
    assert!(session.wait_for_render(WAIT));
    session.select("tb1").unwrap();

    let snapshot = session.snapshot();
    assert_eq!(snapshot.source_key.as_deref(), Some("doc"));
    assert_eq!(snapshot.current_page, Some(1));
    assert_eq!(snapshot.total_pages, 3);
    assert_eq!(snapshot.zoom_percent, 150);
    assert!(snapshot.surface.is_some());

    let selected = snapshot.selected.unwrap();
    assert_eq!(selected.element.tag(), ElementTag::Table);
    let grid = selected.table.unwrap();
    assert_eq!(grid.header_rows, 1);
    assert_eq!(grid.body(), &[vec!["Bolts".to_string(), "40".to_string()]]);

    let json = serde_json::to_value(session.snapshot()).unwrap();
    assert_eq!(json["zoom_percent"], 150);
    assert!(json.get("surface").is_none());
}
