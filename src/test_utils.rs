//! Fakes and builders shared by unit and integration tests

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value, json};

use crate::content::PageContent;
use crate::render::{DocumentDecoder, PageRenderer, RenderFault, Surface};
use crate::service::{DocumentEntry, DocumentService, FetchError, RawPageContentResponse};

/// Document-space size of every fake page
pub const PAGE_WIDTH_PT: f32 = 200.0;
pub const PAGE_HEIGHT_PT: f32 = 100.0;

/// Binaries starting with this fail to decode
pub const UNDECODABLE: &[u8] = b"BAD";
/// Binaries starting with this decode but fail to render
pub const UNRENDERABLE: &[u8] = b"NORENDER";

pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Page record with an attached binary and no elements
pub fn page_with_binary(page_num: u32, bytes: &[u8]) -> PageContent {
    PageContent {
        raw_binary: Some(encode(bytes)),
        ..PageContent::new(page_num)
    }
}

/// Counts itself in a shared gauge while alive
struct LiveHandle(Arc<AtomicUsize>);

impl LiveHandle {
    fn new(gauge: &Arc<AtomicUsize>) -> Self {
        gauge.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(gauge))
    }
}

impl Drop for LiveHandle {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct FakeDocument {
    pub bytes: Vec<u8>,
    _live: LiveHandle,
}

/// Decoder that tracks how many documents it has produced and how many are alive
#[derive(Clone, Default)]
pub struct FakeDecoder {
    live: Arc<AtomicUsize>,
    decoded: Arc<AtomicUsize>,
}

impl FakeDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_handles(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn decode_count(&self) -> usize {
        self.decoded.load(Ordering::SeqCst)
    }

    /// Poll until the live handle count reaches `expected`
    pub fn wait_for_live_handles(&self, expected: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.live_handles() == expected {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        self.live_handles() == expected
    }
}

impl DocumentDecoder for FakeDecoder {
    type Document = FakeDocument;

    fn decode(&self, bytes: &[u8]) -> Result<FakeDocument, RenderFault> {
        if bytes.starts_with(UNDECODABLE) {
            return Err(RenderFault::decode("not a document"));
        }
        self.decoded.fetch_add(1, Ordering::SeqCst);
        Ok(FakeDocument {
            bytes: bytes.to_vec(),
            _live: LiveHandle::new(&self.live),
        })
    }
}

/// Paints blank surfaces sized to the fake page at the requested scale
#[derive(Clone, Default)]
pub struct FakeRenderer {
    delay: Duration,
    renders: Arc<AtomicUsize>,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

impl PageRenderer<FakeDocument> for FakeRenderer {
    fn render(&self, document: &FakeDocument, page_index: usize, scale: f32) -> Result<Surface, RenderFault> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if page_index != 0 {
            return Err(RenderFault::render(format!("no page at index {page_index}")));
        }
        if document.bytes.starts_with(UNRENDERABLE) {
            return Err(RenderFault::render("renderer rejected the page"));
        }

        self.renders.fetch_add(1, Ordering::SeqCst);
        Ok(Surface::blank(
            (PAGE_WIDTH_PT * scale).round() as u32,
            (PAGE_HEIGHT_PT * scale).round() as u32,
        ))
    }
}

/// Builds raw page content payloads group by group
#[derive(Clone, Debug)]
pub struct PayloadBuilder {
    success: bool,
    message: Option<String>,
    data: Map<String, Value>,
}

impl Default for PayloadBuilder {
    fn default() -> Self {
        Self {
            success: true,
            message: None,
            data: Map::new(),
        }
    }
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload with the success flag cleared
    pub fn failed(message: &str) -> Self {
        Self {
            success: false,
            message: Some(message.to_string()),
            data: Map::new(),
        }
    }

    /// Add a group with no pages or elements
    pub fn empty_group(mut self, group: &str) -> Self {
        self.group_mut(group);
        self
    }

    /// Add a page descriptor, with its binary if given
    pub fn page(mut self, group: &str, page_num: u32, binary: Option<&[u8]>) -> Self {
        let descriptor = match binary {
            Some(bytes) => json!({"page_num": page_num, "raw_binary": encode(bytes)}),
            None => json!({"page_num": page_num}),
        };
        self.push(group, "pages", descriptor);
        self
    }

    /// Add a text element; `bbox` is `[top, left, bottom, right]`
    pub fn text(mut self, group: &str, id: &str, page: u32, bbox: [f64; 4], text: &str) -> Self {
        let mut element = base_element(id, page, bbox);
        element.insert("text".into(), json!(text));
        element.insert("word_positions".into(), json!("[]"));
        self.push(group, "text", Value::Object(element));
        self
    }

    pub fn cell(mut self, group: &str, id: &str, page: u32, bbox: [f64; 4], text: &str) -> Self {
        let mut element = base_element(id, page, bbox);
        element.insert("text".into(), json!(text));
        self.push(group, "cell", Value::Object(element));
        self
    }

    /// Add a table whose matrix is `rows`, with the first row as header
    pub fn table(mut self, group: &str, id: &str, page: u32, bbox: [f64; 4], rows: &[&[&str]]) -> Self {
        let mut element = base_element(id, page, bbox);
        element.insert("num_rows".into(), json!(rows.len()));
        element.insert("num_cols".into(), json!(rows.first().map_or(0, |r| r.len())));
        element.insert("last_header_row".into(), json!(0));
        element.insert("last_header_col".into(), json!(-1));
        element.insert("label".into(), json!(format!("Table {id}")));
        element.insert("caption".into(), Value::Null);
        element.insert("cell_matrix".into(), json!(rows));
        self.push(group, "table", Value::Object(element));
        self
    }

    pub fn build(self) -> RawPageContentResponse {
        RawPageContentResponse {
            success: self.success,
            message: self.message,
            data: self.data,
        }
    }

    pub fn to_json(&self) -> String {
        let mut body = Map::new();
        body.insert("success".into(), json!(self.success));
        if let Some(message) = &self.message {
            body.insert("message".into(), json!(message));
        }
        body.insert("data".into(), Value::Object(self.data.clone()));
        Value::Object(body).to_string()
    }

    fn group_mut(&mut self, group: &str) -> &mut Map<String, Value> {
        self.data
            .entry(group)
            .or_insert_with(|| json!({}))
            .as_object_mut()
            .expect("group is an object")
    }

    fn push(&mut self, group: &str, key: &str, value: Value) {
        self.group_mut(group)
            .entry(key)
            .or_insert_with(|| json!([]))
            .as_array_mut()
            .expect("collection is an array")
            .push(value);
    }
}

fn base_element(id: &str, page: u32, [top, left, bottom, right]: [f64; 4]) -> Map<String, Value> {
    let mut element = Map::new();
    element.insert("id".into(), json!(id));
    element.insert("page".into(), json!(page));
    element.insert("top".into(), json!(top));
    element.insert("left".into(), json!(left));
    element.insert("bottom".into(), json!(bottom));
    element.insert("right".into(), json!(right));
    element
}

/// Three pages with text, a table and its cells on page 1
pub fn sample_payload() -> PayloadBuilder {
    PayloadBuilder::new()
        .page("g1", 1, Some(b"%PDF-1.7 page one"))
        .page("g1", 2, Some(b"%PDF-1.7 page two"))
        .page("g2", 3, Some(b"%PDF-1.7 page three"))
        .text("g1", "t1", 1, [10.0, 10.0, 20.0, 90.0], "Invoice 2024-117")
        .table(
            "g1",
            "tb1",
            1,
            [30.0, 10.0, 80.0, 190.0],
            &[&["Item", "Qty"], &["Bolts", "40"]],
        )
        .cell("g1", "c1", 1, [40.0, 10.0, 50.0, 100.0], "Bolts")
        .cell("g1", "c2", 1, [40.0, 100.0, 50.0, 190.0], "40")
        .text("g1", "t2", 2, [5.0, 5.0, 15.0, 60.0], "Terms")
        .text("g2", "t3", 3, [50.0, 50.0, 50.0, 50.0], "")
}

enum Reply {
    Payload(String),
    Timeout,
}

/// Document service backed by a map of canned replies
#[derive(Default)]
pub struct InMemoryDocumentService {
    documents: Vec<DocumentEntry>,
    replies: HashMap<String, Reply>,
    fetches: AtomicUsize,
}

impl InMemoryDocumentService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, key: &str, owner: &str, payload: &PayloadBuilder) -> Self {
        self.with_body(key, owner, payload.to_json())
    }

    /// Register a raw reply body, e.g. an error response
    pub fn with_body(mut self, key: &str, owner: &str, body: String) -> Self {
        self.documents.push(DocumentEntry {
            file_name: key.to_string(),
            owner: owner.to_string(),
        });
        self.replies.insert(key.to_string(), Reply::Payload(body));
        self
    }

    /// Fetching `key` always times out
    pub fn with_timeout(mut self, key: &str) -> Self {
        self.documents.push(DocumentEntry {
            file_name: key.to_string(),
            owner: "slow".to_string(),
        });
        self.replies.insert(key.to_string(), Reply::Timeout);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl DocumentService for InMemoryDocumentService {
    fn fetch_page_content(&self, document_key: &str) -> Result<RawPageContentResponse, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match self.replies.get(document_key) {
            Some(Reply::Payload(body)) => crate::service::parse_fetch_body(body),
            Some(Reply::Timeout) => Err(FetchError::Timeout {
                after: Duration::from_secs(120),
            }),
            None => Err(FetchError::NotFound {
                key: document_key.to_string(),
            }),
        }
    }

    fn list_available_documents(&self) -> Result<Vec<DocumentEntry>, FetchError> {
        Ok(self.documents.clone())
    }
}
