//! Core types for normalized page content

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde_json::{Map, Value};

use super::table::{TableGrid, TableParseError};

/// Bounding box in document-space units, top-left origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ElementBox {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl ElementBox {
    #[must_use]
    pub const fn new(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Zero width or zero height. Such boxes are legal.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Whether edges are ordered (`right >= left`, `bottom >= top`)
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        self.right >= self.left && self.bottom >= self.top
    }

    /// Swap inverted edges so the box is ordered
    #[must_use]
    pub fn ordered(self) -> Self {
        Self {
            top: self.top.min(self.bottom),
            left: self.left.min(self.right),
            bottom: self.top.max(self.bottom),
            right: self.left.max(self.right),
        }
    }
}

/// Discriminant of an element, without its payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementTag {
    Text,
    Table,
    Cell,
}

impl ElementTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementTag::Text => "text",
            ElementTag::Table => "table",
            ElementTag::Cell => "cell",
        }
    }
}

/// Table payload as delivered by the extraction service
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TableElement {
    pub num_cols: i64,
    pub num_rows: i64,
    pub last_header_row: i64,
    pub last_header_col: i64,
    pub caption: Option<String>,
    pub label: String,
    /// Unparsed matrix; see [`TableElement::grid`]
    pub cell_matrix: Value,
}

impl TableElement {
    /// Parse `cell_matrix` into a rectangular grid
    pub fn grid(&self) -> Result<TableGrid, TableParseError> {
        TableGrid::parse(&self.cell_matrix, self.last_header_row, self.last_header_col)
    }
}

/// Variant-specific payload of a selectable element
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    Text { text: String, word_positions: String },
    Table(TableElement),
    Cell { text: String },
}

/// A text, table or cell region on a page
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SelectableElement {
    pub id: String,
    pub page: u32,
    #[serde(flatten)]
    pub bbox: ElementBox,
    #[serde(flatten)]
    pub kind: ElementKind,
}

impl SelectableElement {
    #[must_use]
    pub fn tag(&self) -> ElementTag {
        match self.kind {
            ElementKind::Text { .. } => ElementTag::Text,
            ElementKind::Table(_) => ElementTag::Table,
            ElementKind::Cell { .. } => ElementTag::Cell,
        }
    }

    /// Text content for text and cell elements
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Text { text, .. } | ElementKind::Cell { text } => Some(text),
            ElementKind::Table(_) => None,
        }
    }

    /// Only text elements accept inline edits
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self.kind, ElementKind::Text { .. })
    }

    /// Copy of this element with its text replaced, `None` if not editable
    #[must_use]
    pub fn with_text(&self, new_text: &str) -> Option<Self> {
        match &self.kind {
            ElementKind::Text { word_positions, .. } => Some(Self {
                kind: ElementKind::Text {
                    text: new_text.to_string(),
                    word_positions: word_positions.clone(),
                },
                ..self.clone()
            }),
            _ => None,
        }
    }
}

/// Normalized per-page record
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PageContent {
    pub page_num: u32,
    /// Base64 snapshot of this page alone, absent until fetched
    #[serde(skip_serializing)]
    pub raw_binary: Option<String>,
    pub metadata: Map<String, Value>,
    pub elements: Vec<SelectableElement>,
}

impl PageContent {
    #[must_use]
    pub fn new(page_num: u32) -> Self {
        Self {
            page_num,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn has_binary(&self) -> bool {
        self.raw_binary.as_deref().is_some_and(|b| !b.is_empty())
    }

    /// Decode the embedded snapshot into raw bytes.
    ///
    /// Returns `Ok(None)` when no snapshot is attached. Whitespace inside the
    /// encoded text (line-wrapped payloads) is ignored.
    pub fn decode_binary(&self) -> Result<Option<Vec<u8>>, base64::DecodeError> {
        let Some(encoded) = self.raw_binary.as_deref().filter(|b| !b.is_empty()) else {
            return Ok(None);
        };
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        STANDARD.decode(compact).map(Some)
    }

    #[must_use]
    pub fn element(&self, id: &str) -> Option<&SelectableElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    #[must_use]
    pub fn element_count(&self, tag: ElementTag) -> usize {
        self.elements.iter().filter(|e| e.tag() == tag).count()
    }
}
