//! Wire shapes consumed from the document service

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Successful transport-level reply to a page content fetch.
///
/// `data` maps a group identifier to a group object; see [`RawGroup`].
/// Group order follows the payload.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RawPageContentResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// One group of the payload: physical page descriptors plus element collections
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RawGroup {
    #[serde(default, alias = "page")]
    pub pages: Vec<RawPageDescriptor>,
    #[serde(default)]
    pub text: Vec<RawElement>,
    #[serde(default)]
    pub table: Vec<RawElement>,
    #[serde(default)]
    pub cell: Vec<RawElement>,
    /// Key-value collection, reserved and not consumed
    #[serde(default)]
    pub kv: Vec<Value>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RawPageDescriptor {
    #[serde(alias = "page")]
    pub page_num: u32,
    #[serde(default, alias = "binary")]
    pub raw_binary: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Loosely-shaped element; variant fields are optional on the wire
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RawElement {
    #[serde(default)]
    pub id: Option<Value>,
    /// Owning page number. Kept loose so one bad element cannot sink its group.
    #[serde(default)]
    pub page: Option<Value>,
    #[serde(default)]
    pub top: Option<f64>,
    #[serde(default)]
    pub left: Option<f64>,
    #[serde(default)]
    pub bottom: Option<f64>,
    #[serde(default)]
    pub right: Option<f64>,

    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub word_positions: Option<Value>,

    #[serde(default)]
    pub num_cols: Option<i64>,
    #[serde(default)]
    pub num_rows: Option<i64>,
    #[serde(default)]
    pub last_header_row: Option<i64>,
    #[serde(default)]
    pub last_header_col: Option<i64>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub cell_matrix: Option<Value>,
}

impl RawElement {
    /// The page number, if `page` holds a positive integral number
    #[must_use]
    pub fn page_num(&self) -> Option<u32> {
        match self.page.as_ref()? {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                        .map(|f| f as u64)
                })
                .and_then(|n| u32::try_from(n).ok())
                .filter(|&n| n > 0),
            _ => None,
        }
    }
}

/// Error body returned by the service
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

/// Entry of the available documents listing
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct DocumentEntry {
    #[serde(rename = "fileName", alias = "file_name")]
    pub file_name: String,
    #[serde(default)]
    pub owner: String,
}

/// Failures talking to the document service
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("the server took too long to respond (gave up after {}s)", .after.as_secs())]
    Timeout { after: Duration },

    #[error("document not found: {key}")]
    NotFound { key: String },

    #[error("service error: {message}")]
    Service { message: String, raw: Option<Value> },

    #[error("transport error: {detail}")]
    Transport { detail: String },

    #[error("unreadable response: {detail}")]
    Parse { detail: String },
}

impl FetchError {
    pub fn transport(detail: impl Into<String>) -> Self {
        Self::Transport {
            detail: detail.into(),
        }
    }

    pub fn parse(detail: impl Into<String>) -> Self {
        Self::Parse {
            detail: detail.into(),
        }
    }

    /// Message suitable for the view, distinguishing slow servers from failures
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Timeout { after } => format!(
                "The server took too long to respond ({}s). Large documents can take a while to process; try again shortly.",
                after.as_secs()
            ),
            FetchError::NotFound { key } => format!("Document '{key}' was not found."),
            FetchError::Service { message, .. } => format!("The document service reported an error: {message}"),
            FetchError::Transport { .. } => {
                "Could not reach the document service.".to_string()
            }
            FetchError::Parse { .. } => {
                "The document service sent a response that could not be read.".to_string()
            }
        }
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }
}

/// Parse a fetch body that is either a page content response or an error body
pub fn parse_fetch_body(body: &str) -> Result<RawPageContentResponse, FetchError> {
    let value: Value = serde_json::from_str(body).map_err(|e| FetchError::parse(e.to_string()))?;

    if value.get("success").is_none() {
        if let Ok(err) = serde_json::from_value::<ErrorResponse>(value.clone()) {
            return Err(FetchError::Service {
                message: err.error,
                raw: err.raw,
            });
        }
    }

    serde_json::from_value(value).map_err(|e| FetchError::parse(e.to_string()))
}
