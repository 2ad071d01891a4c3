//! Render request and response types

use std::sync::Arc;

use crate::content::PageContent;

use super::backend::Surface;

/// Monotonically increasing identifier for render requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// What a render was issued for; compared against live state on completion
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderTicket {
    pub id: RequestId,
    /// Page set the request was issued against
    pub generation: u64,
    pub page_num: u32,
    pub scale: f32,
}

impl RenderTicket {
    /// Whether the ticket still describes the given page and scale
    #[must_use]
    pub fn targets(&self, page_num: Option<u32>, scale: f32) -> bool {
        page_num == Some(self.page_num) && (self.scale - scale).abs() <= f32::EPSILON
    }
}

/// Request sent to the render worker
#[derive(Debug)]
pub enum RenderRequest {
    /// Decode (if needed) and render a page
    Page {
        ticket: RenderTicket,
        page: Arc<PageContent>,
    },

    /// Drop the decoded document and every cached surface.
    ///
    /// Handled in order, so renders queued before it cannot refill the cache.
    ReleaseDocument,

    /// Shutdown the worker
    Shutdown,
}

/// Page-scoped render failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderFault {
    #[error("could not decode page binary: {detail}")]
    Decode { detail: String },

    #[error("could not render page: {detail}")]
    Render { detail: String },
}

impl RenderFault {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode { detail: msg.into() }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render { detail: msg.into() }
    }
}

/// Response from the render worker
#[derive(Debug)]
pub enum RenderResponse {
    Page {
        ticket: RenderTicket,
        surface: Arc<Surface>,
    },

    Error {
        ticket: RenderTicket,
        error: RenderFault,
    },
}

impl RenderResponse {
    #[must_use]
    pub fn ticket(&self) -> &RenderTicket {
        match self {
            RenderResponse::Page { ticket, .. } | RenderResponse::Error { ticket, .. } => ticket,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_targets_exact_page_and_scale() {
        let ticket = RenderTicket {
            id: RequestId::new(4),
            generation: 1,
            page_num: 2,
            scale: 1.5,
        };
        assert!(ticket.targets(Some(2), 1.5));
        assert!(!ticket.targets(Some(3), 1.5));
        assert!(!ticket.targets(Some(2), 1.75));
        assert!(!ticket.targets(None, 1.5));
    }
}
