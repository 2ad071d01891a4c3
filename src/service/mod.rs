//! Document service boundary
//!
//! The processor only consumes two calls from the outside world: fetching a
//! document's page content and listing what documents exist.

#[cfg(feature = "remote")]
pub mod http;
pub mod local;
pub mod types;

#[cfg(feature = "remote")]
pub use http::HttpDocumentService;
pub use local::LocalDocumentService;
pub use types::{
    DocumentEntry, ErrorResponse, FetchError, RawElement, RawGroup, RawPageContentResponse,
    RawPageDescriptor, parse_fetch_body,
};

/// Source of raw page content payloads
pub trait DocumentService {
    fn fetch_page_content(&self, document_key: &str) -> Result<RawPageContentResponse, FetchError>;

    fn list_available_documents(&self) -> Result<Vec<DocumentEntry>, FetchError>;
}

impl<S: DocumentService + ?Sized> DocumentService for Box<S> {
    fn fetch_page_content(&self, document_key: &str) -> Result<RawPageContentResponse, FetchError> {
        (**self).fetch_page_content(document_key)
    }

    fn list_available_documents(&self) -> Result<Vec<DocumentEntry>, FetchError> {
        (**self).list_available_documents()
    }
}
