//! HTTP document service client

use std::time::Duration;

use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};

use super::DocumentService;
use super::types::{
    DocumentEntry, ErrorResponse, FetchError, RawPageContentResponse, parse_fetch_body,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Talks to `GET {base}/documents` and `GET {base}/documents/{key}/pages`
pub struct HttpDocumentService {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpDocumentService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| FetchError::transport(format!("invalid service URL '{base_url}'")))?;

        let client = Client::builder()
            .user_agent(concat!("pagelens/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// Base URL extended by `segments`, each percent-encoded as one path segment
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn get(&self, url: Url) -> Result<(StatusCode, String), FetchError> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| self.map_reqwest_error(&e))?;

        let status = response.status();
        let body = response.text().map_err(|e| self.map_reqwest_error(&e))?;
        Ok((status, body))
    }

    fn map_reqwest_error(&self, err: &reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout {
                after: self.timeout,
            }
        } else {
            FetchError::transport(err.to_string())
        }
    }
}

fn service_error(status: StatusCode, body: &str) -> FetchError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(err) => FetchError::Service {
            message: err.error,
            raw: err.raw,
        },
        Err(_) => FetchError::Service {
            message: format!("HTTP {status}"),
            raw: None,
        },
    }
}

impl DocumentService for HttpDocumentService {
    fn fetch_page_content(&self, document_key: &str) -> Result<RawPageContentResponse, FetchError> {
        let url = self.endpoint(&["documents", document_key, "pages"]);
        let (status, body) = self.get(url)?;

        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                key: document_key.to_string(),
            });
        }
        if !status.is_success() {
            return Err(service_error(status, &body));
        }

        info!("Fetched page content for {document_key} ({} bytes)", body.len());
        parse_fetch_body(&body)
    }

    fn list_available_documents(&self) -> Result<Vec<DocumentEntry>, FetchError> {
        let url = self.endpoint(&["documents"]);
        let (status, body) = self.get(url)?;

        if !status.is_success() {
            return Err(service_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| FetchError::parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;

    #[test]
    fn endpoints_extend_base_path() {
        for base in ["http://localhost:8000/api", "http://localhost:8000/api/"] {
            let service = HttpDocumentService::new(base, DEFAULT_TIMEOUT).unwrap();
            assert_eq!(
                service.endpoint(&["documents"]).as_str(),
                "http://localhost:8000/api/documents"
            );
        }
    }

    #[test]
    fn document_key_is_one_encoded_segment() {
        let service = HttpDocumentService::new("http://localhost:8000", DEFAULT_TIMEOUT).unwrap();

        let url = service.endpoint(&["documents", "Q3#draft?v=2/final.pdf", "pages"]);
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/documents/Q3%23draft%3Fv=2%2Ffinal.pdf/pages"
        );
        assert_eq!(url.fragment(), None);
        assert_eq!(url.query(), None);
    }

    #[test]
    fn unusable_base_url_is_rejected() {
        assert!(HttpDocumentService::new("not a url", DEFAULT_TIMEOUT).is_err());
        assert!(HttpDocumentService::new("mailto:ops@example.com", DEFAULT_TIMEOUT).is_err());
    }

    #[test]
    fn silent_server_maps_to_timeout() {
        // Connections queue in the backlog but are never answered.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let timeout = Duration::from_millis(300);
        let service = HttpDocumentService::new(&base, timeout).unwrap();

        let err = service.fetch_page_content("slow.pdf").unwrap_err();
        assert!(matches!(err, FetchError::Timeout { after } if after == timeout));
        assert!(err.is_timeout());
        drop(listener);
    }

    #[test]
    fn non_success_body_becomes_service_error() {
        let err = service_error(StatusCode::BAD_GATEWAY, r#"{"error": "worker crashed"}"#);
        assert!(matches!(err, FetchError::Service { ref message, .. } if message == "worker crashed"));

        let err = service_error(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>");
        assert!(matches!(err, FetchError::Service { ref message, .. } if message.contains("500")));
    }

    #[test]
    fn unreachable_server_is_a_transport_error() {
        // Port 9 (discard) on loopback refuses connections on test hosts.
        let service = HttpDocumentService::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = service.list_available_documents().unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. } | FetchError::Timeout { .. }));
    }
}
