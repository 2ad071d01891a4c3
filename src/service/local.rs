//! Directory-backed document service
//!
//! Each document is a `<key>.json` file holding a page content payload. An
//! optional `owners.json` maps keys to owner names.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use super::DocumentService;
use super::types::{DocumentEntry, FetchError, RawPageContentResponse, parse_fetch_body};

const OWNERS_FILE: &str = "owners.json";
const DEFAULT_OWNER: &str = "local";

pub struct LocalDocumentService {
    root: PathBuf,
}

impl LocalDocumentService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn payload_path(&self, key: &str) -> Result<PathBuf, FetchError> {
        if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
            return Err(FetchError::NotFound {
                key: key.to_string(),
            });
        }
        Ok(self.root.join(format!("{key}.json")))
    }

    fn load_owners(&self) -> HashMap<String, String> {
        let path = self.root.join(OWNERS_FILE);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                warn!("Could not read {}: {e}", path.display());
                return HashMap::new();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!("Ignoring malformed {}: {e}", path.display());
            HashMap::new()
        })
    }
}

impl DocumentService for LocalDocumentService {
    fn fetch_page_content(&self, document_key: &str) -> Result<RawPageContentResponse, FetchError> {
        let path = self.payload_path(document_key)?;
        debug!("Reading page content from {}", path.display());

        let body = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => FetchError::NotFound {
                key: document_key.to_string(),
            },
            _ => FetchError::transport(format!("{}: {e}", path.display())),
        })?;

        parse_fetch_body(&body)
    }

    fn list_available_documents(&self) -> Result<Vec<DocumentEntry>, FetchError> {
        let entries = fs::read_dir(&self.root)
            .map_err(|e| FetchError::transport(format!("{}: {e}", self.root.display())))?;
        let owners = self.load_owners();

        let mut documents: Vec<DocumentEntry> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter(|path| path.file_name().is_some_and(|name| name != OWNERS_FILE))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .map(|file_name| DocumentEntry {
                owner: owners
                    .get(&file_name)
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_OWNER.to_string()),
                file_name,
            })
            .collect();

        documents.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(documents)
    }
}
