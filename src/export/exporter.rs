use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Serialize;

use crate::content::PageContent;
use crate::export::filename::{sanitize_filename, source_stem};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Page {page} has no binary snapshot to export")]
    Unavailable { page: u32 },

    #[error("Page binary is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Container format of a page binary, recognised by its leading bytes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    Pdf,
    Png,
    Jpeg,
    Tiff,
}

impl PageFormat {
    /// Unrecognised content is treated as PDF
    #[must_use]
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(b"%PDF") {
            PageFormat::Pdf
        } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            PageFormat::Png
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            PageFormat::Jpeg
        } else if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
            PageFormat::Tiff
        } else {
            PageFormat::Pdf
        }
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            PageFormat::Pdf => "pdf",
            PageFormat::Png => "png",
            PageFormat::Jpeg => "jpg",
            PageFormat::Tiff => "tiff",
        }
    }

    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            PageFormat::Pdf => "application/pdf",
            PageFormat::Png => "image/png",
            PageFormat::Jpeg => "image/jpeg",
            PageFormat::Tiff => "image/tiff",
        }
    }
}

/// A named binary ready to be saved
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub format: PageFormat,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Write the artifact into `dir`, creating it if needed
    pub fn save(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(dir).map_err(|source| ExportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = dir.join(&self.file_name);
        fs::write(&path, &self.bytes).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;

        info!("Exported {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

pub struct ExportService;

impl ExportService {
    /// Re-materialize a page's embedded binary as `{source}_page_{n}.{ext}`.
    ///
    /// No artifact is produced when the page carries no binary.
    pub fn export_current_page(
        page: &PageContent,
        page_num: u32,
        source_name: &str,
    ) -> Result<ExportArtifact, ExportError> {
        let bytes = page
            .decode_binary()?
            .ok_or(ExportError::Unavailable { page: page_num })?;

        let format = PageFormat::sniff(&bytes);
        let stem = sanitize_filename(source_stem(source_name));
        let file_name = format!("{stem}_page_{page_num}.{}", format.extension());
        debug!("Prepared export {file_name} as {}", format.mime_type());

        Ok(ExportArtifact {
            file_name,
            format,
            bytes,
        })
    }
}
