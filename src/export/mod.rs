pub mod exporter;
pub mod filename;

pub use exporter::{ExportArtifact, ExportError, ExportService, PageFormat};
pub use filename::{sanitize_filename, source_stem};
