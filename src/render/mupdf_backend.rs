//! MuPDF-backed decoder and renderer

use mupdf::{Colorspace, Document, Matrix, Pixmap};

use super::backend::{DocumentDecoder, PageRenderer, Surface};
use super::request::RenderFault;
use crate::export::PageFormat;

impl From<mupdf::error::Error> for RenderFault {
    fn from(err: mupdf::error::Error) -> Self {
        RenderFault::render(err.to_string())
    }
}

/// Opens page binaries with MuPDF, picking the handler from the leading bytes
#[derive(Clone, Copy, Debug, Default)]
pub struct MupdfDecoder;

impl DocumentDecoder for MupdfDecoder {
    type Document = Document;

    fn decode(&self, bytes: &[u8]) -> Result<Document, RenderFault> {
        if bytes.is_empty() {
            return Err(RenderFault::decode("page binary is empty"));
        }

        let magic = PageFormat::sniff(bytes).extension();
        let doc = Document::from_bytes(bytes, magic)
            .map_err(|e| RenderFault::decode(e.to_string()))?;

        let page_count = doc
            .page_count()
            .map_err(|e| RenderFault::decode(e.to_string()))?;
        if page_count < 1 {
            return Err(RenderFault::decode("page binary holds no pages"));
        }

        Ok(doc)
    }
}

/// Rasterizes pages at document-space size times scale
#[derive(Clone, Copy, Debug, Default)]
pub struct MupdfRenderer;

impl PageRenderer<Document> for MupdfRenderer {
    fn render(&self, document: &Document, page_index: usize, scale: f32) -> Result<Surface, RenderFault> {
        let index = i32::try_from(page_index)
            .map_err(|_| RenderFault::render(format!("page index {page_index} out of range")))?;
        let page = document.load_page(index)?;

        let transform = Matrix::new_scale(scale, scale);
        let rgb = Colorspace::device_rgb();
        let pixmap = page.to_pixmap(&transform, &rgb, false, false)?;

        Ok(Surface {
            pixels: pixmap_to_rgb(&pixmap)?,
            width_px: pixmap.width(),
            height_px: pixmap.height(),
        })
    }
}

fn pixmap_to_rgb(pixmap: &Pixmap) -> Result<Vec<u8>, RenderFault> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(RenderFault::render(format!(
            "Unsupported pixmap format: {n} channels"
        )));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
        return Err(RenderFault::render("Pixmap buffer size mismatch"));
    }

    let mut out = Vec::with_capacity(width * height * 3);
    for row in samples.chunks(stride).take(height) {
        let row = &row[..row_bytes];
        if n == 3 {
            out.extend_from_slice(row);
        } else {
            for px in row.chunks_exact(n) {
                out.extend_from_slice(&px[..3]);
            }
        }
    }

    Ok(out)
}
