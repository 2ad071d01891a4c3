//! Seams to the external document decoder and page renderer

use super::request::RenderFault;

/// Rendered page pixels.
///
/// RGB, 3 bytes per pixel, rows packed without padding.
#[derive(Clone, PartialEq, Eq)]
pub struct Surface {
    pub pixels: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl Surface {
    /// Solid white surface of the given size
    #[must_use]
    pub fn blank(width_px: u32, height_px: u32) -> Self {
        Self {
            pixels: vec![0xFF; width_px as usize * height_px as usize * 3],
            width_px,
            height_px,
        }
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width_px", &self.width_px)
            .field("height_px", &self.height_px)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Parses a binary blob into a page-addressable document handle.
///
/// Handles are created and dropped on the render thread and never cross it,
/// so only the decoder itself has to be `Send`.
pub trait DocumentDecoder: Send + 'static {
    type Document;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Document, RenderFault>;
}

/// Paints one page of a decoded document at a given scale.
///
/// The surface is sized to the page's document-space dimensions times
/// `scale`, so overlay boxes mapped at the same scale line up with it.
pub trait PageRenderer<D>: Send + 'static {
    fn render(&self, document: &D, page_index: usize, scale: f32) -> Result<Surface, RenderFault>;
}

/// Backend for builds without a rasterizer; every page fails to decode
#[derive(Clone, Copy, Debug, Default)]
pub struct NoRasterizer;

impl DocumentDecoder for NoRasterizer {
    type Document = ();

    fn decode(&self, _bytes: &[u8]) -> Result<(), RenderFault> {
        Err(RenderFault::decode("built without page rendering support"))
    }
}

impl PageRenderer<()> for NoRasterizer {
    fn render(&self, _document: &(), _page_index: usize, _scale: f32) -> Result<Surface, RenderFault> {
        Err(RenderFault::render("built without page rendering support"))
    }
}
