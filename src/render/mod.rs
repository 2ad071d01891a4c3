//! Page rendering
//!
//! A single worker thread decodes page binaries and paints surfaces. The
//! pipeline on the caller's side tags every request and drops results that
//! no longer match the viewed page and scale.

pub mod backend;
pub mod cache;
#[cfg(feature = "pdf")]
pub mod mupdf_backend;
pub mod overlay;
pub mod pipeline;
pub mod request;
pub mod snapshot;
mod worker;

pub use backend::{DocumentDecoder, NoRasterizer, PageRenderer, Surface};
pub use cache::{CacheKey, PageCache};
#[cfg(feature = "pdf")]
pub use mupdf_backend::{MupdfDecoder, MupdfRenderer};
pub use overlay::{OverlayRegion, hit_test, layout_overlay};
pub use pipeline::{DEFAULT_CACHE_SIZE, RenderOutcome, RenderPipeline};
pub use request::{RenderFault, RenderRequest, RenderResponse, RenderTicket, RequestId};
