//! Render worker - runs in a dedicated thread
//!
//! The worker owns at most one decoded document at a time, for the page
//! currently being viewed. Moving to another page drops the previous handle
//! before the new binary is decoded.

use std::sync::{Arc, Mutex};

use flume::{Receiver, Sender};
use log::debug;

use super::backend::{DocumentDecoder, PageRenderer, Surface};
use super::cache::{CacheKey, PageCache};
use super::request::{RenderFault, RenderRequest, RenderResponse, RenderTicket};
use crate::content::PageContent;

/// Single decoded-document slot, tagged with the page it belongs to
struct DocumentSlot<T> {
    generation: u64,
    page_num: u32,
    document: T,
}

/// Main worker function
#[expect(
    clippy::needless_pass_by_value,
    reason = "Values moved into thread, need ownership"
)]
pub fn render_worker<D, R>(
    decoder: D,
    renderer: R,
    requests: Receiver<RenderRequest>,
    responses: Sender<RenderResponse>,
    cache: Arc<Mutex<PageCache>>,
) where
    D: DocumentDecoder,
    R: PageRenderer<D::Document>,
{
    let mut slot: Option<DocumentSlot<D::Document>> = None;

    for request in requests {
        match request {
            RenderRequest::Page { ticket, page } => {
                let response =
                    handle_page_request(&decoder, &renderer, &mut slot, ticket, &page, &cache);
                if responses.send(response).is_err() {
                    break;
                }
            }

            RenderRequest::ReleaseDocument => {
                slot = None;
                cache
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .invalidate_all();
            }

            RenderRequest::Shutdown => break,
        }
    }

    debug!("Render worker exiting");
}

fn handle_page_request<D, R>(
    decoder: &D,
    renderer: &R,
    slot: &mut Option<DocumentSlot<D::Document>>,
    ticket: RenderTicket,
    page: &PageContent,
    cache: &Arc<Mutex<PageCache>>,
) -> RenderResponse
where
    D: DocumentDecoder,
    R: PageRenderer<D::Document>,
{
    if slot
        .as_ref()
        .is_some_and(|s| s.page_num != page.page_num || s.generation != ticket.generation)
    {
        *slot = None;
    }

    let key = CacheKey::new(ticket.generation, page.page_num, ticket.scale);
    let cached = cache
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .get(&key);
    if let Some(surface) = cached {
        debug!("Cache hit for page {} at {}", page.page_num, ticket.scale);
        return RenderResponse::Page { ticket, surface };
    }

    match render_page(decoder, renderer, slot, page, ticket) {
        Ok(surface) => {
            let surface = cache
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .insert(key, surface);
            RenderResponse::Page { ticket, surface }
        }
        Err(error) => RenderResponse::Error { ticket, error },
    }
}

fn render_page<D, R>(
    decoder: &D,
    renderer: &R,
    slot: &mut Option<DocumentSlot<D::Document>>,
    page: &PageContent,
    ticket: RenderTicket,
) -> Result<Surface, RenderFault>
where
    D: DocumentDecoder,
    R: PageRenderer<D::Document>,
{
    let held = match slot.take() {
        Some(held) => held,
        None => DocumentSlot {
            generation: ticket.generation,
            page_num: page.page_num,
            document: decode_document(decoder, page)?,
        },
    };
    let held = slot.insert(held);

    // Each record carries a single-page snapshot.
    renderer.render(&held.document, 0, ticket.scale)
}

fn decode_document<D: DocumentDecoder>(
    decoder: &D,
    page: &PageContent,
) -> Result<D::Document, RenderFault> {
    let bytes = page
        .decode_binary()
        .map_err(|e| RenderFault::decode(e.to_string()))?
        .ok_or_else(|| RenderFault::decode(format!("page {} has no binary attached", page.page_num)))?;

    let document = decoder.decode(&bytes)?;
    debug!("Decoded binary for page {} ({} bytes)", page.page_num, bytes.len());
    Ok(document)
}
