//! Render pipeline - owns the worker thread and filters stale results

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use flume::{Receiver, RecvTimeoutError, Sender};
use log::debug;

use super::backend::{DocumentDecoder, PageRenderer, Surface};
use super::cache::{CacheKey, PageCache};
use super::request::{RenderFault, RenderRequest, RenderResponse, RenderTicket, RequestId};
use super::worker::render_worker;
use crate::content::PageContent;
use crate::viewport::ViewportState;

pub const DEFAULT_CACHE_SIZE: usize = 16;

/// A render result that still matches the live view
#[derive(Debug)]
pub enum RenderOutcome {
    Rendered {
        ticket: RenderTicket,
        surface: Arc<Surface>,
    },
    Failed {
        ticket: RenderTicket,
        error: RenderFault,
    },
}

impl RenderOutcome {
    #[must_use]
    pub fn ticket(&self) -> &RenderTicket {
        match self {
            RenderOutcome::Rendered { ticket, .. } | RenderOutcome::Failed { ticket, .. } => ticket,
        }
    }
}

/// Sends page renders to a background worker and hands back only results
/// for the most recent request whose page and scale are still current.
pub struct RenderPipeline {
    request_tx: Sender<RenderRequest>,
    response_rx: Receiver<RenderResponse>,
    next_request_id: u64,
    /// Bumped whenever the page set is replaced
    generation: u64,
    pending: Option<RenderTicket>,
    cache: Arc<Mutex<PageCache>>,
}

impl RenderPipeline {
    /// Start the render worker with the given backend
    #[must_use]
    pub fn spawn<D, R>(decoder: D, renderer: R, cache_size: usize) -> Self
    where
        D: DocumentDecoder,
        R: PageRenderer<D::Document>,
    {
        let cache = Arc::new(Mutex::new(PageCache::new(cache_size)));
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        let worker_cache = Arc::clone(&cache);
        std::thread::spawn(move || {
            render_worker(decoder, renderer, request_rx, response_tx, worker_cache);
        });

        Self {
            request_tx,
            response_rx,
            next_request_id: 1,
            generation: 0,
            pending: None,
            cache,
        }
    }

    /// Ask for `page` at `scale`; supersedes any request still in flight
    pub fn request(&mut self, page: Arc<PageContent>, scale: f32) -> RenderTicket {
        let ticket = RenderTicket {
            id: self.next_id(),
            generation: self.generation,
            page_num: page.page_num,
            scale,
        };

        if let Some(previous) = self.pending.replace(ticket) {
            debug!(
                "Render {:?} for page {} superseded by {:?}",
                previous.id, previous.page_num, ticket.id
            );
        }

        let _ = self.request_tx.send(RenderRequest::Page { ticket, page });
        ticket
    }

    /// The request whose result is still wanted, if any
    #[must_use]
    pub fn pending(&self) -> Option<&RenderTicket> {
        self.pending.as_ref()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn is_cached(&self, page_num: u32, scale: f32) -> bool {
        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains(&CacheKey::new(self.generation, page_num, scale))
    }

    /// Forget everything tied to the current page set.
    ///
    /// Starts a new generation and abandons the pending request. Renders
    /// already queued finish under the old generation and are never served
    /// again; the worker then clears the cache and its decoded document.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .invalidate_all();
        self.pending = None;
        let _ = self.request_tx.send(RenderRequest::ReleaseDocument);
    }

    /// Drain finished renders without blocking
    pub fn poll(&mut self, view: &ViewportState) -> Option<RenderOutcome> {
        let mut accepted = None;
        while let Ok(response) = self.response_rx.try_recv() {
            if let Some(outcome) = self.accept(response, view) {
                accepted = Some(outcome);
            }
        }
        accepted
    }

    /// Block until the pending render finishes or `timeout` elapses.
    ///
    /// Stale responses arriving in the meantime are discarded.
    pub fn wait(&mut self, view: &ViewportState, timeout: Duration) -> Option<RenderOutcome> {
        let deadline = Instant::now() + timeout;

        while self.pending.is_some() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.response_rx.recv_timeout(remaining) {
                Ok(response) => {
                    if let Some(outcome) = self.accept(response, view) {
                        return Some(outcome);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    debug!("Timed out waiting for render {:?}", self.pending.map(|t| t.id));
                    return None;
                }
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }

        None
    }

    fn accept(&mut self, response: RenderResponse, view: &ViewportState) -> Option<RenderOutcome> {
        let ticket = *response.ticket();
        let latest = self.pending.is_some_and(|pending| pending.id == ticket.id);

        if !latest || !ticket.targets(view.current_page, view.scale) {
            debug!(
                "Discarding stale render {:?} for page {} at {}",
                ticket.id, ticket.page_num, ticket.scale
            );
            if latest {
                self.pending = None;
            }
            return None;
        }

        self.pending = None;
        Some(match response {
            RenderResponse::Page { ticket, surface } => RenderOutcome::Rendered { ticket, surface },
            RenderResponse::Error { ticket, error } => RenderOutcome::Failed { ticket, error },
        })
    }

    /// Stop the worker thread
    pub fn shutdown(&self) {
        let _ = self.request_tx.send(RenderRequest::Shutdown);
    }

    fn next_id(&mut self) -> RequestId {
        let id = RequestId::new(self.next_request_id);
        self.next_request_id += 1;
        id
    }
}

impl Drop for RenderPipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}
