//! LRU cache of rendered page surfaces
//!
//! Only pixels are cached. Overlay geometry is recomputed for every accepted
//! render.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use super::backend::Surface;

/// Cache key for rendered surfaces
///
/// `generation` identifies the page set the surface was rendered from, so a
/// render finishing after a document switch can never answer for the new one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub generation: u64,
    pub page_num: u32,
    /// Scale factor (stored as thousandths for stable hashing)
    pub scale_thousandths: u32,
}

impl CacheKey {
    #[must_use]
    pub fn new(generation: u64, page_num: u32, scale: f32) -> Self {
        Self {
            generation,
            page_num,
            scale_thousandths: (scale * 1000.0).round() as u32,
        }
    }
}

pub struct PageCache {
    cache: LruCache<CacheKey, Arc<Surface>>,
}

impl PageCache {
    /// Create a new cache with the given capacity (at least one entry)
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    /// Get a cached surface, promoting it in the LRU order
    #[must_use]
    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<Surface>> {
        self.cache.get(key).cloned()
    }

    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.cache.contains(key)
    }

    pub fn insert(&mut self, key: CacheKey, surface: Surface) -> Arc<Surface> {
        let arc = Arc::new(surface);
        self.cache.put(key, Arc::clone(&arc));
        arc
    }

    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
