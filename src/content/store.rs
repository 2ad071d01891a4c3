//! Single source of truth for the normalized page list

use std::sync::Arc;

use log::{debug, warn};

use super::types::PageContent;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("page {0} is not loaded")]
    UnknownPage(u32),

    #[error("element '{id}' not found on page {page}")]
    UnknownElement { page: u32, id: String },

    #[error("element '{0}' does not hold editable text")]
    NotEditable(String),
}

/// Lookup over the set of page numbers present in the current document.
///
/// Page numbers come from the source data and may be sparse, so navigation
/// checks membership rather than a numeric range.
pub trait PageDomain {
    fn contains_page(&self, page_num: u32) -> bool;
    fn first_page(&self) -> Option<u32>;
    fn next_page_after(&self, page_num: u32) -> Option<u32>;
    fn prev_page_before(&self, page_num: u32) -> Option<u32>;
}

impl PageDomain for [u32] {
    fn contains_page(&self, page_num: u32) -> bool {
        self.binary_search(&page_num).is_ok()
    }

    fn first_page(&self) -> Option<u32> {
        self.first().copied()
    }

    fn next_page_after(&self, page_num: u32) -> Option<u32> {
        let idx = self.partition_point(|&p| p <= page_num);
        self.get(idx).copied()
    }

    fn prev_page_before(&self, page_num: u32) -> Option<u32> {
        let idx = self.partition_point(|&p| p < page_num);
        idx.checked_sub(1).and_then(|i| self.get(i)).copied()
    }
}

/// Holds page records sorted ascending by page number, without duplicates.
///
/// Records are shared as `Arc` so a render in flight keeps the version it was
/// issued with; edits replace the record instead of mutating it.
#[derive(Debug, Default)]
pub struct PageContentStore {
    pages: Vec<Arc<PageContent>>,
    page_numbers: Vec<u32>,
}

impl PageContentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole page list.
    ///
    /// The list is re-sorted and de-duplicated (later record wins) so the
    /// ordering invariant holds whatever the caller passes.
    pub fn set_pages(&mut self, mut pages: Vec<PageContent>) {
        pages.sort_by_key(|p| p.page_num);

        let mut deduped: Vec<PageContent> = Vec::with_capacity(pages.len());
        for page in pages {
            match deduped.last_mut() {
                Some(last) if last.page_num == page.page_num => {
                    warn!("Duplicate page {} in page list, keeping the later one", page.page_num);
                    *last = page;
                }
                _ => deduped.push(page),
            }
        }

        self.page_numbers = deduped.iter().map(|p| p.page_num).collect();
        self.pages = deduped.into_iter().map(Arc::new).collect();
        debug!("Store holds {} pages", self.pages.len());
    }

    pub fn clear(&mut self) {
        self.pages.clear();
        self.page_numbers.clear();
    }

    #[must_use]
    pub fn get_page(&self, page_num: u32) -> Option<Arc<PageContent>> {
        self.index_of(page_num).map(|idx| Arc::clone(&self.pages[idx]))
    }

    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    #[must_use]
    pub fn page_numbers(&self) -> &[u32] {
        &self.page_numbers
    }

    pub fn pages(&self) -> impl Iterator<Item = &Arc<PageContent>> {
        self.pages.iter()
    }

    /// Replace the text of a text element, swapping in a fresh page record
    pub fn replace_element_text(
        &mut self,
        page_num: u32,
        element_id: &str,
        new_text: &str,
    ) -> Result<Arc<PageContent>, StoreError> {
        let idx = self
            .index_of(page_num)
            .ok_or(StoreError::UnknownPage(page_num))?;
        let current = &self.pages[idx];

        let pos = current
            .elements
            .iter()
            .position(|e| e.id == element_id)
            .ok_or_else(|| StoreError::UnknownElement {
                page: page_num,
                id: element_id.to_string(),
            })?;

        let edited = current.elements[pos]
            .with_text(new_text)
            .ok_or_else(|| StoreError::NotEditable(element_id.to_string()))?;

        let mut elements = current.elements.clone();
        elements[pos] = edited;
        let replacement = Arc::new(PageContent {
            elements,
            ..PageContent::clone(current)
        });

        self.pages[idx] = Arc::clone(&replacement);
        Ok(replacement)
    }

    fn index_of(&self, page_num: u32) -> Option<usize> {
        self.page_numbers.binary_search(&page_num).ok()
    }
}

impl PageDomain for PageContentStore {
    fn contains_page(&self, page_num: u32) -> bool {
        self.page_numbers.contains_page(page_num)
    }

    fn first_page(&self) -> Option<u32> {
        self.page_numbers.first_page()
    }

    fn next_page_after(&self, page_num: u32) -> Option<u32> {
        self.page_numbers.next_page_after(page_num)
    }

    fn prev_page_before(&self, page_num: u32) -> Option<u32> {
        self.page_numbers.prev_page_before(page_num)
    }
}
