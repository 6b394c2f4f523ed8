//! Client-side paging for devotion card grids.
//!
//! # Invariants
//! - `page` is 1-based and stays within `1..=max(total_pages, 1)`.
//! - Prev/next clamp at the ends instead of wrapping.

use std::ops::Range;

/// Cards per gallery page.
pub const GALLERY_PAGE_SIZE: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GalleryPager {
    page: usize,
    page_size: usize,
    total_items: usize,
}

impl GalleryPager {
    /// First page over `total_items` cards, `GALLERY_PAGE_SIZE` per page.
    pub fn new(total_items: usize) -> Self {
        Self::with_page_size(total_items, GALLERY_PAGE_SIZE)
    }

    /// A `page_size` of 0 falls back to `GALLERY_PAGE_SIZE`.
    pub fn with_page_size(total_items: usize, page_size: usize) -> Self {
        let page_size = if page_size == 0 {
            GALLERY_PAGE_SIZE
        } else {
            page_size
        };
        Self {
            page: 1,
            page_size,
            total_items,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn total_pages(&self) -> usize {
        self.total_items.div_ceil(self.page_size)
    }

    /// Prev/next controls are hidden for a single page.
    pub fn shows_controls(&self) -> bool {
        self.total_pages() > 1
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn previous(&mut self) -> usize {
        self.page = self.page.saturating_sub(1).max(1);
        self.page
    }

    pub fn next(&mut self) -> usize {
        self.page = (self.page + 1).min(self.last_page());
        self.page
    }

    /// Updates the item count when the list changes, keeping the page valid.
    pub fn set_total_items(&mut self, total_items: usize) {
        self.total_items = total_items;
        self.page = self.page.min(self.last_page());
    }

    /// Index range of the current page.
    pub fn range(&self) -> Range<usize> {
        let start = ((self.page - 1) * self.page_size).min(self.total_items);
        let end = (start + self.page_size).min(self.total_items);
        start..end
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let range = self.range();
        &items[range.start.min(items.len())..range.end.min(items.len())]
    }

    fn last_page(&self) -> usize {
        self.total_pages().max(1)
    }
}
