//! Pagination arithmetic over a known row count and page size.
//!
//! Row indices in [`PageWindow`] are 1-based and inclusive, matching what the
//! table footer shows ("Showing 6-10 of 12 rows").

use crate::error::PageError;

/// Direction for [`advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

/// Visible row bounds for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page_number: usize,
    pub page_size: usize,
    /// First visible row (1-based).
    pub start_index: usize,
    /// Last visible row (1-based). Smaller than `start_index` when the page is empty.
    pub end_index: usize,
    pub total_pages: usize,
}

impl PageWindow {
    /// Zero-based offset of the first row on this page.
    pub fn offset(&self) -> usize {
        self.start_index - 1
    }

    /// Number of rows that fall on this page.
    pub fn len(&self) -> usize {
        (self.end_index + 1).saturating_sub(self.start_index)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_first(&self) -> bool {
        self.page_number <= 1
    }

    pub fn is_last(&self) -> bool {
        self.page_number >= self.total_pages
    }
}

/// Number of pages needed for `total_rows` rows. Zero rows means zero pages.
pub fn total_pages(total_rows: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total_rows.div_ceil(page_size)
}

/// Number of rows a page must contain: `min(size, max(0, total - (page-1)*size))`.
pub fn rows_on_page(page_number: usize, page_size: usize, total_rows: usize) -> usize {
    let skipped = page_number.saturating_sub(1).saturating_mul(page_size);
    total_rows.saturating_sub(skipped).min(page_size)
}

/// Compute the visible window for `page_number`.
///
/// Fails when `page_number` or `page_size` is zero, or when the file has rows and
/// `page_number` is past the last page. An empty file accepts any page number and
/// yields an empty window.
pub fn compute_window(
    page_number: usize,
    page_size: usize,
    total_rows: usize,
) -> Result<PageWindow, PageError> {
    if page_number < 1 {
        return Err(PageError::InvalidPageNumber);
    }
    if page_size < 1 {
        return Err(PageError::InvalidPageSize);
    }
    let total_pages = total_pages(total_rows, page_size);
    if total_pages > 0 && page_number > total_pages {
        return Err(PageError::OutOfRange {
            page: page_number,
            total_pages,
        });
    }

    let start_index = (page_number - 1).saturating_mul(page_size).saturating_add(1);
    let end_index = page_number.saturating_mul(page_size).min(total_rows);

    Ok(PageWindow {
        page_number,
        page_size,
        start_index,
        end_index,
        total_pages,
    })
}

/// Step one page in `direction`, clamped to `[1, max(total_pages, 1)]`.
///
/// Never fails: stepping past either end stays on the boundary page.
pub fn advance(direction: Direction, current: usize, total_pages: usize) -> usize {
    let last = total_pages.max(1);
    let current = current.clamp(1, last);
    match direction {
        Direction::Prev => current.saturating_sub(1).max(1),
        Direction::Next => (current + 1).min(last),
    }
}
