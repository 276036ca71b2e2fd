//! Slice bounds for paginated listings.

use crate::defaults::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Compute the `[start, end)` window of a page over `total` items.
///
/// `page` is 1-based; a zero page is treated as the first page and a zero
/// page size falls back to [`DEFAULT_PAGE_SIZE`]. The result always satisfies
/// `start <= end <= total`, so it can index a slice of length `total`
/// directly.
pub fn apply_pagination(total: usize, page: usize, page_size: usize) -> (usize, usize) {
    let page = page.max(1);
    let page_size = match page_size {
        0 => DEFAULT_PAGE_SIZE,
        n => n.min(MAX_PAGE_SIZE),
    };
    let start = (page - 1).saturating_mul(page_size).min(total);
    let end = start.saturating_add(page_size).min(total);
    (start, end)
}
