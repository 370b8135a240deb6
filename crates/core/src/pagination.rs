//! Offset pagination over in-memory listings.
//!
//! [`paginate`] slices a page out of an already filtered and sorted list and
//! reports the metadata a listing needs (page counts, navigation flags, the
//! half-open index range). [`page_numbers`] produces the window of page links
//! shown around the current page.

use serde::{Deserialize, Serialize};

/// Input for [`paginate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationOptions {
    /// Requested page (1-based). Out-of-range values are clamped.
    pub current_page: usize,
    /// Total number of items in the full listing.
    pub total_items: usize,
    /// Page size. A size of zero is treated as one.
    pub items_per_page: usize,
}

impl PaginationOptions {
    /// Options for paginating a listing of `total_items` items.
    #[must_use]
    pub const fn new(current_page: usize, total_items: usize, items_per_page: usize) -> Self {
        Self {
            current_page,
            total_items,
            items_per_page,
        }
    }
}

/// One page of a listing plus navigation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    /// The page actually served, after clamping.
    pub current_page: usize,
    /// `ceil(total_items / items_per_page)`; zero for an empty listing.
    pub total_pages: usize,
    pub total_items: usize,
    pub items_per_page: usize,
    pub has_next_page: bool,
    pub has_previous_page: bool,
    /// First index of the page (inclusive).
    pub start_index: usize,
    /// End of the page (exclusive).
    pub end_index: usize,
}

impl<T> Paginated<T> {
    /// Map items while preserving the page metadata.
    pub fn map_items<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            current_page: self.current_page,
            total_pages: self.total_pages,
            total_items: self.total_items,
            items_per_page: self.items_per_page,
            has_next_page: self.has_next_page,
            has_previous_page: self.has_previous_page,
            start_index: self.start_index,
            end_index: self.end_index,
        }
    }
}

/// Slice one page out of `items`.
///
/// The requested page is clamped into `[1, total_pages]`, or to 1 when the
/// listing is empty. `start_index..end_index` is the half-open range of the
/// page and `end_index` never exceeds `total_items`. The function is pure:
/// the same inputs always produce the same page.
#[must_use]
pub fn paginate<T: Clone>(items: &[T], options: PaginationOptions) -> Paginated<T> {
    let PaginationOptions {
        current_page,
        total_items,
        items_per_page,
    } = options;
    let items_per_page = items_per_page.max(1);

    let total_pages = total_items.div_ceil(items_per_page);
    let current_page = current_page.min(total_pages).max(1);

    let start_index = (current_page - 1) * items_per_page;
    let end_index = (start_index + items_per_page).min(total_items);

    let page = items
        .get(start_index..end_index.min(items.len()))
        .map(<[T]>::to_vec)
        .unwrap_or_default();

    Paginated {
        items: page,
        current_page,
        total_pages,
        total_items,
        items_per_page,
        has_next_page: current_page < total_pages,
        has_previous_page: current_page > 1,
        start_index,
        end_index,
    }
}

/// Default number of page links shown by [`page_numbers`].
pub const DEFAULT_VISIBLE_PAGES: usize = 5;

/// Page numbers to render around `current_page`.
///
/// When every page fits, all pages are returned. Otherwise the window spans
/// `max_visible / 2` pages on each side of the current page and slides
/// toward the first or last page near the edges. With an even `max_visible`
/// a centered window holds `max_visible + 1` pages, e.g. `(5, 10, 4)`
/// yields `[3, 4, 5, 6, 7]`; listing UIs depend on that shape.
#[must_use]
pub fn page_numbers(current_page: usize, total_pages: usize, max_visible: usize) -> Vec<usize> {
    if total_pages <= max_visible {
        return (1..=total_pages).collect();
    }

    let half_visible = max_visible / 2;
    let mut start_page = current_page.saturating_sub(half_visible).max(1);
    let mut end_page = total_pages.min(current_page.saturating_add(half_visible));

    if current_page <= half_visible {
        end_page = max_visible.min(total_pages);
    } else if current_page >= total_pages - half_visible {
        start_page = (total_pages - max_visible + 1).max(1);
    }

    (start_page..=end_page).collect()
}
