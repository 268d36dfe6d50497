//! Page-number pagination over in-memory sequences.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// One-based page number actually served.
    pub number: usize,
    pub num_pages: usize,
    pub per_page: usize,
    pub total: usize,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn previous_page_number(&self) -> Option<usize> {
        self.has_previous().then(|| self.number - 1)
    }

    pub fn next_page_number(&self) -> Option<usize> {
        self.has_next().then(|| self.number + 1)
    }

    /// Index of the first item on this page within the full sequence, one-based.
    pub fn start_index(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            (self.number - 1) * self.per_page + 1
        }
    }
}

/// Serve the requested page, clamping anything unusable.
///
/// A missing or non-numeric page yields the first page; a number past the end
/// yields the last one. An empty sequence still has one (empty) page.
pub fn paginate<T: Clone>(items: &[T], per_page: usize, requested: Option<&str>) -> Page<T> {
    let per_page = per_page.max(1);
    let total = items.len();
    let num_pages = total.div_ceil(per_page).max(1);

    let number = requested
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .map(|n| n.clamp(1, num_pages))
        .unwrap_or(1);

    let start = (number - 1) * per_page;
    let end = (start + per_page).min(total);
    let items = items.get(start..end).map(<[T]>::to_vec).unwrap_or_default();

    Page {
        items,
        number,
        num_pages,
        per_page,
        total,
    }
}
