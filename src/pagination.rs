// Page slicing and the page-number strip under the catalog grid

use serde::Serialize;

pub const CARS_PER_PAGE: usize = 9;
pub const PAGE_WINDOW_DELTA: usize = 2;

/// One entry of the page strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "page")]
pub enum PageMarker {
    Page(usize),
    Gap,
}

/// The `[(page - 1) * page_size, page * page_size)` window of `items`.
/// Pages outside the list (including page 0) yield an empty slice.
pub fn slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total_items.div_ceil(page_size)
}

/// Pages to show around `current`: always the first and last page, every
/// page within `delta` of `current`, and one [`PageMarker::Gap`] wherever
/// the shown pages are not contiguous.
pub fn visible_page_numbers(current: usize, total: usize, delta: usize) -> Vec<PageMarker> {
    let in_window = |page: usize| page + delta >= current && page <= current.saturating_add(delta);
    let pages = (1..=total).filter(|page| *page == 1 || *page == total || in_window(*page));

    let mut markers = Vec::new();
    let mut previous: Option<usize> = None;
    for page in pages {
        if let Some(prev) = previous {
            if page - prev > 1 {
                markers.push(PageMarker::Gap);
            }
        }
        markers.push(PageMarker::Page(page));
        previous = Some(page);
    }
    markers
}

/// Everything the page control needs to render itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageControls {
    pub current: usize,
    pub total_pages: usize,
    /// `false` when there is at most one page; the control is hidden.
    pub enabled: bool,
    pub has_prev: bool,
    pub has_next: bool,
    pub markers: Vec<PageMarker>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
    delta: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(CARS_PER_PAGE)
    }
}

impl Paginator {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            delta: PAGE_WINDOW_DELTA,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page<'a, T>(&self, items: &'a [T], page: usize) -> &'a [T] {
        slice(items, page, self.page_size)
    }

    pub fn total_pages(&self, total_items: usize) -> usize {
        total_pages(total_items, self.page_size)
    }

    pub fn controls(&self, current: usize, total_items: usize) -> PageControls {
        let total = self.total_pages(total_items);
        PageControls {
            current,
            total_pages: total,
            enabled: total > 1,
            has_prev: current > 1,
            has_next: current < total,
            markers: if total > 1 {
                visible_page_numbers(current, total, self.delta)
            } else {
                Vec::new()
            },
        }
    }
}
