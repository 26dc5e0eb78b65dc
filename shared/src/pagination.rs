//! Pagination cursor and the page-button window shown under the results.

use serde::Serialize;

use crate::models::SearchResponse;

/// Maximum numbered buttons in the window around the current page.
pub const WINDOW_SIZE: u32 = 7;

/// Pagination cursor mirrored from the last search response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationState {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl PaginationState {
    pub fn new(per_page: u32) -> Self {
        Self {
            page: 1,
            per_page,
            total: 0,
            total_pages: 0,
        }
    }

    /// Back to the first page; used whenever the query or filters change.
    pub fn reset(&mut self) {
        self.page = 1;
    }

    /// Clamp a requested page into `[1, total_pages]`.
    pub fn clamp(&self, requested: u32) -> u32 {
        requested.clamp(1, self.total_pages.max(1))
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Merge totals from a completed search.
    pub fn apply(&mut self, response: &SearchResponse) {
        self.total = response.total;
        self.total_pages = response.total_pages;
        if response.page >= 1 {
            self.page = response.page;
        }
    }

    /// Render model for the controls, or `None` when everything fits on one page.
    pub fn model(&self) -> Option<PaginationModel> {
        PaginationModel::build(self.page, self.total_pages)
    }
}

/// One element of the pagination bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageItem {
    /// Numbered button inside the window
    Page { number: u32, current: bool },
    /// Jump to the first or last page when the window does not reach that edge
    Jump { number: u32 },
    Ellipsis,
}

/// Render model for the pagination bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationModel {
    pub page: u32,
    pub total_pages: u32,
    pub previous_enabled: bool,
    pub next_enabled: bool,
    pub items: Vec<PageItem>,
}

impl PaginationModel {
    pub fn build(page: u32, total_pages: u32) -> Option<Self> {
        if total_pages <= 1 {
            return None;
        }
        let page = page.clamp(1, total_pages);
        let (start, end) = window(page, total_pages);

        let mut items = Vec::new();
        if start > 1 {
            items.push(PageItem::Jump { number: 1 });
            if start > 2 {
                items.push(PageItem::Ellipsis);
            }
        }
        items.extend((start..=end).map(|number| PageItem::Page {
            number,
            current: number == page,
        }));
        if end < total_pages {
            if end < total_pages - 1 {
                items.push(PageItem::Ellipsis);
            }
            items.push(PageItem::Jump { number: total_pages });
        }

        Some(Self {
            page,
            total_pages,
            previous_enabled: page > 1,
            next_enabled: page < total_pages,
            items,
        })
    }

    /// Numbered window buttons only.
    pub fn window_pages(&self) -> Vec<u32> {
        self.items
            .iter()
            .filter_map(|item| match item {
                PageItem::Page { number, .. } => Some(*number),
                _ => None,
            })
            .collect()
    }
}

/// Window centred on `page`, shifted to stay within `[1, total_pages]`.
fn window(page: u32, total_pages: u32) -> (u32, u32) {
    let mut start = page.saturating_sub(WINDOW_SIZE / 2).max(1);
    let end = (start + WINDOW_SIZE - 1).min(total_pages);
    if end - start + 1 < WINDOW_SIZE {
        start = end.saturating_sub(WINDOW_SIZE - 1).max(1);
    }
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_page_has_no_controls() {
        assert!(PaginationModel::build(1, 1).is_none());
        assert!(PaginationModel::build(1, 0).is_none());
    }

    #[test]
    fn test_window_stays_in_range() {
        for total_pages in 2..40 {
            for page in 1..=total_pages {
                let model = PaginationModel::build(page, total_pages).unwrap();
                let pages = model.window_pages();
                assert!(pages.contains(&page), "page {} of {}", page, total_pages);
                assert!(pages.len() as u32 <= WINDOW_SIZE);
                assert!(pages.iter().all(|p| (1..=total_pages).contains(p)));
                assert_eq!(model.previous_enabled, page > 1);
                assert_eq!(model.next_enabled, page < total_pages);
            }
        }
    }

    #[test]
    fn test_middle_page_shows_both_edges() {
        let model = PaginationModel::build(10, 20).unwrap();
        assert_eq!(model.window_pages(), vec![7, 8, 9, 10, 11, 12, 13]);
        assert_eq!(model.items.first(), Some(&PageItem::Jump { number: 1 }));
        assert_eq!(model.items[1], PageItem::Ellipsis);
        assert_eq!(model.items.last(), Some(&PageItem::Jump { number: 20 }));
    }

    #[test]
    fn test_window_clamped_at_edges() {
        let first = PaginationModel::build(1, 20).unwrap();
        assert_eq!(first.window_pages(), vec![1, 2, 3, 4, 5, 6, 7]);
        assert!(!first.items.contains(&PageItem::Jump { number: 1 }));

        let last = PaginationModel::build(20, 20).unwrap();
        assert_eq!(last.window_pages(), vec![14, 15, 16, 17, 18, 19, 20]);

        // Window ends one short of the edge: jump button, no ellipsis.
        let near = PaginationModel::build(4, 8).unwrap();
        assert_eq!(near.window_pages(), vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(
            &near.items[7..],
            &[PageItem::Jump { number: 8 }]
        );
    }

    #[test]
    fn test_clamp_and_apply() {
        let mut state = PaginationState::new(50);
        let response = SearchResponse {
            total: 120,
            total_pages: 3,
            page: 2,
            ..SearchResponse::default()
        };
        state.apply(&response);
        assert_eq!(state.page, 2);
        assert_eq!(state.clamp(0), 1);
        assert_eq!(state.clamp(9), 3);
        state.reset();
        assert_eq!(state.page, 1);
    }
}
