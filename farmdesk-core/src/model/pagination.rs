//! ``src/model/pagination.rs``
//! ============================================================================
//! # Pagination stage
//!
//! 1-based page index, always clamped to `[1, total_pages]` where
//! `total_pages = max(1, ceil(total / size))`. Explicit navigation outside
//! that range is rejected and leaves the state untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ListError, ListResult};

/// Enumerated page sizes offered by the page-size selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub enum PageSize {
    #[default]
    Ten,
    TwentyFive,
    Fifty,
    Hundred,
}

impl PageSize {
    pub const ALL: [Self; 4] = [Self::Ten, Self::TwentyFive, Self::Fifty, Self::Hundred];

    #[must_use]
    pub const fn get(self) -> usize {
        match self {
            Self::Ten => 10,
            Self::TwentyFive => 25,
            Self::Fifty => 50,
            Self::Hundred => 100,
        }
    }
}

impl TryFrom<usize> for PageSize {
    type Error = ListError;

    fn try_from(value: usize) -> ListResult<Self> {
        Self::ALL
            .into_iter()
            .find(|size| size.get() == value)
            .ok_or_else(|| {
                ListError::validation("page_size", format!("{value} is not one of 10, 25, 50, 100"))
            })
    }
}

impl From<PageSize> for usize {
    fn from(size: PageSize) -> Self {
        size.get()
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

/// Summary of the current page for the footer ("Showing 21-25 of 25").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    /// 1-based index of the first row on the page, 0 when empty.
    pub first_item: usize,
    /// 1-based index of the last row on the page, 0 when empty.
    pub last_item: usize,
}

impl PageInfo {
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    size: PageSize,
    page: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(PageSize::default())
    }
}

impl Pagination {
    #[must_use]
    pub const fn new(size: PageSize) -> Self {
        Self { size, page: 1 }
    }

    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    #[must_use]
    pub const fn size(&self) -> PageSize {
        self.size
    }

    /// `max(1, ceil(total / size))`
    #[must_use]
    pub const fn total_pages(&self, total: usize) -> usize {
        let pages = total.div_ceil(self.size.get());
        if pages == 0 { 1 } else { pages }
    }

    /// Re-clamp the page index after the filtered count changed. Returns
    /// true if the index moved.
    pub fn clamp(&mut self, total: usize) -> bool {
        let clamped = self.page.clamp(1, self.total_pages(total));
        let moved = clamped != self.page;
        self.page = clamped;
        moved
    }

    /// Explicit page navigation.
    ///
    /// # Errors
    /// `ListError::PageOutOfRange` when `page` is outside `[1, total_pages]`;
    /// the current page is kept.
    pub fn go_to(&mut self, page: usize, total: usize) -> ListResult<()> {
        let total_pages = self.total_pages(total);
        if page == 0 || page > total_pages {
            return Err(ListError::PageOutOfRange {
                requested: page,
                total_pages,
            });
        }
        self.page = page;
        Ok(())
    }

    /// Returns true if the page changed.
    pub fn next(&mut self, total: usize) -> bool {
        self.go_to(self.page + 1, total).is_ok()
    }

    /// Returns true if the page changed.
    pub fn previous(&mut self, total: usize) -> bool {
        self.page > 1 && self.go_to(self.page - 1, total).is_ok()
    }

    pub fn first(&mut self) {
        self.page = 1;
    }

    pub fn last(&mut self, total: usize) {
        self.page = self.total_pages(total);
    }

    /// Change the page size and re-clamp so the index stays in range.
    pub fn set_size(&mut self, size: PageSize, total: usize) {
        self.size = size;
        self.clamp(total);
    }

    /// Bounds of the current page within a sequence of `total` items.
    #[must_use]
    pub fn range(&self, total: usize) -> std::ops::Range<usize> {
        let page = self.page.clamp(1, self.total_pages(total));
        let start = ((page - 1) * self.size.get()).min(total);
        let end = (start + self.size.get()).min(total);
        start..end
    }

    /// Slice `items` down to the current page.
    #[must_use]
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.range(items.len())]
    }

    #[must_use]
    pub fn info(&self, total: usize) -> PageInfo {
        let range = self.range(total);
        let (first_item, last_item) = if range.is_empty() {
            (0, 0)
        } else {
            (range.start + 1, range.end)
        };
        PageInfo {
            page: self.page.clamp(1, self.total_pages(total)),
            page_size: self.size.get(),
            total_items: total,
            total_pages: self.total_pages(total),
            first_item,
            last_item,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn third_page_of_twenty_five_items() {
        let items: Vec<usize> = (1..=25).collect();
        let mut pagination = Pagination::new(PageSize::Ten);
        pagination.go_to(3, items.len()).expect("page 3 exists");

        assert_eq!(pagination.total_pages(items.len()), 3);
        assert_eq!(pagination.slice(&items), &[21, 22, 23, 24, 25]);

        let info = pagination.info(items.len());
        assert_eq!((info.first_item, info.last_item), (21, 25));
        assert!(!info.has_next());
        assert!(info.has_previous());
    }

    #[test]
    fn total_pages_is_at_least_one() {
        let pagination = Pagination::default();
        assert_eq!(pagination.total_pages(0), 1);
        assert_eq!(pagination.total_pages(10), 1);
        assert_eq!(pagination.total_pages(11), 2);
        assert!(pagination.slice::<u8>(&[]).is_empty());
        assert_eq!(pagination.info(0).first_item, 0);
    }

    #[test]
    fn out_of_range_navigation_is_rejected() {
        let mut pagination = Pagination::new(PageSize::Ten);
        pagination.go_to(2, 25).expect("page 2 exists");

        let err = pagination.go_to(4, 25).expect_err("only 3 pages");
        assert!(matches!(
            err,
            ListError::PageOutOfRange {
                requested: 4,
                total_pages: 3
            }
        ));
        assert!(pagination.go_to(0, 25).is_err());
        assert_eq!(pagination.page(), 2);
    }

    #[test]
    fn page_size_change_reclamps() {
        let mut pagination = Pagination::new(PageSize::Ten);
        pagination.go_to(3, 25).expect("page 3 exists");
        pagination.set_size(PageSize::TwentyFive, 25);
        assert_eq!(pagination.page(), 1);
    }

    #[test]
    fn clamp_holds_for_every_size_and_count() {
        for size in PageSize::ALL {
            for total in [0usize, 1, 9, 10, 11, 99, 100, 101, 250] {
                let mut pagination = Pagination::new(size);
                pagination.last(1000);
                pagination.clamp(total);
                let pages = pagination.total_pages(total);
                assert_eq!(pages, total.div_ceil(size.get()).max(1));
                assert!((1..=pages).contains(&pagination.page()));
            }
        }
    }

    #[test]
    fn next_and_previous_stop_at_bounds() {
        let mut pagination = Pagination::new(PageSize::Ten);
        assert!(!pagination.previous(15));
        assert!(pagination.next(15));
        assert!(!pagination.next(15));
        assert_eq!(pagination.page(), 2);
        assert!(pagination.previous(15));
    }

    #[test]
    fn page_size_parses_only_enumerated_values() {
        assert_eq!(PageSize::try_from(50).ok(), Some(PageSize::Fifty));
        assert!(PageSize::try_from(30).is_err());
        assert_eq!(usize::from(PageSize::Hundred), 100);
    }
}
