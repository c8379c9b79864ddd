//! Page-number pagination over ordered listings.

use serde::Serialize;

/// Posts shown per listing page.
pub const POSTS_PER_PAGE: u32 = 10;

/// Splits `total` ordered items into pages of `per_page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    total: u64,
    per_page: u32,
}

/// One resolved page. Numbers are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub number: u64,
    pub num_pages: u64,
    pub per_page: u32,
    pub total: u64,
}

impl Paginator {
    pub fn new(total: u64, per_page: u32) -> Self {
        Self {
            total,
            per_page: per_page.max(1),
        }
    }

    /// An empty listing still has one (empty) page.
    pub fn num_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.per_page)).max(1)
    }

    /// Resolves a raw `?page=` value. Missing or unparsable values give the
    /// first page, values past the end give the last one.
    pub fn get_page(&self, raw: Option<&str>) -> Page {
        let requested = raw
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or(1);
        self.page(requested)
    }

    pub fn page(&self, number: u64) -> Page {
        let num_pages = self.num_pages();
        Page {
            number: number.clamp(1, num_pages),
            num_pages,
            per_page: self.per_page,
            total: self.total,
        }
    }
}

impl Page {
    pub fn offset(&self) -> u64 {
        (self.number - 1) * u64::from(self.per_page)
    }

    pub fn limit(&self) -> u32 {
        self.per_page
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_other_pages(&self) -> bool {
        self.num_pages > 1
    }

    pub fn previous_page_number(&self) -> u64 {
        self.number.saturating_sub(1).max(1)
    }

    pub fn next_page_number(&self) -> u64 {
        (self.number + 1).min(self.num_pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_listing_has_single_page() {
        let page = Paginator::new(0, POSTS_PER_PAGE).get_page(None);
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert_eq!(page.offset(), 0);
        assert!(!page.has_next());
        assert!(!page.has_previous());
    }

    #[test]
    fn invalid_page_number_falls_back_to_first() {
        let paginator = Paginator::new(25, POSTS_PER_PAGE);
        assert_eq!(paginator.get_page(Some("abc")).number, 1);
        assert_eq!(paginator.get_page(Some("")).number, 1);
        assert_eq!(paginator.get_page(Some("-3")).number, 1);
        assert_eq!(paginator.get_page(Some("0")).number, 1);
    }

    #[test]
    fn page_past_end_clamps_to_last() {
        let page = Paginator::new(25, POSTS_PER_PAGE).get_page(Some("99"));
        assert_eq!(page.number, 3);
        assert_eq!(page.offset(), 20);
        assert!(page.has_previous());
        assert!(!page.has_next());
    }

    #[test]
    fn middle_page_navigation() {
        let page = Paginator::new(31, POSTS_PER_PAGE).get_page(Some("2"));
        assert_eq!(page.num_pages, 4);
        assert_eq!(page.previous_page_number(), 1);
        assert_eq!(page.next_page_number(), 3);
        assert_eq!(page.limit(), 10);
        assert!(page.has_other_pages());
    }
}
