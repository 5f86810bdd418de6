//! Pagination state and paged responses.
//!
//! `PageQuery` is the client-side state behind a paginated table (page,
//! page size, search text) and renders to query parameters. `Page<T>` is a
//! decoded page; servers that return a bare array are paged client-side.

use serde::{Deserialize, Serialize};

/// Default number of rows per page
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound accepted by the backend for `limit`
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    /// 1-based page number
    pub page: u32,
    pub limit: u32,
    pub search: String,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self::with_limit(DEFAULT_PAGE_SIZE)
    }
}

impl PageQuery {
    pub fn with_limit(limit: u32) -> Self {
        Self {
            page: 1,
            limit: limit.clamp(1, MAX_PAGE_SIZE),
            search: String::new(),
        }
    }

    /// Advance one page, staying within `total_pages`
    pub fn next(&mut self, total_pages: u32) -> bool {
        if self.page < total_pages {
            self.page += 1;
            true
        } else {
            false
        }
    }

    pub fn prev(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    pub fn first(&mut self) {
        self.page = 1;
    }

    /// Change the search text; a new search always starts on page 1
    pub fn set_search(&mut self, search: &str) {
        let trimmed = search.trim();
        if trimmed != self.search {
            self.search = trimmed.to_string();
            self.page = 1;
        }
    }

    pub fn set_limit(&mut self, limit: u32) {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        if limit != self.limit {
            self.limit = limit;
            self.page = 1;
        }
    }

    /// Index of the first row on this page
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.limit as usize
    }

    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if !self.search.is_empty() {
            pairs.push(("search", self.search.clone()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u32 {
        if self.total == 0 || self.limit == 0 {
            return 1;
        }
        self.total.div_ceil(u64::from(self.limit)).max(1) as u32
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Page a complete list client-side
    pub fn from_all(all: Vec<T>, query: &PageQuery) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(query.offset())
            .take(query.limit as usize)
            .collect();
        Page {
            items,
            total,
            page: query.page,
            limit: query.limit,
        }
    }

    /// "11-20 of 45"
    pub fn range_label(&self) -> String {
        if self.items.is_empty() {
            return format!("0 of {}", self.total);
        }
        let start = u64::from(self.page.saturating_sub(1)) * u64::from(self.limit) + 1;
        let end = start + self.items.len() as u64 - 1;
        format!("{}-{} of {}", start, end, self.total)
    }
}

/// Wire shapes accepted for list endpoints.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum PageResponse<T> {
    Bare(Vec<T>),
    Paged {
        #[serde(alias = "items", alias = "results")]
        data: Vec<T>,
        total: Option<u64>,
        page: Option<u32>,
        limit: Option<u32>,
    },
}

impl<T> PageResponse<T> {
    pub(crate) fn into_page(self, query: &PageQuery) -> Page<T> {
        match self {
            PageResponse::Paged {
                data,
                total,
                page,
                limit,
            } => Page {
                total: total.unwrap_or(data.len() as u64),
                page: page.unwrap_or(query.page),
                limit: limit.unwrap_or(query.limit),
                items: data,
            },
            PageResponse::Bare(all) => Page::from_all(all, query),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs_omit_empty_search() {
        let q = PageQuery::default();
        assert_eq!(q.to_pairs(), vec![("page", "1".to_string()), ("limit", "10".to_string())]);
    }

    #[test]
    fn test_search_resets_page() {
        let mut q = PageQuery::default();
        q.page = 4;
        q.set_search("  ali ");
        assert_eq!(q.page, 1);
        assert_eq!(q.search, "ali");
        assert!(q.to_pairs().contains(&("search", "ali".to_string())));

        // Same search text keeps the page
        q.page = 3;
        q.set_search("ali");
        assert_eq!(q.page, 3);
    }

    #[test]
    fn test_limit_clamped_and_resets_page() {
        let mut q = PageQuery::default();
        q.page = 2;
        q.set_limit(500);
        assert_eq!(q.limit, MAX_PAGE_SIZE);
        assert_eq!(q.page, 1);
        q.set_limit(0);
        assert_eq!(q.limit, 1);
    }

    #[test]
    fn test_next_prev_bounds() {
        let mut q = PageQuery::default();
        assert!(!q.prev());
        assert!(q.next(3));
        assert!(q.next(3));
        assert!(!q.next(3));
        assert_eq!(q.page, 3);
        assert!(q.prev());
        assert_eq!(q.page, 2);
        q.first();
        assert_eq!(q.page, 1);
    }

    #[test]
    fn test_total_pages() {
        let mut page: Page<u8> = Page { items: vec![], total: 0, page: 1, limit: 10 };
        assert_eq!(page.total_pages(), 1);
        page.total = 10;
        assert_eq!(page.total_pages(), 1);
        page.total = 11;
        assert_eq!(page.total_pages(), 2);
        page.total = 45;
        assert_eq!(page.total_pages(), 5);
    }

    #[test]
    fn test_range_label() {
        let page = Page { items: vec![1u8; 10], total: 45, page: 2, limit: 10 };
        assert_eq!(page.range_label(), "11-20 of 45");
        let last = Page { items: vec![1u8; 5], total: 45, page: 5, limit: 10 };
        assert_eq!(last.range_label(), "41-45 of 45");
        assert!(!last.has_next());
        assert!(last.has_prev());
        let empty: Page<u8> = Page::default();
        assert_eq!(empty.range_label(), "0 of 0");
    }

    #[test]
    fn test_paged_response_shapes() {
        let q = PageQuery::default();
        let paged: PageResponse<u32> =
            serde_json::from_str(r#"{"data":[1,2,3],"total":23,"page":2,"limit":3}"#).unwrap();
        let page = paged.into_page(&q);
        assert_eq!(page.items, vec![1, 2, 3]);
        assert_eq!(page.total, 23);
        assert_eq!(page.page, 2);

        let items: PageResponse<u32> = serde_json::from_str(r#"{"items":[4,5]}"#).unwrap();
        let page = items.into_page(&q);
        assert_eq!(page.items, vec![4, 5]);
        assert_eq!(page.total, 2);
        assert_eq!(page.page, 1);
    }

    #[test]
    fn test_bare_array_paged_client_side() {
        let mut q = PageQuery::with_limit(2);
        q.page = 2;
        let bare: PageResponse<u32> = serde_json::from_str("[1,2,3,4,5]").unwrap();
        let page = bare.into_page(&q);
        assert_eq!(page.items, vec![3, 4]);
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages(), 3);
    }
}
