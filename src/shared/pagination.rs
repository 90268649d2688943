/// Default page size for list endpoints.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Upper bound for `limit`.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Normalised page request (1-based page, bounded limit)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Paginated response wrapper
#[derive(Debug)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> PaginatedResult<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        let total_pages = total.div_ceil(u64::from(limit.max(1))) as u32;
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }

    /// Slice an already-ordered, fully materialised result set.
    ///
    /// Used after in-process distance filtering, where the database cannot
    /// apply the page window itself.
    pub fn from_vec(all: Vec<T>, page: PageRequest) -> Self {
        let total = all.len() as u64;
        let items = all
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();
        Self::new(items, total, page.page, page.limit)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_is_clamped() {
        assert_eq!(PageRequest::new(Some(0), Some(500)), PageRequest { page: 1, limit: 100 });
        assert_eq!(PageRequest::new(None, Some(0)).limit, 1);
        assert_eq!(PageRequest::new(Some(3), Some(10)).offset(), 20);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page: PaginatedResult<u8> = PaginatedResult::new(vec![], 41, 1, 20);
        assert_eq!(page.total_pages, 3);
        let empty: PaginatedResult<u8> = PaginatedResult::new(vec![], 0, 1, 20);
        assert_eq!(empty.total_pages, 0);
    }

    #[test]
    fn from_vec_slices_requested_window() {
        let page = PaginatedResult::from_vec((1..=25).collect::<Vec<u32>>(), PageRequest::new(Some(2), Some(10)));
        assert_eq!(page.items, (11..=20).collect::<Vec<u32>>());
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages, 3);

        let past_end = PaginatedResult::from_vec(vec![1, 2, 3], PageRequest::new(Some(5), Some(10)));
        assert!(past_end.items.is_empty());
        assert_eq!(past_end.total, 3);
    }
}
