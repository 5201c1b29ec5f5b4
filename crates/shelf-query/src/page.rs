use serde::{Deserialize, Serialize};

/// One page of a list endpoint. Replaces the previous page wholesale; pages
/// are never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl<T> ListResult<T> {
    /// Build a page whose paging flags are derived from the counts. Used when
    /// the server omits them.
    pub fn derived(items: Vec<T>, page_number: u32, page_size: u32, total_count: u64) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            u32::try_from(total_count.div_ceil(u64::from(page_size))).unwrap_or(u32::MAX)
        };
        Self {
            items,
            page_number,
            page_size,
            total_pages,
            total_count,
            has_previous_page: page_number > 1,
            has_next_page: page_number < total_pages,
        }
    }

    pub fn empty(page_size: u32) -> Self {
        Self::derived(Vec::new(), 1, page_size, 0)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paging() {
        let page = ListResult::derived(vec![1, 2, 3], 3, 10, 23);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_previous_page);
        assert!(!page.has_next_page);

        let first = ListResult::derived(vec![0; 10], 1, 10, 23);
        assert!(!first.has_previous_page);
        assert!(first.has_next_page);
    }

    #[test]
    fn page_count_saturates() {
        let page: ListResult<u8> = ListResult::derived(Vec::new(), 1, 1, u64::MAX);
        assert_eq!(page.total_pages, u32::MAX);
        assert!(page.has_next_page);
    }

    #[test]
    fn empty_page() {
        let page: ListResult<u8> = ListResult::empty(10);
        assert_eq!(page.total_pages, 0);
        assert!(!page.has_next_page);
        assert!(page.is_empty());
    }
}
