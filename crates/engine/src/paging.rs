//! Page types for the lazy list operations.

use crate::{EngineError, ResultEngine};

/// A zero-based page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub size: u64,
}

impl PageRequest {
    pub fn new(page: u64, size: u64) -> Self {
        Self { page, size }
    }

    pub(crate) fn validate(&self) -> ResultEngine<()> {
        if self.size == 0 {
            return Err(EngineError::InvalidValue(
                "page size must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn offset(&self) -> u64 {
        self.page.saturating_mul(self.size)
    }

    /// One extra row is fetched to detect whether another page exists.
    pub(crate) fn fetch_limit(&self) -> u64 {
        self.size.saturating_add(1)
    }
}

/// One page of results.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Builds a page from rows fetched with [`PageRequest::fetch_limit`].
    pub(crate) fn from_rows(mut rows: Vec<T>, request: &PageRequest) -> Self {
        let has_more = rows.len() as u64 > request.size;
        rows.truncate(request.size as usize);
        Self {
            items: rows,
            page: request.page,
            has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_following_page() {
        let request = PageRequest::new(0, 2);
        let page = Page::from_rows(vec![1, 2, 3], &request);

        assert_eq!(page.items, vec![1, 2]);
        assert!(page.has_more);
    }

    #[test]
    fn last_page_has_no_more() {
        let request = PageRequest::new(1, 2);
        let page = Page::from_rows(vec![3], &request);

        assert_eq!(page.items, vec![3]);
        assert!(!page.has_more);
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(PageRequest::new(0, 0).validate().is_err());
    }
}
