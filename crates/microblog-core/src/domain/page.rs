use serde::Serialize;

use crate::error::DomainError;

/// Upper bound on page size accepted from callers.
pub const MAX_PER_PAGE: u64 = 100;

/// A validated, 1-indexed page request.
///
/// Non-positive page numbers are clamped to the first page, matching how the
/// web layer treats a missing or malformed `page` parameter. A zero or
/// oversized page size is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    per_page: u64,
}

impl PageRequest {
    pub fn new(page: i64, per_page: u64) -> Result<Self, DomainError> {
        if per_page == 0 || per_page > MAX_PER_PAGE {
            return Err(DomainError::InvalidArgument(format!(
                "Page size must be between 1 and {}",
                MAX_PER_PAGE
            )));
        }

        Ok(Self {
            page: u64::try_from(page).unwrap_or(0).max(1),
            per_page,
        })
    }

    pub fn first(per_page: u64) -> Result<Self, DomainError> {
        Self::new(1, per_page)
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Number of items that precede this page.
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    /// Cut this page out of an already ordered sequence.
    pub fn slice<T: Clone>(&self, ordered: &[T]) -> Page<T> {
        let total = ordered.len() as u64;
        let start = usize::try_from(self.offset()).unwrap_or(usize::MAX).min(ordered.len());
        let end = start
            .saturating_add(self.per_page as usize)
            .min(ordered.len());
        Page::new(ordered[start..end].to_vec(), *self, total)
    }
}

/// A bounded slice of an ordered sequence with next/prev existence flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        let offset = request.offset();
        Self {
            has_next: offset.saturating_add(items.len() as u64) < total,
            has_prev: offset > 0 && total > 0,
            page: request.page,
            per_page: request.per_page,
            total,
            items,
        }
    }

    pub fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), request, 0)
    }

    pub fn next_num(&self) -> Option<u64> {
        self.has_next.then(|| self.page + 1)
    }

    pub fn prev_num(&self) -> Option<u64> {
        self.has_prev.then(|| self.page - 1)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            has_next: self.has_next,
            has_prev: self.has_prev,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_positive_page_is_clamped() {
        assert_eq!(PageRequest::new(0, 10).unwrap().page(), 1);
        assert_eq!(PageRequest::new(-7, 10).unwrap().page(), 1);
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        assert!(matches!(
            PageRequest::new(1, 0),
            Err(DomainError::InvalidArgument(_))
        ));
        assert!(PageRequest::new(1, MAX_PER_PAGE + 1).is_err());
    }

    #[test]
    fn test_pages_concatenate_to_whole_sequence() {
        let items: Vec<u32> = (0..7).collect();
        let mut seen = Vec::new();
        let mut page = 1;
        loop {
            let p = PageRequest::new(page, 3).unwrap().slice(&items);
            assert_eq!(p.has_prev, page > 1);
            seen.extend(p.items.iter().copied());
            if !p.has_next {
                break;
            }
            page += 1;
        }
        assert_eq!(page, 3);
        assert_eq!(seen, items);
    }

    #[test]
    fn test_page_beyond_last_is_empty() {
        let items = vec![1, 2, 3];
        let p = PageRequest::new(5, 2).unwrap().slice(&items);
        assert!(p.items.is_empty());
        assert!(!p.has_next);
        assert!(p.has_prev);
        assert_eq!(p.next_num(), None);
        assert_eq!(p.prev_num(), Some(4));
    }

    #[test]
    fn test_empty_sequence_has_no_neighbours() {
        let p: Page<u8> = PageRequest::new(2, 5).unwrap().slice(&[]);
        assert!(!p.has_next);
        assert!(!p.has_prev);
    }

    #[test]
    fn test_map_keeps_flags() {
        let p = PageRequest::new(1, 2).unwrap().slice(&[1, 2, 3]);
        let mapped = p.map(|n| n * 10);
        assert_eq!(mapped.items, vec![10, 20]);
        assert!(mapped.has_next);
        assert_eq!(mapped.total, 3);
    }
}
