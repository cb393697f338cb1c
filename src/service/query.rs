use serde::Serialize;

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually returned
    pub page: usize,
    pub page_count: usize,
    pub total: usize,
}

impl<T> Page<T> {
    /// Cut `page` (1-based) out of `items`
    ///
    /// Page numbers past the end clamp to the last page; an empty listing
    /// yields a single empty page.
    #[must_use]
    pub fn paginate(items: Vec<T>, page: usize, size: usize) -> Self {
        let size = size.max(1);
        let total = items.len();
        let page_count = total.div_ceil(size).max(1);
        let page = page.clamp(1, page_count);

        let items = items.into_iter().skip((page - 1) * size).take(size).collect();

        Self {
            items,
            page,
            page_count,
            total,
        }
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.page_count
    }
}
