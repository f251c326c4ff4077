use serde::{Deserialize, Serialize};

/// A window over a list of items.
///
/// Clients page through a fully fetched product list locally; building a
/// page is a pure operation that never touches the network.
///
/// # Example
///
/// ```
/// use storefront_core::Page;
///
/// let items: Vec<u32> = (1..=12).collect();
/// let page = Page::slice(&items, 3, 5);
///
/// assert_eq!(page.items, vec![11, 12]);
/// assert_eq!(page.total, 12);
/// assert_eq!(page.total_pages, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// The items in this page.
    pub items: Vec<T>,
    /// Total number of items across all pages.
    pub total: u32,
    /// Current page number (1-indexed).
    pub page: u32,
    /// Number of items per page.
    pub per_page: u32,
    /// Total number of pages. At least 1, even for an empty list.
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Creates a page from already-sliced items.
    ///
    /// Automatically calculates `total_pages` from `total` and `per_page`.
    pub fn new(items: Vec<T>, total: u32, page: u32, per_page: u32) -> Self {
        let per_page = per_page.max(1);
        let total_pages = if total == 0 {
            1
        } else {
            total.div_ceil(per_page)
        };
        Self {
            items,
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

impl<T: Clone> Page<T> {
    /// Cuts page `page` (1-indexed) of size `per_page` out of `items`.
    ///
    /// A page past the end is empty rather than an error.
    pub fn slice(items: &[T], page: u32, per_page: u32) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let start = (page as usize - 1).saturating_mul(per_page as usize);
        let window = items
            .iter()
            .skip(start)
            .take(per_page as usize)
            .cloned()
            .collect();
        let total = u32::try_from(items.len()).unwrap_or(u32::MAX);
        Self::new(window, total, page, per_page)
    }
}
