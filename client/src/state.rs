use storefront_core::{Page, Product, ProductId};

/// Where the list view is in its fetch cycle.
///
/// `Idle` only before the first fetch. Every fetch or mutation moves to
/// `Loading`, and from there to `Ready` or `Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewStatus {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// What the product list view displays.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionState {
    /// The last fetched list, already filtered by `search_term`.
    pub items: Vec<Product>,
    pub search_term: String,
    /// Current page, 1-indexed.
    pub page: u32,
    pub page_size: u32,
    /// The product being edited, if any.
    pub selected: Option<Product>,
    pub status: ViewStatus,
}

impl CollectionState {
    pub fn new(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            search_term: String::new(),
            page: 1,
            page_size: page_size.max(1),
            selected: None,
            status: ViewStatus::Idle,
        }
    }

    /// The slice of `items` on the current page.
    pub fn page_view(&self) -> Page<Product> {
        Page::slice(&self.items, self.page, self.page_size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A transient message for the user, e.g. a toast after a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

/// A delete waiting for the user's confirmation.
///
/// Dropping it without calling
/// [`SyncController::confirm_delete`](crate::SyncController::confirm_delete)
/// cancels the delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub product_id: ProductId,
    pub product_title: String,
}

impl DeleteRequest {
    /// The question to put to the user.
    pub fn prompt(&self) -> String {
        format!(
            "Are you sure to delete this product name: {} ?",
            self.product_title
        )
    }
}

/// Outcome of a list fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// The response was the newest one and replaced the items.
    Applied,
    /// A newer fetch was issued while this one was in flight; its response
    /// was dropped.
    Superseded,
}
