//! Search refinement: a case-insensitive substring filter over products.
//!
//! Upstream search support may be partial or missing, so the gateway
//! re-applies the filter to whatever the upstream service returned.

use crate::product::{Product, ProductRecord};

/// The text fields a search term is matched against.
pub trait Searchable {
    fn title(&self) -> &str;
    fn description(&self) -> Option<&str>;
    fn category(&self) -> Option<&str>;
}

impl Searchable for Product {
    fn title(&self) -> &str {
        &self.product_title
    }

    fn description(&self) -> Option<&str> {
        self.product_description.as_deref()
    }

    fn category(&self) -> Option<&str> {
        self.product_category.as_deref()
    }
}

impl Searchable for ProductRecord {
    fn title(&self) -> &str {
        self.text("product_title").unwrap_or_default()
    }

    fn description(&self) -> Option<&str> {
        self.text("product_description")
    }

    fn category(&self) -> Option<&str> {
        self.text("product_category")
    }
}

/// Returns true when `term` occurs in the item's title, description or
/// category, ignoring case. An empty term matches everything.
pub fn matches<T: Searchable + ?Sized>(item: &T, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    contains(item.title(), &needle)
        || item.description().is_some_and(|d| contains(d, &needle))
        || item.category().is_some_and(|c| contains(c, &needle))
}

/// Keeps the items matching `term`, in their original order.
///
/// An empty term returns the input unchanged.
///
/// # Example
///
/// ```
/// use storefront_core::{refine, ProductDraft, ProductId};
///
/// let products: Vec<_> = ["Red Shirt", "Blue Pants", "Shirt Case"]
///     .iter()
///     .enumerate()
///     .map(|(i, title)| {
///         ProductDraft::new(*title, 10.0).with_id(ProductId::parse(i.to_string()).unwrap())
///     })
///     .collect();
///
/// let titles: Vec<_> = refine(products, "shirt")
///     .into_iter()
///     .map(|p| p.product_title)
///     .collect();
/// assert_eq!(titles, ["Red Shirt", "Shirt Case"]);
/// ```
pub fn refine<T: Searchable>(items: Vec<T>, term: &str) -> Vec<T> {
    if term.is_empty() {
        return items;
    }
    items.into_iter().filter(|item| matches(item, term)).collect()
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
