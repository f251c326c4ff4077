//! Core types for the storefront product gateway.
//!
//! This crate provides the shared data types used by both the storefront
//! gateway and clients that talk to it.
//!
//! # Overview
//!
//! The main types are:
//!
//! - [`Product`] - A product record as served by the upstream service
//! - [`ProductDraft`] - Product fields submitted on create and update
//! - [`ProductRecord`] - An upstream product record passed through untouched
//! - [`ProductId`] - Opaque, upstream-assigned identifier
//! - [`Credential`] - Opaque bearer credential
//! - [`ListEnvelope`] - The `{ data: [...] }` list response
//! - [`ErrorBody`] - The uniform `{ error, details? }` failure envelope
//! - [`Page`] - A paginated window over a list
//!
//! and the search refinement functions [`refine`] and [`matches`], which work
//! on anything [`Searchable`].
//!
//! # Example
//!
//! Listing products through a storefront gateway:
//!
//! ```ignore
//! use storefront_core::{ListEnvelope, Page, Product};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = reqwest::Client::new();
//!
//! let value: serde_json::Value = client
//!     .get("http://localhost:3000/products?search=shirt")
//!     .send()
//!     .await?
//!     .json()
//!     .await?;
//!
//! let (envelope, _problems) = ListEnvelope::<Product>::decode(value);
//! let page = Page::slice(&envelope.data, 1, 5);
//!
//! for product in &page.items {
//!     println!("{}: {}", product.product_id, product.product_title);
//! }
//! # Ok(())
//! # }
//! ```

mod credential;
mod envelope;
mod page;
mod product;
mod search;

pub use credential::Credential;
pub use envelope::{ErrorBody, ListEnvelope, MalformedResponse};
pub use page::Page;
pub use product::{Product, ProductDraft, ProductId, ProductRecord, ValidationError};
pub use search::{matches, refine, Searchable};
