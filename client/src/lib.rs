//! Client-side synchronization for the storefront product list.
//!
//! [`SyncController`] owns what a product list view shows: the fetched
//! items, the search term, the current page and the product under edit. It
//! talks to a storefront gateway through [`ProductApi`] (normally
//! [`GatewayClient`]) and takes its bearer credential from a
//! [`CredentialProvider`] on every call.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use storefront_client::{GatewayClient, StaticCredentials, SyncController, SyncOptions};
//! use storefront_core::{Credential, ProductDraft};
//!
//! let api = Arc::new(GatewayClient::new("http://localhost:3000", None)?);
//! let credentials = Arc::new(StaticCredentials::new(Credential::new(token).unwrap()));
//! let controller = SyncController::new(api, credentials, SyncOptions::default());
//!
//! controller.refresh().await?;
//! controller.create(ProductDraft::new("Red Shirt", 120_000.0)).await?;
//! controller.search("shirt").await?;
//!
//! for product in controller.page_view().items {
//!     println!("{} {}", product.product_title, product.product_price);
//! }
//! ```

pub mod api;
pub mod auth;
pub mod controller;
pub mod error;
pub mod state;

pub use api::{GatewayClient, ProductApi};
pub use auth::{CredentialProvider, StaticCredentials};
pub use controller::{SyncController, SyncOptions};
pub use error::{ClientError, Result};
pub use state::{CollectionState, DeleteRequest, Notice, NoticeKind, Refresh, ViewStatus};
