//! Product catalog gateway.
//!
//! Receives product list/get/create/update/delete requests, forwards them to
//! the upstream product service with the caller's bearer credential, and
//! maps the results to uniform JSON responses. List results are re-filtered
//! locally with [`storefront_core::refine`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use storefront::api::{self, AppState, Gateway};
//! use storefront::config::UpstreamConfig;
//! use storefront::upstream::http::HttpUpstream;
//!
//! let upstream = Arc::new(HttpUpstream::new(&UpstreamConfig::default())?);
//! let gateway = Arc::new(Gateway::new(AppState::new(upstream))?);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! api::serve(listener, gateway).await?;
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod upstream;

pub use api::{AppState, Gateway};
pub use error::{Error, Result};
pub use upstream::http::HttpUpstream;
pub use upstream::{Upstream, UpstreamError};
