use async_trait::async_trait;
use serde_json::Value;
use storefront_core::{Credential, ProductId};

pub mod http;

/// Failures talking to the upstream product service.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream unreachable: {0}")]
    Unreachable(String),

    #[error("upstream returned status {status}")]
    Status {
        status: u16,
        message: Option<String>,
    },

    #[error("upstream sent an invalid body: {0}")]
    InvalidBody(String),
}

impl UpstreamError {
    /// The upstream service's own message if it sent one, else a description
    /// of the failure.
    pub fn message(&self) -> String {
        match self {
            UpstreamError::Status {
                message: Some(message),
                ..
            } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, UpstreamError>;

/// The upstream product service, the system of record for products.
///
/// Each call is exactly one round trip. The credential, when given, is
/// attached to that request only.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// `GET /products`, with `search` as a query parameter when present
    async fn list(&self, search: Option<&str>, credential: Option<&Credential>) -> Result<Value>;

    /// `GET /product?id=<id>`
    async fn get(&self, id: &ProductId, credential: Option<&Credential>) -> Result<Value>;

    /// `POST /product`
    async fn create(&self, payload: Value, credential: Option<&Credential>) -> Result<Value>;

    /// `PUT /product`
    async fn update(&self, payload: Value, credential: Option<&Credential>) -> Result<Value>;

    /// `DELETE /product` with `{ product_id }` as the body
    async fn delete(&self, id: &ProductId, credential: Option<&Credential>) -> Result<Value>;
}
