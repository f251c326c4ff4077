use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde_json::{json, Value};
use storefront_core::{Credential, ProductId};
use tracing::debug;

use crate::config::UpstreamConfig;
use crate::upstream::{Result, Upstream, UpstreamError};

/// Upstream product service reached over HTTP/JSON.
///
/// Endpoints, relative to the configured base address:
/// ```text
/// GET    {base}/products?search=<term>
/// GET    {base}/product?id=<id>
/// POST   {base}/product
/// PUT    {base}/product
/// DELETE {base}/product
/// ```
pub struct HttpUpstream {
    base_url: String,
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new(config: &UpstreamConfig) -> std::result::Result<Self, reqwest::Error> {
        let mut builder =
            reqwest::Client::builder().user_agent(concat!("storefront/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client: builder.build()?,
        })
    }

    fn request(&self, method: Method, path: &str, credential: Option<&Credential>) -> RequestBuilder {
        let builder = self.client.request(method, format!("{}{}", self.base_url, path));
        match credential {
            Some(credential) => builder.bearer_auth(credential.expose()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Value> {
        let request = builder
            .build()
            .map_err(|e| UpstreamError::Unreachable(e.to_string()))?;
        let method = request.method().clone();
        let path = request.url().path().to_string();

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| UpstreamError::Unreachable(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Unreachable(e.to_string()))?;

        debug!("upstream {} {} -> {} ({} bytes)", method, path, status, body.len());

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        if body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&body).map_err(|e| UpstreamError::InvalidBody(e.to_string()))
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn list(&self, search: Option<&str>, credential: Option<&Credential>) -> Result<Value> {
        let mut builder = self.request(Method::GET, "/products", credential);
        if let Some(search) = search {
            builder = builder.query(&[("search", search)]);
        }
        self.send(builder).await
    }

    async fn get(&self, id: &ProductId, credential: Option<&Credential>) -> Result<Value> {
        let builder = self
            .request(Method::GET, "/product", credential)
            .query(&[("id", id.as_str())]);
        self.send(builder).await
    }

    async fn create(&self, payload: Value, credential: Option<&Credential>) -> Result<Value> {
        let builder = self.request(Method::POST, "/product", credential).json(&payload);
        self.send(builder).await
    }

    async fn update(&self, payload: Value, credential: Option<&Credential>) -> Result<Value> {
        let builder = self.request(Method::PUT, "/product", credential).json(&payload);
        self.send(builder).await
    }

    async fn delete(&self, id: &ProductId, credential: Option<&Credential>) -> Result<Value> {
        let builder = self
            .request(Method::DELETE, "/product", credential)
            .json(&json!({ "product_id": id }));
        self.send(builder).await
    }
}

/// Pulls a human-readable message out of an upstream error body.
fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::to_string)
}
