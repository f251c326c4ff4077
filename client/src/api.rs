use std::time::Duration;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde_json::{json, Value};
use storefront_core::{Credential, ErrorBody, ListEnvelope, Product, ProductDraft, ProductId};
use tracing::{debug, warn};

use crate::error::{ClientError, Result};

/// The gateway's product operations, as seen by a client.
#[async_trait]
pub trait ProductApi: Send + Sync {
    async fn list(&self, search: Option<&str>, credential: Option<&Credential>) -> Result<Vec<Product>>;

    async fn get(&self, id: &ProductId, credential: Option<&Credential>) -> Result<Product>;

    async fn create(&self, draft: &ProductDraft, credential: Option<&Credential>) -> Result<Product>;

    async fn update(&self, product: &Product, credential: Option<&Credential>) -> Result<Product>;

    /// Returns the gateway's acknowledgment as-is.
    async fn delete(&self, id: &ProductId, credential: Option<&Credential>) -> Result<Value>;
}

/// HTTP client for a storefront gateway.
#[derive(Clone)]
pub struct GatewayClient {
    base_url: String,
    client: reqwest::Client,
}

impl GatewayClient {
    /// Create a client for the gateway at `base_url`.
    ///
    /// Without a timeout the transport default applies.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: builder.build()?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(&self, builder: RequestBuilder, credential: Option<&Credential>) -> Result<Value> {
        let builder = match credential {
            Some(credential) => builder.bearer_auth(credential.expose()),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let error = serde_json::from_slice::<ErrorBody>(&body)
                .unwrap_or_else(|_| ErrorBody::new(format!("gateway returned status {}", status)));
            debug!("gateway failure {}: {}", status, error.error);
            return Err(ClientError::Gateway {
                status: status.as_u16(),
                message: error.error,
                details: error.details,
            });
        }

        if body.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl ProductApi for GatewayClient {
    async fn list(&self, search: Option<&str>, credential: Option<&Credential>) -> Result<Vec<Product>> {
        let mut builder = self.client.get(self.url("/products"));
        if let Some(search) = search {
            builder = builder.query(&[("search", search)]);
        }
        let (envelope, problems) = ListEnvelope::<Product>::decode(self.send(builder, credential).await?);
        for problem in &problems {
            warn!("Malformed product list: {}", problem);
        }
        Ok(envelope.data)
    }

    async fn get(&self, id: &ProductId, credential: Option<&Credential>) -> Result<Product> {
        let builder = self
            .client
            .get(self.url("/product"))
            .query(&[("product_id", id.as_str())]);
        Ok(serde_json::from_value(self.send(builder, credential).await?)?)
    }

    async fn create(&self, draft: &ProductDraft, credential: Option<&Credential>) -> Result<Product> {
        let builder = self.client.post(self.url("/product")).json(draft);
        Ok(serde_json::from_value(self.send(builder, credential).await?)?)
    }

    async fn update(&self, product: &Product, credential: Option<&Credential>) -> Result<Product> {
        let builder = self.client.put(self.url("/product")).json(product);
        Ok(serde_json::from_value(self.send(builder, credential).await?)?)
    }

    async fn delete(&self, id: &ProductId, credential: Option<&Credential>) -> Result<Value> {
        let builder = self
            .client
            .delete(self.url("/product"))
            .json(&json!({ "product_id": id }));
        self.send(builder, credential).await
    }
}
