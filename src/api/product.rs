//! Single-product endpoints: get, create, update and delete.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde_json::Value;
use storefront_core::{Credential, ProductId};
use tracing::error;

use crate::api::{json_response, AppState};
use crate::error::{Error, Result};

/// Handle GET /product?product_id=<id>
pub async fn get(
    state: &AppState,
    product_id: Option<&str>,
    credential: Option<Credential>,
) -> Result<Response<Full<Bytes>>> {
    let credential = state.authorize(credential)?;
    let id = product_id.and_then(ProductId::parse).ok_or_else(missing_id)?;

    let product = state
        .upstream
        .get(&id, credential.as_ref())
        .await
        .map_err(|e| {
            error!("Error fetching product {}: {}", id, e);
            Error::upstream("Failed to fetch product", e)
        })?;

    Ok(json_response(StatusCode::OK, &product)?)
}

/// Handle POST /product
///
/// The body is forwarded as-is; the upstream service validates the fields.
pub async fn create(
    state: &AppState,
    body: &[u8],
    credential: Option<Credential>,
) -> Result<Response<Full<Bytes>>> {
    let credential = state.authorize(credential)?;
    let payload = parse_body(body)?;

    let product = state
        .upstream
        .create(payload, credential.as_ref())
        .await
        .map_err(|e| {
            error!("Error creating product: {}", e);
            Error::upstream("Failed to create product", e)
        })?;

    Ok(json_response(StatusCode::OK, &product)?)
}

/// Handle PUT /product
pub async fn update(
    state: &AppState,
    body: &[u8],
    credential: Option<Credential>,
) -> Result<Response<Full<Bytes>>> {
    let credential = state.authorize(credential)?;
    let payload = parse_body(body)?;

    let product = state
        .upstream
        .update(payload, credential.as_ref())
        .await
        .map_err(|e| {
            error!("Error updating product: {}", e);
            Error::upstream("Failed to update product", e)
        })?;

    Ok(json_response(StatusCode::OK, &product)?)
}

/// Handle DELETE /product with `{ "product_id": <id> }`
pub async fn delete(
    state: &AppState,
    body: &[u8],
    credential: Option<Credential>,
) -> Result<Response<Full<Bytes>>> {
    let credential = state.authorize(credential)?;
    let payload = if body.is_empty() {
        Value::Null
    } else {
        parse_body(body)?
    };
    let id = id_from_body(&payload).ok_or_else(missing_id)?;

    let ack = state
        .upstream
        .delete(&id, credential.as_ref())
        .await
        .map_err(|e| {
            error!("Error deleting product {}: {}", id, e);
            Error::upstream("Failed to delete product", e)
        })?;

    Ok(json_response(StatusCode::OK, &ack)?)
}

fn missing_id() -> Error {
    Error::BadRequest("Missing id".to_string())
}

fn parse_body(body: &[u8]) -> Result<Value> {
    if body.is_empty() {
        return Err(Error::BadRequest("Request body must be JSON".to_string()));
    }
    serde_json::from_slice(body).map_err(|e| Error::BadRequest(format!("Invalid JSON body: {}", e)))
}

/// Reads `product_id` from a delete body, keeping its JSON form so the
/// upstream service receives the id exactly as the caller sent it.
fn id_from_body(payload: &Value) -> Option<ProductId> {
    let id: ProductId = serde_json::from_value(payload.get("product_id")?.clone()).ok()?;
    (!id.as_str().is_empty()).then_some(id)
}
