//! The product collection endpoint.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde_json::Value;
use storefront_core::{refine, Credential, ListEnvelope, ProductRecord};
use tracing::{error, warn};

use crate::api::{json_response, AppState};
use crate::error::{Error, Result};
use crate::upstream::UpstreamError;

/// Handle GET /products?search=<term>
///
/// The search term is lower-cased and forwarded upstream, then re-applied
/// locally so the result has substring semantics whatever the upstream
/// service did with it. Items are written back exactly as the upstream
/// service sent them; only items without a title are dropped. A list
/// payload of the wrong shape degrades to an empty list instead of failing.
pub async fn list(
    state: &AppState,
    search: Option<&str>,
    credential: Option<Credential>,
) -> Result<Response<Full<Bytes>>> {
    let credential = state.authorize(credential)?;
    let search = search.map(str::to_lowercase).filter(|s| !s.is_empty());

    let payload = match state.upstream.list(search.as_deref(), credential.as_ref()).await {
        Ok(payload) => payload,
        Err(UpstreamError::InvalidBody(reason)) => {
            warn!("Upstream product list is not JSON: {}", reason);
            Value::Null
        }
        Err(e) => {
            error!("Failed to fetch products: {}", e);
            return Err(Error::upstream("Failed to fetch products", e));
        }
    };

    let (mut envelope, problems) = ListEnvelope::<ProductRecord>::decode(payload);
    for problem in &problems {
        warn!("Malformed upstream product list: {}", problem);
    }

    if let Some(term) = &search {
        envelope.data = refine(envelope.data, term);
    }

    Ok(json_response(StatusCode::OK, &envelope)?)
}
