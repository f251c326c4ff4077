use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

use crate::api::json_response;
use crate::error::Result;

/// Health check response
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Handle GET /health
pub fn health() -> Result<Response<Full<Bytes>>> {
    let response = HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    };

    Ok(json_response(StatusCode::OK, &response)?)
}
