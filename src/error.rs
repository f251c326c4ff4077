use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use storefront_core::ErrorBody;

use crate::api::{json_response, plain_response};
use crate::upstream::UpstreamError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{message}")]
    Upstream {
        message: String,
        details: Option<String>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wraps an upstream failure under an operation-level message.
    pub fn upstream(message: &str, source: UpstreamError) -> Self {
        Error::Upstream {
            message: message.to_string(),
            details: Some(source.message()),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::Upstream { .. } | Error::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_response(self) -> Response<Full<Bytes>> {
        let status = self.status_code();
        let body = match self {
            Error::Upstream { message, details } => ErrorBody::new(message).with_details(details),
            other => ErrorBody::new(other.to_string()),
        };
        json_response(status, &body)
            .unwrap_or_else(|_| plain_response(status, r#"{"error":"Internal error"}"#))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
