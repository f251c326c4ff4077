use storefront_core::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The gateway answered with a failure envelope.
    #[error("{message}")]
    Gateway {
        status: u16,
        message: String,
        details: Option<String>,
    },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("no product selected")]
    NothingSelected,

    #[error("authentication error: {0}")]
    Auth(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
