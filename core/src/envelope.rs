use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::product::Product;

/// A list response: `{ ...envelope, data: [T] }`.
///
/// The upstream service may put other fields beside `data` (counts,
/// messages, paging hints). Those are kept in [`ListEnvelope::extra`] and
/// written back out next to the refined `data`.
///
/// Clients decode items as [`Product`]. The gateway decodes them as
/// [`ProductRecord`](crate::ProductRecord) so they pass through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEnvelope<T = Product> {
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

impl<T> Default for ListEnvelope<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Ways a list payload can deviate from `{ data: [Product] }`.
///
/// None of these fail a list: the payload degrades to fewer (or zero)
/// products and the problem is reported to the caller for logging.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedResponse {
    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("payload has no `data` field")]
    MissingData,

    #[error("`data` field is not an array")]
    DataNotArray,

    #[error("item {index} skipped: {reason}")]
    InvalidItem { index: usize, reason: String },
}

impl<T> ListEnvelope<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            extra: Map::new(),
            data,
        }
    }
}

impl<T: DeserializeOwned> ListEnvelope<T> {
    /// Decodes a list payload without ever failing.
    ///
    /// A missing, null or non-array `data` field yields an empty list.
    /// Array items that do not decode as `T` (for example, missing
    /// `product_title`) are skipped. Every deviation is returned alongside
    /// the envelope.
    ///
    /// # Example
    ///
    /// ```
    /// use serde_json::json;
    /// use storefront_core::{ListEnvelope, MalformedResponse, Product};
    ///
    /// let (envelope, problems) = ListEnvelope::<Product>::decode(json!({ "status": "ok" }));
    /// assert!(envelope.data.is_empty());
    /// assert_eq!(envelope.extra["status"], json!("ok"));
    /// assert_eq!(problems, vec![MalformedResponse::MissingData]);
    /// ```
    pub fn decode(value: Value) -> (Self, Vec<MalformedResponse>) {
        let Value::Object(mut extra) = value else {
            return (Self::default(), vec![MalformedResponse::NotAnObject]);
        };

        let mut problems = Vec::new();
        let data = match extra.remove("data") {
            None | Some(Value::Null) => {
                problems.push(MalformedResponse::MissingData);
                Vec::new()
            }
            Some(Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .filter_map(|(index, item)| match serde_json::from_value(item) {
                    Ok(product) => Some(product),
                    Err(e) => {
                        problems.push(MalformedResponse::InvalidItem {
                            index,
                            reason: e.to_string(),
                        });
                        None
                    }
                })
                .collect(),
            Some(_) => {
                problems.push(MalformedResponse::DataNotArray);
                Vec::new()
            }
        };

        (Self { extra, data }, problems)
    }
}

/// The uniform failure envelope: `{ error, details? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable failure message.
    pub error: String,
    /// Further detail, usually the upstream service's own message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Option<String>) -> Self {
        self.details = details;
        self
    }
}
