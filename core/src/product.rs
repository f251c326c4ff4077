use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};

/// Opaque product identifier assigned by the upstream service.
///
/// Upstream services are free to use numeric or textual ids, so both are
/// accepted when decoding. The id keeps the JSON form it arrived in and is
/// written back out the same way, so a numeric id stays a number.
///
/// # Example
///
/// ```
/// use storefront_core::ProductId;
///
/// let id: ProductId = serde_json::from_str("42").unwrap();
/// assert_eq!(id.as_str(), "42");
/// assert_eq!(serde_json::to_string(&id).unwrap(), "42");
///
/// let id: ProductId = serde_json::from_str("\"sku-7\"").unwrap();
/// assert_eq!(id.to_string(), "sku-7");
/// assert_eq!(serde_json::to_string(&id).unwrap(), "\"sku-7\"");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductId {
    text: String,
    number: Option<Number>,
}

impl ProductId {
    /// Wraps a non-empty textual identifier. Returns `None` for an empty string.
    pub fn parse(id: impl Into<String>) -> Option<Self> {
        let text = id.into();
        if text.is_empty() {
            None
        } else {
            Some(Self { text, number: None })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True when the id was a JSON number.
    pub fn is_numeric(&self) -> bool {
        self.number.is_some()
    }
}

impl From<u64> for ProductId {
    fn from(id: u64) -> Self {
        Self {
            text: id.to_string(),
            number: Some(Number::from(id)),
        }
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for ProductId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match &self.number {
            Some(number) => number.serialize(serializer),
            None => serializer.serialize_str(&self.text),
        }
    }
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(Number),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Ok(Self { text, number: None }),
            Raw::Number(number) => Ok(Self {
                text: number.to_string(),
                number: Some(number),
            }),
        }
    }
}

/// Accepts a price sent as a JSON number or as a numeric string, which is
/// how decimal columns often come out of a database.
fn price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(price) => Ok(price),
        Raw::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid price `{}`", text))),
    }
}

/// A product record.
///
/// Every product originates from the upstream service. Fields the gateway
/// does not know about are kept in [`Product::extra`] so that re-emitted
/// lists carry them through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Upstream-assigned identifier.
    pub product_id: ProductId,
    /// Display title. Never empty for a valid record.
    pub product_title: String,
    /// Unit price.
    #[serde(deserialize_with = "price")]
    pub product_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_category: Option<String>,
    /// Image URL or other image reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_image: Option<String>,
    /// Any additional fields supplied by the upstream service.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A product record exactly as the upstream service sent it.
///
/// Decoding only checks that `product_title` is a string. Every field is
/// written back out untouched, including ids, prices and fields the
/// gateway knows nothing about.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use storefront_core::{ProductRecord, Searchable};
///
/// let raw = json!({ "product_id": 1, "product_title": "Lamp", "product_price": "9.50" });
/// let record: ProductRecord = serde_json::from_value(raw.clone()).unwrap();
/// assert_eq!(record.title(), "Lamp");
/// assert_eq!(serde_json::to_value(&record).unwrap(), raw);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProductRecord(Map<String, Value>);

impl ProductRecord {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub(crate) fn text(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl<'de> Deserialize<'de> for ProductRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let fields = Map::<String, Value>::deserialize(deserializer)?;
        match fields.get("product_title") {
            Some(Value::String(_)) => Ok(Self(fields)),
            None | Some(Value::Null) => Err(de::Error::missing_field("product_title")),
            Some(_) => Err(de::Error::custom("`product_title` is not a string")),
        }
    }
}

/// Product fields submitted when creating or updating a product.
///
/// # Example
///
/// ```
/// use storefront_core::{ProductDraft, ValidationError};
///
/// let draft = ProductDraft::new("Red Shirt", 150_000.0);
/// assert!(draft.validate().is_ok());
///
/// let draft = ProductDraft::new("   ", 10.0);
/// assert_eq!(draft.validate(), Err(ValidationError::EmptyTitle));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub product_title: String,
    pub product_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_image: Option<String>,
}

/// Field-level problems with a [`ProductDraft`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please input product title")]
    EmptyTitle,

    #[error("Price must be a number")]
    InvalidPrice,

    #[error("Price must not be negative")]
    NegativePrice,
}

impl ProductDraft {
    pub fn new(title: impl Into<String>, price: f64) -> Self {
        Self {
            product_title: title.into(),
            product_price: price,
            product_description: None,
            product_category: None,
            product_image: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.product_description = Some(description.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.product_category = Some(category.into());
        self
    }

    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.product_image = Some(image.into());
        self
    }

    /// Checks the rules a product form enforces before submitting.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.product_title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if !self.product_price.is_finite() {
            return Err(ValidationError::InvalidPrice);
        }
        if self.product_price < 0.0 {
            return Err(ValidationError::NegativePrice);
        }
        Ok(())
    }

    /// Builds the update payload for an existing product.
    pub fn with_id(self, product_id: ProductId) -> Product {
        Product {
            product_id,
            product_title: self.product_title,
            product_price: self.product_price,
            product_description: self.product_description,
            product_category: self.product_category,
            product_image: self.product_image,
            extra: Map::new(),
        }
    }
}

impl From<&Product> for ProductDraft {
    fn from(product: &Product) -> Self {
        Self {
            product_title: product.product_title.clone(),
            product_price: product.product_price,
            product_description: product.product_description.clone(),
            product_category: product.product_category.clone(),
            product_image: product.product_image.clone(),
        }
    }
}
