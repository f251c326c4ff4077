use std::fmt;

/// Opaque bearer credential.
///
/// The gateway never looks inside a credential. It is read once per
/// outbound request and dropped with it. `Debug` output is redacted.
///
/// # Example
///
/// ```
/// use storefront_core::Credential;
///
/// let credential = Credential::from_authorization("Bearer abc.def").unwrap();
/// assert_eq!(credential.expose(), "abc.def");
/// assert_eq!(format!("{credential:?}"), "Credential(***)");
///
/// assert!(Credential::from_authorization("Basic dXNlcjpwdw==").is_none());
/// assert!(Credential::new("").is_none());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a token. Returns `None` for an empty token.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// Parses an `Authorization` header value of the form `Bearer <token>`.
    pub fn from_authorization(value: &str) -> Option<Self> {
        let (scheme, token) = value.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }
        Self::new(token.trim())
    }

    /// Returns the raw token for placing on an outbound request.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}
