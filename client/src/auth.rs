use async_trait::async_trait;
use storefront_core::Credential;
use tokio::sync::RwLock;

use crate::error::{ClientError, Result};

/// Source of the bearer credential attached to gateway calls.
///
/// The provider owns the credential's lifetime. Callers ask for it on every
/// request and never keep it.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<()>;

    async fn sign_out(&self) -> Result<()>;

    /// The current credential, or `None` when signed out.
    async fn credential(&self) -> Option<Credential>;
}

/// A provider holding one fixed credential.
///
/// Signing in makes the configured credential current again; signing out
/// clears it.
pub struct StaticCredentials {
    token: Option<Credential>,
    current: RwLock<Option<Credential>>,
}

impl StaticCredentials {
    /// A signed-in provider for `token`.
    pub fn new(token: Credential) -> Self {
        Self {
            current: RwLock::new(Some(token.clone())),
            token: Some(token),
        }
    }

    /// A provider that never has a credential.
    pub fn anonymous() -> Self {
        Self {
            token: None,
            current: RwLock::new(None),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn sign_in(&self, _email: &str, _password: &str) -> Result<()> {
        let token = self
            .token
            .clone()
            .ok_or_else(|| ClientError::Auth("no credential configured".to_string()))?;
        *self.current.write().await = Some(token);
        Ok(())
    }

    async fn sign_out(&self) -> Result<()> {
        *self.current.write().await = None;
        Ok(())
    }

    async fn credential(&self) -> Option<Credential> {
        self.current.read().await.clone()
    }
}
