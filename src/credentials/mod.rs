//! Credential resolution
//!
//! Service keys come from a keyed store; the personalized provider needs a
//! managed user identity that is bootstrapped on first use and mirrored so
//! every later session converges on the same identity.

pub mod resolver;
pub mod store;

use async_trait::async_trait;
use thiserror::Error;

pub use crate::database::ManagedUser;
pub use resolver::{CredentialResolver, UserSession};
pub use store::SqliteCredentialStore;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("no key stored for service '{0}'")]
    ServiceNotFound(String),
    #[error("no managed user identity found")]
    NoUserFound,
    #[error("no access token found")]
    NoTokenFound,
    #[error("credential store error: {0}")]
    Store(String),
}

impl From<anyhow::Error> for CredentialError {
    fn from(e: anyhow::Error) -> Self {
        CredentialError::Store(format!("{:#}", e))
    }
}

/// Keyed store of `{service, value}` records
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// First record matching `service` exactly
    async fn find_key(&self, service: &str) -> Result<Option<String>, CredentialError>;
    async fn delete_key(&self, service: &str) -> Result<(), CredentialError>;
}

/// Durable mirror of managed identities
#[async_trait]
pub trait IdentityMirror: Send + Sync {
    /// The identity matching `user_id`, or any stored identity when `None`
    async fn fetch_user(&self, user_id: Option<&str>) -> Result<Option<ManagedUser>, CredentialError>;
    async fn store_user(&self, user: &ManagedUser) -> Result<(), CredentialError>;
}

/// Creates a managed user with the personalized provider
#[async_trait]
pub trait UserProvisioner: Send + Sync {
    async fn create_managed_user(&self, service_key: &str) -> Result<ManagedUser, CredentialError>;
}
