// SQLite-backed key store and identity mirror

use async_trait::async_trait;
use std::sync::Arc;

use super::{CredentialError, IdentityMirror, KeyStore, ManagedUser};
use crate::database::DatabaseManager;

/// Runs blocking SQLite calls off the async workers
async fn blocking<T, F>(db: &Arc<DatabaseManager>, f: F) -> Result<T, CredentialError>
where
    T: Send + 'static,
    F: FnOnce(&DatabaseManager) -> anyhow::Result<T> + Send + 'static,
{
    let db = db.clone();
    tokio::task::spawn_blocking(move || f(&db))
        .await
        .map_err(|e| CredentialError::Store(format!("store task failed: {}", e)))?
        .map_err(CredentialError::from)
}

pub struct SqliteCredentialStore {
    db: Arc<DatabaseManager>,
}

impl SqliteCredentialStore {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl KeyStore for SqliteCredentialStore {
    async fn find_key(&self, service: &str) -> Result<Option<String>, CredentialError> {
        let service = service.to_string();
        blocking(&self.db, move |db| db.get_key_string(&service)).await
    }

    async fn delete_key(&self, service: &str) -> Result<(), CredentialError> {
        let service = service.to_string();
        let removed = blocking(&self.db, move |db| db.delete_key_string(&service)).await?;
        if !removed {
            log::debug!("No stored key to delete");
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityMirror for SqliteCredentialStore {
    async fn fetch_user(&self, user_id: Option<&str>) -> Result<Option<ManagedUser>, CredentialError> {
        let user_id = user_id.map(str::to_string);
        blocking(&self.db, move |db| db.get_managed_user(user_id.as_deref())).await
    }

    async fn store_user(&self, user: &ManagedUser) -> Result<(), CredentialError> {
        let user = user.clone();
        blocking(&self.db, move |db| db.save_managed_user(&user.user_id, &user.token)).await
    }
}
