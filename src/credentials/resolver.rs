// Credential resolver - service keys and the managed user session

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::{CredentialError, IdentityMirror, KeyStore, ManagedUser, UserProvisioner};

/// Resolved personalized-provider session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    pub identity: String,
    pub token: String,
}

/// Resolves and caches credentials.
///
/// Both caches sit behind async mutexes held across the store round trip, so
/// concurrent searches racing for the same credential resolve it once.
pub struct CredentialResolver {
    keys: Arc<dyn KeyStore>,
    identities: Arc<dyn IdentityMirror>,
    provisioner: Arc<dyn UserProvisioner>,
    /// Keyed-store service whose key authorizes managed-user creation
    provisioning_service: String,
    service_keys: Mutex<HashMap<String, String>>,
    session: Mutex<Option<UserSession>>,
}

impl CredentialResolver {
    pub fn new(
        keys: Arc<dyn KeyStore>,
        identities: Arc<dyn IdentityMirror>,
        provisioner: Arc<dyn UserProvisioner>,
        provisioning_service: impl Into<String>,
    ) -> Self {
        Self {
            keys,
            identities,
            provisioner,
            provisioning_service: provisioning_service.into(),
            service_keys: Mutex::new(HashMap::new()),
            session: Mutex::new(None),
        }
    }

    /// Key for `service`, fetched once per process
    pub async fn resolve_service_key(&self, service: &str) -> Result<String, CredentialError> {
        let mut cache = self.service_keys.lock().await;
        if let Some(key) = cache.get(service) {
            return Ok(key.clone());
        }

        let key = self
            .keys
            .find_key(service)
            .await?
            .filter(|k| !k.is_empty())
            .ok_or_else(|| CredentialError::ServiceNotFound(service.to_string()))?;

        log::debug!("Resolved service key for '{}'", service);
        cache.insert(service.to_string(), key.clone());
        Ok(key)
    }

    /// Drop the cached key and delete its stored record; the next call re-resolves
    pub async fn invalidate_service_key(&self, service: &str) -> Result<(), CredentialError> {
        let mut cache = self.service_keys.lock().await;
        cache.remove(service);
        log::warn!("Invalidating session key for '{}'", service);
        self.keys.delete_key(service).await
    }

    /// Resolve the managed identity and token, creating the identity on first use.
    ///
    /// With no stored identity, one is created with the provisioning service key,
    /// mirrored, then re-read. A second miss fails with `NoUserFound`.
    pub async fn resolve_user_session(&self, prior_identity: Option<&str>) -> Result<UserSession, CredentialError> {
        let mut session = self.session.lock().await;
        if let Some(current) = session.as_ref() {
            if prior_identity.map_or(true, |id| id == current.identity) {
                return Ok(current.clone());
            }
        }

        for pass in 0..2 {
            let found = match self.identities.fetch_user(prior_identity).await? {
                None if prior_identity.is_some() => self.identities.fetch_user(None).await?,
                found => found,
            };
            if let Some(user) = found {
                if user.token.is_empty() {
                    return Err(CredentialError::NoTokenFound);
                }
                let resolved = UserSession {
                    identity: user.user_id,
                    token: user.token,
                };
                *session = Some(resolved.clone());
                return Ok(resolved);
            }

            if pass == 0 {
                self.bootstrap_user().await?;
            }
        }

        Err(CredentialError::NoUserFound)
    }

    async fn bootstrap_user(&self) -> Result<ManagedUser, CredentialError> {
        let service_key = self.resolve_service_key(&self.provisioning_service).await?;
        let created = self.provisioner.create_managed_user(&service_key).await?;
        if created.user_id.is_empty() {
            return Err(CredentialError::NoUserFound);
        }
        self.identities.store_user(&created).await?;
        log::info!("Created managed user {}", created.user_id);
        Ok(created)
    }

    /// Bearer token for personalized calls; empty when no session can be resolved
    pub async fn access_token(&self) -> String {
        match self.resolve_user_session(None).await {
            Ok(session) => session.token,
            Err(e) => {
                log::warn!("No personalized access: {}", e);
                String::new()
            }
        }
    }

    /// Forget the cached session so the next call re-reads the mirror
    pub async fn reset_user_session(&self) {
        self.session.lock().await.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MemoryKeys {
        keys: std::sync::Mutex<HashMap<String, String>>,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl KeyStore for MemoryKeys {
        async fn find_key(&self, service: &str) -> Result<Option<String>, CredentialError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self.keys.lock().unwrap().get(service).cloned())
        }

        async fn delete_key(&self, service: &str) -> Result<(), CredentialError> {
            self.keys.lock().unwrap().remove(service);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryMirror {
        users: std::sync::Mutex<Vec<ManagedUser>>,
    }

    #[async_trait]
    impl IdentityMirror for MemoryMirror {
        async fn fetch_user(&self, user_id: Option<&str>) -> Result<Option<ManagedUser>, CredentialError> {
            let users = self.users.lock().unwrap();
            Ok(users
                .iter()
                .find(|u| user_id.map_or(true, |id| id == u.user_id))
                .cloned())
        }

        async fn store_user(&self, user: &ManagedUser) -> Result<(), CredentialError> {
            self.users.lock().unwrap().push(user.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingProvisioner {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl UserProvisioner for CountingProvisioner {
        async fn create_managed_user(&self, service_key: &str) -> Result<ManagedUser, CredentialError> {
            assert_eq!(service_key, "svc-key");
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok(ManagedUser {
                user_id: format!("{}", 1000 + n),
                token: format!("token-{}", n),
            })
        }
    }

    fn resolver() -> (Arc<CredentialResolver>, Arc<MemoryKeys>, Arc<MemoryMirror>, Arc<CountingProvisioner>) {
        let keys = Arc::new(MemoryKeys::default());
        keys.keys.lock().unwrap().insert("foursquareService".into(), "svc-key".into());
        keys.keys.lock().unwrap().insert("foursquare".into(), "api-key".into());
        let mirror = Arc::new(MemoryMirror::default());
        let provisioner = Arc::new(CountingProvisioner::default());
        let resolver = Arc::new(CredentialResolver::new(
            keys.clone(),
            mirror.clone(),
            provisioner.clone(),
            "foursquareService",
        ));
        (resolver, keys, mirror, provisioner)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_bootstrap_creates_one_identity() {
        let (resolver, _keys, mirror, provisioner) = resolver();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let resolver = resolver.clone();
                tokio::spawn(async move { resolver.resolve_user_session(None).await })
            })
            .collect();

        let mut identities = Vec::new();
        for handle in handles {
            identities.push(handle.await.unwrap().unwrap().identity);
        }

        assert_eq!(provisioner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(mirror.users.lock().unwrap().len(), 1);
        assert!(identities.iter().all(|id| id == "1000"));

        resolver.reset_user_session().await;
        let again = resolver.resolve_user_session(None).await.unwrap();
        assert_eq!(again.identity, "1000");
        assert_eq!(provisioner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_service_key_cached_and_invalidated() {
        let (resolver, keys, _mirror, _provisioner) = resolver();

        assert_eq!(resolver.resolve_service_key("foursquare").await.unwrap(), "api-key");
        assert_eq!(resolver.resolve_service_key("foursquare").await.unwrap(), "api-key");
        assert_eq!(keys.lookups.load(Ordering::SeqCst), 1);

        resolver.invalidate_service_key("foursquare").await.unwrap();
        assert_eq!(
            resolver.resolve_service_key("foursquare").await,
            Err(CredentialError::ServiceNotFound("foursquare".into()))
        );
    }

    #[tokio::test]
    async fn test_missing_provisioning_key_surfaces_error_and_empty_token() {
        let (resolver, keys, _mirror, provisioner) = resolver();
        keys.keys.lock().unwrap().remove("foursquareService");

        assert_eq!(
            resolver.resolve_user_session(None).await,
            Err(CredentialError::ServiceNotFound("foursquareService".into()))
        );
        assert_eq!(resolver.access_token().await, "");
        assert_eq!(provisioner.calls.load(Ordering::SeqCst), 0);
    }
}
