// Managed user provisioning against the personalized user-management endpoint

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::transport::{ApiRequest, HttpTransport};
use crate::config::DiscoveryConfig;
use crate::credentials::{CredentialError, ManagedUser, UserProvisioner};
use crate::normalizer::ValueExt;

const CREATE_USER_PATH: &str = "v2/usermanagement/createuser";

pub struct ManagedUserClient {
    config: Arc<DiscoveryConfig>,
    transport: Arc<dyn HttpTransport>,
}

impl ManagedUserClient {
    pub fn new(config: Arc<DiscoveryConfig>, transport: Arc<dyn HttpTransport>) -> Self {
        Self { config, transport }
    }
}

#[async_trait]
impl UserProvisioner for ManagedUserClient {
    async fn create_managed_user(&self, service_key: &str) -> Result<ManagedUser, CredentialError> {
        let query = vec![("v".to_string(), self.config.personalized_version.clone())];
        let request = ApiRequest::post(
            self.config.endpoint(CREATE_USER_PATH),
            query,
            format!("Bearer {}", service_key),
        )
        .with_timeout(self.config.personalized_timeout());

        let body = self.transport.send(request).await.map_err(|e| {
            log::error!("Managed user creation failed: {}", e);
            CredentialError::NoUserFound
        })?;

        let response = body.get("response").unwrap_or(&Value::Null);
        let user_id = response
            .id_at("user_id")
            .or_else(|| response.id_at("userId"))
            .unwrap_or_default();
        let token = response.str_at("access_token").unwrap_or_default();
        if user_id.is_empty() || token.is_empty() {
            log::error!("Managed user response carried no identity or token");
            return Err(CredentialError::NoUserFound);
        }

        Ok(ManagedUser {
            user_id,
            token: token.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::transport::HttpMethod;
    use crate::providers::ProviderError;
    use crate::testing::{test_config, MockTransport};
    use serde_json::json;

    #[tokio::test]
    async fn test_creates_user_from_integer_id() {
        let transport = MockTransport::new();
        transport.respond(
            CREATE_USER_PATH,
            json!({"meta": {"code": 200}, "response": {"user_id": 8812, "access_token": "tok"}}),
        );
        let client = ManagedUserClient::new(test_config(), transport.clone());

        let user = client.create_managed_user("svc").await.unwrap();
        assert_eq!(user, ManagedUser { user_id: "8812".into(), token: "tok".into() });

        let sent = &transport.requests()[0];
        assert_eq!(sent.method, HttpMethod::Post);
        assert_eq!(sent.authorization, "Bearer svc");
        assert_eq!(sent.param("v"), Some("20240101"));
    }

    #[tokio::test]
    async fn test_accepts_camel_case_user_id() {
        let transport = MockTransport::new();
        transport.respond(
            CREATE_USER_PATH,
            json!({"response": {"userId": 42, "access_token": "tok"}}),
        );
        let client = ManagedUserClient::new(test_config(), transport);

        let user = client.create_managed_user("svc").await.unwrap();
        assert_eq!(user.user_id, "42");
    }

    #[tokio::test]
    async fn test_missing_token_or_failure_is_no_user() {
        let transport = MockTransport::new();
        transport.respond(CREATE_USER_PATH, json!({"response": {"user_id": 1}}));
        let client = ManagedUserClient::new(test_config(), transport);
        assert_eq!(client.create_managed_user("svc").await, Err(CredentialError::NoUserFound));

        let transport = MockTransport::new();
        transport.fail(CREATE_USER_PATH, ProviderError::ServerErrorMessage("down".into()));
        let client = ManagedUserClient::new(test_config(), transport);
        assert_eq!(client.create_managed_user("svc").await, Err(CredentialError::NoUserFound));
    }
}
