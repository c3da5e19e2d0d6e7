//! Access tokens for delivery targets

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::errors::{DeliveryError, DeliveryResult};
use crate::models::DeliveryTarget;
use crate::utils::url::UrlUtils;

/// Produces a bearer token for one delivery call
///
/// Called once per item; implementations are not expected to cache.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn obtain_access_token(&self, target: &DeliveryTarget) -> DeliveryResult<String>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// OAuth2 client-credentials grant against the target's token endpoint
///
/// Targets without a token URL fall back to the configured static token.
pub struct ClientCredentialsAuthProvider {
    http_client: Client,
    static_token: Option<String>,
}

impl ClientCredentialsAuthProvider {
    pub fn new(http_client: Client, static_token: Option<String>) -> Self {
        Self {
            http_client,
            static_token,
        }
    }
}

#[async_trait]
impl AuthProvider for ClientCredentialsAuthProvider {
    async fn obtain_access_token(&self, target: &DeliveryTarget) -> DeliveryResult<String> {
        if target.token_url.trim().is_empty() {
            return self.static_token.clone().ok_or_else(|| {
                DeliveryError::authentication("target has no token URL and no static token is configured")
            });
        }

        let token_url = UrlUtils::parse_http_url(&target.token_url)
            .map_err(|message| DeliveryError::InvalidTarget { message })?;
        let safe_url = UrlUtils::obfuscate_credentials(token_url.as_str());

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", target.client_id.as_str()),
            ("client_secret", target.client_secret.as_str()),
        ];

        let response = self
            .http_client
            .post(token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| DeliveryError::transport(&safe_url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::authentication(format!(
                "token endpoint {safe_url} answered {status}: {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| DeliveryError::authentication(format!("unreadable token response: {e}")))?;

        debug!(
            "Obtained {} token from {} (expires in {:?}s)",
            token.token_type.as_deref().unwrap_or("bearer"),
            safe_url,
            token.expires_in
        );

        Ok(token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn target(token_url: &str) -> DeliveryTarget {
        DeliveryTarget {
            url: "https://shop.example.com/items".to_string(),
            token_url: token_url.to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_static_token_without_token_url() {
        let provider = ClientCredentialsAuthProvider::new(Client::new(), Some("fixed".to_string()));
        assert_eq!(provider.obtain_access_token(&target("")).await.unwrap(), "fixed");
    }

    #[tokio::test]
    async fn test_missing_token_source_fails() {
        let provider = ClientCredentialsAuthProvider::new(Client::new(), None);
        let err = provider.obtain_access_token(&target("")).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Authentication { .. }));
    }

    #[tokio::test]
    async fn test_invalid_token_url_fails_without_network() {
        let provider = ClientCredentialsAuthProvider::new(Client::new(), None);
        let err = provider
            .obtain_access_token(&target("not a url"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidTarget { .. }));
    }

    #[tokio::test]
    async fn test_client_credentials_grant_returns_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=client"))
            .and(body_string_contains("client_secret=secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "issued-token",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = ClientCredentialsAuthProvider::new(Client::new(), Some("fixed".to_string()));
        let token = provider
            .obtain_access_token(&target(&format!("{}/oauth/token", server.uri())))
            .await
            .unwrap();

        assert_eq!(token, "issued-token");
    }

    #[tokio::test]
    async fn test_rejected_grant_is_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
            .mount(&server)
            .await;

        let provider = ClientCredentialsAuthProvider::new(Client::new(), None);
        let err = provider
            .obtain_access_token(&target(&format!("{}/oauth/token", server.uri())))
            .await
            .unwrap_err();

        assert!(matches!(err, DeliveryError::Authentication { .. }));
        assert!(err.to_string().contains("invalid_client"));
    }

    #[tokio::test]
    async fn test_token_response_without_access_token_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "none" })))
            .mount(&server)
            .await;

        let provider = ClientCredentialsAuthProvider::new(Client::new(), None);
        let err = provider
            .obtain_access_token(&target(&format!("{}/oauth/token", server.uri())))
            .await
            .unwrap_err();

        assert!(matches!(err, DeliveryError::Authentication { .. }));
    }
}
