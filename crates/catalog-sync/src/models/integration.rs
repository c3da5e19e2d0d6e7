use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;
use uuid::Uuid;

use crate::utils::url::UrlUtils;

/// Where an integration delivers its items and how it authenticates there
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryTarget {
    /// Base URL; each item is delivered to `{url}/{item_id}`
    pub url: String,
    /// OAuth2 token endpoint used by the client-credentials flow
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
}

impl DeliveryTarget {
    /// Build the per-item delivery URL
    ///
    /// The id becomes one percent-encoded path segment; any query or
    /// fragment on the base URL is preserved.
    pub fn item_url(&self, item_id: &str) -> Result<Url, String> {
        let mut url = UrlUtils::parse_http_url(&self.url)?;
        url.path_segments_mut()
            .map_err(|_| format!("'{}' cannot carry a path", self.url))?
            .pop_if_empty()
            .push(item_id);
        Ok(url)
    }
}

impl fmt::Debug for DeliveryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryTarget")
            .field("url", &self.url)
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"****")
            .finish()
    }
}

/// Persisted definition of what to synchronize, when, and to which target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Integration {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub cron_expression: String,
    pub target: DeliveryTarget,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationCreateRequest {
    pub name: String,
    pub description: Option<String>,
    pub cron_expression: String,
    pub target: DeliveryTarget,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationUpdateRequest {
    pub name: String,
    pub description: Option<String>,
    pub cron_expression: String,
    pub target: DeliveryTarget,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(url: &str) -> DeliveryTarget {
        DeliveryTarget {
            url: url.to_string(),
            token_url: "https://auth.example.com/token".to_string(),
            client_id: "client".to_string(),
            client_secret: "very-secret".to_string(),
        }
    }

    #[test]
    fn test_item_url_joins_base_and_id() {
        assert_eq!(
            target("https://shop.example.com/api/products")
                .item_url("sku-1")
                .unwrap()
                .as_str(),
            "https://shop.example.com/api/products/sku-1"
        );
        assert_eq!(
            target("https://shop.example.com/api/products/")
                .item_url("sku-1")
                .unwrap()
                .as_str(),
            "https://shop.example.com/api/products/sku-1"
        );
    }

    #[test]
    fn test_item_url_encodes_id() {
        assert_eq!(
            target("https://shop.example.com/items")
                .item_url("a b/c")
                .unwrap()
                .as_str(),
            "https://shop.example.com/items/a%20b%2Fc"
        );
    }

    #[test]
    fn test_item_url_keeps_query_and_fragment() {
        assert_eq!(
            target("https://shop.example.com/items?tenant=1#v2")
                .item_url("sku")
                .unwrap()
                .as_str(),
            "https://shop.example.com/items/sku?tenant=1#v2"
        );
    }

    #[test]
    fn test_item_url_rejects_unusable_base() {
        assert!(target("not a url").item_url("sku").is_err());
        assert!(target("mailto:ops@example.com").item_url("sku").is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", target("https://shop.example.com"));
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains("****"));
    }
}
