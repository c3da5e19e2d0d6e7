//! Outbound delivery of single items

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{DeliveryError, DeliveryResult};
use crate::models::DeliveryTarget;
use crate::utils::url::UrlUtils;

/// What the target answered, whatever the status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub status_code: u16,
    pub body: String,
}

/// Delivers one serialized item to a target
///
/// Any HTTP answer is an `Ok` outcome. `Err` is reserved for calls that
/// produced no answer at all.
#[async_trait]
pub trait SendStrategy: Send + Sync {
    async fn send(
        &self,
        target: &DeliveryTarget,
        item_id: &str,
        body: &str,
        access_token: &str,
    ) -> DeliveryResult<DeliveryOutcome>;
}

/// One `PUT {target}/{item_id}` per item with a JSON body and bearer auth
pub struct HttpPutSendStrategy {
    http_client: Client,
}

impl HttpPutSendStrategy {
    pub fn new(http_client: Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl SendStrategy for HttpPutSendStrategy {
    async fn send(
        &self,
        target: &DeliveryTarget,
        item_id: &str,
        body: &str,
        access_token: &str,
    ) -> DeliveryResult<DeliveryOutcome> {
        let url = target
            .item_url(item_id)
            .map_err(|message| DeliveryError::InvalidTarget { message })?;
        let safe_url = UrlUtils::obfuscate_credentials(url.as_str());

        debug!("Delivering item {} to {}", item_id, safe_url);

        let response = self
            .http_client
            .put(url)
            .bearer_auth(access_token)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| DeliveryError::transport(&safe_url, e))?;

        let status_code = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| DeliveryError::transport(&safe_url, e))?;

        Ok(DeliveryOutcome { status_code, body })
    }
}
