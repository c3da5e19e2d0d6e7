//! HTTP Client Factory
//!
//! Builds the single `reqwest::Client` shared by the upstream catalog source,
//! the auth provider and the delivery strategy. The client pools connections
//! internally, so cloning it hands out the same handle.

use std::time::Duration;

use crate::config::DeliveryConfig;
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    connect_timeout: Duration,
    request_timeout: Duration,
    user_agent: String,
}

impl HttpClientFactory {
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            request_timeout,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn from_config(config: &DeliveryConfig) -> Self {
        Self::new(config.connect_timeout, config.request_timeout)
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Create the shared client
    pub fn create_client(&self) -> AppResult<reqwest::Client> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build HTTP client: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_names_the_crate() {
        let factory = HttpClientFactory::new(Duration::from_secs(1), Duration::from_secs(2));
        assert!(factory.user_agent().starts_with("catalog-sync/"));
        assert!(factory.create_client().is_ok());
    }
}
