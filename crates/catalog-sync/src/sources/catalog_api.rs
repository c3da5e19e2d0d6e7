//! HTTP/JSON paginated catalog source
//!
//! Requests `GET {base_url}?{page_param}={page}&{size_param}={page_size}` and
//! reads the records from either the body itself (a JSON array) or the
//! configured items field.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::traits::{PageSource, SourceRecord};
use crate::config::SourceConfig;
use crate::errors::{SourceError, SourceResult};
use crate::utils::url::UrlUtils;

pub struct CatalogApiSource {
    http_client: Client,
    config: SourceConfig,
}

impl CatalogApiSource {
    pub fn new(http_client: Client, config: SourceConfig) -> SourceResult<Self> {
        UrlUtils::parse_http_url(&config.base_url).map_err(|message| SourceError::InvalidConfig {
            field: "base_url".to_string(),
            message,
        })?;

        Ok(Self {
            http_client,
            config,
        })
    }

    fn page_url(&self, page: u32) -> SourceResult<reqwest::Url> {
        let mut url =
            reqwest::Url::parse(&self.config.base_url).map_err(|e| SourceError::InvalidConfig {
                field: "base_url".to_string(),
                message: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair(&self.config.page_param, &page.to_string())
            .append_pair(&self.config.size_param, &self.config.page_size.to_string());
        Ok(url)
    }
}

#[async_trait]
impl PageSource for CatalogApiSource {
    async fn fetch_page(&self, page: u32) -> SourceResult<Vec<SourceRecord>> {
        let url = self.page_url(page)?;
        let safe_url = UrlUtils::obfuscate_credentials(url.as_str());
        debug!("Fetching catalog page {} from {}", page, safe_url);

        let response = self
            .http_client
            .get(url)
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| SourceError::transport(&safe_url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Http {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SourceError::parse(page, e.to_string()))?;

        extract_records(
            &body,
            self.config.items_field.as_deref(),
            &self.config.id_field,
            page,
        )
    }

    fn name(&self) -> String {
        UrlUtils::obfuscate_credentials(&self.config.base_url)
    }
}

/// Pull the records of one page out of its JSON body
///
/// Identifiers may be strings or numbers; anything else is a parse error.
pub fn extract_records(
    body: &Value,
    items_field: Option<&str>,
    id_field: &str,
    page: u32,
) -> SourceResult<Vec<SourceRecord>> {
    let items = match (body, items_field) {
        (Value::Array(items), _) => items,
        (Value::Object(map), Some(field)) => match map.get(field) {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => {
                return Err(SourceError::parse(page, format!("missing '{field}' array")));
            }
            Some(_) => {
                return Err(SourceError::parse(page, format!("'{field}' is not an array")));
            }
        },
        _ => return Err(SourceError::parse(page, "page body is not a list of items")),
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let id = match item.get(id_field) {
                Some(Value::String(id)) => id.clone(),
                Some(Value::Number(id)) => id.to_string(),
                _ => {
                    return Err(SourceError::parse(
                        page,
                        format!("item {index} has no usable '{id_field}'"),
                    ));
                }
            };
            Ok(SourceRecord::new(id, item.clone()))
        })
        .collect()
}
