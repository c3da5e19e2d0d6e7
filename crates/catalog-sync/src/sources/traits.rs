//! Source trait definitions

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::SourceResult;

/// One upstream record as read from a page, before normalization into a queue item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: String,
    pub payload: serde_json::Value,
}

impl SourceRecord {
    pub fn new(id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            payload,
        }
    }
}

/// Paginated upstream catalog
///
/// Pages are 1-based. An empty page marks the end of the data set.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, page: u32) -> SourceResult<Vec<SourceRecord>>;

    /// Human-readable name used in logs
    fn name(&self) -> String {
        "source".to_string()
    }
}
