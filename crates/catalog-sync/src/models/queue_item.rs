use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One normalized unit of work handed from the fetch producer to the send consumer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Upstream identifier, also used to address the item at the delivery target
    pub id: String,
    /// Upstream page the item was read from (1-based)
    pub page: u32,
    pub payload: serde_json::Value,
    pub fetched_at: DateTime<Utc>,
}

impl QueueItem {
    pub fn new(id: impl Into<String>, page: u32, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            page,
            payload,
            fetched_at: Utc::now(),
        }
    }

    /// Serialize the item to the body sent to the delivery target
    pub fn to_wire(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.payload)
    }
}
