//! Job scheduling type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{ExecutionTrigger, Integration};

/// Dispatch class of a task
///
/// Automatic tasks sort before manual ones.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskClass {
    Automatic = 0,
    Manual = 1,
}

impl PartialOrd for TaskClass {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TaskClass {
    fn cmp(&self, other: &Self) -> Ordering {
        (*self as u8).cmp(&(*other as u8))
    }
}

/// One whole-integration sync job waiting for the dispatcher
#[derive(Debug, Clone)]
pub struct PriorityTask {
    pub id: Uuid,
    pub class: TaskClass,
    pub submitted_at: DateTime<Utc>,
    /// Assigned by the queue on push; breaks ties between equal timestamps
    pub sequence: u64,
    pub integration: Integration,
    /// Requesting user for manual tasks
    pub initiated_by: Option<String>,
}

impl PriorityTask {
    pub fn automatic(integration: Integration, submitted_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            class: TaskClass::Automatic,
            submitted_at,
            sequence: 0,
            integration,
            initiated_by: None,
        }
    }

    pub fn manual(
        integration: Integration,
        user_id: impl Into<String>,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            class: TaskClass::Manual,
            submitted_at,
            sequence: 0,
            integration,
            initiated_by: Some(user_id.into()),
        }
    }

    /// Trigger recorded on every execution this task creates
    pub fn trigger(&self) -> ExecutionTrigger {
        match (&self.class, &self.initiated_by) {
            (TaskClass::Manual, Some(user_id)) => ExecutionTrigger::Manual {
                user_id: user_id.clone(),
            },
            (TaskClass::Manual, None) => ExecutionTrigger::Manual {
                user_id: String::new(),
            },
            (TaskClass::Automatic, _) => ExecutionTrigger::Automatic,
        }
    }

    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            id: self.id,
            integration_id: self.integration.id,
            integration_name: self.integration.name.clone(),
            class: self.class,
            submitted_at: self.submitted_at,
            initiated_by: self.initiated_by.clone(),
        }
    }

    fn sort_key(&self) -> (TaskClass, DateTime<Utc>, u64, Uuid) {
        (self.class, self.submitted_at, self.sequence, self.id)
    }
}

impl PartialEq for PriorityTask {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for PriorityTask {}

impl PartialOrd for PriorityTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PriorityTask {
    /// Class first, then submission time, then arrival order
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// Monitoring view of a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: Uuid,
    pub integration_id: Uuid,
    pub integration_name: String,
    pub class: TaskClass,
    pub submitted_at: DateTime<Utc>,
    pub initiated_by: Option<String>,
}

/// Errors that can occur in the job scheduling system
#[derive(Debug, thiserror::Error)]
pub enum JobSchedulingError {
    /// The queue no longer accepts work
    #[error("Queue is closed")]
    QueueClosed,

    /// The dispatcher worker has shut down
    #[error("Task dispatcher is stopped")]
    DispatcherStopped,

    #[error("Unusable cron trigger '{expression}': {reason}")]
    InvalidCron { expression: String, reason: String },

    #[error("Integration {id} not found")]
    IntegrationNotFound { id: Uuid },
}

impl From<JobSchedulingError> for AppError {
    fn from(error: JobSchedulingError) -> Self {
        match error {
            JobSchedulingError::IntegrationNotFound { id } => AppError::not_found("integration", id),
            JobSchedulingError::InvalidCron { .. } => AppError::validation(error.to_string()),
            other => AppError::internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DeliveryTarget;
    use chrono::TimeZone;

    fn integration(name: &str) -> Integration {
        let now = Utc::now();
        Integration {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            cron_expression: "0 0 * * * *".to_string(),
            target: DeliveryTarget {
                url: "https://shop.example.com/items".to_string(),
                token_url: String::new(),
                client_id: String::new(),
                client_secret: String::new(),
            },
            created_at: now,
            updated_at: now,
        }
    }

    fn at(seconds: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, seconds).unwrap()
    }

    #[test]
    fn test_class_ordering() {
        assert!(TaskClass::Automatic < TaskClass::Manual);
    }

    #[test]
    fn test_automatic_sorts_before_earlier_manual() {
        let manual = PriorityTask::manual(integration("b"), "user", at(5));
        let automatic = PriorityTask::automatic(integration("c"), at(20));
        assert!(automatic < manual);
    }

    #[test]
    fn test_same_class_orders_by_time() {
        let earlier = PriorityTask::automatic(integration("a"), at(10));
        let later = PriorityTask::automatic(integration("c"), at(20));
        assert!(earlier < later);
    }

    #[test]
    fn test_manual_task_trigger_carries_user() {
        let task = PriorityTask::manual(integration("a"), "user-3", at(1));
        assert_eq!(
            task.trigger(),
            ExecutionTrigger::Manual {
                user_id: "user-3".to_string()
            }
        );
        assert_eq!(task.summary().class, TaskClass::Manual);
        assert_eq!(
            PriorityTask::automatic(integration("a"), at(1)).trigger(),
            ExecutionTrigger::Automatic
        );
    }
}
