//! Execution records and their lifecycle state machine
//!
//! Every delivery attempt is tracked as an [`Execution`] that moves through
//! `STARTED -> PENDING -> {SUCCESS, ERROR}`. The transition rules live on
//! [`ExecutionStatus`] and are enforced by the mutating methods of
//! [`Execution`]; the repository repeats the check as a conditional update so
//! a stale copy can never overwrite a terminal record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::LifecycleError;

/// Status of one delivery attempt
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ExecutionStatus {
    /// Record created, nothing sent yet
    Started,
    /// Outbound request body recorded, waiting for the target's answer
    Pending,
    /// Target answered with a success status
    Success,
    /// Target answered with a failure status, or the call itself failed
    Error,
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }

    /// Whether `next` is a legal successor of this status
    pub fn can_transition_to(self, next: ExecutionStatus) -> bool {
        matches!(
            (self, next),
            (Self::Started, Self::Pending) | (Self::Pending, Self::Success) | (Self::Pending, Self::Error)
        )
    }
}

/// Who asked for an execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExecutionTrigger {
    /// Fired by the cron scheduler
    Automatic,
    /// Requested by a user
    Manual { user_id: String },
}

impl ExecutionTrigger {
    pub fn is_manual(&self) -> bool {
        matches!(self, Self::Manual { .. })
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Automatic => None,
            Self::Manual { user_id } => Some(user_id),
        }
    }
}

impl std::fmt::Display for ExecutionTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Automatic => write!(f, "automatic"),
            Self::Manual { user_id } => write!(f, "manual ({user_id})"),
        }
    }
}

/// One tracked delivery attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    pub id: Uuid,
    pub integration_id: Uuid,
    pub manual: bool,
    pub status: ExecutionStatus,
    pub description: Option<String>,
    pub started_at: DateTime<Utc>,
    /// Set only when a terminal status is reached
    pub finished_at: Option<DateTime<Utc>>,
    /// Serialized outbound request, set once when entering PENDING
    pub request_body: Option<String>,
    /// Initiating user for manual executions
    pub initiated_by: Option<String>,
}

impl Execution {
    /// Create a new execution in the STARTED state
    pub fn start(
        integration_id: Uuid,
        trigger: &ExecutionTrigger,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            integration_id,
            manual: trigger.is_manual(),
            status: ExecutionStatus::Started,
            description,
            started_at: now,
            finished_at: None,
            request_body: None,
            initiated_by: trigger.user_id().map(str::to_string),
        }
    }

    fn ensure_transition(&self, next: ExecutionStatus) -> Result<(), LifecycleError> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(LifecycleError::IllegalTransition {
                execution_id: self.id,
                from: self.status,
                to: next,
            })
        }
    }

    /// Record the outbound request body and move STARTED -> PENDING
    pub fn record_request(&mut self, body: String) -> Result<(), LifecycleError> {
        self.ensure_transition(ExecutionStatus::Pending)?;
        if self.request_body.is_some() {
            return Err(LifecycleError::RequestAlreadyRecorded {
                execution_id: self.id,
            });
        }

        self.request_body = Some(body);
        self.status = ExecutionStatus::Pending;
        Ok(())
    }

    /// Attach the target's answer and move PENDING -> SUCCESS or ERROR
    pub fn record_response(
        &mut self,
        response: &ExecutionResponse,
    ) -> Result<ExecutionStatus, LifecycleError> {
        if response.execution_id != self.id {
            return Err(LifecycleError::ResponseMismatch {
                execution_id: self.id,
                response_execution_id: response.execution_id,
            });
        }

        let next = if response.is_success() {
            ExecutionStatus::Success
        } else {
            ExecutionStatus::Error
        };
        self.ensure_transition(next)?;

        self.status = next;
        self.finished_at = Some(Utc::now());
        Ok(next)
    }
}

/// What the delivery target answered for one execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResponse {
    pub execution_id: Uuid,
    pub responded_at: DateTime<Utc>,
    pub status_code: u16,
    pub body: String,
}

impl ExecutionResponse {
    pub fn new(execution_id: Uuid, status_code: u16, body: impl Into<String>) -> Self {
        Self {
            execution_id,
            responded_at: Utc::now(),
            status_code,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// An execution together with its response, if one was recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub execution: Execution,
    pub response: Option<ExecutionResponse>,
}
