//! Error type definitions for the catalog synchronization service
//!
//! The hierarchy mirrors the error taxonomy of the execution engine: write-time
//! validation failures, per-item delivery failures, lifecycle bookkeeping
//! failures and upstream fetch failures each get their own enum so callers can
//! decide which ones are recorded and which ones propagate.

use thiserror::Error;
use uuid::Uuid;

use crate::models::ExecutionStatus;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors (SeaORM)
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Repository layer errors
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Upstream catalog errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Outbound delivery errors
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    /// Execution lifecycle violations
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Resource not found errors
    #[error("Not found: {resource} with id {id}")]
    NotFound { resource: String, id: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Repository layer specific errors
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Database errors from SeaORM
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Data serialization/deserialization failures
    #[error("Serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    /// Record not found
    #[error("Record not found: {table} with {field} = {value}")]
    RecordNotFound {
        table: String,
        field: String,
        value: String,
    },

    /// A conditional update matched no row because the stored state moved on
    #[error("Concurrent modification: {table} {id} is no longer in state {expected}")]
    ConcurrentModification {
        table: String,
        id: String,
        expected: String,
    },

    /// A stored value could not be mapped back to the domain model
    #[error("Invalid stored value: {column} = {value}")]
    InvalidStoredValue { column: String, value: String },
}

/// Upstream catalog specific errors
#[derive(Error, Debug)]
pub enum SourceError {
    /// Transport failures while talking to the upstream catalog
    #[error("Transport error: {url} - {message}")]
    Transport { url: String, message: String },

    /// Non-success HTTP status from the upstream catalog
    #[error("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    /// Parsing errors for upstream page payloads
    #[error("Parse error: page {page} - {message}")]
    ParseError { page: u32, message: String },

    /// Invalid source configuration
    #[error("Invalid configuration: {field} - {message}")]
    InvalidConfig { field: String, message: String },
}

/// Outbound delivery specific errors
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// The auth provider could not produce an access token
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Transport failures while talking to the delivery target
    #[error("Transport error: {url} - {message}")]
    Transport { url: String, message: String },

    /// The delivery target configuration cannot be used
    #[error("Invalid target: {message}")]
    InvalidTarget { message: String },

    /// The item could not be serialized to its outbound wire form
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Rejected execution lifecycle transitions
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// The requested transition is not part of STARTED -> PENDING -> {SUCCESS, ERROR}
    #[error("Illegal transition for execution {execution_id}: {from} -> {to}")]
    IllegalTransition {
        execution_id: Uuid,
        from: ExecutionStatus,
        to: ExecutionStatus,
    },

    /// The outbound request body can only be recorded once
    #[error("Request already recorded for execution {execution_id}")]
    RequestAlreadyRecorded { execution_id: Uuid },

    /// The response belongs to another execution
    #[error("Response for execution {response_execution_id} cannot be attached to execution {execution_id}")]
    ResponseMismatch {
        execution_id: Uuid,
        response_execution_id: Uuid,
    },
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<R: Into<String>, I: ToString>(resource: R, id: I) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error was raised by write-time validation
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

impl RepositoryError {
    pub fn not_found<T: Into<String>, F: Into<String>, V: ToString>(
        table: T,
        field: F,
        value: V,
    ) -> Self {
        Self::RecordNotFound {
            table: table.into(),
            field: field.into(),
            value: value.to_string(),
        }
    }
}

impl SourceError {
    /// Create a transport error for an upstream request
    pub fn transport<U: Into<String>, M: ToString>(url: U, message: M) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a parse error for an upstream page
    pub fn parse<M: Into<String>>(page: u32, message: M) -> Self {
        Self::ParseError {
            page,
            message: message.into(),
        }
    }
}

impl DeliveryError {
    /// Create an authentication error
    pub fn authentication<M: ToString>(message: M) -> Self {
        Self::Authentication {
            message: message.to_string(),
        }
    }

    /// Create a transport error for an outbound call
    pub fn transport<U: Into<String>, M: ToString>(url: U, message: M) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.to_string(),
        }
    }
}
