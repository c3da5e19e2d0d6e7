//! Centralized error handling for the catalog synchronization service
//!
//! This module provides the error hierarchy shared by every layer of the
//! service, from the persistence layer up to the execution engine.
//!
//! # Error Categories
//!
//! - **Database Errors**: SeaORM operations, migrations, connection issues
//! - **Repository Errors**: Data access layer failures
//! - **Source Errors**: Upstream catalog connectivity and parsing
//! - **Delivery Errors**: Token acquisition and outbound delivery failures
//! - **Lifecycle Errors**: Rejected execution state transitions
//! - **Validation Errors**: Integration definitions rejected at write time
//!
//! # Usage
//!
//! ```rust
//! use catalog_sync::errors::{AppError, AppResult};
//!
//! async fn example_function() -> AppResult<String> {
//!     Ok("success".to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for Repository Results
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Convenience type alias for Source Results
pub type SourceResult<T> = Result<T, SourceError>;

/// Convenience type alias for Delivery Results
pub type DeliveryResult<T> = Result<T, DeliveryError>;
