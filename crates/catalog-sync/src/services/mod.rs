//! Service layer
//!
//! Services sit between the execution engine and its collaborators: the
//! execution service owns the lifecycle bookkeeping, the integration service
//! validates definitions before they reach the catalog, and the auth and
//! delivery services talk to the downstream target.
//!
//! Services depend on the repository traits rather than the SeaORM
//! implementations so the engine can run against in-memory fakes.

pub mod auth;
pub mod delivery;
pub mod execution_service;
pub mod integration_service;

pub use auth::{AuthProvider, ClientCredentialsAuthProvider};
pub use delivery::{DeliveryOutcome, HttpPutSendStrategy, SendStrategy};
pub use execution_service::ExecutionService;
pub use integration_service::IntegrationService;
