//! SeaORM repositories
//!
//! Each repository holds an `Arc<DatabaseConnection>` and implements one of
//! the collaborator traits the execution engine depends on.

pub mod execution;
pub mod integration;
pub mod traits;

pub use execution::ExecutionSeaOrmRepository;
pub use integration::IntegrationSeaOrmRepository;
pub use traits::{ExecutionStore, IntegrationCatalog};
