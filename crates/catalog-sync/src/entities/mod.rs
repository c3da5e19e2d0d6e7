//! SeaORM entity definitions

pub mod prelude;

pub mod execution_responses;
pub mod executions;
pub mod integrations;
