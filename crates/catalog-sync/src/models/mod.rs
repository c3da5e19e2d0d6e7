//! Domain models shared by the persistence layer and the execution engine

pub mod execution;
pub mod integration;
pub mod queue_item;

pub use execution::*;
pub use integration::*;
pub use queue_item::*;
