//! Upstream catalog sources
//!
//! A source yields one page of records per call. The fetch producer drives
//! the paging loop; sources know nothing about queues or executions.

pub mod catalog_api;
pub mod traits;

pub use catalog_api::CatalogApiSource;
pub use traits::{PageSource, SourceRecord};
