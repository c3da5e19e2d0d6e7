//! Per-job ingestion pipeline
//!
//! Each sync job pairs a [`FetchProducer`] that pages through the upstream
//! catalog with a [`SendConsumer`] that delivers items one at a time. They
//! meet at a bounded [`ItemQueue`].

pub mod fetch_producer;
pub mod item_queue;
pub mod job;
pub mod send_consumer;

pub use fetch_producer::{FetchProducer, FetchReport};
pub use item_queue::ItemQueue;
pub use job::{IntegrationJobExecutor, ItemQueueRegistry, PendingItems};
pub use send_consumer::{ConsumerReport, SendConsumer};
