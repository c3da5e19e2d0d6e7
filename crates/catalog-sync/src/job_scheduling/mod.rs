//! Job scheduling subsystem
//!
//! Whole-integration sync jobs flow through three components:
//! - `ScheduleManager`: owns the installed cron trigger set and fires it
//! - `PriorityTaskQueue`: orders pending jobs, automatic before manual
//! - `TaskDispatcher`: a single worker running one job at a time
//!
//! `JobSchedulingApi` is the read-only monitoring and manual trigger façade.

pub mod api;
pub mod cron_scheduler;
pub mod dispatcher;
pub mod task_queue;
pub mod types;

pub use api::JobSchedulingApi;
pub use cron_scheduler::{CronTrigger, FireReport, RefreshOutcome, ScheduleManager, TriggerSummary};
pub use dispatcher::{DispatcherStats, TaskDispatcher, TaskRunner};
pub use task_queue::PriorityTaskQueue;
pub use types::*;
