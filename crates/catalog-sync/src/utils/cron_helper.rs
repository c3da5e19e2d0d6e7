//! Cron utility functions
//!
//! Expressions use the six-field form with a leading seconds column
//! (`sec min hour day-of-month month day-of-week`), an optional seventh
//! year column is accepted as well.

use chrono::{DateTime, Utc};
use cron::Schedule;
use std::str::FromStr;

/// Parse a cron expression, returning a readable message on failure
pub fn parse_schedule(cron_expression: &str) -> Result<Schedule, String> {
    Schedule::from_str(cron_expression.trim())
        .map_err(|e| format!("Invalid cron expression '{cron_expression}': {e}"))
}

/// Next fire time of an already parsed schedule strictly after `after`
pub fn next_after(schedule: &Schedule, after: &DateTime<Utc>) -> Option<DateTime<Utc>> {
    schedule.after(after).next()
}
