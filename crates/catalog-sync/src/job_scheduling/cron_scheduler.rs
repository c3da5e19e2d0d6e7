//! Dynamic cron scheduling
//!
//! The [`ScheduleManager`] owns the installed trigger set. Integrations are
//! grouped by their exact cron expression string and each group becomes one
//! [`CronTrigger`]. A refresh builds a complete new set and swaps it in under
//! one write lock; the pump always fires against an `Arc` snapshot, so a fire
//! that is already running finishes with the set it started with.
//!
//! Firing a trigger only enqueues automatic tasks on the dispatcher. The
//! dispatcher's single worker is what serializes the actual sync jobs.

use chrono::{DateTime, Utc};
use cron::Schedule;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Notify, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::dispatcher::TaskDispatcher;
use super::types::{JobSchedulingError, PriorityTask};
use crate::database::repositories::IntegrationCatalog;
use crate::errors::AppResult;
use crate::models::Integration;
use crate::utils::cron_helper;

/// Upper bound on one pump sleep when nothing is scheduled
const IDLE_WAIT: Duration = Duration::from_secs(3600);

/// All integrations sharing one cron expression
#[derive(Debug, Clone)]
pub struct CronTrigger {
    pub expression: String,
    schedule: Schedule,
    pub integrations: Vec<Integration>,
}

impl CronTrigger {
    pub fn next_after(&self, after: &DateTime<Utc>) -> Option<DateTime<Utc>> {
        cron_helper::next_after(&self.schedule, after)
    }

    pub fn summary(&self, now: &DateTime<Utc>) -> TriggerSummary {
        TriggerSummary {
            expression: self.expression.clone(),
            integration_ids: self.integrations.iter().map(|i| i.id).collect(),
            next_fire: self.next_after(now),
        }
    }
}

#[derive(Debug, Default)]
struct TriggerSet {
    generation: u64,
    triggers: Vec<CronTrigger>,
}

/// Result of a refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Automatic sending is switched off; nothing was installed
    Disabled,
    Installed {
        generation: u64,
        triggers: usize,
        integrations: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FireReport {
    pub dispatched: usize,
    pub failed: usize,
}

/// Monitoring view of one installed trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerSummary {
    pub expression: String,
    pub integration_ids: Vec<Uuid>,
    pub next_fire: Option<DateTime<Utc>>,
}

pub struct ScheduleManager {
    catalog: Arc<dyn IntegrationCatalog>,
    dispatcher: Arc<TaskDispatcher>,
    auto_send_enabled: bool,
    triggers: RwLock<Arc<TriggerSet>>,
    /// Serializes concurrent refresh calls
    refresh_lock: Mutex<()>,
    refreshed: Notify,
    generation: AtomicU64,
}

impl ScheduleManager {
    pub fn new(
        catalog: Arc<dyn IntegrationCatalog>,
        dispatcher: Arc<TaskDispatcher>,
        auto_send_enabled: bool,
    ) -> Self {
        Self {
            catalog,
            dispatcher,
            auto_send_enabled,
            triggers: RwLock::new(Arc::new(TriggerSet::default())),
            refresh_lock: Mutex::new(()),
            refreshed: Notify::new(),
            generation: AtomicU64::new(0),
        }
    }

    pub fn auto_send_enabled(&self) -> bool {
        self.auto_send_enabled
    }

    /// Rebuild the trigger set from the catalog and swap it in
    ///
    /// When the catalog cannot be read the previous triggers are still torn
    /// down and an empty set is installed before the error is returned.
    pub async fn refresh(&self) -> AppResult<RefreshOutcome> {
        if !self.auto_send_enabled {
            debug!("Automatic sending disabled, skipping schedule refresh");
            return Ok(RefreshOutcome::Disabled);
        }

        let _guard = self.refresh_lock.lock().await;
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;

        let integrations = match self.catalog.load_all().await {
            Ok(integrations) => integrations,
            Err(e) => {
                error!("Failed to load integrations for schedule refresh: {}", e);
                self.install(TriggerSet {
                    generation,
                    triggers: Vec::new(),
                })
                .await;
                return Err(e.into());
            }
        };

        let integration_count = integrations.len();
        let triggers = Self::build_triggers(integrations);
        let trigger_count = triggers.len();

        self.install(TriggerSet {
            generation,
            triggers,
        })
        .await;

        info!(
            "Installed {} cron trigger(s) for {} integration(s) (generation {})",
            trigger_count, integration_count, generation
        );

        Ok(RefreshOutcome::Installed {
            generation,
            triggers: trigger_count,
            integrations: integration_count,
        })
    }

    async fn install(&self, set: TriggerSet) {
        *self.triggers.write().await = Arc::new(set);
        self.refreshed.notify_one();
    }

    /// Group by exact expression string; unparsable groups are skipped
    fn build_triggers(integrations: Vec<Integration>) -> Vec<CronTrigger> {
        let mut groups: BTreeMap<String, Vec<Integration>> = BTreeMap::new();
        for integration in integrations {
            groups
                .entry(integration.cron_expression.clone())
                .or_default()
                .push(integration);
        }

        groups
            .into_iter()
            .filter_map(|(expression, integrations)| {
                match cron_helper::parse_schedule(&expression) {
                    Ok(schedule) => Some(CronTrigger {
                        expression,
                        schedule,
                        integrations,
                    }),
                    Err(reason) => {
                        let error = JobSchedulingError::InvalidCron { expression, reason };
                        warn!(
                            "Skipping {} integration(s) with unusable schedule: {}",
                            integrations.len(),
                            error
                        );
                        None
                    }
                }
            })
            .collect()
    }

    async fn snapshot(&self) -> Arc<TriggerSet> {
        self.triggers.read().await.clone()
    }

    pub async fn installed_triggers(&self) -> Vec<TriggerSummary> {
        let now = Utc::now();
        self.snapshot()
            .await
            .triggers
            .iter()
            .map(|trigger| trigger.summary(&now))
            .collect()
    }

    pub async fn generation(&self) -> u64 {
        self.snapshot().await.generation
    }

    /// Dispatch every integration of a trigger, one after another
    pub async fn fire(&self, trigger: &CronTrigger) -> FireReport {
        let mut report = FireReport::default();
        info!(
            "Cron trigger '{}' fired for {} integration(s)",
            trigger.expression,
            trigger.integrations.len()
        );

        for integration in &trigger.integrations {
            let task = PriorityTask::automatic(integration.clone(), Utc::now());
            match self.dispatcher.execute(task).await {
                Ok(()) => report.dispatched += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(
                        "Failed to dispatch integration '{}' ({}): {}",
                        integration.name, integration.id, e
                    );
                }
            }
        }

        report
    }

    /// Fire the installed trigger for `expression` immediately
    pub async fn fire_expression(&self, expression: &str) -> Option<FireReport> {
        let set = self.snapshot().await;
        let trigger = set.triggers.iter().find(|t| t.expression == expression)?;
        Some(self.fire(trigger).await)
    }

    /// Cron pump: sleep until the earliest fire time, fire, repeat
    ///
    /// Triggers fire one at a time. A trigger whose fire time passed while
    /// another was firing fires once, then reschedules from the current time.
    pub async fn run(&self, cancellation_token: CancellationToken) -> anyhow::Result<()> {
        info!("Starting cron schedule pump");

        let mut set = self.snapshot().await;
        let mut next_fires = Self::next_fire_times(&set, &Utc::now());

        loop {
            let wait = next_fires
                .iter()
                .flatten()
                .min()
                .map(|due| (*due - Utc::now()).to_std().unwrap_or(Duration::ZERO))
                .unwrap_or(IDLE_WAIT);

            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    info!("Cron schedule pump received cancellation signal");
                    break;
                }
                _ = self.refreshed.notified() => {
                    set = self.snapshot().await;
                    next_fires = Self::next_fire_times(&set, &Utc::now());
                    debug!("Cron pump picked up trigger set generation {}", set.generation);
                    continue;
                }
                _ = tokio::time::sleep(wait) => {}
            }

            let now = Utc::now();
            for (trigger, next_fire) in set.triggers.iter().zip(next_fires.iter_mut()) {
                if next_fire.is_some_and(|due| due <= now) {
                    self.fire(trigger).await;
                    *next_fire = trigger.next_after(&Utc::now());
                }
            }
        }

        info!("Cron schedule pump stopped");
        Ok(())
    }

    fn next_fire_times(set: &TriggerSet, now: &DateTime<Utc>) -> Vec<Option<DateTime<Utc>>> {
        set.triggers.iter().map(|t| t.next_after(now)).collect()
    }
}
