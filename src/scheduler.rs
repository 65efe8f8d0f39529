//! Orchestrates instance generation and rollover detection for one session.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use chrono::NaiveDate;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    domain::{ExpenseInstance, PaymentStatus, YearMonth},
    errors::Result,
    generator::RecurringInstanceGenerator,
    rollover::{MonthRolloverDetector, RolloverStatus},
    store::{ExpenseInstanceStore, RecurringTemplateStore},
    time::Clock,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerPhase {
    Idle,
    Running,
}

#[derive(Debug, Default)]
struct RunState {
    last_run_year_month: Option<YearMonth>,
    cached: Option<RolloverStatus>,
}

/// Runs reconciliation at most once per month per session.
///
/// The state lock is held for the whole run, so a caller arriving while a run
/// is in flight waits for it and then receives its cached result.
pub struct AutoSchedulerRunner {
    clock: Arc<dyn Clock>,
    templates: Arc<dyn RecurringTemplateStore>,
    instances: Arc<dyn ExpenseInstanceStore>,
    state: Mutex<RunState>,
    running: AtomicBool,
}

impl AutoSchedulerRunner {
    pub fn new(
        clock: Arc<dyn Clock>,
        templates: Arc<dyn RecurringTemplateStore>,
        instances: Arc<dyn ExpenseInstanceStore>,
    ) -> Self {
        Self {
            clock,
            templates,
            instances,
            state: Mutex::new(RunState::default()),
            running: AtomicBool::new(false),
        }
    }

    pub fn phase(&self) -> RunnerPhase {
        if self.running.load(Ordering::SeqCst) {
            RunnerPhase::Running
        } else {
            RunnerPhase::Idle
        }
    }

    pub async fn last_run_year_month(&self) -> Option<YearMonth> {
        self.state.lock().await.last_run_year_month
    }

    pub fn current_year_month(&self) -> YearMonth {
        YearMonth::from_date(self.clock.today())
    }

    pub async fn run(&self) -> Result<RolloverStatus> {
        let mut state = self.state.lock().await;
        let today = self.clock.today();
        let current = YearMonth::from_date(today);
        if state.last_run_year_month == Some(current) {
            if let Some(cached) = &state.cached {
                debug!(year_month = %current, "scheduler already ran this month");
                return Ok(cached.clone());
            }
        }

        let outcome = {
            let _running = RunningGuard::enter(&self.running);
            self.reconcile_month(today).await
        };

        let status = outcome.map_err(|err| {
            warn!(year_month = %current, "scheduler run aborted: {}", err);
            err
        })?;
        state.last_run_year_month = Some(current);
        state.cached = Some(status.clone());
        Ok(status)
    }

    /// Drops the cached result so the next `run` re-reads the stores.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        state.last_run_year_month = None;
        state.cached = None;
    }

    /// Marks every instance of the current month Pending after the user
    /// confirms the rollover prompt.
    pub async fn trigger_reset(&self) -> Result<usize> {
        let mut state = self.state.lock().await;
        let current = self.current_year_month();
        let updated = self
            .instances
            .bulk_set_status(current, PaymentStatus::Pending, self.clock.now())
            .await?;
        state.last_run_year_month = None;
        state.cached = None;
        info!(year_month = %current, updated, "reset current month payments to pending");
        Ok(updated)
    }

    pub async fn record_payment(&self, instance_id: Uuid) -> Result<ExpenseInstance> {
        let mut state = self.state.lock().await;
        let paid = self
            .instances
            .mark_paid(instance_id, self.clock.now())
            .await?;
        state.last_run_year_month = None;
        state.cached = None;
        info!(instance = %paid.id, name = %paid.name, "recorded payment");
        Ok(paid)
    }

    async fn reconcile_month(&self, today: NaiveDate) -> Result<RolloverStatus> {
        let current = YearMonth::from_date(today);
        let templates = self.templates.list_active().await?;
        let existing = self.instances.list_for_month(current).await?;

        let plan = RecurringInstanceGenerator::reconcile(&templates, &existing, current);
        let report = RecurringInstanceGenerator::commit(self.instances.as_ref(), plan).await?;

        let all = self.instances.list_all().await?;
        let status = MonthRolloverDetector::detect(today, &all);
        info!(
            year_month = %current,
            created = report.created.len(),
            already_present = report.already_present,
            is_new_month = status.is_new_month,
            "reconciled recurring instances"
        );
        Ok(status)
    }
}

/// Holds the Running phase for as long as it lives, including when a run is cancelled.
struct RunningGuard<'a>(&'a AtomicBool);

impl<'a> RunningGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
