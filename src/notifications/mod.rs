//! One-time notification channel registration and due-date reminders.

pub mod tracing_channel;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    domain::{ExpenseInstance, PaymentStatus},
    errors::Result,
};

pub use tracing_channel::TracingChannel;

pub const DEFAULT_LOOKAHEAD_DAYS: i64 = 3;

/// A local reminder, keyed by the instance it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reminder {
    pub instance_id: Uuid,
    pub title: String,
    pub due_date: NaiveDate,
    pub urgency: ReminderUrgency,
}

/// Background delivery channel for local notifications.
///
/// Scheduling an id that is already scheduled must replace the earlier reminder.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Checks permission/capability and registers the channel.
    async fn register(&self) -> Result<()>;

    async fn schedule(&self, reminder: &Reminder) -> Result<()>;

    async fn cancel(&self, instance_id: Uuid) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationState {
    Uninitialized,
    Initializing,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReminderUrgency {
    Overdue,
    DueSoon,
    Later,
}

impl ReminderUrgency {
    pub fn classify(due: NaiveDate, today: NaiveDate, lookahead_days: i64) -> ReminderUrgency {
        if due < today {
            return ReminderUrgency::Overdue;
        }
        let cutoff = today + Duration::days(lookahead_days.max(0));
        if due <= cutoff {
            ReminderUrgency::DueSoon
        } else {
            ReminderUrgency::Later
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderPolicy {
    pub lookahead_days: i64,
}

impl Default for ReminderPolicy {
    fn default() -> Self {
        Self {
            lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderReport {
    pub scheduled: Vec<Uuid>,
    pub cancelled: Vec<Uuid>,
    pub failed: usize,
}

/// Session-wide notification state machine.
///
/// `initialize` registers the channel at most once while Ready or
/// Initializing; failures leave the system in `Failed` and are never raised.
pub struct NotificationSystem {
    channel: Arc<dyn NotificationChannel>,
    policy: ReminderPolicy,
    state: Mutex<NotificationState>,
}

impl NotificationSystem {
    pub fn new(channel: Arc<dyn NotificationChannel>, policy: ReminderPolicy) -> Self {
        Self {
            channel,
            policy,
            state: Mutex::new(NotificationState::Uninitialized),
        }
    }

    pub fn state(&self) -> NotificationState {
        self.lock_state().clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.state() == NotificationState::Ready
    }

    pub fn policy(&self) -> ReminderPolicy {
        self.policy
    }

    pub async fn initialize(&self) -> NotificationState {
        {
            let mut state = self.lock_state();
            if matches!(
                *state,
                NotificationState::Ready | NotificationState::Initializing
            ) {
                debug!("notification system already {:?}", *state);
                return state.clone();
            }
            *state = NotificationState::Initializing;
        }

        let attempt = InitAttempt {
            state: &self.state,
            settled: false,
        };
        let next = match self.channel.register().await {
            Ok(()) => {
                info!("notification channel registered");
                NotificationState::Ready
            }
            Err(err) => {
                warn!("notifications disabled for this session: {}", err);
                NotificationState::Failed(err.to_string())
            }
        };
        attempt.settle(next.clone());
        next
    }

    /// Schedules reminders for pending instances that are overdue or due within
    /// the lookahead window, and cancels reminders for paid ones.
    pub async fn schedule_reminders(
        &self,
        instances: &[ExpenseInstance],
        today: NaiveDate,
    ) -> ReminderReport {
        let mut report = ReminderReport::default();
        if !self.is_initialized() {
            debug!("skipping reminders; notification system not ready");
            return report;
        }

        for instance in instances {
            match instance.status {
                PaymentStatus::Paid => match self.channel.cancel(instance.id).await {
                    Ok(()) => report.cancelled.push(instance.id),
                    Err(err) => {
                        warn!(instance = %instance.id, "failed to cancel reminder: {}", err);
                        report.failed += 1;
                    }
                },
                PaymentStatus::Pending => {
                    let due_date = instance.due_date();
                    let urgency =
                        ReminderUrgency::classify(due_date, today, self.policy.lookahead_days);
                    if urgency == ReminderUrgency::Later {
                        continue;
                    }
                    let reminder = Reminder {
                        instance_id: instance.id,
                        title: instance.name.clone(),
                        due_date,
                        urgency,
                    };
                    match self.channel.schedule(&reminder).await {
                        Ok(()) => report.scheduled.push(instance.id),
                        Err(err) => {
                            warn!(instance = %instance.id, "failed to schedule reminder: {}", err);
                            report.failed += 1;
                        }
                    }
                }
            }
        }
        report
    }

    /// Cancels the reminder for one instance, for example right after it is paid.
    pub async fn cancel_reminder(&self, instance_id: Uuid) -> bool {
        if !self.is_initialized() {
            return false;
        }
        match self.channel.cancel(instance_id).await {
            Ok(()) => true,
            Err(err) => {
                warn!(instance = %instance_id, "failed to cancel reminder: {}", err);
                false
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, NotificationState> {
        lock(&self.state)
    }
}

/// Owns the `Initializing` state for one registration attempt. Dropping it
/// unsettled (the `initialize` future was cancelled) returns the system to
/// `Uninitialized` so a later call registers again.
struct InitAttempt<'a> {
    state: &'a Mutex<NotificationState>,
    settled: bool,
}

impl InitAttempt<'_> {
    fn settle(mut self, next: NotificationState) {
        *lock(self.state) = next;
        self.settled = true;
    }
}

impl Drop for InitAttempt<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = lock(self.state);
        if *state == NotificationState::Initializing {
            debug!("notification registration cancelled");
            *state = NotificationState::Uninitialized;
        }
    }
}

fn lock(state: &Mutex<NotificationState>) -> MutexGuard<'_, NotificationState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
