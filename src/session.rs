//! The facade a UI layer talks to: one runner and one notification system per session.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::{
    domain::{ExpenseInstance, PaymentStatus},
    errors::Result,
    notifications::{
        NotificationChannel, NotificationState, NotificationSystem, ReminderPolicy,
        ReminderReport,
    },
    rollover::RolloverStatus,
    scheduler::AutoSchedulerRunner,
    store::{ExpenseInstanceStore, RecurringTemplateStore},
    time::Clock,
};

/// Result of a mount: the rollover status plus whatever reminder work happened.
#[derive(Debug, Clone)]
pub struct MountOutcome {
    pub status: RolloverStatus,
    pub notifications: NotificationState,
    pub reminders: ReminderReport,
}

pub struct SchedulerSession {
    clock: Arc<dyn Clock>,
    instances: Arc<dyn ExpenseInstanceStore>,
    runner: AutoSchedulerRunner,
    notifications: NotificationSystem,
}

impl SchedulerSession {
    pub fn new(
        clock: Arc<dyn Clock>,
        templates: Arc<dyn RecurringTemplateStore>,
        instances: Arc<dyn ExpenseInstanceStore>,
        channel: Arc<dyn NotificationChannel>,
        policy: ReminderPolicy,
    ) -> Self {
        let runner = AutoSchedulerRunner::new(clock.clone(), templates, instances.clone());
        Self {
            clock,
            instances,
            runner,
            notifications: NotificationSystem::new(channel, policy),
        }
    }

    pub fn runner(&self) -> &AutoSchedulerRunner {
        &self.runner
    }

    pub fn notifications(&self) -> &NotificationSystem {
        &self.notifications
    }

    /// Runs the scheduler, then brings notifications up and schedules reminders.
    /// Only scheduler failures are returned.
    pub async fn on_mount(&self) -> Result<MountOutcome> {
        let status = self.runner.run().await?;
        let notifications = self.notifications.initialize().await;
        let reminders = self.refresh_reminders().await;
        Ok(MountOutcome {
            status,
            notifications,
            reminders,
        })
    }

    /// Re-evaluates reminders: pending instances from any month (earlier months
    /// are already overdue) plus paid ones in the current month for cancellation.
    pub async fn refresh_reminders(&self) -> ReminderReport {
        if !self.notifications.is_initialized() {
            return ReminderReport::default();
        }
        let current = self.runner.current_year_month();
        match self.instances.list_all().await {
            Ok(mut instances) => {
                instances.retain(|instance| {
                    instance.status == PaymentStatus::Pending || instance.year_month == current
                });
                self.notifications
                    .schedule_reminders(&instances, self.clock.today())
                    .await
            }
            Err(err) => {
                warn!(year_month = %current, "could not load instances for reminders: {}", err);
                ReminderReport::default()
            }
        }
    }

    pub async fn trigger_reset(&self) -> Result<usize> {
        let updated = self.runner.trigger_reset().await?;
        self.refresh_reminders().await;
        Ok(updated)
    }

    pub async fn record_payment(&self, instance_id: Uuid) -> Result<ExpenseInstance> {
        let paid = self.runner.record_payment(instance_id).await?;
        self.notifications.cancel_reminder(paid.id).await;
        self.refresh_reminders().await;
        Ok(paid)
    }
}
