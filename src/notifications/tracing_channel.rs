use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use super::{NotificationChannel, Reminder, ReminderUrgency};
use crate::errors::Result;

/// Delivers reminders as log events. Registration always succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingChannel;

#[async_trait]
impl NotificationChannel for TracingChannel {
    async fn register(&self) -> Result<()> {
        info!("log-based reminder channel ready");
        Ok(())
    }

    async fn schedule(&self, reminder: &Reminder) -> Result<()> {
        let when = match reminder.urgency {
            ReminderUrgency::Overdue => "overdue since",
            _ => "due",
        };
        info!(
            instance = %reminder.instance_id,
            "reminder: `{}` {} {}",
            reminder.title,
            when,
            reminder.due_date
        );
        Ok(())
    }

    async fn cancel(&self, instance_id: Uuid) -> Result<()> {
        tracing::debug!(instance = %instance_id, "reminder cancelled");
        Ok(())
    }
}
