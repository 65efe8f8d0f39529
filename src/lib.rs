#![doc(test(attr(deny(warnings))))]

//! Recurring Core materializes monthly expense instances from recurring
//! templates, detects month rollovers, and drives due-date reminders, with
//! at-most-once guarantees per session.

pub mod config;
pub mod domain;
pub mod errors;
pub mod generator;
pub mod notifications;
pub mod rollover;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod time;
pub mod utils;

use std::sync::Once;

pub use domain::{ExpenseInstance, PaymentStatus, RecurringTemplate, TemplateId, YearMonth};
pub use errors::{Result, SchedulerError};
pub use generator::{CommitReport, RecurringInstanceGenerator};
pub use notifications::{
    NotificationChannel, NotificationState, NotificationSystem, Reminder, ReminderPolicy,
    ReminderReport, ReminderUrgency,
};
pub use rollover::{MonthRolloverDetector, MonthTotals, RolloverStatus};
pub use scheduler::{AutoSchedulerRunner, RunnerPhase};
pub use session::{MountOutcome, SchedulerSession};
pub use time::{Clock, ManualClock, SystemClock};

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init(log_filter: Option<&str>) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(log_filter);
        tracing::info!("Recurring Core tracing initialized.");
    });
}
