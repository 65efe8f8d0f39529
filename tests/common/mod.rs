#![allow(dead_code)]

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use recurring_core::{
    store::InMemoryStore, AutoSchedulerRunner, ManualClock, NotificationChannel, RecurringTemplate,
    Reminder, ReminderPolicy, SchedulerError, SchedulerSession, YearMonth,
};
use tempfile::TempDir;
use uuid::Uuid;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates an isolated directory that outlives the calling test.
pub fn temp_dir() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let path = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    path
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn ym(raw: &str) -> YearMonth {
    raw.parse().expect("valid year-month")
}

pub fn rent() -> RecurringTemplate {
    RecurringTemplate::new("rent", "Rent", 1000.0, 1).expect("valid template")
}

pub fn gym() -> RecurringTemplate {
    RecurringTemplate::new("gym", "Gym", 35.0, 20)
        .expect("valid template")
        .with_category("Health")
}

/// Notification channel that records every call.
#[derive(Default)]
pub struct CountingChannel {
    pub registrations: AtomicUsize,
    pub scheduled: Mutex<HashMap<Uuid, Reminder>>,
    pub cancelled: Mutex<Vec<Uuid>>,
    pub fail_register: Mutex<Option<String>>,
    pub fail_schedule: bool,
    pub register_delay: Option<Duration>,
}

impl CountingChannel {
    pub fn failing(reason: &str) -> Self {
        Self {
            fail_register: Mutex::new(Some(reason.to_string())),
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            register_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }

    pub fn scheduled_ids(&self) -> Vec<Uuid> {
        self.scheduled.lock().unwrap().keys().copied().collect()
    }

    pub fn heal(&self) {
        *self.fail_register.lock().unwrap() = None;
    }
}

#[async_trait]
impl NotificationChannel for CountingChannel {
    async fn register(&self) -> recurring_core::Result<()> {
        self.registrations.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.register_delay {
            tokio::time::sleep(delay).await;
        }
        match self.fail_register.lock().unwrap().clone() {
            Some(reason) => Err(SchedulerError::NotificationInit(reason)),
            None => Ok(()),
        }
    }

    async fn schedule(&self, reminder: &Reminder) -> recurring_core::Result<()> {
        if self.fail_schedule {
            return Err(SchedulerError::NotificationDelivery("quota exceeded".into()));
        }
        self.scheduled
            .lock()
            .unwrap()
            .insert(reminder.instance_id, reminder.clone());
        Ok(())
    }

    async fn cancel(&self, instance_id: Uuid) -> recurring_core::Result<()> {
        self.scheduled.lock().unwrap().remove(&instance_id);
        self.cancelled.lock().unwrap().push(instance_id);
        Ok(())
    }
}

pub struct Fixture {
    pub clock: Arc<ManualClock>,
    pub store: Arc<InMemoryStore>,
}

impl Fixture {
    pub fn new(today: NaiveDate) -> Self {
        Self::with_store(today, InMemoryStore::new())
    }

    pub fn with_store(today: NaiveDate, store: InMemoryStore) -> Self {
        Self {
            clock: Arc::new(ManualClock::at_date(today)),
            store: Arc::new(store),
        }
    }

    pub fn runner(&self) -> AutoSchedulerRunner {
        AutoSchedulerRunner::new(self.clock.clone(), self.store.clone(), self.store.clone())
    }

    pub fn session(&self, channel: Arc<CountingChannel>) -> SchedulerSession {
        SchedulerSession::new(
            self.clock.clone(),
            self.store.clone(),
            self.store.clone(),
            channel,
            ReminderPolicy::default(),
        )
    }
}
