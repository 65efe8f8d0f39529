use std::{
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{apply_bulk_status, ensure_unique_key, ExpenseInstanceStore, RecurringTemplateStore};
use crate::{
    domain::{ExpenseInstance, PaymentStatus, RecurringTemplate, TemplateId, YearMonth},
    errors::{Result, SchedulerError},
};

/// Snapshot of how many times each store operation has been invoked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub list_active: usize,
    pub list_for_month: usize,
    pub list_all_instances: usize,
    pub create: usize,
    pub bulk_set_status: usize,
}

#[derive(Default)]
struct Counters {
    list_active: AtomicUsize,
    list_for_month: AtomicUsize,
    list_all_instances: AtomicUsize,
    create: AtomicUsize,
    bulk_set_status: AtomicUsize,
}

#[derive(Default)]
struct Records {
    templates: Vec<RecurringTemplate>,
    instances: Vec<ExpenseInstance>,
}

/// Process-local store implementing both store contracts.
///
/// Enforces the unique (template, month) key the way a remote store with a
/// unique index would, and can simulate latency and connectivity loss.
#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<Records>,
    counters: Counters,
    unavailable: AtomicBool,
    latency: Option<Duration>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation sleeps for `latency` before touching the records.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// While set, every operation fails with `StoreUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn calls(&self) -> StoreCalls {
        StoreCalls {
            list_active: self.counters.list_active.load(Ordering::SeqCst),
            list_for_month: self.counters.list_for_month.load(Ordering::SeqCst),
            list_all_instances: self.counters.list_all_instances.load(Ordering::SeqCst),
            create: self.counters.create.load(Ordering::SeqCst),
            bulk_set_status: self.counters.bulk_set_status.load(Ordering::SeqCst),
        }
    }

    /// Inserts an instance directly, bypassing the key check and call counters.
    pub async fn seed_instance(&self, instance: ExpenseInstance) {
        self.records.write().await.instances.push(instance);
    }

    pub async fn seed_template(&self, template: RecurringTemplate) {
        let mut records = self.records.write().await;
        records.templates.retain(|existing| existing.id != template.id);
        records.templates.push(template);
    }

    pub async fn snapshot_instances(&self) -> Vec<ExpenseInstance> {
        self.records.read().await.instances.clone()
    }

    async fn enter(&self, counter: &AtomicUsize) -> Result<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        self.check_available().await
    }

    async fn check_available(&self) -> Result<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SchedulerError::StoreUnavailable(
                "in-memory store marked unavailable".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl RecurringTemplateStore for InMemoryStore {
    async fn list_active(&self) -> Result<Vec<RecurringTemplate>> {
        self.enter(&self.counters.list_active).await?;
        let records = self.records.read().await;
        Ok(records
            .templates
            .iter()
            .filter(|template| template.active)
            .cloned()
            .collect())
    }

    async fn list_templates(&self) -> Result<Vec<RecurringTemplate>> {
        self.check_available().await?;
        Ok(self.records.read().await.templates.clone())
    }

    async fn upsert(&self, template: RecurringTemplate) -> Result<()> {
        self.check_available().await?;
        template.validate()?;
        self.seed_template(template).await;
        Ok(())
    }

    async fn set_active(&self, id: &TemplateId, active: bool) -> Result<()> {
        self.check_available().await?;
        let mut records = self.records.write().await;
        let template = records
            .templates
            .iter_mut()
            .find(|template| &template.id == id)
            .ok_or_else(|| SchedulerError::TemplateNotFound(id.clone()))?;
        template.active = active;
        Ok(())
    }
}

#[async_trait]
impl ExpenseInstanceStore for InMemoryStore {
    async fn list_for_month(&self, year_month: YearMonth) -> Result<Vec<ExpenseInstance>> {
        self.enter(&self.counters.list_for_month).await?;
        let records = self.records.read().await;
        Ok(records
            .instances
            .iter()
            .filter(|instance| instance.year_month == year_month)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<ExpenseInstance>> {
        self.enter(&self.counters.list_all_instances).await?;
        Ok(self.records.read().await.instances.clone())
    }

    async fn create(&self, instance: ExpenseInstance) -> Result<ExpenseInstance> {
        self.enter(&self.counters.create).await?;
        let mut records = self.records.write().await;
        ensure_unique_key(&records.instances, &instance)?;
        records.instances.push(instance.clone());
        Ok(instance)
    }

    async fn bulk_set_status(
        &self,
        year_month: YearMonth,
        status: PaymentStatus,
        at: DateTime<Utc>,
    ) -> Result<usize> {
        self.enter(&self.counters.bulk_set_status).await?;
        let mut records = self.records.write().await;
        Ok(apply_bulk_status(
            &mut records.instances,
            year_month,
            status,
            at,
        ))
    }

    async fn mark_paid(&self, id: Uuid, at: DateTime<Utc>) -> Result<ExpenseInstance> {
        self.check_available().await?;
        let mut records = self.records.write().await;
        let instance = records
            .instances
            .iter_mut()
            .find(|instance| instance.id == id)
            .ok_or(SchedulerError::InstanceNotFound(id))?;
        instance.mark_paid(at);
        Ok(instance.clone())
    }
}
