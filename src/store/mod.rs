//! Contracts for the external template and instance stores.

pub mod json;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    domain::{ExpenseInstance, PaymentStatus, RecurringTemplate, TemplateId, YearMonth},
    errors::{Result, SchedulerError},
};

pub use json::JsonFileStore;
pub use memory::{InMemoryStore, StoreCalls};

/// CRUD over recurring templates.
#[async_trait]
pub trait RecurringTemplateStore: Send + Sync {
    /// Templates with `active = true`. Fails with `StoreUnavailable` on connectivity loss.
    async fn list_active(&self) -> Result<Vec<RecurringTemplate>>;

    async fn list_templates(&self) -> Result<Vec<RecurringTemplate>>;

    /// Inserts the template or replaces the one sharing its id.
    async fn upsert(&self, template: RecurringTemplate) -> Result<()>;

    async fn set_active(&self, id: &TemplateId, active: bool) -> Result<()>;
}

/// CRUD over month-scoped expense instances.
///
/// Implementations may reject a second recurring instance for the same
/// (template, month) with `SchedulerError::DuplicateKey`.
#[async_trait]
pub trait ExpenseInstanceStore: Send + Sync {
    async fn list_for_month(&self, year_month: YearMonth) -> Result<Vec<ExpenseInstance>>;

    /// Every instance visible to the user, across all months.
    async fn list_all(&self) -> Result<Vec<ExpenseInstance>>;

    async fn create(&self, instance: ExpenseInstance) -> Result<ExpenseInstance>;

    /// Sets every instance of `year_month` to `status`, returning how many changed.
    /// `at` becomes `paid_at` for instances moved to `Paid`.
    async fn bulk_set_status(
        &self,
        year_month: YearMonth,
        status: PaymentStatus,
        at: DateTime<Utc>,
    ) -> Result<usize>;

    async fn mark_paid(&self, id: Uuid, at: DateTime<Utc>) -> Result<ExpenseInstance>;
}

/// Rejects `candidate` when a recurring instance with the same (template, month) key exists.
pub(crate) fn ensure_unique_key(
    existing: &[ExpenseInstance],
    candidate: &ExpenseInstance,
) -> Result<()> {
    let Some((template_id, year_month)) = candidate.key() else {
        return Ok(());
    };
    if existing
        .iter()
        .any(|item| item.key() == Some((template_id, year_month)))
    {
        return Err(SchedulerError::DuplicateKey {
            template_id: template_id.clone(),
            year_month,
        });
    }
    Ok(())
}

/// Applies a bulk status change in place, counting the instances that actually changed.
pub(crate) fn apply_bulk_status(
    instances: &mut [ExpenseInstance],
    year_month: YearMonth,
    status: PaymentStatus,
    at: DateTime<Utc>,
) -> usize {
    let mut updated = 0usize;
    for instance in instances
        .iter_mut()
        .filter(|instance| instance.year_month == year_month)
    {
        if instance.status != status {
            instance.set_status(status, at);
            updated += 1;
        }
    }
    updated
}
