//! Materializes one expense instance per active template per month.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::{
    domain::{ExpenseInstance, RecurringTemplate, TemplateId, YearMonth},
    errors::{Result, SchedulerError},
    store::ExpenseInstanceStore,
};

/// Outcome of committing a creation plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitReport {
    pub created: Vec<ExpenseInstance>,
    /// Instances another session created first.
    pub already_present: usize,
}

pub struct RecurringInstanceGenerator;

impl RecurringInstanceGenerator {
    /// Builds the instances missing for `year_month`, without touching any store.
    ///
    /// Instances in `existing` that belong to other months are ignored, so the
    /// caller may pass either a month-scoped or a full listing.
    pub fn reconcile(
        templates: &[RecurringTemplate],
        existing: &[ExpenseInstance],
        year_month: YearMonth,
    ) -> Vec<ExpenseInstance> {
        let mut covered: HashSet<&TemplateId> = existing
            .iter()
            .filter(|instance| instance.year_month == year_month)
            .filter_map(|instance| instance.template_id.as_ref())
            .collect();

        let mut plan = Vec::new();
        for template in templates.iter().filter(|template| template.active) {
            // Also guards against the same template listed twice.
            if !covered.insert(&template.id) {
                continue;
            }
            debug!(
                template = %template.id,
                year_month = %year_month,
                "planning recurring instance"
            );
            plan.push(ExpenseInstance::from_template(template, year_month));
        }
        plan
    }

    /// Persists a creation plan. A duplicate-key rejection means another session
    /// already created that (template, month) instance and counts as success.
    pub async fn commit(
        store: &dyn ExpenseInstanceStore,
        plan: Vec<ExpenseInstance>,
    ) -> Result<CommitReport> {
        let mut report = CommitReport::default();
        for instance in plan {
            match store.create(instance).await {
                Ok(created) => report.created.push(created),
                Err(SchedulerError::DuplicateKey {
                    template_id,
                    year_month,
                }) => {
                    debug!(
                        template = %template_id,
                        year_month = %year_month,
                        "instance already created elsewhere"
                    );
                    report.already_present += 1;
                }
                Err(err) => {
                    warn!("failed to commit recurring instance: {}", err);
                    return Err(err);
                }
            }
        }
        Ok(report)
    }
}
