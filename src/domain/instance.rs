use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{RecurringTemplate, TemplateId, YearMonth};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Paid,
}

/// One concrete month's materialization of a template, or an ad-hoc expense.
///
/// Name, category, amount and due day are snapshots taken at generation time;
/// editing the template later never rewrites existing instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseInstance {
    pub id: Uuid,
    pub template_id: Option<TemplateId>,
    pub year_month: YearMonth,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub amount: f64,
    pub due_day: u32,
    pub status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
}

impl ExpenseInstance {
    pub fn from_template(template: &RecurringTemplate, year_month: YearMonth) -> Self {
        Self {
            id: Uuid::new_v4(),
            template_id: Some(template.id.clone()),
            year_month,
            name: template.name.clone(),
            category: template.category.clone(),
            amount: template.amount,
            due_day: template.day_of_month,
            status: PaymentStatus::Pending,
            paid_at: None,
        }
    }

    pub fn ad_hoc(name: impl Into<String>, amount: f64, due_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            template_id: None,
            year_month: YearMonth::from_date(due_date),
            name: name.into(),
            category: None,
            amount,
            due_day: due_date.day(),
            status: PaymentStatus::Pending,
            paid_at: None,
        }
    }

    /// The (template, month) pair that must be unique across recurring instances.
    pub fn key(&self) -> Option<(&TemplateId, YearMonth)> {
        self.template_id.as_ref().map(|id| (id, self.year_month))
    }

    pub fn due_date(&self) -> NaiveDate {
        self.year_month.clamped_date(self.due_day)
    }

    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }

    pub fn mark_paid(&mut self, at: DateTime<Utc>) {
        self.status = PaymentStatus::Paid;
        self.paid_at = Some(at);
    }

    pub fn mark_pending(&mut self) {
        self.status = PaymentStatus::Pending;
        self.paid_at = None;
    }

    pub fn set_status(&mut self, status: PaymentStatus, at: DateTime<Utc>) {
        match status {
            PaymentStatus::Paid => self.mark_paid(at),
            PaymentStatus::Pending => self.mark_pending(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_uses_clamped_due_date() {
        let template = RecurringTemplate::new("rent", "Rent", 1000.0, 31)
            .unwrap()
            .with_category("Housing");
        let instance = ExpenseInstance::from_template(&template, "2025-02".parse().unwrap());
        assert_eq!(instance.status, PaymentStatus::Pending);
        assert_eq!(instance.category.as_deref(), Some("Housing"));
        assert_eq!(
            instance.due_date(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
    }

    #[test]
    fn paid_at_tracks_status() {
        let template = RecurringTemplate::new("rent", "Rent", 1000.0, 1).unwrap();
        let mut instance = ExpenseInstance::from_template(&template, "2025-10".parse().unwrap());
        instance.mark_paid(Utc::now());
        assert!(instance.is_paid());
        assert!(instance.paid_at.is_some());
        instance.mark_pending();
        assert!(!instance.is_paid());
        assert!(instance.paid_at.is_none());
    }
}
