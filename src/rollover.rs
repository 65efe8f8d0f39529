//! Month-rollover detection and current-month payment totals.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{ExpenseInstance, PaymentStatus, YearMonth};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MonthTotals {
    pub total_paid: f64,
    pub total_pending: f64,
    pub total_expenses: f64,
}

impl MonthTotals {
    fn from_instances<'a>(instances: impl Iterator<Item = &'a ExpenseInstance>) -> Self {
        let mut totals = MonthTotals::default();
        for instance in instances {
            match instance.status {
                PaymentStatus::Paid => totals.total_paid += instance.amount,
                PaymentStatus::Pending => totals.total_pending += instance.amount,
            }
        }
        totals.total_expenses = totals.total_paid + totals.total_pending;
        totals
    }
}

/// What the history header needs to decide whether to offer a reset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RolloverStatus {
    pub year_month: YearMonth,
    pub is_new_month: bool,
    pub totals: MonthTotals,
}

pub struct MonthRolloverDetector;

impl MonthRolloverDetector {
    /// A rollover is pending when any paid record belongs to a month other than
    /// the one containing `today`. Totals cover only the current month.
    /// A lagging paid record flags the rollover even when the current month has
    /// no instances yet.
    pub fn detect(today: NaiveDate, instances: &[ExpenseInstance]) -> RolloverStatus {
        let current = YearMonth::from_date(today);
        let is_new_month = instances
            .iter()
            .any(|instance| instance.is_paid() && instance.year_month != current);
        let totals = MonthTotals::from_instances(
            instances
                .iter()
                .filter(|instance| instance.year_month == current),
        );
        RolloverStatus {
            year_month: current,
            is_new_month,
            totals,
        }
    }
}
