use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::SchedulerError;

/// Opaque identifier of a recurring template, stable across months.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(String);

impl TemplateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for TemplateId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TemplateId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// User-defined pattern for a monthly expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringTemplate {
    pub id: TemplateId,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub amount: f64,
    /// Due day within each month; clamps to the last day of shorter months.
    pub day_of_month: u32,
    #[serde(default = "RecurringTemplate::default_active")]
    pub active: bool,
}

impl RecurringTemplate {
    pub fn new(
        id: impl Into<TemplateId>,
        name: impl Into<String>,
        amount: f64,
        day_of_month: u32,
    ) -> Result<Self, SchedulerError> {
        let template = Self {
            id: id.into(),
            name: name.into(),
            category: None,
            amount,
            day_of_month,
            active: true,
        };
        template.validate()?;
        Ok(template)
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }

    /// Re-checks invariants, notably for records decoded from storage.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.id.as_str().trim().is_empty() {
            return Err(SchedulerError::InvalidInput(
                "template id must not be empty".into(),
            ));
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(SchedulerError::InvalidInput(format!(
                "template `{}` amount must be a non-negative number, got {}",
                self.id, self.amount
            )));
        }
        if !(1..=31).contains(&self.day_of_month) {
            return Err(SchedulerError::InvalidInput(format!(
                "template `{}` day of month must be between 1 and 31, got {}",
                self.id, self.day_of_month
            )));
        }
        Ok(())
    }

    fn default_active() -> bool {
        true
    }
}
