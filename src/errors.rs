use std::result::Result as StdResult;

use thiserror::Error;
use uuid::Uuid;

use crate::domain::{TemplateId, YearMonth};

/// Error type shared by the scheduler, its stores, and the notification layer.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SchedulerError {
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Instance for template `{template_id}` in {year_month} already exists")]
    DuplicateKey {
        template_id: TemplateId,
        year_month: YearMonth,
    },
    #[error("Instance not found: {0}")]
    InstanceNotFound(Uuid),
    #[error("Template not found: {0}")]
    TemplateNotFound(TemplateId),
    #[error("Notification setup failed: {0}")]
    NotificationInit(String),
    #[error("Notification delivery failed: {0}")]
    NotificationDelivery(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Persistence error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl SchedulerError {
    /// Transient failures that the next natural invocation is expected to retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, SchedulerError::StoreUnavailable(_))
    }
}

pub type Result<T> = StdResult<T, SchedulerError>;

impl From<std::io::Error> for SchedulerError {
    fn from(err: std::io::Error) -> Self {
        SchedulerError::StoreUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for SchedulerError {
    fn from(err: serde_json::Error) -> Self {
        SchedulerError::Storage(err.to_string())
    }
}
