//! Recurring templates, their monthly instances, and the year-month unit they share.

pub mod instance;
pub mod template;
pub mod year_month;

pub use instance::{ExpenseInstance, PaymentStatus};
pub use template::{RecurringTemplate, TemplateId};
pub use year_month::YearMonth;
