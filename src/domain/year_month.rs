use std::{fmt, str::FromStr};

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::SchedulerError;

/// A calendar month, the unit recurring instances are reconciled against.
///
/// Ordered chronologically and rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, SchedulerError> {
        if !(1..=12).contains(&month) {
            return Err(SchedulerError::InvalidInput(format!(
                "month must be between 1 and 12, got {}",
                month
            )));
        }
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(SchedulerError::InvalidInput(format!(
                "year {} is out of range",
                year
            )));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // Constructors only admit representable months.
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn days_in_month(&self) -> u32 {
        let next = self.next().first_day();
        (next - Duration::days(1)).day()
    }

    /// Resolves `day` within this month, clamping to the last valid day instead of
    /// spilling into the following month.
    pub fn clamped_date(&self, day: u32) -> NaiveDate {
        let day = day.clamp(1, self.days_in_month());
        self.first_day()
            .with_day(day)
            .unwrap_or_else(|| self.first_day())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = SchedulerError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || SchedulerError::InvalidInput(format!("`{}` is not a YYYY-MM month", raw));
        let (year, month) = raw.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        YearMonth::new(year, month)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = SchedulerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(raw: &str) -> YearMonth {
        raw.parse().unwrap()
    }

    #[test]
    fn parses_and_formats_zero_padded() {
        let month = ym("2025-03");
        assert_eq!(month.year(), 2025);
        assert_eq!(month.month(), 3);
        assert_eq!(month.to_string(), "2025-03");
    }

    #[test]
    fn rejects_malformed_months() {
        for raw in ["2025-13", "2025-00", "2025-3", "25-03", "2025/03", ""] {
            assert!(raw.parse::<YearMonth>().is_err(), "{raw} should not parse");
        }
    }

    #[test]
    fn clamps_day_to_end_of_short_months() {
        assert_eq!(
            ym("2025-02").clamped_date(31),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
        assert_eq!(
            ym("2024-02").clamped_date(29),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            ym("2025-04").clamped_date(31),
            NaiveDate::from_ymd_opt(2025, 4, 30).unwrap()
        );
        assert_eq!(
            ym("2025-10").clamped_date(1),
            NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()
        );
    }

    #[test]
    fn steps_across_year_boundaries() {
        assert_eq!(ym("2025-12").next(), ym("2026-01"));
        assert_eq!(ym("2026-01").previous(), ym("2025-12"));
        assert!(ym("2025-12") < ym("2026-01"));
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&ym("2025-10")).unwrap();
        assert_eq!(json, "\"2025-10\"");
        let back: YearMonth = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ym("2025-10"));
        assert!(serde_json::from_str::<YearMonth>("\"2025-1\"").is_err());
    }
}
