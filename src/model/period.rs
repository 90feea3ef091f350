use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::PayrollError;

/// Longest period accepted, in days (inclusive).
pub const MAX_PERIOD_DAYS: i64 = 7;

/// Inclusive `(week_start, week_end)` date range. Grouping key for payroll rows.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    sqlx::FromRow, ToSchema,
)]
pub struct PayPeriod {
    #[schema(example = "2025-09-01", value_type = String, format = "date")]
    pub week_start: NaiveDate,

    #[schema(example = "2025-09-07", value_type = String, format = "date")]
    pub week_end: NaiveDate,
}

impl PayPeriod {
    pub fn new(week_start: NaiveDate, week_end: NaiveDate) -> Result<Self, PayrollError> {
        if week_end < week_start {
            return Err(PayrollError::InvalidPeriod(format!(
                "week_end {week_end} is before week_start {week_start}"
            )));
        }
        let period = Self {
            week_start,
            week_end,
        };
        if period.length_days() > MAX_PERIOD_DAYS {
            return Err(PayrollError::InvalidPeriod(format!(
                "period {period} spans {} days, at most {MAX_PERIOD_DAYS} allowed",
                period.length_days()
            )));
        }
        Ok(period)
    }

    /// `(year, month)` of `week_start`, the month a period is reported under.
    pub fn month(&self) -> (i32, u32) {
        (self.week_start.year(), self.week_start.month())
    }

    /// Number of calendar days covered, both ends included.
    pub fn length_days(&self) -> i64 {
        (self.week_end - self.week_start).num_days() + 1
    }

    /// Textual key `"<week_start>_<week_end>"`.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PayPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}",
            self.week_start.format("%Y-%m-%d"),
            self.week_end.format("%Y-%m-%d")
        )
    }
}

impl FromStr for PayPeriod {
    type Err = PayrollError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let (start, end) = key
            .split_once('_')
            .ok_or_else(|| PayrollError::InvalidPeriod(format!("'{key}' is not a period key")))?;

        let parse = |s: &str| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|_| PayrollError::InvalidPeriod(format!("'{s}' is not a YYYY-MM-DD date")))
        };

        PayPeriod::new(parse(start)?, parse(end)?)
    }
}
