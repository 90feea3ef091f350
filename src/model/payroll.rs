use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PayrollError;
use crate::model::money::Money;
use crate::model::period::PayPeriod;

/// One persisted payroll row, unique per `(employee_id, week_start, week_end)`.
///
/// Only inputs are stored. `daily_rate` is the employee's rate at the time the
/// row was written, so the derived amounts stay stable if the rate changes later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: u64,
    pub employee_id: u64,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub days_worked: u8,
    pub daily_rate: Money,
    pub base_allowance: Money,
    pub extra_allowance: Money,
    pub loan_deduction: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    pub fn period(&self) -> PayPeriod {
        PayPeriod {
            week_start: self.week_start,
            week_end: self.week_end,
        }
    }

    pub fn base_pay(&self) -> Result<Money, PayrollError> {
        self.daily_rate
            .checked_mul(i64::from(self.days_worked))
            .ok_or_else(|| PayrollError::overflow("base_pay"))
    }

    pub fn total_allowance(&self) -> Result<Money, PayrollError> {
        self.base_allowance
            .checked_add(self.extra_allowance)
            .ok_or_else(|| PayrollError::overflow("total_allowance"))
    }

    pub fn total_pay(&self) -> Result<Money, PayrollError> {
        self.base_pay()?
            .checked_add(self.total_allowance()?)
            .and_then(|m| m.checked_sub(self.loan_deduction))
            .ok_or_else(|| PayrollError::overflow("total_pay"))
    }
}

/// A payroll row joined with the employee's display fields.
///
/// The display fields are `None` when the employee record is gone.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PaymentWithEmployee {
    #[sqlx(flatten)]
    pub payment: Payment,
    pub employee_name: Option<String>,
    pub employee_position: Option<String>,
    pub employee_image_url: Option<String>,
}

/// Per-employee inputs for one period, after shape validation at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentInput {
    pub employee_id: u64,
    pub days_worked: i64,
    /// `None` lets the calculator fill in the weekly allowance for a full week.
    pub base_allowance: Option<Money>,
    pub extra_allowance: Money,
    pub loan_deduction: Money,
}

/// Output of the payment calculator, ready to be upserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputedPayment {
    pub employee_id: u64,
    pub days_worked: u8,
    pub daily_rate: Money,
    pub base_allowance: Money,
    /// `base_allowance` was taken from the employee's weekly allowance.
    pub base_allowance_auto_filled: bool,
    pub extra_allowance: Money,
    pub loan_deduction: Money,
    pub total_pay: Money,
}
