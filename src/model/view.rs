use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::PayrollError;
use crate::model::money::Money;
use crate::model::payroll::PaymentWithEmployee;
use crate::model::period::PayPeriod;

/// One employee's line in a period view. Amounts are derived on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaymentLine {
    #[schema(example = 17)]
    pub payment_id: u64,
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = "Budi Santoso", nullable = true)]
    pub employee_name: Option<String>,
    #[schema(example = "Frontend Developer", nullable = true)]
    pub position: Option<String>,
    #[schema(nullable = true)]
    pub image_url: Option<String>,
    #[schema(example = 6)]
    pub days_worked: u8,
    #[schema(example = 600000, value_type = i64)]
    pub daily_rate: Money,
    #[schema(example = 3600000, value_type = i64)]
    pub base_pay: Money,
    #[schema(example = 300000, value_type = i64)]
    pub base_allowance: Money,
    #[schema(example = 0, value_type = i64)]
    pub extra_allowance: Money,
    #[schema(example = 300000, value_type = i64)]
    pub total_allowance: Money,
    #[schema(example = 0, value_type = i64)]
    pub loan_deduction: Money,
    #[schema(example = 3900000, value_type = i64)]
    pub total_pay: Money,
    /// Deductions exceed earnings for this line.
    pub negative_pay: bool,
    #[schema(example = "2025-09-07T10:00:00Z", format = "date-time", value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentWithEmployee> for PaymentLine {
    type Error = PayrollError;

    fn try_from(row: PaymentWithEmployee) -> Result<Self, Self::Error> {
        let p = &row.payment;
        let total_pay = p.total_pay()?;
        Ok(Self {
            payment_id: p.id,
            employee_id: p.employee_id,
            days_worked: p.days_worked,
            daily_rate: p.daily_rate,
            base_pay: p.base_pay()?,
            base_allowance: p.base_allowance,
            extra_allowance: p.extra_allowance,
            total_allowance: p.total_allowance()?,
            loan_deduction: p.loan_deduction,
            total_pay,
            negative_pay: total_pay.is_negative(),
            updated_at: p.updated_at,
            employee_name: row.employee_name,
            position: row.employee_position,
            image_url: row.employee_image_url,
        })
    }
}

/// All rows of one pay period plus their sum.
///
/// Built only through [`PayrollView::new`], which keeps `total_payroll` equal to
/// the sum of `payments[].total_pay`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PayrollView {
    /// Period key, `"<week_start>_<week_end>"`.
    #[schema(example = "2025-09-01_2025-09-07")]
    pub id: String,
    #[schema(example = "2025-09-01", value_type = String, format = "date")]
    pub week_start: NaiveDate,
    #[schema(example = "2025-09-07", value_type = String, format = "date")]
    pub week_end: NaiveDate,
    #[schema(example = 3900000, value_type = i64)]
    pub total_payroll: Money,
    pub payments: Vec<PaymentLine>,
}

impl PayrollView {
    pub fn new(period: PayPeriod, payments: Vec<PaymentLine>) -> Result<Self, PayrollError> {
        let total_payroll = Money::checked_sum(payments.iter().map(|p| p.total_pay))
            .ok_or_else(|| PayrollError::overflow("total_payroll"))?;
        Ok(Self {
            id: period.key(),
            week_start: period.week_start,
            week_end: period.week_end,
            total_payroll,
            payments,
        })
    }

    pub fn period(&self) -> PayPeriod {
        PayPeriod {
            week_start: self.week_start,
            week_end: self.week_end,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }
}

/// Periods whose `week_start` falls in the same calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MonthlyGroup {
    #[schema(example = 2025)]
    pub year: i32,
    #[schema(example = 9)]
    pub month: u32,
    /// `YYYY-MM`
    #[schema(example = "2025-09")]
    pub label: String,
    #[schema(example = 15600000, value_type = i64)]
    pub total_payroll: Money,
    pub periods: Vec<PayrollView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Every input was written.
    Applied,
    /// Some inputs were skipped because their employee does not exist.
    PartiallyApplied,
    /// No input referenced an existing employee.
    NoneApplied,
}

impl BatchStatus {
    pub fn from_counts(applied: usize, skipped: usize) -> Self {
        match (applied, skipped) {
            (_, 0) => BatchStatus::Applied,
            (0, _) => BatchStatus::NoneApplied,
            _ => BatchStatus::PartiallyApplied,
        }
    }
}

/// Result of a batch submission: what was written and the refreshed period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BatchOutcome {
    pub status: BatchStatus,
    #[schema(example = 2)]
    pub applied: usize,
    #[schema(example = 1)]
    pub skipped: usize,
    #[schema(example = json!([99]))]
    pub skipped_employee_ids: Vec<u64>,
    /// Employees whose base allowance defaulted to their weekly allowance.
    #[schema(example = json!([1]))]
    pub allowance_filled_employee_ids: Vec<u64>,
    pub warnings: Vec<String>,
    pub payroll: PayrollView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeletedPayment {
    pub deleted: PaymentLine,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeletedPeriod {
    #[schema(example = "2025-09-01_2025-09-07")]
    pub id: String,
    #[schema(example = 3)]
    pub deleted_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_status_from_counts() {
        assert_eq!(BatchStatus::from_counts(3, 0), BatchStatus::Applied);
        assert_eq!(BatchStatus::from_counts(2, 1), BatchStatus::PartiallyApplied);
        assert_eq!(BatchStatus::from_counts(0, 2), BatchStatus::NoneApplied);
    }
}
