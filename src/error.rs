use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the payroll engine and the employee directory.
///
/// Validation variants are always raised before the store is touched.
#[derive(Debug, Error)]
pub enum PayrollError {
    #[error("invalid pay period: {0}")]
    InvalidPeriod(String),

    #[error("days worked must be a whole number between 1 and 7, got {0}")]
    InvalidDaysWorked(String),

    #[error("invalid amount for {field}: {reason}")]
    InvalidAmount { field: String, reason: String },

    #[error("invalid employee: {0}")]
    InvalidEmployee(String),

    #[error("employee {0} not found")]
    EmployeeNotFound(u64),

    #[error("payment {0} not found")]
    PaymentNotFound(u64),

    #[error("employee {0} still has payroll rows and cannot be deleted")]
    EmployeeHasPayments(u64),

    #[error("payroll batch contains no employee payments")]
    EmptyBatch,

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl PayrollError {
    pub fn invalid_amount(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PayrollError::InvalidAmount {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// An amount, or a total built from amounts, does not fit in `i64`.
    pub fn overflow(field: impl Into<String>) -> Self {
        Self::invalid_amount(field, "result is too large")
    }

    /// Stable machine-readable code sent alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            PayrollError::InvalidPeriod(_) => "INVALID_PERIOD",
            PayrollError::InvalidDaysWorked(_) => "INVALID_DAYS_WORKED",
            PayrollError::InvalidAmount { .. } => "INVALID_AMOUNT",
            PayrollError::InvalidEmployee(_) => "INVALID_EMPLOYEE",
            PayrollError::EmployeeNotFound(_) => "EMPLOYEE_NOT_FOUND",
            PayrollError::PaymentNotFound(_) => "PAYMENT_NOT_FOUND",
            PayrollError::EmployeeHasPayments(_) => "EMPLOYEE_HAS_PAYMENTS",
            PayrollError::EmptyBatch => "EMPTY_BATCH",
            PayrollError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl ResponseError for PayrollError {
    fn status_code(&self) -> StatusCode {
        match self {
            PayrollError::InvalidPeriod(_)
            | PayrollError::InvalidDaysWorked(_)
            | PayrollError::InvalidAmount { .. }
            | PayrollError::InvalidEmployee(_)
            | PayrollError::EmptyBatch => StatusCode::BAD_REQUEST,
            PayrollError::EmployeeNotFound(_) | PayrollError::PaymentNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            PayrollError::EmployeeHasPayments(_) => StatusCode::CONFLICT,
            PayrollError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            PayrollError::Storage(e) => {
                tracing::error!(error = %e, "Storage failure");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "code": self.code(),
            "message": message,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_bad_request() {
        assert_eq!(
            PayrollError::EmptyBatch.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PayrollError::invalid_amount("loan_deduction", "must not be negative").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PayrollError::InvalidDaysWorked("8".into()).code(),
            "INVALID_DAYS_WORKED"
        );
    }

    #[test]
    fn lookup_and_conflict_statuses() {
        assert_eq!(
            PayrollError::PaymentNotFound(9).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            PayrollError::EmployeeHasPayments(3).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn storage_details_are_not_leaked() {
        let err = PayrollError::Storage(StoreError::Unavailable("socket closed".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "STORAGE_ERROR");
    }
}
