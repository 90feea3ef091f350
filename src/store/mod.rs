//! Storage seam for the payroll engine.
//!
//! The engine only talks to these traits. [`MySqlStore`] is the production
//! backend; [`MemoryStore`] keeps everything in process for tests and demos.

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::employee::{Employee, NewEmployee};
use crate::model::payroll::{ComputedPayment, Payment, PaymentWithEmployee};
use crate::model::period::PayPeriod;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(sqlx::Error),

    /// A foreign key blocked the write: the referenced row is missing, or a
    /// delete would orphan dependent rows.
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_foreign_key_violation() {
                return StoreError::ForeignKeyViolation(db_err.message().to_string());
            }
        }
        StoreError::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Employee directory records.
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    /// All employees, newest id first.
    async fn find_all(&self) -> StoreResult<Vec<Employee>>;
    async fn find_by_id(&self, id: u64) -> StoreResult<Option<Employee>>;
    async fn create(&self, data: NewEmployee) -> StoreResult<Employee>;
    /// Full replace. `None` when no employee has this id.
    async fn update(&self, id: u64, data: NewEmployee) -> StoreResult<Option<Employee>>;
    /// `false` when no employee has this id. Fails with
    /// [`StoreError::ForeignKeyViolation`] while payroll rows reference it.
    async fn delete(&self, id: u64) -> StoreResult<bool>;
}

/// Payroll rows keyed by `(employee_id, week_start, week_end)`.
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Insert, or overwrite every input field of the existing row for the same
    /// key and bump `updated_at`. One atomic write per call.
    async fn upsert(&self, period: &PayPeriod, payment: &ComputedPayment) -> StoreResult<Payment>;

    /// Rows of one period joined with employee display fields, ascending id.
    async fn find_by_period(&self, period: &PayPeriod) -> StoreResult<Vec<PaymentWithEmployee>>;

    /// Distinct period keys, `week_start` then `week_end` descending.
    async fn list_periods(&self) -> StoreResult<Vec<PayPeriod>>;

    /// Remove one row and return it as it was.
    async fn delete_by_id(&self, id: u64) -> StoreResult<Option<PaymentWithEmployee>>;

    /// Remove every row of a period, returning how many went.
    async fn delete_by_period(&self, period: &PayPeriod) -> StoreResult<u64>;

    async fn ping(&self) -> StoreResult<()>;
}
