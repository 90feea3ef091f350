use async_trait::async_trait;
use sqlx::MySqlPool;
use tracing::debug;

use crate::model::employee::{Employee, NewEmployee};
use crate::model::payroll::{ComputedPayment, Payment, PaymentWithEmployee};
use crate::model::period::PayPeriod;
use crate::store::{EmployeeRepository, PaymentRepository, StoreResult};

const EMPLOYEE_COLUMNS: &str =
    "id, name, position, daily_rate, weekly_allowance, image_url, created_at";

const PAYMENT_WITH_EMPLOYEE_SELECT: &str = r#"
    SELECT
        p.id, p.employee_id, p.week_start, p.week_end, p.days_worked,
        p.daily_rate, p.base_allowance, p.extra_allowance, p.loan_deduction,
        p.created_at, p.updated_at,
        e.name AS employee_name,
        e.position AS employee_position,
        e.image_url AS employee_image_url
    FROM payroll p
    LEFT JOIN employees e ON e.id = p.employee_id
"#;

/// Store backed by the shared MySQL pool opened at startup.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeRepository for MySqlStore {
    async fn find_all(&self) -> StoreResult<Vec<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY id DESC");
        let employees = sqlx::query_as::<_, Employee>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(employees)
    }

    async fn find_by_id(&self, id: u64) -> StoreResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    async fn create(&self, data: NewEmployee) -> StoreResult<Employee> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO employees (name, position, daily_rate, weekly_allowance, image_url)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&data.name)
        .bind(&data.position)
        .bind(data.daily_rate)
        .bind(data.weekly_allowance)
        .bind(&data.image_url)
        .execute(&mut *tx)
        .await?;

        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(result.last_insert_id())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(employee)
    }

    async fn update(&self, id: u64, data: NewEmployee) -> StoreResult<Option<Employee>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE employees
            SET name = ?, position = ?, daily_rate = ?, weekly_allowance = ?, image_url = ?
            WHERE id = ?
            "#,
        )
        .bind(&data.name)
        .bind(&data.position)
        .bind(data.daily_rate)
        .bind(data.weekly_allowance)
        .bind(&data.image_url)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        // rows_affected is 0 for unchanged rows too, so re-read instead
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(employee)
    }

    async fn delete(&self, id: u64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl PaymentRepository for MySqlStore {
    async fn upsert(&self, period: &PayPeriod, payment: &ComputedPayment) -> StoreResult<Payment> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO payroll
                (employee_id, week_start, week_end, days_worked, daily_rate,
                 base_allowance, extra_allowance, loan_deduction)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                days_worked     = VALUES(days_worked),
                daily_rate      = VALUES(daily_rate),
                base_allowance  = VALUES(base_allowance),
                extra_allowance = VALUES(extra_allowance),
                loan_deduction  = VALUES(loan_deduction),
                updated_at      = CURRENT_TIMESTAMP
            "#,
        )
        .bind(payment.employee_id)
        .bind(period.week_start)
        .bind(period.week_end)
        .bind(payment.days_worked)
        .bind(payment.daily_rate)
        .bind(payment.base_allowance)
        .bind(payment.extra_allowance)
        .bind(payment.loan_deduction)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, employee_id, week_start, week_end, days_worked, daily_rate,
                   base_allowance, extra_allowance, loan_deduction, created_at, updated_at
            FROM payroll
            WHERE employee_id = ? AND week_start = ? AND week_end = ?
            "#,
        )
        .bind(payment.employee_id)
        .bind(period.week_start)
        .bind(period.week_end)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }

    async fn find_by_period(&self, period: &PayPeriod) -> StoreResult<Vec<PaymentWithEmployee>> {
        let sql = format!(
            "{PAYMENT_WITH_EMPLOYEE_SELECT} WHERE p.week_start = ? AND p.week_end = ? ORDER BY p.id ASC"
        );
        debug!(period = %period, "Loading payroll period");

        let rows = sqlx::query_as::<_, PaymentWithEmployee>(&sql)
            .bind(period.week_start)
            .bind(period.week_end)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_periods(&self) -> StoreResult<Vec<PayPeriod>> {
        let periods = sqlx::query_as::<_, PayPeriod>(
            r#"
            SELECT week_start, week_end
            FROM payroll
            GROUP BY week_start, week_end
            ORDER BY week_start DESC, week_end DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(periods)
    }

    async fn delete_by_id(&self, id: u64) -> StoreResult<Option<PaymentWithEmployee>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("{PAYMENT_WITH_EMPLOYEE_SELECT} WHERE p.id = ? FOR UPDATE");
        let row = sqlx::query_as::<_, PaymentWithEmployee>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        if row.is_some() {
            sqlx::query("DELETE FROM payroll WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(row)
    }

    async fn delete_by_period(&self, period: &PayPeriod) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM payroll WHERE week_start = ? AND week_end = ?")
            .bind(period.week_start)
            .bind(period.week_end)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
