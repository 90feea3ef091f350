use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::error::PayrollError;
use crate::model::money::Money;
use crate::model::payroll::{ComputedPayment, Payment, PaymentInput};
use crate::model::period::PayPeriod;
use crate::model::view::{
    BatchOutcome, BatchStatus, DeletedPeriod, MonthlyGroup, PaymentLine, PayrollView,
};
use crate::payroll::{aggregate, calculator};
use crate::store::{EmployeeRepository, PaymentRepository, StoreError};

/// Request-scoped payroll operations over injected repositories.
///
/// Holds no state besides the repository handles; cloning is cheap.
#[derive(Clone)]
pub struct PayrollEngine {
    employees: Arc<dyn EmployeeRepository>,
    payments: Arc<dyn PaymentRepository>,
}

impl PayrollEngine {
    pub fn new(
        employees: Arc<dyn EmployeeRepository>,
        payments: Arc<dyn PaymentRepository>,
    ) -> Self {
        Self {
            employees,
            payments,
        }
    }

    /// Engine over a single store that serves both repositories.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: EmployeeRepository + PaymentRepository + 'static,
    {
        Self::new(store.clone(), store)
    }

    pub fn employees(&self) -> &dyn EmployeeRepository {
        self.employees.as_ref()
    }

    /// Compute and write one employee's payment for `period`, replacing any
    /// earlier row for the same employee and period.
    pub async fn upsert_payment(
        &self,
        period: &PayPeriod,
        input: &PaymentInput,
    ) -> Result<Payment, PayrollError> {
        let (row, _) = self.write_payment(period, input).await?;
        Ok(row)
    }

    async fn write_payment(
        &self,
        period: &PayPeriod,
        input: &PaymentInput,
    ) -> Result<(Payment, ComputedPayment), PayrollError> {
        let employee = self
            .employees
            .find_by_id(input.employee_id)
            .await?
            .ok_or(PayrollError::EmployeeNotFound(input.employee_id))?;

        let computed = calculator::compute_payment(&employee, input)?;
        self.ensure_totals_fit(period, &computed).await?;

        match self.payments.upsert(period, &computed).await {
            Ok(row) => Ok((row, computed)),
            // employee removed between the lookup and the write
            Err(StoreError::ForeignKeyViolation(_)) => {
                Err(PayrollError::EmployeeNotFound(input.employee_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Reject a write whose period or month total would no longer fit in
    /// [`Money`], so reads of committed rows never overflow.
    async fn ensure_totals_fit(
        &self,
        period: &PayPeriod,
        computed: &ComputedPayment,
    ) -> Result<(), PayrollError> {
        let mut period_amounts = vec![computed.total_pay];
        let mut month_amounts = vec![computed.total_pay];

        for other in self.payments.list_periods().await? {
            if other.month() != period.month() {
                continue;
            }
            for row in self.payments.find_by_period(&other).await? {
                let same_period = other == *period;
                // the row this write replaces
                if same_period && row.payment.employee_id == computed.employee_id {
                    continue;
                }
                let total = row.payment.total_pay()?;
                if same_period {
                    period_amounts.push(total);
                }
                month_amounts.push(total);
            }
        }

        if Money::checked_sum(period_amounts).is_none() {
            return Err(PayrollError::overflow(format!("total_payroll for {period}")));
        }
        if Money::checked_sum(month_amounts).is_none() {
            let (year, month) = period.month();
            return Err(PayrollError::overflow(format!(
                "total_payroll for {year:04}-{month:02}"
            )));
        }
        Ok(())
    }

    /// Apply a batch of payments to one period, in input order.
    ///
    /// All inputs are range-checked before anything is written. Inputs for
    /// unknown employees are skipped and reported; any other failure stops the
    /// batch, leaving earlier writes committed.
    #[instrument(skip(self, inputs), fields(period = %period, inputs = inputs.len()))]
    pub async fn process_batch(
        &self,
        period: &PayPeriod,
        inputs: &[PaymentInput],
    ) -> Result<BatchOutcome, PayrollError> {
        if inputs.is_empty() {
            return Err(PayrollError::EmptyBatch);
        }
        for input in inputs {
            calculator::validate_input(input)?;
        }

        let mut applied = 0usize;
        let mut skipped_employee_ids = Vec::new();
        let mut allowance_filled_employee_ids = Vec::new();
        let mut warnings = Vec::new();

        for input in inputs {
            if input.days_worked > period.length_days() {
                let msg = format!(
                    "employee {} worked {} days in a {}-day period",
                    input.employee_id,
                    input.days_worked,
                    period.length_days()
                );
                warn!(employee_id = input.employee_id, "{msg}");
                warnings.push(msg);
            }

            match self.write_payment(period, input).await {
                Ok((row, computed)) => {
                    applied += 1;
                    if computed.base_allowance_auto_filled {
                        allowance_filled_employee_ids.push(row.employee_id);
                    }
                    if computed.total_pay.is_negative() {
                        let msg = format!(
                            "employee {} has negative net pay {}",
                            row.employee_id, computed.total_pay
                        );
                        warn!(employee_id = row.employee_id, payment_id = row.id, "{msg}");
                        warnings.push(msg);
                    }
                }
                Err(PayrollError::EmployeeNotFound(id)) => {
                    warn!(employee_id = id, "Skipping payment for unknown employee");
                    skipped_employee_ids.push(id);
                }
                Err(e) => return Err(e),
            }
        }

        let skipped = skipped_employee_ids.len();
        info!(applied, skipped, "Payroll batch processed");

        Ok(BatchOutcome {
            status: BatchStatus::from_counts(applied, skipped),
            applied,
            skipped,
            skipped_employee_ids,
            allowance_filled_employee_ids,
            warnings,
            payroll: self.get_period(period).await?,
        })
    }

    pub async fn get_period(&self, period: &PayPeriod) -> Result<PayrollView, PayrollError> {
        let rows = self.payments.find_by_period(period).await?;
        aggregate::build_view(*period, rows)
    }

    /// Every period that still has rows, most recent first.
    pub async fn list_periods(&self) -> Result<Vec<PayrollView>, PayrollError> {
        let periods = self.payments.list_periods().await?;

        let mut views = Vec::with_capacity(periods.len());
        for period in periods {
            let view = self.get_period(&period).await?;
            // emptied by a concurrent delete since the listing
            if !view.is_empty() {
                views.push(view);
            }
        }
        Ok(views)
    }

    pub async fn monthly_summary(&self) -> Result<Vec<MonthlyGroup>, PayrollError> {
        let views = self.list_periods().await?;
        aggregate::group_by_month(&views)
    }

    /// Remove one employee's row from its period.
    #[instrument(skip(self))]
    pub async fn delete_payment(&self, payment_id: u64) -> Result<PaymentLine, PayrollError> {
        let row = self
            .payments
            .delete_by_id(payment_id)
            .await?
            .ok_or(PayrollError::PaymentNotFound(payment_id))?;

        info!(
            employee_id = row.payment.employee_id,
            period = %row.payment.period(),
            "Payment deleted"
        );
        PaymentLine::try_from(row)
    }

    /// Remove every row of a period. Deleting an empty period is not an error.
    #[instrument(skip(self), fields(period = %period))]
    pub async fn delete_period(&self, period: &PayPeriod) -> Result<DeletedPeriod, PayrollError> {
        let deleted_count = self.payments.delete_by_period(period).await?;
        info!(deleted_count, "Payroll period deleted");

        Ok(DeletedPeriod {
            id: period.key(),
            deleted_count,
        })
    }

    pub async fn health(&self) -> Result<(), PayrollError> {
        self.payments.ping().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::employee::{Employee, NewEmployee};
    use crate::model::money::Money;
    use crate::store::MemoryStore;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn week(start: &str, end: &str) -> PayPeriod {
        PayPeriod::new(date(start), date(end)).unwrap()
    }

    fn input(employee_id: u64, days_worked: i64) -> PaymentInput {
        PaymentInput {
            employee_id,
            days_worked,
            base_allowance: None,
            extra_allowance: Money::ZERO,
            loan_deduction: Money::ZERO,
        }
    }

    async fn setup(names: &[&str]) -> (Arc<MemoryStore>, PayrollEngine, Vec<Employee>) {
        let store = Arc::new(MemoryStore::new());
        let mut employees = Vec::new();
        for name in names {
            let e = store
                .create(
                    NewEmployee::new(name, "Staff", Money::new(100_000), Money::new(50_000), None)
                        .unwrap(),
                )
                .await
                .unwrap();
            employees.push(e);
        }
        let engine = PayrollEngine::from_store(store.clone());
        (store, engine, employees)
    }

    fn assert_consistent(view: &PayrollView) {
        assert_eq!(
            Some(view.total_payroll),
            Money::checked_sum(view.payments.iter().map(|p| p.total_pay))
        );
    }

    #[actix_web::test]
    async fn resubmission_overwrites_the_same_row() {
        let (store, engine, emps) = setup(&["Ani"]).await;
        let period = week("2025-09-01", "2025-09-07");

        let first = engine.upsert_payment(&period, &input(emps[0].id, 6)).await.unwrap();
        let second = engine
            .upsert_payment(
                &period,
                &PaymentInput {
                    base_allowance: Some(Money::new(20_000)),
                    ..input(emps[0].id, 4)
                },
            )
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.payment_count().unwrap(), 1);

        let view = engine.get_period(&period).await.unwrap();
        assert_eq!(view.payments.len(), 1);
        assert_eq!(view.payments[0].days_worked, 4);
        assert_eq!(view.total_payroll, Money::new(420_000));
    }

    #[actix_web::test]
    async fn batch_skips_unknown_employees() {
        let (_store, engine, emps) = setup(&["Ani", "Budi"]).await;
        let period = week("2025-09-01", "2025-09-07");
        let inputs = vec![input(emps[0].id, 6), input(999, 6), input(emps[1].id, 5)];

        let outcome = engine.process_batch(&period, &inputs).await.unwrap();

        assert_eq!(outcome.status, BatchStatus::PartiallyApplied);
        assert_eq!(outcome.applied, 2);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.skipped_employee_ids, vec![999]);
        // six days with no base allowance given
        assert_eq!(outcome.allowance_filled_employee_ids, vec![emps[0].id]);

        let ids: Vec<u64> = outcome.payroll.payments.iter().map(|p| p.employee_id).collect();
        assert_eq!(ids, vec![emps[0].id, emps[1].id]);
        assert_eq!(outcome.payroll.total_payroll, Money::new(650_000 + 500_000));
        assert_consistent(&outcome.payroll);
    }

    #[actix_web::test]
    async fn batch_with_only_unknown_employees_is_not_an_error() {
        let (_store, engine, _) = setup(&[]).await;
        let period = week("2025-09-01", "2025-09-07");

        let outcome = engine.process_batch(&period, &[input(5, 6)]).await.unwrap();
        assert_eq!(outcome.status, BatchStatus::NoneApplied);
        assert!(outcome.payroll.is_empty());
    }

    #[actix_web::test]
    async fn invalid_input_rejects_the_whole_batch_before_writing() {
        let (store, engine, emps) = setup(&["Ani"]).await;
        let period = week("2025-09-01", "2025-09-07");

        let err = engine
            .process_batch(&period, &[input(emps[0].id, 6), input(emps[0].id, 8)])
            .await
            .unwrap_err();
        assert!(matches!(err, PayrollError::InvalidDaysWorked(_)));
        assert_eq!(store.payment_count().unwrap(), 0);

        assert!(matches!(
            engine.process_batch(&period, &[]).await,
            Err(PayrollError::EmptyBatch)
        ));
    }

    #[actix_web::test]
    async fn same_employee_twice_in_a_batch_keeps_the_last() {
        let (store, engine, emps) = setup(&["Ani"]).await;
        let period = week("2025-09-01", "2025-09-07");

        let outcome = engine
            .process_batch(&period, &[input(emps[0].id, 2), input(emps[0].id, 3)])
            .await
            .unwrap();

        assert_eq!(outcome.applied, 2);
        assert_eq!(store.payment_count().unwrap(), 1);
        assert_eq!(outcome.payroll.payments[0].days_worked, 3);
    }

    #[actix_web::test]
    async fn warns_when_days_exceed_the_period_or_pay_goes_negative() {
        let (_store, engine, emps) = setup(&["Ani"]).await;
        let short = week("2025-09-01", "2025-09-03");

        let outcome = engine
            .process_batch(
                &short,
                &[PaymentInput {
                    loan_deduction: Money::new(1_000_000),
                    ..input(emps[0].id, 5)
                }],
            )
            .await
            .unwrap();

        assert_eq!(outcome.status, BatchStatus::Applied);
        assert_eq!(outcome.warnings.len(), 2);
        assert!(outcome.payroll.payments[0].negative_pay);
    }

    #[actix_web::test]
    async fn deleting_one_row_leaves_siblings() {
        let (_store, engine, emps) = setup(&["Ani", "Budi", "Citra"]).await;
        let period = week("2025-09-01", "2025-09-07");
        let inputs: Vec<_> = emps.iter().map(|e| input(e.id, 6)).collect();

        let before = engine.process_batch(&period, &inputs).await.unwrap().payroll;
        let victim = before.payments[1].clone();

        let deleted = engine.delete_payment(victim.payment_id).await.unwrap();
        assert_eq!(deleted.payment_id, victim.payment_id);

        let after = engine.get_period(&period).await.unwrap();
        assert_eq!(after.payments.len(), 2);
        assert_eq!(
            after.total_payroll.amount(),
            before.total_payroll.amount() - victim.total_pay.amount()
        );
        assert_consistent(&after);

        assert!(matches!(
            engine.delete_payment(victim.payment_id).await,
            Err(PayrollError::PaymentNotFound(_))
        ));
    }

    #[actix_web::test]
    async fn deleting_the_last_row_drops_the_period() {
        let (_store, engine, emps) = setup(&["Ani"]).await;
        let keep = week("2025-08-25", "2025-08-31");
        let drop = week("2025-09-01", "2025-09-07");

        engine.process_batch(&keep, &[input(emps[0].id, 6)]).await.unwrap();
        let view = engine
            .process_batch(&drop, &[input(emps[0].id, 6)])
            .await
            .unwrap()
            .payroll;
        assert_eq!(engine.list_periods().await.unwrap().len(), 2);

        engine.delete_payment(view.payments[0].payment_id).await.unwrap();

        let listed = engine.list_periods().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, keep.key());
    }

    #[actix_web::test]
    async fn period_delete_is_idempotent() {
        let (_store, engine, emps) = setup(&["Ani", "Budi"]).await;
        let period = week("2025-09-01", "2025-09-07");
        let inputs: Vec<_> = emps.iter().map(|e| input(e.id, 6)).collect();
        engine.process_batch(&period, &inputs).await.unwrap();

        let first = engine.delete_period(&period).await.unwrap();
        assert_eq!(first.deleted_count, 2);
        assert_eq!(first.id, "2025-09-01_2025-09-07");

        let second = engine.delete_period(&period).await.unwrap();
        assert_eq!(second.deleted_count, 0);
        assert!(engine.list_periods().await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn listing_is_newest_first_and_monthly_totals_add_up() {
        let (_store, engine, emps) = setup(&["Ani"]).await;
        let periods = [
            week("2025-08-25", "2025-08-31"),
            week("2025-09-08", "2025-09-14"),
            week("2025-09-01", "2025-09-07"),
        ];
        for (i, period) in periods.iter().enumerate() {
            engine
                .process_batch(period, &[input(emps[0].id, i as i64 + 1)])
                .await
                .unwrap();
        }

        let views = engine.list_periods().await.unwrap();
        let starts: Vec<String> = views.iter().map(|v| v.week_start.to_string()).collect();
        assert_eq!(starts, vec!["2025-09-08", "2025-09-01", "2025-08-25"]);

        let months = engine.monthly_summary().await.unwrap();
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].label, "2025-09");
        assert_eq!(
            months[0].total_payroll.amount(),
            views[0].total_payroll.amount() + views[1].total_payroll.amount()
        );
    }

    #[actix_web::test]
    async fn rate_changes_do_not_rewrite_history() {
        let (store, engine, emps) = setup(&["Ani"]).await;
        let period = week("2025-09-01", "2025-09-07");
        engine.process_batch(&period, &[input(emps[0].id, 6)]).await.unwrap();

        store
            .update(
                emps[0].id,
                NewEmployee::new("Ani", "Lead", Money::new(999_999), Money::ZERO, None).unwrap(),
            )
            .await
            .unwrap();

        let view = engine.get_period(&period).await.unwrap();
        assert_eq!(view.payments[0].base_pay, Money::new(600_000));
        assert_eq!(view.payments[0].position.as_deref(), Some("Lead"));
    }

    #[actix_web::test]
    async fn aggregate_stays_consistent_across_mixed_operations() {
        let (_store, engine, emps) = setup(&["Ani", "Budi", "Citra"]).await;
        let period = week("2025-09-01", "2025-09-07");

        for (i, e) in emps.iter().enumerate() {
            engine.upsert_payment(&period, &input(e.id, i as i64 + 3)).await.unwrap();
            assert_consistent(&engine.get_period(&period).await.unwrap());
        }
        engine
            .upsert_payment(
                &period,
                &PaymentInput {
                    extra_allowance: Money::new(12_345),
                    loan_deduction: Money::new(2_000),
                    ..input(emps[1].id, 7)
                },
            )
            .await
            .unwrap();
        let view = engine.get_period(&period).await.unwrap();
        assert_consistent(&view);

        engine.delete_payment(view.payments[0].payment_id).await.unwrap();
        assert_consistent(&engine.get_period(&period).await.unwrap());
    }

    async fn big_earner(store: &MemoryStore, name: &str) -> Employee {
        store
            .create(
                NewEmployee::new(
                    name,
                    "Director",
                    Money::new(1_000_000_000_000_000_000),
                    Money::ZERO,
                    None,
                )
                .unwrap(),
            )
            .await
            .unwrap()
    }

    #[actix_web::test]
    async fn period_total_overflow_is_rejected_before_writing() {
        let (store, engine, _) = setup(&[]).await;
        let a = big_earner(&store, "Ani").await;
        let b = big_earner(&store, "Budi").await;
        let period = week("2025-09-01", "2025-09-07");

        // 7e18 each: one row fits, two do not
        let err = engine
            .process_batch(&period, &[input(a.id, 7), input(b.id, 7)])
            .await
            .unwrap_err();
        assert!(matches!(err, PayrollError::InvalidAmount { .. }));
        assert_eq!(store.payment_count().unwrap(), 1);

        // reads of what was committed still work
        let view = engine.get_period(&period).await.unwrap();
        assert_eq!(view.total_payroll, Money::new(7_000_000_000_000_000_000));
        assert_eq!(engine.monthly_summary().await.unwrap().len(), 1);

        // replacing the same employee's row does not count it twice
        engine.upsert_payment(&period, &input(a.id, 6)).await.unwrap();
        assert_eq!(
            engine.get_period(&period).await.unwrap().total_payroll,
            Money::new(6_000_000_000_000_000_000)
        );
    }

    #[actix_web::test]
    async fn month_total_overflow_is_rejected_before_writing() {
        let (store, engine, _) = setup(&[]).await;
        let a = big_earner(&store, "Ani").await;

        engine
            .upsert_payment(&week("2025-09-01", "2025-09-07"), &input(a.id, 7))
            .await
            .unwrap();
        let err = engine
            .upsert_payment(&week("2025-09-08", "2025-09-14"), &input(a.id, 7))
            .await
            .unwrap_err();
        assert!(matches!(err, PayrollError::InvalidAmount { .. }));

        // a different month has its own headroom
        engine
            .upsert_payment(&week("2025-10-06", "2025-10-12"), &input(a.id, 7))
            .await
            .unwrap();
        assert_eq!(engine.monthly_summary().await.unwrap().len(), 2);
    }
}
