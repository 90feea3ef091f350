use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use crate::model::employee::{Employee, NewEmployee};
use crate::model::payroll::{ComputedPayment, Payment, PaymentWithEmployee};
use crate::model::period::PayPeriod;
use crate::store::{EmployeeRepository, PaymentRepository, StoreError, StoreResult};

type PaymentKey = (u64, NaiveDate, NaiveDate);

#[derive(Default)]
struct State {
    employees: BTreeMap<u64, Employee>,
    payments: BTreeMap<u64, Payment>,
    // unique (employee_id, week_start, week_end) -> payment id
    by_key: HashMap<PaymentKey, u64>,
    next_employee_id: u64,
    next_payment_id: u64,
}

impl State {
    fn joined(&self, payment: &Payment) -> PaymentWithEmployee {
        let employee = self.employees.get(&payment.employee_id);
        PaymentWithEmployee {
            payment: payment.clone(),
            employee_name: employee.map(|e| e.name.clone()),
            employee_position: employee.map(|e| e.position.clone()),
            employee_image_url: employee.and_then(|e| e.image_url.clone()),
        }
    }
}

/// In-process store with the same uniqueness and foreign-key rules as the
/// MySQL schema. Every call takes one lock, so each operation is atomic.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    /// Number of payroll rows across all periods.
    pub fn payment_count(&self) -> StoreResult<usize> {
        Ok(self.lock()?.payments.len())
    }
}

#[async_trait]
impl EmployeeRepository for MemoryStore {
    async fn find_all(&self) -> StoreResult<Vec<Employee>> {
        Ok(self.lock()?.employees.values().rev().cloned().collect())
    }

    async fn find_by_id(&self, id: u64) -> StoreResult<Option<Employee>> {
        Ok(self.lock()?.employees.get(&id).cloned())
    }

    async fn create(&self, data: NewEmployee) -> StoreResult<Employee> {
        let mut state = self.lock()?;
        state.next_employee_id += 1;
        let employee = Employee {
            id: state.next_employee_id,
            name: data.name,
            position: data.position,
            daily_rate: data.daily_rate,
            weekly_allowance: data.weekly_allowance,
            image_url: Some(data.image_url),
            created_at: Utc::now(),
        };
        state.employees.insert(employee.id, employee.clone());
        Ok(employee)
    }

    async fn update(&self, id: u64, data: NewEmployee) -> StoreResult<Option<Employee>> {
        let mut state = self.lock()?;
        let Some(employee) = state.employees.get_mut(&id) else {
            return Ok(None);
        };
        employee.name = data.name;
        employee.position = data.position;
        employee.daily_rate = data.daily_rate;
        employee.weekly_allowance = data.weekly_allowance;
        employee.image_url = Some(data.image_url);
        Ok(Some(employee.clone()))
    }

    async fn delete(&self, id: u64) -> StoreResult<bool> {
        let mut state = self.lock()?;
        if !state.employees.contains_key(&id) {
            return Ok(false);
        }
        if state.payments.values().any(|p| p.employee_id == id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "employee {id} is referenced by payroll rows"
            )));
        }
        state.employees.remove(&id);
        Ok(true)
    }
}

#[async_trait]
impl PaymentRepository for MemoryStore {
    async fn upsert(&self, period: &PayPeriod, payment: &ComputedPayment) -> StoreResult<Payment> {
        let mut state = self.lock()?;
        if !state.employees.contains_key(&payment.employee_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "employee {} does not exist",
                payment.employee_id
            )));
        }

        let now = Utc::now();
        let key = (payment.employee_id, period.week_start, period.week_end);

        if let Some(id) = state.by_key.get(&key).copied() {
            if let Some(row) = state.payments.get_mut(&id) {
                row.days_worked = payment.days_worked;
                row.daily_rate = payment.daily_rate;
                row.base_allowance = payment.base_allowance;
                row.extra_allowance = payment.extra_allowance;
                row.loan_deduction = payment.loan_deduction;
                row.updated_at = now;
                return Ok(row.clone());
            }
        }

        state.next_payment_id += 1;
        let row = Payment {
            id: state.next_payment_id,
            employee_id: payment.employee_id,
            week_start: period.week_start,
            week_end: period.week_end,
            days_worked: payment.days_worked,
            daily_rate: payment.daily_rate,
            base_allowance: payment.base_allowance,
            extra_allowance: payment.extra_allowance,
            loan_deduction: payment.loan_deduction,
            created_at: now,
            updated_at: now,
        };
        state.by_key.insert(key, row.id);
        state.payments.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_period(&self, period: &PayPeriod) -> StoreResult<Vec<PaymentWithEmployee>> {
        let state = self.lock()?;
        Ok(state
            .payments
            .values()
            .filter(|p| p.period() == *period)
            .map(|p| state.joined(p))
            .collect())
    }

    async fn list_periods(&self) -> StoreResult<Vec<PayPeriod>> {
        let state = self.lock()?;
        let periods: BTreeSet<PayPeriod> = state.payments.values().map(Payment::period).collect();
        Ok(periods.into_iter().rev().collect())
    }

    async fn delete_by_id(&self, id: u64) -> StoreResult<Option<PaymentWithEmployee>> {
        let mut state = self.lock()?;
        let Some(row) = state.payments.get(&id) else {
            return Ok(None);
        };
        let deleted = state.joined(row);
        let p = &deleted.payment;
        state.by_key.remove(&(p.employee_id, p.week_start, p.week_end));
        state.payments.remove(&id);
        Ok(Some(deleted))
    }

    async fn delete_by_period(&self, period: &PayPeriod) -> StoreResult<u64> {
        let mut state = self.lock()?;
        let ids: Vec<u64> = state
            .payments
            .values()
            .filter(|p| p.period() == *period)
            .map(|p| p.id)
            .collect();
        for id in &ids {
            if let Some(p) = state.payments.remove(id) {
                state.by_key.remove(&(p.employee_id, p.week_start, p.week_end));
            }
        }
        Ok(ids.len() as u64)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.lock().map(|_| ())
    }
}
