//! Pure payment calculation. No I/O.

use crate::error::PayrollError;
use crate::model::employee::Employee;
use crate::model::money::Money;
use crate::model::payroll::{ComputedPayment, PaymentInput};

pub const MIN_DAYS_WORKED: i64 = 1;
pub const MAX_DAYS_WORKED: i64 = 7;

/// A full week earns the employee's standard weekly allowance.
pub const FULL_WEEK_DAYS: u8 = 6;

/// Range-check the inputs that do not depend on the employee record.
pub fn validate_input(input: &PaymentInput) -> Result<u8, PayrollError> {
    if !(MIN_DAYS_WORKED..=MAX_DAYS_WORKED).contains(&input.days_worked) {
        return Err(PayrollError::InvalidDaysWorked(input.days_worked.to_string()));
    }

    if let Some(base) = input.base_allowance {
        require_non_negative("base_allowance", base)?;
    }
    require_non_negative("extra_allowance", input.extra_allowance)?;
    require_non_negative("loan_deduction", input.loan_deduction)?;

    // checked above: 1..=7 fits in u8
    Ok(input.days_worked as u8)
}

/// Compute one employee's payment for a period.
///
/// `base_allowance` falls back to the weekly allowance when it is omitted for a
/// six-day week, and to zero for any other week.
pub fn compute_payment(
    employee: &Employee,
    input: &PaymentInput,
) -> Result<ComputedPayment, PayrollError> {
    let days_worked = validate_input(input)?;
    require_non_negative("daily_rate", employee.daily_rate)?;

    let (base_allowance, auto_filled) = match input.base_allowance {
        Some(amount) => (amount, false),
        None if days_worked == FULL_WEEK_DAYS => {
            require_non_negative("weekly_allowance", employee.weekly_allowance)?;
            (employee.weekly_allowance, true)
        }
        None => (Money::ZERO, false),
    };

    let base_pay = employee
        .daily_rate
        .checked_mul(i64::from(days_worked))
        .ok_or_else(|| PayrollError::overflow("base_pay"))?;

    let total_pay = base_pay
        .checked_add(base_allowance)
        .and_then(|m| m.checked_add(input.extra_allowance))
        .and_then(|m| m.checked_sub(input.loan_deduction))
        .ok_or_else(|| PayrollError::overflow("total_pay"))?;

    Ok(ComputedPayment {
        employee_id: employee.id,
        days_worked,
        daily_rate: employee.daily_rate,
        base_allowance,
        base_allowance_auto_filled: auto_filled,
        extra_allowance: input.extra_allowance,
        loan_deduction: input.loan_deduction,
        total_pay,
    })
}

fn require_non_negative(field: &str, amount: Money) -> Result<(), PayrollError> {
    if amount.is_negative() {
        return Err(PayrollError::invalid_amount(
            field,
            format!("must not be negative, got {amount}"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn employee() -> Employee {
        Employee {
            id: 1,
            name: "Budi Santoso".into(),
            position: "Frontend Developer".into(),
            daily_rate: Money::new(100_000),
            weekly_allowance: Money::new(50_000),
            image_url: None,
            created_at: Utc::now(),
        }
    }

    fn input(days_worked: i64) -> PaymentInput {
        PaymentInput {
            employee_id: 1,
            days_worked,
            base_allowance: None,
            extra_allowance: Money::ZERO,
            loan_deduction: Money::ZERO,
        }
    }

    #[test]
    fn full_week_fills_in_the_weekly_allowance() {
        let p = compute_payment(&employee(), &input(6)).unwrap();
        assert_eq!(p.base_allowance, Money::new(50_000));
        assert!(p.base_allowance_auto_filled);
        assert_eq!(p.total_pay, Money::new(650_000));
    }

    #[test]
    fn partial_week_uses_manual_amounts() {
        let p = compute_payment(
            &employee(),
            &PaymentInput {
                base_allowance: Some(Money::new(20_000)),
                extra_allowance: Money::new(10_000),
                loan_deduction: Money::new(5_000),
                ..input(4)
            },
        )
        .unwrap();

        assert!(!p.base_allowance_auto_filled);
        assert_eq!(p.total_pay, Money::new(425_000));
    }

    #[test]
    fn omitted_allowance_outside_a_full_week_is_zero() {
        for days in [1, 5, 7] {
            let p = compute_payment(&employee(), &input(days)).unwrap();
            assert_eq!(p.base_allowance, Money::ZERO, "days = {days}");
            assert_eq!(p.total_pay, Money::new(100_000 * days));
        }
    }

    #[test]
    fn explicit_allowance_wins_on_a_full_week() {
        let p = compute_payment(
            &employee(),
            &PaymentInput {
                base_allowance: Some(Money::ZERO),
                ..input(6)
            },
        )
        .unwrap();
        assert_eq!(p.base_allowance, Money::ZERO);
        assert_eq!(p.total_pay, Money::new(600_000));
    }

    #[test]
    fn extra_allowance_is_independent_of_days() {
        for days in 1..=7 {
            let p = compute_payment(
                &employee(),
                &PaymentInput {
                    base_allowance: Some(Money::ZERO),
                    extra_allowance: Money::new(7_500),
                    ..input(days)
                },
            )
            .unwrap();
            assert_eq!(p.total_pay, Money::new(100_000 * days + 7_500));
        }
    }

    #[test]
    fn days_outside_one_to_seven_are_rejected() {
        for days in [0, 8, -1, 100] {
            assert!(matches!(
                compute_payment(&employee(), &input(days)),
                Err(PayrollError::InvalidDaysWorked(_))
            ));
        }
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let err = compute_payment(
            &employee(),
            &PaymentInput {
                loan_deduction: Money::new(-1),
                ..input(4)
            },
        )
        .unwrap_err();
        assert!(matches!(err, PayrollError::InvalidAmount { ref field, .. } if field == "loan_deduction"));

        assert!(matches!(
            validate_input(&PaymentInput {
                base_allowance: Some(Money::new(-10)),
                ..input(4)
            }),
            Err(PayrollError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn deductions_may_exceed_earnings() {
        let p = compute_payment(
            &employee(),
            &PaymentInput {
                loan_deduction: Money::new(150_000),
                ..input(1)
            },
        )
        .unwrap();
        assert_eq!(p.total_pay, Money::new(-50_000));
    }

    #[test]
    fn overflow_is_an_invalid_amount() {
        let mut rich = employee();
        rich.daily_rate = Money::new(i64::MAX / 2);
        assert!(matches!(
            compute_payment(&rich, &input(7)),
            Err(PayrollError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn result_is_deterministic_over_the_input_grid() {
        let e = employee();
        for days in 1..=7 {
            for base in [None, Some(Money::new(0)), Some(Money::new(30_000))] {
                for loan in [0, 1, 99_999] {
                    let i = PaymentInput {
                        base_allowance: base,
                        loan_deduction: Money::new(loan),
                        extra_allowance: Money::new(2_000),
                        ..input(days)
                    };
                    let a = compute_payment(&e, &i).unwrap();
                    let b = compute_payment(&e, &i).unwrap();
                    assert_eq!(a, b);
                    assert_eq!(
                        a.total_pay.amount(),
                        100_000 * days + a.base_allowance.amount() + 2_000 - loan
                    );
                }
            }
        }
    }
}
