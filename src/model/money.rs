//! Integer money in whole currency units.
//!
//! Amounts are carried as `i64` from the wire to the store. Fractional or
//! non-finite input is rejected at the boundary instead of being rounded.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PayrollError;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn new(amount: i64) -> Self {
        Money(amount)
    }

    pub const fn amount(self) -> i64 {
        self.0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    pub fn checked_mul(self, factor: i64) -> Option<Money> {
        self.0.checked_mul(factor).map(Money)
    }

    /// Sum of `amounts`, or `None` when the result does not fit in `i64`.
    ///
    /// Accumulates in `i128`, so mixed-sign terms give the same answer in any
    /// order.
    pub fn checked_sum<I>(amounts: I) -> Option<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        let total: i128 = amounts.into_iter().map(|m| i128::from(m.0)).sum();
        i64::try_from(total).ok().map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Money(amount)
    }
}

/// Parse an optional money field from a loosely typed JSON value.
///
/// `null`, a missing field and a blank string all mean "not supplied".
/// Numbers and numeric strings are accepted when they are finite, integral
/// and non-negative.
pub fn parse_amount(field: &str, value: Option<&Value>) -> Result<Option<Money>, PayrollError> {
    let amount = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => parse_numeric_str(field, s.trim())?,
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => i,
            None => integral_f64(field, n.as_f64())?,
        },
        Some(other) => {
            return Err(PayrollError::invalid_amount(
                field,
                format!("expected a number, got {}", json_kind(other)),
            ));
        }
    };

    if amount < 0 {
        return Err(PayrollError::invalid_amount(
            field,
            format!("must not be negative, got {amount}"),
        ));
    }

    Ok(Some(Money(amount)))
}

/// Like [`parse_amount`], treating an omitted value as zero.
pub fn parse_amount_or_zero(field: &str, value: Option<&Value>) -> Result<Money, PayrollError> {
    Ok(parse_amount(field, value)?.unwrap_or(Money::ZERO))
}

fn parse_numeric_str(field: &str, s: &str) -> Result<i64, PayrollError> {
    if let Ok(i) = s.parse::<i64>() {
        return Ok(i);
    }
    match s.parse::<f64>() {
        Ok(f) => integral_f64(field, Some(f)),
        Err(_) => Err(PayrollError::invalid_amount(
            field,
            format!("'{s}' is not a number"),
        )),
    }
}

fn integral_f64(field: &str, value: Option<f64>) -> Result<i64, PayrollError> {
    let f = value.ok_or_else(|| PayrollError::invalid_amount(field, "not a number"))?;
    if !f.is_finite() {
        return Err(PayrollError::invalid_amount(field, "must be a finite number"));
    }
    if f.fract() != 0.0 {
        return Err(PayrollError::invalid_amount(
            field,
            format!("must be a whole amount, got {f}"),
        ));
    }
    if f < i64::MIN as f64 || f > i64::MAX as f64 {
        return Err(PayrollError::invalid_amount(field, "out of range"));
    }
    Ok(f as i64)
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
