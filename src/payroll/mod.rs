//! Payroll computation and reconciliation.
//!
//! Writes flow resolver -> calculator -> engine -> store; reads flow
//! store -> aggregate -> view.

pub mod aggregate;
pub mod calculator;
pub mod engine;
pub mod period;
