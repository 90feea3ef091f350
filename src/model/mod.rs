pub mod employee;
pub mod money;
pub mod payroll;
pub mod period;
pub mod role;
pub mod view;
