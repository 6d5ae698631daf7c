//! Payroll Domain - salary calculation and payroll lifecycle
//!
//! A payroll record is generated once per employee and month, reviewed,
//! approved and finally paid out of a cash or bank account:
//!
//! ```text
//! draft ──approve──► approved ──pay──► paid
//!   │                    │
//!   └──cancel──► cancelled ◄──cancel──┘
//! ```
//!
//! The calculator is deterministic: base salary and allowance come from the
//! role table in [`PayrollConfig`] (or an employee override), tax is a flat rate
//! over a threshold and insurance is a capped contribution. Overtime hours and
//! bonuses are always zero until attendance data is available.
//!
//! Booking the payment against an account is the ledger's job; this crate only
//! owns the numbers and the status rules.

pub mod calculator;
pub mod config;
pub mod employee;
pub mod record;
pub mod error;

pub use calculator::{calculate, PayrollBreakdown};
pub use config::{PayrollConfig, RoleSalary};
pub use employee::{Employee, EmployeeRole};
pub use record::{payroll_code, PayrollRecord, PayrollStatus};
pub use error::PayrollError;
