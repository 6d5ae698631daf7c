//! Payroll domain errors

use thiserror::Error;

use core_kernel::MoneyError;

/// Errors that can occur in the payroll domain
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayrollError {
    #[error("Payroll {code} must be approved first (status: {status})")]
    NotApproved { code: String, status: String },

    #[error("Invalid payroll status transition for {code} from {from} to {to}")]
    InvalidStatusTransition { code: String, from: String, to: String },

    #[error("Payroll {0} is not paid")]
    NotPaid(String),

    #[error("Payroll totals do not add up for {0}")]
    InconsistentTotals(String),

    #[error("Net salary would be negative for {code}: {net}")]
    NegativeNetSalary { code: String, net: String },

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),
}
