//! Payroll DTOs

use serde::Deserialize;
use validator::Validate;

use core_kernel::PayrollPeriod;
use domain_payroll::Employee;

#[derive(Debug, Deserialize, Validate)]
pub struct GeneratePayrollRequest {
    /// `YYYY-MM`
    pub period: PayrollPeriod,
    #[validate(length(min = 1))]
    pub employees: Vec<Employee>,
}

#[derive(Debug, Deserialize)]
pub struct PayrollListQuery {
    pub period: Option<PayrollPeriod>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CancelPayrollRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReversePayrollRequest {
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}
