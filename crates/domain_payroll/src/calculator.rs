//! Payroll calculator

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{Money, PayrollPeriod, Rate};

use crate::config::PayrollConfig;
use crate::employee::Employee;

/// Full calculation detail stored with a payroll record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollBreakdown {
    pub period: PayrollPeriod,
    pub basic_salary: Money,
    pub overtime_hours: Decimal,
    pub overtime_rate: Money,
    pub overtime_amount: Money,
    pub bonus_amount: Money,
    pub allowance_amount: Money,
    pub gross_salary: Money,
    pub tax_threshold: Money,
    pub taxable_amount: Money,
    pub tax_rate: Rate,
    pub tax_amount: Money,
    pub insurance_base: Money,
    pub insurance_rate: Rate,
    pub insurance_amount: Money,
    pub other_deductions: Money,
    pub deduction_amount: Money,
    pub net_salary: Money,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl PayrollBreakdown {
    /// Sum of the earning components
    pub fn earnings(&self) -> Money {
        self.basic_salary + self.overtime_amount + self.bonus_amount + self.allowance_amount
    }

    /// Sum of every deduction
    pub fn deductions(&self) -> Money {
        self.tax_amount + self.insurance_amount + self.other_deductions + self.deduction_amount
    }

    /// True when gross and net agree with their components
    pub fn is_balanced(&self) -> bool {
        self.gross_salary == self.earnings() && self.net_salary == self.gross_salary - self.deductions()
    }
}

/// Calculates one employee's payroll for a period
pub fn calculate(employee: &Employee, period: PayrollPeriod, config: &PayrollConfig) -> PayrollBreakdown {
    let role = config.role_salary(employee.role);
    let basic_salary = employee.base_salary.unwrap_or(role.base_salary);
    let allowance_amount = employee.allowance.unwrap_or(role.allowance);

    // No attendance feed yet, so overtime and bonus stay at zero
    let overtime_hours = Decimal::ZERO;
    let overtime_amount = config.overtime_hourly_rate.multiply(overtime_hours);
    let bonus_amount = Money::ZERO;

    let gross_salary = basic_salary + overtime_amount + bonus_amount + allowance_amount;

    let taxable_amount = if gross_salary > config.tax_threshold {
        gross_salary - config.tax_threshold
    } else {
        Money::ZERO
    };
    let tax_amount = config.tax_rate.apply(&taxable_amount);

    let insurance_base = gross_salary.min(config.insurance_max_salary);
    let insurance_amount = config.insurance_rate.apply(&insurance_base);

    let other_deductions = employee.other_deductions;
    let deduction_amount = Money::ZERO;

    let net_salary = gross_salary - tax_amount - insurance_amount - other_deductions - deduction_amount;

    PayrollBreakdown {
        period,
        basic_salary,
        overtime_hours,
        overtime_rate: config.overtime_hourly_rate,
        overtime_amount,
        bonus_amount,
        allowance_amount,
        gross_salary,
        tax_threshold: config.tax_threshold,
        taxable_amount,
        tax_rate: config.tax_rate,
        tax_amount,
        insurance_base,
        insurance_rate: config.insurance_rate,
        insurance_amount,
        other_deductions,
        deduction_amount,
        net_salary,
        notes: vec![
            "overtime pending attendance integration".to_string(),
            "bonus not yet configured".to_string(),
        ],
    }
}
