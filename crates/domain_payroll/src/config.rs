//! Payroll configuration

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use core_kernel::{Money, Rate};

use crate::employee::EmployeeRole;

/// Base salary and allowance for one role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSalary {
    pub base_salary: Money,
    pub allowance: Money,
}

impl RoleSalary {
    pub fn new(base_salary: Money, allowance: Money) -> Self {
        Self { base_salary, allowance }
    }

    /// Built-in table used when a role has no configured entry
    pub fn fallback(role: EmployeeRole) -> Self {
        match role {
            EmployeeRole::Admin => Self::new(Money::from_rupiah(4_500_000), Money::from_rupiah(500_000)),
            EmployeeRole::Cashier => Self::new(Money::from_rupiah(3_500_000), Money::from_rupiah(300_000)),
            EmployeeRole::Warehouse => Self::new(Money::from_rupiah(3_200_000), Money::from_rupiah(300_000)),
            EmployeeRole::Driver => Self::new(Money::from_rupiah(3_000_000), Money::from_rupiah(400_000)),
        }
    }
}

/// Payroll calculation parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayrollConfig {
    /// Gross salary above which tax applies
    pub tax_threshold: Money,
    /// Flat tax rate on the amount above the threshold
    pub tax_rate: Rate,
    /// Employee insurance contribution rate
    pub insurance_rate: Rate,
    /// Salary cap for the insurance base
    pub insurance_max_salary: Money,
    pub overtime_hourly_rate: Money,
    /// Per-role overrides of the fallback salary table
    pub roles: BTreeMap<EmployeeRole, RoleSalary>,
}

impl Default for PayrollConfig {
    fn default() -> Self {
        Self {
            tax_threshold: Money::from_rupiah(4_500_000),
            tax_rate: Rate::from_percentage(dec!(5)),
            insurance_rate: Rate::from_percentage(dec!(1)),
            insurance_max_salary: Money::from_rupiah(12_000_000),
            overtime_hourly_rate: Money::from_rupiah(20_000),
            roles: BTreeMap::new(),
        }
    }
}

impl PayrollConfig {
    pub fn with_role(mut self, role: EmployeeRole, salary: RoleSalary) -> Self {
        self.roles.insert(role, salary);
        self
    }

    pub fn with_tax(mut self, threshold: Money, rate: Rate) -> Self {
        self.tax_threshold = threshold;
        self.tax_rate = rate;
        self
    }

    pub fn with_insurance(mut self, rate: Rate, max_salary: Money) -> Self {
        self.insurance_rate = rate;
        self.insurance_max_salary = max_salary;
        self
    }

    /// Salary table entry for a role, configured or fallback
    pub fn role_salary(&self, role: EmployeeRole) -> RoleSalary {
        self.roles
            .get(&role)
            .copied()
            .unwrap_or_else(|| RoleSalary::fallback(role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_role_overrides_fallback() {
        let custom = RoleSalary::new(Money::from_rupiah(5_000_000), Money::ZERO);
        let config = PayrollConfig::default().with_role(EmployeeRole::Cashier, custom);

        assert_eq!(config.role_salary(EmployeeRole::Cashier), custom);
        assert_eq!(config.role_salary(EmployeeRole::Driver), RoleSalary::fallback(EmployeeRole::Driver));
    }
}
