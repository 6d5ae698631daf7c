//! Employees as seen by payroll

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{Money, UserId};

/// Staff roles with a salary table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeRole {
    Admin,
    Cashier,
    Warehouse,
    Driver,
}

impl EmployeeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeRole::Admin => "admin",
            EmployeeRole::Cashier => "cashier",
            EmployeeRole::Warehouse => "warehouse",
            EmployeeRole::Driver => "driver",
        }
    }
}

impl fmt::Display for EmployeeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmployeeRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(EmployeeRole::Admin),
            "cashier" => Ok(EmployeeRole::Cashier),
            "warehouse" => Ok(EmployeeRole::Warehouse),
            "driver" => Ok(EmployeeRole::Driver),
            other => Err(format!("unknown employee role: {}", other)),
        }
    }
}

/// An employee to generate payroll for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub user_id: UserId,
    pub name: String,
    pub role: EmployeeRole,
    /// Overrides the role's base salary
    #[serde(default)]
    pub base_salary: Option<Money>,
    /// Overrides the role's allowance
    #[serde(default)]
    pub allowance: Option<Money>,
    /// Recurring deductions such as a cash advance instalment
    #[serde(default)]
    pub other_deductions: Money,
}

impl Employee {
    pub fn new(user_id: UserId, name: impl Into<String>, role: EmployeeRole) -> Self {
        Self {
            user_id,
            name: name.into(),
            role,
            base_salary: None,
            allowance: None,
            other_deductions: Money::ZERO,
        }
    }

    pub fn with_base_salary(mut self, salary: Money) -> Self {
        self.base_salary = Some(salary);
        self
    }

    pub fn with_allowance(mut self, allowance: Money) -> Self {
        self.allowance = Some(allowance);
        self
    }

    pub fn with_other_deductions(mut self, amount: Money) -> Self {
        self.other_deductions = amount;
        self
    }
}
