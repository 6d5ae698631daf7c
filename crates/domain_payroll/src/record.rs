//! Payroll records and their status lifecycle

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{Money, PayrollId, PayrollPeriod, TransactionId, UserId};

use crate::calculator::PayrollBreakdown;
use crate::error::PayrollError;

/// Payroll status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayrollStatus {
    Draft,
    Approved,
    Paid,
    Cancelled,
}

impl PayrollStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayrollStatus::Draft => "draft",
            PayrollStatus::Approved => "approved",
            PayrollStatus::Paid => "paid",
            PayrollStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PayrollStatus::Paid | PayrollStatus::Cancelled)
    }
}

impl fmt::Display for PayrollStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayrollStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PayrollStatus::Draft),
            "approved" => Ok(PayrollStatus::Approved),
            "paid" => Ok(PayrollStatus::Paid),
            "cancelled" => Ok(PayrollStatus::Cancelled),
            other => Err(format!("unknown payroll status: {}", other)),
        }
    }
}

/// Formats a payroll code, `PAY-YYYY-MM-NNN`
pub fn payroll_code(period: PayrollPeriod, sequence: u32) -> String {
    format!("PAY-{}-{:03}", period, sequence)
}

/// A payroll record for one employee and month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayrollRecord {
    pub id: PayrollId,
    pub code: String,
    pub user_id: UserId,
    pub period: PayrollPeriod,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub basic_salary: Money,
    pub overtime_amount: Money,
    pub bonus_amount: Money,
    pub allowance_amount: Money,
    pub gross_salary: Money,
    pub tax_amount: Money,
    pub insurance_amount: Money,
    pub other_deductions: Money,
    pub deduction_amount: Money,
    pub net_salary: Money,
    pub status: PayrollStatus,
    pub breakdown: PayrollBreakdown,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub payment_date: Option<DateTime<Utc>>,
    pub paid_by: Option<UserId>,
    /// Ledger transaction booked when paid
    pub transaction_id: Option<TransactionId>,
    pub notes: Option<String>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PayrollRecord {
    /// Creates a draft record from a calculated breakdown
    pub fn draft(code: impl Into<String>, user_id: UserId, breakdown: PayrollBreakdown) -> Self {
        let now = Utc::now();
        let period = breakdown.period;

        Self {
            id: PayrollId::new_v7(),
            code: code.into(),
            user_id,
            period,
            period_start: period.start(),
            period_end: period.end(),
            basic_salary: breakdown.basic_salary,
            overtime_amount: breakdown.overtime_amount,
            bonus_amount: breakdown.bonus_amount,
            allowance_amount: breakdown.allowance_amount,
            gross_salary: breakdown.gross_salary,
            tax_amount: breakdown.tax_amount,
            insurance_amount: breakdown.insurance_amount,
            other_deductions: breakdown.other_deductions,
            deduction_amount: breakdown.deduction_amount,
            net_salary: breakdown.net_salary,
            status: PayrollStatus::Draft,
            breakdown,
            approved_by: None,
            approved_at: None,
            payment_date: None,
            paid_by: None,
            transaction_id: None,
            notes: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_created_by(mut self, user: Option<UserId>) -> Self {
        self.created_by = user;
        self
    }

    /// Validates the gross and net formulas and a non-negative payout
    pub fn validate(&self) -> Result<(), PayrollError> {
        let gross = self.basic_salary + self.overtime_amount + self.bonus_amount + self.allowance_amount;
        let net = self.gross_salary
            - self.tax_amount
            - self.insurance_amount
            - self.other_deductions
            - self.deduction_amount;

        if gross != self.gross_salary || net != self.net_salary {
            return Err(PayrollError::InconsistentTotals(self.code.clone()));
        }
        if self.net_salary.is_negative() {
            return Err(PayrollError::NegativeNetSalary {
                code: self.code.clone(),
                net: self.net_salary.to_string(),
            });
        }
        Ok(())
    }

    /// Approves a draft
    pub fn approve(&mut self, approver: UserId) -> Result<(), PayrollError> {
        self.transition(PayrollStatus::Approved)?;
        let now = Utc::now();
        self.approved_by = Some(approver);
        self.approved_at = Some(now);
        Ok(())
    }

    /// Cancels a draft or approved record
    pub fn cancel(&mut self, reason: Option<String>) -> Result<(), PayrollError> {
        self.transition(PayrollStatus::Cancelled)?;
        if reason.is_some() {
            self.notes = reason;
        }
        Ok(())
    }

    /// Checks that the record can be paid
    pub fn ensure_payable(&self) -> Result<(), PayrollError> {
        if self.status != PayrollStatus::Approved {
            return Err(PayrollError::NotApproved {
                code: self.code.clone(),
                status: self.status.to_string(),
            });
        }
        self.validate()
    }

    /// Marks an approved record paid and links the ledger transaction
    pub fn mark_paid(&mut self, transaction_id: TransactionId, paid_by: UserId) -> Result<(), PayrollError> {
        self.ensure_payable()?;
        self.transition(PayrollStatus::Paid)?;
        self.transaction_id = Some(transaction_id);
        self.paid_by = Some(paid_by);
        self.payment_date = Some(self.updated_at);
        Ok(())
    }

    fn transition(&mut self, target: PayrollStatus) -> Result<(), PayrollError> {
        if !self.can_transition_to(target) {
            return Err(PayrollError::InvalidStatusTransition {
                code: self.code.clone(),
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        self.status = target;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn can_transition_to(&self, target: PayrollStatus) -> bool {
        use PayrollStatus::*;
        matches!(
            (self.status, target),
            (Draft, Approved) |
            (Approved, Paid) |
            (Draft, Cancelled) |
            (Approved, Cancelled)
        )
    }
}
