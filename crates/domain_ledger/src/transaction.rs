//! Financial transactions
//!
//! A transaction is the immutable record of one business event's money
//! effect. Only its status and audit trail change after creation:
//!
//! ```text
//! pending ──complete──► completed ──cancel (reversal)──► cancelled
//!    └──────────────cancel──────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{AccountId, Money, SourceRef, TransactionId, UserId};

use crate::cash_flow::{FlowDirection, FlowType};
use crate::error::LedgerError;

/// Income or expense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(format!("unknown transaction kind: {}", other)),
        }
    }
}

/// Transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "completed" => Ok(TransactionStatus::Completed),
            "cancelled" => Ok(TransactionStatus::Cancelled),
            other => Err(format!("unknown transaction status: {}", other)),
        }
    }
}

/// Business category of a transaction and its cash flows
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionCategory {
    Sales,
    CostOfGoods,
    Purchase,
    Payroll,
    PayrollReversal,
    Operational,
    Capital,
    Other,
}

impl TransactionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionCategory::Sales => "sales",
            TransactionCategory::CostOfGoods => "cost_of_goods",
            TransactionCategory::Purchase => "purchase",
            TransactionCategory::Payroll => "payroll",
            TransactionCategory::PayrollReversal => "payroll_reversal",
            TransactionCategory::Operational => "operational",
            TransactionCategory::Capital => "capital",
            TransactionCategory::Other => "other",
        }
    }

    /// Cash-flow statement section for this category
    pub fn flow_type(&self) -> FlowType {
        match self {
            TransactionCategory::Capital => FlowType::Financing,
            _ => FlowType::Operating,
        }
    }
}

impl fmt::Display for TransactionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sales" => Ok(TransactionCategory::Sales),
            "cost_of_goods" => Ok(TransactionCategory::CostOfGoods),
            "purchase" => Ok(TransactionCategory::Purchase),
            "payroll" => Ok(TransactionCategory::Payroll),
            "payroll_reversal" => Ok(TransactionCategory::PayrollReversal),
            "operational" => Ok(TransactionCategory::Operational),
            "capital" => Ok(TransactionCategory::Capital),
            "other" => Ok(TransactionCategory::Other),
            other => Err(format!("unknown transaction category: {}", other)),
        }
    }
}

/// Prefix segment of a transaction code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodePrefix {
    Sale,
    CostOfGoods,
    Purchase,
    Payroll,
    PayrollReversal,
}

impl CodePrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodePrefix::Sale => "SALE",
            CodePrefix::CostOfGoods => "COGS",
            CodePrefix::Purchase => "PURC",
            CodePrefix::Payroll => "PAYR",
            CodePrefix::PayrollReversal => "PREV",
        }
    }
}

/// Formats `TXN-{PREFIX}-{referenceId}-{YYYYMMDD}`
pub fn transaction_code(prefix: CodePrefix, reference: &SourceRef, date: NaiveDate) -> String {
    format!(
        "TXN-{}-{}-{}",
        prefix.as_str(),
        reference.simple_id(),
        date.format("%Y%m%d")
    )
}

/// Which booking produced the transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    Sale,
    CostOfGoods,
    Purchase,
    PayrollPayment,
    PayrollReversal,
}

/// Audit trail events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEvent {
    Created,
    AmountChanged,
    Completed,
    Clamped,
    Reversed,
    Cancelled,
}

/// One timestamped audit entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditNote {
    pub at: DateTime<Utc>,
    pub event: AuditEvent,
    pub detail: String,
}

/// Balance effect actually applied to one account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedLeg {
    pub account_id: AccountId,
    pub direction: FlowDirection,
    pub requested: Money,
    pub applied: Money,
}

/// Structured, versioned audit trail of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionAudit {
    pub version: u16,
    pub kind: AuditKind,
    /// Set once account balances have been mutated for this transaction
    pub balance_applied: bool,
    /// Amount applied on the primary account
    pub applied_amount: Money,
    /// Part of the amount not applied because a balance was clamped
    pub clamped_shortfall: Money,
    #[serde(default)]
    pub legs: Vec<AppliedLeg>,
    #[serde(default)]
    pub notes: Vec<AuditNote>,
}

impl TransactionAudit {
    pub const VERSION: u16 = 1;

    pub fn new(kind: AuditKind) -> Self {
        Self {
            version: Self::VERSION,
            kind,
            balance_applied: false,
            applied_amount: Money::ZERO,
            clamped_shortfall: Money::ZERO,
            legs: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn note(&mut self, event: AuditEvent, detail: impl Into<String>) {
        self.notes.push(AuditNote {
            at: Utc::now(),
            event,
            detail: detail.into(),
        });
    }
}

/// A financial transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialTransaction {
    pub id: TransactionId,
    /// Unique human-readable code
    pub code: String,
    pub kind: TransactionKind,
    pub category: TransactionCategory,
    pub subcategory: Option<String>,
    /// Always positive
    pub amount: Money,
    pub from_account: Option<AccountId>,
    pub to_account: Option<AccountId>,
    pub reference: Option<SourceRef>,
    pub status: TransactionStatus,
    pub description: String,
    pub transaction_date: DateTime<Utc>,
    pub created_by: Option<UserId>,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub audit: TransactionAudit,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FinancialTransaction {
    /// Starts a pending transaction
    pub fn new(
        code: impl Into<String>,
        kind: TransactionKind,
        category: TransactionCategory,
        amount: Money,
        audit_kind: AuditKind,
    ) -> Self {
        let now = Utc::now();
        let mut audit = TransactionAudit::new(audit_kind);
        audit.note(AuditEvent::Created, format!("{} {} recorded", kind, amount));

        Self {
            id: TransactionId::new_v7(),
            code: code.into(),
            kind,
            category,
            subcategory: None,
            amount,
            from_account: None,
            to_account: None,
            reference: None,
            status: TransactionStatus::Pending,
            description: String::new(),
            transaction_date: now,
            created_by: None,
            approved_by: None,
            approved_at: None,
            audit,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn from_account(mut self, account: AccountId) -> Self {
        self.from_account = Some(account);
        self
    }

    pub fn to_account(mut self, account: AccountId) -> Self {
        self.to_account = Some(account);
        self
    }

    pub fn referencing(mut self, reference: SourceRef) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    pub fn created_by(mut self, user: Option<UserId>) -> Self {
        self.created_by = user;
        self
    }

    /// Checks the amount and account rules
    ///
    /// Income needs a destination account, expense needs a source account;
    /// transfers set both.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if !self.amount.is_positive() {
            return Err(LedgerError::InvalidTransaction(format!(
                "{}: amount must be positive, got {}",
                self.code, self.amount
            )));
        }
        let missing = match self.kind {
            TransactionKind::Income => self.to_account.is_none(),
            TransactionKind::Expense => self.from_account.is_none(),
        };
        if missing {
            return Err(LedgerError::InvalidTransaction(format!(
                "{}: {} transaction requires {} account",
                self.code,
                self.kind,
                match self.kind {
                    TransactionKind::Income => "a destination",
                    TransactionKind::Expense => "a source",
                }
            )));
        }
        if self.from_account.is_some() && self.from_account == self.to_account {
            return Err(LedgerError::InvalidTransaction(format!(
                "{}: source and destination account are the same",
                self.code
            )));
        }
        Ok(())
    }

    /// Balance effects, primary account first
    pub fn legs(&self) -> Vec<(AccountId, FlowDirection)> {
        let outflow = self.from_account.map(|a| (a, FlowDirection::Outflow));
        let inflow = self.to_account.map(|a| (a, FlowDirection::Inflow));
        let ordered = match self.kind {
            TransactionKind::Income => [inflow, outflow],
            TransactionKind::Expense => [outflow, inflow],
        };
        ordered.into_iter().flatten().collect()
    }

    pub fn is_completed(&self) -> bool {
        self.status == TransactionStatus::Completed
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == TransactionStatus::Cancelled
    }

    /// Marks a pending transaction completed
    pub fn complete(&mut self, approver: Option<UserId>) -> Result<(), LedgerError> {
        self.transition(TransactionStatus::Completed)?;
        self.approved_by = approver.or(self.approved_by);
        self.approved_at = Some(self.updated_at);
        self.audit.note(AuditEvent::Completed, "payment confirmed");
        Ok(())
    }

    /// Marks the transaction cancelled
    ///
    /// Reversing an applied balance is the caller's job and must happen first.
    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<(), LedgerError> {
        self.transition(TransactionStatus::Cancelled)?;
        self.audit.note(AuditEvent::Cancelled, reason);
        Ok(())
    }

    /// Changes the amount of a pending transaction
    pub fn change_amount(&mut self, amount: Money) -> Result<(), LedgerError> {
        if self.status != TransactionStatus::Pending {
            return Err(LedgerError::InvalidTransactionState {
                code: self.code.clone(),
                from: self.status.to_string(),
                to: "amended".to_string(),
            });
        }
        if amount == self.amount {
            return Ok(());
        }
        let previous = self.amount;
        self.amount = amount;
        self.validate()?;
        self.updated_at = Utc::now();
        self.audit
            .note(AuditEvent::AmountChanged, format!("amount {} -> {}", previous, amount));
        Ok(())
    }

    fn transition(&mut self, target: TransactionStatus) -> Result<(), LedgerError> {
        if !self.can_transition_to(target) {
            return Err(LedgerError::InvalidTransactionState {
                code: self.code.clone(),
                from: self.status.to_string(),
                to: target.to_string(),
            });
        }
        self.status = target;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn can_transition_to(&self, target: TransactionStatus) -> bool {
        use TransactionStatus::*;
        matches!(
            (self.status, target),
            (Pending, Completed) |
            (Pending, Cancelled) |
            (Completed, Cancelled)
        )
    }
}
