//! Inbound business events and what recording them produced

use serde::{Deserialize, Serialize};

use core_kernel::{AccountId, PayrollId, UserId};
use domain_inventory::{LineQuantity, StockMovement};
use domain_payroll::PayrollRecord;

use crate::account::Account;
use crate::cash_flow::CashFlow;
use crate::source::{Purchase, Sale};
use crate::transaction::FinancialTransaction;

/// Events delivered by the point-of-sale layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// Sale entered; its lines leave stock
    SaleCreated { sale: Sale },
    /// Sale finalized; book its income
    SaleCompleted { sale: Sale },
    SaleEdited {
        sale: Sale,
        old_lines: Vec<LineQuantity>,
        new_lines: Vec<LineQuantity>,
    },
    SaleDeleted { sale: Sale },
    PurchaseCompleted { purchase: Purchase },
    PayrollPaymentRequested {
        payroll_id: PayrollId,
        /// Paying account, the configured payroll account when absent
        #[serde(default)]
        account_id: Option<AccountId>,
        approver: UserId,
    },
    PaymentConfirmed { sale: Sale },
    PaymentRejected { sale: Sale, reason: String },
}

impl LedgerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::SaleCreated { .. } => "sale_created",
            LedgerEvent::SaleCompleted { .. } => "sale_completed",
            LedgerEvent::SaleEdited { .. } => "sale_edited",
            LedgerEvent::SaleDeleted { .. } => "sale_deleted",
            LedgerEvent::PurchaseCompleted { .. } => "purchase_completed",
            LedgerEvent::PayrollPaymentRequested { .. } => "payroll_payment_requested",
            LedgerEvent::PaymentConfirmed { .. } => "payment_confirmed",
            LedgerEvent::PaymentRejected { .. } => "payment_rejected",
        }
    }
}

/// Everything one recorded event wrote
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOutcome {
    /// The event had already been recorded; nothing was written
    pub already_recorded: bool,
    /// Inserted or updated transactions, primary first
    pub transactions: Vec<FinancialTransaction>,
    pub cash_flows: Vec<CashFlow>,
    /// Account state after mutation
    pub accounts: Vec<Account>,
    pub movements: Vec<StockMovement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payroll: Option<PayrollRecord>,
}

impl EventOutcome {
    pub fn already_recorded() -> Self {
        Self {
            already_recorded: true,
            ..Self::default()
        }
    }

    pub fn primary_transaction(&self) -> Option<&FinancialTransaction> {
        self.transactions.first()
    }

    /// Latest state of an account touched by the event
    pub fn account(&self, id: AccountId) -> Option<&Account> {
        self.accounts.iter().rev().find(|account| account.id == id)
    }

    pub(crate) fn merge(&mut self, other: EventOutcome) {
        self.transactions.extend(other.transactions);
        self.cash_flows.extend(other.cash_flows);
        self.accounts.extend(other.accounts);
        self.movements.extend(other.movements);
        if other.payroll.is_some() {
            self.payroll = other.payroll;
        }
    }
}
