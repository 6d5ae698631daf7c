//! Ledger Domain - Accounts, Cash Flows and Stock Reconciliation
//!
//! This crate turns shop business events into account balance mutations,
//! append-only cash flow records, stock movements and immutable transaction
//! records, and keeps them reconcilable after edits, deletions, rejections
//! and reversals.
//!
//! # Booking Rules
//!
//! - Every mutation runs inside one [`LedgerUnitOfWork`]; a failure anywhere
//!   drops it and nothing is kept
//! - Product and account rows are locked before they are read
//! - Each business effect is guarded by an [`IdempotencyKey`] claimed in the
//!   same unit of work as the balance change
//! - Cash flows are ground truth; [`ReconciliationEngine`] rebuilds balances
//!   from them
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_ledger::{LedgerEvent, TransactionRecorder};
//!
//! let recorder = TransactionRecorder::new(store, mapping);
//! let outcome = recorder.record_event(LedgerEvent::SaleCompleted { sale }).await?;
//! assert!(outcome.primary_transaction().unwrap().is_completed());
//! ```

pub mod account;
pub mod cash_flow;
pub mod transaction;
pub mod source;
pub mod payment;
pub mod events;
pub mod ports;
mod posting;
pub mod stock;
pub mod recorder;
pub mod payroll;
pub mod reconciliation;
pub mod memory;
pub mod error;

pub use account::{
    Account, AccountCategory, AccountCriteria, AccountType, BalanceChange, OverdraftPolicy,
    ShopChartOfAccounts,
};
pub use cash_flow::{CashFlow, FlowDirection, FlowTotals, FlowType};
pub use transaction::{
    transaction_code, AppliedLeg, AuditEvent, AuditKind, AuditNote, CodePrefix,
    FinancialTransaction, TransactionAudit, TransactionCategory, TransactionKind,
    TransactionStatus,
};
pub use source::{Purchase, PurchaseLine, Sale, SaleChannel, SaleLine, SaleStatus};
pub use payment::{resolve_status, AccountCodes, AccountMapping, PaymentMethod};
pub use events::{EventOutcome, LedgerEvent};
pub use ports::{CashFlowFilter, IdempotencyKey, LedgerStore, LedgerUnitOfWork, TransactionFilter};
pub use stock::StockLedger;
pub use recorder::TransactionRecorder;
pub use payroll::{GenerationReport, PayrollService};
pub use reconciliation::{AccountReconciliation, ReconciliationEngine, ReconciliationReport};
pub use memory::InMemoryLedgerStore;
pub use error::{ErrorKind, LedgerError};
