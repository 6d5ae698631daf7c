//! Ledger storage ports
//!
//! Writes happen inside a [`LedgerUnitOfWork`]: one storage transaction in
//! which `lock_*` methods take a row lock before returning current state.
//! Dropping a unit of work without calling `commit` discards every write.
//!
//! Reads on [`LedgerStore`] see committed state only and take no locks.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{
    AccountId, DomainPort, PayrollId, PayrollPeriod, PortError, ProductId, SourceRef, UserId,
};
use domain_inventory::{Product, StockMovement};
use domain_payroll::PayrollRecord;

use crate::account::{Account, AccountCriteria};
use crate::cash_flow::{CashFlow, FlowTotals};
use crate::transaction::{FinancialTransaction, TransactionStatus};

/// Key marking one business effect as recorded
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub fn new(scope: &str, reference: &SourceRef) -> Self {
        Self(format!("{}:{}:{}", reference.kind, reference.id, scope))
    }

    pub fn sale_recorded(reference: &SourceRef) -> Self {
        Self::new("recorded", reference)
    }

    pub fn stock_reduced(reference: &SourceRef) -> Self {
        Self::new("stock_reduced", reference)
    }

    pub fn stock_restored(reference: &SourceRef) -> Self {
        Self::new("stock_restored", reference)
    }

    pub fn purchase_recorded(reference: &SourceRef) -> Self {
        Self::new("recorded", reference)
    }

    pub fn payroll_paid(reference: &SourceRef) -> Self {
        Self::new("paid", reference)
    }

    pub fn payroll_reversed(reference: &SourceRef) -> Self {
        Self::new("reversed", reference)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Filter for cash-flow reads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowFilter {
    /// Inclusive business date bounds
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub account: Option<AccountId>,
}

impl CashFlowFilter {
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            account: None,
        }
    }

    pub fn for_account(account: AccountId) -> Self {
        Self {
            account: Some(account),
            ..Self::default()
        }
    }

    pub fn until(mut self, to: NaiveDate) -> Self {
        self.to = Some(to);
        self
    }

    pub fn matches(&self, flow: &CashFlow) -> bool {
        self.from.map_or(true, |from| flow.flow_date >= from)
            && self.to.map_or(true, |to| flow.flow_date <= to)
            && self.account.map_or(true, |account| flow.account_id == account)
    }
}

/// Filter for transaction reads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// Inclusive lower bound on `transaction_date`
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `transaction_date`
    pub until: Option<DateTime<Utc>>,
    pub status: Option<TransactionStatus>,
    pub reference: Option<SourceRef>,
}

impl TransactionFilter {
    pub fn between(from: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            until: Some(until),
            ..Self::default()
        }
    }

    pub fn for_reference(reference: SourceRef) -> Self {
        Self {
            reference: Some(reference),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, txn: &FinancialTransaction) -> bool {
        self.from.map_or(true, |from| txn.transaction_date >= from)
            && self.until.map_or(true, |until| txn.transaction_date < until)
            && self.status.map_or(true, |status| txn.status == status)
            && self.reference.map_or(true, |reference| txn.reference == Some(reference))
    }
}

/// One storage transaction over the ledger
#[async_trait]
pub trait LedgerUnitOfWork: Send {
    /// Inserts the key if absent; returns false when it was already present
    async fn claim_idempotency_key(&mut self, key: &IdempotencyKey) -> Result<bool, PortError>;

    async fn has_idempotency_key(&mut self, key: &IdempotencyKey) -> Result<bool, PortError>;

    async fn insert_account(&mut self, account: &Account) -> Result<(), PortError>;

    async fn find_account(&mut self, criteria: &AccountCriteria) -> Result<Option<Account>, PortError>;

    /// Locks the account row and returns its current state
    async fn lock_account(&mut self, id: AccountId) -> Result<Account, PortError>;

    /// Locks every account flagged for balance reconciliation, ordered by id
    async fn lock_reconcilable_accounts(&mut self) -> Result<Vec<Account>, PortError>;

    async fn save_account(&mut self, account: &Account) -> Result<(), PortError>;

    async fn insert_transaction(&mut self, txn: &FinancialTransaction) -> Result<(), PortError>;

    async fn update_transaction(&mut self, txn: &FinancialTransaction) -> Result<(), PortError>;

    /// Locks the transactions recorded for a source, oldest first
    async fn lock_transactions_for(&mut self, reference: &SourceRef) -> Result<Vec<FinancialTransaction>, PortError>;

    async fn append_cash_flow(&mut self, flow: &CashFlow) -> Result<(), PortError>;

    async fn flow_totals(&mut self, account: AccountId) -> Result<FlowTotals, PortError>;

    async fn insert_product(&mut self, product: &Product) -> Result<(), PortError>;

    /// Locks the product row and returns its current stock
    async fn lock_product(&mut self, id: ProductId) -> Result<Product, PortError>;

    async fn save_product_stock(&mut self, product: &Product) -> Result<(), PortError>;

    async fn append_stock_movement(&mut self, movement: &StockMovement) -> Result<(), PortError>;

    async fn insert_payroll(&mut self, record: &PayrollRecord) -> Result<(), PortError>;

    async fn lock_payroll(&mut self, id: PayrollId) -> Result<PayrollRecord, PortError>;

    async fn save_payroll(&mut self, record: &PayrollRecord) -> Result<(), PortError>;

    /// Serializes payroll generation for `period` until the unit of work ends
    ///
    /// Existence checks and sequence numbers read after this call see every
    /// record committed by an earlier generation run.
    async fn lock_payroll_period(&mut self, period: PayrollPeriod) -> Result<(), PortError>;

    async fn payroll_exists(&mut self, user: UserId, period: PayrollPeriod) -> Result<bool, PortError>;

    /// Next free sequence number for payroll codes in a period, starting at 1
    ///
    /// The caller holds the period lock.
    async fn next_payroll_sequence(&mut self, period: PayrollPeriod) -> Result<u32, PortError>;

    async fn commit(self: Box<Self>) -> Result<(), PortError>;

    async fn rollback(self: Box<Self>) -> Result<(), PortError>;
}

/// Ledger storage port
#[async_trait]
pub trait LedgerStore: DomainPort {
    async fn begin(&self) -> Result<Box<dyn LedgerUnitOfWork>, PortError>;

    async fn find_account(&self, criteria: &AccountCriteria) -> Result<Option<Account>, PortError>;

    async fn get_account(&self, id: AccountId) -> Result<Account, PortError>;

    async fn list_accounts(&self) -> Result<Vec<Account>, PortError>;

    async fn transactions(&self, filter: &TransactionFilter) -> Result<Vec<FinancialTransaction>, PortError>;

    /// Cash flows ordered by flow date, then creation
    async fn cash_flows(&self, filter: &CashFlowFilter) -> Result<Vec<CashFlow>, PortError>;

    async fn get_product(&self, id: ProductId) -> Result<Product, PortError>;

    /// Movements of one product in recording order
    async fn stock_movements(&self, product: ProductId) -> Result<Vec<StockMovement>, PortError>;

    async fn get_payroll(&self, id: PayrollId) -> Result<PayrollRecord, PortError>;

    async fn list_payrolls(&self, period: Option<PayrollPeriod>) -> Result<Vec<PayrollRecord>, PortError>;
}
