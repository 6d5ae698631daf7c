//! In-memory implementation of the ledger ports
//!
//! A unit of work holds the store's single lock from `begin` until it is
//! committed or dropped, so units of work run one at a time. Writes go to a
//! working copy that replaces the shared state on commit.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use core_kernel::{
    AccountId, AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PayrollId,
    PayrollPeriod, PortError, ProductId, SourceRef, UserId,
};
use domain_inventory::{Product, StockMovement};
use domain_payroll::PayrollRecord;

use crate::account::{Account, AccountCriteria};
use crate::cash_flow::{CashFlow, FlowTotals};
use crate::ports::{
    CashFlowFilter, IdempotencyKey, LedgerStore, LedgerUnitOfWork, TransactionFilter,
};
use crate::transaction::FinancialTransaction;

#[derive(Debug, Clone, Default)]
struct LedgerState {
    accounts: BTreeMap<AccountId, Account>,
    transactions: Vec<FinancialTransaction>,
    cash_flows: Vec<CashFlow>,
    products: HashMap<ProductId, Product>,
    movements: Vec<StockMovement>,
    payrolls: Vec<PayrollRecord>,
    idempotency_keys: HashSet<IdempotencyKey>,
}

impl LedgerState {
    fn account(&self, id: AccountId) -> Result<&Account, PortError> {
        self.accounts.get(&id).ok_or_else(|| PortError::not_found("Account", id))
    }

    fn find_account(&self, criteria: &AccountCriteria) -> Option<Account> {
        let mut matches: Vec<&Account> = self.accounts.values().filter(|a| criteria.matches(a)).collect();
        matches.sort_by(|a, b| a.code.cmp(&b.code));
        matches.first().map(|account| (*account).clone())
    }

    fn product(&self, id: ProductId) -> Result<&Product, PortError> {
        self.products.get(&id).ok_or_else(|| PortError::not_found("Product", id))
    }

    fn payroll(&self, id: PayrollId) -> Result<&PayrollRecord, PortError> {
        self.payrolls
            .iter()
            .find(|record| record.id == id)
            .ok_or_else(|| PortError::not_found("Payroll", id))
    }
}

/// Ledger store kept in process memory
#[derive(Clone, Default)]
pub struct InMemoryLedgerStore {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts accounts outside any unit of work
    pub async fn seed_accounts(&self, accounts: impl IntoIterator<Item = Account>) -> Result<(), PortError> {
        let mut state = self.state.lock().await;
        for account in accounts {
            if state.accounts.values().any(|existing| existing.code == account.code) {
                return Err(PortError::conflict(format!("account code {} already exists", account.code)));
            }
            state.accounts.insert(account.id, account);
        }
        Ok(())
    }

    /// Inserts a product with its current stock and no movement history
    pub async fn seed_product(&self, product: Product) {
        let mut state = self.state.lock().await;
        state.products.insert(product.id, product);
    }

    /// Overwrites a stored balance without a cash flow, simulating a manual data fix
    pub async fn force_balance(&self, id: AccountId, balance: core_kernel::Money) -> Result<(), PortError> {
        let mut state = self.state.lock().await;
        let account = state
            .accounts
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("Account", id))?;
        account.current_balance = balance;
        Ok(())
    }

    pub async fn idempotency_key_count(&self) -> usize {
        self.state.lock().await.idempotency_keys.len()
    }
}

impl DomainPort for InMemoryLedgerStore {}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerUnitOfWork>, PortError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, working }))
    }

    async fn find_account(&self, criteria: &AccountCriteria) -> Result<Option<Account>, PortError> {
        Ok(self.state.lock().await.find_account(criteria))
    }

    async fn get_account(&self, id: AccountId) -> Result<Account, PortError> {
        self.state.lock().await.account(id).cloned()
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, PortError> {
        let state = self.state.lock().await;
        let mut accounts: Vec<Account> = state.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(accounts)
    }

    async fn transactions(&self, filter: &TransactionFilter) -> Result<Vec<FinancialTransaction>, PortError> {
        let state = self.state.lock().await;
        let mut transactions: Vec<FinancialTransaction> = state
            .transactions
            .iter()
            .filter(|txn| filter.matches(txn))
            .cloned()
            .collect();
        transactions.sort_by_key(|txn| txn.transaction_date);
        Ok(transactions)
    }

    async fn cash_flows(&self, filter: &CashFlowFilter) -> Result<Vec<CashFlow>, PortError> {
        let state = self.state.lock().await;
        let mut flows: Vec<CashFlow> = state
            .cash_flows
            .iter()
            .filter(|flow| filter.matches(flow))
            .cloned()
            .collect();
        flows.sort_by_key(|flow| flow.flow_date);
        Ok(flows)
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, PortError> {
        self.state.lock().await.product(id).cloned()
    }

    async fn stock_movements(&self, product: ProductId) -> Result<Vec<StockMovement>, PortError> {
        let state = self.state.lock().await;
        Ok(state
            .movements
            .iter()
            .filter(|movement| movement.product_id == product)
            .cloned()
            .collect())
    }

    async fn get_payroll(&self, id: PayrollId) -> Result<PayrollRecord, PortError> {
        self.state.lock().await.payroll(id).cloned()
    }

    async fn list_payrolls(&self, period: Option<PayrollPeriod>) -> Result<Vec<PayrollRecord>, PortError> {
        let state = self.state.lock().await;
        let mut records: Vec<PayrollRecord> = state
            .payrolls
            .iter()
            .filter(|record| period.map_or(true, |p| record.period == p))
            .cloned()
            .collect();
        records.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(records)
    }
}

#[async_trait]
impl HealthCheckable for InMemoryLedgerStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = Instant::now();
        let accounts = self.state.lock().await.accounts.len();
        HealthCheckResult {
            adapter_id: "memory-ledger".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: start.elapsed().as_millis() as u64,
            message: Some(format!("{} accounts", accounts)),
            checked_at: Utc::now(),
        }
    }
}

struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<LedgerState>,
    working: LedgerState,
}

#[async_trait]
impl LedgerUnitOfWork for MemoryUnitOfWork {
    async fn claim_idempotency_key(&mut self, key: &IdempotencyKey) -> Result<bool, PortError> {
        Ok(self.working.idempotency_keys.insert(key.clone()))
    }

    async fn has_idempotency_key(&mut self, key: &IdempotencyKey) -> Result<bool, PortError> {
        Ok(self.working.idempotency_keys.contains(key))
    }

    async fn insert_account(&mut self, account: &Account) -> Result<(), PortError> {
        if self.working.accounts.values().any(|existing| existing.code == account.code) {
            return Err(PortError::conflict(format!("account code {} already exists", account.code)));
        }
        self.working.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn find_account(&mut self, criteria: &AccountCriteria) -> Result<Option<Account>, PortError> {
        Ok(self.working.find_account(criteria))
    }

    async fn lock_account(&mut self, id: AccountId) -> Result<Account, PortError> {
        self.working.account(id).cloned()
    }

    async fn lock_reconcilable_accounts(&mut self) -> Result<Vec<Account>, PortError> {
        let mut accounts: Vec<Account> = self
            .working
            .accounts
            .values()
            .filter(|account| account.auto_update_balance)
            .cloned()
            .collect();
        accounts.sort_by_key(|account| account.id);
        Ok(accounts)
    }

    async fn save_account(&mut self, account: &Account) -> Result<(), PortError> {
        let stored = self
            .working
            .accounts
            .get_mut(&account.id)
            .ok_or_else(|| PortError::not_found("Account", account.id))?;
        *stored = account.clone();
        Ok(())
    }

    async fn insert_transaction(&mut self, txn: &FinancialTransaction) -> Result<(), PortError> {
        if self.working.transactions.iter().any(|existing| existing.code == txn.code) {
            return Err(PortError::conflict(format!("transaction code {} already exists", txn.code)));
        }
        self.working.transactions.push(txn.clone());
        Ok(())
    }

    async fn update_transaction(&mut self, txn: &FinancialTransaction) -> Result<(), PortError> {
        let stored = self
            .working
            .transactions
            .iter_mut()
            .find(|existing| existing.id == txn.id)
            .ok_or_else(|| PortError::not_found("Transaction", txn.id))?;
        *stored = txn.clone();
        Ok(())
    }

    async fn lock_transactions_for(&mut self, reference: &SourceRef) -> Result<Vec<FinancialTransaction>, PortError> {
        Ok(self
            .working
            .transactions
            .iter()
            .filter(|txn| txn.reference.as_ref() == Some(reference))
            .cloned()
            .collect())
    }

    async fn append_cash_flow(&mut self, flow: &CashFlow) -> Result<(), PortError> {
        self.working.cash_flows.push(flow.clone());
        Ok(())
    }

    async fn flow_totals(&mut self, account: AccountId) -> Result<FlowTotals, PortError> {
        Ok(FlowTotals::from_flows(
            self.working.cash_flows.iter().filter(|flow| flow.account_id == account),
        ))
    }

    async fn insert_product(&mut self, product: &Product) -> Result<(), PortError> {
        if self.working.products.values().any(|existing| existing.sku == product.sku) {
            return Err(PortError::conflict(format!("sku {} already exists", product.sku)));
        }
        self.working.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn lock_product(&mut self, id: ProductId) -> Result<Product, PortError> {
        self.working.product(id).cloned()
    }

    async fn save_product_stock(&mut self, product: &Product) -> Result<(), PortError> {
        let stored = self
            .working
            .products
            .get_mut(&product.id)
            .ok_or_else(|| PortError::not_found("Product", product.id))?;
        stored.stock = product.stock;
        stored.updated_at = product.updated_at;
        Ok(())
    }

    async fn append_stock_movement(&mut self, movement: &StockMovement) -> Result<(), PortError> {
        self.working.movements.push(movement.clone());
        Ok(())
    }

    async fn insert_payroll(&mut self, record: &PayrollRecord) -> Result<(), PortError> {
        if self
            .working
            .payrolls
            .iter()
            .any(|existing| existing.user_id == record.user_id && existing.period == record.period)
        {
            return Err(PortError::conflict(format!(
                "payroll for {} in {} already exists",
                record.user_id, record.period
            )));
        }
        self.working.payrolls.push(record.clone());
        Ok(())
    }

    async fn lock_payroll(&mut self, id: PayrollId) -> Result<PayrollRecord, PortError> {
        self.working.payroll(id).cloned()
    }

    async fn save_payroll(&mut self, record: &PayrollRecord) -> Result<(), PortError> {
        let stored = self
            .working
            .payrolls
            .iter_mut()
            .find(|existing| existing.id == record.id)
            .ok_or_else(|| PortError::not_found("Payroll", record.id))?;
        *stored = record.clone();
        Ok(())
    }

    async fn lock_payroll_period(&mut self, _period: PayrollPeriod) -> Result<(), PortError> {
        // The unit of work already holds the store lock
        Ok(())
    }

    async fn payroll_exists(&mut self, user: UserId, period: PayrollPeriod) -> Result<bool, PortError> {
        Ok(self
            .working
            .payrolls
            .iter()
            .any(|record| record.user_id == user && record.period == period))
    }

    async fn next_payroll_sequence(&mut self, period: PayrollPeriod) -> Result<u32, PortError> {
        let count = self.working.payrolls.iter().filter(|record| record.period == period).count();
        Ok(count as u32 + 1)
    }

    async fn commit(self: Box<Self>) -> Result<(), PortError> {
        let MemoryUnitOfWork { mut guard, working } = *self;
        *guard = working;
        debug!("Unit of work committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), PortError> {
        debug!("Unit of work rolled back");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::AccountType;
    use core_kernel::Money;

    #[tokio::test]
    async fn test_dropped_unit_of_work_discards_writes() {
        let store = InMemoryLedgerStore::new();
        let cash = Account::new("1-1000", "Kas", AccountType::Cash);
        store.seed_accounts([cash.clone()]).await.unwrap();

        {
            let mut uow = store.begin().await.unwrap();
            let mut locked = uow.lock_account(cash.id).await.unwrap();
            locked.current_balance = Money::from_rupiah(500);
            uow.save_account(&locked).await.unwrap();
        }

        let stored = store.get_account(cash.id).await.unwrap();
        assert_eq!(stored.current_balance, Money::ZERO);
    }

    #[tokio::test]
    async fn test_duplicate_account_code_conflicts() {
        let store = InMemoryLedgerStore::new();
        store
            .seed_accounts([Account::new("1-1000", "Kas", AccountType::Cash)])
            .await
            .unwrap();

        let mut uow = store.begin().await.unwrap();
        let err = uow
            .insert_account(&Account::new("1-1000", "Kas Kecil", AccountType::Cash))
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_idempotency_key_claimed_once() {
        let store = InMemoryLedgerStore::new();
        let reference = SourceRef::sale(core_kernel::SaleId::new());
        let key = IdempotencyKey::sale_recorded(&reference);

        let mut uow = store.begin().await.unwrap();
        assert!(uow.claim_idempotency_key(&key).await.unwrap());
        assert!(!uow.claim_idempotency_key(&key).await.unwrap());
        uow.commit().await.unwrap();

        assert_eq!(store.idempotency_key_count().await, 1);
    }
}
