//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data and a seeded in-memory ledger. The
//! fixtures are consistent and predictable so scenario tests only state
//! what they change.

use chrono::NaiveDate;
use std::sync::Arc;

use core_kernel::{Money, PayrollPeriod, ProductId, UserId};
use domain_inventory::Product;
use domain_ledger::{
    Account, AccountCriteria, AccountMapping, InMemoryLedgerStore, LedgerStore, PayrollService,
    ReconciliationEngine, ShopChartOfAccounts, StockLedger, TransactionRecorder,
};
use domain_payroll::PayrollConfig;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// One cash sale from the sale completion scenario
    pub fn cash_sale() -> Money {
        Money::from_rupiah(30_000)
    }

    /// Price per kilogram of premium rice
    pub fn rice_price() -> Money {
        Money::from_rupiah(15_000)
    }

    /// Cost per kilogram of premium rice
    pub fn rice_cost() -> Money {
        Money::from_rupiah(12_000)
    }

    /// Opening balance large enough to cover a month of salaries
    pub fn payroll_float() -> Money {
        Money::from_rupiah(50_000_000)
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// July 2024 payroll period
    pub fn payroll_period() -> PayrollPeriod {
        PayrollPeriod::containing(Self::mid_year_date())
    }

    pub fn mid_year_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 15).unwrap()
    }
}

/// Fixture for string test data
pub struct StringFixtures;

impl StringFixtures {
    pub fn invoice_number() -> &'static str {
        "INV-20240715-0001"
    }

    pub fn purchase_number() -> &'static str {
        "PO-20240715-0001"
    }

    pub fn supplier() -> &'static str {
        "UD Sumber Padi"
    }
}

/// A seeded in-memory ledger with the standard shop chart of accounts
pub struct LedgerFixture {
    pub store: Arc<InMemoryLedgerStore>,
    pub mapping: AccountMapping,
    pub cashier: UserId,
}

impl LedgerFixture {
    /// Seeds the standard chart with zero balances
    pub async fn new() -> Self {
        Self::with_opening_balances(&[]).await
    }

    /// Seeds the standard chart, overriding opening balances by account code
    pub async fn with_opening_balances(balances: &[(&str, Money)]) -> Self {
        let accounts: Vec<Account> = ShopChartOfAccounts::create_standard_accounts()
            .into_iter()
            .map(|account| {
                match balances.iter().find(|(code, _)| *code == account.code) {
                    Some((_, balance)) => account.with_opening_balance(*balance),
                    None => account,
                }
            })
            .collect();

        let store = Arc::new(InMemoryLedgerStore::new());
        store
            .seed_accounts(accounts)
            .await
            .expect("standard chart seeds cleanly");

        let mapping = AccountMapping::resolve(store.as_ref(), &Default::default())
            .await
            .expect("standard chart resolves");

        Self {
            store,
            mapping,
            cashier: UserId::new(),
        }
    }

    pub fn ledger_store(&self) -> Arc<dyn LedgerStore> {
        self.store.clone()
    }

    pub fn recorder(&self) -> TransactionRecorder {
        TransactionRecorder::new(self.ledger_store(), self.mapping)
    }

    pub fn stock(&self) -> StockLedger {
        StockLedger::new(self.ledger_store())
    }

    pub fn payroll(&self) -> PayrollService {
        PayrollService::new(self.ledger_store(), PayrollConfig::default(), self.mapping)
    }

    pub fn reconciliation(&self) -> ReconciliationEngine {
        ReconciliationEngine::new(self.ledger_store())
    }

    /// Registers a rice product with an `initial` movement for its stock
    pub async fn rice(&self, sku: &str, stock: i64) -> ProductId {
        let product = Product::new(
            sku,
            format!("Beras {}", sku),
            MoneyFixtures::rice_cost(),
            MoneyFixtures::rice_price(),
        );
        let (product, _) = self
            .stock()
            .register_product(product, stock, Some(self.cashier))
            .await
            .expect("product registers");
        product.id
    }

    /// Current balance of the account with `code`
    pub async fn balance(&self, code: &str) -> Money {
        self.account(code).await.current_balance
    }

    pub async fn account(&self, code: &str) -> Account {
        self.store
            .find_account(&AccountCriteria::code(code).including_inactive())
            .await
            .expect("store readable")
            .unwrap_or_else(|| panic!("account {} seeded", code))
    }

    pub async fn stock_of(&self, product: ProductId) -> i64 {
        self.store
            .get_product(product)
            .await
            .expect("product exists")
            .stock
    }
}
