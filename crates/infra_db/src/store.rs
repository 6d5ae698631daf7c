//! PostgreSQL Ledger Store
//!
//! Implements the ledger ports on PostgreSQL. A [`PgUnitOfWork`] wraps one
//! database transaction; `lock_*` reads use `SELECT ... FOR UPDATE`, so two
//! units of work touching the same account, product or payroll row run one
//! after the other while unrelated rows proceed in parallel.
//!
//! Idempotency keys are claimed with `INSERT ... ON CONFLICT DO NOTHING`. A
//! concurrent claim of the same key blocks on the first transaction and then
//! reports the key as taken.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use infra_db::{create_pool, DatabaseConfig, PostgresLedgerStore};
//! use domain_ledger::LedgerStore;
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/ledger")).await?;
//! let store: Arc<dyn LedgerStore> = Arc::new(PostgresLedgerStore::new(pool));
//! ```

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::postgres::PgConnection;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    AccountId, AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, Money, PayrollId,
    PayrollPeriod, PortError, ProductId, SourceRef, UserId,
};
use domain_inventory::{Product, StockMovement};
use domain_ledger::{
    Account, AccountCriteria, CashFlow, CashFlowFilter, FinancialTransaction, FlowTotals,
    IdempotencyKey, LedgerStore, LedgerUnitOfWork, TransactionFilter,
};
use domain_payroll::PayrollRecord;

use crate::error::DatabaseError;
use crate::rows::{
    account_columns, cash_flow_columns, convert_all, movement_columns, product_columns,
    transaction_columns, AccountRow, CashFlowRow, MovementRow, ProductRow, TransactionRow,
};

const ADAPTER_ID: &str = "postgres-ledger";

fn db_err(e: sqlx::Error) -> PortError {
    DatabaseError::from(e).into()
}

fn money(value: Money) -> Decimal {
    value.amount()
}

// ============================================================================
// Shared queries
// ============================================================================

async fn select_account(conn: &mut PgConnection, criteria: &AccountCriteria) -> Result<Option<Account>, PortError> {
    let mut query = QueryBuilder::<Postgres>::new(concat!("SELECT ", account_columns!(), " FROM accounts WHERE TRUE"));
    if let Some(code) = &criteria.code {
        query.push(" AND code = ").push_bind(code.clone());
    }
    if let Some(account_type) = criteria.account_type {
        query.push(" AND account_type = ").push_bind(account_type.as_str());
    }
    if let Some(category) = criteria.category {
        query.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(name) = &criteria.name {
        query.push(" AND LOWER(name) = LOWER(").push_bind(name.clone()).push(")");
    }
    if criteria.active_only {
        query.push(" AND is_active");
    }
    query.push(" ORDER BY code LIMIT 1");

    let row = query
        .build_query_as::<AccountRow>()
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err)?;
    row.map(Account::try_from).transpose()
}

async fn select_account_by_id(conn: &mut PgConnection, id: AccountId, lock: bool) -> Result<Account, PortError> {
    let sql = if lock {
        concat!("SELECT ", account_columns!(), " FROM accounts WHERE account_id = $1 FOR UPDATE")
    } else {
        concat!("SELECT ", account_columns!(), " FROM accounts WHERE account_id = $1")
    };
    let row = sqlx::query_as::<_, AccountRow>(sql)
        .bind(Uuid::from(id))
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| PortError::not_found("Account", id))?;
    Account::try_from(row)
}

async fn select_product(conn: &mut PgConnection, id: ProductId, lock: bool) -> Result<Product, PortError> {
    let sql = if lock {
        concat!("SELECT ", product_columns!(), " FROM products WHERE product_id = $1 FOR UPDATE")
    } else {
        concat!("SELECT ", product_columns!(), " FROM products WHERE product_id = $1")
    };
    let row = sqlx::query_as::<_, ProductRow>(sql)
        .bind(Uuid::from(id))
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| PortError::not_found("Product", id))?;
    Ok(row.into())
}

async fn select_payroll(conn: &mut PgConnection, id: PayrollId, lock: bool) -> Result<PayrollRecord, PortError> {
    let sql = if lock {
        "SELECT record FROM payrolls WHERE payroll_id = $1 FOR UPDATE"
    } else {
        "SELECT record FROM payrolls WHERE payroll_id = $1"
    };
    let record = sqlx::query_scalar::<_, Json<PayrollRecord>>(sql)
        .bind(Uuid::from(id))
        .fetch_optional(&mut *conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| PortError::not_found("Payroll", id))?;
    Ok(record.0)
}

// ============================================================================
// Store
// ============================================================================

/// PostgreSQL-backed ledger store
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Inserts any account whose code is not present yet
    ///
    /// Existing accounts keep their balances and settings. Returns the
    /// number of accounts created.
    #[instrument(skip(self, accounts))]
    pub async fn ensure_accounts(&self, accounts: impl IntoIterator<Item = Account>) -> Result<usize, PortError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        let mut created = 0;
        for account in accounts {
            let result = insert_account_query(&account, true)
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
            created += result.rows_affected() as usize;
        }
        tx.commit().await.map_err(db_err)?;
        debug!(created, "Chart of accounts provisioned");
        Ok(created)
    }
}

impl DomainPort for PostgresLedgerStore {}

#[async_trait]
impl HealthCheckable for PostgresLedgerStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: ADAPTER_ID.to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: ADAPTER_ID.to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(format!("Database error: {}", e)),
                checked_at: Utc::now(),
            },
        }
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerUnitOfWork>, PortError> {
        let tx = self.pool.begin().await.map_err(db_err)?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn find_account(&self, criteria: &AccountCriteria) -> Result<Option<Account>, PortError> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        select_account(&mut conn, criteria).await
    }

    async fn get_account(&self, id: AccountId) -> Result<Account, PortError> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        select_account_by_id(&mut conn, id, false).await
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, PortError> {
        let rows = sqlx::query_as::<_, AccountRow>(concat!("SELECT ", account_columns!(), " FROM accounts ORDER BY code"))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        convert_all(rows)
    }

    #[instrument(skip(self))]
    async fn transactions(&self, filter: &TransactionFilter) -> Result<Vec<FinancialTransaction>, PortError> {
        let mut query = QueryBuilder::<Postgres>::new(concat!(
            "SELECT ",
            transaction_columns!(),
            " FROM financial_transactions WHERE TRUE"
        ));
        if let Some(from) = filter.from {
            query.push(" AND transaction_date >= ").push_bind(from);
        }
        if let Some(until) = filter.until {
            query.push(" AND transaction_date < ").push_bind(until);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(reference) = filter.reference {
            query
                .push(" AND reference_type = ")
                .push_bind(reference.kind.as_str())
                .push(" AND reference_id = ")
                .push_bind(reference.id);
        }
        query.push(" ORDER BY transaction_date, created_at");

        let rows = query
            .build_query_as::<TransactionRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        convert_all(rows)
    }

    #[instrument(skip(self))]
    async fn cash_flows(&self, filter: &CashFlowFilter) -> Result<Vec<CashFlow>, PortError> {
        let mut query = QueryBuilder::<Postgres>::new(concat!(
            "SELECT ",
            cash_flow_columns!(),
            " FROM cash_flows WHERE TRUE"
        ));
        if let Some(from) = filter.from {
            query.push(" AND flow_date >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            query.push(" AND flow_date <= ").push_bind(to);
        }
        if let Some(account) = filter.account {
            query.push(" AND account_id = ").push_bind(Uuid::from(account));
        }
        query.push(" ORDER BY flow_date, seq");

        let rows = query
            .build_query_as::<CashFlowRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        convert_all(rows)
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, PortError> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        select_product(&mut conn, id, false).await
    }

    async fn stock_movements(&self, product: ProductId) -> Result<Vec<StockMovement>, PortError> {
        let rows = sqlx::query_as::<_, MovementRow>(concat!(
            "SELECT ",
            movement_columns!(),
            " FROM stock_movements WHERE product_id = $1 ORDER BY seq"
        ))
        .bind(Uuid::from(product))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        convert_all(rows)
    }

    async fn get_payroll(&self, id: PayrollId) -> Result<PayrollRecord, PortError> {
        let mut conn = self.pool.acquire().await.map_err(db_err)?;
        select_payroll(&mut conn, id, false).await
    }

    async fn list_payrolls(&self, period: Option<PayrollPeriod>) -> Result<Vec<PayrollRecord>, PortError> {
        let records = sqlx::query_scalar::<_, Json<PayrollRecord>>(
            "SELECT record FROM payrolls WHERE ($1::text IS NULL OR period = $1) ORDER BY code",
        )
        .bind(period.map(|p| p.to_string()))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(records.into_iter().map(|record| record.0).collect())
    }
}

fn insert_account_query(account: &Account, skip_existing: bool) -> sqlx::query::Query<'static, Postgres, sqlx::postgres::PgArguments> {
    let sql = if skip_existing {
        r#"
        INSERT INTO accounts (
            account_id, code, name, account_type, category, opening_balance, current_balance,
            overdraft, is_active, auto_update_balance, description, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (code) DO NOTHING
        "#
    } else {
        r#"
        INSERT INTO accounts (
            account_id, code, name, account_type, category, opening_balance, current_balance,
            overdraft, is_active, auto_update_balance, description, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#
    };
    sqlx::query(sql)
        .bind(Uuid::from(account.id))
        .bind(account.code.clone())
        .bind(account.name.clone())
        .bind(account.account_type.as_str())
        .bind(account.category.map(|c| c.as_str()))
        .bind(money(account.opening_balance))
        .bind(money(account.current_balance))
        .bind(account.overdraft.as_str())
        .bind(account.is_active)
        .bind(account.auto_update_balance)
        .bind(account.description.clone())
        .bind(account.updated_at)
}

// ============================================================================
// Unit of work
// ============================================================================

/// One PostgreSQL transaction over the ledger tables
///
/// Dropping it without `commit` rolls the transaction back.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl PgUnitOfWork {
    fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }
}

#[async_trait]
impl LedgerUnitOfWork for PgUnitOfWork {
    async fn claim_idempotency_key(&mut self, key: &IdempotencyKey) -> Result<bool, PortError> {
        let result = sqlx::query("INSERT INTO idempotency_keys (key) VALUES ($1) ON CONFLICT (key) DO NOTHING")
            .bind(key.as_str().to_string())
            .execute(self.conn())
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn has_idempotency_key(&mut self, key: &IdempotencyKey) -> Result<bool, PortError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM idempotency_keys WHERE key = $1)")
            .bind(key.as_str().to_string())
            .fetch_one(self.conn())
            .await
            .map_err(db_err)
    }

    async fn insert_account(&mut self, account: &Account) -> Result<(), PortError> {
        insert_account_query(account, false)
            .execute(self.conn())
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn find_account(&mut self, criteria: &AccountCriteria) -> Result<Option<Account>, PortError> {
        select_account(self.conn(), criteria).await
    }

    async fn lock_account(&mut self, id: AccountId) -> Result<Account, PortError> {
        select_account_by_id(self.conn(), id, true).await
    }

    async fn lock_reconcilable_accounts(&mut self) -> Result<Vec<Account>, PortError> {
        let rows = sqlx::query_as::<_, AccountRow>(concat!(
            "SELECT ",
            account_columns!(),
            " FROM accounts WHERE auto_update_balance ORDER BY account_id FOR UPDATE"
        ))
        .fetch_all(self.conn())
        .await
        .map_err(db_err)?;
        convert_all(rows)
    }

    async fn save_account(&mut self, account: &Account) -> Result<(), PortError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts SET
                code = $2, name = $3, account_type = $4, category = $5,
                opening_balance = $6, current_balance = $7, overdraft = $8,
                is_active = $9, auto_update_balance = $10, description = $11, updated_at = $12
            WHERE account_id = $1
            "#,
        )
        .bind(Uuid::from(account.id))
        .bind(account.code.clone())
        .bind(account.name.clone())
        .bind(account.account_type.as_str())
        .bind(account.category.map(|c| c.as_str()))
        .bind(money(account.opening_balance))
        .bind(money(account.current_balance))
        .bind(account.overdraft.as_str())
        .bind(account.is_active)
        .bind(account.auto_update_balance)
        .bind(account.description.clone())
        .bind(account.updated_at)
        .execute(self.conn())
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Account", account.id));
        }
        Ok(())
    }

    async fn insert_transaction(&mut self, txn: &FinancialTransaction) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO financial_transactions (
                transaction_id, code, kind, category, subcategory, amount, from_account, to_account,
                reference_type, reference_id, status, description, transaction_date, created_by,
                approved_by, approved_at, audit, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(Uuid::from(txn.id))
        .bind(txn.code.clone())
        .bind(txn.kind.as_str())
        .bind(txn.category.as_str())
        .bind(txn.subcategory.clone())
        .bind(money(txn.amount))
        .bind(txn.from_account.map(Uuid::from))
        .bind(txn.to_account.map(Uuid::from))
        .bind(txn.reference.map(|r| r.kind.as_str()))
        .bind(txn.reference.map(|r| r.id))
        .bind(txn.status.as_str())
        .bind(txn.description.clone())
        .bind(txn.transaction_date)
        .bind(txn.created_by.map(Uuid::from))
        .bind(txn.approved_by.map(Uuid::from))
        .bind(txn.approved_at)
        .bind(Json(txn.audit.clone()))
        .bind(txn.created_at)
        .bind(txn.updated_at)
        .execute(self.conn())
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn update_transaction(&mut self, txn: &FinancialTransaction) -> Result<(), PortError> {
        let result = sqlx::query(
            r#"
            UPDATE financial_transactions SET
                subcategory = $2, amount = $3, from_account = $4, to_account = $5,
                status = $6, description = $7, approved_by = $8, approved_at = $9,
                audit = $10, updated_at = $11
            WHERE transaction_id = $1
            "#,
        )
        .bind(Uuid::from(txn.id))
        .bind(txn.subcategory.clone())
        .bind(money(txn.amount))
        .bind(txn.from_account.map(Uuid::from))
        .bind(txn.to_account.map(Uuid::from))
        .bind(txn.status.as_str())
        .bind(txn.description.clone())
        .bind(txn.approved_by.map(Uuid::from))
        .bind(txn.approved_at)
        .bind(Json(txn.audit.clone()))
        .bind(txn.updated_at)
        .execute(self.conn())
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Transaction", txn.id));
        }
        Ok(())
    }

    async fn lock_transactions_for(&mut self, reference: &SourceRef) -> Result<Vec<FinancialTransaction>, PortError> {
        let rows = sqlx::query_as::<_, TransactionRow>(concat!(
            "SELECT ",
            transaction_columns!(),
            " FROM financial_transactions WHERE reference_type = $1 AND reference_id = $2",
            " ORDER BY created_at, transaction_id FOR UPDATE"
        ))
        .bind(reference.kind.as_str())
        .bind(reference.id)
        .fetch_all(self.conn())
        .await
        .map_err(db_err)?;
        convert_all(rows)
    }

    async fn append_cash_flow(&mut self, flow: &CashFlow) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO cash_flows (
                cash_flow_id, flow_date, flow_type, direction, category, amount, account_id,
                transaction_id, description, running_balance, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(Uuid::from(flow.id))
        .bind(flow.flow_date)
        .bind(flow.flow_type.as_str())
        .bind(flow.direction.as_str())
        .bind(flow.category.as_str())
        .bind(money(flow.amount))
        .bind(Uuid::from(flow.account_id))
        .bind(flow.transaction_id.map(Uuid::from))
        .bind(flow.description.clone())
        .bind(money(flow.running_balance))
        .bind(flow.created_at)
        .execute(self.conn())
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn flow_totals(&mut self, account: AccountId) -> Result<FlowTotals, PortError> {
        let (inflow, outflow, count) = sqlx::query_as::<_, (Decimal, Decimal, i64)>(
            r#"
            SELECT
                COALESCE(SUM(amount) FILTER (WHERE direction = 'inflow'), 0),
                COALESCE(SUM(amount) FILTER (WHERE direction = 'outflow'), 0),
                COUNT(*)
            FROM cash_flows
            WHERE account_id = $1
            "#,
        )
        .bind(Uuid::from(account))
        .fetch_one(self.conn())
        .await
        .map_err(db_err)?;

        Ok(FlowTotals {
            inflow: Money::new(inflow),
            outflow: Money::new(outflow),
            count: count.max(0) as u64,
        })
    }

    async fn insert_product(&mut self, product: &Product) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO products (product_id, sku, name, unit, stock, cost_price, sell_price, is_active, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(Uuid::from(product.id))
        .bind(product.sku.clone())
        .bind(product.name.clone())
        .bind(product.unit.clone())
        .bind(product.stock)
        .bind(money(product.cost_price))
        .bind(money(product.sell_price))
        .bind(product.is_active)
        .bind(product.updated_at)
        .execute(self.conn())
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn lock_product(&mut self, id: ProductId) -> Result<Product, PortError> {
        select_product(self.conn(), id, true).await
    }

    async fn save_product_stock(&mut self, product: &Product) -> Result<(), PortError> {
        let result = sqlx::query("UPDATE products SET stock = $2, updated_at = $3 WHERE product_id = $1")
            .bind(Uuid::from(product.id))
            .bind(product.stock)
            .bind(product.updated_at)
            .execute(self.conn())
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Product", product.id));
        }
        Ok(())
    }

    async fn append_stock_movement(&mut self, movement: &StockMovement) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                movement_id, product_id, kind, quantity, stock_before, stock_after,
                description, user_id, metadata, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(Uuid::from(movement.id))
        .bind(Uuid::from(movement.product_id))
        .bind(movement.kind.as_str())
        .bind(movement.quantity)
        .bind(movement.stock_before)
        .bind(movement.stock_after)
        .bind(movement.description.clone())
        .bind(movement.user_id.map(Uuid::from))
        .bind(Json(movement.metadata.clone()))
        .bind(movement.created_at)
        .execute(self.conn())
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn insert_payroll(&mut self, record: &PayrollRecord) -> Result<(), PortError> {
        sqlx::query(
            r#"
            INSERT INTO payrolls (payroll_id, code, user_id, period, status, net_salary, record, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(Uuid::from(record.id))
        .bind(record.code.clone())
        .bind(Uuid::from(record.user_id))
        .bind(record.period.to_string())
        .bind(record.status.as_str())
        .bind(money(record.net_salary))
        .bind(Json(record.clone()))
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(self.conn())
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn lock_payroll(&mut self, id: PayrollId) -> Result<PayrollRecord, PortError> {
        select_payroll(self.conn(), id, true).await
    }

    async fn save_payroll(&mut self, record: &PayrollRecord) -> Result<(), PortError> {
        let result = sqlx::query(
            r#"
            UPDATE payrolls SET code = $2, status = $3, net_salary = $4, record = $5, updated_at = $6
            WHERE payroll_id = $1
            "#,
        )
        .bind(Uuid::from(record.id))
        .bind(record.code.clone())
        .bind(record.status.as_str())
        .bind(money(record.net_salary))
        .bind(Json(record.clone()))
        .bind(record.updated_at)
        .execute(self.conn())
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(PortError::not_found("Payroll", record.id));
        }
        Ok(())
    }

    async fn lock_payroll_period(&mut self, period: PayrollPeriod) -> Result<(), PortError> {
        // Held until this transaction ends; concurrent generation runs queue here
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext('payroll-period:' || $1))")
            .bind(period.to_string())
            .execute(self.conn())
            .await
            .map_err(db_err)?;
        debug!(period = %period, "Payroll period locked");
        Ok(())
    }

    async fn payroll_exists(&mut self, user: UserId, period: PayrollPeriod) -> Result<bool, PortError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM payrolls WHERE user_id = $1 AND period = $2)")
            .bind(Uuid::from(user))
            .bind(period.to_string())
            .fetch_one(self.conn())
            .await
            .map_err(db_err)
    }

    async fn next_payroll_sequence(&mut self, period: PayrollPeriod) -> Result<u32, PortError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM payrolls WHERE period = $1")
            .bind(period.to_string())
            .fetch_one(self.conn())
            .await
            .map_err(db_err)?;
        u32::try_from(count + 1).map_err(|_| PortError::internal("payroll sequence out of range"))
    }

    async fn commit(self: Box<Self>) -> Result<(), PortError> {
        self.tx.commit().await.map_err(db_err)?;
        debug!("Unit of work committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), PortError> {
        self.tx.rollback().await.map_err(db_err)?;
        debug!("Unit of work rolled back");
        Ok(())
    }
}
