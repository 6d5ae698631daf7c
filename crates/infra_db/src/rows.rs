//! Row types and their conversion to ledger domain types
//!
//! Enums are stored as their `as_str` text and parsed back with `FromStr`;
//! a value that no longer parses surfaces as a validation error rather than
//! a panic. Audit trails, movement context and payroll records are JSONB.

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use core_kernel::{Money, PortError, SourceRef};
use domain_inventory::{MovementContext, Product, StockMovement};
use domain_ledger::{Account, CashFlow, FinancialTransaction, TransactionAudit};

fn parse<T>(column: &str, value: &str) -> Result<T, PortError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e| PortError::validation(format!("column {}: {}", column, e)))
}

fn parse_opt<T>(column: &str, value: Option<&str>) -> Result<Option<T>, PortError>
where
    T: FromStr,
    T::Err: Display,
{
    value.map(|value| parse(column, value)).transpose()
}

/// Columns selected for every account read
macro_rules! account_columns {
    () => {
        "account_id, code, name, account_type, category, opening_balance, current_balance, \
         overdraft, is_active, auto_update_balance, description, updated_at"
    };
}

macro_rules! transaction_columns {
    () => {
        "transaction_id, code, kind, category, subcategory, amount, from_account, to_account, \
         reference_type, reference_id, status, description, transaction_date, created_by, \
         approved_by, approved_at, audit, created_at, updated_at"
    };
}

macro_rules! cash_flow_columns {
    () => {
        "cash_flow_id, flow_date, flow_type, direction, category, amount, account_id, \
         transaction_id, description, running_balance, created_at"
    };
}

macro_rules! product_columns {
    () => {
        "product_id, sku, name, unit, stock, cost_price, sell_price, is_active, updated_at"
    };
}

macro_rules! movement_columns {
    () => {
        "movement_id, product_id, kind, quantity, stock_before, stock_after, description, \
         user_id, metadata, created_at"
    };
}

pub(crate) use {account_columns, cash_flow_columns, movement_columns, product_columns, transaction_columns};

#[derive(Debug, FromRow)]
pub(crate) struct AccountRow {
    account_id: Uuid,
    code: String,
    name: String,
    account_type: String,
    category: Option<String>,
    opening_balance: Decimal,
    current_balance: Decimal,
    overdraft: String,
    is_active: bool,
    auto_update_balance: bool,
    description: Option<String>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = PortError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account {
            id: row.account_id.into(),
            account_type: parse("account_type", &row.account_type)?,
            category: parse_opt("category", row.category.as_deref())?,
            overdraft: parse("overdraft", &row.overdraft)?,
            code: row.code,
            name: row.name,
            opening_balance: Money::new(row.opening_balance),
            current_balance: Money::new(row.current_balance),
            is_active: row.is_active,
            auto_update_balance: row.auto_update_balance,
            description: row.description,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct TransactionRow {
    transaction_id: Uuid,
    code: String,
    kind: String,
    category: String,
    subcategory: Option<String>,
    amount: Decimal,
    from_account: Option<Uuid>,
    to_account: Option<Uuid>,
    reference_type: Option<String>,
    reference_id: Option<Uuid>,
    status: String,
    description: String,
    transaction_date: DateTime<Utc>,
    created_by: Option<Uuid>,
    approved_by: Option<Uuid>,
    approved_at: Option<DateTime<Utc>>,
    audit: Json<TransactionAudit>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for FinancialTransaction {
    type Error = PortError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        let reference = match (row.reference_type.as_deref(), row.reference_id) {
            (Some(kind), Some(id)) => Some(SourceRef::new(parse("reference_type", kind)?, id)),
            (None, None) => None,
            _ => {
                return Err(PortError::validation(format!(
                    "transaction {} has a partial source reference",
                    row.code
                )))
            }
        };

        Ok(FinancialTransaction {
            id: row.transaction_id.into(),
            kind: parse("kind", &row.kind)?,
            category: parse("category", &row.category)?,
            status: parse("status", &row.status)?,
            code: row.code,
            subcategory: row.subcategory,
            amount: Money::new(row.amount),
            from_account: row.from_account.map(Into::into),
            to_account: row.to_account.map(Into::into),
            reference,
            description: row.description,
            transaction_date: row.transaction_date,
            created_by: row.created_by.map(Into::into),
            approved_by: row.approved_by.map(Into::into),
            approved_at: row.approved_at,
            audit: row.audit.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct CashFlowRow {
    cash_flow_id: Uuid,
    flow_date: NaiveDate,
    flow_type: String,
    direction: String,
    category: String,
    amount: Decimal,
    account_id: Uuid,
    transaction_id: Option<Uuid>,
    description: String,
    running_balance: Decimal,
    created_at: DateTime<Utc>,
}

impl TryFrom<CashFlowRow> for CashFlow {
    type Error = PortError;

    fn try_from(row: CashFlowRow) -> Result<Self, Self::Error> {
        Ok(CashFlow {
            id: row.cash_flow_id.into(),
            flow_date: row.flow_date,
            flow_type: parse("flow_type", &row.flow_type)?,
            direction: parse("direction", &row.direction)?,
            category: parse("category", &row.category)?,
            amount: Money::new(row.amount),
            account_id: row.account_id.into(),
            transaction_id: row.transaction_id.map(Into::into),
            description: row.description,
            running_balance: Money::new(row.running_balance),
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ProductRow {
    product_id: Uuid,
    sku: String,
    name: String,
    unit: String,
    stock: i64,
    cost_price: Decimal,
    sell_price: Decimal,
    is_active: bool,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.product_id.into(),
            sku: row.sku,
            name: row.name,
            unit: row.unit,
            stock: row.stock,
            cost_price: Money::new(row.cost_price),
            sell_price: Money::new(row.sell_price),
            is_active: row.is_active,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct MovementRow {
    movement_id: Uuid,
    product_id: Uuid,
    kind: String,
    quantity: i64,
    stock_before: i64,
    stock_after: i64,
    description: String,
    user_id: Option<Uuid>,
    metadata: Json<MovementContext>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MovementRow> for StockMovement {
    type Error = PortError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        Ok(StockMovement {
            id: row.movement_id.into(),
            product_id: row.product_id.into(),
            kind: parse("kind", &row.kind)?,
            quantity: row.quantity,
            stock_before: row.stock_before,
            stock_after: row.stock_after,
            description: row.description,
            user_id: row.user_id.map(Into::into),
            metadata: row.metadata.0,
            created_at: row.created_at,
        })
    }
}

/// Converts a batch of rows, failing on the first bad one
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, PortError>
where
    T: TryFrom<R, Error = PortError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_ledger::{AccountType, OverdraftPolicy};
    use rust_decimal_macros::dec;

    fn account_row(account_type: &str) -> AccountRow {
        AccountRow {
            account_id: Uuid::now_v7(),
            code: "1-1000".to_string(),
            name: "Kas Toko".to_string(),
            account_type: account_type.to_string(),
            category: None,
            opening_balance: dec!(100000),
            current_balance: dec!(125000.50),
            overdraft: "reject".to_string(),
            is_active: true,
            auto_update_balance: true,
            description: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_account_row_converts() {
        let account = Account::try_from(account_row("cash")).unwrap();

        assert_eq!(account.account_type, AccountType::Cash);
        assert_eq!(account.overdraft, OverdraftPolicy::Reject);
        assert_eq!(account.current_balance, Money::new(dec!(125000.50)));
    }

    #[test]
    fn test_unknown_enum_text_is_validation_error() {
        let err = Account::try_from(account_row("petty_cash")).unwrap_err();

        assert!(matches!(err, PortError::Validation { .. }));
        assert!(err.to_string().contains("account_type"));
    }
}
