//! Payment methods and the method-to-account policy
//!
//! Cash goes to the cash drawer account. Every electronic method (transfer,
//! debit, credit) lands in the one consolidated bank account, whichever bank
//! the customer used.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{info, instrument};

use core_kernel::AccountId;

use crate::account::{Account, AccountCriteria, ShopChartOfAccounts};
use crate::error::LedgerError;
use crate::ports::LedgerStore;
use crate::source::{SaleChannel, SaleStatus};
use crate::transaction::TransactionStatus;

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Debit,
    Credit,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Debit => "debit",
            PaymentMethod::Credit => "credit",
        }
    }

    pub fn is_electronic(&self) -> bool {
        !matches!(self, PaymentMethod::Cash)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "transfer" => Ok(PaymentMethod::Transfer),
            "debit" => Ok(PaymentMethod::Debit),
            "credit" => Ok(PaymentMethod::Credit),
            other => Err(format!("unknown payment method: {}", other)),
        }
    }
}

/// Status a sale's income transaction starts with
///
/// Cash and in-person electronic payments are settled at the counter. An
/// online electronic payment is settled only once the sale says so.
pub fn resolve_status(method: PaymentMethod, channel: SaleChannel, sale_status: SaleStatus) -> TransactionStatus {
    match (method.is_electronic(), channel) {
        (false, _) => TransactionStatus::Completed,
        (true, SaleChannel::Offline) => TransactionStatus::Completed,
        (true, SaleChannel::Online) if sale_status.is_settled() => TransactionStatus::Completed,
        (true, SaleChannel::Online) => TransactionStatus::Pending,
    }
}

/// Configured account codes, resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountCodes {
    pub cash: String,
    pub bank: String,
    pub inventory: String,
    pub cost_of_goods: String,
    pub payroll: String,
}

impl Default for AccountCodes {
    fn default() -> Self {
        Self {
            cash: ShopChartOfAccounts::CASH.to_string(),
            bank: ShopChartOfAccounts::BANK.to_string(),
            inventory: ShopChartOfAccounts::INVENTORY.to_string(),
            cost_of_goods: ShopChartOfAccounts::COST_OF_GOODS.to_string(),
            payroll: ShopChartOfAccounts::CASH.to_string(),
        }
    }
}

/// Resolved account identifiers the recorder books against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMapping {
    pub cash: AccountId,
    pub bank: AccountId,
    pub inventory: AccountId,
    pub cost_of_goods: AccountId,
    /// Paying account when a payroll payment names none
    pub payroll: AccountId,
}

impl AccountMapping {
    /// Account that receives a payment made with `method`
    pub fn account_for(&self, method: PaymentMethod) -> AccountId {
        if method.is_electronic() {
            self.bank
        } else {
            self.cash
        }
    }

    /// Looks up every configured code; any missing active account is fatal
    #[instrument(skip(store))]
    pub async fn resolve(store: &dyn LedgerStore, codes: &AccountCodes) -> Result<Self, LedgerError> {
        let mapping = Self {
            cash: lookup(store, &codes.cash).await?.id,
            bank: lookup(store, &codes.bank).await?.id,
            inventory: lookup(store, &codes.inventory).await?.id,
            cost_of_goods: lookup(store, &codes.cost_of_goods).await?.id,
            payroll: lookup(store, &codes.payroll).await?.id,
        };
        info!(cash = %codes.cash, bank = %codes.bank, "Account mapping resolved");
        Ok(mapping)
    }
}

async fn lookup(store: &dyn LedgerStore, code: &str) -> Result<Account, LedgerError> {
    let criteria = AccountCriteria::code(code);
    store
        .find_account(&criteria)
        .await?
        .ok_or_else(|| LedgerError::AccountNotFound(criteria.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cash_is_always_completed() {
        for channel in [SaleChannel::Offline, SaleChannel::Online] {
            assert_eq!(
                resolve_status(PaymentMethod::Cash, channel, SaleStatus::Pending),
                TransactionStatus::Completed
            );
        }
    }

    #[test]
    fn test_online_electronic_waits_for_settlement() {
        assert_eq!(
            resolve_status(PaymentMethod::Transfer, SaleChannel::Online, SaleStatus::Pending),
            TransactionStatus::Pending
        );
        assert_eq!(
            resolve_status(PaymentMethod::Credit, SaleChannel::Online, SaleStatus::Paid),
            TransactionStatus::Completed
        );
        assert_eq!(
            resolve_status(PaymentMethod::Debit, SaleChannel::Offline, SaleStatus::Pending),
            TransactionStatus::Completed
        );
    }

    #[test]
    fn test_electronic_methods_consolidate_to_bank() {
        let mapping = AccountMapping {
            cash: AccountId::new(),
            bank: AccountId::new(),
            inventory: AccountId::new(),
            cost_of_goods: AccountId::new(),
            payroll: AccountId::new(),
        };
        assert_eq!(mapping.account_for(PaymentMethod::Cash), mapping.cash);
        for method in [PaymentMethod::Transfer, PaymentMethod::Debit, PaymentMethod::Credit] {
            assert_eq!(mapping.account_for(method), mapping.bank);
        }
    }
}
