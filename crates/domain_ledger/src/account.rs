//! Account Store rules
//!
//! Accounts are single-entry balance buckets: cash drawer, the consolidated
//! bank account, the inventory cost buffer and expense accounts. Every balance
//! change goes through [`Account::adjust_balance`], which applies the account's
//! [`OverdraftPolicy`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use core_kernel::{AccountId, Money};

use crate::cash_flow::FlowDirection;
use crate::error::LedgerError;

/// Types of account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Cash,
    Bank,
    Asset,
    Expense,
    Liability,
    Equity,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Cash => "cash",
            AccountType::Bank => "bank",
            AccountType::Asset => "asset",
            AccountType::Expense => "expense",
            AccountType::Liability => "liability",
            AccountType::Equity => "equity",
        }
    }

    /// Cash and bank accounts hold spendable money
    pub fn is_liquid(&self) -> bool {
        matches!(self, AccountType::Cash | AccountType::Bank)
    }

    /// Overdraft policy new accounts of this type start with
    pub fn default_overdraft(&self) -> OverdraftPolicy {
        match self {
            AccountType::Cash | AccountType::Bank => OverdraftPolicy::Reject,
            AccountType::Asset => OverdraftPolicy::ClampToZero,
            AccountType::Expense | AccountType::Liability | AccountType::Equity => OverdraftPolicy::Allow,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(AccountType::Cash),
            "bank" => Ok(AccountType::Bank),
            "asset" => Ok(AccountType::Asset),
            "expense" => Ok(AccountType::Expense),
            "liability" => Ok(AccountType::Liability),
            "equity" => Ok(AccountType::Equity),
            other => Err(format!("unknown account type: {}", other)),
        }
    }
}

/// Reporting category of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountCategory {
    /// Cost buffer drained by cost-of-goods bookings
    Inventory,
    CostOfGoods,
    Payroll,
    Operating,
    Capital,
    Other,
}

impl AccountCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountCategory::Inventory => "inventory",
            AccountCategory::CostOfGoods => "cost_of_goods",
            AccountCategory::Payroll => "payroll",
            AccountCategory::Operating => "operating",
            AccountCategory::Capital => "capital",
            AccountCategory::Other => "other",
        }
    }
}

impl FromStr for AccountCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inventory" => Ok(AccountCategory::Inventory),
            "cost_of_goods" => Ok(AccountCategory::CostOfGoods),
            "payroll" => Ok(AccountCategory::Payroll),
            "operating" => Ok(AccountCategory::Operating),
            "capital" => Ok(AccountCategory::Capital),
            "other" => Ok(AccountCategory::Other),
            other => Err(format!("unknown account category: {}", other)),
        }
    }
}

/// What happens when a debit exceeds the balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverdraftPolicy {
    /// Balance may go negative
    Allow,
    /// Balance stops at zero; the shortfall is reported, not applied
    ClampToZero,
    /// Debit fails with an insufficient balance error
    Reject,
}

impl OverdraftPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverdraftPolicy::Allow => "allow",
            OverdraftPolicy::ClampToZero => "clamp_to_zero",
            OverdraftPolicy::Reject => "reject",
        }
    }
}

impl FromStr for OverdraftPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "allow" => Ok(OverdraftPolicy::Allow),
            "clamp_to_zero" => Ok(OverdraftPolicy::ClampToZero),
            "reject" => Ok(OverdraftPolicy::Reject),
            other => Err(format!("unknown overdraft policy: {}", other)),
        }
    }
}

/// An account with a running balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Account code (e.g., "1-1100")
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub category: Option<AccountCategory>,
    pub opening_balance: Money,
    pub current_balance: Money,
    pub overdraft: OverdraftPolicy,
    pub is_active: bool,
    /// Included in balance reconciliation
    pub auto_update_balance: bool,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Result of one balance adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceChange {
    pub previous: Money,
    pub requested: Money,
    /// Amount actually moved, less than requested only when clamped
    pub applied: Money,
    pub shortfall: Money,
    pub new_balance: Money,
}

impl BalanceChange {
    pub fn was_clamped(&self) -> bool {
        self.shortfall.is_positive()
    }
}

impl Account {
    /// Creates an active account with the type's default overdraft policy
    pub fn new(code: impl Into<String>, name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            id: AccountId::new_v7(),
            code: code.into(),
            name: name.into(),
            account_type,
            category: None,
            opening_balance: Money::ZERO,
            current_balance: Money::ZERO,
            overdraft: account_type.default_overdraft(),
            is_active: true,
            auto_update_balance: true,
            description: None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_category(mut self, category: AccountCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Sets the opening balance and resets the current balance to it
    pub fn with_opening_balance(mut self, balance: Money) -> Self {
        self.opening_balance = balance;
        self.current_balance = balance;
        self
    }

    pub fn with_overdraft(mut self, policy: OverdraftPolicy) -> Self {
        self.overdraft = policy;
        self
    }

    pub fn without_auto_update(mut self) -> Self {
        self.auto_update_balance = false;
        self
    }

    /// Returns true if the balance covers `amount`
    pub fn can_cover(&self, amount: Money) -> bool {
        self.current_balance >= amount
    }

    /// Adds (inflow) or subtracts (outflow) `amount`
    ///
    /// Outflows beyond the balance follow the overdraft policy. A clamped
    /// adjustment logs a warning and reports the shortfall.
    pub fn adjust_balance(&mut self, amount: Money, direction: FlowDirection) -> Result<BalanceChange, LedgerError> {
        if amount.is_negative() {
            return Err(LedgerError::InvalidTransaction(format!(
                "balance adjustment must not be negative: {}",
                amount
            )));
        }

        let previous = self.current_balance;
        let (applied, shortfall) = match direction {
            FlowDirection::Inflow => (amount, Money::ZERO),
            FlowDirection::Outflow => match self.overdraft {
                OverdraftPolicy::Allow => (amount, Money::ZERO),
                OverdraftPolicy::Reject => {
                    if amount > previous {
                        return Err(LedgerError::InsufficientBalance {
                            account: self.code.clone(),
                            requested: amount.to_string(),
                            available: previous.to_string(),
                        });
                    }
                    (amount, Money::ZERO)
                }
                OverdraftPolicy::ClampToZero => {
                    let available = previous.max(Money::ZERO);
                    if amount > available {
                        (available, amount - available)
                    } else {
                        (amount, Money::ZERO)
                    }
                }
            },
        };

        let new_balance = match direction {
            FlowDirection::Inflow => previous.checked_add(&applied)?,
            FlowDirection::Outflow => previous.checked_sub(&applied)?,
        };

        if shortfall.is_positive() {
            warn!(
                account = %self.code,
                requested = %amount,
                applied = %applied,
                shortfall = %shortfall,
                "Balance clamped to zero"
            );
        }

        self.current_balance = new_balance;
        self.updated_at = Utc::now();

        Ok(BalanceChange {
            previous,
            requested: amount,
            applied,
            shortfall,
            new_balance,
        })
    }
}

/// Selection criteria for account lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCriteria {
    pub code: Option<String>,
    pub account_type: Option<AccountType>,
    pub category: Option<AccountCategory>,
    /// Exact, case-insensitive name
    pub name: Option<String>,
    pub active_only: bool,
}

impl AccountCriteria {
    /// Active account with the given code
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            active_only: true,
            ..Self::default()
        }
    }

    /// Active accounts of a type
    pub fn of_type(account_type: AccountType) -> Self {
        Self {
            account_type: Some(account_type),
            active_only: true,
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: AccountCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn including_inactive(mut self) -> Self {
        self.active_only = false;
        self
    }

    pub fn matches(&self, account: &Account) -> bool {
        if self.active_only && !account.is_active {
            return false;
        }
        if let Some(code) = &self.code {
            if &account.code != code {
                return false;
            }
        }
        if let Some(account_type) = self.account_type {
            if account.account_type != account_type {
                return false;
            }
        }
        if let Some(category) = self.category {
            if account.category != Some(category) {
                return false;
            }
        }
        if let Some(name) = &self.name {
            if !account.name.eq_ignore_ascii_case(name) {
                return false;
            }
        }
        true
    }
}

impl fmt::Display for AccountCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(code) = &self.code {
            parts.push(format!("code={}", code));
        }
        if let Some(account_type) = self.account_type {
            parts.push(format!("type={}", account_type));
        }
        if let Some(category) = self.category {
            parts.push(format!("category={}", category.as_str()));
        }
        if let Some(name) = &self.name {
            parts.push(format!("name={}", name));
        }
        if self.active_only {
            parts.push("active".to_string());
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// Standard chart for a single-outlet rice shop
pub struct ShopChartOfAccounts;

impl ShopChartOfAccounts {
    pub const CASH: &'static str = "1-1000";
    pub const BANK: &'static str = "1-1100";
    pub const INVENTORY: &'static str = "1-1300";
    pub const CAPITAL: &'static str = "3-1000";
    pub const COST_OF_GOODS: &'static str = "5-1000";
    pub const SALARIES: &'static str = "6-1000";
    pub const OPERATING: &'static str = "6-2000";

    pub fn create_standard_accounts() -> Vec<Account> {
        vec![
            Account::new(Self::CASH, "Kas Toko", AccountType::Cash),
            Account::new(Self::BANK, "Bank BCA", AccountType::Bank),
            Account::new(Self::INVENTORY, "Persediaan Beras", AccountType::Asset)
                .with_category(AccountCategory::Inventory),
            Account::new(Self::CAPITAL, "Modal Pemilik", AccountType::Equity)
                .with_category(AccountCategory::Capital)
                .without_auto_update(),
            Account::new(Self::COST_OF_GOODS, "Harga Pokok Penjualan", AccountType::Expense)
                .with_category(AccountCategory::CostOfGoods),
            Account::new(Self::SALARIES, "Beban Gaji", AccountType::Expense)
                .with_category(AccountCategory::Payroll),
            Account::new(Self::OPERATING, "Beban Operasional", AccountType::Expense)
                .with_category(AccountCategory::Operating),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_to_zero_reports_shortfall() {
        let mut inventory = Account::new("1-1300", "Persediaan", AccountType::Asset)
            .with_opening_balance(Money::from_rupiah(1_000));

        let change = inventory
            .adjust_balance(Money::from_rupiah(1_500), FlowDirection::Outflow)
            .unwrap();

        assert_eq!(change.applied, Money::from_rupiah(1_000));
        assert_eq!(change.shortfall, Money::from_rupiah(500));
        assert!(change.was_clamped());
        assert_eq!(inventory.current_balance, Money::ZERO);
    }

    #[test]
    fn test_reject_policy_fails_without_mutation() {
        let mut cash = Account::new("1-1000", "Kas", AccountType::Cash)
            .with_opening_balance(Money::from_rupiah(100));

        let err = cash
            .adjust_balance(Money::from_rupiah(101), FlowDirection::Outflow)
            .unwrap_err();

        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(cash.current_balance, Money::from_rupiah(100));
    }

    #[test]
    fn test_allow_policy_goes_negative() {
        let mut expense = Account::new("6-2000", "Operasional", AccountType::Expense);
        let change = expense
            .adjust_balance(Money::from_rupiah(50), FlowDirection::Outflow)
            .unwrap();
        assert_eq!(change.new_balance, Money::from_rupiah(-50));
    }

    #[test]
    fn test_criteria_matching() {
        let bank = Account::new("1-1100", "Bank BCA", AccountType::Bank);
        assert!(AccountCriteria::of_type(AccountType::Bank).with_name("bank bca").matches(&bank));
        assert!(!AccountCriteria::code("1-1000").matches(&bank));

        let mut closed = bank.clone();
        closed.is_active = false;
        assert!(!AccountCriteria::code("1-1100").matches(&closed));
        assert!(AccountCriteria::code("1-1100").including_inactive().matches(&closed));
    }

    #[test]
    fn test_default_policies() {
        assert_eq!(AccountType::Cash.default_overdraft(), OverdraftPolicy::Reject);
        assert_eq!(AccountType::Asset.default_overdraft(), OverdraftPolicy::ClampToZero);
        assert_eq!(AccountType::Expense.default_overdraft(), OverdraftPolicy::Allow);
    }
}
