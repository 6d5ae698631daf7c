//! Profit and cash position summaries

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{AccountId, DateRange, Money, Timezone};
use domain_ledger::{
    Account, AccountType, CashFlow, FinancialTransaction, FlowDirection, TransactionCategory,
    TransactionKind,
};

/// Expense total for one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseLine {
    pub category: TransactionCategory,
    pub total: Money,
    pub count: usize,
}

/// Simplified single-level profit and loss
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitSummary {
    pub range: DateRange,
    pub revenue: Money,
    pub sales_count: usize,
    /// Completed expenses other than purchases, net of payroll reversals
    pub operating_expenses: Money,
    pub expenses: Vec<ExpenseLine>,
    pub net_profit: Money,
    /// Net profit as a percentage of revenue, two decimals
    pub margin: Option<Decimal>,
}

/// Computes `net_profit = revenue − operating expenses` for `range`
///
/// Only completed transactions count. Purchases are capitalized into the
/// inventory account and reach the result through cost of goods.
pub fn profit_summary(range: DateRange, timezone: &Timezone, transactions: &[FinancialTransaction]) -> ProfitSummary {
    let mut revenue = Money::ZERO;
    let mut sales_count = 0;
    let mut expenses: BTreeMap<TransactionCategory, (Money, usize)> = BTreeMap::new();
    let mut reversals = Money::ZERO;

    let counted = transactions
        .iter()
        .filter(|txn| txn.is_completed())
        .filter(|txn| range.contains(timezone.business_date(txn.transaction_date)));

    for txn in counted {
        match (txn.kind, txn.category) {
            (TransactionKind::Income, TransactionCategory::Sales) => {
                revenue += txn.amount;
                sales_count += 1;
            }
            (TransactionKind::Income, TransactionCategory::PayrollReversal) => {
                reversals += txn.amount;
            }
            (TransactionKind::Expense, TransactionCategory::Purchase) => {}
            (TransactionKind::Expense, category) => {
                let entry = expenses.entry(category).or_default();
                entry.0 += txn.amount;
                entry.1 += 1;
            }
            (TransactionKind::Income, _) => {}
        }
    }

    let expenses: Vec<ExpenseLine> = expenses
        .into_iter()
        .map(|(category, (total, count))| ExpenseLine { category, total, count })
        .collect();
    let gross_expenses: Money = expenses.iter().map(|line| line.total).sum();
    let operating_expenses = gross_expenses - reversals;
    let net_profit = revenue - operating_expenses;

    ProfitSummary {
        range,
        revenue,
        sales_count,
        operating_expenses,
        expenses,
        net_profit,
        margin: margin(net_profit, revenue),
    }
}

fn margin(net: Money, revenue: Money) -> Option<Decimal> {
    if !revenue.is_positive() {
        return None;
    }
    Some((net.amount() / revenue.amount() * dec!(100)).round_dp(2))
}

/// Balance line of one liquid account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub account_id: AccountId,
    pub code: String,
    pub name: String,
    pub account_type: AccountType,
    pub balance: Money,
}

/// Current cash position with today's movement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashSummary {
    pub as_of: DateTime<Utc>,
    pub business_date: NaiveDate,
    pub cash_balance: Money,
    pub bank_balance: Money,
    pub total_liquid: Money,
    pub accounts: Vec<AccountBalance>,
    pub today_inflow: Money,
    pub today_outflow: Money,
}

/// Summarizes active cash and bank accounts as of `now`
///
/// Today's totals come from the liquid-account flows dated on the business
/// day of `now`.
pub fn cash_summary(now: DateTime<Utc>, timezone: &Timezone, accounts: &[Account], flows: &[CashFlow]) -> CashSummary {
    let today = timezone.business_date(now);
    let mut lines: Vec<AccountBalance> = accounts
        .iter()
        .filter(|account| account.is_active && account.account_type.is_liquid())
        .map(|account| AccountBalance {
            account_id: account.id,
            code: account.code.clone(),
            name: account.name.clone(),
            account_type: account.account_type,
            balance: account.current_balance,
        })
        .collect();
    lines.sort_by(|a, b| a.code.cmp(&b.code));

    let balance_of = |account_type: AccountType| -> Money {
        lines
            .iter()
            .filter(|line| line.account_type == account_type)
            .map(|line| line.balance)
            .sum()
    };
    let cash_balance = balance_of(AccountType::Cash);
    let bank_balance = balance_of(AccountType::Bank);

    let todays = flows
        .iter()
        .filter(|flow| flow.flow_date == today)
        .filter(|flow| lines.iter().any(|line| line.account_id == flow.account_id));
    let (mut today_inflow, mut today_outflow) = (Money::ZERO, Money::ZERO);
    for flow in todays {
        match flow.direction {
            FlowDirection::Inflow => today_inflow += flow.amount,
            FlowDirection::Outflow => today_outflow += flow.amount,
        }
    }

    CashSummary {
        as_of: now,
        business_date: today,
        cash_balance,
        bank_balance,
        total_liquid: cash_balance + bank_balance,
        accounts: lines,
        today_inflow,
        today_outflow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use core_kernel::SourceRef;
    use core_kernel::SaleId;
    use domain_ledger::{AuditKind, TransactionStatus};

    fn completed(kind: TransactionKind, category: TransactionCategory, rupiah: i64, at: DateTime<Utc>) -> FinancialTransaction {
        let mut txn = FinancialTransaction::new(
            format!("TXN-TEST-{}", rupiah),
            kind,
            category,
            Money::from_rupiah(rupiah),
            AuditKind::Sale,
        )
        .referencing(SourceRef::sale(SaleId::new()));
        txn.transaction_date = at;
        txn.status = TransactionStatus::Completed;
        txn
    }

    #[test]
    fn test_profit_excludes_purchases_and_pending() {
        let at = Utc.with_ymd_and_hms(2024, 6, 10, 3, 0, 0).unwrap();
        let range = DateRange::month(2024, 6).unwrap();
        let mut pending = completed(TransactionKind::Income, TransactionCategory::Sales, 999_000, at);
        pending.status = TransactionStatus::Pending;
        let transactions = vec![
            completed(TransactionKind::Income, TransactionCategory::Sales, 300_000, at),
            completed(TransactionKind::Income, TransactionCategory::Sales, 200_000, at),
            completed(TransactionKind::Expense, TransactionCategory::CostOfGoods, 240_000, at),
            completed(TransactionKind::Expense, TransactionCategory::Purchase, 1_000_000, at),
            completed(TransactionKind::Expense, TransactionCategory::Operational, 60_000, at),
            pending,
        ];

        let summary = profit_summary(range, &Timezone::default(), &transactions);

        assert_eq!(summary.revenue, Money::from_rupiah(500_000));
        assert_eq!(summary.sales_count, 2);
        assert_eq!(summary.operating_expenses, Money::from_rupiah(300_000));
        assert_eq!(summary.net_profit, Money::from_rupiah(200_000));
        assert_eq!(summary.margin, Some(dec!(40)));
        assert_eq!(summary.expenses.len(), 2);
    }

    #[test]
    fn test_profit_uses_business_date_for_range() {
        // 2024-06-30 18:00 UTC is already July 1st in Jakarta
        let at = Utc.with_ymd_and_hms(2024, 6, 30, 18, 0, 0).unwrap();
        let june = DateRange::month(2024, 6).unwrap();
        let transactions = vec![completed(TransactionKind::Income, TransactionCategory::Sales, 10_000, at)];

        let summary = profit_summary(june, &Timezone::default(), &transactions);

        assert_eq!(summary.revenue, Money::ZERO);
        assert_eq!(summary.margin, None);
    }
}
