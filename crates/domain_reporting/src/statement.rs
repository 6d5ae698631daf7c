//! Cash-flow statement
//!
//! Groups the cash flows of liquid accounts by flow type and direction and
//! rolls the opening position forward: `closing = opening + Σ signed amounts`.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use core_kernel::{AccountId, DateRange, Money};
use domain_ledger::{Account, CashFlow, FlowDirection, FlowType, TransactionCategory};

/// Total of one category in one direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: TransactionCategory,
    pub direction: FlowDirection,
    pub total: Money,
    pub count: usize,
}

/// Totals of one flow-type section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowSection {
    pub flow_type: FlowType,
    pub inflow: Money,
    pub outflow: Money,
    pub net: Money,
    pub categories: Vec<CategoryTotal>,
}

/// Cash movement of the liquid accounts over a date range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlowStatement {
    pub range: DateRange,
    pub opening_balance: Money,
    pub total_inflow: Money,
    pub total_outflow: Money,
    pub net_change: Money,
    pub closing_balance: Money,
    /// Sections in operating, investing, financing order; empty ones are kept
    pub sections: Vec<FlowSection>,
}

impl CashFlowStatement {
    pub fn section(&self, flow_type: FlowType) -> Option<&FlowSection> {
        self.sections.iter().find(|s| s.flow_type == flow_type)
    }
}

/// Ids of the cash and bank accounts
pub(crate) fn liquid_account_ids(accounts: &[Account]) -> HashSet<AccountId> {
    accounts
        .iter()
        .filter(|account| account.account_type.is_liquid())
        .map(|account| account.id)
        .collect()
}

/// Sums flows into per-category totals, ordered by category then direction
pub(crate) fn category_totals<'a>(flows: impl IntoIterator<Item = &'a CashFlow>) -> Vec<CategoryTotal> {
    let mut grouped: BTreeMap<(TransactionCategory, FlowDirection), (Money, usize)> = BTreeMap::new();
    for flow in flows {
        let entry = grouped.entry((flow.category, flow.direction)).or_default();
        entry.0 += flow.amount;
        entry.1 += 1;
    }
    grouped
        .into_iter()
        .map(|((category, direction), (total, count))| CategoryTotal {
            category,
            direction,
            total,
            count,
        })
        .collect()
}

/// Builds the statement for `range`
///
/// `flows` may contain history before the range; those flows roll into the
/// opening balance. Flows of non-liquid accounts and flows after the range
/// are ignored.
pub fn cash_flow_statement(range: DateRange, accounts: &[Account], flows: &[CashFlow]) -> CashFlowStatement {
    let liquid = liquid_account_ids(accounts);
    let opening_of_accounts: Money = accounts
        .iter()
        .filter(|account| liquid.contains(&account.id))
        .map(|account| account.opening_balance)
        .sum();

    let mut opening_balance = opening_of_accounts;
    let mut in_range = Vec::new();
    for flow in flows.iter().filter(|flow| liquid.contains(&flow.account_id)) {
        if flow.flow_date < range.start {
            opening_balance += flow.signed_amount();
        } else if range.contains(flow.flow_date) {
            in_range.push(flow);
        }
    }

    let sections: Vec<FlowSection> = [FlowType::Operating, FlowType::Investing, FlowType::Financing]
        .into_iter()
        .map(|flow_type| {
            let section_flows: Vec<&CashFlow> = in_range
                .iter()
                .copied()
                .filter(|flow| flow.flow_type == flow_type)
                .collect();
            let inflow = sum_direction(&section_flows, FlowDirection::Inflow);
            let outflow = sum_direction(&section_flows, FlowDirection::Outflow);
            FlowSection {
                flow_type,
                inflow,
                outflow,
                net: inflow - outflow,
                categories: category_totals(section_flows),
            }
        })
        .collect();

    let total_inflow: Money = sections.iter().map(|s| s.inflow).sum();
    let total_outflow: Money = sections.iter().map(|s| s.outflow).sum();
    let net_change = total_inflow - total_outflow;

    CashFlowStatement {
        range,
        opening_balance,
        total_inflow,
        total_outflow,
        net_change,
        closing_balance: opening_balance + net_change,
        sections,
    }
}

fn sum_direction(flows: &[&CashFlow], direction: FlowDirection) -> Money {
    flows
        .iter()
        .filter(|flow| flow.direction == direction)
        .map(|flow| flow.amount)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use core_kernel::CashFlowId;
    use domain_ledger::{AccountType, ShopChartOfAccounts};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn flow(account: AccountId, day: u32, direction: FlowDirection, category: TransactionCategory, rupiah: i64) -> CashFlow {
        CashFlow {
            id: CashFlowId::new_v7(),
            flow_date: date(day),
            flow_type: category.flow_type(),
            direction,
            category,
            amount: Money::from_rupiah(rupiah),
            account_id: account,
            transaction_id: None,
            description: String::new(),
            running_balance: Money::ZERO,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_statement_rolls_history_into_opening() {
        let cash = Account::new(ShopChartOfAccounts::CASH, "Kas", AccountType::Cash)
            .with_opening_balance(Money::from_rupiah(100_000));
        let inventory = Account::new(ShopChartOfAccounts::INVENTORY, "Persediaan", AccountType::Asset);
        let flows = vec![
            flow(cash.id, 1, FlowDirection::Inflow, TransactionCategory::Sales, 50_000),
            flow(cash.id, 10, FlowDirection::Inflow, TransactionCategory::Sales, 30_000),
            flow(cash.id, 12, FlowDirection::Outflow, TransactionCategory::Payroll, 20_000),
            flow(cash.id, 13, FlowDirection::Inflow, TransactionCategory::Capital, 5_000),
            flow(inventory.id, 12, FlowDirection::Outflow, TransactionCategory::CostOfGoods, 9_000),
            flow(cash.id, 25, FlowDirection::Inflow, TransactionCategory::Sales, 1_000),
        ];
        let range = DateRange::new(date(5), date(20)).unwrap();

        let statement = cash_flow_statement(range, &[cash, inventory], &flows);

        assert_eq!(statement.opening_balance, Money::from_rupiah(150_000));
        assert_eq!(statement.total_inflow, Money::from_rupiah(35_000));
        assert_eq!(statement.total_outflow, Money::from_rupiah(20_000));
        assert_eq!(statement.closing_balance, Money::from_rupiah(165_000));

        let operating = statement.section(FlowType::Operating).unwrap();
        assert_eq!(operating.net, Money::from_rupiah(10_000));
        assert_eq!(operating.categories.len(), 2);
        let financing = statement.section(FlowType::Financing).unwrap();
        assert_eq!(financing.inflow, Money::from_rupiah(5_000));
        assert!(statement.section(FlowType::Investing).unwrap().categories.is_empty());
    }
}
