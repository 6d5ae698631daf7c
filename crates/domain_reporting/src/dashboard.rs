//! Dashboard aggregate

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{DateRange, Money, Timezone};
use domain_ledger::{Account, CashFlow, FinancialTransaction, FlowDirection, TransactionKind, TransactionStatus};

use crate::profit::{cash_summary, profit_summary, CashSummary, ExpenseLine, ProfitSummary};
use crate::statement::{cash_flow_statement, liquid_account_ids, CashFlowStatement};

/// Number of expense categories shown on the dashboard
pub const TOP_EXPENSES: usize = 5;

/// Liquid movement of one business day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub inflow: Money,
    pub outflow: Money,
}

/// Everything the back-office landing page shows for a range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardData {
    pub range: DateRange,
    pub cash: CashSummary,
    pub profit: ProfitSummary,
    pub cash_flow: CashFlowStatement,
    /// Days with liquid movement, oldest first
    pub daily: Vec<DailyTotal>,
    pub top_expenses: Vec<ExpenseLine>,
    /// Income still waiting for payment confirmation
    pub pending_income_count: usize,
    pub pending_income: Money,
}

pub fn dashboard(
    range: DateRange,
    now: DateTime<Utc>,
    timezone: &Timezone,
    accounts: &[Account],
    transactions: &[FinancialTransaction],
    flows: &[CashFlow],
) -> DashboardData {
    let cash_flow = cash_flow_statement(range, accounts, flows);
    let profit = profit_summary(range, timezone, transactions);
    let cash = cash_summary(now, timezone, accounts, flows);

    let liquid = liquid_account_ids(accounts);
    let mut days: BTreeMap<NaiveDate, (Money, Money)> = BTreeMap::new();
    for flow in flows
        .iter()
        .filter(|flow| liquid.contains(&flow.account_id) && range.contains(flow.flow_date))
    {
        let day = days.entry(flow.flow_date).or_default();
        match flow.direction {
            FlowDirection::Inflow => day.0 += flow.amount,
            FlowDirection::Outflow => day.1 += flow.amount,
        }
    }
    let daily = days
        .into_iter()
        .map(|(date, (inflow, outflow))| DailyTotal { date, inflow, outflow })
        .collect();

    let mut top_expenses = profit.expenses.clone();
    top_expenses.sort_by(|a, b| b.total.cmp(&a.total).then(a.category.cmp(&b.category)));
    top_expenses.truncate(TOP_EXPENSES);

    let pending: Vec<&FinancialTransaction> = transactions
        .iter()
        .filter(|txn| txn.status == TransactionStatus::Pending && txn.kind == TransactionKind::Income)
        .collect();

    DashboardData {
        range,
        cash,
        profit,
        cash_flow,
        daily,
        top_expenses,
        pending_income_count: pending.len(),
        pending_income: pending.iter().map(|txn| txn.amount).sum(),
    }
}
