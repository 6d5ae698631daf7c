//! Cash-flow records
//!
//! The append-only ledger of balance movements. The ordered records of one
//! account are the ground truth the reconciliation engine rebuilds balances
//! from.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{AccountId, CashFlowId, Money, TransactionId};

use crate::transaction::TransactionCategory;

/// Cash-flow statement section
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowType {
    Operating,
    Investing,
    Financing,
}

impl FlowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowType::Operating => "operating",
            FlowType::Investing => "investing",
            FlowType::Financing => "financing",
        }
    }
}

impl fmt::Display for FlowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "operating" => Ok(FlowType::Operating),
            "investing" => Ok(FlowType::Investing),
            "financing" => Ok(FlowType::Financing),
            other => Err(format!("unknown flow type: {}", other)),
        }
    }
}

/// Direction of a balance movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowDirection {
    Inflow,
    Outflow,
}

impl FlowDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowDirection::Inflow => "inflow",
            FlowDirection::Outflow => "outflow",
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            FlowDirection::Inflow => FlowDirection::Outflow,
            FlowDirection::Outflow => FlowDirection::Inflow,
        }
    }

    /// Applies the direction's sign to an amount
    pub fn signed(&self, amount: Money) -> Money {
        match self {
            FlowDirection::Inflow => amount,
            FlowDirection::Outflow => -amount,
        }
    }
}

impl fmt::Display for FlowDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlowDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inflow" => Ok(FlowDirection::Inflow),
            "outflow" => Ok(FlowDirection::Outflow),
            other => Err(format!("unknown flow direction: {}", other)),
        }
    }
}

/// One append-only balance movement on an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashFlow {
    pub id: CashFlowId,
    /// Business date in the shop's timezone
    pub flow_date: NaiveDate,
    pub flow_type: FlowType,
    pub direction: FlowDirection,
    pub category: TransactionCategory,
    /// Always positive; the direction carries the sign
    pub amount: Money,
    pub account_id: AccountId,
    pub transaction_id: Option<TransactionId>,
    pub description: String,
    /// Account balance right after this movement
    pub running_balance: Money,
    pub created_at: DateTime<Utc>,
}

impl CashFlow {
    pub fn signed_amount(&self) -> Money {
        self.direction.signed(self.amount)
    }
}

/// Inflow and outflow sums for one account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowTotals {
    pub inflow: Money,
    pub outflow: Money,
    pub count: u64,
}

impl FlowTotals {
    pub fn from_flows<'a>(flows: impl IntoIterator<Item = &'a CashFlow>) -> Self {
        flows.into_iter().fold(Self::default(), |mut totals, flow| {
            match flow.direction {
                FlowDirection::Inflow => totals.inflow += flow.amount,
                FlowDirection::Outflow => totals.outflow += flow.amount,
            }
            totals.count += 1;
            totals
        })
    }

    pub fn net(&self) -> Money {
        self.inflow - self.outflow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_sign() {
        let amount = Money::from_rupiah(30_000);
        assert_eq!(FlowDirection::Inflow.signed(amount), amount);
        assert_eq!(FlowDirection::Outflow.signed(amount), -amount);
        assert_eq!(FlowDirection::Outflow.opposite(), FlowDirection::Inflow);
    }

    #[test]
    fn test_flow_type_parse() {
        assert_eq!("financing".parse::<FlowType>(), Ok(FlowType::Financing));
        assert!("trading".parse::<FlowType>().is_err());
    }
}
