//! Reporting Domain
//!
//! Read-side aggregations over the ledger. Every builder is a pure function
//! of accounts, transactions and cash flows; [`StatementService`] only
//! fetches committed state and hands it to them.
//!
//! # Statements
//!
//! - **Cash flow**: liquid-account flows grouped by flow type and direction,
//!   rolled from an opening to a closing balance
//! - **Profit**: completed sales revenue minus operating expenses
//! - **Cash summary**: current cash and bank position with today's movement
//! - **Analytics**: monthly and category buckets with naive projections
//! - **Dashboard**: the above combined for one range
//!
//! Cash movement covers cash and bank accounts only, so transfers between
//! inventory and cost of goods never show up as cash.

pub mod statement;
pub mod profit;
pub mod analytics;
pub mod dashboard;
pub mod service;
pub mod error;

pub use statement::{cash_flow_statement, CashFlowStatement, CategoryTotal, FlowSection};
pub use profit::{cash_summary, profit_summary, AccountBalance, CashSummary, ExpenseLine, ProfitSummary};
pub use analytics::{analytics, confidence_for, Analytics, MonthlyBucket, Projection, Trend, GROWTH_MULTIPLIER};
pub use dashboard::{dashboard, DailyTotal, DashboardData};
pub use service::StatementService;
pub use error::ReportingError;
