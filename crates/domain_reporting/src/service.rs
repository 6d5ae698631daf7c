//! Statement service over committed ledger state

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::instrument;

use core_kernel::{DateRange, PayrollPeriod, Timezone};
use domain_ledger::{CashFlowFilter, LedgerStore, TransactionFilter};

use crate::analytics::{analytics, Analytics, HISTORY_YEARS};
use crate::dashboard::{dashboard, DashboardData};
use crate::error::ReportingError;
use crate::profit::{cash_summary, profit_summary, CashSummary, ProfitSummary};
use crate::statement::{cash_flow_statement, CashFlowStatement};

/// Answers the outbound report queries
///
/// Reads committed state only and takes no locks, so it is safe to call
/// while the recorder is writing.
#[derive(Clone)]
pub struct StatementService {
    store: Arc<dyn LedgerStore>,
    timezone: Timezone,
}

impl StatementService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            timezone: Timezone::default(),
        }
    }

    pub fn with_timezone(mut self, timezone: Timezone) -> Self {
        self.timezone = timezone;
        self
    }

    #[instrument(skip(self))]
    pub async fn cash_flow_statement(&self, range: DateRange) -> Result<CashFlowStatement, ReportingError> {
        let accounts = self.store.list_accounts().await?;
        let flows = self
            .store
            .cash_flows(&CashFlowFilter::default().until(range.end))
            .await?;
        Ok(cash_flow_statement(range, &accounts, &flows))
    }

    #[instrument(skip(self))]
    pub async fn profit_summary(&self, range: DateRange) -> Result<ProfitSummary, ReportingError> {
        let (from, until) = range.utc_bounds(&self.timezone);
        let transactions = self
            .store
            .transactions(&TransactionFilter::between(from, until))
            .await?;
        Ok(profit_summary(range, &self.timezone, &transactions))
    }

    pub async fn cash_summary(&self) -> Result<CashSummary, ReportingError> {
        self.cash_summary_at(Utc::now()).await
    }

    #[instrument(skip(self))]
    pub async fn cash_summary_at(&self, now: DateTime<Utc>) -> Result<CashSummary, ReportingError> {
        let today = self.timezone.business_date(now);
        let accounts = self.store.list_accounts().await?;
        let flows = self.store.cash_flows(&CashFlowFilter::between(today, today)).await?;
        Ok(cash_summary(now, &self.timezone, &accounts, &flows))
    }

    /// Analytics for `year` with projections starting next month
    pub async fn analytics(&self, year: i32, horizon: u32) -> Result<Analytics, ReportingError> {
        let today = self.timezone.business_date(Utc::now());
        self.analytics_as_of(year, horizon, today).await
    }

    #[instrument(skip(self))]
    pub async fn analytics_as_of(&self, year: i32, horizon: u32, today: NaiveDate) -> Result<Analytics, ReportingError> {
        let first_projected = PayrollPeriod::containing(today).next();
        let earliest_year = year.min(first_projected.year() - HISTORY_YEARS);
        let history_start = DateRange::year(earliest_year)?.start;

        let accounts = self.store.list_accounts().await?;
        let flows = self
            .store
            .cash_flows(&CashFlowFilter {
                from: Some(history_start),
                ..CashFlowFilter::default()
            })
            .await?;
        analytics(year, first_projected, horizon, &accounts, &flows)
    }

    pub async fn dashboard(&self, range: DateRange) -> Result<DashboardData, ReportingError> {
        self.dashboard_at(range, Utc::now()).await
    }

    #[instrument(skip(self))]
    pub async fn dashboard_at(&self, range: DateRange, now: DateTime<Utc>) -> Result<DashboardData, ReportingError> {
        let (from, until) = range.utc_bounds(&self.timezone);
        let accounts = self.store.list_accounts().await?;
        let transactions = self
            .store
            .transactions(&TransactionFilter::between(from, until))
            .await?;
        let today = self.timezone.business_date(now);
        let flows = self
            .store
            .cash_flows(&CashFlowFilter::default().until(range.end.max(today)))
            .await?;
        Ok(dashboard(range, now, &self.timezone, &accounts, &transactions, &flows))
    }
}
