//! Monthly analytics and naive projections
//!
//! Liquid-account flows are bucketed by calendar month and by category.
//! Each projected month averages the same month over up to three earlier
//! years that have data and applies a fixed growth multiplier:
//!
//! ```text
//! projected = avg(month in Y-1, Y-2, Y-3 with data) × 1.05
//! confidence = min(90, 30 × years with data)
//! ```

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{Money, PayrollPeriod};
use domain_ledger::{Account, CashFlow, FlowDirection};

use crate::error::ReportingError;
use crate::statement::{category_totals, liquid_account_ids, CategoryTotal};

pub const GROWTH_MULTIPLIER: Decimal = dec!(1.05);
pub const HISTORY_YEARS: i32 = 3;
pub const CONFIDENCE_PER_YEAR: u8 = 30;
pub const MAX_CONFIDENCE: u8 = 90;
pub const MAX_PROJECTION_MONTHS: u32 = 24;

/// Direction of a month's net against the month before
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Falling,
    Flat,
}

/// Totals of one calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyBucket {
    pub period: PayrollPeriod,
    pub inflow: Money,
    pub outflow: Money,
    pub net: Money,
    pub flow_count: usize,
    /// None when the previous month has no flows
    pub trend: Option<Trend>,
    pub net_change_pct: Option<Decimal>,
}

/// Projected totals for one future month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub period: PayrollPeriod,
    pub projected_inflow: Money,
    pub projected_outflow: Money,
    pub projected_net: Money,
    pub years_of_data: u32,
    /// 0 to 90
    pub confidence: u8,
}

/// Analytics for one calendar year plus projections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analytics {
    pub year: i32,
    pub total_inflow: Money,
    pub total_outflow: Money,
    pub net: Money,
    /// Always twelve buckets, January first
    pub monthly: Vec<MonthlyBucket>,
    pub categories: Vec<CategoryTotal>,
    pub best_month: Option<PayrollPeriod>,
    pub projections: Vec<Projection>,
}

#[derive(Debug, Clone, Copy, Default)]
struct MonthTotals {
    inflow: Money,
    outflow: Money,
    count: usize,
}

impl MonthTotals {
    fn net(&self) -> Money {
        self.inflow - self.outflow
    }
}

type MonthKey = (i32, u32);

fn month_totals<'a>(flows: impl IntoIterator<Item = &'a CashFlow>) -> BTreeMap<MonthKey, MonthTotals> {
    let mut months: BTreeMap<MonthKey, MonthTotals> = BTreeMap::new();
    for flow in flows {
        let period = PayrollPeriod::containing(flow.flow_date);
        let totals = months.entry((period.year(), period.month())).or_default();
        match flow.direction {
            FlowDirection::Inflow => totals.inflow += flow.amount,
            FlowDirection::Outflow => totals.outflow += flow.amount,
        }
        totals.count += 1;
    }
    months
}

fn previous_month((year, month): MonthKey) -> MonthKey {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

fn trend_against(current: Money, previous: Option<&MonthTotals>) -> (Option<Trend>, Option<Decimal>) {
    let Some(previous) = previous.filter(|totals| totals.count > 0) else {
        return (None, None);
    };
    let before = previous.net();
    let trend = match current.cmp(&before) {
        std::cmp::Ordering::Greater => Trend::Rising,
        std::cmp::Ordering::Less => Trend::Falling,
        std::cmp::Ordering::Equal => Trend::Flat,
    };
    let pct = if before.is_zero() {
        None
    } else {
        Some(((current - before).amount() / before.abs().amount() * dec!(100)).round_dp(2))
    };
    (Some(trend), pct)
}

/// Projects one month from the same month of earlier years
fn project_month(period: PayrollPeriod, history: &BTreeMap<MonthKey, MonthTotals>) -> Projection {
    let samples: Vec<&MonthTotals> = (1..=HISTORY_YEARS)
        .filter_map(|back| history.get(&(period.year() - back, period.month())))
        .filter(|totals| totals.count > 0)
        .collect();
    let years = samples.len() as u32;

    let average = |pick: fn(&MonthTotals) -> Money| -> Money {
        if years == 0 {
            return Money::ZERO;
        }
        let total: Money = samples.iter().map(|totals| pick(totals)).sum();
        Money::new(total.amount() / Decimal::from(years) * GROWTH_MULTIPLIER)
    };
    let projected_inflow = average(|totals| totals.inflow);
    let projected_outflow = average(|totals| totals.outflow);

    Projection {
        period,
        projected_inflow,
        projected_outflow,
        projected_net: projected_inflow - projected_outflow,
        years_of_data: years,
        confidence: confidence_for(years),
    }
}

/// 30 points per year of data, capped at 90
pub fn confidence_for(years: u32) -> u8 {
    let points = years.saturating_mul(u32::from(CONFIDENCE_PER_YEAR));
    points.min(u32::from(MAX_CONFIDENCE)) as u8
}

/// Builds analytics for `year` and projects `horizon` months from `first_projected`
///
/// `flows` should hold the full liquid history so projections can look back
/// three years; flows of other accounts are dropped.
pub fn analytics(
    year: i32,
    first_projected: PayrollPeriod,
    horizon: u32,
    accounts: &[Account],
    flows: &[CashFlow],
) -> Result<Analytics, ReportingError> {
    if horizon == 0 || horizon > MAX_PROJECTION_MONTHS {
        return Err(ReportingError::InvalidHorizon {
            requested: horizon,
            max: MAX_PROJECTION_MONTHS,
        });
    }

    let liquid = liquid_account_ids(accounts);
    let liquid_flows: Vec<&CashFlow> = flows
        .iter()
        .filter(|flow| liquid.contains(&flow.account_id))
        .collect();
    let history = month_totals(liquid_flows.iter().copied());

    let mut monthly = Vec::with_capacity(12);
    for month in 1..=12 {
        let period = PayrollPeriod::new(year, month)?;
        let key = (year, month);
        let totals = history.get(&key).copied().unwrap_or_default();
        let (trend, net_change_pct) = trend_against(totals.net(), history.get(&previous_month(key)));
        monthly.push(MonthlyBucket {
            period,
            inflow: totals.inflow,
            outflow: totals.outflow,
            net: totals.net(),
            flow_count: totals.count,
            trend,
            net_change_pct,
        });
    }

    let total_inflow: Money = monthly.iter().map(|bucket| bucket.inflow).sum();
    let total_outflow: Money = monthly.iter().map(|bucket| bucket.outflow).sum();
    let best_month = monthly
        .iter()
        .filter(|bucket| bucket.flow_count > 0)
        .max_by(|a, b| a.net.cmp(&b.net).then(b.period.cmp(&a.period)))
        .map(|bucket| bucket.period);

    let categories = category_totals(
        liquid_flows
            .iter()
            .copied()
            .filter(|flow| PayrollPeriod::containing(flow.flow_date).year() == year),
    );

    let mut projections = Vec::with_capacity(horizon as usize);
    let mut period = first_projected;
    for _ in 0..horizon {
        projections.push(project_month(period, &history));
        period = period.next();
    }

    Ok(Analytics {
        year,
        total_inflow,
        total_outflow,
        net: total_inflow - total_outflow,
        monthly,
        categories,
        best_month,
        projections,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use core_kernel::CashFlowId;
    use domain_ledger::{AccountType, TransactionCategory};

    fn flow(account: &Account, year: i32, month: u32, direction: FlowDirection, rupiah: i64) -> CashFlow {
        CashFlow {
            id: CashFlowId::new_v7(),
            flow_date: NaiveDate::from_ymd_opt(year, month, 15).unwrap(),
            flow_type: TransactionCategory::Sales.flow_type(),
            direction,
            category: TransactionCategory::Sales,
            amount: Money::from_rupiah(rupiah),
            account_id: account.id,
            transaction_id: None,
            description: String::new(),
            running_balance: Money::ZERO,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_confidence_is_capped() {
        assert_eq!(confidence_for(0), 0);
        assert_eq!(confidence_for(1), 30);
        assert_eq!(confidence_for(3), 90);
        assert_eq!(confidence_for(7), 90);
    }

    #[test]
    fn test_projection_averages_years_with_data() {
        let cash = Account::new("1-1000", "Kas", AccountType::Cash);
        let flows = vec![
            flow(&cash, 2021, 3, FlowDirection::Inflow, 100_000),
            flow(&cash, 2023, 3, FlowDirection::Inflow, 300_000),
            flow(&cash, 2023, 3, FlowDirection::Outflow, 100_000),
            // four years back is outside the window
            flow(&cash, 2020, 3, FlowDirection::Inflow, 9_000_000),
        ];
        let march = PayrollPeriod::new(2024, 3).unwrap();

        let result = analytics(2023, march, 2, &[cash], &flows).unwrap();

        let projection = &result.projections[0];
        assert_eq!(projection.period, march);
        assert_eq!(projection.years_of_data, 2);
        assert_eq!(projection.confidence, 60);
        assert_eq!(projection.projected_inflow, Money::from_rupiah(210_000));
        assert_eq!(projection.projected_outflow, Money::from_rupiah(52_500));
        assert_eq!(result.projections[1].years_of_data, 0);
        assert_eq!(result.projections[1].projected_net, Money::ZERO);
    }

    #[test]
    fn test_monthly_buckets_and_trend() {
        let cash = Account::new("1-1000", "Kas", AccountType::Cash);
        let bank = Account::new("1-1100", "Bank", AccountType::Bank);
        let inventory = Account::new("1-1300", "Persediaan", AccountType::Asset);
        let flows = vec![
            flow(&cash, 2024, 1, FlowDirection::Inflow, 100_000),
            flow(&bank, 2024, 2, FlowDirection::Inflow, 150_000),
            flow(&inventory, 2024, 2, FlowDirection::Outflow, 1_000_000),
        ];
        let next = PayrollPeriod::new(2025, 1).unwrap();

        let result = analytics(2024, next, 1, &[cash, bank, inventory], &flows).unwrap();

        assert_eq!(result.monthly.len(), 12);
        assert_eq!(result.total_inflow, Money::from_rupiah(250_000));
        assert_eq!(result.total_outflow, Money::ZERO);
        assert_eq!(result.monthly[0].trend, None);
        assert_eq!(result.monthly[1].trend, Some(Trend::Rising));
        assert_eq!(result.monthly[1].net_change_pct, Some(dec!(50)));
        assert_eq!(result.monthly[2].trend, Some(Trend::Falling));
        assert_eq!(result.best_month, PayrollPeriod::new(2024, 2).ok());
    }

    #[test]
    fn test_horizon_is_bounded() {
        let next = PayrollPeriod::new(2025, 1).unwrap();
        let err = analytics(2024, next, 0, &[], &[]).unwrap_err();
        assert!(err.is_invalid_request());
        assert!(analytics(2024, next, MAX_PROJECTION_MONTHS + 1, &[], &[]).is_err());
    }
}
