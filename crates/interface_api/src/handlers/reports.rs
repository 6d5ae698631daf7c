//! Outbound report handlers

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;

use domain_reporting::{Analytics, CashFlowStatement, CashSummary, DashboardData, ProfitSummary};

use crate::dto::reports::{AnalyticsQuery, RangeQuery};
use crate::{error::ApiError, AppState};

pub async fn cash_flow_statement(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<CashFlowStatement>, ApiError> {
    Ok(Json(state.statements.cash_flow_statement(query.range()?).await?))
}

pub async fn profit_summary(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<ProfitSummary>, ApiError> {
    Ok(Json(state.statements.profit_summary(query.range()?).await?))
}

pub async fn cash_summary(State(state): State<AppState>) -> Result<Json<CashSummary>, ApiError> {
    Ok(Json(state.statements.cash_summary().await?))
}

/// Monthly buckets for a year plus a projection
///
/// The year defaults to the current business year.
pub async fn analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<Analytics>, ApiError> {
    let today = state.config.timezone.business_date(Utc::now());
    let year = query.year_or(today);
    Ok(Json(state.statements.analytics(year, query.months).await?))
}

pub async fn dashboard(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<DashboardData>, ApiError> {
    Ok(Json(state.statements.dashboard(query.range()?).await?))
}
