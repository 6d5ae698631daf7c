//! Balance reconciliation handlers

use axum::{extract::State, Json};
use tracing::warn;

use domain_ledger::ReconciliationReport;

use crate::{error::ApiError, AppState};

/// Rebuilds every reconcilable balance from its cash flows
pub async fn recalculate(State(state): State<AppState>) -> Result<Json<ReconciliationReport>, ApiError> {
    Ok(Json(state.reconciliation.recalculate_balances().await?))
}

/// Reports drift without changing anything
pub async fn verify(State(state): State<AppState>) -> Result<Json<ReconciliationReport>, ApiError> {
    let report = state.reconciliation.verify_balances().await?;
    if report.has_drift() {
        warn!(drifted = report.drifted().count(), "Account balances drifted from cash flows");
    }
    Ok(Json(report))
}
