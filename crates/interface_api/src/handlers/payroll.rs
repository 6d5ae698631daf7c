//! Payroll lifecycle handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use core_kernel::PayrollId;
use domain_ledger::{EventOutcome, GenerationReport};
use domain_payroll::PayrollRecord;

use crate::dto::events::PayrollPaymentRequest;
use crate::dto::payroll::*;
use crate::dto::ListResponse;
use crate::middleware::Actor;
use crate::{error::ApiError, AppState};

/// Drafts one record per employee for the period
///
/// Employees that already have a record for the period are reported as
/// skipped; rerunning is safe.
pub async fn generate(
    State(state): State<AppState>,
    actor: Actor,
    Json(request): Json<GeneratePayrollRequest>,
) -> Result<(StatusCode, Json<GenerationReport>), ApiError> {
    request.validate()?;

    let report = state
        .payroll
        .generate(request.period, &request.employees, actor.0)
        .await?;

    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PayrollListQuery>,
) -> Result<Json<ListResponse<PayrollRecord>>, ApiError> {
    Ok(Json(state.payroll.list(query.period).await?.into()))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<PayrollId>,
) -> Result<Json<PayrollRecord>, ApiError> {
    Ok(Json(state.payroll.get(id).await?))
}

pub async fn approve(
    State(state): State<AppState>,
    Path(id): Path<PayrollId>,
    actor: Actor,
) -> Result<Json<PayrollRecord>, ApiError> {
    Ok(Json(state.payroll.approve(id, actor.required()?).await?))
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<PayrollId>,
    request: Option<Json<CancelPayrollRequest>>,
) -> Result<Json<PayrollRecord>, ApiError> {
    let Json(request) = request.unwrap_or_default();
    request.validate()?;
    Ok(Json(state.payroll.cancel(id, request.reason).await?))
}

/// Pays an approved record through the ledger event path
pub async fn pay(
    State(state): State<AppState>,
    Path(id): Path<PayrollId>,
    actor: Actor,
    request: Option<Json<PayrollPaymentRequest>>,
) -> Result<Json<EventOutcome>, ApiError> {
    let approver = actor.required()?;
    let Json(request) = request.unwrap_or_default();
    let outcome = state.recorder.record_event(request.into_event(id, approver)).await?;
    Ok(Json(outcome))
}

/// Books a compensating entry for a paid record
pub async fn reverse(
    State(state): State<AppState>,
    Path(id): Path<PayrollId>,
    actor: Actor,
    Json(request): Json<ReversePayrollRequest>,
) -> Result<Json<EventOutcome>, ApiError> {
    request.validate()?;
    let outcome = state
        .payroll
        .reverse_payroll_payment(id, &request.reason, actor.required()?)
        .await?;
    Ok(Json(outcome))
}
