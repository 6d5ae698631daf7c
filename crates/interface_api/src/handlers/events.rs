//! Inbound event handlers
//!
//! Every route answers with the [`EventOutcome`]; a replayed event comes
//! back with `already_recorded` set and nothing written.

use axum::{extract::State, Json};
use tracing::info;
use validator::Validate;

use domain_ledger::{EventOutcome, LedgerEvent};

use crate::dto::events::*;
use crate::{error::ApiError, AppState};

async fn record(state: &AppState, event: LedgerEvent) -> Result<Json<EventOutcome>, ApiError> {
    let name = event.name();
    let outcome = state.recorder.record_event(event).await?;
    info!(
        event = name,
        already_recorded = outcome.already_recorded,
        transactions = outcome.transactions.len(),
        movements = outcome.movements.len(),
        "Event recorded"
    );
    Ok(Json(outcome))
}

/// Records any event tagged with its `event` name
pub async fn record_event(
    State(state): State<AppState>,
    Json(event): Json<LedgerEvent>,
) -> Result<Json<EventOutcome>, ApiError> {
    if let LedgerEvent::PaymentRejected { reason, .. } = &event {
        if reason.trim().is_empty() {
            return Err(ApiError::validation("reason must not be empty"));
        }
    }
    record(&state, event).await
}

pub async fn sale_created(
    State(state): State<AppState>,
    Json(request): Json<SaleEventRequest>,
) -> Result<Json<EventOutcome>, ApiError> {
    record(&state, LedgerEvent::SaleCreated { sale: request.sale }).await
}

pub async fn sale_completed(
    State(state): State<AppState>,
    Json(request): Json<SaleEventRequest>,
) -> Result<Json<EventOutcome>, ApiError> {
    record(&state, LedgerEvent::SaleCompleted { sale: request.sale }).await
}

pub async fn sale_edited(
    State(state): State<AppState>,
    Json(request): Json<SaleEditedRequest>,
) -> Result<Json<EventOutcome>, ApiError> {
    record(&state, request.into()).await
}

pub async fn sale_deleted(
    State(state): State<AppState>,
    Json(request): Json<SaleEventRequest>,
) -> Result<Json<EventOutcome>, ApiError> {
    record(&state, LedgerEvent::SaleDeleted { sale: request.sale }).await
}

pub async fn purchase_completed(
    State(state): State<AppState>,
    Json(request): Json<PurchaseCompletedRequest>,
) -> Result<Json<EventOutcome>, ApiError> {
    record(&state, request.into()).await
}

pub async fn payment_confirmed(
    State(state): State<AppState>,
    Json(request): Json<SaleEventRequest>,
) -> Result<Json<EventOutcome>, ApiError> {
    record(&state, LedgerEvent::PaymentConfirmed { sale: request.sale }).await
}

pub async fn payment_rejected(
    State(state): State<AppState>,
    Json(request): Json<PaymentRejectedRequest>,
) -> Result<Json<EventOutcome>, ApiError> {
    request.validate()?;
    record(&state, request.into()).await
}
