//! Product and stock handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use core_kernel::ProductId;
use domain_inventory::{Product, StockMovement};

use crate::dto::products::*;
use crate::dto::ListResponse;
use crate::middleware::Actor;
use crate::{error::ApiError, AppState};

/// Registers a product; opening stock is booked as an `initial` movement
pub async fn register_product(
    State(state): State<AppState>,
    actor: Actor,
    Json(request): Json<RegisterProductRequest>,
) -> Result<(StatusCode, Json<RegisterProductResponse>), ApiError> {
    request.validate()?;

    let (product, opening_movement) = state
        .stock
        .register_product(request.to_product(), request.opening_stock, actor.0)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterProductResponse {
            product,
            opening_movement,
        }),
    ))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>, ApiError> {
    Ok(Json(state.stock.product(id).await?))
}

pub async fn list_movements(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ListResponse<StockMovement>>, ApiError> {
    Ok(Json(state.stock.movements(id).await?.into()))
}

pub async fn record_movement(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    actor: Actor,
    Json(request): Json<RecordMovementRequest>,
) -> Result<(StatusCode, Json<StockMovement>), ApiError> {
    request.validate()?;

    let movement = state
        .stock
        .record_movement(id, request.kind, request.quantity, request.description, actor.0)
        .await?;

    Ok((StatusCode::CREATED, Json(movement)))
}

/// Checks the movement chain of one product against its live stock
pub async fn verify_chain(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ChainVerificationResponse>, ApiError> {
    let movements = state.stock.verify_product(id).await?;
    let stock = movements.last().map_or(0, |m| m.stock_after);

    Ok(Json(ChainVerificationResponse {
        product_id: id,
        stock,
        movements: movements.len(),
        intact: true,
    }))
}
