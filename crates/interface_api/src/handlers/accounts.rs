//! Account read handlers

use axum::{
    extract::{Path, State},
    Json,
};

use domain_ledger::{Account, AccountCriteria};

use crate::dto::ListResponse;
use crate::{error::ApiError, AppState};

pub async fn list_accounts(State(state): State<AppState>) -> Result<Json<ListResponse<Account>>, ApiError> {
    Ok(Json(state.store.list_accounts().await?.into()))
}

/// Looks an account up by its chart code, e.g. `1-1000`
pub async fn get_account(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Account>, ApiError> {
    state
        .store
        .find_account(&AccountCriteria::code(&code).including_inactive())
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Account {} not found", code)))
}
