//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use core_kernel::PortError;
use domain_ledger::{ErrorKind, LedgerError};
use domain_reporting::ReportingError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Precondition on current state failed (stock, balance, status)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The ledger is misconfigured, e.g. a mapped account is missing
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String, Vec<String>),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into(), Vec::new())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Configuration(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Validation(..) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let (error_type, message, details) = match self {
            ApiError::NotFound(msg) => ("not_found", msg, None),
            ApiError::BadRequest(msg) => ("bad_request", msg, None),
            ApiError::Conflict(msg) => ("conflict", msg, None),
            ApiError::Configuration(msg) => ("configuration_error", msg, None),
            ApiError::Validation(msg, details) => {
                ("validation_error", msg, (!details.is_empty()).then_some(details))
            }
            ApiError::Unavailable(msg) => ("unavailable", msg, None),
            ApiError::Internal(msg) => ("internal_error", msg, None),
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        if let LedgerError::Port(port) = err {
            return port.into();
        }
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Configuration => ApiError::Configuration(message),
            ErrorKind::InsufficientResource | ErrorKind::StatePrecondition => ApiError::Conflict(message),
            ErrorKind::Validation => ApiError::validation(message),
            ErrorKind::NotFound => ApiError::NotFound(message),
            ErrorKind::Storage => ApiError::Internal(message),
        }
    }
}

impl From<ReportingError> for ApiError {
    fn from(err: ReportingError) -> Self {
        if err.is_invalid_request() {
            ApiError::validation(err.to_string())
        } else if err.is_not_found() {
            ApiError::NotFound(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        match &err {
            PortError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            PortError::Validation { .. } => ApiError::validation(err.to_string()),
            PortError::Conflict { .. } => ApiError::Conflict(err.to_string()),
            PortError::Connection { .. } => ApiError::Unavailable(err.to_string()),
            PortError::Internal { .. } => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| match &e.message {
                    Some(message) => format!("{}: {}", field, message),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();

        ApiError::Validation("Request failed validation".to_string(), details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_errors_map_by_kind() {
        let missing: ApiError = LedgerError::AccountNotFound("1-1100".to_string()).into();
        let short: ApiError = LedgerError::InsufficientBalance {
            account: "1-1000".to_string(),
            requested: "10000".to_string(),
            available: "0".to_string(),
        }
        .into();
        let unreachable: ApiError = LedgerError::from(PortError::connection("pool closed")).into();

        assert_eq!(missing.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(short.status(), StatusCode::CONFLICT);
        assert_eq!(unreachable.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_port_errors_map_to_status() {
        let not_found: ApiError = PortError::not_found("Product", "x").into();
        let conflict: ApiError = PortError::conflict("duplicate code").into();

        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(conflict.status(), StatusCode::CONFLICT);
    }
}
