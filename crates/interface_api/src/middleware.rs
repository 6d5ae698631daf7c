//! API middleware and request extractors

use axum::{
    async_trait,
    body::Body,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::info;

use core_kernel::UserId;

use crate::error::ApiError;

/// Header naming the POS user behind a request
pub const USER_HEADER: &str = "x-user-id";

/// The acting user, taken from the `x-user-id` header
///
/// Authentication happens upstream in the POS; the ledger only records who
/// acted. A malformed header is rejected rather than ignored.
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub Option<UserId>);

impl Actor {
    /// Fails when the request carries no user
    pub fn required(self) -> Result<UserId, ApiError> {
        self.0
            .ok_or_else(|| ApiError::BadRequest(format!("{} header is required", USER_HEADER)))
    }
}

fn user_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(USER_HEADER).and_then(|value| value.to_str().ok())
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.headers.get(USER_HEADER) {
            None => Ok(Actor(None)),
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|raw| raw.parse::<UserId>().ok())
                .map(|id| Actor(Some(id)))
                .ok_or_else(|| ApiError::BadRequest(format!("{} must be a user id", USER_HEADER))),
        }
    }
}

/// Audit logging middleware
///
/// Logs every API request with its acting user and latency.
pub async fn audit_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let user = user_header(request.headers()).unwrap_or("anonymous").to_string();

    let start = Utc::now();

    let response = next.run(request).await;

    let duration = Utc::now() - start;
    let status = response.status();

    info!(
        method = %method,
        uri = %uri,
        user = %user,
        status = %status.as_u16(),
        duration_ms = duration.num_milliseconds(),
        "API request"
    );

    response
}
