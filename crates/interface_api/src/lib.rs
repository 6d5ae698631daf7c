//! HTTP API Layer
//!
//! REST surface of the shop ledger using Axum. The point-of-sale layer
//! posts business events here; report renderers read statements back.
//!
//! # Architecture
//!
//! - **Handlers**: inbound events, reports, accounts, stock, payroll, reconciliation
//! - **Middleware**: request ids, tracing, audit logging, acting-user extraction
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: ledger error kinds mapped onto HTTP status codes
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::build(store, config).await?;
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use core_kernel::HealthCheckable;
use domain_ledger::{
    AccountMapping, LedgerError, LedgerStore, PayrollService, ReconciliationEngine, StockLedger,
    TransactionRecorder,
};
use domain_reporting::StatementService;

use crate::config::ApiConfig;
use crate::handlers::{accounts, events, health, payroll, products, reconciliation, reports};
use crate::middleware::audit_middleware;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LedgerStore>,
    pub health: Arc<dyn HealthCheckable>,
    pub recorder: TransactionRecorder,
    pub stock: StockLedger,
    pub payroll: PayrollService,
    pub reconciliation: ReconciliationEngine,
    pub statements: StatementService,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    /// Wires the ledger services over one store
    ///
    /// Resolves the configured account codes up front, so a missing or
    /// inactive mapped account stops startup instead of failing the first
    /// sale.
    pub async fn build<S>(store: Arc<S>, config: ApiConfig) -> Result<Self, LedgerError>
    where
        S: LedgerStore + HealthCheckable + 'static,
    {
        let mapping = AccountMapping::resolve(store.as_ref(), &config.accounts).await?;
        info!(
            cash = %mapping.cash,
            bank = %mapping.bank,
            payroll = %mapping.payroll,
            "Account mapping resolved"
        );

        let health: Arc<dyn HealthCheckable> = store.clone();
        let store: Arc<dyn LedgerStore> = store;
        let timezone = config.timezone;

        Ok(Self {
            recorder: TransactionRecorder::new(store.clone(), mapping).with_timezone(timezone),
            stock: StockLedger::new(store.clone()),
            payroll: PayrollService::new(store.clone(), config.payroll.clone(), mapping)
                .with_timezone(timezone),
            reconciliation: ReconciliationEngine::new(store.clone()),
            statements: StatementService::new(store.clone()).with_timezone(timezone),
            store,
            health,
            config: Arc::new(config),
        })
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Inbound events from the point of sale
    let event_routes = Router::new()
        .route("/", post(events::record_event))
        .route("/sales/created", post(events::sale_created))
        .route("/sales/completed", post(events::sale_completed))
        .route("/sales/edited", post(events::sale_edited))
        .route("/sales/deleted", post(events::sale_deleted))
        .route("/purchases/completed", post(events::purchase_completed))
        .route("/payments/confirmed", post(events::payment_confirmed))
        .route("/payments/rejected", post(events::payment_rejected));

    let report_routes = Router::new()
        .route("/cash-flow", get(reports::cash_flow_statement))
        .route("/profit", get(reports::profit_summary))
        .route("/cash-summary", get(reports::cash_summary))
        .route("/analytics", get(reports::analytics))
        .route("/dashboard", get(reports::dashboard));

    let account_routes = Router::new()
        .route("/", get(accounts::list_accounts))
        .route("/:code", get(accounts::get_account));

    let product_routes = Router::new()
        .route("/", post(products::register_product))
        .route("/:id", get(products::get_product))
        .route(
            "/:id/movements",
            get(products::list_movements).post(products::record_movement),
        )
        .route("/:id/verify", get(products::verify_chain));

    let payroll_routes = Router::new()
        .route("/", get(payroll::list))
        .route("/generate", post(payroll::generate))
        .route("/:id", get(payroll::get))
        .route("/:id/approve", post(payroll::approve))
        .route("/:id/cancel", post(payroll::cancel))
        .route("/:id/pay", post(payroll::pay))
        .route("/:id/reverse", post(payroll::reverse));

    let api_routes = Router::new()
        .nest("/events", event_routes)
        .nest("/reports", report_routes)
        .nest("/accounts", account_routes)
        .nest("/products", product_routes)
        .nest("/payrolls", payroll_routes)
        .route(
            "/reconciliation",
            get(reconciliation::verify).post(reconciliation::recalculate),
        )
        .layer(axum_middleware::from_fn(audit_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
