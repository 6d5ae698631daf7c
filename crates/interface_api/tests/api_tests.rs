//! HTTP API tests
//!
//! Drive the router end to end over the in-memory ledger store.

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use uuid::Uuid;

use core_kernel::{Money, ProductId, UserId};
use domain_inventory::{Product, StockMovement};
use domain_ledger::{Account, EventOutcome, ReconciliationReport, ShopChartOfAccounts};
use domain_payroll::{EmployeeRole, PayrollRecord, PayrollStatus};
use interface_api::{config::ApiConfig, create_router, middleware::USER_HEADER, AppState};
use test_utils::{assert_rupiah, LedgerFixture, MoneyFixtures, TestEmployeeBuilder, TestSaleBuilder};

async fn server(fx: &LedgerFixture) -> TestServer {
    let state = AppState::build(fx.store.clone(), ApiConfig::default())
        .await
        .expect("standard chart resolves");
    TestServer::new(create_router(state)).expect("router serves")
}

fn user_header(user: UserId) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static(USER_HEADER),
        HeaderValue::from_str(&user.to_string()).expect("user id is a valid header"),
    )
}

/// Bare UUID form used in paths
fn path_id(id: impl Into<Uuid>) -> Uuid {
    id.into()
}

// ============================================================================
// Health Tests
// ============================================================================

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoints() {
        let fx = LedgerFixture::new().await;
        let server = server(&fx).await;

        server.get("/health").await.assert_status_ok();

        let ready = server.get("/health/ready").await;
        ready.assert_status_ok();
        let body: Value = ready.json();
        assert_eq!(body["status"], "ready");
        assert_eq!(body["store"]["adapter_id"], "memory-ledger");
    }
}

// ============================================================================
// Event Tests
// ============================================================================

mod event_tests {
    use super::*;

    #[tokio::test]
    async fn test_completed_sale_books_income_once() {
        let fx = LedgerFixture::new().await;
        let rice = fx.rice("BR-PW-5", 10).await;
        let server = server(&fx).await;
        let sale = TestSaleBuilder::new().with_amount(rice, MoneyFixtures::cash_sale()).build();

        let first = server
            .post("/api/v1/events/sales/completed")
            .json(&json!({ "sale": sale }))
            .await;
        let replay = server
            .post("/api/v1/events/sales/completed")
            .json(&json!({ "sale": sale }))
            .await;

        first.assert_status_ok();
        let first: EventOutcome = first.json();
        let replay: EventOutcome = replay.json();
        assert!(!first.already_recorded);
        assert_eq!(first.transactions.len(), 1);
        assert!(replay.already_recorded);
        assert!(replay.transactions.is_empty());
        assert_rupiah(fx.balance(ShopChartOfAccounts::CASH).await, 30_000);
    }

    #[tokio::test]
    async fn test_generic_route_accepts_tagged_events() {
        let fx = LedgerFixture::new().await;
        let rice = fx.rice("BR-PW-5", 10).await;
        let server = server(&fx).await;
        let sale = TestSaleBuilder::new().with_line(rice, 4).build();

        let response = server
            .post("/api/v1/events")
            .json(&json!({ "event": "sale_created", "sale": sale }))
            .await;

        response.assert_status_ok();
        let outcome: EventOutcome = response.json();
        assert_eq!(outcome.movements.len(), 1);
        assert_eq!(fx.stock_of(rice).await, 6);
    }

    #[tokio::test]
    async fn test_invalid_sale_lines_are_unprocessable() {
        let fx = LedgerFixture::new().await;
        let first = fx.rice("BR-PW-5", 50).await;
        let second = fx.rice("BR-MH-10", 50).await;
        let server = server(&fx).await;
        let mut negative = TestSaleBuilder::new().with_line(first, 10).with_line(second, 1).build();
        negative.lines[1].quantity = -5;
        let mut mistotalled = TestSaleBuilder::new().with_line(first, 2).build();
        mistotalled.total_amount = Money::from_rupiah(1);

        for (route, sale) in [
            ("/api/v1/events/sales/created", &negative),
            ("/api/v1/events/sales/completed", &negative),
            ("/api/v1/events/sales/completed", &mistotalled),
        ] {
            let response = server.post(route).json(&json!({ "sale": sale })).await;
            response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        }

        assert_eq!(fx.stock_of(first).await, 50);
        assert_eq!(fx.stock_of(second).await, 50);
        assert_rupiah(fx.balance(ShopChartOfAccounts::CASH).await, 0);
    }

    #[tokio::test]
    async fn test_oversell_is_conflict() {
        let fx = LedgerFixture::new().await;
        let rice = fx.rice("BR-PW-5", 2).await;
        let server = server(&fx).await;
        let sale = TestSaleBuilder::new().with_line(rice, 5).build();

        let response = server
            .post("/api/v1/events/sales/created")
            .json(&json!({ "sale": sale }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["error"], "conflict");
        assert_eq!(fx.stock_of(rice).await, 2);
    }

    #[tokio::test]
    async fn test_rejection_requires_reason() {
        let fx = LedgerFixture::new().await;
        let rice = fx.rice("BR-PW-5", 10).await;
        let server = server(&fx).await;
        let sale = TestSaleBuilder::new().with_line(rice, 1).online().build();

        let response = server
            .post("/api/v1/events/payments/rejected")
            .json(&json!({ "sale": sale, "reason": "" }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["error"], "validation_error");
        assert!(body["details"].as_array().is_some_and(|details| !details.is_empty()));
    }

    #[tokio::test]
    async fn test_malformed_user_header_is_bad_request() {
        let fx = LedgerFixture::new().await;
        let server = server(&fx).await;

        let response = server
            .post("/api/v1/products")
            .add_header(HeaderName::from_static(USER_HEADER), HeaderValue::from_static("kasir-1"))
            .json(&json!({
                "sku": "BR-PW-5",
                "name": "Beras Pandan Wangi",
                "cost_price": "12000",
                "sell_price": "15000"
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

// ============================================================================
// Stock Tests
// ============================================================================

mod stock_tests {
    use super::*;

    async fn register(server: &TestServer, opening_stock: i64) -> ProductId {
        let response = server
            .post("/api/v1/products")
            .json(&json!({
                "sku": "BR-ML-25",
                "name": "Beras Mentik Susu",
                "unit": "karung",
                "cost_price": "275000",
                "sell_price": "310000",
                "opening_stock": opening_stock
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        let product: Product = serde_json::from_value(body["product"].clone()).expect("product body");
        product.id
    }

    #[tokio::test]
    async fn test_register_and_adjust_product() {
        let fx = LedgerFixture::new().await;
        let server = server(&fx).await;
        let product = register(&server, 20).await;

        let damage = server
            .post(&format!("/api/v1/products/{}/movements", path_id(product)))
            .json(&json!({ "kind": "damage", "quantity": -2, "description": "Karung sobek" }))
            .await;
        damage.assert_status(StatusCode::CREATED);
        let damage: StockMovement = damage.json();
        assert_eq!(damage.stock_before, 20);
        assert_eq!(damage.stock_after, 18);

        let movements: Value = server
            .get(&format!("/api/v1/products/{}/movements", path_id(product)))
            .await
            .json();
        assert_eq!(movements["count"], 2);

        let verify: Value = server
            .get(&format!("/api/v1/products/{}/verify", path_id(product)))
            .await
            .json();
        assert_eq!(verify["intact"], true);
        assert_eq!(verify["stock"], 18);
    }

    #[tokio::test]
    async fn test_wrong_sign_for_kind_is_rejected() {
        let fx = LedgerFixture::new().await;
        let server = server(&fx).await;
        let product = register(&server, 5).await;

        let response = server
            .post(&format!("/api/v1/products/{}/movements", path_id(product)))
            .json(&json!({ "kind": "out", "quantity": 3, "description": "Salah input" }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(fx.stock_of(product).await, 5);
    }

    #[tokio::test]
    async fn test_negative_price_fails_validation() {
        let fx = LedgerFixture::new().await;
        let server = server(&fx).await;

        let response = server
            .post("/api/v1/products")
            .json(&json!({
                "sku": "BR-X",
                "name": "Beras",
                "cost_price": "-1",
                "sell_price": "15000"
            }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let fx = LedgerFixture::new().await;
        let server = server(&fx).await;

        let response = server.get(&format!("/api/v1/products/{}", path_id(ProductId::new()))).await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}

// ============================================================================
// Payroll Tests
// ============================================================================

mod payroll_tests {
    use super::*;

    #[tokio::test]
    async fn test_generate_approve_and_pay() {
        let fx = LedgerFixture::with_opening_balances(&[(ShopChartOfAccounts::CASH, MoneyFixtures::payroll_float())])
            .await;
        let server = server(&fx).await;
        let owner = UserId::new();
        let employees = [
            TestEmployeeBuilder::new(EmployeeRole::Cashier).build(),
            TestEmployeeBuilder::new(EmployeeRole::Driver).build(),
        ];

        let generated = server
            .post("/api/v1/payrolls/generate")
            .json(&json!({ "period": "2024-07", "employees": employees }))
            .await;
        generated.assert_status(StatusCode::CREATED);
        let generated: Value = generated.json();
        let created: Vec<PayrollRecord> =
            serde_json::from_value(generated["created"].clone()).expect("created records");
        assert_eq!(created.len(), 2);
        let record = &created[0];

        let (name, value) = user_header(owner);
        let premature = server
            .post(&format!("/api/v1/payrolls/{}/pay", path_id(record.id)))
            .add_header(name.clone(), value.clone())
            .await;
        premature.assert_status(StatusCode::CONFLICT);

        server
            .post(&format!("/api/v1/payrolls/{}/approve", path_id(record.id)))
            .add_header(name.clone(), value.clone())
            .await
            .assert_status_ok();

        let paid = server
            .post(&format!("/api/v1/payrolls/{}/pay", path_id(record.id)))
            .add_header(name, value)
            .await;
        paid.assert_status_ok();
        let outcome: EventOutcome = paid.json();
        let payroll = outcome.payroll.expect("paid record returned");
        assert_eq!(payroll.status, PayrollStatus::Paid);
        assert_eq!(
            fx.balance(ShopChartOfAccounts::CASH).await,
            MoneyFixtures::payroll_float() - record.net_salary
        );
    }

    #[tokio::test]
    async fn test_approval_requires_acting_user() {
        let fx = LedgerFixture::new().await;
        let server = server(&fx).await;
        let employees = [TestEmployeeBuilder::new(EmployeeRole::Warehouse).build()];
        let generated: Value = server
            .post("/api/v1/payrolls/generate")
            .json(&json!({ "period": "2024-08", "employees": employees }))
            .await
            .json();
        let id = generated["created"][0]["id"].as_str().expect("record id").to_string();

        let response = server.post(&format!("/api/v1/payrolls/{}/approve", id)).await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_filters_by_period() {
        let fx = LedgerFixture::new().await;
        let server = server(&fx).await;
        for period in ["2024-07", "2024-08"] {
            let employees = [TestEmployeeBuilder::new(EmployeeRole::Cashier).build()];
            server
                .post("/api/v1/payrolls/generate")
                .json(&json!({ "period": period, "employees": employees }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let listed: Value = server.get("/api/v1/payrolls?period=2024-08").await.json();

        assert_eq!(listed["count"], 1);
        assert_eq!(listed["items"][0]["period"], "2024-08");
    }
}

// ============================================================================
// Report Tests
// ============================================================================

mod report_tests {
    use super::*;

    #[tokio::test]
    async fn test_reversed_range_is_unprocessable() {
        let fx = LedgerFixture::new().await;
        let server = server(&fx).await;

        let response = server
            .get("/api/v1/reports/cash-flow?start=2024-07-31&end=2024-07-01")
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_zero_projection_horizon_is_unprocessable() {
        let fx = LedgerFixture::new().await;
        let server = server(&fx).await;

        let response = server.get("/api/v1/reports/analytics?year=2024&months=0").await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_report_endpoints_answer() {
        let fx = LedgerFixture::with_opening_balances(&[(ShopChartOfAccounts::CASH, Money::from_rupiah(100_000))])
            .await;
        let server = server(&fx).await;

        server.get("/api/v1/reports/cash-summary").await.assert_status_ok();
        server
            .get("/api/v1/reports/profit?start=2024-07-01&end=2024-07-31")
            .await
            .assert_status_ok();
        server
            .get("/api/v1/reports/dashboard?start=2024-07-01&end=2024-07-31")
            .await
            .assert_status_ok();
        server.get("/api/v1/reports/analytics?year=2024").await.assert_status_ok();
    }
}

// ============================================================================
// Account and Reconciliation Tests
// ============================================================================

mod account_tests {
    use super::*;

    #[tokio::test]
    async fn test_account_lookup_by_code() {
        let fx = LedgerFixture::new().await;
        let server = server(&fx).await;

        let found = server.get("/api/v1/accounts/1-1000").await;
        let missing = server.get("/api/v1/accounts/9-9999").await;

        found.assert_status_ok();
        let account: Account = found.json();
        assert_eq!(account.code, ShopChartOfAccounts::CASH);
        missing.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reconciliation_after_sale() {
        let fx = LedgerFixture::new().await;
        let rice = fx.rice("BR-PW-5", 10).await;
        let server = server(&fx).await;
        let sale = TestSaleBuilder::new().with_amount(rice, MoneyFixtures::cash_sale()).build();
        server
            .post("/api/v1/events/sales/completed")
            .json(&json!({ "sale": sale }))
            .await
            .assert_status_ok();

        let verified: ReconciliationReport = server.get("/api/v1/reconciliation").await.json();
        let recalculated = server.post("/api/v1/reconciliation").await;

        assert!(!verified.has_drift());
        recalculated.assert_status_ok();
    }
}
