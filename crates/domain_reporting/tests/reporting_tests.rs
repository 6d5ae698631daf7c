//! Tests for domain_reporting

use chrono::{Datelike, Utc};

use core_kernel::{DateRange, Money, Timezone, UserId};
use domain_ledger::{FlowType, PaymentMethod, ShopChartOfAccounts, TransactionCategory};
use domain_payroll::EmployeeRole;
use domain_reporting::StatementService;
use test_utils::{
    assert_rupiah, LedgerFixture, MoneyFixtures, TemporalFixtures, TestEmployeeBuilder,
    TestPurchaseBuilder, TestSaleBuilder,
};

const CASH: &str = ShopChartOfAccounts::CASH;
const BANK: &str = ShopChartOfAccounts::BANK;
const INVENTORY: &str = ShopChartOfAccounts::INVENTORY;

fn today() -> chrono::NaiveDate {
    Timezone::default().business_date(Utc::now())
}

async fn trading_day() -> LedgerFixture {
    let fx = LedgerFixture::with_opening_balances(&[
        (CASH, Money::from_rupiah(1_000_000)),
        (INVENTORY, Money::from_rupiah(500_000)),
    ])
    .await;
    let rice = fx.rice("BR-PW-5", 100).await;
    let recorder = fx.recorder();

    let cash_sale = TestSaleBuilder::new()
        .with_invoice_number("INV-CASH")
        .with_costed_line(rice, 2, MoneyFixtures::rice_price(), MoneyFixtures::rice_cost())
        .build();
    recorder.record_sale(&cash_sale).await.unwrap();

    let debit_sale = TestSaleBuilder::new()
        .with_invoice_number("INV-DEBIT")
        .paid_with(PaymentMethod::Debit)
        .with_costed_line(rice, 1, MoneyFixtures::rice_price(), MoneyFixtures::rice_cost())
        .build();
    recorder.record_sale(&debit_sale).await.unwrap();

    let purchase = TestPurchaseBuilder::new().with_line(rice, 10).build();
    recorder.record_purchase(&purchase).await.unwrap();

    fx
}

fn statements(fx: &LedgerFixture) -> StatementService {
    StatementService::new(fx.ledger_store())
}

// ============================================================================
// Cash Flow Statement Tests
// ============================================================================

mod cash_flow_statement_tests {
    use super::*;

    #[tokio::test]
    async fn test_closing_balance_matches_liquid_accounts() {
        let fx = trading_day().await;

        let statement = statements(&fx)
            .cash_flow_statement(DateRange::day(today()))
            .await
            .unwrap();

        assert_rupiah(statement.opening_balance, 1_000_000);
        assert_rupiah(statement.total_inflow, 45_000);
        assert_rupiah(statement.total_outflow, 120_000);
        assert_eq!(
            statement.closing_balance,
            fx.balance(CASH).await + fx.balance(BANK).await
        );
    }

    #[tokio::test]
    async fn test_inventory_transfers_are_not_cash_movement() {
        let fx = trading_day().await;

        let statement = statements(&fx)
            .cash_flow_statement(DateRange::day(today()))
            .await
            .unwrap();

        let operating = statement.section(FlowType::Operating).unwrap();
        assert!(operating
            .categories
            .iter()
            .all(|line| line.category != TransactionCategory::CostOfGoods));
        let purchases = operating
            .categories
            .iter()
            .find(|line| line.category == TransactionCategory::Purchase)
            .unwrap();
        assert_eq!(purchases.count, 1);
    }

    #[tokio::test]
    async fn test_earlier_ranges_roll_into_opening() {
        let fx = trading_day().await;
        let tomorrow = today().succ_opt().unwrap();

        let statement = statements(&fx)
            .cash_flow_statement(DateRange::day(tomorrow))
            .await
            .unwrap();

        assert_rupiah(statement.opening_balance, 925_000);
        assert_eq!(statement.net_change, Money::ZERO);
        assert_eq!(statement.closing_balance, statement.opening_balance);
    }
}

// ============================================================================
// Profit and Cash Summary Tests
// ============================================================================

mod profit_tests {
    use super::*;

    #[tokio::test]
    async fn test_profit_is_revenue_minus_cost_of_goods() {
        let fx = trading_day().await;

        let summary = statements(&fx)
            .profit_summary(DateRange::day(today()))
            .await
            .unwrap();

        assert_rupiah(summary.revenue, 45_000);
        assert_eq!(summary.sales_count, 2);
        assert_rupiah(summary.operating_expenses, 36_000);
        assert_rupiah(summary.net_profit, 9_000);
        assert!(summary
            .expenses
            .iter()
            .all(|line| line.category != TransactionCategory::Purchase));
    }

    #[tokio::test]
    async fn test_reversed_payroll_nets_out_of_expenses() {
        let fx = LedgerFixture::with_opening_balances(&[(CASH, MoneyFixtures::payroll_float())]).await;
        let payroll = fx.payroll();
        let owner = UserId::new();
        let employee = TestEmployeeBuilder::new(EmployeeRole::Cashier).build();
        let report = payroll
            .generate(TemporalFixtures::payroll_period(), &[employee], None)
            .await
            .unwrap();
        let id = report.created[0].id;
        payroll.approve(id, owner).await.unwrap();
        payroll.process_payment(id, None, owner).await.unwrap();

        let paid = statements(&fx).profit_summary(DateRange::day(today())).await.unwrap();
        assert!(paid.operating_expenses.is_positive());
        assert_eq!(paid.net_profit, -paid.operating_expenses);

        payroll.reverse_payroll_payment(id, "duplicate transfer", owner).await.unwrap();
        let reversed = statements(&fx).profit_summary(DateRange::day(today())).await.unwrap();
        assert_eq!(reversed.operating_expenses, Money::ZERO);
    }

    #[tokio::test]
    async fn test_cash_summary_reports_todays_movement() {
        let fx = trading_day().await;

        let summary = statements(&fx).cash_summary_at(Utc::now()).await.unwrap();

        assert_rupiah(summary.cash_balance, 910_000);
        assert_rupiah(summary.bank_balance, 15_000);
        assert_rupiah(summary.total_liquid, 925_000);
        assert_rupiah(summary.today_inflow, 45_000);
        assert_rupiah(summary.today_outflow, 120_000);
        assert_eq!(summary.accounts.len(), 2);
    }
}

// ============================================================================
// Analytics and Dashboard Tests
// ============================================================================

mod analytics_tests {
    use super::*;

    #[tokio::test]
    async fn test_current_month_bucket_holds_todays_flows() {
        let fx = trading_day().await;
        let today = today();

        let analytics = statements(&fx)
            .analytics_as_of(today.year(), 3, today)
            .await
            .unwrap();

        let bucket = &analytics.monthly[today.month0() as usize];
        assert_rupiah(bucket.inflow, 45_000);
        assert_rupiah(bucket.outflow, 120_000);
        assert_eq!(analytics.net, bucket.net);
        assert_eq!(analytics.projections.len(), 3);
        assert!(analytics.projections.iter().all(|p| p.confidence == 0));
        assert_eq!(bucket.trend, None);
    }

    #[tokio::test]
    async fn test_dashboard_counts_pending_income() {
        let fx = trading_day().await;
        let rice = fx.rice("BR-MH-10", 20).await;
        let online = TestSaleBuilder::new()
            .with_invoice_number("INV-ONLINE")
            .paid_with(PaymentMethod::Transfer)
            .online()
            .with_line(rice, 2)
            .build();
        fx.recorder().record_sale(&online).await.unwrap();

        let dashboard = statements(&fx)
            .dashboard_at(DateRange::day(today()), Utc::now())
            .await
            .unwrap();

        assert_eq!(dashboard.pending_income_count, 1);
        assert_rupiah(dashboard.pending_income, 30_000);
        assert_eq!(dashboard.daily.len(), 1);
        assert_rupiah(dashboard.profit.revenue, 45_000);
        assert!(dashboard.top_expenses.len() <= domain_reporting::dashboard::TOP_EXPENSES);
        assert_eq!(dashboard.cash.total_liquid, dashboard.cash_flow.closing_balance);
    }
}
