//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for ledger types that give
//! more meaningful error messages than standard assertions.

use core_kernel::Money;
use domain_inventory::{verify_chain, MovementKind, StockMovement};
use domain_ledger::{CashFlow, FlowDirection, ReconciliationReport, TransactionCategory};

/// Asserts that a Money value equals a whole rupiah amount
pub fn assert_rupiah(actual: Money, expected: i64) {
    assert_eq!(
        actual,
        Money::from_rupiah(expected),
        "Expected {}, got {}",
        Money::from_rupiah(expected),
        actual
    );
}

/// Asserts the shape of one cash flow
pub fn assert_cash_flow(
    flow: &CashFlow,
    direction: FlowDirection,
    category: TransactionCategory,
    amount: Money,
    running_balance: Money,
) {
    assert_eq!(flow.direction, direction, "direction of {:?}", flow.id);
    assert_eq!(flow.category, category, "category of {:?}", flow.id);
    assert_eq!(flow.amount, amount, "amount of {:?}", flow.id);
    assert_eq!(flow.running_balance, running_balance, "running balance of {:?}", flow.id);
}

/// Asserts one stock movement's kind, signed quantity and snapshots
pub fn assert_movement(movement: &StockMovement, kind: MovementKind, quantity: i64, before: i64, after: i64) {
    assert_eq!(movement.kind, kind, "kind of movement {:?}", movement.id);
    assert_eq!(movement.quantity, quantity, "quantity of movement {:?}", movement.id);
    assert_eq!(movement.stock_before, before, "stock_before of movement {:?}", movement.id);
    assert_eq!(movement.stock_after, after, "stock_after of movement {:?}", movement.id);
}

/// Asserts that a product's movement history forms an unbroken chain
pub fn assert_chain_intact(movements: &[StockMovement]) {
    if let Err(violation) = verify_chain(movements) {
        panic!("Stock audit chain broken: {}", violation);
    }
}

/// Asserts that a reconciliation report found no drift
pub fn assert_reconciled(report: &ReconciliationReport) {
    let drifted: Vec<String> = report
        .drifted()
        .map(|line| format!("{} drift {}", line.code, line.drift))
        .collect();
    assert!(drifted.is_empty(), "Accounts drifted: {}", drifted.join(", "));
}

/// Asserts that a Result is Err and its message contains the given text
#[macro_export]
macro_rules! assert_err_contains {
    ($result:expr, $text:expr) => {
        match $result {
            Ok(value) => panic!("Expected error containing {:?}, got Ok({:?})", $text, value),
            Err(err) => {
                let message = err.to_string();
                assert!(
                    message.contains($text),
                    "Expected error containing {:?}, got {:?}",
                    $text,
                    message
                );
            }
        }
    };
}
