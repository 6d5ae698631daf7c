//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random ledger data that
//! respects domain sign and range rules.

use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::Money;
use domain_ledger::FlowDirection;

/// Strategy for positive Money values with sen precision
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    (1i64..10_000_000_000i64).prop_map(|sen| Money::new(Decimal::new(sen, 2)))
}

/// Strategy for a single flow direction
pub fn direction_strategy() -> impl Strategy<Value = FlowDirection> {
    prop_oneof![Just(FlowDirection::Inflow), Just(FlowDirection::Outflow)]
}

/// Strategy for a stream of signed balance adjustments
pub fn adjustment_strategy() -> impl Strategy<Value = Vec<(FlowDirection, Money)>> {
    prop::collection::vec((direction_strategy(), positive_money_strategy()), 0..40)
}
