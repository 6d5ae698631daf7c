//! Tests for domain_inventory

use proptest::prelude::*;

use core_kernel::{Money, SaleId, SourceRef, UserId};

use domain_inventory::{
    plan_line_edit, plan_restore, verify_chain, ChainViolation, InventoryError, LineQuantity,
    MovementKind, MovementRequest, Product, StockMovement,
};

fn rice(stock: i64) -> Product {
    Product::new("BR-RM-25", "Beras Rojolele 25kg", Money::from_rupiah(280_000), Money::from_rupiah(320_000))
        .with_unit("karung")
        .with_stock(stock)
}

fn apply_plan(product: &mut Product, old: &[LineQuantity], new: &[LineQuantity]) -> Vec<StockMovement> {
    plan_line_edit(old, new)
        .unwrap()
        .into_iter()
        .map(|step| {
            product
                .apply(MovementRequest::new(step.kind, step.quantity, "sale edit"))
                .unwrap()
        })
        .collect()
}

// ============================================================================
// Movement Tests
// ============================================================================

mod movement_tests {
    use super::*;

    #[test]
    fn test_movement_carries_user_and_source() {
        let mut product = rice(10);
        let sale = SaleId::new();
        let cashier = UserId::new();

        let movement = product
            .apply(
                MovementRequest::sale_out(2, "Sale INV-001")
                    .by(Some(cashier))
                    .with_source(SourceRef::sale(sale)),
            )
            .unwrap();

        assert_eq!(movement.user_id, Some(cashier));
        assert_eq!(movement.source(), Some(&SourceRef::sale(sale)));
        assert_eq!(movement.kind, MovementKind::Out);
    }

    #[test]
    fn test_damage_write_off_reduces_stock() {
        let mut product = rice(10);
        let movement = product
            .apply(MovementRequest::new(MovementKind::Damage, -3, "Sacks soaked by leak").with_reason("roof leak"))
            .unwrap();

        assert_eq!(movement.stock_after, 7);
        assert_eq!(movement.metadata.reason.as_deref(), Some("roof leak"));
    }

    #[test]
    fn test_wrong_sign_is_rejected() {
        let mut product = rice(10);
        let err = product
            .apply(MovementRequest::new(MovementKind::In, -1, "bad intake"))
            .unwrap_err();

        assert_eq!(err, InventoryError::InvalidQuantity { kind: MovementKind::In, quantity: -1 });
        assert_eq!(product.stock, 10);
    }

    #[test]
    fn test_adjustment_below_zero_is_insufficient_stock() {
        let mut product = rice(2);
        let err = product
            .apply(MovementRequest::new(MovementKind::Adjustment, -5, "stock take"))
            .unwrap_err();

        assert!(err.is_insufficient_stock());
    }

    #[test]
    fn test_metadata_serializes_compactly() {
        let mut product = rice(1);
        let movement = product.apply(MovementRequest::intake(4, "purchase")).unwrap();
        let json = serde_json::to_value(&movement.metadata).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}

// ============================================================================
// Edit Protocol Tests
// ============================================================================

mod edit_protocol_tests {
    use super::*;

    #[test]
    fn test_edit_five_to_three_writes_return_then_out() {
        let mut product = rice(100);
        let id = product.id;
        product.apply(MovementRequest::sale_out(5, "Sale INV-002")).unwrap();

        let movements = apply_plan(
            &mut product,
            &[LineQuantity::new(id, 5)],
            &[LineQuantity::new(id, 3)],
        );

        assert_eq!(movements.len(), 2);

        assert_eq!(movements[0].kind, MovementKind::Return);
        assert_eq!(movements[0].quantity, 5);
        assert_eq!(movements[0].stock_before, 95);
        assert_eq!(movements[0].stock_after, 100);

        assert_eq!(movements[1].kind, MovementKind::Out);
        assert_eq!(movements[1].quantity, -3);
        assert_eq!(movements[1].stock_before, 100);
        assert_eq!(movements[1].stock_after, 97);

        assert_eq!(product.stock, 97);
        assert!(verify_chain(&movements).is_ok());
    }

    #[test]
    fn test_edit_to_same_quantity_succeeds_at_zero_stock() {
        // Every unit is already on the sale; returning first frees them again
        let mut product = rice(0);
        let id = product.id;

        let movements = apply_plan(
            &mut product,
            &[LineQuantity::new(id, 4)],
            &[LineQuantity::new(id, 4)],
        );

        assert_eq!(movements.len(), 2);
        assert_eq!(product.stock, 0);
    }

    #[test]
    fn test_restore_plan_round_trips_reduction() {
        let mut product = rice(20);
        let id = product.id;
        let lines = [LineQuantity::new(id, 7)];

        product.apply(MovementRequest::sale_out(7, "sale")).unwrap();
        for step in plan_restore(&lines).unwrap() {
            product
                .apply(MovementRequest::new(step.kind, step.quantity, "sale deleted"))
                .unwrap();
        }

        assert_eq!(product.stock, 20);
    }

    #[test]
    fn test_edit_with_negative_line_plans_nothing() {
        let product = rice(50);
        let id = product.id;
        let other = rice(50).id;

        let err = plan_line_edit(
            &[LineQuantity::new(id, 2)],
            &[LineQuantity::new(id, 10), LineQuantity::new(other, -5)],
        )
        .unwrap_err();

        assert_eq!(err, InventoryError::InvalidLine { product: other, quantity: -5 });
        assert_eq!(product.stock, 50);
    }
}

// ============================================================================
// Chain Verification Tests
// ============================================================================

mod chain_tests {
    use super::*;

    #[test]
    fn test_empty_chain_is_valid() {
        assert!(verify_chain(&[]).is_ok());
    }

    #[test]
    fn test_gap_is_detected() {
        let mut product = rice(10);
        let first = product.apply(MovementRequest::sale_out(1, "a")).unwrap();
        product.stock += 5; // stock changed outside the ledger
        let second = product.apply(MovementRequest::sale_out(1, "b")).unwrap();

        assert!(matches!(
            verify_chain(&[first, second]),
            Err(ChainViolation::Gap { previous_after: 9, stock_before: 14, .. })
        ));
    }

    #[test]
    fn test_foreign_product_is_detected() {
        let mut a = rice(10);
        let mut b = rice(10);
        let first = a.apply(MovementRequest::sale_out(1, "a")).unwrap();
        let second = b.apply(MovementRequest::sale_out(1, "b")).unwrap();

        assert!(matches!(
            verify_chain(&[first, second]),
            Err(ChainViolation::ForeignProduct { .. })
        ));
    }

    #[test]
    fn test_tampered_arithmetic_is_detected() {
        let mut product = rice(10);
        let mut movement = product.apply(MovementRequest::sale_out(1, "a")).unwrap();
        movement.stock_after = 8;

        assert!(matches!(verify_chain(&[movement]), Err(ChainViolation::Arithmetic { .. })));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

fn movement_strategy() -> impl Strategy<Value = MovementRequest> {
    prop_oneof![
        (1i64..50).prop_map(|q| MovementRequest::intake(q, "in")),
        (1i64..50).prop_map(|q| MovementRequest::sale_out(q, "out")),
        (1i64..50).prop_map(|q| MovementRequest::returned(q, "return")),
        (1i64..20).prop_map(|q| MovementRequest::new(MovementKind::Damage, -q, "damage")),
        (-30i64..30)
            .prop_filter("non-zero", |q| *q != 0)
            .prop_map(|q| MovementRequest::new(MovementKind::Adjustment, q, "adjustment")),
    ]
}

proptest! {
    #[test]
    fn prop_chain_never_breaks_or_goes_negative(
        initial in 0i64..100,
        requests in proptest::collection::vec(movement_strategy(), 0..60)
    ) {
        let mut product = rice(0);
        let mut movements = Vec::new();
        if initial > 0 {
            movements.push(
                product.apply(MovementRequest::new(MovementKind::Initial, initial, "opening")).unwrap()
            );
        }

        for request in requests {
            let before = product.stock;
            match product.apply(request) {
                Ok(movement) => movements.push(movement),
                Err(err) => {
                    prop_assert!(err.is_insufficient_stock());
                    prop_assert_eq!(product.stock, before);
                }
            }
        }

        prop_assert!(verify_chain(&movements).is_ok());
        prop_assert!(product.stock >= 0);
        let last = movements.last().map(|m| m.stock_after).unwrap_or(0);
        prop_assert_eq!(last, product.stock);
    }

    #[test]
    fn prop_edit_net_effect_matches_delta(
        stock in 0i64..200,
        old in 1i64..50,
        new in 1i64..50
    ) {
        // The old quantity is already out of stock, so stock >= 0 is the only precondition
        let mut product = rice(stock);
        let id = product.id;
        let plan = plan_line_edit(&[LineQuantity::new(id, old)], &[LineQuantity::new(id, new)]).unwrap();

        let mut ok = true;
        for step in plan {
            if product.apply(MovementRequest::new(step.kind, step.quantity, "edit")).is_err() {
                ok = false;
                break;
            }
        }

        if stock + old >= new {
            prop_assert!(ok);
            prop_assert_eq!(product.stock, stock + old - new);
        } else {
            prop_assert!(!ok);
        }
    }
}
