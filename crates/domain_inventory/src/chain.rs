//! Audit chain verification

use serde::Serialize;
use thiserror::Error;

use core_kernel::{ProductId, StockMovementId};

use crate::movement::StockMovement;

/// A break in a product's movement chain
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ChainViolation {
    #[error("Movement {movement} does not satisfy stock_after = stock_before + quantity")]
    Arithmetic { movement: StockMovementId },

    #[error("Movement {movement} leaves negative stock {stock_after}")]
    Negative { movement: StockMovementId, stock_after: i64 },

    #[error("Movement {movement} starts at {stock_before} but previous ended at {previous_after}")]
    Gap {
        movement: StockMovementId,
        previous_after: i64,
        stock_before: i64,
    },

    #[error("Movement {movement} belongs to {found}, expected {expected}")]
    ForeignProduct {
        movement: StockMovementId,
        expected: ProductId,
        found: ProductId,
    },
}

/// Verifies the ordered movements of one product
///
/// Each record must satisfy its own arithmetic, never end below zero, and
/// start where the previous one ended.
pub fn verify_chain(movements: &[StockMovement]) -> Result<(), ChainViolation> {
    let Some(first) = movements.first() else {
        return Ok(());
    };
    let product = first.product_id;
    let mut previous_after: Option<i64> = None;

    for movement in movements {
        if movement.product_id != product {
            return Err(ChainViolation::ForeignProduct {
                movement: movement.id,
                expected: product,
                found: movement.product_id,
            });
        }
        if movement.stock_before.checked_add(movement.quantity) != Some(movement.stock_after) {
            return Err(ChainViolation::Arithmetic { movement: movement.id });
        }
        if movement.stock_after < 0 {
            return Err(ChainViolation::Negative {
                movement: movement.id,
                stock_after: movement.stock_after,
            });
        }
        if let Some(previous_after) = previous_after {
            if previous_after != movement.stock_before {
                return Err(ChainViolation::Gap {
                    movement: movement.id,
                    previous_after,
                    stock_before: movement.stock_before,
                });
            }
        }
        previous_after = Some(movement.stock_after);
    }

    Ok(())
}
