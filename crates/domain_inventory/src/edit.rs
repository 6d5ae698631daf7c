//! Movement plans for sale-driven stock changes
//!
//! A sale edit never books the net delta. All old quantities are returned
//! first, then all new quantities are booked out, so the audit chain shows
//! exactly what was reversed and what was newly sold. Returning first also
//! means an edit that keeps the same quantity can never fail for lack of stock.

use serde::{Deserialize, Serialize};

use core_kernel::ProductId;

use crate::error::InventoryError;
use crate::movement::MovementKind;

/// Quantity of one product on a sale or purchase line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineQuantity {
    pub product_id: ProductId,
    /// Unsigned number of units on the line
    pub quantity: i64,
}

impl LineQuantity {
    pub fn new(product_id: ProductId, quantity: i64) -> Self {
        Self { product_id, quantity }
    }
}

/// One movement to be applied, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedMovement {
    pub product_id: ProductId,
    pub kind: MovementKind,
    /// Signed quantity
    pub quantity: i64,
}

/// Rejects any line whose quantity is not a positive unit count
pub fn validate_lines(lines: &[LineQuantity]) -> Result<(), InventoryError> {
    match lines.iter().find(|line| line.quantity <= 0) {
        Some(line) => Err(InventoryError::InvalidLine {
            product: line.product_id,
            quantity: line.quantity,
        }),
        None => Ok(()),
    }
}

fn plan(lines: &[LineQuantity], kind: MovementKind) -> Result<Vec<PlannedMovement>, InventoryError> {
    validate_lines(lines)?;
    Ok(lines
        .iter()
        .map(|line| PlannedMovement {
            product_id: line.product_id,
            kind,
            quantity: if kind == MovementKind::Out { -line.quantity } else { line.quantity },
        })
        .collect())
}

/// `out` movements for every line (sale creation)
pub fn plan_reduce(lines: &[LineQuantity]) -> Result<Vec<PlannedMovement>, InventoryError> {
    plan(lines, MovementKind::Out)
}

/// `return` movements for every line (sale deletion, payment rejection)
pub fn plan_restore(lines: &[LineQuantity]) -> Result<Vec<PlannedMovement>, InventoryError> {
    plan(lines, MovementKind::Return)
}

/// `in` movements for every line (purchase intake)
pub fn plan_intake(lines: &[LineQuantity]) -> Result<Vec<PlannedMovement>, InventoryError> {
    plan(lines, MovementKind::In)
}

/// Two-step edit plan: returns for the old lines, then outs for the new lines.
/// Both line sets are checked before anything is planned.
pub fn plan_line_edit(
    old_lines: &[LineQuantity],
    new_lines: &[LineQuantity],
) -> Result<Vec<PlannedMovement>, InventoryError> {
    validate_lines(new_lines)?;
    let mut steps = plan_restore(old_lines)?;
    steps.extend(plan_reduce(new_lines)?);
    Ok(steps)
}
