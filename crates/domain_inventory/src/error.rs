//! Inventory domain errors

use thiserror::Error;

use core_kernel::ProductId;

use crate::movement::MovementKind;

/// Errors that can occur in the inventory domain
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InventoryError {
    /// Removing the requested quantity would drive stock below zero
    #[error("Insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product: ProductId,
        requested: i64,
        available: i64,
    },

    /// Quantity sign or magnitude does not fit the movement kind
    #[error("Invalid quantity {quantity} for {kind} movement")]
    InvalidQuantity {
        kind: MovementKind,
        quantity: i64,
    },

    /// Sale or purchase line with a zero or negative unit count
    #[error("Invalid line quantity {quantity} for {product}")]
    InvalidLine {
        product: ProductId,
        quantity: i64,
    },

    /// Product is inactive and cannot be sold
    #[error("Product is inactive: {0}")]
    ProductInactive(ProductId),

    /// Stock arithmetic overflowed
    #[error("Stock overflow for {0}")]
    Overflow(ProductId),
}

impl InventoryError {
    /// Returns true for shortage errors the caller may retry after restocking
    pub fn is_insufficient_stock(&self) -> bool {
        matches!(self, InventoryError::InsufficientStock { .. })
    }
}
