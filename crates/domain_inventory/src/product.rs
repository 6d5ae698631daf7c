//! Product with live quantity-on-hand

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use core_kernel::{Money, ProductId, StockMovementId};

use crate::error::InventoryError;
use crate::movement::{MovementKind, MovementRequest, StockMovement};

/// A stocked product (rice sack, bulk kilogram line)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    /// Unit of sale, e.g. "kg" or "karung"
    pub unit: String,
    /// Live quantity-on-hand
    pub stock: i64,
    /// Cost basis per unit, used for cost-of-goods booking
    pub cost_price: Money,
    pub sell_price: Money,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new active product with zero stock
    pub fn new(sku: impl Into<String>, name: impl Into<String>, cost_price: Money, sell_price: Money) -> Self {
        Self {
            id: ProductId::new_v7(),
            sku: sku.into(),
            name: name.into(),
            unit: "kg".to_string(),
            stock: 0,
            cost_price,
            sell_price,
            is_active: true,
            updated_at: Utc::now(),
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_stock(mut self, stock: i64) -> Self {
        self.stock = stock;
        self
    }

    /// Cost basis of `quantity` units
    pub fn cost_of(&self, quantity: i64) -> Money {
        self.cost_price.multiply(Decimal::from(quantity))
    }

    /// Applies a movement to the live stock and returns the movement record
    ///
    /// The caller must hold the product's row lock. The product is left
    /// untouched when the movement is rejected.
    pub fn apply(&mut self, request: MovementRequest) -> Result<StockMovement, InventoryError> {
        request.kind.validate_quantity(request.quantity)?;

        if request.kind == MovementKind::Out && !self.is_active {
            return Err(InventoryError::ProductInactive(self.id));
        }

        let stock_before = self.stock;
        let stock_after = stock_before
            .checked_add(request.quantity)
            .ok_or(InventoryError::Overflow(self.id))?;

        if stock_after < 0 {
            return Err(InventoryError::InsufficientStock {
                product: self.id,
                requested: -request.quantity,
                available: stock_before,
            });
        }

        let now = Utc::now();
        self.stock = stock_after;
        self.updated_at = now;

        debug!(
            product = %self.id,
            kind = %request.kind,
            quantity = request.quantity,
            stock_before,
            stock_after,
            "Stock movement applied"
        );

        Ok(StockMovement {
            id: StockMovementId::new_v7(),
            product_id: self.id,
            kind: request.kind,
            quantity: request.quantity,
            stock_before,
            stock_after,
            description: request.description,
            user_id: request.user_id,
            metadata: request.context,
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64) -> Product {
        Product::new("BR-PW-5", "Beras Pandan Wangi 5kg", Money::from_rupiah(60_000), Money::from_rupiah(75_000))
            .with_stock(stock)
    }

    #[test]
    fn test_apply_out_records_snapshots() {
        let mut p = product(10);
        let movement = p.apply(MovementRequest::sale_out(4, "sale")).unwrap();
        assert_eq!(movement.stock_before, 10);
        assert_eq!(movement.stock_after, 6);
        assert_eq!(movement.quantity, -4);
        assert_eq!(p.stock, 6);
        assert!(movement.is_consistent());
    }

    #[test]
    fn test_apply_rejects_overdraw_and_leaves_stock() {
        let mut p = product(3);
        let err = p.apply(MovementRequest::sale_out(4, "sale")).unwrap_err();
        assert_eq!(
            err,
            InventoryError::InsufficientStock { product: p.id, requested: 4, available: 3 }
        );
        assert_eq!(p.stock, 3);
    }

    #[test]
    fn test_inactive_product_cannot_be_sold_but_can_be_restocked() {
        let mut p = product(5);
        p.is_active = false;
        assert!(matches!(
            p.apply(MovementRequest::sale_out(1, "sale")),
            Err(InventoryError::ProductInactive(_))
        ));
        assert!(p.apply(MovementRequest::returned(1, "return")).is_ok());
    }

    #[test]
    fn test_cost_of() {
        let p = product(0);
        assert_eq!(p.cost_of(3), Money::from_rupiah(180_000));
    }
}
