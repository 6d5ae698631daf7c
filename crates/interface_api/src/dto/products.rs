//! Product and stock movement DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::Money;
use domain_inventory::{MovementKind, Product, StockMovement};

use super::non_negative;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterProductRequest {
    #[validate(length(min = 1, max = 64))]
    pub sku: String,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    /// Defaults to kilograms
    #[validate(length(min = 1, max = 16))]
    pub unit: Option<String>,
    #[validate(custom(function = "non_negative"))]
    pub cost_price: Money,
    #[validate(custom(function = "non_negative"))]
    pub sell_price: Money,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub opening_stock: i64,
}

impl RegisterProductRequest {
    pub fn to_product(&self) -> Product {
        let mut product = Product::new(&self.sku, &self.name, self.cost_price, self.sell_price);
        if let Some(unit) = &self.unit {
            product.unit = unit.clone();
        }
        product
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterProductResponse {
    pub product: Product,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_movement: Option<StockMovement>,
}

/// A manual stock movement
///
/// `quantity` is signed: stock-takes and corrections may go either way,
/// damage write-offs are negative.
#[derive(Debug, Deserialize, Validate)]
pub struct RecordMovementRequest {
    pub kind: MovementKind,
    pub quantity: i64,
    #[validate(length(min = 1, max = 500))]
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct ChainVerificationResponse {
    pub product_id: core_kernel::ProductId,
    pub stock: i64,
    pub movements: usize,
    pub intact: bool,
}
