//! Stock movements

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use core_kernel::{ProductId, SourceRef, StockMovementId, UserId};

use crate::error::InventoryError;

/// Kinds of stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Goods received (purchase intake)
    In,
    /// Goods sold
    Out,
    /// Goods returned to stock (sale deletion, rejection, edit reversal)
    Return,
    /// Manual stock-take adjustment
    Adjustment,
    /// Spoiled or damaged goods written off
    Damage,
    /// Correction of an earlier recording error
    Correction,
    /// Opening stock
    Initial,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::In => "in",
            MovementKind::Out => "out",
            MovementKind::Return => "return",
            MovementKind::Adjustment => "adjustment",
            MovementKind::Damage => "damage",
            MovementKind::Correction => "correction",
            MovementKind::Initial => "initial",
        }
    }

    /// Checks the signed quantity against this kind's sign rule
    ///
    /// `in`, `return` and `initial` must add stock; `out` and `damage` must
    /// remove it; `adjustment` and `correction` may go either way but never be zero.
    pub fn validate_quantity(&self, quantity: i64) -> Result<(), InventoryError> {
        let valid = match self {
            MovementKind::In | MovementKind::Return | MovementKind::Initial => quantity > 0,
            MovementKind::Out | MovementKind::Damage => quantity < 0,
            MovementKind::Adjustment | MovementKind::Correction => quantity != 0,
        };
        if valid {
            Ok(())
        } else {
            Err(InventoryError::InvalidQuantity { kind: *self, quantity })
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(MovementKind::In),
            "out" => Ok(MovementKind::Out),
            "return" => Ok(MovementKind::Return),
            "adjustment" => Ok(MovementKind::Adjustment),
            "damage" => Ok(MovementKind::Damage),
            "correction" => Ok(MovementKind::Correction),
            "initial" => Ok(MovementKind::Initial),
            other => Err(format!("unknown movement kind: {}", other)),
        }
    }
}

/// Structured metadata attached to a movement
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementContext {
    /// Business record that caused the movement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceRef>,
    /// Groups the return/out pair written by one sale edit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_batch: Option<Uuid>,
    /// Free-text reason (rejection reason, stock-take note)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A request to move stock, before it is applied to a product
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementRequest {
    pub kind: MovementKind,
    /// Signed quantity: positive adds to stock, negative removes
    pub quantity: i64,
    pub description: String,
    pub user_id: Option<UserId>,
    pub context: MovementContext,
}

impl MovementRequest {
    pub fn new(kind: MovementKind, quantity: i64, description: impl Into<String>) -> Self {
        Self {
            kind,
            quantity,
            description: description.into(),
            user_id: None,
            context: MovementContext::default(),
        }
    }

    /// Goods sold: removes `quantity` units
    pub fn sale_out(quantity: i64, description: impl Into<String>) -> Self {
        Self::new(MovementKind::Out, -quantity, description)
    }

    /// Goods back on the shelf: adds `quantity` units
    pub fn returned(quantity: i64, description: impl Into<String>) -> Self {
        Self::new(MovementKind::Return, quantity, description)
    }

    /// Goods received: adds `quantity` units
    pub fn intake(quantity: i64, description: impl Into<String>) -> Self {
        Self::new(MovementKind::In, quantity, description)
    }

    pub fn by(mut self, user_id: Option<UserId>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_source(mut self, source: SourceRef) -> Self {
        self.context.source = Some(source);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.context.reason = Some(reason.into());
        self
    }
}

/// An immutable stock movement record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: StockMovementId,
    pub product_id: ProductId,
    pub kind: MovementKind,
    /// Signed quantity applied
    pub quantity: i64,
    pub stock_before: i64,
    pub stock_after: i64,
    pub description: String,
    pub user_id: Option<UserId>,
    pub metadata: MovementContext,
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    /// True when the record's own arithmetic holds
    pub fn is_consistent(&self) -> bool {
        self.stock_before.checked_add(self.quantity) == Some(self.stock_after)
            && self.stock_after >= 0
    }

    pub fn source(&self) -> Option<&SourceRef> {
        self.metadata.source.as_ref()
    }
}
