//! Inventory Domain - Stock Ledger rules
//!
//! Every change to a product's quantity-on-hand is captured as an immutable
//! [`StockMovement`] carrying `stock_before` and `stock_after` snapshots, so the
//! movements of one product form an unbroken audit chain:
//!
//! ```text
//! initial +100   0 → 100
//! out      -5  100 →  95
//! return   +5   95 → 100   (sale edit, old quantity restored)
//! out      -3  100 →  97   (sale edit, new quantity booked)
//! ```
//!
//! This crate holds the pure rules: sign conventions per movement kind, the
//! never-below-zero guard, the two-step edit plan and chain verification.
//! Locking and persistence live with the ledger store.

pub mod product;
pub mod movement;
pub mod edit;
pub mod chain;
pub mod error;

pub use product::Product;
pub use movement::{MovementContext, MovementKind, MovementRequest, StockMovement};
pub use edit::{
    plan_intake, plan_line_edit, plan_reduce, plan_restore, validate_lines, LineQuantity, PlannedMovement,
};
pub use chain::{verify_chain, ChainViolation};
pub use error::InventoryError;
