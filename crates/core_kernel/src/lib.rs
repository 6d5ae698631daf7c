//! Core Kernel - Foundational types shared by every ledger crate
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Rupiah money type with precise decimal arithmetic
//! - Business calendar types (date ranges, payroll months, shop timezone)
//! - Strongly-typed identifiers and the polymorphic source reference
//! - Port scaffolding shared by storage adapters

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod reference;
pub mod ports;
pub mod error;

pub use money::{Money, MoneyError, Rate};
pub use temporal::{DateRange, PayrollPeriod, TemporalError, Timezone};
pub use identifiers::{
    AccountId, CashFlowId, PayrollId, ProductId, PurchaseId, SaleId, StockMovementId,
    TransactionId, UserId,
};
pub use reference::{SourceKind, SourceRef};
pub use ports::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};
pub use error::CoreError;
