//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! ledger test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data and a seeded in-memory ledger
//! - `builders`: Builder patterns for sales, purchases and employees
//! - `database`: Database test helpers and container management
//! - `assertions`: Custom assertion helpers for ledger types
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
