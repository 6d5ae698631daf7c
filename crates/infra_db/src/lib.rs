//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the ledger using SQLx.
//!
//! # Architecture
//!
//! [`PostgresLedgerStore`] implements the `LedgerStore` port from
//! `domain_ledger`. Each unit of work is one database transaction, and the
//! row locks it takes are what keep balances, stock and payroll status
//! consistent when events for the same rows arrive concurrently.
//!
//! Monetary columns are `NUMERIC(20, 2)`. Enumerations are stored as text
//! and checked by the schema. The audit trail of a transaction, the context
//! of a stock movement and the full payroll record are kept as JSONB.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, DatabaseConfig, PostgresLedgerStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/ledger")).await?;
//! let store = PostgresLedgerStore::new(pool);
//! ```

pub mod pool;
pub mod error;
mod rows;
pub mod store;

pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
pub use error::DatabaseError;
pub use store::{PgUnitOfWork, PostgresLedgerStore};
