//! Request handlers

pub mod health;
pub mod events;
pub mod reports;
pub mod accounts;
pub mod products;
pub mod reconciliation;
pub mod payroll;
