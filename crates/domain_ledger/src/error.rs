//! Ledger domain errors

use thiserror::Error;

use core_kernel::{MoneyError, PortError, SaleId};
use domain_inventory::{ChainViolation, InventoryError};
use domain_payroll::PayrollError;

use crate::payment::PaymentMethod;

/// Error taxonomy the outer layers dispatch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or inactive account mapping, never defaulted
    Configuration,
    /// Insufficient stock or balance; retry after correcting the condition
    InsufficientResource,
    /// Business-rule violation such as paying an unapproved payroll
    StatePrecondition,
    /// Malformed input
    Validation,
    NotFound,
    Storage,
}

/// Errors that can occur in the ledger domain
#[derive(Debug, Error)]
pub enum LedgerError {
    /// No account matches the configured selection
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// The mapped account for a payment method is missing
    #[error("Account not found for payment method {0}")]
    NoAccountForMethod(PaymentMethod),

    /// Account exists but is disabled
    #[error("Account is inactive: {0}")]
    AccountInactive(String),

    /// Balance cannot cover a debit on a non-overdraft account
    #[error("Insufficient balance in account {account}: requested {requested}, available {available}")]
    InsufficientBalance {
        account: String,
        requested: String,
        available: String,
    },

    /// Sale can no longer be edited or deleted
    #[error("Sale {sale} cannot be changed: {reason}")]
    SaleLocked { sale: SaleId, reason: String },

    /// Transaction status change is not allowed
    #[error("Invalid transaction status transition for {code} from {from} to {to}")]
    InvalidTransactionState { code: String, from: String, to: String },

    /// No financial transaction recorded for the source
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// Transaction fields violate the amount or account rules
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    #[error("Payroll error: {0}")]
    Payroll(#[from] PayrollError),

    #[error("Stock audit chain broken: {0}")]
    Chain(#[from] ChainViolation),

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    #[error("Storage error: {0}")]
    Port(#[from] PortError),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::AccountNotFound(_)
            | LedgerError::NoAccountForMethod(_)
            | LedgerError::AccountInactive(_) => ErrorKind::Configuration,
            LedgerError::InsufficientBalance { .. } => ErrorKind::InsufficientResource,
            LedgerError::SaleLocked { .. } | LedgerError::InvalidTransactionState { .. } => {
                ErrorKind::StatePrecondition
            }
            LedgerError::TransactionNotFound(_) => ErrorKind::NotFound,
            LedgerError::InvalidTransaction(_) | LedgerError::Money(_) => ErrorKind::Validation,
            LedgerError::Inventory(err) => match err {
                InventoryError::InsufficientStock { .. } => ErrorKind::InsufficientResource,
                InventoryError::ProductInactive(_) => ErrorKind::StatePrecondition,
                InventoryError::InvalidQuantity { .. }
                | InventoryError::InvalidLine { .. }
                | InventoryError::Overflow(_) => {
                    ErrorKind::Validation
                }
            },
            LedgerError::Payroll(err) => match err {
                PayrollError::NotApproved { .. }
                | PayrollError::InvalidStatusTransition { .. }
                | PayrollError::NotPaid(_) => ErrorKind::StatePrecondition,
                _ => ErrorKind::Validation,
            },
            LedgerError::Chain(_) => ErrorKind::Storage,
            LedgerError::Port(err) => match err {
                PortError::NotFound { .. } => ErrorKind::NotFound,
                PortError::Validation { .. } => ErrorKind::Validation,
                PortError::Conflict { .. } => ErrorKind::StatePrecondition,
                _ => ErrorKind::Storage,
            },
        }
    }

    /// Returns true for stock shortages
    pub fn is_insufficient_stock(&self) -> bool {
        matches!(self, LedgerError::Inventory(err) if err.is_insufficient_stock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::ProductId;

    #[test]
    fn test_kind_taxonomy() {
        let stock = LedgerError::from(InventoryError::InsufficientStock {
            product: ProductId::new(),
            requested: 4,
            available: 1,
        });
        assert_eq!(stock.kind(), ErrorKind::InsufficientResource);
        assert!(stock.is_insufficient_stock());

        let payroll = LedgerError::from(PayrollError::NotApproved {
            code: "PAY-2024-01-001".into(),
            status: "draft".into(),
        });
        assert_eq!(payroll.kind(), ErrorKind::StatePrecondition);

        assert_eq!(
            LedgerError::NoAccountForMethod(PaymentMethod::Cash).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            LedgerError::from(PortError::not_found("Product", "x")).kind(),
            ErrorKind::NotFound
        );
    }
}
