//! Kernel error type
//!
//! One `?` target for code that parses kernel values out of configuration
//! or request input.

use thiserror::Error;

use crate::money::MoneyError;
use crate::temporal::TemporalError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error(transparent)]
    Temporal(#[from] TemporalError),

    #[error("Invalid identifier: {0}")]
    Identifier(#[from] uuid::Error),

    /// Not an IANA timezone name
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}
