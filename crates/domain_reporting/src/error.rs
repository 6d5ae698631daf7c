//! Reporting errors

use thiserror::Error;

use core_kernel::{PortError, TemporalError};

/// Errors raised while building statements
#[derive(Debug, Error)]
pub enum ReportingError {
    #[error("Invalid report period: {0}")]
    InvalidPeriod(#[from] TemporalError),

    #[error("Projection horizon must be between 1 and {max} months, got {requested}")]
    InvalidHorizon { requested: u32, max: u32 },

    #[error("Storage error: {0}")]
    Port(#[from] PortError),
}

impl ReportingError {
    /// True when the caller asked for something malformed
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            ReportingError::InvalidPeriod(_) | ReportingError::InvalidHorizon { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ReportingError::Port(err) if err.is_not_found())
    }
}
