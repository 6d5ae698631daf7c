//! Report query parameters

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

use core_kernel::DateRange;

use crate::error::ApiError;

/// `?start=YYYY-MM-DD&end=YYYY-MM-DD`, both inclusive
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl RangeQuery {
    pub fn range(&self) -> Result<DateRange, ApiError> {
        DateRange::new(self.start, self.end).map_err(|e| ApiError::validation(e.to_string()))
    }
}

/// `?year=2024&months=3`
#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub year: Option<i32>,
    /// Projection horizon in months
    #[serde(default = "default_horizon")]
    pub months: u32,
}

fn default_horizon() -> u32 {
    3
}

impl AnalyticsQuery {
    pub fn year_or(&self, today: NaiveDate) -> i32 {
        self.year.unwrap_or_else(|| today.year())
    }
}
