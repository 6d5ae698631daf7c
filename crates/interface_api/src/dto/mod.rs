//! Request and response bodies

pub mod events;
pub mod products;
pub mod payroll;
pub mod reports;

use serde::Serialize;
use validator::ValidationError;

use core_kernel::Money;

/// Response for read endpoints returning a list
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub count: usize,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            count: items.len(),
            items,
        }
    }
}

pub(crate) fn non_negative(money: &Money) -> Result<(), ValidationError> {
    if money.is_negative() {
        return Err(ValidationError::new("negative_amount"));
    }
    Ok(())
}
