//! Inbound event DTOs
//!
//! Each body converts into a [`LedgerEvent`], so the typed routes and the
//! generic `/events` route go through the same recorder path.

use serde::Deserialize;
use validator::Validate;

use core_kernel::{AccountId, UserId};
use domain_inventory::LineQuantity;
use domain_ledger::{LedgerEvent, Purchase, Sale};

#[derive(Debug, Deserialize)]
pub struct SaleEventRequest {
    pub sale: Sale,
}

#[derive(Debug, Deserialize)]
pub struct SaleEditedRequest {
    pub sale: Sale,
    pub old_lines: Vec<LineQuantity>,
    pub new_lines: Vec<LineQuantity>,
}

impl From<SaleEditedRequest> for LedgerEvent {
    fn from(request: SaleEditedRequest) -> Self {
        LedgerEvent::SaleEdited {
            sale: request.sale,
            old_lines: request.old_lines,
            new_lines: request.new_lines,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PurchaseCompletedRequest {
    pub purchase: Purchase,
}

impl From<PurchaseCompletedRequest> for LedgerEvent {
    fn from(request: PurchaseCompletedRequest) -> Self {
        LedgerEvent::PurchaseCompleted {
            purchase: request.purchase,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct PaymentRejectedRequest {
    pub sale: Sale,
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

impl From<PaymentRejectedRequest> for LedgerEvent {
    fn from(request: PaymentRejectedRequest) -> Self {
        LedgerEvent::PaymentRejected {
            sale: request.sale,
            reason: request.reason,
        }
    }
}

/// Body of `POST /payrolls/:id/pay`
#[derive(Debug, Default, Deserialize)]
pub struct PayrollPaymentRequest {
    /// Paying account, the configured payroll account when absent
    #[serde(default)]
    pub account_id: Option<AccountId>,
}

impl PayrollPaymentRequest {
    pub fn into_event(self, payroll_id: core_kernel::PayrollId, approver: UserId) -> LedgerEvent {
        LedgerEvent::PayrollPaymentRequested {
            payroll_id,
            account_id: self.account_id,
            approver,
        }
    }
}
