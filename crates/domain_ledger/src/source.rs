//! Sales and purchases as delivered by the point-of-sale layer

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{Money, ProductId, PurchaseId, SaleId, SourceRef, UserId};
use domain_inventory::LineQuantity;

use crate::error::LedgerError;
use crate::payment::PaymentMethod;

/// Sale status as tracked by the point-of-sale layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Pending,
    Paid,
    Completed,
    Cancelled,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Paid => "paid",
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
        }
    }

    /// Payment has been confirmed for the sale
    pub fn is_settled(&self) -> bool {
        matches!(self, SaleStatus::Paid | SaleStatus::Completed)
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SaleStatus::Pending),
            "paid" => Ok(SaleStatus::Paid),
            "completed" => Ok(SaleStatus::Completed),
            "cancelled" => Ok(SaleStatus::Cancelled),
            other => Err(format!("unknown sale status: {}", other)),
        }
    }
}

/// Where the sale happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleChannel {
    /// In-person at the counter
    Offline,
    /// Ordered remotely, paid before delivery
    Online,
}

/// One line of a sale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
    /// Cost basis per unit, when known
    #[serde(default)]
    pub unit_cost: Option<Money>,
}

impl SaleLine {
    pub fn new(product_id: ProductId, quantity: i64, unit_price: Money) -> Self {
        Self {
            product_id,
            quantity,
            unit_price,
            unit_cost: None,
        }
    }

    pub fn with_unit_cost(mut self, cost: Money) -> Self {
        self.unit_cost = Some(cost);
        self
    }

    pub fn subtotal(&self) -> Money {
        self.unit_price.multiply(Decimal::from(self.quantity))
    }

    pub fn quantity(&self) -> LineQuantity {
        LineQuantity::new(self.product_id, self.quantity)
    }
}

/// A sale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub invoice_number: String,
    pub channel: SaleChannel,
    pub status: SaleStatus,
    pub payment_method: PaymentMethod,
    pub lines: Vec<SaleLine>,
    pub total_amount: Money,
    pub cashier: Option<UserId>,
    pub sold_at: DateTime<Utc>,
}

impl Sale {
    /// Creates a pending offline sale; total is the sum of the lines
    pub fn new(invoice_number: impl Into<String>, payment_method: PaymentMethod, lines: Vec<SaleLine>) -> Self {
        let total_amount = lines.iter().map(SaleLine::subtotal).sum();
        Self {
            id: SaleId::new_v7(),
            invoice_number: invoice_number.into(),
            channel: SaleChannel::Offline,
            status: SaleStatus::Pending,
            payment_method,
            lines,
            total_amount,
            cashier: None,
            sold_at: Utc::now(),
        }
    }

    pub fn online(mut self) -> Self {
        self.channel = SaleChannel::Online;
        self
    }

    pub fn with_status(mut self, status: SaleStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_cashier(mut self, cashier: UserId) -> Self {
        self.cashier = Some(cashier);
        self
    }

    /// Replaces the lines and recomputes the total
    pub fn with_lines(mut self, lines: Vec<SaleLine>) -> Self {
        self.total_amount = lines.iter().map(SaleLine::subtotal).sum();
        self.lines = lines;
        self
    }

    pub fn reference(&self) -> SourceRef {
        SourceRef::sale(self.id)
    }

    pub fn line_quantities(&self) -> Vec<LineQuantity> {
        self.lines.iter().map(SaleLine::quantity).collect()
    }

    /// Checks the lines and total before anything is booked
    ///
    /// # Errors
    ///
    /// `InvalidTransaction` when a line has a non-positive quantity, a
    /// negative price or cost, or when `total_amount` is not the sum of the
    /// line subtotals.
    pub fn validate(&self) -> Result<(), LedgerError> {
        for line in &self.lines {
            if line.quantity <= 0 {
                return Err(LedgerError::InvalidTransaction(format!(
                    "sale {} has quantity {} for {}",
                    self.invoice_number, line.quantity, line.product_id
                )));
            }
            if line.unit_price.is_negative() || line.unit_cost.is_some_and(|cost| cost.is_negative()) {
                return Err(LedgerError::InvalidTransaction(format!(
                    "sale {} has a negative price or cost for {}",
                    self.invoice_number, line.product_id
                )));
            }
        }
        let expected: Money = self.lines.iter().map(SaleLine::subtotal).sum();
        if expected != self.total_amount {
            return Err(LedgerError::InvalidTransaction(format!(
                "sale {} total {} does not match its lines ({})",
                self.invoice_number, self.total_amount, expected
            )));
        }
        Ok(())
    }

    /// Total cost of the lines that carry a cost basis
    ///
    /// `None` when no line has one, so no cost-of-goods entry is booked.
    pub fn cost_basis(&self) -> Option<Money> {
        let costs: Vec<Money> = self
            .lines
            .iter()
            .filter_map(|line| line.unit_cost.map(|cost| cost.multiply(Decimal::from(line.quantity))))
            .collect();
        if costs.is_empty() {
            None
        } else {
            Some(costs.into_iter().sum())
        }
    }
}

/// One line of a purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_cost: Money,
}

impl PurchaseLine {
    pub fn new(product_id: ProductId, quantity: i64, unit_cost: Money) -> Self {
        Self {
            product_id,
            quantity,
            unit_cost,
        }
    }

    pub fn subtotal(&self) -> Money {
        self.unit_cost.multiply(Decimal::from(self.quantity))
    }
}

/// A stock purchase from a supplier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub reference_number: String,
    pub supplier: String,
    pub payment_method: PaymentMethod,
    pub lines: Vec<PurchaseLine>,
    pub total_amount: Money,
    pub purchased_by: Option<UserId>,
    pub purchased_at: DateTime<Utc>,
}

impl Purchase {
    pub fn new(
        reference_number: impl Into<String>,
        supplier: impl Into<String>,
        payment_method: PaymentMethod,
        lines: Vec<PurchaseLine>,
    ) -> Self {
        let total_amount = lines.iter().map(PurchaseLine::subtotal).sum();
        Self {
            id: PurchaseId::new_v7(),
            reference_number: reference_number.into(),
            supplier: supplier.into(),
            payment_method,
            lines,
            total_amount,
            purchased_by: None,
            purchased_at: Utc::now(),
        }
    }

    pub fn with_buyer(mut self, user: UserId) -> Self {
        self.purchased_by = Some(user);
        self
    }

    pub fn reference(&self) -> SourceRef {
        SourceRef::purchase(self.id)
    }

    pub fn line_quantities(&self) -> Vec<LineQuantity> {
        self.lines
            .iter()
            .map(|line| LineQuantity::new(line.product_id, line.quantity))
            .collect()
    }

    /// Same checks as [`Sale::validate`], against the unit costs
    pub fn validate(&self) -> Result<(), LedgerError> {
        if let Some(line) = self
            .lines
            .iter()
            .find(|line| line.quantity <= 0 || line.unit_cost.is_negative())
        {
            return Err(LedgerError::InvalidTransaction(format!(
                "purchase {} has an invalid line for {}: {} x {}",
                self.reference_number, line.product_id, line.quantity, line.unit_cost
            )));
        }
        let expected: Money = self.lines.iter().map(PurchaseLine::subtotal).sum();
        if expected != self.total_amount {
            return Err(LedgerError::InvalidTransaction(format!(
                "purchase {} total {} does not match its lines ({})",
                self.reference_number, self.total_amount, expected
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_total_and_cost_basis() {
        let product = ProductId::new();
        let sale = Sale::new(
            "INV-0001",
            PaymentMethod::Cash,
            vec![
                SaleLine::new(product, 2, Money::from_rupiah(15_000)).with_unit_cost(Money::from_rupiah(12_000)),
                SaleLine::new(ProductId::new(), 1, Money::from_rupiah(5_000)),
            ],
        );

        assert_eq!(sale.total_amount, Money::from_rupiah(35_000));
        assert_eq!(sale.cost_basis(), Some(Money::from_rupiah(24_000)));
    }

    #[test]
    fn test_sale_without_costs_has_no_basis() {
        let sale = Sale::new(
            "INV-0002",
            PaymentMethod::Transfer,
            vec![SaleLine::new(ProductId::new(), 1, Money::from_rupiah(5_000))],
        );
        assert_eq!(sale.cost_basis(), None);
    }

    #[test]
    fn test_validate_rejects_negative_line() {
        let sale = Sale::new(
            "INV-0003",
            PaymentMethod::Cash,
            vec![
                SaleLine::new(ProductId::new(), 10, Money::from_rupiah(10_000)),
                SaleLine::new(ProductId::new(), -5, Money::from_rupiah(10_000)),
            ],
        );
        assert!(matches!(sale.validate(), Err(LedgerError::InvalidTransaction(_))));
    }

    #[test]
    fn test_validate_rejects_total_mismatch() {
        let mut sale = Sale::new(
            "INV-0004",
            PaymentMethod::Cash,
            vec![SaleLine::new(ProductId::new(), 2, Money::from_rupiah(10_000))],
        );
        assert!(sale.validate().is_ok());

        sale.total_amount = Money::from_rupiah(5_000);
        let err = sale.validate().unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn test_purchase_validate_rejects_zero_quantity() {
        let purchase = Purchase::new(
            "PO-0001",
            "Tani Makmur",
            PaymentMethod::Transfer,
            vec![PurchaseLine::new(ProductId::new(), 0, Money::from_rupiah(8_000))],
        );
        assert!(purchase.validate().is_err());
    }

    #[test]
    fn test_settled_statuses() {
        assert!(SaleStatus::Paid.is_settled());
        assert!(SaleStatus::Completed.is_settled());
        assert!(!SaleStatus::Pending.is_settled());
    }
}
