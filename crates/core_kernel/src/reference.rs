//! Polymorphic reference to the business record behind a ledger entry
//!
//! Transactions, cash flows and stock movements all point back at the sale,
//! purchase or payroll that caused them. `SourceRef` is that pointer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::identifiers::{PayrollId, PurchaseId, SaleId};

/// Kind of originating business record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Sale,
    Purchase,
    Payroll,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Sale => "sale",
            SourceKind::Purchase => "purchase",
            SourceKind::Payroll => "payroll",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sale" => Ok(SourceKind::Sale),
            "purchase" => Ok(SourceKind::Purchase),
            "payroll" => Ok(SourceKind::Payroll),
            other => Err(format!("unknown source kind: {}", other)),
        }
    }
}

/// Reference type + reference id pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    pub kind: SourceKind,
    pub id: Uuid,
}

impl SourceRef {
    pub fn new(kind: SourceKind, id: Uuid) -> Self {
        Self { kind, id }
    }

    pub fn sale(id: SaleId) -> Self {
        Self::new(SourceKind::Sale, id.into())
    }

    pub fn purchase(id: PurchaseId) -> Self {
        Self::new(SourceKind::Purchase, id.into())
    }

    pub fn payroll(id: PayrollId) -> Self {
        Self::new(SourceKind::Payroll, id.into())
    }

    /// Hyphenless id used in transaction codes
    pub fn simple_id(&self) -> String {
        self.id.simple().to_string()
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_round_trips_through_str() {
        for kind in [SourceKind::Sale, SourceKind::Purchase, SourceKind::Payroll] {
            assert_eq!(kind.as_str().parse::<SourceKind>().unwrap(), kind);
        }
        assert!("refund".parse::<SourceKind>().is_err());
    }

    #[test]
    fn test_display_includes_kind() {
        let sale = SaleId::new();
        let reference = SourceRef::sale(sale);
        assert!(reference.to_string().starts_with("sale:"));
    }
}
