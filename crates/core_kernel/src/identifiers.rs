//! Strongly-typed identifiers for domain entities
//!
//! Using newtype wrappers around UUIDs provides type safety and prevents
//! accidental mixing of different identifier types (a product id can never
//! be passed where an account id is expected).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates a new time-ordered identifier (v7)
            pub fn new_v7() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Hyphenless form used inside human-readable codes
            pub fn simple(&self) -> String {
                self.0.simple().to_string()
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }
    };
}

// Ledger
define_id!(AccountId, "ACC");
define_id!(TransactionId, "TXN");
define_id!(CashFlowId, "CF");

// Inventory
define_id!(ProductId, "PRD");
define_id!(StockMovementId, "MOV");

// Business sources
define_id!(SaleId, "SAL");
define_id!(PurchaseId, "PUR");
define_id!(PayrollId, "PAY");

// People
define_id!(UserId, "USR");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_display() {
        let id = AccountId::new();
        assert!(id.to_string().starts_with("ACC-"));
    }

    #[test]
    fn test_id_parsing_with_and_without_prefix() {
        let original = SaleId::new();
        let parsed: SaleId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);

        let bare: SaleId = original.as_uuid().to_string().parse().unwrap();
        assert_eq!(original, bare);
    }

    #[test]
    fn test_simple_form_has_no_hyphens() {
        let id = ProductId::new();
        assert_eq!(id.simple().len(), 32);
        assert!(!id.simple().contains('-'));
    }
}
