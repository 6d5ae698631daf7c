//! Tests for strongly-typed identifiers and source references

use core_kernel::{AccountId, PayrollId, ProductId, SaleId, SourceKind, SourceRef, TransactionId};
use uuid::Uuid;

mod identifiers {
    use super::*;

    #[test]
    fn test_each_id_type_has_its_own_prefix() {
        assert_eq!(AccountId::prefix(), "ACC");
        assert_eq!(TransactionId::prefix(), "TXN");
        assert_eq!(ProductId::prefix(), "PRD");
        assert_eq!(PayrollId::prefix(), "PAY");
    }

    #[test]
    fn test_v7_ids_are_time_ordered() {
        let first = TransactionId::new_v7();
        let second = TransactionId::new_v7();
        assert!(first <= second);
    }

    #[test]
    fn test_uuid_conversion_round_trip() {
        let uuid = Uuid::new_v4();
        let id = SaleId::from(uuid);
        let back: Uuid = id.into();
        assert_eq!(uuid, back);
    }

    #[test]
    fn test_parse_accepts_prefixed_and_bare_forms() {
        let id = ProductId::from_uuid(Uuid::new_v4());
        let prefixed: ProductId = id.to_string().parse().unwrap();
        let bare: ProductId = id.as_uuid().to_string().parse().unwrap();
        assert!(id.to_string().starts_with("PRD-"));
        assert_eq!(prefixed, id);
        assert_eq!(bare, id);
    }

    #[test]
    fn test_invalid_string_is_rejected() {
        assert!("ACC-not-a-uuid".parse::<AccountId>().is_err());
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = ProductId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
    }
}

mod source_refs {
    use super::*;

    #[test]
    fn test_constructors_set_kind() {
        assert_eq!(SourceRef::sale(SaleId::new()).kind, SourceKind::Sale);
        assert_eq!(SourceRef::payroll(PayrollId::new()).kind, SourceKind::Payroll);
    }

    #[test]
    fn test_simple_id_matches_uuid_simple_form() {
        let sale = SaleId::new();
        let reference = SourceRef::sale(sale);
        assert_eq!(reference.simple_id(), sale.simple());
    }
}
