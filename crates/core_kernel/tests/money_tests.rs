//! Unit tests for the Money module
//!
//! Tests cover creation, rounding, arithmetic, ordering and Rupiah formatting.

use core_kernel::{Money, MoneyError, Rate};
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_from_rupiah_creates_whole_amount() {
        let m = Money::from_rupiah(30_000);
        assert_eq!(m.amount(), dec!(30000));
    }

    #[test]
    fn test_new_rounds_to_two_decimal_places() {
        let m = Money::new(dec!(100.126));
        assert_eq!(m.amount(), dec!(100.13));
    }

    #[test]
    fn test_zero_is_zero() {
        assert!(Money::zero().is_zero());
        assert!(!Money::zero().is_positive());
        assert!(!Money::zero().is_negative());
    }

    #[test]
    fn test_positive_constructor_rejects_non_positive() {
        assert!(matches!(Money::positive(dec!(0)), Err(MoneyError::InvalidAmount(_))));
        assert_eq!(Money::positive(dec!(5)).unwrap(), Money::from_rupiah(5));
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_add_assign_and_sub_assign() {
        let mut m = Money::from_rupiah(1_000);
        m += Money::from_rupiah(500);
        m -= Money::from_rupiah(200);
        assert_eq!(m, Money::from_rupiah(1_300));
    }

    #[test]
    fn test_multiply_by_quantity() {
        let unit_price = Money::from_rupiah(12_500);
        assert_eq!(unit_price * dec!(4), Money::from_rupiah(50_000));
    }

    #[test]
    fn test_divide_by_zero_fails() {
        let m = Money::from_rupiah(100);
        assert_eq!(m.divide(dec!(0)), Err(MoneyError::DivisionByZero));
    }

    #[test]
    fn test_min_and_max() {
        let a = Money::from_rupiah(1_000);
        let b = Money::from_rupiah(1_500);
        assert_eq!(a.min(b), a);
        assert_eq!(a.max(b), b);
    }

    #[test]
    fn test_sum_over_iterator() {
        let total: Money = [1_000, 2_000, 3_000]
            .into_iter()
            .map(Money::from_rupiah)
            .sum();
        assert_eq!(total, Money::from_rupiah(6_000));
    }
}

mod formatting {
    use super::*;

    #[test]
    fn test_thousands_use_dot_separator() {
        assert_eq!(Money::from_rupiah(1_000).to_string(), "Rp 1.000");
        assert_eq!(Money::from_rupiah(999).to_string(), "Rp 999");
        assert_eq!(Money::from_rupiah(12_345_678).to_string(), "Rp 12.345.678");
    }

    #[test]
    fn test_sen_use_comma_separator() {
        assert_eq!(Money::new(dec!(2500.05)).to_string(), "Rp 2.500,05");
    }

    #[test]
    fn test_rate_display() {
        assert_eq!(Rate::from_percentage(dec!(5)).to_string(), "5%");
    }
}
