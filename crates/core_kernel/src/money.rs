//! Money types with precise decimal arithmetic
//!
//! The shop books everything in Indonesian Rupiah, so `Money` carries no
//! currency tag. Amounts are held as `rust_decimal::Decimal` rounded to two
//! decimal places (sen) so that no floating-point error ever reaches a balance.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use thiserror::Error;

/// Decimal places kept for every amount
pub const MONEY_SCALE: u32 = 2;

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Overflow during calculation")]
    Overflow,
}

/// A Rupiah amount
///
/// Ordering and equality compare the rounded decimal value, so
/// `Money::new(dec!(1.005))` and `Money::new(dec!(1.00))` are equal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero rupiah
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Creates a new Money value, rounding to sen
    pub fn new(amount: Decimal) -> Self {
        Self(amount.round_dp(MONEY_SCALE))
    }

    /// Creates Money from a whole rupiah amount
    pub fn from_rupiah(rupiah: i64) -> Self {
        Self(Decimal::from(rupiah))
    }

    /// Creates a zero amount
    pub fn zero() -> Self {
        Self::ZERO
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly positive
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns true if the amount is strictly negative
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns the absolute value
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Returns the smaller of two amounts
    pub fn min(self, other: Money) -> Money {
        if self <= other { self } else { other }
    }

    /// Returns the larger of two amounts
    pub fn max(self, other: Money) -> Money {
        if self >= other { self } else { other }
    }

    /// Checked addition that reports decimal overflow
    pub fn checked_add(&self, other: &Money) -> Result<Money, MoneyError> {
        self.0
            .checked_add(other.0)
            .map(Self::new)
            .ok_or(MoneyError::Overflow)
    }

    /// Checked subtraction that reports decimal overflow
    pub fn checked_sub(&self, other: &Money) -> Result<Money, MoneyError> {
        self.0
            .checked_sub(other.0)
            .map(Self::new)
            .ok_or(MoneyError::Overflow)
    }

    /// Multiplies by a scalar (quantities, rates, growth factors)
    pub fn multiply(&self, factor: Decimal) -> Self {
        Self::new(self.0 * factor)
    }

    /// Divides by a scalar
    pub fn divide(&self, divisor: Decimal) -> Result<Self, MoneyError> {
        if divisor.is_zero() {
            return Err(MoneyError::DivisionByZero);
        }
        Ok(Self::new(self.0 / divisor))
    }

    /// Parses a positive amount, rejecting zero and negative values
    pub fn positive(amount: Decimal) -> Result<Self, MoneyError> {
        let money = Self::new(amount);
        if !money.is_positive() {
            return Err(MoneyError::InvalidAmount(format!(
                "amount must be greater than zero, got {}",
                amount
            )));
        }
        Ok(money)
    }
}

impl fmt::Display for Money {
    /// Formats as Indonesian Rupiah, e.g. `Rp 1.250.000` or `-Rp 1.500,50`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.abs();
        let whole = abs.trunc();
        let whole_digits = whole.to_string();
        let whole_digits = whole_digits.split('.').next().unwrap_or("0");

        let mut grouped = String::with_capacity(whole_digits.len() + whole_digits.len() / 3);
        for (i, ch) in whole_digits.chars().enumerate() {
            if i > 0 && (whole_digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        if self.is_negative() {
            write!(f, "-")?;
        }
        write!(f, "Rp {}", grouped)?;

        let sen = ((abs - whole) * dec!(100)).trunc();
        if !sen.is_zero() {
            let sen_digits = sen.to_string();
            let sen_digits = sen_digits.split('.').next().unwrap_or("0");
            write!(f, ",{:0>2}", sen_digits)?;
        }
        Ok(())
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.0 - other.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Mul<Decimal> for Money {
    type Output = Self;

    fn mul(self, factor: Decimal) -> Self {
        self.multiply(factor)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + *m)
    }
}

/// Represents a percentage rate (tax, insurance contribution, growth)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rate {
    /// The rate as a decimal (e.g., 0.05 for 5%)
    value: Decimal,
}

impl Rate {
    /// Creates a rate from a decimal value (e.g., 0.05 for 5%)
    pub fn new(value: Decimal) -> Self {
        Self { value }
    }

    /// Creates a rate from a percentage (e.g., 5.0 for 5%)
    pub fn from_percentage(percentage: Decimal) -> Self {
        Self {
            value: percentage / dec!(100),
        }
    }

    /// Returns the rate as a decimal
    pub fn as_decimal(&self) -> Decimal {
        self.value
    }

    /// Returns the rate as a percentage
    pub fn as_percentage(&self) -> Decimal {
        self.value * dec!(100)
    }

    /// Applies this rate to a money amount
    pub fn apply(&self, money: &Money) -> Money {
        money.multiply(self.value)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percentage().round_dp(4).normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_rounds_to_sen() {
        let m = Money::new(dec!(1500.456));
        assert_eq!(m.amount(), dec!(1500.46));
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_rupiah(30_000);
        let b = Money::from_rupiah(12_500);

        assert_eq!((a + b).amount(), dec!(42500));
        assert_eq!((a - b).amount(), dec!(17500));
        assert_eq!((-a).amount(), dec!(-30000));
    }

    #[test]
    fn test_rupiah_display() {
        assert_eq!(Money::from_rupiah(30_000).to_string(), "Rp 30.000");
        assert_eq!(Money::from_rupiah(1_250_000).to_string(), "Rp 1.250.000");
        assert_eq!(Money::new(dec!(-1500.5)).to_string(), "-Rp 1.500,50");
        assert_eq!(Money::zero().to_string(), "Rp 0");
    }

    #[test]
    fn test_positive_rejects_zero() {
        assert!(Money::positive(dec!(0)).is_err());
        assert!(Money::positive(dec!(-1)).is_err());
        assert!(Money::positive(dec!(1)).is_ok());
    }

    #[test]
    fn test_rate_application() {
        let rate = Rate::from_percentage(dec!(5));
        let amount = Money::from_rupiah(1_000_000);

        assert_eq!(rate.apply(&amount).amount(), dec!(50000));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn money_arithmetic_is_associative(
            a in -1_000_000_000i64..1_000_000_000i64,
            b in -1_000_000_000i64..1_000_000_000i64,
            c in -1_000_000_000i64..1_000_000_000i64
        ) {
            let ma = Money::from_rupiah(a);
            let mb = Money::from_rupiah(b);
            let mc = Money::from_rupiah(c);

            prop_assert_eq!((ma + mb) + mc, ma + (mb + mc));
        }

        #[test]
        fn sum_matches_fold(values in proptest::collection::vec(-1_000_000i64..1_000_000i64, 0..50)) {
            let monies: Vec<Money> = values.iter().map(|v| Money::from_rupiah(*v)).collect();
            let total: Money = monies.iter().sum();
            let expected: i64 = values.iter().sum();
            prop_assert_eq!(total, Money::from_rupiah(expected));
        }
    }
}
