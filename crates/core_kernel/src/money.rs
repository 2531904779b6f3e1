//! Decimal amounts with a fixed money scale
//!
//! Balances and ledger amounts use rust_decimal so that splitting and
//! replaying entries never accumulates floating-point error. Every amount
//! accepted from the outside world is restricted to `MONEY_SCALE` decimal
//! places, which lets equal splits be computed in whole cents.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;
use thiserror::Error;

/// Number of decimal places carried by every amount (cents)
pub const MONEY_SCALE: u32 = 2;

/// Errors that can occur during amount operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Amount must be greater than zero, got {0}")]
    NotPositive(String),

    #[error("Amount {0} has more than two decimal places")]
    ExcessPrecision(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount {0} is too large")]
    TooLarge(String),

    #[error("Overflow during calculation")]
    Overflow,
}

/// A signed monetary amount
///
/// Positive and negative values are both meaningful: a member balance of
/// `+100` means the member owes the group, `-100` means they are owed.
///
/// Serialized as a decimal string with two places (`"-200.00"`); accepts a
/// JSON string or number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    /// Wraps a decimal value without validation
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// The zero amount
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Creates an amount from minor units (cents)
    pub fn from_minor(minor_units: i64) -> Self {
        Self(Decimal::new(minor_units, MONEY_SCALE))
    }

    /// Returns the underlying decimal
    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Returns true if the amount fits in `MONEY_SCALE` decimal places
    pub fn has_money_scale(&self) -> bool {
        self.0.normalize().scale() <= MONEY_SCALE
    }

    /// Validates an amount supplied for an expense or settlement
    ///
    /// # Errors
    ///
    /// - `MoneyError::NotPositive` if the amount is zero or negative
    /// - `MoneyError::ExcessPrecision` if it has more than two decimal places
    /// - `MoneyError::TooLarge` if its cents do not fit in an `i64`
    pub fn ensure_positive(self) -> Result<Self, MoneyError> {
        if !self.is_positive() {
            return Err(MoneyError::NotPositive(self.to_string()));
        }
        self.ensure_in_range()
    }

    /// Checks that the amount has at most two decimal places and that its
    /// cents fit in an `i64`
    pub fn ensure_in_range(self) -> Result<Self, MoneyError> {
        match self.to_minor() {
            Ok(_) => Ok(self),
            Err(MoneyError::Overflow) => Err(MoneyError::TooLarge(self.to_string())),
            Err(other) => Err(other),
        }
    }

    /// Addition that fails instead of panicking on overflow
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Subtraction that fails instead of panicking on overflow
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Converts to minor units (cents)
    ///
    /// # Errors
    ///
    /// Returns `ExcessPrecision` if the value has sub-cent digits and
    /// `Overflow` if it does not fit in an `i64`.
    pub fn to_minor(&self) -> Result<i64, MoneyError> {
        if !self.has_money_scale() {
            return Err(MoneyError::ExcessPrecision(self.0.to_string()));
        }
        let cents = self
            .0
            .checked_mul(Decimal::from(10_i64.pow(MONEY_SCALE)))
            .ok_or(MoneyError::Overflow)?;
        cents.to_i64().ok_or(MoneyError::Overflow)
    }

    /// Splits the amount into `n` shares that sum exactly to the original
    ///
    /// Every share receives `floor(cents / n)` cents; the remaining
    /// `cents % n` cents go one each to the first shares.
    ///
    /// # Errors
    ///
    /// Fails for `n == 0`, negative amounts, or amounts with sub-cent digits.
    pub fn allocate(&self, n: usize) -> Result<Vec<Amount>, MoneyError> {
        if n == 0 {
            return Err(MoneyError::InvalidAmount("Cannot allocate to zero parts".to_string()));
        }
        if self.is_negative() {
            return Err(MoneyError::InvalidAmount(format!(
                "Cannot allocate negative amount {}",
                self
            )));
        }

        let total_minor = self.to_minor()?;
        let parts = i64::try_from(n).map_err(|_| MoneyError::Overflow)?;
        let base = total_minor / parts;
        let remainder = total_minor % parts;

        Ok((0..parts)
            .map(|i| {
                if i < remainder {
                    Amount::from_minor(base + 1)
                } else {
                    Amount::from_minor(base)
                }
            })
            .collect())
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.prec$}", self.0, prec = MONEY_SCALE as usize)
    }
}

impl FromStr for Amount {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Self)
            .map_err(|e| MoneyError::InvalidAmount(format!("{}: {}", s, e)))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.has_money_scale() {
            serializer.collect_str(self)
        } else {
            // Never rounded on the way out
            serializer.collect_str(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <Decimal as Deserialize>::deserialize(deserializer).map(Self)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Decimal {
        amount.0
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::zero(), |acc, a| acc + a)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_from_minor() {
        let a = Amount::from_minor(10050);
        assert_eq!(a.value(), dec!(100.50));
    }

    #[test]
    fn test_amount_display_uses_two_places() {
        assert_eq!(Amount::new(dec!(100)).to_string(), "100.00");
        assert_eq!(Amount::new(dec!(-3.5)).to_string(), "-3.50");
    }

    #[test]
    fn test_ensure_positive_rejects_zero_and_sub_cent() {
        assert!(matches!(
            Amount::zero().ensure_positive(),
            Err(MoneyError::NotPositive(_))
        ));
        assert!(matches!(
            Amount::new(dec!(1.005)).ensure_positive(),
            Err(MoneyError::ExcessPrecision(_))
        ));
        assert!(Amount::new(dec!(1.500)).ensure_positive().is_ok());
    }

    #[test]
    fn test_ensure_positive_rejects_amounts_beyond_i64_cents() {
        let huge = Amount::new(dec!(50000000000000000000000000000));
        assert!(matches!(huge.ensure_positive(), Err(MoneyError::TooLarge(_))));

        let largest = Amount::from_minor(i64::MAX);
        assert!(largest.ensure_positive().is_ok());
        assert!(largest.checked_add(largest).is_some());
        assert!(Amount::new(Decimal::MAX).checked_add(Amount::new(Decimal::ONE)).is_none());
    }

    #[test]
    fn test_allocate_gives_remainder_to_first_parts() {
        let parts = Amount::new(dec!(100)).allocate(3).unwrap();
        assert_eq!(
            parts,
            vec![
                Amount::new(dec!(33.34)),
                Amount::new(dec!(33.33)),
                Amount::new(dec!(33.33)),
            ]
        );
    }

    #[test]
    fn test_allocate_zero_parts_fails() {
        assert!(Amount::new(dec!(10)).allocate(0).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn allocation_sum_equals_original(
            minor in 1i64..1_000_000_000i64,
            parts in 1usize..100usize
        ) {
            let amount = Amount::from_minor(minor);
            let allocations = amount.allocate(parts).unwrap();

            let total: Amount = allocations.iter().sum();
            prop_assert_eq!(total, amount);
        }

        #[test]
        fn allocation_shares_differ_by_at_most_one_cent(
            minor in 1i64..10_000_000i64,
            parts in 1usize..50usize
        ) {
            let allocations = Amount::from_minor(minor).allocate(parts).unwrap();
            let max = allocations.iter().max().copied().unwrap();
            let min = allocations.iter().min().copied().unwrap();
            prop_assert!(max - min <= Amount::from_minor(1));
        }
    }
}
