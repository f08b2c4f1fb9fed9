//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: integer minor units                                      │
//! │    Every price, total, and bid is an i64 in the currency's smallest     │
//! │    unit. The database, the gateway request, and all arithmetic use      │
//! │    the same integer. Formatting for display belongs to the UI layer.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use relic_core::money::Money;
//!
//! let price = Money::new(1000);
//! let total = price.checked_mul(2).unwrap();
//! assert_eq!(total.amount(), 2000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: room for refund-style negative amounts downstream
/// - **Single-field tuple struct**: zero-cost abstraction over i64
/// - **Checked multiplication**: quantity × price can never wrap silently
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn new(amount: i64) -> Self {
        Money(amount)
    }

    /// Zero amount.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Returns the raw amount in minor units.
    #[inline]
    pub const fn amount(&self) -> i64 {
        self.0
    }

    /// Checks whether the amount is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition; `None` on overflow.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Checked multiplication by a quantity; `None` on overflow.
    ///
    /// This is the line-total operation: `unit_price.checked_mul(quantity)`.
    #[inline]
    pub fn checked_mul(self, qty: i64) -> Option<Money> {
        self.0.checked_mul(qty).map(Money)
    }
}

impl fmt::Display for Money {
    /// Plain integer form. Currency symbols and digit grouping are
    /// presentation concerns and stay out of this crate.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Money(amount)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_and_accessors() {
        let m = Money::new(1000);
        assert_eq!(m.amount(), 1000);
        assert!(!m.is_zero());
        assert!(Money::zero().is_zero());
    }

    #[test]
    fn checked_arithmetic() {
        let price = Money::new(1000);
        assert_eq!(price.checked_mul(3), Some(Money::new(3000)));
        assert_eq!(
            price.checked_add(Money::new(500)),
            Some(Money::new(1500))
        );
        assert_eq!(Money::new(i64::MAX).checked_mul(2), None);
        assert_eq!(Money::new(i64::MAX).checked_add(Money::new(1)), None);
    }

    #[test]
    fn display_is_plain_integer() {
        assert_eq!(Money::new(1980).to_string(), "1980");
        assert_eq!(Money::new(0).to_string(), "0");
    }

    #[test]
    fn serde_is_transparent() {
        let m = Money::new(2500);
        assert_eq!(serde_json::to_string(&m).unwrap(), "2500");
        let back: Money = serde_json::from_str("2500").unwrap();
        assert_eq!(back, m);
    }
}
