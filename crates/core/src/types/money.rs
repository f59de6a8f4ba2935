//! Type-safe money representation using decimal arithmetic.
//!
//! The storefront only deals in US dollars, so [`Money`] is a plain decimal
//! amount. It serializes as a JSON number to match the catalog API's payloads.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::types::quantity::Quantity;

/// A dollar amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create from a decimal amount in dollars.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create from an integer amount of cents (e.g. `1499` → `$14.99`).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_cents(cents: i64) -> Self {
        let magnitude = cents.unsigned_abs();
        Self(Decimal::from_parts(
            magnitude as u32,
            (magnitude >> 32) as u32,
            0,
            cents < 0,
            2,
        ))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiply by a decimal rate (e.g. a tax rate), rounded to cents.
    #[must_use]
    pub fn scale(self, rate: Decimal) -> Self {
        Self(self.0 * rate).round_cents()
    }

    /// Round half away from zero to whole cents.
    #[must_use]
    pub fn round_cents(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Whether the amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.round_cents().0;
        if rounded.is_sign_negative() && !rounded.is_zero() {
            write!(f, "-${:.2}", rounded.abs())
        } else {
            write!(f, "${rounded:.2}")
        }
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Mul<Quantity> for Money {
    type Output = Self;

    fn mul(self, rhs: Quantity) -> Self {
        Self(self.0 * Decimal::from(rhs.get()))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        assert_eq!(Money::from_cents(1499).amount(), Decimal::new(1499, 2));
        assert_eq!(Money::from_cents(-250).amount(), Decimal::new(-250, 2));
        assert_eq!(
            Money::from_cents(i64::from(u32::MAX) + 7).amount(),
            Decimal::new(i64::from(u32::MAX) + 7, 2)
        );
        let large_debit = -i64::from(u32::MAX) * 3;
        assert_eq!(Money::from_cents(large_debit).amount(), Decimal::new(large_debit, 2));
    }

    const LIMIT: Money = Money::from_cents(5000);

    #[test]
    fn test_from_cents_in_const_context() {
        assert_eq!(LIMIT.to_string(), "$50.00");
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1499).to_string(), "$14.99");
        assert_eq!(Money::new(Decimal::new(5, 0)).to_string(), "$5.00");
        assert_eq!(Money::from_cents(-250).to_string(), "-$2.50");
    }

    #[test]
    fn test_scale_rounds_to_cents() {
        // 7% of $29.98 = $2.0986 → $2.10
        let tax = Money::from_cents(2998).scale(Decimal::new(7, 2));
        assert_eq!(tax, Money::from_cents(210));
    }

    #[test]
    fn test_line_total_and_sum() {
        let qty = Quantity::new(3).unwrap();
        let lines = [Money::from_cents(1499) * qty, Money::from_cents(1)];
        assert_eq!(lines.into_iter().sum::<Money>(), Money::from_cents(4498));
    }
}
