//! Rupee amounts using decimal arithmetic.
//!
//! The shop only trades in INR, so [`Money`] carries no currency code. All
//! arithmetic stays in [`Decimal`]; formatting follows the Indian digit
//! grouping used on price tags (`₹1,00,000`).

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Rupee sign used when rendering prices.
pub const RUPEE: char = '₹';

/// Errors that can occur when constructing [`Money`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount cannot be negative")]
    Negative,
    #[error("invalid amount: {0}")]
    Invalid(String),
}

/// A non-negative amount in rupees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero rupees.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] for amounts below zero.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        Ok(Self(amount))
    }

    /// Whole rupees.
    #[must_use]
    pub fn from_rupees(rupees: u32) -> Self {
        Self(Decimal::from(rupees))
    }

    /// Parse a form value such as `"1499"` or `"1499.50"`.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if the text is not a non-negative number.
    pub fn parse(s: &str) -> Result<Self, MoneyError> {
        let amount = s
            .trim()
            .parse::<Decimal>()
            .map_err(|_| MoneyError::Invalid(s.trim().to_owned()))?;
        Self::new(amount)
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Line total for `quantity` units at this price.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Price tag text: paise are shown only when present (`₹1,500`, `₹1,500.50`).
    #[must_use]
    pub fn display(&self) -> String {
        let fixed = format!("{:.2}", self.0.round_dp(2));
        let (whole, paise) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
        if paise == "00" {
            format!("{RUPEE}{}", group_indian(whole))
        } else {
            format!("{RUPEE}{}.{paise}", group_indian(whole))
        }
    }

    /// Whole-rupee text used in admin tables (`₹1,501` for 1500.50).
    #[must_use]
    pub fn display_rounded(&self) -> String {
        let whole = self
            .0
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .normalize()
            .to_string();
        format!("{RUPEE}{}", group_indian(&whole))
    }

    /// Amount with exactly two decimals and no symbol, as payment links expect.
    #[must_use]
    pub fn to_fixed_2(&self) -> String {
        format!("{:.2}", self.0.round_dp(2))
    }

    /// Whole-percent discount from `original` down to `self`.
    ///
    /// `None` when there is no original price or it is not above the price.
    #[must_use]
    pub fn discount_percent(&self, original: Option<Self>) -> Option<u32> {
        let original = original?;
        if original.0 <= self.0 || original.is_zero() {
            return None;
        }
        ((original.0 - self.0) / original.0 * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
    }
}

/// Group an unsigned integer string the Indian way: last three digits, then pairs.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_owned();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(head.get(start..end).unwrap_or_default());
        end = start;
    }
    groups.reverse();
    format!("{},{tail}", groups.join(","))
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn rupees(s: &str) -> Money {
        Money::parse(s).unwrap()
    }

    #[test]
    fn test_display_indian_grouping() {
        assert_eq!(rupees("900").display(), "₹900");
        assert_eq!(rupees("2899").display(), "₹2,899");
        assert_eq!(rupees("100000").display(), "₹1,00,000");
        assert_eq!(rupees("12345678").display(), "₹1,23,45,678");
    }

    #[test]
    fn test_display_paise_only_when_present() {
        assert_eq!(rupees("1500.00").display(), "₹1,500");
        assert_eq!(rupees("1500.5").display(), "₹1,500.50");
    }

    #[test]
    fn test_display_rounded() {
        assert_eq!(rupees("1500.50").display_rounded(), "₹1,501");
        assert_eq!(rupees("1500.49").display_rounded(), "₹1,500");
    }

    #[test]
    fn test_to_fixed_2() {
        assert_eq!(rupees("1800").to_fixed_2(), "1800.00");
        assert_eq!(rupees("99.5").to_fixed_2(), "99.50");
    }

    #[test]
    fn test_negative_rejected() {
        assert_eq!(Money::parse("-1"), Err(MoneyError::Negative));
        assert!(matches!(Money::parse("abc"), Err(MoneyError::Invalid(_))));
    }

    #[test]
    fn test_times_and_sum() {
        let total: Money = [rupees("900").times(2), rupees("1500")].into_iter().sum();
        assert_eq!(total, rupees("3300"));
    }

    #[test]
    fn test_discount_percent() {
        assert_eq!(rupees("900").discount_percent(Some(rupees("1100"))), Some(18));
        assert_eq!(rupees("2899").discount_percent(Some(rupees("3999"))), Some(28));
        assert_eq!(rupees("900").discount_percent(Some(rupees("900"))), None);
        assert_eq!(rupees("900").discount_percent(None), None);
    }
}
