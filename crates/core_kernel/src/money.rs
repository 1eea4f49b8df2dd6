//! Money types with precise decimal arithmetic
//!
//! Every monetary value stored by the system passes through the primitives in
//! this module. Values are held as `rust_decimal::Decimal` and normalized to
//! two decimal places with round-half-away-from-zero, so no binary float ever
//! reaches a persisted field.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use std::str::FromStr;
use thiserror::Error;

/// Number of decimal places kept for every monetary amount
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount is not a finite number")]
    NotFinite,
}

/// Rounds to two decimal places, midpoint away from zero
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a float coming from an untyped boundary
///
/// NaN, infinities and values outside the decimal range collapse to zero.
pub fn round_money_f64(value: f64) -> Decimal {
    if !value.is_finite() {
        tracing::warn!(value = %value, "non-finite monetary input replaced by 0.00");
        return Decimal::ZERO;
    }
    match Decimal::from_f64(value) {
        Some(decimal) => round_money(decimal),
        None => {
            tracing::warn!(value = %value, "monetary input out of range replaced by 0.00");
            Decimal::ZERO
        }
    }
}

/// `round_money(base * pct / 100)`
pub fn percent_of(base: Decimal, pct: Decimal) -> Decimal {
    round_money(base * pct / dec!(100))
}

/// `max(0, round_money(a - b))`
pub fn positive_difference(a: Decimal, b: Decimal) -> Decimal {
    round_money(a - b).max(Decimal::ZERO)
}

/// A monetary amount in the facility's single currency
///
/// The inner value is always already rounded to two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Creates a new amount, normalizing it
    pub fn new(amount: Decimal) -> Self {
        Self(round_money(amount))
    }

    /// Creates an amount from a float produced outside the core
    pub fn from_f64(amount: f64) -> Self {
        Self(round_money_f64(amount))
    }

    /// Creates an amount from integer cents
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, MONEY_DECIMAL_PLACES))
    }

    /// Creates a zero amount
    pub fn zero() -> Self {
        Self::ZERO
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly positive
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns `pct` percent of this amount
    pub fn percent(&self, pct: Decimal) -> Self {
        Self(percent_of(self.0, pct))
    }

    /// Returns `self - other`, floored at zero
    pub fn positive_difference(&self, other: Money) -> Self {
        Self(positive_difference(self.0, other.0))
    }

    /// Clamps negative amounts to zero
    pub fn non_negative(self) -> Self {
        if self.is_negative() {
            Self::ZERO
        } else {
            self
        }
    }

    /// Parses operator or extractor text into an amount
    ///
    /// Accepts currency symbols and both separator conventions:
    /// `"R$ 1.234,56"`, `"1234.56"`, `"1,234.56"`, `"1518"`.
    /// When both separators appear, the rightmost one is the decimal mark.
    /// A lone `.` followed by exactly three digits is pt-BR grouping
    /// (`"R$ 1.500"` is 1500.00). A lone `,` is grouping only when repeated
    /// (`"1,234,567"`); otherwise it is the decimal mark (`"3225,5"`).
    pub fn parse_lenient(text: &str) -> Result<Self, MoneyError> {
        let cleaned: String = text
            .trim()
            .chars()
            .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
            .collect();

        if !cleaned.chars().any(|c| c.is_ascii_digit()) {
            return Err(MoneyError::InvalidAmount(text.to_string()));
        }

        let last_comma = cleaned.rfind(',');
        let last_dot = cleaned.rfind('.');

        let canonical = match (last_comma, last_dot) {
            (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
            (Some(_), Some(_)) => cleaned.replace(',', ""),
            (Some(_), None) => normalize_single_separator(&cleaned, ','),
            (None, Some(_)) => normalize_single_separator(&cleaned, '.'),
            (None, None) => cleaned,
        };

        Decimal::from_str(&canonical)
            .map(Self::new)
            .map_err(|_| MoneyError::InvalidAmount(text.to_string()))
    }
}

fn normalize_single_separator(text: &str, separator: char) -> String {
    let groups: Vec<&str> = text.split(separator).collect();
    let thousands = groups[1..].iter().all(|g| g.len() == 3);
    let grouping = thousands && (groups.len() > 2 || separator == '.');
    if grouping {
        groups.concat()
    } else if groups.len() > 2 {
        // "1,2,3" is not a number we can trust; keep the last mark as decimal
        let (int_part, frac) = text.rsplit_once(separator).unwrap_or((text, ""));
        format!("{}.{}", int_part.replace(separator, ""), frac)
    } else {
        text.replace(separator, ".")
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        <Decimal as Deserialize>::deserialize(deserializer).map(Money::new)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money::new(value)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    /// Strict parse of a plain decimal (`"1062.60"`), as written in backups
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Money::new)
            .map_err(|_| MoneyError::InvalidAmount(s.to_string()))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Money::new(self.0 + other.0)
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Money::new(self.0 - other.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn round_money_is_idempotent(value in -1.0e12f64..1.0e12f64) {
            let once = round_money_f64(value);
            prop_assert_eq!(round_money(once), once);
        }

        #[test]
        fn positive_difference_never_negative(
            a in -1_000_000i64..1_000_000i64,
            b in -1_000_000i64..1_000_000i64
        ) {
            let diff = positive_difference(Decimal::new(a, 2), Decimal::new(b, 2));
            prop_assert!(diff >= Decimal::ZERO);
        }
    }
}
