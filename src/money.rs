// Currency and percentage value types
// Every price or percentage that crosses the API boundary is parsed into one of these,
// so a non-numeric or negative value is rejected before it can reach the calculator.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::str::FromStr;
use thiserror::Error;

// Fraction digits used for display and for amounts sent to the backend
pub const DISPLAY_SCALE: u32 = 2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Not a numeric amount: {0:?}")]
    NotNumeric(String),

    #[error("Amount must not be negative: {0}")]
    Negative(Decimal),

    #[error("Percentage out of range 0-100: {0}")]
    OutOfRange(Decimal),

    #[error("Amount too large to represent: {0}")]
    TooLarge(String),
}

/// Non-negative currency amount with exact decimal arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative(amount));
        }
        Ok(Money(amount.normalize()))
    }

    // Whole currency units, handy in tests and for integral room rates
    pub fn from_units(units: u64) -> Self {
        Money(Decimal::from(units))
    }

    pub fn from_f64(value: f64) -> Result<Self, MoneyError> {
        decimal_from_f64(value).and_then(Self::new)
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_mul(self, factor: Decimal) -> Option<Money> {
        self.0.checked_mul(factor).map(Money)
    }

    // Subtraction that floors at zero; a Money is never negative
    pub fn saturating_sub(self, other: Money) -> Money {
        if other.0 >= self.0 {
            Money::ZERO
        } else {
            Money(self.0 - other.0)
        }
    }

    pub fn rounded(self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

// Display gives the shortest round-trip form, so 1000.5 stays 1000.5 instead of 1000.49999...
fn decimal_from_f64(value: f64) -> Result<Decimal, MoneyError> {
    if !value.is_finite() {
        return Err(MoneyError::NotNumeric(value.to_string()));
    }
    Decimal::from_str(&value.to_string())
        .map_err(|_| MoneyError::TooLarge(value.to_string()))
}

fn decimal_from_text(text: &str) -> Result<Decimal, MoneyError> {
    let trimmed = text.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| MoneyError::NotNumeric(text.to_string()))
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decimal_from_text(s).and_then(Money::new)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.rounded().0;
        write!(f, "{:.2}", rounded)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        Money(iter.map(|m| m.0).sum())
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// Amounts go out as plain JSON numbers
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use rust_decimal::prelude::ToPrimitive;
        match self.0.to_f64() {
            Some(value) => serializer.serialize_f64(value),
            None => serializer.serialize_str(&self.0.to_string()),
        }
    }
}

// The backend is inconsistent: some endpoints send "1000.50", others 1000.5
#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Text(String),
    Number(f64),
}

impl RawNumber {
    fn into_decimal(self) -> Result<Decimal, MoneyError> {
        match self {
            RawNumber::Text(text) => decimal_from_text(&text),
            RawNumber::Number(value) => decimal_from_f64(value),
        }
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawNumber::deserialize(deserializer)?;
        raw.into_decimal()
            .and_then(Money::new)
            .map_err(de::Error::custom)
    }
}

/// Discount percentage, always within 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Percentage(Decimal);

impl Percentage {
    pub const ZERO: Percentage = Percentage(Decimal::ZERO);
    pub const FULL: Percentage = Percentage(Decimal::ONE_HUNDRED);

    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(MoneyError::Negative(value));
        }
        if value > Decimal::ONE_HUNDRED {
            return Err(MoneyError::OutOfRange(value));
        }
        Ok(Percentage(value.normalize()))
    }

    pub fn from_units(value: u8) -> Result<Self, MoneyError> {
        Self::new(Decimal::from(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    // Portion of `amount` this percentage represents, or None on overflow
    pub fn of(&self, amount: Money) -> Option<Money> {
        amount
            .amount()
            .checked_mul(self.0)
            .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
            .map(Money)
    }
}

impl FromStr for Percentage {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decimal_from_text(s.trim().trim_end_matches('%')).and_then(Percentage::new)
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl Serialize for Percentage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use rust_decimal::prelude::ToPrimitive;
        match self.0.to_f64() {
            Some(value) => serializer.serialize_f64(value),
            None => serializer.serialize_str(&self.0.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for Percentage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawNumber::deserialize(deserializer)?;
        raw.into_decimal()
            .and_then(Percentage::new)
            .map_err(de::Error::custom)
    }
}
