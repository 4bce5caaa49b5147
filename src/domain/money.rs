use crate::error::EngineError;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound for a single time entry.
pub const MAX_HOURS_PER_ENTRY: Decimal = dec!(24);

fn out_of_range() -> EngineError {
    EngineError::validation("Amount is out of range")
}

/// A monetary value in the contract currency.
///
/// Wraps `rust_decimal::Decimal` so that fee arithmetic never goes through
/// floating point. Serializes as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Builds an amount that is going to be stored on an entity.
    pub fn non_negative(value: Decimal) -> Result<Self, EngineError> {
        if value >= Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(EngineError::validation("Amount must not be negative"))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self, EngineError> {
        self.0.checked_add(rhs.0).map(Self).ok_or_else(out_of_range)
    }

    pub fn checked_sub(self, rhs: Self) -> Result<Self, EngineError> {
        self.0.checked_sub(rhs.0).map(Self).ok_or_else(out_of_range)
    }

    /// Multiplies by a rate or an hour count, failing instead of overflowing.
    pub fn times(self, factor: Decimal) -> Result<Self, EngineError> {
        self.0.checked_mul(factor).map(Self).ok_or_else(out_of_range)
    }

    /// Rounds to whole cents, midpoint away from zero.
    pub fn round_cents(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

/// A positive quantity of logged hours, at most one day per entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Hours(Decimal);

impl Hours {
    pub fn new(value: Decimal) -> Result<Self, EngineError> {
        if value <= Decimal::ZERO {
            return Err(EngineError::validation("Hours must be greater than zero"));
        }
        if value > MAX_HOURS_PER_ENTRY {
            return Err(EngineError::validation(format!(
                "Hours must not exceed {} per entry",
                MAX_HOURS_PER_ENTRY
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Hours {
    type Error = EngineError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Hours> for Decimal {
    fn from(hours: Hours) -> Self {
        hours.0
    }
}

impl fmt::Display for Hours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// Sums hours as a plain decimal; an empty period totals zero, which
/// `Hours` itself cannot represent.
pub fn total_hours<'a>(
    hours: impl IntoIterator<Item = &'a Hours>,
) -> Result<Decimal, EngineError> {
    hours.into_iter().try_fold(Decimal::ZERO, |acc, h| {
        acc.checked_add(h.0)
            .ok_or_else(|| EngineError::validation("Total hours are out of range"))
    })
}
