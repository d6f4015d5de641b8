//! Fixed-point money with two fractional digits.

use core::iter::Sum;
use core::ops::{Add, Sub};
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

const MINOR_PER_MAJOR: i64 = 100;

/// An amount in minor currency units (1/100 of the major unit).
///
/// Integer arithmetic only: `quantity × unit_price` is exact, and overflow is
/// reported instead of wrapping.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Whole major units, e.g. `Money::from_major(12)` is `12.00`.
    pub fn from_major(major: i64) -> Option<Self> {
        major.checked_mul(MINOR_PER_MAJOR).map(Self)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// `self × quantity`, `None` on overflow.
    pub fn checked_mul_quantity(self, quantity: i64) -> Option<Money> {
        self.0.checked_mul(quantity).map(Money)
    }

    /// Line total for a sale or a stock valuation.
    pub fn total_for(self, quantity: i64) -> Result<Money, DomainError> {
        self.checked_mul_quantity(quantity).ok_or_else(|| {
            DomainError::validation(format!("amount overflow: {self} x {quantity}"))
        })
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per = MINOR_PER_MAJOR as u64;
        write!(f, "{sign}{}.{:02}", abs / per, abs % per)
    }
}

/// Parses amounts as typed into a shop form.
///
/// Whitespace and `,` thousands separators are ignored, so `"1 200"` and
/// `"1,200.50"` are both accepted. At most two fractional digits.
impl FromStr for Money {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ',')
            .collect();

        let (negative, digits) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, cleaned.as_str()),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));

        let is_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty()) || !is_digits(whole) || !is_digits(frac) {
            return Err(DomainError::validation(format!("malformed amount: {s:?}")));
        }
        if frac.len() > 2 {
            return Err(DomainError::validation(format!(
                "amount has more than two fractional digits: {s:?}"
            )));
        }

        let overflow = || DomainError::validation(format!("amount out of range: {s:?}"));
        let whole_units: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| overflow())?
        };
        let frac_units: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| overflow())? * 10,
            _ => frac.parse().map_err(|_| overflow())?,
        };

        let minor = whole_units
            .checked_mul(MINOR_PER_MAJOR)
            .and_then(|v| v.checked_add(frac_units))
            .ok_or_else(overflow)?;

        Ok(Money(if negative { -minor } else { minor }))
    }
}
