use std::{fmt, str::FromStr};

use serde::{Serialize, Serializer};

use crate::EngineError;

/// Number of fractional digits every stored amount carries.
pub const SCALE: u32 = 2;
const FACTOR: i64 = 10_i64.pow(SCALE);

/// Exact monetary amount stored as **hundredths** of the major unit.
///
/// Every amount in the ledger and in the reports uses this type, so sums and
/// differences never drift. Floating point only appears when the value is
/// serialised to JSON.
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(12_34);
/// assert_eq!(amount.minor(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects >
/// 2 decimals):
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("10".parse::<Money>().unwrap().minor(), 1000);
/// assert_eq!("10,5".parse::<Money>().unwrap().minor(), 1050);
/// assert!("12.345".parse::<Money>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Largest amount a single entry or budget may carry (`NUMERIC(14,2)`).
    pub const MAX: Money = Money(99_999_999_999_999);

    /// Creates a new amount from hundredths.
    #[must_use]
    pub const fn new(minor: i64) -> Self {
        Self(minor)
    }

    /// Creates an amount from whole major units (`Money::from_major(150_000)`).
    #[must_use]
    pub const fn from_major(major: i64) -> Self {
        Self(major * FACTOR)
    }

    /// Converts a floating point major amount, rounding to the nearest hundredth.
    ///
    /// Only meant for input boundaries (JSON numbers, assistant arguments).
    pub fn from_major_f64(value: f64) -> Result<Self, EngineError> {
        if !value.is_finite() {
            return Err(EngineError::InvalidAmount("amount must be finite".to_string()));
        }
        let scaled = (value * FACTOR as f64).round();
        if scaled.abs() > Self::MAX.0 as f64 {
            return Err(too_large());
        }
        Ok(Self(scaled as i64))
    }

    /// Returns the raw value in hundredths.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Lossy conversion used when emitting JSON numbers.
    #[must_use]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / FACTOR as f64
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// `true` when the amount fits a stored entry: `0..=Money::MAX`.
    #[must_use]
    pub const fn is_storable(self) -> bool {
        self.0 >= 0 && self.0 <= Self::MAX.0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Adds every amount, failing instead of wrapping.
    pub fn try_sum<I: IntoIterator<Item = Money>>(amounts: I) -> Result<Money, EngineError> {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, amount| acc.checked_add(amount))
            .ok_or_else(total_out_of_range)
    }
}

fn too_large() -> EngineError {
    EngineError::InvalidAmount(format!("amount exceeds {}", Money::MAX))
}

pub(crate) fn total_out_of_range() -> EngineError {
    EngineError::InvalidAmount("total out of range".to_string())
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let major = abs / FACTOR as u64;
        let minor = abs % FACTOR as u64;
        write!(f, "{sign}{major}.{minor:02}")
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a decimal string into hundredths.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
    /// Rejects more than two fractional digits and empty input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || EngineError::InvalidAmount("empty amount".to_string());
        let invalid = || EngineError::InvalidAmount(format!("invalid amount: {s}"));

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (negative, rest) = match trimmed.as_bytes()[0] {
            b'-' => (true, &trimmed[1..]),
            b'+' => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let rest = rest.trim();
        if rest.is_empty() {
            return Err(empty());
        }

        let rest = rest.replace(',', ".");
        let (major_str, frac_str) = match rest.split_once('.') {
            Some((major, frac)) => (major, frac),
            None => (rest.as_str(), ""),
        };

        if major_str.is_empty() || !major_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if !frac_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if frac_str.len() > SCALE as usize {
            return Err(EngineError::InvalidAmount("too many decimals".to_string()));
        }

        let major: i64 = major_str.parse().map_err(|_| too_large())?;
        let minor: i64 = match frac_str.len() {
            0 => 0,
            1 => frac_str.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => frac_str.parse::<i64>().map_err(|_| invalid())?,
        };

        let total = major
            .checked_mul(FACTOR)
            .and_then(|v| v.checked_add(minor))
            .filter(|v| *v <= Self::MAX.0)
            .ok_or_else(too_large)?;

        Ok(Money(if negative { -total } else { total }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_two_decimals() {
        assert_eq!(Money::new(0).to_string(), "0.00");
        assert_eq!(Money::new(1).to_string(), "0.01");
        assert_eq!(Money::new(1050).to_string(), "10.50");
        assert_eq!(Money::new(-1050).to_string(), "-10.50");
        assert_eq!(Money::from_major(5_000_000).to_string(), "5000000.00");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!("10".parse::<Money>().unwrap().minor(), 1000);
        assert_eq!("10.5".parse::<Money>().unwrap().minor(), 1050);
        assert_eq!("10,50".parse::<Money>().unwrap().minor(), 1050);
        assert_eq!("-0.01".parse::<Money>().unwrap().minor(), -1);
        assert_eq!("+1.00".parse::<Money>().unwrap().minor(), 100);
        assert_eq!("  2.30 ".parse::<Money>().unwrap().minor(), 230);
        assert_eq!("7.".parse::<Money>().unwrap().minor(), 700);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("12.345".parse::<Money>().is_err());
        assert!("".parse::<Money>().is_err());
        assert!("-".parse::<Money>().is_err());
        assert!("1.2.3".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("99999999999999999999".parse::<Money>().is_err());
    }

    #[test]
    fn float_boundary_rounds_to_hundredths() {
        assert_eq!(Money::from_major_f64(0.1 + 0.2).unwrap().minor(), 30);
        assert_eq!(Money::from_major_f64(150_000.0).unwrap().minor(), 15_000_000);
        assert!(Money::from_major_f64(f64::NAN).is_err());
        assert!((Money::new(123_456).to_f64() - 1234.56).abs() < f64::EPSILON);
    }

    #[test]
    fn sum_is_exact() {
        let total = Money::try_sum(std::iter::repeat_n(Money::new(10), 10)).unwrap();
        assert_eq!(total, Money::new(100));
    }

    #[test]
    fn amounts_stop_at_numeric_14_2() {
        assert_eq!("999999999999.99".parse::<Money>().unwrap(), Money::MAX);
        assert!("1000000000000".parse::<Money>().is_err());
        assert!("-1000000000000".parse::<Money>().is_err());
        assert_eq!(Money::from_major_f64(999_999_999_999.99).unwrap(), Money::MAX);
        assert!(Money::from_major_f64(1e12).is_err());
        assert!(Money::MAX.is_storable());
        assert!(!Money::new(Money::MAX.minor() + 1).is_storable());
        assert!(!Money::new(-1).is_storable());
    }

    #[test]
    fn sums_report_overflow() {
        assert!(Money::new(i64::MAX).checked_add(Money::new(1)).is_none());
        assert!(Money::try_sum([Money::new(i64::MAX), Money::new(1)]).is_err());
    }
}
