//! Fixed-point hour quantities.
//!
//! Work is booked with one decimal place ("2,5 Stunden"). Hours are kept as
//! integer tenths so that sums over many work logs stay exact.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use utoipa::ToSchema;

/// Errors raised when parsing or decoding an hour value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HoursError {
    #[error("hours must not be negative")]
    Negative,
    #[error("hours allow at most one decimal place: {raw}")]
    TooPrecise { raw: String },
    #[error("hours value is not a number: {raw}")]
    NotANumber { raw: String },
    #[error("hours value {raw} is out of range")]
    OutOfRange { raw: String },
}

/// Non-negative number of hours with one decimal place.
///
/// # Examples
/// ```
/// use arbeitsplan::domain::Hours;
///
/// let total: Hours = ["2.5", "3"].iter().map(|s| s.parse::<Hours>().unwrap()).sum();
/// assert_eq!(total.to_string(), "5.5");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, ToSchema)]
#[schema(value_type = f64, example = 2.5)]
pub struct Hours(u32);

impl Hours {
    /// Zero hours.
    pub const ZERO: Self = Self(0);

    /// Construct from a count of tenths of an hour.
    #[must_use]
    pub const fn from_tenths(tenths: u32) -> Self {
        Self(tenths)
    }

    /// Construct from whole hours.
    #[must_use]
    pub const fn from_whole(hours: u32) -> Self {
        Self(hours.saturating_mul(10))
    }

    /// Value in tenths of an hour.
    #[must_use]
    pub const fn tenths(self) -> u32 {
        self.0
    }

    /// Multiply by a head count, saturating at the maximum.
    #[must_use]
    pub const fn times(self, factor: u32) -> Self {
        Self(self.0.saturating_mul(factor))
    }

    /// Value as a float, for presentation and JSON.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 10.0
    }

    /// Decode a float, rejecting values that need more than one decimal.
    pub fn try_from_f64(value: f64) -> Result<Self, HoursError> {
        if value.is_nan() {
            return Err(HoursError::NotANumber {
                raw: value.to_string(),
            });
        }
        if value < 0.0 {
            return Err(HoursError::Negative);
        }
        let scaled = (value * 10.0).round();
        if (scaled - value * 10.0).abs() > 1e-6 {
            return Err(HoursError::TooPrecise {
                raw: value.to_string(),
            });
        }
        if scaled > f64::from(u32::MAX) {
            return Err(HoursError::OutOfRange {
                raw: value.to_string(),
            });
        }
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "value is a non-negative integer below u32::MAX after the checks above"
        )]
        let tenths = scaled as u32;
        Ok(Self(tenths))
    }
}

impl Add for Hours {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Hours {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Hours {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Hours {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

impl FromStr for Hours {
    type Err = HoursError;

    /// Accepts `3`, `2.5` and the German `2,5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.starts_with('-') {
            return Err(HoursError::Negative);
        }
        let not_a_number = || HoursError::NotANumber {
            raw: raw.to_owned(),
        };
        let out_of_range = || HoursError::OutOfRange {
            raw: raw.to_owned(),
        };
        let (whole, fraction) = match raw.split_once(['.', ',']) {
            Some((whole, fraction)) => (whole, fraction),
            None => (raw, ""),
        };
        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(not_a_number());
        }
        let whole: u32 = whole.parse().map_err(|_| out_of_range())?;
        let tenth = match fraction.as_bytes() {
            [] => 0,
            [digit] if digit.is_ascii_digit() => u32::from(digit - b'0'),
            [digit, rest @ ..] if digit.is_ascii_digit() && rest.iter().all(|b| *b == b'0') => {
                u32::from(digit - b'0')
            }
            bytes if bytes.iter().all(u8::is_ascii_digit) => {
                return Err(HoursError::TooPrecise {
                    raw: raw.to_owned(),
                });
            }
            _ => return Err(not_a_number()),
        };
        whole
            .checked_mul(10)
            .and_then(|tenths| tenths.checked_add(tenth))
            .map(Self)
            .ok_or_else(out_of_range)
    }
}

impl Serialize for Hours {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Hours {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::try_from_f64(value).map_err(de::Error::custom)
    }
}
