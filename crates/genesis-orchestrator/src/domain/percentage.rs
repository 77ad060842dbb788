//! Fixed-point percentages.
//!
//! A percentage is stored as an integer count of `1e-9` percent, so a table
//! such as `33.333333334 / 33.333333333 / 33.333333333` sums to exactly 100
//! without any floating point.

use std::fmt;
use std::str::FromStr;

use serde_with::{DeserializeFromStr, SerializeDisplay};
use thiserror::Error;

/// Fractional digits a percentage may carry.
pub const FRACTION_DIGITS: u32 = 9;

/// Scaled units per whole percent.
pub const SCALE: u64 = 1_000_000_000;

/// 100% in scaled units.
pub const HUNDRED_PERCENT: u64 = 100 * SCALE;

/// Percentage parse failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PercentageError {
    #[error("percentage is empty")]
    Empty,

    #[error("malformed percentage {0:?}")]
    Malformed(String),

    #[error("percentage {0:?} has more than 9 fractional digits")]
    TooPrecise(String),

    #[error("percentage {0} is outside (0, 100]")]
    OutOfRange(String),
}

/// A percentage in `(0, 100]` with up to nine fractional digits.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct Percentage(u64);

impl Percentage {
    /// Build from scaled units (`1e-9` percent each).
    pub fn from_scaled(units: u64) -> Result<Self, PercentageError> {
        if units == 0 || units > HUNDRED_PERCENT {
            return Err(PercentageError::OutOfRange(format_scaled(units)));
        }
        Ok(Self(units))
    }

    /// Build from a whole number of percent.
    pub fn whole(percent: u64) -> Result<Self, PercentageError> {
        let units = percent
            .checked_mul(SCALE)
            .ok_or_else(|| PercentageError::OutOfRange(percent.to_string()))?;
        Self::from_scaled(units)
    }

    /// Scaled units.
    pub fn scaled(&self) -> u64 {
        self.0
    }

    /// `floor(total * self / 100)`, computed without overflow.
    pub fn share_of(&self, total: u64) -> u64 {
        let share = u128::from(total) * u128::from(self.0) / u128::from(HUNDRED_PERCENT);
        // self <= 100%, so share <= total
        share as u64
    }
}

/// Render scaled units as a decimal percentage without trailing zeros.
pub fn format_scaled(units: u64) -> String {
    let whole = units / SCALE;
    let fraction = units % SCALE;
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = format!("{:09}", fraction);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_scaled(self.0))
    }
}

impl fmt::Debug for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self)
    }
}

impl FromStr for Percentage {
    type Err = PercentageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().trim_end_matches('%');
        if text.is_empty() {
            return Err(PercentageError::Empty);
        }

        let (whole, fraction) = match text.split_once('.') {
            Some((w, f)) => (w, f),
            None => (text, ""),
        };
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || !all_digits(fraction) {
            return Err(PercentageError::Malformed(s.to_string()));
        }
        if text.contains('.') && fraction.is_empty() {
            return Err(PercentageError::Malformed(s.to_string()));
        }
        if fraction.len() > FRACTION_DIGITS as usize {
            return Err(PercentageError::TooPrecise(s.to_string()));
        }

        let whole: u64 = whole
            .parse()
            .map_err(|_| PercentageError::OutOfRange(s.to_string()))?;
        let mut fraction_units: u64 = 0;
        if !fraction.is_empty() {
            // right-pad to nine digits
            let padded = format!("{:0<9}", fraction);
            fraction_units = padded
                .parse()
                .map_err(|_| PercentageError::Malformed(s.to_string()))?;
        }

        let units = whole
            .checked_mul(SCALE)
            .and_then(|w| w.checked_add(fraction_units))
            .ok_or_else(|| PercentageError::OutOfRange(s.to_string()))?;
        Self::from_scaled(units).map_err(|_| PercentageError::OutOfRange(s.to_string()))
    }
}
