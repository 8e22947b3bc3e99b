//! Conversion between integer metadata units and seconds.
//!
//! A [`Timebase`] is the rational `num/den` that scales one unit to seconds.
//! Metadata files that never declare a usable timebase are read and written
//! in milliseconds.

use std::fmt;
use std::str::FromStr;

/// Rational scale factor converting integer units to seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Timebase {
    pub num: i64,
    pub den: i64,
}

impl Timebase {
    /// Millisecond timebase (`1/1000`), the default and the fallback.
    pub const MILLIS: Timebase = Timebase { num: 1, den: 1000 };

    pub const fn new(num: i64, den: i64) -> Self {
        Self { num, den }
    }

    /// Both terms strictly positive.
    pub fn is_valid(&self) -> bool {
        self.num > 0 && self.den > 0
    }

    pub fn units_to_seconds(&self, units: i64) -> f64 {
        units_to_seconds(units, self.num, self.den)
    }

    pub fn seconds_to_units(&self, seconds: f64) -> i64 {
        seconds_to_units(seconds, self.num, self.den)
    }
}

impl Default for Timebase {
    fn default() -> Self {
        Self::MILLIS
    }
}

impl fmt::Display for Timebase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl FromStr for Timebase {
    type Err = String;

    /// Parses `num/den`. Non-positive terms are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (num, den) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| format!("Timebase must be num/den: {}", s))?;
        let num: i64 = num
            .trim()
            .parse()
            .map_err(|_| format!("Invalid timebase numerator: {}", num))?;
        let den: i64 = den
            .trim()
            .parse()
            .map_err(|_| format!("Invalid timebase denominator: {}", den))?;

        let tb = Timebase::new(num, den);
        if !tb.is_valid() {
            return Err(format!("Timebase terms must be positive: {}", s));
        }
        Ok(tb)
    }
}

/// `units * (num / den)`.
///
/// This pair of functions is where the `num, den > 0` rule is enforced for
/// arithmetic: a non-positive term on either side reads the units as
/// milliseconds, matching the write-path fallback of [`seconds_to_units`].
/// [`Timebase::from_str`] rejects such terms, so only a hand-built
/// [`Timebase`] can reach the fallback.
pub fn units_to_seconds(units: i64, num: i64, den: i64) -> f64 {
    if num <= 0 || den <= 0 {
        return units as f64 / 1000.0;
    }
    units as f64 * (num as f64 / den as f64)
}

/// `round(seconds * den / num)`, rounding half away from zero.
///
/// Non-positive terms fall back to a fixed millisecond timebase.
pub fn seconds_to_units(seconds: f64, num: i64, den: i64) -> i64 {
    if num <= 0 || den <= 0 {
        return (seconds * 1000.0).round() as i64;
    }
    (seconds * (den as f64 / num as f64)).round() as i64
}
