//! # Money Module
//!
//! Provides the `Money` type for shipping prices, surcharges and
//! free-shipping thresholds.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Persisted tier prices arrive as decimal strings: "49.90", "0.1"       │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ surcharge drifts                 │
//! │                                                                         │
//! │  Threshold checks are boundary sensitive:                               │
//! │    cart 50.00 >= free shipping 50.00 must hold exactly                 │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (hundredths)                         │
//! │    "49.90" → 4990, comparisons and sums are exact                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine is currency agnostic: a carrier config and the cart it is
//! evaluated against are always in the same currency.
//!
//! ## Usage
//! ```rust
//! use packetery_core::money::Money;
//!
//! let base = Money::from_major(20);
//! let surcharge: Money = "5.50".parse().unwrap();
//! assert_eq!((base + surcharge).minor(), 2550);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in hundredths of the currency's major unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: arithmetic never has to special-case differences
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serialized as minor units**: what the checkout widget receives
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ```rust
    /// use packetery_core::money::Money;
    ///
    /// assert_eq!(Money::from_minor(1099).minor(), 1099);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from a whole number of major units.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero (free shipping).
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Value as a float in major units, for hosts that price in floats.
    #[inline]
    pub fn as_major_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parses a persisted decimal amount.
///
/// ## Accepted Forms
/// ```text
/// "20"      → 2000
/// "20.5"    → 2050
/// "20,50"   → 2050   (comma decimal separator, common in CZ/SK admins)
/// " 7.00 "  → 700    (surrounding whitespace ignored)
/// "-3.25"   → -325
/// ```
///
/// More than two fractional digits, thousands separators and empty input
/// are rejected: a price we cannot represent exactly must not be rounded
/// silently.
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: format!("{reason}: {raw:?}"),
        };

        let (negative, unsigned) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let normalized = unsigned.replace(',', ".");
        let (whole, fraction) = match normalized.split_once('.') {
            Some((w, f)) => (w, f),
            None => (normalized.as_str(), ""),
        };

        if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected digits before the decimal separator"));
        }
        if fraction.len() > 2 || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected at most two decimal digits"));
        }

        let whole: i64 = whole.parse().map_err(|_| invalid("amount too large"))?;
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid("bad fraction"))? * 10,
            _ => fraction.parse().map_err(|_| invalid("bad fraction"))?,
        };

        let minor = whole
            .checked_mul(100)
            .and_then(|m| m.checked_add(fraction))
            .ok_or_else(|| invalid("amount too large"))?;

        Ok(Money(if negative { -minor } else { minor }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering, no currency symbol: "20.50".
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor_part())
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
