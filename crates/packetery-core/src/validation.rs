//! # Validation Module
//!
//! Input checks applied by collaborators before handing data to the engine.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Host checkout                                                │
//! │  └── Builds the cart (weights summed, prices in shop currency)        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Weight is finite and non-negative, rounded to grams              │
//! │  ├── Amounts parse exactly and are non-negative                       │
//! │  └── Tier tables are ascending (reported, not enforced)               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Engine                                                       │
//! │  └── Compares values as given; never sorts, never rounds              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Decimal places weights are compared at (grams).
pub const WEIGHT_PRECISION: i32 = 3;

// =============================================================================
// Weight
// =============================================================================

/// Rounds a weight in kilograms to three decimal places.
///
/// ## Example
/// ```rust
/// use packetery_core::validation::round_weight;
///
/// assert_eq!(round_weight(4.99951), 5.0);
/// assert_eq!(round_weight(1.2344), 1.234);
/// ```
pub fn round_weight(weight_kg: f64) -> f64 {
    let factor = 10f64.powi(WEIGHT_PRECISION);
    (weight_kg * factor).round() / factor
}

/// Validates a cart or limit weight.
///
/// ## Rules
/// - Must be a finite number
/// - Must not be negative (zero is a legal, if odd, cart weight)
pub fn validate_weight(field: &str, weight_kg: f64) -> ValidationResult<()> {
    if !weight_kg.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a finite number".to_string(),
        });
    }
    if weight_kg < 0.0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Parses and validates a weight given as text (CLI flags, settings).
pub fn parse_weight(field: &str, raw: &str) -> ValidationResult<f64> {
    let normalized = raw.trim().replace(',', ".");
    if normalized.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    let weight: f64 = normalized
        .parse()
        .map_err(|_| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("not a number: {raw:?}"),
        })?;
    validate_weight(field, weight)?;
    Ok(weight)
}

// =============================================================================
// Amount
// =============================================================================

/// Parses a price, threshold or surcharge given as text.
///
/// Shipping is never paid out, so negative amounts are refused.
pub fn parse_amount(field: &str, raw: &str) -> ValidationResult<Money> {
    let amount: Money = raw.parse().map_err(|err| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: format!("{err}"),
    })?;
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(amount)
}

// =============================================================================
// Ordering
// =============================================================================

/// True when `keys` never decreases.
///
/// Tier tables are evaluated first-match in stored order; a table that is
/// not ascending still evaluates, it just shadows its later rows.
pub fn is_ascending<T: PartialOrd>(keys: impl IntoIterator<Item = T>) -> bool {
    let mut previous: Option<T> = None;
    for key in keys {
        if let Some(prev) = &previous {
            if key < *prev {
                return false;
            }
        }
        previous = Some(key);
    }
    true
}

// =============================================================================
// Unit Tests
// =============================================================================
