//! # Error Types
//!
//! Domain-specific error types for packetery-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  packetery-core errors (this file)                                     │
//! │  ├── CoreError        - Fatal configuration / wire errors              │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  packetery-settings errors (separate crate)                            │
//! │  └── SettingsError    - File, TOML and feed failures                   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SettingsError → CLI (anyhow)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What Is NOT An Error
//! "This carrier cannot serve this cart" is an ordinary business state.
//! Unresolvable point ids, unserved countries, weights past every tier,
//! unmatched surcharge tiers and unknown dynamic carrier ids all surface as
//! `None` or an empty `Vec`, never as a variant below.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core engine errors.
///
/// Every variant here means the input must not be guessed at: continuing
/// would mis-price an order or ship it with the wrong carrier.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A rate code does not match the wire grammar.
    ///
    /// ## When This Occurs
    /// - Tampered or stale checkout request
    /// - Carrier segment without the reserved `packetery` marker
    /// - Unknown method token or non-numeric dynamic carrier id
    #[error("Unrecognized rate code: {0}")]
    UnrecognizedRateCode(String),

    /// Persisted applicable-countries discriminator is neither "all" nor
    /// "specific" (nor their numeric forms "0" / "1").
    #[error("Invalid applicable countries setting for {carrier}: {value:?}")]
    InvalidApplicableCountries { carrier: String, value: String },

    /// A well-formed rate code names a carrier the registry does not know.
    #[error("Carrier not registered: {0}")]
    UnknownCarrier(String),

    /// Overlay chain would exceed the supported depth.
    #[error("Dynamic config overlay depth exceeds {max}")]
    OverlayTooDeep { max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised at construction boundaries (country codes, money strings,
/// weights) before the engine runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., country code, decimal amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
