//! # Settings Error Types
//!
//! Error types for loading settings and the carrier feed.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Settings Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Carrier Feed  │  │     Engine              │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  FeedLoadFailed │  │  Core (CoreError)       │ │
//! │  │  ConfigLoad     │  │  InvalidFeed    │  │                         │ │
//! │  │  ConfigSave     │  │                 │  │                         │ │
//! │  │  InvalidCarrier │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use packetery_core::{CoreError, ValidationError};
use thiserror::Error;

/// Result type alias for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Everything that can go wrong turning files into a `RateEngine`.
#[derive(Debug, Error)]
pub enum SettingsError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Settings parsed but are inconsistent.
    #[error("Invalid settings: {0}")]
    InvalidConfig(String),

    /// One carrier's declaration or options are malformed.
    #[error("Invalid settings for carrier {carrier}: {reason}")]
    InvalidCarrier { carrier: String, reason: String },

    /// Failed to read or parse the settings file.
    #[error("Failed to load settings: {0}")]
    ConfigLoadFailed(String),

    /// Failed to write the settings file.
    #[error("Failed to save settings: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Carrier Feed Errors
    // =========================================================================
    /// Failed to read the carrier feed file.
    #[error("Failed to load carrier feed: {0}")]
    FeedLoadFailed(String),

    /// Carrier feed parsed as JSON but a record is unusable.
    #[error("Invalid carrier feed record {id}: {reason}")]
    InvalidFeed { id: String, reason: String },

    // =========================================================================
    // Engine Errors
    // =========================================================================
    /// Fatal engine error raised while building tables.
    #[error(transparent)]
    Core(#[from] CoreError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<ValidationError> for SettingsError {
    fn from(err: ValidationError) -> Self {
        SettingsError::Core(CoreError::Validation(err))
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(err: std::io::Error) -> Self {
        SettingsError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SettingsError {
    fn from(err: toml::de::Error) -> Self {
        SettingsError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SettingsError {
    fn from(err: toml::ser::Error) -> Self {
        SettingsError::ConfigSaveFailed(err.to_string())
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        SettingsError::FeedLoadFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SettingsError {
    /// Returns true if fixing the settings file would fix this error.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SettingsError::InvalidConfig(_)
                | SettingsError::InvalidCarrier { .. }
                | SettingsError::ConfigLoadFailed(_)
                | SettingsError::ConfigSaveFailed(_)
                | SettingsError::Core(CoreError::InvalidApplicableCountries { .. })
                | SettingsError::Core(CoreError::Validation(_))
        )
    }

    /// Returns true if the carrier feed is at fault. A fresh sync usually
    /// fixes these.
    pub fn is_feed_error(&self) -> bool {
        matches!(
            self,
            SettingsError::FeedLoadFailed(_) | SettingsError::InvalidFeed { .. }
        )
    }

    /// Attaches the carrier code to a lower-level error.
    pub(crate) fn for_carrier(carrier: &str, err: impl std::fmt::Display) -> Self {
        SettingsError::InvalidCarrier {
            carrier: carrier.to_string(),
            reason: err.to_string(),
        }
    }
}
