//! # Domain Types
//!
//! Identifiers and descriptors shared by every engine component.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Carrier      │   │ DynamicCarrier  │   │  CartSummary    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  code           │◄──│  owner          │   │  weight_kg      │       │
//! │  │  name           │   │  id (numeric)   │   │  price          │       │
//! │  │  pricing rules? │   │  country        │   │  is_cod         │       │
//! │  └─────────────────┘   │  max_weight     │   │  age check?     │       │
//! │                        │  methods        │   └─────────────────┘       │
//! │  ┌─────────────────┐   │  deleted        │                              │
//! │  │  CountryCode    │   └─────────────────┘                              │
//! │  │  "cz", "sk" ... │                                                    │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::method::Method;
use crate::money::Money;
use crate::RESERVED_CARRIER_MARKER;

/// External carrier-system identifier of a delivery destination or
/// pickup point network ("Mordor id").
pub type PointId = String;

// =============================================================================
// Country Code
// =============================================================================

/// ISO 3166-1 alpha-2 country code, always lowercase.
///
/// Construction trims and lowercases, so `"CZ"` and `" cz"` both become
/// `"cz"`. Anything that is not exactly two ASCII letters is rejected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    pub fn new(raw: &str) -> Result<Self, ValidationError> {
        let code = raw.trim().to_ascii_lowercase();
        if code.is_empty() {
            return Err(ValidationError::Required {
                field: "country".to_string(),
            });
        }
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(ValidationError::InvalidFormat {
                field: "country".to_string(),
                reason: format!("expected two ASCII letters, got {raw:?}"),
            });
        }
        Ok(CountryCode(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CountryCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CountryCode::new(s)
    }
}

impl TryFrom<String> for CountryCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CountryCode::new(&value)
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.0
    }
}

// =============================================================================
// Carrier Code
// =============================================================================

/// Externally assigned, stable carrier identifier (e.g. `packetery_zpoint`).
///
/// Identity is injected by configuration, never derived from where the
/// carrier's implementation lives.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
#[serde(transparent)]
pub struct CarrierCode(String);

impl CarrierCode {
    pub fn new(code: impl Into<String>) -> Result<Self, ValidationError> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "carrier code".to_string(),
            });
        }
        Ok(CarrierCode(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the code carries the plugin's reserved marker, i.e. the
    /// carrier may appear in a rate code.
    pub fn is_plugin_owned(&self) -> bool {
        self.0.contains(RESERVED_CARRIER_MARKER)
    }
}

impl fmt::Display for CarrierCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for CarrierCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl FromStr for CarrierCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CarrierCode::new(s)
    }
}

// =============================================================================
// Carrier
// =============================================================================

/// Static carrier descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carrier {
    pub code: CarrierCode,
    pub name: String,
    /// Whether generic host pricing rules may target this carrier.
    #[serde(default)]
    pub available_for_pricing_rules: bool,
}

impl Carrier {
    pub fn new(code: CarrierCode, name: impl Into<String>) -> Self {
        Carrier {
            code,
            name: name.into(),
            available_for_pricing_rules: false,
        }
    }
}

// =============================================================================
// Dynamic Carrier
// =============================================================================

/// A sub-carrier discovered at runtime and owned by one static carrier.
///
/// ## Tombstones
/// `deleted` carriers stay in the registry so historical orders can still
/// be resolved, but they are never offered for a new selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicCarrier {
    pub id: u32,
    pub owner: CarrierCode,
    pub country: CountryCode,
    pub name: String,
    /// Maximum parcel weight in kilograms, if the carrier has one.
    #[serde(default)]
    pub max_weight: Option<f64>,
    pub methods: BTreeSet<Method>,
    #[serde(default = "default_true")]
    pub supports_cod: bool,
    #[serde(default)]
    pub supports_age_verification: bool,
    #[serde(default)]
    pub deleted: bool,
}

fn default_true() -> bool {
    true
}

impl DynamicCarrier {
    /// True when the carrier accepts a parcel of `weight_kg`.
    pub fn accepts_weight(&self, weight_kg: f64) -> bool {
        self.max_weight.map_or(true, |max| weight_kg <= max)
    }

    pub fn supports_any(&self, methods: &BTreeSet<Method>) -> bool {
        !self.methods.is_disjoint(methods)
    }
}

// =============================================================================
// Cart Summary
// =============================================================================

/// What the engine needs to know about a cart.
///
/// ## Weight
/// Kilograms. Callers are expected to round with
/// [`round_weight`](crate::validation::round_weight) before building the
/// summary; the engine compares whatever it is given.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CartSummary {
    pub weight_kg: f64,
    pub price: Money,
    /// Cash on delivery was chosen as the payment method.
    #[serde(default)]
    pub is_cod: bool,
    /// Cart contains goods that require age verification on delivery.
    #[serde(default)]
    pub requires_age_verification: bool,
}

impl CartSummary {
    pub fn new(weight_kg: f64, price: Money) -> Self {
        CartSummary {
            weight_kg,
            price,
            is_cod: false,
            requires_age_verification: false,
        }
    }

    pub fn with_cod(mut self, is_cod: bool) -> Self {
        self.is_cod = is_cod;
        self
    }

    pub fn with_age_verification(mut self, required: bool) -> Self {
        self.requires_age_verification = required;
        self
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
