//! # Carrier Options
//!
//! Per-carrier options exactly as the shop admin stores them: strings for
//! every number, a string discriminator for country applicability, empty
//! strings for "not set". [`CarrierOptions::to_config`] turns them into a
//! typed [`CarrierConfig`].
//!
//! ## File Format
//! ```toml
//! [carriers.options]
//! active = true
//! allowed_methods = ["pickupPointDelivery", "addressDelivery"]
//! applicable_countries = "specific"     # all | specific | 0 | 1
//! specific_countries = ["cz", "sk"]
//! max_weight = "10"
//! free_shipping_limit = "1500"
//! cod_payment_method = "cod"
//! weight_limits = [
//!     { weight = "5", price = "79" },
//!     { weight = "10", price = "99,90" },
//! ]
//! surcharge_limits = [
//!     { order_price = "1000", surcharge = "30" },
//! ]
//! ```

use std::collections::BTreeSet;

use packetery_core::validation::{parse_amount, parse_weight};
use packetery_core::{
    ApplicableCountries, CarrierCode, CarrierConfig, CountryCode, Method, SurchargeTier,
    WeightTier,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{SettingsError, SettingsResult};

// =============================================================================
// Flag
// =============================================================================

/// Boolean-ish admin flag: `true`, `"1"`, `"yes"`, `"on"` all mean set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Flag {
    Bool(bool),
    Text(String),
}

impl Flag {
    pub fn is_set(&self) -> bool {
        match self {
            Flag::Bool(value) => *value,
            Flag::Text(text) => matches!(
                text.trim().to_ascii_lowercase().as_str(),
                "1" | "yes" | "true" | "on"
            ),
        }
    }
}

impl Default for Flag {
    fn default() -> Self {
        Flag::Bool(true)
    }
}

// =============================================================================
// Tier Rows
// =============================================================================

/// One row of the weight price table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightLimit {
    #[serde(default)]
    pub weight: String,
    #[serde(default)]
    pub price: String,
}

/// One row of the COD surcharge table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurchargeLimit {
    #[serde(default)]
    pub order_price: String,
    #[serde(default)]
    pub surcharge: String,
}

// =============================================================================
// Carrier Options
// =============================================================================

/// Raw persisted options for one carrier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierOptions {
    #[serde(default)]
    pub active: Flag,

    /// Method tokens; empty leaves the carrier's catalogue in charge.
    #[serde(default)]
    pub allowed_methods: Vec<String>,

    #[serde(default = "default_applicable_countries")]
    pub applicable_countries: String,

    #[serde(default)]
    pub specific_countries: Vec<String>,

    #[serde(default)]
    pub max_weight: String,

    #[serde(default)]
    pub free_shipping_limit: String,

    #[serde(default)]
    pub weight_limits: Vec<WeightLimit>,

    #[serde(default)]
    pub surcharge_limits: Vec<SurchargeLimit>,

    #[serde(default)]
    pub cod_payment_method: String,
}

fn default_applicable_countries() -> String {
    "all".to_string()
}

impl Default for CarrierOptions {
    fn default() -> Self {
        CarrierOptions {
            active: Flag::default(),
            allowed_methods: Vec::new(),
            applicable_countries: default_applicable_countries(),
            specific_countries: Vec::new(),
            max_weight: String::new(),
            free_shipping_limit: String::new(),
            weight_limits: Vec::new(),
            surcharge_limits: Vec::new(),
            cod_payment_method: String::new(),
        }
    }
}

impl CarrierOptions {
    /// Converts the stored options into a typed config for `code`.
    ///
    /// ## Errors
    /// - Unknown applicable-countries discriminator: fatal
    ///   [`CoreError::InvalidApplicableCountries`](packetery_core::CoreError)
    /// - Unknown method token, bad country code, bad or negative number:
    ///   [`SettingsError::InvalidCarrier`]
    ///
    /// Rows with both cells empty are skipped; admin forms leave them
    /// behind. Tables that are not ascending are kept as stored and
    /// logged, since tiers are matched first-come.
    pub fn to_config(&self, code: &CarrierCode) -> SettingsResult<CarrierConfig> {
        let applicable_countries =
            ApplicableCountries::from_discriminator(code, &self.applicable_countries)?;
        let invalid = |err: &dyn std::fmt::Display| SettingsError::for_carrier(code.as_str(), err);

        let allowed_methods = self
            .allowed_methods
            .iter()
            .map(|token| {
                token
                    .parse::<Method>()
                    .map_err(|err| invalid(&format!("{token:?}: {err}")))
            })
            .collect::<SettingsResult<BTreeSet<Method>>>()?;

        let specific_countries = self
            .specific_countries
            .iter()
            .map(|raw| CountryCode::new(raw).map_err(|err| invalid(&err)))
            .collect::<SettingsResult<BTreeSet<CountryCode>>>()?;

        let max_weight = optional(&self.max_weight)
            .map(|raw| parse_weight("max_weight", raw))
            .transpose()
            .map_err(|err| invalid(&err))?;

        let free_shipping_threshold = optional(&self.free_shipping_limit)
            .map(|raw| parse_amount("free_shipping_limit", raw))
            .transpose()
            .map_err(|err| invalid(&err))?;

        let mut weight_tiers = Vec::with_capacity(self.weight_limits.len());
        for row in &self.weight_limits {
            if row.weight.trim().is_empty() && row.price.trim().is_empty() {
                continue;
            }
            let weight = parse_weight("weight_limits.weight", &row.weight).map_err(|err| invalid(&err))?;
            let price = parse_amount("weight_limits.price", &row.price).map_err(|err| invalid(&err))?;
            weight_tiers.push(WeightTier::new(weight, price));
        }

        let mut surcharge_tiers = Vec::with_capacity(self.surcharge_limits.len());
        for row in &self.surcharge_limits {
            if row.order_price.trim().is_empty() && row.surcharge.trim().is_empty() {
                continue;
            }
            let up_to = parse_amount("surcharge_limits.order_price", &row.order_price)
                .map_err(|err| invalid(&err))?;
            let surcharge = parse_amount("surcharge_limits.surcharge", &row.surcharge)
                .map_err(|err| invalid(&err))?;
            surcharge_tiers.push(SurchargeTier::new(up_to, surcharge));
        }

        let config = CarrierConfig {
            carrier_code: code.clone(),
            is_active: self.active.is_set(),
            allowed_methods,
            applicable_countries,
            specific_countries,
            max_weight,
            free_shipping_threshold,
            weight_tiers,
            surcharge_tiers,
            cod_method_id: optional(&self.cod_payment_method).map(str::to_string),
        };

        if !config.weight_tiers_ascending() {
            warn!(carrier = %code, "weight limits are not ascending; earlier rows shadow later ones");
        }
        if !config.surcharge_tiers_ascending() {
            warn!(carrier = %code, "surcharge limits are not ascending; earlier rows shadow later ones");
        }

        Ok(config)
    }
}

/// Empty or whitespace-only means unset.
fn optional(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
