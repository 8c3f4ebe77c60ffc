//! # Carrier Config Model
//!
//! Per-carrier persisted settings, in their typed form.
//!
//! ## Anatomy of a Config
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CarrierConfig (packetery_zpoint)                                       │
//! │                                                                         │
//! │  is_active ............ true                                           │
//! │  allowed_methods ...... {} (empty = defer to the carrier's catalogue)  │
//! │  applicable_countries . Specific ["cz", "sk"]                          │
//! │  max_weight ........... 15.0 kg                                        │
//! │  free_shipping ........ 1500.00                                        │
//! │                                                                         │
//! │  weight_tiers (first match wins, stored order)                         │
//! │    ≤ 5 kg   →  79.00                                                   │
//! │    ≤ 10 kg  →  99.00                                                   │
//! │    (heavier: no quote)                                                 │
//! │                                                                         │
//! │  surcharge_tiers (COD only)                                            │
//! │    cart ≤ 2000.00 → +30.00                                             │
//! │    (dearer carts: no surcharge)                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::method::Method;
use crate::money::Money;
use crate::types::{CarrierCode, CountryCode};
use crate::validation::is_ascending;

// =============================================================================
// Applicable Countries
// =============================================================================

/// Which destination countries a carrier config admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicableCountries {
    /// Every country the carrier serves.
    #[default]
    All,
    /// Only `specific_countries` (an empty list means no restriction).
    Specific,
}

impl ApplicableCountries {
    /// Interprets the persisted discriminator.
    ///
    /// ## Accepted Values
    /// - `"all"` / `"0"` → [`ApplicableCountries::All`]
    /// - `"specific"` / `"1"` → [`ApplicableCountries::Specific`]
    ///
    /// Anything else means the stored settings are corrupt. That is fatal:
    /// guessing a default here would silently mis-price orders.
    pub fn from_discriminator(carrier: &CarrierCode, raw: &str) -> CoreResult<Self> {
        match raw.trim() {
            "all" | "0" => Ok(ApplicableCountries::All),
            "specific" | "1" => Ok(ApplicableCountries::Specific),
            other => Err(CoreError::InvalidApplicableCountries {
                carrier: carrier.to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ApplicableCountries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicableCountries::All => write!(f, "all"),
            ApplicableCountries::Specific => write!(f, "specific"),
        }
    }
}

// =============================================================================
// Tiers
// =============================================================================

/// Price for carts weighing up to `weight_up_to` kilograms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightTier {
    pub weight_up_to: f64,
    pub price: Money,
}

impl WeightTier {
    pub fn new(weight_up_to: f64, price: Money) -> Self {
        WeightTier {
            weight_up_to,
            price,
        }
    }
}

/// COD surcharge for carts priced up to `cart_price_up_to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurchargeTier {
    pub cart_price_up_to: Money,
    pub surcharge: Money,
}

impl SurchargeTier {
    pub fn new(cart_price_up_to: Money, surcharge: Money) -> Self {
        SurchargeTier {
            cart_price_up_to,
            surcharge,
        }
    }
}

// =============================================================================
// Carrier Config
// =============================================================================

/// Typed settings bound to one carrier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierConfig {
    pub carrier_code: CarrierCode,
    pub is_active: bool,
    /// Empty means "unrestricted, defer to the carrier's catalogue".
    #[serde(default)]
    pub allowed_methods: BTreeSet<Method>,
    #[serde(default)]
    pub applicable_countries: ApplicableCountries,
    #[serde(default)]
    pub specific_countries: BTreeSet<CountryCode>,
    #[serde(default)]
    pub max_weight: Option<f64>,
    #[serde(default)]
    pub free_shipping_threshold: Option<Money>,
    /// Caller-sorted ascending; evaluated first-match.
    #[serde(default)]
    pub weight_tiers: Vec<WeightTier>,
    /// Caller-sorted ascending; evaluated first-match.
    #[serde(default)]
    pub surcharge_tiers: Vec<SurchargeTier>,
    /// Host payment method id that counts as cash on delivery.
    #[serde(default)]
    pub cod_method_id: Option<String>,
}

impl CarrierConfig {
    /// An active config with no restrictions and no tiers.
    pub fn new(carrier_code: CarrierCode) -> Self {
        CarrierConfig {
            carrier_code,
            is_active: true,
            allowed_methods: BTreeSet::new(),
            applicable_countries: ApplicableCountries::All,
            specific_countries: BTreeSet::new(),
            max_weight: None,
            free_shipping_threshold: None,
            weight_tiers: Vec::new(),
            surcharge_tiers: Vec::new(),
            cod_method_id: None,
        }
    }

    /// Whether the config's country restriction admits `country`.
    ///
    /// `Specific` with an empty list is treated as no restriction.
    pub fn admits_country(&self, country: &CountryCode) -> bool {
        match self.applicable_countries {
            ApplicableCountries::All => true,
            ApplicableCountries::Specific => {
                self.specific_countries.is_empty() || self.specific_countries.contains(country)
            }
        }
    }

    /// Whether a cart of `weight_kg` is within the config's max weight.
    pub fn admits_weight(&self, weight_kg: f64) -> bool {
        self.max_weight.map_or(true, |max| weight_kg <= max)
    }

    /// Whether the checkout's payment method is this carrier's COD method.
    pub fn is_cod(&self, payment_method_id: Option<&str>) -> bool {
        match (self.cod_method_id.as_deref(), payment_method_id) {
            (Some(cod), Some(chosen)) => !cod.is_empty() && cod == chosen,
            _ => false,
        }
    }

    pub fn weight_tiers_ascending(&self) -> bool {
        is_ascending(self.weight_tiers.iter().map(|t| t.weight_up_to))
    }

    pub fn surcharge_tiers_ascending(&self) -> bool {
        is_ascending(self.surcharge_tiers.iter().map(|t| t.cart_price_up_to))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn code() -> CarrierCode {
        CarrierCode::new("packetery_zpoint").unwrap()
    }

    fn country(raw: &str) -> CountryCode {
        CountryCode::new(raw).unwrap()
    }

    #[test]
    fn test_discriminator_values() {
        assert_eq!(
            ApplicableCountries::from_discriminator(&code(), "0").unwrap(),
            ApplicableCountries::All
        );
        assert_eq!(
            ApplicableCountries::from_discriminator(&code(), "all").unwrap(),
            ApplicableCountries::All
        );
        assert_eq!(
            ApplicableCountries::from_discriminator(&code(), "1").unwrap(),
            ApplicableCountries::Specific
        );
        assert_eq!(
            ApplicableCountries::from_discriminator(&code(), " specific ").unwrap(),
            ApplicableCountries::Specific
        );
    }

    #[test]
    fn test_unknown_discriminator_is_fatal() {
        let err = ApplicableCountries::from_discriminator(&code(), "2").unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidApplicableCountries { ref value, .. } if value == "2"
        ));
        assert!(ApplicableCountries::from_discriminator(&code(), "").is_err());
    }

    #[test]
    fn test_admits_country() {
        let mut config = CarrierConfig::new(code());
        assert!(config.admits_country(&country("de")));

        config.applicable_countries = ApplicableCountries::Specific;
        assert!(config.admits_country(&country("de")), "empty list is unrestricted");

        config.specific_countries = BTreeSet::from([country("cz"), country("sk")]);
        assert!(config.admits_country(&country("cz")));
        assert!(!config.admits_country(&country("de")));
    }

    #[test]
    fn test_admits_weight() {
        let mut config = CarrierConfig::new(code());
        assert!(config.admits_weight(1000.0));
        config.max_weight = Some(15.0);
        assert!(config.admits_weight(15.0));
        assert!(!config.admits_weight(15.5));
    }

    #[test]
    fn test_is_cod() {
        let mut config = CarrierConfig::new(code());
        assert!(!config.is_cod(Some("cod")));

        config.cod_method_id = Some("cod".to_string());
        assert!(config.is_cod(Some("cod")));
        assert!(!config.is_cod(Some("bacs")));
        assert!(!config.is_cod(None));

        config.cod_method_id = Some(String::new());
        assert!(!config.is_cod(Some("")));
    }

    #[test]
    fn test_tier_ordering_checks() {
        let mut config = CarrierConfig::new(code());
        config.weight_tiers = vec![
            WeightTier::new(5.0, Money::from_major(10)),
            WeightTier::new(10.0, Money::from_major(20)),
        ];
        assert!(config.weight_tiers_ascending());

        config.weight_tiers.reverse();
        assert!(!config.weight_tiers_ascending());

        config.surcharge_tiers = vec![
            SurchargeTier::new(Money::from_major(100), Money::from_major(5)),
            SurchargeTier::new(Money::from_major(50), Money::from_major(8)),
        ];
        assert!(!config.surcharge_tiers_ascending());
    }
}
