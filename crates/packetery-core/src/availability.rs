//! # Availability Evaluator
//!
//! Decides whether a delivery method can be offered for a destination.
//!
//! ## Decision
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  is_usable(method, country, config, dynamic carrier?, cart)             │
//! │                                                                         │
//! │  1. Destination id     address methods need a point id for            │
//! │                        (method, country); pickup points are chosen    │
//! │                        later by the customer                           │
//! │           AND                                                           │
//! │  2. Country            served by the carrier for this method, and     │
//! │                        admitted by the config's country restriction    │
//! │           AND                                                           │
//! │  3. Carrier hook       carrier-specific veto (weight, COD, age ...)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `false` is an ordinary outcome ("cannot ship there"), never an error.

use crate::carriers::CarrierBehaviour;
use crate::method::Method;
use crate::overlay::Config;
use crate::types::{CartSummary, CountryCode, DynamicCarrier};

/// Returns true when `method` can be offered to `country`.
pub fn is_usable(
    carrier: &dyn CarrierBehaviour,
    method: Method,
    country: &CountryCode,
    config: &Config,
    dynamic_carrier: Option<&DynamicCarrier>,
    cart: &CartSummary,
) -> bool {
    has_destination(carrier, method, country)
        && serves_country(carrier, method, country, config)
        && carrier.validate_dynamic_carrier(dynamic_carrier, country, cart)
}

/// Step 1: address-style methods need a resolvable destination id.
pub fn has_destination(carrier: &dyn CarrierBehaviour, method: Method, country: &CountryCode) -> bool {
    method.is_pickup_point() || carrier.resolve_point_id(method, country).is_some()
}

/// Step 2: the carrier serves the country and the config admits it.
pub fn serves_country(
    carrier: &dyn CarrierBehaviour,
    method: Method,
    country: &CountryCode,
    config: &Config,
) -> bool {
    config.base().admits_country(country) && carrier.available_countries(method).contains(country)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::carriers::{CarrierTables, DynamicCarrierHost, StaticCarrier};
    use crate::config::{ApplicableCountries, CarrierConfig};
    use crate::method::MethodCatalogue;
    use crate::money::Money;
    use crate::types::{Carrier, CarrierCode};

    fn country(raw: &str) -> CountryCode {
        CountryCode::new(raw).unwrap()
    }

    fn carrier(tables: CarrierTables) -> StaticCarrier {
        StaticCarrier::new(
            Carrier::new(CarrierCode::new("packetery_zpoint").unwrap(), "Z-Point"),
            MethodCatalogue::full(),
            tables,
        )
    }

    fn config() -> Config {
        Config::Base(CarrierConfig::new(
            CarrierCode::new("packetery_zpoint").unwrap(),
        ))
    }

    fn cart() -> CartSummary {
        CartSummary::new(1.0, Money::from_major(100))
    }

    #[test]
    fn test_address_delivery_requires_point() {
        let served_only = carrier(
            CarrierTables::new().with_countries(Method::AddressDelivery, [country("cz")]),
        );
        assert!(!is_usable(
            &served_only,
            Method::AddressDelivery,
            &country("cz"),
            &config(),
            None,
            &cart()
        ));

        let with_point = carrier(
            CarrierTables::new()
                .with_countries(Method::AddressDelivery, [country("cz")])
                .with_point(Method::AddressDelivery, country("cz"), "106"),
        );
        assert!(is_usable(
            &with_point,
            Method::AddressDelivery,
            &country("cz"),
            &config(),
            None,
            &cart()
        ));
    }

    #[test]
    fn test_pickup_point_skips_point_lookup() {
        let carrier = carrier(
            CarrierTables::new().with_countries(Method::PickupPointDelivery, [country("sk")]),
        );
        assert!(is_usable(
            &carrier,
            Method::PickupPointDelivery,
            &country("sk"),
            &config(),
            None,
            &cart()
        ));
    }

    #[test]
    fn test_country_must_be_served_for_that_method() {
        let carrier = carrier(
            CarrierTables::new()
                .with_countries(Method::PickupPointDelivery, [country("cz")])
                .with_point(Method::AddressDelivery, country("cz"), "106"),
        );
        assert!(!is_usable(
            &carrier,
            Method::AddressDelivery,
            &country("cz"),
            &config(),
            None,
            &cart()
        ));
        assert!(!is_usable(
            &carrier,
            Method::PickupPointDelivery,
            &country("de"),
            &config(),
            None,
            &cart()
        ));
    }

    #[test]
    fn test_config_country_restriction() {
        let carrier = carrier(
            CarrierTables::new()
                .with_countries(Method::PickupPointDelivery, [country("cz"), country("sk")]),
        );
        let mut base = CarrierConfig::new(CarrierCode::new("packetery_zpoint").unwrap());
        base.applicable_countries = ApplicableCountries::Specific;
        base.specific_countries = BTreeSet::from([country("sk")]);
        let config = Config::Base(base);

        assert!(!serves_country(&carrier, Method::PickupPointDelivery, &country("cz"), &config));
        assert!(serves_country(&carrier, Method::PickupPointDelivery, &country("sk"), &config));
    }

    #[test]
    fn test_carrier_hook_can_veto() {
        let host = DynamicCarrierHost::new(
            Carrier::new(CarrierCode::new("packetery_dynamic").unwrap(), "Carriers"),
            MethodCatalogue::full(),
            CarrierTables::new()
                .with_countries(Method::AddressDelivery, [country("cz")])
                .with_point(Method::AddressDelivery, country("cz"), "106"),
        );
        let dc = DynamicCarrier {
            id: 106,
            owner: CarrierCode::new("packetery_dynamic").unwrap(),
            country: country("cz"),
            name: "CZ Home".to_string(),
            max_weight: Some(5.0),
            methods: BTreeSet::from([Method::AddressDelivery]),
            supports_cod: true,
            supports_age_verification: false,
            deleted: false,
        };
        let config = Config::Base(CarrierConfig::new(
            CarrierCode::new("packetery_dynamic").unwrap(),
        ));

        let light = CartSummary::new(4.0, Money::from_major(10));
        let heavy = CartSummary::new(8.0, Money::from_major(10));
        assert!(is_usable(&host, Method::AddressDelivery, &country("cz"), &config, Some(&dc), &light));
        assert!(!is_usable(&host, Method::AddressDelivery, &country("cz"), &config, Some(&dc), &heavy));
    }
}
