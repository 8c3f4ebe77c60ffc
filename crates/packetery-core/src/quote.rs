//! # Rate Quote Builder
//!
//! Produces the priced delivery options one carrier (optionally through
//! one dynamic sub-carrier) offers for a cart.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  config ──► resolve_allowed_methods ──► {methods}                       │
//! │                                            │                            │
//! │                                            ▼  for each, in set order    │
//! │                                      is_usable? ── no ──► dropped       │
//! │                                            │ yes                        │
//! │                                            ▼                            │
//! │                                      price(...) ── None ──► dropped     │
//! │                                            │ Some                       │
//! │                                            ▼                            │
//! │                                      RateQuote + catalogue label        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dropped methods are not errors. They are logged at `debug` so a shop
//! owner chasing a missing option can see why.

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::availability::is_usable;
use crate::carriers::CarrierBehaviour;
use crate::method::Method;
use crate::money::Money;
use crate::overlay::{resolve_allowed_methods, Config};
use crate::pricing::price;
use crate::rate_code::{encode, RateCode};
use crate::types::{CarrierCode, CartSummary, CountryCode, DynamicCarrier};

// =============================================================================
// Rate Quote
// =============================================================================

/// One priced delivery option. Ephemeral: only the chosen quote's rate
/// code outlives the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RateQuote {
    pub method: Method,
    pub label: String,
    pub price: Money,
    pub carrier_code: CarrierCode,
    pub dynamic_carrier_id: Option<u32>,
}

impl RateQuote {
    pub fn rate_code(&self) -> RateCode {
        RateCode::new(self.carrier_code.clone(), self.dynamic_carrier_id, self.method)
    }

    /// Wire string of [`RateQuote::rate_code`].
    pub fn rate_code_string(&self) -> String {
        encode(&self.carrier_code, self.dynamic_carrier_id, self.method)
    }

    pub fn is_free(&self) -> bool {
        self.price.is_zero()
    }
}

// =============================================================================
// Quote Request
// =============================================================================

/// Destination and cart for one quoting pass.
#[derive(Debug, Clone, Copy)]
pub struct QuoteRequest<'a> {
    pub country: &'a CountryCode,
    pub cart: &'a CartSummary,
    pub dynamic_carrier: Option<&'a DynamicCarrier>,
}

impl<'a> QuoteRequest<'a> {
    pub fn new(country: &'a CountryCode, cart: &'a CartSummary) -> Self {
        QuoteRequest {
            country,
            cart,
            dynamic_carrier: None,
        }
    }

    pub fn through(mut self, dynamic_carrier: &'a DynamicCarrier) -> Self {
        self.dynamic_carrier = Some(dynamic_carrier);
        self
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builds the quotes `carrier` offers under `config` for `request`.
///
/// Inactive configs and carts over the config's max weight yield nothing.
pub fn build_quotes(
    carrier: &dyn CarrierBehaviour,
    config: &Config,
    request: &QuoteRequest<'_>,
) -> Vec<RateQuote> {
    let base = config.base();
    let code = carrier.code();
    let dynamic_carrier_id = request.dynamic_carrier.map(|dc| dc.id);

    if !base.is_active {
        debug!(carrier = %code, "carrier inactive, no quotes");
        return Vec::new();
    }
    if !base.admits_weight(request.cart.weight_kg) {
        debug!(
            carrier = %code,
            weight = request.cart.weight_kg,
            max_weight = base.max_weight,
            "cart over carrier max weight, no quotes"
        );
        return Vec::new();
    }

    let catalogue = carrier.method_catalogue();
    let methods = resolve_allowed_methods(config, catalogue);

    let mut quotes = Vec::with_capacity(methods.len());
    for method in methods {
        if !is_usable(
            carrier,
            method,
            request.country,
            config,
            request.dynamic_carrier,
            request.cart,
        ) {
            debug!(carrier = %code, ?dynamic_carrier_id, %method, country = %request.country, "method not usable");
            continue;
        }

        let Some(amount) = price(base, request.cart.weight_kg, request.cart.price, request.cart.is_cod) else {
            debug!(carrier = %code, ?dynamic_carrier_id, %method, weight = request.cart.weight_kg, "no weight tier matches");
            continue;
        };

        let label = catalogue
            .label(method)
            .unwrap_or_else(|| method.default_label())
            .to_string();

        quotes.push(RateQuote {
            method,
            label,
            price: amount,
            carrier_code: code.clone(),
            dynamic_carrier_id,
        });
    }
    quotes
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::carriers::{CarrierTables, DynamicCarrierHost, StaticCarrier};
    use crate::config::{CarrierConfig, SurchargeTier, WeightTier};
    use crate::method::MethodCatalogue;
    use crate::types::Carrier;

    fn country(raw: &str) -> CountryCode {
        CountryCode::new(raw).unwrap()
    }

    fn zpoint() -> StaticCarrier {
        StaticCarrier::new(
            Carrier::new(CarrierCode::new("packetery_zpoint").unwrap(), "Z-Point"),
            MethodCatalogue::new([
                (Method::PickupPointDelivery, "Pickup at Z-Point"),
                (Method::AddressDelivery, "Home delivery"),
            ]),
            CarrierTables::new()
                .with_countries(Method::PickupPointDelivery, [country("cz"), country("sk")])
                .with_countries(Method::AddressDelivery, [country("cz")])
                .with_point(Method::AddressDelivery, country("cz"), "106"),
        )
    }

    fn config() -> CarrierConfig {
        let mut config = CarrierConfig::new(CarrierCode::new("packetery_zpoint").unwrap());
        config.weight_tiers = vec![
            WeightTier::new(5.0, Money::from_major(10)),
            WeightTier::new(10.0, Money::from_major(20)),
        ];
        config.surcharge_tiers = vec![SurchargeTier::new(Money::from_major(100), Money::from_major(5))];
        config
    }

    #[test]
    fn test_builds_quotes_in_method_order() {
        let cart = CartSummary::new(7.0, Money::from_major(30));
        let cz = country("cz");
        let quotes = build_quotes(&zpoint(), &Config::Base(config()), &QuoteRequest::new(&cz, &cart));

        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].method, Method::PickupPointDelivery);
        assert_eq!(quotes[0].label, "Pickup at Z-Point");
        assert_eq!(quotes[0].price, Money::from_major(20));
        assert_eq!(quotes[1].method, Method::AddressDelivery);
        assert_eq!(quotes[1].label, "Home delivery");
        assert_eq!(quotes[1].rate_code_string(), "packetery_zpoint_addressDelivery");
    }

    #[test]
    fn test_unusable_methods_are_dropped() {
        let cart = CartSummary::new(1.0, Money::from_major(30));
        let sk = country("sk");
        let quotes = build_quotes(&zpoint(), &Config::Base(config()), &QuoteRequest::new(&sk, &cart));
        let methods: Vec<Method> = quotes.iter().map(|q| q.method).collect();
        assert_eq!(methods, vec![Method::PickupPointDelivery]);
    }

    #[test]
    fn test_unpriced_methods_are_dropped() {
        let cart = CartSummary::new(12.0, Money::from_major(30));
        let cz = country("cz");
        assert!(build_quotes(&zpoint(), &Config::Base(config()), &QuoteRequest::new(&cz, &cart)).is_empty());
    }

    #[test]
    fn test_cod_adds_surcharge() {
        let cart = CartSummary::new(7.0, Money::from_major(80)).with_cod(true);
        let cz = country("cz");
        let quotes = build_quotes(&zpoint(), &Config::Base(config()), &QuoteRequest::new(&cz, &cart));
        assert!(quotes.iter().all(|q| q.price == Money::from_major(25)));
    }

    #[test]
    fn test_inactive_and_overweight_configs_quote_nothing() {
        let cart = CartSummary::new(3.0, Money::from_major(30));
        let cz = country("cz");

        let mut inactive = config();
        inactive.is_active = false;
        assert!(build_quotes(&zpoint(), &Config::Base(inactive), &QuoteRequest::new(&cz, &cart)).is_empty());

        let mut capped = config();
        capped.max_weight = Some(2.0);
        assert!(build_quotes(&zpoint(), &Config::Base(capped), &QuoteRequest::new(&cz, &cart)).is_empty());
    }

    #[test]
    fn test_catalogue_without_label_uses_default() {
        let carrier = StaticCarrier::new(
            Carrier::new(CarrierCode::new("packetery_zpoint").unwrap(), "Z-Point"),
            MethodCatalogue::new([(Method::PickupPointDelivery, "Pickup")]),
            CarrierTables::new()
                .with_countries(Method::AddressDelivery, [country("cz")])
                .with_point(Method::AddressDelivery, country("cz"), "106"),
        );
        let mut config = config();
        config.allowed_methods = BTreeSet::from([Method::AddressDelivery]);

        let cart = CartSummary::new(1.0, Money::from_major(30));
        let cz = country("cz");
        let quotes = build_quotes(&carrier, &Config::Base(config), &QuoteRequest::new(&cz, &cart));
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].label, "Address delivery");
    }

    #[test]
    fn test_quotes_through_dynamic_carrier() {
        let host = DynamicCarrierHost::new(
            Carrier::new(CarrierCode::new("packetery_dhl").unwrap(), "DHL"),
            MethodCatalogue::full(),
            CarrierTables::new()
                .with_countries(Method::AddressDelivery, [country("de")])
                .with_countries(Method::PickupPointDelivery, [country("de")])
                .with_point(Method::AddressDelivery, country("de"), "42"),
        );
        let dc = DynamicCarrier {
            id: 42,
            owner: CarrierCode::new("packetery_dhl").unwrap(),
            country: country("de"),
            name: "DHL DE".to_string(),
            max_weight: Some(31.5),
            methods: BTreeSet::from([Method::AddressDelivery]),
            supports_cod: true,
            supports_age_verification: false,
            deleted: false,
        };
        let mut base = config();
        base.carrier_code = CarrierCode::new("packetery_dhl").unwrap();
        let config = Config::Base(base).overlay(dc.id, dc.methods.clone()).unwrap();

        let cart = CartSummary::new(4.0, Money::from_major(30));
        let de = country("de");
        let quotes = build_quotes(&host, &config, &QuoteRequest::new(&de, &cart).through(&dc));

        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].method, Method::AddressDelivery);
        assert_eq!(quotes[0].dynamic_carrier_id, Some(42));
        assert_eq!(quotes[0].rate_code_string(), "packetery_dhl_42-addressDelivery");
    }
}
