//! # Rate Engine
//!
//! Ties the components together for one checkout: which carriers are
//! registered, which dynamic sub-carriers exist, and how each carrier is
//! configured.
//!
//! ## Quoting Pass
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  for carrier in registry (registration order)                           │
//! │      config missing? ──────────────────────────────► skip               │
//! │      build_quotes(carrier, Base(config))             static quotes      │
//! │      for dc in find_configurable(country, methods)                      │
//! │          where dc.owner == carrier                                      │
//! │          overlay = Base(config).overlay(dc.id, dc.methods)              │
//! │          build_quotes(carrier, overlay, through dc)   dynamic quotes    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Selection
//! After the customer picks a quote, the host sends back its rate code.
//! [`RateEngine::resolve_selection`] turns it back into the carrier, the
//! dynamic carrier (if any) and the destination id to hand to the order.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::carriers::{CarrierBehaviour, CarrierRegistry};
use crate::config::CarrierConfig;
use crate::error::{CoreError, CoreResult};
use crate::overlay::{resolve_allowed_methods, Config};
use crate::quote::{build_quotes, QuoteRequest, RateQuote};
use crate::rate_code::{decode, RateCode};
use crate::registry::DynamicCarrierRegistry;
use crate::types::{Carrier, CarrierCode, CartSummary, CountryCode, DynamicCarrier, PointId};

// =============================================================================
// Selection
// =============================================================================

/// A decoded, resolved customer choice.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub rate_code: RateCode,
    pub carrier: Carrier,
    /// `None` when the code names no dynamic carrier or an unknown one.
    pub dynamic_carrier: Option<DynamicCarrier>,
    /// Destination id for address methods; pickup points are chosen by
    /// the customer later, so this is usually `None` for them.
    pub point_id: Option<PointId>,
}

// =============================================================================
// Engine
// =============================================================================

#[derive(Debug, Default)]
pub struct RateEngine {
    carriers: CarrierRegistry,
    dynamic_carriers: DynamicCarrierRegistry,
    configs: BTreeMap<CarrierCode, CarrierConfig>,
}

impl RateEngine {
    pub fn new(carriers: CarrierRegistry, dynamic_carriers: DynamicCarrierRegistry) -> Self {
        RateEngine {
            carriers,
            dynamic_carriers,
            configs: BTreeMap::new(),
        }
    }

    /// Adds or replaces the config of the carrier it names.
    pub fn insert_config(&mut self, config: CarrierConfig) -> Option<CarrierConfig> {
        self.configs.insert(config.carrier_code.clone(), config)
    }

    pub fn with_config(mut self, config: CarrierConfig) -> Self {
        self.insert_config(config);
        self
    }

    pub fn carriers(&self) -> &CarrierRegistry {
        &self.carriers
    }

    pub fn dynamic_carriers(&self) -> &DynamicCarrierRegistry {
        &self.dynamic_carriers
    }

    pub fn config(&self, carrier_code: &str) -> Option<&CarrierConfig> {
        self.configs.get(carrier_code)
    }

    /// Every quote available for `cart` shipped to `country`.
    ///
    /// Carriers come in registration order. Within a carrier, its own
    /// quotes precede those of its dynamic carriers, which are ordered by id.
    /// A carrier that does not quote directly contributes only the quotes
    /// of its dynamic carriers.
    pub fn quote(&self, country: &CountryCode, cart: &CartSummary) -> Vec<RateQuote> {
        let mut quotes = Vec::new();
        for carrier in self.carriers.iter() {
            let Some(config) = self.configs.get(carrier.code()) else {
                debug!(carrier = %carrier.code(), "no config, skipping carrier");
                continue;
            };
            quotes.extend(self.quote_carrier(carrier, config, country, cart));
        }
        debug!(country = %country, quotes = quotes.len(), "quoting pass complete");
        quotes
    }

    fn quote_carrier(
        &self,
        carrier: &dyn CarrierBehaviour,
        config: &CarrierConfig,
        country: &CountryCode,
        cart: &CartSummary,
    ) -> Vec<RateQuote> {
        let base = Config::Base(config.clone());
        let mut quotes = if carrier.quotes_directly() {
            build_quotes(carrier, &base, &QuoteRequest::new(country, cart))
        } else {
            Vec::new()
        };

        let methods = resolve_allowed_methods(&base, carrier.method_catalogue());
        let owned = self
            .dynamic_carriers
            .find_configurable(country, &methods)
            .into_iter()
            .filter(|dc| &dc.owner == carrier.code());

        for dc in owned {
            let overlay = match base.clone().overlay(dc.id, dc.methods.clone()) {
                Ok(overlay) => overlay,
                Err(err) => {
                    warn!(carrier = %carrier.code(), dynamic_carrier = dc.id, error = %err, "cannot overlay config");
                    continue;
                }
            };
            let request = QuoteRequest::new(country, cart).through(dc);
            quotes.extend(build_quotes(carrier, &overlay, &request));
        }
        quotes
    }

    /// Resolves a rate code sent back by the checkout.
    ///
    /// Fails on a malformed code or an unregistered carrier. An unknown
    /// dynamic carrier id is not an error; the selection simply carries
    /// no dynamic carrier.
    pub fn resolve_selection(&self, rate_code: &str) -> CoreResult<Selection> {
        let rate_code = decode(rate_code)?;
        let carrier = self
            .carriers
            .get(rate_code.carrier_code.as_str())
            .ok_or_else(|| CoreError::UnknownCarrier(rate_code.carrier_code.to_string()))?;

        let dynamic_carrier = self
            .dynamic_carriers
            .get_by_id(&rate_code.carrier_code, rate_code.dynamic_carrier_id)
            .cloned();
        if rate_code.dynamic_carrier_id.is_some() && dynamic_carrier.is_none() {
            debug!(rate_code = %rate_code, "dynamic carrier unknown, using carrier directly");
        }

        let country = dynamic_carrier.as_ref().map(|dc| &dc.country);
        let point_id = match country {
            Some(country) => carrier.resolve_point_id(rate_code.method, country),
            None => None,
        }
        .map(str::to_string);

        Ok(Selection {
            carrier: carrier.carrier().clone(),
            dynamic_carrier,
            point_id,
            rate_code,
        })
    }

    /// Same as [`RateEngine::resolve_selection`], with the destination id
    /// looked up for an explicit country. Used when the selection has no
    /// dynamic carrier to take the country from.
    pub fn resolve_selection_for(&self, rate_code: &str, country: &CountryCode) -> CoreResult<Selection> {
        let mut selection = self.resolve_selection(rate_code)?;
        if selection.point_id.is_none() {
            if let Some(carrier) = self.carriers.get(selection.carrier.code.as_str()) {
                selection.point_id = carrier
                    .resolve_point_id(selection.rate_code.method, country)
                    .map(str::to_string);
            }
        }
        Ok(selection)
    }

    /// Whether `payment_method_id` is the COD method of `carrier_code`.
    /// Unknown carriers never count as COD.
    pub fn is_cod(&self, carrier_code: &str, payment_method_id: Option<&str>) -> bool {
        self.configs
            .get(carrier_code)
            .is_some_and(|config| config.is_cod(payment_method_id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::carriers::{CarrierTables, DynamicCarrierHost, StaticCarrier};
    use crate::config::WeightTier;
    use crate::method::{Method, MethodCatalogue};
    use crate::money::Money;

    fn country(raw: &str) -> CountryCode {
        CountryCode::new(raw).unwrap()
    }

    fn code(raw: &str) -> CarrierCode {
        CarrierCode::new(raw).unwrap()
    }

    fn priced(carrier: &str) -> CarrierConfig {
        let mut config = CarrierConfig::new(code(carrier));
        config.weight_tiers = vec![WeightTier::new(10.0, Money::from_major(4))];
        config.cod_method_id = Some("cod".to_string());
        config
    }

    fn dynamic(id: u32, country_code: &str, methods: &[Method]) -> DynamicCarrier {
        DynamicCarrier {
            id,
            owner: code("packetery_dhl"),
            country: country(country_code),
            name: format!("DHL {id}"),
            max_weight: None,
            methods: methods.iter().copied().collect(),
            supports_cod: true,
            supports_age_verification: false,
            deleted: false,
        }
    }

    fn engine() -> RateEngine {
        let zpoint = StaticCarrier::new(
            Carrier::new(code("packetery_zpoint"), "Z-Point"),
            MethodCatalogue::new([(Method::PickupPointDelivery, "Z-Point pickup")]),
            CarrierTables::new().with_countries(Method::PickupPointDelivery, [country("cz")]),
        );
        let dhl = DynamicCarrierHost::new(
            Carrier::new(code("packetery_dhl"), "DHL"),
            MethodCatalogue::new([(Method::AddressDelivery, "DHL home")]),
            CarrierTables::new()
                .with_countries(Method::AddressDelivery, [country("cz"), country("de")])
                .with_point(Method::AddressDelivery, country("de"), "42"),
        );
        let carriers = CarrierRegistry::new().with(zpoint).with(dhl);
        let dynamic_carriers: DynamicCarrierRegistry = [
            dynamic(42, "de", &[Method::AddressDelivery]),
            dynamic(43, "de", &[Method::PickupPointDelivery]),
        ]
        .into_iter()
        .collect();

        RateEngine::new(carriers, dynamic_carriers)
            .with_config(priced("packetery_zpoint"))
            .with_config(priced("packetery_dhl"))
    }

    #[test]
    fn test_quote_static_carriers() {
        let cart = CartSummary::new(2.0, Money::from_major(30));
        let quotes = engine().quote(&country("cz"), &cart);
        let codes: Vec<String> = quotes.iter().map(RateQuote::rate_code_string).collect();
        assert_eq!(codes, vec!["packetery_zpoint_pickupPointDelivery"]);
    }

    #[test]
    fn test_quote_includes_dynamic_carriers() {
        let cart = CartSummary::new(2.0, Money::from_major(30));
        let quotes = engine().quote(&country("de"), &cart);
        let codes: Vec<String> = quotes.iter().map(RateQuote::rate_code_string).collect();
        assert_eq!(codes, vec!["packetery_dhl_42-addressDelivery"]);
        assert!(quotes.iter().all(|q| q.price == Money::from_major(4)));
    }

    #[test]
    fn test_carrier_without_config_is_skipped() {
        let mut engine = engine();
        engine.configs.remove("packetery_dhl");
        let cart = CartSummary::new(2.0, Money::from_major(30));
        assert!(engine.quote(&country("de"), &cart).is_empty());
    }

    #[test]
    fn test_deleted_dynamic_carrier_not_quoted() {
        let mut engine = engine();
        let mut gone = dynamic(42, "de", &[Method::AddressDelivery]);
        gone.deleted = true;
        engine.dynamic_carriers.insert(gone);

        let cart = CartSummary::new(2.0, Money::from_major(30));
        assert!(engine.quote(&country("de"), &cart).is_empty());
    }

    #[test]
    fn test_host_quotes_only_through_accepting_dynamic_carrier() {
        let mut engine = engine();
        let mut strict = dynamic(42, "de", &[Method::AddressDelivery]);
        strict.max_weight = Some(5.0);
        strict.supports_cod = false;
        engine.dynamic_carriers.insert(strict);

        let light = CartSummary::new(2.0, Money::from_major(30));
        let codes: Vec<String> = engine
            .quote(&country("de"), &light)
            .iter()
            .map(RateQuote::rate_code_string)
            .collect();
        assert_eq!(codes, vec!["packetery_dhl_42-addressDelivery"]);

        let overweight = CartSummary::new(8.0, Money::from_major(30));
        assert!(engine.quote(&country("de"), &overweight).is_empty());
        assert!(engine.quote(&country("de"), &light.with_cod(true)).is_empty());
        assert!(engine
            .quote(&country("de"), &light.with_age_verification(true))
            .is_empty());
    }

    #[test]
    fn test_resolve_selection_with_dynamic_carrier() {
        let selection = engine()
            .resolve_selection("packetery_dhl_42-addressDelivery")
            .unwrap();
        assert_eq!(selection.carrier.code.as_str(), "packetery_dhl");
        assert_eq!(selection.dynamic_carrier.as_ref().map(|dc| dc.id), Some(42));
        assert_eq!(selection.point_id.as_deref(), Some("42"));
        assert_eq!(selection.rate_code.method, Method::AddressDelivery);
    }

    #[test]
    fn test_resolve_selection_unknown_dynamic_id() {
        let selection = engine()
            .resolve_selection("packetery_dhl_999-addressDelivery")
            .unwrap();
        assert!(selection.dynamic_carrier.is_none());
        assert!(selection.point_id.is_none());

        let selection = engine()
            .resolve_selection_for("packetery_dhl_999-addressDelivery", &country("de"))
            .unwrap();
        assert_eq!(selection.point_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_resolve_selection_errors() {
        let engine = engine();
        assert!(matches!(
            engine.resolve_selection("flat_rate_addressDelivery"),
            Err(CoreError::UnrecognizedRateCode(_))
        ));
        assert!(matches!(
            engine.resolve_selection("packetery_alza_addressDelivery"),
            Err(CoreError::UnknownCarrier(ref c)) if c == "packetery_alza"
        ));
    }

    #[test]
    fn test_is_cod() {
        let engine = engine();
        assert!(engine.is_cod("packetery_dhl", Some("cod")));
        assert!(!engine.is_cod("packetery_dhl", Some("card")));
        assert!(!engine.is_cod("packetery_dhl", None));
        assert!(!engine.is_cod("packetery_alza", Some("cod")));
    }

    #[test]
    fn test_overlay_restricts_to_dynamic_carrier_methods() {
        let mut engine = engine();
        let mut config = priced("packetery_dhl");
        config.allowed_methods = BTreeSet::from([Method::PickupPointDelivery]);
        engine.insert_config(config);

        let cart = CartSummary::new(2.0, Money::from_major(30));
        assert!(engine.quote(&country("de"), &cart).is_empty());
    }
}
