//! # Carrier Capabilities
//!
//! Every carrier plugs into the engine through [`CarrierBehaviour`]. The
//! engine never inspects a carrier's concrete type; it looks the
//! implementation up in a [`CarrierRegistry`] by code.
//!
//! ## Implementations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  StaticCarrier          Table-driven lookups, validation always passes │
//! │                         (own Packeta network, fixed home delivery)     │
//! │                                                                         │
//! │  DynamicCarrierHost     Table-driven lookups, validates the dynamic    │
//! │                         sub-carrier a quote is built for:              │
//! │                           • not tombstoned                             │
//! │                           • serves the destination country            │
//! │                           • accepts the cart weight                   │
//! │                           • supports COD when COD is chosen           │
//! │                           • supports age verification when needed     │
//! │                         Never quoted on its own.                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Registration is explicit: whoever builds the registry lists the
//! carriers it wants, typically from the settings file.

use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use crate::method::{Method, MethodCatalogue};
use crate::types::{Carrier, CarrierCode, CartSummary, CountryCode, DynamicCarrier, PointId};

// =============================================================================
// Capability Interface
// =============================================================================

/// What the engine needs from a carrier.
pub trait CarrierBehaviour: Send + Sync {
    fn carrier(&self) -> &Carrier;

    /// Methods the carrier declares, with their labels.
    fn method_catalogue(&self) -> &MethodCatalogue;

    /// Destination id for `method` in `country`, if the carrier has one.
    fn resolve_point_id(&self, method: Method, country: &CountryCode) -> Option<&str>;

    /// Countries served for `method`, including those served through
    /// dynamic sub-carriers.
    fn available_countries(&self, method: Method) -> BTreeSet<CountryCode>;

    /// Carrier-specific veto on a quote. Passes by default.
    fn validate_dynamic_carrier(
        &self,
        _dynamic_carrier: Option<&DynamicCarrier>,
        _country: &CountryCode,
        _cart: &CartSummary,
    ) -> bool {
        true
    }

    /// Whether the carrier is quoted on its own, without a dynamic
    /// sub-carrier. Hosts only quote through their sub-carriers.
    fn quotes_directly(&self) -> bool {
        true
    }

    fn code(&self) -> &CarrierCode {
        &self.carrier().code
    }
}

// =============================================================================
// Lookup Tables
// =============================================================================

/// Collaborator-supplied lookup data for one carrier.
#[derive(Debug, Clone, Default)]
pub struct CarrierTables {
    points: BTreeMap<(Method, CountryCode), PointId>,
    countries: BTreeMap<Method, BTreeSet<CountryCode>>,
}

impl CarrierTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the destination id for `(method, country)`.
    pub fn with_point(
        mut self,
        method: Method,
        country: CountryCode,
        point_id: impl Into<PointId>,
    ) -> Self {
        self.points.insert((method, country), point_id.into());
        self
    }

    /// Adds `countries` to the list served for `method`.
    pub fn with_countries(
        mut self,
        method: Method,
        countries: impl IntoIterator<Item = CountryCode>,
    ) -> Self {
        self.countries.entry(method).or_default().extend(countries);
        self
    }

    pub fn point_id(&self, method: Method, country: &CountryCode) -> Option<&str> {
        self.points
            .get(&(method, country.clone()))
            .map(String::as_str)
    }

    pub fn countries(&self, method: Method) -> BTreeSet<CountryCode> {
        self.countries.get(&method).cloned().unwrap_or_default()
    }
}

// =============================================================================
// Static Carrier
// =============================================================================

/// A carrier whose behaviour is fully described by its tables.
#[derive(Debug, Clone)]
pub struct StaticCarrier {
    carrier: Carrier,
    catalogue: MethodCatalogue,
    tables: CarrierTables,
}

impl StaticCarrier {
    pub fn new(carrier: Carrier, catalogue: MethodCatalogue, tables: CarrierTables) -> Self {
        StaticCarrier {
            carrier,
            catalogue,
            tables,
        }
    }
}

impl CarrierBehaviour for StaticCarrier {
    fn carrier(&self) -> &Carrier {
        &self.carrier
    }

    fn method_catalogue(&self) -> &MethodCatalogue {
        &self.catalogue
    }

    fn resolve_point_id(&self, method: Method, country: &CountryCode) -> Option<&str> {
        self.tables.point_id(method, country)
    }

    fn available_countries(&self, method: Method) -> BTreeSet<CountryCode> {
        self.tables.countries(method)
    }
}

// =============================================================================
// Dynamic Carrier Host
// =============================================================================

/// A carrier that fronts dynamic sub-carriers and validates them.
#[derive(Debug, Clone)]
pub struct DynamicCarrierHost {
    carrier: Carrier,
    catalogue: MethodCatalogue,
    tables: CarrierTables,
}

impl DynamicCarrierHost {
    pub fn new(carrier: Carrier, catalogue: MethodCatalogue, tables: CarrierTables) -> Self {
        DynamicCarrierHost {
            carrier,
            catalogue,
            tables,
        }
    }
}

impl CarrierBehaviour for DynamicCarrierHost {
    fn carrier(&self) -> &Carrier {
        &self.carrier
    }

    fn method_catalogue(&self) -> &MethodCatalogue {
        &self.catalogue
    }

    fn resolve_point_id(&self, method: Method, country: &CountryCode) -> Option<&str> {
        self.tables.point_id(method, country)
    }

    fn available_countries(&self, method: Method) -> BTreeSet<CountryCode> {
        self.tables.countries(method)
    }

    fn quotes_directly(&self) -> bool {
        false
    }

    fn validate_dynamic_carrier(
        &self,
        dynamic_carrier: Option<&DynamicCarrier>,
        country: &CountryCode,
        cart: &CartSummary,
    ) -> bool {
        let Some(dc) = dynamic_carrier else {
            return true;
        };

        let verdict = if dc.deleted {
            Err("deleted")
        } else if dc.owner != self.carrier.code {
            Err("owned by another carrier")
        } else if &dc.country != country {
            Err("country mismatch")
        } else if !dc.accepts_weight(cart.weight_kg) {
            Err("over max weight")
        } else if cart.is_cod && !dc.supports_cod {
            Err("cod not supported")
        } else if cart.requires_age_verification && !dc.supports_age_verification {
            Err("age verification not supported")
        } else {
            Ok(())
        };

        match verdict {
            Ok(()) => true,
            Err(reason) => {
                trace!(carrier = %self.carrier.code, dynamic_carrier = dc.id, reason, "dynamic carrier rejected");
                false
            }
        }
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Explicitly declared set of carriers, keyed by code.
///
/// Iteration follows registration order, so quote lists are stable.
#[derive(Default)]
pub struct CarrierRegistry {
    order: Vec<CarrierCode>,
    carriers: BTreeMap<CarrierCode, Box<dyn CarrierBehaviour>>,
}

impl CarrierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a carrier. A later registration under the same code
    /// replaces the earlier one but keeps its position.
    pub fn register(&mut self, carrier: Box<dyn CarrierBehaviour>) {
        let code = carrier.code().clone();
        if self.carriers.insert(code.clone(), carrier).is_none() {
            self.order.push(code);
        }
    }

    pub fn with(mut self, carrier: impl CarrierBehaviour + 'static) -> Self {
        self.register(Box::new(carrier));
        self
    }

    pub fn get(&self, code: &str) -> Option<&dyn CarrierBehaviour> {
        self.carriers.get(code).map(|c| c.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn CarrierBehaviour> {
        self.order
            .iter()
            .filter_map(|code| self.carriers.get(code).map(|c| c.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl std::fmt::Debug for CarrierRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarrierRegistry")
            .field("carriers", &self.order)
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    fn country(raw: &str) -> CountryCode {
        CountryCode::new(raw).unwrap()
    }

    fn host() -> DynamicCarrierHost {
        DynamicCarrierHost::new(
            Carrier::new(CarrierCode::new("packetery_dynamic").unwrap(), "Packeta carriers"),
            MethodCatalogue::full(),
            CarrierTables::new(),
        )
    }

    fn dynamic(max_weight: Option<f64>) -> DynamicCarrier {
        DynamicCarrier {
            id: 106,
            owner: CarrierCode::new("packetery_dynamic").unwrap(),
            country: country("cz"),
            name: "CZ Home Delivery".to_string(),
            max_weight,
            methods: BTreeSet::from([Method::AddressDelivery]),
            supports_cod: false,
            supports_age_verification: false,
            deleted: false,
        }
    }

    #[test]
    fn test_tables_lookup() {
        let tables = CarrierTables::new()
            .with_point(Method::AddressDelivery, country("cz"), "106")
            .with_countries(Method::AddressDelivery, [country("cz"), country("sk")])
            .with_countries(Method::AddressDelivery, [country("hu")]);

        assert_eq!(tables.point_id(Method::AddressDelivery, &country("cz")), Some("106"));
        assert_eq!(tables.point_id(Method::AddressDelivery, &country("sk")), None);
        assert_eq!(tables.countries(Method::AddressDelivery).len(), 3);
        assert!(tables.countries(Method::PickupPointDelivery).is_empty());
    }

    #[test]
    fn test_static_carrier_default_hook_passes() {
        let carrier = StaticCarrier::new(
            Carrier::new(CarrierCode::new("packetery_zpoint").unwrap(), "Z-Point"),
            MethodCatalogue::full(),
            CarrierTables::new(),
        );
        let cart = CartSummary::new(999.0, Money::zero()).with_cod(true);
        assert!(carrier.validate_dynamic_carrier(Some(&dynamic(Some(1.0))), &country("de"), &cart));
        assert!(carrier.quotes_directly());
    }

    #[test]
    fn test_host_never_quotes_directly() {
        assert!(!host().quotes_directly());
    }

    #[test]
    fn test_host_validates_dynamic_carrier() {
        let host = host();
        let cz = country("cz");
        let light = CartSummary::new(2.0, Money::from_major(100));

        assert!(host.validate_dynamic_carrier(None, &cz, &light));
        assert!(host.validate_dynamic_carrier(Some(&dynamic(Some(5.0))), &cz, &light));

        let heavy = CartSummary::new(6.0, Money::from_major(100));
        assert!(!host.validate_dynamic_carrier(Some(&dynamic(Some(5.0))), &cz, &heavy));

        assert!(!host.validate_dynamic_carrier(Some(&dynamic(None)), &country("sk"), &light));
        assert!(!host.validate_dynamic_carrier(Some(&dynamic(None)), &cz, &light.with_cod(true)));
        assert!(!host.validate_dynamic_carrier(
            Some(&dynamic(None)),
            &cz,
            &light.with_age_verification(true)
        ));

        let mut deleted = dynamic(None);
        deleted.deleted = true;
        assert!(!host.validate_dynamic_carrier(Some(&deleted), &cz, &light));

        let mut foreign = dynamic(None);
        foreign.owner = CarrierCode::new("packetery_other").unwrap();
        assert!(!host.validate_dynamic_carrier(Some(&foreign), &cz, &light));
    }

    #[test]
    fn test_registry_keeps_registration_order() {
        let make = |code: &str| {
            StaticCarrier::new(
                Carrier::new(CarrierCode::new(code).unwrap(), code),
                MethodCatalogue::full(),
                CarrierTables::new(),
            )
        };
        let mut registry = CarrierRegistry::new()
            .with(make("packetery_zpoint"))
            .with(make("packetery_alza"));
        registry.register(Box::new(make("packetery_zpoint")));

        let codes: Vec<&str> = registry.iter().map(|c| c.code().as_str()).collect();
        assert_eq!(codes, vec!["packetery_zpoint", "packetery_alza"]);
        assert_eq!(registry.len(), 2);
        assert!(registry.get("packetery_alza").is_some());
        assert!(registry.get("flat_rate").is_none());
    }
}
