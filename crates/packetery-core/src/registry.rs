//! # Dynamic Carrier Registry
//!
//! Directory of runtime-discovered sub-carriers keyed by
//! `(owner carrier code, numeric id)`.
//!
//! ## Lookup Semantics
//! ```text
//! get_by_id(owner, None)        → None   "use the static carrier directly"
//! get_by_id(owner, Some(999))   → None   unknown id, same meaning
//! get_by_id(owner, Some(106))   → Some   even when tombstoned (old orders)
//!
//! find_configurable(cz, {...})  → live carriers in cz offering any method
//! ```

use std::collections::{BTreeMap, BTreeSet};

use crate::method::Method;
use crate::types::{CarrierCode, CountryCode, DynamicCarrier};

/// In-memory dynamic carrier directory.
#[derive(Debug, Clone, Default)]
pub struct DynamicCarrierRegistry {
    carriers: BTreeMap<(CarrierCode, u32), DynamicCarrier>,
}

impl DynamicCarrierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a dynamic carrier; returns the previous entry.
    pub fn insert(&mut self, carrier: DynamicCarrier) -> Option<DynamicCarrier> {
        self.carriers
            .insert((carrier.owner.clone(), carrier.id), carrier)
    }

    /// Looks up a dynamic carrier. `None` id or unknown id both yield
    /// `None`, which callers treat as "no dynamic carrier".
    pub fn get_by_id(&self, owner: &CarrierCode, id: Option<u32>) -> Option<&DynamicCarrier> {
        let id = id?;
        self.carriers.get(&(owner.clone(), id))
    }

    /// Live (non-deleted) dynamic carriers in `country` that offer at
    /// least one of `methods`, ordered by owner then id.
    pub fn find_configurable(
        &self,
        country: &CountryCode,
        methods: &BTreeSet<Method>,
    ) -> Vec<&DynamicCarrier> {
        self.carriers
            .values()
            .filter(|c| !c.deleted && &c.country == country && c.supports_any(methods))
            .collect()
    }

    /// Every dynamic carrier owned by `owner`, tombstones included.
    pub fn for_carrier<'a>(
        &'a self,
        owner: &'a CarrierCode,
    ) -> impl Iterator<Item = &'a DynamicCarrier> + 'a {
        self.carriers.values().filter(move |c| &c.owner == owner)
    }

    /// Countries where `owner` has a live dynamic carrier offering `method`.
    pub fn countries_for(&self, owner: &CarrierCode, method: Method) -> BTreeSet<CountryCode> {
        self.for_carrier(owner)
            .filter(|c| !c.deleted && c.methods.contains(&method))
            .map(|c| c.country.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DynamicCarrier> {
        self.carriers.values()
    }

    pub fn len(&self) -> usize {
        self.carriers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.carriers.is_empty()
    }
}

impl FromIterator<DynamicCarrier> for DynamicCarrierRegistry {
    fn from_iter<T: IntoIterator<Item = DynamicCarrier>>(iter: T) -> Self {
        let mut registry = DynamicCarrierRegistry::new();
        for carrier in iter {
            registry.insert(carrier);
        }
        registry
    }
}

impl Extend<DynamicCarrier> for DynamicCarrierRegistry {
    fn extend<T: IntoIterator<Item = DynamicCarrier>>(&mut self, iter: T) {
        for carrier in iter {
            self.insert(carrier);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
