//! # Method Catalogue
//!
//! The three delivery method kinds a carrier can expose, and the ordered
//! catalogue (method + human label) each carrier declares.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Method                  Wire token               Destination           │
//! │  ──────────────────────  ───────────────────────  ───────────────────── │
//! │  PickupPointDelivery     pickupPointDelivery      point chosen by buyer │
//! │  AddressDelivery         addressDelivery          home address          │
//! │  DirectAddressDelivery   directAddressDelivery    home, bypassing hubs  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Method
// =============================================================================

/// A delivery method kind.
///
/// `Ord` follows declaration order; every method set in the engine is a
/// `BTreeSet<Method>`, so quote ordering is stable across calls.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum Method {
    /// Parcel is collected by the customer at a pickup point.
    PickupPointDelivery,
    /// Parcel is delivered to the customer's address.
    AddressDelivery,
    /// Parcel is delivered to the address by the external carrier directly.
    DirectAddressDelivery,
}

impl Method {
    /// Every method, in declaration order.
    pub const ALL: [Method; 3] = [
        Method::PickupPointDelivery,
        Method::AddressDelivery,
        Method::DirectAddressDelivery,
    ];

    /// Wire token used in rate codes and settings files.
    pub const fn code(&self) -> &'static str {
        match self {
            Method::PickupPointDelivery => "pickupPointDelivery",
            Method::AddressDelivery => "addressDelivery",
            Method::DirectAddressDelivery => "directAddressDelivery",
        }
    }

    /// Label used when a catalogue does not name the method itself.
    pub const fn default_label(&self) -> &'static str {
        match self {
            Method::PickupPointDelivery => "Pickup point delivery",
            Method::AddressDelivery => "Address delivery",
            Method::DirectAddressDelivery => "Direct address delivery",
        }
    }

    pub const fn is_pickup_point(&self) -> bool {
        matches!(self, Method::PickupPointDelivery)
    }

    /// Address or direct-address delivery.
    pub const fn is_any_address_delivery(&self) -> bool {
        matches!(self, Method::AddressDelivery | Method::DirectAddressDelivery)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Exact, case-sensitive match on the wire token.
impl FromStr for Method {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|m| m.code() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "method".to_string(),
                allowed: Method::ALL.iter().map(|m| m.code().to_string()).collect(),
            })
    }
}

// =============================================================================
// Method Catalogue
// =============================================================================

/// One catalogue line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueEntry {
    pub method: Method,
    pub label: String,
}

/// The methods a carrier declares it supports, with their labels.
///
/// An unrestricted carrier config defers to this list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodCatalogue {
    entries: Vec<CatalogueEntry>,
}

impl MethodCatalogue {
    /// Builds a catalogue; a method listed twice keeps its first label.
    pub fn new<I, L>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Method, L)>,
        L: Into<String>,
    {
        let mut catalogue = MethodCatalogue::default();
        for (method, label) in entries {
            if !catalogue.contains(method) {
                catalogue.entries.push(CatalogueEntry {
                    method,
                    label: label.into(),
                });
            }
        }
        catalogue
    }

    /// All three methods with their default labels.
    pub fn full() -> Self {
        Self::new(Method::ALL.map(|m| (m, m.default_label())))
    }

    pub fn methods(&self) -> BTreeSet<Method> {
        self.entries.iter().map(|e| e.method).collect()
    }

    pub fn label(&self, method: Method) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.method == method)
            .map(|e| e.label.as_str())
    }

    pub fn contains(&self, method: Method) -> bool {
        self.entries.iter().any(|e| e.method == method)
    }

    pub fn entries(&self) -> &[CatalogueEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
