//! # Carrier Declarations
//!
//! The `[[carriers]]` tables of the settings file: which carriers exist,
//! how each behaves, and the lookup tables it answers from.
//!
//! ## File Format
//! ```toml
//! [[carriers]]
//! code = "packetery_dynamic"
//! name = "Packeta carriers"
//! kind = "dynamic_host"            # static | dynamic_host
//!
//! [[carriers.methods]]
//! method = "addressDelivery"
//! label = "Home delivery"
//!
//! [[carriers.points]]
//! method = "addressDelivery"
//! country = "cz"
//! point_id = "106"
//!
//! [carriers.countries]
//! addressDelivery = ["cz", "sk"]
//! ```
//!
//! A `dynamic_host` additionally serves every country where one of its
//! live dynamic carriers operates, and each such carrier's id becomes the
//! address-delivery point id for its country unless a `points` row says
//! otherwise.

use std::collections::BTreeMap;

use packetery_core::{
    Carrier, CarrierBehaviour, CarrierCode, CarrierTables, CountryCode, DynamicCarrierHost,
    DynamicCarrierRegistry, Method, MethodCatalogue, StaticCarrier,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SettingsError, SettingsResult};
use crate::options::CarrierOptions;

/// How a declared carrier validates quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarrierKind {
    /// Table-driven, no extra validation.
    #[default]
    Static,
    /// Fronts dynamic carriers and validates each quote against them.
    DynamicHost,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodLabel {
    pub method: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointRow {
    pub method: String,
    pub country: String,
    pub point_id: String,
}

/// One `[[carriers]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierDeclaration {
    pub code: String,
    pub name: String,

    #[serde(default)]
    pub kind: CarrierKind,

    #[serde(default)]
    pub available_for_pricing_rules: bool,

    /// Catalogue in display order; empty declares every method.
    #[serde(default)]
    pub methods: Vec<MethodLabel>,

    #[serde(default)]
    pub points: Vec<PointRow>,

    /// Method token to served country codes.
    #[serde(default)]
    pub countries: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub options: CarrierOptions,
}

impl CarrierDeclaration {
    /// Validated carrier code. Codes outside the plugin's namespace are
    /// refused so every quote's rate code can be decoded again.
    pub fn carrier_code(&self) -> SettingsResult<CarrierCode> {
        let code = CarrierCode::new(self.code.clone())
            .map_err(|err| SettingsError::for_carrier(&self.code, err))?;
        if !code.is_plugin_owned() {
            return Err(SettingsError::for_carrier(
                &self.code,
                format!("code must contain {:?}", packetery_core::RESERVED_CARRIER_MARKER),
            ));
        }
        Ok(code)
    }

    pub fn catalogue(&self) -> SettingsResult<MethodCatalogue> {
        if self.methods.is_empty() {
            return Ok(MethodCatalogue::full());
        }
        let entries = self
            .methods
            .iter()
            .map(|entry| -> SettingsResult<(Method, String)> {
                Ok((self.method(&entry.method)?, entry.label.clone()))
            })
            .collect::<SettingsResult<Vec<_>>>()?;
        Ok(MethodCatalogue::new(entries))
    }

    /// Lookup tables from the declaration, plus those contributed by
    /// `dynamic_carriers` when this is a dynamic host.
    pub fn tables(
        &self,
        code: &CarrierCode,
        dynamic_carriers: &DynamicCarrierRegistry,
    ) -> SettingsResult<CarrierTables> {
        let mut tables = CarrierTables::new();

        for row in &self.points {
            let method = self.method(&row.method)?;
            tables = tables.with_point(method, self.country(&row.country)?, row.point_id.clone());
        }
        for (token, countries) in &self.countries {
            let method = self.method(token)?;
            let countries = countries
                .iter()
                .map(|raw| self.country(raw))
                .collect::<SettingsResult<Vec<_>>>()?;
            tables = tables.with_countries(method, countries);
        }

        if self.kind == CarrierKind::DynamicHost {
            for method in Method::ALL {
                tables = tables.with_countries(method, dynamic_carriers.countries_for(code, method));
            }
            for dc in dynamic_carriers.for_carrier(code).filter(|dc| !dc.deleted) {
                for method in dc.methods.iter().filter(|m| m.is_any_address_delivery()) {
                    if tables.point_id(*method, &dc.country).is_none() {
                        tables = tables.with_point(*method, dc.country.clone(), dc.id.to_string());
                    }
                }
            }
        }

        Ok(tables)
    }

    /// Builds the carrier implementation the declaration describes.
    pub fn build(
        &self,
        dynamic_carriers: &DynamicCarrierRegistry,
    ) -> SettingsResult<Box<dyn CarrierBehaviour>> {
        let code = self.carrier_code()?;
        let mut carrier = Carrier::new(code.clone(), self.name.clone());
        carrier.available_for_pricing_rules = self.available_for_pricing_rules;

        let catalogue = self.catalogue()?;
        let tables = self.tables(&code, dynamic_carriers)?;
        debug!(carrier = %code, kind = ?self.kind, methods = catalogue.entries().len(), "Carrier declared");

        Ok(match self.kind {
            CarrierKind::Static => Box::new(StaticCarrier::new(carrier, catalogue, tables)),
            CarrierKind::DynamicHost => Box::new(DynamicCarrierHost::new(carrier, catalogue, tables)),
        })
    }

    fn method(&self, token: &str) -> SettingsResult<Method> {
        token
            .parse()
            .map_err(|err| SettingsError::for_carrier(&self.code, format!("{token:?}: {err}")))
    }

    fn country(&self, raw: &str) -> SettingsResult<CountryCode> {
        CountryCode::new(raw).map_err(|err| SettingsError::for_carrier(&self.code, err))
    }
}
