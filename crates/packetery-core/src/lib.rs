//! # packetery-core: Pure Rate & Method Resolution Engine
//!
//! This crate is the **heart** of the Packetery carrier plugin. It decides
//! which delivery methods a cart may use and what each one costs, as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Packetery Rates Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    rate-cli (packetery-rates)                   │   │
//! │  │        quote ──► decode ──► encode ──► carriers                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    packetery-settings                           │   │
//! │  │        settings.toml, carrier feed JSON, env overrides          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ builds                                 │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ packetery-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  overlay  │  │ available │  │  pricing  │  │ rate_code │  │   │
//! │  │   │  methods  │  │ is_usable │  │   tiers   │  │  codec    │  │   │
//! │  │   └─────┬─────┘  └─────┬─────┘  └─────┬─────┘  └───────────┘  │   │
//! │  │         └──────────────┼──────────────┘                        │   │
//! │  │                  ┌─────▼─────┐      ┌───────────┐              │   │
//! │  │                  │   quote   │◄─────│  engine   │              │   │
//! │  │                  └───────────┘      └───────────┘              │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO SETTINGS FILES • NO NETWORK • PURE FUNCTIONS     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`method`] - Delivery methods and carrier catalogues
//! - [`types`] - Carriers, dynamic carriers, countries, cart summary
//! - [`money`] - Money type with integer arithmetic
//! - [`config`] - Per-carrier settings and tier tables
//! - [`overlay`] - Dynamic carrier overlays and allowed-method resolution
//! - [`registry`] - Dynamic carrier directory
//! - [`carriers`] - Carrier capability trait and registry
//! - [`availability`] - Whether a method can ship to a country
//! - [`pricing`] - Tier evaluation
//! - [`quote`] - Rate quote builder
//! - [`rate_code`] - Rate code wire format
//! - [`engine`] - Full quoting pass and selection resolution
//! - [`error`] - Domain error types
//! - [`validation`] - Input checks
//!
//! ## Example Usage
//!
//! ```rust
//! use packetery_core::{
//!     build_quotes, Carrier, CarrierCode, CarrierConfig, CarrierTables, CartSummary, Config,
//!     CountryCode, Method, MethodCatalogue, Money, QuoteRequest, StaticCarrier, WeightTier,
//! };
//!
//! let code = CarrierCode::new("packetery_zpoint").unwrap();
//! let cz = CountryCode::new("CZ").unwrap();
//! let carrier = StaticCarrier::new(
//!     Carrier::new(code.clone(), "Z-Point"),
//!     MethodCatalogue::new([(Method::PickupPointDelivery, "Pickup point")]),
//!     CarrierTables::new().with_countries(Method::PickupPointDelivery, [cz.clone()]),
//! );
//!
//! let mut config = CarrierConfig::new(code);
//! config.weight_tiers = vec![WeightTier::new(5.0, Money::from_major(79))];
//!
//! let cart = CartSummary::new(1.2, Money::from_major(500));
//! let quotes = build_quotes(&carrier, &Config::Base(config), &QuoteRequest::new(&cz, &cart));
//!
//! assert_eq!(quotes.len(), 1);
//! assert_eq!(quotes[0].rate_code_string(), "packetery_zpoint_pickupPointDelivery");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod availability;
pub mod carriers;
pub mod config;
pub mod engine;
pub mod error;
pub mod method;
pub mod money;
pub mod overlay;
pub mod pricing;
pub mod quote;
pub mod rate_code;
pub mod registry;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use packetery_core::Money` instead of
// `use packetery_core::money::Money`

pub use availability::is_usable;
pub use carriers::{CarrierBehaviour, CarrierRegistry, CarrierTables, DynamicCarrierHost, StaticCarrier};
pub use config::{ApplicableCountries, CarrierConfig, SurchargeTier, WeightTier};
pub use engine::{RateEngine, Selection};
pub use error::{CoreError, CoreResult, ValidationError};
pub use method::{CatalogueEntry, Method, MethodCatalogue};
pub use money::Money;
pub use overlay::{resolve_allowed_methods, Config, DynamicConfigOverlay, MAX_OVERLAY_DEPTH};
pub use pricing::price;
pub use quote::{build_quotes, QuoteRequest, RateQuote};
pub use rate_code::RateCode;
pub use registry::DynamicCarrierRegistry;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Substring every plugin-owned carrier code carries.
///
/// Rate codes whose carrier segment lacks it belong to some other shipping
/// module and are rejected by the decoder.
pub const RESERVED_CARRIER_MARKER: &str = "packetery";
