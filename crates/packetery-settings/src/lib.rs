//! # packetery-settings: Settings & Carrier Feed for the Rate Engine
//!
//! Turns what the shop has on disk into a ready [`RateEngine`].
//!
//! ## Loading Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  settings.toml ──► SettingsConfig::load ──► validate()                  │
//! │                          │                                              │
//! │                          ▼                                              │
//! │  carriers.json ──► CarrierFeed::load ──► merge_into(registry)           │
//! │                          │                  (tombstones vanished ids)   │
//! │                          ▼                                              │
//! │                CarrierDeclaration::build  ──►  CarrierRegistry          │
//! │                CarrierOptions::to_config  ──►  CarrierConfig            │
//! │                          │                                              │
//! │                          ▼                                              │
//! │                     RateEngine (packetery-core)                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,no_run
//! use packetery_settings::SettingsConfig;
//!
//! let settings = SettingsConfig::load(None)?;
//! let engine = settings.build_engine(chrono::Utc::now())?;
//! # Ok::<(), packetery_settings::SettingsError>(())
//! ```
//!
//! [`RateEngine`]: packetery_core::RateEngine

pub mod config;
pub mod declaration;
pub mod error;
pub mod feed;
pub mod options;

pub use config::{FeedSettings, GeneralSettings, SettingsConfig};
pub use declaration::{CarrierDeclaration, CarrierKind, MethodLabel, PointRow};
pub use error::{SettingsError, SettingsResult};
pub use feed::{CarrierFeed, FeedCarrier, MergeReport};
pub use options::{CarrierOptions, Flag, SurchargeLimit, WeightLimit};
