//! # Config Overlay Resolver
//!
//! A dynamic carrier never gets a config of its own: it wraps its owner's
//! [`CarrierConfig`] in an overlay that can only *narrow* the allowed
//! methods.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Overlay { allowed: {Address, DirectAddress} }                          │
//! │     │                                                                   │
//! │     ▼ parent                                                            │
//! │  Base(CarrierConfig { allowed: {PickupPoint, Address} })                │
//! │                                                                         │
//! │  resolved = {Address, DirectAddress} ∩ {PickupPoint, Address}           │
//! │           = {Address}                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The chain is built by [`Config::overlay`], which caps its depth at
//! [`MAX_OVERLAY_DEPTH`], so resolution recursion is always bounded.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::CarrierConfig;
use crate::error::{CoreError, CoreResult};
use crate::method::{Method, MethodCatalogue};

/// Maximum number of overlays stacked on one base config.
pub const MAX_OVERLAY_DEPTH: usize = 2;

/// A config as seen by the engine: a carrier's own settings, or an overlay
/// narrowing them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Config {
    Base(CarrierConfig),
    Overlay(DynamicConfigOverlay),
}

/// Method restriction contributed by one dynamic carrier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicConfigOverlay {
    pub dynamic_carrier_id: u32,
    /// Empty narrows nothing.
    pub allowed_methods: BTreeSet<Method>,
    pub parent: Box<Config>,
}

impl Config {
    /// Wraps `self` in one more overlay.
    ///
    /// Fails with [`CoreError::OverlayTooDeep`] once the chain would exceed
    /// [`MAX_OVERLAY_DEPTH`].
    pub fn overlay(
        self,
        dynamic_carrier_id: u32,
        allowed_methods: BTreeSet<Method>,
    ) -> CoreResult<Config> {
        if self.depth() >= MAX_OVERLAY_DEPTH {
            return Err(CoreError::OverlayTooDeep {
                max: MAX_OVERLAY_DEPTH,
            });
        }
        Ok(Config::Overlay(DynamicConfigOverlay {
            dynamic_carrier_id,
            allowed_methods,
            parent: Box::new(self),
        }))
    }

    /// The root carrier config; pricing and country rules always come
    /// from here.
    pub fn base(&self) -> &CarrierConfig {
        match self {
            Config::Base(config) => config,
            Config::Overlay(overlay) => overlay.parent.base(),
        }
    }

    /// Number of overlays above the base.
    pub fn depth(&self) -> usize {
        match self {
            Config::Base(_) => 0,
            Config::Overlay(overlay) => 1 + overlay.parent.depth(),
        }
    }

    /// Id of the innermost dynamic carrier this config was built for.
    pub fn dynamic_carrier_id(&self) -> Option<u32> {
        match self {
            Config::Base(_) => None,
            Config::Overlay(overlay) => Some(overlay.dynamic_carrier_id),
        }
    }
}

impl From<CarrierConfig> for Config {
    fn from(config: CarrierConfig) -> Self {
        Config::Base(config)
    }
}

/// Resolves the effective allowed-method set of `config`.
///
/// - Base: its own `allowed_methods`, or the whole catalogue when empty.
/// - Overlay: its `allowed_methods` intersected with the parent's resolved
///   set; an empty overlay set leaves the parent's set as is.
pub fn resolve_allowed_methods(config: &Config, catalogue: &MethodCatalogue) -> BTreeSet<Method> {
    match config {
        Config::Base(base) => {
            if base.allowed_methods.is_empty() {
                catalogue.methods()
            } else {
                base.allowed_methods.clone()
            }
        }
        Config::Overlay(overlay) => {
            let parent = resolve_allowed_methods(&overlay.parent, catalogue);
            if overlay.allowed_methods.is_empty() {
                parent
            } else {
                overlay
                    .allowed_methods
                    .intersection(&parent)
                    .copied()
                    .collect()
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
