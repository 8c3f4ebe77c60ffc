//! # Carrier Feed
//!
//! The periodic carrier-list sync stores Packeta's list of external
//! carriers as JSON. Every value arrives as a string.
//!
//! ## Feed Format
//! ```json
//! {
//!   "syncedAt": "2026-10-01T04:00:00Z",
//!   "carriers": [
//!     {
//!       "id": "106",
//!       "name": "CZ Home Delivery",
//!       "country": "cz",
//!       "maxWeight": "10",
//!       "pickupPoints": "false",
//!       "disallowsCod": "false",
//!       "supportsAgeVerification": "true"
//!     }
//!   ]
//! }
//! ```
//!
//! ## Merge
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  known (registry)          feed                 after merge_into        │
//! │  ────────────────          ────                 ────────────────        │
//! │  106 live                  106                  106 live (updated)      │
//! │  107 live                  ─                    107 deleted (tombstone) │
//! │  ─                         108                  108 live (added)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Carriers are never removed: orders placed through 107 must still
//! resolve.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use packetery_core::validation::parse_weight;
use packetery_core::{CarrierCode, CountryCode, DynamicCarrier, DynamicCarrierRegistry, Method};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{SettingsError, SettingsResult};

// =============================================================================
// Feed Records
// =============================================================================

/// One carrier as the remote API reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedCarrier {
    pub id: String,
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub max_weight: String,
    #[serde(default)]
    pub pickup_points: String,
    #[serde(default)]
    pub disallows_cod: String,
    #[serde(default)]
    pub supports_age_verification: String,
}

impl FeedCarrier {
    /// Converts the record into a live dynamic carrier owned by `owner`.
    ///
    /// Pickup-point carriers offer pickup-point delivery only, the rest
    /// offer address delivery only.
    pub fn to_dynamic_carrier(&self, owner: &CarrierCode) -> SettingsResult<DynamicCarrier> {
        let invalid = |reason: String| SettingsError::InvalidFeed {
            id: self.id.clone(),
            reason,
        };

        let id = self
            .id
            .trim()
            .parse::<u32>()
            .map_err(|_| invalid(format!("id is not numeric: {:?}", self.id)))?;
        let country = CountryCode::new(&self.country).map_err(|err| invalid(err.to_string()))?;

        let max_weight = match self.max_weight.trim() {
            "" | "0" => None,
            raw => Some(parse_weight("maxWeight", raw).map_err(|err| invalid(err.to_string()))?),
        };

        let pickup_points = parse_flag("pickupPoints", &self.pickup_points).map_err(invalid)?;
        let disallows_cod = parse_flag("disallowsCod", &self.disallows_cod).map_err(invalid)?;
        let supports_age_verification =
            parse_flag("supportsAgeVerification", &self.supports_age_verification).map_err(invalid)?;

        let method = if pickup_points {
            Method::PickupPointDelivery
        } else {
            Method::AddressDelivery
        };

        Ok(DynamicCarrier {
            id,
            owner: owner.clone(),
            country,
            name: self.name.clone(),
            max_weight,
            methods: BTreeSet::from([method]),
            supports_cod: !disallows_cod,
            supports_age_verification,
            deleted: false,
        })
    }
}

/// `"true"`/`"1"` and `"false"`/`"0"`; empty means false.
fn parse_flag(field: &str, raw: &str) -> Result<bool, String> {
    match raw.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        other => Err(format!("{field} is not a boolean: {other:?}")),
    }
}

// =============================================================================
// Carrier Feed
// =============================================================================

/// A stored snapshot of the remote carrier list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarrierFeed {
    #[serde(default)]
    pub synced_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub carriers: Vec<FeedCarrier>,
}

/// Outcome of [`CarrierFeed::merge_into`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub added: usize,
    pub updated: usize,
    pub tombstoned: usize,
}

impl CarrierFeed {
    pub fn parse(json: &str) -> SettingsResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads the feed file at `path`.
    pub fn load(path: &Path) -> SettingsResult<Self> {
        info!(?path, "Loading carrier feed");
        let contents = std::fs::read_to_string(path)
            .map_err(|err| SettingsError::FeedLoadFailed(format!("{}: {err}", path.display())))?;
        let feed = Self::parse(&contents)?;
        debug!(carriers = feed.carriers.len(), synced_at = ?feed.synced_at, "Carrier feed loaded");
        Ok(feed)
    }

    /// Every record converted for `owner`. One bad record fails the feed.
    pub fn to_dynamic_carriers(&self, owner: &CarrierCode) -> SettingsResult<Vec<DynamicCarrier>> {
        self.carriers
            .iter()
            .map(|record| record.to_dynamic_carrier(owner))
            .collect()
    }

    /// Brings `registry` in line with the feed for `owner`.
    ///
    /// Feed carriers are inserted live. Carriers of `owner` missing from
    /// the feed are tombstoned. Other owners are untouched.
    pub fn merge_into(
        &self,
        owner: &CarrierCode,
        registry: &mut DynamicCarrierRegistry,
    ) -> SettingsResult<MergeReport> {
        let incoming = self.to_dynamic_carriers(owner)?;
        let seen: HashSet<u32> = incoming.iter().map(|dc| dc.id).collect();

        let vanished: Vec<DynamicCarrier> = registry
            .for_carrier(owner)
            .filter(|dc| !dc.deleted && !seen.contains(&dc.id))
            .cloned()
            .collect();

        let mut report = MergeReport::default();
        for mut dc in vanished {
            debug!(carrier = %owner, dynamic_carrier = dc.id, "Carrier left the feed, tombstoning");
            dc.deleted = true;
            registry.insert(dc);
            report.tombstoned += 1;
        }
        for dc in incoming {
            match registry.insert(dc) {
                Some(_) => report.updated += 1,
                None => report.added += 1,
            }
        }

        info!(
            carrier = %owner,
            added = report.added,
            updated = report.updated,
            tombstoned = report.tombstoned,
            "Carrier feed merged"
        );
        Ok(report)
    }

    /// True when the feed was never synced or is older than `max_age`.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        match self.synced_at {
            Some(synced_at) => now.signed_duration_since(synced_at) > max_age,
            None => true,
        }
    }
}
