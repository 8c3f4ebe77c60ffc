//! # Settings Configuration
//!
//! Loads the rate engine's persisted settings and assembles a
//! [`RateEngine`] from them.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PACKETERY_FEED_PATH=/var/lib/packetery/carriers.json               │
//! │     PACKETERY_DEFAULT_COUNTRY=sk                                       │
//! │                                                                         │
//! │  2. TOML Settings File                                                 │
//! │     $PACKETERY_SETTINGS, or                                            │
//! │     ~/.config/rates/settings.toml (Linux)                              │
//! │     ~/Library/Application Support/com.packetery.rates/settings.toml    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     no carriers, no feed, 48 h feed max age                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Settings File Format
//! ```toml
//! [general]
//! default_country = "cz"
//!
//! [feed]
//! path = "/var/lib/packetery/carriers.json"
//! owner = "packetery_dynamic"
//! max_age_hours = 48
//!
//! [[carriers]]
//! code = "packetery_zpoint"
//! name = "Z-Point"
//!
//! [carriers.options]
//! weight_limits = [{ weight = "5", price = "79" }]
//!
//! [[dynamic_carriers]]              # previously known, e.g. from old orders
//! id = 107
//! owner = "packetery_dynamic"
//! country = "hu"
//! name = "HU Home Delivery"
//! methods = ["addressDelivery"]
//! deleted = true
//! ```

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use packetery_core::{
    CarrierCode, CarrierRegistry, CountryCode, DynamicCarrier, DynamicCarrierRegistry, RateEngine,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::declaration::{CarrierDeclaration, CarrierKind};
use crate::error::{SettingsError, SettingsResult};
use crate::feed::CarrierFeed;

// =============================================================================
// Sections
// =============================================================================

/// `[general]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralSettings {
    /// Destination assumed when a request names none.
    #[serde(default)]
    pub default_country: Option<String>,
}

/// `[feed]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSettings {
    /// Stored carrier feed; no dynamic carriers are loaded when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Carrier the feed's carriers belong to. May be omitted when exactly
    /// one carrier is a dynamic host.
    #[serde(default)]
    pub owner: Option<String>,

    /// A feed older than this is reported as stale.
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: u64,
}

fn default_max_age_hours() -> u64 {
    48
}

/// Upper bound for `feed.max_age_hours` (ten years).
pub const MAX_FEED_AGE_HOURS: u64 = 24 * 365 * 10;

impl Default for FeedSettings {
    fn default() -> Self {
        FeedSettings {
            path: None,
            owner: None,
            max_age_hours: default_max_age_hours(),
        }
    }
}

// =============================================================================
// Settings Config
// =============================================================================

/// Complete rate engine settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsConfig {
    #[serde(default)]
    pub general: GeneralSettings,

    #[serde(default)]
    pub feed: FeedSettings,

    /// Registration order is quote order.
    #[serde(default)]
    pub carriers: Vec<CarrierDeclaration>,

    /// Dynamic carriers known before the feed is applied.
    #[serde(default)]
    pub dynamic_carriers: Vec<DynamicCarrier>,
}

impl SettingsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads settings from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Settings file (`config_path`, `$PACKETERY_SETTINGS`, platform default)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SettingsResult<Self> {
        let mut config = Self::default();

        let path = config_path
            .or_else(|| std::env::var_os("PACKETERY_SETTINGS").map(PathBuf::from))
            .or_else(Self::default_config_path);
        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading settings from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Settings file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Saves settings to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SettingsResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SettingsError::ConfigSaveFailed("No settings path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Settings saved");
        Ok(())
    }

    /// Validates the settings.
    ///
    /// Carrier options are checked too, so a corrupt applicable-countries
    /// discriminator fails here rather than mid-checkout.
    pub fn validate(&self) -> SettingsResult<()> {
        if let Some(ref country) = self.general.default_country {
            CountryCode::new(country)?;
        }

        if self.feed.max_age_hours == 0 || self.feed.max_age_hours > MAX_FEED_AGE_HOURS {
            return Err(SettingsError::InvalidConfig(format!(
                "feed.max_age_hours must be between 1 and {MAX_FEED_AGE_HOURS}"
            )));
        }

        let mut seen = HashSet::new();
        for decl in &self.carriers {
            let code = decl.carrier_code()?;
            if !seen.insert(code.clone()) {
                return Err(SettingsError::for_carrier(&decl.code, "declared more than once"));
            }
            decl.catalogue()?;
            decl.options.to_config(&code)?;
        }

        if self.feed.path.is_some() {
            self.feed_owner()?;
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Feed file
        if let Some(path) = var("PACKETERY_FEED_PATH") {
            debug!(path = %path, "Overriding feed path from environment");
            self.feed.path = Some(PathBuf::from(path));
        }

        // Feed owner
        if let Some(owner) = var("PACKETERY_FEED_OWNER") {
            self.feed.owner = Some(owner);
        }

        // Feed max age
        if let Some(hours) = var("PACKETERY_FEED_MAX_AGE_HOURS") {
            match hours.parse::<u64>() {
                Ok(h) => self.feed.max_age_hours = h,
                Err(_) => warn!(value = %hours, "Ignoring non-numeric PACKETERY_FEED_MAX_AGE_HOURS"),
            }
        }

        // Default country
        if let Some(country) = var("PACKETERY_DEFAULT_COUNTRY") {
            debug!(country = %country, "Overriding default country from environment");
            self.general.default_country = Some(country);
        }
    }

    /// Returns the default settings file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "packetery", "rates")
            .map(|dirs| dirs.config_dir().join("settings.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn default_country(&self) -> SettingsResult<Option<CountryCode>> {
        Ok(self
            .general
            .default_country
            .as_deref()
            .map(CountryCode::new)
            .transpose()?)
    }

    /// Carrier the feed's records belong to.
    pub fn feed_owner(&self) -> SettingsResult<CarrierCode> {
        let hosts: Vec<&CarrierDeclaration> = self
            .carriers
            .iter()
            .filter(|decl| decl.kind == CarrierKind::DynamicHost)
            .collect();

        let owner = match (&self.feed.owner, hosts.as_slice()) {
            (Some(owner), _) => owner.clone(),
            (None, [only]) => only.code.clone(),
            (None, []) => {
                return Err(SettingsError::InvalidConfig(
                    "feed.path is set but no carrier is a dynamic_host".into(),
                ))
            }
            (None, _) => {
                return Err(SettingsError::InvalidConfig(
                    "several dynamic_host carriers; set feed.owner".into(),
                ))
            }
        };

        if !hosts.iter().any(|decl| decl.code == owner) {
            return Err(SettingsError::InvalidConfig(format!(
                "feed.owner {owner:?} is not a declared dynamic_host carrier"
            )));
        }
        Ok(CarrierCode::new(owner)?)
    }

    pub fn feed_max_age(&self) -> Duration {
        let hours = self.feed.max_age_hours.min(MAX_FEED_AGE_HOURS);
        Duration::hours(i64::try_from(hours).unwrap_or(0))
    }

    // =========================================================================
    // Engine Assembly
    // =========================================================================

    /// Reads the carrier feed (when configured) and builds the engine.
    pub fn build_engine(&self, now: DateTime<Utc>) -> SettingsResult<RateEngine> {
        let feed = match self.feed.path {
            Some(ref path) => Some(CarrierFeed::load(path)?),
            None => None,
        };
        self.build_engine_with_feed(feed.as_ref(), now)
    }

    /// Builds the engine from these settings and an already loaded feed.
    pub fn build_engine_with_feed(
        &self,
        feed: Option<&CarrierFeed>,
        now: DateTime<Utc>,
    ) -> SettingsResult<RateEngine> {
        let mut dynamic_carriers: DynamicCarrierRegistry =
            self.dynamic_carriers.iter().cloned().collect();

        if let Some(feed) = feed {
            if feed.is_stale(now, self.feed_max_age()) {
                warn!(
                    synced_at = ?feed.synced_at,
                    max_age_hours = self.feed.max_age_hours,
                    "Carrier feed is stale; run the carrier sync"
                );
            }
            let owner = self.feed_owner()?;
            feed.merge_into(&owner, &mut dynamic_carriers)?;
        }

        let mut carriers = CarrierRegistry::new();
        let mut configs = Vec::with_capacity(self.carriers.len());
        for decl in &self.carriers {
            let carrier = decl.build(&dynamic_carriers)?;
            let config = decl.options.to_config(carrier.code())?;
            if !config.is_active {
                info!(carrier = %carrier.code(), "Carrier is inactive");
            }
            carriers.register(carrier);
            configs.push(config);
        }

        let engine = configs
            .into_iter()
            .fold(RateEngine::new(carriers, dynamic_carriers), RateEngine::with_config);

        info!(
            carriers = engine.carriers().len(),
            dynamic_carriers = engine.dynamic_carriers().len(),
            "Rate engine ready"
        );
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use packetery_core::{CartSummary, Method, Money};

    const SETTINGS: &str = r#"
        [general]
        default_country = "CZ"

        [feed]
        max_age_hours = 24

        [[carriers]]
        code = "packetery_zpoint"
        name = "Z-Point"

        [[carriers.methods]]
        method = "pickupPointDelivery"
        label = "Z-Point pickup"

        [carriers.countries]
        pickupPointDelivery = ["cz", "sk"]

        [carriers.options]
        weight_limits = [{ weight = "5", price = "79" }, { weight = "10", price = "99" }]
        free_shipping_limit = "2000"

        [[carriers]]
        code = "packetery_dynamic"
        name = "Packeta carriers"
        kind = "dynamic_host"

        [[carriers.methods]]
        method = "addressDelivery"
        label = "Home delivery"

        [carriers.options]
        weight_limits = [{ weight = "30", price = "119" }]
        cod_payment_method = "cod"
        surcharge_limits = [{ order_price = "5000", surcharge = "35" }]

        [[dynamic_carriers]]
        id = 107
        owner = "packetery_dynamic"
        country = "hu"
        name = "HU Home Delivery"
        methods = ["addressDelivery"]
    "#;

    const FEED: &str = r#"{
        "syncedAt": "2026-10-01T04:00:00Z",
        "carriers": [
            { "id": "106", "name": "CZ Home", "country": "cz", "maxWeight": "15",
              "pickupPoints": "false", "disallowsCod": "false" }
        ]
    }"#;

    fn settings() -> SettingsConfig {
        toml::from_str(SETTINGS).unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = SettingsConfig::default();
        assert!(config.carriers.is_empty());
        assert_eq!(config.feed.max_age_hours, 48);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_and_validate() {
        let config = settings();
        assert!(config.validate().is_ok());
        assert_eq!(config.carriers.len(), 2);
        assert_eq!(config.default_country().unwrap().unwrap().as_str(), "cz");
        assert_eq!(config.feed_owner().unwrap().as_str(), "packetery_dynamic");
    }

    #[test]
    fn test_config_validation() {
        let mut config = settings();
        config.feed.max_age_hours = 0;
        assert!(config.validate().is_err());

        let mut config = settings();
        config.general.default_country = Some("czech".into());
        assert!(config.validate().is_err());

        let mut config = settings();
        let duplicate = config.carriers[0].clone();
        config.carriers.push(duplicate);
        assert!(config.validate().unwrap_err().is_config_error());

        let mut config = settings();
        config.carriers[0].options.applicable_countries = "sometimes".into();
        assert!(config.validate().is_err());

        let mut config = settings();
        config.feed.path = Some(PathBuf::from("carriers.json"));
        config.feed.owner = Some("packetery_zpoint".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = settings();
        config.apply_overrides(|key| match key {
            "PACKETERY_FEED_PATH" => Some("/tmp/feed.json".into()),
            "PACKETERY_FEED_MAX_AGE_HOURS" => Some("six".into()),
            "PACKETERY_DEFAULT_COUNTRY" => Some("sk".into()),
            _ => None,
        });
        assert_eq!(config.feed.path, Some(PathBuf::from("/tmp/feed.json")));
        assert_eq!(config.feed.max_age_hours, 24);
        assert_eq!(config.general.default_country.as_deref(), Some("sk"));
    }

    #[test]
    fn test_build_engine_with_feed() {
        let config = settings();
        let feed = CarrierFeed::parse(FEED).unwrap();
        let engine = config.build_engine_with_feed(Some(&feed), now()).unwrap();

        assert_eq!(engine.carriers().len(), 2);
        let owner = CarrierCode::new("packetery_dynamic").unwrap();
        assert!(engine.dynamic_carriers().get_by_id(&owner, Some(107)).unwrap().deleted);
        assert!(!engine.dynamic_carriers().get_by_id(&owner, Some(106)).unwrap().deleted);

        let cz = CountryCode::new("cz").unwrap();
        let cart = CartSummary::new(3.0, Money::from_major(500));
        let codes: Vec<String> = engine.quote(&cz, &cart).iter().map(|q| q.rate_code_string()).collect();
        assert_eq!(
            codes,
            vec![
                "packetery_zpoint_pickupPointDelivery",
                "packetery_dynamic_106-addressDelivery",
            ]
        );

        let hu = CountryCode::new("hu").unwrap();
        assert!(engine.quote(&hu, &cart).is_empty());
    }

    #[test]
    fn test_feed_carrier_limits_veto_host_quotes() {
        let config = settings();
        let feed = CarrierFeed::parse(FEED).unwrap();
        let engine = config.build_engine_with_feed(Some(&feed), now()).unwrap();
        let cz = CountryCode::new("cz").unwrap();

        // 106 takes up to 15 kg; the host's own tier would price 20 kg.
        let heavy = CartSummary::new(20.0, Money::from_major(500)).with_cod(true);
        assert!(engine.quote(&cz, &heavy).is_empty());

        let restricted = CartSummary::new(3.0, Money::from_major(500)).with_age_verification(true);
        let codes: Vec<String> = engine
            .quote(&cz, &restricted)
            .iter()
            .map(|q| q.rate_code_string())
            .collect();
        assert_eq!(codes, vec!["packetery_zpoint_pickupPointDelivery"]);
    }

    #[test]
    fn test_build_engine_pricing() {
        let engine = settings().build_engine_with_feed(None, now()).unwrap();
        let sk = CountryCode::new("sk").unwrap();

        let quotes = engine.quote(&sk, &CartSummary::new(7.0, Money::from_major(500)));
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].method, Method::PickupPointDelivery);
        assert_eq!(quotes[0].price, Money::from_major(99));

        let quotes = engine.quote(&sk, &CartSummary::new(7.0, Money::from_major(2000)));
        assert!(quotes[0].is_free());

        assert!(engine.is_cod("packetery_dynamic", Some("cod")));
    }

    #[test]
    fn test_feed_without_host_fails() {
        let mut config = settings();
        config.carriers.retain(|decl| decl.kind != CarrierKind::DynamicHost);
        let feed = CarrierFeed::parse(FEED).unwrap();
        assert!(config.build_engine_with_feed(Some(&feed), now()).is_err());
    }

    #[test]
    fn test_load_rejects_unknown_discriminator() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let mut config = settings();
        config.carriers[0].options.applicable_countries = "sometimes".into();
        config.save(Some(path.clone())).unwrap();

        let err = SettingsConfig::load(Some(path)).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Core(packetery_core::CoreError::InvalidApplicableCountries { ref value, .. })
                if value == "sometimes"
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        let config = settings();
        config.save(Some(path.clone())).unwrap();
        let loaded: SettingsConfig = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&settings()).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[[carriers]]"));
    }
}
