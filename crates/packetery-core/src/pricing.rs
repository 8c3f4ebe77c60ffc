//! # Price Tier Engine
//!
//! Turns a carrier config's tier tables into a single shipping price.
//!
//! ## Evaluation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  cart price ≥ free shipping threshold?                                  │
//! │      │ yes ──────────────────────────────────────────► 0 (tiers skipped)│
//! │      │ no                                                               │
//! │      ▼                                                                  │
//! │  first weight tier with weight ≤ weight_up_to                           │
//! │      │ none ─────────────────────────────────────────► no quote         │
//! │      ▼                                                                  │
//! │  COD? ── no ─────────────────────────────────────────► base             │
//! │      │ yes                                                              │
//! │      ▼                                                                  │
//! │  first surcharge tier with cart price ≤ cart_price_up_to                │
//! │      │ none ─────────────────────────────────────────► base             │
//! │      └───────────────────────────────────────────────► base + surcharge │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Boundaries
//! Comparisons are inclusive and tables are read in stored order, so at an
//! exact boundary the first (lowest) tier wins. Tables are never sorted
//! here; an unsorted table simply shadows its later rows.

use crate::config::{CarrierConfig, SurchargeTier, WeightTier};
use crate::money::Money;

/// Computes the shipping price, or `None` when the weight exceeds every
/// weight tier.
pub fn price(config: &CarrierConfig, cart_weight: f64, cart_price: Money, is_cod: bool) -> Option<Money> {
    if qualifies_for_free_shipping(config, cart_price) {
        return Some(Money::zero());
    }

    let base = weight_tier_for(&config.weight_tiers, cart_weight)?.price;
    if !is_cod {
        return Some(base);
    }

    let surcharge = surcharge_tier_for(&config.surcharge_tiers, cart_price)
        .map_or(Money::zero(), |tier| tier.surcharge);
    Some(base + surcharge)
}

/// True when a threshold is configured and the cart reaches it.
pub fn qualifies_for_free_shipping(config: &CarrierConfig, cart_price: Money) -> bool {
    config
        .free_shipping_threshold
        .is_some_and(|threshold| cart_price >= threshold)
}

/// First tier whose limit is at or above `weight`.
pub fn weight_tier_for(tiers: &[WeightTier], weight: f64) -> Option<&WeightTier> {
    tiers.iter().find(|tier| weight <= tier.weight_up_to)
}

/// First tier whose limit is at or above `cart_price`.
pub fn surcharge_tier_for(tiers: &[SurchargeTier], cart_price: Money) -> Option<&SurchargeTier> {
    tiers.iter().find(|tier| cart_price <= tier.cart_price_up_to)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CarrierCode;

    fn config() -> CarrierConfig {
        let mut config = CarrierConfig::new(CarrierCode::new("packetery_zpoint").unwrap());
        config.weight_tiers = vec![
            WeightTier::new(5.0, Money::from_major(10)),
            WeightTier::new(10.0, Money::from_major(20)),
        ];
        config
    }

    #[test]
    fn test_weight_tier_lookup() {
        let config = config();
        assert_eq!(price(&config, 7.0, Money::from_major(30), false), Some(Money::from_major(20)));
        assert_eq!(price(&config, 12.0, Money::from_major(30), false), None);
        assert_eq!(price(&config, 0.0, Money::from_major(30), false), Some(Money::from_major(10)));
    }

    #[test]
    fn test_boundary_goes_to_first_tier() {
        let config = config();
        assert_eq!(price(&config, 5.0, Money::zero(), false), Some(Money::from_major(10)));
        assert_eq!(price(&config, 10.0, Money::zero(), false), Some(Money::from_major(20)));
    }

    #[test]
    fn test_free_shipping_precedes_tiers() {
        let mut config = config();
        config.free_shipping_threshold = Some(Money::from_major(50));

        assert_eq!(price(&config, 999.0, Money::from_major(60), false), Some(Money::zero()));
        assert_eq!(price(&config, 999.0, Money::from_major(50), true), Some(Money::zero()));
        assert_eq!(price(&config, 999.0, Money::from_minor(4999), false), None);
    }

    #[test]
    fn test_cod_surcharge() {
        let mut config = config();
        config.surcharge_tiers = vec![SurchargeTier::new(Money::from_major(100), Money::from_major(5))];

        assert_eq!(price(&config, 7.0, Money::from_major(80), true), Some(Money::from_major(25)));
        assert_eq!(price(&config, 7.0, Money::from_major(100), true), Some(Money::from_major(25)));
        assert_eq!(price(&config, 7.0, Money::from_major(150), true), Some(Money::from_major(20)));
    }

    #[test]
    fn test_surcharge_ignored_without_cod() {
        let mut config = config();
        config.surcharge_tiers = vec![SurchargeTier::new(Money::from_major(100), Money::from_major(5))];
        assert_eq!(price(&config, 7.0, Money::from_major(80), false), Some(Money::from_major(20)));
    }

    #[test]
    fn test_cod_without_base_price_stays_unquoted() {
        let mut config = config();
        config.surcharge_tiers = vec![SurchargeTier::new(Money::from_major(100), Money::from_major(5))];
        assert_eq!(price(&config, 50.0, Money::from_major(80), true), None);
    }

    #[test]
    fn test_unsorted_tiers_are_read_in_stored_order() {
        let mut config = config();
        config.weight_tiers.reverse();
        // 3 kg matches the first stored row (10 kg) before reaching 5 kg.
        assert_eq!(price(&config, 3.0, Money::zero(), false), Some(Money::from_major(20)));
    }

    #[test]
    fn test_no_tiers_means_no_quote() {
        let config = CarrierConfig::new(CarrierCode::new("packetery_zpoint").unwrap());
        assert_eq!(price(&config, 1.0, Money::from_major(10), false), None);
    }
}
