use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::DemandLevel;

/// Seasonal price multipliers keyed by the moving date's calendar month.
///
/// Peak: June-August and December. High: March-May and September-November.
/// Normal: January and February.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonalMultipliers {
    pub peak: f64,
    pub high: f64,
    pub normal: f64,
}

/// Price multipliers for each demand tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandMultipliers {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub very_high: f64,
}

impl DemandMultipliers {
    pub fn for_level(&self, level: DemandLevel) -> f64 {
        match level {
            DemandLevel::Low => self.low,
            DemandLevel::Medium => self.medium,
            DemandLevel::High => self.high,
            DemandLevel::VeryHigh => self.very_high,
        }
    }
}

/// Flat per-unit surcharge amounts for items needing special handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialItemSurcharges {
    /// Item name contains "piano".
    pub piano: f64,
    /// Item name contains "antique".
    pub antique: f64,
    /// Item name contains "artwork".
    pub artwork: f64,
    /// Fragile flag set.
    pub fragile: f64,
    /// Valuable flag set.
    pub valuable: f64,
    /// Unit weight above 50 kg.
    pub heavy: f64,
}

/// Surcharge amounts for difficult property access, per location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessSurcharges {
    /// Charged per floor when the property has no lift.
    pub no_lift_per_floor: f64,
    /// Flat charge for narrow corridors or doorways.
    pub narrow_access: f64,
    /// Flat charge when the van cannot park near the entrance.
    pub long_carry: f64,
    /// Flat charge for stairs on the carry route.
    pub stairs: f64,
}

/// Global rate constants for the pricing engine.
///
/// Loaded once at startup and passed into the engine; read-only at request
/// time. All monetary values are non-negative and all multipliers positive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Flat fee on every booking.
    pub base_fee: f64,
    /// VAT rate in [0, 1].
    pub vat_rate: f64,
    /// Distance included in the base price, in km.
    pub free_distance_km: f64,
    /// Rate for distance beyond the free allowance.
    pub price_per_km: f64,
    /// Distance beyond which the long-distance surcharge kicks in.
    pub long_distance_threshold_km: f64,
    /// Additional per-km rate on the portion beyond the threshold,
    /// on top of the base per-km rate.
    pub long_distance_surcharge_per_km: f64,
    /// Rate per cubic metre of load.
    pub price_per_cubic_meter: f64,
    /// Total volume above which the volume discount applies.
    pub volume_discount_threshold_m3: f64,
    /// Discount rate applied to the volume charge above the threshold.
    pub volume_discount_rate: f64,
    /// Minimum billable duration in hours.
    pub minimum_duration_hours: f64,
    /// Rate per billable hour.
    pub price_per_hour: f64,
    /// Per-service price multipliers; services not listed default to 1.0.
    pub service_multipliers: HashMap<String, f64>,
    pub seasonal_multipliers: SeasonalMultipliers,
    pub demand_multipliers: DemandMultipliers,
    pub special_item_surcharges: SpecialItemSurcharges,
    pub access_surcharges: AccessSurcharges,
    /// Global cap on any discount, as a percentage of the order value.
    pub max_discount_percentage: f64,
    /// Global cap on any discount, as an absolute amount.
    pub max_discount_amount: f64,
}

impl Default for PricingConfig {
    /// The reference rate card.
    fn default() -> Self {
        let mut service_multipliers = HashMap::new();
        service_multipliers.insert("van-only".to_string(), 0.9);
        service_multipliers.insert("man-and-van".to_string(), 1.0);
        service_multipliers.insert("two-man-team".to_string(), 1.1);
        service_multipliers.insert("premium".to_string(), 1.25);

        Self {
            base_fee: 25.0,
            vat_rate: 0.20,
            free_distance_km: 5.0,
            price_per_km: 1.5,
            long_distance_threshold_km: 50.0,
            long_distance_surcharge_per_km: 0.5,
            price_per_cubic_meter: 8.0,
            volume_discount_threshold_m3: 25.0,
            volume_discount_rate: 0.10,
            minimum_duration_hours: 2.0,
            price_per_hour: 35.0,
            service_multipliers,
            seasonal_multipliers: SeasonalMultipliers {
                peak: 1.25,
                high: 1.10,
                normal: 1.0,
            },
            demand_multipliers: DemandMultipliers {
                low: 0.90,
                medium: 1.0,
                high: 1.15,
                very_high: 1.30,
            },
            special_item_surcharges: SpecialItemSurcharges {
                piano: 50.0,
                antique: 25.0,
                artwork: 25.0,
                fragile: 15.0,
                valuable: 20.0,
                heavy: 30.0,
            },
            access_surcharges: AccessSurcharges {
                no_lift_per_floor: 10.0,
                narrow_access: 15.0,
                long_carry: 20.0,
                stairs: 12.0,
            },
            max_discount_percentage: 50.0,
            max_discount_amount: 150.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = PricingConfig::default();
        assert!(config.vat_rate >= 0.0 && config.vat_rate <= 1.0);
        assert!(config.base_fee >= 0.0);
        assert!(config.price_per_km >= 0.0);
        assert!(config.volume_discount_rate < 1.0);
        for (id, multiplier) in &config.service_multipliers {
            assert!(*multiplier > 0.0, "multiplier for {} must be positive", id);
        }
    }

    #[test]
    fn test_demand_lookup() {
        let config = PricingConfig::default();
        assert_eq!(
            config.demand_multipliers.for_level(DemandLevel::Low),
            config.demand_multipliers.low
        );
        assert!(
            config.demand_multipliers.for_level(DemandLevel::VeryHigh)
                > config.demand_multipliers.for_level(DemandLevel::Medium)
        );
    }
}
