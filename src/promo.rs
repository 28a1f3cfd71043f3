use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::{DiscountKind, PromoCode, PromoContext, PromoValidation};
use crate::pricing_config::PricingConfig;

/// Static registry of promo codes, keyed by uppercased code.
///
/// Read-only at request time. Validation fails softly: every rejection is a
/// `PromoValidation { valid: false, error }` with a specific reason, so promo
/// checking can never abort a pricing calculation.
#[derive(Debug, Clone)]
pub struct PromoRegistry {
    codes: HashMap<String, PromoCode>,
}

impl PromoRegistry {
    pub fn new(codes: Vec<PromoCode>) -> Self {
        let codes = codes
            .into_iter()
            .map(|c| (c.code.to_uppercase(), c))
            .collect();
        Self { codes }
    }

    pub fn get(&self, code: &str) -> Option<&PromoCode> {
        self.codes.get(&code.trim().to_uppercase())
    }

    /// Validates a promo code against an order value and booking context.
    ///
    /// Checks run in a fixed order so the customer always sees the most
    /// fundamental problem first (unknown code, then expiry, then limits,
    /// then eligibility conditions). On success the discount is computed per
    /// the code's kind and capped by the code's own `max_discount` and both
    /// global caps from the pricing configuration.
    ///
    /// `today` is passed in rather than read from the wall clock so expiry
    /// behaviour is deterministic in tests.
    pub fn validate(
        &self,
        code: &str,
        order_value: f64,
        ctx: &PromoContext,
        config: &PricingConfig,
        today: NaiveDate,
    ) -> PromoValidation {
        let normalized = code.trim().to_uppercase();
        if normalized.is_empty() {
            return PromoValidation::rejected("No promo code provided");
        }

        let promo = match self.codes.get(&normalized) {
            Some(p) => p,
            None => {
                tracing::debug!("Unknown promo code attempted: {}", normalized);
                return PromoValidation::rejected(format!("Promo code {} not found", normalized));
            }
        };

        if let Some(expires_on) = promo.expires_on {
            if today > expires_on {
                return PromoValidation::rejected(format!(
                    "Promo code {} expired on {}",
                    normalized, expires_on
                ));
            }
        }

        if let Some(limit) = promo.usage_limit {
            if promo.used_count >= limit {
                return PromoValidation::rejected(format!(
                    "Promo code {} has reached its usage limit",
                    normalized
                ));
            }
        }

        if let Some(min_order) = promo.min_order_value {
            if order_value < min_order {
                return PromoValidation::rejected(format!(
                    "Promo code {} requires a minimum order value of {:.2}",
                    normalized, min_order
                ));
            }
        }

        if promo.first_time_customer_only && !ctx.is_first_time_customer.unwrap_or(false) {
            return PromoValidation::rejected(format!(
                "Promo code {} is only available to first-time customers",
                normalized
            ));
        }

        if let Some(ref allowed) = promo.allowed_service_types {
            let matches = ctx
                .service_type
                .as_deref()
                .map(|s| allowed.iter().any(|a| a == s))
                .unwrap_or(false);
            if !matches {
                return PromoValidation::rejected(format!(
                    "Promo code {} is not valid for the selected service",
                    normalized
                ));
            }
        }

        if let Some(min_distance) = promo.min_distance_km {
            if ctx.distance_km.unwrap_or(0.0) < min_distance {
                return PromoValidation::rejected(format!(
                    "Promo code {} requires a move of at least {:.0} km",
                    normalized, min_distance
                ));
            }
        }

        if let Some(min_volume) = promo.min_volume_m3 {
            if ctx.total_volume_m3.unwrap_or(0.0) < min_volume {
                return PromoValidation::rejected(format!(
                    "Promo code {} requires a move of at least {:.0} m³",
                    normalized, min_volume
                ));
            }
        }

        let mut discount = match promo.kind {
            DiscountKind::Percentage => {
                let raw = order_value * promo.value / 100.0;
                match promo.max_discount {
                    Some(cap) => raw.min(cap),
                    None => raw,
                }
            }
            DiscountKind::Fixed | DiscountKind::FreeService => promo.value,
        };

        // Both global caps always apply, regardless of code type.
        discount = discount
            .min(config.max_discount_amount)
            .min(order_value * config.max_discount_percentage / 100.0);

        PromoValidation::accepted(discount)
    }
}

impl Default for PromoRegistry {
    /// The codes currently running on the platform.
    fn default() -> Self {
        Self::new(vec![
            PromoCode {
                code: "FIRST20".to_string(),
                kind: DiscountKind::Percentage,
                value: 20.0,
                description: "20% off your first move".to_string(),
                min_order_value: None,
                max_discount: Some(100.0),
                expires_on: None,
                usage_limit: Some(500),
                used_count: 0,
                first_time_customer_only: true,
                allowed_service_types: None,
                min_distance_km: None,
                min_volume_m3: None,
            },
            PromoCode {
                code: "MOVE10".to_string(),
                kind: DiscountKind::Fixed,
                value: 10.0,
                description: "10 off moves over 100".to_string(),
                min_order_value: Some(100.0),
                max_discount: None,
                expires_on: None,
                usage_limit: None,
                used_count: 0,
                first_time_customer_only: false,
                allowed_service_types: None,
                min_distance_km: None,
                min_volume_m3: None,
            },
            PromoCode {
                code: "SUMMER15".to_string(),
                kind: DiscountKind::Percentage,
                value: 15.0,
                description: "Summer season discount".to_string(),
                min_order_value: Some(150.0),
                max_discount: Some(75.0),
                expires_on: NaiveDate::from_ymd_opt(2030, 9, 30),
                usage_limit: None,
                used_count: 0,
                first_time_customer_only: false,
                allowed_service_types: None,
                min_distance_km: None,
                min_volume_m3: None,
            },
            PromoCode {
                code: "LONGHAUL25".to_string(),
                kind: DiscountKind::Fixed,
                value: 25.0,
                description: "25 off long-distance moves".to_string(),
                min_order_value: None,
                max_discount: None,
                expires_on: None,
                usage_limit: None,
                used_count: 0,
                first_time_customer_only: false,
                allowed_service_types: None,
                min_distance_km: Some(100.0),
                min_volume_m3: None,
            },
            PromoCode {
                code: "BIGMOVE".to_string(),
                kind: DiscountKind::Percentage,
                value: 10.0,
                description: "10% off large moves".to_string(),
                min_order_value: None,
                max_discount: Some(120.0),
                expires_on: None,
                usage_limit: None,
                used_count: 0,
                first_time_customer_only: false,
                allowed_service_types: None,
                min_distance_km: None,
                min_volume_m3: Some(20.0),
            },
            PromoCode {
                code: "PREMIUM50".to_string(),
                kind: DiscountKind::Fixed,
                value: 50.0,
                description: "50 off premium moves".to_string(),
                min_order_value: Some(300.0),
                max_discount: None,
                expires_on: None,
                usage_limit: None,
                used_count: 0,
                first_time_customer_only: false,
                allowed_service_types: Some(vec!["premium".to_string()]),
                min_distance_km: None,
                min_volume_m3: None,
            },
            PromoCode {
                code: "FREEVAN".to_string(),
                kind: DiscountKind::FreeService,
                value: 30.0,
                description: "Van hire fee waived".to_string(),
                min_order_value: Some(200.0),
                max_discount: None,
                expires_on: None,
                usage_limit: Some(200),
                used_count: 0,
                first_time_customer_only: false,
                allowed_service_types: None,
                min_distance_km: None,
                min_volume_m3: None,
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 10).unwrap()
    }

    fn first_time_ctx() -> PromoContext {
        PromoContext {
            is_first_time_customer: Some(true),
            ..Default::default()
        }
    }

    #[test]
    fn test_unknown_code_rejected() {
        let registry = PromoRegistry::default();
        let result = registry.validate(
            "NOPE",
            200.0,
            &PromoContext::default(),
            &PricingConfig::default(),
            today(),
        );
        assert!(!result.valid);
        assert_eq!(result.discount, 0.0);
        assert!(result.error.unwrap().contains("NOPE"));
    }

    #[test]
    fn test_code_lookup_is_case_insensitive() {
        let registry = PromoRegistry::default();
        let result = registry.validate(
            "first20",
            200.0,
            &first_time_ctx(),
            &PricingConfig::default(),
            today(),
        );
        assert!(result.valid);
        assert!((result.discount - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_first_time_condition_message_is_specific() {
        let registry = PromoRegistry::default();
        let result = registry.validate(
            "FIRST20",
            200.0,
            &PromoContext::default(),
            &PricingConfig::default(),
            today(),
        );
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("first-time"));
    }

    #[test]
    fn test_min_order_value_enforced() {
        let registry = PromoRegistry::default();
        let result = registry.validate(
            "MOVE10",
            50.0,
            &PromoContext::default(),
            &PricingConfig::default(),
            today(),
        );
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("minimum order value"));

        let result = registry.validate(
            "MOVE10",
            100.0,
            &PromoContext::default(),
            &PricingConfig::default(),
            today(),
        );
        assert!(result.valid);
        assert_eq!(result.discount, 10.0);
    }

    #[test]
    fn test_expired_code_rejected() {
        let registry = PromoRegistry::new(vec![PromoCode {
            code: "OLD".to_string(),
            kind: DiscountKind::Fixed,
            value: 5.0,
            description: "expired".to_string(),
            min_order_value: None,
            max_discount: None,
            expires_on: NaiveDate::from_ymd_opt(2025, 12, 31),
            usage_limit: None,
            used_count: 0,
            first_time_customer_only: false,
            allowed_service_types: None,
            min_distance_km: None,
            min_volume_m3: None,
        }]);
        let result = registry.validate(
            "OLD",
            100.0,
            &PromoContext::default(),
            &PricingConfig::default(),
            today(),
        );
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("expired"));
    }

    #[test]
    fn test_code_valid_on_expiry_day() {
        let registry = PromoRegistry::new(vec![PromoCode {
            code: "LASTDAY".to_string(),
            kind: DiscountKind::Fixed,
            value: 5.0,
            description: "last day".to_string(),
            min_order_value: None,
            max_discount: None,
            expires_on: Some(today()),
            usage_limit: None,
            used_count: 0,
            first_time_customer_only: false,
            allowed_service_types: None,
            min_distance_km: None,
            min_volume_m3: None,
        }]);
        let result = registry.validate(
            "LASTDAY",
            100.0,
            &PromoContext::default(),
            &PricingConfig::default(),
            today(),
        );
        assert!(result.valid);
    }

    #[test]
    fn test_usage_limit_rejected() {
        let registry = PromoRegistry::new(vec![PromoCode {
            code: "MAXED".to_string(),
            kind: DiscountKind::Fixed,
            value: 5.0,
            description: "all used up".to_string(),
            min_order_value: None,
            max_discount: None,
            expires_on: None,
            usage_limit: Some(10),
            used_count: 10,
            first_time_customer_only: false,
            allowed_service_types: None,
            min_distance_km: None,
            min_volume_m3: None,
        }]);
        let result = registry.validate(
            "MAXED",
            100.0,
            &PromoContext::default(),
            &PricingConfig::default(),
            today(),
        );
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("usage limit"));
    }

    #[test]
    fn test_service_restriction() {
        let registry = PromoRegistry::default();
        let ctx = PromoContext {
            service_type: Some("van-only".to_string()),
            ..Default::default()
        };
        let result =
            registry.validate("PREMIUM50", 400.0, &ctx, &PricingConfig::default(), today());
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("selected service"));

        let ctx = PromoContext {
            service_type: Some("premium".to_string()),
            ..Default::default()
        };
        let result =
            registry.validate("PREMIUM50", 400.0, &ctx, &PricingConfig::default(), today());
        assert!(result.valid);
        assert_eq!(result.discount, 50.0);
    }

    #[test]
    fn test_min_distance_condition() {
        let registry = PromoRegistry::default();
        let ctx = PromoContext {
            distance_km: Some(60.0),
            ..Default::default()
        };
        let result =
            registry.validate("LONGHAUL25", 300.0, &ctx, &PricingConfig::default(), today());
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("at least 100 km"));
    }

    #[test]
    fn test_min_volume_condition() {
        let registry = PromoRegistry::default();
        let ctx = PromoContext {
            total_volume_m3: Some(12.0),
            ..Default::default()
        };
        let result = registry.validate("BIGMOVE", 300.0, &ctx, &PricingConfig::default(), today());
        assert!(!result.valid);

        let ctx = PromoContext {
            total_volume_m3: Some(22.0),
            ..Default::default()
        };
        let result = registry.validate("BIGMOVE", 300.0, &ctx, &PricingConfig::default(), today());
        assert!(result.valid);
        assert!((result.discount - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_percentage_capped_by_code_and_global_caps() {
        // 20% of 2000 = 400 raw; code cap 100; global absolute cap 150.
        // The smaller of the two applies.
        let registry = PromoRegistry::default();
        let result = registry.validate(
            "FIRST20",
            2000.0,
            &first_time_ctx(),
            &PricingConfig::default(),
            today(),
        );
        assert!(result.valid);
        assert_eq!(result.discount, 100.0);
    }

    #[test]
    fn test_global_caps_apply_to_fixed_codes() {
        let mut config = PricingConfig::default();
        config.max_discount_amount = 20.0;
        let registry = PromoRegistry::default();
        let ctx = PromoContext {
            service_type: Some("premium".to_string()),
            ..Default::default()
        };
        let result = registry.validate("PREMIUM50", 400.0, &ctx, &config, today());
        assert!(result.valid);
        assert_eq!(result.discount, 20.0);
    }

    #[test]
    fn test_global_percentage_cap_on_small_orders() {
        // Fixed 10 off a 15.00 order exceeds the 50% global cap.
        let registry = PromoRegistry::new(vec![PromoCode {
            code: "TEN".to_string(),
            kind: DiscountKind::Fixed,
            value: 10.0,
            description: "ten off".to_string(),
            min_order_value: None,
            max_discount: None,
            expires_on: None,
            usage_limit: None,
            used_count: 0,
            first_time_customer_only: false,
            allowed_service_types: None,
            min_distance_km: None,
            min_volume_m3: None,
        }]);
        let result = registry.validate(
            "TEN",
            15.0,
            &PromoContext::default(),
            &PricingConfig::default(),
            today(),
        );
        assert!(result.valid);
        assert!((result.discount - 7.5).abs() < 1e-9);
    }
}
