use std::sync::Arc;

use crate::catalog::ServiceCatalog;
use crate::models::{
    BookingItem, RecommendationRequirements, ServiceRecommendation, TimePreference,
};
use crate::pricing_config::PricingConfig;

/// Scores every catalog service against an item/distance profile and optional
/// customer requirements, using additive integer point rules.
///
/// The estimated price alongside each score is intentionally simplified
/// (base price + volume charge + billable distance) so the list can be
/// computed without a full quote per service.
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    catalog: Arc<ServiceCatalog>,
    config: Arc<PricingConfig>,
}

impl RecommendationEngine {
    pub fn new(catalog: Arc<ServiceCatalog>, config: Arc<PricingConfig>) -> Self {
        Self { catalog, config }
    }

    /// Returns all services sorted by descending score. Ties keep catalog
    /// order (stable sort).
    pub fn recommendations(
        &self,
        items: &[BookingItem],
        distance_km: f64,
        requirements: Option<&RecommendationRequirements>,
    ) -> Vec<ServiceRecommendation> {
        let default_requirements = RecommendationRequirements::default();
        let requirements = requirements.unwrap_or(&default_requirements);

        let total_volume: f64 = items.iter().map(|i| i.quantity as f64 * i.volume_m3).sum();
        let total_weight: f64 = items
            .iter()
            .map(|i| i.quantity as f64 * i.weight_kg.unwrap_or(0.0))
            .sum();
        let any_fragile = items.iter().any(|i| i.fragile);
        let any_valuable = items.iter().any(|i| i.valuable);

        let mut results: Vec<ServiceRecommendation> = self
            .catalog
            .iter()
            .map(|service| {
                let mut score: i32 = 0;
                let mut reasons = Vec::new();

                if total_volume <= service.max_volume_m3 {
                    score += 20;
                    reasons.push("Fits within volume capacity".to_string());
                } else {
                    score -= 30;
                    reasons.push("Exceeds volume capacity".to_string());
                }

                if total_weight <= service.max_weight_kg {
                    score += 15;
                    reasons.push("Fits within weight capacity".to_string());
                } else {
                    score -= 20;
                    reasons.push("Exceeds weight capacity".to_string());
                }

                if distance_km > 50.0 && service.id == "premium" {
                    score += 10;
                    reasons.push("Premium service recommended for long distances".to_string());
                }

                if any_fragile && (service.id == "premium" || service.crew_size >= 2) {
                    score += 15;
                    reasons.push("Suitable crew for fragile items".to_string());
                }

                if any_valuable && service.id == "premium" {
                    score += 10;
                    reasons.push("Insurance cover for valuable items".to_string());
                }

                let estimated_price = self.estimate_price(service.id.as_str(), total_volume, distance_km);

                if let Some(budget) = requirements.budget {
                    if estimated_price <= budget {
                        score += 10;
                        reasons.push("Within budget".to_string());
                    } else {
                        score -= 15;
                        reasons.push("Over budget".to_string());
                    }
                }

                match requirements.time_preference {
                    Some(TimePreference::Fast) if service.crew_size >= 2 => {
                        score += 10;
                        reasons.push("Larger crew moves you faster".to_string());
                    }
                    Some(TimePreference::Economical) if service.id == "van-only" => {
                        score += 15;
                        reasons.push("Most economical option".to_string());
                    }
                    Some(TimePreference::Premium) if service.id == "premium" => {
                        score += 20;
                        reasons.push("Matches premium preference".to_string());
                    }
                    _ => {}
                }

                match requirements.help_needed {
                    Some(false) => {
                        if service.id == "van-only" {
                            score += 10;
                            reasons.push("No loading help needed".to_string());
                        }
                    }
                    _ => {
                        if service.crew_size > 0 {
                            score += 10;
                            reasons.push("Crew helps with loading".to_string());
                        }
                    }
                }

                ServiceRecommendation {
                    service_type: service.id.clone(),
                    score: score.max(0) as u32,
                    reasons,
                    estimated_price,
                }
            })
            .collect();

        results.sort_by(|a, b| b.score.cmp(&a.score));
        results
    }

    /// Simplified per-service price estimate used by the scoring rules and
    /// the upgrade-option hint.
    pub fn estimate_price(&self, service_id: &str, total_volume_m3: f64, distance_km: f64) -> f64 {
        let base = self
            .catalog
            .get(service_id)
            .map(|s| s.base_price)
            .unwrap_or(0.0);
        let billable_km = (distance_km - self.config.free_distance_km).max(0.0);
        base + total_volume_m3 * self.config.price_per_cubic_meter
            + billable_km * self.config.price_per_km
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> RecommendationEngine {
        RecommendationEngine::new(
            Arc::new(ServiceCatalog::default()),
            Arc::new(PricingConfig::default()),
        )
    }

    fn item(volume: f64, quantity: u32) -> BookingItem {
        BookingItem {
            id: "sofa".to_string(),
            name: "Sofa".to_string(),
            quantity,
            volume_m3: volume,
            weight_kg: None,
            fragile: false,
            valuable: false,
            description: None,
        }
    }

    #[test]
    fn test_results_sorted_descending() {
        let recs = engine().recommendations(&[item(2.0, 1)], 10.0, None);
        assert_eq!(recs.len(), 4);
        for pair in recs.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_oversized_move_penalizes_small_services() {
        // 40 m³ only fits the premium tier.
        let recs = engine().recommendations(&[item(40.0, 1)], 10.0, None);
        let premium = recs.iter().find(|r| r.service_type == "premium").unwrap();
        let van = recs.iter().find(|r| r.service_type == "van-only").unwrap();
        assert!(premium.score > van.score);
        assert!(van
            .reasons
            .iter()
            .any(|r| r.contains("Exceeds volume capacity")));
    }

    #[test]
    fn test_score_clamped_at_zero_keeps_reasons() {
        let heavy = BookingItem {
            id: "safe".to_string(),
            name: "Safe".to_string(),
            quantity: 1,
            volume_m3: 60.0,
            weight_kg: Some(3000.0),
            fragile: false,
            valuable: false,
            description: None,
        };
        let requirements = RecommendationRequirements {
            budget: Some(1.0),
            time_preference: None,
            help_needed: Some(false),
        };
        let recs = engine().recommendations(&[heavy], 10.0, Some(&requirements));
        let van = recs.iter().find(|r| r.service_type == "man-and-van").unwrap();
        assert_eq!(van.score, 0);
        assert!(!van.reasons.is_empty());
    }

    #[test]
    fn test_economical_preference_boosts_van_only() {
        let requirements = RecommendationRequirements {
            budget: None,
            time_preference: Some(TimePreference::Economical),
            help_needed: Some(false),
        };
        let recs = engine().recommendations(&[item(2.0, 1)], 10.0, Some(&requirements));
        assert_eq!(recs[0].service_type, "van-only");
    }

    #[test]
    fn test_fragile_items_favor_bigger_crews() {
        let fragile = BookingItem {
            fragile: true,
            ..item(2.0, 1)
        };
        let recs = engine().recommendations(&[fragile], 10.0, None);
        let two_man = recs
            .iter()
            .find(|r| r.service_type == "two-man-team")
            .unwrap();
        assert!(two_man
            .reasons
            .iter()
            .any(|r| r.contains("fragile")));
    }

    #[test]
    fn test_estimated_price_formula() {
        // man-and-van: 45 base + 2 m³ * 8.0 + (10 - 5) km * 1.5 = 68.5
        let price = engine().estimate_price("man-and-van", 2.0, 10.0);
        assert!((price - 68.5).abs() < 1e-9);
    }

    #[test]
    fn test_estimated_price_ignores_free_distance() {
        let near = engine().estimate_price("van-only", 1.0, 3.0);
        let at_threshold = engine().estimate_price("van-only", 1.0, 5.0);
        assert_eq!(near, at_threshold);
    }
}
