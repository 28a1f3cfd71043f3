use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use moka::sync::Cache;
use sha2::{Digest, Sha256};

use crate::catalog::ServiceCatalog;
use crate::errors::AppError;
use crate::models::*;
use crate::pricing_config::PricingConfig;
use crate::promo::PromoRegistry;
use crate::recommendations::RecommendationEngine;

/// Source of the current time for the engine.
///
/// The engine only consults the clock for quote-cache expiry and promo expiry
/// checks; all date-dependent multipliers come from the booking's moving
/// date. Injected so tests can drive TTL behaviour deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Used by the TTL tests; also handy
/// for embedders replaying historical quotes.
pub struct ManualClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: std::sync::Mutex::new(start),
        })
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

/// A finished quote plus the moment it stops being served from cache.
///
/// The expiry stamp is checked against the injected clock; the moka TTL on
/// the cache itself is a real-time eviction backstop.
#[derive(Clone)]
struct CachedQuote {
    breakdown: PricingBreakdown,
    expires_at: DateTime<Utc>,
}

/// The rules-based cost calculator at the core of the booking platform.
///
/// Combines the service catalog, rate configuration, and promo registry with
/// a booking's items, distance, and schedule to produce a deterministic
/// [`PricingBreakdown`]. Results are cached by a key derived from the
/// normalized request for a short TTL, so repeated calls within the window
/// return the identical quote.
pub struct PricingEngine {
    catalog: Arc<ServiceCatalog>,
    config: Arc<PricingConfig>,
    promos: PromoRegistry,
    recommender: RecommendationEngine,
    cache: Cache<String, CachedQuote>,
    quote_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl PricingEngine {
    pub fn new(
        catalog: ServiceCatalog,
        config: PricingConfig,
        promos: PromoRegistry,
        quote_ttl: StdDuration,
        cache_capacity: u64,
    ) -> Self {
        Self::with_clock(
            catalog,
            config,
            promos,
            quote_ttl,
            cache_capacity,
            Arc::new(SystemClock),
        )
    }

    pub fn with_clock(
        catalog: ServiceCatalog,
        config: PricingConfig,
        promos: PromoRegistry,
        quote_ttl: StdDuration,
        cache_capacity: u64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let catalog = Arc::new(catalog);
        let config = Arc::new(config);
        let cache = Cache::builder()
            .time_to_live(quote_ttl)
            .max_capacity(cache_capacity)
            .build();
        let recommender = RecommendationEngine::new(catalog.clone(), config.clone());
        let quote_ttl = Duration::from_std(quote_ttl).unwrap_or_else(|_| Duration::seconds(300));
        Self {
            catalog,
            config,
            promos,
            recommender,
            cache,
            quote_ttl,
            clock,
        }
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    pub fn pricing_config(&self) -> &PricingConfig {
        &self.config
    }

    /// Produces a full price breakdown for a booking.
    ///
    /// The only hard failure is an unknown service type; everything else
    /// degrades to a numeric result so the booking UI always has a quote to
    /// render. Empty item lists and zero distance or duration are accepted
    /// and produce a baseline price.
    pub fn calculate_pricing(&self, input: &PricingInput) -> Result<PricingBreakdown, AppError> {
        let service = self
            .catalog
            .get(&input.service_type)
            .ok_or_else(|| AppError::InvalidServiceType(input.service_type.clone()))?
            .clone();

        let key = self.cache_key(input);
        let now = self.clock.now();

        if let Some(cached) = self.cache.get(&key) {
            if now < cached.expires_at {
                tracing::debug!("Quote cache HIT for key {}", &key[..12]);
                return Ok(cached.breakdown);
            }
        }
        tracing::debug!("Quote cache MISS for key {}", &key[..12]);

        let breakdown = self.compute(input, &service, now);

        self.cache.insert(
            key,
            CachedQuote {
                breakdown: breakdown.clone(),
                expires_at: now + self.quote_ttl,
            },
        );

        Ok(breakdown)
    }

    /// Validates a promo code for live feedback from the promo-code widget.
    pub fn validate_promo(
        &self,
        code: &str,
        order_value: f64,
        ctx: &PromoContext,
    ) -> PromoValidation {
        self.promos.validate(
            code,
            order_value,
            ctx,
            &self.config,
            self.clock.now().date_naive(),
        )
    }

    /// Scores all catalog services for an item/distance profile.
    pub fn recommendations(
        &self,
        items: &[BookingItem],
        distance_km: f64,
        requirements: Option<&RecommendationRequirements>,
    ) -> Vec<ServiceRecommendation> {
        self.recommender
            .recommendations(items, distance_km, requirements)
    }

    /// Derives the cache key from the normalized request: sorted item
    /// id+quantity pairs, service type, distance, duration, slot id, moving
    /// date (already day-granular), and uppercased promo code.
    fn cache_key(&self, input: &PricingInput) -> String {
        let mut item_parts: Vec<String> = input
            .items
            .iter()
            .map(|i| format!("{}x{}", i.id, i.quantity))
            .collect();
        item_parts.sort();

        let raw = format!(
            "{}|{}|{:.3}|{:.2}|{}|{}|{}",
            item_parts.join(","),
            input.service_type,
            input.distance_km,
            input.estimated_duration_hours,
            input.time_slot.id,
            input.moving_date,
            input
                .promo_code
                .as_deref()
                .map(|c| c.trim().to_uppercase())
                .unwrap_or_default(),
        );

        let mut hasher = Sha256::new();
        hasher.update(raw.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn compute(
        &self,
        input: &PricingInput,
        service: &ServiceType,
        now: DateTime<Utc>,
    ) -> PricingBreakdown {
        let config = &self.config;

        // Volume charge, with a discount once the move is large enough.
        let total_volume: f64 = input
            .items
            .iter()
            .map(|i| i.quantity as f64 * i.volume_m3)
            .sum();
        let mut volume_charge = total_volume * config.price_per_cubic_meter;
        if total_volume > config.volume_discount_threshold_m3 {
            volume_charge *= 1.0 - config.volume_discount_rate;
        }

        // Distance charge: free allowance, then per-km, then an additive
        // long-distance rate on the portion beyond the threshold.
        let mut distance_charge = 0.0;
        if input.distance_km > config.free_distance_km {
            distance_charge = (input.distance_km - config.free_distance_km) * config.price_per_km;
            if input.distance_km > config.long_distance_threshold_km {
                distance_charge += (input.distance_km - config.long_distance_threshold_km)
                    * config.long_distance_surcharge_per_km;
            }
        }

        // Time charge with the minimum-duration floor.
        let billable_hours = input
            .estimated_duration_hours
            .max(config.minimum_duration_hours);
        let time_charge = billable_hours * config.price_per_hour;

        let service_multiplier = config
            .service_multipliers
            .get(&service.id)
            .copied()
            .unwrap_or(1.0);
        let time_slot_multiplier = input.time_slot.multiplier;
        let seasonal_multiplier = self.seasonal_multiplier(input.moving_date);
        let demand_multiplier = self.demand_multiplier(input.moving_date, input.time_slot.demand);

        let multiplied_subtotal = (config.base_fee
            + service.base_price
            + volume_charge
            + distance_charge
            + time_charge)
            * service_multiplier
            * time_slot_multiplier
            * seasonal_multiplier
            * demand_multiplier;

        // Surcharges are additive on top of the multiplied subtotal.
        let mut surcharges = Vec::new();
        for item in &input.items {
            self.special_item_surcharges(item, &mut surcharges);
        }
        self.access_surcharges("pickup", &input.pickup_access, &mut surcharges);
        self.access_surcharges("dropoff", &input.dropoff_access, &mut surcharges);
        let surcharge_total: f64 = surcharges.iter().map(|s| s.amount).sum();

        let pre_discount_subtotal = multiplied_subtotal + surcharge_total;

        // Promo discount. An invalid or absent code simply yields no discount.
        let mut discounts = Vec::new();
        if let Some(code) = input.promo_code.as_deref().filter(|c| !c.trim().is_empty()) {
            let ctx = PromoContext {
                service_type: Some(input.service_type.clone()),
                distance_km: Some(input.distance_km),
                total_volume_m3: Some(total_volume),
                is_first_time_customer: input.is_first_time_customer,
            };
            let validation = self.promos.validate(
                code,
                pre_discount_subtotal,
                &ctx,
                config,
                now.date_naive(),
            );
            if validation.valid {
                let description = self
                    .promos
                    .get(code)
                    .map(|p| p.description.clone())
                    .unwrap_or_default();
                discounts.push(DiscountLine {
                    name: code.trim().to_uppercase(),
                    amount: validation.discount,
                    description,
                });
            } else if let Some(reason) = validation.error {
                tracing::debug!("Promo code rejected during quote: {}", reason);
            }
        }
        let discount_total: f64 = discounts.iter().map(|d| d.amount).sum();

        let subtotal_before_vat = (pre_discount_subtotal - discount_total).max(0.0);
        let vat_amount = subtotal_before_vat * config.vat_rate;
        let total = subtotal_before_vat + vat_amount;

        let recommendations =
            self.quote_recommendations(input, service, total_volume, pre_discount_subtotal);

        PricingBreakdown {
            base_price: config.base_fee,
            items_price: volume_charge,
            distance_price: distance_charge,
            time_price: time_charge,
            service_price: service.base_price,
            surcharges,
            discounts,
            subtotal: subtotal_before_vat,
            vat_amount,
            total,
            raw: RawBreakdown {
                base_fee: config.base_fee,
                service_charge: service.base_price,
                total_volume_m3: total_volume,
                volume_charge,
                distance_charge,
                time_charge,
                service_multiplier,
                time_slot_multiplier,
                seasonal_multiplier,
                demand_multiplier,
                multiplied_subtotal,
                surcharge_total,
                discount_total,
                subtotal_before_vat,
            },
            recommendations: Some(recommendations),
        }
    }

    /// Peak in the summer months and December, high in the shoulder seasons,
    /// normal in January and February.
    fn seasonal_multiplier(&self, date: NaiveDate) -> f64 {
        let seasons = &self.config.seasonal_multipliers;
        match date.month() {
            6..=8 | 12 => seasons.peak,
            3..=5 | 9..=11 => seasons.high,
            _ => seasons.normal,
        }
    }

    /// The greater of the weekend-based multiplier and the slot's own tier
    /// multiplier. A low-demand slot always gets the low multiplier, even on
    /// a weekend.
    fn demand_multiplier(&self, date: NaiveDate, demand: DemandLevel) -> f64 {
        let demand_config = &self.config.demand_multipliers;
        if demand == DemandLevel::Low {
            return demand_config.low;
        }
        let weekend_multiplier = match date.weekday() {
            Weekday::Sat | Weekday::Sun => demand_config.high,
            _ => demand_config.medium,
        };
        weekend_multiplier.max(demand_config.for_level(demand))
    }

    /// Each condition is evaluated independently; one item can trigger
    /// several surcharges at once.
    fn special_item_surcharges(&self, item: &BookingItem, out: &mut Vec<SurchargeLine>) {
        let rates = &self.config.special_item_surcharges;
        let quantity = item.quantity as f64;
        let name_lower = item.name.to_lowercase();

        if name_lower.contains("piano") {
            out.push(SurchargeLine {
                name: "Piano handling".to_string(),
                amount: rates.piano * quantity,
                description: format!("Specialist handling for {}", item.name),
            });
        }
        if name_lower.contains("antique") {
            out.push(SurchargeLine {
                name: "Antique handling".to_string(),
                amount: rates.antique * quantity,
                description: format!("Careful handling for {}", item.name),
            });
        }
        if name_lower.contains("artwork") {
            out.push(SurchargeLine {
                name: "Artwork handling".to_string(),
                amount: rates.artwork * quantity,
                description: format!("Careful handling for {}", item.name),
            });
        }
        if item.fragile {
            out.push(SurchargeLine {
                name: "Fragile items".to_string(),
                amount: rates.fragile * quantity,
                description: format!("Extra packing for {}", item.name),
            });
        }
        if item.valuable {
            out.push(SurchargeLine {
                name: "Valuable items".to_string(),
                amount: rates.valuable * quantity,
                description: format!("Additional cover for {}", item.name),
            });
        }
        if item.weight_kg.unwrap_or(0.0) > 50.0 {
            out.push(SurchargeLine {
                name: "Heavy items".to_string(),
                amount: rates.heavy * quantity,
                description: format!("Heavy lifting for {}", item.name),
            });
        }
    }

    /// Pickup and dropoff are evaluated independently and can both contribute.
    fn access_surcharges(
        &self,
        location: &str,
        access: &PropertyAccessDetails,
        out: &mut Vec<SurchargeLine>,
    ) {
        let rates = &self.config.access_surcharges;

        if access.floor > 0 && !access.has_lift {
            out.push(SurchargeLine {
                name: format!("No lift ({})", location),
                amount: rates.no_lift_per_floor * access.floor as f64,
                description: format!("Carry up {} floor(s) without a lift", access.floor),
            });
        }
        if access.narrow_access {
            out.push(SurchargeLine {
                name: format!("Narrow access ({})", location),
                amount: rates.narrow_access,
                description: "Restricted corridors or doorways".to_string(),
            });
        }
        if access.long_carry {
            out.push(SurchargeLine {
                name: format!("Long carry ({})", location),
                amount: rates.long_carry,
                description: "Van cannot park near the entrance".to_string(),
            });
        }
        if access.stairs {
            out.push(SurchargeLine {
                name: format!("Stairs ({})", location),
                amount: rates.stairs,
                description: "Stairs on the carry route".to_string(),
            });
        }
    }

    fn quote_recommendations(
        &self,
        input: &PricingInput,
        service: &ServiceType,
        total_volume: f64,
        pre_discount_subtotal: f64,
    ) -> QuoteRecommendations {
        let scored = self
            .recommender
            .recommendations(&input.items, input.distance_km, None);

        let current_score = scored
            .iter()
            .find(|r| r.service_type == service.id)
            .map(|r| r.score)
            .unwrap_or(0);

        let suggested_service = scored
            .first()
            .filter(|top| top.service_type != service.id && top.score > current_score)
            .map(|top| top.service_type.clone());

        let mut potential_savings = Vec::new();
        if input.time_slot.demand == DemandLevel::Low {
            potential_savings.push(PotentialSaving {
                description: "Flexible off-peak slot keeps this price around 10% lower".to_string(),
                amount: pre_discount_subtotal * 0.10,
            });
        }

        let upgrade_option = if service.id != "premium" {
            self.catalog.get("premium").map(|premium| {
                let current_estimate =
                    self.recommender
                        .estimate_price(&service.id, total_volume, input.distance_km);
                let premium_estimate =
                    self.recommender
                        .estimate_price(&premium.id, total_volume, input.distance_km);
                UpgradeOption {
                    service_type: premium.id.clone(),
                    additional_cost: (premium_estimate - current_estimate).max(0.0),
                    description: "Upgrade to a full-service move with packing and insurance"
                        .to_string(),
                }
            })
        } else {
            None
        };

        QuoteRecommendations {
            suggested_service,
            potential_savings,
            upgrade_option,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> PricingEngine {
        PricingEngine::new(
            ServiceCatalog::default(),
            PricingConfig::default(),
            PromoRegistry::default(),
            StdDuration::from_secs(300),
            1000,
        )
    }

    fn slot(demand: DemandLevel, multiplier: f64) -> TimeSlot {
        TimeSlot {
            id: "morning".to_string(),
            label: "Morning".to_string(),
            demand,
            multiplier,
        }
    }

    fn base_input() -> PricingInput {
        PricingInput {
            items: vec![BookingItem {
                id: "sofa".to_string(),
                name: "Sofa".to_string(),
                quantity: 1,
                volume_m3: 2.0,
                weight_kg: None,
                fragile: false,
                valuable: false,
                description: None,
            }],
            service_type: "man-and-van".to_string(),
            distance_km: 10.0,
            estimated_duration_hours: 2.0,
            time_slot: slot(DemandLevel::Medium, 1.0),
            moving_date: NaiveDate::from_ymd_opt(2026, 2, 10).unwrap(), // a Tuesday
            pickup_access: PropertyAccessDetails::default(),
            dropoff_access: PropertyAccessDetails::default(),
            promo_code: None,
            is_first_time_customer: None,
            pickup_coordinates: None,
            dropoff_coordinates: None,
        }
    }

    #[test]
    fn test_cache_key_ignores_item_order() {
        let engine = engine();
        let mut input = base_input();
        input.items.push(BookingItem {
            id: "table".to_string(),
            name: "Table".to_string(),
            quantity: 1,
            volume_m3: 1.0,
            weight_kg: None,
            fragile: false,
            valuable: false,
            description: None,
        });
        let key_a = engine.cache_key(&input);
        input.items.reverse();
        let key_b = engine.cache_key(&input);
        assert_eq!(key_a, key_b);
    }

    #[test]
    fn test_cache_key_changes_with_promo_code() {
        let engine = engine();
        let mut input = base_input();
        let without = engine.cache_key(&input);
        input.promo_code = Some("MOVE10".to_string());
        let with = engine.cache_key(&input);
        assert_ne!(without, with);

        // Case of the code does not matter.
        input.promo_code = Some("move10".to_string());
        assert_eq!(with, engine.cache_key(&input));
    }

    #[test]
    fn test_seasonal_multiplier_by_month() {
        let engine = engine();
        let config = PricingConfig::default();
        let date = |m, d| NaiveDate::from_ymd_opt(2026, m, d).unwrap();

        assert_eq!(
            engine.seasonal_multiplier(date(7, 15)),
            config.seasonal_multipliers.peak
        );
        assert_eq!(
            engine.seasonal_multiplier(date(12, 20)),
            config.seasonal_multipliers.peak
        );
        assert_eq!(
            engine.seasonal_multiplier(date(4, 1)),
            config.seasonal_multipliers.high
        );
        assert_eq!(
            engine.seasonal_multiplier(date(10, 1)),
            config.seasonal_multipliers.high
        );
        assert_eq!(
            engine.seasonal_multiplier(date(1, 15)),
            config.seasonal_multipliers.normal
        );
        assert_eq!(
            engine.seasonal_multiplier(date(2, 28)),
            config.seasonal_multipliers.normal
        );
    }

    #[test]
    fn test_demand_multiplier_weekend_vs_tier() {
        let engine = engine();
        let config = PricingConfig::default();
        let saturday = NaiveDate::from_ymd_opt(2026, 2, 14).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();

        // Weekend medium slot is lifted to the weekend (high) multiplier.
        assert_eq!(
            engine.demand_multiplier(saturday, DemandLevel::Medium),
            config.demand_multipliers.high
        );
        // VeryHigh tier wins over the weekend multiplier.
        assert_eq!(
            engine.demand_multiplier(saturday, DemandLevel::VeryHigh),
            config.demand_multipliers.very_high
        );
        // A low-demand slot overrides everything, weekend included.
        assert_eq!(
            engine.demand_multiplier(saturday, DemandLevel::Low),
            config.demand_multipliers.low
        );
        assert_eq!(
            engine.demand_multiplier(tuesday, DemandLevel::Medium),
            config.demand_multipliers.medium
        );
    }

    #[test]
    fn test_one_item_can_trigger_multiple_surcharges() {
        let engine = engine();
        let mut input = base_input();
        input.items = vec![BookingItem {
            id: "piano".to_string(),
            name: "Grand Piano".to_string(),
            quantity: 1,
            volume_m3: 3.0,
            weight_kg: Some(200.0),
            fragile: true,
            valuable: true,
            description: None,
        }];
        let breakdown = engine.calculate_pricing(&input).unwrap();
        let names: Vec<&str> = breakdown.surcharges.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"Piano handling"));
        assert!(names.contains(&"Fragile items"));
        assert!(names.contains(&"Valuable items"));
        assert!(names.contains(&"Heavy items"));
    }

    #[test]
    fn test_surcharge_scales_with_quantity() {
        let engine = engine();
        let mut input = base_input();
        input.items[0].fragile = true;
        input.items[0].quantity = 3;
        let breakdown = engine.calculate_pricing(&input).unwrap();
        let fragile = breakdown
            .surcharges
            .iter()
            .find(|s| s.name == "Fragile items")
            .unwrap();
        assert!((fragile.amount - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_pickup_and_dropoff_both_contribute() {
        let engine = engine();
        let mut input = base_input();
        input.pickup_access = PropertyAccessDetails {
            floor: 3,
            has_lift: false,
            narrow_access: false,
            long_carry: false,
            stairs: false,
        };
        input.dropoff_access = PropertyAccessDetails {
            floor: 0,
            has_lift: false,
            narrow_access: true,
            long_carry: true,
            stairs: false,
        };
        let breakdown = engine.calculate_pricing(&input).unwrap();
        // 3 floors * 10.0 + narrow 15.0 + long carry 20.0
        assert!((breakdown.raw.surcharge_total - 65.0).abs() < 1e-9);
    }

    #[test]
    fn test_lift_suppresses_floor_surcharge() {
        let engine = engine();
        let mut input = base_input();
        input.pickup_access = PropertyAccessDetails {
            floor: 5,
            has_lift: true,
            narrow_access: false,
            long_carry: false,
            stairs: false,
        };
        let breakdown = engine.calculate_pricing(&input).unwrap();
        assert!(breakdown.surcharges.is_empty());
    }

    #[test]
    fn test_minimum_duration_floor() {
        let engine = engine();
        let mut input = base_input();
        input.estimated_duration_hours = 0.5;
        let breakdown = engine.calculate_pricing(&input).unwrap();
        // Floored at the 2-hour minimum: 2 * 35.0
        assert!((breakdown.time_price - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_items_still_produce_a_quote() {
        let engine = engine();
        let mut input = base_input();
        input.items.clear();
        let breakdown = engine.calculate_pricing(&input).unwrap();
        assert_eq!(breakdown.items_price, 0.0);
        assert!(breakdown.total > 0.0);
    }

    #[test]
    fn test_upgrade_option_absent_for_premium() {
        let engine = engine();
        let mut input = base_input();
        input.service_type = "premium".to_string();
        let breakdown = engine.calculate_pricing(&input).unwrap();
        let recs = breakdown.recommendations.unwrap();
        assert!(recs.upgrade_option.is_none());

        let breakdown = engine.calculate_pricing(&base_input()).unwrap();
        let recs = breakdown.recommendations.unwrap();
        let upgrade = recs.upgrade_option.unwrap();
        assert_eq!(upgrade.service_type, "premium");
        assert!(upgrade.additional_cost > 0.0);
    }

    #[test]
    fn test_low_demand_slot_adds_savings_hint() {
        let engine = engine();
        let mut input = base_input();
        input.time_slot = slot(DemandLevel::Low, 1.0);
        let breakdown = engine.calculate_pricing(&input).unwrap();
        let recs = breakdown.recommendations.unwrap();
        assert_eq!(recs.potential_savings.len(), 1);
        let expected = (breakdown.raw.multiplied_subtotal + breakdown.raw.surcharge_total) * 0.10;
        assert!((recs.potential_savings[0].amount - expected).abs() < 1e-9);
    }
}
