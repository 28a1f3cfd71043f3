use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============ Catalog Models ============

/// One tier of moving service offered by the platform.
///
/// Defined once at startup as immutable configuration; never mutated at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceType {
    /// Unique identifier (e.g., "man-and-van", "premium").
    pub id: String,
    /// Display name shown to customers.
    pub name: String,
    /// Short marketing description.
    pub description: String,
    /// Base price charged for any booking of this service.
    pub base_price: f64,
    /// Per-kilometre rate specific to this service.
    pub price_per_km: f64,
    /// Optional per-hour rate (services billed purely by volume omit it).
    pub price_per_hour: Option<f64>,
    /// Services bundled into the price (e.g., "loading", "blankets").
    pub included_services: Vec<String>,
    /// Maximum load volume in cubic metres.
    pub max_volume_m3: f64,
    /// Maximum load weight in kilograms.
    pub max_weight_kg: f64,
    /// Number of crew members included.
    pub crew_size: u32,
    /// Vehicle type label (e.g., "Luton van").
    pub vehicle_type: String,
}

// ============ Booking Models ============

/// One line item in a move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingItem {
    /// Item identifier supplied by the booking form.
    pub id: String,
    /// Item name (matched case-insensitively for special-item surcharges).
    pub name: String,
    /// Number of units; the booking form enforces >= 1.
    pub quantity: u32,
    /// Volume per unit in cubic metres.
    pub volume_m3: f64,
    /// Weight per unit in kilograms, when known.
    #[serde(default)]
    pub weight_kg: Option<f64>,
    /// Requires careful handling.
    #[serde(default)]
    pub fragile: bool,
    /// High-value item.
    #[serde(default)]
    pub valuable: bool,
    /// Free-text notes from the customer.
    #[serde(default)]
    pub description: Option<String>,
}

/// Access characteristics of a pickup or dropoff location relevant to pricing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyAccessDetails {
    /// Floor number, 0 for ground floor.
    #[serde(default)]
    pub floor: u32,
    /// Whether a lift is available.
    #[serde(default)]
    pub has_lift: bool,
    /// Narrow corridors or doorways that slow the crew down.
    #[serde(default)]
    pub narrow_access: bool,
    /// Van cannot park near the entrance.
    #[serde(default)]
    pub long_carry: bool,
    /// External or internal stairs on the carry route.
    #[serde(default)]
    pub stairs: bool,
}

/// Demand tier attached to a time slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DemandLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

/// A bookable time slot with its demand tier and price multiplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Slot identifier (e.g., "morning", "evening").
    pub id: String,
    /// Human-readable label.
    pub label: String,
    /// Qualitative demand tier for this slot.
    pub demand: DemandLevel,
    /// Slot-specific price multiplier (1.0 = no adjustment).
    pub multiplier: f64,
}

/// Geographic coordinates, passed through for the route planner; not used in pricing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A complete pricing request as assembled by the booking wizard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingInput {
    /// Items being moved.
    pub items: Vec<BookingItem>,
    /// Selected service type identifier.
    pub service_type: String,
    /// Driving distance between pickup and dropoff, in kilometres.
    pub distance_km: f64,
    /// Customer's estimated duration of the move, in hours.
    pub estimated_duration_hours: f64,
    /// Selected time slot.
    pub time_slot: TimeSlot,
    /// Target moving date.
    pub moving_date: NaiveDate,
    /// Access details at the pickup address.
    #[serde(default)]
    pub pickup_access: PropertyAccessDetails,
    /// Access details at the dropoff address.
    #[serde(default)]
    pub dropoff_access: PropertyAccessDetails,
    /// Optional promo code entered by the customer.
    #[serde(default)]
    pub promo_code: Option<String>,
    /// Whether this is the customer's first booking, when known.
    #[serde(default)]
    pub is_first_time_customer: Option<bool>,
    /// Pickup coordinates from the address autocomplete, if resolved.
    #[serde(default)]
    pub pickup_coordinates: Option<Coordinates>,
    /// Dropoff coordinates from the address autocomplete, if resolved.
    #[serde(default)]
    pub dropoff_coordinates: Option<Coordinates>,
}

// ============ Promo Models ============

/// How a promo code discounts the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiscountKind {
    /// Percentage of the order value.
    Percentage,
    /// Flat amount off.
    Fixed,
    /// A bundled service is waived; priced as a flat amount.
    FreeService,
}

/// A discount rule resolved by code.
///
/// `used_count` is the only mutable field in the booking platform's model;
/// redemption bookkeeping lives in the order-creation layer, so here the
/// usage-limit check is informational.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoCode {
    /// Unique code, matched case-insensitively.
    pub code: String,
    /// Discount mechanism.
    pub kind: DiscountKind,
    /// Percentage points for `Percentage`, flat amount otherwise.
    pub value: f64,
    /// Customer-facing description.
    pub description: String,
    /// Minimum order value required to redeem.
    #[serde(default)]
    pub min_order_value: Option<f64>,
    /// Cap on the computed discount for this code.
    #[serde(default)]
    pub max_discount: Option<f64>,
    /// Last day the code is valid, inclusive.
    #[serde(default)]
    pub expires_on: Option<NaiveDate>,
    /// Maximum number of redemptions.
    #[serde(default)]
    pub usage_limit: Option<u32>,
    /// Redemptions so far.
    #[serde(default)]
    pub used_count: u32,
    /// Only first-time customers may redeem.
    #[serde(default)]
    pub first_time_customer_only: bool,
    /// Restrict to these service types, when set.
    #[serde(default)]
    pub allowed_service_types: Option<Vec<String>>,
    /// Minimum distance in km required to redeem.
    #[serde(default)]
    pub min_distance_km: Option<f64>,
    /// Minimum total volume in m³ required to redeem.
    #[serde(default)]
    pub min_volume_m3: Option<f64>,
}

/// Booking facts a promo code's eligibility conditions are checked against.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromoContext {
    #[serde(default)]
    pub service_type: Option<String>,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub total_volume_m3: Option<f64>,
    #[serde(default)]
    pub is_first_time_customer: Option<bool>,
}

/// Result of validating a promo code. Validation never fails hard: an invalid
/// code yields `valid: false` with a human-readable reason and zero discount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoValidation {
    pub valid: bool,
    pub discount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PromoValidation {
    pub fn accepted(discount: f64) -> Self {
        Self {
            valid: true,
            discount,
            error: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            discount: 0.0,
            error: Some(reason.into()),
        }
    }
}

// ============ Breakdown Models ============

/// A named surcharge line on the quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurchargeLine {
    pub name: String,
    pub amount: f64,
    pub description: String,
}

/// A named discount line on the quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountLine {
    pub name: String,
    pub amount: f64,
    pub description: String,
}

/// Every intermediate charge and multiplier used to reach the total,
/// exposed so the admin dashboards can explain a quote line by line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBreakdown {
    pub base_fee: f64,
    pub service_charge: f64,
    pub total_volume_m3: f64,
    pub volume_charge: f64,
    pub distance_charge: f64,
    pub time_charge: f64,
    pub service_multiplier: f64,
    pub time_slot_multiplier: f64,
    pub seasonal_multiplier: f64,
    pub demand_multiplier: f64,
    /// Charges after the multiplier stack, before surcharges.
    pub multiplied_subtotal: f64,
    pub surcharge_total: f64,
    pub discount_total: f64,
    pub subtotal_before_vat: f64,
}

/// A savings hint surfaced alongside the quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PotentialSaving {
    pub description: String,
    pub amount: f64,
}

/// Cost of moving to a higher service tier for the same booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeOption {
    pub service_type: String,
    pub additional_cost: f64,
    pub description: String,
}

/// Alternative-service suggestions attached to a quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRecommendations {
    /// A strictly better-scoring alternative service, if one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_service: Option<String>,
    /// Savings hints (e.g., off-peak slots).
    #[serde(default)]
    pub potential_savings: Vec<PotentialSaving>,
    /// Upgrade path to the premium tier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrade_option: Option<UpgradeOption>,
}

/// The full itemized result of a pricing calculation.
///
/// Computed fresh per request and cached for a short TTL; a cache hit within
/// the window returns this value unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingBreakdown {
    /// Flat base fee from the pricing configuration.
    pub base_price: f64,
    /// Volume-derived items charge.
    pub items_price: f64,
    /// Distance charge including the long-distance portion.
    pub distance_price: f64,
    /// Duration charge after the minimum-duration floor.
    pub time_price: f64,
    /// The selected service's base price.
    pub service_price: f64,
    /// Additive surcharges applied after the multiplier stack.
    pub surcharges: Vec<SurchargeLine>,
    /// Discounts applied (at most one promo code per booking).
    pub discounts: Vec<DiscountLine>,
    /// Pre-VAT, post-discount subtotal.
    pub subtotal: f64,
    pub vat_amount: f64,
    pub total: f64,
    /// Every intermediate figure used to compute the total.
    pub raw: RawBreakdown,
    /// Alternative-service suggestions for the booking UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<QuoteRecommendations>,
}

// ============ Recommendation Models ============

/// Customer preference for how the move should be carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimePreference {
    Fast,
    Economical,
    Premium,
}

/// Optional constraints the recommendation scoring takes into account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationRequirements {
    /// Customer's budget for the whole move.
    #[serde(default)]
    pub budget: Option<f64>,
    /// Speed/cost/comfort preference.
    #[serde(default)]
    pub time_preference: Option<TimePreference>,
    /// Whether the customer wants help loading; `Some(false)` means
    /// they explicitly do not.
    #[serde(default)]
    pub help_needed: Option<bool>,
}

/// One scored service suggestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRecommendation {
    pub service_type: String,
    /// Additive rule score, clamped at zero.
    pub score: u32,
    /// Why the service scored the way it did.
    pub reasons: Vec<String>,
    /// Simplified estimate: base price + volume charge + billable distance.
    /// Intentionally omits time charge, multipliers, and surcharges.
    pub estimated_price: f64,
}

// ============ Request Models ============

/// Body of `POST /api/v1/pricing/promo/validate`, used by the promo-code
/// widget for live feedback before submission.
#[derive(Debug, Clone, Deserialize)]
pub struct PromoValidationRequest {
    pub code: String,
    /// Current order value the discount would apply to.
    pub order_value: f64,
    #[serde(flatten)]
    pub context: PromoContext,
}

/// Body of `POST /api/v1/pricing/recommendations`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationRequest {
    pub items: Vec<BookingItem>,
    pub distance_km: f64,
    #[serde(default)]
    pub requirements: Option<RecommendationRequirements>,
}
