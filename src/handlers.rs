use crate::config::Config;
use crate::errors::AppError;
use crate::models::*;
use crate::pricing::PricingEngine;
use axum::{extract::State, http::StatusCode, Json};
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// The pricing engine (catalog, rate card, promo registry, quote cache).
    pub engine: Arc<PricingEngine>,
    /// Application configuration.
    pub config: Config,
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rust-pricing-api",
            "version": "0.1.0"
        })),
    )
}

/// POST /api/v1/pricing/quote
///
/// Produces a full price breakdown for a booking assembled by the booking
/// wizard. The only hard failure is an unknown service type (422); anything
/// else, including an invalid promo code, still yields a displayable quote.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `input` - JSON body with the complete pricing request.
///
/// # Returns
///
/// * `Result<Json<PricingBreakdown>, AppError>` - The itemized quote or an error.
pub async fn quote(
    State(state): State<Arc<AppState>>,
    Json(input): Json<PricingInput>,
) -> Result<Json<PricingBreakdown>, AppError> {
    tracing::info!(
        "POST /pricing/quote - service: {}, items: {}, distance: {:.1} km",
        input.service_type,
        input.items.len(),
        input.distance_km
    );

    let breakdown = state.engine.calculate_pricing(&input)?;

    tracing::info!(
        "Quote computed: total {:.2} ({} surcharges, {} discounts)",
        breakdown.total,
        breakdown.surcharges.len(),
        breakdown.discounts.len()
    );

    Ok(Json(breakdown))
}

/// POST /api/v1/pricing/promo/validate
///
/// Live promo-code validation for the booking form's promo widget. Always
/// returns 200: a bad code is reported in the body, never as an HTTP error,
/// so the widget can show the reason inline.
pub async fn validate_promo(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PromoValidationRequest>,
) -> Json<PromoValidation> {
    tracing::info!("POST /pricing/promo/validate - code: {}", request.code);

    let result = state
        .engine
        .validate_promo(&request.code, request.order_value, &request.context);

    Json(result)
}

/// POST /api/v1/pricing/recommendations
///
/// Scores all catalog services against an item/distance profile and optional
/// customer requirements, best match first.
pub async fn recommendations(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecommendationRequest>,
) -> Json<Vec<ServiceRecommendation>> {
    tracing::info!(
        "POST /pricing/recommendations - items: {}, distance: {:.1} km",
        request.items.len(),
        request.distance_km
    );

    let results = state.engine.recommendations(
        &request.items,
        request.distance_km,
        request.requirements.as_ref(),
    );

    Json(results)
}

/// GET /api/v1/pricing/services
///
/// Read-only catalog listing for the admin dashboards and booking form.
pub async fn list_services(State(state): State<Arc<AppState>>) -> Json<Vec<ServiceType>> {
    Json(state.engine.catalog().services().to_vec())
}

/// GET /api/v1/pricing/config
///
/// Read-only rate card for the admin dashboards.
pub async fn get_pricing_config(
    State(state): State<Arc<AppState>>,
) -> Json<crate::pricing_config::PricingConfig> {
    Json(state.engine.pricing_config().clone())
}
