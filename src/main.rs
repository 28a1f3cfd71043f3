mod catalog;
mod config;
mod errors;
mod handlers;
mod models;
mod pricing;
mod pricing_config;
mod promo;
mod recommendations;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::catalog::ServiceCatalog;
use crate::config::Config;
use crate::pricing::PricingEngine;
use crate::pricing_config::PricingConfig;
use crate::promo::PromoRegistry;

/// Main entry point for the application.
///
/// Initializes logging, loads configuration, builds the pricing engine
/// (catalog, rate card, promo registry, quote cache), and starts the Axum
/// server with CORS, request-size, and rate-limiting layers.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_pricing_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Static registries, immutable after this point
    let catalog = ServiceCatalog::default();
    let mut pricing_config = PricingConfig::default();
    if let Some(rate) = config.vat_rate {
        pricing_config.vat_rate = rate;
    }
    let promos = PromoRegistry::default();
    tracing::info!(
        "Pricing registries loaded: {} service types",
        catalog.services().len()
    );

    // The engine owns the quote cache (TTL + capacity from config)
    let engine = Arc::new(PricingEngine::new(
        catalog,
        pricing_config,
        promos,
        Duration::from_secs(config.quote_cache_ttl_secs),
        config.quote_cache_capacity,
    ));
    tracing::info!(
        "Quote cache initialized ({}s TTL, {} capacity)",
        config.quote_cache_ttl_secs,
        config.quote_cache_capacity
    );

    // Build application state
    let app_state = Arc::new(handlers::AppState {
        engine,
        config: config.clone(),
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    // Build protected routes with security layers
    let protected_routes = Router::new()
        .route("/api/v1/pricing/quote", post(handlers::quote))
        .route(
            "/api/v1/pricing/promo/validate",
            post(handlers::validate_promo),
        )
        .route(
            "/api/v1/pricing/recommendations",
            post(handlers::recommendations),
        )
        .route("/api/v1/pricing/services", get(handlers::list_services))
        .route("/api/v1/pricing/config", get(handlers::get_pricing_config))
        .layer(
            ServiceBuilder::new()
                // Request size limit: 1MB max payload (quotes are small)
                .layer(RequestBodyLimitLayer::new(1024 * 1024))
                // Rate limiting: 10 req/sec per IP, burst of 20
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Build final app with health check (bypasses rate limiting)
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
