//! Moving-Platform Pricing Engine
//!
//! This library implements the pricing subsystem of the booking platform: a
//! rules-based cost calculator that combines volume, distance, time,
//! multipliers, surcharges, and promotional discounts into a deterministic
//! price quote, plus the HTTP handlers that expose it to the booking UI,
//! promo-code widget, and admin dashboards.
//!
//! # Modules
//!
//! - `catalog`: Immutable service-type table.
//! - `config`: Server configuration from the environment.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers.
//! - `models`: Core data models (booking, promo, breakdown shapes).
//! - `pricing`: The pricing engine and its quote cache.
//! - `pricing_config`: Rate constants and multiplier tables.
//! - `promo`: Promo code registry and validation.
//! - `recommendations`: Service recommendation scoring.

// Re-export primary modules for shared use in tests and other binaries
pub mod catalog;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod pricing;
pub mod pricing_config;
pub mod promo;
pub mod recommendations;
