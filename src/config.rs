use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    /// How long a computed quote is served from cache, in seconds.
    pub quote_cache_ttl_secs: u64,
    /// Maximum number of quotes held in the cache.
    pub quote_cache_capacity: u64,
    /// Optional VAT rate override; the rate card default applies when unset.
    pub vat_rate: Option<f64>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            quote_cache_ttl_secs: std::env::var("QUOTE_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("QUOTE_CACHE_TTL_SECS must be a whole number"))?,
            quote_cache_capacity: std::env::var("QUOTE_CACHE_CAPACITY")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("QUOTE_CACHE_CAPACITY must be a whole number"))?,
            vat_rate: match std::env::var("VAT_RATE") {
                Ok(raw) if !raw.trim().is_empty() => {
                    let rate: f64 = raw
                        .parse()
                        .map_err(|_| anyhow::anyhow!("VAT_RATE must be a number"))?;
                    if !(0.0..=1.0).contains(&rate) {
                        anyhow::bail!("VAT_RATE must be between 0 and 1");
                    }
                    Some(rate)
                }
                _ => None,
            },
        };

        if config.quote_cache_ttl_secs == 0 {
            anyhow::bail!("QUOTE_CACHE_TTL_SECS must be greater than zero");
        }

        // Log successful configuration load
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Server Port: {}", config.port);
        tracing::debug!(
            "Quote cache: {}s TTL, {} entries",
            config.quote_cache_ttl_secs,
            config.quote_cache_capacity
        );
        if let Some(rate) = config.vat_rate {
            tracing::info!("VAT rate overridden to {}", rate);
        }

        Ok(config)
    }
}
