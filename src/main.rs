//! SHARPLINE: Odds normalization & parlay probability engine.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! solves every configured parlay table, and serves the JSON API with
//! graceful shutdown.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use sharpline::api;
use sharpline::config;
use sharpline::engine::PricingEngine;

const BANNER: &str = r#"
     _                     _ _
 ___| |__   __ _ _ __ _ __ | (_)_ __   ___
/ __| '_ \ / _` | '__| '_ \| | | '_ \ / _ \
\__ \ | | | (_| | |  | |_) | | | | | |  __/
|___/_| |_|\__,_|_|  | .__/|_|_|_| |_|\___|
                     |_|
  Devig, breakeven and +EV leg detection
  v0.1.0
"#;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path =
        std::env::var("SHARPLINE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::AppConfig::load(&config_path)?;

    init_logging();

    println!("{BANNER}");

    // -- Engine ----------------------------------------------------------

    let registry = cfg.registry()?;
    let settings = cfg.engine_settings()?;
    let engine = PricingEngine::new(registry, settings)
        .context("Failed to solve configured parlay tables")?;

    for result in engine.parlay_types().results() {
        info!(
            parlay_type = %result.parlay_type,
            family = %result.family,
            breakeven = format!("{:.2}%", result.percent()),
            fair_odds = result.fair_odds,
            "Parlay type loaded"
        );
    }

    // -- API -------------------------------------------------------------

    if !cfg.server.enabled {
        info!("API server disabled in config. Nothing else to do.");
        return Ok(());
    }

    api::serve(Arc::new(engine), &cfg.bind_address()).await?;

    info!("SHARPLINE shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sharpline=info"));

    let json_logging = std::env::var("SHARPLINE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
