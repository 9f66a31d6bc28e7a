//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs, then
//! converts the parlay table list and engine section into the inputs the
//! [`PricingEngine`](crate::engine::PricingEngine) is built from.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;

use crate::engine::EngineSettings;
use crate::parlay::{ParlayRegistry, ParlayType, PayoutTable};
use crate::strategy::ConsensusKind;
use crate::types::DevigMethod;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    /// Parlay payout tables offered. Empty means the standard set.
    #[serde(default)]
    pub parlay_types: Vec<ParlayTypeConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    #[serde(default = "default_devig_method")]
    pub devig_method: String,
    #[serde(default = "default_consensus")]
    pub consensus: String,
    /// Book name → weight, read by the weighted consensus.
    #[serde(default)]
    pub book_weights: HashMap<String, f64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            devig_method: default_devig_method(),
            consensus: default_consensus(),
            book_weights: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ParlayTypeConfig {
    pub id: String,
    pub legs: u32,
    pub payouts: Vec<PayoutEntry>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct PayoutEntry {
    pub hits: u32,
    pub multiplier: f64,
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_devig_method() -> String {
    DevigMethod::default().to_string()
}

fn default_consensus() -> String {
    ConsensusKind::default().to_string()
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// `host:port` for the HTTP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Build the parlay registry, falling back to the standard tables when
    /// none are configured.
    pub fn registry(&self) -> Result<ParlayRegistry> {
        if self.parlay_types.is_empty() {
            return Ok(ParlayRegistry::standard()?);
        }

        let types = self
            .parlay_types
            .iter()
            .map(|p| -> Result<ParlayType> {
                let payouts = p.payouts.iter().map(|e| (e.hits, e.multiplier));
                let table = PayoutTable::new(p.legs, payouts)
                    .with_context(|| format!("Invalid payout table for parlay type {}", p.id))?;
                Ok(ParlayType::new(p.id.clone(), table))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ParlayRegistry::new(types)?)
    }

    pub fn engine_settings(&self) -> Result<EngineSettings> {
        let devig_method: DevigMethod = self
            .engine
            .devig_method
            .parse()
            .context("Invalid engine.devig_method")?;
        let consensus: ConsensusKind = self
            .engine
            .consensus
            .parse()
            .context("Invalid engine.consensus")?;

        Ok(EngineSettings {
            devig_method,
            consensus,
            book_weights: self.engine.book_weights.clone(),
        })
    }
}
