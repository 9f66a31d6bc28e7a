//! Consensus policies for combining several reference books' fair
//! probabilities into one estimate.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::types::{Odds, PricingError};

/// One reference book's devigged view of a leg's selected side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceProbability {
    pub book: String,
    /// The book's price for the side, vig included.
    pub quoted_odds: Odds,
    pub true_probability: f64,
    pub fair_odds: Odds,
    /// Raw implied probability of the side before devigging.
    pub implied_probability: f64,
    /// Set when the additive model had to clamp this book's market.
    pub clamped: bool,
}

/// Combines per-book fair probabilities into a single estimate.
#[cfg_attr(test, mockall::automock)]
pub trait ConsensusStrategy: Send + Sync {
    /// Short name for logs and responses.
    fn name(&self) -> &'static str;

    /// `None` when the estimates carry no usable information.
    fn combine(&self, estimates: &[ReferenceProbability]) -> Option<f64>;
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// Unweighted average.
#[derive(Debug, Clone, Default)]
pub struct MeanConsensus;

impl ConsensusStrategy for MeanConsensus {
    fn name(&self) -> &'static str {
        "mean"
    }

    fn combine(&self, estimates: &[ReferenceProbability]) -> Option<f64> {
        if estimates.is_empty() {
            return None;
        }
        let total: f64 = estimates.iter().map(|e| e.true_probability).sum();
        Some(total / estimates.len() as f64)
    }
}

/// Middle value; mean of the middle pair for an even count.
#[derive(Debug, Clone, Default)]
pub struct MedianConsensus;

impl ConsensusStrategy for MedianConsensus {
    fn name(&self) -> &'static str {
        "median"
    }

    fn combine(&self, estimates: &[ReferenceProbability]) -> Option<f64> {
        if estimates.is_empty() {
            return None;
        }
        let mut values: Vec<f64> = estimates.iter().map(|e| e.true_probability).collect();
        values.sort_by(f64::total_cmp);

        let mid = values.len() / 2;
        if values.len() % 2 == 0 {
            Some((values[mid - 1] + values[mid]) / 2.0)
        } else {
            Some(values[mid])
        }
    }
}

/// Weighted average with per-book weights (book names compared
/// case-insensitively). Books without a weight get `default_weight`.
#[derive(Debug, Clone)]
pub struct WeightedConsensus {
    weights: HashMap<String, f64>,
    default_weight: f64,
}

impl WeightedConsensus {
    pub fn new(weights: HashMap<String, f64>, default_weight: f64) -> Self {
        let weights = weights
            .into_iter()
            .map(|(book, w)| (book.to_lowercase(), w))
            .collect();
        Self { weights, default_weight }
    }

    pub fn weight_for(&self, book: &str) -> f64 {
        self.weights
            .get(&book.to_lowercase())
            .copied()
            .unwrap_or(self.default_weight)
    }
}

impl ConsensusStrategy for WeightedConsensus {
    fn name(&self) -> &'static str {
        "weighted"
    }

    fn combine(&self, estimates: &[ReferenceProbability]) -> Option<f64> {
        let (weighted, total_weight) = estimates
            .iter()
            .map(|e| (self.weight_for(&e.book).max(0.0), e.true_probability))
            .fold((0.0, 0.0), |(sum, total), (w, p)| (sum + w * p, total + w));

        if total_weight <= 0.0 {
            None
        } else {
            Some(weighted / total_weight)
        }
    }
}

// ---------------------------------------------------------------------------
// Selection from configuration
// ---------------------------------------------------------------------------

/// Consensus policy named in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsensusKind {
    #[default]
    Mean,
    Median,
    Weighted,
}

impl ConsensusKind {
    /// Instantiate the policy. `weights` is only read by `Weighted`.
    pub fn build(&self, weights: &HashMap<String, f64>) -> Box<dyn ConsensusStrategy> {
        match self {
            ConsensusKind::Mean => Box::new(MeanConsensus),
            ConsensusKind::Median => Box::new(MedianConsensus),
            ConsensusKind::Weighted => Box::new(WeightedConsensus::new(weights.clone(), 1.0)),
        }
    }
}

impl fmt::Display for ConsensusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsensusKind::Mean => write!(f, "mean"),
            ConsensusKind::Median => write!(f, "median"),
            ConsensusKind::Weighted => write!(f, "weighted"),
        }
    }
}

impl std::str::FromStr for ConsensusKind {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mean" | "average" => Ok(ConsensusKind::Mean),
            "median" => Ok(ConsensusKind::Median),
            "weighted" => Ok(ConsensusKind::Weighted),
            other => Err(PricingError::UnknownConsensus(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
