//! Shared types for the SHARPLINE engine.
//!
//! These types form the data model used across all modules.

use serde::{Deserialize, Serialize};
use std::fmt;

/// American odds. Valid prices have an absolute value of at least 100.
pub type Odds = i32;

// ---------------------------------------------------------------------------
// Market
// ---------------------------------------------------------------------------

/// A two-outcome proposition quoted by one book at one instant
/// (e.g. over/under a player's points line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub side_a: Odds,
    pub side_b: Odds,
}

impl Market {
    pub fn new(side_a: Odds, side_b: Odds) -> Self {
        Self { side_a, side_b }
    }

    /// The price quoted for one side.
    pub fn odds_for(&self, side: Side) -> Odds {
        match side {
            Side::A => self.side_a,
            Side::B => self.side_b,
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:+} / {:+}", self.side_a, self.side_b)
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which side of a two-way market a selection is on.
///
/// Side A is conventionally the "over", side B the "under".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "a", alias = "over", alias = "A")]
    A,
    #[serde(rename = "b", alias = "under", alias = "B")]
    B,
}

impl Side {
    /// Position of this side in a two-way probability slice.
    pub fn index(&self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

/// Model used to apportion the overround between the sides of a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevigMethod {
    /// Proportional to each side's raw probability.
    #[default]
    Multiplicative,
    /// Equal probability points off every side.
    Additive,
    /// Common exponent applied to every side.
    Power,
}

impl DevigMethod {
    /// All known methods (useful for iteration and error messages).
    pub const ALL: &'static [DevigMethod] = &[
        DevigMethod::Multiplicative,
        DevigMethod::Additive,
        DevigMethod::Power,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DevigMethod::Multiplicative => "multiplicative",
            DevigMethod::Additive => "additive",
            DevigMethod::Power => "power",
        }
    }
}

impl fmt::Display for DevigMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a method name (case-insensitive).
impl std::str::FromStr for DevigMethod {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "multiplicative" | "proportional" => Ok(DevigMethod::Multiplicative),
            "additive" => Ok(DevigMethod::Additive),
            "power" => Ok(DevigMethod::Power),
            other => Err(PricingError::UnknownDevigMethod(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failures raised by the pricing engine.
///
/// None of these are retried: every input is a deterministic value, so a
/// second attempt reproduces the same failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PricingError {
    #[error("Invalid American odds: {0} (absolute value must be at least 100)")]
    InvalidOdds(Odds),

    #[error("Invalid probability: {0} (must be strictly between 0 and 1)")]
    InvalidProbability(f64),

    #[error("A market needs at least two outcomes, got {0}")]
    InsufficientOutcomes(usize),

    #[error("Devig did not converge: {reason}")]
    DevigConvergence { reason: String },

    #[error("Breakeven solver did not converge for {parlay_type}: {reason}")]
    BreakevenConvergence { parlay_type: String, reason: String },

    #[error("Invalid payout table: {0}")]
    InvalidPayoutTable(String),

    #[error("Unknown parlay type: {id}")]
    UnknownParlayType { id: String, valid: Vec<String> },

    #[error("Unknown devig method: {0}. Use 'multiplicative', 'additive', or 'power'")]
    UnknownDevigMethod(String),

    #[error("Unknown consensus strategy: {0}. Use 'mean', 'median', or 'weighted'")]
    UnknownConsensus(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl PricingError {
    /// True when the caller supplied categorically bad input, as opposed
    /// to a numerical failure inside the engine.
    pub fn is_input_error(&self) -> bool {
        !matches!(
            self,
            PricingError::DevigConvergence { .. } | PricingError::BreakevenConvergence { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_accepts_over_under_aliases() {
        let over: Side = serde_json::from_str("\"over\"").unwrap();
        let under: Side = serde_json::from_str("\"under\"").unwrap();
        assert_eq!(over, Side::A);
        assert_eq!(under, Side::B);
        assert_eq!(serde_json::to_string(&Side::A).unwrap(), "\"a\"");
    }

    #[test]
    fn test_market_odds_for_side() {
        let market = Market::new(-150, 130);
        assert_eq!(market.odds_for(Side::A), -150);
        assert_eq!(market.odds_for(Side::B), 130);
        assert_eq!(Side::B.index(), 1);
        assert_eq!(format!("{market}"), "-150 / +130");
    }

    #[test]
    fn test_devig_method_from_str() {
        assert_eq!("multiplicative".parse::<DevigMethod>().unwrap(), DevigMethod::Multiplicative);
        assert_eq!("ADDITIVE".parse::<DevigMethod>().unwrap(), DevigMethod::Additive);
        assert_eq!(" power ".parse::<DevigMethod>().unwrap(), DevigMethod::Power);
        assert!(matches!(
            "shin".parse::<DevigMethod>(),
            Err(PricingError::UnknownDevigMethod(_))
        ));
    }

    #[test]
    fn test_devig_method_serde_lowercase() {
        assert_eq!(serde_json::to_string(&DevigMethod::Power).unwrap(), "\"power\"");
        let m: DevigMethod = serde_json::from_str("\"additive\"").unwrap();
        assert_eq!(m, DevigMethod::Additive);
        assert_eq!(DevigMethod::default(), DevigMethod::Multiplicative);
    }

    #[test]
    fn test_error_classification() {
        assert!(PricingError::InvalidOdds(50).is_input_error());
        assert!(PricingError::UnknownDevigMethod("x".into()).is_input_error());
        assert!(!PricingError::DevigConvergence { reason: "x".into() }.is_input_error());
        assert!(!PricingError::BreakevenConvergence {
            parlay_type: "5-pick-flex".into(),
            reason: "x".into()
        }
        .is_input_error());
    }

    #[test]
    fn test_error_display() {
        let e = PricingError::InvalidOdds(-50);
        assert!(e.to_string().contains("-50"));
    }
}
