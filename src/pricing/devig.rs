//! Vig removal.
//!
//! Converts the raw implied probabilities of a market, which sum to more
//! than 1, into fair probabilities that sum to exactly 1. Three models are
//! supported; see [`DevigMethod`].

use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

use super::odds::{implied_probabilities, probability_to_odds};
use super::root::{bisect, Bisection};
use crate::types::{DevigMethod, Market, Odds, PricingError, Side};

/// Fair probabilities produced by the additive model are held inside this
/// band; anything outside is clamped and flagged.
pub const MIN_FAIR_PROBABILITY: f64 = 0.001;
pub const MAX_FAIR_PROBABILITY: f64 = 0.999;

/// Search range for the power-model exponent. An exponent of 1 leaves the
/// probabilities untouched; larger exponents remove more overround.
const POWER_EXPONENT_RANGE: (f64, f64) = (1.0, 10.0);
const POWER_TOLERANCE: f64 = 1e-9;
const POWER_MAX_ITERATIONS: u32 = 200;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Non-fatal conditions raised while devigging.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DevigWarning {
    /// The additive model pushed an outcome outside the valid band and the
    /// value was clamped. The method is unsuitable for this market.
    ClampedProbability { outcome: usize, raw: f64, clamped: f64 },
}

impl fmt::Display for DevigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DevigWarning::ClampedProbability { outcome, raw, clamped } => write!(
                f,
                "outcome {} clamped from {:.4} to {:.4}; additive devig is unsuitable here",
                outcome + 1,
                raw,
                clamped
            ),
        }
    }
}

/// Fair probabilities for an n-way market.
#[derive(Debug, Clone, PartialEq)]
pub struct FairProbabilities {
    pub method: DevigMethod,
    pub probabilities: Vec<f64>,
    /// Sum of implied probabilities minus 1.
    pub overround: f64,
    /// Solved exponent for the power model.
    pub exponent: Option<f64>,
    pub warnings: Vec<DevigWarning>,
}

/// Devigged two-way market.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DevigResult {
    pub method: DevigMethod,
    pub market: Market,
    pub implied: [f64; 2],
    pub true_probabilities: [f64; 2],
    pub fair_odds: [Odds; 2],
    /// Full precision; rounding is a presentation concern.
    pub overround: f64,
    pub exponent: Option<f64>,
    pub warnings: Vec<DevigWarning>,
}

impl DevigResult {
    /// Total vig as a percentage of stake (`overround * 100`).
    pub fn total_vig(&self) -> f64 {
        self.overround * 100.0
    }

    /// The book's margin as a percentage of total handle.
    pub fn hold_percent(&self) -> f64 {
        self.overround / (1.0 + self.overround) * 100.0
    }

    pub fn true_probability(&self, side: Side) -> f64 {
        self.true_probabilities[side.index()]
    }

    pub fn fair_odds_for(&self, side: Side) -> Odds {
        self.fair_odds[side.index()]
    }

    /// Whether any probability was clamped by the additive model.
    pub fn is_clamped(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, DevigWarning::ClampedProbability { .. }))
    }
}

// ---------------------------------------------------------------------------
// Devig
// ---------------------------------------------------------------------------

/// Remove the vig from a two-way market.
pub fn devig(market: &Market, method: DevigMethod) -> Result<DevigResult, PricingError> {
    let (implied_a, implied_b) = implied_probabilities(market)?;
    let implied = [implied_a, implied_b];

    let fair = devig_probabilities(&implied, method)?;
    let true_probabilities = [fair.probabilities[0], fair.probabilities[1]];
    let fair_odds = [
        probability_to_odds(true_probabilities[0])?,
        probability_to_odds(true_probabilities[1])?,
    ];

    debug!(
        market = %market,
        method = %method,
        true_a = format!("{:.2}%", true_probabilities[0] * 100.0),
        true_b = format!("{:.2}%", true_probabilities[1] * 100.0),
        vig = format!("{:.2}%", fair.overround * 100.0),
        "Market devigged"
    );

    Ok(DevigResult {
        method,
        market: *market,
        implied,
        true_probabilities,
        fair_odds,
        overround: fair.overround,
        exponent: fair.exponent,
        warnings: fair.warnings,
    })
}

/// Remove the vig from any number of mutually exclusive outcomes.
///
/// `implied` holds each outcome's raw implied probability. At least two
/// outcomes are required.
pub fn devig_probabilities(
    implied: &[f64],
    method: DevigMethod,
) -> Result<FairProbabilities, PricingError> {
    if implied.len() < 2 {
        return Err(PricingError::InsufficientOutcomes(implied.len()));
    }
    if let Some(&bad) = implied.iter().find(|p| !p.is_finite() || **p <= 0.0 || **p >= 1.0) {
        return Err(PricingError::InvalidProbability(bad));
    }

    let total: f64 = implied.iter().sum();
    let overround = total - 1.0;

    let (probabilities, exponent, warnings) = match method {
        DevigMethod::Multiplicative => (multiplicative(implied, total), None, Vec::new()),
        DevigMethod::Additive => {
            let (probabilities, warnings) = additive(implied, overround);
            (probabilities, None, warnings)
        }
        DevigMethod::Power => {
            let (probabilities, k) = power(implied, overround)?;
            (probabilities, Some(k), Vec::new())
        }
    };

    Ok(FairProbabilities {
        method,
        probabilities,
        overround,
        exponent,
        warnings,
    })
}

fn multiplicative(implied: &[f64], total: f64) -> Vec<f64> {
    implied.iter().map(|p| p / total).collect()
}

fn additive(implied: &[f64], overround: f64) -> (Vec<f64>, Vec<DevigWarning>) {
    let share = overround / implied.len() as f64;
    let mut warnings = Vec::new();

    let mut probabilities: Vec<f64> = implied
        .iter()
        .enumerate()
        .map(|(outcome, p)| {
            let raw = p - share;
            let clamped = raw.clamp(MIN_FAIR_PROBABILITY, MAX_FAIR_PROBABILITY);
            if clamped != raw {
                warn!(outcome, raw, clamped, "Additive devig clamped a fair probability");
                warnings.push(DevigWarning::ClampedProbability { outcome, raw, clamped });
            }
            clamped
        })
        .collect();

    // Clamping can break the unit sum for three or more outcomes.
    if !warnings.is_empty() {
        let sum: f64 = probabilities.iter().sum();
        for p in probabilities.iter_mut() {
            *p /= sum;
        }
    }

    (probabilities, warnings)
}

fn power(implied: &[f64], overround: f64) -> Result<(Vec<f64>, f64), PricingError> {
    if overround <= 0.0 {
        return Err(PricingError::DevigConvergence {
            reason: format!(
                "implied probabilities sum to {:.6}; there is no vig to remove",
                1.0 + overround
            ),
        });
    }

    let residual = |k: f64| implied.iter().map(|p| p.powf(k)).sum::<f64>() - 1.0;
    let k = bisect(
        residual,
        Bisection {
            lo: POWER_EXPONENT_RANGE.0,
            hi: POWER_EXPONENT_RANGE.1,
            tolerance: POWER_TOLERANCE,
            max_iterations: POWER_MAX_ITERATIONS,
        },
    )
    .map_err(|e| PricingError::DevigConvergence { reason: e.to_string() })?;

    Ok((implied.iter().map(|p| p.powf(k)).collect(), k))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::odds::odds_to_probability;

    fn sum(r: &DevigResult) -> f64 {
        r.true_probabilities.iter().sum()
    }

    #[test]
    fn test_all_methods_sum_to_one() {
        let markets = [
            Market::new(-110, -110),
            Market::new(-150, 130),
            Market::new(-300, 240),
            Market::new(120, -140),
            Market::new(-1000, 600),
        ];
        for market in markets {
            for &method in DevigMethod::ALL {
                let r = devig(&market, method).unwrap();
                assert!(
                    (sum(&r) - 1.0).abs() < 1e-6,
                    "{method} on {market} summed to {}",
                    sum(&r)
                );
            }
        }
    }

    #[test]
    fn test_symmetric_market_methods_coincide() {
        let market = Market::new(-110, -110);
        let mult = devig(&market, DevigMethod::Multiplicative).unwrap();
        let add = devig(&market, DevigMethod::Additive).unwrap();
        let pow = devig(&market, DevigMethod::Power).unwrap();

        for r in [&mult, &add, &pow] {
            assert!((r.true_probabilities[0] - 0.5).abs() < 1e-6);
            assert!((r.true_probabilities[1] - 0.5).abs() < 1e-6);
            assert!((r.total_vig() - 4.7619).abs() < 1e-3);
            assert!((r.hold_percent() - 4.5454).abs() < 1e-3);
            // Even money is quoted as a favourite.
            assert_eq!(r.fair_odds, [-100, -100]);
        }
    }

    #[test]
    fn test_multiplicative_no_vig_unchanged() {
        let r = devig(&Market::new(-150, 150), DevigMethod::Multiplicative).unwrap();
        assert!((r.true_probabilities[0] - 0.6).abs() < 1e-12);
        assert!((r.true_probabilities[1] - 0.4).abs() < 1e-12);
        assert!(r.overround.abs() < 1e-12);
        assert_eq!(r.fair_odds, [-150, 150]);
    }

    #[test]
    fn test_multiplicative_favorite() {
        let r = devig(&Market::new(-150, 130), DevigMethod::Multiplicative).unwrap();
        assert!((r.true_probability(Side::A) - 0.579832).abs() < 1e-5);
        assert_eq!(r.fair_odds, [-138, 138]);
        assert!((r.total_vig() - 3.4783).abs() < 1e-3);
    }

    #[test]
    fn test_additive_splits_equally() {
        let r = devig(&Market::new(-150, 130), DevigMethod::Additive).unwrap();
        assert!((r.true_probability(Side::A) - 0.582609).abs() < 1e-5);
        assert!((r.true_probability(Side::B) - 0.417391).abs() < 1e-5);
        assert_eq!(r.fair_odds, [-140, 140]);
        assert!(!r.is_clamped());
    }

    #[test]
    fn test_power_favors_longshot_adjustment() {
        let r = devig(&Market::new(-150, 130), DevigMethod::Power).unwrap();
        let k = r.exponent.unwrap();
        assert!((k - 1.05297).abs() < 1e-4);
        assert!((r.true_probability(Side::A) - 0.583983).abs() < 1e-5);
        assert_eq!(r.fair_odds, [-140, 140]);
    }

    #[test]
    fn test_power_exponent_grows_with_vig() {
        let low = devig(&Market::new(-105, -105), DevigMethod::Power).unwrap();
        let high = devig(&Market::new(-125, -125), DevigMethod::Power).unwrap();
        assert!(low.exponent.unwrap() > 1.0);
        assert!(high.exponent.unwrap() > low.exponent.unwrap());
    }

    #[test]
    fn test_power_without_vig_fails() {
        let err = devig(&Market::new(-150, 150), DevigMethod::Power).unwrap_err();
        assert!(matches!(err, PricingError::DevigConvergence { .. }));

        let err = devig(&Market::new(110, 110), DevigMethod::Power).unwrap_err();
        assert!(matches!(err, PricingError::DevigConvergence { .. }));
    }

    #[test]
    fn test_additive_clamps_and_flags() {
        // 0.999001 / 0.000999: the split pushes both sides past the band.
        let r = devig(&Market::new(-100_000, 100_000), DevigMethod::Additive).unwrap();
        assert!(r.is_clamped());
        assert_eq!(r.warnings.len(), 2);
        assert_eq!(r.true_probability(Side::A), MAX_FAIR_PROBABILITY);
        assert_eq!(r.true_probability(Side::B), MIN_FAIR_PROBABILITY);
        assert!((sum(&r) - 1.0).abs() < 1e-9);
        assert_eq!(r.fair_odds, [-99900, 99900]);
        assert!(r.warnings[0].to_string().contains("unsuitable"));
    }

    #[test]
    fn test_invalid_odds_propagate() {
        assert_eq!(
            devig(&Market::new(-110, 50), DevigMethod::Multiplicative).unwrap_err(),
            PricingError::InvalidOdds(50)
        );
    }

    #[test]
    fn test_three_way_devig() {
        // Soccer 1X2 at +150 / +220 / +190
        let implied: Vec<f64> = [150, 220, 190]
            .iter()
            .map(|&o| odds_to_probability(o).unwrap())
            .collect();
        for &method in DevigMethod::ALL {
            let fair = devig_probabilities(&implied, method).unwrap();
            assert_eq!(fair.probabilities.len(), 3);
            let total: f64 = fair.probabilities.iter().sum();
            assert!((total - 1.0).abs() < 1e-6, "{method} summed to {total}");
            assert!(fair.probabilities[0] > fair.probabilities[2]);
        }
    }

    #[test]
    fn test_three_way_additive_clamp_renormalises() {
        let fair = devig_probabilities(&[0.95, 0.10, 0.0012], DevigMethod::Additive).unwrap();
        assert!(!fair.warnings.is_empty());
        let total: f64 = fair.probabilities.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_outcome_rejected() {
        assert_eq!(
            devig_probabilities(&[0.6], DevigMethod::Multiplicative).unwrap_err(),
            PricingError::InsufficientOutcomes(1)
        );
        assert!(matches!(
            devig_probabilities(&[0.6, 1.2], DevigMethod::Multiplicative),
            Err(PricingError::InvalidProbability(_))
        ));
    }
}
