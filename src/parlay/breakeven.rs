//! Breakeven per-leg probability for a parlay payout table.
//!
//! Finds the `p*` at which the expected payout multiplier is exactly 1,
//! assuming independent legs that each hit with the same probability.

use serde::Serialize;
use tracing::debug;

use super::payout::{expected_payout, ParlayFamily, PayoutTable};
use super::registry::ParlayType;
use crate::pricing::odds::probability_to_odds;
use crate::pricing::root::{bisect, Bisection};
use crate::types::{Odds, PricingError};

const FLEX_TOLERANCE: f64 = 1e-10;
const FLEX_MAX_ITERATIONS: u32 = 100;

/// Breakeven threshold for one parlay type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakevenResult {
    pub parlay_type: String,
    pub legs: u32,
    pub family: ParlayFamily,
    /// Per-leg breakeven probability, full precision.
    pub probability: f64,
    pub fair_odds: Odds,
    /// `(p* - 0.5) * 100`: how far above a coinflip each leg must hit.
    pub edge_vs_coinflip: f64,
    pub payout_table: PayoutTable,
}

impl BreakevenResult {
    pub fn percent(&self) -> f64 {
        self.probability * 100.0
    }

    /// One-line summary for display.
    pub fn explanation(&self) -> String {
        format!(
            "Each pick must hit at {:.2}% ({} odds) to break even",
            self.percent(),
            self.fair_odds
        )
    }
}

/// Solve the breakeven probability for a registered parlay type.
pub fn solve(parlay: &ParlayType) -> Result<BreakevenResult, PricingError> {
    solve_table(&parlay.id, &parlay.table)
}

/// Solve the breakeven probability for a bare payout table.
///
/// `label` only names the table in errors and the result.
pub fn solve_table(label: &str, table: &PayoutTable) -> Result<BreakevenResult, PricingError> {
    let n = table.legs();
    let family = table.family();
    let fail = |reason: String| PricingError::BreakevenConvergence {
        parlay_type: label.to_string(),
        reason,
    };

    // Weakly increasing payouts: the zero-hit and sweep multipliers bound E(p).
    if table.payout(0) >= 1.0 {
        return Err(fail(format!(
            "pays {}x with zero hits, so every probability breaks even",
            table.payout(0)
        )));
    }
    if table.top_multiplier() <= 1.0 {
        return Err(fail(format!(
            "a clean sweep pays only {}x, so no probability breaks even",
            table.top_multiplier()
        )));
    }

    let probability = match family {
        ParlayFamily::Power => table.top_multiplier().powf(-1.0 / f64::from(n)),
        ParlayFamily::Flex => bisect(
            |p| expected_payout(table, p) - 1.0,
            Bisection {
                lo: 0.0,
                hi: 1.0,
                tolerance: FLEX_TOLERANCE,
                max_iterations: FLEX_MAX_ITERATIONS,
            },
        )
        .map_err(|e| fail(e.to_string()))?,
    };

    let fair_odds = probability_to_odds(probability)?;

    debug!(
        parlay_type = label,
        family = %family,
        legs = n,
        breakeven = format!("{:.4}%", probability * 100.0),
        fair_odds,
        "Breakeven solved"
    );

    Ok(BreakevenResult {
        parlay_type: label.to_string(),
        legs: n,
        family,
        probability,
        fair_odds,
        edge_vs_coinflip: (probability - 0.5) * 100.0,
        payout_table: table.clone(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
