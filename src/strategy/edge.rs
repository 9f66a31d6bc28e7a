//! +EV detection.
//!
//! Compares each leg's consensus fair probability from the reference
//! ("sharp") books to the breakeven probability of the chosen parlay and
//! classifies the leg as positive or negative expected value.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, warn};

use super::consensus::{ConsensusStrategy, MeanConsensus, ReferenceProbability};
use crate::parlay::BreakevenResult;
use crate::pricing::devig::devig;
use crate::pricing::odds::probability_to_odds;
use crate::types::{DevigMethod, Market, Odds, Side};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// One reference book's two-sided quote for a leg's proposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceQuote {
    pub book: String,
    pub market: Market,
}

/// A proposition the user is considering for a parlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub id: String,
    /// Free-form description, e.g. "Jalen Brunson over 27.5 points".
    #[serde(default)]
    pub label: Option<String>,
    pub side: Side,
    /// The platform's own quote, when it has one. Fixed-payout platforms
    /// usually don't, and it does not enter the edge calculation.
    #[serde(default)]
    pub platform_market: Option<Market>,
    #[serde(default)]
    pub references: Vec<ReferenceQuote>,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Edge of one leg against a parlay's breakeven.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeResult {
    pub leg_id: String,
    pub label: Option<String>,
    pub side: Side,
    pub consensus_true_probability: Option<f64>,
    pub consensus_fair_odds: Option<Odds>,
    pub breakeven_probability: f64,
    /// `(consensus - breakeven) * 100`, in probability points.
    pub edge: Option<f64>,
    pub is_ev: bool,
    pub has_sharp_data: bool,
    pub references: Vec<ReferenceProbability>,
}

/// Aggregate view over a validated set of legs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationSummary {
    pub total_legs: usize,
    pub ev_legs: usize,
    pub non_ev_legs: usize,
    pub legs_with_sharp_data: usize,
    /// Mean edge over legs that have sharp data; 0 when none do.
    pub average_edge: f64,
}

/// Per-leg results plus summary for one parlay type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub parlay_type: String,
    pub breakeven_probability: f64,
    pub sharp_books: Vec<String>,
    pub legs: Vec<EdgeResult>,
    pub summary: ValidationSummary,
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Classifies legs as +EV or -EV against a parlay breakeven.
pub struct EdgeEvaluator {
    method: DevigMethod,
    consensus: Box<dyn ConsensusStrategy>,
}

impl Default for EdgeEvaluator {
    fn default() -> Self {
        Self::new(DevigMethod::Multiplicative, Box::new(MeanConsensus))
    }
}

impl EdgeEvaluator {
    pub fn new(method: DevigMethod, consensus: Box<dyn ConsensusStrategy>) -> Self {
        Self { method, consensus }
    }

    /// Devig method applied to reference markets.
    pub fn method(&self) -> DevigMethod {
        self.method
    }

    pub fn consensus_name(&self) -> &'static str {
        self.consensus.name()
    }

    /// Devig every usable reference quote of `leg` from the allowed books.
    ///
    /// Only books named in `sharp_books` count; with none named the leg has
    /// no sharp data. Quotes that fail to devig are logged and skipped.
    pub fn reference_probabilities(
        &self,
        leg: &Leg,
        sharp_books: &[String],
    ) -> Vec<ReferenceProbability> {
        leg.references
            .iter()
            .filter(|quote| is_allowed(&quote.book, sharp_books))
            .filter_map(|quote| match devig(&quote.market, self.method) {
                Ok(result) => Some(ReferenceProbability {
                    book: quote.book.clone(),
                    quoted_odds: quote.market.odds_for(leg.side),
                    true_probability: result.true_probability(leg.side),
                    fair_odds: result.fair_odds_for(leg.side),
                    implied_probability: result.implied[leg.side.index()],
                    clamped: result.is_clamped(),
                }),
                Err(e) => {
                    warn!(
                        leg_id = %leg.id,
                        book = %quote.book,
                        market = %quote.market,
                        error = %e,
                        "Skipping unusable reference quote"
                    );
                    None
                }
            })
            .collect()
    }

    /// Evaluate a single leg. Never fails: a leg without usable reference
    /// data is reported as such rather than dropped.
    pub fn evaluate(
        &self,
        leg: &Leg,
        sharp_books: &[String],
        breakeven: &BreakevenResult,
    ) -> EdgeResult {
        let references = self.reference_probabilities(leg, sharp_books);
        let consensus = self.consensus.combine(&references);
        let has_sharp_data = consensus.is_some();

        let edge = consensus.map(|p| (p - breakeven.probability) * 100.0);
        let is_ev = has_sharp_data && edge.is_some_and(|e| e > 0.0);

        match (consensus, edge) {
            (Some(p), Some(e)) => debug!(
                leg_id = %leg.id,
                side = %leg.side,
                books = references.len(),
                consensus = format!("{:.2}%", p * 100.0),
                breakeven = format!("{:.2}%", breakeven.percent()),
                edge = format!("{:+.2}", e),
                is_ev,
                "Leg evaluated"
            ),
            _ => debug!(leg_id = %leg.id, "No sharp data for leg"),
        }

        EdgeResult {
            leg_id: leg.id.clone(),
            label: leg.label.clone(),
            side: leg.side,
            consensus_true_probability: consensus,
            consensus_fair_odds: consensus.and_then(|p| probability_to_odds(p).ok()),
            breakeven_probability: breakeven.probability,
            edge,
            is_ev,
            has_sharp_data,
            references,
        }
    }

    /// Evaluate every leg, preserving input order.
    pub fn evaluate_legs(
        &self,
        legs: &[Leg],
        sharp_books: &[String],
        breakeven: &BreakevenResult,
    ) -> Vec<EdgeResult> {
        legs.iter()
            .map(|leg| self.evaluate(leg, sharp_books, breakeven))
            .collect()
    }

    /// Evaluate user-selected legs and summarise them.
    pub fn validate(
        &self,
        legs: &[Leg],
        sharp_books: &[String],
        breakeven: &BreakevenResult,
    ) -> ValidationReport {
        let results = self.evaluate_legs(legs, sharp_books, breakeven);

        let ev_legs = results.iter().filter(|r| r.is_ev).count();
        let edges: Vec<f64> = results.iter().filter_map(|r| r.edge).collect();
        let average_edge = if edges.is_empty() {
            0.0
        } else {
            edges.iter().sum::<f64>() / edges.len() as f64
        };

        let summary = ValidationSummary {
            total_legs: results.len(),
            ev_legs,
            non_ev_legs: results.len() - ev_legs,
            legs_with_sharp_data: edges.len(),
            average_edge,
        };

        debug!(
            parlay_type = %breakeven.parlay_type,
            total = summary.total_legs,
            ev = summary.ev_legs,
            average_edge = format!("{:+.2}", summary.average_edge),
            "Parlay validated"
        );

        ValidationReport {
            parlay_type: breakeven.parlay_type.clone(),
            breakeven_probability: breakeven.probability,
            sharp_books: sharp_books.to_vec(),
            legs: results,
            summary,
        }
    }

    /// Only the +EV legs, best edge first.
    pub fn find_ev_legs(
        &self,
        legs: &[Leg],
        sharp_books: &[String],
        breakeven: &BreakevenResult,
    ) -> Vec<EdgeResult> {
        let mut ev: Vec<EdgeResult> = self
            .evaluate_legs(legs, sharp_books, breakeven)
            .into_iter()
            .filter(|r| r.is_ev)
            .collect();

        ev.sort_by(|a, b| b.edge.partial_cmp(&a.edge).unwrap_or(Ordering::Equal));
        ev
    }
}

fn is_allowed(book: &str, sharp_books: &[String]) -> bool {
    sharp_books.iter().any(|b| b.eq_ignore_ascii_case(book))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
