//! API route handlers and wire types.
//!
//! Internal math is `f64`; responses round through `Decimal` so JSON
//! carries exactly the advertised number of decimal places.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::ApiError;
use crate::engine::PricingEngine;
use crate::parlay::{BreakevenResult, ParlayFamily};
use crate::pricing::devig::DevigResult;
use crate::strategy::comparison::{DEFAULT_MIN_DIFF, DEFAULT_REFERENCE_BOOK, DEFAULT_TARGET_BOOK};
use crate::strategy::{
    compare_lines, find_discrepancies, Discrepancy, DiscrepancyQuery, EdgeResult, Leg,
    LineComparison, LineFilter, PropLine, ReferenceProbability, ValidationReport,
};
use crate::types::{DevigMethod, Market, Odds, Side};

pub type AppState = Arc<PricingEngine>;

/// Round to `dp` decimal places for the wire.
fn round(value: f64, dp: u32) -> Decimal {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(dp))
        .unwrap_or_default()
}

fn percent(value: f64) -> Decimal {
    round(value, 2)
}

fn probability(value: f64) -> Decimal {
    round(value, 4)
}

fn line_points(value: f64) -> Decimal {
    round(value, 1)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct DevigRequest {
    pub odds_1: Odds,
    pub odds_2: Odds,
    #[serde(default)]
    pub method: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ParlayOddsRequest {
    pub parlay_type: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub parlay_type: String,
    #[serde(default)]
    pub legs: Vec<Leg>,
    #[serde(default)]
    pub sharp_books: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct DiscrepancyRequest {
    pub lines: Vec<PropLine>,
    #[serde(default)]
    pub min_diff: Option<f64>,
    #[serde(default)]
    pub reference_book: Option<String>,
    #[serde(default)]
    pub target_book: Option<String>,
    #[serde(flatten)]
    pub filter: LineFilter,
}

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub lines: Vec<PropLine>,
    /// Books to include; empty keeps every book.
    #[serde(default)]
    pub books: Vec<String>,
    #[serde(flatten)]
    pub filter: LineFilter,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct DevigResponse {
    pub method_used: DevigMethod,
    pub input_odds_1: Odds,
    pub input_odds_2: Odds,
    pub implied_prob_1: Decimal,
    pub implied_prob_2: Decimal,
    pub true_prob_1: Decimal,
    pub true_prob_2: Decimal,
    pub true_percent_1: Decimal,
    pub true_percent_2: Decimal,
    pub fair_odds_1: Odds,
    pub fair_odds_2: Odds,
    pub total_vig: Decimal,
    pub hold_percent: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_exponent: Option<Decimal>,
    pub clamped: bool,
    pub warnings: Vec<String>,
}

impl From<&DevigResult> for DevigResponse {
    fn from(r: &DevigResult) -> Self {
        let [p1, p2] = r.true_probabilities;
        Self {
            method_used: r.method,
            input_odds_1: r.market.side_a,
            input_odds_2: r.market.side_b,
            implied_prob_1: probability(r.implied[0]),
            implied_prob_2: probability(r.implied[1]),
            true_prob_1: probability(p1),
            true_prob_2: probability(p2),
            true_percent_1: percent(p1 * 100.0),
            true_percent_2: percent(p2 * 100.0),
            fair_odds_1: r.fair_odds[0],
            fair_odds_2: r.fair_odds[1],
            total_vig: percent(r.total_vig()),
            hold_percent: percent(r.hold_percent()),
            power_exponent: r.exponent.map(probability),
            clamped: r.is_clamped(),
            warnings: r.warnings.iter().map(|w| w.to_string()).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PayoutLine {
    pub hits: u32,
    pub multiplier: f64,
}

#[derive(Debug, Serialize)]
pub struct ParlayOddsResponse {
    pub parlay_type: String,
    pub total_picks: u32,
    pub family: ParlayFamily,
    pub breakeven_prob: Decimal,
    pub breakeven_percent: Decimal,
    pub breakeven_odds: Odds,
    pub edge_vs_coinflip: Decimal,
    pub explanation: String,
    /// Paying hit counts, most hits first.
    pub payout_structure: Vec<PayoutLine>,
}

impl From<&BreakevenResult> for ParlayOddsResponse {
    fn from(r: &BreakevenResult) -> Self {
        Self {
            parlay_type: r.parlay_type.clone(),
            total_picks: r.legs,
            family: r.family,
            breakeven_prob: probability(r.probability),
            breakeven_percent: percent(r.percent()),
            breakeven_odds: r.fair_odds,
            edge_vs_coinflip: percent(r.edge_vs_coinflip),
            explanation: r.explanation(),
            payout_structure: r
                .payout_table
                .entries()
                .iter()
                .rev()
                .filter(|(_, m)| **m > 0.0)
                .map(|(&hits, &multiplier)| PayoutLine { hits, multiplier })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ParlayTypesResponse {
    pub parlay_types: Vec<ParlayOddsResponse>,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ReferenceResponse {
    pub book: String,
    pub quoted_odds: Odds,
    pub true_probability: Decimal,
    pub fair_odds: Odds,
    pub clamped: bool,
}

impl From<&ReferenceProbability> for ReferenceResponse {
    fn from(r: &ReferenceProbability) -> Self {
        Self {
            book: r.book.clone(),
            quoted_odds: r.quoted_odds,
            true_probability: probability(r.true_probability),
            fair_odds: r.fair_odds,
            clamped: r.clamped,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LegResponse {
    pub leg_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub side: Side,
    pub consensus_true_probability: Option<Decimal>,
    pub consensus_true_percent: Option<Decimal>,
    pub consensus_fair_odds: Option<Odds>,
    pub breakeven_percent: Decimal,
    pub edge_percent: Option<Decimal>,
    pub is_ev: bool,
    pub has_sharp_data: bool,
    pub references: Vec<ReferenceResponse>,
}

impl From<&EdgeResult> for LegResponse {
    fn from(r: &EdgeResult) -> Self {
        Self {
            leg_id: r.leg_id.clone(),
            label: r.label.clone(),
            side: r.side,
            consensus_true_probability: r.consensus_true_probability.map(probability),
            consensus_true_percent: r.consensus_true_probability.map(|p| percent(p * 100.0)),
            consensus_fair_odds: r.consensus_fair_odds,
            breakeven_percent: percent(r.breakeven_probability * 100.0),
            edge_percent: r.edge.map(percent),
            is_ev: r.is_ev,
            has_sharp_data: r.has_sharp_data,
            references: r.references.iter().map(ReferenceResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub total_legs: usize,
    pub ev_legs: usize,
    pub non_ev_legs: usize,
    pub legs_with_sharp_data: usize,
    pub average_edge: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub parlay_type: String,
    pub breakeven_percent: Decimal,
    pub sharp_books: Vec<String>,
    pub legs: Vec<LegResponse>,
    pub summary: SummaryResponse,
}

impl From<&ValidationReport> for ValidateResponse {
    fn from(r: &ValidationReport) -> Self {
        Self {
            parlay_type: r.parlay_type.clone(),
            breakeven_percent: percent(r.breakeven_probability * 100.0),
            sharp_books: r.sharp_books.clone(),
            legs: r.legs.iter().map(LegResponse::from).collect(),
            summary: SummaryResponse {
                total_legs: r.summary.total_legs,
                ev_legs: r.summary.ev_legs,
                non_ev_legs: r.summary.non_ev_legs,
                legs_with_sharp_data: r.summary.legs_with_sharp_data,
                average_edge: percent(r.summary.average_edge),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EvLinesResponse {
    pub parlay_type: String,
    pub breakeven_percent: Decimal,
    pub count: usize,
    pub legs: Vec<LegResponse>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub parlay_types: usize,
    pub devig_method: DevigMethod,
    pub consensus: &'static str,
    pub registry_built_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct DiscrepancyLine {
    pub player_name: String,
    pub stat_type: String,
    pub reference_book: String,
    pub reference_line: f64,
    pub target_book: String,
    pub target_line: f64,
    pub difference: Decimal,
    pub percent_diff: Decimal,
    pub higher_book: String,
    pub matchup: Option<String>,
    pub reference_price: Option<Odds>,
}

impl From<&Discrepancy> for DiscrepancyLine {
    fn from(d: &Discrepancy) -> Self {
        Self {
            player_name: d.player_name.clone(),
            stat_type: d.stat_type.clone(),
            reference_book: d.reference_book.clone(),
            reference_line: d.reference_line,
            target_book: d.target_book.clone(),
            target_line: d.target_line,
            difference: line_points(d.difference),
            percent_diff: line_points(d.percent_diff),
            higher_book: d.higher_book.clone(),
            matchup: d.matchup.clone(),
            reference_price: d.reference_price,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DiscrepancyMeta {
    pub min_diff_applied: f64,
    pub reference_book: String,
    pub target_book: String,
    pub count: usize,
    pub filters: LineFilter,
}

#[derive(Debug, Serialize)]
pub struct DiscrepancyResponse {
    pub data: Vec<DiscrepancyLine>,
    pub meta: DiscrepancyMeta,
}

#[derive(Debug, Serialize)]
pub struct CompareMeta {
    pub books: Vec<String>,
    pub count: usize,
    pub filters: LineFilter,
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub data: Vec<LineComparison>,
    pub meta: CompareMeta,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// POST /api/calculators/devig
pub async fn devig(
    State(engine): State<AppState>,
    Json(req): Json<DevigRequest>,
) -> Result<Json<DevigResponse>, ApiError> {
    let method = req
        .method
        .as_deref()
        .map(str::parse::<DevigMethod>)
        .transpose()?;
    let result = engine.devig(&Market::new(req.odds_1, req.odds_2), method)?;
    Ok(Json(DevigResponse::from(&result)))
}

/// POST /api/calculators/parlay-odds
pub async fn parlay_odds(
    State(engine): State<AppState>,
    Json(req): Json<ParlayOddsRequest>,
) -> Result<Json<ParlayOddsResponse>, ApiError> {
    let result = engine.breakeven(&req.parlay_type)?;
    Ok(Json(ParlayOddsResponse::from(&result)))
}

/// GET /api/calculators/parlay-types
pub async fn parlay_types(State(engine): State<AppState>) -> Json<ParlayTypesResponse> {
    let table = engine.parlay_types();
    Json(ParlayTypesResponse {
        parlay_types: table.results().iter().map(ParlayOddsResponse::from).collect(),
        computed_at: table.built_at(),
    })
}

/// POST /api/parlay/validate
pub async fn validate_parlay(
    State(engine): State<AppState>,
    Json(req): Json<ValidateRequest>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let report = engine.validate(&req.parlay_type, &req.legs, &req.sharp_books)?;
    Ok(Json(ValidateResponse::from(&report)))
}

/// POST /api/parlay/ev-lines
pub async fn ev_lines(
    State(engine): State<AppState>,
    Json(req): Json<ValidateRequest>,
) -> Result<Json<EvLinesResponse>, ApiError> {
    let breakeven = engine.breakeven(&req.parlay_type)?;
    let legs = engine.find_ev_legs(&req.parlay_type, &req.legs, &req.sharp_books)?;
    Ok(Json(EvLinesResponse {
        parlay_type: breakeven.parlay_type.clone(),
        breakeven_percent: percent(breakeven.percent()),
        count: legs.len(),
        legs: legs.iter().map(LegResponse::from).collect(),
    }))
}

/// POST /api/discrepancies
pub async fn discrepancies(
    Json(req): Json<DiscrepancyRequest>,
) -> Result<Json<DiscrepancyResponse>, ApiError> {
    let query = DiscrepancyQuery {
        reference_book: req
            .reference_book
            .unwrap_or_else(|| DEFAULT_REFERENCE_BOOK.to_string()),
        target_book: req.target_book.unwrap_or_else(|| DEFAULT_TARGET_BOOK.to_string()),
        min_diff: req.min_diff.unwrap_or(DEFAULT_MIN_DIFF),
        filter: req.filter,
    };
    let found = find_discrepancies(&req.lines, &query)?;
    Ok(Json(DiscrepancyResponse {
        data: found.iter().map(DiscrepancyLine::from).collect(),
        meta: DiscrepancyMeta {
            min_diff_applied: query.min_diff,
            reference_book: query.reference_book,
            target_book: query.target_book,
            count: found.len(),
            filters: query.filter,
        },
    }))
}

/// POST /api/compare
pub async fn compare(Json(req): Json<CompareRequest>) -> Json<CompareResponse> {
    let data = compare_lines(&req.lines, &req.books, &req.filter);
    Json(CompareResponse {
        meta: CompareMeta {
            books: req.books,
            count: data.len(),
            filters: req.filter,
        },
        data,
    })
}

/// GET /health
pub async fn health(State(engine): State<AppState>) -> Json<HealthResponse> {
    let table = engine.parlay_types();
    Json(HealthResponse {
        status: "ok",
        parlay_types: table.results().len(),
        devig_method: engine.settings().devig_method,
        consensus: engine.consensus_name(),
        registry_built_at: table.built_at(),
    })
}
