//! Pricing engine: the facade the API and binary talk to.
//!
//! Owns the breakeven cache for the configured parlay registry and the edge
//! evaluator. Every operation is synchronous and cheap; share the engine
//! behind an `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::parlay::{BreakevenCache, BreakevenResult, BreakevenTable, ParlayRegistry};
use crate::pricing::devig::{devig, DevigResult};
use crate::strategy::{
    ConsensusKind, ConsensusStrategy, EdgeEvaluator, EdgeResult, Leg, ValidationReport,
};
use crate::types::{DevigMethod, Market, PricingError};

/// Engine-wide defaults chosen at construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineSettings {
    /// Method used for reference markets and when a devig request names none.
    pub devig_method: DevigMethod,
    pub consensus: ConsensusKind,
    /// Per-book weights for `ConsensusKind::Weighted`.
    pub book_weights: HashMap<String, f64>,
}

pub struct PricingEngine {
    settings: EngineSettings,
    cache: BreakevenCache,
    evaluator: EdgeEvaluator,
}

impl PricingEngine {
    /// Solve every parlay type in `registry` and build the evaluator.
    /// Fails if any registered table has no breakeven.
    pub fn new(registry: ParlayRegistry, settings: EngineSettings) -> Result<Self, PricingError> {
        let consensus = settings.consensus.build(&settings.book_weights);
        Self::with_consensus(registry, settings, consensus)
    }

    /// Like [`PricingEngine::new`] with a caller-supplied consensus policy.
    pub fn with_consensus(
        registry: ParlayRegistry,
        settings: EngineSettings,
        consensus: Box<dyn ConsensusStrategy>,
    ) -> Result<Self, PricingError> {
        let cache = BreakevenCache::new(registry)?;
        let evaluator = EdgeEvaluator::new(settings.devig_method, consensus);

        info!(
            devig_method = %settings.devig_method,
            consensus = evaluator.consensus_name(),
            "Pricing engine ready"
        );

        Ok(Self { settings, cache, evaluator })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn consensus_name(&self) -> &'static str {
        self.evaluator.consensus_name()
    }

    /// Devig a two-sided market; `method` defaults to the configured one.
    pub fn devig(
        &self,
        market: &Market,
        method: Option<DevigMethod>,
    ) -> Result<DevigResult, PricingError> {
        devig(market, method.unwrap_or(self.settings.devig_method))
    }

    pub fn breakeven(&self, parlay_type: &str) -> Result<BreakevenResult, PricingError> {
        self.cache.get(parlay_type)
    }

    /// Every registered type with its breakeven, in registry order.
    pub fn parlay_types(&self) -> Arc<BreakevenTable> {
        self.cache.snapshot()
    }

    pub fn validate(
        &self,
        parlay_type: &str,
        legs: &[Leg],
        sharp_books: &[String],
    ) -> Result<ValidationReport, PricingError> {
        let breakeven = self.breakeven(parlay_type)?;
        check_selection(legs, sharp_books)?;
        Ok(self.evaluator.validate(legs, sharp_books, &breakeven))
    }

    pub fn find_ev_legs(
        &self,
        parlay_type: &str,
        legs: &[Leg],
        sharp_books: &[String],
    ) -> Result<Vec<EdgeResult>, PricingError> {
        let breakeven = self.breakeven(parlay_type)?;
        check_selection(legs, sharp_books)?;
        Ok(self.evaluator.find_ev_legs(legs, sharp_books, &breakeven))
    }

    /// Swap in a new registry. The current one stays if any table fails.
    pub fn reload_registry(&self, registry: ParlayRegistry) -> Result<(), PricingError> {
        self.cache.replace(registry)
    }
}

/// Edge checks need at least one leg and at least one named reference book.
fn check_selection(legs: &[Leg], sharp_books: &[String]) -> Result<(), PricingError> {
    if legs.is_empty() {
        return Err(PricingError::InvalidRequest(
            "legs must contain at least one leg".to_string(),
        ));
    }
    if sharp_books.iter().all(|b| b.trim().is_empty()) {
        return Err(PricingError::InvalidRequest(
            "sharp_books must name at least one reference book".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
