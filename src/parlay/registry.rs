//! Parlay type registry and the precomputed breakeven cache.
//!
//! The registry is plain configuration: an ordered, immutable list of
//! parlay types handed to the engine at construction. The cache solves
//! every registered type once and is only ever replaced whole.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

use super::breakeven::{self, BreakevenResult};
use super::payout::{ParlayFamily, PayoutTable};
use crate::types::PricingError;

// ---------------------------------------------------------------------------
// Parlay types
// ---------------------------------------------------------------------------

/// A named payout structure offered by a fixed-payout platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParlayType {
    pub id: String,
    pub table: PayoutTable,
}

impl ParlayType {
    pub fn new(id: impl Into<String>, table: PayoutTable) -> Self {
        Self { id: id.into(), table }
    }

    pub fn legs(&self) -> u32 {
        self.table.legs()
    }

    pub fn family(&self) -> ParlayFamily {
        self.table.family()
    }
}

/// Ordered set of known parlay types, keyed by id.
#[derive(Debug, Clone, PartialEq)]
pub struct ParlayRegistry {
    types: Vec<ParlayType>,
}

impl ParlayRegistry {
    /// Build a registry, rejecting an empty list and blank or duplicate ids.
    pub fn new(types: Vec<ParlayType>) -> Result<Self, PricingError> {
        let mut seen = HashMap::new();
        for (i, parlay) in types.iter().enumerate() {
            if parlay.id.trim().is_empty() {
                return Err(PricingError::InvalidPayoutTable(format!(
                    "parlay type #{} has a blank id",
                    i + 1
                )));
            }
            if seen.insert(parlay.id.as_str(), i).is_some() {
                return Err(PricingError::InvalidPayoutTable(format!(
                    "parlay type {} registered twice",
                    parlay.id
                )));
            }
        }
        let registry = Self { types };
        if registry.is_empty() {
            return Err(PricingError::InvalidPayoutTable(
                "a registry needs at least one parlay type".to_string(),
            ));
        }
        Ok(registry)
    }

    /// The PrizePicks-style tables the platform sells.
    pub fn standard() -> Result<Self, PricingError> {
        Self::new(vec![
            ParlayType::new(
                "5-pick-flex",
                PayoutTable::new(5, [(5, 10.0), (4, 2.0), (3, 0.4)])?,
            ),
            ParlayType::new(
                "6-pick-flex",
                PayoutTable::new(6, [(6, 25.0), (5, 2.0), (4, 0.4)])?,
            ),
            ParlayType::new("3-pick-flex", PayoutTable::new(3, [(3, 2.25), (2, 1.25)])?),
            ParlayType::new("2-pick-power", PayoutTable::new(2, [(2, 3.0)])?),
        ])
    }

    pub fn get(&self, id: &str) -> Result<&ParlayType, PricingError> {
        self.types
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| PricingError::UnknownParlayType {
                id: id.to_string(),
                valid: self.ids(),
            })
    }

    pub fn ids(&self) -> Vec<String> {
        self.types.iter().map(|p| p.id.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParlayType> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Breakeven cache
// ---------------------------------------------------------------------------

/// Every registered type with its solved breakeven, in registry order.
#[derive(Debug, Clone)]
pub struct BreakevenTable {
    registry: ParlayRegistry,
    results: Vec<BreakevenResult>,
    index: HashMap<String, usize>,
    built_at: DateTime<Utc>,
}

impl BreakevenTable {
    /// Solve every type in `registry`. Fails on the first table without a
    /// breakeven, so a bad configuration is caught up front.
    pub fn build(registry: ParlayRegistry) -> Result<Self, PricingError> {
        let results = registry
            .iter()
            .map(breakeven::solve)
            .collect::<Result<Vec<_>, _>>()?;
        let index = results
            .iter()
            .enumerate()
            .map(|(i, r)| (r.parlay_type.clone(), i))
            .collect();

        Ok(Self {
            registry,
            results,
            index,
            built_at: Utc::now(),
        })
    }

    pub fn get(&self, id: &str) -> Result<&BreakevenResult, PricingError> {
        self.index
            .get(id)
            .map(|&i| &self.results[i])
            .ok_or_else(|| PricingError::UnknownParlayType {
                id: id.to_string(),
                valid: self.registry.ids(),
            })
    }

    pub fn results(&self) -> &[BreakevenResult] {
        &self.results
    }

    pub fn registry(&self) -> &ParlayRegistry {
        &self.registry
    }

    /// When this table was solved.
    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }
}

/// Read-mostly holder for the current [`BreakevenTable`].
///
/// Readers take a cheap `Arc` snapshot; [`BreakevenCache::replace`] builds
/// the new table completely before swapping it in.
#[derive(Debug)]
pub struct BreakevenCache {
    current: RwLock<Arc<BreakevenTable>>,
}

impl BreakevenCache {
    pub fn new(registry: ParlayRegistry) -> Result<Self, PricingError> {
        let table = BreakevenTable::build(registry)?;
        info!(parlay_types = table.results.len(), "Breakeven cache built");
        Ok(Self { current: RwLock::new(Arc::new(table)) })
    }

    pub fn snapshot(&self) -> Arc<BreakevenTable> {
        // Readers only clone the Arc, so a poisoned lock still holds a whole table.
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn get(&self, id: &str) -> Result<BreakevenResult, PricingError> {
        self.snapshot().get(id).cloned()
    }

    /// Swap in a new registry. On error the current table stays in place.
    pub fn replace(&self, registry: ParlayRegistry) -> Result<(), PricingError> {
        let table = Arc::new(BreakevenTable::build(registry)?);
        let count = table.results.len();
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = table;
        info!(parlay_types = count, "Breakeven cache replaced");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
