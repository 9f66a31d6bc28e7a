//! Payout tables and the binomial expected-payout model.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::types::PricingError;

/// Upper bound on parlay size. Keeps exponent arithmetic in `i32`.
pub const MAX_LEGS: u32 = 64;

/// Structural family of a payout table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParlayFamily {
    /// Several hit counts pay; fewer hits pay less.
    Flex,
    /// Only a clean sweep pays.
    Power,
}

impl fmt::Display for ParlayFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParlayFamily::Flex => write!(f, "flex"),
            ParlayFamily::Power => write!(f, "power"),
        }
    }
}

/// Hit count → payout multiplier for an `n`-leg parlay.
///
/// Invariants, checked on construction: every hit count is at most `legs`,
/// every multiplier is finite and non-negative, at least one multiplier is
/// positive, and multipliers never decrease as hits increase. Hit counts
/// without an entry pay nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayoutTable {
    legs: u32,
    payouts: BTreeMap<u32, f64>,
}

impl PayoutTable {
    pub fn new<I>(legs: u32, payouts: I) -> Result<Self, PricingError>
    where
        I: IntoIterator<Item = (u32, f64)>,
    {
        if legs == 0 || legs > MAX_LEGS {
            return Err(PricingError::InvalidPayoutTable(format!(
                "leg count must be between 1 and {MAX_LEGS}, got {legs}"
            )));
        }

        let mut map = BTreeMap::new();
        for (hits, multiplier) in payouts {
            if hits > legs {
                return Err(PricingError::InvalidPayoutTable(format!(
                    "{hits} hits listed for a {legs}-leg parlay"
                )));
            }
            if !multiplier.is_finite() || multiplier < 0.0 {
                return Err(PricingError::InvalidPayoutTable(format!(
                    "multiplier for {hits} hits must be a non-negative number, got {multiplier}"
                )));
            }
            if map.insert(hits, multiplier).is_some() {
                return Err(PricingError::InvalidPayoutTable(format!(
                    "hit count {hits} listed twice"
                )));
            }
        }

        let table = Self { legs, payouts: map };

        if table.nonzero_entries() == 0 {
            return Err(PricingError::InvalidPayoutTable(
                "at least one hit count must pay".to_string(),
            ));
        }
        for hits in 1..=legs {
            if table.payout(hits) < table.payout(hits - 1) {
                return Err(PricingError::InvalidPayoutTable(format!(
                    "{hits} hits pays {} but {} hits pays {}",
                    table.payout(hits),
                    hits - 1,
                    table.payout(hits - 1)
                )));
            }
        }

        Ok(table)
    }

    /// Total number of legs.
    pub fn legs(&self) -> u32 {
        self.legs
    }

    /// Multiplier paid for exactly `hits` correct legs.
    pub fn payout(&self, hits: u32) -> f64 {
        self.payouts.get(&hits).copied().unwrap_or(0.0)
    }

    /// Entries as listed, ordered by hit count.
    pub fn entries(&self) -> &BTreeMap<u32, f64> {
        &self.payouts
    }

    /// Multiplier for a clean sweep.
    pub fn top_multiplier(&self) -> f64 {
        self.payout(self.legs)
    }

    pub fn family(&self) -> ParlayFamily {
        if self.nonzero_entries() == 1 {
            ParlayFamily::Power
        } else {
            ParlayFamily::Flex
        }
    }

    /// A copy of this table with one multiplier replaced.
    pub fn with_payout(&self, hits: u32, multiplier: f64) -> Result<Self, PricingError> {
        let mut payouts = self.payouts.clone();
        payouts.insert(hits, multiplier);
        Self::new(self.legs, payouts)
    }

    fn nonzero_entries(&self) -> usize {
        self.payouts.values().filter(|m| **m > 0.0).count()
    }
}

impl fmt::Display for PayoutTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .payouts
            .iter()
            .rev()
            .filter(|(_, m)| **m > 0.0)
            .map(|(k, m)| format!("{k}/{}: {m}x", self.legs))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

// ---------------------------------------------------------------------------
// Binomial model
// ---------------------------------------------------------------------------

/// Binomial coefficient `C(n, k)`.
///
/// Exact integer arithmetic while the intermediate product fits in `u128`
/// (every n up to well past any parlay size); floating-point beyond.
pub fn binomial(n: u32, k: u32) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);

    let mut exact: u128 = 1;
    for i in 0..k {
        match exact.checked_mul(u128::from(n - i)) {
            // Divisible: the running product is C(n, i+1) * (i+1).
            Some(product) => exact = product / u128::from(i + 1),
            None => {
                return (0..k).fold(1.0, |acc, j| acc * f64::from(n - j) / f64::from(j + 1));
            }
        }
    }

    exact as f64
}

/// Expected payout multiplier when every leg independently hits with
/// probability `p`.
pub fn expected_payout(table: &PayoutTable, p: f64) -> f64 {
    let n = table.legs();
    table
        .entries()
        .iter()
        .filter(|(_, m)| **m > 0.0)
        .map(|(&k, &multiplier)| {
            binomial(n, k) * p.powi(k as i32) * (1.0 - p).powi((n - k) as i32) * multiplier
        })
        .sum()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
