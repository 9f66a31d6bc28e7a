//! Strategy layer: combine reference books into a consensus, classify
//! parlay legs as +EV or -EV against a breakeven threshold, and compare
//! point lines across books.

pub mod comparison;
pub mod consensus;
pub mod edge;

pub use comparison::{
    compare_lines, find_discrepancies, BookLine, Discrepancy, DiscrepancyQuery, LineComparison,
    LineFilter, PropLine,
};
pub use consensus::{
    ConsensusKind, ConsensusStrategy, MeanConsensus, MedianConsensus, ReferenceProbability,
    WeightedConsensus,
};
pub use edge::{
    EdgeEvaluator, EdgeResult, Leg, ReferenceQuote, ValidationReport, ValidationSummary,
};
