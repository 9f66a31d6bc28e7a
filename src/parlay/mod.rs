//! Parlay payout structures and breakeven solving.

pub mod breakeven;
pub mod payout;
pub mod registry;

pub use breakeven::{solve, solve_table, BreakevenResult};
pub use payout::{binomial, expected_payout, ParlayFamily, PayoutTable};
pub use registry::{BreakevenCache, BreakevenTable, ParlayRegistry, ParlayType};
