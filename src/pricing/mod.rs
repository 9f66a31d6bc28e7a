//! Pricing primitives: odds conversion, root finding, and devigging.

pub mod devig;
pub mod odds;
pub mod root;

pub use devig::{devig, devig_probabilities, DevigResult, DevigWarning};
pub use odds::{odds_to_probability, probability_to_odds};
