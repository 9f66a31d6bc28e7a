//! SHARPLINE: Odds normalization, devig and parlay breakeven engine.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod pricing;
pub mod parlay;
pub mod strategy;
pub mod engine;
pub mod api;
