//! End-to-end tests against the public library API.

mod engine_flow;
mod pricing_properties;
