//! Edge scoring for defined-risk vol strategies.
//!
//! Converts a pre-normalized signal bundle into a composite edge score with
//! a per-component breakdown. Scoring is pure; the demo source provides a
//! deterministic `SignalAggregator` for the CLI and integration tests.

pub mod demo;
pub mod scorer;

pub use demo::{DemoPortfolio, DemoSignalSource};
pub use scorer::score_edge;
