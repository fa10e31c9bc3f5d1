//! Policy gates for trade approval.
//!
//! Two independent, pure, re-evaluable checks:
//! - the regime gate asks whether the current market regime permits the
//!   strategy family at all;
//! - the risk gate asks whether adding the structure breaches portfolio
//!   limits, and reports projected greeks around the hypothetical fill.
//!
//! Both take state by reference and never mutate it, so the ledger can
//! re-run them at approval time against the current book.

pub mod gates;

pub use gates::{evaluate_regime_gate, evaluate_risk_gate};
