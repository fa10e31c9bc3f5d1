//! The trade-ticket decision engine facade.
//!
//! Wires the scorer, builder, gates, factory, and ledger behind four
//! operations: `generate`, `approve`, `reject`, `audit_log`. Collaborator
//! I/O (signals, portfolio state) always completes before the ledger
//! critical section is entered.

pub mod engine;

pub use engine::TradeEngine;
