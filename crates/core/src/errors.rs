//! Typed errors surfaced by the decision engine.

use thiserror::Error;
use uuid::Uuid;

/// Errors visible to callers of the engine and ledger.
///
/// `AlreadyResolved` is deliberately NOT an error: retried approve/reject
/// calls on a terminal ticket return the prior outcome via
/// `LedgerOutcome::AlreadyResolved`.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed constraints; rejected before any ticket is created.
    #[error("invalid trade constraints: {0}")]
    Validation(String),

    /// A scoring component produced a non-finite value; fail fast, nothing
    /// persisted.
    #[error("edge component {component} produced a non-finite score ({value})")]
    Computation { component: String, value: f64 },

    /// Non-fatal: the ticket remains `Proposed`; approval is currently
    /// impossible for the listed reasons.
    #[error("approval blocked: {}", .reasons.join("; "))]
    GateBlocked { reasons: Vec<String> },

    #[error("ticket {0} not found")]
    NotFound(Uuid),

    /// A collaborator (signal aggregator, portfolio source) failed.
    #[error("collaborator failure: {0}")]
    Source(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_blocked_lists_every_reason() {
        let err = EngineError::GateBlocked {
            reasons: vec![
                "portfolio_vega_exceeds_limit".to_string(),
                "weekly loss budget exhausted".to_string(),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("portfolio_vega_exceeds_limit"));
        assert!(msg.contains("weekly loss budget exhausted"));
    }

    #[test]
    fn not_found_includes_id() {
        let id = Uuid::new_v4();
        assert!(EngineError::NotFound(id).to_string().contains(&id.to_string()));
    }
}
