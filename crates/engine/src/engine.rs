//! Engine orchestration.

use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use vol_desk_core::config::EngineConfig;
use vol_desk_core::errors::EngineError;
use vol_desk_core::ticket::{AuditEntry, Bias, TradeConstraints, TradeTicket};
use vol_desk_core::traits::{PortfolioSource, SignalAggregator};
use vol_desk_ledger::factory::{assemble_tickets, DEFAULT_MAX_TICKETS};
use vol_desk_ledger::ledger::{LedgerOutcome, TicketLedger};
use vol_desk_signals::scorer::score_edge;
use vol_desk_strategy::builder::build_candidates;

/// Decision engine over pluggable signal and portfolio collaborators.
///
/// Generation (scoring, building, gating) is pure per-underlying work and
/// can run concurrently across engines or underlyings; the owned ledger is
/// the single point of shared mutable state.
pub struct TradeEngine<S, P> {
    signals: S,
    portfolio: P,
    config: EngineConfig,
    ledger: TicketLedger,
}

impl<S: SignalAggregator, P: PortfolioSource> TradeEngine<S, P> {
    #[must_use]
    pub fn new(signals: S, portfolio: P, config: EngineConfig) -> Self {
        let ledger = TicketLedger::new(config.gates.clone());
        Self {
            signals,
            portfolio,
            config,
            ledger,
        }
    }

    /// Default constraints for a generation request: 30 DTE, $5 premium
    /// budget, up to three tickets.
    #[must_use]
    pub fn default_constraints(bias: Bias) -> TradeConstraints {
        TradeConstraints {
            bias,
            dte_target: 30,
            max_premium: Decimal::from(5),
            max_tickets: DEFAULT_MAX_TICKETS,
        }
    }

    /// Generates scored, gated, `Proposed` tickets for one underlying.
    ///
    /// Identical economics re-proposed in the same ledger epoch return the
    /// existing ticket rather than a duplicate.
    ///
    /// # Errors
    /// `Validation` for malformed constraints, `Computation` for non-finite
    /// scoring inputs, `Source` when a collaborator fails. Nothing is
    /// persisted on error.
    pub async fn generate(
        &self,
        underlying: &str,
        constraints: &TradeConstraints,
    ) -> Result<Vec<TradeTicket>, EngineError> {
        constraints.validate()?;

        let inputs = self.signals.edge_inputs(underlying).await?;
        let snapshot = self.signals.regime_snapshot().await?;
        let market = self.signals.market_snapshot(underlying).await?;
        let portfolio = self.portfolio.portfolio_state().await?;

        let edge = score_edge(&inputs, &self.config.edge)?;
        let candidates = build_candidates(
            underlying,
            constraints,
            &market,
            edge.composite,
            &self.config.strategy,
        )?;
        let tickets = assemble_tickets(
            candidates,
            &edge,
            &snapshot,
            &portfolio,
            &market,
            &self.config,
            constraints.max_tickets,
        );

        info!(
            underlying,
            bias = ?constraints.bias,
            edge = edge.composite,
            tickets = tickets.len(),
            "generation complete"
        );
        Ok(tickets
            .into_iter()
            .map(|t| self.ledger.propose(t))
            .collect())
    }

    /// Approves a ticket, re-checking both gates against the *current*
    /// regime and portfolio state (refreshed here, before the ledger lock).
    ///
    /// # Errors
    /// `NotFound`, `GateBlocked`, or `Source` on collaborator failure.
    pub async fn approve(
        &self,
        ticket_id: Uuid,
        actor: &str,
    ) -> Result<LedgerOutcome, EngineError> {
        let snapshot = self.signals.regime_snapshot().await?;
        let portfolio = self.portfolio.portfolio_state().await?;
        self.ledger.approve(ticket_id, actor, &snapshot, &portfolio)
    }

    /// Rejects a ticket with a verbatim reason. Always permitted.
    ///
    /// # Errors
    /// `NotFound` for an unknown id.
    pub async fn reject(
        &self,
        ticket_id: Uuid,
        reason: &str,
        actor: &str,
    ) -> Result<LedgerOutcome, EngineError> {
        self.ledger.reject(ticket_id, reason, actor)
    }

    /// The audit trail, chronologically ordered.
    #[must_use]
    pub fn audit_log(&self) -> Vec<AuditEntry> {
        self.ledger.audit_log()
    }

    /// Tickets still awaiting a decision, newest first.
    #[must_use]
    pub fn pending(&self) -> Vec<TradeTicket> {
        self.ledger.pending()
    }

    /// Fetches one ticket by id.
    #[must_use]
    pub fn get(&self, ticket_id: Uuid) -> Option<TradeTicket> {
        self.ledger.get(ticket_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use vol_desk_core::portfolio::PortfolioState;
    use vol_desk_core::signal::{EdgeInputs, MarketSnapshot, RegimeSnapshot};
    use vol_desk_core::ticket::TicketState;
    use vol_desk_signals::demo::{DemoPortfolio, DemoSignalSource};

    fn demo_engine() -> TradeEngine<DemoSignalSource, DemoPortfolio> {
        TradeEngine::new(DemoSignalSource, DemoPortfolio, EngineConfig::default())
    }

    #[tokio::test]
    async fn generate_produces_proposed_tickets() {
        let engine = demo_engine();
        let constraints = TradeEngine::<DemoSignalSource, DemoPortfolio>::default_constraints(
            Bias::Neutral,
        );
        let tickets = engine.generate("SPY", &constraints).await.unwrap();

        assert!(!tickets.is_empty());
        assert!(tickets.len() <= constraints.max_tickets);
        for ticket in &tickets {
            assert_eq!(ticket.state, TicketState::Proposed);
            assert!(!ticket.hash.is_empty());
            assert!((0.0..=1.0).contains(&ticket.edge_score.composite));
            assert!(engine.get(ticket.id).is_some());
        }
    }

    #[tokio::test]
    async fn regenerate_returns_the_same_tickets() {
        let engine = demo_engine();
        let constraints = TradeEngine::<DemoSignalSource, DemoPortfolio>::default_constraints(
            Bias::Neutral,
        );
        let first = engine.generate("SPY", &constraints).await.unwrap();
        let second = engine.generate("SPY", &constraints).await.unwrap();

        assert_eq!(first.len(), second.len());
        let mut first_ids: Vec<Uuid> = first.iter().map(|t| t.id).collect();
        let mut second_ids: Vec<Uuid> = second.iter().map(|t| t.id).collect();
        first_ids.sort();
        second_ids.sort();
        assert_eq!(first_ids, second_ids, "idempotent propose must dedup");
        assert_eq!(engine.pending().len(), first.len());
    }

    #[tokio::test]
    async fn full_lifecycle_approve_then_retry() {
        let engine = demo_engine();
        let constraints = TradeEngine::<DemoSignalSource, DemoPortfolio>::default_constraints(
            Bias::Neutral,
        );
        let tickets = engine.generate("SPY", &constraints).await.unwrap();
        let id = tickets[0].id;

        let outcome = engine.approve(id, "desk").await.unwrap();
        assert!(outcome.committed());
        assert_eq!(engine.audit_log().len(), 1);

        let retry = engine.approve(id, "desk").await.unwrap();
        assert!(!retry.committed());
        assert_eq!(retry.ticket().state, TicketState::Approved);
        assert_eq!(engine.audit_log().len(), 1);
    }

    #[tokio::test]
    async fn reject_records_reason_and_clears_pending() {
        let engine = demo_engine();
        let constraints = TradeEngine::<DemoSignalSource, DemoPortfolio>::default_constraints(
            Bias::Bullish,
        );
        let tickets = engine.generate("SPY", &constraints).await.unwrap();
        let id = tickets[0].id;
        let pending_before = engine.pending().len();

        engine.reject(id, "too rich", "desk").await.unwrap();
        assert_eq!(engine.pending().len(), pending_before - 1);

        let audit = engine.audit_log();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].reason.as_deref(), Some("too rich"));
    }

    #[tokio::test]
    async fn invalid_constraints_surface_before_any_io() {
        let engine = demo_engine();
        let bad = TradeConstraints {
            bias: Bias::Neutral,
            dte_target: -5,
            max_premium: dec!(5),
            max_tickets: 3,
        };
        let err = engine.generate("SPY", &bad).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert!(engine.pending().is_empty());
    }

    #[tokio::test]
    async fn approve_unknown_ticket_is_not_found() {
        let engine = demo_engine();
        let err = engine.approve(Uuid::new_v4(), "desk").await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn generation_runs_concurrently_across_underlyings() {
        use std::sync::Arc;

        let engine = Arc::new(demo_engine());
        let mut handles = Vec::new();
        for underlying in ["SPY", "QQQ", "IWM"] {
            let engine = Arc::clone(&engine);
            handles.push(tokio::spawn(async move {
                let constraints =
                    TradeEngine::<DemoSignalSource, DemoPortfolio>::default_constraints(
                        Bias::Neutral,
                    );
                engine.generate(underlying, &constraints).await
            }));
        }
        for handle in handles {
            let tickets = handle.await.unwrap().unwrap();
            assert!(!tickets.is_empty());
        }
        assert!(engine.pending().len() >= 3);
    }

    struct FailingSource;

    #[async_trait]
    impl SignalAggregator for FailingSource {
        async fn edge_inputs(&self, _underlying: &str) -> anyhow::Result<EdgeInputs> {
            Err(anyhow!("feed is down"))
        }
        async fn regime_snapshot(&self) -> anyhow::Result<RegimeSnapshot> {
            Err(anyhow!("feed is down"))
        }
        async fn market_snapshot(&self, _underlying: &str) -> anyhow::Result<MarketSnapshot> {
            Err(anyhow!("feed is down"))
        }
    }

    struct FlatPortfolio;

    #[async_trait]
    impl PortfolioSource for FlatPortfolio {
        async fn portfolio_state(&self) -> anyhow::Result<PortfolioState> {
            Ok(PortfolioState::flat(dec!(100000)))
        }
    }

    #[tokio::test]
    async fn collaborator_failure_maps_to_source_error() {
        let engine = TradeEngine::new(FailingSource, FlatPortfolio, EngineConfig::default());
        let constraints = TradeEngine::<FailingSource, FlatPortfolio>::default_constraints(
            Bias::Neutral,
        );
        let err = engine.generate("SPY", &constraints).await.unwrap_err();
        assert!(matches!(err, EngineError::Source(_)));
        assert!(engine.pending().is_empty());
    }
}
