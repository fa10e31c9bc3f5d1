//! Ticket assembly from ranked candidates.

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use vol_desk_core::config::EngineConfig;
use vol_desk_core::hash::ticket_hash;
use vol_desk_core::portfolio::PortfolioState;
use vol_desk_core::signal::{EdgeScore, MarketSnapshot, RegimeSnapshot};
use vol_desk_core::sizing::{liquidity_score, recommend_size};
use vol_desk_core::ticket::{ExitRules, ScoreBreakdown, TicketState, TradeTicket};
use vol_desk_risk::gates::{evaluate_regime_gate, evaluate_risk_gate};
use vol_desk_strategy::builder::CandidateStructure;

/// Tickets returned per generation request unless the caller asks for fewer.
pub const DEFAULT_MAX_TICKETS: usize = 3;

/// Assembles `Proposed` tickets from ranked candidates.
///
/// Each ticket carries the canonical content hash, both gate reports as of
/// assembly time, default exit rules, and (when both gates pass) a
/// position-size recommendation. Truncates to `max_tickets`.
#[must_use]
pub fn assemble_tickets(
    candidates: Vec<CandidateStructure>,
    edge: &EdgeScore,
    snapshot: &RegimeSnapshot,
    portfolio: &PortfolioState,
    market: &MarketSnapshot,
    config: &EngineConfig,
    max_tickets: usize,
) -> Vec<TradeTicket> {
    let liquidity = liquidity_score(market.open_interest);

    candidates
        .into_iter()
        .take(max_tickets.max(1))
        .map(|candidate| {
            let regime_gate = evaluate_regime_gate(candidate.strategy, snapshot);
            let risk_gate = evaluate_risk_gate(
                &candidate.underlying,
                &candidate.legs,
                candidate.max_loss,
                portfolio,
                &config.gates,
            );

            let sizing = (regime_gate.passed && risk_gate.passed).then(|| {
                recommend_size(
                    edge.composite,
                    liquidity,
                    candidate.max_loss,
                    &config.sizing,
                )
            });

            let hash = ticket_hash(
                &candidate.underlying,
                candidate.strategy,
                &candidate.legs,
                candidate.expiry,
                candidate.credit_or_debit,
            );

            let ticket = TradeTicket {
                id: Uuid::new_v4(),
                hash,
                underlying: candidate.underlying,
                strategy: candidate.strategy,
                legs: candidate.legs,
                expiry: candidate.expiry,
                dte: candidate.dte,
                credit_or_debit: candidate.credit_or_debit,
                width: candidate.width,
                max_loss: candidate.max_loss,
                pop_estimate: candidate.pop_estimate,
                edge_score: edge.clone(),
                score_breakdown: ScoreBreakdown {
                    edge: edge.composite,
                    payoff: candidate.payoff_score,
                    safety: candidate.safety_score,
                    rank: candidate.rank,
                },
                regime_gate,
                risk_gate,
                exits: ExitRules::default(),
                sizing,
                state: TicketState::Proposed,
                created_at: Utc::now(),
            };
            debug!(
                ticket_id = %ticket.id,
                underlying = %ticket.underlying,
                strategy = %ticket.strategy,
                hash = %ticket.hash,
                "ticket assembled"
            );
            ticket
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;
    use vol_desk_core::signal::{
        CorrelationRegime, EdgeComponent, RiskAppetite, VolRegime,
    };
    use vol_desk_core::ticket::{Leg, OptionType, Side, StrategyKind};

    fn edge_score(composite: f64) -> EdgeScore {
        let mut components = BTreeMap::new();
        components.insert(EdgeComponent::IvRvSpread, composite);
        EdgeScore {
            components,
            composite,
        }
    }

    fn calm_regime() -> RegimeSnapshot {
        RegimeSnapshot {
            vol_regime: VolRegime::Expanding,
            correlation_regime: CorrelationRegime::Medium,
            risk_appetite: RiskAppetite::Neutral,
        }
    }

    fn spy_market() -> MarketSnapshot {
        MarketSnapshot {
            price: dec!(500),
            atm_iv: 0.18,
            realized_vol: 0.15,
            strike_interval: dec!(5),
            open_interest: 120_000,
        }
    }

    fn condor_candidate() -> CandidateStructure {
        let leg = |side, option_type, strike| Leg {
            side,
            option_type,
            strike,
            quantity: 1,
            delta: Some(0.15),
            vega: Some(0.08),
            gamma: Some(0.01),
        };
        CandidateStructure {
            underlying: "SPY".to_string(),
            strategy: StrategyKind::IronCondor,
            legs: vec![
                leg(Side::Buy, OptionType::Put, dec!(470)),
                leg(Side::Sell, OptionType::Put, dec!(475)),
                leg(Side::Sell, OptionType::Call, dec!(525)),
                leg(Side::Buy, OptionType::Call, dec!(530)),
            ],
            expiry: chrono::NaiveDate::from_ymd_opt(2026, 9, 18).unwrap(),
            dte: 43,
            credit_or_debit: dec!(1.20),
            width: dec!(5),
            max_loss: dec!(3.80),
            pop_estimate: 0.76,
            payoff_score: 0.24,
            safety_score: 0.49,
            rank: 0.55,
        }
    }

    #[test]
    fn assembled_ticket_is_proposed_with_populated_breakdown() {
        let config = EngineConfig::default();
        let tickets = assemble_tickets(
            vec![condor_candidate()],
            &edge_score(0.7),
            &calm_regime(),
            &PortfolioState::flat(dec!(100000)),
            &spy_market(),
            &config,
            3,
        );

        assert_eq!(tickets.len(), 1);
        let ticket = &tickets[0];
        assert_eq!(ticket.state, TicketState::Proposed);
        assert!(!ticket.hash.is_empty());
        assert!((ticket.score_breakdown.edge - 0.7).abs() < f64::EPSILON);
        assert!(ticket.score_breakdown.payoff > 0.0);
        assert!(ticket.score_breakdown.safety > 0.0);
        assert!(ticket.regime_gate.passed);
        assert!(ticket.risk_gate.passed);
        assert!(ticket.sizing.is_some());
    }

    #[test]
    fn sizing_is_withheld_when_a_gate_fails() {
        let config = EngineConfig::default();
        let stressed = RegimeSnapshot {
            vol_regime: VolRegime::Stressed,
            ..calm_regime()
        };
        let tickets = assemble_tickets(
            vec![condor_candidate()],
            &edge_score(0.7),
            &stressed,
            &PortfolioState::flat(dec!(100000)),
            &spy_market(),
            &config,
            3,
        );

        let ticket = &tickets[0];
        assert!(!ticket.regime_gate.passed);
        assert!(ticket.sizing.is_none());
        // gate failure does not block proposal, only approval
        assert_eq!(ticket.state, TicketState::Proposed);
    }

    #[test]
    fn identical_candidates_produce_identical_hashes_but_fresh_ids() {
        let config = EngineConfig::default();
        let tickets = assemble_tickets(
            vec![condor_candidate(), condor_candidate()],
            &edge_score(0.7),
            &calm_regime(),
            &PortfolioState::flat(dec!(100000)),
            &spy_market(),
            &config,
            3,
        );
        assert_eq!(tickets.len(), 2);
        assert_eq!(tickets[0].hash, tickets[1].hash);
        assert_ne!(tickets[0].id, tickets[1].id);
    }

    #[test]
    fn truncates_to_max_tickets() {
        let config = EngineConfig::default();
        let candidates = vec![
            condor_candidate(),
            condor_candidate(),
            condor_candidate(),
        ];
        let tickets = assemble_tickets(
            candidates,
            &edge_score(0.7),
            &calm_regime(),
            &PortfolioState::flat(dec!(100000)),
            &spy_market(),
            &config,
            2,
        );
        assert_eq!(tickets.len(), 2);
    }
}
