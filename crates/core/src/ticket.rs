//! Trade ticket data model.
//!
//! Every proposed structure is wrapped in a [`TradeTicket`] so the risk gate
//! can evaluate its incremental impact on the portfolio and the ledger can
//! manage its propose → approve/reject lifecycle.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::EngineError;
use crate::portfolio::GreeksExposure;
use crate::signal::{CorrelationRegime, EdgeScore, RegimeSnapshot, RiskAppetite, VolRegime};
use crate::sizing::SizeRecommendation;

/// Order side of a leg.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

/// Option right of a leg.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Put => "put",
        }
    }
}

/// A single option leg within a trade ticket.
///
/// Per-leg greeks are estimates supplied by the builder (the real pricing
/// utility is an external collaborator); the risk gate consumes them when
/// projecting the hypothetical post-fill book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leg {
    pub side: Side,
    pub option_type: OptionType,
    pub strike: Decimal,
    pub quantity: u32,
    pub delta: Option<f64>,
    pub vega: Option<f64>,
    pub gamma: Option<f64>,
}

impl Leg {
    /// Greeks contribution of this leg: buy adds, sell subtracts.
    #[must_use]
    pub fn signed_greeks(&self) -> GreeksExposure {
        let sign = match self.side {
            Side::Buy => 1.0,
            Side::Sell => -1.0,
        };
        let qty = f64::from(self.quantity);
        GreeksExposure {
            delta: sign * qty * self.delta.unwrap_or(0.0),
            vega: sign * qty * self.vega.unwrap_or(0.0),
            gamma: sign * qty * self.gamma.unwrap_or(0.0),
        }
    }
}

/// Aggregate greeks across a set of legs.
#[must_use]
pub fn combined_greeks(legs: &[Leg]) -> GreeksExposure {
    legs.iter()
        .map(Leg::signed_greeks)
        .fold(GreeksExposure::default(), |acc, g| acc + g)
}

/// Directional bias requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

impl FromStr for Bias {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bullish" => Ok(Self::Bullish),
            "bearish" => Ok(Self::Bearish),
            "neutral" => Ok(Self::Neutral),
            other => Err(EngineError::Validation(format!(
                "unknown bias '{other}' (expected bullish, bearish, or neutral)"
            ))),
        }
    }
}

/// Strategy family. Each variant knows its wire label, premium direction,
/// and which regimes it is permitted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    BullCallSpread,
    BearPutSpread,
    IronCondor,
}

impl StrategyKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::BullCallSpread => "bull_call_spread",
            Self::BearPutSpread => "bear_put_spread",
            Self::IronCondor => "iron_condor",
        }
    }

    /// True when the structure collects premium (short vol).
    #[must_use]
    pub const fn is_credit(self) -> bool {
        matches!(self, Self::IronCondor)
    }

    #[must_use]
    pub const fn is_directional(self) -> bool {
        !matches!(self, Self::IronCondor)
    }

    /// Regime objections for this strategy family; empty when permitted.
    #[must_use]
    pub fn regime_objections(self, regime: &RegimeSnapshot) -> Vec<String> {
        let mut reasons = Vec::new();
        match self {
            Self::IronCondor => {
                if regime.vol_regime == VolRegime::Stressed {
                    reasons.push(
                        "short-vol structure disallowed in stressed vol regime".to_string(),
                    );
                }
                if regime.correlation_regime == CorrelationRegime::High {
                    reasons.push(
                        "short-vol structure disallowed under high cross-asset correlation"
                            .to_string(),
                    );
                }
            }
            Self::BullCallSpread | Self::BearPutSpread => {
                if regime.risk_appetite == RiskAppetite::RiskOff {
                    reasons.push(
                        "directional spread disallowed while risk appetite is risk-off"
                            .to_string(),
                    );
                }
            }
        }
        reasons
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Caller-supplied generation constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeConstraints {
    pub bias: Bias,
    /// Target days to expiry.
    pub dte_target: i64,
    /// Worst-case loss budget per structure (per share).
    pub max_premium: Decimal,
    /// Maximum number of tickets to return.
    pub max_tickets: usize,
}

impl TradeConstraints {
    /// Validates the constraints before any ticket is created.
    ///
    /// # Errors
    /// Returns `EngineError::Validation` for non-positive premium or DTE, or
    /// a zero ticket cap.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.max_premium <= Decimal::ZERO {
            return Err(EngineError::Validation(format!(
                "max_premium must be positive, got {}",
                self.max_premium
            )));
        }
        if self.dte_target <= 0 {
            return Err(EngineError::Validation(format!(
                "dte_target must be positive, got {}",
                self.dte_target
            )));
        }
        if self.max_tickets == 0 {
            return Err(EngineError::Validation(
                "max_tickets must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Ticket lifecycle state. `Proposed` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketState {
    Proposed,
    Approved,
    Rejected,
}

impl TicketState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Proposed)
    }
}

/// Pass/fail result of a policy gate with one reason per failing predicate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateReport {
    pub passed: bool,
    pub reasons: Vec<String>,
}

impl GateReport {
    #[must_use]
    pub fn from_reasons(reasons: Vec<String>) -> Self {
        Self {
            passed: reasons.is_empty(),
            reasons,
        }
    }
}

/// Risk gate result with projected portfolio greeks around the hypothetical fill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskGateReport {
    pub passed: bool,
    pub reasons: Vec<String>,
    pub before: GreeksExposure,
    pub after: GreeksExposure,
}

/// Blended candidate score used for ranking.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Composite edge score.
    pub edge: f64,
    /// Credit/width or squashed reward:risk.
    pub payoff: f64,
    /// Short-strike distance in expected-move units, squashed to [0, 1).
    pub safety: f64,
    /// Weighted blend of the three.
    pub rank: f64,
}

/// Default exit rules attached to every ticket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExitRules {
    /// Close at this percentage of max profit (e.g. 50.0).
    pub take_profit_pct: f64,
    /// Stop out at this multiple of credit received / debit paid.
    pub stop_loss_multiple: f64,
    /// Close regardless within this many days of expiry.
    pub time_stop_days: i64,
}

impl Default for ExitRules {
    fn default() -> Self {
        Self {
            take_profit_pct: 50.0,
            stop_loss_multiple: 2.0,
            time_stop_days: 21,
        }
    }
}

/// A fully-assembled trade ticket.
///
/// Created once by the factory in `Proposed` state; mutated only by the
/// ledger's approve/reject transitions; retained indefinitely for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeTicket {
    pub id: Uuid,
    /// Canonical content hash; the idempotent deduplication key.
    pub hash: String,
    pub underlying: String,
    pub strategy: StrategyKind,
    pub legs: Vec<Leg>,
    pub expiry: NaiveDate,
    pub dte: i64,
    /// Premium magnitude (per share); credit vs debit implied by the strategy.
    pub credit_or_debit: Decimal,
    /// Distance between paired strikes.
    pub width: Decimal,
    /// Worst-case loss (per share, positive).
    pub max_loss: Decimal,
    /// Probability-of-profit estimate in [0, 1].
    pub pop_estimate: f64,
    pub edge_score: EdgeScore,
    pub score_breakdown: ScoreBreakdown,
    pub regime_gate: GateReport,
    pub risk_gate: RiskGateReport,
    pub exits: ExitRules,
    /// Present only when both gates passed at proposal time.
    pub sizing: Option<SizeRecommendation>,
    pub state: TicketState,
    pub created_at: DateTime<Utc>,
}

/// Action recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    Approved,
    Rejected,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approved => f.write_str("approved"),
            Self::Rejected => f.write_str("rejected"),
        }
    }
}

/// One immutable audit record per committed state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub ticket_id: Uuid,
    pub ticket_hash: String,
    pub action: AuditAction,
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub actor: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn leg(side: Side, option_type: OptionType, strike: Decimal, delta: f64) -> Leg {
        Leg {
            side,
            option_type,
            strike,
            quantity: 1,
            delta: Some(delta),
            vega: Some(0.10),
            gamma: Some(0.02),
        }
    }

    #[test]
    fn signed_greeks_flip_on_sell() {
        let long = leg(Side::Buy, OptionType::Call, dec!(500), 0.5);
        let short = leg(Side::Sell, OptionType::Call, dec!(505), 0.4);

        assert!((long.signed_greeks().delta - 0.5).abs() < f64::EPSILON);
        assert!((short.signed_greeks().delta - -0.4).abs() < f64::EPSILON);

        let spread = combined_greeks(&[long, short]);
        assert!((spread.delta - 0.1).abs() < 1e-12);
        assert!((spread.vega - 0.0).abs() < 1e-12);
    }

    #[test]
    fn bias_parses_case_insensitively() {
        assert_eq!("Bullish".parse::<Bias>().unwrap(), Bias::Bullish);
        assert_eq!("NEUTRAL".parse::<Bias>().unwrap(), Bias::Neutral);
        assert!(matches!(
            "sideways".parse::<Bias>(),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn constraints_reject_bad_inputs() {
        let good = TradeConstraints {
            bias: Bias::Neutral,
            dte_target: 30,
            max_premium: dec!(5),
            max_tickets: 3,
        };
        assert!(good.validate().is_ok());

        let negative_premium = TradeConstraints {
            max_premium: dec!(-1),
            ..good.clone()
        };
        assert!(matches!(
            negative_premium.validate(),
            Err(EngineError::Validation(_))
        ));

        let zero_dte = TradeConstraints {
            dte_target: 0,
            ..good.clone()
        };
        assert!(matches!(zero_dte.validate(), Err(EngineError::Validation(_))));

        let no_tickets = TradeConstraints {
            max_tickets: 0,
            ..good
        };
        assert!(matches!(
            no_tickets.validate(),
            Err(EngineError::Validation(_))
        ));
    }

    #[test]
    fn terminal_states() {
        assert!(!TicketState::Proposed.is_terminal());
        assert!(TicketState::Approved.is_terminal());
        assert!(TicketState::Rejected.is_terminal());
    }

    #[test]
    fn condor_objections_in_stressed_regime() {
        let regime = RegimeSnapshot {
            vol_regime: VolRegime::Stressed,
            correlation_regime: CorrelationRegime::High,
            risk_appetite: RiskAppetite::Neutral,
        };
        let reasons = StrategyKind::IronCondor.regime_objections(&regime);
        assert_eq!(reasons.len(), 2);

        let calm = RegimeSnapshot {
            vol_regime: VolRegime::Expanding,
            correlation_regime: CorrelationRegime::Medium,
            risk_appetite: RiskAppetite::Neutral,
        };
        assert!(StrategyKind::IronCondor.regime_objections(&calm).is_empty());
    }

    #[test]
    fn directional_objections_when_risk_off() {
        let risk_off = RegimeSnapshot {
            vol_regime: VolRegime::Expanding,
            correlation_regime: CorrelationRegime::Low,
            risk_appetite: RiskAppetite::RiskOff,
        };
        assert_eq!(
            StrategyKind::BullCallSpread.regime_objections(&risk_off).len(),
            1
        );
        assert_eq!(
            StrategyKind::BearPutSpread.regime_objections(&risk_off).len(),
            1
        );
        assert!(StrategyKind::IronCondor.regime_objections(&risk_off).is_empty());
    }
}
