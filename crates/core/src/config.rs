//! Engine configuration.
//!
//! Defaults mirror the production desk settings; everything is overridable
//! through the figment loader (`config/VolDesk.toml` + `VOL_DESK_*` env).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub edge: EdgeConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub gates: GateLimits,
    #[serde(default)]
    pub sizing: SizingConfig,
}

/// Edge component weights. Must sum to 1.0 when all components are present;
/// missing components renormalize over the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeWeights {
    pub iv_rv_spread: f64,
    pub term_structure: f64,
    pub skew_dislocation: f64,
    pub dealer_gamma: f64,
    pub event_proximity: f64,
}

impl Default for EdgeWeights {
    fn default() -> Self {
        Self {
            iv_rv_spread: 0.30,
            term_structure: 0.20,
            skew_dislocation: 0.20,
            dealer_gamma: 0.15,
            event_proximity: 0.15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeConfig {
    #[serde(default)]
    pub weights: EdgeWeights,
    /// IV/RV ratio above which vol is considered rich.
    pub iv_rv_rich_threshold: f64,
    /// IV/RV ratio below which vol is considered cheap.
    pub iv_rv_cheap_threshold: f64,
    /// Put-call skew spread considered elevated.
    pub skew_elevated_threshold: f64,
    /// Negative skew spread considered inverted.
    pub skew_inverted_threshold: f64,
    /// Days-to-event at or below which proximity scores worst.
    pub event_blackout_days: i64,
    /// Days-to-event at or above which proximity scores best.
    pub event_comfort_days: i64,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            weights: EdgeWeights::default(),
            iv_rv_rich_threshold: 1.15,
            iv_rv_cheap_threshold: 0.90,
            skew_elevated_threshold: 0.08,
            skew_inverted_threshold: -0.03,
            event_blackout_days: 3,
            event_comfort_days: 14,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Protective wing width for iron condors (dollars of strike distance).
    pub wing_width: Decimal,
    /// Short-strike distance from spot for condors, as a fraction of price.
    pub condor_short_distance_pct: f64,
    /// Directional spreads are generated at 1..=N strike intervals wide.
    pub max_spread_intervals: u32,
    /// Ranking blend weights.
    pub rank_edge_weight: f64,
    pub rank_payoff_weight: f64,
    pub rank_safety_weight: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            wing_width: Decimal::from(5),
            condor_short_distance_pct: 0.05,
            max_spread_intervals: 3,
            rank_edge_weight: 0.5,
            rank_payoff_weight: 0.3,
            rank_safety_weight: 0.2,
        }
    }
}

/// Portfolio-risk policy limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateLimits {
    /// Max risk per trade as % of equity.
    pub max_trade_risk_pct: f64,
    /// Max weekly sum of worst-case losses as % of equity.
    pub max_weekly_loss_pct: f64,
    /// Weekly realized drawdown kill switch as % of equity.
    pub kill_switch_drawdown_pct: f64,
    /// Post-fill absolute exposure limits.
    pub max_portfolio_delta: f64,
    pub max_portfolio_vega: f64,
    pub max_portfolio_gamma: f64,
    /// Max concurrent open tickets per underlying.
    pub max_open_per_underlying: usize,
}

impl Default for GateLimits {
    fn default() -> Self {
        Self {
            max_trade_risk_pct: 1.5,
            max_weekly_loss_pct: 5.0,
            kill_switch_drawdown_pct: 3.0,
            max_portfolio_delta: 50.0,
            max_portfolio_vega: 150.0,
            max_portfolio_gamma: 5.0,
            max_open_per_underlying: 3,
        }
    }
}

/// Position sizing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingConfig {
    /// Base dollar risk per full-conviction trade.
    pub base_risk: Decimal,
    /// Edge score mapped to 1.0 at this value.
    pub max_edge: f64,
    /// Liquidity floor to avoid zero sizing.
    pub min_liquidity_score: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            base_risk: Decimal::from(10_000),
            max_edge: 1.0,
            min_liquidity_score: 0.1,
        }
    }
}
