//! Signal-side data model: edge inputs, edge scores, and market regime.
//!
//! `EdgeInputs` is supplied by the external signal aggregator; each field is
//! pre-normalized to its own documented convention. The scorer turns the
//! bundle into an [`EdgeScore`] with a per-component breakdown.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-underlying signal bundle consumed by the edge scorer.
///
/// Conventions:
/// - `iv_rv_ratio`: implied vol / realized vol, ~1.0 neutral
/// - `term_slope`: [-1, 1], positive = contango
/// - `skew_spread`: put-call skew spread, positive = put skew elevated
/// - `dealer_gamma`: [-1, 1] proxy, positive = dealers long gamma
/// - `days_to_event`: calendar days to the next known macro/earnings event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeInputs {
    pub underlying: String,
    pub iv_rv_ratio: Option<f64>,
    pub term_slope: Option<f64>,
    pub skew_spread: Option<f64>,
    pub dealer_gamma: Option<f64>,
    pub days_to_event: Option<i64>,
}

/// Named edge component. Ordered so score breakdowns serialize stably.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EdgeComponent {
    IvRvSpread,
    TermStructure,
    SkewDislocation,
    DealerGamma,
    EventProximity,
}

impl EdgeComponent {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::IvRvSpread => "iv_rv_spread",
            Self::TermStructure => "term_structure",
            Self::SkewDislocation => "skew_dislocation",
            Self::DealerGamma => "dealer_gamma",
            Self::EventProximity => "event_proximity",
        }
    }
}

impl std::fmt::Display for EdgeComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Composite edge score with component breakdown.
///
/// `composite` is always in [0, 1]. Components missing from the input are
/// absent from the map; their weight is renormalized over the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeScore {
    pub components: BTreeMap<EdgeComponent, f64>,
    pub composite: f64,
}

/// Volatility regime classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolRegime {
    /// Vol percentile in the bottom quartile.
    Compressed,
    /// Mid-range vol.
    Expanding,
    /// Vol percentile in the top quartile.
    Stressed,
}

/// Cross-asset correlation regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorrelationRegime {
    Low,
    Medium,
    High,
}

/// Aggregate risk appetite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskAppetite {
    RiskOn,
    Neutral,
    RiskOff,
}

/// Point-in-time market regime snapshot supplied by the signal aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeSnapshot {
    pub vol_regime: VolRegime,
    pub correlation_regime: CorrelationRegime,
    pub risk_appetite: RiskAppetite,
}

impl RegimeSnapshot {
    /// Stressed vol combined with high correlation: nothing trades.
    #[must_use]
    pub fn is_crisis(&self) -> bool {
        self.vol_regime == VolRegime::Stressed && self.correlation_regime == CorrelationRegime::High
    }
}

/// Market context for a single underlying, consumed from the data collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Current spot price.
    pub price: Decimal,
    /// At-the-money implied volatility, annualized (e.g. 0.18).
    pub atm_iv: f64,
    /// Trailing realized volatility, annualized.
    pub realized_vol: f64,
    /// Distance between adjacent listed strikes.
    pub strike_interval: Decimal,
    /// Total open interest across the near-dated chain; drives liquidity scoring.
    pub open_interest: u64,
}

impl MarketSnapshot {
    /// Expected move over `dte` days, in dollars: `price * iv * sqrt(dte/365)`.
    #[must_use]
    pub fn expected_move(&self, dte: i64) -> f64 {
        use rust_decimal::prelude::ToPrimitive;
        let price = self.price.to_f64().unwrap_or(0.0);
        price * self.atm_iv * ((dte.max(0) as f64) / 365.0).sqrt()
    }
}
