//! Deterministic demo collaborators.
//!
//! Canned signal and portfolio data for the CLI and integration tests; no
//! network access, stable across runs. SPY shows a rich-vol setup, QQQ a
//! middling one, IWM a cheap-vol book with an imminent event.

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

use vol_desk_core::portfolio::PortfolioState;
use vol_desk_core::signal::{
    CorrelationRegime, EdgeInputs, MarketSnapshot, RegimeSnapshot, RiskAppetite, VolRegime,
};
use vol_desk_core::traits::{PortfolioSource, SignalAggregator};

/// Canned per-underlying signal data.
#[derive(Debug, Clone, Default)]
pub struct DemoSignalSource;

#[async_trait]
impl SignalAggregator for DemoSignalSource {
    async fn edge_inputs(&self, underlying: &str) -> Result<EdgeInputs> {
        let (iv_rv, term, skew, gamma, days) = match underlying {
            "SPY" => (1.22, 0.30, 0.09, 0.40, None),
            "QQQ" => (1.05, 0.20, 0.05, -0.10, Some(9)),
            "IWM" => (0.85, -0.20, -0.04, -0.40, Some(2)),
            _ => (1.10, 0.10, 0.04, 0.10, None),
        };
        Ok(EdgeInputs {
            underlying: underlying.to_string(),
            iv_rv_ratio: Some(iv_rv),
            term_slope: Some(term),
            skew_spread: Some(skew),
            dealer_gamma: Some(gamma),
            days_to_event: days,
        })
    }

    async fn regime_snapshot(&self) -> Result<RegimeSnapshot> {
        Ok(RegimeSnapshot {
            vol_regime: VolRegime::Expanding,
            correlation_regime: CorrelationRegime::Medium,
            risk_appetite: RiskAppetite::Neutral,
        })
    }

    async fn market_snapshot(&self, underlying: &str) -> Result<MarketSnapshot> {
        let (price, atm_iv, realized, interval, oi) = match underlying {
            "SPY" => (Decimal::from(500), 0.18, 0.15, Decimal::from(5), 120_000),
            "QQQ" => (Decimal::from(430), 0.22, 0.20, Decimal::from(5), 80_000),
            "IWM" => (Decimal::from(200), 0.28, 0.31, Decimal::from(1), 30_000),
            _ => (Decimal::from(100), 0.25, 0.22, Decimal::from(1), 10_000),
        };
        Ok(MarketSnapshot {
            price,
            atm_iv,
            realized_vol: realized,
            strike_interval: interval,
            open_interest: oi,
        })
    }
}

/// A flat demo book with $100k equity.
#[derive(Debug, Clone, Default)]
pub struct DemoPortfolio;

#[async_trait]
impl PortfolioSource for DemoPortfolio {
    async fn portfolio_state(&self) -> Result<PortfolioState> {
        Ok(PortfolioState::flat(Decimal::from(100_000)))
    }
}
