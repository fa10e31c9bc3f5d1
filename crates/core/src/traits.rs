//! Collaborator seams.
//!
//! Market data, signal aggregation, and account state are external to the
//! decision core. Implementations may do I/O; the engine always finishes
//! these calls before entering the ledger critical section.

use anyhow::Result;
use async_trait::async_trait;

use crate::portfolio::PortfolioState;
use crate::signal::{EdgeInputs, MarketSnapshot, RegimeSnapshot};

/// Supplies per-underlying signals and the market regime.
#[async_trait]
pub trait SignalAggregator: Send + Sync {
    async fn edge_inputs(&self, underlying: &str) -> Result<EdgeInputs>;
    async fn regime_snapshot(&self) -> Result<RegimeSnapshot>;
    async fn market_snapshot(&self, underlying: &str) -> Result<MarketSnapshot>;
}

/// Supplies current account and open-position state.
#[async_trait]
pub trait PortfolioSource: Send + Sync {
    async fn portfolio_state(&self) -> Result<PortfolioState>;
}
