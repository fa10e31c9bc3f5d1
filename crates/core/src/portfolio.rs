//! Portfolio state consumed from the account collaborator.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregate greeks exposure (per-contract greeks summed across a book).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GreeksExposure {
    pub delta: f64,
    pub vega: f64,
    pub gamma: f64,
}

impl std::ops::Add for GreeksExposure {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            delta: self.delta + rhs.delta,
            vega: self.vega + rhs.vega,
            gamma: self.gamma + rhs.gamma,
        }
    }
}

/// One open ticket's footprint in the portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenPosition {
    pub underlying: String,
    pub greeks: GreeksExposure,
    /// Worst-case loss of the open structure (positive number).
    pub max_loss: Decimal,
}

/// Current account state used by the risk gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioState {
    pub open_tickets: Vec<OpenPosition>,
    /// Current aggregate greeks exposure across all open tickets.
    pub greeks: GreeksExposure,
    pub account_equity: Decimal,
    /// Realized P&L this week; negative means loss.
    pub weekly_realized_pnl: Decimal,
    /// Sum of max-loss values for trades already opened this week.
    pub open_weekly_risk: Decimal,
}

impl PortfolioState {
    /// A flat book with the given equity.
    #[must_use]
    pub fn flat(account_equity: Decimal) -> Self {
        Self {
            open_tickets: Vec::new(),
            greeks: GreeksExposure::default(),
            account_equity,
            weekly_realized_pnl: Decimal::ZERO,
            open_weekly_risk: Decimal::ZERO,
        }
    }

    /// Number of open tickets on one underlying.
    #[must_use]
    pub fn open_count_for(&self, underlying: &str) -> usize {
        self.open_tickets
            .iter()
            .filter(|p| p.underlying == underlying)
            .count()
    }
}
