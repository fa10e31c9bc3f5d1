//! Gate evaluation. Every failing predicate contributes its own reason.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::warn;

use vol_desk_core::config::GateLimits;
use vol_desk_core::portfolio::PortfolioState;
use vol_desk_core::signal::RegimeSnapshot;
use vol_desk_core::ticket::{combined_greeks, GateReport, Leg, RiskGateReport, StrategyKind};

/// Standard option contract multiplier.
const CONTRACT_MULTIPLIER: i64 = 100;

/// Checks the strategy family against the current market regime.
#[must_use]
pub fn evaluate_regime_gate(strategy: StrategyKind, snapshot: &RegimeSnapshot) -> GateReport {
    let mut reasons = strategy.regime_objections(snapshot);
    if snapshot.is_crisis() {
        reasons.push("crisis regime: stressed vol with high correlation".to_string());
    }
    if !reasons.is_empty() {
        warn!(strategy = %strategy, reasons = ?reasons, "regime gate failed");
    }
    GateReport::from_reasons(reasons)
}

/// Checks the candidate against portfolio constraints and reports greeks
/// exposure before and after a hypothetical one-lot fill.
///
/// `max_loss` is the per-share worst case; dollar risk uses the standard
/// contract multiplier.
#[must_use]
pub fn evaluate_risk_gate(
    underlying: &str,
    legs: &[Leg],
    max_loss: Decimal,
    portfolio: &PortfolioState,
    limits: &GateLimits,
) -> RiskGateReport {
    let before = portfolio.greeks;
    let after = before + combined_greeks(legs);

    let mut reasons = Vec::new();
    let equity = portfolio.account_equity.to_f64().unwrap_or(0.0);
    let dollar_max_loss = (max_loss * Decimal::from(CONTRACT_MULTIPLIER))
        .to_f64()
        .unwrap_or(0.0);

    if equity > 0.0 {
        let trade_risk_pct = dollar_max_loss / equity * 100.0;
        if trade_risk_pct > limits.max_trade_risk_pct {
            reasons.push(format!(
                "trade max loss {trade_risk_pct:.1}% exceeds {}% of equity",
                limits.max_trade_risk_pct
            ));
        }

        let open_weekly = portfolio.open_weekly_risk.to_f64().unwrap_or(0.0);
        let week_risk_pct = (open_weekly + dollar_max_loss) / equity * 100.0;
        if week_risk_pct > limits.max_weekly_loss_pct {
            reasons.push(format!(
                "weekly max loss {week_risk_pct:.1}% exceeds {}% of equity",
                limits.max_weekly_loss_pct
            ));
        }

        let weekly_pnl = portfolio.weekly_realized_pnl.to_f64().unwrap_or(0.0);
        if weekly_pnl < 0.0 {
            let drawdown_pct = -weekly_pnl / equity * 100.0;
            if drawdown_pct > limits.kill_switch_drawdown_pct {
                reasons.push(format!(
                    "weekly realized drawdown {drawdown_pct:.1}% exceeds {}% kill switch",
                    limits.kill_switch_drawdown_pct
                ));
            }
        }
    } else {
        reasons.push("account equity is non-positive".to_string());
    }

    if after.delta.abs() > limits.max_portfolio_delta {
        reasons.push(format!(
            "portfolio delta {:.2} after fill exceeds limit {}",
            after.delta, limits.max_portfolio_delta
        ));
    }
    if after.vega.abs() > limits.max_portfolio_vega {
        reasons.push(format!(
            "portfolio vega {:.2} after fill exceeds limit {}",
            after.vega, limits.max_portfolio_vega
        ));
    }
    if after.gamma.abs() > limits.max_portfolio_gamma {
        reasons.push(format!(
            "portfolio gamma {:.3} after fill exceeds limit {}",
            after.gamma, limits.max_portfolio_gamma
        ));
    }

    let open = portfolio.open_count_for(underlying);
    if open >= limits.max_open_per_underlying {
        reasons.push(format!(
            "{open} open tickets on {underlying} reaches the per-underlying cap of {}",
            limits.max_open_per_underlying
        ));
    }

    let passed = reasons.is_empty();
    if !passed {
        warn!(underlying, reasons = ?reasons, "risk gate failed");
    }

    RiskGateReport {
        passed,
        reasons,
        before,
        after,
    }
}
