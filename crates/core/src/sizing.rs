//! Risk-adjusted position sizing.
//!
//! Core formula: `dollar_risk = base_risk * (confidence/5) * (edge/max_edge)
//! * liquidity`, with clamped inputs. The edge score maps onto the desk's
//! 1-5 confidence scale; liquidity derives from chain open interest.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::SizingConfig;

/// Contracts-per-ticket recommendation with the factor breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeRecommendation {
    /// Dollar risk to allocate to this structure.
    pub dollar_risk: Decimal,
    /// Whole contracts affordable at the structure's max loss (x100 multiplier).
    pub contracts: u32,
    pub confidence_factor: f64,
    pub edge_factor: f64,
    pub liquidity_factor: f64,
}

/// Maps a [0, 1] edge score onto the 1-5 confidence scale.
#[must_use]
pub fn edge_confidence(edge: f64) -> f64 {
    (1.0 + edge * 4.0).clamp(1.0, 5.0)
}

/// Liquidity score from near-dated chain open interest, saturating at 50k.
#[must_use]
pub fn liquidity_score(open_interest: u64) -> f64 {
    (open_interest as f64 / 50_000.0).clamp(0.0, 1.0)
}

/// Computes the size recommendation for one structure.
///
/// `max_loss` is the per-share worst case; the contract multiplier (100) is
/// applied when converting dollar risk to whole contracts.
#[must_use]
pub fn recommend_size(
    edge: f64,
    liquidity: f64,
    max_loss: Decimal,
    config: &SizingConfig,
) -> SizeRecommendation {
    let confidence = edge_confidence(edge);
    let confidence_factor = confidence / 5.0;

    let edge_factor = if config.max_edge > 0.0 {
        edge.clamp(0.0, config.max_edge) / config.max_edge
    } else {
        0.0
    };

    let liquidity_factor = liquidity.clamp(config.min_liquidity_score, 1.0);

    let multiplier = confidence_factor * edge_factor * liquidity_factor;
    let dollar_risk = (config.base_risk * Decimal::try_from(multiplier).unwrap_or(Decimal::ZERO))
        .round_dp(2);

    let per_contract = (max_loss * Decimal::from(100)).to_f64().unwrap_or(0.0);
    let contracts = if per_contract > 0.0 {
        (dollar_risk.to_f64().unwrap_or(0.0) / per_contract).floor() as u32
    } else {
        0
    };

    SizeRecommendation {
        dollar_risk,
        contracts,
        confidence_factor,
        edge_factor,
        liquidity_factor,
    }
}
