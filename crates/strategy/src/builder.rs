//! Candidate construction and ranking.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use vol_desk_core::config::StrategyConfig;
use vol_desk_core::errors::EngineError;
use vol_desk_core::signal::MarketSnapshot;
use vol_desk_core::ticket::{Bias, Leg, OptionType, Side, StrategyKind, TradeConstraints};

use crate::pricing::{estimate_credit, estimate_debit, estimate_leg_greeks};

/// A priced, structurally-safe candidate prior to ticket assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateStructure {
    pub underlying: String,
    pub strategy: StrategyKind,
    pub legs: Vec<Leg>,
    pub expiry: NaiveDate,
    pub dte: i64,
    /// Premium magnitude (per share); credit vs debit implied by strategy.
    pub credit_or_debit: Decimal,
    pub width: Decimal,
    pub max_loss: Decimal,
    pub pop_estimate: f64,
    /// Credit/width, or squashed reward:risk for debit structures.
    pub payoff_score: f64,
    /// Breakeven/short-strike distance in expected-move units, squashed.
    pub safety_score: f64,
    /// Blended rank; filled during ranking.
    pub rank: f64,
}

/// True when no short leg is left unhedged: per option type, long quantity
/// covers short quantity.
#[must_use]
pub fn structurally_hedged(legs: &[Leg]) -> bool {
    for option_type in [OptionType::Call, OptionType::Put] {
        let bought: u32 = legs
            .iter()
            .filter(|l| l.option_type == option_type && l.side == Side::Buy)
            .map(|l| l.quantity)
            .sum();
        let sold: u32 = legs
            .iter()
            .filter(|l| l.option_type == option_type && l.side == Side::Sell)
            .map(|l| l.quantity)
            .sum();
        if sold > bought {
            return false;
        }
    }
    true
}

/// Builds ranked, deduplicated candidates for one underlying.
///
/// Directional bias yields debit verticals at 1..=N strike intervals wide;
/// neutral bias yields fixed-width iron condors at a few short-strike
/// distances. Candidates priced non-positive or exceeding the premium
/// budget are discarded.
///
/// # Errors
/// `Validation` for malformed constraints or a degenerate market snapshot.
pub fn build_candidates(
    underlying: &str,
    constraints: &TradeConstraints,
    market: &MarketSnapshot,
    edge_composite: f64,
    config: &StrategyConfig,
) -> Result<Vec<CandidateStructure>, EngineError> {
    constraints.validate()?;
    if market.price <= Decimal::ZERO
        || market.strike_interval <= Decimal::ZERO
        || market.atm_iv <= 0.0
    {
        return Err(EngineError::Validation(format!(
            "degenerate market snapshot for {underlying}: price {}, interval {}, iv {}",
            market.price, market.strike_interval, market.atm_iv
        )));
    }

    let dte = constraints.dte_target;
    let expiry = Utc::now().date_naive() + Duration::days(dte);
    let expected_move = market.expected_move(dte);

    let mut candidates = Vec::new();
    match constraints.bias {
        Bias::Bullish | Bias::Bearish => {
            for intervals in 1..=config.max_spread_intervals {
                if let Some(candidate) = debit_vertical(
                    underlying,
                    constraints.bias,
                    market,
                    intervals,
                    expected_move,
                    expiry,
                    dte,
                ) {
                    candidates.push(candidate);
                }
            }
        }
        Bias::Neutral => {
            let base = config.condor_short_distance_pct;
            for pct in [base - 0.01, base, base + 0.01] {
                if pct <= 0.0 {
                    continue;
                }
                if let Some(candidate) =
                    iron_condor(underlying, market, pct, expected_move, expiry, dte, config)
                {
                    candidates.push(candidate);
                }
            }
        }
    }

    let before_filter = candidates.len();
    candidates.retain(|c| {
        c.credit_or_debit > Decimal::ZERO
            && c.max_loss > Decimal::ZERO
            && c.max_loss <= constraints.max_premium
    });
    if candidates.len() < before_filter {
        debug!(
            underlying,
            discarded = before_filter - candidates.len(),
            "discarded candidates outside premium budget"
        );
    }

    // Dedup by (expiry, strikes); nearby percentage targets can round to the
    // same strike grid points.
    let mut seen = HashSet::new();
    candidates.retain(|c| seen.insert(dedup_key(c)));

    for candidate in &candidates {
        debug_assert!(
            structurally_hedged(&candidate.legs),
            "unhedged short leg emitted for {underlying}"
        );
    }

    rank_candidates(&mut candidates, edge_composite, config);
    candidates.truncate(constraints.max_tickets);
    Ok(candidates)
}

/// Blends edge, payoff, and safety into a rank and sorts best-first.
/// Ties break on higher edge, then higher safety, then fewer DTE.
fn rank_candidates(candidates: &mut [CandidateStructure], edge: f64, config: &StrategyConfig) {
    for candidate in candidates.iter_mut() {
        candidate.rank = config.rank_edge_weight * edge
            + config.rank_payoff_weight * candidate.payoff_score
            + config.rank_safety_weight * candidate.safety_score;
    }
    candidates.sort_by(|a, b| {
        b.rank
            .partial_cmp(&a.rank)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                b.safety_score
                    .partial_cmp(&a.safety_score)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.dte.cmp(&b.dte))
    });
}

fn dedup_key(candidate: &CandidateStructure) -> String {
    let mut strikes: Vec<Decimal> = candidate.legs.iter().map(|l| l.strike.normalize()).collect();
    strikes.sort();
    let strikes: Vec<String> = strikes.iter().map(ToString::to_string).collect();
    format!(
        "{}|{}|{}",
        candidate.underlying,
        candidate.expiry,
        strikes.join(",")
    )
}

fn round_to_grid(value: Decimal, interval: Decimal) -> Decimal {
    (value / interval).round() * interval
}

fn make_leg(
    side: Side,
    option_type: OptionType,
    strike: Decimal,
    spot: Decimal,
    expected_move: f64,
) -> Leg {
    let distance = (strike - spot).abs().to_f64().unwrap_or(0.0);
    let (delta, vega, gamma) = estimate_leg_greeks(option_type, distance, expected_move);
    Leg {
        side,
        option_type,
        strike,
        quantity: 1,
        delta: Some(delta),
        vega: Some(vega),
        gamma: Some(gamma),
    }
}

fn debit_vertical(
    underlying: &str,
    bias: Bias,
    market: &MarketSnapshot,
    intervals: u32,
    expected_move: f64,
    expiry: NaiveDate,
    dte: i64,
) -> Option<CandidateStructure> {
    let spot = market.price;
    let atm = round_to_grid(spot, market.strike_interval);
    let width = market.strike_interval * Decimal::from(intervals);

    let (strategy, option_type, short_strike) = match bias {
        Bias::Bullish => (StrategyKind::BullCallSpread, OptionType::Call, atm + width),
        Bias::Bearish => (StrategyKind::BearPutSpread, OptionType::Put, atm - width),
        Bias::Neutral => return None,
    };
    if atm <= Decimal::ZERO || short_strike <= Decimal::ZERO {
        return None;
    }

    let width_f = width.to_f64()?;
    let debit_f = estimate_debit(width_f, expected_move);
    let debit = Decimal::try_from(debit_f).ok()?.round_dp(2);
    if debit <= Decimal::ZERO || debit >= width {
        return None;
    }

    // Breakeven sits a debit's distance past the long strike; a nearer
    // breakeven is safer for a structure that needs the move.
    let breakeven_distance = match bias {
        Bias::Bullish => ((atm + debit) - spot).to_f64()?.max(0.0),
        Bias::Bearish => (spot - (atm - debit)).to_f64()?.max(0.0),
        Bias::Neutral => unreachable!(),
    };
    let z = if expected_move > 0.0 {
        breakeven_distance / expected_move
    } else {
        0.0
    };
    let safety_score = 1.0 / (1.0 + z);

    let reward_risk = (width_f - debit_f) / debit_f;
    let payoff_score = reward_risk / (1.0 + reward_risk);
    let pop_estimate = (1.0 - debit_f / width_f).clamp(0.0, 1.0);

    let legs = vec![
        make_leg(Side::Buy, option_type, atm, spot, expected_move),
        make_leg(Side::Sell, option_type, short_strike, spot, expected_move),
    ];

    Some(CandidateStructure {
        underlying: underlying.to_string(),
        strategy,
        legs,
        expiry,
        dte,
        credit_or_debit: debit,
        width,
        max_loss: debit,
        pop_estimate,
        payoff_score,
        safety_score,
        rank: 0.0,
    })
}

fn iron_condor(
    underlying: &str,
    market: &MarketSnapshot,
    short_distance_pct: f64,
    expected_move: f64,
    expiry: NaiveDate,
    dte: i64,
    config: &StrategyConfig,
) -> Option<CandidateStructure> {
    let spot = market.price;
    let down = Decimal::try_from(1.0 - short_distance_pct).ok()?;
    let up = Decimal::try_from(1.0 + short_distance_pct).ok()?;
    let short_put = round_to_grid(spot * down, market.strike_interval);
    let short_call = round_to_grid(spot * up, market.strike_interval);
    if short_put <= Decimal::ZERO || short_call <= short_put {
        return None;
    }

    let width = config.wing_width;
    let long_put = short_put - width;
    let long_call = short_call + width;
    if long_put <= Decimal::ZERO || width <= Decimal::ZERO {
        return None;
    }

    let width_f = width.to_f64()?;
    let put_distance = (spot - short_put).to_f64()?.max(0.0);
    let call_distance = (short_call - spot).to_f64()?.max(0.0);
    let credit_f = estimate_credit(width_f, put_distance, expected_move)
        + estimate_credit(width_f, call_distance, expected_move);
    let credit = Decimal::try_from(credit_f).ok()?.round_dp(2);
    if credit <= Decimal::ZERO || credit >= width {
        return None;
    }

    let z = if expected_move > 0.0 {
        put_distance.min(call_distance) / expected_move
    } else {
        0.0
    };
    let safety_score = z / (1.0 + z);
    let payoff_score = (credit_f / width_f).clamp(0.0, 1.0);
    let pop_estimate = (1.0 - credit_f / width_f).clamp(0.0, 1.0);

    let legs = vec![
        make_leg(Side::Buy, OptionType::Put, long_put, spot, expected_move),
        make_leg(Side::Sell, OptionType::Put, short_put, spot, expected_move),
        make_leg(Side::Sell, OptionType::Call, short_call, spot, expected_move),
        make_leg(Side::Buy, OptionType::Call, long_call, spot, expected_move),
    ];

    Some(CandidateStructure {
        underlying: underlying.to_string(),
        strategy: StrategyKind::IronCondor,
        legs,
        expiry,
        dte,
        credit_or_debit: credit,
        width,
        max_loss: width - credit,
        pop_estimate,
        payoff_score,
        safety_score,
        rank: 0.0,
    })
}
