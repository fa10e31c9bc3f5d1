//! Premium and greeks estimation heuristics.
//!
//! The real pricing/greeks utility is an external collaborator. These
//! stand-ins are deterministic functions of spot, implied vol, and DTE:
//! premiums decay exponentially with strike distance measured in
//! expected-move units. Good enough to rank structures and exercise the
//! risk gate; never used for execution.

use vol_desk_core::ticket::OptionType;

/// Estimated credit (per share) for one vertical credit side whose short
/// strike sits `distance` dollars from spot.
#[must_use]
pub fn estimate_credit(width: f64, distance: f64, expected_move: f64) -> f64 {
    if expected_move <= 0.0 || width <= 0.0 {
        return 0.0;
    }
    let z = distance.max(0.0) / expected_move;
    width * 0.35 * (-0.9 * z).exp()
}

/// Estimated debit (per share) for a vertical with an at-the-money long leg
/// and a short leg `width` dollars further out.
#[must_use]
pub fn estimate_debit(width: f64, expected_move: f64) -> f64 {
    if expected_move <= 0.0 || width <= 0.0 {
        return 0.0;
    }
    let z = width / expected_move;
    width * 0.5 * (-0.4 * z).exp()
}

/// Rough per-contract greeks for an option `distance` dollars from spot.
/// Magnitudes decay with distance; put delta is negative.
#[must_use]
pub fn estimate_leg_greeks(
    option_type: OptionType,
    distance: f64,
    expected_move: f64,
) -> (f64, f64, f64) {
    let z = if expected_move > 0.0 {
        distance.max(0.0) / expected_move
    } else {
        0.0
    };
    let delta_magnitude = 0.5 * (-z).exp();
    let delta = match option_type {
        OptionType::Call => delta_magnitude,
        OptionType::Put => -delta_magnitude,
    };
    let vega = 0.10 * (-0.5 * z).exp();
    let gamma = 0.02 * (-0.5 * z).exp();
    (delta, vega, gamma)
}
