//! Composite edge scoring.
//!
//! Each component maps its input onto a [0, 1] favorability scale for
//! premium-selling structures; the composite is a weighted average. A
//! missing input removes its component and renormalizes the remaining
//! weights; it is never silently scored as zero. A non-finite input is a
//! hard `Computation` error.

use std::collections::BTreeMap;

use tracing::debug;
use vol_desk_core::config::EdgeConfig;
use vol_desk_core::errors::EngineError;
use vol_desk_core::signal::{EdgeComponent, EdgeInputs, EdgeScore};

// Term-structure slope beyond which the curve counts as contango/backwardation.
const TERM_SLOPE_THRESHOLD: f64 = 0.1;
// Dealer-gamma proxy magnitude treated as decisively long/short.
const GAMMA_DECISIVE_THRESHOLD: f64 = 0.25;

/// Scores the signal bundle into an [`EdgeScore`].
///
/// # Errors
/// - `Computation` when any supplied input is non-finite.
/// - `Validation` when no component can be scored at all.
pub fn score_edge(inputs: &EdgeInputs, config: &EdgeConfig) -> Result<EdgeScore, EngineError> {
    let weights = &config.weights;
    let iv_rv = require_finite(EdgeComponent::IvRvSpread, inputs.iv_rv_ratio)?
        .map(|r| score_iv_rv(r, config));
    let term = require_finite(EdgeComponent::TermStructure, inputs.term_slope)?
        .map(score_term_structure);
    let skew = require_finite(EdgeComponent::SkewDislocation, inputs.skew_spread)?
        .map(|s| score_skew(s, config));
    let gamma = require_finite(EdgeComponent::DealerGamma, inputs.dealer_gamma)?
        .map(score_dealer_gamma);
    // A null event date means no known event, which is itself a signal.
    let event = Some(score_event_proximity(inputs.days_to_event, config));

    let candidates: [(EdgeComponent, f64, Option<f64>); 5] = [
        (EdgeComponent::IvRvSpread, weights.iv_rv_spread, iv_rv),
        (EdgeComponent::TermStructure, weights.term_structure, term),
        (EdgeComponent::SkewDislocation, weights.skew_dislocation, skew),
        (EdgeComponent::DealerGamma, weights.dealer_gamma, gamma),
        (EdgeComponent::EventProximity, weights.event_proximity, event),
    ];

    let mut components = BTreeMap::new();
    let mut weighted = 0.0;
    let mut total_weight = 0.0;

    for (component, weight, score) in candidates {
        let Some(score) = score else { continue };
        if !score.is_finite() {
            return Err(EngineError::Computation {
                component: component.label().to_string(),
                value: score,
            });
        }
        components.insert(component, score);
        weighted += weight * score;
        total_weight += weight;
    }

    if components.is_empty() || total_weight <= 0.0 {
        return Err(EngineError::Validation(format!(
            "no scorable edge components for {}",
            inputs.underlying
        )));
    }

    let composite = (weighted / total_weight).clamp(0.0, 1.0);
    debug!(
        underlying = %inputs.underlying,
        composite,
        components = components.len(),
        "edge scored"
    );

    Ok(EdgeScore {
        components,
        composite,
    })
}

fn require_finite(
    component: EdgeComponent,
    value: Option<f64>,
) -> Result<Option<f64>, EngineError> {
    match value {
        Some(v) if !v.is_finite() => Err(EngineError::Computation {
            component: component.label().to_string(),
            value: v,
        }),
        other => Ok(other),
    }
}

/// Implied-vs-realized spread. Rich vol (ratio above threshold) is favorable
/// for selling; cheap vol is unfavorable.
fn score_iv_rv(ratio: f64, config: &EdgeConfig) -> f64 {
    if ratio > config.iv_rv_rich_threshold {
        (0.5 + (ratio - 1.0) * 1.5).min(1.0)
    } else if ratio < config.iv_rv_cheap_threshold {
        (0.5 - (1.0 - ratio) * 1.5).max(0.0)
    } else {
        0.5
    }
}

/// Contango is the normal, sell-friendly shape; backwardation signals fear.
fn score_term_structure(slope: f64) -> f64 {
    if slope >= TERM_SLOPE_THRESHOLD {
        0.75
    } else if slope <= -TERM_SLOPE_THRESHOLD {
        0.25
    } else {
        0.50
    }
}

/// Heavy put skew means puts are overpaid, which favors premium selling.
/// Inverted skew is unusual call demand.
fn score_skew(spread: f64, config: &EdgeConfig) -> f64 {
    if spread > config.skew_elevated_threshold || spread < config.skew_inverted_threshold {
        (0.5 + spread * 3.0).clamp(0.0, 1.0)
    } else {
        0.5
    }
}

/// Long dealer gamma dampens moves; short dealer gamma amplifies them.
fn score_dealer_gamma(proxy: f64) -> f64 {
    if proxy >= GAMMA_DECISIVE_THRESHOLD {
        0.80
    } else if proxy <= -GAMMA_DECISIVE_THRESHOLD {
        0.20
    } else {
        0.50
    }
}

/// No known event scores best; inside the blackout window scores worst;
/// linear ramp in between.
fn score_event_proximity(days_to_event: Option<i64>, config: &EdgeConfig) -> f64 {
    let Some(days) = days_to_event else {
        return 0.75;
    };
    if days <= config.event_blackout_days {
        return 0.15;
    }
    if days >= config.event_comfort_days {
        return 0.75;
    }
    let span = (config.event_comfort_days - config.event_blackout_days) as f64;
    let progress = (days - config.event_blackout_days) as f64 / span;
    0.15 + progress * 0.60
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_inputs() -> EdgeInputs {
        EdgeInputs {
            underlying: "SPY".to_string(),
            iv_rv_ratio: Some(1.22),
            term_slope: Some(0.3),
            skew_spread: Some(0.09),
            dealer_gamma: Some(0.4),
            days_to_event: None,
        }
    }

    #[test]
    fn composite_stays_in_unit_interval() {
        let config = EdgeConfig::default();
        for ratio in [0.2, 0.9, 1.0, 1.15, 1.8, 3.0] {
            let inputs = EdgeInputs {
                iv_rv_ratio: Some(ratio),
                ..full_inputs()
            };
            let score = score_edge(&inputs, &config).unwrap();
            assert!(
                (0.0..=1.0).contains(&score.composite),
                "composite {} out of range for ratio {ratio}",
                score.composite
            );
        }
    }

    #[test]
    fn full_bundle_matches_hand_computed_average() {
        let config = EdgeConfig::default();
        let score = score_edge(&full_inputs(), &config).unwrap();

        // iv_rv 1.22 -> 0.5 + 0.22*1.5 = 0.83; term 0.75; skew 0.5+0.27=0.77;
        // gamma 0.80; event 0.75
        let expected =
            0.30 * 0.83 + 0.20 * 0.75 + 0.20 * 0.77 + 0.15 * 0.80 + 0.15 * 0.75;
        assert!((score.composite - expected).abs() < 1e-9);
        assert_eq!(score.components.len(), 5);
    }

    #[test]
    fn missing_component_renormalizes_weights() {
        let config = EdgeConfig::default();
        let inputs = EdgeInputs {
            skew_spread: None,
            ..full_inputs()
        };
        let score = score_edge(&inputs, &config).unwrap();

        assert!(!score.components.contains_key(&EdgeComponent::SkewDislocation));
        // Remaining weights renormalized over 0.80 total.
        let expected =
            (0.30 * 0.83 + 0.20 * 0.75 + 0.15 * 0.80 + 0.15 * 0.75) / 0.80;
        assert!((score.composite - expected).abs() < 1e-9);
    }

    #[test]
    fn non_finite_input_is_a_computation_error() {
        let config = EdgeConfig::default();
        let inputs = EdgeInputs {
            iv_rv_ratio: Some(f64::NAN),
            ..full_inputs()
        };
        let err = score_edge(&inputs, &config).unwrap_err();
        assert!(matches!(err, EngineError::Computation { .. }));

        let inputs = EdgeInputs {
            dealer_gamma: Some(f64::INFINITY),
            ..full_inputs()
        };
        assert!(matches!(
            score_edge(&inputs, &config),
            Err(EngineError::Computation { .. })
        ));
    }

    #[test]
    fn null_event_date_scores_favorably_rather_than_dropping() {
        let config = EdgeConfig::default();
        let score = score_edge(&full_inputs(), &config).unwrap();
        assert!(
            (score.components[&EdgeComponent::EventProximity] - 0.75).abs() < f64::EPSILON
        );
    }

    #[test]
    fn imminent_event_scores_worst() {
        let config = EdgeConfig::default();
        let inputs = EdgeInputs {
            days_to_event: Some(2),
            ..full_inputs()
        };
        let score = score_edge(&inputs, &config).unwrap();
        assert!(
            (score.components[&EdgeComponent::EventProximity] - 0.15).abs() < f64::EPSILON
        );
    }

    #[test]
    fn event_ramp_is_monotone() {
        let config = EdgeConfig::default();
        let mut last = 0.0;
        for days in 3..=14 {
            let inputs = EdgeInputs {
                days_to_event: Some(days),
                ..full_inputs()
            };
            let score = score_edge(&inputs, &config).unwrap();
            let event = score.components[&EdgeComponent::EventProximity];
            assert!(event >= last, "event score not monotone at {days} days");
            last = event;
        }
    }

    #[test]
    fn cheap_vol_scores_below_neutral() {
        let config = EdgeConfig::default();
        let inputs = EdgeInputs {
            underlying: "SPY".to_string(),
            iv_rv_ratio: Some(0.80),
            term_slope: None,
            skew_spread: None,
            dealer_gamma: None,
            days_to_event: None,
        };
        let score = score_edge(&inputs, &config).unwrap();
        let iv_rv = score.components[&EdgeComponent::IvRvSpread];
        assert!(iv_rv < 0.5, "cheap vol should score below neutral, got {iv_rv}");
    }
}
