//! Sequential testing with O'Brien-Fleming alpha spending
//!
//! Lets an experiment be peeked at before it reaches its target sample size
//! without inflating the false-positive rate: early looks must clear a much
//! stricter threshold than the nominal alpha.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::frequentist::ExperimentResult;
use crate::stats::{normal_cdf, normal_inverse};

/// Information fraction past which futility and early wins are considered.
pub const MIN_DECISION_FRACTION: f64 = 0.5;

/// p-value above which a late look is judged futile.
pub const FUTILITY_P_VALUE: f64 = 0.5;

/// What to do after an interim look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Keep collecting data
    Continue,
    /// Stop and ship the treatment
    StopWinner,
    /// Stop: an effect is unlikely to appear
    StopNoEffect,
}

/// Outcome of one interim look.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequentialTestResult {
    /// Whether the experiment can stop now
    pub should_stop: bool,
    /// Human-readable explanation
    pub reason: String,
    /// Confidence attached to the recommendation
    pub confidence: f64,
    /// Recommended action
    pub recommendation: Recommendation,
    /// `current / target`
    pub information_fraction: f64,
    /// Alpha spent up to this look
    pub adjusted_alpha: f64,
}

/// O'Brien-Fleming cumulative alpha spent at `information_fraction`.
///
/// `2 · (1 - Φ(z(1 - alpha/2) / sqrt(t)))` for `t` in (0, 1]; 0 outside.
#[must_use]
pub fn alpha_spending(information_fraction: f64, alpha: f64) -> f64 {
    if information_fraction <= 0.0 || information_fraction > 1.0 {
        return 0.0;
    }
    let z = normal_inverse(1.0 - alpha / 2.0);
    2.0 * (1.0 - normal_cdf(z / information_fraction.sqrt()))
}

/// Per-look alpha for `looks` equally spaced peeks.
#[must_use]
pub fn alpha_per_look(looks: u32, alpha: f64) -> f64 {
    if looks == 0 {
        return alpha;
    }
    alpha / f64::from(looks).sqrt()
}

/// Evaluate an interim look at the primary metric's treatment result.
///
/// A zero target has no defined information fraction and is treated as
/// fraction 0, so the look always continues.
#[must_use]
pub fn evaluate(
    current_sample_size: u64,
    target_sample_size: u64,
    primary: &ExperimentResult,
    alpha: f64,
) -> SequentialTestResult {
    #[allow(clippy::cast_precision_loss)]
    let information_fraction = if target_sample_size == 0 {
        0.0
    } else {
        current_sample_size as f64 / target_sample_size as f64
    };
    let adjusted_alpha = alpha_spending(information_fraction, alpha);
    let p = primary.p_value;

    let result = if information_fraction > MIN_DECISION_FRACTION && p > FUTILITY_P_VALUE {
        SequentialTestResult {
            should_stop: true,
            reason: format!(
                "Futility boundary reached: p = {p:.3} at {:.0}% of target sample",
                information_fraction * 100.0
            ),
            confidence: 0.95,
            recommendation: Recommendation::StopNoEffect,
            information_fraction,
            adjusted_alpha,
        }
    } else if p < adjusted_alpha && information_fraction >= MIN_DECISION_FRACTION {
        SequentialTestResult {
            should_stop: true,
            reason: format!("Significant result: p = {p:.4} < adjusted alpha {adjusted_alpha:.4}"),
            confidence: 1.0 - p,
            recommendation: Recommendation::StopWinner,
            information_fraction,
            adjusted_alpha,
        }
    } else {
        SequentialTestResult {
            should_stop: false,
            reason: format!(
                "Continue: {:.0}% of target sample collected",
                information_fraction * 100.0
            ),
            confidence: information_fraction,
            recommendation: Recommendation::Continue,
            information_fraction,
            adjusted_alpha,
        }
    };

    debug!(
        variant_id = %primary.variant_id,
        information_fraction,
        adjusted_alpha,
        recommendation = ?result.recommendation,
        "sequential look"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with_p(p_value: f64) -> ExperimentResult {
        ExperimentResult {
            experiment_id: "exp-1".to_string(),
            variant_id: "b".to_string(),
            variant_name: "Treatment".to_string(),
            metric_id: "m".to_string(),
            metric_name: "Conversion".to_string(),
            is_control: false,
            sample_size: 1_000,
            mean: 0.1,
            variance: 0.09,
            standard_error: 0.01,
            confidence_interval: (0.08, 0.12),
            p_value,
            is_significant: p_value < 0.05,
            relative_uplift: 0.0,
            absolute_uplift: 0.0,
            t_statistic: Some(0.0),
            degrees_of_freedom: Some(1_998.0),
        }
    }

    #[test]
    fn test_alpha_spending_full_information_is_alpha() {
        assert!((alpha_spending(1.0, 0.05) - 0.05).abs() < 1e-3);
    }

    #[test]
    fn test_alpha_spending_is_strict_early() {
        let early = alpha_spending(0.25, 0.05);
        let mid = alpha_spending(0.5, 0.05);
        assert!(early < mid);
        assert!(early < 0.001);
        assert!((mid - 0.0056).abs() < 5e-4);
    }

    #[test]
    fn test_alpha_spending_outside_range() {
        assert!(alpha_spending(0.0, 0.05).abs() < f64::EPSILON);
        assert!(alpha_spending(1.5, 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn test_futility() {
        let look = evaluate(600, 1_000, &result_with_p(0.8), 0.05);
        assert!(look.should_stop);
        assert_eq!(look.recommendation, Recommendation::StopNoEffect);
        assert!((look.confidence - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn test_early_winner() {
        let look = evaluate(800, 1_000, &result_with_p(0.0001), 0.05);
        assert!(look.should_stop);
        assert_eq!(look.recommendation, Recommendation::StopWinner);
        assert!((look.confidence - 0.9999).abs() < 1e-12);
    }

    #[test]
    fn test_too_early_to_call() {
        let look = evaluate(200, 1_000, &result_with_p(0.0001), 0.05);
        assert!(!look.should_stop);
        assert_eq!(look.recommendation, Recommendation::Continue);
        assert!((look.confidence - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_zero_target_continues() {
        let look = evaluate(500, 0, &result_with_p(0.9), 0.05);
        assert_eq!(look.recommendation, Recommendation::Continue);
        assert!(look.adjusted_alpha.abs() < f64::EPSILON);
    }

    #[test]
    fn test_alpha_per_look() {
        assert!((alpha_per_look(4, 0.05) - 0.025).abs() < 1e-12);
        assert!((alpha_per_look(0, 0.05) - 0.05).abs() < f64::EPSILON);
    }
}
