//! Power analysis for conversion-rate experiments
//!
//! Sample size for a two-proportion z-test:
//!
//! ```text
//! n = 2 · p̄(1 - p̄) · (z_α + z_β)² / δ²
//! ```
//!
//! where `δ` is the absolute minimum detectable effect and `p̄` the average
//! of baseline and treatment rates.

use serde::{Deserialize, Serialize};

use super::distributions::{normal_cdf, normal_inverse, z_critical};
use crate::{Error, Result};

/// Inputs to a sample-size calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerAnalysisParams {
    /// Baseline conversion rate in (0, 1)
    pub baseline_rate: f64,
    /// Relative lift to detect, in percent (5.0 = +5%)
    pub minimum_detectable_effect: f64,
    /// Significance level
    pub alpha: f64,
    /// Desired power (1 - beta)
    pub power: f64,
    /// Two-sided test
    pub two_tailed: bool,
}

impl PowerAnalysisParams {
    /// Params with the conventional alpha = 0.05, power = 0.8, two-sided.
    #[must_use]
    pub const fn new(baseline_rate: f64, minimum_detectable_effect: f64) -> Self {
        Self {
            baseline_rate,
            minimum_detectable_effect,
            alpha: 0.05,
            power: 0.8,
            two_tailed: true,
        }
    }
}

/// Output of a sample-size calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerAnalysisResult {
    /// Units needed in each variant
    pub required_sample_size_per_variant: u64,
    /// Units needed across control and treatment
    pub total_sample_size: u64,
    /// Days to collect the per-variant sample at the given daily traffic
    pub estimated_duration_days: u64,
}

/// Required sample size to detect the configured lift.
///
/// # Errors
///
/// Returns `Error::InvalidInput` when the baseline or treatment rate leaves
/// (0, 1), the effect is not positive, alpha/power leave (0, 1), or
/// `daily_users_per_variant` is zero.
pub fn required_sample_size(
    params: &PowerAnalysisParams,
    daily_users_per_variant: u64,
) -> Result<PowerAnalysisResult> {
    let PowerAnalysisParams {
        baseline_rate,
        minimum_detectable_effect,
        alpha,
        power,
        two_tailed,
    } = *params;

    if !(baseline_rate > 0.0 && baseline_rate < 1.0) {
        return Err(Error::InvalidInput(format!(
            "baseline rate must be in (0, 1), got {baseline_rate}"
        )));
    }
    if !(minimum_detectable_effect > 0.0) {
        return Err(Error::InvalidInput(format!(
            "minimum detectable effect must be positive, got {minimum_detectable_effect}"
        )));
    }
    if !(alpha > 0.0 && alpha < 1.0 && power > 0.0 && power < 1.0) {
        return Err(Error::InvalidInput(format!(
            "alpha and power must be in (0, 1), got alpha={alpha} power={power}"
        )));
    }
    if daily_users_per_variant == 0 {
        return Err(Error::InvalidInput(
            "daily users per variant must be positive".to_string(),
        ));
    }

    let delta = baseline_rate * minimum_detectable_effect / 100.0;
    let treatment_rate = baseline_rate + delta;
    if treatment_rate >= 1.0 {
        return Err(Error::InvalidInput(format!(
            "treatment rate {treatment_rate} would reach 100%"
        )));
    }

    let z_alpha = if two_tailed {
        z_critical(alpha)
    } else {
        normal_inverse(1.0 - alpha)
    };
    let z_beta = normal_inverse(power);
    let pooled = (baseline_rate + treatment_rate) / 2.0;
    let variance = pooled * (1.0 - pooled);

    let n = (2.0 * variance * (z_alpha + z_beta).powi(2) / delta.powi(2)).ceil();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let per_variant = n as u64;

    Ok(PowerAnalysisResult {
        required_sample_size_per_variant: per_variant,
        total_sample_size: per_variant * 2,
        estimated_duration_days: per_variant.div_ceil(daily_users_per_variant),
    })
}

/// Power actually achieved by the observed samples.
///
/// Uses the standardized effect `|Δ| / sqrt(pooled_variance)` and the
/// smaller of the two sample sizes.
#[must_use]
pub fn achieved_power(
    control_size: u64,
    treatment_size: u64,
    control_mean: f64,
    treatment_mean: f64,
    pooled_variance: f64,
    alpha: f64,
) -> f64 {
    let delta = (treatment_mean - control_mean).abs();
    let effect = if pooled_variance > 0.0 {
        delta / pooled_variance.sqrt()
    } else if delta > 0.0 {
        return 1.0;
    } else {
        0.0
    };
    #[allow(clippy::cast_precision_loss)]
    let n = control_size.min(treatment_size) as f64;
    normal_cdf(effect * (n / 2.0).sqrt() - z_critical(alpha))
}
