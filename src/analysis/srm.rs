//! Sample ratio mismatch detection
//!
//! A chi-square goodness-of-fit test of observed units per variant against
//! the configured traffic split. SRM usually means the assignment or
//! logging pipeline is broken, which invalidates every downstream result.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::SRM_P_VALUE_THRESHOLD;
use crate::experiment::{user_counts_by_variant, Exposure, Variant};
use crate::stats::chi_square_sf;

/// Result of a chi-square SRM test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SrmCheck {
    /// Chi-square statistic
    pub chi_square: f64,
    /// Upper-tail p-value
    pub p_value: f64,
    /// `p_value < 0.001`
    pub has_srm: bool,
    /// Number of compared variants minus one
    pub degrees_of_freedom: usize,
    /// Observed units per variant
    pub observed: BTreeMap<String, u64>,
    /// Expected units per variant
    pub expected: BTreeMap<String, f64>,
}

/// Test observed counts against expected ratios.
///
/// Expected counts are `ratio × total observed`. Only variants present in
/// `expected_ratios` contribute to the statistic. Fewer than two variants
/// cannot mismatch and return `χ² = 0, p = 1`.
#[must_use]
pub fn detect_srm(
    observed: &BTreeMap<String, u64>,
    expected_ratios: &BTreeMap<String, f64>,
) -> SrmCheck {
    #[allow(clippy::cast_precision_loss)]
    let total = observed.values().sum::<u64>() as f64;
    let expected: BTreeMap<String, f64> = expected_ratios
        .iter()
        .map(|(variant, ratio)| (variant.clone(), ratio * total))
        .collect();

    if expected_ratios.len() < 2 {
        return SrmCheck {
            chi_square: 0.0,
            p_value: 1.0,
            has_srm: false,
            degrees_of_freedom: 0,
            observed: observed.clone(),
            expected,
        };
    }

    let chi_square: f64 = expected
        .iter()
        .map(|(variant, &exp)| {
            #[allow(clippy::cast_precision_loss)]
            let obs = observed.get(variant).copied().unwrap_or(0) as f64;
            let denominator = if exp == 0.0 { 1.0 } else { exp };
            (obs - exp).powi(2) / denominator
        })
        .sum();

    let degrees_of_freedom = expected_ratios.len() - 1;
    #[allow(clippy::cast_precision_loss)]
    let p_value = chi_square_sf(chi_square, degrees_of_freedom as f64);
    let has_srm = p_value < SRM_P_VALUE_THRESHOLD;
    if has_srm {
        warn!(chi_square, p_value, "sample ratio mismatch detected");
    }

    SrmCheck {
        chi_square,
        p_value,
        has_srm,
        degrees_of_freedom,
        observed: observed.clone(),
        expected,
    }
}

/// Traffic splits normalized to ratios summing to 1.
///
/// A non-positive total falls back to an even split.
#[must_use]
pub fn expected_ratios(variants: &[Variant]) -> BTreeMap<String, f64> {
    let total: f64 = variants.iter().map(Variant::traffic_split).sum();
    #[allow(clippy::cast_precision_loss)]
    let even = 1.0 / variants.len().max(1) as f64;
    variants
        .iter()
        .map(|v| {
            let ratio = if total > 0.0 { v.traffic_split() / total } else { even };
            (v.variant_id().to_string(), ratio)
        })
        .collect()
}

/// SRM check of distinct exposed users against the configured splits.
#[must_use]
pub fn srm_from_exposures(exposures: &[Exposure], variants: &[Variant]) -> SrmCheck {
    detect_srm(&user_counts_by_variant(exposures), &expected_ratios(variants))
}
