//! Frequentist analysis: per-variant aggregation and Welch's t-test
//!
//! Every treatment is compared against the single control variant. The
//! t-distribution is approximated by the standard normal for both the
//! p-value and the critical value, which is accurate once each variant has
//! roughly 30 units and anti-conservative below that.

use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::experiment::{Metric, MetricValue, Variant};
use crate::stats::{mean, population_variance, standard_error, two_tailed_p_value, z_critical};
use crate::{Error, Result};

/// Summary statistics of one variant's observations of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariantStats {
    /// Distinct users (the statistical unit)
    pub sample_size: u64,
    /// Raw observation count
    pub observations: usize,
    /// Mean over raw observations
    pub mean: f64,
    /// Population variance over raw observations
    pub variance: f64,
    /// `sqrt(variance / sample_size)`
    pub standard_error: f64,
}

impl VariantStats {
    /// Build from summary numbers.
    #[must_use]
    pub fn from_summary(mean: f64, variance: f64, sample_size: u64) -> Self {
        Self {
            sample_size,
            observations: usize::try_from(sample_size).unwrap_or(usize::MAX),
            mean,
            variance,
            standard_error: standard_error(variance, sample_size),
        }
    }

    fn from_observations(values: &[f64], users: usize) -> Self {
        let variance = population_variance(values);
        let sample_size = users as u64;
        Self {
            sample_size,
            observations: values.len(),
            mean: mean(values),
            variance,
            standard_error: standard_error(variance, sample_size),
        }
    }
}

/// Group one metric's observations by variant.
///
/// Values belonging to other metrics or experiments are ignored.
#[must_use]
pub fn aggregate_by_variant<'a>(
    experiment_id: &str,
    metric_id: &str,
    values: impl IntoIterator<Item = &'a MetricValue>,
) -> FxHashMap<&'a str, VariantStats> {
    let mut groups: FxHashMap<&'a str, (Vec<f64>, FxHashSet<&'a str>)> = FxHashMap::default();
    for mv in values {
        if mv.experiment_id() != experiment_id || mv.metric_id() != metric_id {
            continue;
        }
        let (observations, users) = groups.entry(mv.variant_id()).or_default();
        observations.push(mv.value());
        users.insert(mv.user_id());
    }
    groups
        .into_iter()
        .map(|(variant, (observations, users))| {
            (variant, VariantStats::from_observations(&observations, users.len()))
        })
        .collect()
}

/// Outcome of a two-sample Welch t-test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TTestResult {
    /// `(mean_t - mean_c) / pooled_se`
    pub t_statistic: f64,
    /// Two-tailed p-value (normal approximation)
    pub p_value: f64,
    /// Welch-Satterthwaite degrees of freedom
    pub degrees_of_freedom: f64,
    /// `p_value < alpha`
    pub is_significant: bool,
    /// Confidence interval of the mean difference
    pub confidence_interval: (f64, f64),
}

/// Welch's unequal-variance t-test of treatment against control.
///
/// A zero pooled standard error yields `t = 0, p = 1` for equal means and
/// `t = ±inf, p = 0` otherwise.
#[must_use]
pub fn welch_t_test(control: &VariantStats, treatment: &VariantStats, alpha: f64) -> TTestResult {
    #[allow(clippy::cast_precision_loss)]
    let (n_c, n_t) = (control.sample_size as f64, treatment.sample_size as f64);
    let se_c = if n_c > 0.0 { control.variance / n_c } else { 0.0 };
    let se_t = if n_t > 0.0 { treatment.variance / n_t } else { 0.0 };
    let pooled_se = (se_c + se_t).sqrt();
    let diff = treatment.mean - control.mean;

    let t_statistic = if pooled_se > 0.0 {
        diff / pooled_se
    } else if diff == 0.0 {
        0.0
    } else {
        diff.signum() * f64::INFINITY
    };

    let welch_denominator = se_c.powi(2) / (n_c - 1.0) + se_t.powi(2) / (n_t - 1.0);
    let degrees_of_freedom = if welch_denominator > 0.0 && welch_denominator.is_finite() {
        (se_c + se_t).powi(2) / welch_denominator
    } else {
        (n_c + n_t - 2.0).max(1.0)
    };

    let p_value = two_tailed_p_value(t_statistic);
    let margin = z_critical(alpha) * pooled_se;

    TTestResult {
        t_statistic,
        p_value,
        degrees_of_freedom,
        is_significant: p_value < alpha,
        confidence_interval: (diff - margin, diff + margin),
    }
}

/// Relative uplift in percent; 0 when the control mean is 0.
#[must_use]
pub fn relative_uplift(control_mean: f64, treatment_mean: f64) -> f64 {
    if control_mean == 0.0 {
        return 0.0;
    }
    (treatment_mean - control_mean) / control_mean * 100.0
}

/// `mean ± z(1 - alpha/2) · se`.
#[must_use]
pub fn confidence_interval(mean: f64, standard_error: f64, alpha: f64) -> (f64, f64) {
    let margin = z_critical(alpha) * standard_error;
    (mean - margin, mean + margin)
}

/// The control variant, if exactly one is flagged.
///
/// # Errors
///
/// Returns `Error::InvalidConfiguration` when several variants claim to be
/// control.
pub fn control_variant(variants: &[Variant]) -> Result<Option<&Variant>> {
    let mut controls = variants.iter().filter(|v| v.is_control());
    let first = controls.next();
    if let Some(second) = controls.next() {
        return Err(Error::InvalidConfiguration(format!(
            "multiple control variants ({}, {})",
            first.map_or("", Variant::variant_id),
            second.variant_id()
        )));
    }
    Ok(first)
}

/// One row of the results table: a variant's read on one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentResult {
    /// Experiment ID
    pub experiment_id: String,
    /// Variant ID
    pub variant_id: String,
    /// Variant display name
    pub variant_name: String,
    /// Metric ID
    pub metric_id: String,
    /// Metric display name
    pub metric_name: String,
    /// Whether this row is the control baseline
    pub is_control: bool,
    /// Distinct users
    pub sample_size: u64,
    /// Mean over raw observations
    pub mean: f64,
    /// Population variance over raw observations
    pub variance: f64,
    /// Standard error of the mean
    pub standard_error: f64,
    /// Confidence interval of this variant's mean
    pub confidence_interval: (f64, f64),
    /// Two-tailed p-value against control (1.0 for control)
    pub p_value: f64,
    /// `p_value < alpha`
    pub is_significant: bool,
    /// Percent change against control
    pub relative_uplift: f64,
    /// Absolute change against control
    pub absolute_uplift: f64,
    /// Welch t statistic (treatment rows only)
    pub t_statistic: Option<f64>,
    /// Welch-Satterthwaite degrees of freedom (treatment rows only)
    pub degrees_of_freedom: Option<f64>,
}

/// Compute the results table for one metric.
///
/// The control row comes first, then treatments in `variants` order.
/// Variants without observations are skipped. With no control variant, or
/// no control observations yet, the table is empty: "not enough data" is a
/// normal state, not an error.
///
/// # Errors
///
/// Returns `Error::InvalidConfiguration` if more than one variant is
/// flagged as control.
pub fn compute_results(
    experiment_id: &str,
    metric: &Metric,
    variants: &[Variant],
    values: &[MetricValue],
    alpha: f64,
) -> Result<Vec<ExperimentResult>> {
    let Some(control) = control_variant(variants)? else {
        debug!(experiment_id, metric_id = metric.metric_id(), "no control variant");
        return Ok(Vec::new());
    };

    let aggregated = aggregate_by_variant(experiment_id, metric.metric_id(), values);
    let Some(control_stats) = aggregated.get(control.variant_id()) else {
        debug!(
            experiment_id,
            metric_id = metric.metric_id(),
            "no observations for control yet"
        );
        return Ok(Vec::new());
    };

    let row = |variant: &Variant, stats: &VariantStats| ExperimentResult {
        experiment_id: experiment_id.to_string(),
        variant_id: variant.variant_id().to_string(),
        variant_name: variant.name().to_string(),
        metric_id: metric.metric_id().to_string(),
        metric_name: metric.name().to_string(),
        is_control: variant.is_control(),
        sample_size: stats.sample_size,
        mean: stats.mean,
        variance: stats.variance,
        standard_error: stats.standard_error,
        confidence_interval: confidence_interval(stats.mean, stats.standard_error, alpha),
        p_value: 1.0,
        is_significant: false,
        relative_uplift: 0.0,
        absolute_uplift: 0.0,
        t_statistic: None,
        degrees_of_freedom: None,
    };

    let mut results = Vec::with_capacity(variants.len());
    results.push(row(control, control_stats));

    for variant in variants.iter().filter(|v| !v.is_control()) {
        let Some(stats) = aggregated.get(variant.variant_id()) else {
            debug!(experiment_id, variant_id = variant.variant_id(), "variant has no observations");
            continue;
        };
        let test = welch_t_test(control_stats, stats, alpha);
        results.push(ExperimentResult {
            p_value: test.p_value,
            is_significant: test.is_significant,
            relative_uplift: relative_uplift(control_stats.mean, stats.mean),
            absolute_uplift: stats.mean - control_stats.mean,
            t_statistic: Some(test.t_statistic),
            degrees_of_freedom: Some(test.degrees_of_freedom),
            ..row(variant, stats)
        });
    }

    Ok(results)
}

/// Compute results for every metric, keyed by metric ID.
///
/// Metrics with an empty table are omitted.
///
/// # Errors
///
/// Same as [`compute_results`].
pub fn compute_all_results(
    experiment_id: &str,
    metrics: &[Metric],
    variants: &[Variant],
    values: &[MetricValue],
    alpha: f64,
) -> Result<BTreeMap<String, Vec<ExperimentResult>>> {
    let mut by_metric = BTreeMap::new();
    for metric in metrics {
        let results = compute_results(experiment_id, metric, variants, values, alpha)?;
        if !results.is_empty() {
            by_metric.insert(metric.metric_id().to_string(), results);
        }
    }
    Ok(by_metric)
}

/// Whether any treatment is significant on the given metric.
#[must_use]
pub fn has_reached_significance(results: &[ExperimentResult], primary_metric_id: &str) -> bool {
    results
        .iter()
        .filter(|r| r.metric_id == primary_metric_id && !r.is_control)
        .any(|r| r.is_significant)
}
