//! One-screen experiment summary

use chrono::{DateTime, Utc};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::frequentist::{compute_results, ExperimentResult};
use super::health::{health_score, HealthReport};
use crate::experiment::{Experiment, ExperimentStatus, Exposure, Metric, MetricValue, Variant};
use crate::{Error, Result};

/// Headline numbers for an experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSummary {
    /// Experiment ID
    pub experiment_id: String,
    /// Experiment name
    pub name: String,
    /// Lifecycle status
    pub status: ExperimentStatus,
    /// Start timestamp
    pub started_at: Option<DateTime<Utc>>,
    /// Distinct exposed users
    pub total_users: usize,
    /// Primary metric ID
    pub primary_metric_id: String,
    /// Treatment with the highest mean on the primary metric
    pub best_result: Option<ExperimentResult>,
    /// Whether that treatment is significant
    pub has_winner: bool,
    /// Display name of the winning variant
    pub winning_variant: Option<String>,
    /// Health report
    pub health: HealthReport,
}

/// The single primary metric.
///
/// # Errors
///
/// Returns `Error::InvalidConfiguration` when zero or several metrics are
/// flagged primary.
pub fn primary_metric(metrics: &[Metric]) -> Result<&Metric> {
    let mut primaries = metrics.iter().filter(|m| m.is_primary());
    match (primaries.next(), primaries.next()) {
        (Some(primary), None) => Ok(primary),
        (None, _) => Err(Error::InvalidConfiguration("no primary metric".to_string())),
        (Some(first), Some(second)) => Err(Error::InvalidConfiguration(format!(
            "multiple primary metrics ({}, {})",
            first.metric_id(),
            second.metric_id()
        ))),
    }
}

/// Summarize an experiment around its primary metric.
///
/// # Errors
///
/// Returns `Error::InvalidConfiguration` for an ambiguous primary metric or
/// several control variants.
pub fn summarize(
    experiment: &Experiment,
    variants: &[Variant],
    metrics: &[Metric],
    exposures: &[Exposure],
    values: &[MetricValue],
    alpha: f64,
) -> Result<ExperimentSummary> {
    let primary = primary_metric(metrics)?;
    let results = compute_results(experiment.experiment_id(), primary, variants, values, alpha)?;

    let best_result = results
        .into_iter()
        .filter(|r| !r.is_control)
        .max_by(|a, b| a.mean.total_cmp(&b.mean));
    let has_winner = best_result.as_ref().is_some_and(|r| r.is_significant);
    let winning_variant = best_result
        .as_ref()
        .filter(|r| r.is_significant)
        .map(|r| r.variant_name.clone());

    let total_users = exposures
        .iter()
        .map(Exposure::user_id)
        .collect::<FxHashSet<_>>()
        .len();

    Ok(ExperimentSummary {
        experiment_id: experiment.experiment_id().to_string(),
        name: experiment.name().to_string(),
        status: experiment.status(),
        started_at: experiment.started_at(),
        total_users,
        primary_metric_id: primary.metric_id().to_string(),
        best_result,
        has_winner,
        winning_variant,
        health: health_score(
            experiment.experiment_id(),
            experiment.target_sample_size(),
            variants,
            exposures,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::MetricType;

    fn conversion(primary: bool) -> Metric {
        let builder = Metric::builder("conv", "exp-1", "Conversion", MetricType::Conversion);
        let builder = if primary { builder.primary() } else { builder };
        builder.build()
    }

    #[test]
    fn test_primary_metric_required() {
        assert!(primary_metric(&[conversion(false)]).is_err());
        assert!(primary_metric(&[conversion(true)]).is_ok());
        let second = Metric::builder("rev", "exp-1", "Revenue", MetricType::Revenue)
            .primary()
            .build();
        let err = primary_metric(&[conversion(true), second]).unwrap_err();
        assert!(err.to_string().contains("multiple primary metrics"));
    }

    #[test]
    fn test_summary_picks_best_treatment() {
        let experiment = Experiment::new("exp-1", "Pricing page", 100);
        let variants = vec![
            Variant::control("a", "exp-1", "Control", 34.0),
            Variant::new("b", "exp-1", "Cheap", 33.0),
            Variant::new("c", "exp-1", "Premium", 33.0),
        ];
        let mut values = Vec::new();
        let mut exposures = Vec::new();
        for i in 0..300 {
            let (variant, value) = match i % 3 {
                0 => ("a", f64::from(i % 2)),
                1 => ("b", f64::from(i % 2) * 0.5),
                _ => ("c", 1.0 + f64::from(i % 2)),
            };
            let user = format!("u{i}");
            exposures.push(Exposure::new("exp-1", variant, user.clone()));
            values.push(MetricValue::new("exp-1", variant, "conv", user, value));
        }

        let summary =
            summarize(&experiment, &variants, &[conversion(true)], &exposures, &values, 0.05).unwrap();
        assert_eq!(summary.total_users, 300);
        let best = summary.best_result.unwrap();
        assert_eq!(best.variant_id, "c");
        assert!(summary.has_winner);
        assert_eq!(summary.winning_variant.as_deref(), Some("Premium"));
    }

    #[test]
    fn test_summary_without_data() {
        let experiment = Experiment::new("exp-1", "Empty", 100);
        let variants = vec![Variant::control("a", "exp-1", "Control", 100.0)];
        let summary = summarize(&experiment, &variants, &[conversion(true)], &[], &[], 0.05).unwrap();
        assert!(summary.best_result.is_none());
        assert!(!summary.has_winner);
        assert_eq!(summary.total_users, 0);
    }
}
