//! Real-time experiment monitoring: traffic health and metric anomalies

use chrono::{DateTime, Duration, Utc};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::srm::SrmCheck;
use crate::experiment::{Experiment, ExperimentStatus, Exposure, Metric, MetricValue};
use crate::stats::{mean, sample_std_dev};

/// Values further than this many standard deviations from the mean are outliers.
pub const OUTLIER_SIGMA: f64 = 3.0;

/// Outlier share above which an anomaly alert fires.
pub const OUTLIER_RATE_THRESHOLD: f64 = 0.05;

/// Exposures expected after the first day.
pub const LOW_TRAFFIC_MIN_EXPOSURES: usize = 100;

/// Kind of monitoring alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    /// Observed split deviates from the configured split
    SampleRatioMismatch,
    /// Too little traffic to reach a conclusion
    LowTraffic,
    /// Unusual share of outlying metric values
    MetricAnomaly,
    /// A guardrail threshold was crossed
    GuardrailViolation,
}

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// For information only
    Info,
    /// Needs attention
    Warning,
    /// Needs action now
    Critical,
}

/// A condition an experiment owner should look at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringAlert {
    /// Experiment ID
    pub experiment_id: String,
    /// Alert kind
    pub alert_type: AlertType,
    /// Alert severity
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// Metric the alert concerns, if any
    pub metric_id: Option<String>,
    /// When the alert was raised
    pub raised_at: DateTime<Utc>,
}

/// Outlier statistics for a set of observations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierSummary {
    /// Sample mean
    pub mean: f64,
    /// Sample standard deviation
    pub std_dev: f64,
    /// Values beyond `OUTLIER_SIGMA` standard deviations
    pub outliers: usize,
    /// All values
    pub total: usize,
}

impl OutlierSummary {
    /// Compute the summary of `values`.
    #[must_use]
    pub fn of(values: &[f64]) -> Self {
        let mean = mean(values);
        let std_dev = sample_std_dev(values);
        let outliers = values
            .iter()
            .filter(|v| (*v - mean).abs() > OUTLIER_SIGMA * std_dev)
            .count();
        Self {
            mean,
            std_dev,
            outliers,
            total: values.len(),
        }
    }

    /// Outlier share; 0 for no values.
    #[must_use]
    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let rate = self.outliers as f64 / self.total as f64;
        rate
    }
}

/// Raise a warning for each metric whose outlier share exceeds 5%.
///
/// Only metrics in `metrics` are inspected, and only values recorded
/// against `experiment_id`.
#[must_use]
pub fn detect_outliers(
    experiment_id: &str,
    metrics: &[Metric],
    values: &[MetricValue],
    now: DateTime<Utc>,
) -> Vec<MonitoringAlert> {
    let mut by_metric: FxHashMap<&str, Vec<f64>> = FxHashMap::default();
    for mv in values.iter().filter(|mv| mv.experiment_id() == experiment_id) {
        by_metric.entry(mv.metric_id()).or_default().push(mv.value());
    }

    metrics
        .iter()
        .filter_map(|metric| {
            let observations = by_metric.get(metric.metric_id())?;
            let summary = OutlierSummary::of(observations);
            if summary.rate() <= OUTLIER_RATE_THRESHOLD {
                return None;
            }
            warn!(
                experiment_id,
                metric_id = metric.metric_id(),
                outliers = summary.outliers,
                "metric anomaly"
            );
            Some(MonitoringAlert {
                experiment_id: experiment_id.to_string(),
                alert_type: AlertType::MetricAnomaly,
                severity: Severity::Warning,
                message: format!(
                    "High outlier rate detected in {}: {:.1}% of values",
                    metric.name(),
                    summary.rate() * 100.0
                ),
                metric_id: Some(metric.metric_id().to_string()),
                raised_at: now,
            })
        })
        .collect()
}

/// Traffic alerts for a started experiment.
///
/// Low traffic: more than a day in and fewer than 100 exposures. No data:
/// running for over an hour with no exposure in the last hour.
#[must_use]
pub fn monitor_traffic(
    experiment: &Experiment,
    exposures: &[Exposure],
    now: DateTime<Utc>,
) -> Vec<MonitoringAlert> {
    let Some(started_at) = experiment.started_at() else {
        return Vec::new();
    };
    let elapsed = now - started_at;
    let mut alerts = Vec::new();

    if elapsed > Duration::hours(24) && exposures.len() < LOW_TRAFFIC_MIN_EXPOSURES {
        alerts.push(MonitoringAlert {
            experiment_id: experiment.experiment_id().to_string(),
            alert_type: AlertType::LowTraffic,
            severity: Severity::Warning,
            message: format!(
                "Low traffic: only {} exposures in {} hours",
                exposures.len(),
                elapsed.num_hours()
            ),
            metric_id: None,
            raised_at: now,
        });
    }

    let one_hour_ago = now - Duration::hours(1);
    let recent = exposures.iter().any(|e| e.timestamp() > one_hour_ago);
    if experiment.status() == ExperimentStatus::Running && elapsed > Duration::hours(1) && !recent {
        warn!(experiment_id = experiment.experiment_id(), "no exposures in the last hour");
        alerts.push(MonitoringAlert {
            experiment_id: experiment.experiment_id().to_string(),
            alert_type: AlertType::LowTraffic,
            severity: Severity::Critical,
            message: "No data received in the last hour".to_string(),
            metric_id: None,
            raised_at: now,
        });
    }

    alerts
}

/// Critical alert for a detected SRM.
#[must_use]
pub fn srm_alert(experiment_id: &str, check: &SrmCheck, now: DateTime<Utc>) -> Option<MonitoringAlert> {
    check.has_srm.then(|| MonitoringAlert {
        experiment_id: experiment_id.to_string(),
        alert_type: AlertType::SampleRatioMismatch,
        severity: Severity::Critical,
        message: format!(
            "Sample ratio mismatch: chi-square {:.2}, p = {:.6}",
            check.chi_square, check.p_value
        ),
        metric_id: None,
        raised_at: now,
    })
}

/// Arrival rate of distinct users.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrafficVelocity {
    /// Distinct users per day
    pub users_per_day: f64,
    /// Distinct users per hour
    pub users_per_hour: f64,
}

/// Distinct users per day and per hour over the exposure time span.
///
/// A span of zero (one timestamp, or none) counts as one day.
#[must_use]
pub fn traffic_velocity(exposures: &[Exposure]) -> TrafficVelocity {
    let users: FxHashSet<&str> = exposures.iter().map(Exposure::user_id).collect();
    let first = exposures.iter().map(Exposure::timestamp).min();
    let last = exposures.iter().map(Exposure::timestamp).max();

    #[allow(clippy::cast_precision_loss)]
    let span_days = match (first, last) {
        (Some(first), Some(last)) if last > first => {
            (last - first).num_milliseconds() as f64 / 86_400_000.0
        }
        _ => 1.0,
    };
    #[allow(clippy::cast_precision_loss)]
    let users_per_day = users.len() as f64 / span_days;
    TrafficVelocity {
        users_per_day,
        users_per_hour: users_per_day / 24.0,
    }
}
