//! Metric Value Record - one observation of a metric for a unit

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metric Value Record is a single numeric observation.
///
/// Zero or more per (user, metric). Means and variances are taken over all
/// observations; standard errors use the distinct user count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricValue {
    experiment_id: String,
    variant_id: String,
    metric_id: String,
    user_id: String,
    value: f64,
    timestamp: DateTime<Utc>,
}

impl MetricValue {
    /// Create an observation stamped with the current time.
    #[must_use]
    pub fn new(
        experiment_id: impl Into<String>,
        variant_id: impl Into<String>,
        metric_id: impl Into<String>,
        user_id: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            experiment_id: experiment_id.into(),
            variant_id: variant_id.into(),
            metric_id: metric_id.into(),
            user_id: user_id.into(),
            value,
            timestamp: Utc::now(),
        }
    }

    /// Replace the timestamp (useful for deserialization/testing).
    #[must_use]
    pub const fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the variant ID.
    #[must_use]
    pub fn variant_id(&self) -> &str {
        &self.variant_id
    }

    /// Get the metric ID.
    #[must_use]
    pub fn metric_id(&self) -> &str {
        &self.metric_id
    }

    /// Get the observing unit's ID.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Get the observed value.
    #[must_use]
    pub const fn value(&self) -> f64 {
        self.value
    }

    /// Get the observation timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_value_new() {
        let mv = MetricValue::new("exp-1", "var-a", "m-1", "user-1", 0.5);
        assert_eq!(mv.metric_id(), "m-1");
        assert!((mv.value() - 0.5).abs() < f64::EPSILON);
    }
}
