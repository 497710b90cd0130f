//! Metric Record - outcome measured by an experiment

use serde::{Deserialize, Serialize};

/// What a metric measures.
///
/// Only used for display; the analysis does not branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    /// 0/1 outcome per unit
    Conversion,
    /// Monetary value per unit
    Revenue,
    /// Activity counts or durations
    Engagement,
    /// Health signal that must not regress
    Guardrail,
}

/// Metric Record describes an outcome tracked for an experiment.
///
/// At most one metric per experiment should be flagged primary; it drives the
/// headline decision in the experiment summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metric {
    metric_id: String,
    experiment_id: String,
    name: String,
    metric_type: MetricType,
    is_primary: bool,
    minimum_detectable_effect: Option<f64>,
}

impl Metric {
    /// Create a new, non-primary metric.
    ///
    /// # Arguments
    ///
    /// * `metric_id` - Unique identifier for the metric
    /// * `experiment_id` - ID of the parent experiment
    /// * `name` - Metric name (e.g., "conversion", "latency")
    /// * `metric_type` - Display category
    #[must_use]
    pub fn new(
        metric_id: impl Into<String>,
        experiment_id: impl Into<String>,
        name: impl Into<String>,
        metric_type: MetricType,
    ) -> Self {
        Self::builder(metric_id, experiment_id, name, metric_type).build()
    }

    /// Create a builder for constructing a metric with optional fields.
    #[must_use]
    pub fn builder(
        metric_id: impl Into<String>,
        experiment_id: impl Into<String>,
        name: impl Into<String>,
        metric_type: MetricType,
    ) -> MetricBuilder {
        MetricBuilder::new(metric_id, experiment_id, name, metric_type)
    }

    /// Get the metric ID.
    #[must_use]
    pub fn metric_id(&self) -> &str {
        &self.metric_id
    }

    /// Get the parent experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the metric name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the metric type.
    #[must_use]
    pub const fn metric_type(&self) -> MetricType {
        self.metric_type
    }

    /// Whether this is the primary (decision) metric.
    #[must_use]
    pub const fn is_primary(&self) -> bool {
        self.is_primary
    }

    /// Minimum detectable effect in percent, if configured.
    #[must_use]
    pub const fn minimum_detectable_effect(&self) -> Option<f64> {
        self.minimum_detectable_effect
    }
}

/// Builder for `Metric`.
#[derive(Debug)]
pub struct MetricBuilder {
    metric_id: String,
    experiment_id: String,
    name: String,
    metric_type: MetricType,
    is_primary: bool,
    minimum_detectable_effect: Option<f64>,
}

impl MetricBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(
        metric_id: impl Into<String>,
        experiment_id: impl Into<String>,
        name: impl Into<String>,
        metric_type: MetricType,
    ) -> Self {
        Self {
            metric_id: metric_id.into(),
            experiment_id: experiment_id.into(),
            name: name.into(),
            metric_type,
            is_primary: false,
            minimum_detectable_effect: None,
        }
    }

    /// Flag the metric as primary.
    #[must_use]
    pub const fn primary(mut self) -> Self {
        self.is_primary = true;
        self
    }

    /// Set the minimum detectable effect (percent lift).
    #[must_use]
    pub const fn minimum_detectable_effect(mut self, mde_percent: f64) -> Self {
        self.minimum_detectable_effect = Some(mde_percent);
        self
    }

    /// Build the `Metric`.
    #[must_use]
    pub fn build(self) -> Metric {
        Metric {
            metric_id: self.metric_id,
            experiment_id: self.experiment_id,
            name: self.name,
            metric_type: self.metric_type,
            is_primary: self.is_primary,
            minimum_detectable_effect: self.minimum_detectable_effect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_new() {
        let metric = Metric::new("m-1", "exp-1", "conversion", MetricType::Conversion);
        assert_eq!(metric.metric_id(), "m-1");
        assert!(!metric.is_primary());
        assert!(metric.minimum_detectable_effect().is_none());
    }

    #[test]
    fn test_metric_builder_primary() {
        let metric = Metric::builder("m-1", "exp-1", "conversion", MetricType::Conversion)
            .primary()
            .minimum_detectable_effect(5.0)
            .build();
        assert!(metric.is_primary());
        assert_eq!(metric.minimum_detectable_effect(), Some(5.0));
    }
}
