//! Experiment Store - in-memory collection of experiment records
//!
//! This is the single aggregation point the analyzers read from. Facts
//! (exposures, metric values) are partitioned by experiment so that every
//! per-experiment query is a slice borrow rather than a scan.

use std::collections::{BTreeMap, HashMap};

use rustc_hash::{FxHashMap, FxHashSet};

use super::{Experiment, Exposure, Metric, MetricValue, Variant};

/// In-memory store for experiment configuration and facts.
///
/// ## Design
///
/// Experiments are keyed by ID for O(1) lookup. Variants and metrics keep
/// insertion order, which is the order assignment buckets and result rows
/// follow. Exposures and metric values are append-only.
#[derive(Debug, Default)]
pub struct ExperimentStore {
    experiments: HashMap<String, Experiment>,
    variants: HashMap<String, Vec<Variant>>,
    metrics: HashMap<String, Vec<Metric>>,
    exposures: HashMap<String, Vec<Exposure>>,
    metric_values: HashMap<String, Vec<MetricValue>>,
}

impl ExperimentStore {
    /// Create a new empty experiment store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the store holds no experiments and no facts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty() && self.exposures.is_empty() && self.metric_values.is_empty()
    }

    /// Get the number of experiments in the store.
    #[must_use]
    pub fn experiment_count(&self) -> usize {
        self.experiments.len()
    }

    /// Get the total number of exposure records across experiments.
    #[must_use]
    pub fn exposure_count(&self) -> usize {
        self.exposures.values().map(Vec::len).sum()
    }

    /// Get the total number of metric value records across experiments.
    #[must_use]
    pub fn metric_value_count(&self) -> usize {
        self.metric_values.values().map(Vec::len).sum()
    }

    /// Add (or replace) an experiment.
    pub fn add_experiment(&mut self, experiment: Experiment) {
        self.experiments
            .insert(experiment.experiment_id().to_string(), experiment);
    }

    /// Get an experiment by ID.
    #[must_use]
    pub fn get_experiment(&self, experiment_id: &str) -> Option<&Experiment> {
        self.experiments.get(experiment_id)
    }

    /// Get a mutable experiment by ID (for status transitions).
    pub fn get_experiment_mut(&mut self, experiment_id: &str) -> Option<&mut Experiment> {
        self.experiments.get_mut(experiment_id)
    }

    /// IDs of all stored experiments, sorted.
    #[must_use]
    pub fn experiment_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.experiments.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Add a variant to its experiment.
    pub fn add_variant(&mut self, variant: Variant) {
        self.variants
            .entry(variant.experiment_id().to_string())
            .or_default()
            .push(variant);
    }

    /// Variants of an experiment, in insertion order.
    #[must_use]
    pub fn variants(&self, experiment_id: &str) -> &[Variant] {
        self.variants.get(experiment_id).map_or(&[], Vec::as_slice)
    }

    /// Add a metric to its experiment.
    pub fn add_metric(&mut self, metric: Metric) {
        self.metrics
            .entry(metric.experiment_id().to_string())
            .or_default()
            .push(metric);
    }

    /// Metrics of an experiment, in insertion order.
    #[must_use]
    pub fn metrics(&self, experiment_id: &str) -> &[Metric] {
        self.metrics.get(experiment_id).map_or(&[], Vec::as_slice)
    }

    /// Record an exposure.
    pub fn add_exposure(&mut self, exposure: Exposure) {
        self.exposures
            .entry(exposure.experiment_id().to_string())
            .or_default()
            .push(exposure);
    }

    /// All exposures recorded for an experiment.
    #[must_use]
    pub fn exposures(&self, experiment_id: &str) -> &[Exposure] {
        self.exposures.get(experiment_id).map_or(&[], Vec::as_slice)
    }

    /// Record a metric value.
    pub fn add_metric_value(&mut self, value: MetricValue) {
        self.metric_values
            .entry(value.experiment_id().to_string())
            .or_default()
            .push(value);
    }

    /// All metric values recorded for an experiment (every metric).
    #[must_use]
    pub fn metric_values(&self, experiment_id: &str) -> &[MetricValue] {
        self.metric_values
            .get(experiment_id)
            .map_or(&[], Vec::as_slice)
    }

    /// Metric values for one metric of an experiment.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use trueno_ab::experiment::{ExperimentStore, MetricValue};
    ///
    /// let mut store = ExperimentStore::new();
    /// for i in 0..10 {
    ///     store.add_metric_value(MetricValue::new("exp-1", "var-a", "clicks", format!("u{i}"), 1.0));
    /// }
    /// store.add_metric_value(MetricValue::new("exp-1", "var-a", "revenue", "u0", 9.5));
    ///
    /// assert_eq!(store.metric_values_for("exp-1", "clicks").len(), 10);
    /// ```
    #[must_use]
    pub fn metric_values_for(&self, experiment_id: &str, metric_id: &str) -> Vec<&MetricValue> {
        self.metric_values(experiment_id)
            .iter()
            .filter(|v| v.metric_id() == metric_id)
            .collect()
    }

    /// Distinct exposed users across all variants of an experiment.
    #[must_use]
    pub fn distinct_users(&self, experiment_id: &str) -> usize {
        self.exposures(experiment_id)
            .iter()
            .map(Exposure::user_id)
            .collect::<FxHashSet<_>>()
            .len()
    }

    /// Distinct exposed users per variant ID.
    ///
    /// Only variants with at least one exposure appear.
    #[must_use]
    pub fn user_counts_by_variant(&self, experiment_id: &str) -> BTreeMap<String, u64> {
        user_counts_by_variant(self.exposures(experiment_id))
    }
}

/// Count distinct users per variant ID over a set of exposures.
#[must_use]
pub fn user_counts_by_variant(exposures: &[Exposure]) -> BTreeMap<String, u64> {
    let mut users: FxHashMap<&str, FxHashSet<&str>> = FxHashMap::default();
    for exposure in exposures {
        users
            .entry(exposure.variant_id())
            .or_default()
            .insert(exposure.user_id());
    }
    users
        .into_iter()
        .map(|(variant, set)| (variant.to_string(), set.len() as u64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::MetricType;

    #[test]
    fn test_store_default() {
        let store = ExperimentStore::new();
        assert!(store.is_empty());
        assert_eq!(store.experiment_count(), 0);
        assert_eq!(store.exposure_count(), 0);
        assert_eq!(store.metric_value_count(), 0);
        assert!(store.variants("missing").is_empty());
    }

    #[test]
    fn test_store_add_and_get() {
        let mut store = ExperimentStore::new();
        store.add_experiment(Experiment::new("exp-1", "Test", 1000));
        store.add_variant(Variant::control("a", "exp-1", "A", 50.0));
        store.add_variant(Variant::new("b", "exp-1", "B", 50.0));
        store.add_metric(Metric::new("m", "exp-1", "conv", MetricType::Conversion));
        store.add_exposure(Exposure::new("exp-1", "a", "u1"));

        assert!(!store.is_empty());
        assert!(store.get_experiment("exp-1").is_some());
        assert_eq!(store.variants("exp-1").len(), 2);
        assert_eq!(store.variants("exp-1")[0].variant_id(), "a");
        assert_eq!(store.metrics("exp-1").len(), 1);
        assert_eq!(store.experiment_ids(), vec!["exp-1"]);
    }

    #[test]
    fn test_distinct_users_counts_users_not_rows() {
        let mut store = ExperimentStore::new();
        store.add_exposure(Exposure::new("exp-1", "a", "u1"));
        store.add_exposure(Exposure::new("exp-1", "a", "u1"));
        store.add_exposure(Exposure::new("exp-1", "a", "u2"));
        store.add_exposure(Exposure::new("exp-1", "b", "u3"));
        store.add_exposure(Exposure::new("exp-2", "a", "u4"));

        assert_eq!(store.exposure_count(), 5);
        assert_eq!(store.distinct_users("exp-1"), 3);

        let counts = store.user_counts_by_variant("exp-1");
        assert_eq!(counts.get("a"), Some(&2));
        assert_eq!(counts.get("b"), Some(&1));
    }
}
