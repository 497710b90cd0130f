//! Experiment records as JSON documents in a `KvStore`
//!
//! Key layout, one document per experiment and record kind:
//!
//! ```text
//! experiment:{id}      Experiment
//! variants:{id}        [Variant]
//! metrics:{id}         [Metric]
//! exposures:{id}       [Exposure]
//! metric_values:{id}   [MetricValue]
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::KvStore;
use crate::experiment::{Experiment, ExperimentStore, Exposure, Metric, MetricValue, Variant};
use crate::{Error, Result};

const EXPERIMENT_PREFIX: &str = "experiment:";

fn key(kind: &str, experiment_id: &str) -> String {
    format!("{kind}:{experiment_id}")
}

/// Typed record access over any `KvStore`.
#[derive(Debug, Default)]
pub struct RecordStore<S> {
    kv: S,
}

impl<S: KvStore> RecordStore<S> {
    /// Wrap a KV backend.
    #[must_use]
    pub const fn new(kv: S) -> Self {
        Self { kv }
    }

    /// The underlying KV backend.
    #[must_use]
    pub const fn kv(&self) -> &S {
        &self.kv
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.kv.get(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn put_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.kv.set(key, serde_json::to_vec(value)?).await
    }

    async fn append<T: Serialize + DeserializeOwned + Clone>(&self, key: &str, records: &[T]) -> Result<()> {
        let mut all: Vec<T> = self.get_json(key).await?.unwrap_or_default();
        all.extend_from_slice(records);
        self.put_json(key, &all).await
    }

    /// Insert or replace an experiment.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or the backend fails
    pub async fn save_experiment(&self, experiment: &Experiment) -> Result<()> {
        self.put_json(&key("experiment", experiment.experiment_id()), experiment)
            .await
    }

    /// Fetch an experiment by ID.
    ///
    /// # Errors
    ///
    /// Returns error if the stored document is malformed or the backend fails
    pub async fn get_experiment(&self, experiment_id: &str) -> Result<Option<Experiment>> {
        self.get_json(&key("experiment", experiment_id)).await
    }

    /// Replace an experiment's variants.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or the backend fails
    pub async fn save_variants(&self, experiment_id: &str, variants: &[Variant]) -> Result<()> {
        self.put_json(&key("variants", experiment_id), variants).await
    }

    /// Replace an experiment's metrics.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or the backend fails
    pub async fn save_metrics(&self, experiment_id: &str, metrics: &[Metric]) -> Result<()> {
        self.put_json(&key("metrics", experiment_id), metrics).await
    }

    /// Append exposures to an experiment's log.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or the backend fails
    pub async fn append_exposures(&self, experiment_id: &str, exposures: &[Exposure]) -> Result<()> {
        self.append(&key("exposures", experiment_id), exposures).await
    }

    /// Append metric values to an experiment's log.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or the backend fails
    pub async fn append_metric_values(&self, experiment_id: &str, values: &[MetricValue]) -> Result<()> {
        self.append(&key("metric_values", experiment_id), values).await
    }

    /// IDs of every stored experiment, sorted.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails
    pub async fn list_experiment_ids(&self) -> Result<Vec<String>> {
        Ok(self
            .kv
            .list_keys(EXPERIMENT_PREFIX)
            .await?
            .into_iter()
            .filter_map(|k| k.strip_prefix(EXPERIMENT_PREFIX).map(str::to_string))
            .collect())
    }

    /// Remove an experiment and all of its records.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails
    pub async fn delete_experiment(&self, experiment_id: &str) -> Result<()> {
        for kind in ["experiment", "variants", "metrics", "exposures", "metric_values"] {
            self.kv.delete(&key(kind, experiment_id)).await?;
        }
        Ok(())
    }

    /// Load one experiment with all of its records into an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the experiment does not exist, or error
    /// if any stored document is malformed
    pub async fn load_experiment(&self, experiment_id: &str) -> Result<ExperimentStore> {
        let experiment = self
            .get_experiment(experiment_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("experiment {experiment_id}")))?;

        let mut store = ExperimentStore::new();
        store.add_experiment(experiment);
        self.load_records_into(experiment_id, &mut store).await?;
        Ok(store)
    }

    /// Load every stored experiment into one in-memory store.
    ///
    /// # Errors
    ///
    /// Returns error if any stored document is malformed or the backend fails
    pub async fn load_all(&self) -> Result<ExperimentStore> {
        let mut store = ExperimentStore::new();
        for experiment_id in self.list_experiment_ids().await? {
            if let Some(experiment) = self.get_experiment(&experiment_id).await? {
                store.add_experiment(experiment);
                self.load_records_into(&experiment_id, &mut store).await?;
            }
        }
        Ok(store)
    }

    async fn load_records_into(&self, experiment_id: &str, store: &mut ExperimentStore) -> Result<()> {
        let variants: Vec<Variant> = self.get_json(&key("variants", experiment_id)).await?.unwrap_or_default();
        let metrics: Vec<Metric> = self.get_json(&key("metrics", experiment_id)).await?.unwrap_or_default();
        let exposures: Vec<Exposure> = self.get_json(&key("exposures", experiment_id)).await?.unwrap_or_default();
        let values: Vec<MetricValue> = self
            .get_json(&key("metric_values", experiment_id))
            .await?
            .unwrap_or_default();

        debug!(
            experiment_id,
            variants = variants.len(),
            exposures = exposures.len(),
            metric_values = values.len(),
            "loaded experiment records"
        );

        variants.into_iter().for_each(|v| store.add_variant(v));
        metrics.into_iter().for_each(|m| store.add_metric(m));
        exposures.into_iter().for_each(|e| store.add_exposure(e));
        values.into_iter().for_each(|v| store.add_metric_value(v));
        Ok(())
    }

    /// Persist every experiment in an in-memory store, replacing what is stored.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or the backend fails
    pub async fn save_store(&self, store: &ExperimentStore) -> Result<()> {
        for experiment_id in store.experiment_ids() {
            let Some(experiment) = store.get_experiment(experiment_id) else {
                continue;
            };
            self.save_experiment(experiment).await?;
            self.save_variants(experiment_id, store.variants(experiment_id)).await?;
            self.save_metrics(experiment_id, store.metrics(experiment_id)).await?;
            self.put_json(&key("exposures", experiment_id), store.exposures(experiment_id))
                .await?;
            self.put_json(&key("metric_values", experiment_id), store.metric_values(experiment_id))
                .await?;
        }
        Ok(())
    }
}
