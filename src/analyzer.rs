//! Experiment-level facade over the analyzers
//!
//! Looks up an experiment's records in an [`ExperimentStore`] and runs each
//! analysis with the configured alpha and Monte Carlo budget.

use chrono::{DateTime, Utc};

use crate::analysis::{
    self, bayesian::conversion_data_from_values, monitoring, BayesianAnalyzer, BayesianResult,
    ConversionData, ExperimentResult, ExperimentSummary, GuardrailCheck, GuardrailConfig,
    HealthReport, MonitoringAlert, SequentialTestResult, SrmCheck,
};
use crate::config::AnalysisConfig;
use crate::experiment::{Experiment, ExperimentStore, Metric};
use crate::stats::{required_sample_size, PowerAnalysisParams, PowerAnalysisResult};
use crate::{Error, Result};

/// Runs analyses for experiments held in an [`ExperimentStore`].
#[derive(Debug, Clone, Copy)]
pub struct ExperimentAnalyzer<'a> {
    store: &'a ExperimentStore,
    config: AnalysisConfig,
}

impl<'a> ExperimentAnalyzer<'a> {
    /// Analyzer with the default configuration.
    #[must_use]
    pub fn new(store: &'a ExperimentStore) -> Self {
        Self {
            store,
            config: AnalysisConfig::default(),
        }
    }

    /// Create an analyzer builder.
    #[must_use]
    pub fn builder(store: &'a ExperimentStore) -> ExperimentAnalyzerBuilder<'a> {
        ExperimentAnalyzerBuilder {
            store,
            config: AnalysisConfig::default(),
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Look up an experiment.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown ID
    pub fn experiment(&self, experiment_id: &str) -> Result<&'a Experiment> {
        self.store
            .get_experiment(experiment_id)
            .ok_or_else(|| Error::NotFound(format!("experiment {experiment_id}")))
    }

    fn metric(&self, experiment_id: &str, metric_id: &str) -> Result<&'a Metric> {
        self.store
            .metrics(experiment_id)
            .iter()
            .find(|m| m.metric_id() == metric_id)
            .ok_or_else(|| Error::NotFound(format!("metric {metric_id} in {experiment_id}")))
    }

    /// Frequentist results for one metric.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown experiment or metric, or
    /// `Error::InvalidConfiguration` for several controls
    pub fn compute_results(&self, experiment_id: &str, metric_id: &str) -> Result<Vec<ExperimentResult>> {
        self.experiment(experiment_id)?;
        let metric = self.metric(experiment_id, metric_id)?;
        analysis::compute_results(
            experiment_id,
            metric,
            self.store.variants(experiment_id),
            self.store.metric_values(experiment_id),
            self.config.alpha(),
        )
    }

    /// Frequentist results for every metric with data.
    ///
    /// # Errors
    ///
    /// Same as [`Self::compute_results`]
    pub fn compute_all_results(
        &self,
        experiment_id: &str,
    ) -> Result<std::collections::BTreeMap<String, Vec<ExperimentResult>>> {
        self.experiment(experiment_id)?;
        analysis::compute_all_results(
            experiment_id,
            self.store.metrics(experiment_id),
            self.store.variants(experiment_id),
            self.store.metric_values(experiment_id),
            self.config.alpha(),
        )
    }

    /// Bayesian analysis from explicit conversion counts.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown experiment, or
    /// `Error::InvalidInput` for successes above trials
    pub fn bayesian(&self, experiment_id: &str, data: &[ConversionData]) -> Result<Vec<BayesianResult>> {
        self.experiment(experiment_id)?;
        BayesianAnalyzer::from_config(&self.config).analyze(self.store.variants(experiment_id), data)
    }

    /// Bayesian analysis of a conversion metric's recorded values.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown experiment or metric
    pub fn bayesian_for_metric(&self, experiment_id: &str, metric_id: &str) -> Result<Vec<BayesianResult>> {
        self.metric(experiment_id, metric_id)?;
        let data = conversion_data_from_values(self.store.metric_values(experiment_id), metric_id);
        self.bayesian(experiment_id, &data)
    }

    /// Interim look at the primary metric's strongest treatment.
    ///
    /// Returns `None` while the primary metric has no treatment result.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown experiment, or
    /// `Error::InvalidConfiguration` for an ambiguous primary metric
    pub fn sequential(&self, experiment_id: &str) -> Result<Option<SequentialTestResult>> {
        let experiment = self.experiment(experiment_id)?;
        let primary = analysis::summary::primary_metric(self.store.metrics(experiment_id))?;
        let results = self.compute_results(experiment_id, primary.metric_id())?;
        let Some(strongest) = results
            .iter()
            .filter(|r| !r.is_control)
            .min_by(|a, b| a.p_value.total_cmp(&b.p_value))
        else {
            return Ok(None);
        };
        Ok(Some(analysis::sequential::evaluate(
            self.store.distinct_users(experiment_id) as u64,
            experiment.target_sample_size(),
            strongest,
            self.config.alpha(),
        )))
    }

    /// Sample ratio mismatch check over distinct exposed users.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown experiment
    pub fn srm(&self, experiment_id: &str) -> Result<SrmCheck> {
        self.experiment(experiment_id)?;
        Ok(analysis::srm_from_exposures(
            self.store.exposures(experiment_id),
            self.store.variants(experiment_id),
        ))
    }

    /// Guardrail checks.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown experiment, or
    /// `Error::InvalidConfiguration` for a guardrail on a primary metric
    pub fn check_guardrails(&self, experiment_id: &str, configs: &[GuardrailConfig]) -> Result<Vec<GuardrailCheck>> {
        self.experiment(experiment_id)?;
        analysis::check_guardrails(
            experiment_id,
            self.store.metrics(experiment_id),
            self.store.metric_values(experiment_id),
            self.store.variants(experiment_id),
            configs,
            self.config.alpha(),
        )
    }

    /// Health score.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown experiment
    pub fn health(&self, experiment_id: &str) -> Result<HealthReport> {
        let experiment = self.experiment(experiment_id)?;
        Ok(analysis::health_score(
            experiment_id,
            experiment.target_sample_size(),
            self.store.variants(experiment_id),
            self.store.exposures(experiment_id),
        ))
    }

    /// Every active alert: traffic, SRM, metric anomalies, then guardrails.
    ///
    /// # Errors
    ///
    /// Same as [`Self::check_guardrails`]
    pub fn alerts(
        &self,
        experiment_id: &str,
        guardrails: &[GuardrailConfig],
        now: DateTime<Utc>,
    ) -> Result<Vec<MonitoringAlert>> {
        let experiment = self.experiment(experiment_id)?;
        let exposures = self.store.exposures(experiment_id);

        let mut alerts = monitoring::monitor_traffic(experiment, exposures, now);
        alerts.extend(monitoring::srm_alert(experiment_id, &self.srm(experiment_id)?, now));
        alerts.extend(monitoring::detect_outliers(
            experiment_id,
            self.store.metrics(experiment_id),
            self.store.metric_values(experiment_id),
            now,
        ));
        alerts.extend(
            self.check_guardrails(experiment_id, guardrails)?
                .iter()
                .filter_map(|check| check.to_alert(experiment_id, now)),
        );
        Ok(alerts)
    }

    /// Headline summary.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown experiment, or
    /// `Error::InvalidConfiguration` for an ambiguous primary metric
    pub fn summarize(&self, experiment_id: &str) -> Result<ExperimentSummary> {
        let experiment = self.experiment(experiment_id)?;
        analysis::summarize(
            experiment,
            self.store.variants(experiment_id),
            self.store.metrics(experiment_id),
            self.store.exposures(experiment_id),
            self.store.metric_values(experiment_id),
            self.config.alpha(),
        )
    }

    /// Sample size needed to detect `minimum_detectable_effect` percent lift
    /// on `baseline_rate`, at the configured alpha, power and daily traffic.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for rates or effects out of range
    pub fn power_analysis(&self, baseline_rate: f64, minimum_detectable_effect: f64) -> Result<PowerAnalysisResult> {
        let params = PowerAnalysisParams {
            alpha: self.config.alpha(),
            power: self.config.power(),
            ..PowerAnalysisParams::new(baseline_rate, minimum_detectable_effect)
        };
        required_sample_size(&params, self.config.daily_users_per_variant())
    }
}

/// Builder for [`ExperimentAnalyzer`]
#[derive(Debug)]
pub struct ExperimentAnalyzerBuilder<'a> {
    store: &'a ExperimentStore,
    config: AnalysisConfig,
}

impl<'a> ExperimentAnalyzerBuilder<'a> {
    /// Use an analysis configuration
    #[must_use]
    pub const fn config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the analyzer
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is out of range
    pub fn build(self) -> Result<ExperimentAnalyzer<'a>> {
        self.config.validate()?;
        Ok(ExperimentAnalyzer {
            store: self.store,
            config: self.config,
        })
    }
}
