//! Experiment analyzers
//!
//! Pure functions over experiment records. Nothing here does I/O or keeps
//! state between calls; pass the records in, get plain serializable results
//! out.
//!
//! - [`frequentist`]: Welch t-test results table per metric
//! - [`bayesian`]: Beta posteriors, probability to be best, expected loss
//! - [`sequential`]: O'Brien-Fleming interim looks
//! - [`srm`]: sample ratio mismatch
//! - [`monitoring`]: traffic and anomaly alerts
//! - [`guardrails`]: guardrail thresholds and recommended action
//! - [`health`]: 0-100 health score
//! - [`summary`]: headline summary around the primary metric

pub mod bayesian;
pub mod frequentist;
pub mod guardrails;
pub mod health;
pub mod monitoring;
pub mod sequential;
pub mod srm;
pub mod summary;

pub use bayesian::{
    conversion_data_from_values, should_stop_experiment, BayesianAnalyzer, BayesianResult,
    ConversionData, StopDecision,
};
pub use frequentist::{
    compute_all_results, compute_results, has_reached_significance, welch_t_test,
    ExperimentResult, TTestResult, VariantStats,
};
pub use guardrails::{
    check_guardrails, recommend_action, Action, ActionRecommendation, GuardrailCheck,
    GuardrailConfig, GuardrailSeverity, ThresholdDirection,
};
pub use health::{health_score, HealthReport};
pub use monitoring::{
    detect_outliers, monitor_traffic, traffic_velocity, AlertType, MonitoringAlert, Severity,
    TrafficVelocity,
};
pub use sequential::{alpha_per_look, alpha_spending, Recommendation, SequentialTestResult};
pub use srm::{detect_srm, srm_from_exposures, SrmCheck};
pub use summary::{summarize, ExperimentSummary};
