//! Experiment data model
//!
//! Configuration records (experiment, variants, metrics) and the immutable
//! facts the analyzers consume (exposures, metric values).
//!
//! ## Schema Overview
//!
//! ```text
//! Experiment (1) ──< Variant (N)
//!      │
//!      ├──< Metric (N)
//!      ├──< Exposure (N)      [experiment, variant, user, time]
//!      └──< MetricValue (N)   [experiment, variant, metric, user, value, time]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use trueno_ab::experiment::{
//!     Experiment, ExperimentStatus, ExperimentStore, Exposure, Metric, MetricType, Variant,
//! };
//!
//! let mut experiment = Experiment::new("exp-001", "Checkout button colour", 10_000);
//! experiment.transition(ExperimentStatus::Running).unwrap();
//!
//! let mut store = ExperimentStore::new();
//! store.add_experiment(experiment);
//! store.add_variant(Variant::control("blue", "exp-001", "Blue", 50.0));
//! store.add_variant(Variant::new("green", "exp-001", "Green", 50.0));
//! store.add_metric(Metric::builder("conv", "exp-001", "Conversion", MetricType::Conversion).primary().build());
//! store.add_exposure(Exposure::new("exp-001", "green", "user-42"));
//!
//! assert_eq!(store.distinct_users("exp-001"), 1);
//! ```

mod experiment_record;
mod exposure_record;
mod metric_record;
mod metric_value_record;
mod store;
mod variant_record;

pub use experiment_record::{Experiment, ExperimentBuilder, ExperimentStatus, RandomizationUnit};
pub use exposure_record::Exposure;
pub use metric_record::{Metric, MetricBuilder, MetricType};
pub use metric_value_record::MetricValue;
pub use store::{user_counts_by_variant, ExperimentStore};
pub use variant_record::Variant;
