//! # Trueno-AB: A/B Testing Analysis Engine
//!
//! **Version**: 0.1.0
//!
//! Trueno-AB assigns units to experiment variants deterministically and
//! turns exposures and metric observations into decisions: frequentist and
//! Bayesian comparisons, sequential stopping, sample ratio mismatch, anomaly
//! alerts, guardrails and an overall health score.
//!
//! ## Design Principles
//!
//! - **Determinism**: assignment is a pure hash of `(experiment, unit)`;
//!   Monte Carlo is seeded and partition-invariant
//! - **Pure analysis**: analyzers take records and return serializable
//!   results; storage lives behind the `kv` boundary
//! - **Degrade, don't fail**: missing data yields empty or neutral results,
//!   only contract violations are errors
//!
//! ## Example Usage
//!
//! ```rust
//! use trueno_ab::experiment::{Experiment, ExperimentStore, Metric, MetricType, MetricValue, Variant};
//! use trueno_ab::ExperimentAnalyzer;
//!
//! let mut store = ExperimentStore::new();
//! store.add_experiment(Experiment::new("exp-1", "Checkout button", 1_000));
//! store.add_variant(Variant::control("a", "exp-1", "Control", 50.0));
//! store.add_variant(Variant::new("b", "exp-1", "Green button", 50.0));
//! store.add_metric(Metric::builder("conv", "exp-1", "Conversion", MetricType::Conversion).primary().build());
//! for i in 0..100 {
//!     store.add_metric_value(MetricValue::new("exp-1", "a", "conv", format!("a{i}"), f64::from(i % 10 == 0)));
//!     store.add_metric_value(MetricValue::new("exp-1", "b", "conv", format!("b{i}"), f64::from(i % 5 == 0)));
//! }
//!
//! let analyzer = ExperimentAnalyzer::new(&store);
//! let results = analyzer.compute_results("exp-1", "conv")?;
//! assert_eq!(results.len(), 2);
//! assert!(results[1].relative_uplift > 0.0);
//! # Ok::<(), trueno_ab::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod analysis;
mod analyzer;
pub mod assignment;
pub mod config;
pub mod error;
pub mod experiment;
pub mod kv;
pub mod stats;

pub use analyzer::{ExperimentAnalyzer, ExperimentAnalyzerBuilder};
pub use config::AnalysisConfig;
pub use error::{Error, Result};
