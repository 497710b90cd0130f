//! Experiment record schema tests
//!
//! Records are the input contract of every analyzer, so their serialized
//! shape and store behaviour are pinned here.

use chrono::{TimeZone, Utc};
use trueno_ab::experiment::{
    Experiment, ExperimentStatus, ExperimentStore, Exposure, Metric, MetricType, MetricValue,
    RandomizationUnit, Variant,
};

// =============================================================================
// Experiment Tests
// =============================================================================

#[test]
fn test_experiment_creation() {
    let experiment = Experiment::new("exp-001", "Checkout button", 20_000);

    assert_eq!(experiment.experiment_id(), "exp-001");
    assert_eq!(experiment.name(), "Checkout button");
    assert_eq!(experiment.status(), ExperimentStatus::Draft);
    assert_eq!(experiment.target_sample_size(), 20_000);
    assert_eq!(experiment.randomization_unit(), RandomizationUnit::UserId);
    assert!(experiment.created_at().timestamp() > 0);
}

#[test]
fn test_experiment_serialization() {
    let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let experiment = Experiment::builder("exp-002", "Pricing", 5_000)
        .traffic_allocation(25.0)
        .randomization_unit(RandomizationUnit::DeviceId)
        .created_at(created)
        .build();

    let json = serde_json::to_value(&experiment).expect("serialization failed");
    assert_eq!(json["status"], "draft");
    assert_eq!(json["randomization_unit"], "device_id");

    let back: Experiment = serde_json::from_value(json).expect("deserialization failed");
    assert_eq!(back, experiment);
}

#[test]
fn test_status_round_trip_names() {
    for (status, name) in [
        (ExperimentStatus::Draft, "draft"),
        (ExperimentStatus::Running, "running"),
        (ExperimentStatus::Paused, "paused"),
        (ExperimentStatus::Completed, "completed"),
        (ExperimentStatus::Archived, "archived"),
    ] {
        assert_eq!(status.as_str(), name);
        assert_eq!(serde_json::to_string(&status).unwrap(), format!("\"{name}\""));
    }
}

#[test]
fn test_paused_can_resume() {
    let mut experiment = Experiment::new("exp-003", "Onboarding", 1_000);
    experiment.transition(ExperimentStatus::Running).unwrap();
    experiment.transition(ExperimentStatus::Paused).unwrap();
    assert!(experiment.transition(ExperimentStatus::Running).is_ok());
    assert!(experiment.transition(ExperimentStatus::Draft).is_err());
}

// =============================================================================
// Variant / Metric Tests
// =============================================================================

#[test]
fn test_variant_control_flag() {
    let control = Variant::control("a", "exp-1", "Control", 50.0);
    let treatment = Variant::new("b", "exp-1", "Treatment", 50.0);
    assert!(control.is_control());
    assert!(!treatment.is_control());
    assert!((treatment.traffic_split() - 50.0).abs() < f64::EPSILON);
}

#[test]
fn test_metric_builder() {
    let metric = Metric::builder("conv", "exp-1", "Conversion", MetricType::Conversion)
        .primary()
        .minimum_detectable_effect(5.0)
        .build();
    assert!(metric.is_primary());
    assert_eq!(metric.minimum_detectable_effect(), Some(5.0));

    let json = serde_json::to_value(&metric).unwrap();
    assert_eq!(json["metric_type"], "conversion");
}

// =============================================================================
// ExperimentStore Tests
// =============================================================================

#[test]
fn test_store_groups_by_experiment() {
    let mut store = ExperimentStore::new();
    assert!(store.is_empty());

    store.add_experiment(Experiment::new("exp-1", "One", 10));
    store.add_experiment(Experiment::new("exp-2", "Two", 10));
    store.add_variant(Variant::control("a", "exp-1", "A", 50.0));
    store.add_variant(Variant::new("b", "exp-1", "B", 50.0));
    store.add_variant(Variant::control("x", "exp-2", "X", 100.0));

    assert_eq!(store.experiment_count(), 2);
    assert_eq!(store.experiment_ids(), vec!["exp-1", "exp-2"]);
    assert_eq!(store.variants("exp-1").len(), 2);
    assert_eq!(store.variants("exp-2").len(), 1);
    assert!(store.variants("exp-3").is_empty());
}

#[test]
fn test_store_counts_distinct_users() {
    let mut store = ExperimentStore::new();
    let t = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    store.add_exposure(Exposure::at("exp-1", "a", "u1", t));
    store.add_exposure(Exposure::at("exp-1", "a", "u1", t));
    store.add_exposure(Exposure::at("exp-1", "b", "u2", t));

    assert_eq!(store.exposure_count(), 3);
    assert_eq!(store.distinct_users("exp-1"), 2);
    let counts = store.user_counts_by_variant("exp-1");
    assert_eq!(counts.get("a"), Some(&1));
    assert_eq!(counts.get("b"), Some(&1));
}

#[test]
fn test_metric_value_timestamp() {
    let t = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let value = MetricValue::new("exp-1", "a", "rev", "u1", 19.99).with_timestamp(t);
    assert_eq!(value.timestamp(), t);
    assert!((value.value() - 19.99).abs() < f64::EPSILON);
}
