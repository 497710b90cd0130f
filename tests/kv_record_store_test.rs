//! Record store round trips through the async KV boundary

use trueno_ab::experiment::{
    Experiment, ExperimentStatus, ExperimentStore, Exposure, Metric, MetricType, MetricValue,
    Variant,
};
use trueno_ab::kv::{KvStore, MemoryKvStore, RecordStore};
use trueno_ab::ExperimentAnalyzer;

fn seeded_store() -> ExperimentStore {
    let mut store = ExperimentStore::new();
    let mut experiment = Experiment::new("exp-1", "Search ranking", 100);
    experiment.transition(ExperimentStatus::Running).unwrap();
    store.add_experiment(experiment);
    store.add_experiment(Experiment::new("exp-2", "Onboarding", 50));
    store.add_variant(Variant::control("a", "exp-1", "Control", 50.0));
    store.add_variant(Variant::new("b", "exp-1", "Ranker v2", 50.0));
    store.add_metric(
        Metric::builder("ctr", "exp-1", "Click-through", MetricType::Conversion)
            .primary()
            .build(),
    );
    for i in 0..60 {
        for variant in ["a", "b"] {
            let user = format!("{variant}{i}");
            store.add_exposure(Exposure::new("exp-1", variant, user.clone()));
            let clicked = f64::from(u8::from(i % 4 == 0 || (variant == "b" && i % 4 == 1)));
            store.add_metric_value(MetricValue::new("exp-1", variant, "ctr", user, clicked));
        }
    }
    store
}

#[tokio::test]
async fn test_save_and_load_round_trip() {
    let records = RecordStore::new(MemoryKvStore::new());
    let original = seeded_store();
    records.save_store(&original).await.unwrap();

    assert_eq!(
        records.list_experiment_ids().await.unwrap(),
        vec!["exp-1".to_string(), "exp-2".to_string()]
    );

    let loaded = records.load_experiment("exp-1").await.unwrap();
    assert_eq!(loaded.get_experiment("exp-1"), original.get_experiment("exp-1"));
    assert_eq!(loaded.variants("exp-1"), original.variants("exp-1"));
    assert_eq!(loaded.exposures("exp-1"), original.exposures("exp-1"));
    assert_eq!(loaded.metric_values("exp-1").len(), 120);
    assert!(loaded.get_experiment("exp-2").is_none());
}

#[tokio::test]
async fn test_loaded_store_analyzes_like_original() {
    let records = RecordStore::new(MemoryKvStore::new());
    let original = seeded_store();
    records.save_store(&original).await.unwrap();
    let loaded = records.load_all().await.unwrap();

    let before = ExperimentAnalyzer::new(&original).compute_results("exp-1", "ctr").unwrap();
    let after = ExperimentAnalyzer::new(&loaded).compute_results("exp-1", "ctr").unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_documents_use_expected_keys() {
    let records = RecordStore::new(MemoryKvStore::new());
    records.save_store(&seeded_store()).await.unwrap();

    let kv = records.kv();
    for key in [
        "experiment:exp-1",
        "variants:exp-1",
        "metrics:exp-1",
        "exposures:exp-1",
        "metric_values:exp-1",
    ] {
        assert!(kv.exists(key).await.unwrap(), "missing {key}");
    }

    let raw = kv.get("variants:exp-1").await.unwrap().unwrap();
    let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
    assert_eq!(json.as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_delete_experiment_removes_all_documents() {
    let records = RecordStore::new(MemoryKvStore::new());
    records.save_store(&seeded_store()).await.unwrap();

    records.delete_experiment("exp-1").await.unwrap();
    assert_eq!(records.list_experiment_ids().await.unwrap(), vec!["exp-2".to_string()]);
    for key in [
        "experiment:exp-1",
        "variants:exp-1",
        "metrics:exp-1",
        "exposures:exp-1",
        "metric_values:exp-1",
    ] {
        assert!(!records.kv().exists(key).await.unwrap(), "left behind {key}");
    }
    assert_eq!(
        records.kv().list_keys("exposures:").await.unwrap(),
        vec!["exposures:exp-2".to_string()]
    );
}
