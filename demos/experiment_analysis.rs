//! Experiment Analysis: from assignment to decision
//!
//! Simulates a two-arm checkout experiment: units are hashed into variants,
//! conversions are recorded, records go through the KV record store, and the
//! analyzer reports frequentist, Bayesian, sequential and health results.
//!
//! Run with: RUST_LOG=trueno_ab=debug cargo run --example experiment_analysis

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;
use trueno_ab::analysis::{recommend_action, should_stop_experiment, GuardrailConfig, GuardrailSeverity};
use trueno_ab::assignment::Assigner;
use trueno_ab::experiment::{
    Experiment, ExperimentStatus, ExperimentStore, Metric, MetricType, MetricValue, Variant,
};
use trueno_ab::kv::{MemoryKvStore, RecordStore};
use trueno_ab::ExperimentAnalyzer;

const USERS: usize = 12_000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== Trueno-AB Experiment Analysis ===\n");

    let mut experiment = Experiment::builder("checkout-cta", "Checkout call-to-action", 10_000)
        .traffic_allocation(90.0)
        .build();
    experiment.transition(ExperimentStatus::Running)?;

    let variants = vec![
        Variant::control("blue", "checkout-cta", "Blue button", 50.0),
        Variant::new("green", "checkout-cta", "Green button", 50.0),
    ];
    let metrics = vec![
        Metric::builder("purchase", "checkout-cta", "Purchase", MetricType::Conversion)
            .primary()
            .minimum_detectable_effect(10.0)
            .build(),
        Metric::new("latency_ms", "checkout-cta", "Checkout latency", MetricType::Guardrail),
    ];

    let mut store = ExperimentStore::new();
    store.add_experiment(experiment.clone());
    variants.iter().cloned().for_each(|v| store.add_variant(v));
    metrics.iter().cloned().for_each(|m| store.add_metric(m));

    // Simulated traffic: green converts at 13.8% vs 12.4%.
    let assigner = Assigner::new();
    let mut rng = StdRng::seed_from_u64(42);
    for i in 0..USERS {
        let user = format!("user-{i:05}");
        let Some(exposure) =
            assigner.expose(&user, "checkout-cta", &variants, experiment.traffic_allocation())?
        else {
            continue;
        };
        let (rate, latency) = if exposure.variant_id() == "green" { (0.138, 410.0) } else { (0.124, 400.0) };
        let converted = f64::from(u8::from(rng.gen_bool(rate)));
        let variant_id = exposure.variant_id().to_string();
        store.add_exposure(exposure);
        store.add_metric_value(MetricValue::new("checkout-cta", &variant_id, "purchase", &user, converted));
        store.add_metric_value(MetricValue::new(
            "checkout-cta",
            &variant_id,
            "latency_ms",
            &user,
            latency + rng.gen_range(-50.0..50.0),
        ));
    }
    println!("Exposed users: {} of {USERS}", store.distinct_users("checkout-cta"));

    // Persist and reload through the KV boundary.
    let records = RecordStore::new(MemoryKvStore::new());
    records.save_store(&store).await?;
    let store = records.load_experiment("checkout-cta").await?;

    let analyzer = ExperimentAnalyzer::new(&store);

    println!("\n=== Power Analysis ===");
    let plan = analyzer.power_analysis(0.124, 10.0)?;
    println!(
        "  Need {} users per variant (~{} days at 1,000/day)",
        plan.required_sample_size_per_variant, plan.estimated_duration_days
    );

    println!("\n=== Frequentist Results (purchase) ===");
    for r in analyzer.compute_results("checkout-cta", "purchase")? {
        println!(
            "  {:<14} n={:<5} mean={:.4} CI=[{:.4}, {:.4}] p={:.4} uplift={:+.2}%{}",
            r.variant_name,
            r.sample_size,
            r.mean,
            r.confidence_interval.0,
            r.confidence_interval.1,
            r.p_value,
            r.relative_uplift,
            if r.is_significant { " *" } else { "" }
        );
    }

    println!("\n=== Bayesian Results ===");
    let bayes = analyzer.bayesian_for_metric("checkout-cta", "purchase")?;
    for r in &bayes {
        println!(
            "  {:<14} P(best)={:.3} loss={:.5}",
            r.variant_name, r.probability_to_be_best, r.expected_loss
        );
    }
    println!("  Decision: {}", should_stop_experiment(&bayes, 0.95, 0.01).reason);

    println!("\n=== Sequential Look ===");
    if let Some(look) = analyzer.sequential("checkout-cta")? {
        println!(
            "  {:?} (information {:.0}%, adjusted alpha {:.4}): {}",
            look.recommendation,
            look.information_fraction * 100.0,
            look.adjusted_alpha,
            look.reason
        );
    }

    println!("\n=== Guardrails ===");
    let guardrails = [GuardrailConfig::upper("latency_ms", 450.0, GuardrailSeverity::Critical)];
    let checks = analyzer.check_guardrails("checkout-cta", &guardrails)?;
    for check in &checks {
        println!("  {} {:.1} (threshold {:.1})", check.variant_name, check.current_value, check.threshold);
    }
    println!("  Action: {:?}", recommend_action(&checks).action);

    println!("\n=== Health ===");
    let summary = analyzer.summarize("checkout-cta")?;
    println!("  Score: {}/100", summary.health.score);
    for issue in &summary.health.issues {
        println!("  - {issue}");
    }
    println!(
        "  Winner: {}",
        summary.winning_variant.as_deref().unwrap_or("none yet")
    );

    Ok(())
}
