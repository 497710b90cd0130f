//! Property-based tests for trueno-ab
//!
//! - Test statistical invariants
//! - Test assignment determinism and coverage
//! - Run with ProptestConfig::with_cases(100)

use std::collections::BTreeMap;

use proptest::prelude::*;
use trueno_ab::analysis::bayesian::BayesianAnalyzer;
use trueno_ab::analysis::frequentist::relative_uplift;
use trueno_ab::analysis::{alpha_spending, detect_srm, welch_t_test, VariantStats};
use trueno_ab::assignment::{assign, include_in_experiment};
use trueno_ab::experiment::Variant;
use trueno_ab::stats::BetaPosterior;

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// Between 1 and 6 variants with positive weights, the first one control.
fn arb_variants() -> impl Strategy<Value = Vec<Variant>> {
    proptest::collection::vec(0.1f64..100.0, 1..=6).prop_map(|weights| {
        weights
            .into_iter()
            .enumerate()
            .map(|(i, w)| {
                let id = format!("v{i}");
                if i == 0 {
                    Variant::control(id, "exp", "Control", w)
                } else {
                    Variant::new(id, "exp", format!("Treatment {i}"), w)
                }
            })
            .collect()
    })
}

fn arb_stats() -> impl Strategy<Value = VariantStats> {
    (-100.0f64..100.0, 0.01f64..50.0, 2u64..10_000)
        .prop_map(|(mean, variance, n)| VariantStats::from_summary(mean, variance, n))
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ========================================================================
    // Assignment Properties
    // ========================================================================

    /// Property: the same unit always lands in the same variant
    #[test]
    fn prop_assignment_deterministic(
        unit in "[a-zA-Z0-9_-]{1,32}",
        experiment in "[a-z0-9-]{1,16}",
        variants in arb_variants()
    ) {
        let first = assign(&unit, &experiment, &variants).map(Variant::variant_id);
        let second = assign(&unit, &experiment, &variants).map(Variant::variant_id);
        prop_assert_eq!(first, second);
    }

    /// Property: with positive weights every unit gets one of the variants
    #[test]
    fn prop_assignment_covers_input(
        unit in "\\PC{0,40}",
        variants in arb_variants()
    ) {
        let assigned = assign(&unit, "exp", &variants);
        prop_assert!(assigned.is_some());
        let id = assigned.unwrap().variant_id();
        prop_assert!(variants.iter().any(|v| v.variant_id() == id));
    }

    /// Property: inclusion at a lower allocation implies inclusion at a higher one
    #[test]
    fn prop_traffic_inclusion_monotone(
        unit in "[a-z0-9]{1,24}",
        low in 0.0f64..100.0,
        extra in 0.0f64..100.0
    ) {
        let high = (low + extra).min(100.0);
        if include_in_experiment(&unit, "exp", low) {
            prop_assert!(include_in_experiment(&unit, "exp", high));
        }
    }

    // ========================================================================
    // Frequentist Properties
    // ========================================================================

    /// Property: swapping control and treatment negates t and keeps p
    #[test]
    fn prop_t_test_symmetric(a in arb_stats(), b in arb_stats()) {
        let forward = welch_t_test(&a, &b, 0.05);
        let backward = welch_t_test(&b, &a, 0.05);
        prop_assert!((forward.t_statistic + backward.t_statistic).abs() < 1e-9);
        prop_assert!((forward.p_value - backward.p_value).abs() < 1e-12);
        prop_assert!((forward.degrees_of_freedom - backward.degrees_of_freedom).abs() < 1e-6);
    }

    /// Property: p-values stay in [0, 1]
    #[test]
    fn prop_p_value_bounded(a in arb_stats(), b in arb_stats()) {
        let test = welch_t_test(&a, &b, 0.05);
        prop_assert!((0.0..=1.0).contains(&test.p_value));
    }

    /// Property: relative uplift has the sign of the mean difference
    #[test]
    fn prop_uplift_sign(control in 0.001f64..1_000.0, treatment in 0.0f64..1_000.0) {
        let uplift = relative_uplift(control, treatment);
        if treatment > control {
            prop_assert!(uplift > 0.0);
        } else if treatment < control {
            prop_assert!(uplift < 0.0);
        } else {
            prop_assert!(uplift.abs() < f64::EPSILON);
        }
    }

    // ========================================================================
    // SRM Properties
    // ========================================================================

    /// Property: counts exactly matching the split never trigger SRM
    #[test]
    fn prop_srm_null(per_unit in 1u64..5_000, weights in proptest::collection::vec(1u64..10, 2..6)) {
        let total_weight: u64 = weights.iter().sum();
        let mut observed = BTreeMap::new();
        let mut ratios = BTreeMap::new();
        for (i, w) in weights.iter().enumerate() {
            observed.insert(format!("v{i}"), per_unit * w);
            ratios.insert(format!("v{i}"), *w as f64 / total_weight as f64);
        }
        let check = detect_srm(&observed, &ratios);
        prop_assert!(!check.has_srm);
        prop_assert!(check.p_value > 0.99, "p = {}", check.p_value);
    }

    // ========================================================================
    // Sequential Properties
    // ========================================================================

    /// Property: the spent alpha grows with information and never exceeds alpha
    #[test]
    fn prop_alpha_spending_monotone(t1 in 0.01f64..1.0, t2 in 0.01f64..1.0, alpha in 0.001f64..0.2) {
        let (lo, hi) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
        let spent_lo = alpha_spending(lo, alpha);
        let spent_hi = alpha_spending(hi, alpha);
        prop_assert!(spent_lo <= spent_hi + 1e-12);
        prop_assert!(spent_hi <= alpha + 1e-3);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Property: probabilities to be best sum to one
    #[test]
    fn prop_bayesian_probabilities_sum_to_one(
        counts in proptest::collection::vec((0u64..200, 0u64..200), 1..5),
        seed in any::<u64>()
    ) {
        let posteriors: Vec<BetaPosterior> = counts
            .iter()
            .map(|&(s, extra)| BetaPosterior::from_counts(s, s + extra))
            .collect();
        let estimate = BayesianAnalyzer::new(2_000, seed).simulate(&posteriors);
        let total: f64 = estimate.probability_to_be_best.iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-9);
        prop_assert!(estimate.expected_loss.iter().all(|l| *l >= 0.0));
    }
}
