//! Experiment health score

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::srm::srm_from_exposures;
use crate::config::{MIN_USERS_PER_VARIANT, SRM_P_VALUE_THRESHOLD};
use crate::experiment::{user_counts_by_variant, Exposure, Variant};

const PROGRESS_PENALTY: u32 = 20;
const SRM_PENALTY: u32 = 30;
const LOW_USERS_PENALTY: u32 = 10;

/// 0-100 score with the issues that cost points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    /// Health score, 100 is perfect
    pub score: u32,
    /// One entry per penalty applied
    pub issues: Vec<String>,
    /// Distinct users as a percentage of the target
    pub sample_size_progress: f64,
}

impl HealthReport {
    /// No issues found.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Score an experiment's data collection.
///
/// Starts at 100 and subtracts 20 when under half the target sample, 30 on
/// SRM, and 10 once when any configured variant has fewer than 100 users.
#[must_use]
pub fn health_score(
    experiment_id: &str,
    target_sample_size: u64,
    variants: &[Variant],
    exposures: &[Exposure],
) -> HealthReport {
    let distinct: FxHashSet<&str> = exposures.iter().map(Exposure::user_id).collect();
    #[allow(clippy::cast_precision_loss)]
    let sample_size_progress = if target_sample_size == 0 {
        100.0
    } else {
        distinct.len() as f64 / target_sample_size as f64 * 100.0
    };

    let mut penalty = 0;
    let mut issues = Vec::new();

    if sample_size_progress < 50.0 {
        penalty += PROGRESS_PENALTY;
        issues.push(format!(
            "Sample size at {sample_size_progress:.1}% of target"
        ));
    }

    let srm = srm_from_exposures(exposures, variants);
    if srm.p_value < SRM_P_VALUE_THRESHOLD {
        penalty += SRM_PENALTY;
        issues.push(format!(
            "Sample ratio mismatch detected (p = {:.6})",
            srm.p_value
        ));
    }

    let counts = user_counts_by_variant(exposures);
    let starved: Vec<&str> = variants
        .iter()
        .filter(|v| counts.get(v.variant_id()).copied().unwrap_or(0) < MIN_USERS_PER_VARIANT)
        .map(Variant::variant_id)
        .collect();
    if !starved.is_empty() {
        penalty += LOW_USERS_PENALTY;
        issues.push(format!(
            "Variants below {MIN_USERS_PER_VARIANT} users: {}",
            starved.join(", ")
        ));
    }

    let score = 100u32.saturating_sub(penalty);
    debug!(experiment_id, score, issues = issues.len(), "health score");
    HealthReport {
        score,
        issues,
        sample_size_progress,
    }
}
