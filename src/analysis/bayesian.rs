//! Bayesian analysis of conversion experiments
//!
//! Each variant's conversion rate gets a Beta posterior under a flat prior.
//! Probability to be best and expected loss are estimated by Monte Carlo.
//! Trials run in fixed-size batches whose RNGs are seeded from
//! `(seed, batch index)`, so a given seed produces the same numbers whether
//! the batches run on one thread or many.

use rand::rngs::StdRng;
use rand::SeedableRng;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AnalysisConfig;
use crate::experiment::{MetricValue, Variant};
use crate::stats::{BetaPosterior, PosteriorSampler};
use crate::{Error, Result};

/// Trials per Monte Carlo batch.
pub const MONTE_CARLO_BATCH_SIZE: usize = 1_000;

/// Two-sided 95% z used for credible intervals.
const CREDIBLE_Z: f64 = 1.96;

/// Odd 64-bit constant used to spread batch seeds.
const BATCH_SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Conversion counts for one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionData {
    /// Variant ID
    pub variant_id: String,
    /// Converted units
    pub successes: u64,
    /// Exposed units
    pub trials: u64,
}

impl ConversionData {
    /// Create conversion counts for a variant.
    #[must_use]
    pub fn new(variant_id: impl Into<String>, successes: u64, trials: u64) -> Self {
        Self {
            variant_id: variant_id.into(),
            successes,
            trials,
        }
    }
}

/// Derive conversion counts from raw metric values.
///
/// Trials are the distinct users with a value for `metric_id`; successes are
/// those users with at least one positive value.
#[must_use]
pub fn conversion_data_from_values(values: &[MetricValue], metric_id: &str) -> Vec<ConversionData> {
    let mut users: FxHashMap<&str, (FxHashSet<&str>, FxHashSet<&str>)> = FxHashMap::default();
    for mv in values.iter().filter(|mv| mv.metric_id() == metric_id) {
        let (seen, converted) = users.entry(mv.variant_id()).or_default();
        seen.insert(mv.user_id());
        if mv.value() > 0.0 {
            converted.insert(mv.user_id());
        }
    }
    let mut data: Vec<ConversionData> = users
        .into_iter()
        .map(|(variant, (seen, converted))| {
            ConversionData::new(variant, converted.len() as u64, seen.len() as u64)
        })
        .collect();
    data.sort_by(|a, b| a.variant_id.cmp(&b.variant_id));
    data
}

/// Posterior summary for one variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BayesianResult {
    /// Variant ID
    pub variant_id: String,
    /// Variant display name
    pub variant_name: String,
    /// Posterior Beta parameters
    pub posterior: BetaPosterior,
    /// Posterior mean conversion rate
    pub posterior_mean: f64,
    /// Posterior standard deviation
    pub posterior_std: f64,
    /// 95% credible interval, clamped to [0, 1]
    pub credible_interval: (f64, f64),
    /// Share of Monte Carlo trials in which this variant drew the maximum
    pub probability_to_be_best: f64,
    /// Mean shortfall against the best other variant
    pub expected_loss: f64,
}

/// Monte Carlo estimates per variant, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloEstimate {
    /// Probability each posterior yields the largest draw
    pub probability_to_be_best: Vec<f64>,
    /// Expected loss of choosing each variant
    pub expected_loss: Vec<f64>,
}

#[derive(Debug, Clone)]
struct BatchTally {
    wins: Vec<f64>,
    loss: Vec<f64>,
}

/// Monte Carlo posterior comparison.
#[derive(Debug, Clone, Copy)]
pub struct BayesianAnalyzer {
    trials: usize,
    seed: u64,
}

impl Default for BayesianAnalyzer {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl BayesianAnalyzer {
    /// Create an analyzer running `trials` Monte Carlo trials from `seed`.
    #[must_use]
    pub const fn new(trials: usize, seed: u64) -> Self {
        Self { trials, seed }
    }

    /// Take the trial budget and seed from an analysis config.
    #[must_use]
    pub const fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.monte_carlo_trials(), config.seed())
    }

    /// Monte Carlo trial count.
    #[must_use]
    pub const fn trials(&self) -> usize {
        self.trials
    }

    /// Analyze every variant's conversion posterior.
    ///
    /// Variants without conversion data fall back to the flat prior.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if any variant reports more successes
    /// than trials, or if the trial budget is zero.
    pub fn analyze(&self, variants: &[Variant], data: &[ConversionData]) -> Result<Vec<BayesianResult>> {
        if self.trials == 0 {
            return Err(Error::InvalidInput("monte carlo trials must be positive".to_string()));
        }
        if let Some(bad) = data.iter().find(|d| d.successes > d.trials) {
            return Err(Error::InvalidInput(format!(
                "variant {} has {} successes out of {} trials",
                bad.variant_id, bad.successes, bad.trials
            )));
        }
        if variants.is_empty() {
            return Ok(Vec::new());
        }

        let posteriors: Vec<BetaPosterior> = variants
            .iter()
            .map(|variant| {
                data.iter()
                    .find(|d| d.variant_id == variant.variant_id())
                    .map_or_else(
                        || {
                            warn!(
                                variant_id = variant.variant_id(),
                                "no conversion data, using flat prior"
                            );
                            BetaPosterior::from_counts(0, 0)
                        },
                        |d| BetaPosterior::from_counts(d.successes, d.trials),
                    )
            })
            .collect();

        let estimate = self.simulate(&posteriors);
        debug!(
            variants = variants.len(),
            trials = self.trials,
            "bayesian simulation complete"
        );

        Ok(variants
            .iter()
            .zip(&posteriors)
            .enumerate()
            .map(|(i, (variant, posterior))| BayesianResult {
                variant_id: variant.variant_id().to_string(),
                variant_name: variant.name().to_string(),
                posterior: *posterior,
                posterior_mean: posterior.mean(),
                posterior_std: posterior.std_dev(),
                credible_interval: posterior.credible_interval(CREDIBLE_Z),
                probability_to_be_best: estimate.probability_to_be_best[i],
                expected_loss: estimate.expected_loss[i],
            })
            .collect())
    }

    /// Estimate probability-to-be-best and expected loss for each posterior.
    #[must_use]
    pub fn simulate(&self, posteriors: &[BetaPosterior]) -> MonteCarloEstimate {
        let k = posteriors.len();
        if k == 0 || self.trials == 0 {
            return MonteCarloEstimate {
                probability_to_be_best: vec![0.0; k],
                expected_loss: vec![0.0; k],
            };
        }

        let samplers: Vec<PosteriorSampler> = posteriors.iter().map(BetaPosterior::sampler).collect();
        let batches = self.trials.div_ceil(MONTE_CARLO_BATCH_SIZE);
        let run = |batch: usize| self.run_batch(&samplers, batch);

        #[cfg(feature = "rayon")]
        let tallies: Vec<BatchTally> = (0..batches).into_par_iter().map(run).collect();
        #[cfg(not(feature = "rayon"))]
        let tallies: Vec<BatchTally> = (0..batches).map(run).collect();

        // Summed in batch order so the result does not depend on scheduling.
        let mut wins = vec![0.0; k];
        let mut loss = vec![0.0; k];
        for tally in &tallies {
            for i in 0..k {
                wins[i] += tally.wins[i];
                loss[i] += tally.loss[i];
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let n = self.trials as f64;
        MonteCarloEstimate {
            probability_to_be_best: wins.into_iter().map(|w| w / n).collect(),
            expected_loss: loss.into_iter().map(|l| l / n).collect(),
        }
    }

    #[allow(clippy::float_cmp, clippy::cast_precision_loss)]
    fn run_batch(&self, samplers: &[PosteriorSampler], batch: usize) -> BatchTally {
        let k = samplers.len();
        let start = batch * MONTE_CARLO_BATCH_SIZE;
        let len = MONTE_CARLO_BATCH_SIZE.min(self.trials - start);
        let mut rng = StdRng::seed_from_u64(
            self.seed ^ (batch as u64 + 1).wrapping_mul(BATCH_SEED_STRIDE),
        );

        let mut wins = vec![0.0; k];
        let mut loss = vec![0.0; k];
        let mut draws = vec![0.0; k];

        for _ in 0..len {
            for (draw, sampler) in draws.iter_mut().zip(samplers) {
                *draw = sampler.sample(&mut rng);
            }

            let mut best = f64::NEG_INFINITY;
            let mut runner_up = f64::NEG_INFINITY;
            let mut best_index = 0;
            for (i, &d) in draws.iter().enumerate() {
                if d > best {
                    runner_up = best;
                    best = d;
                    best_index = i;
                } else if d > runner_up {
                    runner_up = d;
                }
            }

            let tied = draws.iter().filter(|&&d| d == best).count();
            let share = 1.0 / tied as f64;

            for (i, &d) in draws.iter().enumerate() {
                if d == best {
                    wins[i] += share;
                }
                if k > 1 {
                    let best_other = if i == best_index { runner_up } else { best };
                    loss[i] += (best_other - d).max(0.0);
                }
            }
        }

        BatchTally { wins, loss }
    }
}

/// Stop/continue verdict from posterior results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopDecision {
    /// Whether a winner can be declared
    pub should_stop: bool,
    /// Human-readable explanation
    pub reason: String,
    /// Variant ID of the declared winner
    pub winner: Option<String>,
}

/// Decide whether the posterior evidence is strong enough to stop.
///
/// A winner needs `probability_to_be_best >= min_probability` and
/// `expected_loss <= max_expected_loss`.
#[must_use]
pub fn should_stop_experiment(
    results: &[BayesianResult],
    min_probability: f64,
    max_expected_loss: f64,
) -> StopDecision {
    let best = results.iter().fold(None::<&BayesianResult>, |best, r| match best {
        Some(b) if b.probability_to_be_best >= r.probability_to_be_best => Some(b),
        _ => Some(r),
    });

    let Some(best) = best else {
        return StopDecision {
            should_stop: false,
            reason: "No results to evaluate".to_string(),
            winner: None,
        };
    };

    if best.probability_to_be_best >= min_probability && best.expected_loss <= max_expected_loss {
        debug!(variant_id = %best.variant_id, "bayesian stop: winner found");
        return StopDecision {
            should_stop: true,
            reason: format!(
                "{} has {:.1}% probability to be best with {:.4} expected loss",
                best.variant_name,
                best.probability_to_be_best * 100.0,
                best.expected_loss
            ),
            winner: Some(best.variant_id.clone()),
        };
    }

    let reason = if best.probability_to_be_best < 0.6 {
        "No clear winner yet, continue experiment"
    } else {
        "Continue to reach decision threshold"
    };
    StopDecision {
        should_stop: false,
        reason: reason.to_string(),
        winner: None,
    }
}
