//! Analysis configuration
//!
//! Tunables callers may change (alpha, power, Monte Carlo budget and seed)
//! live in `AnalysisConfig`; thresholds that define what the health checks
//! mean are fixed constants.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// SRM is declared when the chi-square p-value falls below this.
pub const SRM_P_VALUE_THRESHOLD: f64 = 0.001;

/// Variants with fewer distinct users than this cost health points.
pub const MIN_USERS_PER_VARIANT: u64 = 100;

/// Default significance level.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Default statistical power for sample-size planning.
pub const DEFAULT_POWER: f64 = 0.8;

/// Default Monte Carlo trial count (stable to the third decimal).
pub const DEFAULT_MONTE_CARLO_TRIALS: usize = 10_000;

/// Default seed for the Monte Carlo generator.
pub const DEFAULT_SEED: u64 = 0x5eed_ab7e;

/// Default daily traffic per variant used for duration estimates.
pub const DEFAULT_DAILY_USERS_PER_VARIANT: u64 = 1_000;

/// Tunable analysis parameters.
///
/// # Example
///
/// ```rust
/// use trueno_ab::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .alpha(0.01)
///     .monte_carlo_trials(50_000)
///     .seed(7)
///     .build()?;
/// assert!((config.alpha() - 0.01).abs() < f64::EPSILON);
/// # Ok::<(), trueno_ab::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    alpha: f64,
    power: f64,
    monte_carlo_trials: usize,
    seed: u64,
    daily_users_per_variant: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            power: DEFAULT_POWER,
            monte_carlo_trials: DEFAULT_MONTE_CARLO_TRIALS,
            seed: DEFAULT_SEED,
            daily_users_per_variant: DEFAULT_DAILY_USERS_PER_VARIANT,
        }
    }
}

impl AnalysisConfig {
    /// Create a new config builder
    #[must_use]
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::default()
    }

    /// Parse a JSON document; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is malformed or the values are out of range
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Significance level.
    #[must_use]
    pub const fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Target power for sample-size planning.
    #[must_use]
    pub const fn power(&self) -> f64 {
        self.power
    }

    /// Monte Carlo trials per Bayesian analysis.
    #[must_use]
    pub const fn monte_carlo_trials(&self) -> usize {
        self.monte_carlo_trials
    }

    /// Monte Carlo seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Daily traffic per variant assumed by duration estimates.
    #[must_use]
    pub const fn daily_users_per_variant(&self) -> u64 {
        self.daily_users_per_variant
    }

    /// Check every field is in range.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfiguration` naming the offending field
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(Error::InvalidConfiguration(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }
        if !(self.power > 0.0 && self.power < 1.0) {
            return Err(Error::InvalidConfiguration(format!(
                "power must be in (0, 1), got {}",
                self.power
            )));
        }
        if self.monte_carlo_trials == 0 {
            return Err(Error::InvalidConfiguration(
                "monte_carlo_trials must be positive".to_string(),
            ));
        }
        if self.daily_users_per_variant == 0 {
            return Err(Error::InvalidConfiguration(
                "daily_users_per_variant must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for `AnalysisConfig`
#[derive(Debug, Default)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    /// Set the significance level
    #[must_use]
    pub const fn alpha(mut self, alpha: f64) -> Self {
        self.config.alpha = alpha;
        self
    }

    /// Set the target power
    #[must_use]
    pub const fn power(mut self, power: f64) -> Self {
        self.config.power = power;
        self
    }

    /// Set the Monte Carlo trial count
    #[must_use]
    pub const fn monte_carlo_trials(mut self, trials: usize) -> Self {
        self.config.monte_carlo_trials = trials;
        self
    }

    /// Set the Monte Carlo seed
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Set the assumed daily traffic per variant
    #[must_use]
    pub const fn daily_users_per_variant(mut self, users: u64) -> Self {
        self.config.daily_users_per_variant = users;
        self
    }

    /// Build the config
    ///
    /// # Errors
    ///
    /// Returns error if any value is out of range
    pub fn build(self) -> Result<AnalysisConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
