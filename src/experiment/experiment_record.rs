//! Experiment Record - root entity of an A/B test

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// Lifecycle status of an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentStatus {
    /// Being configured, not yet collecting data.
    Draft,
    /// Collecting exposures and metric values.
    Running,
    /// Temporarily halted.
    Paused,
    /// Finished; results are final.
    Completed,
    /// Retired. Terminal.
    Archived,
}

impl ExperimentStatus {
    /// Get the status name as string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }

    /// Whether `self -> to` is an allowed transition.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Draft | Self::Paused, Self::Running)
                | (Self::Running, Self::Paused)
                | (Self::Running | Self::Paused, Self::Completed)
                | (
                    Self::Draft | Self::Running | Self::Paused | Self::Completed,
                    Self::Archived
                )
        )
    }
}

impl fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of unit that gets randomized into variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RandomizationUnit {
    /// Logged-in user
    #[default]
    UserId,
    /// Browser or app session
    SessionId,
    /// Physical device
    DeviceId,
}

/// Experiment Record represents a configured A/B test.
///
/// Status transitions are the only mutation an experiment undergoes; every
/// analysis is derived from its exposures and metric values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Experiment {
    experiment_id: String,
    name: String,
    status: ExperimentStatus,
    target_sample_size: u64,
    traffic_allocation: f64,
    randomization_unit: RandomizationUnit,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl Experiment {
    /// Create a draft experiment with full traffic allocation.
    ///
    /// # Arguments
    ///
    /// * `experiment_id` - Unique identifier for the experiment
    /// * `name` - Human-readable name
    /// * `target_sample_size` - Distinct units needed for a full-power read
    #[must_use]
    pub fn new(
        experiment_id: impl Into<String>,
        name: impl Into<String>,
        target_sample_size: u64,
    ) -> Self {
        Self::builder(experiment_id, name, target_sample_size).build()
    }

    /// Create a builder for constructing an experiment with optional fields.
    #[must_use]
    pub fn builder(
        experiment_id: impl Into<String>,
        name: impl Into<String>,
        target_sample_size: u64,
    ) -> ExperimentBuilder {
        ExperimentBuilder::new(experiment_id, name, target_sample_size)
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the current status.
    #[must_use]
    pub const fn status(&self) -> ExperimentStatus {
        self.status
    }

    /// Get the target sample size (distinct units).
    #[must_use]
    pub const fn target_sample_size(&self) -> u64 {
        self.target_sample_size
    }

    /// Get the traffic allocation percentage (0-100).
    #[must_use]
    pub const fn traffic_allocation(&self) -> f64 {
        self.traffic_allocation
    }

    /// Get the randomization unit kind.
    #[must_use]
    pub const fn randomization_unit(&self) -> RandomizationUnit {
        self.randomization_unit
    }

    /// Get the start timestamp, if the experiment has started.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Get the end timestamp, if the experiment has completed.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Move the experiment to `to`.
    ///
    /// The first transition into `Running` stamps `started_at`; entering
    /// `Completed` stamps `ended_at`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidTransition` if the lifecycle forbids the move
    /// (for example anything out of `Archived`).
    pub fn transition(&mut self, to: ExperimentStatus) -> Result<()> {
        if !self.status.can_transition_to(to) {
            return Err(Error::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        match to {
            ExperimentStatus::Running if self.started_at.is_none() => {
                self.started_at = Some(Utc::now());
            }
            ExperimentStatus::Completed => self.ended_at = Some(Utc::now()),
            _ => {}
        }
        self.status = to;
        Ok(())
    }
}

/// Builder for `Experiment`.
#[derive(Debug)]
pub struct ExperimentBuilder {
    experiment_id: String,
    name: String,
    status: ExperimentStatus,
    target_sample_size: u64,
    traffic_allocation: f64,
    randomization_unit: RandomizationUnit,
    started_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl ExperimentBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(
        experiment_id: impl Into<String>,
        name: impl Into<String>,
        target_sample_size: u64,
    ) -> Self {
        Self {
            experiment_id: experiment_id.into(),
            name: name.into(),
            status: ExperimentStatus::Draft,
            target_sample_size,
            traffic_allocation: 100.0,
            randomization_unit: RandomizationUnit::UserId,
            started_at: None,
            created_at: Utc::now(),
        }
    }

    /// Set the traffic allocation percentage, clamped to 0-100.
    #[must_use]
    pub fn traffic_allocation(mut self, pct: f64) -> Self {
        self.traffic_allocation = pct.clamp(0.0, 100.0);
        self
    }

    /// Set the randomization unit.
    #[must_use]
    pub const fn randomization_unit(mut self, unit: RandomizationUnit) -> Self {
        self.randomization_unit = unit;
        self
    }

    /// Set the initial status (useful when rehydrating stored experiments).
    #[must_use]
    pub const fn status(mut self, status: ExperimentStatus) -> Self {
        self.status = status;
        self
    }

    /// Set a custom start timestamp.
    #[must_use]
    pub const fn started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = Some(started_at);
        self
    }

    /// Set a custom creation timestamp (useful for deserialization/testing).
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Build the `Experiment`.
    #[must_use]
    pub fn build(self) -> Experiment {
        Experiment {
            experiment_id: self.experiment_id,
            name: self.name,
            status: self.status,
            target_sample_size: self.target_sample_size,
            traffic_allocation: self.traffic_allocation,
            randomization_unit: self.randomization_unit,
            started_at: self.started_at,
            ended_at: None,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experiment_new_is_draft() {
        let exp = Experiment::new("exp-1", "Checkout button", 10_000);
        assert_eq!(exp.status(), ExperimentStatus::Draft);
        assert!((exp.traffic_allocation() - 100.0).abs() < f64::EPSILON);
        assert!(exp.started_at().is_none());
    }

    #[test]
    fn test_experiment_lifecycle() {
        let mut exp = Experiment::new("exp-1", "Checkout button", 10_000);
        exp.transition(ExperimentStatus::Running).unwrap();
        let started = exp.started_at();
        assert!(started.is_some());

        exp.transition(ExperimentStatus::Paused).unwrap();
        exp.transition(ExperimentStatus::Running).unwrap();
        assert_eq!(exp.started_at(), started);

        exp.transition(ExperimentStatus::Completed).unwrap();
        assert!(exp.ended_at().is_some());
        exp.transition(ExperimentStatus::Archived).unwrap();
    }

    #[test]
    fn test_archived_is_terminal() {
        let mut exp = Experiment::new("exp-1", "x", 1);
        exp.transition(ExperimentStatus::Archived).unwrap();
        for to in [
            ExperimentStatus::Draft,
            ExperimentStatus::Running,
            ExperimentStatus::Paused,
            ExperimentStatus::Completed,
            ExperimentStatus::Archived,
        ] {
            assert!(exp.transition(to).is_err());
        }
    }

    #[test]
    fn test_draft_cannot_complete() {
        let mut exp = Experiment::new("exp-1", "x", 1);
        let err = exp.transition(ExperimentStatus::Completed).unwrap_err();
        assert!(err.to_string().contains("draft -> completed"));
    }

    #[test]
    fn test_traffic_allocation_saturates() {
        let exp = Experiment::builder("exp-1", "x", 1)
            .traffic_allocation(150.0)
            .build();
        assert!((exp.traffic_allocation() - 100.0).abs() < f64::EPSILON);
    }
}
