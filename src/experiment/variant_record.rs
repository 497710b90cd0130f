//! Variant Record - one arm of an experiment

use serde::{Deserialize, Serialize};

/// Variant Record represents one arm of an experiment.
///
/// Traffic splits are relative weights: assignment normalizes by their sum,
/// so `[50, 50]` and `[1, 1]` describe the same allocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Variant {
    variant_id: String,
    experiment_id: String,
    name: String,
    traffic_split: f64,
    is_control: bool,
}

impl Variant {
    /// Create a treatment variant.
    ///
    /// # Arguments
    ///
    /// * `variant_id` - Unique identifier for the variant
    /// * `experiment_id` - ID of the parent experiment
    /// * `name` - Human-readable name
    /// * `traffic_split` - Relative traffic weight (conventionally 0-100)
    #[must_use]
    pub fn new(
        variant_id: impl Into<String>,
        experiment_id: impl Into<String>,
        name: impl Into<String>,
        traffic_split: f64,
    ) -> Self {
        Self {
            variant_id: variant_id.into(),
            experiment_id: experiment_id.into(),
            name: name.into(),
            traffic_split,
            is_control: false,
        }
    }

    /// Create a control variant.
    #[must_use]
    pub fn control(
        variant_id: impl Into<String>,
        experiment_id: impl Into<String>,
        name: impl Into<String>,
        traffic_split: f64,
    ) -> Self {
        Self {
            is_control: true,
            ..Self::new(variant_id, experiment_id, name, traffic_split)
        }
    }

    /// Get the variant ID.
    #[must_use]
    pub fn variant_id(&self) -> &str {
        &self.variant_id
    }

    /// Get the parent experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the variant name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the relative traffic weight.
    #[must_use]
    pub const fn traffic_split(&self) -> f64 {
        self.traffic_split
    }

    /// Whether this variant is the baseline the others are compared against.
    #[must_use]
    pub const fn is_control(&self) -> bool {
        self.is_control
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_new_is_treatment() {
        let v = Variant::new("var-b", "exp-1", "Green button", 50.0);
        assert!(!v.is_control());
        assert_eq!(v.name(), "Green button");
    }

    #[test]
    fn test_variant_control() {
        let v = Variant::control("var-a", "exp-1", "Blue button", 50.0);
        assert!(v.is_control());
        assert_eq!(v.experiment_id(), "exp-1");
    }
}
