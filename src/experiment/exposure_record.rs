//! Exposure Record - a unit was shown a variant

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Exposure Record is the immutable fact that a unit saw a variant.
///
/// A unit may be exposed many times; sample sizes count distinct
/// `user_id`s, never exposure rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exposure {
    experiment_id: String,
    variant_id: String,
    user_id: String,
    timestamp: DateTime<Utc>,
}

impl Exposure {
    /// Create an exposure stamped with the current time.
    #[must_use]
    pub fn new(
        experiment_id: impl Into<String>,
        variant_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self::at(experiment_id, variant_id, user_id, Utc::now())
    }

    /// Create an exposure with an explicit timestamp.
    #[must_use]
    pub fn at(
        experiment_id: impl Into<String>,
        variant_id: impl Into<String>,
        user_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            experiment_id: experiment_id.into(),
            variant_id: variant_id.into(),
            user_id: user_id.into(),
            timestamp,
        }
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the variant ID.
    #[must_use]
    pub fn variant_id(&self) -> &str {
        &self.variant_id
    }

    /// Get the exposed unit's ID.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Get the exposure timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
