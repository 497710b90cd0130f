//! Deterministic variant assignment
//!
//! A unit's bucket is a pure function of `(experiment_id, unit_id)` and the
//! ordered variant weights, so the same unit lands in the same variant on
//! every call and in every process. Traffic allocation hashes a separate
//! namespace (`experiment_id:traffic:unit_id`) so that inclusion sampling is
//! independent of the bucket a unit would get.
//!
//! # Example
//!
//! ```rust
//! use trueno_ab::assignment::{assign, include_in_experiment};
//! use trueno_ab::experiment::Variant;
//!
//! let variants = vec![
//!     Variant::control("a", "exp-1", "Control", 50.0),
//!     Variant::new("b", "exp-1", "Treatment", 50.0),
//! ];
//!
//! let first = assign("user-42", "exp-1", &variants).map(|v| v.variant_id().to_string());
//! let again = assign("user-42", "exp-1", &variants).map(|v| v.variant_id().to_string());
//! assert_eq!(first, again);
//! assert!(include_in_experiment("user-42", "exp-1", 100.0));
//! ```

mod cache;
mod hash;

pub use cache::AssignmentCache;
pub use hash::{hash_to_unit, murmur3_32};

use tracing::debug;

use crate::experiment::{Exposure, Variant};
use crate::{Error, Result};

/// Assign a unit to a variant.
///
/// Weights are normalized by their actual sum. Returns `None` for an empty
/// variant list or a non-positive total weight, meaning "not assigned".
#[must_use]
pub fn assign<'a>(unit_id: &str, experiment_id: &str, variants: &'a [Variant]) -> Option<&'a Variant> {
    let last = variants.last()?;
    let total: f64 = variants.iter().map(Variant::traffic_split).sum();
    if total <= 0.0 || !total.is_finite() {
        return None;
    }

    let point = hash_to_unit(experiment_id, unit_id);
    let mut cumulative = 0.0;
    for variant in variants {
        cumulative += variant.traffic_split();
        if point < cumulative / total {
            return Some(variant);
        }
    }

    // Rounding can leave the top boundary just below 1.0.
    Some(last)
}

/// Decide whether a unit falls inside the experiment's traffic allocation.
///
/// `traffic_allocation_pct` is 0-100; `<= 0` excludes everyone, `>= 100`
/// includes everyone.
#[must_use]
pub fn include_in_experiment(unit_id: &str, experiment_id: &str, traffic_allocation_pct: f64) -> bool {
    if traffic_allocation_pct >= 100.0 {
        return true;
    }
    if traffic_allocation_pct <= 0.0 {
        return false;
    }
    hash_to_unit(&format!("{experiment_id}:traffic"), unit_id) < traffic_allocation_pct / 100.0
}

/// Assignment front door: allocation check, bucketing and memoization.
///
/// Owns its `AssignmentCache`; create one per service (or per test) rather
/// than sharing hidden global state.
#[derive(Debug, Default)]
pub struct Assigner {
    cache: AssignmentCache,
}

impl Assigner {
    /// Create an assigner with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an assigner around an existing cache.
    #[must_use]
    pub const fn with_cache(cache: AssignmentCache) -> Self {
        Self { cache }
    }

    /// The assignment cache.
    #[must_use]
    pub const fn cache(&self) -> &AssignmentCache {
        &self.cache
    }

    /// Drop every memoized assignment.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Return the unit's variant, assigning it on first sight.
    ///
    /// Units outside the traffic allocation get `Ok(None)` and are not
    /// cached. A cached variant that no longer exists in `variants` is
    /// discarded and the unit is re-bucketed.
    ///
    /// # Errors
    ///
    /// * `Error::NoVariants` if `variants` is empty
    /// * `Error::InvalidConfiguration` if the traffic splits sum to zero or less
    pub fn get_or_assign(
        &self,
        unit_id: &str,
        experiment_id: &str,
        variants: &[Variant],
        traffic_allocation_pct: f64,
    ) -> Result<Option<Variant>> {
        if variants.is_empty() {
            return Err(Error::NoVariants(experiment_id.to_string()));
        }

        if let Some(cached) = self.cache.get(experiment_id, unit_id) {
            if let Some(variant) = variants.iter().find(|v| v.variant_id() == cached) {
                return Ok(Some(variant.clone()));
            }
            debug!(experiment_id, unit_id, variant_id = %cached, "cached variant no longer configured");
            self.cache.invalidate(experiment_id, unit_id);
        }

        if !include_in_experiment(unit_id, experiment_id, traffic_allocation_pct) {
            return Ok(None);
        }

        let variant = assign(unit_id, experiment_id, variants).ok_or_else(|| {
            Error::InvalidConfiguration(format!(
                "traffic splits of experiment {experiment_id} sum to zero"
            ))
        })?;
        self.cache
            .insert(experiment_id, unit_id, variant.variant_id());
        Ok(Some(variant.clone()))
    }

    /// Assign a unit and build the exposure record for it.
    ///
    /// # Errors
    ///
    /// Same as [`Assigner::get_or_assign`].
    pub fn expose(
        &self,
        unit_id: &str,
        experiment_id: &str,
        variants: &[Variant],
        traffic_allocation_pct: f64,
    ) -> Result<Option<Exposure>> {
        Ok(self
            .get_or_assign(unit_id, experiment_id, variants, traffic_allocation_pct)?
            .map(|variant| Exposure::new(experiment_id, variant.variant_id(), unit_id)))
    }
}
