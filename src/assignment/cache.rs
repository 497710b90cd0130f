//! Assignment memoization.

use dashmap::DashMap;

/// Concurrent memo of `(experiment_id, unit_id) -> variant_id`.
///
/// Purely an optimization: assignment is a pure function of its inputs, so
/// dropping entries (or the whole cache) never changes an answer. Uses
/// `DashMap` so concurrent readers don't serialize on a single lock.
#[derive(Debug, Default)]
pub struct AssignmentCache {
    entries: DashMap<(String, String), String>,
}

impl AssignmentCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Create with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(capacity),
        }
    }

    /// Cached variant ID for a unit, if any.
    #[must_use]
    pub fn get(&self, experiment_id: &str, unit_id: &str) -> Option<String> {
        self.entries
            .get(&(experiment_id.to_string(), unit_id.to_string()))
            .map(|v| v.value().clone())
    }

    /// Remember an assignment.
    pub fn insert(&self, experiment_id: &str, unit_id: &str, variant_id: &str) {
        self.entries.insert(
            (experiment_id.to_string(), unit_id.to_string()),
            variant_id.to_string(),
        );
    }

    /// Forget one unit's assignment.
    pub fn invalidate(&self, experiment_id: &str, unit_id: &str) {
        self.entries
            .remove(&(experiment_id.to_string(), unit_id.to_string()));
    }

    /// Forget every assignment of one experiment.
    pub fn invalidate_experiment(&self, experiment_id: &str) {
        self.entries.retain(|(exp, _), _| exp != experiment_id);
    }

    /// Number of cached assignments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_insert_get() {
        let cache = AssignmentCache::new();
        cache.insert("exp-1", "u1", "var-a");
        assert_eq!(cache.get("exp-1", "u1"), Some("var-a".to_string()));
        assert_eq!(cache.get("exp-2", "u1"), None);
    }

    #[test]
    fn test_cache_invalidate() {
        let cache = AssignmentCache::with_capacity(4);
        cache.insert("exp-1", "u1", "var-a");
        cache.insert("exp-1", "u2", "var-b");
        cache.insert("exp-2", "u1", "var-c");

        cache.invalidate("exp-1", "u1");
        assert_eq!(cache.get("exp-1", "u1"), None);
        assert_eq!(cache.len(), 2);

        cache.invalidate_experiment("exp-1");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("exp-2", "u1"), Some("var-c".to_string()));
    }

    #[test]
    fn test_cache_clear() {
        let cache = AssignmentCache::new();
        cache.insert("exp-1", "u1", "var-a");
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_concurrent_access() {
        use std::sync::Arc;
        use std::thread;

        let cache = Arc::new(AssignmentCache::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..100 {
                        cache.insert("exp-1", &format!("u{t}-{i}"), "var-a");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 800);
    }
}
