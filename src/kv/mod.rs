//! Key-value persistence for experiment records
//!
//! The analyzers never touch storage; this module is the boundary where
//! records are written and read back. It offers:
//! - A `KvStore` trait with an async-first API (pforge `StateManager` shape)
//! - `MemoryKvStore`, a `DashMap`-backed in-memory backend
//! - `RecordStore`, which keeps experiment records as JSON documents
//!
//! # Example
//!
//! ```rust,no_run
//! use trueno_ab::kv::{KvStore, MemoryKvStore};
//!
//! # async fn example() -> trueno_ab::Result<()> {
//! let store = MemoryKvStore::new();
//!
//! store.set("experiment:exp-1", br#"{"name":"checkout"}"#.to_vec()).await?;
//! assert!(store.exists("experiment:exp-1").await?);
//! assert_eq!(store.list_keys("experiment:").await?, vec!["experiment:exp-1".to_string()]);
//!
//! store.delete("experiment:exp-1").await?;
//! assert!(!store.exists("experiment:exp-1").await?);
//! # Ok(())
//! # }
//! ```

mod memory;
mod records;

pub use memory::MemoryKvStore;
pub use records::RecordStore;

use crate::Result;
use std::future::Future;

/// Async key-value store.
pub trait KvStore: Send + Sync {
    /// Get a value by key.
    ///
    /// Returns `None` if the key doesn't exist.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Set a value for a key.
    ///
    /// Overwrites any existing value.
    fn set(&self, key: &str, value: Vec<u8>) -> impl Future<Output = Result<()>> + Send;

    /// Delete a key.
    ///
    /// No-op if the key doesn't exist.
    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Check if a key exists.
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool>> + Send;

    /// All keys starting with `prefix`, sorted.
    fn list_keys(&self, prefix: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Get multiple keys in a batch.
    ///
    /// Returns values in the same order as keys. Missing keys return `None`.
    fn batch_get(
        &self,
        keys: &[&str],
    ) -> impl Future<Output = Result<Vec<Option<Vec<u8>>>>> + Send {
        async move {
            let mut results = Vec::with_capacity(keys.len());
            for key in keys {
                results.push(self.get(key).await?);
            }
            Ok(results)
        }
    }

    /// Set multiple key-value pairs in a batch.
    fn batch_set(&self, pairs: Vec<(&str, Vec<u8>)>) -> impl Future<Output = Result<()>> + Send {
        async move {
            for (key, value) in pairs {
                self.set(key, value).await?;
            }
            Ok(())
        }
    }
}
