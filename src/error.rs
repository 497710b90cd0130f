//! Error types for trueno-ab
//!
//! Only caller contract violations surface as errors. Data shortfalls (no
//! control yet, zero variance, empty posteriors) degrade locally and are
//! reported through the returned values instead.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// trueno-ab error types
#[derive(Error, Debug)]
pub enum Error {
    /// Input value outside its valid domain
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Experiment configuration is ambiguous or inconsistent
    #[error("Invalid configuration: {0}\nFix the experiment setup before analysing it")]
    InvalidConfiguration(String),

    /// Assignment was requested against an empty variant list
    #[error("Experiment {0} has no variants to assign to")]
    NoVariants(String),

    /// Experiment status transition is not allowed
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// Record missing from the store
    #[error("Not found: {0}")]
    NotFound(String),

    /// Record (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Record store error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
