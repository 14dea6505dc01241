//! Error types for the selection core.
//!
//! The library distinguishes two failure classes so callers can react to them
//! separately: malformed input data versus unusable run parameters. Everything
//! else (a summary shorter than the budget, an empty candidate pool) is normal
//! termination, not an error.

use thiserror::Error;

/// Errors surfaced by the scoring and selection APIs.
#[derive(Debug, Error)]
pub enum Error {
    /// The input mappings are inconsistent: a state is missing an entry, a
    /// q-value vector is empty, or feature vectors disagree on length.
    #[error("data integrity violation: {0}")]
    DataIntegrity(String),

    /// The run parameters cannot produce a valid selection (zero budget, a
    /// diversity subset larger than the population, ...). Detected before any
    /// candidate is examined.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;
