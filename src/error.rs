//! Error types for the loadkit library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: Returned when a value cannot be produced: the loader
//!   failed, a pending computation was cancelled, or the loader does not
//!   support the requested capability (e.g. bulk loading).
//! - [`ConfigError`]: Returned when cache configuration parameters are invalid
//!   (e.g. zero shards).
//!
//! ## Example Usage
//!
//! ```
//! use loadkit::error::CacheError;
//!
//! let err = CacheError::msg("backend unavailable");
//! assert_eq!(err.to_string(), "failed to load value: backend unavailable");
//!
//! // Errors are cheap to clone so a failed computation can hand the same
//! // error to every waiter.
//! let copy = err.clone();
//! assert_eq!(copy.to_string(), err.to_string());
//! ```

use std::sync::Arc;

use thiserror::Error;

/// Result of a load or remapping step.
pub type LoadResult<T> = Result<T, CacheError>;

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Error returned when a cached value could not be produced.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The loader (or a remapping function) failed.
    #[error("failed to load value: {0}")]
    Load(#[source] Arc<dyn std::error::Error + Send + Sync + 'static>),

    /// The pending computation was cancelled before it completed.
    #[error("computation was cancelled")]
    Cancelled,

    /// The loader does not implement the requested operation.
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),
}

impl CacheError {
    /// Wraps an arbitrary error as a load failure.
    pub fn load<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Load(Arc::new(err))
    }

    /// Creates a load failure from a plain message.
    pub fn msg(msg: impl Into<String>) -> Self {
        Self::Load(Arc::new(Message(msg.into())))
    }

    /// Returns `true` if this error represents a cancelled computation.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
struct Message(String);

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when cache configuration parameters are invalid.
///
/// Produced by the builder's `try_build*` methods. Carries a human-readable
/// description of which parameter failed validation.
///
/// # Example
///
/// ```
/// use loadkit::builder::CacheBuilder;
///
/// let err = CacheBuilder::<u64, u64>::new().shards(0).try_build_store().unwrap_err();
/// assert!(err.to_string().contains("shard"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
