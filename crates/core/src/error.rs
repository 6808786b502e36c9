//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every failure a caller can observe maps to exactly one variant, so the
/// HTTP layer can hand out a distinct, stable status signal per kind and a
/// client can tell "retry" apart from "final" without parsing messages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The referenced item does not exist. Terminal; not retried.
    #[error("item not found")]
    NotFound,

    /// The item's quantity was zero at evaluation time. Terminal; not retried.
    #[error("item is sold out")]
    SoldOut,

    /// Abnormal row-lock contention. Transient; safe for the caller to retry.
    #[error("server busy: {0}")]
    Busy(String),

    /// The backing store is unreachable (pool closed/timed out, IO failure).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Any unexpected condition after all expected paths are exhausted.
    /// Also the defensive signal for invariant violations that the state
    /// machine makes unreachable.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn busy(msg: impl Into<String>) -> Self {
        Self::Busy(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
