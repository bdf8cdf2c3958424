//! Error types for the domain layer.
//!
//! [`CoreError`] is the taxonomy every service operation reports:
//! validation, lookup, and permission failures are precise and safe to
//! show; storage failures carry a human-readable message only, never
//! internal detail. The API layer maps each variant onto an HTTP status.

/// Errors that can occur in a domain service operation.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A required field was missing or malformed. The operation was not
    /// attempted.
    #[error("{0}")]
    Validation(String),

    /// A referenced entity does not exist. The operation was not attempted.
    #[error("{0}")]
    NotFound(String),

    /// The actor lacks permission for this operation.
    #[error("{0}")]
    Forbidden(String),

    /// The caller's credentials could not be verified.
    #[error("{0}")]
    Unauthenticated(String),

    /// The underlying store failed. Effects are whatever completed before
    /// the failure -- no compensating rollback is performed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl CoreError {
    /// Shorthand for a storage failure wrapping another error's message.
    pub fn storage<E: std::fmt::Display>(e: E) -> Self {
        Self::Storage(e.to_string())
    }
}
