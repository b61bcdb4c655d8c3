use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    /// Carries the full `Validation failed: ...` message
    #[error("{0}")]
    ValidationError(String),

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Failure reported by a [`crate::UserStore`] backend. Opaque to the domain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Backend(String),
}
