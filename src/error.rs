//! Error taxonomy for trust-engine state transitions.
//!
//! Any error aborts the whole transition: the staged writes are dropped and
//! nothing reaches the store.

/// Error raised by a rejected state transition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrustError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("not authorized: {0}")]
    NotAuthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid state: {0}")]
    InvalidState(String),
}

/// Fieldless discriminant of [`TrustError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    NotAuthorized,
    NotFound,
    AlreadyExists,
    InvalidState,
}

impl TrustError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TrustError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            TrustError::NotAuthorized(_) => ErrorKind::NotAuthorized,
            TrustError::NotFound(_) => ErrorKind::NotFound,
            TrustError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            TrustError::InvalidState(_) => ErrorKind::InvalidState,
        }
    }

    pub(crate) fn edge_not_found(edge_id: &str) -> Self {
        TrustError::NotFound(format!("edge {}", edge_id))
    }

    pub(crate) fn task_not_found(task_id: &str) -> Self {
        TrustError::NotFound(format!("task {}", task_id))
    }

    pub(crate) fn proposal_not_found(proposal_id: &str) -> Self {
        TrustError::NotFound(format!("proposal {}", proposal_id))
    }
}

pub type TrustResult<T> = Result<T, TrustError>;
