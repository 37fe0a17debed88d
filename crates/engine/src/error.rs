//! Engine errors
//!
//! Domain failures pass through as `CoreError`; anything from the store is
//! an infrastructure fault the request layer may retry.

use speedy_core::CoreError;
use speedy_persistence::PersistenceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Store error: {0}")]
    Store(#[from] PersistenceError),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Store(PersistenceError::from(err))
    }
}

impl EngineError {
    /// The domain error, if this is one
    pub fn core(&self) -> Option<&CoreError> {
        match self {
            EngineError::Core(err) => Some(err),
            EngineError::Store(_) => None,
        }
    }

    /// Store faults and write contention are transient; other domain
    /// errors are final
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Core(err) => err.is_contention(),
            EngineError::Store(err) => err.is_database_error(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_are_final() {
        let err = EngineError::from(CoreError::AlreadyClaimed("join bonus".to_string()));
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "Already claimed: join bonus");
        assert!(err.core().unwrap().is_duplicate());
    }

    #[test]
    fn test_contention_is_retryable() {
        let err = EngineError::from(CoreError::Contention("withdrawal w-1".to_string()));
        assert!(err.is_retryable());
        assert!(!err.to_string().contains("pending"));
    }

    #[test]
    fn test_store_errors_are_retryable() {
        let err = EngineError::from(sqlx::Error::PoolTimedOut);
        assert!(err.is_retryable());
        assert!(err.core().is_none());
    }
}
