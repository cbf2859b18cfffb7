//! # Query Engine Errors
//!
//! Two classes only: caller input the engine rejects up front, and store
//! failures passed through untouched.

use thiserror::Error;

use crate::store::StoreError;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, QueryError>;

/// Query engine errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// `page` or `limit` is not a finite number, or is negative.
    /// Raised before the store is touched.
    #[error("Invalid pagination: {field} must be a non-negative number, got {value}")]
    InvalidPagination { field: &'static str, value: String },

    /// Any store failure, unchanged
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QueryError {
    pub(crate) fn invalid_pagination(field: &'static str, value: impl Into<String>) -> Self {
        QueryError::InvalidPagination {
            field,
            value: value.into(),
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::InvalidPagination { .. } => "LMS_INVALID_PAGINATION",
            QueryError::Store(_) => "LMS_STORE_FAILED",
        }
    }

    /// True when the caller's input caused the failure
    pub fn is_client_error(&self) -> bool {
        matches!(self, QueryError::InvalidPagination { .. })
    }

    /// The underlying store error, if any
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            QueryError::Store(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let err = QueryError::invalid_pagination("page", "-1");
        assert_eq!(err.code(), "LMS_INVALID_PAGINATION");
        assert!(err.is_client_error());
        assert_eq!(
            err.to_string(),
            "Invalid pagination: page must be a non-negative number, got -1"
        );

        let err = QueryError::from(StoreError::Unavailable("timeout".to_string()));
        assert_eq!(err.code(), "LMS_STORE_FAILED");
        assert!(!err.is_client_error());
        assert_eq!(err.to_string(), "Store unavailable: timeout");
    }
}
