//! # Store Collaborator
//!
//! The relational store the query engine reads from. The engine builds a
//! [`SelectQuery`] and hands it over in a single combined count + fetch
//! call; it never talks to storage any other way.

mod memory;

pub use memory::{MemoryStore, MemoryTable};

use serde_json::Value;
use thiserror::Error;

use crate::metadata::MetadataProvider;
use crate::query::SelectQuery;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures raised by the store.
///
/// The engine propagates these unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No table for the entity
    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    /// Join path names a relation the entity does not declare
    #[error("Relation \"{relation}\" was not found on entity \"{entity}\"")]
    UnknownRelation { entity: String, relation: String },

    /// Join rooted at an alias that is not part of the query
    #[error("Unknown alias: {0}")]
    UnknownAlias(String),

    /// Same alias joined twice
    #[error("Alias \"{0}\" is already used in this query")]
    DuplicateAlias(String),

    /// Condition references an unbound parameter
    #[error("Missing value for parameter :{0}")]
    MissingParameter(String),

    /// Store cannot be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Any other store failure
    #[error("Store error: {0}")]
    Internal(String),
}

impl StoreError {
    /// True when the failure is caused by a name the caller supplied
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::UnknownEntity(_) | StoreError::UnknownRelation { .. }
        )
    }
}

/// A relational store: entity metadata plus query execution
pub trait Store: MetadataProvider + Send + Sync {
    /// Execute `query`, returning the requested page of rows and the
    /// number of rows matching its conditions before skip/take.
    fn fetch_and_count(&self, query: &SelectQuery) -> StoreResult<(Vec<Value>, u64)>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = StoreError::UnknownRelation {
            entity: "class".to_string(),
            relation: "teacher".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Relation \"teacher\" was not found on entity \"class\""
        );
        assert!(err.is_not_found());
        assert!(!StoreError::DuplicateAlias("room".to_string()).is_not_found());
    }
}
