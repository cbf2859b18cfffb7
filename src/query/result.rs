//! Paginated result envelope

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page of rows plus the total number of matching rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult<T = Value> {
    /// Requested page (1-indexed)
    pub page: u64,
    /// Effective page size after clamping
    pub limit: u64,
    /// Rows matching the conditions, ignoring pagination
    pub total: u64,
    /// At most `limit` rows
    pub data: Vec<T>,
}

impl<T> QueryResult<T> {
    pub fn new(page: u64, limit: u64, total: u64, data: Vec<T>) -> Self {
        Self {
            page,
            limit,
            total,
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of pages at this limit
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(self.limit)
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> QueryResult<U> {
        QueryResult {
            page: self.page,
            limit: self.limit,
            total: self.total,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}

impl QueryResult<Value> {
    /// Deserialize every row into a typed entity
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<QueryResult<T>, serde_json::Error> {
        let data = self
            .data
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()?;
        Ok(QueryResult {
            page: self.page,
            limit: self.limit,
            total: self.total,
            data,
        })
    }
}
