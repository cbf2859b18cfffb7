//! # REST API Errors
//!
//! Maps engine failures to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::query::QueryError;

/// Result type for REST operations
pub type RestResult<T> = Result<T, RestError>;

/// REST API errors
#[derive(Debug, Clone, Error)]
pub enum RestError {
    /// Engine rejected the request or the store failed
    #[error(transparent)]
    Query(#[from] QueryError),

    /// No record with this id
    #[error("{entity} with id {id} not found")]
    NotFound { entity: String, id: String },
}

impl RestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RestError::Query(QueryError::InvalidPagination { .. }) => StatusCode::BAD_REQUEST,
            RestError::Query(QueryError::Store(e)) if e.is_not_found() => StatusCode::NOT_FOUND,
            RestError::Query(QueryError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            RestError::NotFound { .. } => StatusCode::NOT_FOUND,
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl From<RestError> for ErrorResponse {
    fn from(err: RestError) -> Self {
        Self {
            code: err.status_code().as_u16(),
            error: err.to_string(),
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(ErrorResponse::from(self));
        (status, body).into_response()
    }
}
