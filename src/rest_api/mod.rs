//! # REST API Module
//!
//! HTTP surface over the query engine:
//!
//! - `GET /api/:entity` filter mode
//! - `GET /api/:entity/search` search mode
//! - `GET /api/:entity/:id` single record
//! - `GET /health`

pub mod errors;
pub mod server;

pub use errors::{ErrorResponse, RestError, RestResult};
pub use server::{build_router, AppState, RELATIONS_KEY};
