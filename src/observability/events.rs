//! Observable events
//!
//! Every log line the engine and its surfaces emit names one of these.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Query engine
    /// Filter-mode query received
    QueryStart,
    /// Filter-mode query returned a page
    QueryComplete,
    /// Search-mode query received
    SearchStart,
    /// Search-mode query returned a page
    SearchComplete,
    /// Single-record lookup returned
    LookupComplete,
    /// Pagination failed validation
    PaginationRejected,
    /// Sort column is not on the entity
    SortSkipped,
    /// Filter key is not on the entity
    FilterKeyDropped,
    /// Store returned an error
    StoreFailed,

    // HTTP
    /// Request answered
    RequestServed,

    // Lifecycle
    /// Configuration loaded
    ConfigLoaded,
    /// HTTP server is accepting connections
    ServerStart,
    /// HTTP server stopped
    ServerStop,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::QueryStart => "QUERY_BEGIN",
            Event::QueryComplete => "QUERY_COMPLETE",
            Event::SearchStart => "SEARCH_BEGIN",
            Event::SearchComplete => "SEARCH_COMPLETE",
            Event::LookupComplete => "LOOKUP_COMPLETE",
            Event::PaginationRejected => "PAGINATION_REJECTED",
            Event::SortSkipped => "SORT_SKIPPED",
            Event::FilterKeyDropped => "FILTER_KEY_DROPPED",
            Event::StoreFailed => "STORE_FAILED",
            Event::RequestServed => "HTTP_REQUEST",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ServerStart => "LMS_SERVING",
            Event::ServerStop => "LMS_STOPPED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::QueryStart
            | Event::SearchStart
            | Event::SortSkipped
            | Event::FilterKeyDropped => Severity::Trace,
            Event::PaginationRejected => Severity::Warn,
            Event::StoreFailed => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
