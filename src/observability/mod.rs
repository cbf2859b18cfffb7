//! Observability for the query engine
//!
//! - Structured logging (one JSON object per line)
//! - Typed lifecycle events
//!
//! Logging is read-only: it never alters what a query returns.
//!
//! ```ignore
//! use lms_query::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::QueryComplete, &[("entity", "course"), ("total", "42")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{set_min_severity, min_severity, Logger, Severity};

/// Log a lifecycle event at its default severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        log_event(Event::ServerStop);
        log_event_with_fields(Event::ConfigLoaded, &[("entities", "3")]);
    }
}
