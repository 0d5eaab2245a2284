//! Observability for the data access layer
//!
//! - Structured logging (JSON lines)
//! - Typed pipeline events
//! - Outcome counters
//!
//! # Usage
//!
//! ```ignore
//! use dataaccess::observability::{log_event_with_fields, Event, Logger, Severity};
//!
//! Logger::log(Severity::Info, "DRIVER_READY", &[("driver", "memory")]);
//! log_event_with_fields(Event::PipelineComplete, &[("operation", "insert")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{AccessMetrics, MetricsSnapshot};

/// Severity an event is logged at
pub fn severity_of(event: Event) -> Severity {
    match event {
        Event::PipelineFailed => Severity::Error,
        Event::PipelineComplete | Event::SchemaParsed => Severity::Trace,
        _ => Severity::Info,
    }
}

/// Log a typed event
pub fn log_event(event: Event) {
    Logger::log(severity_of(event), event.as_str(), &[]);
}

/// Log a typed event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity_of(event), event.as_str(), fields);
}

/// Log a typed event against `threshold` instead of the process-wide one
pub fn log_event_at(threshold: Option<Severity>, event: Event, fields: &[(&str, &str)]) {
    match threshold {
        Some(threshold) if severity_of(event) >= threshold => {
            Logger::write(severity_of(event), event.as_str(), fields)
        }
        Some(_) => {}
        None => log_event_with_fields(event, fields),
    }
}
