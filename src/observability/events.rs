//! Observable pipeline events
//!
//! Events are explicit and typed; each maps to a stable log code.

use std::fmt;

/// Observable events of the data access layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded from disk or string
    ConfigLoaded,

    // Pipeline outcomes
    /// Pass ran through the driver and finished
    PipelineComplete,
    /// Pre-callback took over the operation
    PipelineIntercepted,
    /// An "ing" event handler cancelled the operation
    PipelineCancelled,
    /// Empty write payload, no context built
    PipelineSkipped,
    /// Driver raised an error
    PipelineFailed,

    // Collaborators
    /// A schema expression was parsed
    SchemaParsed,
    /// The sequence generator was resolved
    SequenceResolved,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::PipelineComplete => "PIPELINE_COMPLETE",
            Event::PipelineIntercepted => "PIPELINE_INTERCEPTED",
            Event::PipelineCancelled => "PIPELINE_CANCELLED",
            Event::PipelineSkipped => "PIPELINE_SKIPPED",
            Event::PipelineFailed => "PIPELINE_FAILED",
            Event::SchemaParsed => "SCHEMA_PARSED",
            Event::SequenceResolved => "SEQUENCE_RESOLVED",
        }
    }

    /// Failures are logged at ERROR
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::PipelineFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
