//! Data Access Errors
//!
//! Unified error taxonomy for the access pipeline and its drivers.

use thiserror::Error;

/// Result type for data access operations
pub type DataResult<T> = Result<T, DataAccessError>;

/// Data access errors
#[derive(Debug, Error)]
pub enum DataAccessError {
    /// A required identifier or payload was empty or malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing naming mapping, missing dependency, unreadable config
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed schema expression
    #[error("Schema parse error at {position} in '{expression}': {message}")]
    SchemaParse {
        expression: String,
        position: usize,
        message: String,
    },

    /// Raised by a driver while performing I/O
    #[error("Backend error [{driver}]: {message}")]
    Backend { driver: String, message: String },

    /// The cancellation signal fired while the driver was working
    #[error("Operation cancelled")]
    Cancelled,

    /// Payload serialization or typed result extraction failed
    #[error("Conversion error: {0}")]
    Conversion(#[from] serde_json::Error),
}

impl DataAccessError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a schema parse error
    pub fn schema_parse(
        expression: impl Into<String>,
        position: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::SchemaParse {
            expression: expression.into(),
            position,
            message: message.into(),
        }
    }

    /// Create a backend error attributed to a driver
    pub fn backend(driver: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            driver: driver.into(),
            message: message.into(),
        }
    }

    /// Get error code for logs and callers
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "DATA_INVALID_ARGUMENT",
            Self::Configuration(_) => "DATA_CONFIGURATION",
            Self::SchemaParse { .. } => "DATA_SCHEMA_PARSE",
            Self::Backend { .. } => "DATA_BACKEND",
            Self::Cancelled => "DATA_CANCELLED",
            Self::Conversion(_) => "DATA_CONVERSION",
        }
    }

    /// Configuration mistakes cannot be recovered at runtime
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Check whether this is the cancellation signal
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
