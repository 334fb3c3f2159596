//! Error types for the payroll cycle library.

use std::path::PathBuf;

use thiserror::Error;

/// Comprehensive error type for all cycle operations.
///
/// Business-visible failures (unchecked acknowledgement, locked step, failed
/// handler call) are not represented here; they surface through the modal
/// controller. A `CycleError` is either an infrastructure problem or a
/// programming/configuration defect.
#[derive(Error, Debug)]
pub enum CycleError {
    /// Database connection or query errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// Step id that is not part of the registry
    #[error("Step '{id}' is not part of the payroll cycle")]
    UnknownStep { id: String },
    /// Step id without an action handler
    #[error("No action handler registered for step '{id}'")]
    MissingHandler { id: String },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory lookup errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Builder for creating database errors with optional context.
pub struct DatabaseErrorBuilder {
    message: String,
}

impl DatabaseErrorBuilder {
    /// Create a new database error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: rusqlite::Error) -> CycleError {
        CycleError::Database {
            message: self.message,
            source,
        }
    }
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> CycleError {
        CycleError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl CycleError {
    /// Creates a builder for database errors.
    pub fn database(message: impl Into<String>) -> DatabaseErrorBuilder {
        DatabaseErrorBuilder::new(message)
    }

    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Shorthand for an unknown step id.
    pub fn unknown_step(id: impl Into<String>) -> Self {
        Self::UnknownStep { id: id.into() }
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| CycleError::database(message).with_source(e))
    }
}

/// Result type alias for cycle operations
pub type Result<T> = std::result::Result<T, CycleError>;
