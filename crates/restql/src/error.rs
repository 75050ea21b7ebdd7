//! Error types for the driver.

use restql_core::CompileError;
use thiserror::Error;

/// Driver errors, generic over the executor's own error type.
#[derive(Debug, Error)]
pub enum DriverError<E> {
    /// The request could not be compiled to SQL.
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    /// The executor rejected the statement. The error is passed through as is.
    #[error("database error: {0}")]
    Database(#[source] E),
}

impl<E> DriverError<E> {
    /// Returns the executor error, if this is one.
    #[must_use]
    pub const fn as_database(&self) -> Option<&E> {
        match self {
            Self::Database(e) => Some(e),
            Self::Compile(_) => None,
        }
    }
}

/// Result type alias for driver operations.
pub type Result<T, E> = std::result::Result<T, DriverError<E>>;
