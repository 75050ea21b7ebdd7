//! Error types for statement compilation.

use thiserror::Error;

/// Errors raised when a request references something the schema does not
/// declare, or when a schema declaration cannot be decoded.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The table is not part of the schema.
    #[error("unknown table: {0}")]
    UnknownTable(String),

    /// The column is not declared on the table.
    #[error("unknown column '{column}' on table '{table}'")]
    UnknownColumn {
        /// Table the column was looked up on.
        table: String,
        /// Column name.
        column: String,
    },

    /// The relation is not declared on the table.
    #[error("unknown relation '{relation}' on table '{table}'")]
    UnknownRelation {
        /// Table the relation was looked up on.
        table: String,
        /// Relation name.
        relation: String,
    },

    /// The declaration is structurally wrong.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// The declaration is not valid JSON.
    #[error("schema decoding error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while compiling a request into SQL.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Schema lookup failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A primary-key operation was requested on a table without one.
    #[error("primary key not found for table {table}")]
    MissingPrimaryKey {
        /// Table name.
        table: String,
    },

    /// A filter tree decoded from JSON has an unusable shape.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// A request decoded from JSON has an unusable shape.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type alias for compilation.
pub type Result<T> = std::result::Result<T, CompileError>;
