//! Error types for the generation pass.

use std::path::PathBuf;

use sqlweave_core::{CompileError, DdlError};

/// Errors that can occur while configuring or running a generation pass.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The `dbType` option names no supported dialect.
    #[error("Unsupported database type: '{0}'")]
    UnsupportedDatabase(String),

    /// A connection parameter required by the policy is absent.
    #[error("Missing connection parameter '{key}', required by DDL policy {policy}")]
    MissingParameter {
        /// Option key.
        key: &'static str,
        /// Policy that requires it.
        policy: String,
    },

    /// The connection URL does not parse or carries no database name.
    #[error("Cannot determine the database name from URL '{0}'")]
    InvalidUrl(String),

    /// IO error (reading inputs, writing outputs).
    #[error("IO error on '{path}': {source}")]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Malformed input document.
    #[error("Failed to parse '{path}': {source}")]
    Serialization {
        /// Path of the document.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// Database error during script execution.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A query unit failed to compile.
    #[error("Query '{unit}' failed: {source}")]
    Compile {
        /// Unit name.
        unit: String,
        /// Underlying error.
        source: CompileError,
    },

    /// The DDL script could not be generated.
    #[error("DDL generation failed: {0}")]
    Ddl(#[from] DdlError),

    /// Multiple errors occurred.
    #[error("Multiple errors occurred:\n{}", .0.iter().map(|e| format!("  - {e}")).collect::<Vec<_>>().join("\n"))]
    Multiple(Vec<GenerateError>),
}

/// Result type for generation operations.
pub type Result<T> = std::result::Result<T, GenerateError>;
