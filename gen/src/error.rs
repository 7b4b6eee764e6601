//! Error type for script generation.

use std::path::PathBuf;

use completion_schema_core::ValidationError;
use thiserror::Error;

/// Errors that abort a generation run.
///
/// No partial script is ever returned alongside an error.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The command model failed validation.
    #[error("invalid command definition:\n{}", format_validation(.0))]
    Validation(Vec<ValidationError>),

    /// An include file could not be read.
    #[error("failed to read include file {}: {source}", path.display())]
    Include {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An invariant the generator relies on does not hold.
    #[error("internal error: {0}")]
    Internal(String),
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convenience alias for results with [`GenerateError`].
pub type Result<T> = std::result::Result<T, GenerateError>;
