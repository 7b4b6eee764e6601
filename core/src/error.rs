//! Error types raised while building a model or loading configuration.
//!
//! Validation problems found by walking a finished model are reported
//! separately as [`ValidationError`](crate::ValidationError) values.

use thiserror::Error;

/// Errors raised immediately by the model construction API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// An option must have at least one option string.
    #[error("option must define at least one option string")]
    EmptyOptionStrings,

    /// Option string does not look like `-x`, `--xxx` or `-xxx`.
    #[error("invalid option string: {0:?}")]
    InvalidOptionString(String),

    /// Positional numbers start at 1.
    #[error("invalid positional number: {0}")]
    InvalidPositionalNumber(usize),

    /// Two positionals of the same command share a number.
    #[error("duplicate positional number: {0}")]
    DuplicatePositional(usize),

    /// A command can only own one subcommands node.
    #[error("command {0:?} already has subcommands")]
    SubcommandsAlreadyDefined(String),
}

/// Errors that can occur while loading or saving a [`Config`](crate::Config).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// Convenience alias for results with [`ModelError`].
pub type Result<T> = std::result::Result<T, ModelError>;
