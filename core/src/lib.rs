//! Canonical command-line model for shell completion generation.
//!
//! This crate defines the shell-agnostic description of a command-line
//! interface that completion generators consume:
//!
//! - [`CommandLine`] — a program or subcommand with options, positionals and
//!   an optional [`Subcommands`] node.
//! - [`CliOption`] / [`Positional`] — arguments, each with a
//!   [`Completion`] saying how its value is completed.
//! - [`parse_when`] — the condition language gating option and positional
//!   visibility, built on the generic [`expr`] module.
//! - [`Abbreviations`] — unique prefixes of long options and subcommands.
//! - [`glob`] — a Bash glob compiler targeting regexes and Zsh globs.
//! - [`CommandTree`] — ancestry queries (inherited options, exclusion
//!   partners, global positional numbers).
//!
//! Models are checked with [`validate_command_line`] and prepared for code
//! generation with [`enhance`], which applies a [`Config`].
//!
//! # Example
//!
//! ```
//! use completion_schema_core::*;
//!
//! let mut example = CommandLine::new("example");
//! example
//!     .add_option(
//!         CliOption::new(["-t", "--output-type"])
//!             .with_metavar("TYPE")
//!             .with_complete(Completion::choices(["rpm", "deb"])),
//!     )
//!     .unwrap();
//! example
//!     .add_option(
//!         CliOption::new(["--rpm-digest"])
//!             .with_metavar("ALGO")
//!             .with_complete(Completion::choices(["md5", "sha256"]))
//!             .with_when("option_is -t --output-type -- rpm"),
//!     )
//!     .unwrap();
//! example
//!     .add_positional(Positional::new(1).with_complete(Completion::file()).with_repeatable(true))
//!     .unwrap();
//!
//! assert!(validate_command_line(&example).is_empty());
//! let enhanced = enhance(&example, &Config::default()).unwrap();
//! assert!(enhanced.options[1].condition.is_some());
//! ```

mod abbreviation;
mod completion;
mod config;
mod enhance;
mod error;
pub mod expr;
pub mod glob;
mod tree;
mod types;
mod validate;
mod when;

pub use abbreviation::{Abbreviations, MIN_COMMAND_ABBREVIATION, MIN_OPTION_ABBREVIATION};
pub use completion::{
    Choice, Completion, CompletionError, FileCompletion, KeyValue, KeyValueListCompletion,
    ListCompletion, ValueListCompletion,
};
pub use config::{BashCompletionsVersion, Config};
pub use enhance::enhance;
pub use error::{ConfigError, ModelError};
pub use tree::{CommandTree, NodeId, OptionRef, TreeNode};
pub use types::*;
pub use validate::{ValidationError, validate_command_line};
pub use when::{Condition, WhenError, WhenExpr, parse_when};
