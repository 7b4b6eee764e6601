//! Completion script generators for Bash, Fish and Zsh.
//!
//! [`generate`] validates and enhances a [`CommandLine`] with a [`Config`],
//! then renders a self-contained script for one shell. Every call works on
//! its own [`Context`](context::Context), so independent generations can run
//! in parallel; [`generate_all`] does exactly that with rayon.
//!
//! # Example
//!
//! ```
//! use completion_schema_core::*;
//! use completion_schema_gen::{Shell, generate};
//!
//! let mut example = CommandLine::new("example");
//! example
//!     .add_option(
//!         CliOption::new(["-t", "--output-type"])
//!             .with_metavar("TYPE")
//!             .with_complete(Completion::choices(["rpm", "deb"])),
//!     )
//!     .unwrap();
//!
//! let script = generate(Shell::Bash, &example, &Config::default()).unwrap();
//! assert!(script.contains("complete -F _example example"));
//! ```

use std::fmt;

use completion_schema_core::{CommandLine, CommandTree, Config, enhance};
use rayon::prelude::*;
use tracing::debug;

mod bash;
pub mod context;
mod document;
mod error;
pub mod escape;
mod fish;
pub mod helpers;
pub mod preprocessor;
mod zsh;

pub use error::{GenerateError, Result};

/// Target shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shell {
    Bash,
    Fish,
    Zsh,
}

impl Shell {
    pub const ALL: [Shell; 3] = [Shell::Bash, Shell::Fish, Shell::Zsh];

    pub fn name(self) -> &'static str {
        match self {
            Shell::Bash => "bash",
            Shell::Fish => "fish",
            Shell::Zsh => "zsh",
        }
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Generates the completion script for `shell`.
///
/// # Errors
///
/// Returns [`GenerateError::Validation`] with every problem of an invalid
/// model, [`GenerateError::Include`] if an include file cannot be read.
pub fn generate(shell: Shell, cmd: &CommandLine, config: &Config) -> Result<String> {
    let enhanced = enhance(cmd, config).map_err(GenerateError::Validation)?;
    let tree = CommandTree::new(&enhanced);
    debug!(%shell, program = %cmd.prog, nodes = tree.len(), "generating completion script");

    let mut ctx = context::Context::new(shell, tree, config);
    let sections = match shell {
        Shell::Bash => bash::generate(&mut ctx)?,
        Shell::Fish => fish::generate(&mut ctx)?,
        Shell::Zsh => zsh::generate(&mut ctx)?,
    };
    document::assemble(&ctx, sections)
}

/// Generates scripts for several shells in parallel.
///
/// Results are returned in the order of `shells`.
///
/// # Examples
///
/// ```
/// use completion_schema_core::{CommandLine, Config};
/// use completion_schema_gen::{Shell, generate_all};
///
/// let cmd = CommandLine::new("example");
/// let scripts = generate_all(&Shell::ALL, &cmd, &Config::default());
/// assert_eq!(scripts.len(), 3);
/// assert!(scripts.iter().all(|(_, s)| s.is_ok()));
/// ```
pub fn generate_all(
    shells: &[Shell],
    cmd: &CommandLine,
    config: &Config,
) -> Vec<(Shell, Result<String>)> {
    shells
        .par_iter()
        .map(|&shell| (shell, generate(shell, cmd, config)))
        .collect()
}
