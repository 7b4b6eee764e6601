//! Validation of command models.
//!
//! [`validate_command_line`] walks every node of the tree and reports every
//! structural problem it finds, each tagged with the program path of the
//! owning node. Nothing is repaired or dropped; callers abort generation if
//! the list is not empty.
//!
//! # Examples
//!
//! ```
//! use completion_schema_core::*;
//!
//! let mut cmd = CommandLine::new("example");
//! cmd.add_option(CliOption::new(["--level"]).with_complete(Completion::range(9, 1)))
//!     .unwrap();
//!
//! let errors = validate_command_line(&cmd);
//! assert_eq!(errors.len(), 1);
//! assert!(matches!(errors[0], ValidationError::Completion { .. }));
//! assert!(errors[0].to_string().starts_with("example: option --level: range"));
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::completion::{Completion, CompletionError};
use crate::tree::{CommandTree, NodeId};
use crate::types::{CliOption, CommandLine, Positional, is_valid_option_string};
use crate::when::{WhenError, parse_when};

/// A problem found by [`validate_command_line`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{program}: program name cannot be empty")]
    EmptyProgramName { program: String },

    #[error("{program}: invalid option string {option:?}")]
    InvalidOptionString { program: String, option: String },

    #[error("{program}: duplicate option string {option:?}")]
    DuplicateOptionString { program: String, option: String },

    #[error("{program}: option {option} has a metavar but no completion")]
    MetavarWithoutCompletion { program: String, option: String },

    #[error("{program}: positionals must be numbered 1 to {expected}, found {found:?}")]
    NonContiguousPositionals {
        program: String,
        expected: usize,
        found: Vec<usize>,
    },

    #[error("{program}: repeatable positional #{number} must be the last positional")]
    RepeatableNotLast { program: String, number: usize },

    #[error("{program}: repeatable positional #{number} cannot be followed by subcommands")]
    RepeatableBeforeSubcommands { program: String, number: usize },

    #[error("{program}: duplicate subcommand name {name:?}")]
    DuplicateSubcommand { program: String, name: String },

    #[error("{program}: {subject}: {source}")]
    Completion {
        program: String,
        subject: String,
        source: CompletionError,
    },

    #[error("{program}: {subject}: invalid when condition {when:?}: {source}")]
    When {
        program: String,
        subject: String,
        when: String,
        source: WhenError,
    },

    #[error("{program}: {subject}: when condition refers to unknown option {option:?}")]
    UnknownWhenOption {
        program: String,
        subject: String,
        option: String,
    },
}

impl ValidationError {
    /// Program path of the node the problem was found in.
    pub fn program(&self) -> &str {
        match self {
            ValidationError::EmptyProgramName { program }
            | ValidationError::InvalidOptionString { program, .. }
            | ValidationError::DuplicateOptionString { program, .. }
            | ValidationError::MetavarWithoutCompletion { program, .. }
            | ValidationError::NonContiguousPositionals { program, .. }
            | ValidationError::RepeatableNotLast { program, .. }
            | ValidationError::RepeatableBeforeSubcommands { program, .. }
            | ValidationError::DuplicateSubcommand { program, .. }
            | ValidationError::Completion { program, .. }
            | ValidationError::When { program, .. }
            | ValidationError::UnknownWhenOption { program, .. } => program.as_str(),
        }
    }
}

fn option_subject(option: &CliOption) -> String {
    format!("option {}", option.display_name())
}

fn positional_subject(positional: &Positional) -> String {
    format!("positional #{}", positional.number)
}

/// Validates a command tree.
///
/// Returns every problem found, in pre-order of the tree.
pub fn validate_command_line(cmd: &CommandLine) -> Vec<ValidationError> {
    let tree = CommandTree::new(cmd);
    let mut errors = Vec::new();
    for id in tree.ids() {
        validate_node(&tree, id, &mut errors);
    }
    errors
}

fn validate_node(tree: &CommandTree<'_>, id: NodeId, errors: &mut Vec<ValidationError>) {
    let cmd = tree.command(id);
    let program = tree.program_path(id);

    if cmd.prog.trim().is_empty() {
        errors.push(ValidationError::EmptyProgramName {
            program: program.clone(),
        });
    }

    // Options usable in `when` conditions: this node's and every ancestor's.
    let known: HashSet<&str> = std::iter::once(id)
        .chain(tree.ancestors(id))
        .flat_map(|n| tree.command(n).options.iter())
        .flat_map(|o| o.option_strings.iter().map(String::as_str))
        .collect();

    let mut seen = HashSet::new();
    for option in &cmd.options {
        for s in &option.option_strings {
            if !is_valid_option_string(s) {
                errors.push(ValidationError::InvalidOptionString {
                    program: program.clone(),
                    option: s.clone(),
                });
            } else if !seen.insert(s.as_str()) {
                errors.push(ValidationError::DuplicateOptionString {
                    program: program.clone(),
                    option: s.clone(),
                });
            }
        }
        if option.metavar.is_some() && option.complete.is_none() {
            errors.push(ValidationError::MetavarWithoutCompletion {
                program: program.clone(),
                option: option.display_name().to_string(),
            });
        }
        let subject = option_subject(option);
        if let Some(complete) = &option.complete {
            check_completion(&program, &subject, complete, errors);
        }
        if let Some(when) = &option.when {
            check_when(&program, &subject, when, &known, errors);
        }
    }

    let mut numbers: Vec<usize> = cmd.positionals.iter().map(|p| p.number).collect();
    numbers.sort_unstable();
    if numbers.iter().enumerate().any(|(i, &n)| n != i + 1) {
        errors.push(ValidationError::NonContiguousPositionals {
            program: program.clone(),
            expected: numbers.len(),
            found: numbers.clone(),
        });
    }
    let last = numbers.last().copied().unwrap_or(0);
    for positional in &cmd.positionals {
        let subject = positional_subject(positional);
        if positional.repeatable {
            if positional.number != last {
                errors.push(ValidationError::RepeatableNotLast {
                    program: program.clone(),
                    number: positional.number,
                });
            } else if cmd.subcommands.is_some() {
                errors.push(ValidationError::RepeatableBeforeSubcommands {
                    program: program.clone(),
                    number: positional.number,
                });
            }
        }
        check_completion(&program, &subject, &positional.complete, errors);
        if let Some(when) = &positional.when {
            check_when(&program, &subject, when, &known, errors);
        }
    }

    let mut names = HashSet::new();
    for sub in cmd.commands() {
        for name in std::iter::once(&sub.prog).chain(sub.aliases.iter()) {
            if !names.insert(name.as_str()) {
                errors.push(ValidationError::DuplicateSubcommand {
                    program: program.clone(),
                    name: name.clone(),
                });
            }
        }
    }
}

fn check_completion(
    program: &str,
    subject: &str,
    complete: &Completion,
    errors: &mut Vec<ValidationError>,
) {
    if let Err(source) = complete.check() {
        errors.push(ValidationError::Completion {
            program: program.to_string(),
            subject: subject.to_string(),
            source,
        });
    }
}

fn check_when(
    program: &str,
    subject: &str,
    when: &str,
    known: &HashSet<&str>,
    errors: &mut Vec<ValidationError>,
) {
    match parse_when(when) {
        Ok(expr) => {
            for condition in expr.atoms() {
                for option in condition.options() {
                    if !known.contains(option.as_str()) {
                        errors.push(ValidationError::UnknownWhenOption {
                            program: program.to_string(),
                            subject: subject.to_string(),
                            option: option.clone(),
                        });
                    }
                }
            }
        }
        Err(source) => errors.push(ValidationError::When {
            program: program.to_string(),
            subject: subject.to_string(),
            when: when.to_string(),
            source,
        }),
    }
}
