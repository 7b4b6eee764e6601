//! Applying configuration to a validated model.

use tracing::debug;

use crate::config::Config;
use crate::types::{CommandLine, ExtendedBool};
use crate::validate::{ValidationError, validate_command_line};
use crate::when::parse_when;

/// Validates `cmd` and returns an enhanced copy ready for code generation.
///
/// On the copy, every [`ExtendedBool::Inherit`] is resolved from `config`,
/// `when` strings are parsed into [`condition`](crate::CliOption::condition)
/// and the `disable_*` switches strip the corresponding features. The input
/// is never modified.
///
/// # Errors
///
/// Returns every validation problem if the model is invalid.
///
/// # Examples
///
/// ```
/// use completion_schema_core::*;
///
/// let mut cmd = CommandLine::new("example");
/// cmd.add_option(CliOption::new(["-v"]).with_hidden(true)).unwrap();
///
/// let config = Config { disable_hidden: true, ..Config::default() };
/// let enhanced = enhance(&cmd, &config).unwrap();
/// assert!(!enhanced.options[0].hidden);
/// assert_eq!(enhanced.options[0].repeatable, ExtendedBool::False);
/// assert!(cmd.options[0].hidden);
/// ```
pub fn enhance(cmd: &CommandLine, config: &Config) -> Result<CommandLine, Vec<ValidationError>> {
    let errors = validate_command_line(cmd);
    if !errors.is_empty() {
        return Err(errors);
    }
    let mut copy = cmd.clone();
    apply(&mut copy, config);
    debug!(program = %cmd.prog, "enhanced command model");
    Ok(copy)
}

fn apply(cmd: &mut CommandLine, config: &Config) {
    cmd.abbreviate_commands = resolve(cmd.abbreviate_commands, config.abbreviate_commands);
    cmd.abbreviate_options = resolve(cmd.abbreviate_options, config.abbreviate_options);
    cmd.inherit_options = resolve(cmd.inherit_options, config.inherit_options);

    for option in &mut cmd.options {
        option.repeatable = if config.disable_repeatable {
            ExtendedBool::True
        } else {
            resolve(option.repeatable, config.repeatable_options)
        };
        if config.disable_final {
            option.is_final = false;
        }
        if config.disable_hidden {
            option.hidden = false;
        }
        if config.disable_groups {
            option.groups.clear();
        }
        if config.disable_when {
            option.when = None;
        }
        // Validation has already accepted every condition.
        option.condition = option.when.as_deref().and_then(|w| parse_when(w).ok());
    }

    for positional in &mut cmd.positionals {
        if config.disable_when {
            positional.when = None;
        }
        positional.condition = positional.when.as_deref().and_then(|w| parse_when(w).ok());
    }

    if let Some(subcommands) = &mut cmd.subcommands {
        for sub in &mut subcommands.commands {
            apply(sub, config);
        }
    }
}

fn resolve(value: ExtendedBool, default: bool) -> ExtendedBool {
    ExtendedBool::from(value.resolve(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CliOption, Positional, Subcommands};

    fn sample() -> CommandLine {
        let mut cmd = CommandLine::new("example");
        cmd.add_option(
            CliOption::new(["--a"])
                .with_group("g")
                .with_final(true)
                .with_when("has_option --b"),
        )
        .unwrap();
        cmd.add_option(CliOption::new(["--b"]).with_repeatable(false))
            .unwrap();
        let subs = cmd.add_subcommands(Subcommands::new()).unwrap();
        let start = subs.add_command(CommandLine::new("start"));
        start
            .add_positional(Positional::new(1).with_when("has_option --a"))
            .unwrap();
        cmd
    }

    #[test]
    fn test_resolves_tristates_from_config() {
        let config = Config {
            inherit_options: true,
            repeatable_options: true,
            ..Config::default()
        };
        let enhanced = enhance(&sample(), &config).unwrap();
        assert_eq!(enhanced.inherit_options, ExtendedBool::True);
        assert_eq!(enhanced.abbreviate_options, ExtendedBool::False);
        assert_eq!(enhanced.options[0].repeatable, ExtendedBool::True);
        assert_eq!(enhanced.options[1].repeatable, ExtendedBool::False);
        assert_eq!(enhanced.commands()[0].inherit_options, ExtendedBool::True);
    }

    #[test]
    fn test_parses_conditions() {
        let enhanced = enhance(&sample(), &Config::default()).unwrap();
        assert!(enhanced.options[0].condition.is_some());
        assert!(enhanced.options[1].condition.is_none());
        assert!(enhanced.commands()[0].positionals[0].condition.is_some());
    }

    #[test]
    fn test_kill_switches() {
        let config = Config {
            disable_final: true,
            disable_groups: true,
            disable_when: true,
            disable_repeatable: true,
            ..Config::default()
        };
        let enhanced = enhance(&sample(), &config).unwrap();
        let a = &enhanced.options[0];
        assert!(!a.is_final);
        assert!(a.groups.is_empty());
        assert!(a.when.is_none() && a.condition.is_none());
        assert_eq!(enhanced.options[1].repeatable, ExtendedBool::True);
        assert!(enhanced.commands()[0].positionals[0].condition.is_none());
    }

    #[test]
    fn test_invalid_model_is_rejected() {
        let mut cmd = sample();
        cmd.options[1].when = Some("has_option".into());
        let errors = enhance(&cmd, &Config::default()).unwrap_err();
        assert_eq!(errors.len(), 1);
    }
}
