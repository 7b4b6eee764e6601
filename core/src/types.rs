//! Canonical command model.
//!
//! This module defines the shell-agnostic representation of a command-line
//! interface: programs and subcommands ([`CommandLine`]), their options
//! ([`CliOption`]) and positionals ([`Positional`]), and the nested
//! [`Subcommands`] node. Every type round-trips through serde so external
//! loaders can produce models from JSON or YAML.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::completion::Completion;
use crate::error::{ModelError, Result};
use crate::when::WhenExpr;

static OPTION_STRING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-[^\s,]+$").expect("static regex must compile"));

/// Returns `true` if `s` is a well-formed option string.
///
/// An option string is one leading dash followed by at least one character
/// that is neither whitespace nor a comma. The end-of-options marker `--` is
/// never an option string.
///
/// # Examples
///
/// ```
/// use completion_schema_core::is_valid_option_string;
///
/// assert!(is_valid_option_string("-v"));
/// assert!(is_valid_option_string("--verbose"));
/// assert!(is_valid_option_string("-name"));
/// assert!(!is_valid_option_string("--"));
/// assert!(!is_valid_option_string("-a,b"));
/// assert!(!is_valid_option_string("verbose"));
/// ```
pub fn is_valid_option_string(s: &str) -> bool {
    s != "--" && OPTION_STRING_RE.is_match(s)
}

/// A boolean that may defer to the global configuration.
///
/// Serialized as an optional bool: `null` (or a missing field) means
/// [`Inherit`](ExtendedBool::Inherit).
///
/// # Examples
///
/// ```
/// use completion_schema_core::ExtendedBool;
///
/// assert_eq!(ExtendedBool::default(), ExtendedBool::Inherit);
/// assert!(ExtendedBool::Inherit.resolve(true));
/// assert!(!ExtendedBool::False.resolve(true));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum ExtendedBool {
    True,
    False,
    #[default]
    Inherit,
}

impl ExtendedBool {
    /// Resolves the value, using `default` for [`Inherit`](ExtendedBool::Inherit).
    pub fn resolve(self, default: bool) -> bool {
        match self {
            ExtendedBool::True => true,
            ExtendedBool::False => false,
            ExtendedBool::Inherit => default,
        }
    }

    /// Returns `true` only for [`True`](ExtendedBool::True).
    pub fn is_true(self) -> bool {
        self == ExtendedBool::True
    }
}

impl From<bool> for ExtendedBool {
    fn from(value: bool) -> Self {
        if value {
            ExtendedBool::True
        } else {
            ExtendedBool::False
        }
    }
}

impl From<Option<bool>> for ExtendedBool {
    fn from(value: Option<bool>) -> Self {
        value.map_or(ExtendedBool::Inherit, ExtendedBool::from)
    }
}

impl From<ExtendedBool> for Option<bool> {
    fn from(value: ExtendedBool) -> Self {
        match value {
            ExtendedBool::True => Some(true),
            ExtendedBool::False => Some(false),
            ExtendedBool::Inherit => None,
        }
    }
}

/// Shape of an option string.
///
/// # Examples
///
/// ```
/// use completion_schema_core::OptionShape;
///
/// assert_eq!(OptionShape::classify("-v"), Some(OptionShape::Short));
/// assert_eq!(OptionShape::classify("--verbose"), Some(OptionShape::Long));
/// assert_eq!(OptionShape::classify("-verbose"), Some(OptionShape::OldStyle));
/// assert_eq!(OptionShape::classify("verbose"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionShape {
    /// `-x`
    Short,
    /// `--xxx`
    Long,
    /// `-xxx`
    OldStyle,
}

impl OptionShape {
    /// Classifies a well-formed option string, or returns `None`.
    pub fn classify(s: &str) -> Option<Self> {
        if !is_valid_option_string(s) {
            return None;
        }
        if s.starts_with("--") {
            Some(OptionShape::Long)
        } else if s.chars().count() == 2 {
            Some(OptionShape::Short)
        } else {
            Some(OptionShape::OldStyle)
        }
    }
}

/// Whether and how an option takes an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKind {
    /// Plain flag.
    None,
    /// The argument must be given.
    Required,
    /// The argument may be given, attached to the option string.
    Optional,
}

/// An option of a [`CommandLine`].
///
/// An option without a completion (`complete == None`) takes no argument.
/// Builder methods return `Self` so options can be described inline.
///
/// # Examples
///
/// ```
/// use completion_schema_core::{ArgKind, CliOption, Completion};
///
/// let output = CliOption::new(["-o", "--output"])
///     .with_metavar("FILE")
///     .with_help("Write output to FILE")
///     .with_complete(Completion::file());
/// assert_eq!(output.arg_kind(), ArgKind::Required);
/// assert_eq!(output.long_strings().collect::<Vec<_>>(), ["--output"]);
/// assert_eq!(output.display_name(), "--output");
///
/// let verbose = CliOption::new(["-v"]);
/// assert!(!verbose.takes_arg());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliOption {
    /// Every spelling of the option (`-o`, `--output`, ...).
    pub option_strings: Vec<String>,
    /// Placeholder name of the argument.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metavar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// How the argument is completed; `None` for flags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complete: Option<Completion>,
    /// The argument may be omitted.
    #[serde(default)]
    pub optional_arg: bool,
    /// Names of the mutual-exclusion groups this option belongs to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    #[serde(default)]
    pub repeatable: ExtendedBool,
    /// Once given, no further options are offered.
    #[serde(default, rename = "final")]
    pub is_final: bool,
    /// Not offered, but still recognized when typed.
    #[serde(default)]
    pub hidden: bool,
    /// Condition gating visibility, in the `when` language.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    /// Parsed form of [`when`](CliOption::when), filled in by
    /// [`enhance`](crate::enhance).
    #[serde(skip)]
    pub condition: Option<WhenExpr>,
}

impl CliOption {
    /// Creates a flag with the given option strings.
    ///
    /// The strings are checked when the option is added to a command.
    pub fn new<I, S>(option_strings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            option_strings: option_strings.into_iter().map(Into::into).collect(),
            metavar: None,
            help: None,
            complete: None,
            optional_arg: false,
            groups: Vec::new(),
            repeatable: ExtendedBool::Inherit,
            is_final: false,
            hidden: false,
            when: None,
            condition: None,
        }
    }

    pub fn with_metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = Some(metavar.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Sets the completion, which also makes the option take an argument.
    pub fn with_complete(mut self, complete: Completion) -> Self {
        self.complete = Some(complete);
        self
    }

    pub fn with_optional_arg(mut self, optional: bool) -> Self {
        self.optional_arg = optional;
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.push(group.into());
        self
    }

    pub fn with_repeatable(mut self, repeatable: impl Into<ExtendedBool>) -> Self {
        self.repeatable = repeatable.into();
        self
    }

    pub fn with_final(mut self, is_final: bool) -> Self {
        self.is_final = is_final;
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn with_when(mut self, when: impl Into<String>) -> Self {
        self.when = Some(when.into());
        self
    }

    /// Returns `true` if the option takes an argument.
    pub fn takes_arg(&self) -> bool {
        self.complete.is_some()
    }

    /// Returns how the option takes its argument.
    pub fn arg_kind(&self) -> ArgKind {
        match (&self.complete, self.optional_arg) {
            (None, _) => ArgKind::None,
            (Some(_), false) => ArgKind::Required,
            (Some(_), true) => ArgKind::Optional,
        }
    }

    /// Iterates over the option strings of the given shape.
    pub fn strings_of(&self, shape: OptionShape) -> impl Iterator<Item = &str> {
        self.option_strings
            .iter()
            .map(String::as_str)
            .filter(move |s| OptionShape::classify(s) == Some(shape))
    }

    pub fn short_strings(&self) -> impl Iterator<Item = &str> {
        self.strings_of(OptionShape::Short)
    }

    pub fn long_strings(&self) -> impl Iterator<Item = &str> {
        self.strings_of(OptionShape::Long)
    }

    pub fn old_strings(&self) -> impl Iterator<Item = &str> {
        self.strings_of(OptionShape::OldStyle)
    }

    /// Returns `true` if `s` is one of this option's strings.
    pub fn matches(&self, s: &str) -> bool {
        self.option_strings.iter().any(|o| o == s)
    }

    /// The most descriptive spelling: the first long string, else the first string.
    pub fn display_name(&self) -> &str {
        self.long_strings()
            .next()
            .or_else(|| self.option_strings.first().map(String::as_str))
            .unwrap_or_default()
    }

    /// Returns `true` if the option shares at least one group with `other`.
    pub fn conflicts_with(&self, other: &CliOption) -> bool {
        self.groups.iter().any(|g| other.groups.contains(g))
    }
}

/// A positional argument of a [`CommandLine`].
///
/// # Examples
///
/// ```
/// use completion_schema_core::{Completion, Positional};
///
/// let files = Positional::new(1)
///     .with_metavar("FILE")
///     .with_complete(Completion::file())
///     .with_repeatable(true);
/// assert_eq!(files.number, 1);
/// assert!(files.repeatable);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Positional {
    /// 1-based number, unique within the owning command.
    pub number: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metavar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(default)]
    pub complete: Completion,
    /// Consumes every remaining argument.
    #[serde(default)]
    pub repeatable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    #[serde(skip)]
    pub condition: Option<WhenExpr>,
}

impl Positional {
    pub fn new(number: usize) -> Self {
        Self {
            number,
            metavar: None,
            help: None,
            complete: Completion::None,
            repeatable: false,
            when: None,
            condition: None,
        }
    }

    pub fn with_metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = Some(metavar.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_complete(mut self, complete: Completion) -> Self {
        self.complete = complete;
        self
    }

    pub fn with_repeatable(mut self, repeatable: bool) -> Self {
        self.repeatable = repeatable;
        self
    }

    pub fn with_when(mut self, when: impl Into<String>) -> Self {
        self.when = Some(when.into());
        self
    }
}

/// The subcommand slot of a [`CommandLine`].
///
/// Occupies the positional slot right after the owning command's own
/// positionals.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Subcommands {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(default)]
    pub commands: Vec<CommandLine>,
}

impl Subcommands {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Appends a subcommand and returns a reference to it.
    pub fn add_command(&mut self, command: CommandLine) -> &mut CommandLine {
        self.commands.push(command);
        let index = self.commands.len() - 1;
        &mut self.commands[index]
    }

    /// Finds a subcommand by name or alias.
    pub fn find(&self, name: &str) -> Option<&CommandLine> {
        self.commands
            .iter()
            .find(|c| c.prog == name || c.aliases.iter().any(|a| a == name))
    }
}

/// A program or subcommand.
///
/// # Examples
///
/// ```
/// use completion_schema_core::*;
///
/// let mut example = CommandLine::new("example").with_help("Example program");
/// example
///     .add_option(CliOption::new(["-h", "--help"]).with_final(true))
///     .unwrap();
///
/// let subcommands = example
///     .add_subcommands(Subcommands::new().with_help("Commands"))
///     .unwrap();
/// subcommands.add_command(CommandLine::new("start").with_alias("launch"));
///
/// assert!(example.find_option("--help").is_some());
/// assert_eq!(example.find_subcommand("launch").unwrap().prog, "start");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandLine {
    /// Program name, or subcommand name for nested commands.
    pub prog: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub abbreviate_commands: ExtendedBool,
    #[serde(default)]
    pub abbreviate_options: ExtendedBool,
    #[serde(default)]
    pub inherit_options: ExtendedBool,
    #[serde(default)]
    pub options: Vec<CliOption>,
    #[serde(default)]
    pub positionals: Vec<Positional>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcommands: Option<Subcommands>,
}

impl CommandLine {
    pub fn new(prog: impl Into<String>) -> Self {
        Self {
            prog: prog.into(),
            help: None,
            aliases: Vec::new(),
            abbreviate_commands: ExtendedBool::Inherit,
            abbreviate_options: ExtendedBool::Inherit,
            inherit_options: ExtendedBool::Inherit,
            options: Vec::new(),
            positionals: Vec::new(),
            subcommands: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_inherit_options(mut self, inherit: impl Into<ExtendedBool>) -> Self {
        self.inherit_options = inherit.into();
        self
    }

    pub fn with_abbreviate_options(mut self, abbreviate: impl Into<ExtendedBool>) -> Self {
        self.abbreviate_options = abbreviate.into();
        self
    }

    pub fn with_abbreviate_commands(mut self, abbreviate: impl Into<ExtendedBool>) -> Self {
        self.abbreviate_commands = abbreviate.into();
        self
    }

    /// Adds an option.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EmptyOptionStrings`] or
    /// [`ModelError::InvalidOptionString`] for malformed option strings.
    pub fn add_option(&mut self, option: CliOption) -> Result<&mut CliOption> {
        if option.option_strings.is_empty() {
            return Err(ModelError::EmptyOptionStrings);
        }
        if let Some(bad) = option
            .option_strings
            .iter()
            .find(|s| !is_valid_option_string(s))
        {
            return Err(ModelError::InvalidOptionString(bad.clone()));
        }
        self.options.push(option);
        let index = self.options.len() - 1;
        Ok(&mut self.options[index])
    }

    /// Adds a positional.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidPositionalNumber`] for number 0 and
    /// [`ModelError::DuplicatePositional`] if the number is taken.
    ///
    /// # Examples
    ///
    /// ```
    /// use completion_schema_core::{CommandLine, ModelError, Positional};
    ///
    /// let mut cmd = CommandLine::new("example");
    /// cmd.add_positional(Positional::new(1)).unwrap();
    /// assert_eq!(
    ///     cmd.add_positional(Positional::new(1)).unwrap_err(),
    ///     ModelError::DuplicatePositional(1)
    /// );
    /// ```
    pub fn add_positional(&mut self, positional: Positional) -> Result<&mut Positional> {
        if positional.number == 0 {
            return Err(ModelError::InvalidPositionalNumber(0));
        }
        if self.positionals.iter().any(|p| p.number == positional.number) {
            return Err(ModelError::DuplicatePositional(positional.number));
        }
        self.positionals.push(positional);
        let index = self.positionals.len() - 1;
        Ok(&mut self.positionals[index])
    }

    /// Adds the subcommands node.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::SubcommandsAlreadyDefined`] on a second call.
    pub fn add_subcommands(&mut self, subcommands: Subcommands) -> Result<&mut Subcommands> {
        if self.subcommands.is_some() {
            return Err(ModelError::SubcommandsAlreadyDefined(self.prog.clone()));
        }
        Ok(self.subcommands.insert(subcommands))
    }

    /// Starts a mutual-exclusion group named `name`.
    ///
    /// # Examples
    ///
    /// ```
    /// use completion_schema_core::{CliOption, CommandLine};
    ///
    /// let mut cmd = CommandLine::new("example");
    /// let mut group = cmd.add_exclusive_group("mode");
    /// group.add_option(CliOption::new(["--fast"])).unwrap();
    /// group.add_option(CliOption::new(["--slow"])).unwrap();
    ///
    /// assert!(cmd.options[0].conflicts_with(&cmd.options[1]));
    /// ```
    pub fn add_exclusive_group(&mut self, name: impl Into<String>) -> ExclusiveGroup<'_> {
        ExclusiveGroup {
            command: self,
            name: name.into(),
        }
    }

    /// Finds an option by one of its option strings.
    pub fn find_option(&self, option_string: &str) -> Option<&CliOption> {
        self.options.iter().find(|o| o.matches(option_string))
    }

    /// Finds a direct subcommand by name or alias.
    pub fn find_subcommand(&self, name: &str) -> Option<&CommandLine> {
        self.subcommands.as_ref().and_then(|s| s.find(name))
    }

    /// Returns the direct subcommands, or an empty slice.
    pub fn commands(&self) -> &[CommandLine] {
        self.subcommands
            .as_ref()
            .map(|s| s.commands.as_slice())
            .unwrap_or_default()
    }

    /// Returns `true` if any option of this node or its descendants
    /// satisfies `predicate`.
    pub fn any_option(&self, predicate: &mut impl FnMut(&CliOption) -> bool) -> bool {
        self.options.iter().any(&mut *predicate)
            || self.commands().iter().any(|c| c.any_option(predicate))
    }
}

/// Handle returned by [`CommandLine::add_exclusive_group`].
#[derive(Debug)]
pub struct ExclusiveGroup<'a> {
    command: &'a mut CommandLine,
    name: String,
}

impl ExclusiveGroup<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds `option` to the command as a member of this group.
    pub fn add_option(&mut self, mut option: CliOption) -> Result<&mut CliOption> {
        if !option.groups.contains(&self.name) {
            option.groups.push(self.name.clone());
        }
        self.command.add_option(option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extended_bool_serde() {
        let json = serde_json::to_string(&ExtendedBool::Inherit).unwrap();
        assert_eq!(json, "null");
        let value: ExtendedBool = serde_json::from_str("true").unwrap();
        assert_eq!(value, ExtendedBool::True);
    }

    #[test]
    fn test_option_shapes() {
        let opt = CliOption::new(["-f", "--force", "-force"]);
        assert_eq!(opt.short_strings().collect::<Vec<_>>(), ["-f"]);
        assert_eq!(opt.long_strings().collect::<Vec<_>>(), ["--force"]);
        assert_eq!(opt.old_strings().collect::<Vec<_>>(), ["-force"]);
    }

    #[test]
    fn test_add_option_rejects_malformed_strings() {
        let mut cmd = CommandLine::new("example");
        assert_eq!(
            cmd.add_option(CliOption::new(["--"])).unwrap_err(),
            ModelError::InvalidOptionString("--".into())
        );
        assert_eq!(
            cmd.add_option(CliOption::new(["-a b"])).unwrap_err(),
            ModelError::InvalidOptionString("-a b".into())
        );
        assert_eq!(
            cmd.add_option(CliOption::new(Vec::<String>::new())).unwrap_err(),
            ModelError::EmptyOptionStrings
        );
        assert!(cmd.options.is_empty());
    }

    #[test]
    fn test_subcommands_added_twice() {
        let mut cmd = CommandLine::new("example");
        cmd.add_subcommands(Subcommands::new()).unwrap();
        assert_eq!(
            cmd.add_subcommands(Subcommands::new()).unwrap_err(),
            ModelError::SubcommandsAlreadyDefined("example".into())
        );
    }

    #[test]
    fn test_positional_zero_rejected() {
        let mut cmd = CommandLine::new("example");
        assert_eq!(
            cmd.add_positional(Positional::new(0)).unwrap_err(),
            ModelError::InvalidPositionalNumber(0)
        );
    }

    #[test]
    fn test_exclusive_group_does_not_duplicate_name() {
        let mut cmd = CommandLine::new("example");
        let mut group = cmd.add_exclusive_group("mode");
        group
            .add_option(CliOption::new(["--fast"]).with_group("mode"))
            .unwrap();
        assert_eq!(cmd.options[0].groups, ["mode"]);
    }

    #[test]
    fn test_option_yaml_final_field() {
        let yaml = "option_strings: ['-h', '--help']\nfinal: true\n";
        let opt: CliOption = serde_yaml::from_str(yaml).unwrap();
        assert!(opt.is_final);
        assert_eq!(opt.repeatable, ExtendedBool::Inherit);
        assert!(!opt.takes_arg());
    }
}
