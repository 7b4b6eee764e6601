//! Completion specifications.
//!
//! A [`Completion`] says how the argument of an option or positional is
//! completed. In serialized form a specification is a list whose first
//! element names the kind and whose remaining elements are the kind's
//! arguments:
//!
//! ```text
//! ["none"]
//! ["choices", ["json", "yaml"]]
//! ["choices", {"json": "JSON output", "yaml": "YAML output"}]
//! ["file", {"extensions": ["txt", "md"]}]
//! ["range", 1, 10, 2]
//! ["exec", "git branch --format='%(refname:short)'"]
//! ["value_list", {"values": ["read", "write"], "separator": ","}]
//! ["key_value_list", {"values": [["level", "Compression level", ["range", 1, 9]]]}]
//! ["combine", [["user"], ["group"]]]
//! ["prefix", "file:", ["file"]]
//! ["list", ["user"], {"separator": ":"}]
//! ```
//!
//! [`Completion::from_args`] checks arity and argument types;
//! [`Completion::check`] checks the semantic constraints of each kind.

use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Errors found in a completion specification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    /// The completion list is empty.
    #[error("completion specification is empty")]
    Empty,

    /// The first element is not a known kind.
    #[error("unknown completion kind {0:?}")]
    UnknownKind(String),

    /// Wrong number of arguments.
    #[error("{kind}: expected {expected} argument(s), got {got}")]
    Arity {
        kind: String,
        expected: String,
        got: usize,
    },

    /// An argument has the wrong type or is missing a required key.
    #[error("{kind}: {message}")]
    Type { kind: String, message: String },

    /// Arguments are well-typed but violate a constraint of the kind.
    #[error("{kind}: {message}")]
    Invalid { kind: String, message: String },
}

impl CompletionError {
    fn type_error(kind: &str, message: impl Into<String>) -> Self {
        CompletionError::Type {
            kind: kind.to_string(),
            message: message.into(),
        }
    }

    fn invalid(kind: &str, message: impl Into<String>) -> Self {
        CompletionError::Invalid {
            kind: kind.to_string(),
            message: message.into(),
        }
    }
}

/// One item of a `choices` or `value_list` completion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Choice {
    pub item: String,
    pub description: Option<String>,
}

impl Choice {
    pub fn new(item: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            description: None,
        }
    }

    pub fn described(item: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            description: Some(description.into()),
        }
    }
}

/// Arguments of the `file` kind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileCompletion {
    /// Complete relative to this directory instead of the working directory.
    pub directory: Option<String>,
    /// Only offer files with one of these extensions (without the dot).
    pub extensions: Vec<String>,
    /// Bash-style globs of file names never offered.
    pub ignore_globs: Vec<String>,
}

/// Arguments of the `value_list` kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueListCompletion {
    pub values: Vec<Choice>,
    pub separator: String,
    /// Values may be given more than once.
    pub duplicates: bool,
}

/// One key of a `key_value_list` completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub description: Option<String>,
    /// How the value is completed; `None` if the key takes no value.
    pub completion: Option<Completion>,
}

/// Arguments of the `key_value_list` kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValueListCompletion {
    pub keys: Vec<KeyValue>,
    /// Separates pairs (`a=1,b=2`).
    pub separator: String,
    /// Separates a key from its value.
    pub pair_separator: String,
}

/// Arguments of the `list` kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListCompletion {
    pub completion: Box<Completion>,
    pub separator: String,
    pub duplicates: bool,
}

/// How an argument is completed.
///
/// # Examples
///
/// ```
/// use completion_schema_core::Completion;
/// use serde_json::json;
///
/// let range: Completion = serde_json::from_value(json!(["range", 1, 10, 2])).unwrap();
/// assert_eq!(range, Completion::Range { start: 1, stop: 10, step: 2 });
/// assert_eq!(serde_json::to_value(&range).unwrap(), json!(["range", 1, 10, 2]));
///
/// // Arity is checked while parsing, constraints by `check`.
/// assert!(serde_json::from_value::<Completion>(json!(["range", 1])).is_err());
/// let backwards: Completion = serde_json::from_value(json!(["range", 9, 1])).unwrap();
/// assert!(backwards.check().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Value>", into = "Vec<Value>")]
pub enum Completion {
    /// Argument without completion.
    #[default]
    None,
    /// An integer; nothing to complete.
    Integer,
    /// A floating point number; nothing to complete.
    Float,
    Choices(Vec<Choice>),
    File(FileCompletion),
    Directory { directory: Option<String> },
    Command,
    User,
    Group,
    Pid,
    Process,
    Signal,
    Hostname,
    Service,
    Variable,
    Environment,
    Locale,
    Charset,
    NetInterface,
    LoginShell,
    Date { format: String },
    /// Strings from the shell history matching a regular expression.
    History { pattern: String },
    Range { start: i64, stop: i64, step: i64 },
    /// Runs a command printing `value<TAB>description` lines.
    Exec { command: String },
    /// Runs a command printing bare values.
    ExecFast { command: String },
    ValueList(ValueListCompletion),
    KeyValueList(KeyValueListCompletion),
    /// Offers the results of every sub-completion.
    Combine(Vec<Completion>),
    /// Offers `prefix`, then completes the rest with `completion`.
    Prefix {
        prefix: String,
        completion: Box<Completion>,
    },
    List(ListCompletion),
}

const DEFAULT_SEPARATOR: &str = ",";
const DEFAULT_PAIR_SEPARATOR: &str = "=";

impl Completion {
    /// Plain file completion.
    pub fn file() -> Self {
        Completion::File(FileCompletion::default())
    }

    /// File completion restricted to the given extensions.
    pub fn file_with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Completion::File(FileCompletion {
            extensions: extensions.into_iter().map(Into::into).collect(),
            ..FileCompletion::default()
        })
    }

    pub fn directory() -> Self {
        Completion::Directory { directory: None }
    }

    /// Undescribed choices.
    ///
    /// # Examples
    ///
    /// ```
    /// use completion_schema_core::Completion;
    ///
    /// let formats = Completion::choices(["json", "yaml"]);
    /// assert_eq!(formats.kind(), "choices");
    /// assert!(formats.check().is_ok());
    /// ```
    pub fn choices<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Completion::Choices(items.into_iter().map(Choice::new).collect())
    }

    /// Choices with descriptions.
    pub fn described_choices<I, S, D>(items: I) -> Self
    where
        I: IntoIterator<Item = (S, D)>,
        S: Into<String>,
        D: Into<String>,
    {
        Completion::Choices(
            items
                .into_iter()
                .map(|(item, desc)| Choice::described(item, desc))
                .collect(),
        )
    }

    pub fn range(start: i64, stop: i64) -> Self {
        Completion::Range {
            start,
            stop,
            step: 1,
        }
    }

    pub fn exec(command: impl Into<String>) -> Self {
        Completion::Exec {
            command: command.into(),
        }
    }

    /// Name of the kind, as used in the serialized form.
    pub fn kind(&self) -> &'static str {
        match self {
            Completion::None => "none",
            Completion::Integer => "integer",
            Completion::Float => "float",
            Completion::Choices(_) => "choices",
            Completion::File(_) => "file",
            Completion::Directory { .. } => "directory",
            Completion::Command => "command",
            Completion::User => "user",
            Completion::Group => "group",
            Completion::Pid => "pid",
            Completion::Process => "process",
            Completion::Signal => "signal",
            Completion::Hostname => "hostname",
            Completion::Service => "service",
            Completion::Variable => "variable",
            Completion::Environment => "environment",
            Completion::Locale => "locale",
            Completion::Charset => "charset",
            Completion::NetInterface => "net_interface",
            Completion::LoginShell => "login_shell",
            Completion::Date { .. } => "date",
            Completion::History { .. } => "history",
            Completion::Range { .. } => "range",
            Completion::Exec { .. } => "exec",
            Completion::ExecFast { .. } => "exec_fast",
            Completion::ValueList(_) => "value_list",
            Completion::KeyValueList(_) => "key_value_list",
            Completion::Combine(_) => "combine",
            Completion::Prefix { .. } => "prefix",
            Completion::List(_) => "list",
        }
    }

    /// Returns `true` for kinds that never produce candidates.
    pub fn is_empty(&self) -> bool {
        matches!(
            self,
            Completion::None | Completion::Integer | Completion::Float
        )
    }

    /// Parses the list form, checking arity and argument types.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::Empty`], [`CompletionError::UnknownKind`],
    /// [`CompletionError::Arity`] or [`CompletionError::Type`].
    pub fn from_args(args: &[Value]) -> Result<Self, CompletionError> {
        let (first, rest) = args.split_first().ok_or(CompletionError::Empty)?;
        let kind = first
            .as_str()
            .ok_or_else(|| CompletionError::type_error("completion", "kind must be a string"))?;

        let simple = match kind {
            "none" => Some(Completion::None),
            "integer" => Some(Completion::Integer),
            "float" => Some(Completion::Float),
            "command" => Some(Completion::Command),
            "user" => Some(Completion::User),
            "group" => Some(Completion::Group),
            "pid" => Some(Completion::Pid),
            "process" => Some(Completion::Process),
            "signal" => Some(Completion::Signal),
            "hostname" => Some(Completion::Hostname),
            "service" => Some(Completion::Service),
            "variable" => Some(Completion::Variable),
            "environment" => Some(Completion::Environment),
            "locale" => Some(Completion::Locale),
            "charset" => Some(Completion::Charset),
            "net_interface" => Some(Completion::NetInterface),
            "login_shell" => Some(Completion::LoginShell),
            _ => None,
        };
        if let Some(completion) = simple {
            arity(kind, rest, 0, 0)?;
            return Ok(completion);
        }

        match kind {
            "choices" => {
                arity(kind, rest, 1, 1)?;
                Ok(Completion::Choices(parse_items(kind, &rest[0])?))
            }
            "file" => {
                arity(kind, rest, 0, 1)?;
                let mut file = FileCompletion::default();
                if let Some(value) = rest.first() {
                    let map = object_arg(kind, value)?;
                    reject_unknown_keys(kind, map, &["directory", "extensions", "ignore_globs"])?;
                    file.directory = optional_string_field(kind, map, "directory")?;
                    file.extensions = string_list_field(kind, map, "extensions")?;
                    file.ignore_globs = string_list_field(kind, map, "ignore_globs")?;
                }
                Ok(Completion::File(file))
            }
            "directory" => {
                arity(kind, rest, 0, 1)?;
                let directory = match rest.first() {
                    Some(value) => {
                        let map = object_arg(kind, value)?;
                        reject_unknown_keys(kind, map, &["directory"])?;
                        optional_string_field(kind, map, "directory")?
                    }
                    None => None,
                };
                Ok(Completion::Directory { directory })
            }
            "date" => {
                arity(kind, rest, 1, 1)?;
                Ok(Completion::Date {
                    format: string_arg(kind, &rest[0], "format")?,
                })
            }
            "history" => {
                arity(kind, rest, 1, 1)?;
                Ok(Completion::History {
                    pattern: string_arg(kind, &rest[0], "pattern")?,
                })
            }
            "range" => {
                arity(kind, rest, 2, 3)?;
                let start = int_arg(kind, &rest[0], "start")?;
                let stop = int_arg(kind, &rest[1], "stop")?;
                let step = match rest.get(2) {
                    Some(value) => int_arg(kind, value, "step")?,
                    None => 1,
                };
                Ok(Completion::Range { start, stop, step })
            }
            "exec" => {
                arity(kind, rest, 1, 1)?;
                Ok(Completion::Exec {
                    command: string_arg(kind, &rest[0], "command")?,
                })
            }
            "exec_fast" => {
                arity(kind, rest, 1, 1)?;
                Ok(Completion::ExecFast {
                    command: string_arg(kind, &rest[0], "command")?,
                })
            }
            "value_list" => {
                arity(kind, rest, 1, 1)?;
                let map = object_arg(kind, &rest[0])?;
                reject_unknown_keys(kind, map, &["values", "separator", "duplicates"])?;
                let values = map
                    .get("values")
                    .ok_or_else(|| CompletionError::type_error(kind, "missing required key `values`"))?;
                Ok(Completion::ValueList(ValueListCompletion {
                    values: parse_items(kind, values)?,
                    separator: optional_string_field(kind, map, "separator")?
                        .unwrap_or_else(|| DEFAULT_SEPARATOR.to_string()),
                    duplicates: bool_field(kind, map, "duplicates")?,
                }))
            }
            "key_value_list" => {
                arity(kind, rest, 1, 1)?;
                let map = object_arg(kind, &rest[0])?;
                reject_unknown_keys(kind, map, &["values", "separator", "pair_separator"])?;
                let values = map
                    .get("values")
                    .ok_or_else(|| CompletionError::type_error(kind, "missing required key `values`"))?;
                Ok(Completion::KeyValueList(KeyValueListCompletion {
                    keys: parse_keys(kind, values)?,
                    separator: optional_string_field(kind, map, "separator")?
                        .unwrap_or_else(|| DEFAULT_SEPARATOR.to_string()),
                    pair_separator: optional_string_field(kind, map, "pair_separator")?
                        .unwrap_or_else(|| DEFAULT_PAIR_SEPARATOR.to_string()),
                }))
            }
            "combine" => {
                arity(kind, rest, 1, 1)?;
                let list = rest[0]
                    .as_array()
                    .ok_or_else(|| CompletionError::type_error(kind, "expected a list of completions"))?;
                let completions = list
                    .iter()
                    .map(|value| nested(kind, value))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Completion::Combine(completions))
            }
            "prefix" => {
                arity(kind, rest, 2, 2)?;
                Ok(Completion::Prefix {
                    prefix: string_arg(kind, &rest[0], "prefix")?,
                    completion: Box::new(nested(kind, &rest[1])?),
                })
            }
            "list" => {
                arity(kind, rest, 1, 2)?;
                let completion = Box::new(nested(kind, &rest[0])?);
                let (separator, duplicates) = match rest.get(1) {
                    Some(value) => {
                        let map = object_arg(kind, value)?;
                        reject_unknown_keys(kind, map, &["separator", "duplicates"])?;
                        (
                            optional_string_field(kind, map, "separator")?,
                            bool_field(kind, map, "duplicates")?,
                        )
                    }
                    None => (None, false),
                };
                Ok(Completion::List(ListCompletion {
                    completion,
                    separator: separator.unwrap_or_else(|| DEFAULT_SEPARATOR.to_string()),
                    duplicates,
                }))
            }
            other => Err(CompletionError::UnknownKind(other.to_string())),
        }
    }

    /// Returns the list form, the inverse of [`from_args`](Completion::from_args).
    pub fn to_args(&self) -> Vec<Value> {
        let kind = Value::from(self.kind());
        match self {
            Completion::Choices(items) => vec![kind, items_to_value(items)],
            Completion::File(file) => {
                if *file == FileCompletion::default() {
                    return vec![kind];
                }
                let mut map = Map::new();
                if let Some(directory) = &file.directory {
                    map.insert("directory".into(), json!(directory));
                }
                if !file.extensions.is_empty() {
                    map.insert("extensions".into(), json!(file.extensions));
                }
                if !file.ignore_globs.is_empty() {
                    map.insert("ignore_globs".into(), json!(file.ignore_globs));
                }
                vec![kind, Value::Object(map)]
            }
            Completion::Directory { directory } => match directory {
                Some(directory) => vec![kind, json!({ "directory": directory })],
                None => vec![kind],
            },
            Completion::Date { format } => vec![kind, json!(format)],
            Completion::History { pattern } => vec![kind, json!(pattern)],
            Completion::Range { start, stop, step } => {
                vec![kind, json!(start), json!(stop), json!(step)]
            }
            Completion::Exec { command } | Completion::ExecFast { command } => {
                vec![kind, json!(command)]
            }
            Completion::ValueList(list) => vec![
                kind,
                json!({
                    "values": items_to_value(&list.values),
                    "separator": list.separator,
                    "duplicates": list.duplicates,
                }),
            ],
            Completion::KeyValueList(list) => {
                let keys: Vec<Value> = list
                    .keys
                    .iter()
                    .map(|k| {
                        json!([
                            k.key,
                            k.description,
                            k.completion.as_ref().map(|c| Value::Array(c.to_args())),
                        ])
                    })
                    .collect();
                vec![
                    kind,
                    json!({
                        "values": keys,
                        "separator": list.separator,
                        "pair_separator": list.pair_separator,
                    }),
                ]
            }
            Completion::Combine(completions) => vec![
                kind,
                Value::Array(
                    completions
                        .iter()
                        .map(|c| Value::Array(c.to_args()))
                        .collect(),
                ),
            ],
            Completion::Prefix { prefix, completion } => {
                vec![kind, json!(prefix), Value::Array(completion.to_args())]
            }
            Completion::List(list) => vec![
                kind,
                Value::Array(list.completion.to_args()),
                json!({ "separator": list.separator, "duplicates": list.duplicates }),
            ],
            _ => vec![kind],
        }
    }

    /// Checks the semantic constraints of the kind, recursively.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::Invalid`] describing the first violated
    /// constraint.
    pub fn check(&self) -> Result<(), CompletionError> {
        let kind = self.kind();
        match self {
            Completion::Choices(items) => check_items(kind, items),
            Completion::File(file) => {
                for ext in &file.extensions {
                    if ext.is_empty() || ext.contains('/') {
                        return Err(CompletionError::invalid(
                            kind,
                            format!("invalid extension {ext:?}"),
                        ));
                    }
                }
                for glob in &file.ignore_globs {
                    crate::glob::parse_glob(glob).map_err(|e| {
                        CompletionError::invalid(kind, format!("invalid ignore glob {glob:?}: {e}"))
                    })?;
                }
                if let Some(directory) = &file.directory
                    && directory.is_empty()
                {
                    return Err(CompletionError::invalid(kind, "directory cannot be empty"));
                }
                Ok(())
            }
            Completion::Directory {
                directory: Some(directory),
            } if directory.is_empty() => {
                Err(CompletionError::invalid(kind, "directory cannot be empty"))
            }
            Completion::Date { format } if format.is_empty() => {
                Err(CompletionError::invalid(kind, "format cannot be empty"))
            }
            Completion::History { pattern } => Regex::new(pattern)
                .map(|_| ())
                .map_err(|e| CompletionError::invalid(kind, format!("invalid pattern: {e}"))),
            Completion::Range { start, stop, step } => {
                if start > stop {
                    Err(CompletionError::invalid(
                        kind,
                        format!("start ({start}) is greater than stop ({stop})"),
                    ))
                } else if *step <= 0 {
                    Err(CompletionError::invalid(
                        kind,
                        format!("step must be positive, got {step}"),
                    ))
                } else {
                    Ok(())
                }
            }
            Completion::Exec { command } | Completion::ExecFast { command }
                if command.trim().is_empty() =>
            {
                Err(CompletionError::invalid(kind, "command cannot be empty"))
            }
            Completion::ValueList(list) => {
                check_separator(kind, "separator", &list.separator)?;
                check_items(kind, &list.values)?;
                if let Some(bad) = list.values.iter().find(|v| v.item.contains(&list.separator)) {
                    return Err(CompletionError::invalid(
                        kind,
                        format!("value {:?} contains the separator", bad.item),
                    ));
                }
                Ok(())
            }
            Completion::KeyValueList(list) => {
                check_separator(kind, "separator", &list.separator)?;
                check_separator(kind, "pair_separator", &list.pair_separator)?;
                if list.separator == list.pair_separator {
                    return Err(CompletionError::invalid(
                        kind,
                        "separator and pair_separator must differ",
                    ));
                }
                if list.keys.is_empty() {
                    return Err(CompletionError::invalid(kind, "values cannot be empty"));
                }
                let mut seen = HashSet::new();
                for key in &list.keys {
                    if key.key.is_empty()
                        || key.key.contains(&list.separator)
                        || key.key.contains(&list.pair_separator)
                    {
                        return Err(CompletionError::invalid(
                            kind,
                            format!("invalid key {:?}", key.key),
                        ));
                    }
                    if !seen.insert(key.key.as_str()) {
                        return Err(CompletionError::invalid(
                            kind,
                            format!("duplicate key {:?}", key.key),
                        ));
                    }
                    if let Some(completion) = &key.completion {
                        completion.check()?;
                    }
                }
                Ok(())
            }
            Completion::Combine(completions) => {
                if completions.is_empty() {
                    return Err(CompletionError::invalid(kind, "needs at least one completion"));
                }
                for completion in completions {
                    if matches!(completion, Completion::Combine(_)) {
                        return Err(CompletionError::invalid(kind, "cannot be nested"));
                    }
                    completion.check()?;
                }
                Ok(())
            }
            Completion::Prefix { prefix, completion } => {
                if prefix.is_empty() {
                    return Err(CompletionError::invalid(kind, "prefix cannot be empty"));
                }
                completion.check()
            }
            Completion::List(list) => {
                check_separator(kind, "separator", &list.separator)?;
                list.completion.check()
            }
            _ => Ok(()),
        }
    }
}

impl TryFrom<Vec<Value>> for Completion {
    type Error = CompletionError;

    fn try_from(args: Vec<Value>) -> Result<Self, Self::Error> {
        Completion::from_args(&args)
    }
}

impl From<Completion> for Vec<Value> {
    fn from(completion: Completion) -> Self {
        completion.to_args()
    }
}

fn arity(kind: &str, rest: &[Value], min: usize, max: usize) -> Result<(), CompletionError> {
    if (min..=max).contains(&rest.len()) {
        return Ok(());
    }
    let expected = if min == max {
        min.to_string()
    } else {
        format!("{min} to {max}")
    };
    Err(CompletionError::Arity {
        kind: kind.to_string(),
        expected,
        got: rest.len(),
    })
}

fn nested(kind: &str, value: &Value) -> Result<Completion, CompletionError> {
    let args = value
        .as_array()
        .ok_or_else(|| CompletionError::type_error(kind, "expected a nested completion list"))?;
    Completion::from_args(args)
}

fn string_arg(kind: &str, value: &Value, what: &str) -> Result<String, CompletionError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| CompletionError::type_error(kind, format!("{what} must be a string")))
}

fn int_arg(kind: &str, value: &Value, what: &str) -> Result<i64, CompletionError> {
    value
        .as_i64()
        .ok_or_else(|| CompletionError::type_error(kind, format!("{what} must be an integer")))
}

fn object_arg<'a>(kind: &str, value: &'a Value) -> Result<&'a Map<String, Value>, CompletionError> {
    value
        .as_object()
        .ok_or_else(|| CompletionError::type_error(kind, "expected a mapping of options"))
}

fn reject_unknown_keys(
    kind: &str,
    map: &Map<String, Value>,
    known: &[&str],
) -> Result<(), CompletionError> {
    match map.keys().find(|k| !known.contains(&k.as_str())) {
        Some(key) => Err(CompletionError::type_error(
            kind,
            format!("unknown key `{key}`"),
        )),
        None => Ok(()),
    }
}

fn optional_string_field(
    kind: &str,
    map: &Map<String, Value>,
    key: &str,
) -> Result<Option<String>, CompletionError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => string_arg(kind, value, key).map(Some),
    }
}

fn bool_field(kind: &str, map: &Map<String, Value>, key: &str) -> Result<bool, CompletionError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(value) => value
            .as_bool()
            .ok_or_else(|| CompletionError::type_error(kind, format!("{key} must be a boolean"))),
    }
}

fn string_list_field(
    kind: &str,
    map: &Map<String, Value>,
    key: &str,
) -> Result<Vec<String>, CompletionError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(values)) => values
            .iter()
            .map(|v| string_arg(kind, v, key))
            .collect(),
        Some(_) => Err(CompletionError::type_error(
            kind,
            format!("{key} must be a list of strings"),
        )),
    }
}

fn primitive(kind: &str, value: &Value) -> Result<String, CompletionError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(CompletionError::type_error(
            kind,
            "items must be strings, numbers or booleans",
        )),
    }
}

/// Parses a sequence of items or a mapping of items to descriptions.
fn parse_items(kind: &str, value: &Value) -> Result<Vec<Choice>, CompletionError> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| primitive(kind, item).map(Choice::new))
            .collect(),
        Value::Object(map) => map
            .iter()
            .map(|(item, desc)| {
                let description = match desc {
                    Value::Null => None,
                    other => Some(primitive(kind, other)?),
                };
                Ok(Choice {
                    item: item.clone(),
                    description,
                })
            })
            .collect(),
        _ => Err(CompletionError::type_error(
            kind,
            "expected a sequence or a mapping of items",
        )),
    }
}

fn parse_keys(kind: &str, value: &Value) -> Result<Vec<KeyValue>, CompletionError> {
    let entries = value
        .as_array()
        .ok_or_else(|| CompletionError::type_error(kind, "values must be a list of [key, description, completion]"))?;
    entries
        .iter()
        .map(|entry| {
            let parts = entry
                .as_array()
                .filter(|parts| (1..=3).contains(&parts.len()))
                .ok_or_else(|| {
                    CompletionError::type_error(kind, "each value must be [key, description, completion]")
                })?;
            let key = string_arg(kind, &parts[0], "key")?;
            let description = match parts.get(1) {
                None | Some(Value::Null) => None,
                Some(value) => Some(string_arg(kind, value, "description")?),
            };
            let completion = match parts.get(2) {
                None | Some(Value::Null) => None,
                Some(value) => Some(nested(kind, value)?),
            };
            Ok(KeyValue {
                key,
                description,
                completion,
            })
        })
        .collect()
}

fn items_to_value(items: &[Choice]) -> Value {
    if items.iter().any(|c| c.description.is_some()) {
        let map: Map<String, Value> = items
            .iter()
            .map(|c| (c.item.clone(), json!(c.description)))
            .collect();
        Value::Object(map)
    } else {
        Value::Array(items.iter().map(|c| json!(c.item)).collect())
    }
}

fn check_items(kind: &str, items: &[Choice]) -> Result<(), CompletionError> {
    if items.is_empty() {
        return Err(CompletionError::invalid(kind, "needs at least one item"));
    }
    let mut seen = HashSet::new();
    for choice in items {
        if choice.item.is_empty() {
            return Err(CompletionError::invalid(kind, "items cannot be empty"));
        }
        if !seen.insert(choice.item.as_str()) {
            return Err(CompletionError::invalid(
                kind,
                format!("duplicate item {:?}", choice.item),
            ));
        }
    }
    Ok(())
}

fn check_separator(kind: &str, name: &str, separator: &str) -> Result<(), CompletionError> {
    if separator.chars().count() == 1 {
        Ok(())
    } else {
        Err(CompletionError::invalid(
            kind,
            format!("{name} must be a single character, got {separator:?}"),
        ))
    }
}
