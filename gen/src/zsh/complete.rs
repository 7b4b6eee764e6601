//! Completion kinds as `_arguments` actions.

use completion_schema_core::glob::{parse_glob, zsh_escape_literal};
use completion_schema_core::{
    Choice, Completion, FileCompletion, KeyValueListCompletion, ValueListCompletion,
};

use super::helpers::{CHARSETS, EXEC, EXEC_FAST, HISTORY, LOGIN_SHELLS, RANGE};
use crate::context::Context;
use crate::error::Result;
use crate::escape::escape;

/// Above this many items, choices move into a generated function.
const INLINE_CHOICES_LIMIT: usize = 16;

/// How an argument is completed in Zsh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ZshAction {
    /// Literal candidates, each already quoted.
    Words(Vec<String>),
    /// A command adding candidates.
    Call(String),
}

impl ZshAction {
    /// The action as written in an `_arguments` spec.
    pub(crate) fn spec(&self) -> String {
        match self {
            ZshAction::Words(words) => format!("({})", words.join(" ")),
            ZshAction::Call(call) => call.clone(),
        }
    }

    /// The action as a command, for `_sequence` and generated functions.
    pub(crate) fn command(&self) -> String {
        match self {
            ZshAction::Words(words) => format!("compadd -- {}", words.join(" ")),
            ZshAction::Call(call) => call.clone(),
        }
    }
}

/// Backslash-quotes `word` for an action evaluated by `_arguments`.
pub(crate) fn quote_word(word: &str) -> String {
    if word.is_empty() {
        return "''".to_string();
    }
    let mut out = String::with_capacity(word.len());
    for c in word.chars() {
        if !(c.is_ascii_alphanumeric() || "_@%+=,./-".contains(c) || !c.is_ascii()) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Returns the action for `completion`, or `None` if nothing is offered.
pub(crate) fn completer(ctx: &mut Context<'_>, completion: &Completion) -> Result<Option<ZshAction>> {
    let call = |s: &str| Some(ZshAction::Call(s.to_string()));
    let action = match completion {
        Completion::None | Completion::Integer | Completion::Float => None,
        Completion::Choices(choices) => Some(choices_action(ctx, choices)),
        Completion::File(file) => Some(file_action(ctx, file)),
        Completion::Directory { directory } => Some(ZshAction::Call(match directory {
            Some(dir) => format!("_files -/ -W {}", escape(dir)),
            None => "_files -/".to_string(),
        })),
        Completion::Command => call("_command_names -e"),
        Completion::User => call("_users"),
        Completion::Group => call("_groups"),
        Completion::Pid => call("_pids"),
        Completion::Process => call("_process_names"),
        Completion::Signal => call("_signals"),
        Completion::Hostname => call("_hosts"),
        Completion::Service => call("_services"),
        Completion::Variable => call("_vars"),
        Completion::Environment => call("_parameters -g '*export*'"),
        Completion::Locale => call("_locales"),
        Completion::NetInterface => call("_net_interfaces"),
        Completion::Date { .. } => call("_dates"),
        Completion::Charset => Some(ZshAction::Call(ctx.helpers.use_helper(&CHARSETS))),
        Completion::LoginShell => Some(ZshAction::Call(ctx.helpers.use_helper(&LOGIN_SHELLS))),
        Completion::History { pattern } => Some(ZshAction::Call(format!(
            "{} {}",
            ctx.helpers.use_helper(&HISTORY),
            escape(pattern)
        ))),
        Completion::Range { start, stop, step } => Some(ZshAction::Call(format!(
            "{} {start} {stop} {step}",
            ctx.helpers.use_helper(&RANGE)
        ))),
        Completion::Exec { command } => Some(ZshAction::Call(format!(
            "{} {}",
            ctx.helpers.use_helper(&EXEC),
            escape(command)
        ))),
        Completion::ExecFast { command } => Some(ZshAction::Call(format!(
            "{} {}",
            ctx.helpers.use_helper(&EXEC_FAST),
            escape(command)
        ))),
        Completion::ValueList(list) => Some(value_list_action(list)),
        Completion::KeyValueList(list) => Some(key_value_list_action(ctx, list)?),
        Completion::Combine(parts) => {
            let mut actions = Vec::new();
            for part in parts {
                if let Some(action) = completer(ctx, part)? {
                    actions.push(action);
                }
            }
            match actions.len() {
                0 => None,
                1 => actions.pop(),
                _ => {
                    let alternatives: Vec<String> = actions
                        .iter()
                        .enumerate()
                        .map(|(i, a)| escape(&format!("part{}:value:{}", i + 1, a.spec())))
                        .collect();
                    Some(ZshAction::Call(format!("_alternative {}", alternatives.join(" "))))
                }
            }
        }
        Completion::Prefix { prefix, completion } => {
            let inner = completer(ctx, completion)?;
            Some(prefix_action(ctx, prefix, inner.as_ref()))
        }
        Completion::List(list) => completer(ctx, &list.completion)?.map(|inner| {
            let duplicates = if list.duplicates { " -d" } else { "" };
            ZshAction::Call(format!(
                "_sequence -s {}{duplicates} {}",
                escape(&list.separator),
                inner.command()
            ))
        }),
    };
    Ok(action)
}

fn choices_action(ctx: &mut Context<'_>, choices: &[Choice]) -> ZshAction {
    let described = choices.iter().any(|c| c.description.is_some());
    if !described && choices.len() <= INLINE_CHOICES_LIMIT {
        return ZshAction::Words(choices.iter().map(|c| quote_word(&c.item)).collect());
    }
    let items: Vec<String> = choices
        .iter()
        .map(|c| {
            let item = c.item.replace(':', r"\:");
            match &c.description {
                Some(description) => escape(&format!("{item}:{description}")),
                None => escape(&item),
            }
        })
        .collect();
    let body = format!(
        "local -a items\nitems=(\n  {}\n)\n_describe -t choices choice items",
        items.join("\n  ")
    );
    ZshAction::Call(ctx.helpers.add_dynamic("choices", &body, wrap_function))
}

fn file_action(ctx: &Context<'_>, file: &FileCompletion) -> ZshAction {
    let mut call = "_files".to_string();
    match file.extensions.as_slice() {
        [] => {}
        [one] => call.push_str(&format!(" -g {}", escape(&format!("*.{}", zsh_escape_literal(one))))),
        many => {
            let alternatives: Vec<String> = many.iter().map(|e| zsh_escape_literal(e)).collect();
            call.push_str(&format!(
                " -g {}",
                escape(&format!("*.({})", alternatives.join("|")))
            ));
        }
    }

    let mut ignored = Vec::new();
    for glob in &file.ignore_globs {
        match parse_glob(glob).and_then(|g| g.to_zsh_glob()) {
            Ok(pattern) => ignored.push(pattern),
            Err(_) => ctx.unsupported_glob("file ignore glob", glob),
        }
    }
    if !ignored.is_empty() {
        call.push_str(&format!(" -F {}", escape(&format!("({})", ignored.join(" ")))));
    }

    if let Some(dir) = &file.directory {
        call.push_str(&format!(" -W {}", escape(dir)));
    }
    ZshAction::Call(call)
}

/// Escapes the characters `_values` treats specially in a value name.
fn value_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, '[' | ']' | ':' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn bracketed(description: Option<&str>) -> String {
    description
        .map(|d| format!("[{}]", value_name(d)))
        .unwrap_or_default()
}

fn value_list_action(list: &ValueListCompletion) -> ZshAction {
    let star = if list.duplicates { "*" } else { "" };
    let items: Vec<String> = list
        .values
        .iter()
        .map(|c| {
            escape(&format!(
                "{star}{}{}",
                value_name(&c.item),
                bracketed(c.description.as_deref())
            ))
        })
        .collect();
    ZshAction::Call(format!(
        "_values -s {} value {}",
        escape(&list.separator),
        items.join(" ")
    ))
}

fn key_value_list_action(ctx: &mut Context<'_>, list: &KeyValueListCompletion) -> Result<ZshAction> {
    let mut items = Vec::new();
    for key in &list.keys {
        let mut item = format!(
            "{}{}",
            value_name(&key.key),
            bracketed(key.description.as_deref())
        );
        if let Some(completion) = &key.completion {
            let action = completer(ctx, completion)?
                .map(|a| a.spec())
                .unwrap_or_else(|| " ".to_string());
            item.push_str(&format!(":value:{action}"));
        }
        items.push(escape(&item));
    }
    Ok(ZshAction::Call(format!(
        "_values -s {} -S {} key {}",
        escape(&list.separator),
        escape(&list.pair_separator),
        items.join(" ")
    )))
}

fn prefix_action(ctx: &mut Context<'_>, prefix: &str, inner: Option<&ZshAction>) -> ZshAction {
    let inner = inner.map(ZshAction::command).unwrap_or_else(|| ":".to_string());
    let body = format!(
        "if compset -P {}; then\n  {inner}\nelse\n  compadd -S '' -- {}\nfi",
        escape(&zsh_escape_literal(prefix)),
        quote_word(prefix)
    );
    ZshAction::Call(ctx.helpers.add_dynamic("prefix", &body, wrap_function))
}

pub(crate) fn wrap_function(name: &str, body: &str) -> String {
    let indented = body
        .lines()
        .map(|l| if l.is_empty() { String::new() } else { format!("  {l}") })
        .collect::<Vec<_>>()
        .join("\n");
    format!("{name}() {{\n{indented}\n}}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Shell;
    use completion_schema_core::{CommandLine, CommandTree, Config, KeyValue, ListCompletion};
    use tracing_test::traced_test;

    fn run<T>(f: impl FnOnce(&mut Context<'_>) -> T) -> T {
        let config = Config::default();
        let root = CommandLine::new("example");
        let mut ctx = Context::new(Shell::Zsh, CommandTree::new(&root), &config);
        f(&mut ctx)
    }

    fn spec(ctx: &mut Context<'_>, completion: Completion) -> String {
        completer(ctx, &completion).unwrap().unwrap().spec()
    }

    #[test]
    fn test_quote_word() {
        assert_eq!(quote_word("rpm"), "rpm");
        assert_eq!(quote_word("a b"), r"a\ b");
        assert_eq!(quote_word("x:y"), r"x\:y");
        assert_eq!(quote_word(""), "''");
    }

    #[test]
    fn test_simple_kinds() {
        run(|ctx| {
            assert_eq!(spec(ctx, Completion::choices(["rpm", "deb"])), "(rpm deb)");
            assert_eq!(spec(ctx, Completion::User), "_users");
            assert_eq!(spec(ctx, Completion::Command), "_command_names -e");
            assert_eq!(spec(ctx, Completion::directory()), "_files -/");
            assert_eq!(spec(ctx, Completion::range(1, 10)), "__example_range 1 10 1");
            assert!(completer(ctx, &Completion::Integer).unwrap().is_none());
        });
    }

    #[test]
    #[traced_test]
    fn test_file_filters() {
        run(|ctx| {
            assert_eq!(spec(ctx, Completion::file_with_extensions(["c", "h"])), "_files -g '*.(c|h)'");
            let file = Completion::File(FileCompletion {
                directory: Some("/etc".into()),
                extensions: vec!["conf".into()],
                ignore_globs: vec!["*.bak".into(), "!(x)".into()],
            });
            assert_eq!(spec(ctx, file), "_files -g '*.conf' -F '(*.bak)' -W /etc");
        });
        assert!(logs_contain("kind=file ignore glob"));
        assert!(logs_contain("pattern=!(x)"));
        assert!(logs_contain("pattern dropped"));
    }

    #[test]
    fn test_described_choices_use_describe() {
        run(|ctx| {
            let completion = Completion::described_choices([("rpm", "Red Hat"), ("deb", "Debian")]);
            assert_eq!(spec(ctx, completion), "__example_choices_1");
            let rendered = ctx.helpers.render().unwrap();
            assert!(rendered.contains("  items=(\n    'rpm:Red Hat'\n    deb:Debian\n  )"));
            assert!(rendered.contains("_describe -t choices choice items"));
        });
    }

    #[test]
    fn test_value_lists() {
        run(|ctx| {
            let values = Completion::ValueList(ValueListCompletion {
                values: vec![Choice::new("a"), Choice::described("b", "Bee")],
                separator: ",".into(),
                duplicates: false,
            });
            assert_eq!(spec(ctx, values), "_values -s , value a 'b[Bee]'");

            let pairs = Completion::KeyValueList(KeyValueListCompletion {
                keys: vec![
                    KeyValue {
                        key: "mode".into(),
                        description: None,
                        completion: Some(Completion::choices(["fast", "slow"])),
                    },
                    KeyValue {
                        key: "debug".into(),
                        description: Some("Debug".into()),
                        completion: None,
                    },
                ],
                separator: ",".into(),
                pair_separator: "=".into(),
            });
            assert_eq!(
                spec(ctx, pairs),
                "_values -s , -S = key 'mode:value:(fast slow)' 'debug[Debug]'"
            );
        });
    }

    #[test]
    fn test_list_and_combine() {
        run(|ctx| {
            let list = Completion::List(ListCompletion {
                completion: Box::new(Completion::choices(["x", "y"])),
                separator: ",".into(),
                duplicates: true,
            });
            assert_eq!(spec(ctx, list), "_sequence -s , -d compadd -- x y");

            let combined = Completion::Combine(vec![Completion::User, Completion::Group]);
            assert_eq!(spec(ctx, combined), "_alternative part1:value:_users part2:value:_groups");
        });
    }

    #[test]
    fn test_prefix_function() {
        run(|ctx| {
            let completion = Completion::Prefix {
                prefix: "file:".into(),
                completion: Box::new(Completion::file()),
            };
            assert_eq!(spec(ctx, completion), "__example_prefix_1");
            let rendered = ctx.helpers.render().unwrap();
            assert!(rendered.contains("  if compset -P file:; then\n    _files\n  else\n    compadd -S '' -- file\\:\n  fi"));
        });
    }
}
