//! Completion kinds as Bash completer commands.
//!
//! Every completer is a single simple command appending to `COMPREPLY`, so
//! wrappers like `__prefix_complete_list_of` can take another completer as
//! their trailing arguments.

use completion_schema_core::glob::parse_glob;
use completion_schema_core::{
    Completion, FileCompletion, KeyValueListCompletion, ListCompletion, ValueListCompletion,
};

use super::helpers::*;
use crate::context::Context;
use crate::error::{GenerateError, Result};
use crate::escape::{escape, escape_words};

/// Above this many items, choices move into a generated function.
pub(crate) const INLINE_CHOICES_LIMIT: usize = 16;

/// Returns the command completing `completion`, or `None` if nothing is
/// offered.
pub(crate) fn completer(ctx: &mut Context<'_>, completion: &Completion) -> Result<Option<String>> {
    let command = match completion {
        Completion::None | Completion::Integer | Completion::Float => return Ok(None),
        Completion::Choices(choices) => {
            let list = ctx.helpers.use_helper(&COMPLETE_LIST);
            let command = format!(
                "{list} {}",
                escape_words(choices.iter().map(|c| c.item.as_str()))
            );
            if choices.len() > INLINE_CHOICES_LIMIT {
                dynamic(ctx, "choices", &command)
            } else {
                command
            }
        }
        Completion::File(file) => file_completer(ctx, file)?,
        Completion::Directory { directory } => {
            let command = library(ctx, "filedir", "-d");
            match directory {
                Some(dir) => in_directory(ctx, dir, &command),
                None => command,
            }
        }
        Completion::Command => compgen(ctx, "-c"),
        Completion::User => compgen(ctx, "-u"),
        Completion::Group => compgen(ctx, "-g"),
        Completion::Variable => compgen(ctx, "-v"),
        Completion::Environment => compgen(ctx, "-e"),
        Completion::Pid => library(ctx, "pids", ""),
        Completion::Process => library(ctx, "pnames", ""),
        Completion::Signal => library(ctx, "signals", ""),
        Completion::Service => library(ctx, "services", ""),
        Completion::NetInterface => library(ctx, "available_interfaces", ""),
        Completion::LoginShell => library(ctx, "shells", ""),
        Completion::Hostname => library(ctx, "known_hosts", r#"-- "$cur""#),
        Completion::Locale => exec_fast(ctx, "locale -a"),
        Completion::Charset => exec_fast(ctx, "locale -m"),
        Completion::Date { .. } => {
            ctx.unsupported(completion.kind());
            return Ok(None);
        }
        Completion::History { pattern } => {
            let history = ctx.helpers.use_helper(&HISTORY);
            format!("{history} {}", escape(pattern))
        }
        Completion::Range { start, stop, step } => {
            let range = ctx.helpers.use_helper(&COMPLETE_RANGE);
            format!("{range} {start} {stop} {step}")
        }
        Completion::Exec { command } => {
            let exec = ctx.helpers.use_helper(&EXEC);
            format!("{exec} {}", escape(command))
        }
        Completion::ExecFast { command } => exec_fast(ctx, command),
        Completion::ValueList(list) => value_list(ctx, list),
        Completion::KeyValueList(list) => key_value_list(ctx, list)?,
        Completion::Combine(parts) => {
            let mut lines = Vec::new();
            for part in parts {
                if let Some(command) = completer(ctx, part)? {
                    lines.push(command);
                }
            }
            if lines.is_empty() {
                return Ok(None);
            }
            dynamic(ctx, "combine", &lines.join("\n"))
        }
        Completion::Prefix { prefix, completion } => {
            let inner = completer(ctx, completion)?.unwrap_or_else(|| "true".to_string());
            let helper = ctx.helpers.use_helper(&COMPLETE_PREFIX);
            format!("{helper} {} {inner}", escape(prefix))
        }
        Completion::List(list) => match list_completer(ctx, list)? {
            Some(command) => command,
            None => return Ok(None),
        },
    };
    Ok(Some(command))
}

fn file_completer(ctx: &mut Context<'_>, file: &FileCompletion) -> Result<String> {
    let mut command = if file.extensions.is_empty() {
        library(ctx, "filedir", "")
    } else {
        let pattern = format!("@({})", file.extensions.join("|"));
        library(ctx, "filedir", &escape(&pattern))
    };

    if !file.ignore_globs.is_empty() {
        let mut globs = Vec::with_capacity(file.ignore_globs.len());
        for glob in &file.ignore_globs {
            let parsed = parse_glob(glob).map_err(|e| {
                GenerateError::Internal(format!("ignore glob {glob:?} rejected: {e}"))
            })?;
            globs.push(parsed.to_bash_glob());
        }
        let ignoring = ctx.helpers.use_helper(&COMPLETE_IGNORING);
        command = format!("{ignoring} {} -- {command}", escape_words(&globs));
    }

    Ok(match &file.directory {
        Some(dir) => in_directory(ctx, dir, &command),
        None => command,
    })
}

fn value_list(ctx: &mut Context<'_>, list: &ValueListCompletion) -> String {
    let list_of = ctx.helpers.use_helper(&COMPLETE_LIST_OF);
    let items = ctx.helpers.use_helper(&COMPLETE_LIST);
    format!(
        "{list_of} {} {} {items} {}",
        escape(&list.separator),
        u8::from(list.duplicates),
        escape_words(list.values.iter().map(|v| v.item.as_str()))
    )
}

fn key_value_list(ctx: &mut Context<'_>, list: &KeyValueListCompletion) -> Result<String> {
    let mut arms = Vec::new();
    let mut keys = Vec::with_capacity(list.keys.len());
    for key in &list.keys {
        match &key.completion {
            Some(completion) => {
                keys.push(format!("{}{}", key.key, list.pair_separator));
                if let Some(command) = completer(ctx, completion)? {
                    arms.push(format!("  {}) {command};;", escape(&key.key)));
                }
            }
            None => keys.push(key.key.clone()),
        }
    }

    let values = if arms.is_empty() {
        "true".to_string()
    } else {
        let body = format!("case \"$1\" in\n{}\nesac", arms.join("\n"));
        ctx.helpers.add_dynamic("key_values", &body, wrap_function)
    };
    let helper = ctx.helpers.use_helper(&COMPLETE_KEY_VALUE_LIST);
    Ok(format!(
        "{helper} {} {} {values} {}",
        escape(&list.separator),
        escape(&list.pair_separator),
        escape_words(&keys)
    ))
}

fn list_completer(ctx: &mut Context<'_>, list: &ListCompletion) -> Result<Option<String>> {
    let Some(inner) = completer(ctx, &list.completion)? else {
        return Ok(None);
    };
    let list_of = ctx.helpers.use_helper(&COMPLETE_LIST_OF);
    Ok(Some(format!(
        "{list_of} {} {} {inner}",
        escape(&list.separator),
        u8::from(list.duplicates)
    )))
}

fn in_directory(ctx: &mut Context<'_>, dir: &str, command: &str) -> String {
    let helper = ctx.helpers.use_helper(&COMPLETE_IN_DIRECTORY);
    format!("{helper} {} {command}", escape(dir))
}

fn compgen(ctx: &mut Context<'_>, action: &str) -> String {
    let helper = ctx.helpers.use_helper(&COMPGEN);
    format!("{helper} {action}")
}

fn exec_fast(ctx: &mut Context<'_>, command: &str) -> String {
    let helper = ctx.helpers.use_helper(&EXEC_FAST);
    format!("{helper} {}", escape(command))
}

/// Calls a bash-completion generator, appending to `COMPREPLY`.
///
/// From 2.12 on this is `_comp_compgen -a NAME`; older versions only have
/// the `_NAME` functions, some of which overwrite `COMPREPLY`.
fn library(ctx: &mut Context<'_>, name: &str, args: &str) -> String {
    let command = if ctx.config.bash_completions_version.has_comp_api() {
        format!("_comp_compgen -a {name}")
    } else {
        let legacy = match name {
            "known_hosts" => "_known_hosts_real",
            "filedir" => "_filedir",
            "pids" => "_pids",
            "pnames" => "_pnames",
            "signals" => "_signals",
            "services" => "_services",
            "available_interfaces" => "_available_interfaces",
            "shells" => "_shells",
            other => other,
        };
        let append = ctx.helpers.use_helper(&APPEND);
        format!("{append} {legacy}")
    };
    if args.is_empty() {
        command
    } else {
        format!("{command} {args}")
    }
}

/// Moves `body` into a generated function and returns its name.
fn dynamic(ctx: &mut Context<'_>, base: &str, body: &str) -> String {
    ctx.helpers.add_dynamic(base, body, wrap_function)
}

pub(crate) fn wrap_function(name: &str, body: &str) -> String {
    let indented = body
        .lines()
        .map(|l| format!("  {l}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("{name}() {{\n{indented}\n}}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Shell;
    use completion_schema_core::{
        BashCompletionsVersion, Choice, CommandLine, CommandTree, Config, KeyValue,
    };
    use tracing_test::traced_test;

    fn run<T>(config: &Config, f: impl FnOnce(&mut Context<'_>) -> T) -> T {
        let root = CommandLine::new("example");
        let mut ctx = Context::new(Shell::Bash, CommandTree::new(&root), config);
        f(&mut ctx)
    }

    fn command(config: &Config, completion: &Completion) -> Option<String> {
        run(config, |ctx| completer(ctx, completion).unwrap())
    }

    #[test]
    fn test_choices_inline_and_dynamic() {
        let config = Config::default();
        assert_eq!(
            command(&config, &Completion::choices(["rpm", "deb"])).unwrap(),
            "__example_complete_list rpm deb"
        );
        let many = Completion::choices((0..20).map(|i| format!("c{i}")));
        run(&config, |ctx| {
            let name = completer(ctx, &many).unwrap().unwrap();
            assert_eq!(name, "__example_choices_1");
            assert!(ctx.helpers.render().unwrap().contains("__example_choices_1() {"));
        });
    }

    #[test]
    fn test_file_dialects() {
        let old = Config::default();
        let new = Config {
            bash_completions_version: BashCompletionsVersion(2, 12),
            ..Config::default()
        };
        assert_eq!(command(&old, &Completion::file()).unwrap(), "__example_append _filedir");
        assert_eq!(command(&new, &Completion::file()).unwrap(), "_comp_compgen -a filedir");
        assert_eq!(
            command(&old, &Completion::file_with_extensions(["c", "h"])).unwrap(),
            "__example_append _filedir '@(c|h)'"
        );
        assert_eq!(
            command(&new, &Completion::Hostname).unwrap(),
            r#"_comp_compgen -a known_hosts -- "$cur""#
        );
    }

    #[test]
    fn test_file_in_directory_ignoring_globs() {
        let file = Completion::File(FileCompletion {
            directory: Some("/etc".into()),
            extensions: vec![],
            ignore_globs: vec!["*.bak".into()],
        });
        assert_eq!(
            command(&Config::default(), &file).unwrap(),
            "__example_complete_in_directory /etc __example_complete_ignoring '*.bak' -- __example_append _filedir"
        );
    }

    #[test]
    #[traced_test]
    fn test_empty_kinds() {
        let config = Config::default();
        assert!(command(&config, &Completion::None).is_none());
        assert!(command(&config, &Completion::Integer).is_none());
        assert!(command(&config, &Completion::Date { format: "%F".into() }).is_none());
        assert!(command(&config, &Completion::Combine(vec![Completion::Float])).is_none());
        assert!(logs_contain("kind=date"));
        assert!(logs_contain("offering no candidates"));
    }

    #[test]
    fn test_value_and_key_value_lists() {
        let config = Config::default();
        let values = Completion::ValueList(ValueListCompletion {
            values: vec![Choice::new("read"), Choice::new("write")],
            separator: ",".into(),
            duplicates: false,
        });
        assert_eq!(
            command(&config, &values).unwrap(),
            "__example_complete_list_of , 0 __example_complete_list read write"
        );

        let pairs = Completion::KeyValueList(KeyValueListCompletion {
            keys: vec![
                KeyValue {
                    key: "mode".into(),
                    description: None,
                    completion: Some(Completion::choices(["fast", "slow"])),
                },
                KeyValue {
                    key: "verbose".into(),
                    description: None,
                    completion: None,
                },
            ],
            separator: ",".into(),
            pair_separator: "=".into(),
        });
        run(&config, |ctx| {
            let command = completer(ctx, &pairs).unwrap().unwrap();
            assert_eq!(
                command,
                "__example_complete_key_value_list , = __example_key_values_1 mode= verbose"
            );
            let helpers = ctx.helpers.render().unwrap();
            assert!(helpers.contains("    mode) __example_complete_list fast slow;;"));
        });
    }

    #[test]
    fn test_combine_prefix_and_list() {
        let config = Config::default();
        let combined = Completion::Combine(vec![Completion::choices(["all"]), Completion::User]);
        run(&config, |ctx| {
            assert_eq!(completer(ctx, &combined).unwrap().unwrap(), "__example_combine_1");
            let helpers = ctx.helpers.render().unwrap();
            assert!(helpers.contains(
                "__example_combine_1() {\n  __example_complete_list all\n  __example_compgen -u\n}"
            ));
        });

        let prefixed = Completion::Prefix {
            prefix: "file:".into(),
            completion: Box::new(Completion::file()),
        };
        assert_eq!(
            command(&config, &prefixed).unwrap(),
            "__example_complete_prefix file: __example_append _filedir"
        );

        let list = Completion::List(ListCompletion {
            completion: Box::new(Completion::User),
            separator: ":".into(),
            duplicates: true,
        });
        assert_eq!(
            command(&config, &list).unwrap(),
            "__example_complete_list_of : 1 __example_compgen -u"
        );
    }

    #[test]
    fn test_exec_and_range() {
        let config = Config::default();
        assert_eq!(
            command(&config, &Completion::exec("printf 'a\\tb\\n'")).unwrap(),
            r#"__example_exec "printf 'a\\tb\\n'""#
        );
        assert_eq!(
            command(&config, &Completion::Range { start: 1, stop: 9, step: 2 }).unwrap(),
            "__example_complete_range 1 9 2"
        );
        assert_eq!(
            command(&config, &Completion::Locale).unwrap(),
            "__example_exec_fast 'locale -a'"
        );
    }
}
