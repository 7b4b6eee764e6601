//! Completion kinds as Fish candidate generators.
//!
//! Generators are Fish commands printing one candidate per line, optionally
//! followed by a tab and a description. Inside generated functions the word
//! being completed is `$token`; at the top level it comes from
//! `__<prog>_token`.

use completion_schema_core::glob::parse_glob;
use completion_schema_core::{
    Choice, Completion, FileCompletion, KeyValueListCompletion, ListCompletion,
};

use super::helpers::{LOGIN_SHELLS, SERVICES, SIGNALS, TOKEN};
use crate::context::Context;
use crate::error::Result;
use crate::escape::{escape_fish, escape_fish_words};

/// Above this many items, choices move into a generated function.
const INLINE_CHOICES_LIMIT: usize = 16;

/// How an argument is completed in Fish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FishCompleter {
    /// Fish's own file completion.
    Files,
    /// Literal candidates for `complete -a`.
    Words(String),
    /// A command printing candidates.
    Code(String),
}

impl FishCompleter {
    /// The completer as a command printing candidates for `$token`.
    pub(crate) fn code(&self) -> String {
        match self {
            FishCompleter::Files => r#"__fish_complete_path "$token""#.to_string(),
            FishCompleter::Words(words) => format!("printf '%s\\n' {words}"),
            FishCompleter::Code(code) => code.clone(),
        }
    }

    /// The value of `complete -a`, or `None` for plain file completion.
    pub(crate) fn arguments(&self, ctx: &mut Context<'_>) -> Option<String> {
        match self {
            FishCompleter::Files => None,
            FishCompleter::Words(words) => Some(words.clone()),
            FishCompleter::Code(code) => {
                let code = if code.contains("$token") {
                    let token = format!("({})", ctx.helpers.use_helper(&TOKEN));
                    code.replace(r#""$token""#, &token).replace("$token", &token)
                } else {
                    code.clone()
                };
                Some(format!("({code})"))
            }
        }
    }
}

/// Returns the completer for `completion`, or `None` if nothing is offered.
pub(crate) fn completer(
    ctx: &mut Context<'_>,
    completion: &Completion,
) -> Result<Option<FishCompleter>> {
    let code = |s: &str| Some(FishCompleter::Code(s.to_string()));
    let completer = match completion {
        Completion::None | Completion::Integer | Completion::Float => None,
        Completion::Choices(choices) => Some(choices_completer(ctx, choices)),
        Completion::File(file) => Some(file_completer(ctx, file)),
        Completion::Directory { directory } => {
            let inner = FishCompleter::Code(r#"__fish_complete_directories "$token""#.into());
            Some(match directory {
                Some(dir) => in_directory(ctx, dir, &inner),
                None => inner,
            })
        }
        Completion::Command => code("__fish_complete_command"),
        Completion::User => code("__fish_complete_users"),
        Completion::Group => code("__fish_complete_groups"),
        Completion::Pid => code("__fish_complete_pids"),
        Completion::Process => code("__fish_complete_proc"),
        Completion::Hostname => code("__fish_print_hostnames"),
        Completion::NetInterface => code("__fish_print_interfaces"),
        Completion::Variable => code("set -n"),
        Completion::Environment => code("set -n -x"),
        Completion::Locale => code("locale -a"),
        Completion::Charset => code("locale -m"),
        Completion::Signal => Some(FishCompleter::Code(ctx.helpers.use_helper(&SIGNALS))),
        Completion::Service => Some(FishCompleter::Code(ctx.helpers.use_helper(&SERVICES))),
        Completion::LoginShell => Some(FishCompleter::Code(ctx.helpers.use_helper(&LOGIN_SHELLS))),
        Completion::Date { .. } => {
            ctx.unsupported(completion.kind());
            None
        }
        Completion::History { pattern } => Some(FishCompleter::Code(format!(
            "history | string match -r -- {}",
            escape_fish(pattern)
        ))),
        Completion::Range { start, stop, step } => {
            Some(FishCompleter::Code(format!("seq {start} {step} {stop}")))
        }
        Completion::Exec { command } | Completion::ExecFast { command } => {
            Some(FishCompleter::Code(format!("sh -c {}", escape_fish(command))))
        }
        Completion::ValueList(list) => {
            let values = choices_code(&list.values);
            Some(list_function(ctx, &values, &list.separator, list.duplicates))
        }
        Completion::KeyValueList(list) => Some(key_value_function(ctx, list)?),
        Completion::Combine(parts) => {
            let mut lines = Vec::new();
            for part in parts {
                if let Some(inner) = completer(ctx, part)? {
                    lines.push(inner.code());
                }
            }
            if lines.is_empty() {
                None
            } else {
                Some(combinator(ctx, "combine", &lines.join("\n")))
            }
        }
        Completion::Prefix { prefix, completion } => {
            let inner = completer(ctx, completion)?;
            Some(prefix_function(ctx, prefix, inner.as_ref()))
        }
        Completion::List(list) => list_completer(ctx, list)?,
    };
    Ok(completer)
}

fn choices_code(choices: &[Choice]) -> String {
    if choices.iter().any(|c| c.description.is_some()) {
        let args: Vec<&str> = choices
            .iter()
            .flat_map(|c| [c.item.as_str(), c.description.as_deref().unwrap_or_default()])
            .collect();
        format!("printf '%s\\t%s\\n' {}", escape_fish_words(args))
    } else {
        format!(
            "printf '%s\\n' {}",
            escape_fish_words(choices.iter().map(|c| c.item.as_str()))
        )
    }
}

fn choices_completer(ctx: &mut Context<'_>, choices: &[Choice]) -> FishCompleter {
    let described = choices.iter().any(|c| c.description.is_some());
    if choices.len() > INLINE_CHOICES_LIMIT {
        let name = ctx
            .helpers
            .add_dynamic("choices", &choices_code(choices), wrap_function);
        FishCompleter::Code(name)
    } else if described {
        FishCompleter::Code(choices_code(choices))
    } else {
        FishCompleter::Words(escape_fish_words(choices.iter().map(|c| c.item.as_str())))
    }
}

fn file_completer(ctx: &mut Context<'_>, file: &FileCompletion) -> FishCompleter {
    let mut completer = if file.extensions.is_empty() {
        FishCompleter::Files
    } else {
        let extensions: Vec<String> = file.extensions.iter().map(|e| regex::escape(e)).collect();
        let pattern = format!(r"(/|\.({}))$", extensions.join("|"));
        FishCompleter::Code(format!(
            r#"__fish_complete_path "$token" | string match -r -- {}"#,
            escape_fish(&pattern)
        ))
    };

    let mut ignored = Vec::new();
    for glob in &file.ignore_globs {
        match parse_glob(glob).and_then(|g| g.to_regex()) {
            Ok(regex) => ignored.push(regex),
            Err(_) => ctx.unsupported_glob("file ignore glob", glob),
        }
    }
    if !ignored.is_empty() {
        let pattern = format!("(^|/)({})/?$", ignored.join("|"));
        let body = format!(
            "{} | string match -rv -- {}",
            completer.code(),
            escape_fish(&pattern)
        );
        completer = combinator(ctx, "ignore", &body);
    }

    match &file.directory {
        Some(dir) => in_directory(ctx, dir, &completer),
        None => completer,
    }
}

fn in_directory(ctx: &mut Context<'_>, dir: &str, inner: &FishCompleter) -> FishCompleter {
    let body = format!(
        "pushd {} 2>/dev/null; or return\n{}\npopd",
        escape_fish(dir),
        inner.code()
    );
    combinator(ctx, "in_directory", &body)
}

/// Splits `$token` at the last `separator` into `$head` (kept) and
/// `$token` (completed).
fn split_token(separator: &str) -> String {
    let sep = escape_fish(separator);
    format!(
        "set -l parts (string split -- {sep} \"$token\")
set token $parts[-1]
set -e parts[-1]
set -l head ''
if set -q parts[1]
    set head (string join -- {sep} $parts){sep}
end"
    )
}

fn list_function(ctx: &mut Context<'_>, inner: &str, separator: &str, duplicates: bool) -> FishCompleter {
    let filter = if duplicates {
        String::new()
    } else {
        "    contains -- (string split -m 1 -- \\t $item)[1] $parts; and continue\n".to_string()
    };
    let body = format!(
        "{}\nfor item in ({inner})\n{filter}    printf '%s%s\\n' $head $item\nend",
        split_token(separator)
    );
    combinator(ctx, "list", &body)
}

fn list_completer(ctx: &mut Context<'_>, list: &ListCompletion) -> Result<Option<FishCompleter>> {
    let Some(inner) = completer(ctx, &list.completion)? else {
        return Ok(None);
    };
    Ok(Some(list_function(
        ctx,
        &inner.code(),
        &list.separator,
        list.duplicates,
    )))
}

fn key_value_function(ctx: &mut Context<'_>, list: &KeyValueListCompletion) -> Result<FishCompleter> {
    let pair = escape_fish(&list.pair_separator);
    let mut arms = String::new();
    let mut keys = String::new();
    for key in &list.keys {
        let spelled = match &key.completion {
            Some(_) => format!("{}{}", key.key, list.pair_separator),
            None => key.key.clone(),
        };
        keys.push_str(&format!(
            "    contains -- {} $used; or printf '%s%s\\t%s\\n' $head {} {}\n",
            escape_fish(&key.key),
            escape_fish(&spelled),
            escape_fish(key.description.as_deref().unwrap_or_default())
        ));
        if let Some(completion) = &key.completion
            && let Some(inner) = completer(ctx, completion)?
        {
            arms.push_str(&format!(
                "        case {}\n            for item in ({})\n                printf '%s%s%s%s\\n' $head $pair[1] {pair} $item\n            end\n",
                escape_fish(&key.key),
                inner.code()
            ));
        }
    }
    let body = format!(
        "{}\nset -l used\nfor part in $parts\n    set -a used (string split -m 1 -- {pair} $part)[1]\nend\nset -l pair (string split -m 1 -- {pair} \"$token\")\nif set -q pair[2]\n    set token $pair[2]\n    switch $pair[1]\n{arms}    end\nelse\n{keys}end",
        split_token(&list.separator)
    );
    Ok(combinator(ctx, "key_value_list", &body))
}

fn prefix_function(ctx: &mut Context<'_>, prefix: &str, inner: Option<&FishCompleter>) -> FishCompleter {
    let quoted = escape_fish(prefix);
    let glob = escape_fish(&format!(
        "{}*",
        prefix.replace('\\', r"\\").replace('*', r"\*").replace('?', r"\?")
    ));
    let inner = inner.map(FishCompleter::code).unwrap_or_else(|| "true".to_string());
    let body = format!(
        "if string match -q -- {glob} \"$token\"
    set token (string sub -s {} -- \"$token\")
    for item in ({inner})
        printf '%s%s\\n' {quoted} $item
    end
else
    printf '%s\\n' {quoted}
end",
        prefix.chars().count() + 1
    );
    combinator(ctx, "prefix", &body)
}

/// Moves `body` into a function receiving the token as `$argv[1]`.
fn combinator(ctx: &mut Context<'_>, base: &str, body: &str) -> FishCompleter {
    let body = format!("set -l token $argv[1]\n{body}");
    let name = ctx.helpers.add_dynamic(base, &body, wrap_function);
    FishCompleter::Code(format!("{name} \"$token\""))
}

fn wrap_function(name: &str, body: &str) -> String {
    let indented = body
        .lines()
        .map(|l| if l.is_empty() { String::new() } else { format!("    {l}") })
        .collect::<Vec<_>>()
        .join("\n");
    format!("function {name}\n{indented}\nend")
}
