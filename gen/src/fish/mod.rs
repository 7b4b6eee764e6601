//! Fish backend.
//!
//! Fish has no per-command completion function, so every option,
//! positional and subcommand becomes one `complete` entry whose `-n`
//! condition asks `__<prog>_query` about the words before the cursor.

mod complete;
mod helpers;

use std::collections::HashMap;
use std::fmt::Write as _;

use completion_schema_core::expr::{ConditionSyntax, Expr};
use completion_schema_core::{ArgKind, CliOption, Condition, NodeId, OptionShape, WhenExpr};

use self::complete::{FishCompleter, completer};
use self::helpers::QUERY;
use crate::context::Context;
use crate::document::Sections;
use crate::error::Result;
use crate::escape::{escape_fish, escape_fish_words};

struct FishCondition<'m> {
    query: &'m str,
    keys: &'m HashMap<String, String>,
}

impl FishCondition<'_> {
    fn keys(&self, options: &[String]) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for key in options.iter().filter_map(|o| self.keys.get(o)) {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
        keys
    }
}

impl ConditionSyntax<Condition> for FishCondition<'_> {
    fn atom(&self, atom: &Condition) -> String {
        match atom {
            Condition::HasOption { options } => {
                format!("{} has_option {}", self.query, self.keys(options).join(" "))
            }
            Condition::OptionIs { options, values } => format!(
                "{} option_is {} -- {}",
                self.query,
                self.keys(options).join(" "),
                escape_fish_words(values)
            ),
        }
    }

    fn and(&self, lhs: String, rhs: String) -> String {
        format!("{lhs}; and {rhs}")
    }

    fn or(&self, lhs: String, rhs: String) -> String {
        format!("{lhs}; or {rhs}")
    }

    fn not(&self, inner: String) -> String {
        format!("not {inner}")
    }

    fn group(&self, inner: String) -> String {
        format!("begin; {inner}; end")
    }
}

/// Builder for one `complete` line.
struct Entry {
    conditions: Vec<String>,
    flags: Vec<String>,
}

impl Entry {
    fn new() -> Self {
        Self {
            conditions: Vec::new(),
            flags: Vec::new(),
        }
    }

    fn flag(&mut self, flag: &str, value: &str) {
        self.flags.push(format!("{flag} {}", escape_fish(value)));
    }

    fn render(&self, program: &str) -> String {
        let mut line = format!("complete -c {}", escape_fish(program));
        if !self.conditions.is_empty() {
            let _ = write!(line, " -n {}", escape_fish(&self.conditions.join("; and ")));
        }
        for flag in &self.flags {
            line.push(' ');
            line.push_str(flag);
        }
        line
    }
}

pub(crate) fn generate(ctx: &mut Context<'_>) -> Result<Sections> {
    let features = ctx.features();
    let program = ctx.program();
    let mut body = format!("complete -c {} -f\n", escape_fish(program));

    for id in ctx.tree.ids() {
        let entries = node_entries(ctx, id, features.subcommands)?;
        if !entries.is_empty() {
            body.push('\n');
            for entry in entries {
                body.push_str(&entry.render(program));
                body.push('\n');
            }
        }
    }

    let query = ctx.helpers.name_of(&QUERY);
    if ctx.helpers.contains(&query) {
        for define in features.defines(ctx.config) {
            ctx.helpers.define(&query, define);
        }
        let lookup = lookup_function(ctx)?;
        ctx.helpers
            .add_function(&format!("__{}_lookup_option", ctx.prefix), lookup);
        if features.subcommands {
            let resolve = resolve_function(ctx);
            ctx.helpers
                .add_function(&format!("__{}_resolve_subcommand", ctx.prefix), resolve);
        }
    }

    let registration = ctx
        .tree
        .command(ctx.tree.root())
        .aliases
        .iter()
        .map(|alias| format!("complete -c {} -w {}", escape_fish(alias), escape_fish(program)))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(Sections {
        header: None,
        body,
        registration,
    })
}

fn query(ctx: &mut Context<'_>) -> String {
    ctx.helpers.use_helper(&QUERY)
}

fn node_entries(ctx: &mut Context<'_>, id: NodeId, subcommands: bool) -> Result<Vec<Entry>> {
    let command = ctx.tree.command(id);
    let path_condition = if subcommands {
        let query = query(ctx);
        Some(format!(
            "{query} path_is {}",
            escape_fish(&ctx.tree.command_path(id))
        ))
    } else {
        None
    };
    let mut entries = Vec::new();

    // Options.
    let finals = ctx.final_keys(id)?;
    for option in ctx.tree.effective_options(id) {
        if option.option.hidden {
            continue;
        }
        let mut entry = Entry::new();
        entry.conditions.extend(path_condition.clone());
        if !finals.is_empty() {
            let query = query(ctx);
            entry
                .conditions
                .push(format!("not {query} has_option {}", finals.join(" ")));
        }
        let excluded = ctx.exclusion_keys(&option)?;
        if !excluded.is_empty() {
            let query = query(ctx);
            entry
                .conditions
                .push(format!("not {query} has_option {}", excluded.join(" ")));
        }
        if let Some(expr) = &option.option.condition {
            entry.conditions.push(condition_code(ctx, id, expr)?);
        }
        option_flags(&mut entry, option.option);
        argument_flags(ctx, &mut entry, option.option)?;
        entries.push(entry);
    }

    // Positionals.
    for positional in &command.positionals {
        let Some(completer) = completer(ctx, &positional.complete)? else {
            continue;
        };
        let mut entry = Entry::new();
        entry.conditions.extend(path_condition.clone());
        let query = query(ctx);
        let position = ctx.tree.positional_position(id, positional);
        let test = if positional.repeatable { "positional_ge" } else { "positional_is" };
        entry.conditions.push(format!("{query} {test} {position}"));
        if let Some(expr) = &positional.condition {
            entry.conditions.push(condition_code(ctx, id, expr)?);
        }
        completion_flags(ctx, &mut entry, &completer);
        entries.push(entry);
    }

    // Subcommands.
    if let Some(position) = ctx.tree.subcommands_position(id) {
        let query = query(ctx);
        for &child in ctx.tree.children(id) {
            let sub = ctx.tree.command(child);
            for name in std::iter::once(&sub.prog).chain(&sub.aliases) {
                let mut entry = Entry::new();
                entry.conditions.extend(path_condition.clone());
                entry
                    .conditions
                    .push(format!("{query} positional_is {position}"));
                entry.flags.push("-f".to_string());
                entry.flag("-a", name);
                if let Some(help) = &sub.help {
                    entry.flag("-d", help);
                }
                entries.push(entry);
            }
        }
    }

    Ok(entries)
}

fn option_flags(entry: &mut Entry, option: &CliOption) {
    for string in &option.option_strings {
        match OptionShape::classify(string) {
            Some(OptionShape::Short) => entry.flag("-s", &string[1..]),
            Some(OptionShape::Long) => entry.flag("-l", &string[2..]),
            Some(OptionShape::OldStyle) => entry.flag("-o", &string[1..]),
            None => {}
        }
    }
    if let Some(help) = &option.help {
        entry.flag("-d", help);
    }
}

fn argument_flags(ctx: &mut Context<'_>, entry: &mut Entry, option: &CliOption) -> Result<()> {
    let Some(completion) = &option.complete else {
        return Ok(());
    };
    let completer = completer(ctx, completion)?;
    match (option.arg_kind(), &completer) {
        (ArgKind::Required, Some(FishCompleter::Files)) => {
            entry.flags.push("-r -F".to_string());
        }
        (ArgKind::Required, _) => entry.flags.push("-x".to_string()),
        (_, Some(FishCompleter::Files)) => entry.flags.push("-F".to_string()),
        _ => entry.flags.push("-f".to_string()),
    }
    if let Some(completer) = completer
        && let Some(arguments) = completer.arguments(ctx)
    {
        entry.flag("-a", &arguments);
    }
    Ok(())
}

fn completion_flags(ctx: &mut Context<'_>, entry: &mut Entry, completer: &FishCompleter) {
    match completer.arguments(ctx) {
        None => entry.flags.push("-F".to_string()),
        Some(arguments) => {
            entry.flags.push("-f".to_string());
            entry.flag("-a", &arguments);
        }
    }
}

fn condition_code(ctx: &mut Context<'_>, id: NodeId, expr: &WhenExpr) -> Result<String> {
    let keys = ctx.condition_keys(id, expr)?;
    let query = query(ctx);
    let syntax = FishCondition {
        query: &query,
        keys: &keys,
    };
    let rendered = expr.render(&syntax);
    Ok(match expr {
        Expr::Or(..) => syntax.group(rendered),
        _ => rendered,
    })
}

/// `__<prog>_lookup_option PATH SPELLING` prints the option key and its
/// argument kind (`n`, `r` or `o`).
fn lookup_function(ctx: &Context<'_>) -> Result<String> {
    let mut out = format!(
        "function __{}_lookup_option\n    switch $argv[1]\n",
        ctx.prefix
    );
    for id in ctx.tree.ids() {
        let spellings = ctx.option_spellings(id)?;
        if spellings.is_empty() {
            continue;
        }
        let mut groups: Vec<(String, ArgKind, Vec<String>)> = Vec::new();
        for spelling in spellings {
            match groups.iter_mut().find(|(key, _, _)| *key == spelling.key) {
                Some((_, _, list)) => list.push(spelling.spelling),
                None => groups.push((spelling.key, spelling.kind, vec![spelling.spelling])),
            }
        }
        let _ = writeln!(out, "        case {}", escape_fish(&ctx.tree.command_path(id)));
        out.push_str("            switch $argv[2]\n");
        for (key, kind, list) in groups {
            let kind = match kind {
                ArgKind::None => 'n',
                ArgKind::Required => 'r',
                ArgKind::Optional => 'o',
            };
            let _ = writeln!(
                out,
                "                case {}\n                    printf '%s\\n' {key} {kind}",
                escape_fish_words(&list)
            );
        }
        out.push_str("                case '*'\n                    return 1\n            end\n");
    }
    out.push_str("        case '*'\n            return 1\n    end\nend");
    Ok(out)
}

/// `__<prog>_resolve_subcommand PATH COUNT WORD` prints the path selected
/// by positional number `COUNT` being `WORD`.
fn resolve_function(ctx: &Context<'_>) -> String {
    let mut out = format!(
        "function __{}_resolve_subcommand\n    switch \"$argv[1]:$argv[2]\"\n",
        ctx.prefix
    );
    for id in ctx.tree.ids() {
        let Some(position) = ctx.tree.subcommands_position(id) else {
            continue;
        };
        let path = ctx.tree.command_path(id);
        let _ = writeln!(out, "        case {}", escape_fish(&format!("{path}:{position}")));
        out.push_str("            switch $argv[3]\n");
        for sub in ctx.subcommand_spellings(id) {
            let _ = writeln!(
                out,
                "                case {}\n                    printf '%s\\n' {}\n                    return 0",
                escape_fish_words(&sub.spellings),
                escape_fish(&ctx.tree.command_path(sub.node))
            );
        }
        out.push_str("            end\n");
    }
    out.push_str("    end\n    return 1\nend");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Shell;
    use completion_schema_core::{CommandLine, CommandTree, Completion, Config, Subcommands, enhance};

    fn sample() -> CommandLine {
        let mut root = CommandLine::new("example");
        root.add_option(
            CliOption::new(["-t", "--output-type"])
                .with_help("Output type")
                .with_complete(Completion::choices(["rpm", "deb"])),
        )
        .unwrap();
        root.add_option(
            CliOption::new(["--rpm-digest"])
                .with_complete(Completion::choices(["md5", "sha256"]))
                .with_when("option_is -t --output-type -- rpm"),
        )
        .unwrap();
        let subs = root.add_subcommands(Subcommands::new()).unwrap();
        subs.add_command(CommandLine::new("start").with_alias("launch").with_help("Start it"));
        root
    }

    fn with_context<T>(f: impl FnOnce(&mut Context<'_>) -> T) -> T {
        let config = Config::default();
        let root = enhance(&sample(), &config).unwrap();
        let mut ctx = Context::new(Shell::Fish, CommandTree::new(&root), &config);
        f(&mut ctx)
    }

    #[test]
    fn test_option_entry() {
        with_context(|ctx| {
            let entries = node_entries(ctx, ctx.tree.root(), true).unwrap();
            assert_eq!(
                entries[0].render("example"),
                r#"complete -c example -n "__example_query path_is ''; and not __example_query has_option output_type" -s t -l output-type -d 'Output type' -x -a 'rpm deb'"#
            );
        });
    }

    #[test]
    fn test_when_condition() {
        with_context(|ctx| {
            let entries = node_entries(ctx, ctx.tree.root(), true).unwrap();
            assert!(entries[1].render("example").contains(
                r#"__example_query option_is output_type -- rpm" -l rpm-digest -x -a 'md5 sha256'"#
            ));
        });
    }

    #[test]
    fn test_subcommand_entries() {
        with_context(|ctx| {
            let entries = node_entries(ctx, ctx.tree.root(), true).unwrap();
            let lines: Vec<String> = entries.iter().map(|e| e.render("example")).collect();
            assert!(lines.contains(
                &r#"complete -c example -n "__example_query path_is ''; and __example_query positional_is 1" -f -a launch -d 'Start it'"#
                    .to_string()
            ));
        });
    }

    #[test]
    fn test_lookup_and_resolve_functions() {
        with_context(|ctx| {
            let lookup = lookup_function(ctx).unwrap();
            assert!(lookup.contains("                case -t --output-type\n                    printf '%s\\n' output_type r\n"));
            let resolve = resolve_function(ctx);
            assert!(resolve.contains("        case :1\n            switch $argv[3]\n                case start launch\n                    printf '%s\\n' start\n"));
        });
    }

    #[test]
    fn test_grouped_or() {
        with_context(|ctx| {
            let expr = completion_schema_core::parse_when("has_option -t || ! has_option --rpm-digest").unwrap();
            let code = condition_code(ctx, ctx.tree.root(), &expr).unwrap();
            assert_eq!(
                code,
                "begin; __example_query has_option output_type; or not __example_query has_option rpm_digest; end"
            );
        });
    }
}
