//! Zsh backend.
//!
//! Every command node gets a function `_<prog>[_<sub>...]` that fills an
//! `args` array with `_arguments` specs and hands it over. Subcommands are
//! reached through a `*::arg:->subcommand` state, which narrows `$words` to
//! the subcommand's own words before dispatching. When `when` conditions are
//! used, the root function first saves the unnarrowed words for the query
//! helper.

mod complete;
mod helpers;

use std::collections::HashMap;
use std::fmt::Write as _;

use completion_schema_core::expr::ConditionSyntax;
use completion_schema_core::glob::compact_alternatives;
use completion_schema_core::{ArgKind, Condition, NodeId, OptionRef, OptionShape, Positional, WhenExpr};

use self::complete::completer;
use self::helpers::QUERY;
use crate::context::Context;
use crate::document::Sections;
use crate::error::Result;
use crate::escape::{escape, escape_words};

struct ZshCondition<'m> {
    query: &'m str,
    keys: &'m HashMap<String, String>,
}

impl ZshCondition<'_> {
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

impl ConditionSyntax<Condition> for ZshCondition<'_> {
    fn atom(&self, atom: &Condition) -> String {
        match atom {
            Condition::HasOption { options } => {
                format!("{} has_option {}", self.query, self.keys(options).join(" "))
            }
            Condition::OptionIs { options, values } => format!(
                "{} option_is {} -- {}",
                self.query,
                self.keys(options).join(" "),
                escape_words(values)
            ),
        }
    }
}

pub(crate) fn generate(ctx: &mut Context<'_>) -> Result<Sections> {
    let features = ctx.features();

    let mut functions = Vec::new();
    for id in ctx.tree.ids() {
        functions.push(node_function(ctx, id, features.conditions)?);
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

    let mut names = vec![ctx.program().to_string()];
    names.extend(ctx.tree.command(ctx.tree.root()).aliases.iter().cloned());
    let entry = function_name(ctx, ctx.tree.root());
    let (header, registration) = if ctx.config.zsh_compdef {
        (
            Some(format!("#compdef {}", escape_words(&names))),
            format!("{entry} \"$@\""),
        )
    } else {
        (None, format!("compdef {entry} {}", escape_words(&names)))
    };

    Ok(Sections {
        header,
        body: functions.join("\n\n"),
        registration,
    })
}

fn function_name(ctx: &Context<'_>, id: NodeId) -> String {
    format!("_{}{}", ctx.prefix, ctx.node_suffix(id))
}

/// Specs added together, optionally under a condition.
struct SpecGroup {
    condition: Option<String>,
    specs: Vec<String>,
}

fn push_specs(groups: &mut Vec<SpecGroup>, condition: Option<String>, specs: Vec<String>) {
    match groups.iter_mut().find(|g| g.condition == condition) {
        Some(group) => group.specs.extend(specs),
        None => groups.push(SpecGroup { condition, specs }),
    }
}

fn node_function(ctx: &mut Context<'_>, id: NodeId, conditions: bool) -> Result<String> {
    let command = ctx.tree.command(id);
    let mut groups = vec![SpecGroup {
        condition: None,
        specs: Vec::new(),
    }];

    for option in ctx.tree.effective_options(id) {
        let condition = match &option.option.condition {
            Some(expr) => Some(condition_code(ctx, id, expr)?),
            None => None,
        };
        let specs = option_specs(ctx, &option)?;
        push_specs(&mut groups, condition, specs);
    }
    for positional in &command.positionals {
        let condition = match &positional.condition {
            Some(expr) => Some(condition_code(ctx, id, expr)?),
            None => None,
        };
        let spec = positional_spec(ctx, positional)?;
        push_specs(&mut groups, condition, vec![spec]);
    }
    let has_subcommands = ctx.tree.subcommands_position(id).is_some();
    if has_subcommands {
        push_specs(&mut groups, None, vec![escape("*::arg:->subcommand")]);
    }

    let mut out = format!("{}() {{\n", function_name(ctx, id));
    out.push_str("  local curcontext=\"$curcontext\" state state_descr line ret=1\n");
    out.push_str("  typeset -A opt_args\n");
    if conditions && id == ctx.tree.root() {
        let _ = writeln!(
            out,
            "  typeset -ga {words}\n  {words}=(\"${{(@)words[1,CURRENT-1]}}\")",
            words = words_array(ctx)
        );
    }
    out.push_str("  local -a args\n");
    for group in &groups {
        let specs: String = group
            .specs
            .iter()
            .map(|s| format!("\n    {s}"))
            .collect();
        match &group.condition {
            None => {
                let _ = writeln!(out, "  args=({specs}\n  )");
            }
            Some(condition) => {
                let indented = specs.replace("\n    ", "\n      ");
                let _ = writeln!(out, "  if {condition}; then\n    args+=({indented}\n    )\n  fi");
            }
        }
    }

    let mut flags = String::from("-S");
    if ctx.config.option_stacking {
        flags.push_str(" -s");
    }
    if has_subcommands {
        flags.push_str(" -C");
    }
    let _ = writeln!(out, "  _arguments {flags} : \"${{args[@]}}\" && ret=0");
    if has_subcommands {
        out.push_str(&subcommand_state(ctx, id));
    }
    out.push_str("  return ret\n}");
    Ok(out)
}

/// Global array holding the words before the cursor, saved by the root
/// function.
fn words_array(ctx: &Context<'_>) -> String {
    format!("__{}_words", ctx.prefix)
}

fn kind_code(kind: ArgKind) -> char {
    match kind {
        ArgKind::None => 'n',
        ArgKind::Required => 'r',
        ArgKind::Optional => 'o',
    }
}

/// `__<prog>_lookup_option PATH SPELLING` sets `REPLY` to `key:kind` for
/// an option usable at subcommand path `PATH`.
fn lookup_function(ctx: &Context<'_>) -> Result<String> {
    let mut out = format!("__{}_lookup_option() {{\n  case $1 in\n", ctx.prefix);
    for id in ctx.tree.ids() {
        let spellings = ctx.option_spellings(id)?;
        if spellings.is_empty() {
            continue;
        }
        let mut groups: Vec<(String, ArgKind, Vec<String>)> = Vec::new();
        for spelling in spellings {
            match groups.iter_mut().find(|(key, _, _)| *key == spelling.key) {
                Some((_, _, list)) => list.push(escape(&spelling.spelling)),
                None => groups.push((spelling.key, spelling.kind, vec![escape(&spelling.spelling)])),
            }
        }
        let _ = writeln!(
            out,
            "    ({})\n      case $2 in",
            escape(&ctx.tree.command_path(id))
        );
        for (key, kind, patterns) in groups {
            let _ = writeln!(
                out,
                "        ({}) REPLY={key}:{};;",
                patterns.join("|"),
                kind_code(kind)
            );
        }
        out.push_str("        (*) return 1;;\n      esac;;\n");
    }
    out.push_str("    (*) return 1;;\n  esac\n}");
    Ok(out)
}

/// `__<prog>_resolve_subcommand PATH COUNT WORD` sets `REPLY` to the path
/// selected when positional number `COUNT` at `PATH` is `WORD`.
fn resolve_function(ctx: &Context<'_>) -> String {
    let mut out = format!("__{}_resolve_subcommand() {{\n  case $1:$2 in\n", ctx.prefix);
    for id in ctx.tree.ids() {
        let Some(position) = ctx.tree.subcommands_position(id) else {
            continue;
        };
        let path = ctx.tree.command_path(id);
        let _ = writeln!(
            out,
            "    ({})\n      case $3 in",
            escape(&format!("{path}:{position}"))
        );
        for sub in ctx.subcommand_spellings(id) {
            let patterns: Vec<String> = sub.spellings.iter().map(|s| escape(s)).collect();
            let _ = writeln!(
                out,
                "        ({}) REPLY={};;",
                patterns.join("|"),
                escape(&ctx.tree.command_path(sub.node))
            );
        }
        out.push_str("        (*) return 1;;\n      esac;;\n");
    }
    out.push_str("    (*) return 1;;\n  esac\n}");
    out
}

fn escape_colons(s: &str) -> String {
    s.replace('\\', r"\\").replace(':', r"\:")
}

fn help_text(s: &str) -> String {
    s.replace('\\', r"\\").replace(']', r"\]").replace('\n', " ")
}

fn option_specs(ctx: &mut Context<'_>, option: &OptionRef<'_>) -> Result<Vec<String>> {
    let opt = option.option;
    let repeatable = opt.repeatable.is_true();

    let exclusion = if opt.is_final {
        "(-)".to_string()
    } else {
        let mut excluded: Vec<&str> = Vec::new();
        if !repeatable {
            excluded.extend(opt.option_strings.iter().map(String::as_str));
        }
        for other in ctx.tree.conflicting_options(*option) {
            excluded.extend(other.option.option_strings.iter().map(String::as_str));
        }
        if excluded.is_empty() {
            String::new()
        } else {
            format!("({})", excluded.join(" "))
        }
    };
    let star = if repeatable { "*" } else { "" };
    let bang = if opt.hidden { "!" } else { "" };
    let help = opt
        .help
        .as_deref()
        .map(|h| format!("[{}]", help_text(h)))
        .unwrap_or_default();

    let kind = opt.arg_kind();
    let argument = match (kind, &opt.complete) {
        (ArgKind::None, _) => String::new(),
        (_, complete) => {
            let action = match complete {
                Some(completion) => completer(ctx, completion)?.map(|a| a.spec()),
                None => None,
            }
            .unwrap_or_else(|| " ".to_string());
            let metavar = escape_colons(opt.metavar.as_deref().unwrap_or("value"));
            let colons = if kind == ArgKind::Optional { "::" } else { ":" };
            format!("{colons}{metavar}:{action}")
        }
    };

    let mut specs = Vec::new();
    for string in &opt.option_strings {
        let marker = match (OptionShape::classify(string), kind) {
            (_, ArgKind::None) | (None, _) => "",
            (Some(OptionShape::Short), ArgKind::Required) => "+",
            (Some(_), ArgKind::Required) => "=",
            (Some(OptionShape::Short), ArgKind::Optional) => "-",
            (Some(_), ArgKind::Optional) => "=-",
        };
        specs.push(escape(&format!(
            "{exclusion}{star}{bang}{string}{marker}{help}{argument}"
        )));
    }
    Ok(specs)
}

fn positional_spec(ctx: &mut Context<'_>, positional: &Positional) -> Result<String> {
    let action = completer(ctx, &positional.complete)?
        .map(|a| a.spec())
        .unwrap_or_else(|| " ".to_string());
    let message = positional
        .help
        .as_deref()
        .or(positional.metavar.as_deref())
        .unwrap_or("arg");
    let slot = if positional.repeatable {
        "*".to_string()
    } else {
        positional.number.to_string()
    };
    Ok(escape(&format!("{slot}:{}:{action}", escape_colons(message))))
}

fn subcommand_state(ctx: &Context<'_>, id: NodeId) -> String {
    let mut listing = String::new();
    for &child in ctx.tree.children(id) {
        let sub = ctx.tree.command(child);
        for name in std::iter::once(&sub.prog).chain(&sub.aliases) {
            let item = match &sub.help {
                Some(help) => format!("{}:{help}", escape_colons(name)),
                None => escape_colons(name),
            };
            let _ = write!(listing, "\n          {}", escape(&item));
        }
    }

    let mut dispatch = String::new();
    for sub in ctx.subcommand_spellings(id) {
        let _ = writeln!(
            dispatch,
            "          ({}) {} && ret=0;;",
            compact_alternatives(&sub.spellings),
            function_name(ctx, sub.node)
        );
    }

    let context = ctx.tree.program_path(id).replace(' ', "-");
    format!(
        "  case $state in
    (subcommand)
      if (( CURRENT == 1 )); then
        local -a commands
        commands=({listing}
        )
        _describe -t commands command commands && ret=0
      else
        curcontext=\"${{curcontext%:*:*}}:{context}-$words[1]:\"
        case $words[1] in
{dispatch}        esac
      fi
      ;;
  esac
"
    )
}

fn condition_code(ctx: &mut Context<'_>, id: NodeId, expr: &WhenExpr) -> Result<String> {
    let keys = ctx.condition_keys(id, expr)?;
    let query = ctx.helpers.use_helper(&QUERY);
    let syntax = ZshCondition {
        query: &query,
        keys: &keys,
    };
    Ok(expr.render(&syntax))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Shell;
    use completion_schema_core::{
        CliOption, CommandLine, CommandTree, Completion, Config, Subcommands, enhance,
    };

    fn sample() -> CommandLine {
        let mut root = CommandLine::new("example");
        root.add_option(CliOption::new(["-h", "--help"]).with_help("Show help").with_final(true))
            .unwrap();
        root.add_option(
            CliOption::new(["-t", "--output-type"])
                .with_metavar("TYPE")
                .with_help("Output type")
                .with_complete(Completion::choices(["rpm", "deb"])),
        )
        .unwrap();
        root.add_option(
            CliOption::new(["--rpm-digest"])
                .with_metavar("ALGO")
                .with_complete(Completion::choices(["md5", "sha256"]))
                .with_when("option_is -t --output-type -- rpm"),
        )
        .unwrap();
        root.add_option(CliOption::new(["-v"]).with_repeatable(true)).unwrap();
        root.add_option(CliOption::new(["--debug-level"]).with_hidden(true).with_complete(Completion::Integer))
            .unwrap();
        let subs = root.add_subcommands(Subcommands::new()).unwrap();
        subs.add_command(CommandLine::new("start").with_alias("launch").with_help("Start it"));
        root
    }

    fn with_context<T>(config: Config, f: impl FnOnce(&mut Context<'_>) -> T) -> T {
        let root = enhance(&sample(), &config).unwrap();
        let mut ctx = Context::new(Shell::Zsh, CommandTree::new(&root), &config);
        f(&mut ctx)
    }

    #[test]
    fn test_option_specs() {
        with_context(Config::default(), |ctx| {
            let options = ctx.tree.effective_options(ctx.tree.root());
            assert_eq!(
                option_specs(ctx, &options[0]).unwrap(),
                ["'(-)-h[Show help]'", "'(-)--help[Show help]'"]
            );
            assert_eq!(
                option_specs(ctx, &options[1]).unwrap(),
                [
                    "'(-t --output-type)-t+[Output type]:TYPE:(rpm deb)'",
                    "'(-t --output-type)--output-type=[Output type]:TYPE:(rpm deb)'",
                ]
            );
            assert_eq!(option_specs(ctx, &options[3]).unwrap(), ["'*-v'"]);
            assert_eq!(
                option_specs(ctx, &options[4]).unwrap(),
                ["'(--debug-level)!--debug-level=:value: '"]
            );
        });
    }

    #[test]
    fn test_hidden_options_keep_exclusions() {
        let mut root = CommandLine::new("example");
        root.add_option(CliOption::new(["--help"]).with_hidden(true).with_final(true))
            .unwrap();
        let mut mode = root.add_exclusive_group("mode");
        mode.add_option(CliOption::new(["--public"])).unwrap();
        mode.add_option(CliOption::new(["--secret"]).with_hidden(true)).unwrap();

        let config = Config::default();
        let enhanced = enhance(&root, &config).unwrap();
        let mut ctx = Context::new(Shell::Zsh, CommandTree::new(&enhanced), &config);
        let options = ctx.tree.effective_options(ctx.tree.root());
        assert_eq!(option_specs(&mut ctx, &options[0]).unwrap(), ["'(-)!--help'"]);
        assert_eq!(
            option_specs(&mut ctx, &options[1]).unwrap(),
            ["'(--public --secret)--public'"]
        );
        assert_eq!(
            option_specs(&mut ctx, &options[2]).unwrap(),
            ["'(--secret --public)!--secret'"]
        );
    }

    #[test]
    fn test_conditional_specs_use_query() {
        with_context(Config::default(), |ctx| {
            let function = node_function(ctx, ctx.tree.root(), true).unwrap();
            assert!(function.contains(
                "  typeset -ga __example_words\n  __example_words=(\"${(@)words[1,CURRENT-1]}\")\n"
            ));
            assert!(function.contains(
                "  if __example_query option_is output_type -- rpm; then\n    args+=(\n      '(--rpm-digest)--rpm-digest=:ALGO:(md5 sha256)'\n    )\n  fi\n"
            ));
            assert!(function.contains("  _arguments -S -s -C : \"${args[@]}\" && ret=0\n"));
            assert!(!function.contains("local -A opts"));
            assert!(ctx.helpers.contains("__example_query"));

            let start = ctx.tree.find_path("start").unwrap();
            let child = node_function(ctx, start, true).unwrap();
            assert!(!child.contains("__example_words"));
        });
    }

    #[test]
    fn test_lookup_and_resolve_tables() {
        with_context(Config::default(), |ctx| {
            let lookup = lookup_function(ctx).unwrap();
            assert!(lookup.contains("    ('')\n      case $2 in\n        (-h|--help) REPLY=help:n;;\n"));
            assert!(lookup.contains("        (-t|--output-type) REPLY=output_type:r;;\n"));
            let resolve = resolve_function(ctx);
            assert!(resolve.contains("    (:1)\n      case $3 in\n        (start|launch) REPLY=start;;\n"));
        });
    }

    #[test]
    fn test_condition_on_parent_option() {
        let mut root = CommandLine::new("example");
        root.add_option(CliOption::new(["--mode"]).with_complete(Completion::choices(["x", "y"])))
            .unwrap();
        let subs = root.add_subcommands(Subcommands::new()).unwrap();
        let run = subs.add_command(CommandLine::new("run"));
        run.add_option(CliOption::new(["--fast"]).with_when("option_is --mode -- x"))
            .unwrap();

        let config = Config::default();
        let enhanced = enhance(&root, &config).unwrap();
        let mut ctx = Context::new(Shell::Zsh, CommandTree::new(&enhanced), &config);
        let sections = generate(&mut ctx).unwrap();
        let helpers = ctx.helpers.render().unwrap();

        assert!(sections.body.contains("  __example_words=(\"${(@)words[1,CURRENT-1]}\")\n"));
        assert!(sections.body.contains("  if __example_query option_is mode -- x; then\n"));
        // The parent option resolves at the root path, the child's at `run`.
        assert!(helpers.contains("    ('')\n      case $2 in\n        (--mode) REPLY=mode:r;;\n"));
        assert!(helpers.contains("    (run)\n      case $2 in\n        (--fast) REPLY=run__fast:n;;\n"));
        assert!(helpers.contains("        (run) REPLY=run;;\n"));
        assert!(helpers.contains("    while (( i <= $#__example_words )); do\n"));
        assert!(helpers.contains("__example_resolve_subcommand \"$cmd_path\" $positionals \"$word\" && cmd_path=$REPLY"));
    }

    #[test]
    fn test_subcommand_dispatch() {
        with_context(Config::default(), |ctx| {
            let function = node_function(ctx, ctx.tree.root(), false).unwrap();
            assert!(function.contains("    '*::arg:->subcommand'\n"));
            assert!(function.contains("          'start:Start it'\n          'launch:Start it'\n"));
            assert!(function.contains("          (start|launch) _example_start && ret=0;;\n"));
            assert!(function.contains("curcontext=\"${curcontext%:*:*}:example-$words[1]:\""));
        });
    }

    #[test]
    fn test_registration_modes() {
        with_context(Config::default(), |ctx| {
            let sections = generate(ctx).unwrap();
            assert_eq!(sections.header.as_deref(), Some("#compdef example"));
            assert_eq!(sections.registration, "_example \"$@\"");
            assert!(sections.body.contains("\n\n_example_start() {\n"));
        });

        let config = Config {
            zsh_compdef: false,
            ..Config::default()
        };
        with_context(config, |ctx| {
            let sections = generate(ctx).unwrap();
            assert!(sections.header.is_none());
            assert_eq!(sections.registration, "compdef _example example");
        });
    }
}
