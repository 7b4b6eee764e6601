//! Bash backend.
//!
//! The script defines one entry function, `_<prog>`, which parses the words
//! before the cursor with `__<prog>_parse_commandline`, dispatches on the
//! resulting `COMMAND_PATH` to a per-node function and lets that function
//! complete an option argument, an option string or a positional.

mod complete;
mod helpers;

use completion_schema_core::expr::{ConditionSyntax, Expr};
use completion_schema_core::{ArgKind, Condition, NodeId, OptionShape, WhenExpr};
use std::collections::HashMap;
use std::fmt::Write as _;

use self::complete::completer;
use self::helpers::*;
use crate::context::Context;
use crate::document::Sections;
use crate::error::Result;
use crate::escape::{escape, escape_words};

/// Condition syntax calling the `has_option`/`option_is` helpers.
struct BashCondition<'m> {
    has_option: String,
    option_is: String,
    keys: &'m HashMap<String, String>,
}

impl BashCondition<'_> {
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

impl ConditionSyntax<Condition> for BashCondition<'_> {
    fn atom(&self, atom: &Condition) -> String {
        match atom {
            Condition::HasOption { options } => {
                format!("{} {}", self.has_option, self.keys(options).join(" "))
            }
            Condition::OptionIs { options, values } => format!(
                "{} {} -- {}",
                self.option_is,
                self.keys(options).join(" "),
                escape_words(values)
            ),
        }
    }
}

pub(crate) fn generate(ctx: &mut Context<'_>) -> Result<Sections> {
    let features = ctx.features();
    let defines = features.defines(ctx.config);

    let parse = ctx.helpers.use_helper(&PARSE_COMMANDLINE);
    let split = ctx.helpers.use_helper(&SPLIT_INLINE_VALUE);
    for define in &defines {
        ctx.helpers.define(&parse, define);
        ctx.helpers.define(&split, define);
    }
    if features.subcommands {
        let add = ctx.helpers.name_of(&ADD_POSITIONAL);
        ctx.helpers.define(&add, "SUBCOMMANDS");
    }

    let lookup = lookup_function(ctx)?;
    ctx.helpers
        .add_function(&format!("__{}_lookup_option", ctx.prefix), lookup);
    if features.subcommands {
        let resolve = resolve_function(ctx);
        ctx.helpers
            .add_function(&format!("__{}_resolve_subcommand", ctx.prefix), resolve);
    }

    let mut body = String::new();
    for id in ctx.tree.ids() {
        body.push_str(&node_function(ctx, id)?);
        body.push_str("\n\n");
    }
    body.push_str(&entry_function(ctx, &parse, &split));

    let mut names = vec![ctx.program().to_string()];
    names.extend(ctx.tree.command(ctx.tree.root()).aliases.iter().cloned());
    let registration = format!("complete -F _{} {}", ctx.prefix, escape_words(&names));

    Ok(Sections {
        header: None,
        body,
        registration,
    })
}

fn node_name(ctx: &Context<'_>, id: NodeId) -> String {
    format!("__{}_node{}", ctx.prefix, ctx.node_suffix(id))
}

fn kind_code(kind: ArgKind) -> char {
    match kind {
        ArgKind::None => 'n',
        ArgKind::Required => 'r',
        ArgKind::Optional => 'o',
    }
}

/// `__<prog>_lookup_option SPELLING` sets `REPLY` to the option key and
/// `REPLY_KIND` to `n`, `r` or `o` for the current `COMMAND_PATH`.
fn lookup_function(ctx: &Context<'_>) -> Result<String> {
    let mut out = format!("__{}_lookup_option() {{\n  case \"$COMMAND_PATH\" in\n", ctx.prefix);
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
        let _ = writeln!(out, "    {})", escape(&ctx.tree.command_path(id)));
        out.push_str("      case \"$1\" in\n");
        for (key, kind, patterns) in groups {
            let _ = writeln!(
                out,
                "        {}) REPLY={key} REPLY_KIND={};;",
                patterns.join("|"),
                kind_code(kind)
            );
        }
        out.push_str("        *) return 1;;\n      esac;;\n");
    }
    out.push_str("    *) return 1;;\n  esac\n}");
    Ok(out)
}

/// `__<prog>_resolve_subcommand WORD` descends into the subcommand selected
/// by the positional just added.
fn resolve_function(ctx: &Context<'_>) -> String {
    let mut out = format!(
        "__{}_resolve_subcommand() {{\n  case \"$COMMAND_PATH:${{#POSITIONALS[@]}}\" in\n",
        ctx.prefix
    );
    for id in ctx.tree.ids() {
        let Some(position) = ctx.tree.subcommands_position(id) else {
            continue;
        };
        let path = ctx.tree.command_path(id);
        let _ = writeln!(out, "    {})", escape(&format!("{path}:{position}")));
        out.push_str("      case \"$1\" in\n");
        for sub in ctx.subcommand_spellings(id) {
            let _ = writeln!(
                out,
                "        {}) COMMAND_PATH={};;",
                sub.spellings.iter().map(|s| escape(s)).collect::<Vec<_>>().join("|"),
                escape(&ctx.tree.command_path(sub.node))
            );
        }
        out.push_str("      esac;;\n");
    }
    out.push_str("  esac\n}");
    out
}

/// Strings offered when completing options: long options taking a required
/// argument get a trailing `=`.
fn offered_strings(option: &completion_schema_core::CliOption) -> Vec<String> {
    option
        .option_strings
        .iter()
        .map(|s| match (OptionShape::classify(s), option.arg_kind()) {
            (Some(OptionShape::Long), ArgKind::Required) => format!("{s}="),
            _ => s.clone(),
        })
        .collect()
}

fn render_condition(syntax: &BashCondition<'_>, expr: &WhenExpr) -> String {
    let rendered = expr.render(syntax);
    match expr {
        Expr::Or(..) => syntax.group(rendered),
        _ => rendered,
    }
}

/// Runs `action` unless `present` succeeds and only if `when` holds.
fn guarded(present: Option<String>, when: Option<String>, action: &str, indent: &str) -> String {
    match (present, when) {
        (None, None) => format!("{indent}{action}\n"),
        (Some(present), None) => format!("{indent}{present} || {action}\n"),
        (present, when) => {
            let conditions: Vec<String> = present
                .map(|p| format!("! {p}"))
                .into_iter()
                .chain(when)
                .collect();
            format!(
                "{indent}if {}; then\n{indent}  {action}\n{indent}fi\n",
                conditions.join(" && ")
            )
        }
    }
}

fn node_function(ctx: &mut Context<'_>, id: NodeId) -> Result<String> {
    let tree = &ctx.tree;
    let command = tree.command(id);
    let options = tree.effective_options(id);
    let has_option = ctx.helpers.use_helper(&HAS_OPTION);

    let mut out = format!("{}() {{\n", node_name(ctx, id));

    // Option arguments.
    let mut arms = Vec::new();
    for option in &options {
        if let Some(completion) = &option.option.complete
            && let Some(command) = completer(ctx, completion)?
        {
            arms.push(format!("      {}) {command};;", ctx.key(option)?));
        }
    }
    if arms.is_empty() {
        out.push_str("  [[ -n \"$COMPLETING_OPTION\" ]] && return 0\n");
    } else {
        let _ = write!(
            out,
            "  if [[ -n \"$COMPLETING_OPTION\" ]]; then\n    case \"$COMPLETING_OPTION\" in\n{}\n    esac\n    return 0\n  fi\n",
            arms.join("\n")
        );
    }

    // Option strings.
    let visible: Vec<_> = options.iter().filter(|o| !o.option.hidden).collect();
    if !visible.is_empty() {
        let options_helper = ctx.helpers.use_helper(&COMPLETE_OPTIONS);
        out.push_str("\n  if (( ! END_OF_OPTIONS )) && [[ \"$cur\" == -* ]]; then\n    local -a opts=()\n");

        let finals = ctx.final_keys(id)?;
        let indent = if finals.is_empty() { "    " } else { "      " };
        if !finals.is_empty() {
            let _ = writeln!(out, "    if ! {has_option} {}; then", finals.join(" "));
        }
        for option in visible {
            let excluded = ctx.exclusion_keys(option)?;
            let present = (!excluded.is_empty())
                .then(|| format!("{has_option} {}", excluded.join(" ")));
            let when = match &option.option.condition {
                Some(expr) => Some(condition_code(ctx, id, expr)?),
                None => None,
            };
            let action = format!("opts+=({})", escape_words(offered_strings(option.option)));
            out.push_str(&guarded(present, when, &action, indent));
        }
        if !finals.is_empty() {
            out.push_str("    fi\n");
        }
        let _ = write!(
            out,
            "    {options_helper} \"${{opts[@]}}\"\n    return 0\n  fi\n"
        );
    }

    // Positionals and subcommands.
    let subcommands = ctx.tree.subcommands_position(id);
    if !command.positionals.is_empty() || subcommands.is_some() {
        out.push_str("\n  local N=$(( ${#POSITIONALS[@]} + 1 ))\n");
    }
    for positional in &command.positionals {
        let position = ctx.tree.positional_position(id, positional);
        let comparison = if positional.repeatable { ">=" } else { "==" };
        let mut test = format!("(( N {comparison} {position} ))");
        if let Some(expr) = &positional.condition {
            test = format!("{test} && {}", condition_code(ctx, id, expr)?);
        }
        let action = completer(ctx, &positional.complete)?;
        let _ = writeln!(out, "  if {test}; then");
        if let Some(action) = action {
            let _ = writeln!(out, "    {action}");
        }
        out.push_str("    return 0\n  fi\n");
    }
    if let Some(position) = subcommands {
        let mut names = Vec::new();
        for &child in ctx.tree.children(id) {
            let sub = ctx.tree.command(child);
            names.push(sub.prog.clone());
            names.extend(sub.aliases.iter().cloned());
        }
        let list = ctx.helpers.use_helper(&COMPLETE_LIST);
        let _ = write!(
            out,
            "  if (( N == {position} )); then\n    {list} {}\n    return 0\n  fi\n",
            escape_words(&names)
        );
    }

    out.push('}');
    Ok(out)
}

fn condition_code(ctx: &mut Context<'_>, id: NodeId, expr: &WhenExpr) -> Result<String> {
    let keys = ctx.condition_keys(id, expr)?;
    let syntax = BashCondition {
        has_option: ctx.helpers.use_helper(&HAS_OPTION),
        option_is: ctx.helpers.use_helper(&OPTION_IS),
        keys: &keys,
    };
    Ok(render_condition(&syntax, expr))
}

fn entry_function(ctx: &Context<'_>, parse: &str, split: &str) -> String {
    let comp_api = ctx.config.bash_completions_version.has_comp_api();
    let mut out = format!("_{}() {{\n", ctx.prefix);
    if comp_api {
        out.push_str("  local cur prev words cword comp_args\n  _comp_initialize -n =: -- \"$@\" || return\n");
    } else {
        out.push_str("  local cur prev words cword\n  _init_completion -n =: || return\n");
    }
    out.push_str(
        "
  local -a POSITIONALS=()
  local -A OPTION_VALUES=()
  local HAVING_OPTIONS=' ' END_OF_OPTIONS=0 COMMAND_PATH='' COMPLETING_OPTION='' VALUE_PREFIX=''
  local REPLY REPLY_KIND

",
    );
    let _ = writeln!(out, "  {parse}");
    let _ = writeln!(out, "  {split}\n");

    out.push_str("  case \"$COMMAND_PATH\" in\n");
    for id in ctx.tree.ids() {
        let _ = writeln!(
            out,
            "    {}) {};;",
            escape(&ctx.tree.command_path(id)),
            node_name(ctx, id)
        );
    }
    out.push_str("  esac\n");

    out.push_str(
        r#"
  if [[ -n "$VALUE_PREFIX" ]]; then
    local i
    for i in "${!COMPREPLY[@]}"; do
      COMPREPLY[i]="$VALUE_PREFIX${COMPREPLY[i]}"
    done
  fi
"#,
    );
    if comp_api {
        out.push_str("  _comp_ltrim_colon_completions \"$cur\"\n}");
    } else {
        out.push_str("  __ltrim_colon_completions \"$cur\"\n}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Shell;
    use completion_schema_core::{
        CliOption, CommandLine, CommandTree, Completion, Config, Positional, Subcommands, enhance,
    };

    fn sample() -> CommandLine {
        let mut root = CommandLine::new("example");
        root.add_option(
            CliOption::new(["-t", "--output-type"])
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
        let start = subs.add_command(CommandLine::new("start").with_alias("launch"));
        start
            .add_positional(Positional::new(1).with_complete(Completion::file()).with_repeatable(true))
            .unwrap();
        root
    }

    fn with_context<T>(f: impl FnOnce(&mut Context<'_>) -> T) -> T {
        let config = Config::default();
        let root = enhance(&sample(), &config).unwrap();
        let mut ctx = Context::new(Shell::Bash, CommandTree::new(&root), &config);
        f(&mut ctx)
    }

    #[test]
    fn test_lookup_function() {
        with_context(|ctx| {
            let code = lookup_function(ctx).unwrap();
            assert!(code.contains("        -t|--output-type) REPLY=output_type REPLY_KIND=r;;"));
            assert!(code.contains("        --rpm-digest) REPLY=rpm_digest REPLY_KIND=r;;"));
            assert!(!code.contains("    start)"));
        });
    }

    #[test]
    fn test_resolve_function() {
        with_context(|ctx| {
            let code = resolve_function(ctx);
            assert!(code.contains("    :1)\n      case \"$1\" in\n        start|launch) COMMAND_PATH=start;;"));
        });
    }

    #[test]
    fn test_node_function_guards_options() {
        with_context(|ctx| {
            let code = node_function(ctx, ctx.tree.root()).unwrap();
            assert!(code.contains("      output_type) __example_complete_list rpm deb;;"));
            assert!(code.contains("    __example_has_option output_type || opts+=(-t --output-type=)"));
            assert!(code.contains(
                "    if ! __example_has_option rpm_digest && __example_option_is output_type -- rpm; then\n      opts+=(--rpm-digest=)\n    fi"
            ));
            assert!(code.contains("  if (( N == 1 )); then\n    __example_complete_list start launch\n"));
        });
    }

    #[test]
    fn test_repeatable_positional_uses_global_position() {
        with_context(|ctx| {
            let start = ctx.tree.find_path("start").unwrap();
            let code = node_function(ctx, start).unwrap();
            assert!(code.contains("  if (( N >= 2 )); then\n    __example_append _filedir\n    return 0\n  fi"));
            assert!(!code.contains("opts+="));
        });
    }

    #[test]
    fn test_or_condition_is_grouped() {
        with_context(|ctx| {
            let expr = completion_schema_core::parse_when("has_option -t || has_option --rpm-digest").unwrap();
            let code = condition_code(ctx, ctx.tree.root(), &expr).unwrap();
            assert_eq!(
                code,
                "{ __example_has_option output_type || __example_has_option rpm_digest; }"
            );
        });
    }
}
