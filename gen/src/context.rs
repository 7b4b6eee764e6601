//! Per-run generation state shared by the shell backends.

use std::collections::{HashMap, HashSet};

use completion_schema_core::{
    Abbreviations, ArgKind, CommandTree, Config, MIN_COMMAND_ABBREVIATION,
    MIN_OPTION_ABBREVIATION, NodeId, OptionRef, OptionShape, WhenExpr,
};
use tracing::warn;

use crate::Shell;
use crate::error::{GenerateError, Result};
use crate::escape::sanitize_identifier;
use crate::helpers::HelperRegistry;

/// One accepted spelling of an option at a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSpelling {
    pub spelling: String,
    pub key: String,
    pub kind: ArgKind,
}

/// A subcommand together with every spelling that selects it.
#[derive(Debug, Clone)]
pub struct SubcommandSpelling {
    pub node: NodeId,
    pub spellings: Vec<String>,
}

/// Option shapes and features used anywhere in the tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct Features {
    pub short_options: bool,
    pub long_options: bool,
    pub old_options: bool,
    pub subcommands: bool,
    pub conditions: bool,
}

impl Features {
    /// Preprocessor names for the features in use.
    pub fn defines(&self, config: &Config) -> Vec<&'static str> {
        let mut defines = Vec::new();
        if self.short_options {
            defines.push("SHORT_OPTIONS");
        }
        if self.long_options {
            defines.push("LONG_OPTIONS");
        }
        if self.old_options {
            defines.push("OLD_OPTIONS");
        }
        if self.subcommands {
            defines.push("SUBCOMMANDS");
        }
        if config.option_stacking {
            defines.push("OPTION_STACKING");
        }
        if config.debug {
            defines.push("DEBUG");
        }
        defines
    }
}

/// State of one generation run.
///
/// A fresh context is built for every call, so runs never share helper
/// registries or generated names.
#[derive(Debug)]
pub struct Context<'a> {
    pub shell: Shell,
    pub config: &'a Config,
    pub tree: CommandTree<'a>,
    /// Identifier form of the program name.
    pub prefix: String,
    pub helpers: HelperRegistry,
    keys: HashMap<(NodeId, usize), String>,
    suffixes: Vec<String>,
}

impl<'a> Context<'a> {
    pub fn new(shell: Shell, tree: CommandTree<'a>, config: &'a Config) -> Self {
        let prefix = sanitize_identifier(&tree.command(tree.root()).prog);
        let keys = option_keys(&tree);
        let suffixes = node_suffixes(&tree);
        Self {
            shell,
            config,
            helpers: HelperRegistry::new(prefix.clone()),
            prefix,
            tree,
            keys,
            suffixes,
        }
    }

    pub fn program(&self) -> &'a str {
        &self.tree.command(self.tree.root()).prog
    }

    /// Unique identifier of an option, e.g. `output_type` or `start__force`.
    pub fn key(&self, option: &OptionRef<'_>) -> Result<&str> {
        self.keys
            .get(&(option.node, option.index))
            .map(String::as_str)
            .ok_or_else(|| {
                GenerateError::Internal(format!(
                    "no key for option {}",
                    option.option.display_name()
                ))
            })
    }

    /// Identifier suffix of a node: empty for the root, `_start_add` deeper.
    pub fn node_suffix(&self, id: NodeId) -> &str {
        &self.suffixes[id.index()]
    }

    /// Every spelling of every option usable at `id`, including long
    /// option abbreviations when the node enables them.
    pub fn option_spellings(&self, id: NodeId) -> Result<Vec<OptionSpelling>> {
        let options = self.tree.effective_options(id);
        let abbreviations = self.tree.command(id).abbreviate_options.is_true().then(|| {
            Abbreviations::new(
                options
                    .iter()
                    .flat_map(|o| o.option.long_strings().map(str::to_string)),
                MIN_OPTION_ABBREVIATION,
            )
        });

        let mut spellings = Vec::new();
        for option in &options {
            let key = self.key(option)?;
            let kind = option.option.arg_kind();
            for string in &option.option.option_strings {
                let expanded = match (&abbreviations, OptionShape::classify(string)) {
                    (Some(abbrevs), Some(OptionShape::Long)) => abbrevs
                        .get(string)
                        .map(<[String]>::to_vec)
                        .unwrap_or_else(|| vec![string.clone()]),
                    _ => vec![string.clone()],
                };
                for spelling in expanded {
                    spellings.push(OptionSpelling {
                        spelling,
                        key: key.to_string(),
                        kind,
                    });
                }
            }
        }
        Ok(spellings)
    }

    /// The subcommands of `id` with their names, aliases and, when the node
    /// enables them, abbreviations.
    pub fn subcommand_spellings(&self, id: NodeId) -> Vec<SubcommandSpelling> {
        let children = self.tree.children(id);
        let names = |child: NodeId| {
            let command = self.tree.command(child);
            std::iter::once(command.prog.clone()).chain(command.aliases.iter().cloned())
        };
        let abbreviations = self.tree.command(id).abbreviate_commands.is_true().then(|| {
            Abbreviations::new(
                children.iter().flat_map(|&c| names(c)),
                MIN_COMMAND_ABBREVIATION,
            )
        });

        children
            .iter()
            .map(|&child| {
                let mut spellings: Vec<String> = Vec::new();
                for name in names(child) {
                    let expanded = abbreviations
                        .as_ref()
                        .and_then(|a| a.get(&name))
                        .map(<[String]>::to_vec)
                        .unwrap_or_else(|| vec![name]);
                    for spelling in expanded {
                        if !spellings.contains(&spelling) {
                            spellings.push(spelling);
                        }
                    }
                }
                SubcommandSpelling {
                    node: child,
                    spellings,
                }
            })
            .collect()
    }

    /// Keys of options that, once present, stop `option` from being offered
    /// again: its group partners, plus itself unless it is repeatable.
    pub fn exclusion_keys(&self, option: &OptionRef<'_>) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        if !option.option.repeatable.is_true() {
            keys.push(self.key(option)?.to_string());
        }
        for other in self.tree.conflicting_options(*option) {
            keys.push(self.key(&other)?.to_string());
        }
        Ok(keys)
    }

    /// Keys of the `final` options usable at `id`.
    pub fn final_keys(&self, id: NodeId) -> Result<Vec<String>> {
        self.tree
            .effective_options(id)
            .iter()
            .filter(|o| o.option.is_final)
            .map(|o| self.key(o).map(str::to_string))
            .collect()
    }

    /// Maps every option string referenced by `expr` to its key.
    ///
    /// Strings resolve against the effective options of `id` in order, the
    /// way the command line parser resolves them at that node, then against
    /// the own options of each ancestor.
    pub fn condition_keys(&self, id: NodeId, expr: &WhenExpr) -> Result<HashMap<String, String>> {
        let effective = self.tree.effective_options(id);
        let mut map = HashMap::new();
        for condition in expr.atoms() {
            for string in condition.options() {
                if map.contains_key(string) {
                    continue;
                }
                let found = effective
                    .iter()
                    .find(|o| o.option.matches(string))
                    .map(|o| (o.node, o.index))
                    .or_else(|| {
                        self.tree.ancestors(id).find_map(|node| {
                            self.tree
                                .command(node)
                                .options
                                .iter()
                                .position(|o| o.matches(string))
                                .map(|index| (node, index))
                        })
                    });
                let key = found.and_then(|k| self.keys.get(&k)).ok_or_else(|| {
                    GenerateError::Internal(format!(
                        "condition refers to unknown option {string} in {}",
                        self.tree.program_path(id)
                    ))
                })?;
                map.insert(string.clone(), key.clone());
            }
        }
        Ok(map)
    }

    pub fn features(&self) -> Features {
        let mut features = Features::default();
        for id in self.tree.ids() {
            let command = self.tree.command(id);
            features.subcommands |= command.subcommands.is_some();
            for option in &command.options {
                features.short_options |= option.short_strings().next().is_some();
                features.long_options |= option.long_strings().next().is_some();
                features.old_options |= option.old_strings().next().is_some();
                features.conditions |= option.condition.is_some();
            }
            features.conditions |= command.positionals.iter().any(|p| p.condition.is_some());
        }
        features
    }

    /// Logs that completion `kind` cannot be expressed in this shell. The
    /// argument is left without candidates.
    pub fn unsupported(&self, kind: &str) {
        warn!(
            shell = %self.shell,
            program = %self.program(),
            kind = %kind,
            "completion kind not supported by this shell, offering no candidates"
        );
    }

    /// Logs that `pattern` uses a glob construct this shell cannot express.
    /// The pattern is dropped from the `kind` filter.
    pub fn unsupported_glob(&self, kind: &str, pattern: &str) {
        warn!(
            shell = %self.shell,
            program = %self.program(),
            kind = %kind,
            pattern = %pattern,
            "glob construct not supported by this shell, pattern dropped"
        );
    }
}

/// Keys from the option's display name, prefixed with the node path.
fn option_keys(tree: &CommandTree<'_>) -> HashMap<(NodeId, usize), String> {
    let mut keys = HashMap::new();
    let mut used = HashSet::new();
    for id in tree.ids() {
        let path: Vec<String> = tree
            .node(id)
            .names
            .iter()
            .map(|n| sanitize_identifier(n))
            .collect();
        for (index, option) in tree.command(id).options.iter().enumerate() {
            let name = option.display_name().trim_start_matches('-');
            let mut base = sanitize_identifier(name);
            if !path.is_empty() {
                base = format!("{}__{}", path.join("__"), base);
            }
            let key = unique(base, &mut used);
            keys.insert((id, index), key);
        }
    }
    keys
}

fn node_suffixes(tree: &CommandTree<'_>) -> Vec<String> {
    let mut used = HashSet::new();
    tree.ids()
        .map(|id| {
            let names = &tree.node(id).names;
            if names.is_empty() {
                used.insert(String::new());
                return String::new();
            }
            let base: String = names
                .iter()
                .map(|n| format!("_{}", sanitize_identifier(n)))
                .collect();
            unique(base, &mut used)
        })
        .collect()
}

fn unique(base: String, used: &mut HashSet<String>) -> String {
    let mut candidate = base.clone();
    let mut n = 2;
    while used.contains(&candidate) {
        candidate = format!("{base}_{n}");
        n += 1;
    }
    used.insert(candidate.clone());
    candidate
}
