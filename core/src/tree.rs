//! Ancestry queries over a [`CommandLine`] tree.
//!
//! [`CommandTree`] flattens the tree in pre-order and keeps a parent index
//! per node, so generators can ask for paths, inherited options, exclusion
//! partners and global positional numbers without parent pointers in the
//! model itself.

use crate::types::{CliOption, CommandLine, Positional};

/// Index of a node in a [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A node of a [`CommandTree`].
#[derive(Debug, Clone)]
pub struct TreeNode<'a> {
    pub command: &'a CommandLine,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Canonical names from the root (exclusive) to this node.
    pub names: Vec<&'a str>,
}

/// An option together with the node that owns it.
#[derive(Debug, Clone, Copy)]
pub struct OptionRef<'a> {
    pub node: NodeId,
    pub index: usize,
    pub option: &'a CliOption,
}

impl PartialEq for OptionRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && self.index == other.index
    }
}

impl Eq for OptionRef<'_> {}

/// Borrowed pre-order view of a command tree.
///
/// # Examples
///
/// ```
/// use completion_schema_core::*;
///
/// let mut root = CommandLine::new("example");
/// root.add_positional(Positional::new(1)).unwrap();
/// root.add_option(CliOption::new(["--verbose"])).unwrap();
/// let subs = root.add_subcommands(Subcommands::new()).unwrap();
/// let start = subs.add_command(
///     CommandLine::new("start").with_inherit_options(true),
/// );
/// start.add_positional(Positional::new(1)).unwrap();
///
/// let tree = CommandTree::new(&root);
/// let start = tree.find_path("start").unwrap();
/// assert_eq!(tree.program_path(start), "example start");
/// assert_eq!(tree.subcommands_position(tree.root()), Some(2));
/// assert_eq!(tree.global_position(start, 1), 3);
/// assert_eq!(tree.effective_options(start).len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct CommandTree<'a> {
    nodes: Vec<TreeNode<'a>>,
}

impl<'a> CommandTree<'a> {
    pub fn new(root: &'a CommandLine) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.add(root, None, Vec::new());
        tree
    }

    fn add(&mut self, command: &'a CommandLine, parent: Option<NodeId>, names: Vec<&'a str>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(TreeNode {
            command,
            parent,
            children: Vec::new(),
            names: names.clone(),
        });
        for child in command.commands() {
            let mut child_names = names.clone();
            child_names.push(child.prog.as_str());
            let child_id = self.add(child, Some(id), child_names);
            self.nodes[id.0].children.push(child_id);
        }
        id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &TreeNode<'a> {
        &self.nodes[id.0]
    }

    pub fn command(&self, id: NodeId) -> &'a CommandLine {
        self.nodes[id.0].command
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// All node ids in pre-order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + use<> {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Parent, grandparent, ... up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// Program name followed by the subcommand names, e.g. `git remote add`.
    pub fn program_path(&self, id: NodeId) -> String {
        let root = self.command(self.root()).prog.as_str();
        std::iter::once(root)
            .chain(self.nodes[id.0].names.iter().copied())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Dotted subcommand path: `""` for the root, `start.add` deeper down.
    pub fn command_path(&self, id: NodeId) -> String {
        self.nodes[id.0].names.join(".")
    }

    /// Finds a node by its dotted [`command_path`](CommandTree::command_path).
    pub fn find_path(&self, path: &str) -> Option<NodeId> {
        self.ids().find(|&id| self.command_path(id) == path)
    }

    /// Options usable at `id`: its own, then the parent's effective options
    /// if the node inherits options.
    pub fn effective_options(&self, id: NodeId) -> Vec<OptionRef<'a>> {
        let mut options: Vec<OptionRef<'a>> = self
            .command(id)
            .options
            .iter()
            .enumerate()
            .map(|(index, option)| OptionRef {
                node: id,
                index,
                option,
            })
            .collect();
        if self.command(id).inherit_options.is_true()
            && let Some(parent) = self.parent(id)
        {
            options.extend(self.effective_options(parent));
        }
        options
    }

    /// Options of the owning node reachable from `option` through shared
    /// groups: partners of its groups, their partners, and so on.
    pub fn conflicting_options(&self, option: OptionRef<'a>) -> Vec<OptionRef<'a>> {
        let siblings = &self.command(option.node).options;
        let mut reached = vec![false; siblings.len()];
        reached[option.index] = true;
        let mut frontier = vec![option.option];
        while let Some(current) = frontier.pop() {
            for (index, other) in siblings.iter().enumerate() {
                if !reached[index] && current.conflicts_with(other) {
                    reached[index] = true;
                    frontier.push(other);
                }
            }
        }
        siblings
            .iter()
            .enumerate()
            .filter(|&(index, _)| index != option.index && reached[index])
            .map(|(index, other)| OptionRef {
                node: option.node,
                index,
                option: other,
            })
            .collect()
    }

    /// Positional slots consumed by the ancestors of `id`.
    ///
    /// Each ancestor contributes its own positionals plus the slot of its
    /// subcommands node.
    pub fn positional_offset(&self, id: NodeId) -> usize {
        self.ancestors(id)
            .map(|a| self.command(a).positionals.len() + 1)
            .sum()
    }

    /// 1-based position of positional `number` of `id` on the whole command line.
    pub fn global_position(&self, id: NodeId, number: usize) -> usize {
        self.positional_offset(id) + number
    }

    /// Global position of a positional.
    pub fn positional_position(&self, id: NodeId, positional: &Positional) -> usize {
        self.global_position(id, positional.number)
    }

    /// Global position of the subcommand slot of `id`, if it has subcommands.
    pub fn subcommands_position(&self, id: NodeId) -> Option<usize> {
        let command = self.command(id);
        command
            .subcommands
            .as_ref()
            .map(|_| self.positional_offset(id) + command.positionals.len() + 1)
    }
}
