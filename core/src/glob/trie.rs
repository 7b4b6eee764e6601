//! Compaction of literal alternatives into a single pattern.

use std::collections::BTreeMap;

use super::zsh_escape_literal;

#[derive(Debug, Default)]
struct TrieNode {
    terminal: bool,
    children: BTreeMap<char, TrieNode>,
}

impl TrieNode {
    fn insert(&mut self, word: &str) {
        let mut node = self;
        for c in word.chars() {
            node = node.children.entry(c).or_default();
        }
        node.terminal = true;
    }

    fn branches(&self) -> Vec<String> {
        let mut branches = Vec::new();
        if self.terminal {
            branches.push(String::new());
        }
        for (c, child) in &self.children {
            branches.push(format!("{}{}", zsh_escape_literal(&c.to_string()), child.render()));
        }
        branches
    }

    fn render(&self) -> String {
        match self.branches().as_slice() {
            [] => String::new(),
            [only] => only.clone(),
            many => format!("({})", many.join("|")),
        }
    }
}

/// Compacts literal `words` into the shortest Zsh pattern matching exactly
/// those words.
///
/// Common prefixes are factored out through a trie; when that does not make
/// the pattern shorter, the plain `a|b|c` alternation is returned. Empty
/// words are ignored.
///
/// # Examples
///
/// ```
/// use completion_schema_core::glob::compact_alternatives;
///
/// assert_eq!(compact_alternatives(&["start", "stop"]), "start|stop");
/// assert_eq!(compact_alternatives(&["sta", "star", "start"]), "sta(|r(|t))");
/// ```
pub fn compact_alternatives<S: AsRef<str>>(words: &[S]) -> String {
    let mut unique: Vec<&str> = Vec::new();
    for word in words.iter().map(AsRef::as_ref) {
        if !word.is_empty() && !unique.contains(&word) {
            unique.push(word);
        }
    }

    let plain = unique
        .iter()
        .map(|w| zsh_escape_literal(w))
        .collect::<Vec<_>>()
        .join("|");

    let mut root = TrieNode::default();
    for word in &unique {
        root.insert(word);
    }
    let compact = root.branches().join("|");

    if compact.len() < plain.len() {
        compact
    } else {
        plain
    }
}
