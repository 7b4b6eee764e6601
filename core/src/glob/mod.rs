//! Bash glob compiler.
//!
//! Patterns are tokenized (honoring quotes, bracket expressions and the
//! extglob openers `@( *( +( ?( !(`), parsed into a [`Glob`] tree and
//! rendered as a regular expression or as a Zsh glob. Constructs without an
//! equivalent in the target dialect are reported as
//! [`GlobError::Unsupported`].
//!
//! # Examples
//!
//! ```
//! use completion_schema_core::glob::{bash_glob_to_regex, bash_glob_to_zsh_glob};
//!
//! assert_eq!(bash_glob_to_regex("*abc*").unwrap(), ".*abc.*");
//! assert_eq!(bash_glob_to_regex("[abc]").unwrap(), "[abc]");
//! assert_eq!(bash_glob_to_zsh_glob("@(foo|bar)").unwrap(), "(foo|bar)");
//! assert!(bash_glob_to_regex("!(foo)").is_err());
//! ```

mod lexer;
mod parser;
mod trie;

use thiserror::Error;

pub use trie::compact_alternatives;

/// Errors raised while compiling a glob.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GlobError {
    #[error("trailing backslash")]
    TrailingBackslash,
    #[error("unterminated quote")]
    UnterminatedQuote,
    #[error("unterminated bracket expression")]
    UnterminatedClass,
    #[error("empty bracket expression")]
    EmptyClass,
    #[error("unterminated extended glob group")]
    UnterminatedGroup,
    #[error("`{construct}` cannot be expressed as {target}")]
    Unsupported {
        construct: &'static str,
        target: &'static str,
    },
}

/// Operator of an extended glob group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtGlobKind {
    /// `@(...)`: exactly one of the alternatives.
    One,
    /// `*(...)`
    ZeroOrMore,
    /// `+(...)`
    OneOrMore,
    /// `?(...)`
    ZeroOrOne,
    /// `!(...)`: anything except the alternatives.
    Not,
}

impl ExtGlobKind {
    /// The opening token of the group.
    pub fn opener(self) -> &'static str {
        match self {
            ExtGlobKind::One => "@(",
            ExtGlobKind::ZeroOrMore => "*(",
            ExtGlobKind::OneOrMore => "+(",
            ExtGlobKind::ZeroOrOne => "?(",
            ExtGlobKind::Not => "!(",
        }
    }
}

/// One element of a parsed glob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobNode {
    Literal(String),
    /// `*`
    Star,
    /// `?`
    Question,
    /// `[...]`; `body` keeps POSIX classes like `[:alpha:]` verbatim.
    CharClass { negated: bool, body: String },
    ExtGlob {
        kind: ExtGlobKind,
        alternatives: Vec<Vec<GlobNode>>,
    },
}

/// A parsed Bash glob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Glob {
    nodes: Vec<GlobNode>,
}

/// Parses a Bash glob pattern.
///
/// # Errors
///
/// Returns a [`GlobError`] for unterminated quotes, classes and groups.
pub fn parse_glob(pattern: &str) -> Result<Glob, GlobError> {
    let tokens = lexer::tokenize(pattern)?;
    Ok(Glob {
        nodes: parser::parse(tokens)?,
    })
}

/// Translates a Bash glob into an (unanchored) regular expression.
pub fn bash_glob_to_regex(pattern: &str) -> Result<String, GlobError> {
    parse_glob(pattern)?.to_regex()
}

/// Translates a Bash glob into a Zsh glob.
pub fn bash_glob_to_zsh_glob(pattern: &str) -> Result<String, GlobError> {
    parse_glob(pattern)?.to_zsh_glob()
}

impl Glob {
    pub fn nodes(&self) -> &[GlobNode] {
        &self.nodes
    }

    /// Renders a regular expression matching the same strings.
    pub fn to_regex(&self) -> Result<String, GlobError> {
        let mut out = String::new();
        render_regex(&self.nodes, &mut out)?;
        Ok(out)
    }

    /// Renders a Zsh glob matching the same strings.
    pub fn to_zsh_glob(&self) -> Result<String, GlobError> {
        let mut out = String::new();
        render_zsh(&self.nodes, &mut out)?;
        Ok(out)
    }

    /// Renders the pattern back as a normalized Bash extglob.
    pub fn to_bash_glob(&self) -> String {
        let mut out = String::new();
        render_bash(&self.nodes, &mut out);
        out
    }
}

fn render_regex(nodes: &[GlobNode], out: &mut String) -> Result<(), GlobError> {
    for node in nodes {
        match node {
            GlobNode::Literal(text) => out.push_str(&regex::escape(text)),
            GlobNode::Star => out.push_str(".*"),
            GlobNode::Question => out.push('.'),
            GlobNode::CharClass { negated, body } => {
                out.push('[');
                if *negated {
                    out.push('^');
                }
                out.push_str(&regex_class_body(body));
                out.push(']');
            }
            GlobNode::ExtGlob { kind, alternatives } => {
                let suffix = match kind {
                    ExtGlobKind::One => "",
                    ExtGlobKind::ZeroOrMore => "*",
                    ExtGlobKind::OneOrMore => "+",
                    ExtGlobKind::ZeroOrOne => "?",
                    ExtGlobKind::Not => {
                        return Err(GlobError::Unsupported {
                            construct: kind.opener(),
                            target: "a regular expression",
                        });
                    }
                };
                out.push_str("(?:");
                for (i, alternative) in alternatives.iter().enumerate() {
                    if i > 0 {
                        out.push('|');
                    }
                    render_regex(alternative, out)?;
                }
                out.push(')');
                out.push_str(suffix);
            }
        }
    }
    Ok(())
}

/// Escapes characters that are special inside a regex class but not inside
/// a glob bracket expression.
fn regex_class_body(body: &str) -> String {
    let mut out = String::new();
    let mut rest = body;
    while let Some(c) = rest.chars().next() {
        if rest.starts_with("[:")
            && let Some(end) = rest.find(":]")
        {
            out.push_str(&rest[..end + 2]);
            rest = &rest[end + 2..];
            continue;
        }
        if c == '\\' {
            let mut chars = rest.chars();
            chars.next();
            if let Some(escaped) = chars.next() {
                if !escaped.is_alphanumeric() {
                    out.push('\\');
                }
                out.push(escaped);
                rest = &rest[1 + escaped.len_utf8()..];
                continue;
            }
        }
        match c {
            '[' | ']' | '&' | '~' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '^' if out.is_empty() => out.push_str("\\^"),
            _ => out.push(c),
        }
        rest = &rest[c.len_utf8()..];
    }
    out
}

const ZSH_SPECIAL: &[char] = &[
    '*', '?', '[', ']', '(', ')', '|', '<', '>', '^', '#', '~', '\\', '\'', '"', '$', '`', '&',
    ';', '{', '}', ' ', '\t',
];

/// Escapes `text` so Zsh pattern matching treats it literally.
pub fn zsh_escape_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if ZSH_SPECIAL.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn render_zsh(nodes: &[GlobNode], out: &mut String) -> Result<(), GlobError> {
    for node in nodes {
        match node {
            GlobNode::Literal(text) => out.push_str(&zsh_escape_literal(text)),
            GlobNode::Star => out.push('*'),
            GlobNode::Question => out.push('?'),
            GlobNode::CharClass { negated, body } => {
                out.push('[');
                if *negated {
                    out.push('^');
                }
                out.push_str(body);
                out.push(']');
            }
            GlobNode::ExtGlob {
                kind: ExtGlobKind::One,
                alternatives,
            } => {
                out.push('(');
                for (i, alternative) in alternatives.iter().enumerate() {
                    if i > 0 {
                        out.push('|');
                    }
                    render_zsh(alternative, out)?;
                }
                out.push(')');
            }
            GlobNode::ExtGlob { kind, .. } => {
                return Err(GlobError::Unsupported {
                    construct: kind.opener(),
                    target: "a zsh glob",
                });
            }
        }
    }
    Ok(())
}

const BASH_SPECIAL: &[char] = &[
    '*', '?', '[', ']', '(', ')', '|', '@', '!', '+', '\\', '\'', '"', '$', '`', '&', ';', '<',
    '>', '{', '}', ' ', '\t',
];

fn render_bash(nodes: &[GlobNode], out: &mut String) {
    for node in nodes {
        match node {
            GlobNode::Literal(text) => {
                for c in text.chars() {
                    if BASH_SPECIAL.contains(&c) {
                        out.push('\\');
                    }
                    out.push(c);
                }
            }
            GlobNode::Star => out.push('*'),
            GlobNode::Question => out.push('?'),
            GlobNode::CharClass { negated, body } => {
                out.push('[');
                if *negated {
                    out.push('!');
                }
                out.push_str(body);
                out.push(']');
            }
            GlobNode::ExtGlob { kind, alternatives } => {
                out.push_str(kind.opener());
                for (i, alternative) in alternatives.iter().enumerate() {
                    if i > 0 {
                        out.push('|');
                    }
                    render_bash(alternative, out);
                }
                out.push(')');
            }
        }
    }
}
