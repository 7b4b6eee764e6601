//! Conditional compilation for helper templates.
//!
//! Helper templates contain `#ifdef NAME`, `#ifndef NAME`, `#else` and
//! `#endif` lines (leading whitespace allowed). Blocks nest. Directive lines
//! never reach the output.

use std::collections::BTreeSet;

use thiserror::Error;

/// Malformed directive structure in a template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreprocessError {
    #[error("line {line}: #else without #ifdef")]
    UnexpectedElse { line: usize },

    #[error("line {line}: #endif without #ifdef")]
    UnexpectedEndif { line: usize },

    #[error("line {line}: duplicate #else")]
    DuplicateElse { line: usize },

    #[error("line {line}: missing name after directive")]
    MissingName { line: usize },

    #[error("{0} unterminated #ifdef block(s)")]
    Unterminated(usize),
}

struct Frame {
    parent_active: bool,
    condition: bool,
    seen_else: bool,
}

impl Frame {
    fn active(&self) -> bool {
        self.parent_active && (self.condition != self.seen_else)
    }
}

/// Keeps the lines whose enclosing conditions hold for `defines`.
///
/// # Errors
///
/// Returns an error for an unbalanced `#else`/`#endif`, a directive
/// without a name, or blocks left open at the end of the input.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeSet;
/// use completion_schema_gen::preprocessor::preprocess;
///
/// let code = "a\n#ifdef X\nb\n#else\nc\n#endif\nd\n";
/// let defines = BTreeSet::from(["X".to_string()]);
/// assert_eq!(preprocess(code, &defines).unwrap(), "a\nb\nd\n");
/// assert_eq!(preprocess(code, &BTreeSet::new()).unwrap(), "a\nc\nd\n");
/// ```
pub fn preprocess(code: &str, defines: &BTreeSet<String>) -> Result<String, PreprocessError> {
    let mut stack: Vec<Frame> = Vec::new();
    let mut out = String::with_capacity(code.len());

    for (index, line) in code.lines().enumerate() {
        let number = index + 1;
        let trimmed = line.trim_start();
        let active = stack.last().is_none_or(Frame::active);

        if let Some(rest) = directive(trimmed, "#ifdef") {
            let name = name(rest, number)?;
            stack.push(Frame {
                parent_active: active,
                condition: defines.contains(name),
                seen_else: false,
            });
        } else if let Some(rest) = directive(trimmed, "#ifndef") {
            let name = name(rest, number)?;
            stack.push(Frame {
                parent_active: active,
                condition: !defines.contains(name),
                seen_else: false,
            });
        } else if directive(trimmed, "#else").is_some() {
            let frame = stack
                .last_mut()
                .ok_or(PreprocessError::UnexpectedElse { line: number })?;
            if frame.seen_else {
                return Err(PreprocessError::DuplicateElse { line: number });
            }
            frame.seen_else = true;
        } else if directive(trimmed, "#endif").is_some() {
            stack
                .pop()
                .ok_or(PreprocessError::UnexpectedEndif { line: number })?;
        } else if active {
            out.push_str(line);
            out.push('\n');
        }
    }

    if !stack.is_empty() {
        return Err(PreprocessError::Unterminated(stack.len()));
    }
    Ok(out)
}

fn directive<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    (rest.is_empty() || rest.starts_with(char::is_whitespace)).then_some(rest)
}

fn name(rest: &str, line: usize) -> Result<&str, PreprocessError> {
    rest.split_whitespace()
        .next()
        .ok_or(PreprocessError::MissingName { line })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defines(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_nested_blocks() {
        let code = "\
#ifdef A
a
  #ifndef B
  not b
  #else
  b
  #endif
#endif
end";
        assert_eq!(preprocess(code, &defines(&["A"])).unwrap(), "a\n  not b\nend\n");
        assert_eq!(preprocess(code, &defines(&["A", "B"])).unwrap(), "a\n  b\nend\n");
        assert_eq!(preprocess(code, &defines(&["B"])).unwrap(), "end\n");
    }

    #[test]
    fn test_inactive_parent_hides_else_branch() {
        let code = "#ifdef A\n#ifdef B\nx\n#else\ny\n#endif\n#endif\n";
        assert_eq!(preprocess(code, &defines(&[])).unwrap(), "");
    }

    #[test]
    fn test_similar_words_are_not_directives() {
        let code = "#ifdefined\n#endifx\n";
        assert_eq!(preprocess(code, &defines(&[])).unwrap(), code);
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            preprocess("#endif", &defines(&[])),
            Err(PreprocessError::UnexpectedEndif { line: 1 })
        );
        assert_eq!(
            preprocess("x\n#else", &defines(&[])),
            Err(PreprocessError::UnexpectedElse { line: 2 })
        );
        assert_eq!(
            preprocess("#ifdef A\n#else\n#else\n#endif", &defines(&[])),
            Err(PreprocessError::DuplicateElse { line: 3 })
        );
        assert_eq!(
            preprocess("#ifdef", &defines(&[])),
            Err(PreprocessError::MissingName { line: 1 })
        );
        assert_eq!(
            preprocess("#ifdef A\n#ifdef B\n", &defines(&[])),
            Err(PreprocessError::Unterminated(2))
        );
    }
}
