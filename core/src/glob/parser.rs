//! Recursive-descent parser turning glob tokens into a [`GlobNode`] tree.

use std::iter::Peekable;
use std::vec::IntoIter;

use super::lexer::GlobToken;
use super::{GlobError, GlobNode};

type Tokens = Peekable<IntoIter<GlobToken>>;

/// Parses a whole pattern.
pub(crate) fn parse(tokens: Vec<GlobToken>) -> Result<Vec<GlobNode>, GlobError> {
    let mut tokens = tokens.into_iter().peekable();
    sequence(&mut tokens, false)
}

/// Parses nodes until the end of input, or until `|`/`)` inside a group.
fn sequence(tokens: &mut Tokens, in_group: bool) -> Result<Vec<GlobNode>, GlobError> {
    let mut nodes = Vec::new();
    while let Some(token) = tokens.peek() {
        if in_group && matches!(token, GlobToken::Pipe | GlobToken::Close) {
            break;
        }
        let Some(token) = tokens.next() else {
            break;
        };
        match token {
            GlobToken::Char(c) => push_char(&mut nodes, c),
            // Outside of a group these have no special meaning.
            GlobToken::Pipe => push_char(&mut nodes, '|'),
            GlobToken::Close => push_char(&mut nodes, ')'),
            GlobToken::Star => nodes.push(GlobNode::Star),
            GlobToken::Question => nodes.push(GlobNode::Question),
            GlobToken::Class { negated, body } => nodes.push(GlobNode::CharClass { negated, body }),
            GlobToken::ExtOpen(kind) => {
                let alternatives = group(tokens)?;
                nodes.push(GlobNode::ExtGlob { kind, alternatives });
            }
        }
    }
    Ok(nodes)
}

/// Parses the alternatives of an extglob group after its opener.
fn group(tokens: &mut Tokens) -> Result<Vec<Vec<GlobNode>>, GlobError> {
    let mut alternatives = Vec::new();
    loop {
        alternatives.push(sequence(tokens, true)?);
        match tokens.next() {
            Some(GlobToken::Pipe) => continue,
            Some(GlobToken::Close) => return Ok(alternatives),
            _ => return Err(GlobError::UnterminatedGroup),
        }
    }
}

fn push_char(nodes: &mut Vec<GlobNode>, c: char) {
    if let Some(GlobNode::Literal(text)) = nodes.last_mut() {
        text.push(c);
    } else {
        nodes.push(GlobNode::Literal(c.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::super::ExtGlobKind;
    use super::super::lexer::tokenize;
    use super::*;

    fn parse_str(pattern: &str) -> Result<Vec<GlobNode>, GlobError> {
        parse(tokenize(pattern)?)
    }

    #[test]
    fn test_literals_merge() {
        assert_eq!(
            parse_str("ab*c").unwrap(),
            [
                GlobNode::Literal("ab".into()),
                GlobNode::Star,
                GlobNode::Literal("c".into()),
            ]
        );
    }

    #[test]
    fn test_nested_groups() {
        let nodes = parse_str("@(a|+(b|c))").unwrap();
        assert_eq!(
            nodes,
            [GlobNode::ExtGlob {
                kind: ExtGlobKind::One,
                alternatives: vec![
                    vec![GlobNode::Literal("a".into())],
                    vec![GlobNode::ExtGlob {
                        kind: ExtGlobKind::OneOrMore,
                        alternatives: vec![
                            vec![GlobNode::Literal("b".into())],
                            vec![GlobNode::Literal("c".into())],
                        ],
                    }],
                ],
            }]
        );
    }

    #[test]
    fn test_top_level_pipe_is_literal() {
        assert_eq!(parse_str("a|b)").unwrap(), [GlobNode::Literal("a|b)".into())]);
    }

    #[test]
    fn test_unterminated_group() {
        assert_eq!(parse_str("@(a|b").unwrap_err(), GlobError::UnterminatedGroup);
    }

    #[test]
    fn test_empty_alternative() {
        let nodes = parse_str("x@(|y)").unwrap();
        let GlobNode::ExtGlob { alternatives, .. } = &nodes[1] else {
            panic!("expected extglob");
        };
        assert!(alternatives[0].is_empty());
    }
}
