//! Tokenizer for Bash glob patterns.

use super::{ExtGlobKind, GlobError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum GlobToken {
    /// A character matched literally (quoted, escaped or ordinary).
    Char(char),
    Star,
    Question,
    /// Contents of a bracket expression, without the brackets.
    Class { negated: bool, body: String },
    /// `@(`, `*(`, `+(`, `?(` or `!(`.
    ExtOpen(ExtGlobKind),
    Pipe,
    Close,
}

/// Splits `pattern` into tokens.
pub(crate) fn tokenize(pattern: &str) -> Result<Vec<GlobToken>, GlobError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            '\\' => {
                let escaped = next.ok_or(GlobError::TrailingBackslash)?;
                tokens.push(GlobToken::Char(escaped));
                i += 2;
            }
            '\'' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&ch| ch == '\'')
                    .ok_or(GlobError::UnterminatedQuote)?;
                tokens.extend(chars[i + 1..i + 1 + end].iter().map(|&ch| GlobToken::Char(ch)));
                i += end + 2;
            }
            '"' => {
                i += 1;
                loop {
                    match chars.get(i) {
                        None => return Err(GlobError::UnterminatedQuote),
                        Some('"') => break,
                        Some('\\') if matches!(chars.get(i + 1), Some('"' | '\\' | '$' | '`')) => {
                            tokens.push(GlobToken::Char(chars[i + 1]));
                            i += 2;
                        }
                        Some(&ch) => {
                            tokens.push(GlobToken::Char(ch));
                            i += 1;
                        }
                    }
                }
                i += 1;
            }
            '@' | '*' | '+' | '?' | '!' if next == Some('(') => {
                let kind = match c {
                    '@' => ExtGlobKind::One,
                    '*' => ExtGlobKind::ZeroOrMore,
                    '+' => ExtGlobKind::OneOrMore,
                    '?' => ExtGlobKind::ZeroOrOne,
                    _ => ExtGlobKind::Not,
                };
                tokens.push(GlobToken::ExtOpen(kind));
                i += 2;
            }
            '*' => {
                tokens.push(GlobToken::Star);
                i += 1;
            }
            '?' => {
                tokens.push(GlobToken::Question);
                i += 1;
            }
            '[' => {
                let (token, consumed) = bracket(&chars[i..])?;
                tokens.push(token);
                i += consumed;
            }
            '|' => {
                tokens.push(GlobToken::Pipe);
                i += 1;
            }
            ')' => {
                tokens.push(GlobToken::Close);
                i += 1;
            }
            other => {
                tokens.push(GlobToken::Char(other));
                i += 1;
            }
        }
    }
    Ok(tokens)
}

/// Reads a bracket expression starting at `chars[0] == '['`.
///
/// Returns the token and the number of characters consumed.
fn bracket(chars: &[char]) -> Result<(GlobToken, usize), GlobError> {
    let mut i = 1;
    let negated = matches!(chars.get(i), Some('!' | '^'));
    if negated {
        i += 1;
    }
    let mut body = String::new();
    // A `]` right after the opening bracket is a member, not the end.
    if chars.get(i) == Some(&']') {
        body.push(']');
        i += 1;
    }
    loop {
        match chars.get(i) {
            None => return Err(GlobError::UnterminatedClass),
            Some(']') => break,
            Some('[') if chars.get(i + 1) == Some(&':') => {
                let rest = &chars[i + 2..];
                let end = rest
                    .windows(2)
                    .position(|w| *w == [':', ']'])
                    .ok_or(GlobError::UnterminatedClass)?;
                let name: String = rest[..end].iter().collect();
                body.push_str(&format!("[:{name}:]"));
                i += end + 4;
            }
            Some('\\') => {
                let escaped = chars.get(i + 1).ok_or(GlobError::UnterminatedClass)?;
                body.push('\\');
                body.push(*escaped);
                i += 2;
            }
            Some(&ch) => {
                body.push(ch);
                i += 1;
            }
        }
    }
    if body.is_empty() {
        return Err(GlobError::EmptyClass);
    }
    Ok((GlobToken::Class { negated, body }, i + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quotes_make_literals() {
        let tokens = tokenize("'*'\"?\"").unwrap();
        assert_eq!(tokens, [GlobToken::Char('*'), GlobToken::Char('?')]);
    }

    #[test]
    fn test_extglob_openers() {
        let tokens = tokenize("+(a|b)").unwrap();
        assert_eq!(
            tokens,
            [
                GlobToken::ExtOpen(ExtGlobKind::OneOrMore),
                GlobToken::Char('a'),
                GlobToken::Pipe,
                GlobToken::Char('b'),
                GlobToken::Close,
            ]
        );
    }

    #[test]
    fn test_bracket_forms() {
        assert_eq!(
            tokenize("[!]a]").unwrap(),
            [GlobToken::Class {
                negated: true,
                body: "]a".into()
            }]
        );
        assert_eq!(
            tokenize("[[:digit:]x]").unwrap(),
            [GlobToken::Class {
                negated: false,
                body: "[:digit:]x".into()
            }]
        );
        assert_eq!(tokenize("[abc").unwrap_err(), GlobError::UnterminatedClass);
    }

    #[test]
    fn test_unterminated_quote() {
        assert_eq!(tokenize("'abc").unwrap_err(), GlobError::UnterminatedQuote);
        assert_eq!(tokenize("\"abc").unwrap_err(), GlobError::UnterminatedQuote);
        assert_eq!(tokenize("abc\\").unwrap_err(), GlobError::TrailingBackslash);
    }
}
