//! The `when` condition language.
//!
//! A condition is made of commands over the options typed so far:
//!
//! - `has_option OPTION...` is true if any of the options was given.
//! - `option_is OPTION... -- VALUE...` is true if any of the options was
//!   given with one of the values (the last occurrence wins).
//!
//! Commands combine with `&&`, `||`, `!` and parentheses. Words follow shell
//! quoting rules.
//!
//! ```
//! use completion_schema_core::{Condition, parse_when};
//! use completion_schema_core::expr::Expr;
//!
//! let expr = parse_when("option_is -t --output-type -- rpm").unwrap();
//! assert_eq!(
//!     expr,
//!     Expr::Atom(Condition::OptionIs {
//!         options: vec!["-t".into(), "--output-type".into()],
//!         values: vec!["rpm".into()],
//!     })
//! );
//! ```

use thiserror::Error;

use crate::expr::{Expr, ExprError, Token, parse_expr};
use crate::types::is_valid_option_string;

/// A parsed `when` condition.
pub type WhenExpr = Expr<Condition>;

/// Leaf of a `when` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    OptionIs {
        options: Vec<String>,
        values: Vec<String>,
    },
    HasOption {
        options: Vec<String>,
    },
}

impl Condition {
    /// The option strings the condition refers to.
    pub fn options(&self) -> &[String] {
        match self {
            Condition::OptionIs { options, .. } | Condition::HasOption { options } => options,
        }
    }
}

/// Errors produced while parsing a `when` condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WhenError {
    #[error("unterminated quote")]
    UnterminatedQuote,
    #[error("trailing backslash")]
    TrailingBackslash,
    #[error("unknown condition command `{0}`")]
    UnknownCommand(String),
    #[error("{0}: no options given")]
    MissingOptions(&'static str),
    #[error("option_is: missing `--` before the values")]
    MissingSeparator,
    #[error("option_is: no values given")]
    MissingValues,
    #[error("{command}: invalid option string `{option}`")]
    InvalidOption {
        command: &'static str,
        option: String,
    },
    #[error(transparent)]
    Expr(#[from] ExprError),
}

#[derive(Debug, PartialEq, Eq)]
enum Lexeme {
    Word(String),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

/// Splits `input` into words and operators.
///
/// Raw word text (quotes included) is unquoted with `shlex`.
fn lex(input: &str) -> Result<Vec<Lexeme>, WhenError> {
    let mut lexemes = Vec::new();
    let mut raw = String::new();
    let mut chars = input.chars().peekable();

    fn flush(raw: &mut String, lexemes: &mut Vec<Lexeme>) -> Result<(), WhenError> {
        if raw.is_empty() {
            return Ok(());
        }
        let words = shlex::split(raw).ok_or(WhenError::UnterminatedQuote)?;
        raw.clear();
        lexemes.extend(words.into_iter().map(Lexeme::Word));
        Ok(())
    }

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                raw.push(c);
                loop {
                    match chars.next() {
                        Some('\'') => break raw.push('\''),
                        Some(ch) => raw.push(ch),
                        None => return Err(WhenError::UnterminatedQuote),
                    }
                }
            }
            '"' => {
                raw.push(c);
                loop {
                    match chars.next() {
                        Some('"') => break raw.push('"'),
                        Some('\\') => {
                            raw.push('\\');
                            match chars.next() {
                                Some(ch) => raw.push(ch),
                                None => return Err(WhenError::UnterminatedQuote),
                            }
                        }
                        Some(ch) => raw.push(ch),
                        None => return Err(WhenError::UnterminatedQuote),
                    }
                }
            }
            '\\' => match chars.next() {
                Some(ch) => {
                    raw.push('\\');
                    raw.push(ch);
                }
                None => return Err(WhenError::TrailingBackslash),
            },
            '&' if chars.peek() == Some(&'&') => {
                chars.next();
                flush(&mut raw, &mut lexemes)?;
                lexemes.push(Lexeme::And);
            }
            '|' if chars.peek() == Some(&'|') => {
                chars.next();
                flush(&mut raw, &mut lexemes)?;
                lexemes.push(Lexeme::Or);
            }
            '(' => {
                flush(&mut raw, &mut lexemes)?;
                lexemes.push(Lexeme::LParen);
            }
            ')' => {
                flush(&mut raw, &mut lexemes)?;
                lexemes.push(Lexeme::RParen);
            }
            '!' if raw.is_empty() => lexemes.push(Lexeme::Not),
            c if c.is_whitespace() => flush(&mut raw, &mut lexemes)?,
            c => raw.push(c),
        }
    }
    flush(&mut raw, &mut lexemes)?;
    Ok(lexemes)
}

fn check_options(command: &'static str, options: &[String]) -> Result<(), WhenError> {
    if options.is_empty() {
        return Err(WhenError::MissingOptions(command));
    }
    match options.iter().find(|o| !is_valid_option_string(o)) {
        Some(bad) => Err(WhenError::InvalidOption {
            command,
            option: bad.clone(),
        }),
        None => Ok(()),
    }
}

/// Turns the words of one command into a [`Condition`].
fn command(words: Vec<String>) -> Result<Condition, WhenError> {
    let mut words = words.into_iter();
    let name = words.next().unwrap_or_default();
    let args: Vec<String> = words.collect();
    match name.as_str() {
        "has_option" => {
            check_options("has_option", &args)?;
            Ok(Condition::HasOption { options: args })
        }
        "option_is" => {
            let split = args
                .iter()
                .position(|w| w == "--")
                .ok_or(WhenError::MissingSeparator)?;
            let mut options = args;
            let values = options.split_off(split + 1);
            options.truncate(split);
            check_options("option_is", &options)?;
            if values.is_empty() {
                return Err(WhenError::MissingValues);
            }
            Ok(Condition::OptionIs { options, values })
        }
        other => Err(WhenError::UnknownCommand(other.to_string())),
    }
}

/// Parses a `when` condition.
///
/// # Errors
///
/// Returns a [`WhenError`] describing the first problem found.
///
/// # Examples
///
/// ```
/// use completion_schema_core::parse_when;
///
/// assert!(parse_when("has_option --a && ! (option_is -b -- x || has_option -c)").is_ok());
/// assert!(parse_when("option_is -b x").is_err());
/// assert!(parse_when("is_root").is_err());
/// ```
pub fn parse_when(input: &str) -> Result<WhenExpr, WhenError> {
    let mut tokens = Vec::new();
    let mut words = Vec::new();
    for lexeme in lex(input)? {
        let token = match lexeme {
            Lexeme::Word(word) => {
                words.push(word);
                continue;
            }
            Lexeme::And => Token::And,
            Lexeme::Or => Token::Or,
            Lexeme::Not => Token::Not,
            Lexeme::LParen => Token::LParen,
            Lexeme::RParen => Token::RParen,
        };
        if !words.is_empty() {
            tokens.push(Token::Atom(command(std::mem::take(&mut words))?));
        }
        tokens.push(token);
    }
    if !words.is_empty() {
        tokens.push(Token::Atom(command(words)?));
    }
    Ok(parse_expr(tokens)?)
}
