//! Generic boolean expressions.
//!
//! [`Expr`] is a tree of `&&`, `||` and `!` over arbitrary atoms. The parser
//! works on an already tokenized stream, so the same precedence rules serve
//! every atom language; the renderer is parameterized by a
//! [`ConditionSyntax`] so each shell only supplies its leaf syntax and
//! grouping tokens.

use thiserror::Error;

/// A boolean expression over atoms of type `T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr<T> {
    Atom(T),
    Not(Box<Expr<T>>),
    And(Box<Expr<T>>, Box<Expr<T>>),
    Or(Box<Expr<T>>, Box<Expr<T>>),
}

/// Tokens consumed by [`parse_expr`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<T> {
    Atom(T),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

/// Errors produced by [`parse_expr`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unexpected {0}")]
    Unexpected(&'static str),
    #[error("missing closing parenthesis")]
    UnclosedParen,
}

fn describe<T>(token: &Token<T>) -> &'static str {
    match token {
        Token::Atom(_) => "condition",
        Token::And => "`&&`",
        Token::Or => "`||`",
        Token::Not => "`!`",
        Token::LParen => "`(`",
        Token::RParen => "`)`",
    }
}

/// Parses a token stream into an expression.
///
/// `!` binds tighter than `&&`, which binds tighter than `||`; both binary
/// operators are left-associative.
///
/// # Examples
///
/// ```
/// use completion_schema_core::expr::{Expr, Token, parse_expr};
///
/// // a || b && !c
/// let tokens = vec![
///     Token::Atom("a"),
///     Token::Or,
///     Token::Atom("b"),
///     Token::And,
///     Token::Not,
///     Token::Atom("c"),
/// ];
/// let expr = parse_expr(tokens).unwrap();
/// assert_eq!(
///     expr,
///     Expr::Or(
///         Box::new(Expr::Atom("a")),
///         Box::new(Expr::And(
///             Box::new(Expr::Atom("b")),
///             Box::new(Expr::Not(Box::new(Expr::Atom("c")))),
///         )),
///     )
/// );
/// ```
pub fn parse_expr<T>(tokens: Vec<Token<T>>) -> Result<Expr<T>, ExprError> {
    if tokens.is_empty() {
        return Err(ExprError::Empty);
    }
    let mut parser = Parser {
        tokens: tokens.into_iter().peekable(),
    };
    let expr = parser.parse_binary(0)?;
    match parser.tokens.next() {
        None => Ok(expr),
        Some(token) => Err(ExprError::Unexpected(describe(&token))),
    }
}

struct Parser<T> {
    tokens: std::iter::Peekable<std::vec::IntoIter<Token<T>>>,
}

impl<T> Parser<T> {
    fn precedence(token: &Token<T>) -> Option<u8> {
        match token {
            Token::Or => Some(1),
            Token::And => Some(2),
            _ => None,
        }
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr<T>, ExprError> {
        let mut lhs = self.parse_unary()?;
        while let Some(precedence) = self
            .tokens
            .peek()
            .and_then(Self::precedence)
            .filter(|p| *p > min_precedence)
        {
            let op = self.tokens.next().ok_or(ExprError::UnexpectedEnd)?;
            let rhs = self.parse_binary(precedence)?;
            lhs = match op {
                Token::And => Expr::And(Box::new(lhs), Box::new(rhs)),
                _ => Expr::Or(Box::new(lhs), Box::new(rhs)),
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr<T>, ExprError> {
        match self.tokens.next() {
            None => Err(ExprError::UnexpectedEnd),
            Some(Token::Atom(atom)) => Ok(Expr::Atom(atom)),
            Some(Token::Not) => Ok(Expr::Not(Box::new(self.parse_unary()?))),
            Some(Token::LParen) => {
                let inner = self.parse_binary(0)?;
                match self.tokens.next() {
                    Some(Token::RParen) => Ok(inner),
                    Some(token) => Err(ExprError::Unexpected(describe(&token))),
                    None => Err(ExprError::UnclosedParen),
                }
            }
            Some(token) => Err(ExprError::Unexpected(describe(&token))),
        }
    }
}

/// Shell syntax used by [`Expr::render`].
///
/// Only [`atom`](ConditionSyntax::atom) is required; the defaults produce
/// POSIX shell syntax.
pub trait ConditionSyntax<T> {
    /// Renders one leaf as a shell command.
    fn atom(&self, atom: &T) -> String;

    fn and(&self, lhs: String, rhs: String) -> String {
        format!("{lhs} && {rhs}")
    }

    fn or(&self, lhs: String, rhs: String) -> String {
        format!("{lhs} || {rhs}")
    }

    fn not(&self, inner: String) -> String {
        format!("! {inner}")
    }

    fn group(&self, inner: String) -> String {
        format!("{{ {inner}; }}")
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Op {
    And,
    Or,
}

impl<T> Expr<T> {
    /// Renders the expression with `syntax`.
    ///
    /// Shells evaluate `&&` and `||` with equal precedence from left to
    /// right, so a binary operator nested under a different operator (or
    /// under `!`) is always grouped.
    pub fn render(&self, syntax: &impl ConditionSyntax<T>) -> String {
        match self {
            Expr::Atom(atom) => syntax.atom(atom),
            Expr::Not(inner) => {
                let rendered = inner.render(syntax);
                match **inner {
                    Expr::Atom(_) | Expr::Not(_) => syntax.not(rendered),
                    _ => syntax.not(syntax.group(rendered)),
                }
            }
            Expr::And(lhs, rhs) => {
                syntax.and(lhs.render_under(Op::And, syntax), rhs.render_under(Op::And, syntax))
            }
            Expr::Or(lhs, rhs) => {
                syntax.or(lhs.render_under(Op::Or, syntax), rhs.render_under(Op::Or, syntax))
            }
        }
    }

    fn render_under(&self, parent: Op, syntax: &impl ConditionSyntax<T>) -> String {
        let rendered = self.render(syntax);
        match (self, parent) {
            (Expr::And(..), Op::Or) | (Expr::Or(..), Op::And) => syntax.group(rendered),
            _ => rendered,
        }
    }

    /// Visits every atom, left to right.
    pub fn atoms(&self) -> Vec<&T> {
        let mut out = Vec::new();
        self.collect_atoms(&mut out);
        out
    }

    fn collect_atoms<'a>(&'a self, out: &mut Vec<&'a T>) {
        match self {
            Expr::Atom(atom) => out.push(atom),
            Expr::Not(inner) => inner.collect_atoms(out),
            Expr::And(lhs, rhs) | Expr::Or(lhs, rhs) => {
                lhs.collect_atoms(out);
                rhs.collect_atoms(out);
            }
        }
    }

    /// Evaluates the expression with `eval` deciding each atom.
    pub fn evaluate(&self, eval: &mut impl FnMut(&T) -> bool) -> bool {
        match self {
            Expr::Atom(atom) => eval(atom),
            Expr::Not(inner) => !inner.evaluate(eval),
            Expr::And(lhs, rhs) => lhs.evaluate(eval) && rhs.evaluate(eval),
            Expr::Or(lhs, rhs) => lhs.evaluate(eval) || rhs.evaluate(eval),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl ConditionSyntax<&'static str> for Plain {
        fn atom(&self, atom: &&'static str) -> String {
            atom.to_string()
        }
    }

    fn atoms(src: &'static str) -> Vec<Token<&'static str>> {
        src.split_whitespace()
            .map(|t| match t {
                "&&" => Token::And,
                "||" => Token::Or,
                "!" => Token::Not,
                "(" => Token::LParen,
                ")" => Token::RParen,
                other => Token::Atom(other),
            })
            .collect()
    }

    #[test]
    fn test_left_associative() {
        let expr = parse_expr(atoms("a && b && c")).unwrap();
        assert!(matches!(expr, Expr::And(ref lhs, _) if matches!(**lhs, Expr::And(..))));
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let expr = parse_expr(atoms("( a || b ) && c")).unwrap();
        assert_eq!(expr.render(&Plain), "{ a || b; } && c");
    }

    #[test]
    fn test_render_groups_mixed_operators() {
        let expr = parse_expr(atoms("a || b && c")).unwrap();
        assert_eq!(expr.render(&Plain), "a || { b && c; }");
        let expr = parse_expr(atoms("a && b && c")).unwrap();
        assert_eq!(expr.render(&Plain), "a && b && c");
    }

    #[test]
    fn test_not_binds_tightest() {
        let expr = parse_expr(atoms("! a && b")).unwrap();
        assert_eq!(expr.render(&Plain), "! a && b");
        let expr = parse_expr(atoms("! ( a && b )")).unwrap();
        assert_eq!(expr.render(&Plain), "! { a && b; }");
    }

    #[test]
    fn test_evaluate_matches_precedence() {
        let expr = parse_expr(atoms("a || b && c")).unwrap();
        // a=true, b=false, c=false: a || (b && c) == true
        let value = expr.evaluate(&mut |atom| *atom == "a");
        assert!(value);
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse_expr::<&str>(vec![]).unwrap_err(), ExprError::Empty);
        assert_eq!(
            parse_expr(atoms("a &&")).unwrap_err(),
            ExprError::UnexpectedEnd
        );
        assert_eq!(
            parse_expr(atoms("( a")).unwrap_err(),
            ExprError::UnclosedParen
        );
        assert_eq!(
            parse_expr(atoms("a b")).unwrap_err(),
            ExprError::Unexpected("condition")
        );
        assert_eq!(
            parse_expr(atoms("a )")).unwrap_err(),
            ExprError::Unexpected("`)`")
        );
    }
}
