//! Pratt parser over whitelisted names and a declared symbol set.
//!
//! Pipeline: lex -> resolve names -> insert implicit multiplication -> parse.

use super::lexer::{self, Token};
use super::Expr;
use crate::whitelist::{self, Builtin, Constant, Function};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyntaxError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("invalid number '{0}'")]
    BadNumber(String),

    #[error("name '{0}' is not defined")]
    UnknownName(String),

    #[error("unexpected {0}")]
    UnexpectedToken(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("missing closing parenthesis")]
    Unclosed,

    #[error("expected {expected} comma-separated components, found {found}")]
    ComponentCount { expected: usize, found: usize },

    #[error("expression is nested more than {0} levels deep")]
    TooDeep(usize),
}

const ADD_PREC: u8 = 10;
const MUL_PREC: u8 = 20;
const UNARY_PREC: u8 = 25;
const POW_PREC: u8 = 30;

// bounds parser recursion and the height of every tree it builds, so later
// tree walks cannot exhaust the stack
const MAX_NESTING: usize = 256;
const MAX_HEIGHT: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Num(f64),
    Var(String),
    Const(Constant),
    Func(Function),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

impl fmt::Display for Tok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tok::Num(v) => write!(f, "number {v}"),
            Tok::Var(v) => write!(f, "symbol '{v}'"),
            Tok::Const(c) => write!(f, "constant '{}'", c.name()),
            Tok::Func(func) => write!(f, "function '{}'", func.name()),
            Tok::Plus => f.write_str("'+'"),
            Tok::Minus => f.write_str("'-'"),
            Tok::Star => f.write_str("'*'"),
            Tok::Slash => f.write_str("'/'"),
            Tok::Caret => f.write_str("'**'"),
            Tok::LParen => f.write_str("'('"),
            Tok::RParen => f.write_str("')'"),
        }
    }
}

/// Parse `text` allowing only whitelisted names plus `symbols`.
///
/// Implicit multiplication (`2x`, `2(x+1)`, `x sin(x)`, `(x)(y)`) and
/// implicit application (`sin x`) are accepted. A name that is not defined
/// but consists only of declared one-letter symbols is read as their product,
/// so `xy` means `x*y`.
pub fn parse(text: &str, symbols: &[&str]) -> Result<Expr, SyntaxError> {
    if text.trim().is_empty() {
        return Err(SyntaxError::Empty);
    }
    let tokens = resolve(lexer::lex(text)?, symbols)?;
    let tokens = insert_implicit_multiplication(tokens);

    let mut parser = Parser { tokens: &tokens, pos: 0, nesting: 0 };
    let (expr, _) = parser.parse_expr(0)?;
    match parser.current() {
        None => Ok(expr),
        Some(tok) => Err(SyntaxError::UnexpectedToken(tok.to_string())),
    }
}

fn resolve(tokens: Vec<Token>, symbols: &[&str]) -> Result<Vec<Tok>, SyntaxError> {
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        match token {
            Token::Number(v) => out.push(Tok::Num(v)),
            Token::Plus => out.push(Tok::Plus),
            Token::Minus => out.push(Tok::Minus),
            Token::Star => out.push(Tok::Star),
            Token::Slash => out.push(Tok::Slash),
            Token::Caret => out.push(Tok::Caret),
            Token::LParen => out.push(Tok::LParen),
            Token::RParen => out.push(Tok::RParen),
            Token::Ident(name) => resolve_name(&name, symbols, &mut out)?,
        }
    }
    Ok(out)
}

fn resolve_name(name: &str, symbols: &[&str], out: &mut Vec<Tok>) -> Result<(), SyntaxError> {
    if symbols.contains(&name) {
        out.push(Tok::Var(name.to_string()));
        return Ok(());
    }
    match whitelist::lookup(name) {
        Some(Builtin::Function(func)) => out.push(Tok::Func(func)),
        Some(Builtin::Constant(c)) => out.push(Tok::Const(c)),
        None => {
            let splittable = name.chars().all(|c| {
                let mut buf = [0u8; 4];
                symbols.contains(&&*c.encode_utf8(&mut buf))
            });
            if !splittable {
                return Err(SyntaxError::UnknownName(name.to_string()));
            }
            out.extend(name.chars().map(|c| Tok::Var(c.to_string())));
        }
    }
    Ok(())
}

fn should_insert_mul(current: &Tok, next: &Tok) -> bool {
    matches!(
        (current, next),
        (
            Tok::Num(_) | Tok::Var(_) | Tok::Const(_) | Tok::RParen,
            Tok::Var(_) | Tok::Const(_) | Tok::Func(_) | Tok::LParen
        ) | (Tok::Var(_) | Tok::Const(_) | Tok::RParen, Tok::Num(_))
    )
}

fn insert_implicit_multiplication(tokens: Vec<Tok>) -> Vec<Tok> {
    let mut result = Vec::with_capacity(tokens.len() * 3 / 2);
    let mut it = tokens.into_iter().peekable();

    while let Some(current) = it.next() {
        let needs_mul = it.peek().is_some_and(|next| should_insert_mul(&current, next));
        result.push(current);
        if needs_mul {
            result.push(Tok::Star);
        }
    }
    result
}

struct Parser<'a> {
    tokens: &'a [Tok],
    pos: usize,
    nesting: usize,
}

fn taller(height: usize) -> Result<usize, SyntaxError> {
    if height >= MAX_HEIGHT {
        return Err(SyntaxError::TooDeep(MAX_HEIGHT));
    }
    Ok(height + 1)
}

// Each parse returns the expression with the height of its tree.
impl<'a> Parser<'a> {
    fn current(&self) -> Option<&'a Tok> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn parse_expr(&mut self, min_precedence: u8) -> Result<(Expr, usize), SyntaxError> {
        let (mut left, mut height) = self.parse_prefix()?;

        while let Some(token) = self.current() {
            let precedence = match token {
                Tok::Plus | Tok::Minus => ADD_PREC,
                Tok::Star | Tok::Slash => MUL_PREC,
                Tok::Caret => POW_PREC,
                _ => break,
            };
            if precedence < min_precedence {
                break;
            }
            self.advance();

            // `**` is right associative, everything else left associative
            let rhs_min = if *token == Tok::Caret { precedence } else { precedence + 1 };
            let (right, right_height) = self.parse_expr(rhs_min)?;
            height = taller(height.max(right_height))?;
            let (lhs, right) = (Box::new(left), Box::new(right));
            left = match token {
                Tok::Plus => Expr::Add(lhs, right),
                Tok::Minus => Expr::Sub(lhs, right),
                Tok::Star => Expr::Mul(lhs, right),
                Tok::Slash => Expr::Div(lhs, right),
                _ => Expr::Pow(lhs, right),
            };
        }

        Ok((left, height))
    }

    fn parse_prefix(&mut self) -> Result<(Expr, usize), SyntaxError> {
        if self.nesting >= MAX_NESTING {
            return Err(SyntaxError::TooDeep(MAX_NESTING));
        }
        self.nesting += 1;
        let parsed = self.parse_operand();
        self.nesting -= 1;
        parsed
    }

    fn parse_operand(&mut self) -> Result<(Expr, usize), SyntaxError> {
        let token = self.current().ok_or(SyntaxError::UnexpectedEnd)?;
        self.advance();

        match token {
            Tok::Num(v) => Ok((Expr::Num(*v), 1)),
            Tok::Var(name) => Ok((Expr::Var(name.clone()), 1)),
            Tok::Const(c) => Ok((Expr::Const(*c), 1)),
            // -x**2 is -(x**2)
            Tok::Minus => {
                let (operand, height) = self.parse_expr(UNARY_PREC)?;
                Ok((Expr::Neg(Box::new(operand)), taller(height)?))
            }
            Tok::Plus => self.parse_expr(UNARY_PREC),
            Tok::LParen => self.parse_group(),
            Tok::Func(func) => {
                let (arg, height) = if self.current() == Some(&Tok::LParen) {
                    self.advance();
                    self.parse_group()?
                } else {
                    // sin x**2 is sin(x**2)
                    self.parse_expr(POW_PREC)?
                };
                Ok((Expr::Call(*func, Box::new(arg)), taller(height)?))
            }
            other => Err(SyntaxError::UnexpectedToken(other.to_string())),
        }
    }

    fn parse_group(&mut self) -> Result<(Expr, usize), SyntaxError> {
        let parsed = self.parse_expr(0)?;
        match self.current() {
            Some(Tok::RParen) => {
                self.advance();
                Ok(parsed)
            }
            Some(other) => Err(SyntaxError::UnexpectedToken(other.to_string())),
            None => Err(SyntaxError::Unclosed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> Box<Expr> {
        Box::new(Expr::var("x"))
    }

    fn num(v: f64) -> Box<Expr> {
        Box::new(Expr::Num(v))
    }

    #[test]
    fn implicit_multiplication() {
        assert_eq!(parse("2x", &["x"]).unwrap(), Expr::Mul(num(2.0), x()));
        assert_eq!(parse("2x", &["x"]), parse("2*x", &["x"]));
        assert_eq!(parse("2(x+1)", &["x"]), parse("2*(x+1)", &["x"]));
        assert_eq!(parse("(x)(x)", &["x"]), parse("(x)*(x)", &["x"]));
        assert_eq!(parse("x sin(x)", &["x"]), parse("x*sin(x)", &["x"]));
        assert_eq!(parse("2pi x", &["x"]), parse("2*pi*x", &["x"]));
    }

    #[test]
    fn implicit_application() {
        assert_eq!(parse("sin x", &["x"]), parse("sin(x)", &["x"]));
        assert_eq!(parse("sin x**2", &["x"]), parse("sin(x**2)", &["x"]));
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(
            parse("-x**2", &["x"]).unwrap(),
            Expr::Neg(Box::new(Expr::Pow(x(), num(2.0))))
        );
        assert_eq!(
            parse("2**3**2", &[]).unwrap(),
            Expr::Pow(num(2.0), Box::new(Expr::Pow(num(3.0), num(2.0))))
        );
        assert_eq!(
            parse("1-2-3", &[]).unwrap(),
            Expr::Sub(Box::new(Expr::Sub(num(1.0), num(2.0))), num(3.0))
        );
        assert_eq!(parse("x^2", &["x"]), parse("x**2", &["x"]));
    }

    #[test]
    fn multi_letter_names_split_into_declared_symbols() {
        assert_eq!(
            parse("xy", &["x", "y"]).unwrap(),
            Expr::Mul(x(), Box::new(Expr::var("y")))
        );
        assert_eq!(
            parse("xz", &["x", "y"]),
            Err(SyntaxError::UnknownName("xz".into()))
        );
    }

    #[test]
    fn only_declared_symbols_are_accepted() {
        assert_eq!(parse("y", &["x"]), Err(SyntaxError::UnknownName("y".into())));
        assert_eq!(
            parse("floor(x)", &["x"]),
            Err(SyntaxError::UnknownName("floor".into()))
        );
        assert!(parse("t", &["t"]).is_ok());
    }

    #[test]
    fn whitelist_names() {
        assert!(parse("Abs(x) + abs(x) + log(E) + sqrt(pi)", &["x"]).is_ok());
        assert!(parse("asin(x)+acos(x)+atan(x)+tan(x)+exp(x)", &["x"]).is_ok());
    }

    #[test]
    fn structural_errors() {
        assert_eq!(parse("", &["x"]), Err(SyntaxError::Empty));
        assert_eq!(parse("(x+1", &["x"]), Err(SyntaxError::Unclosed));
        assert_eq!(parse("x+", &["x"]), Err(SyntaxError::UnexpectedEnd));
        assert!(matches!(parse("x)", &["x"]), Err(SyntaxError::UnexpectedToken(_))));
        assert!(matches!(parse("2 3", &[]), Err(SyntaxError::UnexpectedToken(_))));
        assert!(matches!(parse("*x", &["x"]), Err(SyntaxError::UnexpectedToken(_))));
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let nested = format!("{}x{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(parse(&nested, &["x"]), Err(SyntaxError::TooDeep(MAX_NESTING)));

        let negated = format!("{}x", "-".repeat(10_000));
        assert_eq!(parse(&negated, &["x"]), Err(SyntaxError::TooDeep(MAX_NESTING)));

        let calls = format!("{}x{}", "sin(".repeat(1_000), ")".repeat(1_000));
        assert!(matches!(parse(&calls, &["x"]), Err(SyntaxError::TooDeep(_))));
    }

    #[test]
    fn long_chains_are_bounded() {
        let sum = vec!["x"; 200].join("+");
        assert!(parse(&sum, &["x"]).is_ok());

        let sum = vec!["x"; 5_000].join("+");
        assert_eq!(parse(&sum, &["x"]), Err(SyntaxError::TooDeep(MAX_HEIGHT)));
    }

    #[test]
    fn moderate_nesting_still_parses() {
        let nested = format!("{}x{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(parse(&nested, &["x"]), Ok(Expr::var("x")));
    }

    #[test]
    fn messages_name_the_problem() {
        let err = parse("foo(x)", &["x"]).unwrap_err();
        assert_eq!(err.to_string(), "name 'foo' is not defined");
    }
}
