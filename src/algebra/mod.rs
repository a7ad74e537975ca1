//! Embedded algebra engine.
//!
//! Parses whitelisted expressions against a declared symbol set, compiles them
//! into numeric functions and solves single-variable equations.

mod grid;
mod lexer;
mod numeric;
mod parser;
mod poly;
mod solve;

pub use grid::GridKernel;
pub use numeric::{compile, CompileError, Compiled};
pub use parser::{parse, SyntaxError};
pub use solve::{solve, SolveError};

use crate::whitelist::{Constant, Function};
use num_complex::Complex64;
use std::fmt;

/// Expression tree produced by [`parse`].
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    Const(Constant),
    Var(String),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Call(Function, Box<Expr>),
}

impl Expr {
    pub fn var(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    pub fn sub(lhs: Expr, rhs: Expr) -> Expr {
        Expr::Sub(Box::new(lhs), Box::new(rhs))
    }

    /// Literal for a solver result: `re` alone when the value is real,
    /// `re + im*I` otherwise.
    pub fn from_complex(z: Complex64) -> Expr {
        if z.im == 0.0 {
            return Expr::Num(z.re);
        }
        let imag = Expr::Mul(Box::new(Expr::Num(z.im)), Box::new(Expr::Const(Constant::I)));
        Expr::Add(Box::new(Expr::Num(z.re)), Box::new(imag))
    }

    pub fn depends_on(&self, name: &str) -> bool {
        match self {
            Expr::Num(_) | Expr::Const(_) => false,
            Expr::Var(v) => v == name,
            Expr::Neg(a) | Expr::Call(_, a) => a.depends_on(name),
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Div(a, b)
            | Expr::Pow(a, b) => a.depends_on(name) || b.depends_on(name),
        }
    }

    /// Free symbol names, sorted and deduplicated.
    pub fn symbols(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_symbols(&mut out);
        out.sort_unstable();
        out.dedup();
        out
    }

    fn collect_symbols<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Num(_) | Expr::Const(_) => {}
            Expr::Var(v) => out.push(v),
            Expr::Neg(a) | Expr::Call(_, a) => a.collect_symbols(out),
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Div(a, b)
            | Expr::Pow(a, b) => {
                a.collect_symbols(out);
                b.collect_symbols(out);
            }
        }
    }

    /// Numeric value of a symbol-free expression.
    pub fn eval_constant(&self) -> Result<Complex64, CompileError> {
        Ok(compile(self, &[])?.call_complex(&[]))
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Add(..) | Expr::Sub(..) => 1,
            Expr::Mul(..) | Expr::Div(..) => 2,
            Expr::Neg(_) => 3,
            Expr::Pow(..) => 4,
            Expr::Num(v) if *v < 0.0 => 3,
            _ => 5,
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, e: &Expr, min: u8) -> fmt::Result {
    if e.precedence() < min {
        write!(f, "({e})")
    } else {
        write!(f, "{e}")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Num(v) => write!(f, "{v}"),
            Expr::Const(c) => f.write_str(c.name()),
            Expr::Var(v) => f.write_str(v),
            Expr::Neg(a) => {
                f.write_str("-")?;
                write_operand(f, a, 3)
            }
            Expr::Add(a, b) => {
                write_operand(f, a, 1)?;
                f.write_str(" + ")?;
                write_operand(f, b, 2)
            }
            Expr::Sub(a, b) => {
                write_operand(f, a, 1)?;
                f.write_str(" - ")?;
                write_operand(f, b, 2)
            }
            Expr::Mul(a, b) => {
                write_operand(f, a, 2)?;
                f.write_str("*")?;
                write_operand(f, b, 3)
            }
            Expr::Div(a, b) => {
                write_operand(f, a, 2)?;
                f.write_str("/")?;
                write_operand(f, b, 3)
            }
            Expr::Pow(a, b) => {
                write_operand(f, a, 5)?;
                f.write_str("**")?;
                write_operand(f, b, 4)
            }
            Expr::Call(func, a) => write!(f, "{}({a})", func.name()),
        }
    }
}
