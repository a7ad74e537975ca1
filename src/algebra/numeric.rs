//! Complex-valued evaluation of expression trees.
//!
//! Arithmetic stays on the real line while both operands are real, so real
//! inputs produce exactly the values ordinary `f64` arithmetic would (including
//! infinities from division by zero). Only genuinely complex intermediate
//! results (`sqrt(-1)`, `log(-2)`, `(-8)**(1/3)`) leave it.

use super::Expr;
use crate::whitelist::Function;
use num_complex::Complex64;
use num_traits::Zero;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("symbol '{0}' is not bound")]
    Unbound(String),

    #[error("expression has no real-valued kernel: {0}")]
    Kernel(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Value(Complex64),
    Slot(usize),
    Neg(Box<Node>),
    Binary(BinOp, Box<Node>, Box<Node>),
    Call(Function, Box<Node>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// A compiled numeric function of an ordered list of symbols.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    root: Node,
    arity: usize,
}

/// Compile `expr` into a function of `symbols`, in that order.
///
/// Symbol-free subtrees are folded once here rather than at every sample.
pub fn compile(expr: &Expr, symbols: &[&str]) -> Result<Compiled, CompileError> {
    Ok(Compiled {
        root: lower(expr, symbols)?,
        arity: symbols.len(),
    })
}

fn lower(expr: &Expr, symbols: &[&str]) -> Result<Node, CompileError> {
    let node = match expr {
        Expr::Num(v) => Node::Value(Complex64::new(*v, 0.0)),
        Expr::Const(c) => Node::Value(c.value()),
        Expr::Var(name) => {
            let slot = symbols
                .iter()
                .position(|s| s == name)
                .ok_or_else(|| CompileError::Unbound(name.clone()))?;
            Node::Slot(slot)
        }
        Expr::Neg(a) => Node::Neg(Box::new(lower(a, symbols)?)),
        Expr::Call(func, a) => Node::Call(*func, Box::new(lower(a, symbols)?)),
        Expr::Add(a, b) => binary(BinOp::Add, a, b, symbols)?,
        Expr::Sub(a, b) => binary(BinOp::Sub, a, b, symbols)?,
        Expr::Mul(a, b) => binary(BinOp::Mul, a, b, symbols)?,
        Expr::Div(a, b) => binary(BinOp::Div, a, b, symbols)?,
        Expr::Pow(a, b) => binary(BinOp::Pow, a, b, symbols)?,
    };
    Ok(fold(node))
}

fn binary(op: BinOp, a: &Expr, b: &Expr, symbols: &[&str]) -> Result<Node, CompileError> {
    Ok(Node::Binary(
        op,
        Box::new(lower(a, symbols)?),
        Box::new(lower(b, symbols)?),
    ))
}

fn fold(node: Node) -> Node {
    let constant = match &node {
        Node::Neg(a) | Node::Call(_, a) => matches!(**a, Node::Value(_)),
        Node::Binary(_, a, b) => {
            matches!(**a, Node::Value(_)) && matches!(**b, Node::Value(_))
        }
        Node::Value(_) | Node::Slot(_) => false,
    };
    if constant {
        Node::Value(eval(&node, &[]))
    } else {
        node
    }
}

fn eval(node: &Node, args: &[Complex64]) -> Complex64 {
    match node {
        Node::Value(v) => *v,
        Node::Slot(i) => args[*i],
        Node::Neg(a) => -eval(a, args),
        Node::Call(func, a) => func.eval(eval(a, args)),
        Node::Binary(op, a, b) => apply(*op, eval(a, args), eval(b, args)),
    }
}

fn apply(op: BinOp, a: Complex64, b: Complex64) -> Complex64 {
    let real = a.im == 0.0 && b.im == 0.0;
    match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul if real => Complex64::new(a.re * b.re, 0.0),
        BinOp::Mul => a * b,
        BinOp::Div if real => Complex64::new(a.re / b.re, 0.0),
        BinOp::Div => a / b,
        BinOp::Pow => pow(a, b),
    }
}

fn pow(base: Complex64, exp: Complex64) -> Complex64 {
    if exp.im == 0.0 {
        let e = exp.re;
        let integral = e.fract() == 0.0 && e.abs() <= f64::from(i32::MAX);
        if base.im == 0.0 {
            if integral {
                return Complex64::new(base.re.powi(e as i32), 0.0);
            }
            if base.re >= 0.0 || base.re.is_nan() {
                return Complex64::new(base.re.powf(e), 0.0);
            }
            return base.powf(e);
        }
        if integral {
            return base.powi(e as i32);
        }
    }
    if base.is_zero() {
        return if exp.re > 0.0 {
            Complex64::zero()
        } else {
            Complex64::new(f64::NAN, f64::NAN)
        };
    }
    base.powc(exp)
}

impl Compiled {
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Evaluate at real arguments. Panics if `args` is shorter than the
    /// symbol list the function was compiled against.
    pub fn call(&self, args: &[f64]) -> Complex64 {
        match args {
            [] => eval(&self.root, &[]),
            [a] => eval(&self.root, &[Complex64::new(*a, 0.0)]),
            _ => {
                let args: Vec<Complex64> = args.iter().map(|a| Complex64::new(*a, 0.0)).collect();
                eval(&self.root, &args)
            }
        }
    }

    pub fn call_complex(&self, args: &[Complex64]) -> Complex64 {
        eval(&self.root, args)
    }
}
