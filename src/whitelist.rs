//! The fixed table of names an expression may use.
//!
//! Anything not listed here (and not one of the symbols a mode declares) is
//! rejected by the parser.

use num_complex::Complex64;
use std::f64::consts::{E, PI};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Exp,
    Log,
    Sqrt,
    Abs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constant {
    Pi,
    E,
    /// Imaginary unit. Produced by the solver for complex roots, never
    /// reachable from user input.
    I,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Function(Function),
    Constant(Constant),
}

/// Allowed names and what they mean. Immutable for the process lifetime.
pub static WHITELIST: &[(&str, Builtin)] = &[
    ("sin", Builtin::Function(Function::Sin)),
    ("cos", Builtin::Function(Function::Cos)),
    ("tan", Builtin::Function(Function::Tan)),
    ("asin", Builtin::Function(Function::Asin)),
    ("acos", Builtin::Function(Function::Acos)),
    ("atan", Builtin::Function(Function::Atan)),
    ("exp", Builtin::Function(Function::Exp)),
    ("log", Builtin::Function(Function::Log)),
    ("sqrt", Builtin::Function(Function::Sqrt)),
    ("Abs", Builtin::Function(Function::Abs)),
    ("abs", Builtin::Function(Function::Abs)),
    ("pi", Builtin::Constant(Constant::Pi)),
    ("E", Builtin::Constant(Constant::E)),
];

pub fn lookup(name: &str) -> Option<Builtin> {
    WHITELIST
        .iter()
        .find(|(allowed, _)| *allowed == name)
        .map(|(_, builtin)| *builtin)
}

impl Function {
    pub fn name(self) -> &'static str {
        match self {
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Asin => "asin",
            Function::Acos => "acos",
            Function::Atan => "atan",
            Function::Exp => "exp",
            Function::Log => "log",
            Function::Sqrt => "sqrt",
            Function::Abs => "Abs",
        }
    }

    /// Name of the same function in meval's builtin context.
    pub fn meval_name(self) -> &'static str {
        match self {
            Function::Log => "ln",
            Function::Abs => "abs",
            other => other.name(),
        }
    }

    /// Principal-branch evaluation. Real arguments stay on the real line
    /// whenever the real function is defined there.
    pub fn eval(self, z: Complex64) -> Complex64 {
        if z.im == 0.0 {
            let x = z.re;
            let real = match self {
                Function::Sin => Some(x.sin()),
                Function::Cos => Some(x.cos()),
                Function::Tan => Some(x.tan()),
                Function::Atan => Some(x.atan()),
                Function::Exp => Some(x.exp()),
                Function::Abs => Some(x.abs()),
                Function::Asin if x.abs() <= 1.0 || x.is_nan() => Some(x.asin()),
                Function::Acos if x.abs() <= 1.0 || x.is_nan() => Some(x.acos()),
                Function::Log if x >= 0.0 || x.is_nan() => Some(x.ln()),
                Function::Sqrt if x >= 0.0 || x.is_nan() => Some(x.sqrt()),
                _ => None,
            };
            if let Some(v) = real {
                return Complex64::new(v, 0.0);
            }
        }
        match self {
            Function::Sin => z.sin(),
            Function::Cos => z.cos(),
            Function::Tan => z.tan(),
            Function::Asin => z.asin(),
            Function::Acos => z.acos(),
            Function::Atan => z.atan(),
            Function::Exp => z.exp(),
            Function::Log => z.ln(),
            Function::Sqrt => z.sqrt(),
            Function::Abs => Complex64::new(z.norm(), 0.0),
        }
    }
}

impl Constant {
    pub fn name(self) -> &'static str {
        match self {
            Constant::Pi => "pi",
            Constant::E => "E",
            Constant::I => "I",
        }
    }

    pub fn value(self) -> Complex64 {
        match self {
            Constant::Pi => Complex64::new(PI, 0.0),
            Constant::E => Complex64::new(E, 0.0),
            Constant::I => Complex64::new(0.0, 1.0),
        }
    }
}
