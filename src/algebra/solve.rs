//! Single-variable equation solving.
//!
//! Polynomial and rational left-hand sides go to the numeric root finder.
//! Everything else is inverted one operation at a time from the outside in,
//! and the candidates each inversion produces are checked by substituting
//! them back.

use super::numeric::{compile, CompileError};
use super::poly::{self, Poly};
use super::Expr;
use crate::whitelist::Function;
use num_complex::Complex64;
use num_traits::Zero;
use std::f64::consts::{PI, TAU};
use thiserror::Error;

// =============================================================================
// CONFIGURATION
// =============================================================================
const VERIFY_TOLERANCE: f64 = 1e-7;
const POLE_TOLERANCE: f64 = 1e-9;
const DUPLICATE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("no closed-form inversion for {0}")]
    Unsupported(String),

    #[error("equation mentions '{0}' besides the unknown")]
    FreeSymbol(String),

    #[error(transparent)]
    Compile(#[from] CompileError),
}

/// Solve `expr = 0` for `var`.
///
/// Polynomial and rational equations report their distinct roots with real
/// roots ascending, then complex roots by real and imaginary part. A
/// numerator root that also zeroes the denominator is not a solution.
/// Transcendental equations report principal-branch solutions in the order
/// the inversion produced them.
pub fn solve(expr: &Expr, var: &str) -> Result<Vec<Expr>, SolveError> {
    if let Some(other) = expr.symbols().into_iter().find(|s| *s != var) {
        return Err(SolveError::FreeSymbol(other.to_string()));
    }
    let roots = solve_for(expr, var, Complex64::zero())?;
    Ok(roots.into_iter().map(Expr::from_complex).collect())
}

// solutions of expr(var) = target
fn solve_for(expr: &Expr, var: &str, target: Complex64) -> Result<Vec<Complex64>, SolveError> {
    if !expr.depends_on(var) {
        return Ok(Vec::new());
    }

    if let Some(form) = poly::rational_form(expr, var) {
        let shifted = form.num.sub(&form.den.mul(&Poly::constant(target)));
        return Ok(poly::roots(&shifted)
            .into_iter()
            .filter(|z| form.den.eval(*z).norm() > POLE_TOLERANCE * (1.0 + z.norm()))
            .collect());
    }

    let candidates = invert(expr, var, target)?;
    verify(expr, var, target, candidates)
}

fn invert(expr: &Expr, var: &str, target: Complex64) -> Result<Vec<Complex64>, SolveError> {
    match expr {
        Expr::Num(_) | Expr::Const(_) => Ok(Vec::new()),
        Expr::Var(_) => Ok(vec![target]),
        Expr::Neg(a) => solve_for(a, var, -target),

        Expr::Add(a, b) => match (a.depends_on(var), b.depends_on(var)) {
            (true, false) => solve_for(a, var, target - constant(b)?),
            (false, true) => solve_for(b, var, target - constant(a)?),
            _ => Err(unsupported(expr)),
        },

        Expr::Sub(a, b) => match (a.depends_on(var), b.depends_on(var)) {
            (true, false) => solve_for(a, var, target + constant(b)?),
            (false, true) => solve_for(b, var, constant(a)? - target),
            _ => Err(unsupported(expr)),
        },

        Expr::Mul(a, b) => match (a.depends_on(var), b.depends_on(var)) {
            (true, false) => scaled(a, var, target, constant(b)?, expr),
            (false, true) => scaled(b, var, target, constant(a)?, expr),
            // a product vanishes where any factor does
            _ if target.is_zero() => {
                let mut roots = solve_for(a, var, target)?;
                roots.extend(solve_for(b, var, target)?);
                Ok(roots)
            }
            _ => Err(unsupported(expr)),
        },

        Expr::Div(a, b) => match (a.depends_on(var), b.depends_on(var)) {
            (true, false) => solve_for(a, var, target * constant(b)?),
            (false, true) => {
                let k = constant(a)?;
                if target.is_zero() {
                    return if k.is_zero() { Err(unsupported(expr)) } else { Ok(Vec::new()) };
                }
                solve_for(b, var, k / target)
            }
            _ if target.is_zero() => solve_for(a, var, target),
            _ => Err(unsupported(expr)),
        },

        Expr::Pow(base, exp) => match (base.depends_on(var), exp.depends_on(var)) {
            (true, false) => invert_power(base, var, target, constant(exp)?),
            (false, true) => {
                let b = constant(base)?;
                if b.is_zero() || b == Complex64::new(1.0, 0.0) || target.is_zero() {
                    return if target.is_zero() { Ok(Vec::new()) } else { Err(unsupported(expr)) };
                }
                solve_for(exp, var, Function::Log.eval(target) / Function::Log.eval(b))
            }
            _ => Err(unsupported(expr)),
        },

        Expr::Call(func, arg) => {
            let mut roots = Vec::new();
            for inner in invert_call(*func, target) {
                roots.extend(solve_for(arg, var, inner)?);
            }
            Ok(roots)
        }
    }
}

fn scaled(
    factor: &Expr,
    var: &str,
    target: Complex64,
    k: Complex64,
    whole: &Expr,
) -> Result<Vec<Complex64>, SolveError> {
    if k.is_zero() {
        return Err(unsupported(whole));
    }
    solve_for(factor, var, target / k)
}

fn invert_power(
    base: &Expr,
    var: &str,
    target: Complex64,
    n: Complex64,
) -> Result<Vec<Complex64>, SolveError> {
    if target.is_zero() {
        return if n.re > 0.0 { solve_for(base, var, target) } else { Ok(Vec::new()) };
    }
    if n.im == 0.0 && n.re.fract() == 0.0 && n.re != 0.0 && n.re.abs() <= 64.0 {
        // every k-th root of the target is a candidate base value
        let k = n.re.abs() as usize;
        let t = if n.re < 0.0 { target.inv() } else { target };
        let (radius, angle) = t.to_polar();
        let mut roots = Vec::new();
        for j in 0..k {
            let theta = (angle + TAU * j as f64) / k as f64;
            roots.extend(solve_for(base, var, Complex64::from_polar(radius.powf(1.0 / k as f64), theta))?);
        }
        return Ok(roots);
    }
    if n.is_zero() {
        return Ok(Vec::new());
    }
    solve_for(base, var, target.powc(n.inv()))
}

// argument values that map to `target`, principal branches only
fn invert_call(func: Function, target: Complex64) -> Vec<Complex64> {
    match func {
        Function::Sin => {
            let s = Function::Asin.eval(target);
            vec![s, Complex64::new(PI, 0.0) - s]
        }
        Function::Cos => {
            let c = Function::Acos.eval(target);
            vec![c, Complex64::new(TAU, 0.0) - c]
        }
        Function::Tan => vec![Function::Atan.eval(target)],
        Function::Exp if target.is_zero() => Vec::new(),
        Function::Exp => vec![Function::Log.eval(target)],
        Function::Log => vec![Function::Exp.eval(target)],
        Function::Sqrt => vec![target * target],
        Function::Abs if target.im != 0.0 || target.re < 0.0 => Vec::new(),
        Function::Abs if target.is_zero() => vec![target],
        Function::Abs => vec![-target, target],
        Function::Asin => vec![Function::Sin.eval(target)],
        Function::Acos => vec![Function::Cos.eval(target)],
        Function::Atan => vec![Function::Tan.eval(target)],
    }
}

fn verify(
    expr: &Expr,
    var: &str,
    target: Complex64,
    candidates: Vec<Complex64>,
) -> Result<Vec<Complex64>, SolveError> {
    let f = compile(expr, &[var])?;
    let mut kept: Vec<Complex64> = Vec::new();
    for z in candidates {
        let residual = f.call_complex(&[z]) - target;
        if !residual.is_finite() || residual.norm() > VERIFY_TOLERANCE * (1.0 + target.norm()) {
            continue;
        }
        let duplicate = kept
            .iter()
            .any(|k| (k - z).norm() <= DUPLICATE_TOLERANCE * (1.0 + z.norm()));
        if !duplicate {
            kept.push(z);
        }
    }
    Ok(kept)
}

fn constant(expr: &Expr) -> Result<Complex64, SolveError> {
    let value = expr.eval_constant()?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(unsupported(expr))
    }
}

fn unsupported(expr: &Expr) -> SolveError {
    SolveError::Unsupported(expr.to_string())
}
