//! Real-valued two-argument kernels for grid sampling, evaluated with meval.
//!
//! The expression tree is rendered into meval syntax once, parsed once to
//! validate it, and then bound again on every rayon worker: meval's bound
//! closures are not `Send`, so each thread builds its own.

use super::numeric::CompileError;
use super::Expr;
use crate::whitelist::Constant;
use ndarray::Array2;
use rayon::prelude::*;
use std::fmt::Write;

#[derive(Debug, Clone)]
pub struct GridKernel {
    source: String,
    parsed: meval::Expr,
    vars: (String, String),
}

impl GridKernel {
    pub fn compile(expr: &Expr, vars: (&str, &str)) -> Result<Self, CompileError> {
        if let Some(unbound) = expr
            .symbols()
            .into_iter()
            .find(|s| *s != vars.0 && *s != vars.1)
        {
            return Err(CompileError::Unbound(unbound.to_string()));
        }

        let mut source = String::new();
        render(expr, &mut source)?;
        let parsed: meval::Expr = source
            .parse()
            .map_err(|e: meval::Error| CompileError::Kernel(e.to_string()))?;
        // bind once up front so a bad kernel fails here, not per worker
        parsed
            .clone()
            .bind2(vars.0, vars.1)
            .map(drop)
            .map_err(|e| CompileError::Kernel(e.to_string()))?;

        Ok(GridKernel {
            source,
            parsed,
            vars: (vars.0.to_string(), vars.1.to_string()),
        })
    }

    /// The meval source the kernel was built from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate over the grid `xs × ys`; row `i` holds `ys[i]`, column `j`
    /// holds `xs[j]`. Domain errors come back as NaN.
    pub fn eval_grid(&self, xs: &[f64], ys: &[f64]) -> Array2<f64> {
        let rows: Vec<Vec<f64>> = ys
            .par_iter()
            .map_init(
                || self.parsed.clone().bind2(&self.vars.0, &self.vars.1).ok(),
                |func, &y| {
                    xs.iter()
                        .map(|&x| func.as_ref().map_or(f64::NAN, |f| f(x, y)))
                        .collect()
                },
            )
            .collect();

        Array2::from_shape_fn((ys.len(), xs.len()), |(i, j)| rows[i][j])
    }
}

// fully parenthesised so meval's own precedence rules never come into play
fn render(expr: &Expr, out: &mut String) -> Result<(), CompileError> {
    match expr {
        Expr::Num(v) => render_number(*v, out),
        Expr::Const(Constant::Pi) => out.push_str("pi"),
        Expr::Const(Constant::E) => out.push_str("e"),
        Expr::Const(Constant::I) => {
            return Err(CompileError::Kernel("imaginary unit".to_string()));
        }
        Expr::Var(name) => out.push_str(name),
        Expr::Neg(a) => {
            out.push_str("(-");
            render(a, out)?;
            out.push(')');
        }
        Expr::Call(func, a) => {
            out.push_str(func.meval_name());
            out.push('(');
            render(a, out)?;
            out.push(')');
        }
        Expr::Add(a, b) => render_binary(a, '+', b, out)?,
        Expr::Sub(a, b) => render_binary(a, '-', b, out)?,
        Expr::Mul(a, b) => render_binary(a, '*', b, out)?,
        Expr::Div(a, b) => render_binary(a, '/', b, out)?,
        Expr::Pow(a, b) => render_binary(a, '^', b, out)?,
    }
    Ok(())
}

fn render_binary(a: &Expr, op: char, b: &Expr, out: &mut String) -> Result<(), CompileError> {
    out.push('(');
    render(a, out)?;
    out.push(op);
    render(b, out)?;
    out.push(')');
    Ok(())
}

fn render_number(v: f64, out: &mut String) {
    if v.is_nan() {
        out.push_str("(0/0)");
    } else if v.is_infinite() {
        out.push_str(if v > 0.0 { "(1/0)" } else { "(-1/0)" });
    } else if v < 0.0 {
        let _ = write!(out, "(-{})", -v);
    } else {
        let _ = write!(out, "{v}");
    }
}
