//! Mode-specific parsing.
//!
//! Each mode pulls its sub-expressions out of the normalized string, parses
//! them against the symbols that mode declares, and compiles whatever its
//! sampler needs. Parse failures carry the name of the sub-expression.

use crate::algebra::{compile, parse, Compiled, Expr, GridKernel, SyntaxError};
use crate::classify::{wants_roots, Mode};
use crate::error::{Error, ParseContext, Result};
use crate::sampler::Relation;
use regex::Regex;
use std::sync::OnceLock;

const T: &[&str] = &["t"];
const X: &[&str] = &["x"];
const XY: &[&str] = &["x", "y"];

/// Everything needed to sample one request.
#[derive(Debug, Clone)]
pub enum Plan {
    /// `y = f(x)`; `solve` holds the expression to solve for roots, if any.
    Cartesian { f: Compiled, solve: Option<Expr> },
    Equation { f: Compiled, residual: Expr },
    Parametric { x: Compiled, y: Compiled },
    Polar { r: Compiled },
    Surface(GridKernel),
    Implicit(GridKernel),
    Inequality { kernel: GridKernel, relation: Relation },
}

pub fn plan(mode: Mode, expr: &str) -> Result<Plan> {
    match mode {
        Mode::Parametric => parametric(expr),
        Mode::Surface => surface(expr),
        Mode::Polar => polar(expr),
        Mode::Inequality => inequality(expr),
        Mode::Implicit => implicit(expr),
        Mode::Equation => equation(expr),
        Mode::Cartesian => cartesian(expr),
    }
}

fn parse_in(context: ParseContext, text: &str, symbols: &[&str]) -> Result<Expr> {
    parse(text, symbols).map_err(|e| Error::parse(context, e))
}

fn relation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("<=|>=|<|>").expect("relational operator pattern is valid"))
}

// `(a, b)` -> `a, b`, but `(a), (b)` is left alone
fn strip_enclosing_parens(s: &str) -> &str {
    let Some(inner) = s.strip_prefix('(').and_then(|rest| rest.strip_suffix(')')) else {
        return s;
    };
    let mut depth = 0i32;
    for c in inner.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        if depth < 0 {
            return s;
        }
    }
    if depth == 0 {
        inner
    } else {
        s
    }
}

fn parametric(expr: &str) -> Result<Plan> {
    let body = strip_enclosing_parens(expr.trim());
    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    if parts.len() != 2 {
        return Err(Error::parse(
            ParseContext::ParametricParts,
            SyntaxError::ComponentCount { expected: 2, found: parts.len() },
        ));
    }

    // `x=..., y=...` names its components
    let named = parts[0].contains('=');
    let component = |part: &str| -> String {
        match part.split_once('=') {
            Some((_, rhs)) if named => rhs.to_string(),
            _ => part.to_string(),
        }
    };

    let x = parse_in(ParseContext::ParametricParts, &component(parts[0]), T)?;
    let y = parse_in(ParseContext::ParametricParts, &component(parts[1]), T)?;
    Ok(Plan::Parametric {
        x: compile(&x, T)?,
        y: compile(&y, T)?,
    })
}

fn surface(expr: &str) -> Result<Plan> {
    let rhs = expr.split_once('=').map_or(expr, |(_, rhs)| rhs);
    let z = parse_in(ParseContext::Surface, rhs, XY)?;
    Ok(Plan::Surface(GridKernel::compile(&z, ("x", "y"))?))
}

fn polar(expr: &str) -> Result<Plan> {
    let body = expr.strip_prefix("r=").unwrap_or(expr).replace("theta", "t");
    let r = parse_in(ParseContext::Polar, &body, T)?;
    Ok(Plan::Polar { r: compile(&r, T)? })
}

fn inequality(expr: &str) -> Result<Plan> {
    // without an operator the whole string is compared against zero
    let (left, op, right) = match relation_pattern().find(expr) {
        Some(m) => (&expr[..m.start()], m.as_str(), &expr[m.end()..]),
        None => (expr, "!=", "0"),
    };
    let f = parse_in(ParseContext::Inequality, &format!("({left})-({right})"), XY)?;
    Ok(Plan::Inequality {
        kernel: GridKernel::compile(&f, ("x", "y"))?,
        relation: Relation::from_symbol(op),
    })
}

fn implicit(expr: &str) -> Result<Plan> {
    let (left, right) = expr.split_once('=').unwrap_or((expr, "0"));
    let f = parse_in(ParseContext::Implicit, &format!("({left})-({right})"), XY)?;
    Ok(Plan::Implicit(GridKernel::compile(&f, ("x", "y"))?))
}

fn equation(expr: &str) -> Result<Plan> {
    let (left, right) = expr.split_once('=').unwrap_or((expr, "0"));
    let left = parse_in(ParseContext::Equation, left, X)?;
    let right = parse_in(ParseContext::Equation, right, X)?;
    let residual = Expr::sub(left, right);
    Ok(Plan::Equation {
        f: compile(&residual, X)?,
        residual,
    })
}

fn cartesian(expr: &str) -> Result<Plan> {
    let f = parse_in(ParseContext::Cartesian, expr, X)?;
    Ok(Plan::Cartesian {
        f: compile(&f, X)?,
        solve: wants_roots(expr).then_some(f),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error(mode: Mode, expr: &str) -> String {
        plan(mode, expr).unwrap_err().to_string()
    }

    #[test]
    fn parametric_accepts_tuples_and_named_parts() {
        for expr in ["(cos(t), sin(t))", "cos(t), sin(t)", "x=cos(t), y=sin(t)"] {
            let Plan::Parametric { x, y } = plan(Mode::Parametric, expr).unwrap() else {
                panic!("{expr} is not parametric");
            };
            assert_eq!(x.call(&[0.0]).re, 1.0);
            assert_eq!(y.call(&[0.0]).re, 0.0);
        }
    }

    #[test]
    fn parametric_needs_exactly_two_parts() {
        assert_eq!(
            error(Mode::Parametric, "x**2"),
            "Parse error in parametric parts: expected 2 comma-separated components, found 1"
        );
        assert_eq!(
            error(Mode::Parametric, "(cos(t), sin(t), t)"),
            "Parse error in parametric parts: expected 2 comma-separated components, found 3"
        );
    }

    #[test]
    fn enclosing_parens_are_stripped_once() {
        assert_eq!(strip_enclosing_parens("(a, b)"), "a, b");
        assert_eq!(strip_enclosing_parens("(a), (b)"), "(a), (b)");
        assert_eq!(strip_enclosing_parens("((a, b))"), "(a, b)");
        assert_eq!(strip_enclosing_parens("a, b"), "a, b");
    }

    #[test]
    fn polar_reads_theta_as_t() {
        let Plan::Polar { r } = plan(Mode::Polar, "r=2theta").unwrap() else {
            panic!("not polar");
        };
        assert_eq!(r.call(&[1.5]).re, 3.0);
    }

    #[test]
    fn inequality_splits_on_the_longest_operator() {
        let Plan::Inequality { relation, .. } = plan(Mode::Inequality, "x**2+y**2<=1").unwrap()
        else {
            panic!("not an inequality");
        };
        assert_eq!(relation, Relation::LessEq);
        assert_eq!(relation_pattern().find("a>=b").map(|m| m.as_str()), Some(">="));
    }

    #[test]
    fn surfaces_use_the_right_hand_side() {
        let Plan::Surface(kernel) = plan(Mode::Surface, "z=x*y").unwrap() else {
            panic!("not a surface");
        };
        assert_eq!(kernel.eval_grid(&[2.0], &[3.0])[[0, 0]], 6.0);
    }

    #[test]
    fn equations_keep_their_residual() {
        let Plan::Equation { f, residual } = plan(Mode::Equation, "x**2=4").unwrap() else {
            panic!("not an equation");
        };
        assert_eq!(f.call(&[2.0]).re, 0.0);
        assert_eq!(residual.to_string(), "x**2 - 4");
    }

    #[test]
    fn cartesian_solves_only_pure_functions_of_x() {
        let Plan::Cartesian { solve, .. } = plan(Mode::Cartesian, "x**2").unwrap() else {
            panic!("not cartesian");
        };
        assert!(solve.is_some());
        let Plan::Cartesian { solve, .. } = plan(Mode::Cartesian, "5").unwrap() else {
            panic!("not cartesian");
        };
        assert!(solve.is_none());
    }

    #[test]
    fn parse_errors_carry_their_context() {
        assert!(error(Mode::Surface, "z=foo(x)").starts_with("Parse error in surface expression:"));
        assert!(error(Mode::Polar, "theta=r").starts_with("Parse error in polar expression:"));
        assert!(error(Mode::Inequality, "x>t").starts_with("Parse error in inequality:"));
        assert!(error(Mode::Implicit, "x=y=1").starts_with("Parse error in implicit expression:"));
        assert!(error(Mode::Equation, "x=y").starts_with("Parse error in equation:"));
        assert!(error(Mode::Cartesian, "y*x").starts_with("Parse error:"));
    }
}
