//! Mode classification.
//!
//! The checks below are substring heuristics applied in a fixed order. Several
//! of them can match the same input; the first one wins, so the order is part
//! of the behaviour and must stay as it is.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Cartesian,
    Parametric,
    Polar,
    Surface,
    Inequality,
    Implicit,
    Equation,
}

impl Mode {
    pub const ALL: [Mode; 7] = [
        Mode::Cartesian,
        Mode::Parametric,
        Mode::Polar,
        Mode::Surface,
        Mode::Inequality,
        Mode::Implicit,
        Mode::Equation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Cartesian => "cartesian",
            Mode::Parametric => "parametric",
            Mode::Polar => "polar",
            Mode::Surface => "surface",
            Mode::Inequality => "inequality",
            Mode::Implicit => "implicit",
            Mode::Equation => "equation",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mode '{0}'")]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

const RELATIONS: [&str; 4] = ["<=", ">=", "<", ">"];

fn is_parametric(expr: &str, hint: Option<Mode>) -> bool {
    if hint == Some(Mode::Parametric) {
        return true;
    }
    if !expr.contains(',') {
        return false;
    }
    let named_components = expr.contains("x=") && expr.contains("y=");
    let tuple =
        expr.contains('(') && expr.contains(')') && expr.matches(',').count() == 1;
    named_components || tuple
}

fn is_surface(expr: &str) -> bool {
    expr.contains("z=")
        || (expr.contains('=') && expr.contains('z') && (expr.contains('x') || expr.contains('y')))
}

fn is_polar(expr: &str) -> bool {
    expr.starts_with("r=") || expr.contains(" r(") || (expr.contains("theta") && expr.contains('r'))
}

fn is_inequality(expr: &str) -> bool {
    RELATIONS.iter().any(|op| expr.contains(op)) && (expr.contains('x') || expr.contains('y'))
}

fn is_implicit(expr: &str) -> bool {
    expr.contains('=') && expr.contains('x') && expr.contains('y') && !expr.starts_with("y=")
}

fn is_equation(expr: &str) -> bool {
    expr.contains('=') && expr.contains('x') && !expr.contains('y')
}

/// Decide how a normalized expression should be interpreted.
///
/// Only a parametric hint influences the outcome; every other hint is
/// ignored and the string alone decides. Never fails: anything unmatched is
/// cartesian.
pub fn classify(expr: &str, hint: Option<Mode>) -> Mode {
    let mode = if is_parametric(expr, hint) {
        Mode::Parametric
    } else if is_surface(expr) {
        Mode::Surface
    } else if is_polar(expr) {
        Mode::Polar
    } else if is_inequality(expr) {
        Mode::Inequality
    } else if is_implicit(expr) {
        Mode::Implicit
    } else if is_equation(expr) {
        Mode::Equation
    } else {
        Mode::Cartesian
    };
    log::debug!("classified {expr:?} as {mode}");
    mode
}

/// Whether a cartesian expression should also be solved for `f(x) = 0`.
pub fn wants_roots(expr: &str) -> bool {
    !expr.contains('=') && expr.contains('x') && !expr.contains('y')
}
