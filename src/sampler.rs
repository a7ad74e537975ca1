//! Numeric sampling of compiled functions.
//!
//! 1D samplers evaluate in complex arithmetic and keep only values whose
//! imaginary part is rounding noise. 2D samplers use the real grid kernel and
//! let domain errors through as NaN. Per-sample failures never abort a run.

use crate::algebra::{Compiled, GridKernel};
use crate::error::{Error, Result};
use log::debug;
use ndarray::Array2;
use num_complex::Complex64;
use rayon::prelude::*;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Largest imaginary part still treated as rounding noise on a real value.
pub const REAL_TOLERANCE: f64 = 1e-9;

// =============================================================================
// DOMAINS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain {
    pub min: f64,
    pub max: f64,
    pub points: usize,
}

impl Domain {
    pub fn new(min: f64, max: f64, points: usize) -> Self {
        Domain { min, max, points }
    }

    pub fn axis(&self) -> Vec<f64> {
        linspace(self.min, self.max, self.points)
    }

    /// Points per axis of a square grid with at most `points` cells.
    pub fn grid_side(&self) -> usize {
        (self.points as f64).sqrt().floor() as usize
    }
}

/// Generate `num` evenly spaced values from `start` to `end`, both included.
pub fn linspace(start: f64, end: f64, num: usize) -> Vec<f64> {
    if num <= 1 {
        return if num == 0 { Vec::new() } else { vec![start] };
    }
    let step = (end - start) / (num - 1) as f64;
    let mut values: Vec<f64> = (0..num).map(|i| start + step * i as f64).collect();
    if let Some(last) = values.last_mut() {
        *last = end;
    }
    values
}

pub fn real_part(z: Complex64) -> Option<f64> {
    (z.im.abs() < REAL_TOLERANCE).then_some(z.re)
}

// =============================================================================
// 1D SAMPLING
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    pub x: Vec<Option<f64>>,
    pub y: Vec<Option<f64>>,
}

/// `y = f(x)` over the domain.
pub fn sample_graph(f: &Compiled, domain: &Domain) -> Curve {
    let xs = domain.axis();
    debug!("sampling graph at {} points", xs.len());
    let y = xs.par_iter().map(|&x| real_part(f.call(&[x]))).collect();
    Curve { x: xs.into_iter().map(Some).collect(), y }
}

/// `(x(t), y(t))` with `t` running over the domain.
pub fn sample_parametric(fx: &Compiled, fy: &Compiled, domain: &Domain) -> Curve {
    let ts = domain.axis();
    debug!("sampling parametric curve at {} points", ts.len());
    let (x, y) = ts
        .par_iter()
        .map(|&t| (real_part(fx.call(&[t])), real_part(fy.call(&[t]))))
        .unzip();
    Curve { x, y }
}

/// `r(t)` converted to cartesian coordinates. A radius that is genuinely
/// complex at any angle fails the whole request.
pub fn sample_polar(r: &Compiled, domain: &Domain) -> Result<Curve> {
    let ts = domain.axis();
    debug!("sampling polar curve at {} points", ts.len());
    let radii: Vec<Complex64> = ts.par_iter().map(|&t| r.call(&[t])).collect();

    if let Some((t, z)) = ts
        .iter()
        .zip(&radii)
        .find(|(_, z)| z.im.is_finite() && z.im.abs() >= REAL_TOLERANCE)
    {
        return Err(Error::Evaluation(format!(
            "polar radius is not real at theta = {t}: {z}"
        )));
    }

    let (x, y) = ts
        .iter()
        .zip(&radii)
        .map(|(&t, z)| (Some(z.re * t.cos()), Some(z.re * t.sin())))
        .unzip();
    Ok(Curve { x, y })
}

// =============================================================================
// 2D SAMPLING
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub x: Array2<f64>,
    pub y: Array2<f64>,
    pub z: Array2<f64>,
}

/// Coordinate matrices with `x[[i, j]] = xs[j]` and `y[[i, j]] = ys[i]`.
pub fn meshgrid(xs: &[f64], ys: &[f64]) -> (Array2<f64>, Array2<f64>) {
    let shape = (ys.len(), xs.len());
    (
        Array2::from_shape_fn(shape, |(_, j)| xs[j]),
        Array2::from_shape_fn(shape, |(i, _)| ys[i]),
    )
}

pub fn sample_grid(kernel: &GridKernel, domain: &Domain) -> Grid {
    let n = domain.grid_side();
    debug!("sampling {n}x{n} grid");
    let axis = linspace(domain.min, domain.max, n);
    let (x, y) = meshgrid(&axis, &axis);
    let z = kernel.eval_grid(&axis, &axis);
    Grid { x, y, z }
}

/// Relational operator of an inequality, compared against zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Greater,
    Less,
    GreaterEq,
    LessEq,
    NotEqual,
}

impl Relation {
    /// Anything unrecognised means "not equal to zero".
    pub fn from_symbol(op: &str) -> Relation {
        match op {
            ">" => Relation::Greater,
            "<" => Relation::Less,
            ">=" => Relation::GreaterEq,
            "<=" => Relation::LessEq,
            _ => Relation::NotEqual,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Relation::Greater => ">",
            Relation::Less => "<",
            Relation::GreaterEq => ">=",
            Relation::LessEq => "<=",
            Relation::NotEqual => "!=",
        }
    }

    pub fn holds(self, v: f64) -> bool {
        match self {
            Relation::Greater => v > 0.0,
            Relation::Less => v < 0.0,
            Relation::GreaterEq => v >= 0.0,
            Relation::LessEq => v <= 0.0,
            Relation::NotEqual => v != 0.0,
        }
    }
}

/// 0/1 mask of the cells where `relation` holds.
pub fn mask(z: &Array2<f64>, relation: Relation) -> Array2<u8> {
    z.mapv(|v| u8::from(relation.holds(v)))
}
