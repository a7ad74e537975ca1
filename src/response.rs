//! JSON shapes returned to callers.
//!
//! Non-finite floats serialise as `null`, which is how domain errors and
//! poles show up in the output.

use crate::classify::Mode;
use crate::sampler::{Curve, Grid};
use ndarray::Array2;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Plot(Plot),
    Error(ErrorResponse),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub expr: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Plot {
    Curve {
        x: Vec<Option<f64>>,
        y: Vec<Option<f64>>,
        expr: String,
        mode: Mode,
        #[serde(skip_serializing_if = "Option::is_none")]
        roots: Option<Vec<Option<f64>>>,
    },
    Grid {
        #[serde(rename = "X")]
        x: Vec<Vec<f64>>,
        #[serde(rename = "Y")]
        y: Vec<Vec<f64>>,
        #[serde(rename = "Z")]
        z: GridValues,
        expr: String,
        mode: Mode,
        #[serde(skip_serializing_if = "Option::is_none")]
        op: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GridValues {
    Real(Vec<Vec<f64>>),
    Mask(Vec<Vec<u8>>),
}

/// Row-major nested rows of a 2D array.
pub fn nested<T: Clone>(a: &Array2<T>) -> Vec<Vec<T>> {
    a.outer_iter().map(|row| row.to_vec()).collect()
}

impl Plot {
    pub fn curve(curve: Curve, expr: String, mode: Mode, roots: Option<Vec<Option<f64>>>) -> Self {
        Plot::Curve { x: curve.x, y: curve.y, expr, mode, roots }
    }

    pub fn grid(grid: &Grid, z: GridValues, expr: String, mode: Mode, op: Option<String>) -> Self {
        Plot::Grid {
            x: nested(&grid.x),
            y: nested(&grid.y),
            z,
            expr,
            mode,
            op,
        }
    }

    pub fn mode(&self) -> Mode {
        match self {
            Plot::Curve { mode, .. } | Plot::Grid { mode, .. } => *mode,
        }
    }
}

impl Response {
    pub fn error(error: impl ToString, expr: impl Into<String>) -> Self {
        Response::Error(ErrorResponse { error: error.to_string(), expr: expr.into() })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }

    pub fn expr(&self) -> &str {
        match self {
            Response::Plot(Plot::Curve { expr, .. } | Plot::Grid { expr, .. }) => expr,
            Response::Error(e) => &e.expr,
        }
    }

    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}
