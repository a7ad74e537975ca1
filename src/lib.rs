//! Expression classification and plot sampling.
//!
//! [`evaluate`] takes a free-form expression string, decides which of seven
//! interpretations it denotes (explicit function, parametric or polar curve,
//! surface, implicit relation, inequality region, or an equation to solve)
//! and samples it into arrays ready for plotting. Only the whitelisted
//! functions and constants and the symbols a mode declares can appear in an
//! expression.
//!
//! ```
//! use plotcore::{evaluate, RawInput};
//!
//! let response = evaluate(&RawInput { points: 5, xmin: -2.0, xmax: 2.0, ..RawInput::new("x^2") });
//! assert!(!response.is_error());
//! ```

pub mod algebra;
pub mod classify;
pub mod config;
pub mod error;
pub mod modes;
pub mod normalize;
pub mod response;
pub mod roots;
pub mod sampler;
pub mod whitelist;

pub use classify::{classify, Mode};
pub use config::{PartialInput, RawInput, Settings};
pub use error::{Error, ParseContext, Result};
pub use normalize::normalize;
pub use response::{GridValues, Plot, Response};

use log::{debug, warn};
use modes::Plan;
use sampler::Domain;

/// Classify and sample one request. Failures come back as an error
/// response carrying the normalized expression; this never panics on user
/// input.
pub fn evaluate(input: &RawInput) -> Response {
    let expr = normalize(&input.expression);
    match try_evaluate(&expr, input) {
        Ok(plot) => Response::Plot(plot),
        Err(e) => {
            warn!("evaluating {expr:?} failed: {e}");
            Response::error(e, expr)
        }
    }
}

/// Like [`evaluate`], for an expression that is already normalized.
pub fn try_evaluate(expr: &str, input: &RawInput) -> Result<Plot> {
    let mode = classify(expr, input.mode);
    let plan = modes::plan(mode, expr)?;
    let domain = Domain::new(input.xmin, input.xmax, input.points);
    debug!("sampling {mode} over [{}, {}] with {} points", domain.min, domain.max, domain.points);

    let expr = expr.to_string();
    let plot = match plan {
        Plan::Cartesian { f, solve } => {
            let roots = solve.and_then(|target| match roots::report_roots(&target, "x") {
                Ok(roots) => Some(roots),
                Err(e) => {
                    warn!("no roots for {expr:?}: {e}");
                    None
                }
            });
            Plot::curve(sampler::sample_graph(&f, &domain), expr, mode, roots)
        }
        Plan::Equation { f, residual } => {
            let roots = roots::report_roots(&residual, "x")?;
            Plot::curve(sampler::sample_graph(&f, &domain), expr, mode, Some(roots))
        }
        Plan::Parametric { x, y } => {
            Plot::curve(sampler::sample_parametric(&x, &y, &domain), expr, mode, None)
        }
        Plan::Polar { r } => Plot::curve(sampler::sample_polar(&r, &domain)?, expr, mode, None),
        Plan::Surface(kernel) | Plan::Implicit(kernel) => {
            let grid = sampler::sample_grid(&kernel, &domain);
            let z = GridValues::Real(response::nested(&grid.z));
            Plot::grid(&grid, z, expr, mode, None)
        }
        Plan::Inequality { kernel, relation } => {
            let grid = sampler::sample_grid(&kernel, &domain);
            let z = GridValues::Mask(response::nested(&sampler::mask(&grid.z, relation)));
            Plot::grid(&grid, z, expr, mode, Some(relation.symbol().to_string()))
        }
    };
    Ok(plot)
}
