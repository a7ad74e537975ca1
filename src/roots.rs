use crate::algebra::{solve, Expr, SolveError};
use crate::sampler::real_part;

/// Solve `expr = 0` for `var` and report each solution as a real number, or
/// `None` when it is not real. Length and order follow the solver's list.
pub fn report_roots(expr: &Expr, var: &str) -> Result<Vec<Option<f64>>, SolveError> {
    let solutions = solve(expr, var)?;
    Ok(solutions
        .iter()
        .map(|s| s.eval_constant().ok().and_then(real_part))
        .collect())
}
