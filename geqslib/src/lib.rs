/// Error types for every fallible operation in this crate.
pub mod errors;

/// Expression parsing, evaluation, differentiation, and the symbol `Context`.
pub mod shunting;

/// A single equation and its free-variable bookkeeping.
pub mod equation;

/// Bounded single-variable and multivariate Newton-Raphson solvers.
pub mod newton;

/// Growing and solving a constrained system of equations.
pub mod system;

use equation::Equation;
use newton::solve_single_variable;
use shunting::ContextHashMap;

/// Solves a single equation with exactly one unknown, given as plain text.
/// Returns `Ok(None)` if the equation fails to converge or resolves to more
/// or fewer than one unknown variable relative to `ctx`; parse errors still
/// propagate as `Err`.
pub fn solve_equation_with_context(
    equation: &str,
    ctx: &ContextHashMap,
    guess: f64,
    min: f64,
    max: f64,
    margin: f64,
    limit: usize,
) -> anyhow::Result<Option<f64>>
{
    let eqn = Equation::parse(equation, ctx)?;
    if eqn.mention_order.len() != 1
    {
        return Ok(None);
    }
    let var = &eqn.mention_order[0];

    match solve_single_variable(&eqn, ctx, var, guess, min, max, margin, limit)
    {
        Ok(value) => Ok(Some(value)),
        Err(_) => Ok(None),
    }
}
