//! Bounded Newton-Raphson solvers: single-variable and multivariate.
//!
//! Both solvers are generalized from the teacher's finite-difference
//! implementation to use the analytic derivatives produced by
//! [`crate::shunting::Expression::differentiate`], and both clamp the
//! working value(s) into declared bounds on every iteration.

use std::collections::HashMap;

use gmatlib::Matrix;

use crate::equation::Equation;
use crate::errors::NewtonRaphsonSolverError;
use crate::shunting::ContextHashMap;

/// `|f'(x)|` below this threshold is treated as a vanished derivative.
const DERIVATIVE_EPSILON: f64 = 1e-14;

/// Bounded single-variable Newton-Raphson.
///
/// Clamps `guess` into `[lo, hi]` before iterating. Converges when either
/// the step size or the residual falls within `margin`, and fails with
/// `DerivativeVanished` or `ReachedIterationLimit` otherwise.
pub fn solve_single_variable(
    equation: &Equation,
    ctx: &ContextHashMap,
    var: &str,
    guess: f64,
    lo: f64,
    hi: f64,
    margin: f64,
    limit: usize,
) -> anyhow::Result<f64>
{
    if margin <= 0.0
    {
        return Err(NewtonRaphsonSolverError::NegativeMargin.into());
    }
    if limit == 0
    {
        return Err(NewtonRaphsonSolverError::ReachedIterationLimit.into());
    }

    let mut x = guess.clamp(lo, hi);
    let mut assignment = HashMap::new();

    for _ in 0..limit
    {
        assignment.insert(var.to_owned(), x);

        let fx = equation.expr.eval(ctx, &assignment)?;
        let dfx_expr = equation.expr.differentiate(var, ctx, &assignment)?;
        let dfx = dfx_expr.eval(ctx, &assignment)?;

        if dfx.abs() < DERIVATIVE_EPSILON
        {
            return Err(NewtonRaphsonSolverError::DerivativeVanished.into());
        }

        let step = fx / dfx;
        let x_new = (x - step).clamp(lo, hi);

        if (x_new - x).abs() < margin || fx.abs() < margin
        {
            return Ok(x_new);
        }

        x = x_new;
    }

    Err(NewtonRaphsonSolverError::ReachedIterationLimit.into())
}

/// A variable slot solved for by [`solve_multivariate`]: current value plus
/// the domain it must stay within.
#[derive(Clone, Copy, Debug)]
pub struct Bounded
{
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl Bounded
{
    pub fn new(value: f64, min: f64, max: f64) -> Bounded
    {
        Bounded { value: value.clamp(min, max), min, max }
    }

    fn clamp_in_place(&mut self)
    {
        self.value = self.value.clamp(self.min, self.max);
    }
}

/// Bounded multivariate Newton-Raphson over a square system.
///
/// `variables` fixes the canonical column order of the Jacobian;
/// `guess` must contain exactly one entry per name in `variables`.
pub fn solve_multivariate(
    equations: &[Equation],
    ctx: &ContextHashMap,
    variables: &[String],
    guess: &mut HashMap<String, Bounded>,
    margin: f64,
    limit: usize,
) -> anyhow::Result<HashMap<String, f64>>
{
    if margin <= 0.0
    {
        return Err(NewtonRaphsonSolverError::NegativeMargin.into());
    }
    if limit == 0
    {
        return Err(NewtonRaphsonSolverError::ReachedIterationLimit.into());
    }

    let n = variables.len();
    if equations.len() != n || guess.len() != n
    {
        return Err(NewtonRaphsonSolverError::ImproperlyConstrainedSystem.into());
    }

    for _ in 0..limit
    {
        let assignment: HashMap<String, f64> = guess.iter().map(|(k, v)| (k.clone(), v.value)).collect();

        let mut residuals = vec![0.0; n];
        for (i, eqn) in equations.iter().enumerate()
        {
            residuals[i] = eqn.residual(ctx, &assignment)?;
        }

        let max_residual = residuals.iter().fold(0.0_f64, |acc, r| acc.max(r.abs()));
        if max_residual < margin
        {
            return Ok(assignment);
        }

        let mut jacobian = Matrix::<f64>::new(n, n);
        for (i, eqn) in equations.iter().enumerate()
        {
            for (j, var) in variables.iter().enumerate()
            {
                let d_expr = eqn.expr.differentiate(var, ctx, &assignment)?;
                jacobian.set(i, j, d_expr.eval(ctx, &assignment)?)?;
            }
        }

        jacobian.try_inplace_invert()
            .map_err(|_| NewtonRaphsonSolverError::SingularJacobian)?;

        let r_col = Matrix::from_col_vec(residuals);
        let delta = jacobian.multiply_matrix(&r_col)?;

        let mut max_delta = 0.0_f64;
        for (i, var) in variables.iter().enumerate()
        {
            let d = delta.get(i, 0)?;
            max_delta = max_delta.max(d.abs());
            let slot = guess.get_mut(var).expect("variable present in guess map");
            slot.value -= d;
            slot.clamp_in_place();
        }

        if max_delta < margin
        {
            return Ok(guess.iter().map(|(k, v)| (k.clone(), v.value)).collect());
        }
    }

    Err(NewtonRaphsonSolverError::ReachedIterationLimit.into())
}
