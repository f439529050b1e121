//! Decomposes a pool of Nexsys2 equations into single-unknown equations and
//! constrained subsystems, solving each with `geqslib`, until the pool is
//! empty or no further progress can be made.
//!
//! Grounded on `ForceOverArea-Ngineer/nexsys/src/lib.rs`'s
//! `try_solve_single_unknown_eqn` / `try_solve_subsystem_of_equations` /
//! `basic_solve` / `solve_with_preprocessors`, itself a port of
//! `original_source/engine/nexsys2lib.py`'s `_try_solve_single_unknown_equation`
//! / `_try_solve_subsystem_of_equations` / `nexsys2`. Two behaviors are
//! pinned differently from the teacher per `spec.md`'s Open Questions: the
//! single-unknown search scans the whole pool each call instead of bailing
//! on the first multi-unknown equation, and the subsystem grower tries
//! every remaining equation as a seed instead of stopping after the first.

/// Errors specific to the outer pipeline and the preprocessor pass.
pub mod errors;

/// Preprocessing: comments, `const`, `keep`, `guess`, and `if`/`else`/`end`.
pub mod parsing;

use std::collections::HashMap;

use geqslib::shunting::{get_equation_unknowns, new_context, ContextHashMap, ContextLike, Token};
use geqslib::solve_equation_with_context;
use geqslib::system::{ConstrainResult, SystemBuilder};

use errors::PipelineError;
use parsing::{default_schedule, DeclaredMap, PreprocessorStep};

/// Which strategy discharged a given batch of equations in one pipeline step.
#[derive(Clone, Debug)]
pub enum Strategy
{
    /// A single equation with exactly one unknown, solved in isolation.
    SingleVariable
    {
        equation: String,
    },

    /// A constrained subsystem of `k` equations in `k` unknowns, solved
    /// together via multivariate Newton-Raphson.
    Subsystem
    {
        equations: Vec<String>,
    },
}

/// One entry in the audit trail a solve produces: which strategy fired, and
/// what it resolved. Mirrors the teacher's `log_step: &mut String` idiom,
/// generalized into a structured type instead of a formatted string.
#[derive(Clone, Debug)]
pub struct SolveStep
{
    pub strategy: Strategy,
    pub assigned: HashMap<String, f64>,
}

const DEFAULT_DECLARED: [f64; 3] = [1.0, f64::NEG_INFINITY, f64::INFINITY];

/// Scans the entire pool for the first equation with exactly one unknown
/// and solves it; unlike the teacher's version, a multi-unknown equation
/// partway through the pool does not stop the scan early.
fn try_solve_single_unknown_eqn(
    eqn_pool: &mut Vec<String>,
    ctx: &mut ContextHashMap,
    declared: &DeclaredMap,
    margin: f64,
    limit: usize,
) -> anyhow::Result<Option<SolveStep>>
{
    for i in 0..eqn_pool.len()
    {
        let unknowns: Vec<String> = get_equation_unknowns(&eqn_pool[i], ctx).collect();
        if unknowns.len() != 1
        {
            continue;
        }

        let var = &unknowns[0];
        let var_info = declared.get(var).copied().unwrap_or(DEFAULT_DECLARED);

        let solved = solve_equation_with_context(&eqn_pool[i], ctx, var_info[0], var_info[1], var_info[2], margin, limit)?;
        let Some(value) = solved else { continue };

        ctx.add_var_with_domain_to_ctx(var, value, var_info[1], var_info[2]);

        let equation = eqn_pool.remove(i);
        let mut assigned = HashMap::new();
        assigned.insert(var.clone(), value);

        return Ok(Some(SolveStep { strategy: Strategy::SingleVariable { equation }, assigned }));
    }

    Ok(None)
}

/// Tries every remaining equation in the pool as a seed for a constrained
/// subsystem, in pool order; unlike the teacher's version, a seed that
/// fails to grow into a fully constrained system does not abort the whole
/// attempt -- the next seed is tried instead.
fn try_solve_subsystem_of_equations(
    eqn_pool: &mut Vec<String>,
    ctx: &mut ContextHashMap,
    declared: &DeclaredMap,
    margin: f64,
    limit: usize,
) -> anyhow::Result<Option<SolveStep>>
{
    for i in 0..eqn_pool.len()
    {
        let Ok(mut builder) = SystemBuilder::new(&eqn_pool[i], ctx) else { continue };
        let mut members = vec![eqn_pool[i].clone()];

        for (j, candidate) in eqn_pool.iter().enumerate()
        {
            if j == i || members.contains(candidate)
            {
                continue;
            }

            match builder.try_constrain_with(candidate, ctx)?
            {
                ConstrainResult::WillConstrain => members.push(candidate.clone()),
                ConstrainResult::WillOverConstrain => break,
                ConstrainResult::WillNotConstrain => {}
            }
        }

        if !builder.is_fully_constrained()
        {
            continue;
        }

        let Ok(mut system) = builder.build() else { continue };
        for var in system.variables().to_vec()
        {
            let info = declared.get(&var).copied().unwrap_or(DEFAULT_DECLARED);
            system.specify_variable(&var, info[0], info[1], info[2]);
        }

        let Ok(solved) = system.solve(ctx, margin, limit) else { continue };

        for (var, value) in &solved
        {
            ctx.add_const_to_ctx(var, *value);
        }

        eqn_pool.retain(|e| !members.contains(e));

        return Ok(Some(SolveStep { strategy: Strategy::Subsystem { equations: members }, assigned: solved }));
    }

    Ok(None)
}

/// Solves a system of equations already in plain-text form (no `const`,
/// `keep`, `guess`, or `if`/`else`/`end` syntax sugar) against `ctx` and
/// `declared`. For the full DSL, use `solve` or `solve_with`.
pub fn basic_solve(
    system: &str,
    ctx: &mut ContextHashMap,
    declared: &DeclaredMap,
    margin: f64,
    limit: usize,
) -> anyhow::Result<(Vec<SolveStep>, HashMap<String, f64>)>
{
    let mut eqn_pool: Vec<String> = system.lines()
        .filter(|line| line.contains('='))
        .map(|line| line.to_owned())
        .collect();

    let mut trail = vec![];

    loop
    {
        if let Some(step) = try_solve_single_unknown_eqn(&mut eqn_pool, ctx, declared, margin, limit)?
        {
            trail.push(step);
            continue;
        }

        if let Some(step) = try_solve_subsystem_of_equations(&mut eqn_pool, ctx, declared, margin, limit)?
        {
            trail.push(step);
            continue;
        }

        break;
    }

    if !eqn_pool.is_empty()
    {
        return Err(PipelineError::Underconstrained { stuck: eqn_pool }.into());
    }

    let mut soln_map = HashMap::new();
    for (name, token) in ctx.iter()
    {
        match token
        {
            Token::Var(v) => { soln_map.insert(name.clone(), v.borrow().as_f64()); }
            Token::Num(n) => { soln_map.insert(name.clone(), *n); }
            _ => {}
        }
    }

    Ok((trail, soln_map))
}

/// Runs `schedule` over `system`, then solves the resulting plain-text
/// equations. This is the full-DSL entry point with a caller-chosen
/// preprocessor schedule.
pub fn solve_with(system: &str, margin: f64, limit: usize, schedule: &[PreprocessorStep]) -> anyhow::Result<(Vec<SolveStep>, HashMap<String, f64>)>
{
    let mut ctx = new_context();
    let mut declared = DeclaredMap::new();
    let compiled = parsing::compile_with_schedule(system, &mut ctx, &mut declared, schedule)?;

    basic_solve(&compiled, &mut ctx, &declared, margin, limit)
}

/// Runs the standard preprocessor schedule over `system`, then solves it.
///
/// # Example
/// ```
/// use nexsys::solve;
///
/// let system = r#"
/// keep x on [0, 100]
/// guess 3 for y
/// const nine = 9
///
/// x + y = nine
/// x - y = 4
/// "#;
///
/// let (_trail, soln) = solve(system, 1e-9, 200).expect("failed to solve system");
///
/// assert!((soln["x"] - 6.5).abs() < 1e-4);
/// assert!((soln["y"] - 2.5).abs() < 1e-4);
/// ```
pub fn solve(system: &str, margin: f64, limit: usize) -> anyhow::Result<(Vec<SolveStep>, HashMap<String, f64>)>
{
    solve_with(system, margin, limit, &default_schedule())
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn solves_a_single_linear_equation()
    {
        let (_, soln) = solve("x + 1 = 0", 1e-9, 100).unwrap();
        assert!((soln["x"] - (-1.0)).abs() < 1e-4);
    }

    #[test]
    fn chained_single_unknown_solves_resolve_in_order()
    {
        let (trail, soln) = solve("const g = 9.81\nf = g * m\nm = 2", 1e-9, 100).unwrap();
        assert!((soln["m"] - 2.0).abs() < 1e-4);
        assert!((soln["f"] - 19.62).abs() < 1e-3);
        assert_eq!(trail.len(), 2);
    }

    #[test]
    fn solves_a_two_by_two_system_as_a_subsystem()
    {
        let (trail, soln) = solve("x + y = 3\nx - y = 1", 1e-9, 100).unwrap();
        assert!((soln["x"] - 2.0).abs() < 1e-4);
        assert!((soln["y"] - 1.0).abs() < 1e-4);
        assert!(matches!(trail[0].strategy, Strategy::Subsystem { .. }));
    }

    #[test]
    fn domain_and_comment_preprocessing_compose()
    {
        let system = "// find positive root\nkeep x on [0, 10]\nx^2 - 4 = 0";
        let (_, soln) = solve(system, 1e-9, 200).unwrap();
        assert!((soln["x"] - 2.0).abs() < 1e-4);
    }

    #[test]
    fn conditional_block_resolves_with_declared_guess()
    {
        let system = "if [ a < 0 ]\n-a = 5\nelse\na = 5\nend\nguess -1 for a";
        let (_, soln) = solve(system, 1e-9, 200).unwrap();
        assert!((soln["a"] - (-5.0)).abs() < 1e-3);
    }

    #[test]
    fn leftover_equations_surface_as_underconstrained()
    {
        let err = solve("x + y = 3", 1e-9, 100).unwrap_err();
        assert!(err.to_string().contains("unsolved"));
    }
}
