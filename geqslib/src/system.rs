//! Growing and solving a fully-constrained system of equations.
//!
//! Grounded on the real `geqslib::system` module (`SystemBuilder`,
//! `System`, `ConstrainResult`, `get_equation_unknowns`), generalized to
//! solve with the analytic-Jacobian [`crate::newton::solve_multivariate`]
//! instead of a finite-difference Jacobian, and to freeze a canonical
//! variable order (insertion order of first mention) once built.

use std::collections::{HashMap, HashSet};

use crate::equation::Equation;
use crate::errors::SystemBuilderError;
use crate::newton::{solve_multivariate, Bounded};
use crate::shunting::ContextHashMap;

/// Why an equation could or could not be added to a `SystemBuilder`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstrainResult
{
    /// The equation added at most one new unknown and was accepted.
    WillConstrain,

    /// The equation shares no unknowns with the system currently being
    /// built and was rejected without changing anything.
    WillNotConstrain,

    /// Accepting the equation would leave more equations than unknowns.
    WillOverConstrain,
}

/// Grows a system of equations one at a time, tracking which variables are
/// "constrained" (mentioned by at least one accepted equation).
pub struct SystemBuilder
{
    equations: Vec<Equation>,
    /// Insertion order of first mention -- becomes the canonical column
    /// order of the Jacobian once the system is built.
    variables: Vec<String>,
    unknowns: HashSet<String>,
}

impl SystemBuilder
{
    /// Seeds a new builder with one equation. The equation must mention at
    /// least one unknown.
    pub fn new(equation: &str, ctx: &ContextHashMap) -> anyhow::Result<SystemBuilder>
    {
        let eqn = Equation::parse(equation, ctx)?;
        let variables: Vec<String> = eqn.mention_order.clone();
        let unknowns: HashSet<String> = variables.iter().cloned().collect();

        Ok(SystemBuilder
        {
            equations: vec![eqn],
            variables,
            unknowns,
        })
    }

    pub fn variables(&self) -> &[String]
    {
        &self.variables
    }

    pub fn equation_count(&self) -> usize
    {
        self.equations.len()
    }

    /// Attempts to add `equation` to the system, per `spec.md`'s §4.5 rule:
    /// an equation that introduces no new unknowns is accepted as long as
    /// doing so would not push the equation count past the unknown count;
    /// an equation that introduces new unknowns is always accepted; an
    /// equation disjoint from the current unknowns is rejected outright.
    pub fn try_constrain_with(&mut self, equation: &str, ctx: &ContextHashMap) -> anyhow::Result<ConstrainResult>
    {
        let eqn = Equation::parse(equation, ctx)?;

        if eqn.mentions.is_disjoint(&self.unknowns) && !eqn.mentions.is_empty()
        {
            return Ok(ConstrainResult::WillNotConstrain);
        }

        let combined: HashSet<String> = self.unknowns.union(&eqn.mentions).cloned().collect();
        if self.equations.len() + 1 > combined.len()
        {
            return Ok(ConstrainResult::WillOverConstrain);
        }

        for name in &eqn.mention_order
        {
            if self.unknowns.insert(name.clone())
            {
                self.variables.push(name.clone());
            }
        }
        self.equations.push(eqn);

        Ok(ConstrainResult::WillConstrain)
    }

    /// `true` once the number of accepted equations equals the number of
    /// distinct unknowns they mention (and at least one equation exists).
    pub fn is_fully_constrained(&self) -> bool
    {
        !self.equations.is_empty() && self.equations.len() == self.variables.len()
    }

    /// Consumes the builder, producing a `System` if fully constrained.
    pub fn build(self) -> anyhow::Result<System>
    {
        if !self.is_fully_constrained()
        {
            return Err(SystemBuilderError::NotFullyConstrained.into());
        }

        Ok(System
        {
            equations: self.equations,
            variables: self.variables,
            specs: HashMap::new(),
        })
    }
}

/// A guess value and domain declared for one variable of a `System`.
#[derive(Clone, Copy, Debug)]
pub struct DeclaredVariable
{
    pub guess: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for DeclaredVariable
{
    fn default() -> DeclaredVariable
    {
        DeclaredVariable { guess: 1.0, min: f64::NEG_INFINITY, max: f64::INFINITY }
    }
}

/// A fully constrained system of equations, ready to solve.
pub struct System
{
    equations: Vec<Equation>,
    variables: Vec<String>,
    specs: HashMap<String, DeclaredVariable>,
}

impl System
{
    pub fn variables(&self) -> &[String]
    {
        &self.variables
    }

    /// Declares a guess value and domain for `var`. No-op if `var` is not
    /// one of this system's variables.
    pub fn specify_variable(&mut self, var: &str, guess: f64, min: f64, max: f64)
    {
        if !self.variables.contains(&var.to_owned())
        {
            return;
        }
        self.specs.insert(var.to_owned(), DeclaredVariable { guess, min, max });
    }

    /// Solves the system via bounded multivariate Newton-Raphson, using
    /// each variable's declared guess/domain or the defaults from
    /// `DeclaredVariable` when none was specified.
    pub fn solve(self, ctx: &ContextHashMap, margin: f64, limit: usize) -> anyhow::Result<HashMap<String, f64>>
    {
        let mut guess = HashMap::new();
        for var in &self.variables
        {
            let spec = self.specs.get(var).copied().unwrap_or_default();
            guess.insert(var.clone(), Bounded::new(spec.guess, spec.min, spec.max));
        }

        solve_multivariate(&self.equations, ctx, &self.variables, &mut guess, margin, limit)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::shunting::new_context;

    #[test]
    fn single_equation_is_not_fully_constrained_with_two_unknowns()
    {
        let ctx = new_context();
        let builder = SystemBuilder::new("x + y = 9", &ctx).unwrap();
        assert!(!builder.is_fully_constrained());
    }

    #[test]
    fn constraining_with_matching_equation_fully_constrains()
    {
        let ctx = new_context();
        let mut builder = SystemBuilder::new("x + y = 9", &ctx).unwrap();
        let res = builder.try_constrain_with("x - y = 4", &ctx).unwrap();
        assert_eq!(res, ConstrainResult::WillConstrain);
        assert!(builder.is_fully_constrained());
    }

    #[test]
    fn disjoint_equation_is_rejected()
    {
        let ctx = new_context();
        let mut builder = SystemBuilder::new("x + y = 9", &ctx).unwrap();
        let res = builder.try_constrain_with("i - j = 4", &ctx).unwrap();
        assert_eq!(res, ConstrainResult::WillNotConstrain);
    }

    #[test]
    fn third_redundant_equation_overconstrains()
    {
        let ctx = new_context();
        let mut builder = SystemBuilder::new("x + y = 9", &ctx).unwrap();
        builder.try_constrain_with("x - y = 4", &ctx).unwrap();
        let res = builder.try_constrain_with("x + y = 10", &ctx).unwrap();
        assert_eq!(res, ConstrainResult::WillOverConstrain);
    }

    #[test]
    fn build_fails_when_not_fully_constrained()
    {
        let ctx = new_context();
        let builder = SystemBuilder::new("x + y = 9", &ctx).unwrap();
        assert!(builder.build().is_err());
    }

    #[test]
    fn solves_a_two_by_two_system_end_to_end()
    {
        let ctx = new_context();
        let mut builder = SystemBuilder::new("x + y = 3", &ctx).unwrap();
        builder.try_constrain_with("x - y = 1", &ctx).unwrap();

        let system = builder.build().unwrap();
        assert_eq!(system.variables().len(), 2);

        let soln = system.solve(&ctx, 1e-9, 100).unwrap();
        assert!((soln["x"] - 2.0).abs() < 1e-4);
        assert!((soln["y"] - 1.0).abs() < 1e-4);
    }
}
