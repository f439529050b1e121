//! A single equation, parsed as `lhs - rhs` with its free variables tracked.

use std::collections::{HashMap, HashSet};

use crate::errors::ExpressionError;
use crate::shunting::{BinOp, ContextHashMap, Expression};

/// An equation `lhs = rhs`, stored internally as `lhs - rhs = 0`.
#[derive(Clone, Debug)]
pub struct Equation
{
    pub expr: Expression,

    /// Free variable names mentioned in `expr` that are not resolved by the
    /// context it was compiled against.
    pub mentions: HashSet<String>,

    /// Same set as `mentions`, but in deterministic left-to-right order of
    /// first appearance in the parsed text.
    pub mention_order: Vec<String>,
}

impl Equation
{
    /// Parses a line of text containing exactly one `=` into an `Equation`.
    pub fn parse(text: &str, ctx: &ContextHashMap) -> anyhow::Result<Equation>
    {
        let parts: Vec<&str> = text.split('=').collect();
        if parts.len() != 2
        {
            return Err(ExpressionError::WrongNumberOfEquals(parts.len() - 1).into());
        }

        let lhs = Expression::parse(parts[0].trim())?;
        let rhs = Expression::parse(parts[1].trim())?;
        let expr = Expression::BinaryOp(BinOp::Sub, Box::new(lhs), Box::new(rhs));

        let mut all_vars = HashSet::new();
        expr.collect_variables(&mut all_vars);
        let mentions: HashSet<String> = all_vars.into_iter()
            .filter(|name| !ctx.contains_key(name))
            .collect();

        let mut ordered = vec![];
        expr.collect_variables_ordered(&mut ordered);
        let mention_order = ordered.into_iter()
            .filter(|name| mentions.contains(name))
            .collect();

        Ok(Equation { expr, mentions, mention_order })
    }

    /// Evaluates the residual `lhs - rhs` at the given assignment.
    pub fn residual(&self, ctx: &ContextHashMap, assignment: &HashMap<String, f64>) -> anyhow::Result<f64>
    {
        self.expr.eval(ctx, assignment)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::shunting::new_context;

    #[test]
    fn splits_on_single_equals()
    {
        let ctx = new_context();
        let eqn = Equation::parse("x + 1 = 0", &ctx).unwrap();
        assert!(eqn.mentions.contains("x"));
    }

    #[test]
    fn rejects_more_than_one_equals()
    {
        let ctx = new_context();
        assert!(Equation::parse("x = y = 1", &ctx).is_err());
    }

    #[test]
    fn mentions_excludes_context_constants()
    {
        let mut ctx = new_context();
        use crate::shunting::ContextLike;
        ctx.add_const_to_ctx("g", 9.81);

        let eqn = Equation::parse("f = g * m", &ctx).unwrap();
        assert!(eqn.mentions.contains("f"));
        assert!(eqn.mentions.contains("m"));
        assert!(!eqn.mentions.contains("g"));
    }

    #[test]
    fn residual_is_zero_at_the_root()
    {
        let ctx = new_context();
        let eqn = Equation::parse("x + 1 = 0", &ctx).unwrap();
        let mut a = HashMap::new();
        a.insert("x".to_owned(), -1.0);
        assert_eq!(eqn.residual(&ctx, &a).unwrap(), 0.0);
    }
}
