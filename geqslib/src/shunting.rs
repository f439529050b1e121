//! Expression parsing, evaluation, and analytic differentiation.
//!
//! The name `shunting` is kept for continuity with the rest of this crate's
//! module layout, but parsing here is a small recursive-descent parser
//! rather than a literal shunting-yard implementation -- see
//! `Expression::parse`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::{EvalError, EvalError::*, ExpressionError, NonDifferentiable};

lazy_static! {
    static ref LEGAL_VARIABLE: Regex = Regex::new(r"[A-Za-z][A-Za-z0-9_]*").unwrap();
}

/// A declared unknown: a value together with a guess and bounds used by the
/// multivariate solver. Tracked behind an `Rc<RefCell<_>>` so that a
/// `SystemBuilder` and the `System` it produces can share the same
/// underlying cell as equations are added and later solved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Variable
{
    value: f64,
    pub guess: f64,
    pub min: f64,
    pub max: f64,
}

impl Variable
{
    pub fn new(guess: f64) -> Variable
    {
        Variable
        {
            value: guess,
            guess,
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    pub fn with_domain(guess: f64, min: f64, max: f64) -> Variable
    {
        let mut v = Variable { value: guess, guess, min, max };
        v.set(guess);
        v
    }

    /// Sets the current value, clamping it into `[min, max]`.
    pub fn set(&mut self, value: f64)
    {
        self.value = value.clamp(self.min, self.max);
    }

    pub fn as_f64(&self) -> f64
    {
        self.value
    }
}

impl From<&Variable> for f64
{
    fn from(v: &Variable) -> f64
    {
        v.value
    }
}

/// A single entry in a `ContextHashMap`.
#[derive(Clone)]
pub enum Token
{
    /// A named constant value.
    Num(f64),

    /// A declared unknown, mutated in place as the solver iterates.
    Var(Rc<RefCell<Variable>>),

    /// A unary builtin function, e.g. `sin`.
    Unary(fn(f64) -> f64),

    /// An n-ary builtin function. `None` arity means variadic.
    Nary(Option<usize>, fn(&[f64]) -> anyhow::Result<f64>),
}

impl fmt::Debug for Token
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self
        {
            Token::Num(n) => write!(f, "Num({n})"),
            Token::Var(v) => write!(f, "Var({})", v.borrow().as_f64()),
            Token::Unary(_) => write!(f, "Unary(<fn>)"),
            Token::Nary(n, _) => write!(f, "Nary({n:?}, <fn>)"),
        }
    }
}

/// The mapping of symbol name to `Token` that expressions are evaluated and
/// differentiated against.
pub type ContextHashMap = HashMap<String, Token>;

/// Convenience methods for mutating a `ContextHashMap`, mirroring the way
/// the outer solver pipeline threads context updates through a solve.
pub trait ContextLike
{
    fn add_const_to_ctx(&mut self, name: &str, value: f64);
    fn add_var_to_ctx(&mut self, name: &str, guess: f64);
    fn add_var_with_domain_to_ctx(&mut self, name: &str, guess: f64, min: f64, max: f64);
}

impl ContextLike for ContextHashMap
{
    fn add_const_to_ctx(&mut self, name: &str, value: f64)
    {
        self.insert(name.to_owned(), Token::Num(value));
    }

    fn add_var_to_ctx(&mut self, name: &str, guess: f64)
    {
        self.insert(name.to_owned(), Token::Var(Rc::new(RefCell::new(Variable::new(guess)))));
    }

    fn add_var_with_domain_to_ctx(&mut self, name: &str, guess: f64, min: f64, max: f64)
    {
        self.insert(name.to_owned(), Token::Var(Rc::new(RefCell::new(Variable::with_domain(guess, min, max)))));
    }
}

fn op_code_holds(code: f64, lhs: f64, rhs: f64) -> bool
{
    match code as i64
    {
        1 => lhs == rhs,
        2 => lhs <= rhs,
        3 => lhs >= rhs,
        4 => lhs < rhs,
        5 => lhs > rhs,
        6 => lhs != rhs,
        _ => false,
    }
}

fn builtin_if(args: &[f64]) -> anyhow::Result<f64>
{
    if args.len() != 5
    {
        return Err(ArityMismatch("if".to_owned(), "5".to_owned(), args.len()).into());
    }
    let (cond_lhs, op_code, cond_rhs, if_true, if_false) = (args[0], args[1], args[2], args[3], args[4]);
    Ok(if op_code_holds(op_code, cond_lhs, cond_rhs) { if_true } else { if_false })
}

/// Builds a context with no entries at all -- not even builtins.
pub fn new_empty_context() -> ContextHashMap
{
    ContextHashMap::new()
}

/// Builds a context seeded with the standard math builtins, `if`, and the
/// constants `pi` and `e`.
pub fn new_context() -> ContextHashMap
{
    let mut ctx = ContextHashMap::new();

    let unary: &[(&str, fn(f64) -> f64)] = &[
        ("sin", f64::sin),
        ("cos", f64::cos),
        ("tan", f64::tan),
        ("sinh", f64::sinh),
        ("cosh", f64::cosh),
        ("tanh", f64::tanh),
        ("asin", f64::asin),
        ("acos", f64::acos),
        ("atan", f64::atan),
        ("log", f64::log10),
        ("ln", f64::ln),
        ("exp", f64::exp),
        ("sqrt", f64::sqrt),
        ("abs", f64::abs),
    ];
    for (name, f) in unary
    {
        ctx.insert((*name).to_owned(), Token::Unary(*f));
    }

    ctx.insert("if".to_owned(), Token::Nary(Some(5), builtin_if));
    ctx.add_const_to_ctx("pi", std::f64::consts::PI);
    ctx.add_const_to_ctx("e", std::f64::consts::E);

    ctx
}

/// Returns an iterator over the legal variable-shaped names appearing in
/// `text`, lowercased, in order of first appearance (duplicates included).
pub fn get_legal_variables_iter(text: &str) -> impl Iterator<Item = String> + '_
{
    LEGAL_VARIABLE.find_iter(text).map(|m| m.as_str().to_lowercase())
}

/// Returns the unknown variable names in `equation` -- those matching the
/// variable pattern that are *not* already present in `ctx`.
pub fn get_equation_unknowns<'a>(equation: &'a str, ctx: &'a ContextHashMap) -> impl Iterator<Item = String> + 'a
{
    let mut seen = std::collections::HashSet::new();
    get_legal_variables_iter(equation).filter(move |name| {
        !ctx.contains_key(name) && seen.insert(name.clone())
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp
{
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// A parsed arithmetic expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expression
{
    Literal(f64),
    Variable(String),
    BuiltinCall(String, Vec<Expression>),
    BinaryOp(BinOp, Box<Expression>, Box<Expression>),
    UnaryMinus(Box<Expression>),
}

struct Tokenizer<'a>
{
    chars: Vec<char>,
    pos: usize,
    source: &'a str,
}

#[derive(Clone, Debug, PartialEq)]
enum Tok
{
    Num(f64),
    Name(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
}

impl<'a> Tokenizer<'a>
{
    fn new(source: &'a str) -> Tokenizer<'a>
    {
        Tokenizer { chars: source.chars().collect(), pos: 0, source }
    }

    fn peek_char(&self) -> Option<char>
    {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self)
    {
        while matches!(self.peek_char(), Some(c) if c.is_whitespace())
        {
            self.pos += 1;
        }
    }

    fn next(&mut self) -> anyhow::Result<Option<Tok>>
    {
        self.skip_whitespace();
        let Some(c) = self.peek_char() else { return Ok(None) };

        if c.is_ascii_digit() || c == '.'
        {
            let start = self.pos;
            if c == '.' { self.pos += 1; }
            while matches!(self.peek_char(), Some(d) if d.is_ascii_digit())
            {
                self.pos += 1;
            }
            if self.peek_char() == Some('.')
            {
                self.pos += 1;
                while matches!(self.peek_char(), Some(d) if d.is_ascii_digit())
                {
                    self.pos += 1;
                }
            }
            let text: String = self.chars[start..self.pos].iter().collect();
            let value = text.parse::<f64>()
                .map_err(|_| ExpressionError::UnexpectedCharacter(c, start))?;
            return Ok(Some(Tok::Num(value)));
        }

        if c.is_ascii_alphabetic()
        {
            let start = self.pos;
            while matches!(self.peek_char(), Some(d) if d.is_ascii_alphanumeric() || d == '_')
            {
                self.pos += 1;
            }
            let text: String = self.chars[start..self.pos].iter().collect();
            return Ok(Some(Tok::Name(text.to_lowercase())));
        }

        self.pos += 1;
        match c
        {
            '+' => Ok(Some(Tok::Plus)),
            '-' => Ok(Some(Tok::Minus)),
            '*' => Ok(Some(Tok::Star)),
            '/' => Ok(Some(Tok::Slash)),
            '^' => Ok(Some(Tok::Caret)),
            '(' => Ok(Some(Tok::LParen)),
            ')' => Ok(Some(Tok::RParen)),
            ',' => Ok(Some(Tok::Comma)),
            other => Err(ExpressionError::UnexpectedCharacter(other, self.pos - 1).into()),
        }
    }

    /// Tokenizes the entire source up front; simplest way to give the
    /// recursive-descent parser unbounded lookahead without re-scanning.
    fn tokenize(mut self) -> anyhow::Result<Vec<Tok>>
    {
        let mut toks = vec![];
        while let Some(t) = self.next()?
        {
            toks.push(t);
        }
        let _ = self.source;
        Ok(toks)
    }
}

struct Parser
{
    toks: Vec<Tok>,
    pos: usize,
}

impl Parser
{
    fn peek(&self) -> Option<&Tok>
    {
        self.toks.get(self.pos)
    }

    fn advance(&mut self) -> Option<Tok>
    {
        let t = self.toks.get(self.pos).cloned();
        if t.is_some() { self.pos += 1; }
        t
    }

    fn expect(&mut self, tok: &Tok, ch: char) -> anyhow::Result<()>
    {
        match self.advance()
        {
            Some(ref t) if t == tok => Ok(()),
            _ => Err(ExpressionError::ExpectedToken(ch, self.pos).into()),
        }
    }

    // expr := term (('+'|'-') term)*
    fn parse_expr(&mut self) -> anyhow::Result<Expression>
    {
        let mut lhs = self.parse_term()?;
        loop
        {
            match self.peek()
            {
                Some(Tok::Plus) => { self.advance(); lhs = Expression::BinaryOp(BinOp::Add, Box::new(lhs), Box::new(self.parse_term()?)); }
                Some(Tok::Minus) => { self.advance(); lhs = Expression::BinaryOp(BinOp::Sub, Box::new(lhs), Box::new(self.parse_term()?)); }
                _ => break,
            }
        }
        Ok(lhs)
    }

    // term := factor (('*'|'/') factor)*
    fn parse_term(&mut self) -> anyhow::Result<Expression>
    {
        let mut lhs = self.parse_factor()?;
        loop
        {
            match self.peek()
            {
                Some(Tok::Star) => { self.advance(); lhs = Expression::BinaryOp(BinOp::Mul, Box::new(lhs), Box::new(self.parse_factor()?)); }
                Some(Tok::Slash) => { self.advance(); lhs = Expression::BinaryOp(BinOp::Div, Box::new(lhs), Box::new(self.parse_factor()?)); }
                _ => break,
            }
        }
        Ok(lhs)
    }

    // factor := unary ('^' factor)?  (right-assoc)
    fn parse_factor(&mut self) -> anyhow::Result<Expression>
    {
        let base = self.parse_unary()?;
        if matches!(self.peek(), Some(Tok::Caret))
        {
            self.advance();
            let exp = self.parse_factor()?;
            return Ok(Expression::BinaryOp(BinOp::Pow, Box::new(base), Box::new(exp)));
        }
        Ok(base)
    }

    // unary := '-' unary | primary
    fn parse_unary(&mut self) -> anyhow::Result<Expression>
    {
        if matches!(self.peek(), Some(Tok::Minus))
        {
            self.advance();
            return Ok(Expression::UnaryMinus(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    // primary := number | name | name '(' args ')' | '(' expr ')'
    fn parse_primary(&mut self) -> anyhow::Result<Expression>
    {
        match self.advance()
        {
            Some(Tok::Num(n)) => Ok(Expression::Literal(n)),
            Some(Tok::Name(name)) =>
            {
                if matches!(self.peek(), Some(Tok::LParen))
                {
                    self.advance();
                    let mut args = vec![];
                    if !matches!(self.peek(), Some(Tok::RParen))
                    {
                        args.push(self.parse_expr()?);
                        while matches!(self.peek(), Some(Tok::Comma))
                        {
                            self.advance();
                            args.push(self.parse_expr()?);
                        }
                    }
                    self.expect(&Tok::RParen, ')')?;
                    Ok(Expression::BuiltinCall(name, args))
                }
                else
                {
                    Ok(Expression::Variable(name))
                }
            }
            Some(Tok::LParen) =>
            {
                let e = self.parse_expr()?;
                self.expect(&Tok::RParen, ')')?;
                Ok(e)
            }
            _ => Err(ExpressionError::UnexpectedEndOfInput.into()),
        }
    }
}

impl Expression
{
    /// Parses `text` as a single arithmetic expression, per the grammar in
    /// the module-level docs.
    pub fn parse(text: &str) -> anyhow::Result<Expression>
    {
        let toks = Tokenizer::new(text).tokenize()?;
        let mut parser = Parser { toks, pos: 0 };
        let expr = parser.parse_expr()?;
        if parser.pos != parser.toks.len()
        {
            return Err(ExpressionError::UnexpectedCharacter('?', parser.pos).into());
        }
        Ok(expr)
    }

    /// Walks the tree, collecting every distinct `Variable` name mentioned.
    pub fn collect_variables(&self, out: &mut std::collections::HashSet<String>)
    {
        match self
        {
            Expression::Literal(_) => {}
            Expression::Variable(name) => { out.insert(name.clone()); }
            Expression::BuiltinCall(_, args) => { for a in args { a.collect_variables(out); } }
            Expression::BinaryOp(_, l, r) => { l.collect_variables(out); r.collect_variables(out); }
            Expression::UnaryMinus(e) => e.collect_variables(out),
        }
    }

    /// Walks the tree left-to-right, appending each distinct `Variable` name
    /// the first time it is seen. Unlike `collect_variables`, the result
    /// order is deterministic and depends only on the text that was parsed
    /// -- used to fix the canonical column order of a system's Jacobian.
    pub fn collect_variables_ordered(&self, out: &mut Vec<String>)
    {
        fn visit(expr: &Expression, out: &mut Vec<String>)
        {
            match expr
            {
                Expression::Literal(_) => {}
                Expression::Variable(name) =>
                {
                    if !out.contains(name)
                    {
                        out.push(name.clone());
                    }
                }
                Expression::BuiltinCall(_, args) => { for a in args { visit(a, out); } }
                Expression::BinaryOp(_, l, r) => { visit(l, out); visit(r, out); }
                Expression::UnaryMinus(e) => visit(e, out),
            }
        }
        visit(self, out);
    }

    fn lookup(name: &str, ctx: &ContextHashMap, assignment: &HashMap<String, f64>) -> anyhow::Result<f64>
    {
        if let Some(v) = assignment.get(name)
        {
            return Ok(*v);
        }
        match ctx.get(name)
        {
            Some(Token::Num(n)) => Ok(*n),
            Some(Token::Var(v)) => Ok(v.borrow().as_f64()),
            _ => Err(EvalError::UnknownSymbol(name.to_owned()).into()),
        }
    }

    /// Evaluates the expression. Variable lookups consult `assignment`
    /// first, then fall back to constants and declared unknowns in `ctx`.
    pub fn eval(&self, ctx: &ContextHashMap, assignment: &HashMap<String, f64>) -> anyhow::Result<f64>
    {
        match self
        {
            Expression::Literal(n) => Ok(*n),
            Expression::Variable(name) => Self::lookup(name, ctx, assignment),
            Expression::UnaryMinus(e) => Ok(-e.eval(ctx, assignment)?),
            Expression::BinaryOp(op, l, r) =>
            {
                let (a, b) = (l.eval(ctx, assignment)?, r.eval(ctx, assignment)?);
                Ok(match op
                {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => a / b,
                    BinOp::Pow =>
                    {
                        if a == 0.0 && b == 0.0 { 1.0 } else { a.powf(b) }
                    }
                })
            }
            Expression::BuiltinCall(name, args) =>
            {
                let values: Vec<f64> = args.iter()
                    .map(|a| a.eval(ctx, assignment))
                    .collect::<anyhow::Result<_>>()?;

                match ctx.get(name)
                {
                    Some(Token::Unary(f)) =>
                    {
                        if values.len() != 1
                        {
                            return Err(EvalError::ArityMismatch(name.clone(), "1".to_owned(), values.len()).into());
                        }
                        Ok(f(values[0]))
                    }
                    Some(Token::Nary(arity, f)) =>
                    {
                        if let Some(n) = arity
                        {
                            if values.len() != *n
                            {
                                return Err(EvalError::ArityMismatch(name.clone(), n.to_string(), values.len()).into());
                            }
                        }
                        f(&values)
                    }
                    _ => Err(EvalError::UnknownSymbol(name.clone()).into()),
                }
            }
        }
    }

    /// Returns the analytic partial derivative of this expression with
    /// respect to `var`, as a new `Expression`.
    ///
    /// `if`'s derivative is piecewise: the comparison is evaluated against
    /// `ctx`/`assignment` *now*, and the derivative of whichever branch is
    /// currently selected is returned.
    pub fn differentiate(&self, var: &str, ctx: &ContextHashMap, assignment: &HashMap<String, f64>) -> anyhow::Result<Expression>
    {
        use Expression::*;
        match self
        {
            Literal(_) => Ok(Literal(0.0)),
            Variable(name) => Ok(Literal(if name == var { 1.0 } else { 0.0 })),
            UnaryMinus(e) => Ok(UnaryMinus(Box::new(e.differentiate(var, ctx, assignment)?))),
            BinaryOp(BinOp::Add, l, r) => Ok(BinaryOp(BinOp::Add, Box::new(l.differentiate(var, ctx, assignment)?), Box::new(r.differentiate(var, ctx, assignment)?))),
            BinaryOp(BinOp::Sub, l, r) => Ok(BinaryOp(BinOp::Sub, Box::new(l.differentiate(var, ctx, assignment)?), Box::new(r.differentiate(var, ctx, assignment)?))),
            BinaryOp(BinOp::Mul, l, r) =>
            {
                // (l*r)' = l'*r + l*r'
                let lp = l.differentiate(var, ctx, assignment)?;
                let rp = r.differentiate(var, ctx, assignment)?;
                Ok(BinaryOp(BinOp::Add,
                    Box::new(BinaryOp(BinOp::Mul, Box::new(lp), r.clone())),
                    Box::new(BinaryOp(BinOp::Mul, l.clone(), Box::new(rp)))))
            }
            BinaryOp(BinOp::Div, l, r) =>
            {
                // (l/r)' = (l'*r - l*r') / r^2
                let lp = l.differentiate(var, ctx, assignment)?;
                let rp = r.differentiate(var, ctx, assignment)?;
                let numerator = BinaryOp(BinOp::Sub,
                    Box::new(BinaryOp(BinOp::Mul, Box::new(lp), r.clone())),
                    Box::new(BinaryOp(BinOp::Mul, l.clone(), Box::new(rp))));
                let denominator = BinaryOp(BinOp::Pow, r.clone(), Box::new(Literal(2.0)));
                Ok(BinaryOp(BinOp::Div, Box::new(numerator), Box::new(denominator)))
            }
            BinaryOp(BinOp::Pow, base, exp) =>
            {
                // Only constant-exponent power rule is supported analytically;
                // this covers every use this DSL makes of '^'.
                if let Literal(n) = exp.as_ref()
                {
                    let base_p = base.differentiate(var, ctx, assignment)?;
                    let reduced = BinaryOp(BinOp::Pow, base.clone(), Box::new(Literal(n - 1.0)));
                    let coefficient = BinaryOp(BinOp::Mul, Box::new(Literal(*n)), Box::new(reduced));
                    Ok(BinaryOp(BinOp::Mul, Box::new(coefficient), Box::new(base_p)))
                }
                else
                {
                    Err(NonDifferentiable("^ with non-constant exponent".to_owned()).into())
                }
            }
            BuiltinCall(name, args) => differentiate_builtin(name, args, var, ctx, assignment),
        }
    }
}

fn differentiate_builtin(name: &str, args: &[Expression], var: &str, ctx: &ContextHashMap, assignment: &HashMap<String, f64>) -> anyhow::Result<Expression>
{
    use Expression::*;

    if name == "if"
    {
        if args.len() != 5
        {
            return Err(EvalError::ArityMismatch("if".to_owned(), "5".to_owned(), args.len()).into());
        }
        let cond_lhs = args[0].eval(ctx, assignment)?;
        let op_code = args[1].eval(ctx, assignment)?;
        let cond_rhs = args[2].eval(ctx, assignment)?;
        return if op_code_holds(op_code, cond_lhs, cond_rhs)
        {
            args[3].differentiate(var, ctx, assignment)
        }
        else
        {
            args[4].differentiate(var, ctx, assignment)
        };
    }

    if args.len() != 1
    {
        return Err(NonDifferentiable(name.to_owned()).into());
    }
    let u = &args[0];
    let up = u.differentiate(var, ctx, assignment)?;

    let chain = |outer: Expression| -> Expression
    {
        BinaryOp(BinOp::Mul, Box::new(outer), Box::new(up.clone()))
    };

    let outer_derivative = match name
    {
        "sin" => BuiltinCall("cos".to_owned(), vec![u.clone()]),
        "cos" => UnaryMinus(Box::new(BuiltinCall("sin".to_owned(), vec![u.clone()]))),
        "tan" =>
        {
            let cos_u = BuiltinCall("cos".to_owned(), vec![u.clone()]);
            BinaryOp(BinOp::Div, Box::new(Literal(1.0)), Box::new(BinaryOp(BinOp::Pow, Box::new(cos_u), Box::new(Literal(2.0)))))
        }
        "sinh" => BuiltinCall("cosh".to_owned(), vec![u.clone()]),
        "cosh" => BuiltinCall("sinh".to_owned(), vec![u.clone()]),
        "tanh" =>
        {
            let tanh_u = BuiltinCall("tanh".to_owned(), vec![u.clone()]);
            BinaryOp(BinOp::Sub, Box::new(Literal(1.0)), Box::new(BinaryOp(BinOp::Pow, Box::new(tanh_u), Box::new(Literal(2.0)))))
        }
        "asin" =>
        {
            let denom = BuiltinCall("sqrt".to_owned(), vec![BinaryOp(BinOp::Sub, Box::new(Literal(1.0)), Box::new(BinaryOp(BinOp::Pow, Box::new(u.clone()), Box::new(Literal(2.0)))))]);
            BinaryOp(BinOp::Div, Box::new(Literal(1.0)), Box::new(denom))
        }
        "acos" =>
        {
            let denom = BuiltinCall("sqrt".to_owned(), vec![BinaryOp(BinOp::Sub, Box::new(Literal(1.0)), Box::new(BinaryOp(BinOp::Pow, Box::new(u.clone()), Box::new(Literal(2.0)))))]);
            UnaryMinus(Box::new(BinaryOp(BinOp::Div, Box::new(Literal(1.0)), Box::new(denom))))
        }
        "atan" =>
        {
            let denom = BinaryOp(BinOp::Add, Box::new(Literal(1.0)), Box::new(BinaryOp(BinOp::Pow, Box::new(u.clone()), Box::new(Literal(2.0)))));
            BinaryOp(BinOp::Div, Box::new(Literal(1.0)), Box::new(denom))
        }
        "ln" => BinaryOp(BinOp::Div, Box::new(Literal(1.0)), Box::new(u.clone())),
        "log" =>
        {
            let ln10 = Literal(std::f64::consts::LN_10);
            BinaryOp(BinOp::Div, Box::new(Literal(1.0)), Box::new(BinaryOp(BinOp::Mul, Box::new(u.clone()), Box::new(ln10))))
        }
        "exp" => BuiltinCall("exp".to_owned(), vec![u.clone()]),
        "sqrt" =>
        {
            let denom = BinaryOp(BinOp::Mul, Box::new(Literal(2.0)), Box::new(BuiltinCall("sqrt".to_owned(), vec![u.clone()])));
            BinaryOp(BinOp::Div, Box::new(Literal(1.0)), Box::new(denom))
        }
        "abs" =>
        {
            // d/dx |u| = u / |u|, undefined at u=0 but that's a measure-zero
            // case Newton-Raphson will simply step away from.
            BinaryOp(BinOp::Div, Box::new(u.clone()), Box::new(BuiltinCall("abs".to_owned(), vec![u.clone()])))
        }
        other => return Err(NonDifferentiable(other.to_owned()).into()),
    };

    Ok(chain(outer_derivative))
}
