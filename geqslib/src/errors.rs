use thiserror::Error;

/// Errors raised while tokenizing or parsing an expression or equation.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ExpressionError
{
    #[error("unexpected character '{0}' at position {1}")]
    UnexpectedCharacter(char, usize),

    #[error("unexpected end of input while parsing an expression")]
    UnexpectedEndOfInput,

    #[error("expected '{0}' at position {1}")]
    ExpectedToken(char, usize),

    #[error("equation must contain exactly one '=', found {0}")]
    WrongNumberOfEquals(usize),
}

/// Errors raised while evaluating a parsed expression against a context.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EvalError
{
    #[error("symbol '{0}' is not defined in the given context or assignment")]
    UnknownSymbol(String),

    #[error("'{0}' expects {1} argument(s), got {2}")]
    ArityMismatch(String, String, usize),
}

/// Raised when analytic differentiation is requested for a builtin with no
/// registered derivative rule.
#[derive(Clone, Debug, Error, PartialEq)]
#[error("'{0}' has no registered derivative rule")]
pub struct NonDifferentiable(pub String);

/// Errors specific to the bounded Newton-Raphson solvers.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum NewtonRaphsonSolverError
{
    #[error("margin of error must be a positive number")]
    NegativeMargin,

    #[error("reached iteration limit before converging")]
    ReachedIterationLimit,

    #[error("derivative vanished (|f'| below threshold) during solve")]
    DerivativeVanished,

    #[error("jacobian was singular during multivariate solve")]
    SingularJacobian,

    #[error("number of equations does not match number of unknowns")]
    ImproperlyConstrainedSystem,
}

/// Errors specific to building a constrained system of equations.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SystemBuilderError
{
    #[error("equation would over-constrain the system")]
    WillOverconstrain,

    #[error("system is not fully constrained and cannot be built")]
    NotFullyConstrained,
}
