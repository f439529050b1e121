use thiserror::Error;

/// Errors raised by out-of-range or malformed operations on a `Matrix`.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum MatrixError
{
    #[error("matrix index ({0}, {1}) is out of range for a {2}x{3} matrix")]
    IndexOutOfRange(usize, usize, usize, usize),

    #[error("cannot multiply a {0}x{1} matrix by a {2}x{3} matrix")]
    DimensionMismatch(usize, usize, usize, usize),

    #[error("cannot augment a {0}-row matrix with a {1}-row matrix")]
    AugmentRowMismatch(usize, usize),

    #[error("requested subset [{0}, {1}] to [{2}, {3}] is not a valid range")]
    InvalidSubsetRange(usize, usize, usize, usize),

    #[error("operation is only defined for square matrices, got {0}x{1}")]
    NonSquare(usize, usize),
}

/// Errors specific to in-place matrix inversion via Gauss-Jordan elimination.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum MatrixInversionError
{
    #[error("matrix is not square and cannot be inverted")]
    NotSquare,

    #[error("matrix is singular: no pivot could be found above the tolerance")]
    SingularValueWasZero,

    #[error("a zero appeared on the diagonal during inversion and could not be cleared")]
    ZeroDuringInversion,
}
