use thiserror::Error;

/// Errors raised by the outer solver pipeline, distinct from the
/// per-equation errors that `geqslib` raises (those are recovered locally
/// per `spec.md` §7 and never escape `solve`/`solve_with`).
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PipelineError
{
    /// The equation pool stalled with equations left over that no
    /// single-unknown solve or subsystem build could discharge.
    #[error("pipeline stalled with {} equation(s) left unsolved: {stuck:?}", stuck.len())]
    Underconstrained
    {
        stuck: Vec<String>,
    },
}

/// Errors raised while running the preprocessor pipeline over raw text.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PreprocessorError
{
    /// An `UntilStable` preprocessor did not reach a fixed point within the
    /// iteration safety cap.
    #[error("preprocessor did not converge to a fixed point within {0} passes")]
    PreprocessorDiverged(usize),
}
