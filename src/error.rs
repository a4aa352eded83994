/// Errors raised by the optimization loop and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when a lower bound is greater than the matching upper bound.
    #[error("invalid bounds for variable {index}: low ({low}) must be less than or equal to high ({high})")]
    InvalidBounds {
        /// The variable index.
        index: usize,
        /// The lower bound value.
        low: f64,
        /// The upper bound value.
        high: f64,
    },

    /// Returned when a row or vector has the wrong number of columns.
    #[error("dimension mismatch in {what}: expected {expected} columns, got {got}")]
    DimensionMismatch {
        /// Which matrix or vector was malformed.
        what: &'static str,
        /// The expected number of columns.
        expected: usize,
        /// The actual number of columns.
        got: usize,
    },

    /// Returned when paired matrices do not have the same number of rows.
    #[error("row count mismatch: {what} has {got} rows, expected {expected}")]
    RowCountMismatch {
        /// Which matrix was malformed.
        what: &'static str,
        /// The expected number of rows.
        expected: usize,
        /// The actual number of rows.
        got: usize,
    },

    /// Returned when the dataset tracks per-point uncertainty but a batch
    /// arrives without it.
    #[error("dataset tracks rho but the appended batch has none")]
    MissingRho,

    /// Returned when an operation needs at least one observation.
    #[error("no observations available")]
    EmptyDataset,

    /// Returned when the batch size is zero.
    #[error("invalid batch size: must be at least 1")]
    InvalidBatchSize,

    /// Returned when the surrogate fit policy cannot recover from a failed fit.
    #[error("invalid fit policy: {0}")]
    InvalidFitPolicy(String),

    /// Returned when a supplied reference point is unusable.
    #[error("invalid reference point: {0}")]
    InvalidReferencePoint(String),

    /// Returned when a problem name is not in the registry.
    #[error("unsupported problem: '{0}'")]
    UnsupportedProblem(String),

    /// Returned when a true Pareto front is required but the problem has none.
    #[error("no true Pareto front defined for problem '{0}'")]
    MissingParetoFront(String),

    /// Returned when an algorithm preset name is unknown.
    #[error("unknown algorithm: '{0}'")]
    UnknownAlgorithm(String),

    /// Returned when a component is used before it was fitted.
    #[error("{0} used before fit")]
    NotFitted(&'static str),

    /// Returned when every surrogate fitting attempt failed and no earlier
    /// model is available to fall back on.
    #[error("no usable surrogate model: {0}")]
    NoUsableModel(String),

    /// Returned when a recorded problem is asked for a design it has no row for.
    #[error("no recorded evaluation for design {0:?}")]
    UnrecordedDesign(Vec<f64>),

    /// Returned when a replay operation is requested but no table is configured.
    #[error("no replay table configured")]
    NoReplayTable,

    /// Returned when the inner solver produced no candidates.
    #[error("solver returned an empty candidate set")]
    EmptyCandidateSet,

    /// Returned when an internal invariant is violated.
    #[error("internal error: {0}")]
    Internal(&'static str),

    /// Returned when persisting a model fails.
    #[error("storage error: {0}")]
    Storage(String),
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    pub(crate) fn check_columns(what: &'static str, expected: usize, rows: &[Vec<f64>]) -> Result<()> {
        match rows.iter().find(|r| r.len() != expected) {
            Some(row) => Err(Error::DimensionMismatch {
                what,
                expected,
                got: row.len(),
            }),
            None => Ok(()),
        }
    }

    pub(crate) fn check_rows(what: &'static str, expected: usize, got: usize) -> Result<()> {
        if expected == got {
            Ok(())
        } else {
            Err(Error::RowCountMismatch {
                what,
                expected,
                got,
            })
        }
    }
}
