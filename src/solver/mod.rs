//! Inner multi-objective solvers over the surrogate problem.
//!
//! Each iteration the loop hands a [`Solver`] the
//! [`SurrogateProblem`](crate::surrogate_problem::SurrogateProblem) and the
//! normalized dataset. The solver returns a [`CandidateSet`] approximating
//! the Pareto set of the acquisition values; batch selection then picks the
//! designs to evaluate from it.

mod genetic;
pub mod nsga2;

pub use nsga2::{Nsga2Solver, Nsga2SolverBuilder};

use std::path::Path;

use crate::error::Result;
use crate::surrogate_problem::SurrogateProblem;

/// Candidate designs produced by a solver, in normalized space.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CandidateSet {
    /// Normalized designs.
    pub x: Vec<Vec<f64>>,
    /// Acquisition values of `x`.
    pub y: Vec<Vec<f64>>,
}

impl CandidateSet {
    /// Number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Returns `true` if there are no candidates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Finds trade-off designs of a surrogate problem.
pub trait Solver: Send + Sync {
    /// Short identifier used in framework descriptions.
    fn name(&self) -> &str;

    /// Store the run's hypervolume reference point.
    fn set_ref_point(&self, ref_point: &[f64]);

    /// Solve `problem`, starting from the normalized dataset `(x, y, rho)`.
    ///
    /// # Errors
    ///
    /// Propagates surrogate and acquisition errors raised while evaluating
    /// `problem`.
    fn solve(
        &self,
        problem: &SurrogateProblem<'_>,
        x: &[Vec<f64>],
        y: &[Vec<f64>],
        rho: Option<&[Vec<f64>]>,
    ) -> Result<CandidateSet>;

    /// The candidate set of the most recent successful `solve`.
    fn last_solution(&self) -> Option<CandidateSet>;

    /// Persist the solver's learned state to `path`.
    ///
    /// Solvers without state worth keeping write nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`](crate::Error::Storage) if writing fails.
    fn save(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}
