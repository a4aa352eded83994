//! The MOBO loop.
//!
//! [`Mobo`] wires a real [`Problem`] to a surrogate, an acquisition, an
//! inner solver and a batch selection. [`Mobo::solve`] seeds the dataset and
//! returns a [`MoboRun`], a lazy iterator that performs one optimization
//! iteration per call to `next()` and yields the proposed [`Batch`].
//!
//! ```
//! use mobo::framework::Mobo;
//! use mobo::problems::{Zdt, ZdtKind, generate_initial_samples};
//! use mobo::solver::Nsga2Solver;
//!
//! let problem = Zdt::new(ZdtKind::Zdt1, 3).unwrap();
//! let init = generate_initial_samples(&problem, 8, Some(1)).unwrap();
//!
//! let mobo = Mobo::builder(problem)
//!     .n_iter(2)
//!     .batch_size(2)
//!     .solver(Nsga2Solver::builder().population_size(20).n_generations(3).seed(1).build())
//!     .seed(1)
//!     .build()
//!     .unwrap();
//!
//! let mut run = mobo.solve(init.x, init.y, None).unwrap();
//! for batch in run.by_ref() {
//!     let batch = batch.unwrap();
//!     assert!(batch.x_next.len() <= 2);
//! }
//! assert_eq!(run.hypervolume_history().len(), 3);
//! ```

mod algorithm;
mod builder;
mod run;

pub use algorithm::Algorithm;
pub use builder::MoboBuilder;
pub use run::{Batch, BatchSource, MoboRun, PhaseTimings};

use core::fmt;

use crate::acquisition::Acquisition;
use crate::error::{Error, Result};
use crate::problem::Problem;
use crate::problems::ReplayTable;
use crate::reference::ReferencePoint;
use crate::selection::Selection;
use crate::solver::Solver;
use crate::surrogate::{FitPolicy, Surrogate};
use crate::transformation::Transformation;

/// Where the objective values of a proposed batch come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OutcomeSource {
    /// Call [`Problem::evaluate`] on the batch.
    #[default]
    Evaluate,
    /// Use the surrogate's prediction, for live experiments whose real
    /// measurements arrive outside the loop.
    Predict,
}

/// Lifecycle of a seeded optimization run.
///
/// The unseeded stage is the [`Mobo`] value itself: [`Mobo::solve`] consumes
/// it and returns a [`MoboRun`] in [`RunState::Ready`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RunState {
    /// Seeded; no iteration has run.
    Ready,
    /// This many iterations have completed.
    Iterating(usize),
    /// The budget is spent or an iteration failed.
    Done,
}

/// Serializable description of a run's configuration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoboConfig {
    /// Name of the real problem.
    pub problem: String,
    /// Preset the default collaborators were taken from.
    pub algorithm: Algorithm,
    /// Surrogate name.
    pub surrogate: String,
    /// Acquisition name.
    pub acquisition: String,
    /// Solver name.
    pub solver: String,
    /// Selection name.
    pub selection: String,
    /// Iteration budget.
    pub n_iter: usize,
    /// Rows proposed per iteration.
    pub batch_size: usize,
    /// Reference point source.
    pub reference_point: ReferencePoint,
    /// Outcome source for solver-driven batches.
    pub outcome: OutcomeSource,
    /// Rows in the replay table, if one is configured.
    pub replay_rows: Option<usize>,
    /// Surrogate retry policy.
    pub fit_policy: FitPolicy,
    /// Seed handed to the default stochastic collaborators.
    pub seed: Option<u64>,
}

impl fmt::Display for MoboConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MOBO framework")?;
        writeln!(f, "  problem:     {}", self.problem)?;
        writeln!(f, "  algorithm:   {}", self.algorithm)?;
        writeln!(f, "  surrogate:   {}", self.surrogate)?;
        writeln!(f, "  acquisition: {}", self.acquisition)?;
        writeln!(f, "  solver:      {}", self.solver)?;
        writeln!(f, "  selection:   {}", self.selection)?;
        write!(f, "  budget:      {} x {}", self.n_iter, self.batch_size)?;
        if let Some(rows) = self.replay_rows {
            write!(f, "\n  replay:      {rows} rows")?;
        }
        Ok(())
    }
}

/// A configured optimizer, ready to be seeded with data.
pub struct Mobo {
    config: MoboConfig,
    problem: Box<dyn Problem>,
    surrogate: Box<dyn Surrogate>,
    acquisition: Box<dyn Acquisition>,
    solver: Box<dyn Solver>,
    selection: Box<dyn Selection>,
    transformation: Transformation,
    replay: Option<ReplayTable>,
}

impl Mobo {
    /// Start configuring a run on `problem`.
    #[must_use]
    pub fn builder(problem: impl Problem + 'static) -> MoboBuilder {
        MoboBuilder::new(Box::new(problem))
    }

    /// The run configuration.
    #[must_use]
    pub fn config(&self) -> &MoboConfig {
        &self.config
    }

    /// The real problem.
    #[must_use]
    pub fn problem(&self) -> &dyn Problem {
        self.problem.as_ref()
    }

    /// Seed the run with initial data and return the lazy iteration.
    ///
    /// The reference point is resolved here and handed to the solver and
    /// the selection. No surrogate, acquisition, solver or selection work
    /// happens until the returned [`MoboRun`] is advanced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyDataset`] without initial rows,
    /// [`Error::DimensionMismatch`] or [`Error::RowCountMismatch`] for
    /// malformed data, and reference point errors from
    /// [`ReferencePoint::resolve`].
    pub fn solve(
        self,
        x_init: Vec<Vec<f64>>,
        y_init: Vec<Vec<f64>>,
        rho_init: Option<Vec<Vec<f64>>>,
    ) -> Result<MoboRun> {
        if x_init.is_empty() {
            return Err(Error::EmptyDataset);
        }
        Error::check_columns("X", self.problem.n_var(), &x_init)?;
        Error::check_columns("Y", self.problem.n_obj(), &y_init)?;

        let reference_point = self
            .config
            .reference_point
            .resolve(&y_init, self.problem.n_obj())?;
        trace_info!(?reference_point, "reference point resolved");
        self.solver.set_ref_point(&reference_point);
        self.selection.set_ref_point(&reference_point);

        MoboRun::new(self, x_init, y_init, rho_init, &reference_point)
    }

    /// Seed the run with the first `n_init` rows of the replay table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoReplayTable`] if no table is configured, otherwise
    /// the errors of [`Mobo::solve`].
    pub fn solve_recorded(self, n_init: usize) -> Result<MoboRun> {
        let rows = self
            .replay
            .as_ref()
            .ok_or(Error::NoReplayTable)?
            .initial(n_init);
        self.solve(rows.x, rows.y, rows.rho)
    }
}

impl fmt::Display for Mobo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.config, f)
    }
}
