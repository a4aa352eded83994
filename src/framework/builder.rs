use crate::acquisition::{Acquisition, IdentityAcquisition, LcbAcquisition};
use crate::error::{Error, Result};
use crate::problem::Problem;
use crate::problems::ReplayTable;
use crate::reference::ReferencePoint;
use crate::selection::{HypervolumeImprovementSelection, RandomSelection, Selection};
use crate::solver::{Nsga2Solver, Solver};
use crate::surrogate::{FitPolicy, GpSurrogate, Surrogate};
use crate::transformation::Transformation;

use super::{Algorithm, Mobo, MoboConfig, OutcomeSource};

/// Default iteration budget.
const DEFAULT_N_ITER: usize = 20;
/// Default rows proposed per iteration.
const DEFAULT_BATCH_SIZE: usize = 6;

/// A builder for constructing [`Mobo`] instances with a fluent API.
///
/// Created via [`Mobo::builder()`].
///
/// # Defaults
///
/// - `n_iter`: 20
/// - `batch_size`: 6
/// - Reference point: inferred from the initial data with a 10 % margin
/// - Outcome: [`OutcomeSource::Evaluate`]
/// - Fit policy: 5 primary attempts, 1 fallback
/// - Algorithm: [`Algorithm::HvMean`], so a [`GpSurrogate`], the identity
///   acquisition, an [`Nsga2Solver`] and greedy hypervolume selection
/// - Transformation: bounded by the problem's box for X, standardized Y
///
/// Collaborators set explicitly take precedence over the algorithm preset.
///
/// # Examples
///
/// ```
/// use mobo::framework::{Algorithm, Mobo};
/// use mobo::problems::Vlmop2;
/// use mobo::reference::ReferencePoint;
///
/// let mobo = Mobo::builder(Vlmop2::new(2).unwrap())
///     .n_iter(5)
///     .batch_size(3)
///     .algorithm(Algorithm::HvLcb)
///     .reference_point(ReferencePoint::Fixed(vec![1.1, 1.1]))
///     .build()
///     .unwrap();
///
/// assert_eq!(mobo.config().acquisition, "lcb");
/// ```
pub struct MoboBuilder {
    problem: Box<dyn Problem>,
    n_iter: usize,
    batch_size: usize,
    reference_point: ReferencePoint,
    outcome: OutcomeSource,
    replay: Option<ReplayTable>,
    fit_policy: FitPolicy,
    algorithm: Algorithm,
    surrogate: Option<Box<dyn Surrogate>>,
    acquisition: Option<Box<dyn Acquisition>>,
    solver: Option<Box<dyn Solver>>,
    selection: Option<Box<dyn Selection>>,
    transformation: Option<Transformation>,
    seed: Option<u64>,
}

impl MoboBuilder {
    pub(super) fn new(problem: Box<dyn Problem>) -> Self {
        Self {
            problem,
            n_iter: DEFAULT_N_ITER,
            batch_size: DEFAULT_BATCH_SIZE,
            reference_point: ReferencePoint::default(),
            outcome: OutcomeSource::default(),
            replay: None,
            fit_policy: FitPolicy::default(),
            algorithm: Algorithm::default(),
            surrogate: None,
            acquisition: None,
            solver: None,
            selection: None,
            transformation: None,
            seed: None,
        }
    }

    /// Set the number of iterations.
    #[must_use]
    pub fn n_iter(mut self, n_iter: usize) -> Self {
        self.n_iter = n_iter;
        self
    }

    /// Set the number of rows proposed per iteration. Must be at least 1.
    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set how the hypervolume reference point is obtained.
    #[must_use]
    pub fn reference_point(mut self, reference_point: ReferencePoint) -> Self {
        self.reference_point = reference_point;
        self
    }

    /// Set where solver-driven batches get their objective values.
    #[must_use]
    pub fn outcome(mut self, outcome: OutcomeSource) -> Self {
        self.outcome = outcome;
        self
    }

    /// Replay recorded rows before switching to solver-driven proposals.
    ///
    /// While the table has rows past the current sample count, each
    /// iteration takes its batch from the table instead of the solver.
    #[must_use]
    pub fn replay(mut self, table: ReplayTable) -> Self {
        self.replay = Some(table);
        self
    }

    /// Set the surrogate retry policy. [`build`](Self::build) rejects a
    /// policy without fallback attempts.
    #[must_use]
    pub fn fit_policy(mut self, policy: FitPolicy) -> Self {
        self.fit_policy = policy;
        self
    }

    /// Choose the preset for collaborators that are not set explicitly.
    #[must_use]
    pub fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the surrogate model.
    #[must_use]
    pub fn surrogate(mut self, surrogate: impl Surrogate + 'static) -> Self {
        self.surrogate = Some(Box::new(surrogate));
        self
    }

    /// Set the acquisition function.
    #[must_use]
    pub fn acquisition(mut self, acquisition: impl Acquisition + 'static) -> Self {
        self.acquisition = Some(Box::new(acquisition));
        self
    }

    /// Set the inner solver.
    #[must_use]
    pub fn solver(mut self, solver: impl Solver + 'static) -> Self {
        self.solver = Some(Box::new(solver));
        self
    }

    /// Set the batch selection.
    #[must_use]
    pub fn selection(mut self, selection: impl Selection + 'static) -> Self {
        self.selection = Some(Box::new(selection));
        self
    }

    /// Set the data transformation.
    #[must_use]
    pub fn transformation(mut self, transformation: Transformation) -> Self {
        self.transformation = Some(transformation);
        self
    }

    /// Seed the default solver and selection.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate the configuration and build the [`Mobo`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBatchSize`] for a zero batch size,
    /// [`Error::InvalidFitPolicy`] for a fit policy without fallback attempts,
    /// and [`Error::DimensionMismatch`] if a fixed reference point or the
    /// replay table does not match the problem's dimensions.
    pub fn build(self) -> Result<Mobo> {
        if self.batch_size == 0 {
            return Err(Error::InvalidBatchSize);
        }
        self.fit_policy.validate()?;
        let n_obj = self.problem.n_obj();
        if let ReferencePoint::Fixed(point) = &self.reference_point {
            Error::check_columns("reference point", n_obj, core::slice::from_ref(point))?;
        }
        if let Some(table) = &self.replay {
            Error::check_columns("replay X", self.problem.n_var(), table.x())?;
            Error::check_columns("replay Y", n_obj, table.y())?;
        }

        let algorithm = self.algorithm;
        let surrogate = self
            .surrogate
            .unwrap_or_else(|| Box::new(GpSurrogate::new()));
        let acquisition: Box<dyn Acquisition> = match (self.acquisition, algorithm) {
            (Some(acquisition), _) => acquisition,
            (None, Algorithm::HvLcb) => Box::new(LcbAcquisition::new()),
            (None, Algorithm::HvMean | Algorithm::RandomMean) => Box::new(IdentityAcquisition::new()),
        };
        let solver = self.solver.unwrap_or_else(|| {
            Box::new(self.seed.map_or_else(Nsga2Solver::new, Nsga2Solver::with_seed))
        });
        let selection_seed = self.seed.map(|s| s.wrapping_add(1));
        let selection: Box<dyn Selection> = match (self.selection, algorithm) {
            (Some(selection), _) => selection,
            (None, Algorithm::HvLcb | Algorithm::HvMean) => Box::new(selection_seed.map_or_else(
                HypervolumeImprovementSelection::new,
                HypervolumeImprovementSelection::with_seed,
            )),
            (None, Algorithm::RandomMean) => Box::new(
                selection_seed.map_or_else(RandomSelection::new, RandomSelection::with_seed),
            ),
        };
        let bounds = self.problem.bounds();
        let transformation = self
            .transformation
            .unwrap_or_else(|| Transformation::standard(bounds.xl.clone(), bounds.xu.clone()));

        let config = MoboConfig {
            problem: self.problem.name().to_string(),
            algorithm,
            surrogate: surrogate.name().to_string(),
            acquisition: acquisition.name().to_string(),
            solver: solver.name().to_string(),
            selection: selection.name().to_string(),
            n_iter: self.n_iter,
            batch_size: self.batch_size,
            reference_point: self.reference_point,
            outcome: self.outcome,
            replay_rows: self.replay.as_ref().map(ReplayTable::len),
            fit_policy: self.fit_policy,
            seed: self.seed,
        };
        trace_debug!(
            algorithm = %config.algorithm,
            n_iter = config.n_iter,
            batch_size = config.batch_size,
            "mobo configured"
        );

        Ok(Mobo {
            config,
            problem: self.problem,
            surrogate,
            acquisition,
            solver,
            selection,
            transformation,
            replay: self.replay,
        })
    }
}
