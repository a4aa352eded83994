//! Deterministic collaborators that record how often they are called.

use std::sync::Arc;

use parking_lot::Mutex;

use mobo::acquisition::{Acquisition, AcquisitionValue};
use mobo::dataset::Status;
use mobo::problem::Problem;
use mobo::selection::{Selection, SelectionInfo};
use mobo::solver::{CandidateSet, Solver};
use mobo::surrogate::{FitFailure, FitStrategy, PredictOptions, Prediction, Surrogate};
use mobo::surrogate_problem::SurrogateProblem;
use mobo::transformation::Transformation;
use mobo::{Error, Result};

/// Call counts shared between a test and the collaborators it moved into
/// the loop.
#[derive(Debug, Default)]
pub(crate) struct Calls {
    pub(crate) fit_attempts: usize,
    pub(crate) acquisition_fits: usize,
    pub(crate) solves: usize,
    pub(crate) selection_fits: usize,
    pub(crate) selects: usize,
    pub(crate) ref_points: Vec<Vec<f64>>,
}

pub(crate) type CallLog = Arc<Mutex<Calls>>;

pub(crate) fn call_log() -> CallLog {
    Arc::default()
}

/// The three normalized designs [`FixedSolver`] always proposes.
pub(crate) fn fixed_candidates() -> Vec<Vec<f64>> {
    vec![vec![0.0, 0.0], vec![0.5, 0.0], vec![1.0, 0.0]]
}

// ---------------------------------------------------------------------------
// Surrogate
// ---------------------------------------------------------------------------

/// Predicts `(x0, 1 - x0)` in normalized space with a constant spread.
pub(crate) struct LinearSurrogate {
    log: CallLog,
    fits_left: Mutex<usize>,
    fitted: Mutex<bool>,
    noise: Option<f64>,
}

impl LinearSurrogate {
    pub(crate) fn new(log: &CallLog) -> Self {
        Self::failing_after(log, usize::MAX)
    }

    /// Succeeds on the first `n` fit attempts and fails on every later one.
    pub(crate) fn failing_after(log: &CallLog, n: usize) -> Self {
        Self {
            log: Arc::clone(log),
            fits_left: Mutex::new(n),
            fitted: Mutex::new(false),
            noise: None,
        }
    }

    /// Also predict a constant noise level.
    pub(crate) fn with_noise(mut self, rho: f64) -> Self {
        self.noise = Some(rho);
        self
    }
}

impl Surrogate for LinearSurrogate {
    fn name(&self) -> &str {
        "linear"
    }

    fn fit(
        &self,
        _x: &[Vec<f64>],
        _y: &[Vec<f64>],
        _rho: Option<&[Vec<f64>]>,
        _strategy: FitStrategy,
    ) -> core::result::Result<(), FitFailure> {
        self.log.lock().fit_attempts += 1;
        let mut left = self.fits_left.lock();
        if *left == 0 {
            return Err(FitFailure::new("singular kernel matrix"));
        }
        *left -= 1;
        *self.fitted.lock() = true;
        Ok(())
    }

    fn is_fitted(&self) -> bool {
        *self.fitted.lock()
    }

    fn evaluate(&self, x: &[Vec<f64>], options: PredictOptions) -> Result<Prediction> {
        if !self.is_fitted() {
            return Err(Error::NotFitted("linear surrogate"));
        }
        let constant = |v: f64| Some(vec![vec![v, v]; x.len()]);
        Ok(Prediction {
            f: x.iter().map(|row| vec![row[0], 1.0 - row[0]]).collect(),
            s: if options.std { constant(0.1) } else { None },
            rho_f: if options.noise {
                self.noise.and_then(constant)
            } else {
                None
            },
            ..Prediction::default()
        })
    }
}

// ---------------------------------------------------------------------------
// Acquisition
// ---------------------------------------------------------------------------

/// Scores a prediction by its mean.
pub(crate) struct MeanAcquisition {
    log: CallLog,
}

impl MeanAcquisition {
    pub(crate) fn new(log: &CallLog) -> Self {
        Self {
            log: Arc::clone(log),
        }
    }
}

impl Acquisition for MeanAcquisition {
    fn name(&self) -> &str {
        "mean"
    }

    fn fit(&self, _x: &[Vec<f64>], _y: &[Vec<f64>]) -> Result<()> {
        self.log.lock().acquisition_fits += 1;
        Ok(())
    }

    fn requirements(&self) -> PredictOptions {
        PredictOptions::mean()
    }

    fn evaluate(&self, prediction: &Prediction) -> Result<AcquisitionValue> {
        Ok(AcquisitionValue {
            value: prediction.f.clone(),
            ..AcquisitionValue::default()
        })
    }
}

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

/// Always returns [`fixed_candidates`], scored by the surrogate problem.
pub(crate) struct FixedSolver {
    log: CallLog,
    last: Mutex<Option<CandidateSet>>,
}

impl FixedSolver {
    pub(crate) fn new(log: &CallLog) -> Self {
        Self {
            log: Arc::clone(log),
            last: Mutex::new(None),
        }
    }
}

impl Solver for FixedSolver {
    fn name(&self) -> &str {
        "fixed"
    }

    fn set_ref_point(&self, ref_point: &[f64]) {
        self.log.lock().ref_points.push(ref_point.to_vec());
    }

    fn solve(
        &self,
        problem: &SurrogateProblem<'_>,
        _x: &[Vec<f64>],
        _y: &[Vec<f64>],
        _rho: Option<&[Vec<f64>]>,
    ) -> Result<CandidateSet> {
        self.log.lock().solves += 1;
        let x = fixed_candidates();
        let y = problem.evaluate(&x)?.f;
        let set = CandidateSet { x, y };
        *self.last.lock() = Some(set.clone());
        Ok(set)
    }

    fn last_solution(&self) -> Option<CandidateSet> {
        self.last.lock().clone()
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Takes candidates in the order the solver returned them.
pub(crate) struct TakeFirst {
    log: CallLog,
}

impl TakeFirst {
    pub(crate) fn new(log: &CallLog) -> Self {
        Self {
            log: Arc::clone(log),
        }
    }
}

impl Selection for TakeFirst {
    fn name(&self) -> &str {
        "take-first"
    }

    fn set_ref_point(&self, ref_point: &[f64]) {
        self.log.lock().ref_points.push(ref_point.to_vec());
    }

    fn fit(&self, _x: &[Vec<f64>], _y: &[Vec<f64>]) -> Result<()> {
        self.log.lock().selection_fits += 1;
        Ok(())
    }

    fn select(
        &self,
        candidates: &CandidateSet,
        batch_size: usize,
        _surrogate: &dyn Surrogate,
        _status: &Status,
        transformation: &Transformation,
    ) -> Result<(Vec<Vec<f64>>, SelectionInfo)> {
        self.log.lock().selects += 1;
        let n = batch_size.min(candidates.len());
        let raw = transformation.undo_x(&candidates.x[..n])?;
        Ok((
            raw,
            SelectionInfo {
                indices: (0..n).collect(),
                improvements: Vec::new(),
            },
        ))
    }
}

/// A builder on `problem` wired to the stubs above.
pub(crate) fn stubbed(problem: impl Problem + 'static, log: &CallLog) -> mobo::MoboBuilder {
    mobo::Mobo::builder(problem)
        .surrogate(LinearSurrogate::new(log))
        .acquisition(MeanAcquisition::new(log))
        .solver(FixedSolver::new(log))
        .selection(TakeFirst::new(log))
}
