use core::fmt;
use core::iter::FusedIterator;
use core::time::Duration;
use std::path::Path;
use std::time::Instant;

use crate::dataset::{Dataset, Status};
use crate::error::Result;
use crate::problems::TableRows;
use crate::selection::SelectionInfo;
use crate::surrogate::{FitOutcome, Matrix, PredictOptions};
use crate::surrogate_problem::SurrogateProblem;

use super::{Mobo, MoboConfig, OutcomeSource, RunState};

/// Where a batch's designs came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BatchSource {
    /// Rows of the replay table.
    Replay,
    /// Inner solver followed by batch selection.
    Solver,
}

/// Wall-clock time spent in each phase of an iteration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhaseTimings {
    /// Normalization and surrogate fitting.
    pub surrogate_fit: Duration,
    /// Inner solver. Zero for replayed batches.
    pub solve: Duration,
    /// Batch selection. Zero for replayed batches.
    pub select: Duration,
    /// Obtaining the batch's objective values.
    pub evaluate: Duration,
    /// The whole iteration.
    pub total: Duration,
}

/// The result of one iteration.
///
/// All matrices are in raw problem units except `acquisition`, which is in
/// the normalized space the acquisition was fitted in.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Batch {
    /// Zero-based iteration index.
    pub iteration: usize,
    /// Replayed or proposed.
    pub source: BatchSource,
    /// Designs of the batch.
    pub x_next: Matrix,
    /// Objective values folded into the dataset.
    pub y_next: Matrix,
    /// Uncertainty folded into the dataset, when known.
    pub rho_next: Option<Matrix>,
    /// Constraint values reported by the problem, if any.
    pub constraints: Option<Matrix>,
    /// Surrogate mean at `x_next`, predicted before the batch was added.
    pub y_pred_mean: Matrix,
    /// Surrogate standard deviation at `x_next`.
    pub y_pred_std: Option<Matrix>,
    /// Acquisition value at `x_next`.
    pub acquisition: Matrix,
    /// How the selection picked the batch. `None` for replayed batches.
    pub selection: Option<SelectionInfo>,
    /// Result of this iteration's surrogate fit.
    pub fit: FitOutcome,
    /// Hypervolume after the batch was added.
    pub hypervolume: f64,
    /// Dataset size after the batch was added.
    pub sample_num: usize,
    /// Time per phase.
    pub timings: PhaseTimings,
}

/// A seeded optimization run.
///
/// Each call to [`Iterator::next`] performs one full iteration: normalize,
/// fit the surrogate and acquisition, propose a batch (or replay recorded
/// rows), obtain its outcome and update the Pareto status. Nothing is
/// computed ahead of the caller. The iterator ends after `n_iter` batches
/// or right after the first error, and never resumes.
pub struct MoboRun {
    mobo: Mobo,
    dataset: Dataset,
    status: Status,
    state: RunState,
    completed: usize,
    history: Vec<f64>,
}

impl MoboRun {
    pub(super) fn new(
        mobo: Mobo,
        x_init: Vec<Vec<f64>>,
        y_init: Vec<Vec<f64>>,
        rho_init: Option<Vec<Vec<f64>>>,
        reference_point: &[f64],
    ) -> Result<Self> {
        let mut dataset = Dataset::new();
        dataset.append(x_init, y_init, rho_init)?;
        let status = Status::compute(&dataset, reference_point);
        trace_info!(
            sample_num = dataset.sample_num(),
            hypervolume = status.hypervolume,
            front_size = status.pareto_front.len(),
            "initial status"
        );
        Ok(Self {
            history: vec![status.hypervolume],
            mobo,
            dataset,
            status,
            state: RunState::Ready,
            completed: 0,
        })
    }

    /// Pareto status of the current dataset.
    #[must_use]
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// All rows observed so far, initial rows first.
    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Number of rows in the dataset.
    #[must_use]
    pub fn sample_num(&self) -> usize {
        self.dataset.sample_num()
    }

    /// Lifecycle state.
    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Number of iterations completed.
    #[must_use]
    pub fn iteration(&self) -> usize {
        self.completed
    }

    /// The fixed hypervolume reference point of this run.
    #[must_use]
    pub fn reference_point(&self) -> &[f64] {
        &self.status.reference_point
    }

    /// Hypervolume after seeding, then after every completed iteration.
    #[must_use]
    pub fn hypervolume_history(&self) -> &[f64] {
        &self.history
    }

    /// The run configuration.
    #[must_use]
    pub fn config(&self) -> &MoboConfig {
        &self.mobo.config
    }

    /// Ask the solver to persist its learned state.
    ///
    /// # Errors
    ///
    /// Propagates the solver's storage errors.
    pub fn save_model(&self, path: impl AsRef<Path>) -> Result<()> {
        self.mobo.solver.save(path.as_ref())
    }

    #[allow(clippy::too_many_lines)]
    fn step(&mut self, iteration: usize) -> Result<Batch> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("mobo_iteration", iteration).entered();

        let started = Instant::now();
        let mut timings = PhaseTimings::default();
        let Mobo {
            config,
            problem,
            surrogate,
            acquisition,
            solver,
            selection,
            transformation,
            replay,
        } = &mut self.mobo;

        // Normalize and fit.
        transformation.fit(self.dataset.x(), self.dataset.y())?;
        let x = transformation.do_x(self.dataset.x())?;
        let y = transformation.do_y(self.dataset.y())?;
        let rho = self
            .dataset
            .rho()
            .map(|r| transformation.do_rho(r))
            .transpose()?;

        let fit = config
            .fit_policy
            .fit(&**surrogate, &x, &y, rho.as_deref())?;
        timings.surrogate_fit = started.elapsed();
        trace_debug!(elapsed = ?timings.surrogate_fit, "surrogate model fitted");

        acquisition.fit(&x, &y)?;
        let transformation = &*transformation;
        let surrogate_problem = SurrogateProblem::new(
            problem.bounds(),
            problem.n_obj(),
            &**surrogate,
            &**acquisition,
            transformation,
        )?;

        // Propose: replay recorded rows while any remain, otherwise solve.
        let offset = self.dataset.sample_num();
        let recorded = replay
            .as_ref()
            .filter(|table| table.remaining(offset) > 0)
            .map(|table| table.slice(offset, config.batch_size));
        let (source, x_next, recorded, selection_info) = if let Some(rows) = recorded {
            let TableRows { x, y, rho } = rows;
            trace_debug!(offset, rows = x.len(), "replaying recorded rows");
            (BatchSource::Replay, x, Some((y, rho)), None)
        } else {
            let phase = Instant::now();
            let candidates = solver.solve(&surrogate_problem, &x, &y, rho.as_deref())?;
            timings.solve = phase.elapsed();
            trace_debug!(
                elapsed = ?timings.solve,
                candidates = candidates.len(),
                "surrogate problem solved"
            );

            let phase = Instant::now();
            selection.fit(&x, &y)?;
            let (picked, info) = selection.select(
                &candidates,
                config.batch_size,
                &**surrogate,
                &self.status,
                transformation,
            )?;
            timings.select = phase.elapsed();
            trace_debug!(elapsed = ?timings.select, "next sample batch selected");

            let bounds = problem.bounds();
            let x_next: Matrix = picked.iter().map(|row| bounds.clamp(row)).collect();
            (BatchSource::Solver, x_next, None, Some(info))
        };

        // Predict at the batch before it is folded in.
        let options = acquisition
            .requirements()
            .union(PredictOptions::mean().with_std().with_noise());
        let prediction = surrogate_problem.predict(&transformation.do_x(&x_next)?, options)?;
        let acquisition_value = acquisition.evaluate(&prediction)?.value;
        let y_pred_mean = transformation.undo_y(&prediction.f)?;
        let y_pred_std = prediction
            .s
            .as_deref()
            .map(|s| transformation.undo_std(s))
            .transpose()?;
        let rho_pred = prediction
            .rho_f
            .as_deref()
            .map(|r| transformation.undo_std(r))
            .transpose()?
            .map(|r| {
                r.into_iter()
                    .map(|row| row.into_iter().map(|v| v.max(0.0)).collect())
                    .collect::<Matrix>()
            });

        // Outcome.
        let phase = Instant::now();
        let (y_next, rho_next, constraints) = match (recorded, config.outcome) {
            (Some((y, rho)), _) => (y, rho.or(rho_pred), None),
            (None, OutcomeSource::Evaluate) => {
                let evaluation = problem.evaluate(&x_next)?;
                (evaluation.f, evaluation.rho.or(rho_pred), evaluation.g)
            }
            (None, OutcomeSource::Predict) => (y_pred_mean.clone(), rho_pred, None),
        };
        timings.evaluate = phase.elapsed();
        trace_debug!(elapsed = ?timings.evaluate, "new samples evaluated");

        // Status.
        self.dataset
            .append(x_next.clone(), y_next.clone(), rho_next.clone())?;
        self.status = Status::compute(&self.dataset, &self.status.reference_point);
        self.history.push(self.status.hypervolume);
        timings.total = started.elapsed();
        trace_info!(
            sample_num = self.dataset.sample_num(),
            hypervolume = self.status.hypervolume,
            front_size = self.status.pareto_front.len(),
            elapsed = ?timings.total,
            "iteration complete"
        );

        Ok(Batch {
            iteration,
            source,
            x_next,
            y_next,
            rho_next,
            constraints,
            y_pred_mean,
            y_pred_std,
            acquisition: acquisition_value,
            selection: selection_info,
            fit,
            hypervolume: self.status.hypervolume,
            sample_num: self.dataset.sample_num(),
            timings,
        })
    }
}

impl Iterator for MoboRun {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        if !matches!(self.state, RunState::Ready | RunState::Iterating(_)) {
            return None;
        }
        let n_iter = self.mobo.config.n_iter;
        if self.completed >= n_iter {
            self.state = RunState::Done;
            return None;
        }

        match self.step(self.completed) {
            Ok(batch) => {
                self.completed += 1;
                self.state = if self.completed >= n_iter {
                    RunState::Done
                } else {
                    RunState::Iterating(self.completed)
                };
                Some(Ok(batch))
            }
            Err(e) => {
                trace_warn!(iteration = self.completed, error = %e, "iteration failed, stopping run");
                self.state = RunState::Done;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.state {
            RunState::Ready | RunState::Iterating(_) => {
                (0, Some(self.mobo.config.n_iter.saturating_sub(self.completed)))
            }
            RunState::Done => (0, Some(0)),
        }
    }
}

impl FusedIterator for MoboRun {}

impl fmt::Display for MoboRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.mobo, f)?;
        write!(
            f,
            "\n  progress:    {}/{} iterations, {} samples, hypervolume {:.4}",
            self.completed,
            self.mobo.config.n_iter,
            self.dataset.sample_num(),
            self.status.hypervolume
        )
    }
}
