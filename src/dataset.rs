//! The running dataset and the Pareto status derived from it.

use crate::error::{Error, Result};
use crate::pareto::{calc_hypervolume, find_pareto_front};

/// Append-only collection of evaluated points.
///
/// Row `i` of `x` produced row `i` of `y` (and of `rho`, when tracked).
/// Whether `rho` is tracked is decided by the first append: a dataset seeded
/// with `rho` requires it on every later batch, a dataset seeded without it
/// drops any `rho` it is given.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dataset {
    x: Vec<Vec<f64>>,
    y: Vec<Vec<f64>>,
    rho: Option<Vec<Vec<f64>>>,
}

impl Dataset {
    /// Creates an empty dataset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Design matrix.
    #[must_use]
    pub fn x(&self) -> &[Vec<f64>] {
        &self.x
    }

    /// Objective matrix.
    #[must_use]
    pub fn y(&self) -> &[Vec<f64>] {
        &self.y
    }

    /// Per-point uncertainty, if tracked.
    #[must_use]
    pub fn rho(&self) -> Option<&[Vec<f64>]> {
        self.rho.as_deref()
    }

    /// Number of rows appended so far.
    #[must_use]
    pub fn sample_num(&self) -> usize {
        self.x.len()
    }

    /// Returns `true` if no rows have been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Append a batch of rows.
    ///
    /// The batch is validated as a whole before anything is appended.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RowCountMismatch`] if `x`, `y` and `rho` disagree on
    /// row count, [`Error::DimensionMismatch`] if a row's width differs from
    /// the existing data, and [`Error::MissingRho`] if the dataset tracks
    /// `rho` but the batch has none.
    pub fn append(
        &mut self,
        x: Vec<Vec<f64>>,
        y: Vec<Vec<f64>>,
        rho: Option<Vec<Vec<f64>>>,
    ) -> Result<()> {
        Error::check_rows("Y", x.len(), y.len())?;
        if let Some(r) = &rho {
            Error::check_rows("rho", x.len(), r.len())?;
        }

        let n_var = self
            .x
            .first()
            .or_else(|| x.first())
            .map_or(0, Vec::len);
        let n_obj = self
            .y
            .first()
            .or_else(|| y.first())
            .map_or(0, Vec::len);
        Error::check_columns("X", n_var, &x)?;
        Error::check_columns("Y", n_obj, &y)?;
        if let Some(r) = &rho {
            Error::check_columns("rho", n_obj, r)?;
        }

        if self.is_empty() && rho.is_some() {
            self.rho = Some(Vec::new());
        }
        match (&mut self.rho, rho) {
            (Some(tracked), Some(new)) => tracked.extend(new),
            (Some(_), None) if !x.is_empty() => return Err(Error::MissingRho),
            _ => {}
        }

        self.x.extend(x);
        self.y.extend(y);
        Ok(())
    }
}

/// Pareto status of the current dataset.
///
/// Always recomputed in full by [`Status::compute`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Status {
    /// Non-dominated objective rows.
    pub pareto_front: Vec<Vec<f64>>,
    /// Design rows matching `pareto_front`.
    pub pareto_set: Vec<Vec<f64>>,
    /// Dataset row indices of the front.
    pub pareto_indices: Vec<usize>,
    /// Hypervolume of the front with respect to `reference_point`.
    pub hypervolume: f64,
    /// The fixed reference point of the run.
    pub reference_point: Vec<f64>,
}

impl Status {
    /// Empty status around a reference point.
    #[must_use]
    pub fn empty(reference_point: Vec<f64>) -> Self {
        Self {
            pareto_front: Vec::new(),
            pareto_set: Vec::new(),
            pareto_indices: Vec::new(),
            hypervolume: 0.0,
            reference_point,
        }
    }

    /// Compute the status of `dataset` from scratch.
    #[must_use]
    pub fn compute(dataset: &Dataset, reference_point: &[f64]) -> Self {
        let (pareto_front, pareto_indices) = find_pareto_front(dataset.y());
        let pareto_set = pareto_indices.iter().map(|&i| dataset.x()[i].clone()).collect();
        let hypervolume = calc_hypervolume(&pareto_front, reference_point);
        Self {
            pareto_front,
            pareto_set,
            pareto_indices,
            hypervolume,
            reference_point: reference_point.to_vec(),
        }
    }
}
