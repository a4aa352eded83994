//! Resolution of the hypervolume reference point.
//!
//! The reference point is resolved once per run, before the first status
//! update, and then held fixed so hypervolumes stay comparable across
//! iterations.

use crate::error::{Error, Result};
use crate::pareto::find_pareto_front;

/// Default margin, as a fraction of the observed range, added beyond the
/// worst observed value when inferring a reference point.
pub const DEFAULT_REFERENCE_SCALE: f64 = 0.1;

/// Smallest margin ever added to an inferred coordinate.
const MIN_MARGIN: f64 = 1e-6;

/// Relative margin floor. Four epsilons of `|worst|` span at least four ulps,
/// so the addition cannot round back to `worst`.
const MIN_RELATIVE_MARGIN: f64 = 4.0 * f64::EPSILON;

/// Source of the reference point.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReferencePoint {
    /// Use this point as given.
    Fixed(Vec<f64>),
    /// Infer a point from the initial objective values.
    ///
    /// Per objective: `worst + scale * (worst - best)`, where worst/best are
    /// taken over the non-dominated initial rows. A zero range falls back to
    /// `|worst|`. The margin is never smaller than `1e-6` nor than a few ulps
    /// of `worst`, so the result is strictly worse than every observed value.
    Infer {
        /// Fraction of the range added as margin.
        scale: f64,
    },
}

impl Default for ReferencePoint {
    fn default() -> Self {
        Self::Infer {
            scale: DEFAULT_REFERENCE_SCALE,
        }
    }
}

impl ReferencePoint {
    /// Resolve the reference point against the initial objective matrix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyDataset`] when inference has no data,
    /// [`Error::DimensionMismatch`] when a fixed point has the wrong width,
    /// and [`Error::InvalidReferencePoint`] for non-finite coordinates.
    pub fn resolve(&self, y_init: &[Vec<f64>], n_obj: usize) -> Result<Vec<f64>> {
        let point = match self {
            Self::Fixed(p) => {
                Error::check_columns("reference point", n_obj, core::slice::from_ref(p))?;
                p.clone()
            }
            Self::Infer { scale } => infer_reference_point(y_init, *scale)?,
        };
        if point.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidReferencePoint(format!(
                "non-finite coordinate in {point:?}"
            )));
        }
        Ok(point)
    }
}

/// Infer a reference point that every row of `y` strictly dominates.
///
/// # Errors
///
/// Returns [`Error::EmptyDataset`] if `y` has no rows.
pub fn infer_reference_point(y: &[Vec<f64>], scale: f64) -> Result<Vec<f64>> {
    let Some(first) = y.first() else {
        return Err(Error::EmptyDataset);
    };
    let n_obj = first.len();
    Error::check_columns("Y", n_obj, y)?;

    // The margin is sized from the front, but the point must clear every row.
    let (front, _) = find_pareto_front(y);

    Ok((0..n_obj)
        .map(|j| {
            let front_worst = fold_column(&front, j, f64::NEG_INFINITY, f64::max);
            let front_best = fold_column(&front, j, f64::INFINITY, f64::min);
            let worst = fold_column(y, j, f64::NEG_INFINITY, f64::max);
            let mut range = front_worst - front_best;
            if range <= 0.0 {
                range = front_worst.abs();
            }
            let margin = (scale.abs() * range)
                .max(MIN_MARGIN)
                .max(worst.abs() * MIN_RELATIVE_MARGIN);
            worst + margin
        })
        .collect())
}

fn fold_column(rows: &[Vec<f64>], j: usize, init: f64, f: fn(f64, f64) -> f64) -> f64 {
    rows.iter().map(|r| r[j]).fold(init, f)
}
