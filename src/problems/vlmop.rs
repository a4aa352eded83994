//! VLMOP2: a bi-objective problem with a concave front on `[-2, 2]^n`.

use crate::error::{Error, Result};
use crate::problem::{Bounds, Evaluation, Problem};

/// The VLMOP2 problem.
#[derive(Clone, Debug)]
pub struct Vlmop2 {
    bounds: Bounds,
}

impl Vlmop2 {
    /// Creates a VLMOP2 instance with `n_var` variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `n_var` is zero.
    pub fn new(n_var: usize) -> Result<Self> {
        if n_var == 0 {
            return Err(Error::DimensionMismatch {
                what: "variables",
                expected: 1,
                got: 0,
            });
        }
        Ok(Self {
            bounds: Bounds {
                xl: vec![-2.0; n_var],
                xu: vec![2.0; n_var],
            },
        })
    }

    #[allow(clippy::cast_precision_loss)]
    fn shift(&self) -> f64 {
        1.0 / (self.n_var() as f64).sqrt()
    }

    fn objectives(&self, x: &[f64]) -> Vec<f64> {
        let s = self.shift();
        let d1: f64 = x.iter().map(|v| (v - s).powi(2)).sum();
        let d2: f64 = x.iter().map(|v| (v + s).powi(2)).sum();
        vec![1.0 - (-d1).exp(), 1.0 - (-d2).exp()]
    }
}

impl Problem for Vlmop2 {
    fn name(&self) -> &str {
        "vlmop2"
    }

    fn n_obj(&self) -> usize {
        2
    }

    fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    fn evaluate(&self, x: &[Vec<f64>]) -> Result<Evaluation> {
        Error::check_columns("X", self.n_var(), x)?;
        Ok(Evaluation::objectives(
            x.iter().map(|row| self.objectives(row)).collect(),
        ))
    }

    /// Optimal designs have all coordinates equal within `[-s, s]`.
    #[allow(clippy::cast_precision_loss)]
    fn pareto_front(&self, n_points: usize) -> Option<Vec<Vec<f64>>> {
        let n = n_points.max(2);
        let s = self.shift();
        Some(
            (0..n)
                .map(|i| {
                    let t = -s + 2.0 * s * i as f64 / (n - 1) as f64;
                    self.objectives(&vec![t; self.n_var()])
                })
                .collect(),
        )
    }
}
