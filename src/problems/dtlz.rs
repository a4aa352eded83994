//! DTLZ2: a scalable many-objective benchmark with a spherical front.

use core::f64::consts::FRAC_PI_2;

use crate::error::{Error, Result};
use crate::problem::{Bounds, Evaluation, Problem};

/// The DTLZ2 problem with `n_var` variables and `n_obj` objectives.
///
/// The last `n_var - n_obj + 1` variables feed the distance function `g`; the
/// first `n_obj - 1` are angular positions. The front is the positive unit
/// hypersphere.
#[derive(Clone, Debug)]
pub struct Dtlz2 {
    n_obj: usize,
    bounds: Bounds,
}

impl Dtlz2 {
    /// Creates a DTLZ2 instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `n_obj < 2` or `n_var < n_obj`.
    pub fn new(n_var: usize, n_obj: usize) -> Result<Self> {
        if n_obj < 2 {
            return Err(Error::DimensionMismatch {
                what: "objectives",
                expected: 2,
                got: n_obj,
            });
        }
        if n_var < n_obj {
            return Err(Error::DimensionMismatch {
                what: "variables",
                expected: n_obj,
                got: n_var,
            });
        }
        Ok(Self {
            n_obj,
            bounds: Bounds::unit(n_var),
        })
    }

    fn objectives(&self, x: &[f64]) -> Vec<f64> {
        let m = self.n_obj;
        let g: f64 = x[m - 1..].iter().map(|v| (v - 0.5).powi(2)).sum();
        (0..m)
            .map(|i| {
                let mut f = 1.0 + g;
                for &xj in &x[..m - 1 - i] {
                    f *= (xj * FRAC_PI_2).cos();
                }
                if i > 0 {
                    f *= (x[m - 1 - i] * FRAC_PI_2).sin();
                }
                f
            })
            .collect()
    }
}

impl Problem for Dtlz2 {
    fn name(&self) -> &str {
        "dtlz2"
    }

    fn n_obj(&self) -> usize {
        self.n_obj
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

    /// Das-Dennis directions projected onto the unit sphere.
    fn pareto_front(&self, n_points: usize) -> Option<Vec<Vec<f64>>> {
        let directions = das_dennis(self.n_obj, partitions_for(self.n_obj, n_points.max(1)));
        Some(
            directions
                .into_iter()
                .map(|d| {
                    let norm = d.iter().map(|v| v * v).sum::<f64>().sqrt();
                    d.into_iter().map(|v| v / norm).collect()
                })
                .collect(),
        )
    }
}

/// Smallest partition count whose Das-Dennis lattice has at least `n_points`.
fn partitions_for(n_obj: usize, n_points: usize) -> usize {
    let mut p = 1;
    while lattice_size(n_obj, p) < n_points {
        p += 1;
    }
    p
}

/// `C(p + m - 1, m - 1)`.
fn lattice_size(m: usize, p: usize) -> usize {
    let k = m - 1;
    let mut acc: usize = 1;
    for i in 0..k {
        acc = acc * (p + k - i) / (i + 1);
    }
    acc
}

/// Uniformly spaced points on the unit simplex.
#[allow(clippy::cast_precision_loss)]
fn das_dennis(n_obj: usize, partitions: usize) -> Vec<Vec<f64>> {
    fn recurse(
        left: usize,
        depth: usize,
        n_obj: usize,
        partitions: usize,
        current: &mut Vec<usize>,
        out: &mut Vec<Vec<f64>>,
    ) {
        if depth == n_obj - 1 {
            current.push(left);
            out.push(
                current
                    .iter()
                    .map(|&c| c as f64 / partitions as f64)
                    .collect(),
            );
            current.pop();
            return;
        }
        for c in 0..=left {
            current.push(c);
            recurse(left - c, depth + 1, n_obj, partitions, current, out);
            current.pop();
        }
    }

    let mut out = Vec::with_capacity(lattice_size(n_obj, partitions));
    recurse(partitions, 0, n_obj, partitions, &mut Vec::new(), &mut out);
    out
}
