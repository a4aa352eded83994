//! The bi-objective ZDT benchmark family (ZDT1, ZDT2, ZDT3).
//!
//! All three share the same `g` function over variables `2..n` and differ in
//! the shape of their Pareto front: convex (ZDT1), concave (ZDT2) and
//! disconnected (ZDT3). Variables live in `[0, 1]`.

use core::f64::consts::PI;

use crate::error::{Error, Result};
use crate::pareto::find_pareto_front;
use crate::problem::{Bounds, Evaluation, Problem};

/// Disconnected segments of the ZDT3 front along `f1`.
const ZDT3_REGIONS: [(f64, f64); 5] = [
    (0.0, 0.083_001_534_9),
    (0.182_228_780, 0.257_762_363_4),
    (0.409_313_674_8, 0.453_882_104_1),
    (0.618_396_794_4, 0.652_511_703_8),
    (0.823_331_798_3, 0.851_832_865_4),
];

/// Front shape of a ZDT variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZdtKind {
    /// Convex front `f2 = 1 - sqrt(f1)`.
    Zdt1,
    /// Concave front `f2 = 1 - f1^2`.
    Zdt2,
    /// Disconnected front `f2 = 1 - sqrt(f1) - f1 sin(10 pi f1)`.
    Zdt3,
}

impl ZdtKind {
    fn h(self, f1: f64, g: f64) -> f64 {
        let ratio = f1 / g;
        match self {
            Self::Zdt1 => 1.0 - ratio.sqrt(),
            Self::Zdt2 => 1.0 - ratio * ratio,
            Self::Zdt3 => 1.0 - ratio.sqrt() - ratio * (10.0 * PI * f1).sin(),
        }
    }
}

/// A ZDT problem with `n_var` variables.
#[derive(Clone, Debug)]
pub struct Zdt {
    kind: ZdtKind,
    name: String,
    bounds: Bounds,
}

impl Zdt {
    /// Creates a ZDT problem.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `n_var` is zero.
    pub fn new(kind: ZdtKind, n_var: usize) -> Result<Self> {
        if n_var == 0 {
            return Err(Error::DimensionMismatch {
                what: "variables",
                expected: 1,
                got: 0,
            });
        }
        let name = match kind {
            ZdtKind::Zdt1 => "zdt1",
            ZdtKind::Zdt2 => "zdt2",
            ZdtKind::Zdt3 => "zdt3",
        };
        Ok(Self {
            kind,
            name: name.to_string(),
            bounds: Bounds::unit(n_var),
        })
    }

    /// The variant of this problem.
    #[must_use]
    pub fn kind(&self) -> ZdtKind {
        self.kind
    }

    #[allow(clippy::cast_precision_loss)]
    fn objectives(&self, x: &[f64]) -> Vec<f64> {
        let f1 = x[0];
        let tail = &x[1..];
        let g = if tail.is_empty() {
            1.0
        } else {
            1.0 + 9.0 * tail.iter().sum::<f64>() / tail.len() as f64
        };
        vec![f1, g * self.kind.h(f1, g)]
    }
}

impl Problem for Zdt {
    fn name(&self) -> &str {
        &self.name
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

    #[allow(clippy::cast_precision_loss)]
    fn pareto_front(&self, n_points: usize) -> Option<Vec<Vec<f64>>> {
        let n = n_points.max(2);
        let along = |lo: f64, hi: f64, count: usize| {
            (0..count).map(move |i| lo + (hi - lo) * i as f64 / (count - 1).max(1) as f64)
        };
        let front = match self.kind {
            ZdtKind::Zdt1 | ZdtKind::Zdt2 => along(0.0, 1.0, n)
                .map(|f1| vec![f1, self.kind.h(f1, 1.0)])
                .collect(),
            ZdtKind::Zdt3 => {
                let per_region = n.div_ceil(ZDT3_REGIONS.len()).max(2);
                let sampled: Vec<Vec<f64>> = ZDT3_REGIONS
                    .iter()
                    .flat_map(|&(lo, hi)| along(lo, hi, per_region))
                    .map(|f1| vec![f1, self.kind.h(f1, 1.0)])
                    .collect();
                // Segment starts sit marginally above the previous segment's end.
                find_pareto_front(&sampled).0
            }
        };
        Some(front)
    }
}
