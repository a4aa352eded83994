//! The real-problem contract consumed by the optimization loop.
//!
//! A [`Problem`] is the expensive system being optimized: a simulator, a
//! benchmark function, or a table of recorded lab measurements. All
//! objectives are minimized.

use crate::error::{Error, Result};

/// Box bounds of the design space.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    /// Lower bound per variable.
    pub xl: Vec<f64>,
    /// Upper bound per variable.
    pub xu: Vec<f64>,
}

impl Bounds {
    /// Creates validated bounds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if `xl` and `xu` differ in length
    /// and [`Error::InvalidBounds`] if any `xl > xu`.
    pub fn new(xl: Vec<f64>, xu: Vec<f64>) -> Result<Self> {
        if xl.len() != xu.len() {
            return Err(Error::DimensionMismatch {
                what: "upper bounds",
                expected: xl.len(),
                got: xu.len(),
            });
        }
        for (index, (&low, &high)) in xl.iter().zip(&xu).enumerate() {
            if low > high || !low.is_finite() || !high.is_finite() {
                return Err(Error::InvalidBounds { index, low, high });
            }
        }
        Ok(Self { xl, xu })
    }

    /// The unit hypercube `[0, 1]^n_var`.
    #[must_use]
    pub fn unit(n_var: usize) -> Self {
        Self {
            xl: vec![0.0; n_var],
            xu: vec![1.0; n_var],
        }
    }

    /// Number of variables.
    #[must_use]
    pub fn n_var(&self) -> usize {
        self.xl.len()
    }

    /// Returns `true` if `x` lies inside the bounds.
    #[must_use]
    pub fn contains(&self, x: &[f64]) -> bool {
        x.len() == self.xl.len()
            && x
                .iter()
                .zip(self.xl.iter().zip(&self.xu))
                .all(|(&v, (&lo, &hi))| v >= lo && v <= hi)
    }

    /// Clamp `x` into the bounds.
    #[must_use]
    pub fn clamp(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(self.xl.iter().zip(&self.xu))
            .map(|(&v, (&lo, &hi))| v.clamp(lo, hi))
            .collect()
    }
}

/// Result of evaluating a batch of designs.
///
/// `f` is always the objective matrix. Constraint values, when the problem
/// declares constraints, live in `g` (`<= 0` means satisfied) rather than
/// being packed into a tuple alongside the objectives.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Evaluation {
    /// Objective values, one row per design.
    pub f: Vec<Vec<f64>>,
    /// Constraint values, one row per design, if the problem has constraints.
    pub g: Option<Vec<Vec<f64>>>,
    /// Per-objective uncertainty estimates, if the problem reports them.
    pub rho: Option<Vec<Vec<f64>>>,
}

impl Evaluation {
    /// Objective-only evaluation.
    #[must_use]
    pub fn objectives(f: Vec<Vec<f64>>) -> Self {
        Self {
            f,
            g: None,
            rho: None,
        }
    }

    /// Feasibility mask derived from `g`; all rows are feasible without constraints.
    #[must_use]
    pub fn feasible(&self) -> Vec<bool> {
        match &self.g {
            Some(g) => g.iter().map(|row| row.iter().all(|&c| c <= 0.0)).collect(),
            None => vec![true; self.f.len()],
        }
    }
}

/// An optimization problem with box-bounded continuous designs.
pub trait Problem: Send + Sync {
    /// Short identifier used in logs and framework descriptions.
    fn name(&self) -> &str;

    /// Number of objectives.
    fn n_obj(&self) -> usize;

    /// Number of inequality constraints.
    fn n_constr(&self) -> usize {
        0
    }

    /// Design-space bounds; their length is the number of variables.
    fn bounds(&self) -> &Bounds;

    /// Number of variables.
    fn n_var(&self) -> usize {
        self.bounds().n_var()
    }

    /// Evaluate a batch of designs.
    ///
    /// # Errors
    ///
    /// Implementations report malformed input or unavailable evaluations.
    fn evaluate(&self, x: &[Vec<f64>]) -> Result<Evaluation>;

    /// The true Pareto front sampled at roughly `n_points` points, if known.
    fn pareto_front(&self, _n_points: usize) -> Option<Vec<Vec<f64>>> {
        None
    }
}

impl<P: Problem + ?Sized> Problem for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn n_obj(&self) -> usize {
        (**self).n_obj()
    }

    fn n_constr(&self) -> usize {
        (**self).n_constr()
    }

    fn bounds(&self) -> &Bounds {
        (**self).bounds()
    }

    fn n_var(&self) -> usize {
        (**self).n_var()
    }

    fn evaluate(&self, x: &[Vec<f64>]) -> Result<Evaluation> {
        (**self).evaluate(x)
    }

    fn pareto_front(&self, n_points: usize) -> Option<Vec<Vec<f64>>> {
        (**self).pareto_front(n_points)
    }
}

/// Closure-backed problem, handy for tests and quick experiments.
///
/// ```
/// use mobo::problem::{Bounds, FnProblem, Problem};
///
/// let p = FnProblem::new("parabola", Bounds::unit(1), 2, |x: &[f64]| {
///     vec![x[0] * x[0], (x[0] - 1.0).powi(2)]
/// });
/// let e = p.evaluate(&[vec![0.5]]).unwrap();
/// assert_eq!(e.f, vec![vec![0.25, 0.25]]);
/// ```
pub struct FnProblem<F> {
    name: String,
    bounds: Bounds,
    n_obj: usize,
    f: F,
}

impl<F> FnProblem<F>
where
    F: Fn(&[f64]) -> Vec<f64> + Send + Sync,
{
    /// Wrap a per-design objective function.
    pub fn new(name: impl Into<String>, bounds: Bounds, n_obj: usize, f: F) -> Self {
        Self {
            name: name.into(),
            bounds,
            n_obj,
            f,
        }
    }
}

impl<F> Problem for FnProblem<F>
where
    F: Fn(&[f64]) -> Vec<f64> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn n_obj(&self) -> usize {
        self.n_obj
    }

    fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    fn evaluate(&self, x: &[Vec<f64>]) -> Result<Evaluation> {
        Error::check_columns("X", self.n_var(), x)?;
        let f: Vec<Vec<f64>> = x.iter().map(|row| (self.f)(row)).collect();
        Error::check_columns("F", self.n_obj, &f)?;
        Ok(Evaluation::objectives(f))
    }
}
