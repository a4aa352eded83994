//! Benchmark problems, recorded experiment tables and initial sampling.
//!
//! [`build_problem`] resolves a benchmark by name the way experiment scripts
//! usually select one from a command line:
//!
//! | Name | Objectives | Bounds |
//! |------|------------|--------|
//! | `zdt1`, `zdt2`, `zdt3` | 2 | `[0, 1]^n_var` |
//! | `dtlz2` | `n_obj` | `[0, 1]^n_var` |
//! | `vlmop2` | 2 | `[-2, 2]^n_var` |
//!
//! ```
//! use mobo::problems::{build_problem, true_pareto_front};
//!
//! let problem = build_problem("zdt1", 4, 2).unwrap();
//! let front = true_pareto_front(problem.as_ref(), 50).unwrap();
//! assert_eq!(front.len(), 50);
//! assert!(build_problem("nope", 4, 2).is_err());
//! ```

mod dtlz;
mod recorded;
mod sampling;
mod vlmop;
mod zdt;

pub use dtlz::Dtlz2;
pub use recorded::{RecordedProblem, ReplayTable, TableRows};
pub use sampling::{InitialSamples, generate_initial_samples};
pub use vlmop::Vlmop2;
pub use zdt::{Zdt, ZdtKind};

use crate::error::{Error, Result};
use crate::problem::Problem;

/// Names accepted by [`build_problem`].
pub const PROBLEM_NAMES: [&str; 5] = ["zdt1", "zdt2", "zdt3", "dtlz2", "vlmop2"];

/// Build a benchmark problem by name (case-insensitive).
///
/// `n_obj` is only free for `dtlz2`; the other benchmarks are bi-objective
/// and reject any other count.
///
/// # Errors
///
/// Returns [`Error::UnsupportedProblem`] for unknown names and
/// [`Error::DimensionMismatch`] for invalid dimensions.
pub fn build_problem(name: &str, n_var: usize, n_obj: usize) -> Result<Box<dyn Problem>> {
    let lower = name.to_ascii_lowercase();
    let bi_objective = |p: Box<dyn Problem>| -> Result<Box<dyn Problem>> {
        if n_obj == 2 {
            Ok(p)
        } else {
            Err(Error::DimensionMismatch {
                what: "objectives",
                expected: 2,
                got: n_obj,
            })
        }
    };
    match lower.as_str() {
        "zdt1" => bi_objective(Box::new(Zdt::new(ZdtKind::Zdt1, n_var)?)),
        "zdt2" => bi_objective(Box::new(Zdt::new(ZdtKind::Zdt2, n_var)?)),
        "zdt3" => bi_objective(Box::new(Zdt::new(ZdtKind::Zdt3, n_var)?)),
        "dtlz2" => Ok(Box::new(Dtlz2::new(n_var, n_obj)?)),
        "vlmop2" => bi_objective(Box::new(Vlmop2::new(n_var)?)),
        _ => Err(Error::UnsupportedProblem(name.to_string())),
    }
}

/// The true Pareto front of `problem`, sampled at roughly `n_points` points.
///
/// # Errors
///
/// Returns [`Error::MissingParetoFront`] if the problem does not define one.
pub fn true_pareto_front(problem: &dyn Problem, n_points: usize) -> Result<Vec<Vec<f64>>> {
    problem
        .pareto_front(n_points)
        .ok_or_else(|| Error::MissingParetoFront(problem.name().to_string()))
}
