#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Multi-objective Bayesian optimization driver. Each iteration fits a
//! surrogate to the data seen so far, searches the surrogate's acquisition
//! landscape with an inner multi-objective solver, picks a batch of designs
//! from the solver's trade-off set, and tracks the Pareto front and its
//! hypervolume as new evaluations arrive.
//!
//! # Getting Started
//!
//! ```
//! use mobo::prelude::*;
//!
//! let problem = Zdt::new(ZdtKind::Zdt2, 3).unwrap();
//! let init = generate_initial_samples(&problem, 10, Some(7)).unwrap();
//!
//! let mobo = Mobo::builder(problem)
//!     .n_iter(1)
//!     .batch_size(3)
//!     .solver(Nsga2Solver::builder().population_size(16).n_generations(2).seed(7).build())
//!     .seed(7)
//!     .build()
//!     .unwrap();
//!
//! let mut run = mobo.solve(init.x, init.y, None).unwrap();
//! let batch = run.next().unwrap().unwrap();
//! println!("proposed {:?}, hypervolume {:.4}", batch.x_next, batch.hypervolume);
//! assert!(run.next().is_none());
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`Mobo`](framework::Mobo) | Configured loop; [`Mobo::solve`](framework::Mobo::solve) seeds it with data. |
//! | [`MoboRun`](framework::MoboRun) | Lazy iterator yielding one [`Batch`](framework::Batch) per iteration. |
//! | [`Problem`](problem::Problem) | The real objective: bounds, objective count, batch evaluation. |
//! | [`Surrogate`](surrogate::Surrogate) | Probabilistic model fitted on normalized data. |
//! | [`Acquisition`](acquisition::Acquisition) | Scores surrogate predictions. |
//! | [`Solver`](solver::Solver) | Finds trade-off designs of the surrogate problem. |
//! | [`Selection`](selection::Selection) | Picks the next batch from the solver's candidates. |
//!
//! # Replaying recorded experiments
//!
//! A [`ReplayTable`](problems::ReplayTable) passed to
//! [`MoboBuilder::replay`](framework::MoboBuilder::replay) supplies the
//! first batches from rows measured before the run. The full surrogate
//! pipeline still runs on those iterations, so every batch carries
//! predictions and acquisition values. Once the table is exhausted the loop
//! switches to solver-driven proposals.
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `serde` | `Serialize`/`Deserialize` on public data types, JSON output of [`Solver::save`](solver::Solver::save) | off |
//! | `sobol` | Scrambled Sobol initial designs in [`generate_initial_samples`](problems::generate_initial_samples) | off |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) for every iteration phase | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::warn!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($($arg:tt)*) => {};
}

pub mod acquisition;
pub mod dataset;
mod error;
pub mod framework;
pub mod pareto;
pub mod problem;
pub mod problems;
pub mod reference;
mod rng_util;
pub mod selection;
pub mod solver;
pub mod surrogate;
pub mod surrogate_problem;
pub mod transformation;

pub use error::{Error, Result};
pub use framework::{Mobo, MoboBuilder, MoboRun};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use mobo::prelude::*;
/// ```
pub mod prelude {
    pub use crate::acquisition::{Acquisition, IdentityAcquisition, LcbAcquisition};
    pub use crate::dataset::{Dataset, Status};
    pub use crate::error::{Error, Result};
    pub use crate::framework::{
        Algorithm, Batch, BatchSource, Mobo, MoboBuilder, MoboConfig, MoboRun, OutcomeSource,
        RunState,
    };
    pub use crate::pareto::{calc_hypervolume, find_pareto_front};
    pub use crate::problem::{Bounds, Evaluation, FnProblem, Problem};
    pub use crate::problems::{
        Dtlz2, RecordedProblem, ReplayTable, Vlmop2, Zdt, ZdtKind, build_problem,
        generate_initial_samples,
    };
    pub use crate::reference::ReferencePoint;
    pub use crate::selection::{HypervolumeImprovementSelection, RandomSelection, Selection};
    pub use crate::solver::{CandidateSet, Nsga2Solver, Solver};
    pub use crate::surrogate::{FitOutcome, FitPolicy, GpSurrogate, Surrogate};
    pub use crate::transformation::Transformation;
}
