//! Integration tests for the optimization loop.
//!
//! Most tests drive the loop with the deterministic collaborators in
//! [`stubs`], which count every call so laziness and phase ordering can be
//! checked from the outside.

#![allow(clippy::cast_precision_loss, clippy::float_cmp)]

mod configuration;
mod end_to_end;
mod lifecycle;
mod persistence;
mod replay;
mod scenarios;
mod stubs;

use mobo::problem::Problem;
use mobo::problems::{InitialSamples, ReplayTable, Zdt, ZdtKind, generate_initial_samples};

/// Two-variable ZDT1.
fn zdt1() -> Zdt {
    Zdt::new(ZdtKind::Zdt1, 2).unwrap()
}

fn initial(problem: &dyn Problem, n: usize) -> InitialSamples {
    generate_initial_samples(problem, n, Some(3)).unwrap()
}

/// `n` evaluated rows of `problem`, optionally with a constant uncertainty.
fn recorded_table(problem: &dyn Problem, n: usize, rho: Option<f64>) -> ReplayTable {
    let mut rng = fastrand::Rng::with_seed(17);
    let bounds = problem.bounds();
    let x: Vec<Vec<f64>> = (0..n)
        .map(|_| {
            bounds
                .xl
                .iter()
                .zip(&bounds.xu)
                .map(|(&lo, &hi)| lo + rng.f64() * (hi - lo))
                .collect()
        })
        .collect();
    let y = problem.evaluate(&x).unwrap().f;
    let rho = rho.map(|r| vec![vec![r; problem.n_obj()]; n]);
    ReplayTable::new(x, y, rho).unwrap()
}

fn assert_rows_close(a: &[Vec<f64>], b: &[Vec<f64>]) {
    assert_eq!(a.len(), b.len());
    for (ra, rb) in a.iter().zip(b) {
        assert_eq!(ra.len(), rb.len());
        for (va, vb) in ra.iter().zip(rb) {
            assert!((va - vb).abs() < 1e-9, "{ra:?} != {rb:?}");
        }
    }
}
