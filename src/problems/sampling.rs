//! Feasible initial designs.

use crate::error::{Error, Result};
use crate::problem::Problem;
use crate::rng_util;

/// Initial designs with their evaluations.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InitialSamples {
    /// Designs.
    pub x: Vec<Vec<f64>>,
    /// Objectives.
    pub y: Vec<Vec<f64>>,
    /// Uncertainty, when the problem reports it for every draw.
    pub rho: Option<Vec<Vec<f64>>>,
}

/// Draw `n_sample` feasible designs from `problem` and evaluate them.
///
/// Designs are drawn in rounds of `n_sample` points inside the problem
/// bounds, using a scrambled Sobol sequence with the `sobol` feature and
/// uniform random draws otherwise. Infeasible rows are dropped and rounds
/// repeat until enough feasible rows exist; the pool is then shuffled and
/// truncated.
///
/// The loop has no upper bound: a problem with an empty or vanishingly small
/// feasible region never returns. Run it under an external timeout when that
/// is a possibility.
///
/// # Errors
///
/// Propagates evaluation errors and reports malformed evaluations as
/// [`Error::DimensionMismatch`] or [`Error::RowCountMismatch`].
pub fn generate_initial_samples(
    problem: &dyn Problem,
    n_sample: usize,
    seed: Option<u64>,
) -> Result<InitialSamples> {
    let mut rng = rng_util::make_rng(seed);
    let mut draws = DesignDraws::new(seed);
    let bounds = problem.bounds();

    let mut x_pool: Vec<Vec<f64>> = Vec::new();
    let mut y_pool: Vec<Vec<f64>> = Vec::new();
    let mut rho_pool = Some(Vec::new());
    let mut round = 0_usize;

    while x_pool.len() < n_sample {
        if round > 0 {
            trace_warn!(
                round,
                feasible = x_pool.len(),
                target = n_sample,
                "not enough feasible initial samples, drawing again"
            );
        }
        round += 1;

        let x: Vec<Vec<f64>> = (0..n_sample)
            .map(|_| draws.next(&mut rng, &bounds.xl, &bounds.xu))
            .collect();
        let evaluation = problem.evaluate(&x)?;
        Error::check_rows("F", x.len(), evaluation.f.len())?;
        Error::check_columns("F", problem.n_obj(), &evaluation.f)?;
        let feasible = evaluation.feasible();
        Error::check_rows("feasibility mask", x.len(), feasible.len())?;

        match (&mut rho_pool, evaluation.rho) {
            (Some(pool_rho), Some(rho)) => {
                Error::check_rows("rho", x.len(), rho.len())?;
                pool_rho.extend(
                    rho.into_iter()
                        .zip(&feasible)
                        .filter_map(|(r, &ok)| ok.then_some(r)),
                );
            }
            (slot, _) => *slot = None,
        }
        for ((xi, yi), ok) in x.into_iter().zip(evaluation.f).zip(&feasible) {
            if *ok {
                x_pool.push(xi);
                y_pool.push(yi);
            }
        }
    }

    let mut order: Vec<usize> = (0..x_pool.len()).collect();
    rng.shuffle(&mut order);
    order.truncate(n_sample);

    let pick = |rows: &[Vec<f64>]| -> Vec<Vec<f64>> {
        order.iter().map(|&i| rows[i].clone()).collect()
    };
    Ok(InitialSamples {
        x: pick(&x_pool),
        y: pick(&y_pool),
        rho: rho_pool.as_deref().map(pick),
    })
}

/// Source of raw design points in a box.
struct DesignDraws {
    #[cfg(feature = "sobol")]
    index: u32,
    #[cfg(feature = "sobol")]
    seed: u32,
}

impl DesignDraws {
    #[allow(clippy::cast_possible_truncation, unused_variables)]
    fn new(seed: Option<u64>) -> Self {
        Self {
            #[cfg(feature = "sobol")]
            index: 0,
            #[cfg(feature = "sobol")]
            seed: seed.unwrap_or(0) as u32,
        }
    }

    #[cfg(feature = "sobol")]
    #[allow(clippy::cast_possible_truncation)]
    fn next(&mut self, rng: &mut fastrand::Rng, lower: &[f64], upper: &[f64]) -> Vec<f64> {
        // Sobol dimensions are capped; wider designs fall back to random draws.
        if lower.len() > sobol_burley::NUM_DIMENSIONS as usize {
            return rng_util::point_in_box(rng, lower, upper);
        }
        let index = self.index;
        self.index = self.index.wrapping_add(1);
        lower
            .iter()
            .zip(upper)
            .enumerate()
            .map(|(d, (&lo, &hi))| {
                let u = f64::from(sobol_burley::sample(index, d as u32, self.seed));
                lo + u * (hi - lo)
            })
            .collect()
    }

    #[cfg(not(feature = "sobol"))]
    #[allow(clippy::unused_self)]
    fn next(&mut self, rng: &mut fastrand::Rng, lower: &[f64], upper: &[f64]) -> Vec<f64> {
        rng_util::point_in_box(rng, lower, upper)
    }
}
