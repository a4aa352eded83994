//! Genetic operators on box-bounded real vectors: binary tournament, SBX
//! crossover and polynomial mutation.

use crate::rng_util;

/// Tournament selection: pick 2 random individuals, return index of winner.
/// Winner has lower rank; ties broken by higher crowding distance.
pub(crate) fn tournament_select(
    rng: &mut fastrand::Rng,
    ranks: &[usize],
    crowding: &[f64],
) -> usize {
    let n = ranks.len();
    let a = rng.usize(0..n);
    let b = rng.usize(0..n);

    if ranks[a] < ranks[b] {
        a
    } else if ranks[b] < ranks[a] {
        b
    } else if crowding[a] >= crowding[b] {
        a
    } else {
        b
    }
}

/// SBX crossover of two parents, applied with probability `crossover_prob`.
pub(crate) fn crossover(
    rng: &mut fastrand::Rng,
    parent1: &[f64],
    parent2: &[f64],
    lower: &[f64],
    upper: &[f64],
    crossover_prob: f64,
    eta: f64,
) -> (Vec<f64>, Vec<f64>) {
    let mut child1 = parent1.to_vec();
    let mut child2 = parent2.to_vec();

    if rng_util::f64_range(rng, 0.0, 1.0) > crossover_prob {
        return (child1, child2);
    }

    for (i, (&p1, &p2)) in parent1.iter().zip(parent2).enumerate() {
        if (p1 - p2).abs() < 1e-14 {
            continue;
        }
        let (c1, c2) = sbx_crossover_f64(rng, p1, p2, lower[i], upper[i], eta);
        child1[i] = c1;
        child2[i] = c2;
    }

    (child1, child2)
}

/// SBX crossover for a single dimension.
pub(crate) fn sbx_crossover_f64(
    rng: &mut fastrand::Rng,
    p1: f64,
    p2: f64,
    low: f64,
    high: f64,
    eta: f64,
) -> (f64, f64) {
    let u: f64 = rng_util::f64_range(rng, 0.0, 1.0);

    let beta = if u <= 0.5 {
        (2.0 * u).powf(1.0 / (eta + 1.0))
    } else {
        (1.0 / (2.0 * (1.0 - u))).powf(1.0 / (eta + 1.0))
    };

    let c1 = 0.5 * ((1.0 + beta) * p1 + (1.0 - beta) * p2);
    let c2 = 0.5 * ((1.0 - beta) * p1 + (1.0 + beta) * p2);

    (c1.clamp(low, high), c2.clamp(low, high))
}

/// Polynomial mutation, each gene with probability `1 / n`.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn mutate(
    rng: &mut fastrand::Rng,
    individual: &mut [f64],
    lower: &[f64],
    upper: &[f64],
    eta: f64,
) {
    let n = individual.len();
    if n == 0 {
        return;
    }
    let mutation_prob = 1.0 / n as f64;

    for (i, value) in individual.iter_mut().enumerate() {
        if rng_util::f64_range(rng, 0.0, 1.0) >= mutation_prob {
            continue;
        }
        *value = polynomial_mutation_f64(rng, *value, lower[i], upper[i], eta);
    }
}

/// Polynomial mutation for a single value.
pub(crate) fn polynomial_mutation_f64(
    rng: &mut fastrand::Rng,
    x: f64,
    low: f64,
    high: f64,
    eta: f64,
) -> f64 {
    let u: f64 = rng_util::f64_range(rng, 0.0, 1.0);
    let range = high - low;
    if range <= 0.0 {
        return x;
    }

    let delta1 = (x - low) / range;
    let delta2 = (high - x) / range;

    let delta_q = if u < 0.5 {
        let xy = 1.0 - delta1;
        let val = 2.0 * u + (1.0 - 2.0 * u) * xy.powf(eta + 1.0);
        val.powf(1.0 / (eta + 1.0)) - 1.0
    } else {
        let xy = 1.0 - delta2;
        let val = 2.0 * (1.0 - u) + 2.0 * (u - 0.5) * xy.powf(eta + 1.0);
        1.0 - val.powf(1.0 / (eta + 1.0))
    };

    (x + delta_q * range).clamp(low, high)
}
