//! Pareto front and hypervolume utilities.
//!
//! All objectives are **minimized**. Callers holding maximization objectives
//! negate them before calling into this module.
//!
//! | Function | Purpose |
//! |---|---|
//! | [`find_pareto_front`] | Non-dominated rows of an objective matrix, with their indices |
//! | [`calc_hypervolume`] | Volume dominated by a front and bounded by a reference point |
//! | [`non_dominated_sort`] | Rank rows into successive fronts (front 0, 1, …) |
//! | [`crowding_distance`] | Spread of the members of one front |
//!
//! # Duplicates
//!
//! Identical rows do not dominate each other, so every copy of a
//! non-dominated row stays in the front.
//!
//! # Example
//!
//! ```
//! use mobo::pareto::{calc_hypervolume, find_pareto_front};
//!
//! let y = vec![
//!     vec![1.0, 5.0],
//!     vec![5.0, 1.0],
//!     vec![3.0, 3.0],
//!     vec![4.0, 4.0], // dominated by (3, 3)
//! ];
//! let (front, indices) = find_pareto_front(&y);
//! assert_eq!(indices, vec![0, 1, 2]);
//!
//! let hv = calc_hypervolume(&front, &[6.0, 6.0]);
//! assert!((hv - 13.0).abs() < 1e-12);
//! ```

/// Returns `true` if `a` Pareto-dominates `b`: no worse in every objective
/// and strictly better in at least one.
#[must_use]
pub fn dominates(a: &[f64], b: &[f64]) -> bool {
    debug_assert_eq!(a.len(), b.len());

    let mut strictly_better = false;
    for (&av, &bv) in a.iter().zip(b.iter()) {
        if av > bv {
            return false;
        }
        if av < bv {
            strictly_better = true;
        }
    }
    strictly_better
}

/// Fast non-dominated sorting (Deb et al., 2002).
///
/// Returns `Vec<Vec<usize>>` where `fronts[0]` is the Pareto front,
/// each inner vec contains indices into `values`.
///
/// Complexity: O(M * N^2) where M = objectives, N = solutions.
pub(crate) fn fast_non_dominated_sort(values: &[Vec<f64>]) -> Vec<Vec<usize>> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }

    // S_p: set of solutions dominated by p
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    // n_p: domination count for p
    let mut domination_count: Vec<usize> = vec![0; n];

    for i in 0..n {
        for j in (i + 1)..n {
            if dominates(&values[i], &values[j]) {
                dominated_by[i].push(j);
                domination_count[j] += 1;
            } else if dominates(&values[j], &values[i]) {
                dominated_by[j].push(i);
                domination_count[i] += 1;
            }
        }
    }

    let mut fronts: Vec<Vec<usize>> = Vec::new();
    let mut current_front: Vec<usize> = (0..n).filter(|&i| domination_count[i] == 0).collect();

    while !current_front.is_empty() {
        let mut next_front: Vec<usize> = Vec::new();
        for &p in &current_front {
            for &q in &dominated_by[p] {
                domination_count[q] -= 1;
                if domination_count[q] == 0 {
                    next_front.push(q);
                }
            }
        }
        fronts.push(current_front);
        current_front = next_front;
    }

    fronts
}

/// Crowding distance for one front (index-based, internal API).
///
/// Boundary solutions get `f64::INFINITY`. Returns one distance value per
/// solution in the front, in the same order as `front_indices`.
pub(crate) fn crowding_distance_indexed(front_indices: &[usize], values: &[Vec<f64>]) -> Vec<f64> {
    let n = front_indices.len();
    if n <= 2 {
        return vec![f64::INFINITY; n];
    }

    let m = values[front_indices[0]].len();
    let mut distances = vec![0.0_f64; n];

    let val = |front_pos: usize, obj: usize| -> f64 { values[front_indices[front_pos]][obj] };

    for obj in 0..m {
        let mut sorted: Vec<usize> = (0..n).collect();
        sorted.sort_by(|&a, &b| {
            val(a, obj)
                .partial_cmp(&val(b, obj))
                .unwrap_or(core::cmp::Ordering::Equal)
        });

        distances[sorted[0]] = f64::INFINITY;
        distances[sorted[n - 1]] = f64::INFINITY;

        let range = val(sorted[n - 1], obj) - val(sorted[0], obj);
        if range > 0.0 {
            for i in 1..(n - 1) {
                distances[sorted[i]] += (val(sorted[i + 1], obj) - val(sorted[i - 1], obj)) / range;
            }
        }
    }

    distances
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Find the non-dominated rows of `y`.
///
/// Returns the front rows together with their indices into `y`, in
/// ascending index order (i.e. arrival order). Exact duplicates of a
/// non-dominated row are all retained. An empty input yields an empty front.
#[must_use]
pub fn find_pareto_front(y: &[Vec<f64>]) -> (Vec<Vec<f64>>, Vec<usize>) {
    let indices: Vec<usize> = (0..y.len())
        .filter(|&i| !y.iter().any(|other| dominates(other, &y[i])))
        .collect();
    let front = indices.iter().map(|&i| y[i].clone()).collect();
    (front, indices)
}

/// Compute the hypervolume dominated by `front` and bounded by `ref_point`.
///
/// Points that do not strictly dominate `ref_point` in every objective are
/// excluded and contribute nothing. The caller is responsible for choosing a
/// reference point that is worse than every feasible objective vector;
/// see [`ReferencePoint`](crate::reference::ReferencePoint).
///
/// `front` does not need to be non-dominated; dominated points simply add
/// no volume. Uses recursive slicing on the last objective.
#[must_use]
pub fn calc_hypervolume(front: &[Vec<f64>], ref_point: &[f64]) -> f64 {
    if front.is_empty() || ref_point.is_empty() {
        return 0.0;
    }
    debug_assert!(front.iter().all(|p| p.len() == ref_point.len()));

    let filtered: Vec<Vec<f64>> = front
        .iter()
        .filter(|p| p.iter().zip(ref_point).all(|(&pv, &rv)| pv < rv))
        .cloned()
        .collect();

    if filtered.is_empty() {
        return 0.0;
    }

    hv_recursive(&filtered, ref_point)
}

/// Recursive hypervolume via slicing on the last objective.
///
/// All points are dominated by `reference`.
fn hv_recursive(points: &[Vec<f64>], reference: &[f64]) -> f64 {
    let d = reference.len();

    if d == 1 {
        let min_val = points.iter().map(|p| p[0]).fold(f64::INFINITY, f64::min);
        return (reference[0] - min_val).max(0.0);
    }

    if points.len() == 1 {
        return points[0]
            .iter()
            .zip(reference)
            .map(|(&p, &r)| (r - p).max(0.0))
            .product();
    }

    let mut sorted: Vec<&Vec<f64>> = points.iter().collect();
    sorted.sort_by(|a, b| {
        a[d - 1]
            .partial_cmp(&b[d - 1])
            .unwrap_or(core::cmp::Ordering::Equal)
    });

    let sub_ref = &reference[..d - 1];
    let mut result = 0.0;

    for i in 0..sorted.len() {
        let height = if i + 1 < sorted.len() {
            sorted[i + 1][d - 1] - sorted[i][d - 1]
        } else {
            reference[d - 1] - sorted[i][d - 1]
        };

        if height <= 0.0 {
            continue;
        }

        // Slab between this point and the next: everything sorted so far,
        // projected onto the first d-1 objectives.
        let projected: Vec<Vec<f64>> = sorted[..=i].iter().map(|p| p[..d - 1].to_vec()).collect();
        let (non_dom, _) = find_pareto_front(&projected);

        if !non_dom.is_empty() {
            result += height * hv_recursive(&non_dom, sub_ref);
        }
    }

    result
}

/// Rank solutions into successive non-dominated fronts.
///
/// `fronts[0]` is the Pareto front, `fronts[1]` is dominated only by
/// front 0, and so on. Each inner vec holds indices into `solutions`.
#[must_use]
pub fn non_dominated_sort(solutions: &[Vec<f64>]) -> Vec<Vec<usize>> {
    fast_non_dominated_sort(solutions)
}

/// Compute crowding distance for diversity measurement.
///
/// Returns one distance value per solution in `front` (same order).
/// Boundary solutions receive [`f64::INFINITY`].
#[must_use]
pub fn crowding_distance(front: &[Vec<f64>]) -> Vec<f64> {
    let indices: Vec<usize> = (0..front.len()).collect();
    crowding_distance_indexed(&indices, front)
}
