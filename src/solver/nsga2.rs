//! NSGA-II over the surrogate problem.
//!
//! The initial population is the current dataset (clamped to the normalized
//! bounds), topped up with uniform random designs. Each generation breeds
//! offspring with binary tournament, SBX crossover and polynomial mutation,
//! then keeps the best `population_size` individuals of parents plus
//! offspring by non-dominated rank and crowding distance. The first front of
//! the final population is the returned [`CandidateSet`].
//!
//! # Configuration
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `population_size` | 100 | Individuals per generation |
//! | `n_generations` | 10 | Generations per `solve` |
//! | `crossover_prob` | 0.9 | Probability of applying SBX to a pair |
//! | `crossover_eta` | 20.0 | SBX distribution index |
//! | `mutation_eta` | 20.0 | Polynomial mutation distribution index |
//! | `seed` | random | RNG seed for reproducibility |
//!
//! # Examples
//!
//! ```
//! use mobo::solver::Nsga2Solver;
//!
//! let solver = Nsga2Solver::builder()
//!     .population_size(50)
//!     .n_generations(20)
//!     .seed(42)
//!     .build();
//! ```

use std::path::Path;

use parking_lot::Mutex;

use super::genetic::{crossover, mutate, tournament_select};
use super::{CandidateSet, Solver};
use crate::error::{Error, Result};
use crate::problem::Problem;
use crate::surrogate_problem::SurrogateProblem;
use crate::{pareto, rng_util};

/// NSGA-II solver.
pub struct Nsga2Solver {
    config: Nsga2Config,
    state: Mutex<Nsga2State>,
}

impl Nsga2Solver {
    /// Creates a new NSGA-II solver with a random seed.
    #[must_use]
    pub fn new() -> Self {
        Nsga2SolverBuilder::default().build()
    }

    /// Creates a new NSGA-II solver with a fixed seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Nsga2SolverBuilder::default().seed(seed).build()
    }

    /// Creates a builder for configuring an `Nsga2Solver`.
    #[must_use]
    pub fn builder() -> Nsga2SolverBuilder {
        Nsga2SolverBuilder::default()
    }
}

impl Default for Nsga2Solver {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`Nsga2Solver`].
#[derive(Debug, Clone, Default)]
pub struct Nsga2SolverBuilder {
    population_size: Option<usize>,
    n_generations: Option<usize>,
    crossover_prob: Option<f64>,
    crossover_eta: Option<f64>,
    mutation_eta: Option<f64>,
    seed: Option<u64>,
}

impl Nsga2SolverBuilder {
    /// Sets the population size. Default: 100, minimum 2.
    #[must_use]
    pub fn population_size(mut self, size: usize) -> Self {
        self.population_size = Some(size);
        self
    }

    /// Sets the number of generations per solve. Default: 10.
    #[must_use]
    pub fn n_generations(mut self, n: usize) -> Self {
        self.n_generations = Some(n);
        self
    }

    /// Sets the crossover probability. Default: 0.9.
    #[must_use]
    pub fn crossover_prob(mut self, prob: f64) -> Self {
        self.crossover_prob = Some(prob);
        self
    }

    /// Sets the SBX distribution index. Default: 20.0.
    #[must_use]
    pub fn crossover_eta(mut self, eta: f64) -> Self {
        self.crossover_eta = Some(eta);
        self
    }

    /// Sets the polynomial mutation distribution index. Default: 20.0.
    #[must_use]
    pub fn mutation_eta(mut self, eta: f64) -> Self {
        self.mutation_eta = Some(eta);
        self
    }

    /// Sets the random seed for reproducibility.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builds the configured [`Nsga2Solver`].
    #[must_use]
    pub fn build(self) -> Nsga2Solver {
        let config = Nsga2Config {
            population_size: self.population_size.unwrap_or(100).max(2),
            n_generations: self.n_generations.unwrap_or(10),
            crossover_prob: self.crossover_prob.unwrap_or(0.9),
            crossover_eta: self.crossover_eta.unwrap_or(20.0),
            mutation_eta: self.mutation_eta.unwrap_or(20.0),
        };
        Nsga2Solver {
            config,
            state: Mutex::new(Nsga2State {
                rng: rng_util::make_rng(self.seed),
                ref_point: None,
                last: None,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Internal types
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct Nsga2Config {
    population_size: usize,
    n_generations: usize,
    crossover_prob: f64,
    crossover_eta: f64,
    mutation_eta: f64,
}

struct Nsga2State {
    rng: fastrand::Rng,
    ref_point: Option<Vec<f64>>,
    last: Option<CandidateSet>,
}

/// Snapshot written by [`Solver::save`].
#[cfg(feature = "serde")]
#[derive(serde::Serialize)]
struct SavedSolution<'a> {
    version: u32,
    solver: &'static str,
    reference_point: Option<&'a [f64]>,
    candidates: Option<&'a CandidateSet>,
}

// ---------------------------------------------------------------------------
// NSGA-II generation algorithm
// ---------------------------------------------------------------------------

/// Non-dominated rank and crowding distance of every individual.
fn rank_and_crowding(values: &[Vec<f64>]) -> (Vec<usize>, Vec<f64>) {
    let n = values.len();
    let mut rank = vec![0_usize; n];
    let mut crowding = vec![0.0_f64; n];
    for (front_rank, front) in pareto::fast_non_dominated_sort(values).iter().enumerate() {
        let cd = pareto::crowding_distance_indexed(front, values);
        for (i, &idx) in front.iter().enumerate() {
            rank[idx] = front_rank;
            crowding[idx] = cd[i];
        }
    }
    (rank, crowding)
}

/// Indices of the `n` survivors: whole fronts first, the last partial front
/// by descending crowding distance.
fn survive(values: &[Vec<f64>], n: usize) -> Vec<usize> {
    let mut selected: Vec<usize> = Vec::with_capacity(n);
    for front in pareto::fast_non_dominated_sort(values) {
        if selected.len() + front.len() <= n {
            selected.extend_from_slice(&front);
        } else {
            let cd = pareto::crowding_distance_indexed(&front, values);
            let mut order: Vec<usize> = (0..front.len()).collect();
            order.sort_by(|&a, &b| {
                cd[b]
                    .partial_cmp(&cd[a])
                    .unwrap_or(core::cmp::Ordering::Equal)
            });
            let remaining = n - selected.len();
            selected.extend(order[..remaining].iter().map(|&k| front[k]));
            break;
        }
    }
    selected
}

fn gather(rows: &[Vec<f64>], indices: &[usize]) -> Vec<Vec<f64>> {
    indices.iter().map(|&i| rows[i].clone()).collect()
}

impl Nsga2Solver {
    fn offspring(
        &self,
        rng: &mut fastrand::Rng,
        population: &[Vec<f64>],
        values: &[Vec<f64>],
        lower: &[f64],
        upper: &[f64],
    ) -> Vec<Vec<f64>> {
        let (rank, crowding) = rank_and_crowding(values);
        let pop_size = self.config.population_size;
        let mut offspring = Vec::with_capacity(pop_size);
        while offspring.len() < pop_size {
            let p1 = tournament_select(rng, &rank, &crowding);
            let p2 = tournament_select(rng, &rank, &crowding);
            let (mut child1, mut child2) = crossover(
                rng,
                &population[p1],
                &population[p2],
                lower,
                upper,
                self.config.crossover_prob,
                self.config.crossover_eta,
            );
            mutate(rng, &mut child1, lower, upper, self.config.mutation_eta);
            mutate(rng, &mut child2, lower, upper, self.config.mutation_eta);

            offspring.push(child1);
            if offspring.len() < pop_size {
                offspring.push(child2);
            }
        }
        offspring
    }
}

impl Solver for Nsga2Solver {
    fn name(&self) -> &str {
        "nsga2"
    }

    fn set_ref_point(&self, ref_point: &[f64]) {
        self.state.lock().ref_point = Some(ref_point.to_vec());
    }

    fn solve(
        &self,
        problem: &SurrogateProblem<'_>,
        x: &[Vec<f64>],
        _y: &[Vec<f64>],
        _rho: Option<&[Vec<f64>]>,
    ) -> Result<CandidateSet> {
        let bounds = problem.bounds();
        Error::check_columns("X", bounds.n_var(), x)?;
        let pop_size = self.config.population_size;
        let mut state = self.state.lock();
        let rng = &mut state.rng;

        let mut population: Vec<Vec<f64>> = x.iter().map(|row| bounds.clamp(row)).collect();
        while population.len() < pop_size {
            population.push(rng_util::point_in_box(rng, &bounds.xl, &bounds.xu));
        }
        let mut values = problem.evaluate(&population)?.f;
        let keep = survive(&values, pop_size);
        population = gather(&population, &keep);
        values = gather(&values, &keep);

        for _generation in 0..self.config.n_generations {
            let offspring = self.offspring(rng, &population, &values, &bounds.xl, &bounds.xu);
            let offspring_values = problem.evaluate(&offspring)?.f;
            population.extend(offspring);
            values.extend(offspring_values);

            let keep = survive(&values, pop_size);
            population = gather(&population, &keep);
            values = gather(&values, &keep);
        }

        let first = pareto::fast_non_dominated_sort(&values)
            .into_iter()
            .next()
            .unwrap_or_default();
        let solution = CandidateSet {
            x: gather(&population, &first),
            y: gather(&values, &first),
        };
        trace_debug!(
            generations = self.config.n_generations,
            candidates = solution.len(),
            "nsga2 solved surrogate problem"
        );

        state.last = Some(solution.clone());
        Ok(solution)
    }

    fn last_solution(&self) -> Option<CandidateSet> {
        self.state.lock().last.clone()
    }

    /// Writes the reference point and last candidate set as JSON.
    #[cfg(feature = "serde")]
    fn save(&self, path: &Path) -> Result<()> {
        let state = self.state.lock();
        let snapshot = SavedSolution {
            version: 1,
            solver: "nsga2",
            reference_point: state.ref_point.as_deref(),
            candidates: state.last.as_ref(),
        };

        // Atomic write: temp file in the same directory, then rename.
        let parent = path.parent().unwrap_or(Path::new("."));
        let tmp_path = parent.join(format!(
            ".{}.tmp",
            path.file_name().unwrap_or_default().to_string_lossy()
        ));
        let storage = |e: &dyn core::fmt::Display| Error::Storage(e.to_string());
        let file = std::fs::File::create(&tmp_path).map_err(|e| storage(&e))?;
        serde_json::to_writer_pretty(file, &snapshot).map_err(|e| storage(&e))?;
        std::fs::rename(&tmp_path, path).map_err(|e| storage(&e))
    }

    #[cfg(not(feature = "serde"))]
    fn save(&self, path: &Path) -> Result<()> {
        Err(Error::Storage(format!(
            "cannot save to {}: built without the `serde` feature",
            path.display()
        )))
    }
}
