//! Batch selection from a solver's candidate set.
//!
//! The solver returns a whole approximate Pareto set of the acquisition
//! values; a [`Selection`] decides which of those designs are actually sent
//! to the real problem next.

use parking_lot::Mutex;

use crate::dataset::Status;
use crate::error::{Error, Result};
use crate::pareto::calc_hypervolume;
use crate::rng_util;
use crate::solver::CandidateSet;
use crate::surrogate::{PredictOptions, Surrogate};
use crate::transformation::Transformation;

/// What a selection decided, alongside the chosen raw designs.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelectionInfo {
    /// Candidate indices in the order they were picked.
    pub indices: Vec<usize>,
    /// Hypervolume gained by each pick. Empty for selections that do not
    /// score candidates.
    pub improvements: Vec<f64>,
}

/// Picks the next batch from a candidate set.
pub trait Selection: Send + Sync {
    /// Short identifier used in framework descriptions.
    fn name(&self) -> &str;

    /// Store the run's hypervolume reference point.
    fn set_ref_point(&self, ref_point: &[f64]);

    /// Fit on the current normalized data.
    ///
    /// # Errors
    ///
    /// Implementations report malformed input.
    fn fit(&self, x: &[Vec<f64>], y: &[Vec<f64>]) -> Result<()>;

    /// Pick up to `batch_size` candidates and return them in raw design
    /// coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyCandidateSet`] if there is nothing to pick from,
    /// and propagates surrogate and transformation errors.
    fn select(
        &self,
        candidates: &CandidateSet,
        batch_size: usize,
        surrogate: &dyn Surrogate,
        status: &Status,
        transformation: &Transformation,
    ) -> Result<(Vec<Vec<f64>>, SelectionInfo)>;
}

fn gather_raw(
    candidates: &CandidateSet,
    indices: &[usize],
    transformation: &Transformation,
) -> Result<Vec<Vec<f64>>> {
    let picked: Vec<Vec<f64>> = indices.iter().map(|&i| candidates.x[i].clone()).collect();
    transformation.undo_x(&picked)
}

// ---------------------------------------------------------------------------
// Greedy hypervolume improvement
// ---------------------------------------------------------------------------

/// Greedy hypervolume-improvement selection.
///
/// Candidates are scored by the surrogate's predicted mean in raw objective
/// units. Each pick is the candidate whose prediction adds the most
/// hypervolume to the current front plus the earlier picks. Once no
/// remaining candidate improves the hypervolume, the rest of the batch is
/// drawn at random.
///
/// The reference point set through [`Selection::set_ref_point`] is used when
/// present, otherwise the one carried by the [`Status`].
pub struct HypervolumeImprovementSelection {
    rng: Mutex<fastrand::Rng>,
    ref_point: Mutex<Option<Vec<f64>>>,
}

impl HypervolumeImprovementSelection {
    /// Creates the selection with a random seed.
    #[must_use]
    pub fn new() -> Self {
        Self::from_rng(rng_util::make_rng(None))
    }

    /// Creates the selection with a fixed seed for the random fill.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(fastrand::Rng::with_seed(seed))
    }

    fn from_rng(rng: fastrand::Rng) -> Self {
        Self {
            rng: Mutex::new(rng),
            ref_point: Mutex::new(None),
        }
    }
}

impl Default for HypervolumeImprovementSelection {
    fn default() -> Self {
        Self::new()
    }
}

impl Selection for HypervolumeImprovementSelection {
    fn name(&self) -> &str {
        "hvi"
    }

    fn set_ref_point(&self, ref_point: &[f64]) {
        *self.ref_point.lock() = Some(ref_point.to_vec());
    }

    fn fit(&self, _x: &[Vec<f64>], _y: &[Vec<f64>]) -> Result<()> {
        Ok(())
    }

    fn select(
        &self,
        candidates: &CandidateSet,
        batch_size: usize,
        surrogate: &dyn Surrogate,
        status: &Status,
        transformation: &Transformation,
    ) -> Result<(Vec<Vec<f64>>, SelectionInfo)> {
        if candidates.is_empty() {
            return Err(Error::EmptyCandidateSet);
        }
        let ref_point = self
            .ref_point
            .lock()
            .clone()
            .unwrap_or_else(|| status.reference_point.clone());

        let mean = surrogate.evaluate(&candidates.x, PredictOptions::mean())?.f;
        let y_pred = transformation.undo_y(&mean)?;

        let mut front = status.pareto_front.clone();
        let mut hv = calc_hypervolume(&front, &ref_point);
        let mut remaining: Vec<usize> = (0..candidates.len()).collect();
        let mut info = SelectionInfo::default();
        let mut rng = self.rng.lock();

        for _ in 0..batch_size.min(candidates.len()) {
            // (position in `remaining`, gain, hypervolume after the pick)
            let mut best: Option<(usize, f64, f64)> = None;
            for (pos, &c) in remaining.iter().enumerate() {
                front.push(y_pred[c].clone());
                let new_hv = calc_hypervolume(&front, &ref_point);
                front.pop();
                let gain = new_hv - hv;
                if best.is_none_or(|(_, g, _)| gain > g) {
                    best = Some((pos, gain, new_hv));
                }
            }

            let (pos, gain, new_hv) = match best {
                Some(pick) if pick.1 > 0.0 => pick,
                _ => (rng.usize(0..remaining.len()), 0.0, hv),
            };
            let c = remaining.remove(pos);
            front.push(y_pred[c].clone());
            hv = new_hv;
            info.indices.push(c);
            info.improvements.push(gain);
        }

        trace_debug!(
            picked = info.indices.len(),
            gain = info.improvements.iter().sum::<f64>(),
            "hypervolume-improvement batch selected"
        );
        let x_next = gather_raw(candidates, &info.indices, transformation)?;
        Ok((x_next, info))
    }
}

// ---------------------------------------------------------------------------
// Random
// ---------------------------------------------------------------------------

/// Picks candidates uniformly at random, without replacement.
pub struct RandomSelection {
    rng: Mutex<fastrand::Rng>,
}

impl RandomSelection {
    /// Creates the selection with a random seed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(rng_util::make_rng(None)),
        }
    }

    /// Creates the selection with a fixed seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }
}

impl Default for RandomSelection {
    fn default() -> Self {
        Self::new()
    }
}

impl Selection for RandomSelection {
    fn name(&self) -> &str {
        "random"
    }

    fn set_ref_point(&self, _ref_point: &[f64]) {}

    fn fit(&self, _x: &[Vec<f64>], _y: &[Vec<f64>]) -> Result<()> {
        Ok(())
    }

    fn select(
        &self,
        candidates: &CandidateSet,
        batch_size: usize,
        _surrogate: &dyn Surrogate,
        _status: &Status,
        transformation: &Transformation,
    ) -> Result<(Vec<Vec<f64>>, SelectionInfo)> {
        if candidates.is_empty() {
            return Err(Error::EmptyCandidateSet);
        }
        let mut indices: Vec<usize> = (0..candidates.len()).collect();
        self.rng.lock().shuffle(&mut indices);
        indices.truncate(batch_size);

        let x_next = gather_raw(candidates, &indices, transformation)?;
        Ok((
            x_next,
            SelectionInfo {
                indices,
                improvements: Vec::new(),
            },
        ))
    }
}
