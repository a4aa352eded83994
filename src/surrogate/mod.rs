//! Surrogate models and the fit retry policy.
//!
//! A [`Surrogate`] is fitted on normalized data every iteration and then
//! queried for means, standard deviations and, optionally, noise estimates
//! and input gradients. Fitting can fail for numerical reasons, so the loop
//! never calls [`Surrogate::fit`] directly: it goes through
//! [`FitPolicy::fit`], which retries, falls back to an alternate strategy,
//! and finally keeps the previous model.

pub mod gp;

pub use gp::{GpSurrogate, GpSurrogateBuilder};

use crate::error::{Error, Result};

/// Rows by columns.
pub type Matrix = Vec<Vec<f64>>;

/// Per-row Jacobians, indexed `[row][objective][variable]`.
pub type Jacobians = Vec<Vec<Vec<f64>>>;

/// Which optional outputs a caller needs from [`Surrogate::evaluate`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PredictOptions {
    /// Predictive standard deviation.
    pub std: bool,
    /// Noise (`rho`) estimates.
    pub noise: bool,
    /// Gradients with respect to the input.
    pub gradient: bool,
}

impl PredictOptions {
    /// Mean only.
    #[must_use]
    pub fn mean() -> Self {
        Self::default()
    }

    /// Union of two requirement sets.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            std: self.std || other.std,
            noise: self.noise || other.noise,
            gradient: self.gradient || other.gradient,
        }
    }

    /// Request the standard deviation.
    #[must_use]
    pub fn with_std(mut self) -> Self {
        self.std = true;
        self
    }

    /// Request noise estimates.
    #[must_use]
    pub fn with_noise(mut self) -> Self {
        self.noise = true;
        self
    }

    /// Request gradients.
    #[must_use]
    pub fn with_gradient(mut self) -> Self {
        self.gradient = true;
        self
    }
}

/// Output of [`Surrogate::evaluate`], in the surrogate's fitted space.
///
/// Optional fields are `Some` when requested and supported. Gradient fields
/// are only filled alongside their value field.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Prediction {
    /// Predictive mean.
    pub f: Matrix,
    /// Predictive standard deviation.
    pub s: Option<Matrix>,
    /// Gradient of the mean.
    pub df: Option<Jacobians>,
    /// Gradient of the standard deviation.
    pub ds: Option<Jacobians>,
    /// Predicted noise level.
    pub rho_f: Option<Matrix>,
    /// Gradient of the predicted noise level.
    pub drho_f: Option<Jacobians>,
    /// Uncertainty of the predicted noise level.
    pub rho_s: Option<Matrix>,
    /// Gradient of `rho_s`.
    pub drho_s: Option<Jacobians>,
}

impl Prediction {
    /// Number of predicted rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.f.len()
    }

    /// Returns `true` if nothing was predicted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.f.is_empty()
    }
}

/// How a single fitting attempt should proceed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FitStrategy {
    /// The model's normal fitting procedure. `attempt` counts from zero.
    Primary {
        /// Zero-based primary attempt.
        attempt: usize,
    },
    /// An alternate, more robust procedure. `attempt` counts from zero.
    Fallback {
        /// Zero-based fallback attempt.
        attempt: usize,
    },
}

/// Why a fitting attempt failed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct FitFailure {
    /// Human-readable cause.
    pub reason: String,
}

impl FitFailure {
    /// Creates a failure with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A probabilistic model of the objectives.
///
/// Implementations must keep their previous fitted state when `fit` fails.
pub trait Surrogate: Send + Sync {
    /// Short identifier used in framework descriptions.
    fn name(&self) -> &str;

    /// Fit on normalized `x`, `y` and optional normalized `rho`.
    ///
    /// # Errors
    ///
    /// Returns a [`FitFailure`] if this attempt did not produce a model.
    fn fit(
        &self,
        x: &[Vec<f64>],
        y: &[Vec<f64>],
        rho: Option<&[Vec<f64>]>,
        strategy: FitStrategy,
    ) -> core::result::Result<(), FitFailure>;

    /// Returns `true` once any fit has succeeded.
    fn is_fitted(&self) -> bool;

    /// Predict at normalized `x`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFitted`] before the first successful fit and
    /// [`Error::DimensionMismatch`] for rows of the wrong width.
    fn evaluate(&self, x: &[Vec<f64>], options: PredictOptions) -> Result<Prediction>;
}

/// Result of fitting under a [`FitPolicy`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FitOutcome {
    /// A fresh model was fitted.
    Fitted {
        /// The strategy of the successful attempt.
        strategy: FitStrategy,
        /// Total attempts made, including the successful one.
        attempts: usize,
    },
    /// Every attempt failed; the previous model stays in use.
    Stale {
        /// Failure reason of the last attempt.
        reason: String,
        /// Total attempts made.
        attempts: usize,
    },
}

impl FitOutcome {
    /// Returns `true` for [`FitOutcome::Fitted`].
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        matches!(self, Self::Fitted { .. })
    }
}

/// Retry policy for surrogate fitting.
///
/// `primary_attempts` calls with [`FitStrategy::Primary`] are made first,
/// then `fallback_attempts` calls with [`FitStrategy::Fallback`]. The first
/// success wins. At least one fallback attempt is required, see
/// [`FitPolicy::validate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FitPolicy {
    /// Attempts with the primary strategy. Default: 5.
    pub primary_attempts: usize,
    /// Attempts with the fallback strategy. Default: 1.
    pub fallback_attempts: usize,
}

impl Default for FitPolicy {
    fn default() -> Self {
        Self {
            primary_attempts: 5,
            fallback_attempts: 1,
        }
    }
}

impl FitPolicy {
    /// Check that a failed primary fit always gets a fallback attempt.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFitPolicy`] if `fallback_attempts` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.fallback_attempts == 0 {
            return Err(Error::InvalidFitPolicy(format!(
                "{} primary and 0 fallback attempts; at least one fallback attempt is required",
                self.primary_attempts
            )));
        }
        Ok(())
    }

    /// Fit `surrogate` under this policy.
    ///
    /// When every attempt fails but the surrogate still holds an earlier
    /// model, the outcome is [`FitOutcome::Stale`] and a warning is logged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoUsableModel`] if every attempt failed and the
    /// surrogate has never been fitted.
    pub fn fit(
        &self,
        surrogate: &dyn Surrogate,
        x: &[Vec<f64>],
        y: &[Vec<f64>],
        rho: Option<&[Vec<f64>]>,
    ) -> Result<FitOutcome> {
        let strategies = (0..self.primary_attempts)
            .map(|attempt| FitStrategy::Primary { attempt })
            .chain((0..self.fallback_attempts).map(|attempt| FitStrategy::Fallback { attempt }));

        let mut attempts = 0;
        let mut reason = String::from("no fitting attempt configured");
        for strategy in strategies {
            attempts += 1;
            match surrogate.fit(x, y, rho, strategy) {
                Ok(()) => {
                    if attempts > 1 {
                        trace_debug!(attempts, ?strategy, "surrogate fitted after retries");
                    }
                    return Ok(FitOutcome::Fitted { strategy, attempts });
                }
                Err(failure) => {
                    trace_debug!(attempts, ?strategy, reason = %failure, "surrogate fit attempt failed");
                    reason = failure.reason;
                }
            }
        }

        if surrogate.is_fitted() {
            trace_warn!(attempts, reason = %reason, "all surrogate fits failed, keeping previous model");
            Ok(FitOutcome::Stale { reason, attempts })
        } else {
            Err(Error::NoUsableModel(reason))
        }
    }
}
