//! Acquisition functions over surrogate predictions.
//!
//! An [`Acquisition`] turns a [`Prediction`] into per-objective values that
//! the inner solver minimizes. It states which optional prediction fields it
//! needs through [`Acquisition::requirements`], so callers ask the surrogate
//! for exactly that.

use crate::error::{Error, Result};
use crate::surrogate::{Jacobians, Matrix, PredictOptions, Prediction};

/// Output of [`Acquisition::evaluate`].
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AcquisitionValue {
    /// Acquisition value per row and objective (lower is better).
    pub value: Matrix,
    /// Gradient of `value`, when the prediction carried gradients.
    pub gradient: Option<Jacobians>,
    /// Implementation-specific side output.
    pub extra: Option<Matrix>,
}

/// Scores surrogate predictions.
pub trait Acquisition: Send + Sync {
    /// Short identifier used in framework descriptions.
    fn name(&self) -> &str;

    /// Fit on the current normalized data.
    ///
    /// # Errors
    ///
    /// Implementations report malformed input.
    fn fit(&self, x: &[Vec<f64>], y: &[Vec<f64>]) -> Result<()>;

    /// Prediction fields this acquisition reads.
    fn requirements(&self) -> PredictOptions;

    /// Score a prediction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if a required prediction field is missing.
    fn evaluate(&self, prediction: &Prediction) -> Result<AcquisitionValue>;
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Uses the predicted mean as the acquisition value.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityAcquisition;

impl IdentityAcquisition {
    /// Creates the identity acquisition.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Acquisition for IdentityAcquisition {
    fn name(&self) -> &str {
        "identity"
    }

    fn fit(&self, _x: &[Vec<f64>], _y: &[Vec<f64>]) -> Result<()> {
        Ok(())
    }

    fn requirements(&self) -> PredictOptions {
        PredictOptions::mean()
    }

    fn evaluate(&self, prediction: &Prediction) -> Result<AcquisitionValue> {
        Ok(AcquisitionValue {
            value: prediction.f.clone(),
            gradient: prediction.df.clone(),
            extra: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Lower confidence bound
// ---------------------------------------------------------------------------

const DEFAULT_BETA: f64 = 0.1;
const DEFAULT_GAMMA: f64 = 0.1;
const DEFAULT_BETA_RHO: f64 = 0.1;

/// Noise-aware lower confidence bound.
///
/// ```text
/// value = f - beta * s + gamma * (rho_f - beta_rho * rho_s)
/// ```
///
/// The noise term is added only when the prediction carries `rho_f`/`rho_s`;
/// it penalizes regions where the surrogate expects noisy measurements. The
/// noise term itself is reported in [`AcquisitionValue::extra`].
///
/// # Examples
///
/// ```
/// use mobo::acquisition::{Acquisition, LcbAcquisition};
/// use mobo::surrogate::Prediction;
///
/// let lcb = LcbAcquisition::new().beta(2.0).gamma(0.0);
/// let p = Prediction {
///     f: vec![vec![1.0]],
///     s: Some(vec![vec![0.25]]),
///     ..Prediction::default()
/// };
/// assert_eq!(lcb.evaluate(&p).unwrap().value, vec![vec![0.5]]);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LcbAcquisition {
    beta: f64,
    gamma: f64,
    beta_rho: f64,
}

impl Default for LcbAcquisition {
    fn default() -> Self {
        Self {
            beta: DEFAULT_BETA,
            gamma: DEFAULT_GAMMA,
            beta_rho: DEFAULT_BETA_RHO,
        }
    }
}

impl LcbAcquisition {
    /// Creates an LCB with `beta = gamma = beta_rho = 0.1`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Weight of the predictive standard deviation.
    #[must_use]
    pub fn beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    /// Weight of the noise term.
    #[must_use]
    pub fn gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Weight of the noise model's own uncertainty inside the noise term.
    #[must_use]
    pub fn beta_rho(mut self, beta_rho: f64) -> Self {
        self.beta_rho = beta_rho;
        self
    }
}

/// `a + w * b`, element-wise over matrices.
fn axpy(a: &Matrix, w: f64, b: &Matrix) -> Matrix {
    a.iter()
        .zip(b)
        .map(|(ra, rb)| ra.iter().zip(rb).map(|(x, y)| x + w * y).collect())
        .collect()
}

/// `a + w * b`, element-wise over Jacobians.
fn axpy_jac(a: &Jacobians, w: f64, b: &Jacobians) -> Jacobians {
    a.iter().zip(b).map(|(ra, rb)| axpy(ra, w, rb)).collect()
}

impl Acquisition for LcbAcquisition {
    fn name(&self) -> &str {
        "lcb"
    }

    fn fit(&self, _x: &[Vec<f64>], _y: &[Vec<f64>]) -> Result<()> {
        Ok(())
    }

    fn requirements(&self) -> PredictOptions {
        PredictOptions::mean().with_std().with_noise()
    }

    fn evaluate(&self, prediction: &Prediction) -> Result<AcquisitionValue> {
        let s = prediction
            .s
            .as_ref()
            .ok_or(Error::Internal("lcb needs the predictive std"))?;
        let mut value = axpy(&prediction.f, -self.beta, s);
        let mut gradient = match (&prediction.df, &prediction.ds) {
            (Some(df), Some(ds)) => Some(axpy_jac(df, -self.beta, ds)),
            _ => None,
        };

        let mut extra = None;
        if let (Some(rho_f), Some(rho_s)) = (&prediction.rho_f, &prediction.rho_s) {
            let noise = axpy(rho_f, -self.beta_rho, rho_s);
            value = axpy(&value, self.gamma, &noise);
            gradient = match (gradient, &prediction.drho_f, &prediction.drho_s) {
                (Some(g), Some(drf), Some(drs)) => {
                    Some(axpy_jac(&g, self.gamma, &axpy_jac(drf, -self.beta_rho, drs)))
                }
                _ => None,
            };
            extra = Some(noise);
        }

        Ok(AcquisitionValue {
            value,
            gradient,
            extra,
        })
    }
}
