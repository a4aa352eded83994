//! Gaussian process surrogate with a Matérn 5/2 kernel.
//!
//! One independent GP is fitted per objective. Each GP uses ARD
//! lengthscales set to the per-dimension standard deviation of the training
//! inputs, a unit signal variance on internally standardized targets, and a
//! Cholesky factorization of `K + D`, where `D` holds the observation noise.
//!
//! When the dataset carries `rho`, two things change:
//!
//! - `rho²` is added to the diagonal of `D` per training point, so noisy
//!   observations are trusted less;
//! - a second GP per objective is fitted on `rho` itself and answers the
//!   `noise` part of [`PredictOptions`].
//!
//! # Fitting strategies
//!
//! | Strategy | Diagonal jitter |
//! |----------|-----------------|
//! | [`FitStrategy::Primary`] `{ attempt }` | `noise_variance * 2^attempt` |
//! | [`FitStrategy::Fallback`] `{ attempt }` | `fallback_jitter * 10^attempt` |
//!
//! A failed attempt leaves the previously fitted model untouched.
//!
//! # Configuration
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `noise_variance` | 1e-6 | Jitter added to the kernel diagonal |
//! | `fallback_jitter` | 1e-3 | Jitter of the first fallback attempt |
//! | `min_lengthscale` | 0.01 | Floor on ARD lengthscales |
//! | `max_train_points` | 100 | Most recent rows used for fitting |
//!
//! # Examples
//!
//! ```
//! use mobo::surrogate::{FitStrategy, GpSurrogate, PredictOptions, Surrogate};
//!
//! let gp = GpSurrogate::builder().max_train_points(50).build();
//! let x = vec![vec![0.0], vec![0.5], vec![1.0]];
//! let y = vec![vec![1.0, 0.0], vec![0.25, 0.25], vec![0.0, 1.0]];
//! gp.fit(&x, &y, None, FitStrategy::Primary { attempt: 0 }).unwrap();
//!
//! let p = gp.evaluate(&[vec![0.5]], PredictOptions::mean().with_std()).unwrap();
//! assert!((p.f[0][0] - 0.25).abs() < 1e-3);
//! ```

use nalgebra::{DMatrix, DVector};
use parking_lot::Mutex;

use super::{FitFailure, FitStrategy, PredictOptions, Prediction, Surrogate};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Gaussian process surrogate, one GP per objective.
pub struct GpSurrogate {
    config: GpConfig,
    state: Mutex<Option<GpFit>>,
}

impl GpSurrogate {
    /// Creates a GP surrogate with default settings.
    #[must_use]
    pub fn new() -> Self {
        GpSurrogateBuilder::new().build()
    }

    /// Creates a builder for configuring a `GpSurrogate`.
    #[must_use]
    pub fn builder() -> GpSurrogateBuilder {
        GpSurrogateBuilder::new()
    }
}

impl Default for GpSurrogate {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for configuring a [`GpSurrogate`].
///
/// All options have sensible defaults:
/// - `noise_variance`: 1e-6
/// - `fallback_jitter`: 1e-3
/// - `min_lengthscale`: 0.01
/// - `max_train_points`: 100
#[derive(Debug, Clone, Default)]
pub struct GpSurrogateBuilder {
    noise_variance: Option<f64>,
    fallback_jitter: Option<f64>,
    min_lengthscale: Option<f64>,
    max_train_points: Option<usize>,
}

impl GpSurrogateBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the jitter added to the kernel diagonal by the primary strategy.
    ///
    /// Default: 1e-6.
    #[must_use]
    pub fn noise_variance(mut self, v: f64) -> Self {
        self.noise_variance = Some(v);
        self
    }

    /// Sets the diagonal jitter of the first fallback attempt. Each further
    /// fallback attempt multiplies it by ten.
    ///
    /// Default: 1e-3.
    #[must_use]
    pub fn fallback_jitter(mut self, v: f64) -> Self {
        self.fallback_jitter = Some(v);
        self
    }

    /// Sets the lower bound on ARD lengthscales.
    ///
    /// Default: 0.01.
    #[must_use]
    pub fn min_lengthscale(mut self, v: f64) -> Self {
        self.min_lengthscale = Some(v);
        self
    }

    /// Caps the number of training rows; the most recent rows are kept.
    /// Fitting costs O(n³) in this number.
    ///
    /// Default: 100.
    #[must_use]
    pub fn max_train_points(mut self, n: usize) -> Self {
        self.max_train_points = Some(n);
        self
    }

    /// Builds the configured [`GpSurrogate`].
    #[must_use]
    pub fn build(self) -> GpSurrogate {
        GpSurrogate {
            config: GpConfig {
                noise_variance: self.noise_variance.unwrap_or(DEFAULT_NOISE_VAR),
                fallback_jitter: self.fallback_jitter.unwrap_or(DEFAULT_FALLBACK_JITTER),
                min_lengthscale: self.min_lengthscale.unwrap_or(DEFAULT_MIN_LENGTHSCALE),
                max_train_points: self.max_train_points.unwrap_or(DEFAULT_MAX_TRAIN).max(1),
            },
            state: Mutex::new(None),
        }
    }
}

// ---------------------------------------------------------------------------
// Internal types
// ---------------------------------------------------------------------------

const DEFAULT_NOISE_VAR: f64 = 1e-6;
const DEFAULT_FALLBACK_JITTER: f64 = 1e-3;
const DEFAULT_MIN_LENGTHSCALE: f64 = 0.01;
const DEFAULT_MAX_TRAIN: usize = 100;

#[derive(Clone, Debug)]
struct GpConfig {
    noise_variance: f64,
    fallback_jitter: f64,
    min_lengthscale: f64,
    max_train_points: usize,
}

/// A fitted single-output GP.
struct GpModel {
    /// Cholesky factor of `K + D`.
    cholesky: nalgebra::linalg::Cholesky<f64, nalgebra::Dyn>,
    /// `α = (K + D)^{-1} y`.
    alpha: DVector<f64>,
    x_train: Vec<Vec<f64>>,
    lengthscales: Vec<f64>,
    signal_var: f64,
    y_mean: f64,
    y_std: f64,
}

/// Everything produced by one successful fit.
struct GpFit {
    n_var: usize,
    objectives: Vec<GpModel>,
    noise: Option<Vec<GpModel>>,
}

/// Prediction of one GP at one point, in target units.
struct PointPrediction {
    mean: f64,
    std: f64,
    dmean: Vec<f64>,
    dstd: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Matérn 5/2 kernel
// ---------------------------------------------------------------------------

const SQRT_5: f64 = 2.236_067_977_499_79;

/// Scaled distance `r = sqrt(Σ ((x1_i - x2_i) / l_i)²)`.
fn scaled_distance(x1: &[f64], x2: &[f64], lengthscales: &[f64]) -> f64 {
    x1.iter()
        .zip(x2)
        .zip(lengthscales)
        .map(|((a, b), l)| ((a - b) / l).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// `k(x1, x2) = σ² (1 + √5 r + 5/3 r²) exp(-√5 r)`
fn matern52(x1: &[f64], x2: &[f64], lengthscales: &[f64], signal_var: f64) -> f64 {
    let r = scaled_distance(x1, x2, lengthscales);
    let sqrt5_r = SQRT_5 * r;
    signal_var * (1.0 + sqrt5_r + 5.0 / 3.0 * r * r) * (-sqrt5_r).exp()
}

/// `∂k/∂x1_i = -5/3 σ² (1 + √5 r) exp(-√5 r) (x1_i - x2_i) / l_i²`
fn matern52_grad(x1: &[f64], x2: &[f64], lengthscales: &[f64], signal_var: f64) -> Vec<f64> {
    let r = scaled_distance(x1, x2, lengthscales);
    let sqrt5_r = SQRT_5 * r;
    let common = -5.0 / 3.0 * signal_var * (1.0 + sqrt5_r) * (-sqrt5_r).exp();
    x1.iter()
        .zip(x2)
        .zip(lengthscales)
        .map(|((a, b), l)| common * (a - b) / (l * l))
        .collect()
}

/// Build `K + D` with a per-point diagonal.
fn kernel_matrix(x: &[Vec<f64>], lengthscales: &[f64], signal_var: f64, diag: &[f64]) -> DMatrix<f64> {
    let n = x.len();
    DMatrix::from_fn(n, n, |i, j| {
        let k = matern52(&x[i], &x[j], lengthscales, signal_var);
        if i == j { k + diag[i] } else { k }
    })
}

fn kernel_vector(
    x_star: &[f64],
    x_train: &[Vec<f64>],
    lengthscales: &[f64],
    signal_var: f64,
) -> DVector<f64> {
    DVector::from_fn(x_train.len(), |i, _| {
        matern52(x_star, &x_train[i], lengthscales, signal_var)
    })
}

// ---------------------------------------------------------------------------
// GP fitting and prediction
// ---------------------------------------------------------------------------

/// Fit a single-output GP.
///
/// `noise_sd` is the per-point observation noise in target units.
#[allow(clippy::cast_precision_loss)]
fn fit_gp(
    x_train: &[Vec<f64>],
    y_train: &[f64],
    noise_sd: Option<&[f64]>,
    jitter: f64,
    min_lengthscale: f64,
) -> core::result::Result<GpModel, FitFailure> {
    let n = y_train.len();
    if n == 0 {
        return Err(FitFailure::new("no training data"));
    }
    if y_train.iter().any(|v| !v.is_finite()) {
        return Err(FitFailure::new("non-finite training targets"));
    }

    let y_mean = y_train.iter().sum::<f64>() / n as f64;
    let y_var = if n > 1 {
        y_train.iter().map(|&y| (y - y_mean).powi(2)).sum::<f64>() / (n - 1) as f64
    } else {
        1.0
    };
    let y_std = y_var.sqrt().max(1e-10);
    let y_standardized: Vec<f64> = y_train.iter().map(|&y| (y - y_mean) / y_std).collect();

    let d = x_train.first().map_or(0, Vec::len);
    let lengthscales: Vec<f64> = (0..d)
        .map(|j| {
            let mean_j = x_train.iter().map(|x| x[j]).sum::<f64>() / n as f64;
            let var_j = x_train.iter().map(|x| (x[j] - mean_j).powi(2)).sum::<f64>() / n as f64;
            var_j.sqrt().max(min_lengthscale)
        })
        .collect();

    // Targets are standardized, so the signal variance is 1.
    let signal_var = 1.0;

    let diag: Vec<f64> = (0..n)
        .map(|i| {
            let sd = noise_sd.map_or(0.0, |s| s[i] / y_std);
            sd * sd + jitter
        })
        .collect();
    if diag.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(FitFailure::new("invalid observation noise"));
    }

    let k = kernel_matrix(x_train, &lengthscales, signal_var, &diag);
    let cholesky = nalgebra::linalg::Cholesky::new(k)
        .ok_or_else(|| FitFailure::new("kernel matrix is not positive definite"))?;

    let y_vec = DVector::from_column_slice(&y_standardized);
    let alpha = cholesky.solve(&y_vec);
    if alpha.iter().any(|v| !v.is_finite()) {
        return Err(FitFailure::new("non-finite GP weights"));
    }

    Ok(GpModel {
        cholesky,
        alpha,
        x_train: x_train.to_vec(),
        lengthscales,
        signal_var,
        y_mean,
        y_std,
    })
}

impl GpModel {
    /// Posterior mean and std (and their gradients) in target units.
    fn predict(&self, x: &[f64], gradient: bool) -> PointPrediction {
        let k_star = kernel_vector(x, &self.x_train, &self.lengthscales, self.signal_var);
        let mean = k_star.dot(&self.alpha);
        let v = self.cholesky.solve(&k_star);
        let var = (self.signal_var - k_star.dot(&v)).max(0.0);
        let std = var.sqrt();

        let (dmean, dstd) = if gradient {
            let mut dmean = vec![0.0; x.len()];
            let mut dvar = vec![0.0; x.len()];
            for (j, xj) in self.x_train.iter().enumerate() {
                let dk = matern52_grad(x, xj, &self.lengthscales, self.signal_var);
                for ((dm, dv), g) in dmean.iter_mut().zip(dvar.iter_mut()).zip(&dk) {
                    *dm += self.alpha[j] * g;
                    *dv -= 2.0 * v[j] * g;
                }
            }
            let dstd = if std > 1e-12 {
                dvar.iter().map(|g| g / (2.0 * std) * self.y_std).collect()
            } else {
                vec![0.0; x.len()]
            };
            (dmean.iter().map(|g| g * self.y_std).collect(), dstd)
        } else {
            (Vec::new(), Vec::new())
        };

        PointPrediction {
            mean: mean * self.y_std + self.y_mean,
            std: std * self.y_std,
            dmean,
            dstd,
        }
    }
}

fn column(rows: &[Vec<f64>], j: usize) -> Vec<f64> {
    rows.iter().map(|r| r[j]).collect()
}

/// Per-objective predictions reshaped into row-major matrices.
struct Collected {
    mean: Vec<Vec<f64>>,
    std: Vec<Vec<f64>>,
    dmean: Vec<Vec<Vec<f64>>>,
    dstd: Vec<Vec<Vec<f64>>>,
}

fn predict_all(models: &[GpModel], x: &[Vec<f64>], gradient: bool) -> Collected {
    let mut out = Collected {
        mean: Vec::with_capacity(x.len()),
        std: Vec::with_capacity(x.len()),
        dmean: Vec::with_capacity(x.len()),
        dstd: Vec::with_capacity(x.len()),
    };
    for row in x {
        let preds: Vec<PointPrediction> = models.iter().map(|m| m.predict(row, gradient)).collect();
        out.mean.push(preds.iter().map(|p| p.mean).collect());
        out.std.push(preds.iter().map(|p| p.std).collect());
        if gradient {
            out.dmean.push(preds.iter().map(|p| p.dmean.clone()).collect());
            out.dstd.push(preds.into_iter().map(|p| p.dstd).collect());
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Surrogate impl
// ---------------------------------------------------------------------------

fn clamped_exponent(attempt: usize) -> i32 {
    i32::try_from(attempt).unwrap_or(i32::MAX).min(12)
}

impl GpSurrogate {
    fn jitter(&self, strategy: FitStrategy) -> f64 {
        match strategy {
            FitStrategy::Primary { attempt } => {
                self.config.noise_variance * 2_f64.powi(clamped_exponent(attempt))
            }
            FitStrategy::Fallback { attempt } => {
                self.config.fallback_jitter * 10_f64.powi(clamped_exponent(attempt))
            }
        }
    }
}

impl Surrogate for GpSurrogate {
    fn name(&self) -> &str {
        "gp"
    }

    fn fit(
        &self,
        x: &[Vec<f64>],
        y: &[Vec<f64>],
        rho: Option<&[Vec<f64>]>,
        strategy: FitStrategy,
    ) -> core::result::Result<(), FitFailure> {
        let Some(first_y) = y.first() else {
            return Err(FitFailure::new("no training data"));
        };
        if x.len() != y.len() || rho.is_some_and(|r| r.len() != y.len()) {
            return Err(FitFailure::new("training matrices disagree on row count"));
        }
        let n_var = x.first().map_or(0, Vec::len);
        let n_obj = first_y.len();

        let start = x.len().saturating_sub(self.config.max_train_points);
        let x_train = &x[start..];
        let y_train = &y[start..];
        let rho_train = rho.map(|r| &r[start..]);
        let jitter = self.jitter(strategy);

        let objectives = (0..n_obj)
            .map(|j| {
                let sd = rho_train.map(|r| column(r, j));
                fit_gp(
                    x_train,
                    &column(y_train, j),
                    sd.as_deref(),
                    jitter,
                    self.config.min_lengthscale,
                )
            })
            .collect::<core::result::Result<Vec<_>, _>>()?;

        let noise = rho_train
            .map(|r| {
                (0..n_obj)
                    .map(|j| {
                        fit_gp(x_train, &column(r, j), None, jitter, self.config.min_lengthscale)
                    })
                    .collect::<core::result::Result<Vec<_>, _>>()
            })
            .transpose()?;

        trace_debug!(
            n_train = x_train.len(),
            n_obj,
            ?strategy,
            noise_model = noise.is_some(),
            "gp surrogate fitted"
        );

        *self.state.lock() = Some(GpFit {
            n_var,
            objectives,
            noise,
        });
        Ok(())
    }

    fn is_fitted(&self) -> bool {
        self.state.lock().is_some()
    }

    fn evaluate(&self, x: &[Vec<f64>], options: PredictOptions) -> Result<Prediction> {
        let state = self.state.lock();
        let Some(fit) = state.as_ref() else {
            return Err(Error::NotFitted("surrogate"));
        };
        Error::check_columns("X", fit.n_var, x)?;

        let main = predict_all(&fit.objectives, x, options.gradient);
        let mut prediction = Prediction {
            f: main.mean,
            ..Prediction::default()
        };
        if options.gradient {
            prediction.df = Some(main.dmean);
        }
        if options.std {
            prediction.s = Some(main.std);
            if options.gradient {
                prediction.ds = Some(main.dstd);
            }
        }

        if options.noise
            && let Some(noise_models) = &fit.noise
        {
            let noise = predict_all(noise_models, x, options.gradient);
            prediction.rho_f = Some(noise.mean);
            prediction.rho_s = Some(noise.std);
            if options.gradient {
                prediction.drho_f = Some(noise.dmean);
                prediction.drho_s = Some(noise.dstd);
            }
        }

        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_data() -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        let x: Vec<Vec<f64>> = (0..8).map(|i| vec![f64::from(i) / 7.0]).collect();
        let y: Vec<Vec<f64>> = x
            .iter()
            .map(|r| vec![(3.0 * r[0]).sin(), r[0] * r[0]])
            .collect();
        (x, y)
    }

    #[test]
    fn test_interpolates_training_points() {
        let (x, y) = line_data();
        let gp = GpSurrogate::new();
        gp.fit(&x, &y, None, FitStrategy::Primary { attempt: 0 }).unwrap();
        let p = gp.evaluate(&x, PredictOptions::mean().with_std()).unwrap();
        for (pred, truth) in p.f.iter().zip(&y) {
            for (a, b) in pred.iter().zip(truth) {
                assert!((a - b).abs() < 1e-3, "{a} vs {b}");
            }
        }
        for s in p.s.unwrap().iter().flatten() {
            assert!(*s < 1e-2);
        }
    }

    #[test]
    fn test_std_grows_away_from_data() {
        let x = vec![vec![0.0], vec![0.1], vec![0.2]];
        let y = vec![vec![0.0], vec![1.0], vec![0.5]];
        let gp = GpSurrogate::new();
        gp.fit(&x, &y, None, FitStrategy::Primary { attempt: 0 }).unwrap();
        let p = gp
            .evaluate(&[vec![0.1], vec![1.0]], PredictOptions::mean().with_std())
            .unwrap();
        let s = p.s.unwrap();
        assert!(s[1][0] > s[0][0]);
    }

    #[test]
    fn test_gradient_matches_finite_difference() {
        let (x, y) = line_data();
        let gp = GpSurrogate::new();
        gp.fit(&x, &y, None, FitStrategy::Primary { attempt: 0 }).unwrap();

        let at = 0.37;
        let h = 1e-6;
        let opts = PredictOptions::mean().with_std().with_gradient();
        let p = gp.evaluate(&[vec![at]], opts).unwrap();
        let lo = gp.evaluate(&[vec![at - h]], opts).unwrap();
        let hi = gp.evaluate(&[vec![at + h]], opts).unwrap();

        let df = p.df.unwrap();
        let ds = p.ds.unwrap();
        for j in 0..2 {
            let fd_mean = (hi.f[0][j] - lo.f[0][j]) / (2.0 * h);
            assert!((df[0][j][0] - fd_mean).abs() < 1e-4, "mean grad {j}");
            let s_hi = hi.s.as_ref().unwrap()[0][j];
            let s_lo = lo.s.as_ref().unwrap()[0][j];
            let fd_std = (s_hi - s_lo) / (2.0 * h);
            assert!((ds[0][j][0] - fd_std).abs() < 1e-3, "std grad {j}");
        }
    }

    #[test]
    fn test_noise_model_only_with_rho() {
        let (x, y) = line_data();
        let gp = GpSurrogate::new();
        gp.fit(&x, &y, None, FitStrategy::Primary { attempt: 0 }).unwrap();
        let opts = PredictOptions::mean().with_noise();
        assert!(gp.evaluate(&x, opts).unwrap().rho_f.is_none());

        let rho = vec![vec![0.05, 0.1]; x.len()];
        gp.fit(&x, &y, Some(&rho), FitStrategy::Primary { attempt: 0 }).unwrap();
        let p = gp.evaluate(&[vec![0.5]], opts).unwrap();
        let rho_f = p.rho_f.unwrap();
        assert!((rho_f[0][0] - 0.05).abs() < 1e-3);
        assert!((rho_f[0][1] - 0.1).abs() < 1e-3);
        assert!(p.rho_s.is_some());
        assert!(p.drho_f.is_none());
    }

    #[test]
    fn test_failed_fit_keeps_previous_model() {
        let (x, y) = line_data();
        let gp = GpSurrogate::new();
        gp.fit(&x, &y, None, FitStrategy::Primary { attempt: 0 }).unwrap();
        let before = gp.evaluate(&[vec![0.3]], PredictOptions::mean()).unwrap();

        let bad_y = vec![vec![f64::NAN, 0.0]; x.len()];
        assert!(gp.fit(&x, &bad_y, None, FitStrategy::Primary { attempt: 0 }).is_err());
        assert!(gp.is_fitted());
        let after = gp.evaluate(&[vec![0.3]], PredictOptions::mean()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_jitter_escalates_per_attempt() {
        let gp = GpSurrogate::builder().fallback_jitter(1e-3).build();
        assert!((gp.jitter(FitStrategy::Fallback { attempt: 0 }) - 1e-3).abs() < 1e-15);
        assert!((gp.jitter(FitStrategy::Fallback { attempt: 2 }) - 1e-1).abs() < 1e-12);
        assert!((gp.jitter(FitStrategy::Primary { attempt: 0 }) - 1e-6).abs() < 1e-15);
        assert!((gp.jitter(FitStrategy::Primary { attempt: 3 }) - 8e-6).abs() < 1e-15);
    }

    #[test]
    fn test_unfitted_and_width_errors() {
        let gp = GpSurrogate::new();
        assert!(matches!(
            gp.evaluate(&[vec![0.0]], PredictOptions::mean()),
            Err(Error::NotFitted(_))
        ));
        let (x, y) = line_data();
        gp.fit(&x, &y, None, FitStrategy::Primary { attempt: 0 }).unwrap();
        assert!(gp.evaluate(&[vec![0.0, 1.0]], PredictOptions::mean()).is_err());
    }

    #[test]
    fn test_max_train_points_uses_recent_rows() {
        let (x, y) = line_data();
        let gp = GpSurrogate::builder().max_train_points(3).build();
        gp.fit(&x, &y, None, FitStrategy::Primary { attempt: 0 }).unwrap();
        let state = gp.state.lock();
        let fit = state.as_ref().unwrap();
        assert_eq!(fit.objectives[0].x_train, x[5..].to_vec());
    }
}
