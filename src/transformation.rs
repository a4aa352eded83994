//! Affine normalization of designs and objectives.
//!
//! Surrogates are fitted in a normalized coordinate space. A
//! [`Transformation`] holds one [`ColumnScaler`] for the design matrix and
//! one for the objective matrix, each mapping `v -> (v - location) / scale`
//! per column.
//!
//! - X columns use the problem bounds when they are known
//!   (`location = xl`, `scale = xu - xl`), so normalized designs live in
//!   `[0, 1]`. Without bounds they are standardized.
//! - Y columns are always standardized (column mean, sample std).
//!
//! Every [`fit`](Transformation::fit) recomputes the statistics from the full
//! data it is given. Columns with zero or non-finite spread get `scale = 1`,
//! which keeps the map exactly invertible.
//!
//! ```
//! use mobo::transformation::Transformation;
//!
//! let mut t = Transformation::standard(vec![0.0], vec![10.0]);
//! let x = vec![vec![2.0], vec![8.0]];
//! let y = vec![vec![1.0, 5.0], vec![3.0, 5.0]];
//! t.fit(&x, &y).unwrap();
//!
//! let xn = t.do_x(&x).unwrap();
//! assert!((xn[0][0] - 0.2).abs() < 1e-12);
//!
//! let yn = t.do_y(&y).unwrap();
//! let back = t.undo_y(&yn).unwrap();
//! assert!((back[1][1] - 5.0).abs() < 1e-12);
//! ```

use crate::error::{Error, Result};

/// How a [`ColumnScaler`] derives its statistics.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScalerKind {
    /// Fixed location/scale taken from known bounds.
    Bounded {
        /// Lower bound per column.
        lower: Vec<f64>,
        /// Upper bound per column.
        upper: Vec<f64>,
    },
    /// Column mean and sample standard deviation of the fitted data.
    Standard,
}

/// Per-column affine map `v -> (v - location) / scale`.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnScaler {
    kind: ScalerKind,
    location: Vec<f64>,
    scale: Vec<f64>,
    fitted: bool,
}

impl ColumnScaler {
    /// Scaler using the given bounds.
    #[must_use]
    pub fn bounded(lower: Vec<f64>, upper: Vec<f64>) -> Self {
        Self {
            kind: ScalerKind::Bounded { lower, upper },
            location: Vec::new(),
            scale: Vec::new(),
            fitted: false,
        }
    }

    /// Standardizing scaler.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            kind: ScalerKind::Standard,
            location: Vec::new(),
            scale: Vec::new(),
            fitted: false,
        }
    }

    /// Returns how this scaler derives its statistics.
    #[must_use]
    pub fn kind(&self) -> &ScalerKind {
        &self.kind
    }

    /// Fitted per-column locations.
    #[must_use]
    pub fn location(&self) -> &[f64] {
        &self.location
    }

    /// Fitted per-column scales (never zero).
    #[must_use]
    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Recompute the statistics from `data`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyDataset`] for a standardizing scaler without rows,
    /// and [`Error::DimensionMismatch`] for ragged data or bounds of the
    /// wrong width.
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(&mut self, data: &[Vec<f64>]) -> Result<()> {
        match &self.kind {
            ScalerKind::Bounded { lower, upper } => {
                let d = lower.len();
                Error::check_columns("scaler bounds", d, &[upper.clone()])?;
                Error::check_columns("scaled data", d, data)?;
                self.location.clone_from(lower);
                self.scale = lower
                    .iter()
                    .zip(upper)
                    .map(|(&lo, &hi)| safe_scale(hi - lo))
                    .collect();
            }
            ScalerKind::Standard => {
                let Some(first) = data.first() else {
                    return Err(Error::EmptyDataset);
                };
                let d = first.len();
                Error::check_columns("scaled data", d, data)?;
                let n = data.len() as f64;
                self.location = (0..d)
                    .map(|j| data.iter().map(|row| row[j]).sum::<f64>() / n)
                    .collect();
                self.scale = (0..d)
                    .map(|j| {
                        if data.len() < 2 {
                            return 1.0;
                        }
                        let mean = self.location[j];
                        let var = data.iter().map(|row| (row[j] - mean).powi(2)).sum::<f64>()
                            / (n - 1.0);
                        safe_scale(var.sqrt())
                    })
                    .collect();
            }
        }
        self.fitted = true;
        Ok(())
    }

    fn ensure_fitted(&self, rows: &[Vec<f64>]) -> Result<()> {
        if !self.fitted {
            return Err(Error::NotFitted("transformation"));
        }
        Error::check_columns("transformed data", self.location.len(), rows)
    }

    /// Apply the forward map.
    ///
    /// # Errors
    ///
    /// Fails if the scaler is not fitted or the column count differs.
    pub fn forward(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        self.ensure_fitted(rows)?;
        Ok(rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(self.location.iter().zip(&self.scale))
                    .map(|(&v, (&loc, &s))| (v - loc) / s)
                    .collect()
            })
            .collect())
    }

    /// Apply the inverse map.
    ///
    /// # Errors
    ///
    /// Fails if the scaler is not fitted or the column count differs.
    pub fn inverse(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        self.ensure_fitted(rows)?;
        Ok(rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(self.location.iter().zip(&self.scale))
                    .map(|(&v, (&loc, &s))| v * s + loc)
                    .collect()
            })
            .collect())
    }

    /// Scale spreads (standard deviations) into normalized units, without shift.
    ///
    /// # Errors
    ///
    /// Fails if the scaler is not fitted or the column count differs.
    pub fn forward_spread(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        self.ensure_fitted(rows)?;
        Ok(rows
            .iter()
            .map(|row| row.iter().zip(&self.scale).map(|(&v, &s)| v / s).collect())
            .collect())
    }

    /// Scale normalized spreads back to raw units, without shift.
    ///
    /// # Errors
    ///
    /// Fails if the scaler is not fitted or the column count differs.
    pub fn inverse_spread(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        self.ensure_fitted(rows)?;
        Ok(rows
            .iter()
            .map(|row| row.iter().zip(&self.scale).map(|(&v, &s)| v * s).collect())
            .collect())
    }
}

fn safe_scale(s: f64) -> f64 {
    if s.is_finite() && s.abs() > f64::EPSILON {
        s
    } else {
        1.0
    }
}

/// Paired design/objective normalization.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transformation {
    x: ColumnScaler,
    y: ColumnScaler,
}

impl Transformation {
    /// Bounded X scaling and standardized Y.
    #[must_use]
    pub fn standard(lower: Vec<f64>, upper: Vec<f64>) -> Self {
        Self {
            x: ColumnScaler::bounded(lower, upper),
            y: ColumnScaler::standard(),
        }
    }

    /// Standardize both X and Y from the data.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            x: ColumnScaler::standard(),
            y: ColumnScaler::standard(),
        }
    }

    /// Build from explicit scalers.
    #[must_use]
    pub fn from_scalers(x: ColumnScaler, y: ColumnScaler) -> Self {
        Self { x, y }
    }

    /// The design scaler.
    #[must_use]
    pub fn x_scaler(&self) -> &ColumnScaler {
        &self.x
    }

    /// The objective scaler.
    #[must_use]
    pub fn y_scaler(&self) -> &ColumnScaler {
        &self.y
    }

    /// Refit both scalers from the full current data.
    ///
    /// # Errors
    ///
    /// Propagates scaler fitting errors and fails when X and Y row counts differ.
    pub fn fit(&mut self, x: &[Vec<f64>], y: &[Vec<f64>]) -> Result<()> {
        Error::check_rows("Y", x.len(), y.len())?;
        self.x.fit(x)?;
        self.y.fit(y)
    }

    /// Normalize designs.
    ///
    /// # Errors
    ///
    /// Fails if not fitted or on a column mismatch.
    pub fn do_x(&self, x: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        self.x.forward(x)
    }

    /// Normalize objectives.
    ///
    /// # Errors
    ///
    /// Fails if not fitted or on a column mismatch.
    pub fn do_y(&self, y: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        self.y.forward(y)
    }

    /// Normalize per-point objective uncertainty.
    ///
    /// # Errors
    ///
    /// Fails if not fitted or on a column mismatch.
    pub fn do_rho(&self, rho: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        self.y.forward_spread(rho)
    }

    /// Map normalized designs back to raw space.
    ///
    /// # Errors
    ///
    /// Fails if not fitted or on a column mismatch.
    pub fn undo_x(&self, x: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        self.x.inverse(x)
    }

    /// Map normalized objectives back to raw space.
    ///
    /// # Errors
    ///
    /// Fails if not fitted or on a column mismatch.
    pub fn undo_y(&self, y: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        self.y.inverse(y)
    }

    /// Map normalized objective spreads (std, rho) back to raw units.
    ///
    /// # Errors
    ///
    /// Fails if not fitted or on a column mismatch.
    pub fn undo_std(&self, s: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        self.y.inverse_spread(s)
    }
}
