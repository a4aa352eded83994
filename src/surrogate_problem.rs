//! The problem the inner solver actually optimizes.
//!
//! A [`SurrogateProblem`] lives in normalized design space. Evaluating it
//! queries the fitted surrogate and scores the prediction with the fitted
//! acquisition, so it is cheap enough for a population-based solver to call
//! thousands of times per iteration. [`SurrogateProblem::to_raw`] maps
//! solutions back to the real problem's coordinates.

use crate::acquisition::{Acquisition, AcquisitionValue};
use crate::error::{Error, Result};
use crate::problem::{Bounds, Evaluation, Problem};
use crate::surrogate::{PredictOptions, Prediction, Surrogate};
use crate::transformation::Transformation;

/// Prediction and acquisition score for a batch of normalized designs.
#[derive(Clone, Debug, PartialEq)]
pub struct SurrogateEvaluation {
    /// Raw surrogate output.
    pub prediction: Prediction,
    /// Acquisition score of `prediction`.
    pub acquisition: AcquisitionValue,
}

/// Surrogate plus acquisition over normalized bounds.
pub struct SurrogateProblem<'a> {
    bounds: Bounds,
    n_obj: usize,
    surrogate: &'a dyn Surrogate,
    acquisition: &'a dyn Acquisition,
    transformation: &'a Transformation,
}

impl<'a> SurrogateProblem<'a> {
    /// Build the view for `real_bounds` under a fitted transformation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFitted`] if either the transformation or the
    /// surrogate has not been fitted.
    pub fn new(
        real_bounds: &Bounds,
        n_obj: usize,
        surrogate: &'a dyn Surrogate,
        acquisition: &'a dyn Acquisition,
        transformation: &'a Transformation,
    ) -> Result<Self> {
        if !surrogate.is_fitted() {
            return Err(Error::NotFitted("surrogate"));
        }
        let corners = transformation.do_x(&[real_bounds.xl.clone(), real_bounds.xu.clone()])?;
        let [xl, xu]: [Vec<f64>; 2] = corners
            .try_into()
            .map_err(|_| Error::Internal("bounds transform changed row count"))?;
        // Keep the box ordered per variable.
        let (xl, xu): (Vec<f64>, Vec<f64>) = xl
            .iter()
            .zip(&xu)
            .map(|(&a, &b)| (a.min(b), a.max(b)))
            .unzip();
        Ok(Self {
            bounds: Bounds::new(xl, xu)?,
            n_obj,
            surrogate,
            acquisition,
            transformation,
        })
    }

    /// The fitted surrogate.
    #[must_use]
    pub fn surrogate(&self) -> &'a dyn Surrogate {
        self.surrogate
    }

    /// The fitted acquisition.
    #[must_use]
    pub fn acquisition(&self) -> &'a dyn Acquisition {
        self.acquisition
    }

    /// The fitted transformation.
    #[must_use]
    pub fn transformation(&self) -> &'a Transformation {
        self.transformation
    }

    /// Query the surrogate directly.
    ///
    /// # Errors
    ///
    /// Propagates surrogate errors.
    pub fn predict(&self, x: &[Vec<f64>], options: PredictOptions) -> Result<Prediction> {
        self.surrogate.evaluate(x, options)
    }

    /// Predict with what the acquisition needs (plus gradients if asked) and
    /// score the result.
    ///
    /// # Errors
    ///
    /// Propagates surrogate and acquisition errors.
    pub fn evaluate_with(&self, x: &[Vec<f64>], gradient: bool) -> Result<SurrogateEvaluation> {
        let mut options = self.acquisition.requirements();
        options.gradient |= gradient;
        let prediction = self.surrogate.evaluate(x, options)?;
        let acquisition = self.acquisition.evaluate(&prediction)?;
        Ok(SurrogateEvaluation {
            prediction,
            acquisition,
        })
    }

    /// Map normalized designs back to raw coordinates.
    ///
    /// # Errors
    ///
    /// Propagates transformation errors.
    pub fn to_raw(&self, x: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        self.transformation.undo_x(x)
    }
}

impl Problem for SurrogateProblem<'_> {
    fn name(&self) -> &str {
        "surrogate"
    }

    fn n_obj(&self) -> usize {
        self.n_obj
    }

    fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Objectives are the acquisition values.
    fn evaluate(&self, x: &[Vec<f64>]) -> Result<Evaluation> {
        let out = self.evaluate_with(x, false)?;
        Ok(Evaluation::objectives(out.acquisition.value))
    }
}
