//! Constant baseline.

use ndarray::{Array1, Array2};

use super::{check_fit_input, check_predict_input, invalid, Regressor};
use crate::error::ModelError;
use crate::params::ParamSet;

/// Predicts the training-target mean for every row.
#[derive(Debug, Clone, Default)]
pub struct MeanRegressor {
    fitted: Option<(f64, usize)>,
}

impl Regressor for MeanRegressor {
    fn name(&self) -> &str {
        "mean"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
        check_fit_input(x, y)?;
        let mean = y.mean().ok_or(ModelError::EmptyInput)?;
        self.fitted = Some((mean, x.ncols()));
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        let (mean, n_features) = self.fitted.ok_or(ModelError::NotFitted)?;
        check_predict_input(x, n_features)?;
        Ok(Array1::from_elem(x.nrows(), mean))
    }

    fn params(&self) -> ParamSet {
        ParamSet::new()
    }

    fn set_params(&mut self, params: &ParamSet) -> Result<(), ModelError> {
        if let Some(name) = params.keys().next() {
            return Err(invalid(name, "mean has no hyperparameters"));
        }
        self.fitted = None;
        Ok(())
    }

    fn boxed_clone(&self) -> Box<dyn Regressor> {
        Box::new(self.clone())
    }
}
