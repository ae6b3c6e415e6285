//! Model-fitting capability: a common regressor contract plus bundled adapters.
//!
//! Every regressor is configured through a [`ParamSet`] so the search driver
//! can treat them interchangeably. Unknown names and ill-typed values are
//! rejected with [`ModelError::InvalidParam`].

mod baseline;
mod boosting;
mod forest;
mod linear;
mod tree;

use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ModelError};
use crate::params::{ParamSet, ParamValue};

pub use baseline::MeanRegressor;
pub use boosting::GradientBoosting;
pub use forest::RandomForest;
pub use linear::ElasticNet;
pub use tree::TreeParams;

/// Fit/predict contract shared by every model choice.
pub trait Regressor: fmt::Debug + Send + Sync {
    /// Human-readable name (e.g., "elasticnet").
    fn name(&self) -> &str;

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError>;

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError>;

    /// Current hyperparameters, every tunable name included.
    fn params(&self) -> ParamSet;

    /// Overwrite the named hyperparameters. Fitted state is discarded.
    fn set_params(&mut self, params: &ParamSet) -> Result<(), ModelError>;

    fn boxed_clone(&self) -> Box<dyn Regressor>;
}

impl Clone for Box<dyn Regressor> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

/// Bundled model kinds, selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    ElasticNet,
    RandomForest,
    GradientBoosting,
    Mean,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ElasticNet => "elastic_net",
            Self::RandomForest => "random_forest",
            Self::GradientBoosting => "gradient_boosting",
            Self::Mean => "mean",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "elastic_net" | "elasticnet" => Ok(Self::ElasticNet),
            "random_forest" => Ok(Self::RandomForest),
            "gradient_boosting" => Ok(Self::GradientBoosting),
            "mean" => Ok(Self::Mean),
            other => Err(ConfigError::UnknownModel(other.to_string())),
        }
    }
}

/// Build an unfitted regressor of `kind` with default hyperparameters.
pub fn create_regressor(kind: ModelKind) -> Box<dyn Regressor> {
    match kind {
        ModelKind::ElasticNet => Box::new(ElasticNet::default()),
        ModelKind::RandomForest => Box::new(RandomForest::default()),
        ModelKind::GradientBoosting => Box::new(GradientBoosting::default()),
        ModelKind::Mean => Box::new(MeanRegressor::default()),
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────

pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> ModelError {
    ModelError::InvalidParam {
        name: name.to_string(),
        reason: reason.into(),
    }
}

pub(crate) fn float_param(name: &str, value: &ParamValue) -> Result<f64, ModelError> {
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(name, format!("expected a finite number, got {value}")))
}

pub(crate) fn usize_param(name: &str, value: &ParamValue, min: usize) -> Result<usize, ModelError> {
    let v = value
        .as_i64()
        .ok_or_else(|| invalid(name, format!("expected an integer, got {value}")))?;
    if v < min as i64 {
        return Err(invalid(name, format!("must be >= {min}, got {v}")));
    }
    Ok(v as usize)
}

/// Seeds are kept in the non-negative `i64` range so `params()` can report
/// them as an integer that `set_params` accepts back.
pub(crate) fn param_seed(seed: u64) -> u64 {
    seed & i64::MAX as u64
}

pub(crate) fn seed_param(name: &str, value: &ParamValue) -> Result<u64, ModelError> {
    value
        .as_i64()
        .filter(|v| *v >= 0)
        .map(|v| v as u64)
        .ok_or_else(|| invalid(name, format!("expected a non-negative integer, got {value}")))
}

/// `max_depth` accepts a positive integer or `"none"` for unlimited depth.
pub(crate) fn depth_param(name: &str, value: &ParamValue) -> Result<Option<usize>, ModelError> {
    match value {
        ParamValue::Str(s) if s.eq_ignore_ascii_case("none") => Ok(None),
        other => usize_param(name, other, 1).map(Some),
    }
}

pub(crate) fn depth_value(depth: Option<usize>) -> ParamValue {
    match depth {
        Some(d) => ParamValue::Int(d as i64),
        None => ParamValue::Str("none".into()),
    }
}

pub(crate) fn check_fit_input(x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
    if x.nrows() == 0 {
        return Err(ModelError::EmptyInput);
    }
    if x.nrows() != y.len() {
        return Err(ModelError::ShapeMismatch {
            expected: format!("{} targets", x.nrows()),
            actual: y.len().to_string(),
        });
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(ModelError::NonFinite);
    }
    Ok(())
}

pub(crate) fn check_predict_input(x: &Array2<f64>, n_features: usize) -> Result<(), ModelError> {
    if x.ncols() != n_features {
        return Err(ModelError::ShapeMismatch {
            expected: format!("{n_features} features"),
            actual: x.ncols().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_kind_round_trips_names() {
        for kind in [
            ModelKind::ElasticNet,
            ModelKind::RandomForest,
            ModelKind::GradientBoosting,
            ModelKind::Mean,
        ] {
            assert_eq!(kind.as_str().parse::<ModelKind>().unwrap(), kind);
        }
        assert!(matches!(
            "svm".parse::<ModelKind>(),
            Err(ConfigError::UnknownModel(_))
        ));
    }

    #[test]
    fn factory_builds_named_models() {
        assert_eq!(create_regressor(ModelKind::ElasticNet).name(), "elastic_net");
        assert_eq!(create_regressor(ModelKind::Mean).name(), "mean");
    }

    #[test]
    fn boxed_regressors_clone_params() {
        let mut model = create_regressor(ModelKind::ElasticNet);
        let mut p = ParamSet::new();
        p.insert("alpha".into(), ParamValue::Float(0.25));
        model.set_params(&p).unwrap();
        let copy = model.clone();
        assert_eq!(copy.params()["alpha"], ParamValue::Float(0.25));
    }

    #[test]
    fn depth_accepts_none_string() {
        assert_eq!(depth_param("max_depth", &ParamValue::Str("none".into())), Ok(None));
        assert_eq!(depth_param("max_depth", &ParamValue::Int(3)), Ok(Some(3)));
        assert!(depth_param("max_depth", &ParamValue::Int(0)).is_err());
    }

    #[test]
    fn fit_input_checks() {
        let x = Array2::<f64>::zeros((0, 2));
        let y = Array1::<f64>::zeros(0);
        assert_eq!(check_fit_input(&x, &y), Err(ModelError::EmptyInput));
        let x = Array2::<f64>::zeros((3, 1));
        let y = Array1::<f64>::zeros(2);
        assert!(matches!(check_fit_input(&x, &y), Err(ModelError::ShapeMismatch { .. })));
        let y = Array1::from(vec![0.0, f64::NAN, 1.0]);
        assert_eq!(check_fit_input(&x, &y), Err(ModelError::NonFinite));
    }
}
