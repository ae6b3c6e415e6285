//! Validation metrics, always oriented so that larger is better.

use std::fmt;
use std::str::FromStr;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Scoring {
    /// `-sqrt(mean((y - ŷ)²))`.
    #[default]
    NegRootMeanSquaredError,
    NegMeanSquaredError,
    NegMeanAbsoluteError,
    /// Coefficient of determination.
    R2,
}

impl Scoring {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NegRootMeanSquaredError => "neg_root_mean_squared_error",
            Self::NegMeanSquaredError => "neg_mean_squared_error",
            Self::NegMeanAbsoluteError => "neg_mean_absolute_error",
            Self::R2 => "r2",
        }
    }

    /// Score predictions. Both slices must have the same non-zero length.
    pub fn score(&self, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        let n = y_true.len() as f64;
        let residuals = y_true - y_pred;
        match self {
            Self::NegRootMeanSquaredError => -(residuals.mapv(|r| r * r).sum() / n).sqrt(),
            Self::NegMeanSquaredError => -(residuals.mapv(|r| r * r).sum() / n),
            Self::NegMeanAbsoluteError => -(residuals.mapv(f64::abs).sum() / n),
            Self::R2 => {
                let mean = y_true.sum() / n;
                let ss_res = residuals.mapv(|r| r * r).sum();
                let ss_tot = y_true.mapv(|v| (v - mean) * (v - mean)).sum();
                if ss_tot == 0.0 {
                    if ss_res == 0.0 {
                        1.0
                    } else {
                        0.0
                    }
                } else {
                    1.0 - ss_res / ss_tot
                }
            }
        }
    }
}

impl fmt::Display for Scoring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scoring {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "neg_root_mean_squared_error" => Ok(Self::NegRootMeanSquaredError),
            "neg_mean_squared_error" => Ok(Self::NegMeanSquaredError),
            "neg_mean_absolute_error" => Ok(Self::NegMeanAbsoluteError),
            "r2" => Ok(Self::R2),
            other => Err(ConfigError::UnknownScoring(other.to_string())),
        }
    }
}

impl TryFrom<String> for Scoring {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Scoring> for String {
    fn from(s: Scoring) -> Self {
        s.as_str().to_string()
    }
}
