//! K-fold cross-validation.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use super::Scoring;
use crate::error::{ModelError, SearchFailure};
use crate::estimator::Regressor;

/// Contiguous, unshuffled k-fold splitter. The first `n % k` folds hold one
/// extra sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KFold {
    n_splits: usize,
}

/// Row indices of one train/test split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl KFold {
    pub fn new(n_splits: usize) -> Self {
        Self { n_splits }
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    pub fn split(&self, n_samples: usize) -> Result<Vec<Fold>, SearchFailure> {
        let k = self.n_splits;
        if k < 2 || n_samples < k {
            return Err(SearchFailure::InvalidFolds {
                n_samples,
                n_splits: k,
            });
        }
        let base = n_samples / k;
        let extra = n_samples % k;
        let mut folds = Vec::with_capacity(k);
        let mut start = 0;
        for i in 0..k {
            let size = base + usize::from(i < extra);
            let stop = start + size;
            folds.push(Fold {
                train: (0..start).chain(stop..n_samples).collect(),
                test: (start..stop).collect(),
            });
            start = stop;
        }
        Ok(folds)
    }
}

/// Mean and population standard deviation of the per-fold scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvScore {
    pub mean: f64,
    pub std: f64,
    pub fold_scores: Vec<f64>,
}

impl CvScore {
    pub fn from_scores(fold_scores: Vec<f64>) -> Self {
        let n = fold_scores.len().max(1) as f64;
        let mean = fold_scores.iter().sum::<f64>() / n;
        let var = fold_scores.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / n;
        Self {
            mean,
            std: var.sqrt(),
            fold_scores,
        }
    }
}

/// Fit a fresh copy of `estimator` per fold and score it on the held-out rows.
pub fn cross_validate(
    estimator: &dyn Regressor,
    x: &Array2<f64>,
    y: &Array1<f64>,
    folds: &[Fold],
    scoring: Scoring,
) -> Result<CvScore, ModelError> {
    let mut scores = Vec::with_capacity(folds.len());
    for fold in folds {
        let x_train = x.select(Axis(0), &fold.train);
        let y_train = y.select(Axis(0), &fold.train);
        let x_test = x.select(Axis(0), &fold.test);
        let y_test = y.select(Axis(0), &fold.test);

        let mut model = estimator.boxed_clone();
        model.fit(&x_train, &y_train)?;
        let pred = model.predict(&x_test)?;
        scores.push(scoring.score(&y_test, &pred));
    }
    Ok(CvScore::from_scores(scores))
}
