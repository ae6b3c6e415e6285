//! Bootstrap-aggregated regression trees.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::tree::{RegressionTree, TreeParams};
use super::{
    check_fit_input, check_predict_input, depth_param, depth_value, float_param, invalid,
    param_seed, seed_param, usize_param, Regressor,
};
use crate::error::ModelError;
use crate::params::{ParamSet, ParamValue};

/// Random forest: each tree sees a bootstrap sample of the rows and a random
/// feature subset at every split. Prediction is the mean over trees.
#[derive(Debug, Clone)]
pub struct RandomForest {
    n_estimators: usize,
    tree: TreeParams,
    seed: u64,
    trees: Vec<RegressionTree>,
    n_features: usize,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            tree: TreeParams::default(),
            seed: 42,
            trees: Vec::new(),
            n_features: 0,
        }
    }
}

impl RandomForest {
    pub fn new(n_estimators: usize, tree: TreeParams, seed: u64) -> Self {
        Self {
            n_estimators,
            tree,
            seed: param_seed(seed),
            ..Self::default()
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for RandomForest {
    fn name(&self) -> &str {
        "random_forest"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
        check_fit_input(x, y)?;
        let n = x.nrows();
        let targets = y.to_vec();
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.trees = (0..self.n_estimators)
            .map(|_| {
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::fit(x, &targets, sample, &self.tree, &mut rng)
            })
            .collect();
        self.n_features = x.ncols();
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::NotFitted);
        }
        check_predict_input(x, self.n_features)?;
        let k = self.trees.len() as f64;
        Ok(x
            .rows()
            .into_iter()
            .map(|row| self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / k)
            .collect())
    }

    fn params(&self) -> ParamSet {
        let mut p = ParamSet::new();
        p.insert("n_estimators".into(), ParamValue::Int(self.n_estimators as i64));
        p.insert("max_depth".into(), depth_value(self.tree.max_depth));
        p.insert(
            "min_samples_leaf".into(),
            ParamValue::Int(self.tree.min_samples_leaf as i64),
        );
        p.insert("max_features".into(), ParamValue::Float(self.tree.max_features));
        p.insert("seed".into(), ParamValue::Int(self.seed as i64));
        p
    }

    fn set_params(&mut self, params: &ParamSet) -> Result<(), ModelError> {
        let mut next = self.clone();
        for (name, value) in params {
            match name.as_str() {
                "n_estimators" => next.n_estimators = usize_param(name, value, 1)?,
                "max_depth" => next.tree.max_depth = depth_param(name, value)?,
                "min_samples_leaf" => next.tree.min_samples_leaf = usize_param(name, value, 1)?,
                "max_features" => {
                    let f = float_param(name, value)?;
                    if !(f > 0.0 && f <= 1.0) {
                        return Err(invalid(name, "must be in (0, 1]"));
                    }
                    next.tree.max_features = f;
                }
                "seed" => next.seed = seed_param(name, value)?,
                _ => return Err(invalid(name, "unknown hyperparameter for random_forest")),
            }
        }
        next.trees.clear();
        *self = next;
        Ok(())
    }

    fn boxed_clone(&self) -> Box<dyn Regressor> {
        Box::new(self.clone())
    }
}
