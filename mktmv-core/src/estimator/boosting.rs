//! Least-squares gradient boosting of shallow regression trees.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

use super::tree::{RegressionTree, TreeParams};
use super::{
    check_fit_input, check_predict_input, float_param, invalid, seed_param, usize_param, Regressor,
};
use crate::error::ModelError;
use crate::params::{ParamSet, ParamValue};

#[derive(Debug, Clone)]
struct Ensemble {
    init: f64,
    trees: Vec<RegressionTree>,
    n_features: usize,
}

/// Stage-wise additive model: start from the target mean, then repeatedly fit
/// a tree to the residuals and add it scaled by `learning_rate`.
#[derive(Debug, Clone)]
pub struct GradientBoosting {
    n_estimators: usize,
    learning_rate: f64,
    max_depth: usize,
    min_samples_leaf: usize,
    /// Fraction of rows drawn without replacement for each stage.
    subsample: f64,
    seed: u64,
    fitted: Option<Ensemble>,
}

impl Default for GradientBoosting {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
            subsample: 1.0,
            seed: 42,
            fitted: None,
        }
    }
}

impl Regressor for GradientBoosting {
    fn name(&self) -> &str {
        "gradient_boosting"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
        check_fit_input(x, y)?;
        let n = x.nrows();
        let init = y.mean().unwrap_or(0.0);
        let mut current = Array1::from_elem(n, init);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let params = TreeParams {
            max_depth: Some(self.max_depth),
            min_samples_leaf: self.min_samples_leaf,
            max_features: 1.0,
        };
        let take = ((self.subsample * n as f64).round() as usize).clamp(1, n);

        let mut trees = Vec::with_capacity(self.n_estimators);
        for _ in 0..self.n_estimators {
            let residual: Vec<f64> = y.iter().zip(current.iter()).map(|(t, c)| t - c).collect();
            let sample: Vec<usize> = if take == n {
                (0..n).collect()
            } else {
                let mut rows = index::sample(&mut rng, n, take).into_vec();
                rows.sort_unstable();
                rows
            };
            let tree = RegressionTree::fit(x, &residual, sample, &params, &mut rng);
            for (i, row) in x.rows().into_iter().enumerate() {
                current[i] += self.learning_rate * tree.predict_row(row);
            }
            trees.push(tree);
        }

        self.fitted = Some(Ensemble {
            init,
            trees,
            n_features: x.ncols(),
        });
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        let model = self.fitted.as_ref().ok_or(ModelError::NotFitted)?;
        check_predict_input(x, model.n_features)?;
        Ok(x
            .rows()
            .into_iter()
            .map(|row| {
                model.init
                    + self.learning_rate
                        * model.trees.iter().map(|t| t.predict_row(row)).sum::<f64>()
            })
            .collect())
    }

    fn params(&self) -> ParamSet {
        let mut p = ParamSet::new();
        p.insert("n_estimators".into(), ParamValue::Int(self.n_estimators as i64));
        p.insert("learning_rate".into(), ParamValue::Float(self.learning_rate));
        p.insert("max_depth".into(), ParamValue::Int(self.max_depth as i64));
        p.insert("min_samples_leaf".into(), ParamValue::Int(self.min_samples_leaf as i64));
        p.insert("subsample".into(), ParamValue::Float(self.subsample));
        p.insert("seed".into(), ParamValue::Int(self.seed as i64));
        p
    }

    fn set_params(&mut self, params: &ParamSet) -> Result<(), ModelError> {
        let mut next = self.clone();
        for (name, value) in params {
            match name.as_str() {
                "n_estimators" => next.n_estimators = usize_param(name, value, 1)?,
                "learning_rate" => {
                    next.learning_rate = float_param(name, value)?;
                    if next.learning_rate <= 0.0 {
                        return Err(invalid(name, "must be > 0"));
                    }
                }
                "max_depth" => next.max_depth = usize_param(name, value, 1)?,
                "min_samples_leaf" => next.min_samples_leaf = usize_param(name, value, 1)?,
                "subsample" => {
                    next.subsample = float_param(name, value)?;
                    if !(next.subsample > 0.0 && next.subsample <= 1.0) {
                        return Err(invalid(name, "must be in (0, 1]"));
                    }
                }
                "seed" => next.seed = seed_param(name, value)?,
                _ => return Err(invalid(name, "unknown hyperparameter for gradient_boosting")),
            }
        }
        next.fitted = None;
        *self = next;
        Ok(())
    }

    fn boxed_clone(&self) -> Box<dyn Regressor> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((30, 1), |(i, _)| i as f64 / 3.0);
        let y = x.column(0).mapv(|v| v * v);
        (x, y)
    }

    fn mse(a: &Array1<f64>, b: &Array1<f64>) -> f64 {
        (a - b).mapv(|d| d * d).mean().unwrap()
    }

    #[test]
    fn more_stages_fit_better() {
        let (x, y) = data();
        let mut few = GradientBoosting::default();
        let mut p = ParamSet::new();
        p.insert("n_estimators".into(), ParamValue::Int(2));
        few.set_params(&p).unwrap();
        few.fit(&x, &y).unwrap();

        let mut many = GradientBoosting::default();
        many.fit(&x, &y).unwrap();

        let few_err = mse(&few.predict(&x).unwrap(), &y);
        let many_err = mse(&many.predict(&x).unwrap(), &y);
        assert!(many_err < few_err, "{many_err} !< {few_err}");
        assert!(many_err < few_err / 10.0);
    }

    #[test]
    fn subsampling_is_seeded() {
        let (x, y) = data();
        let mut p = ParamSet::new();
        p.insert("subsample".into(), ParamValue::Float(0.5));
        p.insert("n_estimators".into(), ParamValue::Int(20));
        let mut a = GradientBoosting::default();
        let mut b = GradientBoosting::default();
        a.set_params(&p).unwrap();
        b.set_params(&p).unwrap();
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn wrong_feature_count_is_rejected() {
        let (x, y) = data();
        let mut m = GradientBoosting::default();
        m.fit(&x, &y).unwrap();
        let wide = Array2::<f64>::zeros((2, 3));
        assert!(matches!(m.predict(&wide), Err(ModelError::ShapeMismatch { .. })));
    }
}
