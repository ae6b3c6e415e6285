//! Elastic-net linear regression fitted by cyclic coordinate descent.

use ndarray::{Array1, Array2, Axis};

use super::{check_fit_input, check_predict_input, float_param, invalid, usize_param, Regressor};
use crate::error::ModelError;
use crate::params::{ParamSet, ParamValue};

/// Minimizes `1/(2n)·‖y − Xw − b‖² + α·ρ·‖w‖₁ + ½·α·(1 − ρ)·‖w‖²` where
/// `ρ = l1_ratio`. The intercept is fitted by centering and never penalized.
#[derive(Debug, Clone)]
pub struct ElasticNet {
    alpha: f64,
    l1_ratio: f64,
    max_iter: usize,
    tol: f64,
    coef: Option<Array1<f64>>,
    intercept: f64,
    n_iter: usize,
}

impl Default for ElasticNet {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            l1_ratio: 0.5,
            max_iter: 1000,
            tol: 1e-4,
            coef: None,
            intercept: 0.0,
            n_iter: 0,
        }
    }
}

impl ElasticNet {
    pub fn new(alpha: f64, l1_ratio: f64) -> Self {
        Self {
            alpha,
            l1_ratio,
            ..Self::default()
        }
    }

    pub fn coef(&self) -> Option<&Array1<f64>> {
        self.coef.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Coordinate-descent sweeps used by the last fit.
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }
}

fn soft_threshold(z: f64, gamma: f64) -> f64 {
    if z > gamma {
        z - gamma
    } else if z < -gamma {
        z + gamma
    } else {
        0.0
    }
}

impl Regressor for ElasticNet {
    fn name(&self) -> &str {
        "elastic_net"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
        check_fit_input(x, y)?;
        let (n, p) = x.dim();
        let nf = n as f64;

        let x_mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(p));
        let y_mean = y.mean().unwrap_or(0.0);
        let xc = x - &x_mean;
        let yc = y - y_mean;
        let col_sq: Vec<f64> = xc.columns().into_iter().map(|c| c.dot(&c)).collect();

        let l1 = nf * self.alpha * self.l1_ratio;
        let l2 = nf * self.alpha * (1.0 - self.l1_ratio);

        let mut w = Array1::<f64>::zeros(p);
        let mut residual = yc.clone();
        self.n_iter = 0;
        for iter in 0..self.max_iter {
            self.n_iter = iter + 1;
            let mut max_delta = 0.0f64;
            let mut max_w = 0.0f64;
            for j in 0..p {
                let denom = col_sq[j] + l2;
                if denom == 0.0 {
                    continue;
                }
                let col = xc.column(j);
                let old = w[j];
                let rho = col.dot(&residual) + col_sq[j] * old;
                let new = soft_threshold(rho, l1) / denom;
                if new != old {
                    residual.scaled_add(old - new, &col);
                    w[j] = new;
                }
                max_delta = max_delta.max((new - old).abs());
                max_w = max_w.max(new.abs());
            }
            if max_w == 0.0 || max_delta <= self.tol * max_w {
                break;
            }
        }

        self.intercept = y_mean - x_mean.dot(&w);
        self.coef = Some(w);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        let coef = self.coef.as_ref().ok_or(ModelError::NotFitted)?;
        check_predict_input(x, coef.len())?;
        Ok(x.dot(coef) + self.intercept)
    }

    fn params(&self) -> ParamSet {
        let mut p = ParamSet::new();
        p.insert("alpha".into(), ParamValue::Float(self.alpha));
        p.insert("l1_ratio".into(), ParamValue::Float(self.l1_ratio));
        p.insert("max_iter".into(), ParamValue::Int(self.max_iter as i64));
        p.insert("tol".into(), ParamValue::Float(self.tol));
        p
    }

    fn set_params(&mut self, params: &ParamSet) -> Result<(), ModelError> {
        let mut next = self.clone();
        for (name, value) in params {
            match name.as_str() {
                "alpha" => {
                    next.alpha = float_param(name, value)?;
                    if next.alpha < 0.0 {
                        return Err(invalid(name, "must be >= 0"));
                    }
                }
                "l1_ratio" => {
                    next.l1_ratio = float_param(name, value)?;
                    if !(0.0..=1.0).contains(&next.l1_ratio) {
                        return Err(invalid(name, "must be in [0, 1]"));
                    }
                }
                "max_iter" => next.max_iter = usize_param(name, value, 1)?,
                "tol" => {
                    next.tol = float_param(name, value)?;
                    if next.tol <= 0.0 {
                        return Err(invalid(name, "must be > 0"));
                    }
                }
                _ => return Err(invalid(name, "unknown hyperparameter for elastic_net")),
            }
        }
        next.coef = None;
        next.intercept = 0.0;
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
    use ndarray::array;

    fn linear_data() -> (Array2<f64>, Array1<f64>) {
        let x = array![[0.0, 1.0], [1.0, 0.0], [2.0, 1.0], [3.0, 0.0], [4.0, 1.0], [5.0, 0.0]];
        let y = x.column(0).mapv(|v| 2.0 * v + 1.0) + &x.column(1).mapv(|v| -0.5 * v);
        (x, y)
    }

    #[test]
    fn tiny_penalty_recovers_ols() {
        let (x, y) = linear_data();
        let mut m = ElasticNet::new(1e-8, 0.5);
        m.fit(&x, &y).unwrap();
        let coef = m.coef().unwrap();
        assert!((coef[0] - 2.0).abs() < 1e-3, "coef {coef}");
        assert!((coef[1] + 0.5).abs() < 1e-3, "coef {coef}");
        assert!((m.intercept() - 1.0).abs() < 1e-3);
        let pred = m.predict(&x).unwrap();
        assert!((pred[3] - y[3]).abs() < 1e-3);
    }

    #[test]
    fn large_l1_penalty_zeroes_coefficients() {
        let (x, y) = linear_data();
        let mut m = ElasticNet::new(100.0, 1.0);
        m.fit(&x, &y).unwrap();
        assert!(m.coef().unwrap().iter().all(|&c| c == 0.0));
        assert!((m.intercept() - y.mean().unwrap()).abs() < 1e-12);
    }

    #[test]
    fn predict_before_fit_fails() {
        let m = ElasticNet::default();
        assert_eq!(m.predict(&array![[1.0]]), Err(ModelError::NotFitted));
    }

    #[test]
    fn set_params_validates_atomically() {
        let mut m = ElasticNet::default();
        let mut p = ParamSet::new();
        p.insert("alpha".into(), ParamValue::Float(0.1));
        p.insert("l1_ratio".into(), ParamValue::Float(1.5));
        assert!(m.set_params(&p).is_err());
        assert_eq!(m.params()["alpha"], ParamValue::Float(1.0));

        let mut p = ParamSet::new();
        p.insert("gamma".into(), ParamValue::Float(0.1));
        assert!(matches!(m.set_params(&p), Err(ModelError::InvalidParam { .. })));
    }

    #[test]
    fn zero_feature_matrix_fits_intercept() {
        let x = Array2::<f64>::zeros((3, 0));
        let y = array![1.0, 2.0, 3.0];
        let mut m = ElasticNet::default();
        m.fit(&x, &y).unwrap();
        assert_eq!(m.predict(&x).unwrap(), array![2.0, 2.0, 2.0]);
    }
}
