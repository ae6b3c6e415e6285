//! Hyperparameter values and search spaces.
//!
//! A [`SearchSpace`] maps hyperparameter names to a [`Distribution`]: either a
//! discrete candidate set or a continuous/integer range. Keys are held in a
//! `BTreeMap` so enumeration order is stable across runs.

use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A single hyperparameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Integral view. Floats are accepted only when they hold a whole number.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v}"),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

/// One concrete hyperparameter assignment.
pub type ParamSet = BTreeMap<String, ParamValue>;

/// Render a param set as `{a: 1, b: 0.5}` for logs and error messages.
pub fn format_params(params: &ParamSet) -> String {
    let body: Vec<String> = params.iter().map(|(k, v)| format!("{k}: {v}")).collect();
    format!("{{{}}}", body.join(", "))
}

/// Where a hyperparameter's candidate values come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Distribution {
    /// Discrete candidate set. The only kind usable by grid search.
    Choices { values: Vec<ParamValue> },
    /// Continuous range, inclusive.
    Float {
        low: f64,
        high: f64,
        #[serde(default)]
        log: bool,
    },
    /// Integer range, inclusive.
    Int {
        low: i64,
        high: i64,
        #[serde(default)]
        log: bool,
    },
}

impl Distribution {
    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let bad = |reason: String| Err(ConfigError::MalformedSearchSpace(format!("{name}: {reason}")));
        match self {
            Self::Choices { values } if values.is_empty() => bad("empty candidate set".into()),
            Self::Choices { .. } => Ok(()),
            Self::Float { low, high, log } => {
                if !low.is_finite() || !high.is_finite() || low > high {
                    return bad(format!("invalid float range [{low}, {high}]"));
                }
                if *log && *low <= 0.0 {
                    return bad(format!("log range needs a positive lower bound, got {low}"));
                }
                // Uniform sampling scales the width by 1 / (1 - ε), which must stay finite.
                if !*log && !((high - low) / (1.0 - f64::EPSILON)).is_finite() {
                    return bad(format!("float range [{low}, {high}] is too wide to sample"));
                }
                Ok(())
            }
            Self::Int { low, high, log } => {
                if low > high {
                    return bad(format!("invalid int range [{low}, {high}]"));
                }
                if *log && *low <= 0 {
                    return bad(format!("log range needs a positive lower bound, got {low}"));
                }
                Ok(())
            }
        }
    }

    /// Draw one value (log-uniform for `log` ranges).
    pub fn sample(&self, rng: &mut impl Rng) -> ParamValue {
        match self {
            Self::Choices { values } => values[rng.gen_range(0..values.len())].clone(),
            Self::Float { low, high, log } => {
                if low == high {
                    return ParamValue::Float(*low);
                }
                let v = if *log {
                    (rng.gen_range(low.ln()..=high.ln())).exp()
                } else {
                    rng.gen_range(*low..=*high)
                };
                ParamValue::Float(v.clamp(*low, *high))
            }
            Self::Int { low, high, log } => {
                let v = if *log && low != high {
                    let lo = (*low as f64).ln();
                    let hi = (*high as f64 + 1.0).ln();
                    (rng.gen_range(lo..hi).exp().floor() as i64).clamp(*low, *high)
                } else {
                    rng.gen_range(*low..=*high)
                };
                ParamValue::Int(v)
            }
        }
    }

    /// Position of `value` inside the distribution, scaled to `[0, 1]`.
    /// `None` for discrete choices.
    pub fn normalized(&self, value: &ParamValue) -> Option<f64> {
        let scale = |v: f64, lo: f64, hi: f64| if hi > lo { (v - lo) / (hi - lo) } else { 0.0 };
        match self {
            Self::Choices { .. } => None,
            Self::Float { low, high, log } => {
                let v = value.as_f64()?;
                Some(if *log {
                    scale(v.ln(), low.ln(), high.ln())
                } else {
                    scale(v, *low, *high)
                })
            }
            Self::Int { low, high, log } => {
                let v = value.as_f64()?;
                let (lo, hi) = (*low as f64, *high as f64);
                Some(if *log {
                    scale(v.ln(), lo.ln(), hi.ln())
                } else {
                    scale(v, lo, hi)
                })
            }
        }
    }
}

/// Mapping from hyperparameter name to its distribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchSpace {
    params: BTreeMap<String, Distribution>,
}

impl SearchSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, name: impl Into<String>, dist: Distribution) -> Self {
        self.params.insert(name.into(), dist);
        self
    }

    pub fn choices<V: Into<ParamValue>>(self, name: impl Into<String>, values: Vec<V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.add(name, Distribution::Choices { values })
    }

    pub fn float(self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.add(name, Distribution::Float { low, high, log: false })
    }

    pub fn log_float(self, name: impl Into<String>, low: f64, high: f64) -> Self {
        self.add(name, Distribution::Float { low, high, log: true })
    }

    pub fn int(self, name: impl Into<String>, low: i64, high: i64) -> Self {
        self.add(name, Distribution::Int { low, high, log: false })
    }

    pub fn get(&self, name: &str) -> Option<&Distribution> {
        self.params.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Distribution)> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, dist) in &self.params {
            dist.validate(name)?;
        }
        Ok(())
    }

    /// Number of grid points, or `None` if any distribution is continuous.
    pub fn grid_size(&self) -> Option<usize> {
        self.params.values().try_fold(1usize, |acc, d| match d {
            Distribution::Choices { values } => Some(acc * values.len()),
            _ => None,
        })
    }

    /// Every combination of the candidate sets, keys in sorted order with
    /// the last key varying fastest. An empty space yields one empty set.
    pub fn grid(&self) -> Result<Vec<ParamSet>, ConfigError> {
        self.validate()?;
        let mut grid: Vec<ParamSet> = vec![ParamSet::new()];
        for (name, dist) in &self.params {
            let Distribution::Choices { values } = dist else {
                return Err(ConfigError::MalformedSearchSpace(format!(
                    "{name}: grid search needs a discrete candidate set"
                )));
            };
            grid = grid
                .into_iter()
                .flat_map(|partial| {
                    values.iter().map(move |v| {
                        let mut next = partial.clone();
                        next.insert(name.clone(), v.clone());
                        next
                    })
                })
                .collect();
        }
        Ok(grid)
    }

    /// Draw one assignment for every hyperparameter.
    pub fn sample(&self, rng: &mut impl Rng) -> ParamSet {
        self.params
            .iter()
            .map(|(name, dist)| (name.clone(), dist.sample(rng)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn grid_enumerates_last_key_fastest() {
        let space = SearchSpace::new()
            .choices("alpha", vec![0.1, 1.0])
            .choices("l1_ratio", vec![0.2, 0.8]);
        let grid = space.grid().unwrap();
        assert_eq!(grid.len(), 4);
        assert_eq!(grid[0]["alpha"], ParamValue::Float(0.1));
        assert_eq!(grid[0]["l1_ratio"], ParamValue::Float(0.2));
        assert_eq!(grid[1]["alpha"], ParamValue::Float(0.1));
        assert_eq!(grid[1]["l1_ratio"], ParamValue::Float(0.8));
        assert_eq!(grid[2]["alpha"], ParamValue::Float(1.0));
    }

    #[test]
    fn empty_space_has_single_empty_grid_point() {
        let grid = SearchSpace::new().grid().unwrap();
        assert_eq!(grid, vec![ParamSet::new()]);
    }

    #[test]
    fn grid_rejects_continuous_ranges() {
        let space = SearchSpace::new().float("alpha", 0.0, 1.0);
        assert!(matches!(space.grid(), Err(ConfigError::MalformedSearchSpace(_))));
        assert_eq!(space.grid_size(), None);
    }

    #[test]
    fn validate_rejects_inverted_and_log_ranges() {
        assert!(SearchSpace::new().float("a", 2.0, 1.0).validate().is_err());
        assert!(SearchSpace::new().log_float("a", 0.0, 1.0).validate().is_err());
        assert!(SearchSpace::new().int("n", 5, 1).validate().is_err());
        let empty: Vec<f64> = vec![];
        assert!(SearchSpace::new().choices("c", empty).validate().is_err());
    }

    #[test]
    fn validate_rejects_unsampleable_float_width() {
        let space = SearchSpace::new().float("alpha", -f64::MAX, f64::MAX);
        assert!(matches!(space.validate(), Err(ConfigError::MalformedSearchSpace(_))));
        let space = SearchSpace::new().float("alpha", 0.0, f64::MAX);
        assert!(matches!(space.validate(), Err(ConfigError::MalformedSearchSpace(_))));
        assert!(SearchSpace::new().float("alpha", 0.0, 1e300).validate().is_ok());
        assert!(SearchSpace::new().log_float("alpha", 1e-300, f64::MAX).validate().is_ok());
    }

    #[test]
    fn samples_stay_in_range() {
        let space = SearchSpace::new()
            .log_float("lr", 0.001, 0.3)
            .int("depth", 2, 5)
            .choices("kind", vec!["a", "b"]);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let p = space.sample(&mut rng);
            let lr = p["lr"].as_f64().unwrap();
            assert!((0.001..=0.3).contains(&lr));
            let depth = p["depth"].as_i64().unwrap();
            assert!((2..=5).contains(&depth));
            assert!(matches!(p["kind"].as_str(), Some("a") | Some("b")));
        }
    }

    #[test]
    fn tagged_search_space_parses() {
        let json = r#"{
            "alpha": {"type": "choices", "values": [0.1, 1.0]},
            "n_estimators": {"type": "int", "low": 10, "high": 100},
            "learning_rate": {"type": "float", "low": 0.01, "high": 0.3, "log": true}
        }"#;
        let space: SearchSpace = serde_json::from_str(json).unwrap();
        assert_eq!(space.len(), 3);
        assert_eq!(
            space.get("n_estimators"),
            Some(&Distribution::Int { low: 10, high: 100, log: false })
        );
        assert!(space.validate().is_ok());
    }

    #[test]
    fn untagged_values_keep_int_float_distinction() {
        let v: Vec<ParamValue> = serde_json::from_str("[1, 1.5, true, \"x\"]").unwrap();
        assert_eq!(
            v,
            vec![
                ParamValue::Int(1),
                ParamValue::Float(1.5),
                ParamValue::Bool(true),
                ParamValue::Str("x".into())
            ]
        );
    }
}
