//! Serializable experiment configuration.
//!
//! One TOML file describes a whole multiverse run: the search knobs shared by
//! every pair, the model specs and the feature-group combinations. Parsing
//! never builds a half-valid experiment; `load` validates before returning.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mktmv_core::estimator::{create_regressor, ModelKind};
use mktmv_core::search::{Scoring, SearchSettings};
use mktmv_core::{Combination, ConfigError, ModelSpec, ParamSet, SearchSpace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Content-addressable identifier of an experiment configuration.
pub type RunId = String;

/// Errors from reading an experiment file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse experiment TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid experiment: {0}")]
    Invalid(#[from] ConfigError),
}

/// One model choice as written in the experiment file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelSpecConfig {
    pub name: String,
    pub kind: ModelKind,

    /// Sequential Bayesian search instead of exhaustive grid search.
    #[serde(default)]
    pub bayes_opt: bool,

    /// Fixed hyperparameters applied before searching.
    #[serde(default)]
    pub base_params: ParamSet,

    /// Hyperparameters to tune.
    #[serde(default)]
    pub params: SearchSpace,
}

impl ModelSpecConfig {
    /// Build the runtime spec: a fresh regressor of `kind` with `base_params`
    /// applied, paired with the search space.
    pub fn to_model_spec(&self) -> Result<ModelSpec, ConfigError> {
        let mut estimator = create_regressor(self.kind);
        estimator
            .set_params(&self.base_params)
            .map_err(|e| ConfigError::InvalidSetting(format!("{}: {e}", self.name)))?;
        ModelSpec::new(self.name.clone(), estimator, self.params.clone(), self.bayes_opt)
    }
}

/// Full description of a multiverse run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Master seed. Each (model, combination) pair derives its own sub-seed.
    pub seed: u64,
    /// Trial budget for Bayesian searches.
    pub n_trials: usize,
    /// Wall-clock budget per Bayesian search, in seconds.
    pub timeout_secs: u64,
    pub cv_folds: usize,
    pub scoring: Scoring,
    /// Random trials before the sampler starts exploiting.
    pub n_startup_trials: usize,
    /// Evaluate pairs on the rayon pool.
    pub parallel: bool,
    pub combinations: Vec<Combination>,
    pub models: Vec<ModelSpecConfig>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            n_trials: 50,
            timeout_secs: 600,
            cv_folds: 10,
            scoring: Scoring::NegRootMeanSquaredError,
            n_startup_trials: 10,
            parallel: false,
            combinations: Combination::all_non_empty(),
            models: default_models(),
        }
    }
}

fn default_models() -> Vec<ModelSpecConfig> {
    vec![
        ModelSpecConfig {
            name: "elasticnet".into(),
            kind: ModelKind::ElasticNet,
            bayes_opt: false,
            base_params: ParamSet::new(),
            params: SearchSpace::new()
                .choices("alpha", vec![0.001, 0.01, 0.1, 1.0])
                .choices("l1_ratio", vec![0.1, 0.5, 0.9]),
        },
        ModelSpecConfig {
            name: "random_forest".into(),
            kind: ModelKind::RandomForest,
            bayes_opt: true,
            base_params: ParamSet::new(),
            params: SearchSpace::new()
                .int("n_estimators", 50, 300)
                .int("max_depth", 2, 8)
                .int("min_samples_leaf", 1, 20)
                .float("max_features", 0.3, 1.0),
        },
        ModelSpecConfig {
            name: "gradient_boosting".into(),
            kind: ModelKind::GradientBoosting,
            bayes_opt: true,
            base_params: ParamSet::new(),
            params: SearchSpace::new()
                .int("n_estimators", 50, 300)
                .log_float("learning_rate", 0.01, 0.3)
                .int("max_depth", 2, 5)
                .float("subsample", 0.5, 1.0),
        },
    ]
}

impl ExperimentConfig {
    /// Parse without validating.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigFileError> {
        Ok(toml::from_str(s)?)
    }

    /// Read, parse and validate an experiment file.
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Reject anything that would only fail halfway through a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cv_folds < 2 {
            return Err(ConfigError::InvalidSetting(format!(
                "cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        if self.n_trials == 0 {
            return Err(ConfigError::InvalidSetting("n_trials must be positive".into()));
        }
        if self.models.is_empty() {
            return Err(ConfigError::InvalidSetting("no models configured".into()));
        }
        if self.combinations.is_empty() {
            return Err(ConfigError::InvalidSetting("no combinations configured".into()));
        }

        let mut names = HashSet::new();
        for model in &self.models {
            if !names.insert(model.name.as_str()) {
                return Err(ConfigError::DuplicateModel(model.name.clone()));
            }
            model.to_model_spec()?;
        }

        let mut seen = HashSet::new();
        for combination in &self.combinations {
            if !seen.insert(combination) {
                return Err(ConfigError::DuplicateCombination(combination.label()));
            }
        }
        Ok(())
    }

    /// Deterministic BLAKE3 hash of the JSON form.
    pub fn run_id(&self) -> Result<RunId, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    pub fn to_model_specs(&self) -> Result<Vec<ModelSpec>, ConfigError> {
        self.models.iter().map(ModelSpecConfig::to_model_spec).collect()
    }

    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            cv_folds: self.cv_folds,
            scoring: self.scoring,
            n_trials: self.n_trials,
            timeout: Duration::from_secs(self.timeout_secs),
            seed: self.seed,
            n_startup_trials: self.n_startup_trials,
        }
    }

    /// Number of (model, combination) pairs a run will evaluate.
    pub fn n_pairs(&self) -> usize {
        self.models.len() * self.combinations.len()
    }
}
