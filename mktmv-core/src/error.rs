//! Error kinds shared across the core.
//!
//! Three kinds surface to callers of the multiverse:
//! - [`SchemaError`]: an expected column is missing or has the wrong shape
//! - [`ConfigError`]: unknown feature group, malformed search space, bad settings
//! - [`SearchFailure`]: a trial or the final refit raised
//!
//! None of them are retried. [`MultiverseError`] folds them (plus transform-stage
//! failures) into one type for the orchestrator.

use thiserror::Error;

/// Expected column missing from a dataset, or column contents unusable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("type mismatch in column {column}: expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    #[error("null value in column {column} at row {row}")]
    NullValue { column: String, row: usize },

    #[error("length mismatch: expected {expected} rows, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Invalid experiment definition. Raised at construction time, never mid-run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unknown feature group: {0}")]
    UnknownFeatureGroup(String),

    #[error("feature-group combination is empty")]
    EmptyCombination,

    #[error("feature group {0} listed twice in one combination")]
    DuplicateGroup(String),

    #[error("duplicate combination: {0}")]
    DuplicateCombination(String),

    #[error("feature group {group} needs a {capability} capability but none was provided")]
    MissingCapability {
        group: String,
        capability: &'static str,
    },

    #[error("malformed search space: {0}")]
    MalformedSearchSpace(String),

    #[error("unknown model kind: {0}")]
    UnknownModel(String),

    #[error("duplicate model name: {0}")]
    DuplicateModel(String),

    #[error("unknown scoring metric: {0}")]
    UnknownScoring(String),

    #[error("invalid setting: {0}")]
    InvalidSetting(String),
}

/// Failure of the model-fitting capability.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("model is not fitted")]
    NotFitted,

    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("cannot fit on an empty dataset")]
    EmptyInput,

    #[error("non-finite value in training data")]
    NonFinite,

    #[error("invalid hyperparameter {name}: {reason}")]
    InvalidParam { name: String, reason: String },
}

/// Failure of an external sentiment/topic capability.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CapabilityError {
    #[error("capability returned no usable scores for {0:?}")]
    NoScores(String),

    #[error("no entry for text {0:?} and no default scores configured")]
    UnknownText(String),

    #[error("capability shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("capability failed: {0}")]
    Failed(String),
}

/// A hyperparameter search could not complete.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchFailure {
    #[error("trial {trial} failed with params {params}: {source}")]
    Trial {
        trial: usize,
        params: String,
        #[source]
        source: ModelError,
    },

    #[error("refit of the best configuration failed: {0}")]
    Refit(#[source] ModelError),

    #[error("cannot split {n_samples} samples into {n_splits} folds")]
    InvalidFolds { n_samples: usize, n_splits: usize },

    #[error("no trial produced a finite score")]
    NoFiniteScore,
}

/// Failure inside a feature transform stage.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("stage {0} used before fit")]
    NotFitted(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("capability error: {0}")]
    Capability(#[from] CapabilityError),

    #[error("dataframe error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

/// Umbrella error for one (model, combination) iteration.
#[derive(Debug, Error)]
pub enum MultiverseError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Search(#[from] SearchFailure),

    #[error("transform failed: {0}")]
    Transform(#[from] TransformError),
}
