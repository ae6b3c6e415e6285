//! Hyperparameter search: scoring, cross-validation, samplers and the driver.

pub mod bayes;
pub mod cv;
pub mod driver;
pub mod scoring;

pub use bayes::TpeSampler;
pub use cv::{cross_validate, CvScore, Fold, KFold};
pub use driver::{SearchDriver, SearchMode, SearchResult, SearchSettings, TrialRecord};
pub use scoring::Scoring;
