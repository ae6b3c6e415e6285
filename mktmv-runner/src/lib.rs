//! mktmv runner: experiment configuration, multiverse orchestration, results.
//!
//! This crate builds on `mktmv-core` to provide:
//! - TOML experiment files with a content-addressed run id
//! - The multiverse orchestrator (every model spec × every combination)
//! - Per-pair seed derivation so parallel and sequential runs agree
//! - The results table with ranking and a polars view
//! - Dataset loading (CSV, Parquet) and results export (CSV, JSON)

pub mod config;
pub mod data_loader;
pub mod export;
pub mod orchestrator;
pub mod results;
pub mod rng;

pub use config::{ConfigFileError, ExperimentConfig, ModelSpecConfig, RunId};
pub use data_loader::{
    load_frame, load_sentiment_lexicon, load_topic_model, split_target, LoadError,
};
pub use export::{
    export_csv, export_json, import_json, load_artifacts, save_artifacts, ResultsManifest,
};
pub use orchestrator::{Multiverse, RunError};
pub use results::{DuplicateRecord, PerformanceRecord, RecordRow, ResultsTable};
pub use rng::SeedHierarchy;
