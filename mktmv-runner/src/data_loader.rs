//! Dataset and capability loading.
//!
//! Datasets are read from CSV or Parquet into a polars DataFrame, then split
//! into the feature frame and the numeric target vector. Capability files
//! (sentiment lexicon, topic components) are JSON.

use std::fs;
use std::path::{Path, PathBuf};

use mktmv_core::capability::{LexiconSentiment, TermTopicModel};
use mktmv_core::frame::{require_columns, target_vector};
use mktmv_core::{CapabilityError, SchemaError, TransformError};
use ndarray::Array1;
use polars::prelude::*;
use thiserror::Error;
use tracing::info;

/// Errors from the loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported dataset format: {0:?} (expected .csv or .parquet)")]
    UnsupportedFormat(String),

    #[error("dataframe error: {0}")]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("invalid capability file {path}: {source}")]
    Capability {
        path: PathBuf,
        #[source]
        source: CapabilityError,
    },
}

/// Read a CSV or Parquet dataset, chosen by file extension.
pub fn load_frame(path: &Path) -> Result<DataFrame, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let df = match ext.as_str() {
        "csv" => CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(1000))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?,
        "parquet" => {
            let file = fs::File::open(path).map_err(|source| LoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            ParquetReader::new(file).finish()?
        }
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };
    info!(path = %path.display(), rows = df.height(), cols = df.width(), "loaded dataset");
    Ok(df)
}

/// Split off the target column. The returned frame no longer contains it.
pub fn split_target(df: &DataFrame, target: &str) -> Result<(DataFrame, Array1<f64>), LoadError> {
    require_columns(df, &[target])?;
    let y = target_vector(df, target)?;
    let features = df.drop(target)?;
    Ok((features, y))
}

fn read_text(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_sentiment_lexicon(path: &Path) -> Result<LexiconSentiment, LoadError> {
    LexiconSentiment::from_json(&read_text(path)?).map_err(|source| LoadError::Capability {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_topic_model(path: &Path) -> Result<TermTopicModel, LoadError> {
    TermTopicModel::from_json(&read_text(path)?).map_err(|source| LoadError::Capability {
        path: path.to_path_buf(),
        source,
    })
}
