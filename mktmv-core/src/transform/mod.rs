//! Feature transform stages.
//!
//! Every stage consumes a `DataFrame` and returns a modified one. Stages
//! record the column names they saw at `fit` and produced at `transform` so a
//! fitted pipeline can be introspected afterwards.
//!
//! # Contract
//! - `fit` never mutates the frame and may be called any number of times.
//! - `transform` before any `fit` is [`TransformError::NotFitted`].
//! - `feature_names_out` before any `transform` logs a warning and is `None`.

pub mod column_selector;
pub mod one_hot;
pub mod pipeline;
pub mod sentiment;
pub mod sparse;
pub mod topic;

use polars::prelude::DataFrame;

use crate::error::TransformError;
use crate::frame::column_names;

pub use column_selector::ColumnSelector;
pub use one_hot::OneHotEncoder;
pub use pipeline::{FeatureMatrix, Pipeline};
pub use sentiment::SentimentExtractor;
pub use sparse::{CsrMatrix, ToSparse};
pub use topic::TopicExtractor;

/// A restartable fit/transform stage over a tabular dataset.
pub trait FeatureTransform: Send + Sync {
    /// Short stage kind, e.g. `"column_selector"`.
    fn name(&self) -> &str;

    /// Learn whatever the stage needs from `df` (often just its column names).
    fn fit(&mut self, df: &DataFrame) -> Result<(), TransformError>;

    fn transform(&mut self, df: DataFrame) -> Result<DataFrame, TransformError>;

    fn fit_transform(&mut self, df: DataFrame) -> Result<DataFrame, TransformError> {
        self.fit(&df)?;
        self.transform(df)
    }

    /// Columns seen at the last `fit`, `None` before fitting.
    fn feature_names_in(&self) -> Option<&[String]>;

    /// Columns produced by the last `transform`, `None` before transforming.
    fn feature_names_out(&self) -> Option<&[String]>;
}

/// Input/output column bookkeeping shared by every stage.
#[derive(Debug, Clone, Default)]
pub struct StageTrace {
    names_in: Option<Vec<String>>,
    names_out: Option<Vec<String>>,
}

impl StageTrace {
    pub fn record_fit(&mut self, df: &DataFrame) {
        self.names_in = Some(column_names(df));
    }

    pub fn record_transform(&mut self, df: &DataFrame) {
        self.names_out = Some(column_names(df));
    }

    pub fn is_fitted(&self) -> bool {
        self.names_in.is_some()
    }

    /// `Err(NotFitted)` unless `fit` has been recorded.
    pub fn check_fitted(&self, stage: &str) -> Result<(), TransformError> {
        if self.is_fitted() {
            Ok(())
        } else {
            Err(TransformError::NotFitted(stage.to_string()))
        }
    }

    pub fn names_in(&self) -> Option<&[String]> {
        self.names_in.as_deref()
    }

    pub fn names_out(&self, stage: &str) -> Option<&[String]> {
        if self.names_out.is_none() {
            tracing::warn!(stage, "no output features to report before the first transform");
        }
        self.names_out.as_deref()
    }
}
