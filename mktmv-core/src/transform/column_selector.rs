//! Column subsetting stage.

use polars::prelude::*;

use super::{FeatureTransform, StageTrace};
use crate::error::TransformError;
use crate::frame::require_columns;

/// Keeps exactly the configured columns, in the configured order.
#[derive(Debug, Clone)]
pub struct ColumnSelector {
    columns: Vec<String>,
    trace: StageTrace,
}

impl ColumnSelector {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            trace: StageTrace::default(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl FeatureTransform for ColumnSelector {
    fn name(&self) -> &str {
        "column_selector"
    }

    fn fit(&mut self, df: &DataFrame) -> Result<(), TransformError> {
        self.trace.record_fit(df);
        Ok(())
    }

    fn transform(&mut self, df: DataFrame) -> Result<DataFrame, TransformError> {
        self.trace.check_fitted(self.name())?;
        require_columns(&df, &self.columns)?;
        let out = df.select(self.columns.iter().map(String::as_str))?;
        self.trace.record_transform(&out);
        Ok(out)
    }

    fn feature_names_in(&self) -> Option<&[String]> {
        self.trace.names_in()
    }

    fn feature_names_out(&self) -> Option<&[String]> {
        self.trace.names_out(self.name())
    }
}
