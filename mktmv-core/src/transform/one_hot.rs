//! One-hot encoding with the drop-last convention.

use polars::prelude::*;

use super::{FeatureTransform, StageTrace};
use crate::error::TransformError;
use crate::frame::{require_columns, string_values};

/// Categories learned for one encoded column, in first-appearance order.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedColumn {
    pub column: String,
    pub categories: Vec<String>,
}

impl EncodedColumn {
    /// Categories that get an indicator column: all but the last.
    pub fn kept(&self) -> &[String] {
        let k = self.categories.len().saturating_sub(1);
        &self.categories[..k]
    }

    pub fn indicator_names(&self) -> Vec<String> {
        self.kept()
            .iter()
            .map(|cat| format!("{}_{}", self.column, cat))
            .collect()
    }
}

/// Replaces each categorical column with `k - 1` `Float64` indicator columns
/// named `<column>_<category>`.
///
/// Categories are learned at `fit` in order of first appearance and the last
/// one is dropped to avoid collinearity with the intercept. A category first
/// seen at `transform` time encodes as all zeros.
#[derive(Debug, Clone)]
pub struct OneHotEncoder {
    columns: Vec<String>,
    encoded: Option<Vec<EncodedColumn>>,
    trace: StageTrace,
}

impl OneHotEncoder {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            encoded: None,
            trace: StageTrace::default(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Learned categories, `None` before fit.
    pub fn encoded(&self) -> Option<&[EncodedColumn]> {
        self.encoded.as_deref()
    }
}

impl FeatureTransform for OneHotEncoder {
    fn name(&self) -> &str {
        "one_hot_encoder"
    }

    fn fit(&mut self, df: &DataFrame) -> Result<(), TransformError> {
        require_columns(df, &self.columns)?;
        let mut encoded = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let mut categories: Vec<String> = Vec::new();
            for value in string_values(df, column)? {
                if !categories.contains(&value) {
                    categories.push(value);
                }
            }
            encoded.push(EncodedColumn {
                column: column.clone(),
                categories,
            });
        }
        self.encoded = Some(encoded);
        self.trace.record_fit(df);
        Ok(())
    }

    fn transform(&mut self, df: DataFrame) -> Result<DataFrame, TransformError> {
        self.trace.check_fitted(self.name())?;
        let encoded = self
            .encoded
            .as_ref()
            .ok_or_else(|| TransformError::NotFitted(self.name().to_string()))?;

        let mut indicators: Vec<Column> = Vec::new();
        for enc in encoded {
            let values = string_values(&df, &enc.column)?;
            for (cat, name) in enc.kept().iter().zip(enc.indicator_names()) {
                let bits: Vec<f64> = values
                    .iter()
                    .map(|v| if v == cat { 1.0 } else { 0.0 })
                    .collect();
                indicators.push(Column::new(name.into(), bits));
            }
        }

        let mut out = df.drop_many(self.columns.iter().map(String::as_str));
        for column in indicators {
            out.with_column(column)?;
        }
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
