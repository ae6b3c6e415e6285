//! Ordered chain of named transform stages.

use ndarray::Array2;
use polars::prelude::DataFrame;

use super::{CsrMatrix, FeatureTransform, ToSparse};
use crate::error::TransformError;
use crate::frame::to_feature_matrix;

/// Model-ready features: dense, or sparse when the pipeline ends in [`ToSparse`].
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureMatrix {
    Dense(Array2<f64>),
    Sparse(CsrMatrix),
}

impl FeatureMatrix {
    pub fn nrows(&self) -> usize {
        match self {
            Self::Dense(m) => m.nrows(),
            Self::Sparse(m) => m.nrows(),
        }
    }

    pub fn ncols(&self) -> usize {
        match self {
            Self::Dense(m) => m.ncols(),
            Self::Sparse(m) => m.ncols(),
        }
    }

    /// Dense view for estimators that need one.
    pub fn into_dense(self) -> Array2<f64> {
        match self {
            Self::Dense(m) => m,
            Self::Sparse(m) => m.to_dense(),
        }
    }
}

/// Named stages applied in order, each fitted on the previous stage's output.
#[derive(Default)]
pub struct Pipeline {
    steps: Vec<(String, Box<dyn FeatureTransform>)>,
    sparse: Option<ToSparse>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, name: impl Into<String>, stage: Box<dyn FeatureTransform>) -> Self {
        self.steps.push((name.into(), stage));
        self
    }

    /// End the pipeline with a sparse conversion.
    pub fn with_sparse_output(mut self) -> Self {
        self.sparse = Some(ToSparse::new());
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn step(&self, name: &str) -> Option<&dyn FeatureTransform> {
        self.steps
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, stage)| stage.as_ref())
    }

    pub fn fit_transform(&mut self, mut df: DataFrame) -> Result<DataFrame, TransformError> {
        for (name, stage) in &mut self.steps {
            df = stage.fit_transform(df)?;
            tracing::debug!(step = %name, columns = df.width(), "fitted step");
        }
        Ok(df)
    }

    /// Apply already-fitted stages.
    pub fn transform(&mut self, mut df: DataFrame) -> Result<DataFrame, TransformError> {
        for (_, stage) in &mut self.steps {
            df = stage.transform(df)?;
        }
        Ok(df)
    }

    /// Fit every stage and produce the model-ready matrix.
    pub fn fit_transform_matrix(&mut self, df: DataFrame) -> Result<FeatureMatrix, TransformError> {
        let out = self.fit_transform(df)?;
        match &mut self.sparse {
            Some(sparse) => Ok(FeatureMatrix::Sparse(sparse.fit_transform(&out)?)),
            None => Ok(FeatureMatrix::Dense(to_feature_matrix(&out)?)),
        }
    }

    /// Output columns of the last stage, `None` before the first transform.
    pub fn feature_names_out(&self) -> Option<&[String]> {
        self.steps.last().and_then(|(_, stage)| stage.feature_names_out())
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.step_names())
            .field("sparse", &self.sparse.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{ColumnSelector, OneHotEncoder};
    use polars::prelude::*;

    fn frame() -> DataFrame {
        df!(
            "sentiment" => ["up", "down", "up"],
            "lag" => [0.5, 0.0, 1.5],
            "unused" => [9.0, 9.0, 9.0],
        )
        .unwrap()
    }

    fn pipeline() -> Pipeline {
        Pipeline::new()
            .push("select_col", Box::new(ColumnSelector::new(["sentiment", "lag"])))
            .push("oh_encoder", Box::new(OneHotEncoder::new(["sentiment"])))
    }

    #[test]
    fn stages_run_in_order() {
        let mut p = pipeline();
        assert_eq!(p.step_names(), vec!["select_col", "oh_encoder"]);
        let out = p.fit_transform(frame()).unwrap();
        assert_eq!(out.width(), 2);
        assert_eq!(p.feature_names_out().unwrap(), &["lag", "sentiment_up"]);
        assert_eq!(
            p.step("select_col").unwrap().feature_names_in().unwrap().len(),
            3
        );
    }

    #[test]
    fn dense_and_sparse_outputs_agree() {
        let dense = pipeline().fit_transform_matrix(frame()).unwrap();
        let sparse = pipeline()
            .with_sparse_output()
            .fit_transform_matrix(frame())
            .unwrap();
        assert!(matches!(sparse, FeatureMatrix::Sparse(_)));
        assert_eq!(sparse.nrows(), 3);
        assert_eq!(dense.into_dense(), sparse.into_dense());
    }

    #[test]
    fn empty_pipeline_passes_frame_through() {
        let mut p = Pipeline::new();
        assert!(p.is_empty());
        assert!(p.feature_names_out().is_none());
        let out = p.fit_transform(frame()).unwrap();
        assert_eq!(out.width(), 3);
    }
}
