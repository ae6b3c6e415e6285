//! Topic extraction stage.

use std::sync::Arc;

use polars::prelude::*;

use super::{FeatureTransform, StageTrace};
use crate::capability::{argmax_index, TopicModel};
use crate::error::{CapabilityError, TransformError};
use crate::frame::string_values;

/// Label prefix for extracted topics: index 3 becomes `topic_3`.
pub const TOPIC_PREFIX: &str = "topic_";

/// Replaces a text column with the arg-max topic label (`topic_<index>`) of each row.
#[derive(Clone)]
pub struct TopicExtractor {
    model: Arc<dyn TopicModel>,
    source: String,
    target: String,
    trace: StageTrace,
}

impl TopicExtractor {
    pub fn new(model: Arc<dyn TopicModel>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            model,
            source: source.into(),
            target: target.into(),
            trace: StageTrace::default(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl std::fmt::Debug for TopicExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicExtractor")
            .field("model", &self.model.name())
            .field("source", &self.source)
            .field("target", &self.target)
            .finish()
    }
}

impl FeatureTransform for TopicExtractor {
    fn name(&self) -> &str {
        "topic_extractor"
    }

    fn fit(&mut self, df: &DataFrame) -> Result<(), TransformError> {
        self.trace.record_fit(df);
        Ok(())
    }

    fn transform(&mut self, df: DataFrame) -> Result<DataFrame, TransformError> {
        self.trace.check_fitted(self.name())?;
        let texts = string_values(&df, &self.source)?;
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let scores = self.model.transform(&refs)?;
        if scores.nrows() != texts.len() {
            return Err(CapabilityError::ShapeMismatch {
                expected: format!("{} rows", texts.len()),
                actual: format!("{} rows", scores.nrows()),
            }
            .into());
        }

        let labels = scores
            .rows()
            .into_iter()
            .zip(&texts)
            .map(|(row, text)| {
                argmax_index(row)
                    .map(|k| format!("{TOPIC_PREFIX}{k}"))
                    .ok_or_else(|| CapabilityError::NoScores(text.clone()))
            })
            .collect::<Result<Vec<String>, _>>()?;

        let mut out = df.drop(&self.source)?;
        out.with_column(Column::new(self.target.as_str().into(), labels))?;
        self.trace.record_transform(&out);
        tracing::debug!(
            stage = self.name(),
            model = self.model.name(),
            topics = scores.ncols(),
            rows = out.height(),
            "extracted topics"
        );
        Ok(out)
    }

    fn feature_names_in(&self) -> Option<&[String]> {
        self.trace.names_in()
    }

    fn feature_names_out(&self) -> Option<&[String]> {
        self.trace.names_out(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::TermTopicModel;
    use crate::frame::column_names;
    use ndarray::{array, Array2};

    fn model() -> Arc<dyn TopicModel> {
        Arc::new(
            TermTopicModel::new(
                vec!["fed".into(), "earnings".into()],
                array![[1.0, 0.0], [0.0, 1.0], [0.0, 1.0]],
            )
            .unwrap(),
        )
    }

    #[test]
    fn labels_rows_with_argmax_topic() {
        let df = df!(
            "theme_sub" => ["fed speaks", "earnings beat", "quiet"],
            "x" => [0.0, 1.0, 2.0],
        )
        .unwrap();
        let mut stage = TopicExtractor::new(model(), "theme_sub", "theme");
        let out = stage.fit_transform(df).unwrap();
        assert_eq!(column_names(&out), vec!["x", "theme"]);
        let labels: Vec<&str> = out
            .column("theme")
            .unwrap()
            .str()
            .unwrap()
            .into_no_null_iter()
            .collect();
        // "earnings" ties topics 1 and 2; lowest index wins. No known terms ties at topic 0.
        assert_eq!(labels, vec!["topic_0", "topic_1", "topic_0"]);
    }

    struct Broken;

    impl TopicModel for Broken {
        fn name(&self) -> &str {
            "broken"
        }
        fn n_topics(&self) -> usize {
            2
        }
        fn transform(&self, _texts: &[&str]) -> Result<Array2<f64>, CapabilityError> {
            Ok(Array2::zeros((1, 2)))
        }
    }

    #[test]
    fn row_count_mismatch_is_rejected() {
        let df = df!("theme_sub" => ["a", "b"]).unwrap();
        let mut stage = TopicExtractor::new(Arc::new(Broken), "theme_sub", "theme");
        assert!(matches!(
            stage.fit_transform(df),
            Err(TransformError::Capability(CapabilityError::ShapeMismatch { .. }))
        ));
    }
}
