//! Sentiment extraction stage.

use std::collections::HashMap;
use std::sync::Arc;

use polars::prelude::*;

use super::{FeatureTransform, StageTrace};
use crate::capability::{argmax_label, SentimentModel};
use crate::error::{CapabilityError, TransformError};
use crate::frame::string_values;

/// Replaces a text column with the arg-max sentiment label of each row.
#[derive(Clone)]
pub struct SentimentExtractor {
    model: Arc<dyn SentimentModel>,
    source: String,
    target: String,
    trace: StageTrace,
}

impl SentimentExtractor {
    pub fn new(model: Arc<dyn SentimentModel>, source: impl Into<String>, target: impl Into<String>) -> Self {
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

    fn label(&self, text: &str) -> Result<String, TransformError> {
        let scores = self.model.scores(text)?;
        argmax_label(&scores)
            .map(str::to_string)
            .ok_or_else(|| CapabilityError::NoScores(text.to_string()).into())
    }
}

impl std::fmt::Debug for SentimentExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentimentExtractor")
            .field("model", &self.model.name())
            .field("source", &self.source)
            .field("target", &self.target)
            .finish()
    }
}

impl FeatureTransform for SentimentExtractor {
    fn name(&self) -> &str {
        "sentiment_extractor"
    }

    fn fit(&mut self, df: &DataFrame) -> Result<(), TransformError> {
        self.trace.record_fit(df);
        Ok(())
    }

    fn transform(&mut self, df: DataFrame) -> Result<DataFrame, TransformError> {
        self.trace.check_fitted(self.name())?;
        let texts = string_values(&df, &self.source)?;

        // Headlines repeat across rows; score each distinct text once.
        let mut memo: HashMap<&str, String> = HashMap::new();
        let mut labels = Vec::with_capacity(texts.len());
        for text in &texts {
            let label = match memo.get(text.as_str()) {
                Some(label) => label.clone(),
                None => {
                    let label = self.label(text)?;
                    memo.insert(text.as_str(), label.clone());
                    label
                }
            };
            labels.push(label);
        }

        let mut out = df.drop(&self.source)?;
        out.with_column(Column::new(self.target.as_str().into(), labels))?;
        self.trace.record_transform(&out);
        tracing::debug!(
            stage = self.name(),
            model = self.model.name(),
            rows = out.height(),
            distinct = memo.len(),
            "extracted sentiment"
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
