//! Pipeline assembly: feature-group combination → composed transform chain.
//!
//! For each group in the order given:
//! - `newstheme` adds a topic extractor on `theme_sub` and tracks `theme` for encoding
//! - `sentiment` adds a sentiment extractor on `headline` and tracks `sentiment`
//! - `autocorrs` adds the three lag columns to the selection, no stage
//!
//! A column selector over every consumed column is prepended, and a drop-last
//! one-hot encoder over the tracked categorical columns is appended when any
//! were tracked.

use std::sync::Arc;

use crate::capability::{SentimentModel, TopicModel};
use crate::error::ConfigError;
use crate::feature_group::{
    Combination, FeatureGroup, HEADLINE_COLUMN, SENTIMENT_COLUMN, THEME_COLUMN,
    THEME_SOURCE_COLUMN,
};
use crate::transform::{
    ColumnSelector, FeatureTransform, OneHotEncoder, Pipeline, SentimentExtractor,
    TopicExtractor,
};

pub const SELECT_STEP: &str = "select_col";
pub const NEWSTHEME_STEP: &str = "extract_newstheme";
pub const SENTIMENT_STEP: &str = "extract_sentiment";
pub const ENCODER_STEP: &str = "oh_encoder";

/// External models injected into extractor stages. Loaded once, shared by
/// every pipeline that needs them.
#[derive(Clone, Default)]
pub struct ExtractorHandles {
    pub sentiment: Option<Arc<dyn SentimentModel>>,
    pub topic: Option<Arc<dyn TopicModel>>,
}

impl ExtractorHandles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sentiment(mut self, model: Arc<dyn SentimentModel>) -> Self {
        self.sentiment = Some(model);
        self
    }

    pub fn with_topic(mut self, model: Arc<dyn TopicModel>) -> Self {
        self.topic = Some(model);
        self
    }

    /// Fail if `combination` needs a handle that was not provided.
    pub fn check(&self, combination: &Combination) -> Result<(), ConfigError> {
        for group in combination.groups() {
            let missing = match group {
                FeatureGroup::NewsTheme if self.topic.is_none() => Some("topic"),
                FeatureGroup::Sentiment if self.sentiment.is_none() => Some("sentiment"),
                _ => None,
            };
            if let Some(capability) = missing {
                return Err(ConfigError::MissingCapability {
                    group: group.to_string(),
                    capability,
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ExtractorHandles {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorHandles")
            .field("sentiment", &self.sentiment.as_ref().map(|m| m.name().to_string()))
            .field("topic", &self.topic.as_ref().map(|m| m.name().to_string()))
            .finish()
    }
}

/// A composed pipeline plus the column bookkeeping that produced it.
#[derive(Debug)]
pub struct AssembledPipeline {
    pub pipeline: Pipeline,
    /// Raw dataset columns consumed, in group order.
    pub selected_columns: Vec<String>,
    /// Categorical columns handed to the one-hot encoder.
    pub encoded_columns: Vec<String>,
}

/// Build the pipeline for `combination`. Nothing is returned on failure.
pub fn assemble(
    combination: &Combination,
    handles: &ExtractorHandles,
) -> Result<AssembledPipeline, ConfigError> {
    handles.check(combination)?;

    let mut selected: Vec<String> = Vec::new();
    let mut encoded: Vec<String> = Vec::new();
    let mut stages: Vec<(&str, Box<dyn FeatureTransform>)> = Vec::new();

    for group in combination.groups() {
        selected.extend(group.source_columns().iter().map(|c| c.to_string()));
        if let Some(column) = group.encoded_column() {
            encoded.push(column.to_string());
        }
        match group {
            FeatureGroup::NewsTheme => {
                let model = handles.topic.clone().ok_or(ConfigError::MissingCapability {
                    group: group.to_string(),
                    capability: "topic",
                })?;
                stages.push((
                    NEWSTHEME_STEP,
                    Box::new(TopicExtractor::new(model, THEME_SOURCE_COLUMN, THEME_COLUMN)),
                ));
            }
            FeatureGroup::Sentiment => {
                let model = handles
                    .sentiment
                    .clone()
                    .ok_or(ConfigError::MissingCapability {
                        group: group.to_string(),
                        capability: "sentiment",
                    })?;
                stages.push((
                    SENTIMENT_STEP,
                    Box::new(SentimentExtractor::new(model, HEADLINE_COLUMN, SENTIMENT_COLUMN)),
                ));
            }
            FeatureGroup::Autocorrs => {}
        }
    }

    let mut pipeline =
        Pipeline::new().push(SELECT_STEP, Box::new(ColumnSelector::new(selected.clone())));
    for (name, stage) in stages {
        pipeline = pipeline.push(name, stage);
    }
    if !encoded.is_empty() {
        pipeline = pipeline.push(ENCODER_STEP, Box::new(OneHotEncoder::new(encoded.clone())));
    }

    tracing::debug!(
        combination = %combination,
        steps = ?pipeline.step_names(),
        "assembled pipeline"
    );
    Ok(AssembledPipeline {
        pipeline,
        selected_columns: selected,
        encoded_columns: encoded,
    })
}

/// Parse group names, then [`assemble`]. Unknown names fail before any stage is built.
pub fn assemble_named<S: AsRef<str>>(
    names: &[S],
    handles: &ExtractorHandles,
) -> Result<AssembledPipeline, ConfigError> {
    let combination = Combination::parse(names)?;
    assemble(&combination, handles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{LookupSentiment, TermTopicModel};
    use ndarray::array;

    fn handles() -> ExtractorHandles {
        let topic = TermTopicModel::new(vec!["fed".into()], array![[1.0], [0.0]]).unwrap();
        ExtractorHandles::new()
            .with_sentiment(Arc::new(LookupSentiment::new().with_default([("neutral", 1.0)])))
            .with_topic(Arc::new(topic))
    }

    #[test]
    fn full_combination_step_order() {
        let a = assemble_named(&["newstheme", "sentiment", "autocorrs"], &handles()).unwrap();
        assert_eq!(
            a.pipeline.step_names(),
            vec![SELECT_STEP, NEWSTHEME_STEP, SENTIMENT_STEP, ENCODER_STEP]
        );
        assert_eq!(
            a.selected_columns,
            vec![
                "theme_sub",
                "headline",
                "spy_tscore_c2c_lag_1",
                "spy_tscore_c2c_lag_2",
                "spy_tscore_c2c_lag_3"
            ]
        );
        assert_eq!(a.encoded_columns, vec!["theme", "sentiment"]);
    }

    #[test]
    fn autocorrs_only_has_no_encoder() {
        let a = assemble_named(&["autocorrs"], &handles()).unwrap();
        assert_eq!(a.pipeline.step_names(), vec![SELECT_STEP]);
        assert!(a.encoded_columns.is_empty());
    }

    #[test]
    fn group_order_is_preserved() {
        let a = assemble_named(&["sentiment", "newstheme"], &handles()).unwrap();
        assert_eq!(a.encoded_columns, vec!["sentiment", "theme"]);
    }

    #[test]
    fn bogus_group_fails_without_pipeline() {
        let err = assemble_named(&["autocorrs", "bogus"], &handles()).unwrap_err();
        assert_eq!(err, ConfigError::UnknownFeatureGroup("bogus".into()));
    }

    #[test]
    fn missing_handle_is_config_error() {
        let err = assemble_named(&["sentiment"], &ExtractorHandles::new()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingCapability { capability: "sentiment", .. }
        ));
        assert!(assemble_named(&["autocorrs"], &ExtractorHandles::new()).is_ok());
    }
}
