//! Bundled topic adapter: projection of a bag of terms onto fixed components.

use std::collections::HashMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::{tokenize, TopicModel};
use crate::error::CapabilityError;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TermTopicFile {
    vocabulary: Vec<String>,
    /// topics × vocabulary, row-major.
    components: Vec<Vec<f64>>,
}

/// Topic model defined by a topic × vocabulary component matrix.
///
/// A text's score for topic `k` is the sum of `components[k, term]` over the
/// text's known terms (repeated terms count repeatedly). Unknown terms add
/// nothing, so a text with no known terms scores zero everywhere and lands on
/// topic 0.
#[derive(Debug, Clone)]
pub struct TermTopicModel {
    vocabulary: Vec<String>,
    index: HashMap<String, usize>,
    components: Array2<f64>,
}

impl TermTopicModel {
    pub fn new(vocabulary: Vec<String>, components: Array2<f64>) -> Result<Self, CapabilityError> {
        if components.ncols() != vocabulary.len() {
            return Err(CapabilityError::ShapeMismatch {
                expected: format!("{} vocabulary columns", vocabulary.len()),
                actual: format!("{} columns", components.ncols()),
            });
        }
        if components.nrows() == 0 {
            return Err(CapabilityError::Failed("topic model has no topics".into()));
        }
        let index = vocabulary
            .iter()
            .enumerate()
            .map(|(i, term)| (term.to_lowercase(), i))
            .collect();
        Ok(Self {
            vocabulary,
            index,
            components,
        })
    }

    /// Parse `{"vocabulary": [...], "components": [[...], ...]}`.
    pub fn from_json(json: &str) -> Result<Self, CapabilityError> {
        let file: TermTopicFile =
            serde_json::from_str(json).map_err(|e| CapabilityError::Failed(e.to_string()))?;
        let n_topics = file.components.len();
        let n_terms = file.vocabulary.len();
        let mut flat = Vec::with_capacity(n_topics * n_terms);
        for (k, row) in file.components.iter().enumerate() {
            if row.len() != n_terms {
                return Err(CapabilityError::ShapeMismatch {
                    expected: format!("{n_terms} weights for topic {k}"),
                    actual: row.len().to_string(),
                });
            }
            flat.extend_from_slice(row);
        }
        let components = Array2::from_shape_vec((n_topics, n_terms), flat)
            .map_err(|e| CapabilityError::Failed(e.to_string()))?;
        Self::new(file.vocabulary, components)
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn components(&self) -> &Array2<f64> {
        &self.components
    }
}

impl TopicModel for TermTopicModel {
    fn name(&self) -> &str {
        "term_topic"
    }

    fn n_topics(&self) -> usize {
        self.components.nrows()
    }

    fn transform(&self, texts: &[&str]) -> Result<Array2<f64>, CapabilityError> {
        let mut out = Array2::<f64>::zeros((texts.len(), self.n_topics()));
        for (row, text) in texts.iter().enumerate() {
            for token in tokenize(text) {
                if let Some(&term) = self.index.get(&token) {
                    for k in 0..self.n_topics() {
                        out[[row, k]] += self.components[[k, term]];
                    }
                }
            }
        }
        Ok(out)
    }
}
