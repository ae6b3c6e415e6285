//! Bundled sentiment adapters.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::{tokenize, SentimentModel};
use crate::error::CapabilityError;

/// Exact-text lookup table with optional fallback scores.
///
/// Deterministic stand-in for a trained classifier: tests and offline runs
/// can pin every headline's label distribution.
#[derive(Debug, Clone, Default)]
pub struct LookupSentiment {
    table: HashMap<String, BTreeMap<String, f64>>,
    default: Option<BTreeMap<String, f64>>,
}

impl LookupSentiment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<L: Into<String>>(
        mut self,
        text: impl Into<String>,
        scores: impl IntoIterator<Item = (L, f64)>,
    ) -> Self {
        let scores = scores.into_iter().map(|(l, s)| (l.into(), s)).collect();
        self.table.insert(text.into(), scores);
        self
    }

    /// Scores returned for text absent from the table.
    pub fn with_default<L: Into<String>>(mut self, scores: impl IntoIterator<Item = (L, f64)>) -> Self {
        self.default = Some(scores.into_iter().map(|(l, s)| (l.into(), s)).collect());
        self
    }
}

impl SentimentModel for LookupSentiment {
    fn name(&self) -> &str {
        "lookup"
    }

    fn scores(&self, text: &str) -> Result<BTreeMap<String, f64>, CapabilityError> {
        self.table
            .get(text)
            .or(self.default.as_ref())
            .cloned()
            .ok_or_else(|| CapabilityError::UnknownText(text.to_string()))
    }
}

/// Token-weight lexicon: each label's score is its prior plus the summed
/// weights of the tokens that occur in the text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexiconSentiment {
    /// Baseline score per label. Also fixes the label set.
    pub prior: BTreeMap<String, f64>,
    /// token → (label → weight).
    pub weights: HashMap<String, BTreeMap<String, f64>>,
}

impl LexiconSentiment {
    pub fn from_json(json: &str) -> Result<Self, CapabilityError> {
        let lexicon: Self =
            serde_json::from_str(json).map_err(|e| CapabilityError::Failed(e.to_string()))?;
        if lexicon.prior.is_empty() {
            return Err(CapabilityError::Failed("lexicon has no labels".into()));
        }
        Ok(lexicon)
    }
}

impl SentimentModel for LexiconSentiment {
    fn name(&self) -> &str {
        "lexicon"
    }

    fn scores(&self, text: &str) -> Result<BTreeMap<String, f64>, CapabilityError> {
        let mut scores = self.prior.clone();
        for token in tokenize(text) {
            let Some(label_weights) = self.weights.get(&token) else {
                continue;
            };
            for (label, w) in label_weights {
                if let Some(score) = scores.get_mut(label) {
                    *score += w;
                }
            }
        }
        Ok(scores)
    }
}
