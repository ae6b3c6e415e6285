//! External NLP capabilities consumed by the extractor stages.
//!
//! The multiverse never trains these models. It receives them as explicit
//! handles (load once, share via `Arc`, drop at process end) and only takes
//! the arg-max of what they return.

pub mod diagnostics;
pub mod sentiment;
pub mod topic;

use std::collections::BTreeMap;

use ndarray::{Array2, ArrayView1};

use crate::error::CapabilityError;

pub use sentiment::{LexiconSentiment, LookupSentiment};
pub use topic::TermTopicModel;

/// Text → {label → score}.
pub trait SentimentModel: Send + Sync {
    fn name(&self) -> &str;

    fn scores(&self, text: &str) -> Result<BTreeMap<String, f64>, CapabilityError>;
}

/// Column of text → rows × topics score matrix.
pub trait TopicModel: Send + Sync {
    fn name(&self) -> &str;

    fn n_topics(&self) -> usize;

    /// One row per input text, one column per topic.
    fn transform(&self, texts: &[&str]) -> Result<Array2<f64>, CapabilityError>;
}

/// Highest-scoring label. Ties go to the label that iterates first, which for
/// a `BTreeMap` is the alphabetically smallest. NaN scores are skipped.
pub fn argmax_label(scores: &BTreeMap<String, f64>) -> Option<&str> {
    let mut best: Option<(&str, f64)> = None;
    for (label, &score) in scores {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((label.as_str(), score)),
        }
    }
    best.map(|(label, _)| label)
}

/// Index of the highest score, lowest index on ties. NaN scores are skipped.
pub fn argmax_index(row: ArrayView1<'_, f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &score) in row.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}

/// Display name of topic `index` in diagnostics tables.
pub fn topic_name(index: usize) -> String {
    format!("TP{index}")
}

/// Lowercased whitespace/punctuation tokens, shared by the bundled adapters.
pub(crate) fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric() && c != '_' && c != '\'')
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}
