//! Performance records and the results table.
//!
//! The table grows by one record per evaluated (model, combination) pair, in
//! enumeration order. Each pair appears at most once.

use std::cmp::Ordering;

use mktmv_core::estimator::Regressor;
use mktmv_core::params::format_params;
use mktmv_core::search::{SearchMode, SearchResult};
use mktmv_core::{Combination, ParamSet};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A second record for a pair already in the table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("results table already holds {model} + {combination}")]
pub struct DuplicateRecord {
    pub model: String,
    pub combination: String,
}

/// Outcome of one (model, combination) pair.
#[derive(Debug, Clone)]
pub struct PerformanceRecord {
    pub model_name: String,
    pub combination: Combination,
    /// `"<model> + <combination>"`.
    pub label: String,
    /// Dataset columns the combination selected.
    pub feature_names: Vec<String>,
    /// Columns of the model-ready matrix after extraction and encoding.
    pub output_features: Vec<String>,
    /// Best configuration refit on the full data.
    pub estimator: Box<dyn Regressor>,
    pub score_mean: f64,
    pub score_std: f64,
    pub best_params: ParamSet,
    pub mode: SearchMode,
    pub n_trials: usize,
}

impl PerformanceRecord {
    pub fn new(
        model_name: impl Into<String>,
        combination: Combination,
        feature_names: Vec<String>,
        output_features: Vec<String>,
        result: SearchResult,
    ) -> Self {
        let model_name = model_name.into();
        let label = format!("{model_name} + {combination}");
        Self {
            model_name,
            combination,
            label,
            feature_names,
            output_features,
            estimator: result.best_estimator,
            score_mean: result.best_score.mean,
            score_std: result.best_score.std,
            best_params: result.best_params,
            mode: result.mode,
            n_trials: result.trials.len(),
        }
    }

    /// Flat, serializable view without the fitted estimator.
    pub fn to_row(&self) -> RecordRow {
        RecordRow {
            model_name: self.model_name.clone(),
            combination: self.combination.clone(),
            label: self.label.clone(),
            feature_names: self.feature_names.clone(),
            output_features: self.output_features.clone(),
            estimator: self.estimator.name().to_string(),
            score_mean: self.score_mean,
            score_std: self.score_std,
            best_params: self.best_params.clone(),
            mode: self.mode,
            n_trials: self.n_trials,
        }
    }
}

/// Serializable projection of a [`PerformanceRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRow {
    pub model_name: String,
    pub combination: Combination,
    pub label: String,
    pub feature_names: Vec<String>,
    pub output_features: Vec<String>,
    /// Estimator name only; fitted state is not persisted.
    pub estimator: String,
    pub score_mean: f64,
    pub score_std: f64,
    pub best_params: ParamSet,
    pub mode: SearchMode,
    pub n_trials: usize,
}

/// Ordered collection of performance records.
#[derive(Debug, Clone, Default)]
pub struct ResultsTable {
    records: Vec<PerformanceRecord>,
}

impl ResultsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. A second record for the same pair is rejected.
    pub fn push(&mut self, record: PerformanceRecord) -> Result<(), DuplicateRecord> {
        if self.get(&record.model_name, &record.combination).is_some() {
            return Err(DuplicateRecord {
                model: record.model_name,
                combination: record.combination.label(),
            });
        }
        self.records.push(record);
        Ok(())
    }

    pub fn records(&self) -> &[PerformanceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&PerformanceRecord> {
        self.records.last()
    }

    pub fn get(&self, model: &str, combination: &Combination) -> Option<&PerformanceRecord> {
        self.records
            .iter()
            .find(|r| r.model_name == model && &r.combination == combination)
    }

    /// Records by descending mean score. NaN sorts last; ties keep run order.
    pub fn sorted_by_score(&self) -> Vec<&PerformanceRecord> {
        let mut sorted: Vec<&PerformanceRecord> = self.records.iter().collect();
        sorted.sort_by(|a, b| match (a.score_mean.is_nan(), b.score_mean.is_nan()) {
            (false, false) => b
                .score_mean
                .partial_cmp(&a.score_mean)
                .unwrap_or(Ordering::Equal),
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (true, true) => Ordering::Equal,
        });
        sorted
    }

    pub fn top_n(&self, n: usize) -> Vec<&PerformanceRecord> {
        self.sorted_by_score().into_iter().take(n).collect()
    }

    pub fn best(&self) -> Option<&PerformanceRecord> {
        self.sorted_by_score().into_iter().next()
    }

    pub fn rows(&self) -> Vec<RecordRow> {
        self.records.iter().map(PerformanceRecord::to_row).collect()
    }

    /// One row per record, in run order.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let rows = &self.records;
        DataFrame::new(vec![
            Column::new(
                "model".into(),
                rows.iter().map(|r| r.model_name.clone()).collect::<Vec<_>>(),
            ),
            Column::new(
                "combination".into(),
                rows.iter().map(|r| r.combination.label()).collect::<Vec<_>>(),
            ),
            Column::new(
                "label".into(),
                rows.iter().map(|r| r.label.clone()).collect::<Vec<_>>(),
            ),
            Column::new(
                "features".into(),
                rows.iter().map(|r| r.feature_names.join(", ")).collect::<Vec<_>>(),
            ),
            Column::new(
                "score_mean".into(),
                rows.iter().map(|r| r.score_mean).collect::<Vec<_>>(),
            ),
            Column::new(
                "score_std".into(),
                rows.iter().map(|r| r.score_std).collect::<Vec<_>>(),
            ),
            Column::new(
                "best_params".into(),
                rows.iter().map(|r| format_params(&r.best_params)).collect::<Vec<_>>(),
            ),
            Column::new(
                "mode".into(),
                rows.iter().map(|r| r.mode.to_string()).collect::<Vec<_>>(),
            ),
            Column::new(
                "n_trials".into(),
                rows.iter().map(|r| r.n_trials as u64).collect::<Vec<_>>(),
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mktmv_core::estimator::MeanRegressor;
    use mktmv_core::search::CvScore;
    use mktmv_core::FeatureGroup;

    fn record(model: &str, group: FeatureGroup, mean: f64) -> PerformanceRecord {
        let result = SearchResult {
            best_estimator: Box::new(MeanRegressor::default()),
            best_score: CvScore {
                mean,
                std: 0.1,
                fold_scores: vec![mean],
            },
            best_params: ParamSet::new(),
            best_trial: 0,
            trials: Vec::new(),
            mode: SearchMode::Grid,
        };
        PerformanceRecord::new(
            model,
            Combination::new(vec![group]).unwrap(),
            vec!["x".into()],
            vec!["x".into()],
            result,
        )
    }

    #[test]
    fn label_joins_model_and_combination() {
        let r = record("enet", FeatureGroup::Autocorrs, -1.0);
        assert_eq!(r.label, "enet + [autocorrs]");
    }

    #[test]
    fn push_rejects_duplicate_pair() {
        let mut table = ResultsTable::new();
        table.push(record("enet", FeatureGroup::Autocorrs, -1.0)).unwrap();
        table.push(record("enet", FeatureGroup::Sentiment, -1.0)).unwrap();
        let err = table.push(record("enet", FeatureGroup::Autocorrs, -0.5)).unwrap_err();
        assert_eq!(err.model, "enet");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn sorted_by_score_descending_nan_last() {
        let mut table = ResultsTable::new();
        table.push(record("a", FeatureGroup::Autocorrs, -2.0)).unwrap();
        table.push(record("b", FeatureGroup::Autocorrs, f64::NAN)).unwrap();
        table.push(record("c", FeatureGroup::Autocorrs, -0.5)).unwrap();
        table.push(record("d", FeatureGroup::Autocorrs, -2.0)).unwrap();

        let order: Vec<&str> = table.sorted_by_score().iter().map(|r| r.model_name.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "d", "b"]);
        assert_eq!(table.best().unwrap().model_name, "c");
        assert_eq!(table.top_n(2).len(), 2);
    }

    #[test]
    fn dataframe_has_one_row_per_record() {
        let mut table = ResultsTable::new();
        table.push(record("a", FeatureGroup::Autocorrs, -2.0)).unwrap();
        table.push(record("a", FeatureGroup::NewsTheme, -1.0)).unwrap();
        let df = table.to_dataframe().unwrap();
        assert_eq!(df.height(), 2);
        let labels = df.column("label").unwrap().str().unwrap();
        assert_eq!(labels.get(1), Some("a + [newstheme]"));
    }

    #[test]
    fn row_serializes_without_estimator_state() {
        let row = record("a", FeatureGroup::Autocorrs, -2.0).to_row();
        let json = serde_json::to_string(&row).unwrap();
        let back: RecordRow = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
        assert_eq!(back.estimator, "mean");
    }
}
