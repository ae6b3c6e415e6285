//! Multiverse orchestrator: every model spec against every combination.
//!
//! Pairs are enumerated with models outer and combinations inner. Each pair
//! gets its own copy of the dataset, its own pipeline and its own search seed.
//! The first failing pair aborts the run; records appended before it are
//! handed back inside the error.

use std::collections::HashSet;

use mktmv_core::search::{SearchDriver, SearchSettings};
use mktmv_core::{
    assemble, Combination, ConfigError, ExtractorHandles, ModelSpec, MultiverseError, SchemaError,
};
use ndarray::Array1;
use polars::prelude::DataFrame;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ExperimentConfig;
use crate::results::{DuplicateRecord, PerformanceRecord, ResultsTable};
use crate::rng::SeedHierarchy;

/// Errors that stop an orchestration run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid input: {0}")]
    Input(#[from] SchemaError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Duplicate(#[from] DuplicateRecord),

    #[error("run aborted at {model} + {combination} after {completed} completed pairs: {source}")]
    Aborted {
        model: String,
        combination: Combination,
        completed: usize,
        /// Records appended before the failure.
        partial: ResultsTable,
        #[source]
        source: MultiverseError,
    },
}

impl RunError {
    /// Rows kept from an aborted run.
    pub fn partial_results(&self) -> Option<&ResultsTable> {
        match self {
            Self::Aborted { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

/// Evaluates the full model × combination grid.
#[derive(Debug, Clone)]
pub struct Multiverse {
    models: Vec<ModelSpec>,
    combinations: Vec<Combination>,
    handles: ExtractorHandles,
    settings: SearchSettings,
    seeds: SeedHierarchy,
    parallel: bool,
}

impl Multiverse {
    /// Every combination is checked against the handles up front, so a
    /// missing capability fails here and not halfway through a run.
    pub fn new(
        models: Vec<ModelSpec>,
        combinations: Vec<Combination>,
        handles: ExtractorHandles,
        settings: SearchSettings,
    ) -> Result<Self, ConfigError> {
        let mut names = HashSet::new();
        for model in &models {
            if !names.insert(model.name().to_string()) {
                return Err(ConfigError::DuplicateModel(model.name().to_string()));
            }
        }
        let mut seen = HashSet::new();
        for combination in &combinations {
            if !seen.insert(combination.clone()) {
                return Err(ConfigError::DuplicateCombination(combination.label()));
            }
            handles.check(combination)?;
        }
        Ok(Self {
            seeds: SeedHierarchy::new(settings.seed),
            models,
            combinations,
            handles,
            settings,
            parallel: false,
        })
    }

    /// Build from a parsed experiment file.
    pub fn from_config(
        config: &ExperimentConfig,
        handles: ExtractorHandles,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(
            config.to_model_specs()?,
            config.combinations.clone(),
            handles,
            config.search_settings(),
        )?
        .with_parallelism(config.parallel))
    }

    /// Evaluate pairs on the rayon pool. Records still land in enumeration order.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn models(&self) -> &[ModelSpec] {
        &self.models
    }

    pub fn combinations(&self) -> &[Combination] {
        &self.combinations
    }

    pub fn n_pairs(&self) -> usize {
        self.models.len() * self.combinations.len()
    }

    /// All pairs, models outer and combinations inner.
    pub fn pairs(&self) -> Vec<(&ModelSpec, &Combination)> {
        self.models
            .iter()
            .flat_map(|m| self.combinations.iter().map(move |c| (m, c)))
            .collect()
    }

    pub fn run(&self, data: &DataFrame, target: &Array1<f64>) -> Result<ResultsTable, RunError> {
        self.run_with_progress(data, target, |_, _, _| {})
    }

    /// Run every pair, calling `on_record(index, total, record)` after each
    /// record is appended.
    pub fn run_with_progress<F>(
        &self,
        data: &DataFrame,
        target: &Array1<f64>,
        mut on_record: F,
    ) -> Result<ResultsTable, RunError>
    where
        F: FnMut(usize, usize, &PerformanceRecord),
    {
        if target.len() != data.height() {
            return Err(SchemaError::LengthMismatch {
                expected: data.height(),
                actual: target.len(),
            }
            .into());
        }

        let pairs = self.pairs();
        let total = pairs.len();
        info!(
            models = self.models.len(),
            combinations = self.combinations.len(),
            rows = data.height(),
            parallel = self.parallel,
            "starting multiverse run"
        );

        let mut table = ResultsTable::new();
        if self.parallel {
            let outcomes: Vec<Result<PerformanceRecord, MultiverseError>> = pairs
                .par_iter()
                .map(|(spec, combination)| self.run_pair(data, target, spec, combination))
                .collect();
            for (index, ((spec, combination), outcome)) in pairs.iter().zip(outcomes).enumerate() {
                self.append(&mut table, index, total, spec, combination, outcome, &mut on_record)?;
            }
        } else {
            for (index, (spec, combination)) in pairs.iter().enumerate() {
                let outcome = self.run_pair(data, target, spec, combination);
                self.append(&mut table, index, total, spec, combination, outcome, &mut on_record)?;
            }
        }

        info!(records = table.len(), "multiverse run complete");
        Ok(table)
    }

    #[allow(clippy::too_many_arguments)]
    fn append<F>(
        &self,
        table: &mut ResultsTable,
        index: usize,
        total: usize,
        spec: &ModelSpec,
        combination: &Combination,
        outcome: Result<PerformanceRecord, MultiverseError>,
        on_record: &mut F,
    ) -> Result<(), RunError>
    where
        F: FnMut(usize, usize, &PerformanceRecord),
    {
        match outcome {
            Ok(record) => {
                table.push(record)?;
                if let Some(record) = table.last() {
                    on_record(index, total, record);
                }
                Ok(())
            }
            Err(source) => {
                warn!(
                    model = spec.name(),
                    combination = %combination,
                    completed = table.len(),
                    error = %source,
                    "pair failed, aborting run"
                );
                Err(RunError::Aborted {
                    model: spec.name().to_string(),
                    combination: combination.clone(),
                    completed: table.len(),
                    partial: std::mem::take(table),
                    source,
                })
            }
        }
    }

    /// Assemble, fit-transform and search one pair.
    fn run_pair(
        &self,
        data: &DataFrame,
        target: &Array1<f64>,
        spec: &ModelSpec,
        combination: &Combination,
    ) -> Result<PerformanceRecord, MultiverseError> {
        info!(model = spec.name(), combination = %combination, "evaluating pair");

        let assembled = assemble(combination, &self.handles)?;
        let mut pipeline = assembled.pipeline.with_sparse_output();
        let matrix = pipeline.fit_transform_matrix(data.clone())?;
        let output_features = pipeline
            .feature_names_out()
            .map(<[String]>::to_vec)
            .unwrap_or_default();
        debug!(
            rows = matrix.nrows(),
            cols = matrix.ncols(),
            features = ?output_features,
            "feature matrix ready"
        );

        let settings = SearchSettings {
            seed: self.seeds.sub_seed(spec.name(), combination),
            ..self.settings.clone()
        };
        let result = SearchDriver::new(settings).search(
            spec.estimator(),
            &matrix.into_dense(),
            target,
            spec.space(),
            spec.bayes_opt(),
        )?;

        info!(
            model = spec.name(),
            combination = %combination,
            score_mean = result.best_score.mean,
            score_std = result.best_score.std,
            "pair complete"
        );
        Ok(PerformanceRecord::new(
            spec.name(),
            combination.clone(),
            assembled.selected_columns,
            output_features,
            result,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mktmv_core::estimator::MeanRegressor;
    use mktmv_core::{FeatureGroup, SearchSpace};
    use polars::prelude::df;

    fn mean_spec(name: &str) -> ModelSpec {
        ModelSpec::new(name, Box::new(MeanRegressor::default()), SearchSpace::new(), false).unwrap()
    }

    fn autocorrs() -> Combination {
        Combination::new(vec![FeatureGroup::Autocorrs]).unwrap()
    }

    fn frame(n: usize) -> DataFrame {
        let lag = |k: f64| (0..n).map(|i| i as f64 * k).collect::<Vec<f64>>();
        df!(
            "spy_tscore_c2c_lag_1" => lag(1.0),
            "spy_tscore_c2c_lag_2" => lag(2.0),
            "spy_tscore_c2c_lag_3" => lag(3.0),
        )
        .unwrap()
    }

    fn settings() -> SearchSettings {
        SearchSettings {
            cv_folds: 3,
            ..SearchSettings::default()
        }
    }

    #[test]
    fn pairs_enumerate_models_outer() {
        let combos = vec![
            autocorrs(),
            Combination::new(vec![FeatureGroup::Sentiment, FeatureGroup::Autocorrs]).unwrap(),
        ];
        let handles = ExtractorHandles::new().with_sentiment(std::sync::Arc::new(
            mktmv_core::capability::LookupSentiment::new().with_default([("neutral", 1.0)]),
        ));
        let mv = Multiverse::new(vec![mean_spec("a"), mean_spec("b")], combos, handles, settings())
            .unwrap();
        let order: Vec<(String, String)> = mv
            .pairs()
            .iter()
            .map(|(m, c)| (m.name().to_string(), c.label()))
            .collect();
        assert_eq!(mv.n_pairs(), 4);
        assert_eq!(order[0], ("a".into(), "[autocorrs]".into()));
        assert_eq!(order[1], ("a".into(), "[sentiment, autocorrs]".into()));
        assert_eq!(order[2].0, "b");
    }

    #[test]
    fn missing_capability_fails_at_construction() {
        let combos = vec![Combination::new(vec![FeatureGroup::NewsTheme]).unwrap()];
        let err = Multiverse::new(vec![mean_spec("a")], combos, ExtractorHandles::new(), settings())
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCapability { capability: "topic", .. }));
    }

    #[test]
    fn duplicate_model_rejected() {
        let err = Multiverse::new(
            vec![mean_spec("a"), mean_spec("a")],
            vec![autocorrs()],
            ExtractorHandles::new(),
            settings(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateModel(_)));
    }

    #[test]
    fn target_length_must_match() {
        let mv = Multiverse::new(vec![mean_spec("a")], vec![autocorrs()], ExtractorHandles::new(), settings())
            .unwrap();
        let err = mv.run(&frame(6), &Array1::zeros(5)).unwrap_err();
        assert!(matches!(
            err,
            RunError::Input(SchemaError::LengthMismatch { expected: 6, actual: 5 })
        ));
    }

    #[test]
    fn progress_reports_every_pair_in_order() {
        let mv = Multiverse::new(
            vec![mean_spec("a"), mean_spec("b")],
            vec![autocorrs()],
            ExtractorHandles::new(),
            settings(),
        )
        .unwrap();
        let y = Array1::from_iter((0..9).map(|i| i as f64));
        let mut seen = Vec::new();
        let table = mv
            .run_with_progress(&frame(9), &y, |i, total, r| seen.push((i, total, r.model_name.clone())))
            .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(seen, vec![(0, 2, "a".to_string()), (1, 2, "b".to_string())]);
    }

    #[test]
    fn parallel_matches_sequential() {
        let build = |parallel| {
            Multiverse::new(
                vec![mean_spec("a"), mean_spec("b")],
                vec![autocorrs()],
                ExtractorHandles::new(),
                settings(),
            )
            .unwrap()
            .with_parallelism(parallel)
        };
        let y = Array1::from_iter((0..9).map(|i| (i * i) as f64));
        let seq = build(false).run(&frame(9), &y).unwrap();
        let par = build(true).run(&frame(9), &y).unwrap();
        let names = |t: &ResultsTable| t.records().iter().map(|r| (r.label.clone(), r.score_mean)).collect::<Vec<_>>();
        assert_eq!(names(&seq), names(&par));
    }
}
