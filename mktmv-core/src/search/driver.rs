//! Hyperparameter search over a regressor with k-fold cross-validation.
//!
//! Grid mode evaluates every point of a discrete search space. Bayesian mode
//! runs the sequential sampler until the trial budget or the timeout. Either
//! way the best configuration (highest mean score, earliest on ties) is refit
//! on the full data. A failing trial aborts the whole search.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::bayes::TpeSampler;
use super::cv::{cross_validate, CvScore, Fold, KFold};
use super::Scoring;
use crate::error::{MultiverseError, SearchFailure};
use crate::estimator::Regressor;
use crate::params::{format_params, ParamSet, SearchSpace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Grid,
    Bayesian,
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grid => f.write_str("grid"),
            Self::Bayesian => f.write_str("bayesian"),
        }
    }
}

/// Knobs shared by every search in a run.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub cv_folds: usize,
    pub scoring: Scoring,
    /// Trial budget in Bayesian mode.
    pub n_trials: usize,
    /// Wall-clock budget in Bayesian mode, checked before each trial.
    pub timeout: Duration,
    pub seed: u64,
    pub n_startup_trials: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            cv_folds: 10,
            scoring: Scoring::default(),
            n_trials: 50,
            timeout: Duration::from_secs(600),
            seed: 42,
            n_startup_trials: 10,
        }
    }
}

/// One evaluated configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub number: usize,
    pub params: ParamSet,
    pub score: CvScore,
}

/// Outcome of one search. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Best configuration refit on the full data.
    pub best_estimator: Box<dyn Regressor>,
    pub best_score: CvScore,
    pub best_params: ParamSet,
    pub best_trial: usize,
    pub trials: Vec<TrialRecord>,
    pub mode: SearchMode,
}

impl SearchResult {
    /// Human-readable best-trial block.
    pub fn summary(&self) -> String {
        let rule = "-----".repeat(5);
        let mut out = format!(
            "{rule}\nBest trial\n{rule}\nValues       :  {}\nParams       : \n",
            self.best_score.mean
        );
        for (k, v) in &self.best_params {
            out.push_str(&format!("\t {k}: {v}\n"));
        }
        out
    }
}

#[derive(Debug, Clone, Default)]
pub struct SearchDriver {
    settings: SearchSettings,
}

impl SearchDriver {
    pub fn new(settings: SearchSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Tune `estimator` over `space` and refit the winner.
    ///
    /// `bayes` selects sequential Bayesian search; otherwise the space must be
    /// fully discrete and is searched exhaustively. An empty space evaluates the
    /// estimator's current parameters once.
    pub fn search(
        &self,
        estimator: &dyn Regressor,
        x: &Array2<f64>,
        y: &Array1<f64>,
        space: &SearchSpace,
        bayes: bool,
    ) -> Result<SearchResult, MultiverseError> {
        space.validate()?;
        let folds = KFold::new(self.settings.cv_folds).split(x.nrows())?;
        let mode = if bayes {
            SearchMode::Bayesian
        } else {
            SearchMode::Grid
        };

        let trials = match mode {
            SearchMode::Grid => self.run_grid(estimator, x, y, space, &folds)?,
            SearchMode::Bayesian => self.run_bayes(estimator, x, y, space, &folds)?,
        };

        let best = select_best(&trials).ok_or(SearchFailure::NoFiniteScore)?;
        let best_trial = &trials[best];

        let mut best_estimator = estimator.boxed_clone();
        best_estimator
            .set_params(&best_trial.params)
            .map_err(SearchFailure::Refit)?;
        best_estimator.fit(x, y).map_err(SearchFailure::Refit)?;

        let result = SearchResult {
            best_estimator,
            best_score: best_trial.score.clone(),
            best_params: best_trial.params.clone(),
            best_trial: best,
            mode,
            trials,
        };
        tracing::info!(
            model = estimator.name(),
            %mode,
            trials = result.trials.len(),
            score_mean = result.best_score.mean,
            score_std = result.best_score.std,
            params = %format_params(&result.best_params),
            "search finished\n{}",
            result.summary()
        );
        Ok(result)
    }

    fn evaluate(
        &self,
        number: usize,
        estimator: &dyn Regressor,
        x: &Array2<f64>,
        y: &Array1<f64>,
        params: ParamSet,
        folds: &[Fold],
    ) -> Result<TrialRecord, SearchFailure> {
        let fail = |source| SearchFailure::Trial {
            trial: number,
            params: format_params(&params),
            source,
        };
        let mut candidate = estimator.boxed_clone();
        candidate.set_params(&params).map_err(fail)?;
        let score = cross_validate(candidate.as_ref(), x, y, folds, self.settings.scoring)
            .map_err(fail)?;
        tracing::debug!(
            trial = number,
            params = %format_params(&params),
            mean = score.mean,
            std = score.std,
            "trial complete"
        );
        Ok(TrialRecord {
            number,
            params,
            score,
        })
    }

    fn run_grid(
        &self,
        estimator: &dyn Regressor,
        x: &Array2<f64>,
        y: &Array1<f64>,
        space: &SearchSpace,
        folds: &[Fold],
    ) -> Result<Vec<TrialRecord>, MultiverseError> {
        let grid = space.grid()?;
        tracing::debug!(model = estimator.name(), points = grid.len(), "grid search");
        let mut trials = Vec::with_capacity(grid.len());
        for (number, params) in grid.into_iter().enumerate() {
            trials.push(self.evaluate(number, estimator, x, y, params, folds)?);
        }
        Ok(trials)
    }

    fn run_bayes(
        &self,
        estimator: &dyn Regressor,
        x: &Array2<f64>,
        y: &Array1<f64>,
        space: &SearchSpace,
        folds: &[Fold],
    ) -> Result<Vec<TrialRecord>, MultiverseError> {
        if space.is_empty() {
            let trial = self.evaluate(0, estimator, x, y, ParamSet::new(), folds)?;
            return Ok(vec![trial]);
        }

        let mut sampler =
            TpeSampler::new(self.settings.seed).with_n_startup(self.settings.n_startup_trials);
        let started = Instant::now();
        let mut history: Vec<(ParamSet, f64)> = Vec::new();
        let mut seen: HashMap<String, CvScore> = HashMap::new();
        let mut trials = Vec::new();

        for number in 0..self.settings.n_trials.max(1) {
            if number > 0 && started.elapsed() >= self.settings.timeout {
                tracing::info!(
                    model = estimator.name(),
                    completed = number,
                    "search timeout reached"
                );
                break;
            }
            let params = sampler.suggest(space, &history);
            let key = format_params(&params);
            // Deterministic estimators give the same score for a repeated point.
            let trial = match seen.get(&key) {
                Some(score) => TrialRecord {
                    number,
                    params,
                    score: score.clone(),
                },
                None => {
                    let trial = self.evaluate(number, estimator, x, y, params, folds)?;
                    seen.insert(key, trial.score.clone());
                    trial
                }
            };
            history.push((trial.params.clone(), trial.score.mean));
            trials.push(trial);
        }
        Ok(trials)
    }
}

/// Index of the highest finite mean score. Earliest wins ties.
fn select_best(trials: &[TrialRecord]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, t) in trials.iter().enumerate() {
        let m = t.score.mean;
        if !m.is_finite() {
            continue;
        }
        if best.map_or(true, |(_, top)| m > top) {
            best = Some((i, m));
        }
    }
    best.map(|(i, _)| i)
}
