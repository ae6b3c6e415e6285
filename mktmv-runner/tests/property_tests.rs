//! Property tests for runner invariants.
//!
//! 1. The results table ranks records by non-increasing score and keeps every record
//! 2. A (model, combination) pair is stored at most once
//! 3. Seed derivation depends only on the pair and the master seed

use std::collections::HashSet;

use proptest::prelude::*;

use mktmv_core::estimator::MeanRegressor;
use mktmv_core::search::{CvScore, SearchMode, SearchResult};
use mktmv_core::{Combination, ParamSet};
use mktmv_runner::{PerformanceRecord, ResultsTable, SeedHierarchy};

// ── Fixtures ─────────────────────────────────────────────────────────

fn record(model: &str, combination: Combination, mean: f64) -> PerformanceRecord {
    let result = SearchResult {
        best_estimator: Box::new(MeanRegressor::default()),
        best_score: CvScore {
            mean,
            std: 0.0,
            fold_scores: vec![mean],
        },
        best_params: ParamSet::new(),
        best_trial: 0,
        trials: Vec::new(),
        mode: SearchMode::Grid,
    };
    PerformanceRecord::new(model, combination, Vec::new(), Vec::new(), result)
}

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_entries() -> impl Strategy<Value = Vec<(usize, usize, f64)>> {
    prop::collection::vec((0usize..3, 0usize..7, -10.0f64..0.0), 0..30)
}

// ── 1 & 2. Results table ─────────────────────────────────────────────

proptest! {
    #[test]
    fn ranking_is_sorted_and_complete(entries in arb_entries()) {
        let combos = Combination::all_non_empty();
        let mut table = ResultsTable::new();
        let mut distinct = HashSet::new();
        for (m, c, score) in &entries {
            let accepted = table.push(record(&format!("m{m}"), combos[*c].clone(), *score)).is_ok();
            prop_assert_eq!(accepted, distinct.insert((*m, *c)));
        }
        prop_assert_eq!(table.len(), distinct.len());

        let ranked = table.sorted_by_score();
        prop_assert_eq!(ranked.len(), table.len());
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].score_mean >= pair[1].score_mean);
        }
        if let Some(best) = table.best() {
            prop_assert!(table.records().iter().all(|r| r.score_mean <= best.score_mean));
        }
    }
}

// ── 3. Seed hierarchy ────────────────────────────────────────────────

proptest! {
    #[test]
    fn sub_seed_is_a_pure_function(master in any::<u64>(), model in "[a-z_]{1,12}", c in 0usize..7) {
        let combos = Combination::all_non_empty();
        let a = SeedHierarchy::new(master).sub_seed(&model, &combos[c]);
        let b = SeedHierarchy::new(master).sub_seed(&model, &combos[c]);
        prop_assert_eq!(a, b);
    }
}
