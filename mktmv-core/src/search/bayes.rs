//! Sequential model-based sampler in the spirit of TPE.
//!
//! Startup trials sample the prior. After that, each suggestion draws a batch
//! of prior candidates and keeps the one closest, on average, to the top-γ
//! trials so far. Distances are taken in each distribution's normalized
//! `[0, 1]` coordinates (log scale for `log` ranges), so parameters with wide
//! ranges do not dominate.

use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::params::{Distribution, ParamSet, SearchSpace};

#[derive(Debug, Clone)]
pub struct TpeSampler {
    rng: StdRng,
    n_startup_trials: usize,
    /// Quantile of the history treated as "good".
    gamma: f64,
    n_candidates: usize,
}

impl TpeSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            n_startup_trials: 10,
            gamma: 0.25,
            n_candidates: 24,
        }
    }

    pub fn with_n_startup(mut self, n: usize) -> Self {
        self.n_startup_trials = n;
        self
    }

    /// Next assignment to evaluate, given `(params, score)` history where a
    /// larger score is better.
    pub fn suggest(&mut self, space: &SearchSpace, history: &[(ParamSet, f64)]) -> ParamSet {
        if history.is_empty() || history.len() < self.n_startup_trials {
            return space.sample(&mut self.rng);
        }

        let mut sorted: Vec<&(ParamSet, f64)> = history.iter().collect();
        sorted.sort_by(|a, b| descending_nan_last(a.1, b.1));
        let n_good = ((sorted.len() as f64 * self.gamma).ceil() as usize).clamp(1, sorted.len());
        let good: Vec<&ParamSet> = sorted[..n_good].iter().map(|(p, _)| p).collect();

        let mut best: Option<(f64, ParamSet)> = None;
        for _ in 0..self.n_candidates {
            let candidate = space.sample(&mut self.rng);
            let score = similarity(space, &candidate, &good);
            if best.as_ref().map_or(true, |(top, _)| score > *top) {
                best = Some((score, candidate));
            }
        }
        match best {
            Some((_, params)) => params,
            None => space.sample(&mut self.rng),
        }
    }
}

fn descending_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.total_cmp(&a),
    }
}

/// Average of `1 / (1 + rms distance)` between `candidate` and each good trial.
fn similarity(space: &SearchSpace, candidate: &ParamSet, good: &[&ParamSet]) -> f64 {
    if good.is_empty() {
        return 0.0;
    }
    let mut total = 0.0;
    for trial in good {
        let mut sq = 0.0;
        let mut count = 0usize;
        for (name, dist) in space.iter() {
            let (Some(a), Some(b)) = (candidate.get(name), trial.get(name)) else {
                continue;
            };
            let d = match dist {
                Distribution::Choices { .. } => f64::from(u8::from(a != b)),
                _ => match (dist.normalized(a), dist.normalized(b)) {
                    (Some(x), Some(y)) => (x - y).abs(),
                    _ => 1.0,
                },
            };
            sq += d * d;
            count += 1;
        }
        if count > 0 {
            total += 1.0 / (1.0 + (sq / count as f64).sqrt());
        } else {
            total += 1.0;
        }
    }
    total / good.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    fn space() -> SearchSpace {
        SearchSpace::new().float("x", 0.0, 1.0)
    }

    fn at(x: f64) -> ParamSet {
        let mut p = ParamSet::new();
        p.insert("x".into(), ParamValue::Float(x));
        p
    }

    #[test]
    fn startup_trials_sample_prior() {
        let mut a = TpeSampler::new(5);
        let mut b = TpeSampler::new(5);
        assert_eq!(a.suggest(&space(), &[]), b.suggest(&space(), &[]));
    }

    #[test]
    fn suggestions_move_toward_good_region() {
        // Score peaks at x = 0.9.
        let history: Vec<(ParamSet, f64)> = (0..20)
            .map(|i| {
                let x = i as f64 / 19.0;
                (at(x), -(x - 0.9).abs())
            })
            .collect();
        let mut sampler = TpeSampler::new(11).with_n_startup(5);
        let mean: f64 = (0..30)
            .map(|_| sampler.suggest(&space(), &history)["x"].as_f64().unwrap())
            .sum::<f64>()
            / 30.0;
        assert!(mean > 0.6, "mean suggestion {mean}");
    }

    #[test]
    fn zero_startup_samples_prior_on_empty_history() {
        let mut sampler = TpeSampler::new(3).with_n_startup(0);
        let first = sampler.suggest(&space(), &[]);
        let x = first["x"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&x));

        // Model-based from the second suggestion on.
        let second = sampler.suggest(&space(), &[(first, -0.5)]);
        assert!(second.contains_key("x"));
    }

    #[test]
    fn nan_scores_sort_last() {
        let mut v = vec![f64::NAN, -1.0, 0.5];
        v.sort_by(|a, b| descending_nan_last(*a, *b));
        assert_eq!(v[0], 0.5);
        assert!(v[2].is_nan());
    }

    #[test]
    fn choice_distance_is_binary() {
        let space = SearchSpace::new().choices("k", vec!["a", "b"]);
        let mut a = ParamSet::new();
        a.insert("k".into(), ParamValue::from("a"));
        let mut b = ParamSet::new();
        b.insert("k".into(), ParamValue::from("b"));
        assert_eq!(similarity(&space, &a, &[&a]), 1.0);
        assert_eq!(similarity(&space, &a, &[&b]), 0.5);
    }
}
