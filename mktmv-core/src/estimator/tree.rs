//! CART regression tree, the building block of the ensembles.

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::index;

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    /// `None` grows until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    /// Fraction of features considered at each split, in `(0, 1]`.
    pub max_features: f64,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_leaf: 1,
            max_features: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    /// Rows going left, in the order they were sorted.
    left: Vec<usize>,
    right: Vec<usize>,
}

/// Squared-error regression tree grown depth-first.
#[derive(Debug, Clone)]
pub(crate) struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Grow a tree on the rows `sample` of `x`/`y`. Rows may repeat (bootstrap).
    pub(crate) fn fit(
        x: &Array2<f64>,
        y: &[f64],
        sample: Vec<usize>,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(x, y, sample, 0, params, rng);
        tree
    }

    pub(crate) fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut at = 0;
        loop {
            match &self.nodes[at] {
                Node::Leaf(value) => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    at = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    fn grow(
        &mut self,
        x: &Array2<f64>,
        y: &[f64],
        rows: Vec<usize>,
        depth: usize,
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> usize {
        let id = self.nodes.len();
        let mean = rows.iter().map(|&i| y[i]).sum::<f64>() / rows.len().max(1) as f64;
        self.nodes.push(Node::Leaf(mean));

        let depth_ok = params.max_depth.map_or(true, |d| depth < d);
        if !depth_ok || rows.len() < 2 * params.min_samples_leaf.max(1) {
            return id;
        }
        let Some(split) = best_split(x, y, &rows, params, rng) else {
            return id;
        };

        let left = self.grow(x, y, split.left, depth + 1, params, rng);
        let right = self.grow(x, y, split.right, depth + 1, params, rng);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }
}

fn candidate_features(n_features: usize, fraction: f64, rng: &mut StdRng) -> Vec<usize> {
    let k = ((fraction * n_features as f64).round() as usize).clamp(1, n_features);
    if k == n_features {
        return (0..n_features).collect();
    }
    let mut picked = index::sample(rng, n_features, k).into_vec();
    picked.sort_unstable();
    picked
}

/// Split maximizing the reduction in squared error, or `None` when no split
/// satisfies `min_samples_leaf` or improves on the parent.
fn best_split(
    x: &Array2<f64>,
    y: &[f64],
    rows: &[usize],
    params: &TreeParams,
    rng: &mut StdRng,
) -> Option<BestSplit> {
    let n_features = x.ncols();
    if n_features == 0 {
        return None;
    }
    let n = rows.len();
    let min_leaf = params.min_samples_leaf.max(1);
    let total: f64 = rows.iter().map(|&i| y[i]).sum();

    let sorted_by = |feature: usize| {
        let mut order = rows.to_vec();
        order.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));
        order
    };

    // (score, feature, threshold, cut)
    let mut best: Option<(f64, usize, f64, usize)> = None;
    for feature in candidate_features(n_features, params.max_features, rng) {
        let order = sorted_by(feature);
        let mut left_sum = 0.0;
        for cut in 1..n {
            left_sum += y[order[cut - 1]];
            if cut < min_leaf || n - cut < min_leaf {
                continue;
            }
            let lo = x[[order[cut - 1], feature]];
            let hi = x[[order[cut], feature]];
            if lo == hi {
                continue;
            }
            let right_sum = total - left_sum;
            // Maximizing this is equivalent to minimizing the children's SSE.
            let score = left_sum * left_sum / cut as f64 + right_sum * right_sum / (n - cut) as f64;
            let improves = match best {
                Some((top, ..)) => score > top + 1e-12,
                None => score > total * total / n as f64 + 1e-12,
            };
            if improves {
                best = Some((score, feature, 0.5 * (lo + hi), cut));
            }
        }
    }

    best.map(|(_, feature, threshold, cut)| {
        let mut left = sorted_by(feature);
        let right = left.split_off(cut);
        BestSplit {
            feature,
            threshold,
            left,
            right,
        }
    })
}
