//! Gradient boosted regression trees (least-squares loss)
//!
//! Each stage fits a depth-limited regression tree to the current
//! residuals and adds it, scaled by the learning rate, to the ensemble.
//! The initial prediction is the target mean.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Hyperparameters for boosting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A binary regression tree stored as a flat node arena (root at 0)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    score: f64,
}

impl RegressionTree {
    /// Fit a tree to `targets` over every row of `x`
    fn fit(x: &[Vec<f64>], targets: &[f64], params: &BoostingParams) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        let all: Vec<usize> = (0..targets.len()).collect();
        tree.grow(x, targets, all, 0, params);
        tree
    }

    fn grow(
        &mut self,
        x: &[Vec<f64>],
        y: &[f64],
        rows: Vec<usize>,
        depth: usize,
        params: &BoostingParams,
    ) -> usize {
        let mean = rows.iter().map(|&i| y[i]).sum::<f64>() / rows.len() as f64;
        let node_id = self.nodes.len();
        self.nodes.push(TreeNode::Leaf { value: mean });

        let pure = rows.iter().all(|&i| (y[i] - mean).abs() < 1e-12);
        if depth >= params.max_depth || rows.len() < params.min_samples_split || pure {
            return node_id;
        }

        let Some(split) = best_split(x, y, &rows, params.min_samples_leaf) else {
            return node_id;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&i| x[i][split.feature] <= split.threshold);

        let left = self.grow(x, y, left_rows, depth + 1, params);
        let right = self.grow(x, y, right_rows, depth + 1, params);
        self.nodes[node_id] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_id
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Find the split minimizing the summed squared error of both children.
///
/// Equivalent to maximizing `S_l^2 / n_l + S_r^2 / n_r` where `S` is the
/// sum of targets on each side. Thresholds sit halfway between distinct
/// neighbouring feature values.
fn best_split(
    x: &[Vec<f64>],
    y: &[f64],
    rows: &[usize],
    min_leaf: usize,
) -> Option<SplitCandidate> {
    let n = rows.len();
    let total: f64 = rows.iter().map(|&i| y[i]).sum();
    let parent_score = total * total / n as f64;
    let n_features = x[rows[0]].len();

    let mut best: Option<SplitCandidate> = None;
    let mut sorted = rows.to_vec();

    for feature in 0..n_features {
        sorted.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left_sum = 0.0;
        for pos in 0..n - 1 {
            left_sum += y[sorted[pos]];
            let n_left = pos + 1;
            let n_right = n - n_left;
            if n_left < min_leaf || n_right < min_leaf {
                continue;
            }

            let here = x[sorted[pos]][feature];
            let next = x[sorted[pos + 1]][feature];
            if next <= here {
                continue;
            }

            let right_sum = total - left_sum;
            let score =
                left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;

            if score <= parent_score + 1e-12 {
                continue;
            }
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: (here + next) / 2.0,
                    score,
                });
            }
        }
    }

    best
}

/// Least-squares gradient boosting regressor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    params: BoostingParams,
    n_features: usize,
    init: f64,
    trees: Vec<RegressionTree>,
}

impl GradientBoostingRegressor {
    /// Fit the ensemble. Rows must all have the same, non-zero width.
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: BoostingParams) -> Result<Self> {
        if x.is_empty() {
            return Err(Error::Training("cannot fit on an empty sample".into()));
        }
        if x.len() != y.len() {
            return Err(Error::Training(format!(
                "feature rows ({}) and targets ({}) differ in length",
                x.len(),
                y.len()
            )));
        }
        let n_features = x[0].len();
        if n_features == 0 || x.iter().any(|row| row.len() != n_features) {
            return Err(Error::Training("feature rows have inconsistent width".into()));
        }
        if x.iter().flatten().chain(y).any(|v| !v.is_finite()) {
            return Err(Error::Training("sample contains non-finite values".into()));
        }

        let init = y.iter().sum::<f64>() / y.len() as f64;
        let mut current = vec![init; y.len()];
        let mut trees = Vec::with_capacity(params.n_estimators);

        for _ in 0..params.n_estimators {
            let residuals: Vec<f64> = y.iter().zip(&current).map(|(t, p)| t - p).collect();
            if residuals.iter().all(|r| r.abs() < 1e-9) {
                break;
            }

            let tree = RegressionTree::fit(x, &residuals, &params);
            for (pred, row) in current.iter_mut().zip(x) {
                *pred += params.learning_rate * tree.predict(row);
            }
            trees.push(tree);
        }

        Ok(Self {
            params,
            n_features,
            init,
            trees,
        })
    }

    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.n_features {
            return Err(Error::Prediction(format!(
                "expected {} features, got {}",
                self.n_features,
                row.len()
            )));
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(Error::Prediction("feature vector is not finite".into()));
        }

        Ok(self.init
            + self
                .trees
                .iter()
                .map(|t| self.params.learning_rate * t.predict(row))
                .sum::<f64>())
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn params(&self) -> &BoostingParams {
        &self.params
    }
}
