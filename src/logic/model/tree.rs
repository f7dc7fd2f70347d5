//! Regression Tree
//!
//! Single CART-style regression tree: greedy variance-reduction splits,
//! depth and leaf-size limits. The ensemble in `forest.rs` owns bootstrap
//! sampling; a tree only sees the row indices it was handed.

use ndarray::{Array1, Array2};

#[derive(Debug, Clone)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self { max_depth: 10, min_samples_split: 5, min_samples_leaf: 2 }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug, Clone)]
pub struct RegressionTree {
    root: Node,
}

impl RegressionTree {
    /// Fit on the given row indices of (x, y).
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>, indices: &[usize], config: &TreeConfig) -> Self {
        assert!(!indices.is_empty(), "cannot fit a tree on zero samples");
        let root = build_node(x, y, indices, config, 0);
        Self { root }
    }

    pub fn predict(&self, features: &[f64]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { value } => return *value,
                Node::Split { feature, threshold, left, right } => {
                    node = if features[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }
}

fn build_node(
    x: &Array2<f64>,
    y: &Array1<f64>,
    indices: &[usize],
    config: &TreeConfig,
    depth: usize,
) -> Node {
    let mean = mean_of(y, indices);

    if depth >= config.max_depth
        || indices.len() < config.min_samples_split
        || is_constant(y, indices)
    {
        return Node::Leaf { value: mean };
    }

    let Some(split) = best_split(x, y, indices, config) else {
        return Node::Leaf { value: mean };
    };

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| x[[i, split.feature]] <= split.threshold);

    Node::Split {
        feature: split.feature,
        threshold: split.threshold,
        left: Box::new(build_node(x, y, &left_idx, config, depth + 1)),
        right: Box::new(build_node(x, y, &right_idx, config, depth + 1)),
    }
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
}

/// Exhaustive scan over features; per feature, thresholds are midpoints
/// between consecutive distinct sorted values. Score = summed squared
/// error of the two children (computed incrementally with prefix sums).
fn best_split(
    x: &Array2<f64>,
    y: &Array1<f64>,
    indices: &[usize],
    config: &TreeConfig,
) -> Option<SplitCandidate> {
    let n = indices.len();
    let mut best: Option<(f64, SplitCandidate)> = None;

    let total_sum: f64 = indices.iter().map(|&i| y[i]).sum();
    let total_sq: f64 = indices.iter().map(|&i| y[i] * y[i]).sum();

    for feature in 0..x.ncols() {
        let mut order: Vec<usize> = indices.to_vec();
        order.sort_by(|&a, &b| {
            x[[a, feature]].partial_cmp(&x[[b, feature]]).unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;

        for (pos, &i) in order.iter().enumerate().take(n - 1) {
            left_sum += y[i];
            left_sq += y[i] * y[i];

            let here = x[[i, feature]];
            let next = x[[order[pos + 1], feature]];
            if here == next {
                continue; // no boundary between equal values
            }

            let left_n = pos + 1;
            let right_n = n - left_n;
            if left_n < config.min_samples_leaf || right_n < config.min_samples_leaf {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            // SSE = sum(y^2) - n * mean^2, per side
            let sse = (left_sq - left_sum * left_sum / left_n as f64)
                + (right_sq - right_sum * right_sum / right_n as f64);

            if best.as_ref().map_or(true, |(best_sse, _)| sse < *best_sse) {
                best = Some((
                    sse,
                    SplitCandidate { feature, threshold: (here + next) / 2.0 },
                ));
            }
        }
    }

    best.map(|(_, candidate)| candidate)
}

fn mean_of(y: &Array1<f64>, indices: &[usize]) -> f64 {
    indices.iter().map(|&i| y[i]).sum::<f64>() / indices.len() as f64
}

fn is_constant(y: &Array1<f64>, indices: &[usize]) -> bool {
    let first = y[indices[0]];
    indices.iter().all(|&i| y[i] == first)
}
