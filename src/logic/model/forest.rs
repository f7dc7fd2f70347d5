//! Bagged Tree Ensemble
//!
//! Bootstrap-aggregated regression trees. Each tree fits a bootstrap
//! resample of the rows; the ensemble prediction is the tree mean, clipped
//! to the unit interval since the regression itself is not bounded.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::tree::{RegressionTree, TreeConfig};

#[derive(Debug, Clone)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub tree: TreeConfig,
    /// Seed for bootstrap sampling; fixed for reproducible training runs
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self { n_trees: 100, tree: TreeConfig::default(), seed: 42 }
    }
}

#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    /// Fit the full ensemble. Returns only once every tree is fitted; a
    /// partially trained forest is never observable.
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>, config: &ForestConfig) -> Self {
        let n = x.nrows();
        assert!(n > 0, "cannot fit a forest on zero samples");

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut trees = Vec::with_capacity(config.n_trees);

        for _ in 0..config.n_trees {
            let indices: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            trees.push(RegressionTree::fit(x, y, &indices, &config.tree));
        }

        Self { trees }
    }

    /// Mean over trees, clamped to [0, 1].
    pub fn predict(&self, features: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|tree| tree.predict(features)).sum();
        (sum / self.trees.len() as f64).clamp(0.0, 1.0)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn small_config(n_trees: usize) -> ForestConfig {
        ForestConfig {
            n_trees,
            tree: TreeConfig { max_depth: 4, min_samples_split: 2, min_samples_leaf: 1 },
            seed: 7,
        }
    }

    #[test]
    fn test_forest_learns_a_step_function() {
        let x = array![
            [1.0], [1.5], [2.0], [2.5], [3.0], [3.5],
            [7.0], [7.5], [8.0], [8.5], [9.0], [9.5]
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];

        let forest = RandomForest::fit(&x, &y, &small_config(25));
        assert!(forest.predict(&[2.0]) < 0.3);
        assert!(forest.predict(&[9.0]) > 0.7);
    }

    #[test]
    fn test_prediction_is_clamped_to_unit_interval() {
        // Targets outside [0,1] force leaf values outside the interval;
        // the ensemble output must still be clipped.
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let high = array![1.6, 1.7, 1.8, 1.9];
        let forest = RandomForest::fit(&x, &high, &small_config(10));
        assert_eq!(forest.predict(&[2.5]), 1.0);

        let low = array![-0.5, -0.6, -0.7, -0.8];
        let forest = RandomForest::fit(&x, &low, &small_config(10));
        assert_eq!(forest.predict(&[2.5]), 0.0);
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let x = array![[1.0], [2.0], [3.0], [6.0], [7.0], [8.0]];
        let y = array![0.1, 0.2, 0.1, 0.8, 0.9, 0.8];

        let a = RandomForest::fit(&x, &y, &small_config(15));
        let b = RandomForest::fit(&x, &y, &small_config(15));
        for probe in [1.5, 4.5, 7.5] {
            assert_eq!(a.predict(&[probe]), b.predict(&[probe]));
        }
    }

    #[test]
    fn test_tree_count() {
        let x = array![[1.0], [2.0]];
        let y = array![0.0, 1.0];
        let forest = RandomForest::fit(&x, &y, &small_config(5));
        assert_eq!(forest.n_trees(), 5);
    }
}
