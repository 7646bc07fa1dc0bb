use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Hyperparameters of the ensemble. The defaults match the model the crate
/// ships with: 100 bootstrap trees capped at depth 10, seeded with 0.
#[derive(Debug, Clone)]
pub struct ForestParams {
    pub trees: usize,
    pub max_depth: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            trees: 100,
            max_depth: 10,
            seed: 0,
        }
    }
}

/// A node is either a leaf carrying the class distribution of the training
/// rows that reached it, or a split on one binary symptom feature: absent
/// goes left, present goes right.
#[derive(Debug)]
enum Node {
    Leaf {
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug)]
struct DecisionTree {
    root: Node,
}

impl DecisionTree {
    fn distribution(&self, features: &[u8]) -> &[f64] {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { distribution } => return distribution,
                Node::Split { feature, left, right } => {
                    node = if features[*feature] == 0 {
                        left.as_ref()
                    } else {
                        right.as_ref()
                    };
                }
            }
        }
    }
}

/// A variance-reducing ensemble of depth-bounded CART trees over binary
/// symptom features. Fit once at startup; prediction averages the leaf
/// class distributions of all trees into a probability distribution.
#[derive(Debug)]
pub(crate) struct RandomForest {
    trees: Vec<DecisionTree>,
    n_classes: usize,
}

impl RandomForest {
    /// Fits the ensemble. Each tree grows on a bootstrap sample of the rows
    /// and considers sqrt(n_features) candidate features per split, both
    /// drawn from a single seeded RNG so the fit is deterministic.
    pub(crate) fn fit(
        x: &Array2<u8>,
        y: &Array1<usize>,
        n_classes: usize,
        params: &ForestParams,
    ) -> Self {
        let n_rows = x.nrows();
        let mut rng = StdRng::seed_from_u64(params.seed);
        let trees = (0..params.trees)
            .map(|_| {
                let sample: Vec<usize> = (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
                DecisionTree {
                    root: grow(x, y, sample, n_classes, 0, params.max_depth, &mut rng),
                }
            })
            .collect();
        Self { trees, n_classes }
    }

    /// Probability distribution over class codes for one symptom vector.
    pub(crate) fn predict_proba(&self, features: &[u8]) -> Vec<f64> {
        let mut probs = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in probs.iter_mut().zip(tree.distribution(features)) {
                *acc += p;
            }
        }
        let scale = 1.0 / self.trees.len() as f64;
        for p in probs.iter_mut() {
            *p *= scale;
        }
        probs
    }

    /// Most probable class code; used for hold-out accuracy reporting.
    pub(crate) fn predict(&self, features: &[u8]) -> usize {
        self.predict_proba(features)
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(code, _)| code)
            .unwrap_or(0)
    }
}

fn grow(
    x: &Array2<u8>,
    y: &Array1<usize>,
    rows: Vec<usize>,
    n_classes: usize,
    depth: usize,
    max_depth: usize,
    rng: &mut StdRng,
) -> Node {
    let counts = class_counts(y, &rows, n_classes);
    if depth >= max_depth || rows.len() < 2 || is_pure(&counts) {
        return leaf(counts, rows.len());
    }

    let best = best_split(x, y, &rows, n_classes, &counts, rng);
    match best {
        None => leaf(counts, rows.len()),
        Some(feature) => {
            let (absent, present): (Vec<usize>, Vec<usize>) =
                rows.into_iter().partition(|&row| x[(row, feature)] == 0);
            Node::Split {
                feature,
                left: Box::new(grow(x, y, absent, n_classes, depth + 1, max_depth, rng)),
                right: Box::new(grow(x, y, present, n_classes, depth + 1, max_depth, rng)),
            }
        }
    }
}

/// Picks the candidate feature with the largest Gini impurity decrease, or
/// `None` when no candidate actually separates the rows.
fn best_split(
    x: &Array2<u8>,
    y: &Array1<usize>,
    rows: &[usize],
    n_classes: usize,
    parent_counts: &[usize],
    rng: &mut StdRng,
) -> Option<usize> {
    let n_features = x.ncols();
    let candidates = ((n_features as f64).sqrt().ceil() as usize).clamp(1, n_features);
    let mut pool: Vec<usize> = (0..n_features).collect();
    pool.shuffle(rng);
    pool.truncate(candidates);

    let total = rows.len() as f64;
    let parent_gini = gini(parent_counts, rows.len());
    let mut best: Option<(usize, f64)> = None;
    for feature in pool {
        let mut absent_counts = vec![0usize; n_classes];
        let mut absent_total = 0usize;
        for &row in rows {
            if x[(row, feature)] == 0 {
                absent_counts[y[row]] += 1;
                absent_total += 1;
            }
        }
        let present_total = rows.len() - absent_total;
        if absent_total == 0 || present_total == 0 {
            continue;
        }
        let present_counts: Vec<usize> = parent_counts
            .iter()
            .zip(&absent_counts)
            .map(|(all, absent)| all - absent)
            .collect();
        let weighted = (absent_total as f64 * gini(&absent_counts, absent_total)
            + present_total as f64 * gini(&present_counts, present_total))
            / total;
        let improvement = parent_gini - weighted;
        if improvement > 1e-12 && best.map_or(true, |(_, prev)| improvement > prev) {
            best = Some((feature, improvement));
        }
    }
    best.map(|(feature, _)| feature)
}

fn class_counts(y: &Array1<usize>, rows: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &row in rows {
        counts[y[row]] += 1;
    }
    counts
}

fn is_pure(counts: &[usize]) -> bool {
    counts.iter().filter(|&&c| c > 0).count() <= 1
}

fn gini(counts: &[usize], total: usize) -> f64 {
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

fn leaf(counts: Vec<usize>, total: usize) -> Node {
    let total = total.max(1) as f64;
    Node::Leaf {
        distribution: counts.into_iter().map(|c| c as f64 / total).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> (Array2<u8>, Array1<usize>) {
        // Class 0 is defined by the first two features, class 1 by the last
        // two, with enough repetition for bootstrap samples to see both.
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for _ in 0..10 {
            rows.push([1, 1, 0, 0]);
            labels.push(0);
            rows.push([1, 0, 0, 0]);
            labels.push(0);
            rows.push([0, 0, 1, 1]);
            labels.push(1);
            rows.push([0, 0, 0, 1]);
            labels.push(1);
        }
        let x = Array2::from_shape_fn((rows.len(), 4), |(i, j)| rows[i][j]);
        (x, Array1::from(labels))
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (x, y) = separable();
        let forest = RandomForest::fit(&x, &y, 2, &ForestParams::default());
        let probs = forest.predict_proba(&[1, 1, 0, 0]);
        assert_eq!(probs.len(), 2);
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_learns_separable_classes() {
        let (x, y) = separable();
        let forest = RandomForest::fit(&x, &y, 2, &ForestParams::default());
        assert_eq!(forest.predict(&[1, 1, 0, 0]), 0);
        assert_eq!(forest.predict(&[0, 0, 1, 1]), 1);
    }

    #[test]
    fn test_fit_is_deterministic_for_a_seed() {
        let (x, y) = separable();
        let params = ForestParams::default();
        let a = RandomForest::fit(&x, &y, 2, &params);
        let b = RandomForest::fit(&x, &y, 2, &params);
        let probe = [1, 0, 1, 0];
        assert_eq!(a.predict_proba(&probe), b.predict_proba(&probe));
    }

    #[test]
    fn test_depth_cap_of_one_still_predicts() {
        let (x, y) = separable();
        let params = ForestParams {
            trees: 10,
            max_depth: 1,
            seed: 0,
        };
        let forest = RandomForest::fit(&x, &y, 2, &params);
        let probs = forest.predict_proba(&[1, 1, 0, 0]);
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_gini_of_pure_node_is_zero() {
        assert_eq!(gini(&[4, 0], 4), 0.0);
        let mixed = gini(&[2, 2], 4);
        assert!((mixed - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_single_row_class_counts() {
        let y = array![1usize];
        assert_eq!(class_counts(&y, &[0], 3), vec![0, 1, 0]);
    }
}
