//! Random forest of CART trees (Gini impurity) for two classes.

use super::dataset::{FeatureRow, LABEL_LONG, N_FEATURES};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
enum Node {
    /// Class frequencies `[short, long]` of the training rows reaching it.
    Leaf { proba: [f64; 2] },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn proba(&self, row: &FeatureRow) -> [f64; 2] {
        let mut node = self;
        loop {
            match node {
                Node::Leaf { proba } => return *proba,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Node,
}

struct Builder<'a> {
    x: &'a [FeatureRow],
    y: &'a [u8],
    params: ForestParams,
    max_features: usize,
}

fn counts(y: &[u8], idx: &[usize]) -> [usize; 2] {
    let mut c = [0usize; 2];
    for &i in idx {
        c[usize::from(y[i] == LABEL_LONG)] += 1;
    }
    c
}

fn gini(c: [usize; 2]) -> f64 {
    let n = (c[0] + c[1]) as f64;
    if n == 0.0 {
        return 0.0;
    }
    let p0 = c[0] as f64 / n;
    let p1 = c[1] as f64 / n;
    1.0 - p0 * p0 - p1 * p1
}

fn leaf(c: [usize; 2]) -> Node {
    let n = (c[0] + c[1]).max(1) as f64;
    Node::Leaf {
        proba: [c[0] as f64 / n, c[1] as f64 / n],
    }
}

impl Builder<'_> {
    fn build(&self, idx: &mut [usize], depth: usize, rng: &mut StdRng) -> Node {
        let c = counts(self.y, idx);
        let pure = c[0] == 0 || c[1] == 0;

        if pure || depth >= self.params.max_depth || idx.len() < self.params.min_samples_split {
            return leaf(c);
        }

        let Some((feature, threshold)) = self.best_split(idx, c, rng) else {
            return leaf(c);
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) =
            idx.iter().partition(|&&i| self.x[i][feature] <= threshold);
        let (mut left_idx, mut right_idx) = (left_idx, right_idx);

        Node::Split {
            feature,
            threshold,
            left: Box::new(self.build(&mut left_idx, depth + 1, rng)),
            right: Box::new(self.build(&mut right_idx, depth + 1, rng)),
        }
    }

    /// Lowest weighted child impurity over a random feature subset;
    /// thresholds are midpoints between consecutive distinct values.
    fn best_split(
        &self,
        idx: &mut [usize],
        total: [usize; 2],
        rng: &mut StdRng,
    ) -> Option<(usize, f64)> {
        let mut features: Vec<usize> = (0..N_FEATURES).collect();
        features.shuffle(rng);

        let n = idx.len() as f64;
        let mut best: Option<(usize, f64, f64)> = None;

        for &f in features.iter().take(self.max_features) {
            idx.sort_by(|&a, &b| self.x[a][f].total_cmp(&self.x[b][f]));

            let mut left = [0usize; 2];
            for pos in 1..idx.len() {
                left[usize::from(self.y[idx[pos - 1]] == LABEL_LONG)] += 1;

                let lo = self.x[idx[pos - 1]][f];
                let hi = self.x[idx[pos]][f];
                if lo >= hi {
                    continue;
                }

                let right = [total[0] - left[0], total[1] - left[1]];
                let impurity =
                    (pos as f64 * gini(left) + (n - pos as f64) * gini(right)) / n;

                if best.is_none_or(|(_, _, b)| impurity < b) {
                    best = Some((f, (lo + hi) / 2.0, impurity));
                }
            }
        }

        best.map(|(f, t, _)| (f, t))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit on bootstrap resamples; tree `i` draws from a generator seeded
    /// with `seed + i`.
    pub fn fit(x: &[FeatureRow], y: &[u8], params: ForestParams, seed: u64) -> Self {
        let max_features = ((N_FEATURES as f64).sqrt() as usize).max(1);
        let builder = Builder {
            x,
            y,
            params,
            max_features,
        };

        let n = x.len();
        if n == 0 {
            return Self {
                params,
                trees: Vec::new(),
            };
        }

        let trees = (0..params.n_trees)
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
                let mut sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree {
                    root: builder.build(&mut sample, 0, &mut rng),
                }
            })
            .collect();

        Self { params, trees }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean of the leaf class frequencies: `[p_short, p_long]`.
    pub fn predict_proba(&self, row: &FeatureRow) -> [f64; 2] {
        if self.trees.is_empty() {
            return [1.0, 0.0];
        }

        let mut acc = [0.0; 2];
        for t in &self.trees {
            let p = t.root.proba(row);
            acc[0] += p[0];
            acc[1] += p[1];
        }

        let n = self.trees.len() as f64;
        [acc[0] / n, acc[1] / n]
    }

    /// Long only when strictly more likely; ties go to short.
    pub fn predict(&self, row: &FeatureRow) -> u8 {
        let [short, long] = self.predict_proba(row);
        u8::from(long > short)
    }
}
