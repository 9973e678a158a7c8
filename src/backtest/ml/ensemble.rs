use rand::{rngs::StdRng, Rng};

use crate::backtest::ml::tree::{RegressionTree, TreeParams};

#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    /// Each tree sees a bootstrap sample of the rows drawn from `rng`.
    pub fn fit(
        rows: &[Vec<f64>],
        targets: &[f64],
        n_estimators: usize,
        params: TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let n = rows.len();
        let trees = (0..n_estimators.max(1))
            .map(|_| {
                let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::fit(rows, targets, &sample, params)
            })
            .collect();
        Self { trees }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|tree| tree.predict(row)).sum::<f64>() / self.trees.len() as f64
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct GradientBoosting {
    base: f64,
    learning_rate: f64,
    stages: Vec<RegressionTree>,
}

impl GradientBoosting {
    pub fn fit(
        rows: &[Vec<f64>],
        targets: &[f64],
        n_estimators: usize,
        learning_rate: f64,
        params: TreeParams,
    ) -> Self {
        let n = rows.len();
        let base = if n == 0 {
            0.0
        } else {
            targets.iter().sum::<f64>() / n as f64
        };
        let indices: Vec<usize> = (0..n).collect();
        let mut current = vec![base; n];
        let mut stages = Vec::with_capacity(n_estimators);

        for _ in 0..n_estimators {
            let residuals: Vec<f64> = targets
                .iter()
                .zip(current.iter())
                .map(|(target, predicted)| target - predicted)
                .collect();
            if residuals.iter().all(|residual| residual.abs() < 1e-9) {
                break;
            }

            let stage = RegressionTree::fit(rows, &residuals, &indices, params);
            for (value, row) in current.iter_mut().zip(rows.iter()) {
                *value += learning_rate * stage.predict(row);
            }
            stages.push(stage);
        }

        Self {
            base,
            learning_rate,
            stages,
        }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        self.base
            + self
                .stages
                .iter()
                .map(|stage| self.learning_rate * stage.predict(row))
                .sum::<f64>()
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}

#[derive(Debug, Clone)]
pub struct StackingBlend {
    forest: RandomForest,
    boosting: GradientBoosting,
    intercept: f64,
    forest_weight: f64,
    boosting_weight: f64,
}

impl StackingBlend {
    pub fn fit(
        forest: RandomForest,
        boosting: GradientBoosting,
        rows: &[Vec<f64>],
        targets: &[f64],
    ) -> Self {
        let xs: Vec<(f64, f64)> = rows
            .iter()
            .map(|row| (forest.predict(row), boosting.predict(row)))
            .collect();
        let (intercept, forest_weight, boosting_weight) = blend_weights(&xs, targets);
        Self {
            forest,
            boosting,
            intercept,
            forest_weight,
            boosting_weight,
        }
    }

    pub fn predict(&self, row: &[f64]) -> f64 {
        self.intercept
            + self.forest_weight * self.forest.predict(row)
            + self.boosting_weight * self.boosting.predict(row)
    }

    pub fn weights(&self) -> (f64, f64) {
        (self.forest_weight, self.boosting_weight)
    }
}

fn blend_weights(xs: &[(f64, f64)], targets: &[f64]) -> (f64, f64, f64) {
    let n = xs.len().min(targets.len());
    if n == 0 {
        return (0.0, 0.5, 0.5);
    }
    let n_f = n as f64;
    let mean_a = xs.iter().take(n).map(|(a, _)| a).sum::<f64>() / n_f;
    let mean_b = xs.iter().take(n).map(|(_, b)| b).sum::<f64>() / n_f;
    let mean_y = targets.iter().take(n).sum::<f64>() / n_f;

    let mut s_aa = 0.0;
    let mut s_bb = 0.0;
    let mut s_ab = 0.0;
    let mut s_ay = 0.0;
    let mut s_by = 0.0;
    for ((a, b), y) in xs.iter().zip(targets.iter()).take(n) {
        let da = a - mean_a;
        let db = b - mean_b;
        let dy = y - mean_y;
        s_aa += da * da;
        s_bb += db * db;
        s_ab += da * db;
        s_ay += da * dy;
        s_by += db * dy;
    }

    let det = s_aa * s_bb - s_ab * s_ab;
    let scale = (s_aa * s_bb).max(1e-12);
    if det.abs() / scale < 1e-9 {
        return (mean_y - 0.5 * mean_a - 0.5 * mean_b, 0.5, 0.5);
    }

    let weight_a = (s_bb * s_ay - s_ab * s_by) / det;
    let weight_b = (s_aa * s_by - s_ab * s_ay) / det;
    if !weight_a.is_finite() || !weight_b.is_finite() {
        return (mean_y - 0.5 * mean_a - 0.5 * mean_b, 0.5, 0.5);
    }
    (mean_y - weight_a * mean_a - weight_b * mean_b, weight_a, weight_b)
}
