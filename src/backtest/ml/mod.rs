pub mod ensemble;
pub mod features;
pub mod tree;

use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::backtest::metrics::{mean, r_squared, AccuracyMetrics};
use crate::{EngineError, MIN_PREDICTED_VIEWS};
use ensemble::{GradientBoosting, RandomForest, StackingBlend};
use tree::TreeParams;

pub const MIN_TRAINING_SAMPLES: usize = 10;
pub const HOLDOUT_FRACTION: f64 = 0.3;
pub const MIN_HOLDOUT: usize = 3;
pub const LEARNING_RATE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    RandomForest,
    GradientBoosting,
    Stacking,
}

impl ModelKind {
    pub fn label(self) -> &'static str {
        match self {
            ModelKind::RandomForest => "random_forest",
            ModelKind::GradientBoosting => "gradient_boosting",
            ModelKind::Stacking => "stacking",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hyperparameters {
    pub forest_depth: usize,
    pub boosting_depth: usize,
    pub n_estimators: usize,
}

impl Hyperparameters {
    pub fn for_samples(samples: usize) -> Self {
        if samples < 30 {
            Self {
                forest_depth: 8,
                boosting_depth: 4,
                n_estimators: 100,
            }
        } else if samples < 50 {
            Self {
                forest_depth: 10,
                boosting_depth: 5,
                n_estimators: 120,
            }
        } else {
            Self {
                forest_depth: 12,
                boosting_depth: 6,
                n_estimators: 150,
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelEvaluation {
    pub model: ModelKind,
    pub r2: f64,
    pub mape: f64,
    pub mae: f64,
    pub relative_mae: f64,
    pub selection_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MlSummary {
    pub best_model: String,
    pub sample_count: usize,
    pub feature_count: usize,
    pub holdout_size: usize,
    pub log_target: bool,
    pub in_sample: bool,
    pub evaluations: Vec<ModelEvaluation>,
}

#[derive(Debug, Clone)]
struct ModelSet {
    forest: RandomForest,
    boosting: GradientBoosting,
    stacking: StackingBlend,
}

impl ModelSet {
    fn fit(rows: &[Vec<f64>], targets: &[f64], params: Hyperparameters, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let forest_params = TreeParams {
            max_depth: params.forest_depth,
            min_samples_split: 2,
            min_samples_leaf: 1,
        };
        let boosting_params = TreeParams {
            max_depth: params.boosting_depth,
            min_samples_split: 4,
            min_samples_leaf: 2,
        };

        let forest = RandomForest::fit(rows, targets, params.n_estimators, forest_params, &mut rng);
        let boosting = GradientBoosting::fit(
            rows,
            targets,
            params.n_estimators,
            LEARNING_RATE,
            boosting_params,
        );
        let stacking = StackingBlend::fit(forest.clone(), boosting.clone(), rows, targets);
        Self {
            forest,
            boosting,
            stacking,
        }
    }

    fn predict(&self, kind: ModelKind, row: &[f64]) -> f64 {
        match kind {
            ModelKind::RandomForest => self.forest.predict(row),
            ModelKind::GradientBoosting => self.boosting.predict(row),
            ModelKind::Stacking => self.stacking.predict(row),
        }
    }
}

const ALL_MODELS: [ModelKind; 3] = [
    ModelKind::RandomForest,
    ModelKind::GradientBoosting,
    ModelKind::Stacking,
];

#[derive(Debug, Clone)]
pub struct MlPredictor {
    models: ModelSet,
    best: ModelKind,
    log_target: bool,
    feature_count: usize,
    summary: MlSummary,
}

impl MlPredictor {
    /// Rows must be in chronological order: the last 30% (at least three) form the holdout.
    pub fn train(rows: &[Vec<f64>], targets: &[f64], seed: u64) -> Result<Self, EngineError> {
        if rows.len() != targets.len() {
            return Err(EngineError::Training(format!(
                "{} feature rows for {} targets",
                rows.len(),
                targets.len()
            )));
        }
        if rows.len() < MIN_TRAINING_SAMPLES {
            return Err(EngineError::Training(format!(
                "need at least {} samples, got {}",
                MIN_TRAINING_SAMPLES,
                rows.len()
            )));
        }
        let feature_count = rows[0].len();
        if feature_count == 0 || rows.iter().any(|row| row.len() != feature_count) {
            return Err(EngineError::Training("feature rows have inconsistent width".to_string()));
        }
        if rows.iter().flatten().chain(targets.iter()).any(|value| !value.is_finite()) {
            return Err(EngineError::Training("non-finite training value".to_string()));
        }

        let log_target = use_log_target(targets);
        let transformed: Vec<f64> = targets
            .iter()
            .map(|&y| if log_target { y.max(0.0).ln_1p() } else { y })
            .collect();

        let n = rows.len();
        let holdout = ((n as f64 * HOLDOUT_FRACTION).round() as usize).max(MIN_HOLDOUT);
        let split = n - holdout;
        let params = Hyperparameters::for_samples(n);

        let trial = ModelSet::fit(
            &rows[..split],
            &transformed[..split],
            Hyperparameters::for_samples(split),
            seed,
        );
        let actual_holdout = &targets[split..];
        let mean_actual = mean(actual_holdout);

        let mut evaluations: Vec<ModelEvaluation> = ALL_MODELS
            .iter()
            .map(|&kind| {
                let pairs: Vec<(f64, f64)> = rows[split..]
                    .iter()
                    .zip(actual_holdout.iter())
                    .map(|(row, &actual)| {
                        (restore(trial.predict(kind, row), log_target), actual)
                    })
                    .collect();
                evaluate(kind, &pairs, mean_actual)
            })
            .collect();

        let best = evaluations
            .iter()
            .fold(None::<&ModelEvaluation>, |best, candidate| match best {
                Some(current) if current.selection_score >= candidate.selection_score => {
                    Some(current)
                }
                _ => Some(candidate),
            })
            .map(|evaluation| evaluation.model)
            .unwrap_or(ModelKind::RandomForest);
        evaluations.sort_by(|a, b| {
            b.selection_score
                .partial_cmp(&a.selection_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let models = ModelSet::fit(rows, &transformed, params, seed);
        let summary = MlSummary {
            best_model: best.label().to_string(),
            sample_count: n,
            feature_count,
            holdout_size: holdout,
            log_target,
            in_sample: true,
            evaluations,
        };

        Ok(Self {
            models,
            best,
            log_target,
            feature_count,
            summary,
        })
    }

    pub fn summary(&self) -> &MlSummary {
        &self.summary
    }

    pub fn best_model(&self) -> ModelKind {
        self.best
    }

    pub fn predict(&self, row: &[f64]) -> Option<u64> {
        if row.len() != self.feature_count || row.iter().any(|value| !value.is_finite()) {
            return None;
        }

        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        for kind in ALL_MODELS {
            let weight = if kind == self.best {
                0.4
            } else if kind == ModelKind::Stacking {
                0.3
            } else {
                0.1
            };
            weighted += weight * restore(self.models.predict(kind, row), self.log_target);
            total_weight += weight;
        }

        let blended = weighted / total_weight;
        if !blended.is_finite() {
            return None;
        }
        Some((blended.round().max(MIN_PREDICTED_VIEWS as f64)) as u64)
    }
}

fn use_log_target(targets: &[f64]) -> bool {
    let avg = mean(targets);
    if avg <= 0.0 {
        return false;
    }
    let variance = targets.iter().map(|y| (y - avg).powi(2)).sum::<f64>() / targets.len() as f64;
    variance.sqrt() / avg > 0.5
}

fn restore(value: f64, log_target: bool) -> f64 {
    if log_target {
        value.exp_m1()
    } else {
        value
    }
}

/// `r2*0.5 + mapeScore*0.3 + relMaeScore*0.2`, plus threshold bonuses.
fn evaluate(model: ModelKind, pairs: &[(f64, f64)], mean_actual: f64) -> ModelEvaluation {
    let metrics = AccuracyMetrics::compute(pairs);
    let r2 = r_squared(pairs);
    let relative_mae = if mean_actual > 0.0 {
        metrics.mae / mean_actual * 100.0
    } else {
        100.0
    };

    let mut bonus = 0.0;
    if r2 >= 0.5 {
        bonus += 0.1;
    }
    if metrics.mape <= 30.0 {
        bonus += 0.1;
    }
    if relative_mae <= 20.0 {
        bonus += 0.05;
    }
    let mape_score = (1.0 - metrics.mape.min(100.0) / 100.0).max(0.0);
    let relative_mae_score = (1.0 - relative_mae.min(100.0) / 100.0).max(0.0);
    let selection_score = r2 * 0.5 + mape_score * 0.3 + relative_mae_score * 0.2 + bonus;

    ModelEvaluation {
        model,
        r2: crate::finite_or_zero(r2),
        mape: metrics.mape,
        mae: metrics.mae,
        relative_mae: crate::finite_or_zero(relative_mae),
        selection_score: if selection_score.is_finite() {
            selection_score
        } else {
            f64::MIN
        },
    }
}
