use serde::{Deserialize, Serialize};

use crate::finite_or_zero;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyMetrics {
    pub mae: f64,
    pub mape: f64,
    pub rmse: f64,
    pub r2: f64,
    pub correlation: f64,
    pub sample_count: usize,
}

impl AccuracyMetrics {
    /// Pairs are `(predicted, actual)`; non-positive actuals are skipped.
    pub fn compute(pairs: &[(f64, f64)]) -> Self {
        let pairs: Vec<(f64, f64)> = pairs
            .iter()
            .copied()
            .filter(|(predicted, actual)| {
                predicted.is_finite() && actual.is_finite() && *actual > 0.0
            })
            .collect();
        if pairs.is_empty() {
            return Self::default();
        }

        let abs_errors: Vec<f64> = pairs.iter().map(|(p, a)| (p - a).abs()).collect();
        let pct_errors: Vec<f64> = pairs.iter().map(|(p, a)| (p - a).abs() / a * 100.0).collect();
        let sq_errors: Vec<f64> = pairs.iter().map(|(p, a)| (p - a).powi(2)).collect();

        Self {
            mae: finite_or_zero(mean(&abs_errors)),
            mape: finite_or_zero(mean(&pct_errors)),
            rmse: finite_or_zero(mean(&sq_errors).sqrt()),
            r2: finite_or_zero(r_squared(&pairs)),
            correlation: finite_or_zero(correlation(&pairs)),
            sample_count: pairs.len(),
        }
    }
}

/// `1 - SS_res / SS_tot`, or 0 when the actuals have no variance.
pub fn r_squared(pairs: &[(f64, f64)]) -> f64 {
    if pairs.len() < 2 {
        return 0.0;
    }
    let actuals: Vec<f64> = pairs.iter().map(|(_, actual)| *actual).collect();
    let mean_actual = mean(&actuals);

    let ss_res: f64 = pairs.iter().map(|(p, a)| (a - p).powi(2)).sum();
    let ss_tot: f64 = actuals.iter().map(|a| (a - mean_actual).powi(2)).sum();
    if ss_tot <= 0.0 {
        return 0.0;
    }
    1.0 - ss_res / ss_tot
}

pub fn correlation(pairs: &[(f64, f64)]) -> f64 {
    if pairs.len() < 2 {
        return 0.0;
    }

    let (xs, ys): (Vec<f64>, Vec<f64>) = pairs.iter().cloned().unzip();
    let mean_x = mean(&xs);
    let mean_y = mean(&ys);

    let mut numerator = 0.0;
    let mut denom_x = 0.0;
    let mut denom_y = 0.0;

    for (x, y) in xs.iter().zip(ys.iter()) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        numerator += dx * dy;
        denom_x += dx * dx;
        denom_y += dy * dy;
    }

    if denom_x <= 0.0 || denom_y <= 0.0 {
        return 0.0;
    }

    numerator / (denom_x.sqrt() * denom_y.sqrt())
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
