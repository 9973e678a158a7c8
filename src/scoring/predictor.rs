use serde::{Deserialize, Serialize};

use crate::{
    finite_or_zero, EngineError, HistoricalStats, PerformanceTier, PredictedPerformance,
    DEFAULT_BASELINE_VIEWS, MIN_PREDICTED_VIEWS,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionScores {
    pub match_score: f64,
    pub viral_potential: f64,
    pub performance_score: f64,
    pub relevance_score: f64,
}

impl PredictionScores {
    pub fn validate(&self) -> Result<(), EngineError> {
        let fields = [
            ("matchScore", self.match_score),
            ("viralPotential", self.viral_potential),
            ("performanceScore", self.performance_score),
            ("relevanceScore", self.relevance_score),
        ];
        for (name, value) in fields {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(EngineError::invalid(format!(
                    "{} must be within 0-100, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Tier composite: 40% match, 30% viral, 30% performance.
    pub fn composite(&self) -> f64 {
        self.match_score * 0.4 + self.viral_potential * 0.3 + self.performance_score * 0.3
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionContext {
    pub base_views: f64,
    pub total_video_count: u32,
    pub title_length: u32,
}

impl PredictionContext {
    pub fn from_stats(stats: &HistoricalStats, period_avg: Option<f64>) -> Self {
        Self {
            base_views: resolve_baseline(stats, period_avg),
            total_video_count: stats.total_video_count,
            title_length: stats.title_length(),
        }
    }

    pub fn with_title_length(mut self, title_length: u32) -> Self {
        self.title_length = title_length;
        self
    }
}

/// Median/average blend, then median, average, period average, then 10,000.
pub fn resolve_baseline(stats: &HistoricalStats, period_avg: Option<f64>) -> f64 {
    let baseline = match (stats.median(), stats.average()) {
        (Some(median), Some(avg)) => median * 0.7 + avg * 0.3,
        (Some(median), None) => median,
        (None, Some(avg)) => avg,
        (None, None) => period_avg
            .filter(|value| value.is_finite() && *value > 0.0)
            .unwrap_or(DEFAULT_BASELINE_VIEWS),
    };

    if !baseline.is_finite() || baseline <= 0.0 {
        DEFAULT_BASELINE_VIEWS
    } else {
        baseline
    }
}

pub fn viral_multiplier(viral: f64) -> f64 {
    let multiplier = if viral >= 90.0 {
        2.2 + (viral - 90.0) * 0.03
    } else if viral >= 70.0 {
        1.6 + (viral - 70.0) * 0.03
    } else if viral >= 50.0 {
        1.2 + (viral - 50.0) * 0.02
    } else {
        0.9 + viral / 50.0 * 0.3
    };
    multiplier.clamp(0.7, 3.0)
}

pub fn relevance_multiplier(relevance: f64) -> f64 {
    if relevance >= 80.0 {
        1.0 + (relevance - 80.0) * 0.01
    } else if relevance >= 60.0 {
        0.85 + (relevance - 60.0) * 0.0075
    } else if relevance >= 40.0 {
        0.75 + (relevance - 40.0) * 0.005
    } else {
        0.65 + relevance / 40.0 * 0.1
    }
}

pub fn performance_multiplier(performance: f64) -> f64 {
    if performance >= 80.0 {
        1.2 + (performance - 80.0) * 0.015
    } else if performance >= 60.0 {
        1.0 + (performance - 60.0) * 0.01
    } else if performance >= 40.0 {
        0.85 + (performance - 40.0) * 0.0075
    } else {
        0.7 + performance / 40.0 * 0.15
    }
}

pub fn timeliness_multiplier(match_score: f64) -> f64 {
    0.9 + match_score / 100.0 * 0.25
}

pub fn channel_stability(total_video_count: u32) -> f64 {
    if total_video_count > 100 {
        0.95
    } else if total_video_count > 50 {
        1.0
    } else {
        1.1
    }
}

pub fn title_optimization(title_length: u32) -> f64 {
    if (30..=60).contains(&title_length) {
        1.05
    } else {
        0.98
    }
}

pub fn confidence_factor(match_score: f64) -> f64 {
    0.9 + match_score / 100.0 * 0.2
}

pub fn tier_for(composite: f64) -> PerformanceTier {
    if composite >= 80.0 {
        PerformanceTier::Excellent
    } else if composite >= 65.0 {
        PerformanceTier::Good
    } else if composite >= 50.0 {
        PerformanceTier::Moderate
    } else {
        PerformanceTier::Low
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiplierBreakdown {
    pub viral: f64,
    pub relevance: f64,
    pub performance: f64,
    pub timeliness: f64,
    pub channel_stability: f64,
    pub title_optimization: f64,
    pub confidence_factor: f64,
}

impl MultiplierBreakdown {
    pub fn compute(scores: &PredictionScores, context: &PredictionContext) -> Self {
        Self {
            viral: viral_multiplier(scores.viral_potential),
            relevance: relevance_multiplier(scores.relevance_score),
            performance: performance_multiplier(scores.performance_score),
            timeliness: timeliness_multiplier(scores.match_score),
            channel_stability: channel_stability(context.total_video_count),
            title_optimization: title_optimization(context.title_length),
            confidence_factor: confidence_factor(scores.match_score),
        }
    }

    pub fn combined(&self) -> f64 {
        self.viral
            * self.relevance
            * self.performance
            * self.timeliness
            * self.channel_stability
            * self.title_optimization
            * self.confidence_factor
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PerformancePredictor;

impl PerformancePredictor {
    pub fn new() -> Self {
        Self
    }

    pub fn predict(
        &self,
        scores: &PredictionScores,
        stats: &HistoricalStats,
    ) -> Result<PredictedPerformance, EngineError> {
        self.predict_with_context(scores, &PredictionContext::from_stats(stats, None))
    }

    pub fn predict_with_context(
        &self,
        scores: &PredictionScores,
        context: &PredictionContext,
    ) -> Result<PredictedPerformance, EngineError> {
        scores.validate()?;

        let predicted_views = self.predict_views(scores, context);
        let composite = scores.composite();
        let tier = tier_for(composite);

        Ok(PredictedPerformance {
            tier,
            predicted_views,
            description: tier.description().to_string(),
            confidence: finite_or_zero(composite.round()),
        })
    }

    pub fn predict_views(&self, scores: &PredictionScores, context: &PredictionContext) -> u64 {
        let breakdown = MultiplierBreakdown::compute(scores, context);
        let raw = finite_or_zero((context.base_views * breakdown.combined()).round());
        if raw <= MIN_PREDICTED_VIEWS as f64 {
            MIN_PREDICTED_VIEWS
        } else {
            raw as u64
        }
    }
}
