use serde::{Deserialize, Serialize};

use crate::scoring::calculator::SubScores;
use crate::scoring::predictor::{PerformancePredictor, PredictionScores};
use crate::{
    clamp_score, round_to, ChannelProfile, ContentStyleKind, EngineError, PredictedPerformance,
    Recommendation, RelatedInfo, TrendSignal, Urgency,
};

pub const VIRAL_WEIGHT: f64 = 0.40;
pub const PERFORMANCE_WEIGHT: f64 = 0.25;
pub const RELEVANCE_WEIGHT: f64 = 0.35;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub keyword: String,
    pub sub_scores: SubScores,
    pub viral_potential: f64,
    pub relevance_score: f64,
    pub performance_score: f64,
    pub match_score: f64,
    pub reasoning: String,
    pub content_angle: String,
    pub suggested_format: String,
    pub urgency: Urgency,
    pub predicted_performance: PredictedPerformance,
}

impl MatchResult {
    pub fn into_recommendation(self, trend: &TrendSignal) -> Recommendation {
        Recommendation {
            keyword: self.keyword,
            match_score: round_to(self.match_score, 2),
            viral_potential: round_to(self.viral_potential, 2),
            performance_score: round_to(self.performance_score, 2),
            relevance_score: round_to(self.relevance_score, 2),
            opportunity_score: round_to(self.viral_potential, 2),
            composite_social_score: round_to(trend.composite(), 2),
            reasoning: self.reasoning,
            content_angle: self.content_angle,
            predicted_performance: self.predicted_performance,
            suggested_format: self.suggested_format,
            urgency: self.urgency,
            sources: trend.sources.iter().cloned().collect(),
            related_info: RelatedInfo {
                rising_queries: trend.rising_queries.clone(),
                hashtags: trend.hashtags.clone(),
                subreddits: trend.subreddits.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MatchScorer {
    predictor: PerformancePredictor,
}

impl MatchScorer {
    pub fn new(predictor: PerformancePredictor) -> Self {
        Self { predictor }
    }

    pub fn score(
        &self,
        trend: &TrendSignal,
        channel: &ChannelProfile,
    ) -> Result<MatchResult, EngineError> {
        trend.validate()?;
        channel.validate()?;

        let sub_scores = SubScores::compute(trend, channel);
        let viral = sub_scores.viral_potential;
        let relevance = sub_scores.relevance_blend();
        let performance = performance_potential(trend, viral, relevance);
        let match_score = clamp_score(
            viral * VIRAL_WEIGHT + performance * PERFORMANCE_WEIGHT + relevance * RELEVANCE_WEIGHT,
        );

        let style = channel.primary_style();
        let predicted_performance = self.predictor.predict(
            &PredictionScores {
                match_score,
                viral_potential: viral,
                performance_score: performance,
                relevance_score: relevance,
            },
            &channel.historical_stats,
        )?;

        Ok(MatchResult {
            keyword: trend.keyword.clone(),
            sub_scores,
            viral_potential: viral,
            relevance_score: relevance,
            performance_score: performance,
            match_score,
            reasoning: build_reasoning(trend, viral, performance, relevance),
            content_angle: content_angle(&trend.keyword, style, trend.growth_rate),
            suggested_format: suggested_format(style).to_string(),
            urgency: determine_urgency(viral, trend.growth_rate),
            predicted_performance,
        })
    }

    pub fn recommend(
        &self,
        trend: &TrendSignal,
        channel: &ChannelProfile,
    ) -> Result<Recommendation, EngineError> {
        Ok(self.score(trend, channel)?.into_recommendation(trend))
    }
}

pub fn performance_potential(trend: &TrendSignal, viral: f64, relevance: f64) -> f64 {
    let relevance_bonus = relevance * 0.3;
    let timeliness_bonus = (trend.growth_rate * 0.2).min(20.0);
    clamp_score(viral * 0.6 + relevance_bonus + timeliness_bonus)
}

/// The viral threshold is checked first at every level.
pub fn determine_urgency(viral: f64, growth_rate: f64) -> Urgency {
    if viral >= 90.0 || growth_rate > 200.0 {
        Urgency::Urgent
    } else if viral >= 70.0 || growth_rate > 100.0 {
        Urgency::High
    } else if viral >= 50.0 || growth_rate > 50.0 {
        Urgency::Medium
    } else {
        Urgency::Low
    }
}

pub fn content_angle(keyword: &str, style: ContentStyleKind, growth_rate: f64) -> String {
    let base = match style {
        ContentStyleKind::Tutorial => format!("A complete step-by-step tutorial on '{}'", keyword),
        ContentStyleKind::Review => {
            format!("An in-depth review of '{}' weighing its strengths and weaknesses", keyword)
        }
        ContentStyleKind::Entertainment => {
            format!("A challenge or comedy compilation built around '{}'", keyword)
        }
        ContentStyleKind::News => format!("The latest on '{}' with analysis", keyword),
        ContentStyleKind::Educational => {
            format!("Explaining '{}': how it works, its history and uses", keyword)
        }
        ContentStyleKind::Gaming => format!("'{}' gameplay with a strategy guide", keyword),
        ContentStyleKind::Tech => format!("A technical breakdown and hands-on take on '{}'", keyword),
        ContentStyleKind::General => format!("A fresh angle on '{}'", keyword),
    };

    if growth_rate > 150.0 {
        format!("Hot right now: {} (publish within 48 hours)", base)
    } else if growth_rate > 80.0 {
        format!("{} (publish this week)", base)
    } else {
        base
    }
}

pub fn suggested_format(style: ContentStyleKind) -> &'static str {
    match style {
        ContentStyleKind::Tutorial => "8-12 minute step-by-step tutorial",
        ContentStyleKind::Review => "10-15 minute in-depth review",
        ContentStyleKind::Entertainment => "5-8 minute fast-paced entertainment",
        ContentStyleKind::News => "6-10 minute news breakdown",
        ContentStyleKind::Educational => "10-15 minute explainer",
        ContentStyleKind::Gaming => "15-20 minute gameplay session",
        ContentStyleKind::Tech => "8-12 minute hands-on product video",
        ContentStyleKind::General => "8-12 minute general feature",
    }
}

fn build_reasoning(trend: &TrendSignal, viral: f64, performance: f64, relevance: f64) -> String {
    let mut reasons: Vec<String> = Vec::new();

    if viral >= 90.0 {
        reasons.push("Extremely hot topic, discussed across the internet".to_string());
    } else if viral >= 70.0 {
        reasons.push("Hot topic, rising quickly".to_string());
    } else if viral >= 50.0 {
        reasons.push("Rising topic, gaining traction".to_string());
    } else {
        reasons.push("Niche topic".to_string());
    }

    if relevance >= 90.0 {
        reasons.push("Perfect fit with the channel's core content".to_string());
    } else if relevance >= 70.0 {
        reasons.push("Highly relevant extension of the channel's content".to_string());
    } else if relevance >= 50.0 {
        reasons.push("Relevant crossover opportunity".to_string());
    }

    if performance >= 80.0 {
        reasons.push("Expected to perform very well".to_string());
    } else if performance >= 60.0 {
        reasons.push("Expected to perform well".to_string());
    }

    let sources = trend.source_count();
    if sources > 2 {
        reasons.push(format!("Trending on {} platforms at once", sources));
    }

    if trend.growth_rate > 100.0 {
        reasons.push(format!(
            "Search interest up {:.0}%, strong momentum",
            trend.growth_rate
        ));
    }

    reasons.join("; ")
}
