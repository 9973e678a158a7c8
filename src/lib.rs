pub mod backtest;
pub mod config;
pub mod error;
pub mod scoring;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub use crate::backtest::{BacktestHarness, BacktestReport, VideoRecord};
pub use crate::config::{BacktestConfig, EngineConfig, RankerConfig};
pub use crate::error::EngineError;
pub use crate::scoring::{MatchScorer, PerformancePredictor, RecommendationRanker};

pub const DEFAULT_BASELINE_VIEWS: f64 = 10_000.0;

pub const MIN_PREDICTED_VIEWS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ContentStyleKind {
    Tutorial,
    Review,
    Entertainment,
    News,
    Educational,
    Gaming,
    Tech,
    General,
}

impl ContentStyleKind {
    /// Unknown labels map to `General`.
    pub fn from_label(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "tutorial" => ContentStyleKind::Tutorial,
            "review" => ContentStyleKind::Review,
            "entertainment" => ContentStyleKind::Entertainment,
            "news" => ContentStyleKind::News,
            "educational" => ContentStyleKind::Educational,
            "gaming" => ContentStyleKind::Gaming,
            "tech" => ContentStyleKind::Tech,
            _ => ContentStyleKind::General,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ContentStyleKind::Tutorial => "tutorial",
            ContentStyleKind::Review => "review",
            ContentStyleKind::Entertainment => "entertainment",
            ContentStyleKind::News => "news",
            ContentStyleKind::Educational => "educational",
            ContentStyleKind::Gaming => "gaming",
            ContentStyleKind::Tech => "tech",
            ContentStyleKind::General => "general",
        }
    }
}

impl Default for ContentStyleKind {
    fn default() -> Self {
        ContentStyleKind::General
    }
}

impl From<String> for ContentStyleKind {
    fn from(value: String) -> Self {
        ContentStyleKind::from_label(&value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelTopic {
    pub label: String,
    #[serde(default)]
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentStyle {
    #[serde(default)]
    pub primary_style: ContentStyleKind,
    #[serde(default)]
    pub style_distribution: BTreeMap<String, u32>,
}

impl ContentStyle {
    pub fn new(primary_style: ContentStyleKind) -> Self {
        Self {
            primary_style,
            style_distribution: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetAudience {
    #[serde(default)]
    pub primary_age_group: String,
    #[serde(default)]
    pub engagement_rate: f64,
    #[serde(default)]
    pub subscriber_count: Option<u64>,
}

impl TargetAudience {
    pub fn new(primary_age_group: impl Into<String>) -> Self {
        Self {
            primary_age_group: primary_age_group.into(),
            engagement_rate: 0.0,
            subscriber_count: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalStats {
    #[serde(default)]
    pub median_views: Option<f64>,
    #[serde(default)]
    pub avg_views: Option<f64>,
    #[serde(default)]
    pub total_video_count: u32,
    #[serde(default)]
    pub avg_title_length: Option<u32>,
}

impl HistoricalStats {
    /// Zero counts as missing, matching how upstream analyzers report absent history.
    pub fn median(&self) -> Option<f64> {
        self.median_views.filter(|value| *value > 0.0)
    }

    pub fn average(&self) -> Option<f64> {
        self.avg_views.filter(|value| *value > 0.0)
    }

    pub fn title_length(&self) -> u32 {
        self.avg_title_length.unwrap_or(50)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    #[serde(default)]
    pub topics: Vec<ChannelTopic>,
    #[serde(default)]
    pub content_style: Option<ContentStyle>,
    #[serde(default)]
    pub target_audience: Option<TargetAudience>,
    #[serde(default)]
    pub historical_stats: HistoricalStats,
}

impl ChannelProfile {
    pub fn topic_labels(&self) -> Vec<String> {
        self.topics
            .iter()
            .map(|topic| topic.label.trim().to_lowercase())
            .filter(|label| !label.is_empty())
            .collect()
    }

    pub fn primary_style(&self) -> ContentStyleKind {
        self.content_style
            .as_ref()
            .map(|style| style.primary_style)
            .unwrap_or(ContentStyleKind::General)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let stats = &self.historical_stats;
        for (name, value) in [("medianViews", stats.median_views), ("avgViews", stats.avg_views)] {
            if let Some(value) = value {
                if !value.is_finite() || value < 0.0 {
                    return Err(EngineError::invalid(format!(
                        "historicalStats.{} must be a non-negative number, got {}",
                        name, value
                    )));
                }
            }
        }
        for topic in &self.topics {
            if !topic.score.is_finite() {
                return Err(EngineError::invalid(format!(
                    "topic '{}' has a non-finite score",
                    topic.label
                )));
            }
        }
        if let Some(audience) = &self.target_audience {
            if !audience.engagement_rate.is_finite() || audience.engagement_rate < 0.0 {
                return Err(EngineError::invalid(format!(
                    "targetAudience.engagementRate must be a non-negative number, got {}",
                    audience.engagement_rate
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSignal {
    pub keyword: String,
    pub composite_score: f64,
    #[serde(default)]
    pub growth_rate: f64,
    #[serde(default)]
    pub sources: BTreeSet<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub subreddits: Vec<String>,
    #[serde(default)]
    pub rising_queries: Vec<String>,
}

impl TrendSignal {
    pub fn new(keyword: impl Into<String>, composite_score: f64, growth_rate: f64) -> Self {
        Self {
            keyword: keyword.into(),
            composite_score,
            growth_rate,
            sources: BTreeSet::new(),
            hashtags: Vec::new(),
            subreddits: Vec::new(),
            rising_queries: Vec::new(),
        }
    }

    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = sources.into_iter().map(Into::into).collect();
        self
    }

    pub fn composite(&self) -> f64 {
        clamp_score(self.composite_score)
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.keyword.trim().is_empty() {
            return Err(EngineError::invalid("trend keyword must not be empty"));
        }
        if !self.composite_score.is_finite() {
            return Err(EngineError::invalid(format!(
                "compositeScore for '{}' must be finite",
                self.keyword
            )));
        }
        if !self.growth_rate.is_finite() {
            return Err(EngineError::invalid(format!(
                "growthRate for '{}' must be finite",
                self.keyword
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceTier {
    Excellent,
    Good,
    Moderate,
    Low,
}

impl PerformanceTier {
    pub fn label(self) -> &'static str {
        match self {
            PerformanceTier::Excellent => "excellent",
            PerformanceTier::Good => "good",
            PerformanceTier::Moderate => "moderate",
            PerformanceTier::Low => "low",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            PerformanceTier::Excellent => "Expected to excel; strong breakout candidate",
            PerformanceTier::Good => "Expected to perform above the channel average",
            PerformanceTier::Moderate => "Expected steady, average traffic",
            PerformanceTier::Low => "Expected modest results; worth a low-cost experiment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Urgent,
    High,
    Medium,
    Low,
}

impl Urgency {
    pub fn label(self) -> &'static str {
        match self {
            Urgency::Urgent => "urgent",
            Urgency::High => "high",
            Urgency::Medium => "medium",
            Urgency::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictedPerformance {
    pub tier: PerformanceTier,
    pub predicted_views: u64,
    pub description: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedInfo {
    pub rising_queries: Vec<String>,
    pub hashtags: Vec<String>,
    pub subreddits: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub keyword: String,
    pub match_score: f64,
    pub viral_potential: f64,
    pub performance_score: f64,
    pub relevance_score: f64,
    pub opportunity_score: f64,
    pub composite_social_score: f64,
    pub reasoning: String,
    pub content_angle: String,
    pub predicted_performance: PredictedPerformance,
    pub suggested_format: String,
    pub urgency: Urgency,
    pub sources: Vec<String>,
    pub related_info: RelatedInfo,
}

/// Scores a batch of trends against a channel with the default ranker settings.
pub fn score_and_rank(
    trends: &[TrendSignal],
    channel: &ChannelProfile,
    max_count: usize,
) -> Result<Vec<Recommendation>, EngineError> {
    RecommendationRanker::new(RankerConfig::default()).rank(trends, channel, max_count)
}

pub fn backtest(
    videos: &[VideoRecord],
    channel: &ChannelProfile,
    use_ml: bool,
) -> Result<BacktestReport, EngineError> {
    BacktestHarness::new(BacktestConfig::default()).run(videos, channel, use_ml)
}

pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.max(0.0).min(100.0)
}

pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    finite_or_zero((value * factor).round() / factor)
}

pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

pub fn normalize_keyword(value: &str) -> String {
    value.trim().to_lowercase()
}

pub fn format_number(value: f64) -> String {
    let rounded = value.round().max(0.0) as i64;
    let mut chars: Vec<char> = rounded.to_string().chars().collect();
    let mut result = String::new();
    let mut count = 0usize;

    while let Some(ch) = chars.pop() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(ch);
        count += 1;
    }

    result.chars().rev().collect()
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

pub fn format_float(value: f64, digits: usize) -> String {
    format!("{:.1$}", value, digits)
}
