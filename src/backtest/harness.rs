use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

use crate::backtest::metrics::{mean, median, AccuracyMetrics};
use crate::backtest::ml::{features::extract_features, MlPredictor, MlSummary};
use crate::backtest::outliers::{select_top_outliers, OutlierAnalysis};
use crate::config::BacktestConfig;
use crate::scoring::predictor::{PerformancePredictor, PredictionContext, PredictionScores};
use crate::{finite_or_zero, ChannelProfile, EngineError};

const TITLE_STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub video_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    pub published_at: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
}

impl VideoRecord {
    pub fn new(
        video_id: impl Into<String>,
        title: impl Into<String>,
        view_count: u64,
        published_at: impl Into<String>,
    ) -> Self {
        Self {
            video_id: video_id.into(),
            title: title.into(),
            view_count,
            like_count: 0,
            comment_count: 0,
            published_at: published_at.into(),
            description: None,
            duration: None,
        }
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }

    /// Title length in characters; an empty title counts as 50.
    pub fn title_length(&self) -> u32 {
        match self.title.chars().count() {
            0 => 50,
            len => len as u32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizedTrend {
    pub keywords: Vec<String>,
    pub viral_potential: f64,
    pub relevance_score: f64,
    pub performance_score: f64,
    pub match_score: f64,
}

impl SynthesizedTrend {
    pub fn from_ratio(keywords: Vec<String>, ratio: f64) -> Self {
        let r = ratio;
        let (viral, relevance, performance) = if r > 3.0 {
            (
                (60.0 + (r - 3.0) * 5.0).min(98.0),
                (55.0 + (r - 3.0) * 4.0).min(95.0),
                (60.0 + (r - 3.0) * 5.0).min(95.0),
            )
        } else if r > 2.0 {
            (
                (50.0 + (r - 2.0) * 20.0).min(90.0),
                (50.0 + (r - 2.0) * 15.0).min(90.0),
                (50.0 + (r - 2.0) * 20.0).min(90.0),
            )
        } else if r > 1.5 {
            (
                (50.0 + (r - 1.5) * 20.0).min(80.0),
                (50.0 + (r - 1.5) * 15.0).min(80.0),
                (50.0 + (r - 1.5) * 20.0).min(80.0),
            )
        } else if r > 1.2 {
            (
                (50.0 + (r - 1.2) * 33.0).min(70.0),
                (50.0 + (r - 1.2) * 25.0).min(70.0),
                (50.0 + (r - 1.2) * 33.0).min(70.0),
            )
        } else if r > 0.8 {
            (
                50.0 + (r - 0.8) * 25.0,
                50.0 + (r - 0.8) * 20.0,
                50.0 + (r - 0.8) * 25.0,
            )
        } else {
            (
                (50.0 - (0.8 - r) * 50.0).max(30.0),
                (50.0 - (0.8 - r) * 40.0).max(30.0),
                (50.0 - (0.8 - r) * 50.0).max(30.0),
            )
        };

        Self {
            keywords,
            viral_potential: viral,
            relevance_score: relevance,
            performance_score: performance,
            match_score: viral * 0.4 + relevance * 0.35 + performance * 0.25,
        }
    }

    pub fn prediction_scores(&self) -> PredictionScores {
        PredictionScores {
            match_score: self.match_score,
            viral_potential: self.viral_potential,
            performance_score: self.performance_score,
            relevance_score: self.relevance_score,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodStats {
    pub avg_views: f64,
    pub median_views: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestRecord {
    pub video_id: String,
    pub title: String,
    pub published_at: String,
    pub actual_views: u64,
    pub predicted_views: u64,
    pub period_avg_views: f64,
    pub error_abs: f64,
    pub error_percentage: f64,
    pub is_outlier: bool,
    pub outlier_ratio: f64,
    pub simulated_trend: SynthesizedTrend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcludedVideo {
    pub video_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestReport {
    pub per_video_results: Vec<BacktestRecord>,
    pub accuracy_metrics: AccuracyMetrics,
    pub top_outliers: Vec<OutlierAnalysis>,
    pub total_videos_tested: usize,
    pub excluded: Vec<ExcludedVideo>,
    pub excluded_from_metrics: usize,
    pub predictor: String,
    pub ml: Option<MlSummary>,
}

struct PreparedVideo<'a> {
    video: &'a VideoRecord,
    published: DateTime<Utc>,
    period_avg: f64,
    ratio: f64,
    trend: SynthesizedTrend,
}

#[derive(Debug, Clone, Default)]
pub struct BacktestHarness {
    config: BacktestConfig,
    predictor: PerformancePredictor,
}

impl BacktestHarness {
    pub fn new(config: BacktestConfig) -> Self {
        Self {
            config,
            predictor: PerformancePredictor::new(),
        }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn run(
        &self,
        videos: &[VideoRecord],
        channel: &ChannelProfile,
        use_ml: bool,
    ) -> Result<BacktestReport, EngineError> {
        channel.validate()?;

        let mut excluded = Vec::new();
        let mut dated: Vec<(DateTime<Utc>, &VideoRecord)> = Vec::with_capacity(videos.len());
        for video in videos {
            match parse_published_at(&video.published_at) {
                Some(published) => dated.push((published, video)),
                None => {
                    warn!(video_id = %video.video_id, published_at = %video.published_at, "skipping video with unparseable publish date");
                    excluded.push(ExcludedVideo {
                        video_id: video.video_id.clone(),
                        reason: format!("unparseable publishedAt '{}'", video.published_at),
                    });
                }
            }
        }

        dated.sort_by_key(|(published, _)| *published);
        if dated.len() > self.config.max_videos {
            let cut = dated.len() - self.config.max_videos;
            dated.drain(..cut);
        }

        let periods = period_stats(
            dated
                .iter()
                .map(|(published, video)| (*published, video.view_count)),
        );
        let prepared: Vec<PreparedVideo> = dated
            .iter()
            .map(|&(published, video)| {
                let actual = video.view_count as f64;
                let period_avg = periods
                    .get(&period_key(&published))
                    .map(|stats| stats.avg_views)
                    .unwrap_or(actual);
                let ratio = if period_avg > 0.0 { actual / period_avg } else { 1.0 };
                PreparedVideo {
                    video,
                    published,
                    period_avg,
                    ratio,
                    trend: SynthesizedTrend::from_ratio(extract_title_keywords(&video.title), ratio),
                }
            })
            .collect();

        let model = if use_ml && prepared.len() >= self.config.ml_min_videos {
            self.train_model(&prepared, channel)
        } else {
            None
        };

        let mut results = Vec::with_capacity(prepared.len());
        let mut pairs = Vec::with_capacity(prepared.len());
        let mut excluded_from_metrics = 0usize;

        for item in &prepared {
            let predicted_views = match &model {
                Some(model) => model
                    .predict(&extract_features(
                        item.video,
                        channel,
                        &item.trend,
                        item.period_avg,
                        item.published,
                    ))
                    .unwrap_or_else(|| self.rule_based_views(item, channel)),
                None => self.rule_based_views(item, channel),
            };

            let actual_views = item.video.view_count;
            let error_abs = (predicted_views as f64 - actual_views as f64).abs();
            let error_percentage = if actual_views > 0 {
                error_abs / actual_views as f64 * 100.0
            } else {
                0.0
            };

            if actual_views > 0 {
                pairs.push((predicted_views as f64, actual_views as f64));
            } else {
                excluded_from_metrics += 1;
            }

            results.push(BacktestRecord {
                video_id: item.video.video_id.clone(),
                title: item.video.title.clone(),
                published_at: item.video.published_at.clone(),
                actual_views,
                predicted_views,
                period_avg_views: finite_or_zero(item.period_avg),
                error_abs,
                error_percentage: finite_or_zero(error_percentage),
                is_outlier: actual_views as f64 > item.period_avg * self.config.outlier_threshold,
                outlier_ratio: finite_or_zero(item.ratio),
                simulated_trend: item.trend.clone(),
            });
        }

        let accuracy_metrics = AccuracyMetrics::compute(&pairs);
        let tested: Vec<&VideoRecord> = prepared.iter().map(|item| item.video).collect();
        let top_outliers = select_top_outliers(&results, &tested, self.config.top_outliers);

        debug!(
            tested = results.len(),
            excluded = excluded.len(),
            excluded_from_metrics,
            mae = accuracy_metrics.mae,
            "backtest finished"
        );

        Ok(BacktestReport {
            total_videos_tested: results.len(),
            per_video_results: results,
            accuracy_metrics,
            top_outliers,
            excluded,
            excluded_from_metrics,
            predictor: match &model {
                Some(model) => format!("ml:{}", model.summary().best_model),
                None => "rule_based".to_string(),
            },
            ml: model.map(|model| model.summary().clone()),
        })
    }

    fn rule_based_views(&self, item: &PreparedVideo, channel: &ChannelProfile) -> u64 {
        let context = PredictionContext::from_stats(&channel.historical_stats, Some(item.period_avg))
            .with_title_length(item.video.title_length());
        self.predictor
            .predict_views(&item.trend.prediction_scores(), &context)
    }

    fn train_model(&self, prepared: &[PreparedVideo], channel: &ChannelProfile) -> Option<MlPredictor> {
        let rows: Vec<Vec<f64>> = prepared
            .iter()
            .map(|item| {
                extract_features(item.video, channel, &item.trend, item.period_avg, item.published)
            })
            .collect();
        let targets: Vec<f64> = prepared
            .iter()
            .map(|item| item.video.view_count as f64)
            .collect();

        match MlPredictor::train(&rows, &targets, self.config.ml_seed) {
            Ok(model) => {
                let summary = model.summary();
                info!(
                    best_model = %summary.best_model,
                    samples = summary.sample_count,
                    features = summary.feature_count,
                    "trained view-count model"
                );
                Some(model)
            }
            Err(err) => {
                warn!(error = %err, "model training failed, using rule-based predictor");
                None
            }
        }
    }
}

/// Accepts RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS` and plain dates.
pub fn parse_published_at(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub(crate) fn period_key(published: &DateTime<Utc>) -> String {
    published.format("%Y-%m").to_string()
}

// Zero-view videos are ignored.
pub fn period_stats<I>(videos: I) -> BTreeMap<String, PeriodStats>
where
    I: IntoIterator<Item = (DateTime<Utc>, u64)>,
{
    let mut grouped: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (published, views) in videos {
        if views > 0 {
            grouped
                .entry(period_key(&published))
                .or_default()
                .push(views as f64);
        }
    }

    grouped
        .into_iter()
        .map(|(key, views)| {
            let stats = PeriodStats {
                avg_views: finite_or_zero(mean(&views)),
                median_views: finite_or_zero(median(&views)),
                count: views.len(),
            };
            (key, stats)
        })
        .collect()
}

pub fn extract_title_keywords(title: &str) -> Vec<String> {
    let stop_words: HashSet<&str> = TITLE_STOP_WORDS.iter().copied().collect();
    title
        .to_lowercase()
        .split_whitespace()
        .filter(|word| word.chars().count() > 3 && !stop_words.contains(word))
        .take(5)
        .map(str::to_string)
        .collect()
}
