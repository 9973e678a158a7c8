use chrono::{DateTime, Datelike, Timelike, Utc};
use regex::Regex;
use std::sync::OnceLock;

use crate::backtest::harness::{SynthesizedTrend, VideoRecord};
use crate::{ChannelProfile, ContentStyleKind};

pub const FEATURE_NAMES: &[&str] = &[
    "log_avg_views",
    "log_median_views",
    "total_video_count",
    "log_period_avg",
    "viral_potential",
    "relevance_score",
    "performance_score",
    "match_score",
    "title_keyword_count",
    "title_length",
    "description_length",
    "title_word_count",
    "style_defined",
    "publish_hour",
    "publish_weekday",
    "is_weekend",
    "engagement_rate",
    "log_subscribers",
    "title_fit",
    "duration_seconds",
    "duration_category",
    "title_sentiment",
    "has_number",
    "has_question",
    "has_exclamation",
    "has_emoji",
    "view_stability",
    "viral_relevance",
];

pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

const POSITIVE_WORDS: &[&str] = &["best", "great", "amazing", "awesome", "top", "win", "success"];
const NEGATIVE_WORDS: &[&str] = &["worst", "bad", "fail", "lose", "terrible", "awful"];

pub fn extract_features(
    video: &VideoRecord,
    channel: &ChannelProfile,
    trend: &SynthesizedTrend,
    period_avg: f64,
    published: DateTime<Utc>,
) -> Vec<f64> {
    let stats = &channel.historical_stats;
    let avg_views = stats.average().unwrap_or(0.0);
    let median_views = stats.median().unwrap_or(0.0);

    let title = video.title.as_str();
    let title_len = title.chars().count();
    let word_count = title.split_whitespace().count();
    let weekday = published.weekday().num_days_from_monday();

    let (engagement_rate, subscribers) = channel
        .target_audience
        .as_ref()
        .map(|audience| {
            (
                audience.engagement_rate,
                audience.subscriber_count.unwrap_or(0) as f64,
            )
        })
        .unwrap_or((0.0, 0.0));

    let duration = video
        .duration
        .as_deref()
        .and_then(parse_iso_duration)
        .unwrap_or(0);

    let stability = if avg_views > 0.0 && median_views > 0.0 {
        1.0 - (avg_views - median_views).abs() / avg_views.max(median_views)
    } else {
        0.5
    };

    let row = vec![
        avg_views.ln_1p(),
        median_views.ln_1p(),
        stats.total_video_count as f64,
        period_avg.max(0.0).ln_1p(),
        trend.viral_potential,
        trend.relevance_score,
        trend.performance_score,
        trend.match_score,
        trend.keywords.len() as f64,
        title_len as f64,
        video.description().chars().count() as f64,
        word_count as f64,
        if channel.primary_style() == ContentStyleKind::General {
            0.5
        } else {
            1.0
        },
        published.hour() as f64,
        weekday as f64,
        flag(weekday >= 5),
        engagement_rate,
        subscribers.ln_1p(),
        title_fit(title_len),
        duration as f64,
        duration_category(duration),
        title_sentiment(title, word_count),
        flag(title.chars().any(|ch| ch.is_ascii_digit())),
        flag(title.contains('?')),
        flag(title.contains('!')),
        flag(title.chars().any(is_emoji)),
        stability,
        trend.viral_potential / 100.0 * trend.relevance_score / 100.0,
    ];

    row.into_iter()
        .map(|value| if value.is_finite() { value } else { 0.0 })
        .collect()
}

/// Seconds in an ISO 8601 duration such as `PT5M30S` or `P1DT2H`.
pub fn parse_iso_duration(value: &str) -> Option<u64> {
    static DURATION: OnceLock<Regex> = OnceLock::new();
    let re = DURATION.get_or_init(|| {
        Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$")
            .expect("valid duration regex")
    });

    let caps = re.captures(value.trim())?;
    let part = |index: usize| -> u64 {
        caps.get(index)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };
    Some(part(1) * 86_400 + part(2) * 3_600 + part(3) * 60 + part(4))
}

fn duration_category(seconds: u64) -> f64 {
    match seconds {
        0 => 2.0,
        1..=59 => 1.0,
        60..=299 => 2.0,
        300..=599 => 3.0,
        _ => 4.0,
    }
}

fn title_fit(length: usize) -> f64 {
    match length {
        30..=60 => 1.0,
        20..=29 | 61..=70 => 0.8,
        _ => 0.5,
    }
}

fn title_sentiment(title: &str, word_count: usize) -> f64 {
    let lower = title.to_lowercase();
    let positive = POSITIVE_WORDS.iter().filter(|word| lower.contains(**word)).count() as f64;
    let negative = NEGATIVE_WORDS.iter().filter(|word| lower.contains(**word)).count() as f64;
    (positive - negative) / word_count.max(1) as f64
}

fn is_emoji(ch: char) -> bool {
    matches!(ch as u32, 0x1F300..=0x1FAFF | 0x2600..=0x27BF | 0x1F000..=0x1F2FF)
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}
